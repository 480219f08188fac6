use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Debug;

/// A call to a legacy-style function: the arguments are kept as the
/// JSON-encoded string the wire protocol carries them in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

impl FunctionCall {
    pub fn new<N: Into<String>, A: Into<String>>(name: N, arguments: A) -> Self {
        FunctionCall {
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

/// A call to a named tool, correlated with its later result by `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    pub id: String,
    #[serde(rename = "type")]
    pub call_type: String,
    pub function: FunctionCall,
}

impl ToolCall {
    pub fn new<S: Into<String>>(id: S, function: FunctionCall) -> Self {
        ToolCall {
            index: None,
            id: id.into(),
            call_type: "function".to_string(),
            function,
        }
    }

    /// Wrap a legacy function call in the tool representation. Function-style
    /// correlation has no backend id, so the name doubles as a synthetic id.
    pub fn from_function_call(function: FunctionCall) -> Self {
        ToolCall::new(function.name.clone(), function)
    }
}

/// A tool/function declaration offered to a model.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

impl Function {
    pub fn new<N: Into<String>>(name: N) -> Self {
        Function {
            name: name.into(),
            description: None,
            parameters: None,
        }
    }

    pub fn with_description<D: Into<String>>(mut self, description: D) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_parameters(mut self, parameters: Value) -> Self {
        self.parameters = Some(parameters);
        self
    }
}

impl Debug for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("parameters", &self.parameters)
            .finish()
    }
}
