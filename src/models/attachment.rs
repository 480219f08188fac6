use serde::{Deserialize, Serialize};

/// An attachment on a user or assistant message: either inline base64 data
/// with an explicit content type, or a URL whose type may be inferred from
/// its extension. Resolved to inline bytes at read time, never cached.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Attachment {
    pub fn from_data<T: Into<String>, D: Into<String>>(content_type: T, data: D) -> Self {
        Attachment {
            content_type: Some(content_type.into()),
            data: Some(data.into()),
            ..Default::default()
        }
    }

    pub fn from_url<U: Into<String>>(url: U) -> Self {
        Attachment {
            url: Some(url.into()),
            ..Default::default()
        }
    }
}

/// Extension point of the wire protocol; only attachments are understood here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Attachment>>,
}
