//! Backend-specific translation layers. Each provider module converts the
//! canonical message model into its backend's native payload and maps the
//! backend's completion outcome back to the generic vocabulary.

pub mod claude;
