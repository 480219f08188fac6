//! Prompt assembly and response translation for a multi-backend chat gateway.
//!
//! A single generic chat-completion protocol (uniform roles, attachments,
//! tool/function calls) drives several incompatible backends. Some backends
//! accept a structured message array natively; others are raw text-completion
//! APIs that need a hand-built instruction template. This crate owns the
//! non-trivial middle:
//!
//! - a canonical, strongly-typed message model with bidirectional wire parsing
//! - a token-budget-aware prompt truncation algorithm
//! - chat-template emulation for completion-only backends
//! - tool/function calling-convention reconciliation and finish-reason mapping
//!
//! Network transport to the backend, authentication and server bootstrap live
//! outside this crate; the only I/O here is attachment resolution through the
//! [`storage::FileStorage`] collaborator.

pub mod attachments;
pub mod emulation;
pub mod errors;
pub mod models;
pub mod providers;
pub mod storage;
pub mod tools;
pub mod truncate;
