//! These models represent the objects passed between the gateway protocol
//! and the backend providers.
//!
//! There are several related formats in play:
//! - wire messages, received from gateway clients (role + optional fields)
//! - the canonical message model, a closed set of role/shape variants that
//!   all core algorithms match on exhaustively
//! - backend payloads, built per provider from the canonical model
//!
//! Wire input is converted into the canonical model immediately on receipt;
//! anything that does not match exactly one variant is a validation error,
//! never a silent coercion.

pub mod attachment;
pub mod message;
pub mod tool;
