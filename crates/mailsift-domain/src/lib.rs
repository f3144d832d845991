//! Mailsift Domain Layer
//!
//! This crate contains the data model shared by every other Mailsift crate
//! and the trait boundary to the text-generation capability. It holds no
//! pipeline logic and performs no I/O.
//!
//! ## Key Concepts
//!
//! - **EmailRequest**: a raw, untrusted email blob submitted for parsing
//! - **ParsedEmail**: one extracted recipient record (customer, role, topic, date)
//! - **ModelReply**: the exact JSON shape the model is asked to produce
//! - **ParsedResult**: validated records plus the cleaned email text they came from
//! - **Conversation**: the ordered chat turns sent to the model on each attempt
//!
//! ## Architecture
//!
//! This crate follows Clean Architecture:
//! - Pure data types and validation only
//! - Infrastructure implementations (HTTP providers, servers) live in other crates
//! - Trait definitions for all external interactions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod email;
pub mod message;
pub mod traits;

// Re-exports for convenience
pub use email::{EmailRequest, ModelReply, ParsedEmail, ParsedResult, RecipientKind};
pub use message::{ChatMessage, Conversation, Role};
