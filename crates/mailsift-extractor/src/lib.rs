//! Mailsift Extractor
//!
//! Turns a raw email into validated customer records using an LLM.
//!
//! # Overview
//!
//! A raw email is sanitized to fit a character budget, embedded into a
//! prompt assembled from a markdown template, and sent to a completion
//! provider. The reply is parsed and validated against the `ModelReply`
//! schema. Invalid replies are fed back to the model as corrective turns
//! until the attempt budget runs out.
//!
//! # Architecture
//!
//! ```text
//! Raw email → Sanitizer → PromptBuilder → Provider → Parser → ParsedResult
//!                                            ↑          │
//!                                            └──────────┘ corrective turn
//! ```
//!
//! # Example Usage
//!
//! ```no_run
//! use mailsift_domain::EmailRequest;
//! use mailsift_extractor::{Extractor, ExtractorConfig, PromptTemplate};
//! use mailsift_llm::MockProvider;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = MockProvider::new(r#"{"emails": [], "FULL_BODY": ""}"#);
//! let template = PromptTemplate::from_file("prompts/mail_parser.md")?;
//! let extractor = Extractor::new(provider, template, ExtractorConfig::default())?;
//!
//! let request = EmailRequest::new("From: jane@acme.example\n\nHello!");
//! match extractor.complete(&request).await? {
//!     Some(result) => println!("Extracted {} records", result.emails.len()),
//!     None => println!("Model never produced a valid reply"),
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod extractor;
mod parser;
mod prompt;
pub mod sanitizer;

#[cfg(test)]
mod tests;

pub use config::{ExtractorConfig, DEFAULT_MAX_CHARS, DEFAULT_MAX_RETRIES};
pub use error::{ExtractorError, PromptError, ResponseError};
pub use extractor::{corrective_feedback, Attempt, Extractor};
pub use parser::{extract_json, parse_model_reply, strip_code_fence};
pub use prompt::{extract_section, fetch_prompt, substitute, PromptBuilder, PromptTemplate};
pub use sanitizer::sanitize;
