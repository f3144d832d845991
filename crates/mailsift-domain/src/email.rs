//! Email request and extraction result types
//!
//! Field names on the wire are upper snake case (`CUSTOMER_NAME`, `MAIL_TYPE`, ...)
//! because the prompt template and downstream consumers address them that way.

use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

/// Request to parse a raw email
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailRequest {
    /// Full raw email body to parse
    pub email_body: String,
}

impl EmailRequest {
    /// Create a request from raw email text
    pub fn new(email_body: impl Into<String>) -> Self {
        Self {
            email_body: email_body.into(),
        }
    }
}

/// How a customer appears on the message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecipientKind {
    /// Primary recipient
    To,
    /// Carbon copy
    Cc,
    /// Blind carbon copy
    Bcc,
}

/// A single record extracted from an email
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ParsedEmail {
    /// Name of the customer
    pub customer_name: String,

    /// Type of email recipient (TO, CC, or BCC)
    pub mail_type: RecipientKind,

    /// Email address of the customer
    pub customer_operator: String,

    /// Topic of the email
    pub topic: String,

    /// Date of the email in YYYY-MM-DD format
    pub mail_date: String,
}

impl ParsedEmail {
    /// Validate that every text field is populated
    pub fn validate(&self) -> Result<(), String> {
        let fields = [
            ("CUSTOMER_NAME", &self.customer_name),
            ("CUSTOMER_OPERATOR", &self.customer_operator),
            ("TOPIC", &self.topic),
            ("MAIL_DATE", &self.mail_date),
        ];

        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(format!("{} is empty", name));
            }
        }
        Ok(())
    }
}

/// The JSON document the model is instructed to return
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ModelReply {
    /// List of parsed email entries
    pub emails: Vec<ParsedEmail>,

    /// Full body content of the email
    #[serde(rename = "FULL_BODY")]
    pub full_body: String,
}

impl ModelReply {
    /// JSON schema describing this reply, as embedded in the prompt
    pub fn json_schema() -> serde_json::Value {
        serde_json::to_value(schema_for!(ModelReply)).unwrap_or_default()
    }

    /// Validate every record, reporting the first offending index
    pub fn validate(&self) -> Result<(), String> {
        for (idx, email) in self.emails.iter().enumerate() {
            email
                .validate()
                .map_err(|e| format!("emails[{}]: {}", idx, e))?;
        }
        Ok(())
    }
}

/// A fully validated extraction
///
/// `email_body` is the sanitized text that was sent to the model, not the
/// model's own echo of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedResult {
    /// Extracted records
    pub emails: Vec<ParsedEmail>,

    /// Cleaned email text the records were extracted from
    #[serde(rename = "EMAIL_BODY")]
    pub email_body: String,
}

impl ParsedResult {
    /// Combine a validated model reply with the text it was produced from
    pub fn from_reply(reply: ModelReply, email_body: impl Into<String>) -> Self {
        Self {
            emails: reply.emails,
            email_body: email_body.into(),
        }
    }
}
