//! Core Extractor implementation

use crate::config::ExtractorConfig;
use crate::error::{ExtractorError, ResponseError};
use crate::parser::parse_model_reply;
use crate::prompt::{PromptBuilder, PromptTemplate};
use crate::sanitizer::sanitize;
use mailsift_domain::traits::{CompletionProvider, ProviderError};
use mailsift_domain::{ChatMessage, Conversation, EmailRequest, ModelReply, ParsedResult};
use tracing::{debug, error, info, warn};

/// Outcome of one completion attempt
#[derive(Debug)]
pub enum Attempt {
    /// Model produced a valid reply
    Success(ParsedResult),

    /// Attempt failed; the reason is sent back to the model
    Retryable(String),

    /// Attempt failed in a way no further attempt can fix
    Fatal(ExtractorError),
}

impl Attempt {
    /// Classify a provider result against the sanitized email it was asked about
    pub fn from_outcome<E: ProviderError>(outcome: Result<String, E>, email_body: &str) -> Self {
        let response = match outcome {
            Ok(response) => response,
            Err(e) if e.is_retryable() => return Attempt::Retryable(e.to_string()),
            Err(e) => return Attempt::Fatal(ExtractorError::Provider(e.to_string())),
        };

        match parse_model_reply(&response) {
            Ok(reply) => Attempt::Success(ParsedResult::from_reply(reply, email_body)),
            Err(e) => e.into(),
        }
    }
}

/// Response errors are always worth another attempt
impl From<ResponseError> for Attempt {
    fn from(e: ResponseError) -> Self {
        Attempt::Retryable(e.to_string())
    }
}

/// User turn appended after a failed attempt
pub fn corrective_feedback(reason: &str) -> String {
    format!(
        "Previous attempt failed with error: {}. Please provide valid JSON matching the schema.",
        reason
    )
}

/// The Extractor turns a raw email into validated records via an LLM
///
/// Built once and shared; every call is independent and request-local.
pub struct Extractor<P: CompletionProvider> {
    provider: P,
    template: PromptTemplate,
    schema: String,
    config: ExtractorConfig,
}

impl<P: CompletionProvider> Extractor<P> {
    /// Create a new Extractor
    ///
    /// # Errors
    ///
    /// Returns `ExtractorError::Config` if `config` fails validation.
    pub fn new(
        provider: P,
        template: PromptTemplate,
        config: ExtractorConfig,
    ) -> Result<Self, ExtractorError> {
        config.validate().map_err(ExtractorError::Config)?;

        let schema = serde_json::to_string_pretty(&ModelReply::json_schema())
            .map_err(|e| ExtractorError::Config(format!("Failed to render schema: {}", e)))?;

        Ok(Self {
            provider,
            template,
            schema,
            config,
        })
    }

    /// JSON schema embedded in every prompt
    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Parse an email using the configured attempt budget
    pub async fn complete(
        &self,
        request: &EmailRequest,
    ) -> Result<Option<ParsedResult>, ExtractorError> {
        self.complete_with_retries(request, self.config.max_retries).await
    }

    /// Parse an email, making at most `max_retries` attempts
    ///
    /// Returns `Ok(None)` when every attempt produced an invalid reply.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The prompt template is missing a section or is malformed
    /// - The provider reports a non-retryable failure
    pub async fn complete_with_retries(
        &self,
        request: &EmailRequest,
        max_retries: u32,
    ) -> Result<Option<ParsedResult>, ExtractorError> {
        let email = sanitize(&request.email_body, self.config.max_chars);

        info!(
            "Parsing email: {} raw chars, {} after sanitizing",
            request.email_body.len(),
            email.len()
        );
        debug!("Sanitized email:\n{}", email);

        let prompt = PromptBuilder::new(&self.template, &self.config).build(&email, &self.schema)?;
        debug!("Prompt length: {} chars", prompt.len());

        let mut conversation = Conversation::with_prompt(prompt);

        for attempt in 1..=max_retries {
            debug!(
                "Attempt {}/{} with model {} ({} turns)",
                attempt,
                max_retries,
                self.provider.model_name(),
                conversation.len()
            );

            let outcome = self.provider.complete(&conversation).await;

            match Attempt::from_outcome(outcome, &email) {
                Attempt::Success(result) => {
                    info!(
                        "Extracted {} records on attempt {}",
                        result.emails.len(),
                        attempt
                    );
                    return Ok(Some(result));
                }
                Attempt::Retryable(reason) => {
                    warn!("Attempt {}/{} failed: {}", attempt, max_retries, reason);
                    if attempt < max_retries {
                        conversation.push(ChatMessage::user(corrective_feedback(&reason)));
                    }
                }
                Attempt::Fatal(e) => {
                    error!("Extraction aborted on attempt {}: {}", attempt, e);
                    return Err(e);
                }
            }
        }

        error!("All {} attempts failed", max_retries);
        Ok(None)
    }
}
