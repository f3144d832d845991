//! Integration tests for the Extractor

#[cfg(test)]
mod tests {
    use crate::{Extractor, ExtractorConfig, ExtractorError, PromptError, PromptTemplate};
    use mailsift_domain::{EmailRequest, RecipientKind, Role};
    use mailsift_llm::{LlmError, MockProvider};
    use std::io::Write;

    const TEMPLATE: &str = r#"# Mail Parser

You extract customer records from support emails.

Email:
{email}

# Output Schema

Answer with JSON only, matching this schema:
{schema}

Example: {{"emails": [], "FULL_BODY": "..."}}
"#;

    const VALID_REPLY: &str = r#"```json
{
    "emails": [
        {
            "CUSTOMER_NAME": "Jane Roe",
            "MAIL_TYPE": "TO",
            "CUSTOMER_OPERATOR": "jane@acme.example",
            "TOPIC": "Order 4471 delayed",
            "MAIL_DATE": "2024-03-04"
        },
        {
            "CUSTOMER_NAME": "Sam Poe",
            "MAIL_TYPE": "CC",
            "CUSTOMER_OPERATOR": "sam@acme.example",
            "TOPIC": "Order 4471 delayed",
            "MAIL_DATE": "2024-03-04"
        }
    ],
    "FULL_BODY": "Where is my order?"
}
```"#;

    const RAW_EMAIL: &str = "From: Jane Roe <jane@acme.example>\r\n\
        To: ops@vendor.example\r\n\
        Cc: sam@acme.example\r\n\
        Subject: Order 4471\r\n\
        \r\n\
        Where is my order?\r\n\
        \r\n\
        On Mon, 4 Mar 2024, Ops <ops@vendor.example> wrote:\r\n\
        > It shipped last week.\r\n";

    fn create_test_extractor(provider: &MockProvider) -> Extractor<MockProvider> {
        Extractor::new(
            provider.clone(),
            PromptTemplate::new(TEMPLATE),
            ExtractorConfig::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_full_extraction_flow() {
        let provider = MockProvider::new(VALID_REPLY);
        let extractor = create_test_extractor(&provider);

        let result = extractor
            .complete(&EmailRequest::new(RAW_EMAIL))
            .await
            .unwrap()
            .expect("valid reply should produce a result");

        assert_eq!(result.emails.len(), 2);
        assert_eq!(result.emails[1].mail_type, RecipientKind::Cc);
        assert!(result.email_body.starts_with("From: Jane Roe"));
        assert!(result.email_body.ends_with("Where is my order?"));
        assert!(!result.email_body.contains("shipped last week"));

        let sent = provider.received();
        assert_eq!(sent.len(), 1);
        let prompt = &sent[0].messages()[0].content;
        assert!(prompt.contains("Where is my order?"));
        assert!(prompt.contains("\"FULL_BODY\""));
        assert!(prompt.contains("Example: {\"emails\": [], \"FULL_BODY\": \"...\"}"));
        assert!(!prompt.contains("{email}"));
    }

    #[tokio::test]
    async fn test_retry_then_success() {
        let provider = MockProvider::new(VALID_REPLY);
        provider.push_response("I could not find anything, sorry.");
        provider.push_response(r#"{"emails": [{"CUSTOMER_NAME": "Jane"}], "FULL_BODY": ""}"#);
        let extractor = create_test_extractor(&provider);

        let result = extractor
            .complete(&EmailRequest::new(RAW_EMAIL))
            .await
            .unwrap();

        assert!(result.is_some());
        assert_eq!(provider.call_count(), 3);

        let received = provider.received();
        let third = &received[2];
        assert_eq!(third.len(), 3);
        for turn in &third.messages()[1..] {
            assert_eq!(turn.role, Role::User);
            assert!(turn.content.starts_with("Previous attempt failed with error: "));
            assert!(turn
                .content
                .ends_with("Please provide valid JSON matching the schema."));
        }
    }

    #[tokio::test]
    async fn test_retries_exhausted() {
        let provider = MockProvider::new("still not JSON");
        let extractor = create_test_extractor(&provider);

        let result = extractor
            .complete(&EmailRequest::new(RAW_EMAIL))
            .await
            .unwrap();

        assert!(result.is_none());
        assert_eq!(provider.call_count(), 3);
        // No corrective turn after the final attempt
        assert_eq!(provider.received()[2].len(), 3);
    }

    #[tokio::test]
    async fn test_custom_retry_budget() {
        let provider = MockProvider::new("still not JSON");
        let extractor = create_test_extractor(&provider);

        let result = extractor
            .complete_with_retries(&EmailRequest::new(RAW_EMAIL), 1)
            .await
            .unwrap();

        assert!(result.is_none());
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_retryable_provider_error_recovers() {
        let provider = MockProvider::new(VALID_REPLY);
        provider.push_error(LlmError::RateLimitExceeded);
        let extractor = create_test_extractor(&provider);

        let result = extractor
            .complete(&EmailRequest::new(RAW_EMAIL))
            .await
            .unwrap();

        assert!(result.is_some());
        assert_eq!(provider.call_count(), 2);
        let received = provider.received();
        let corrective = &received[1].messages()[1].content;
        assert!(corrective.contains("Rate limit exceeded"));
    }

    #[tokio::test]
    async fn test_unavailable_model_is_retried() {
        let provider = MockProvider::new(VALID_REPLY);
        for _ in 0..3 {
            provider.push_error(LlmError::ModelNotAvailable("llama3".to_string()));
        }
        let extractor = create_test_extractor(&provider);

        let result = extractor
            .complete(&EmailRequest::new(RAW_EMAIL))
            .await
            .unwrap();

        assert!(result.is_none());
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_unavailable_model_then_success() {
        let provider = MockProvider::new(VALID_REPLY);
        provider.push_error(LlmError::ModelNotAvailable("llama3".to_string()));
        let extractor = create_test_extractor(&provider);

        let result = extractor
            .complete(&EmailRequest::new(RAW_EMAIL))
            .await
            .unwrap();

        assert!(result.is_some());
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_config_error_stops_immediately() {
        let provider = MockProvider::new(VALID_REPLY);
        provider.push_error(LlmError::Config("bad credentials file".to_string()));
        let extractor = create_test_extractor(&provider);

        let result = extractor.complete(&EmailRequest::new(RAW_EMAIL)).await;

        assert!(matches!(result, Err(ExtractorError::Provider(_))));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_section_is_not_retried() {
        let provider = MockProvider::new(VALID_REPLY);
        let extractor = Extractor::new(
            provider.clone(),
            PromptTemplate::new("# Mail Parser\n{email}\n"),
            ExtractorConfig::default(),
        )
        .unwrap();

        let result = extractor.complete(&EmailRequest::new(RAW_EMAIL)).await;

        assert!(matches!(
            result,
            Err(ExtractorError::Template(PromptError::SectionNotFound(_)))
        ));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_placeholder_is_not_retried() {
        let provider = MockProvider::new(VALID_REPLY);
        let extractor = Extractor::new(
            provider.clone(),
            PromptTemplate::new("# Mail Parser\n{email} {sender}\n# Output Schema\n{schema}"),
            ExtractorConfig::default(),
        )
        .unwrap();

        let result = extractor.complete(&EmailRequest::new(RAW_EMAIL)).await;

        assert!(matches!(
            result,
            Err(ExtractorError::Template(PromptError::PlaceholderMissing(key))) if key == "sender"
        ));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_email_braces_are_not_placeholders() {
        let provider = MockProvider::new(VALID_REPLY);
        let extractor = create_test_extractor(&provider);

        let request = EmailRequest::new("Subject: JSON question\n\nWhy does {schema} {{ }} break?");
        extractor.complete(&request).await.unwrap();

        let received = provider.received();
        let prompt = &received[0].messages()[0].content;
        assert!(prompt.contains("Why does {schema} {{ }} break?"));
    }

    #[tokio::test]
    async fn test_long_email_is_truncated() {
        let provider = MockProvider::new(VALID_REPLY);
        let config = ExtractorConfig {
            max_chars: 200,
            ..ExtractorConfig::default()
        };
        let extractor =
            Extractor::new(provider.clone(), PromptTemplate::new(TEMPLATE), config).unwrap();

        let body = "A line of complaint text.\n".repeat(100);
        let request = EmailRequest::new(format!("Subject: Long\n\n{}", body));
        let result = extractor.complete(&request).await.unwrap().unwrap();

        assert!(result.email_body.ends_with("[...TRUNCATED FOR LENGTH...]"));
        let budget = 200 + crate::sanitizer::TRUNCATION_MARKER.len();
        assert!(result.email_body.chars().count() <= budget);
    }

    #[tokio::test]
    async fn test_template_loaded_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TEMPLATE.as_bytes()).unwrap();

        let provider = MockProvider::new(VALID_REPLY);
        let extractor = Extractor::new(
            provider.clone(),
            PromptTemplate::from_file(file.path()).unwrap(),
            ExtractorConfig::default(),
        )
        .unwrap();

        let result = extractor.complete(&EmailRequest::new(RAW_EMAIL)).await.unwrap();
        assert!(result.is_some());
    }

    #[tokio::test]
    async fn test_shipped_template_renders() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../prompts/mail_parser.md");

        let provider = MockProvider::new(VALID_REPLY);
        let extractor = Extractor::new(
            provider.clone(),
            PromptTemplate::from_file(path).unwrap(),
            ExtractorConfig::default(),
        )
        .unwrap();

        let result = extractor.complete(&EmailRequest::new(RAW_EMAIL)).await.unwrap();
        assert!(result.is_some());

        let received = provider.received();
        let prompt = &received[0].messages()[0].content;
        assert!(prompt.contains("Where is my order?"));
        assert!(prompt.contains("\"CUSTOMER_OPERATOR\": \"jane@acme.example\""));
        assert!(!prompt.contains("{{"));
    }
}
