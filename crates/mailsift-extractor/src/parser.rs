//! Parse LLM output into a validated model reply

use crate::error::ResponseError;
use mailsift_domain::ModelReply;
use tracing::debug;

/// Parse and validate a raw model response
///
/// Any failure here is worth another attempt: the error text goes back to
/// the model as a corrective turn.
pub fn parse_model_reply(response: &str) -> Result<ModelReply, ResponseError> {
    let unfenced = strip_code_fence(response);
    let json_str = extract_json(unfenced);

    debug!("Extracted {} chars of JSON from response", json_str.len());

    let reply: ModelReply = serde_json::from_str(json_str)?;
    reply.validate().map_err(ResponseError::Invalid)?;
    Ok(reply)
}

/// Remove a surrounding markdown code fence, if present
///
/// LLMs sometimes wrap JSON in ```` ```json ```` blocks.
pub fn strip_code_fence(response: &str) -> &str {
    let mut text = response.trim();

    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }

    text.trim()
}

/// Find the first balanced JSON object or array in `text`
///
/// Scanning starts at whichever of `{` or `[` appears first. Brackets inside
/// string literals are ignored. When the brackets never balance, the trimmed
/// input is returned so the JSON parser can report the error.
pub fn extract_json(text: &str) -> &str {
    let trimmed = text.trim();

    let start = match (trimmed.find('{'), trimmed.find('[')) {
        (Some(brace), Some(bracket)) => brace.min(bracket),
        (Some(brace), None) => brace,
        (None, Some(bracket)) => bracket,
        (None, None) => return trimmed,
    };

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in trimmed[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    let end = start + offset + c.len_utf8();
                    return &trimmed[start..end];
                }
            }
            _ => {}
        }
    }

    trimmed
}
