//! Email sanitization before prompting
//!
//! Reduces a raw email to the latest message only: attachment payloads and
//! quoted reply history are dropped and the result is bounded to a character
//! budget. Every step is a standalone `&str -> String` transform and none of
//! them can fail; a pattern that does not match leaves the text untouched.
//!
//! Order matters. `sanitize` applies:
//!
//! 1. line ending normalization
//! 2. header/body split on the first blank line
//! 3. base64 payload removal (body)
//! 4. binary part removal (body)
//! 5. quoted reply cut (body)
//! 6. signature cut (body)
//! 7. blank line collapsing
//! 8. budget truncation
//!
//! Steps 3 to 6 run over the whole text when there is no blank line and so
//! no body to isolate.

use lazy_static::lazy_static;
use regex::Regex;

/// Appended when the body had to be cut to fit the budget
pub const TRUNCATION_MARKER: &str = "\n[...TRUNCATED FOR LENGTH...]";

/// Body lines kept verbatim after the headers when truncating
pub const CONTEXT_LINES: usize = 5;

const BASE64_PLACEHOLDER_PREFIX: &str = "[BASE64 REMOVED";

lazy_static! {
    static ref BASE64_DECLARATION: Regex =
        Regex::new(r"(?i)^\s*content-transfer-encoding:\s*base64\b").unwrap();

    static ref BINARY_CONTENT_TYPE: Regex =
        Regex::new(r"(?i)^\s*content-type:\s*((?:image|application)/[^\s;]+)").unwrap();

    // Reply markers, matched at line start. Order is irrelevant: the earliest
    // match in the body wins.
    static ref QUOTE_MARKERS: Vec<Regex> = vec![
        // On Mon, 4 Mar 2024 at 10:02, Jane <jane@example.com> wrote:
        Regex::new(r"(?im)^[ \t]*on\b.*\bwrote:").unwrap(),
        // Il giorno lun 4 mar 2024 alle 10:02 Jane ha scritto:
        Regex::new(r"(?im)^[ \t]*il\b.*\bha scritto:").unwrap(),
        Regex::new(r"(?im)^[ \t]*-{2,}[ \t]*original message[ \t]*-{2,}").unwrap(),
        // Outlook header block
        Regex::new(r"(?im)^[ \t]*from:.*\n[ \t]*sent:").unwrap(),
        Regex::new(r"(?im)^[ \t]*da:.*\n[ \t]*inviato:").unwrap(),
    ];
}

/// Sanitize a raw email for prompting
///
/// Returns the header block, a blank line and the cleaned body, bounded to
/// `max_chars` characters plus [`TRUNCATION_MARKER`]. The header block and
/// the first [`CONTEXT_LINES`] body lines are kept even past the budget.
///
/// # Examples
///
/// ```
/// use mailsift_extractor::sanitizer::sanitize;
///
/// let raw = "Subject: Hi\r\n\r\nSee you soon.\r\n\r\nOn Mon, Bob wrote:\r\n> old";
/// assert_eq!(sanitize(raw, 2_000), "Subject: Hi\n\nSee you soon.");
/// ```
pub fn sanitize(raw: &str, max_chars: usize) -> String {
    let text = normalize_line_endings(raw);
    let (headers, body) = split_headers(text.trim_start());
    let headers = headers.trim_end();

    if body.trim().is_empty() {
        // No separate body: payloads and quoted history may still sit in the
        // header block itself.
        return collapse_blank_lines(&strip_noise(headers, false));
    }

    let body_is_payload = headers.lines().any(|line| BASE64_DECLARATION.is_match(line));
    let body = collapse_blank_lines(&strip_noise(body, body_is_payload));

    let cleaned = join_headers_and_body(headers, &body);
    if body.is_empty() || cleaned.chars().count() <= max_chars {
        return cleaned;
    }

    truncate_to_budget(headers, &body, max_chars)
}

/// Payload, binary part, quoted reply and signature removal, in that order
fn strip_noise(text: &str, payload_at_start: bool) -> String {
    let text = strip_base64_payloads(text, payload_at_start);
    let text = strip_binary_parts(&text);
    let text = cut_quoted_reply(&text);
    cut_signature(&text)
}

/// Convert `\r\n` and lone `\r` to `\n`
pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Split on the first blank line into `(headers, body)`
///
/// Without a blank line the whole text is headers and the body is empty.
pub fn split_headers(text: &str) -> (&str, &str) {
    let mut offset = 0;
    for line in text.split('\n') {
        if line.trim().is_empty() {
            let headers = &text[..offset];
            let body_start = (offset + line.len() + 1).min(text.len());
            return (headers.trim_end_matches('\n'), &text[body_start..]);
        }
        offset += line.len() + 1;
    }
    (text, "")
}

fn is_boundary(line: &str) -> bool {
    line.starts_with("--")
}

/// Drop base64 payloads following a `Content-Transfer-Encoding: base64` line
///
/// Everything after the declaration up to the next MIME boundary line is
/// replaced by a placeholder counting the removed lines and bytes. The
/// declaration and the boundary are kept. With `payload_at_start` the text
/// itself begins inside a payload (the declaration was in the top-level
/// headers). No placeholder is written for a declaration with nothing after
/// it, and an existing placeholder is left alone.
pub fn strip_base64_payloads(body: &str, payload_at_start: bool) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut skipping = payload_at_start;
    let mut removed_lines = 0usize;
    let mut removed_bytes = 0usize;

    for line in body.split('\n') {
        if skipping {
            if is_boundary(line) || line.starts_with(BASE64_PLACEHOLDER_PREFIX) {
                push_base64_placeholder(&mut out, removed_lines, removed_bytes);
                out.push(line.to_string());
                skipping = false;
            } else if !line.trim().is_empty() {
                removed_lines += 1;
                removed_bytes += line.trim().len();
            }
            continue;
        }

        out.push(line.to_string());
        if BASE64_DECLARATION.is_match(line) {
            skipping = true;
            removed_lines = 0;
            removed_bytes = 0;
        }
    }

    if skipping {
        push_base64_placeholder(&mut out, removed_lines, removed_bytes);
    }

    out.join("\n")
}

fn push_base64_placeholder(out: &mut Vec<String>, lines: usize, bytes: usize) {
    if lines > 0 {
        out.push(format!(
            "{} - {} lines, ~{} bytes]",
            BASE64_PLACEHOLDER_PREFIX, lines, bytes
        ));
    }
}

#[derive(Clone, Copy)]
enum BinaryPart {
    Outside,
    Headers,
    Payload,
}

/// Drop `image/*` and `application/*` parts
///
/// The `Content-Type` declaration, the part headers after it and the payload
/// after the separating blank line are replaced by one placeholder naming the
/// MIME type. The payload ends at the next blank line or boundary; a boundary
/// line is kept.
pub fn strip_binary_parts(body: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut state = BinaryPart::Outside;

    for line in body.split('\n') {
        match state {
            BinaryPart::Outside => {
                if let Some(caps) = BINARY_CONTENT_TYPE.captures(line) {
                    out.push(format!("[BINARY CONTENT REMOVED - {}]", &caps[1]));
                    state = BinaryPart::Headers;
                } else {
                    out.push(line.to_string());
                }
            }
            BinaryPart::Headers | BinaryPart::Payload if is_boundary(line) => {
                out.push(line.to_string());
                state = BinaryPart::Outside;
            }
            BinaryPart::Headers => {
                if line.trim().is_empty() {
                    state = BinaryPart::Payload;
                }
            }
            BinaryPart::Payload => {
                if line.trim().is_empty() {
                    out.push(String::new());
                    state = BinaryPart::Outside;
                }
            }
        }
    }

    out.join("\n")
}

/// Keep only the text before the earliest quoted-reply marker
pub fn cut_quoted_reply(body: &str) -> String {
    let first_marker = QUOTE_MARKERS
        .iter()
        .filter_map(|re| re.find(body).map(|m| m.start()))
        .min();

    match first_marker {
        Some(start) => body[..start].to_string(),
        None => body.to_string(),
    }
}

/// Keep only the text before a standalone `--` signature delimiter
pub fn cut_signature(body: &str) -> String {
    let mut offset = 0;
    for line in body.split('\n') {
        if line.trim_end() == "--" {
            return body[..offset].to_string();
        }
        offset += line.len() + 1;
    }
    body.to_string()
}

/// Collapse runs of three or more blank lines into one and trim the result
pub fn collapse_blank_lines(text: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut blank_run: Vec<&str> = Vec::new();

    for line in text.split('\n') {
        if line.trim().is_empty() {
            blank_run.push(line);
            continue;
        }
        flush_blank_run(&mut out, &mut blank_run);
        out.push(line);
    }
    flush_blank_run(&mut out, &mut blank_run);

    out.join("\n").trim().to_string()
}

fn flush_blank_run<'a>(out: &mut Vec<&'a str>, run: &mut Vec<&'a str>) {
    if run.len() >= 3 {
        out.push("");
    } else {
        out.extend(run.iter().copied());
    }
    run.clear();
}

fn join_headers_and_body(headers: &str, body: &str) -> String {
    if body.is_empty() {
        headers.trim().to_string()
    } else {
        format!("{}\n\n{}", headers, body).trim().to_string()
    }
}

/// Keep the headers and the first [`CONTEXT_LINES`] body lines, then further
/// body lines while they fit in `max_chars`
///
/// The header block and the context lines are always kept, even when they
/// alone exceed the budget. [`TRUNCATION_MARKER`] is appended when any body
/// line was dropped.
pub fn truncate_to_budget(headers: &str, body: &str, max_chars: usize) -> String {
    let mut out = headers.trim().to_string();
    let mut size = out.chars().count();
    let mut kept = 0usize;
    let lines: Vec<&str> = body.split('\n').collect();

    for line in &lines {
        let separator = match (kept, out.is_empty()) {
            (0, true) => "",
            (0, false) => "\n\n",
            _ => "\n",
        };
        let cost = separator.len() + line.chars().count();
        if kept >= CONTEXT_LINES && size + cost > max_chars {
            break;
        }
        out.push_str(separator);
        out.push_str(line);
        size += cost;
        kept += 1;
    }

    if kept < lines.len() {
        out.push_str(TRUNCATION_MARKER);
    }
    out
}
