//! Prompt template loading and assembly
//!
//! Templates are markdown documents. A section is addressed by its heading
//! title, case-insensitively and regardless of heading depth, and runs until
//! the next heading at the same or a shallower depth. Section text may carry
//! `{name}` placeholders; `{{` and `}}` render literal braces.

use crate::config::ExtractorConfig;
use crate::error::PromptError;
use std::collections::HashMap;
use std::path::Path;

/// Read a template, optionally narrow it to one section, and substitute
///
/// Substitution only runs when `substitutions` is non-empty, so a template
/// read without values keeps its braces untouched.
pub fn fetch_prompt(
    path: impl AsRef<Path>,
    section: Option<&str>,
    substitutions: &HashMap<&str, &str>,
) -> Result<String, PromptError> {
    PromptTemplate::from_file(path)?.render(section, substitutions)
}

/// A loaded prompt template
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    content: String,
}

impl PromptTemplate {
    /// Wrap template text
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    /// Load a UTF-8 template file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PromptError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| PromptError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(content))
    }

    /// Text of a named section, excluding its heading
    pub fn section(&self, name: &str) -> Result<String, PromptError> {
        extract_section(&self.content, name)
    }

    /// Select a section (or the whole template) and apply substitutions
    pub fn render(
        &self,
        section: Option<&str>,
        substitutions: &HashMap<&str, &str>,
    ) -> Result<String, PromptError> {
        let text = match section {
            Some(name) => self.section(name)?,
            None => self.content.clone(),
        };

        if substitutions.is_empty() {
            return Ok(text);
        }
        substitute(&text, substitutions)
    }
}

/// Parse a markdown heading into `(depth, title)`
fn parse_heading(line: &str) -> Option<(usize, &str)> {
    let trimmed = line.trim();
    if !trimmed.starts_with('#') {
        return None;
    }
    let title = trimmed.trim_start_matches('#');
    Some((trimmed.len() - title.len(), title.trim()))
}

/// Extract the body of the section whose heading matches `section_name`
///
/// Returns `SectionNotFound` when no heading matches or the matched section
/// holds only whitespace.
pub fn extract_section(content: &str, section_name: &str) -> Result<String, PromptError> {
    let wanted = section_name.trim().to_lowercase();
    let mut section_depth: Option<usize> = None;
    let mut captured: Vec<&str> = Vec::new();

    for line in content.lines() {
        if let Some((depth, title)) = parse_heading(line) {
            match section_depth {
                None if title.to_lowercase() == wanted => {
                    section_depth = Some(depth);
                    continue;
                }
                Some(current) if depth <= current => break,
                _ => {}
            }
        }

        if section_depth.is_some() {
            captured.push(line);
        }
    }

    let text = captured.join("\n").trim().to_string();
    if text.is_empty() {
        return Err(PromptError::SectionNotFound(section_name.to_string()));
    }
    Ok(text)
}

/// Replace `{name}` placeholders with their values
///
/// Values are inserted verbatim; braces inside them are never re-read.
pub fn substitute(template: &str, values: &HashMap<&str, &str>) -> Result<String, PromptError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        match c {
            '{' => {
                if matches!(chars.peek(), Some((_, '{'))) {
                    chars.next();
                    out.push('{');
                    continue;
                }

                let key_start = idx + 1;
                let mut key_end = None;
                for (j, next) in chars.by_ref() {
                    match next {
                        '}' => {
                            key_end = Some(j);
                            break;
                        }
                        '{' => {
                            return Err(PromptError::MalformedTemplate(format!(
                                "unexpected '{{' inside placeholder at byte {}",
                                j
                            )))
                        }
                        _ => {}
                    }
                }

                let key_end = key_end.ok_or_else(|| {
                    PromptError::MalformedTemplate(format!("unclosed '{{' at byte {}", idx))
                })?;
                let key = &template[key_start..key_end];
                let value = values
                    .get(key)
                    .ok_or_else(|| PromptError::PlaceholderMissing(key.to_string()))?;
                out.push_str(value);
            }
            '}' => {
                if matches!(chars.peek(), Some((_, '}'))) {
                    chars.next();
                    out.push('}');
                } else {
                    return Err(PromptError::MalformedTemplate(format!(
                        "single '}}' at byte {}",
                        idx
                    )));
                }
            }
            _ => out.push(c),
        }
    }

    Ok(out)
}

/// Builds the final extraction prompt from the template
pub struct PromptBuilder<'a> {
    template: &'a PromptTemplate,
    instructions_section: &'a str,
    schema_section: &'a str,
}

impl<'a> PromptBuilder<'a> {
    /// Create a builder using the section names from `config`
    pub fn new(template: &'a PromptTemplate, config: &'a ExtractorConfig) -> Self {
        Self {
            template,
            instructions_section: &config.instructions_section,
            schema_section: &config.schema_section,
        }
    }

    /// Instructions with `{email}` filled, a blank line, then the schema
    /// section with `{schema}` filled
    pub fn build(&self, email: &str, schema: &str) -> Result<String, PromptError> {
        let instructions = self.template.render(
            Some(self.instructions_section),
            &HashMap::from([("email", email)]),
        )?;
        let schema_part = self.template.render(
            Some(self.schema_section),
            &HashMap::from([("schema", schema)]),
        )?;

        Ok(format!("{}\n\n{}", instructions, schema_part))
    }
}
