use std::collections::HashMap;
use helpdesk_common::error::error::{Error, Result};

#[derive(Clone, Debug, PartialEq)]
enum Segment {
    Text(String),
    Variable(String),
}

/// A prompt template supplied at runtime, using `{variable}` placeholders.
///
/// `{{` and `}}` produce literal braces.
#[derive(Clone, Debug, PartialEq)]
pub struct RuntimeTemplate {
    kind: String,
    segments: Vec<Segment>,
}

impl RuntimeTemplate {

    pub fn parse(kind: &str, source: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut text = String::new();
        let mut chars = source.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    text.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    text.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for n in chars.by_ref() {
                        if n == '}' {
                            closed = true;
                            break;
                        }
                        name.push(n);
                    }
                    let name = name.trim().to_string();
                    if !closed || name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                        return Err(Error::PromptRender {
                            kind: kind.to_string(),
                            cause: format!("malformed placeholder near '{{{}'", name),
                        });
                    }
                    if !text.is_empty() {
                        segments.push(Segment::Text(std::mem::take(&mut text)));
                    }
                    segments.push(Segment::Variable(name));
                }
                '}' => {
                    return Err(Error::PromptRender {
                        kind: kind.to_string(),
                        cause: String::from("unmatched '}'"),
                    });
                }
                other => text.push(other),
            }
        }
        if !text.is_empty() {
            segments.push(Segment::Text(text));
        }

        Ok(Self { kind: kind.to_string(), segments })
    }

    pub fn variables(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.segments.iter()
            .filter_map(|s| match s {
                Segment::Variable(name) => Some(name.as_str()),
                Segment::Text(_) => None,
            })
            .collect();
        names.dedup();
        names
    }

    pub fn render(&self, values: &HashMap<&str, String>) -> Result<String> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Variable(name) => {
                    let value = values.get(name.as_str()).ok_or_else(|| Error::PromptVariableMissing {
                        kind: self.kind.clone(),
                        variable: name.clone(),
                    })?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}
