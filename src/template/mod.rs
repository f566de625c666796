//! Template engine for variable substitution.
//!
//! This module provides a small template engine that performs `{variable}`
//! substitution in strings. It is used for:
//!
//! - Prompt templates (rendered per invocation with the coerced input)
//! - Global `vars` substitution in agent descriptions and instructions
//!
//! # Syntax
//!
//! - `{name}` - Substitutes the value of variable `name`
//! - `{{` - Renders as literal `{`
//! - `}}` - Renders as literal `}`
//!
//! # Error Handling
//!
//! Compilation and rendering are split: syntax problems (unmatched `{`,
//! empty `{}`) fail at [`Template::compile`] time so a bad template aborts
//! an agent build, while undefined variables fail at [`Template::render`]
//! time. The engine never substitutes silently with empty strings; a typo
//! in a variable name is an error, not a blank.

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;
use std::fmt;

/// Error type for template compile and render failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// A variable was referenced but not provided.
    UndefinedVariable {
        /// The name of the undefined variable.
        name: String,
        /// The position in the template where the variable was found.
        position: usize,
    },
    /// A `{` was found without a matching `}`.
    UnmatchedBrace {
        /// The position of the unmatched `{`.
        position: usize,
    },
    /// An empty variable name was found (e.g., `{}`).
    EmptyVariableName {
        /// The position of the empty variable.
        position: usize,
    },
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::UndefinedVariable { name, position } => {
                write!(
                    f,
                    "undefined variable '{}' at position {} in template",
                    name, position
                )
            }
            TemplateError::UnmatchedBrace { position } => {
                write!(f, "unmatched '{{' at position {} in template", position)
            }
            TemplateError::EmptyVariableName { position } => {
                write!(
                    f,
                    "empty variable name '{{}}' at position {} in template",
                    position
                )
            }
        }
    }
}

impl std::error::Error for TemplateError {}

/// One parsed piece of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// Literal text, emitted as-is.
    Literal(String),
    /// A `{name}` placeholder and its source position.
    Placeholder { name: String, position: usize },
}

/// A compiled template, ready to render against a variable map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    /// Compile a template string into renderable segments.
    ///
    /// Fails on unmatched `{` or an empty `{}` placeholder; undefined
    /// variables are only detected at render time.
    pub fn compile(template: &str) -> Result<Template, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.char_indices().peekable();

        while let Some((pos, ch)) = chars.next() {
            match ch {
                '{' => {
                    // Check for escape sequence {{
                    if let Some((_, '{')) = chars.peek() {
                        chars.next();
                        literal.push('{');
                        continue;
                    }

                    let start_pos = pos;
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some((_, '}')) => break,
                            Some((_, c)) => name.push(c),
                            None => {
                                return Err(TemplateError::UnmatchedBrace {
                                    position: start_pos,
                                });
                            }
                        }
                    }

                    let name = name.trim();
                    if name.is_empty() {
                        return Err(TemplateError::EmptyVariableName {
                            position: start_pos,
                        });
                    }

                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder {
                        name: name.to_string(),
                        position: start_pos,
                    });
                }
                '}' => {
                    // }} escapes to }; a lone } is just a regular character.
                    if let Some((_, '}')) = chars.peek() {
                        chars.next();
                    }
                    literal.push('}');
                }
                _ => literal.push(ch),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Template { segments })
    }

    /// Render the template by substituting variables.
    pub fn render(&self, variables: &BTreeMap<String, String>) -> Result<String, TemplateError> {
        let mut result = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => result.push_str(text),
                Segment::Placeholder { name, position } => match variables.get(name) {
                    Some(value) => result.push_str(value),
                    None => {
                        return Err(TemplateError::UndefinedVariable {
                            name: name.clone(),
                            position: *position,
                        });
                    }
                },
            }
        }
        Ok(result)
    }

    /// The variable names this template references, in order of appearance.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Placeholder { name, .. } => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }
}

/// Compile and render in one step.
pub fn render_template(
    template: &str,
    variables: &BTreeMap<String, String>,
) -> Result<String, TemplateError> {
    Template::compile(template)?.render(variables)
}
