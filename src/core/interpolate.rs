/// Text interpolation — parsing `{name}` placeholders and rendering
/// them against the variable store.

use thiserror::Error;

use crate::core::vars::VariableStore;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template parse error: {0}")]
    Parse(String),
}

/// A segment of a parsed text template.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Literal text, emitted as-is.
    Literal(String),
    /// A `{name}` placeholder substituted from the variable store.
    Placeholder(String),
}

/// Authored text compiled into renderable segments.
///
/// The original source string is kept alongside so verbatim-mode
/// contexts and hosts inspecting the document see exactly what was
/// authored.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parse a text string into literal and placeholder segments.
    ///
    /// Syntax:
    /// - `{name}` → placeholder
    /// - `{{` / `}}` → literal `{` / `}`
    /// - Everything else → literal text
    pub fn parse(input: &str) -> Result<Template, TemplateError> {
        let mut segments = Vec::new();
        let mut literal_buf = String::new();
        let chars: Vec<char> = input.chars().collect();
        let len = chars.len();
        let mut i = 0;

        while i < len {
            if chars[i] == '{' {
                // Escaped brace
                if i + 1 < len && chars[i + 1] == '{' {
                    literal_buf.push('{');
                    i += 2;
                    continue;
                }

                // Flush any accumulated literal
                if !literal_buf.is_empty() {
                    segments.push(Segment::Literal(literal_buf.clone()));
                    literal_buf.clear();
                }

                // Find the closing brace
                let start = i + 1;
                let mut end = start;
                let mut closed = false;
                while end < len {
                    if chars[end] == '{' {
                        return Err(TemplateError::Parse(
                            "nested braces are not allowed".to_string(),
                        ));
                    }
                    if chars[end] == '}' {
                        closed = true;
                        break;
                    }
                    end += 1;
                }

                if !closed {
                    return Err(TemplateError::Parse("unclosed brace".to_string()));
                }

                let name: String = chars[start..end].iter().collect();
                if name.is_empty() {
                    return Err(TemplateError::Parse("empty braces".to_string()));
                }

                segments.push(Segment::Placeholder(name));
                i = end + 1;
            } else if chars[i] == '}' {
                // Escaped closing brace
                if i + 1 < len && chars[i + 1] == '}' {
                    literal_buf.push('}');
                    i += 2;
                    continue;
                }
                return Err(TemplateError::Parse(
                    "unmatched closing brace".to_string(),
                ));
            } else {
                literal_buf.push(chars[i]);
                i += 1;
            }
        }

        if !literal_buf.is_empty() {
            segments.push(Segment::Literal(literal_buf));
        }

        Ok(Template {
            source: input.to_string(),
            segments,
        })
    }

    /// Wrap text as a single literal segment, performing no placeholder
    /// parsing. Used when interpolation is disabled for the context.
    pub fn verbatim(input: impl Into<String>) -> Template {
        let source = input.into();
        let segments = vec![Segment::Literal(source.clone())];
        Template { source, segments }
    }

    /// The authored text, exactly as it appeared in the document.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Render against the current variable snapshot. Pure and
    /// reentrant: no state is touched anywhere.
    ///
    /// An unknown placeholder passes through literally as `{name}`, so
    /// an authoring typo stays visible instead of vanishing.
    pub fn render(&self, vars: &VariableStore) -> String {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(name) => match vars.get(name) {
                    Some(value) => out.push_str(value.render()),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                },
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_literal_only() {
        let t = Template::parse("Hello, world.").unwrap();
        assert_eq!(
            t.segments(),
            &[Segment::Literal("Hello, world.".to_string())]
        );
    }

    #[test]
    fn parse_placeholder() {
        let t = Template::parse("hi {name}!").unwrap();
        assert_eq!(
            t.segments(),
            &[
                Segment::Literal("hi ".to_string()),
                Segment::Placeholder("name".to_string()),
                Segment::Literal("!".to_string()),
            ]
        );
    }

    #[test]
    fn parse_escaped_braces() {
        let t = Template::parse("Use {{braces}} here.").unwrap();
        assert_eq!(
            t.segments(),
            &[Segment::Literal("Use {braces} here.".to_string())]
        );
    }

    #[test]
    fn parse_empty_braces_error() {
        assert!(Template::parse("Bad {} here").is_err());
    }

    #[test]
    fn parse_nested_braces_error() {
        assert!(Template::parse("Bad {outer{inner}} here").is_err());
    }

    #[test]
    fn parse_unclosed_brace_error() {
        assert!(Template::parse("Bad {unclosed here").is_err());
    }

    #[test]
    fn parse_unmatched_close_error() {
        assert!(Template::parse("Bad } here").is_err());
    }

    #[test]
    fn render_no_placeholders_unchanged() {
        let vars = VariableStore::new();
        let t = Template::parse("plain text").unwrap();
        assert_eq!(t.render(&vars), "plain text");
    }

    #[test]
    fn render_substitutes_current_value() {
        let mut vars = VariableStore::new();
        vars.set_str("name", "Ann");
        let t = Template::parse("hi {name}").unwrap();
        assert_eq!(t.render(&vars), "hi Ann");

        // Re-render after an overwrite picks up the new value with no
        // residue from the old one.
        vars.set_str("name", "Bo");
        assert_eq!(t.render(&vars), "hi Bo");
    }

    #[test]
    fn render_boolean_spelling() {
        let mut vars = VariableStore::new();
        vars.set_bool("armed", true);
        vars.set_bool("safe", false);
        let t = Template::parse("armed={armed} safe={safe}").unwrap();
        assert_eq!(t.render(&vars), "armed=true safe=false");
    }

    #[test]
    fn render_unknown_placeholder_passes_through() {
        let vars = VariableStore::new();
        let t = Template::parse("hi {name}").unwrap();
        assert_eq!(t.render(&vars), "hi {name}");
    }

    #[test]
    fn verbatim_keeps_braces_as_text() {
        let vars = VariableStore::new();
        let t = Template::verbatim("hi {name}");
        assert_eq!(t.render(&vars), "hi {name}");
        assert_eq!(t.source(), "hi {name}");
    }
}
