/// Dialogue graph vertices — the five node shapes a document may author.

use serde::Deserialize;

use crate::core::interpolate::Template;

/// A single vertex of a compiled dialogue graph.
///
/// Node identity is positional: a node's id is its index in
/// [`DialogueDocument::nodes`](crate::schema::document::DialogueDocument).
/// Labels, when authored, are resolved through the document's label index.
#[derive(Debug, Clone)]
pub enum Node {
    /// A line spoken by a character, with a single successor.
    Line {
        speaker: String,
        text: Template,
        /// Opaque authored metadata (e.g. an embedded JSON document),
        /// surfaced verbatim.
        metadata: Option<String>,
        next: usize,
    },
    /// An ordered set of options offered to the player; execution
    /// suspends here until a reply picks one.
    Choice { options: Vec<ChoiceOption> },
    /// A scripted event: the named host callback fires, then execution
    /// continues to the successor.
    Call { function: String, next: usize },
    /// An invisible weighted branch resolved by the seeded random source.
    Branch { targets: Vec<BranchTarget> },
    /// Terminal. Stepping here reports `Done`, forever.
    End,
}

/// One option of a [`Node::Choice`].
#[derive(Debug, Clone)]
pub struct ChoiceOption {
    pub text: Template,
    pub next: usize,
    /// Name of a boolean variable gating visibility. Absent or
    /// non-boolean variables hide the option.
    pub condition: Option<String>,
}

/// One weighted successor of a [`Node::Branch`].
#[derive(Debug, Clone)]
pub struct BranchTarget {
    pub next: usize,
    pub weight: u32,
}

// JSON deserialization shapes — the authored format differs from the
// compiled types (raw text vs. parsed templates), so we go through
// intermediate structs.

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum RawNode {
    Line {
        speaker: String,
        text: String,
        #[serde(default)]
        metadata: Option<String>,
        #[serde(default)]
        label: Option<String>,
        next: usize,
    },
    Choice {
        options: Vec<RawOption>,
        #[serde(default)]
        label: Option<String>,
    },
    Call {
        function: String,
        #[serde(default)]
        label: Option<String>,
        next: usize,
    },
    Branch {
        targets: Vec<RawTarget>,
        #[serde(default)]
        label: Option<String>,
    },
    End {
        #[serde(default)]
        label: Option<String>,
    },
}

impl RawNode {
    pub(crate) fn label(&self) -> Option<&str> {
        match self {
            RawNode::Line { label, .. }
            | RawNode::Choice { label, .. }
            | RawNode::Call { label, .. }
            | RawNode::Branch { label, .. }
            | RawNode::End { label, .. } => label.as_deref(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawOption {
    pub text: String,
    pub next: usize,
    #[serde(default)]
    pub condition: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawTarget {
    pub next: usize,
    pub weight: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_node_tagged_deserialization() {
        let json = r#"{ "type": "line", "speaker": "a", "text": "b", "next": 1 }"#;
        let raw: RawNode = serde_json::from_str(json).unwrap();
        assert!(matches!(raw, RawNode::Line { next: 1, .. }));
    }

    #[test]
    fn raw_node_optional_fields_default() {
        let json = r#"{ "type": "line", "speaker": "a", "text": "b", "next": 0 }"#;
        let raw: RawNode = serde_json::from_str(json).unwrap();
        match raw {
            RawNode::Line {
                metadata, label, ..
            } => {
                assert!(metadata.is_none());
                assert!(label.is_none());
            }
            _ => panic!("expected line"),
        }
    }

    #[test]
    fn raw_node_unknown_tag_rejected() {
        let json = r#"{ "type": "teleport", "next": 0 }"#;
        assert!(serde_json::from_str::<RawNode>(json).is_err());
    }

    #[test]
    fn raw_option_condition_defaults_to_none() {
        let json = r#"{ "text": "ok", "next": 3 }"#;
        let opt: RawOption = serde_json::from_str(json).unwrap();
        assert!(opt.condition.is_none());
    }

    #[test]
    fn label_accessor_covers_all_shapes() {
        let json = r#"{ "type": "end", "label": "finale" }"#;
        let raw: RawNode = serde_json::from_str(json).unwrap();
        assert_eq!(raw.label(), Some("finale"));
    }
}
