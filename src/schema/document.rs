/// Document loading and validation — JSON bytes in, immutable graph out.

use rustc_hash::FxHashMap;
use serde::Deserialize;
use thiserror::Error;

use crate::core::interpolate::Template;
use crate::schema::node::{BranchTarget, ChoiceOption, Node, RawNode};

/// The only document version this build understands.
pub const CURRENT_VERSION: u64 = 1;

/// Classification of a JSON parse failure, so embedding code can give
/// precise authoring feedback instead of one opaque "bad JSON".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonErrorKind {
    SyntaxError,
    UnexpectedEndOfInput,
    MissingField,
    UnknownField,
    DuplicateField,
    InvalidEnumTag,
    LengthMismatch,
    InvalidNumber,
    Overflow,
    UnexpectedToken,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unsupported dialogue document version {0}")]
    UnknownVersion(u64),
    #[error("node {node}: successor {next} does not exist")]
    BadNextNode { node: usize, next: usize },
    #[error("node {index}: {reason}")]
    InvalidNode { index: usize, reason: String },
    #[error("{message}")]
    Json {
        kind: JsonErrorKind,
        message: String,
    },
}

impl From<serde_json::Error> for LoadError {
    fn from(err: serde_json::Error) -> Self {
        LoadError::Json {
            kind: classify_json_error(&err),
            message: err.to_string(),
        }
    }
}

/// Map a serde_json failure onto the stable kind enumeration.
///
/// serde's data errors only carry a message, so the data-tier kinds are
/// recovered from the fixed message prefixes serde emits.
fn classify_json_error(err: &serde_json::Error) -> JsonErrorKind {
    if err.is_eof() {
        return JsonErrorKind::UnexpectedEndOfInput;
    }
    let msg = err.to_string();
    if err.is_data() {
        if msg.starts_with("missing field") {
            JsonErrorKind::MissingField
        } else if msg.starts_with("unknown field") {
            JsonErrorKind::UnknownField
        } else if msg.starts_with("duplicate field") {
            JsonErrorKind::DuplicateField
        } else if msg.starts_with("unknown variant") {
            JsonErrorKind::InvalidEnumTag
        } else if msg.starts_with("invalid length") {
            JsonErrorKind::LengthMismatch
        } else if msg.starts_with("invalid value: integer") {
            // A well-formed integer the target type cannot hold, e.g. a
            // negative version.
            JsonErrorKind::Overflow
        } else {
            // "invalid type", "invalid value" on non-integers
            JsonErrorKind::UnexpectedToken
        }
    } else if msg.contains("out of range") {
        // Too wide for any JSON number at all.
        JsonErrorKind::Overflow
    } else if msg.contains("number") {
        JsonErrorKind::InvalidNumber
    } else {
        JsonErrorKind::SyntaxError
    }
}

/// Whether line and option text is compiled into interpolation templates
/// or kept verbatim (braces and all).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMode {
    Interpolated,
    Verbatim,
}

/// A loaded, validated dialogue graph. Immutable after construction.
#[derive(Debug, Clone)]
pub struct DialogueDocument {
    nodes: Vec<Node>,
    labels: FxHashMap<String, usize>,
}

// Version is probed before the full parse so a future-format document
// reports UnknownVersion rather than whatever shape error its new node
// kinds would produce.
#[derive(Debug, Deserialize)]
struct VersionProbe {
    version: u64,
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    #[allow(dead_code)]
    version: u64,
    nodes: Vec<RawNode>,
}

impl DialogueDocument {
    /// Load a document from authored JSON, compiling interpolation
    /// templates.
    pub fn load(json: &str) -> Result<DialogueDocument, LoadError> {
        Self::load_with(json, TextMode::Interpolated)
    }

    /// Load a document with an explicit text mode. `Verbatim` skips
    /// template compilation entirely, so braces in authored text are
    /// plain characters and never a load error.
    pub fn load_with(json: &str, mode: TextMode) -> Result<DialogueDocument, LoadError> {
        let probe: VersionProbe = serde_json::from_str(json)?;
        if probe.version != CURRENT_VERSION {
            return Err(LoadError::UnknownVersion(probe.version));
        }

        let raw: RawDocument = serde_json::from_str(json)?;
        let count = raw.nodes.len();
        if count == 0 {
            // Node 0 is the canonical start; it has to exist.
            return Err(LoadError::InvalidNode {
                index: 0,
                reason: "document has no nodes".to_string(),
            });
        }

        let mut labels = FxHashMap::default();
        for (index, node) in raw.nodes.iter().enumerate() {
            if let Some(label) = node.label() {
                if labels.insert(label.to_string(), index).is_some() {
                    return Err(LoadError::InvalidNode {
                        index,
                        reason: format!("duplicate label '{label}'"),
                    });
                }
            }
        }

        let check_next = |node: usize, next: usize| {
            if next < count {
                Ok(next)
            } else {
                Err(LoadError::BadNextNode { node, next })
            }
        };

        let compile_text = |index: usize, text: String| match mode {
            TextMode::Verbatim => Ok(Template::verbatim(text)),
            TextMode::Interpolated => {
                Template::parse(&text).map_err(|err| LoadError::InvalidNode {
                    index,
                    reason: err.to_string(),
                })
            }
        };

        let mut nodes = Vec::with_capacity(count);
        for (index, raw_node) in raw.nodes.into_iter().enumerate() {
            let node = match raw_node {
                RawNode::Line {
                    speaker,
                    text,
                    metadata,
                    next,
                    ..
                } => Node::Line {
                    speaker,
                    text: compile_text(index, text)?,
                    metadata,
                    next: check_next(index, next)?,
                },
                RawNode::Choice { options, .. } => {
                    if options.is_empty() {
                        return Err(LoadError::InvalidNode {
                            index,
                            reason: "choice has no options".to_string(),
                        });
                    }
                    let mut compiled = Vec::with_capacity(options.len());
                    for opt in options {
                        compiled.push(ChoiceOption {
                            text: compile_text(index, opt.text)?,
                            next: check_next(index, opt.next)?,
                            condition: opt.condition,
                        });
                    }
                    Node::Choice { options: compiled }
                }
                RawNode::Call { function, next, .. } => Node::Call {
                    function,
                    next: check_next(index, next)?,
                },
                RawNode::Branch { targets, .. } => {
                    if targets.is_empty() {
                        return Err(LoadError::InvalidNode {
                            index,
                            reason: "branch has no targets".to_string(),
                        });
                    }
                    if targets.iter().all(|t| t.weight == 0) {
                        return Err(LoadError::InvalidNode {
                            index,
                            reason: "branch weights are all zero".to_string(),
                        });
                    }
                    Node::Branch {
                        targets: targets
                            .into_iter()
                            .map(|t| {
                                Ok(BranchTarget {
                                    next: check_next(index, t.next)?,
                                    weight: t.weight,
                                })
                            })
                            .collect::<Result<_, LoadError>>()?,
                    }
                }
                RawNode::End { .. } => Node::End,
            };
            nodes.push(node);
        }

        Ok(DialogueDocument { nodes, labels })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Resolve an authored label to its node index.
    pub fn node_by_label(&self, label: &str) -> Option<usize> {
        self.labels.get(label).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = r#"{
        "version": 1,
        "nodes": [
            { "type": "line", "speaker": "test", "text": "hello world!", "next": 1 },
            { "type": "line", "speaker": "test", "text": "goodbye cruel world!", "next": 2 },
            { "type": "end" }
        ]
    }"#;

    #[test]
    fn load_small_document() {
        let doc = DialogueDocument::load(SMALL).unwrap();
        assert_eq!(doc.len(), 3);
        assert!(matches!(doc.node(2), Some(Node::End)));
    }

    #[test]
    fn unknown_version_reported_before_shape_errors() {
        // The node shape is nonsense but version must win.
        let json = r#"{ "version": 9, "nodes": [ { "type": "warp" } ] }"#;
        let err = DialogueDocument::load(json).unwrap_err();
        assert!(matches!(err, LoadError::UnknownVersion(9)));
    }

    #[test]
    fn missing_version_is_missing_field() {
        let json = r#"{ "nodes": [] }"#;
        let err = DialogueDocument::load(json).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Json {
                kind: JsonErrorKind::MissingField,
                ..
            }
        ));
    }

    #[test]
    fn dangling_successor_is_bad_next_node() {
        let json = r#"{
            "version": 1,
            "nodes": [ { "type": "line", "speaker": "a", "text": "b", "next": 7 } ]
        }"#;
        let err = DialogueDocument::load(json).unwrap_err();
        assert!(matches!(err, LoadError::BadNextNode { node: 0, next: 7 }));
    }

    #[test]
    fn dangling_option_successor_is_bad_next_node() {
        let json = r#"{
            "version": 1,
            "nodes": [
                { "type": "choice", "options": [ { "text": "x", "next": 9 } ] }
            ]
        }"#;
        let err = DialogueDocument::load(json).unwrap_err();
        assert!(matches!(err, LoadError::BadNextNode { node: 0, next: 9 }));
    }

    #[test]
    fn unknown_node_shape_is_invalid_enum_tag() {
        let json = r#"{
            "version": 1,
            "nodes": [ { "type": "teleport", "next": 0 } ]
        }"#;
        let err = DialogueDocument::load(json).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Json {
                kind: JsonErrorKind::InvalidEnumTag,
                ..
            }
        ));
    }

    #[test]
    fn negative_version_is_overflow() {
        let err = DialogueDocument::load(r#"{ "version": -1, "nodes": [] }"#).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Json {
                kind: JsonErrorKind::Overflow,
                ..
            }
        ));
    }

    #[test]
    fn oversized_version_is_overflow() {
        let err =
            DialogueDocument::load(r#"{ "version": 99999999999999999999999, "nodes": [] }"#)
                .unwrap_err();
        assert!(matches!(
            err,
            LoadError::Json {
                kind: JsonErrorKind::Overflow,
                ..
            }
        ));
    }

    #[test]
    fn truncated_document_is_eof() {
        let err = DialogueDocument::load(r#"{ "version": 1, "nodes": ["#).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Json {
                kind: JsonErrorKind::UnexpectedEndOfInput,
                ..
            }
        ));
    }

    #[test]
    fn malformed_token_is_syntax_error() {
        let err = DialogueDocument::load(r#"{ "version": 1, nodes }"#).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Json {
                kind: JsonErrorKind::SyntaxError,
                ..
            }
        ));
    }

    #[test]
    fn empty_document_rejected() {
        let err = DialogueDocument::load(r#"{ "version": 1, "nodes": [] }"#).unwrap_err();
        assert!(matches!(err, LoadError::InvalidNode { index: 0, .. }));
    }

    #[test]
    fn empty_choice_rejected() {
        let json = r#"{
            "version": 1,
            "nodes": [ { "type": "choice", "options": [] } ]
        }"#;
        let err = DialogueDocument::load(json).unwrap_err();
        assert!(matches!(err, LoadError::InvalidNode { index: 0, .. }));
    }

    #[test]
    fn all_zero_branch_weights_rejected() {
        let json = r#"{
            "version": 1,
            "nodes": [
                { "type": "branch", "targets": [
                    { "next": 1, "weight": 0 },
                    { "next": 1, "weight": 0 }
                ] },
                { "type": "end" }
            ]
        }"#;
        let err = DialogueDocument::load(json).unwrap_err();
        assert!(matches!(err, LoadError::InvalidNode { index: 0, .. }));
    }

    #[test]
    fn duplicate_label_rejected() {
        let json = r#"{
            "version": 1,
            "nodes": [
                { "type": "end", "label": "fin" },
                { "type": "end", "label": "fin" }
            ]
        }"#;
        let err = DialogueDocument::load(json).unwrap_err();
        assert!(matches!(err, LoadError::InvalidNode { index: 1, .. }));
    }

    #[test]
    fn label_index_resolves() {
        let json = r#"{
            "version": 1,
            "nodes": [
                { "type": "line", "speaker": "a", "text": "b", "label": "start", "next": 1 },
                { "type": "end", "label": "fin" }
            ]
        }"#;
        let doc = DialogueDocument::load(json).unwrap();
        assert_eq!(doc.node_by_label("start"), Some(0));
        assert_eq!(doc.node_by_label("fin"), Some(1));
        assert_eq!(doc.node_by_label("nowhere"), None);
    }

    #[test]
    fn malformed_braces_fail_load_when_interpolated() {
        let json = r#"{
            "version": 1,
            "nodes": [
                { "type": "line", "speaker": "a", "text": "oops {unclosed", "next": 1 },
                { "type": "end" }
            ]
        }"#;
        let err = DialogueDocument::load(json).unwrap_err();
        assert!(matches!(err, LoadError::InvalidNode { index: 0, .. }));
    }

    #[test]
    fn malformed_braces_pass_when_verbatim() {
        let json = r#"{
            "version": 1,
            "nodes": [
                { "type": "line", "speaker": "a", "text": "oops {unclosed", "next": 1 },
                { "type": "end" }
            ]
        }"#;
        let doc = DialogueDocument::load_with(json, TextMode::Verbatim).unwrap();
        assert_eq!(doc.len(), 2);
    }
}
