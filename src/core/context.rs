/// The dialogue context — one loaded document, N independent cursors,
/// and the shared variable store, callback registry, and branch
/// resolver. This is what an embedding application allocates, steps,
/// and destroys.

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::core::callbacks::CallbackRegistry;
use crate::core::cursor::{
    Cursor, CursorState, OfferedOption, SpokenLine, StepError, StepEvent,
};
use crate::core::rng::{BranchResolver, SeedError};
use crate::core::vars::VariableStore;
use crate::schema::document::{DialogueDocument, LoadError, TextMode};
use crate::schema::node::Node;

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("document error: {0}")]
    Document(#[from] LoadError),
    #[error("seed error: {0}")]
    Seed(#[from] SeedError),
}

/// The externally visible aggregate. Built via
/// [`DialogueContext::builder`].
///
/// Single-threaded by contract: no internal locking, and a callback
/// fired during `step` must not call back into `step`/`reply` on the
/// same context.
pub struct DialogueContext {
    document: DialogueDocument,
    cursors: FxHashMap<u32, Cursor>,
    variables: VariableStore,
    callbacks: CallbackRegistry,
    resolver: BranchResolver,
}

/// Builder for constructing a `DialogueContext`.
pub struct DialogueContextBuilder {
    seed: u64,
    no_interpolate: bool,
}

impl DialogueContext {
    pub fn builder() -> DialogueContextBuilder {
        DialogueContextBuilder {
            seed: 0,
            no_interpolate: false,
        }
    }

    /// Advance one dialogue instance to its next visible event.
    ///
    /// Branch nodes are resolved invisibly inside the same call; the
    /// walk is capped at the node count so an authored branch cycle
    /// fails fast instead of hanging.
    pub fn step(&mut self, dialogue_id: u32) -> Result<StepEvent, StepError> {
        let cursor = self.cursors.entry(dialogue_id).or_default();
        match cursor.state {
            CursorState::Done => return Ok(StepEvent::Done),
            CursorState::AwaitingReply { .. } => {
                return Err(StepError::AwaitingReply(dialogue_id))
            }
            CursorState::Ready => {}
        }

        let mut at = cursor.at;
        let mut hops = 0usize;
        loop {
            match &self.document.nodes()[at] {
                Node::Branch { targets } => {
                    hops += 1;
                    if hops > self.document.len() {
                        return Err(StepError::BranchCycle(at));
                    }
                    let picked = self.resolver.pick(targets);
                    at = targets[picked].next;
                }
                Node::Line {
                    speaker,
                    text,
                    metadata,
                    next,
                } => {
                    let line = SpokenLine {
                        speaker: speaker.clone(),
                        text: text.render(&self.variables),
                        metadata: metadata.clone(),
                    };
                    cursor.at = *next;
                    cursor.state = CursorState::Ready;
                    return Ok(StepEvent::Line(line));
                }
                Node::Choice { options } => {
                    let mut offered = Vec::new();
                    let mut visible = Vec::new();
                    for (id, option) in options.iter().enumerate() {
                        let shown = match &option.condition {
                            Some(name) => self.variables.truthy(name),
                            None => true,
                        };
                        if shown {
                            offered.push(id);
                            visible.push(OfferedOption {
                                id,
                                text: option.text.render(&self.variables),
                            });
                        }
                    }
                    cursor.at = at;
                    cursor.state = CursorState::AwaitingReply { offered };
                    return Ok(StepEvent::Options(visible));
                }
                Node::Call { function, next } => {
                    cursor.at = *next;
                    cursor.state = CursorState::Ready;
                    self.callbacks.dispatch(function);
                    return Ok(StepEvent::FunctionCalled);
                }
                Node::End => {
                    cursor.state = CursorState::Done;
                    return Ok(StepEvent::Done);
                }
            }
        }
    }

    /// Select one currently offered option on a suspended instance and
    /// resume it at that option's successor.
    pub fn reply(&mut self, dialogue_id: u32, option_id: usize) -> Result<(), StepError> {
        let cursor = self.cursors.entry(dialogue_id).or_default();
        let offered = match &cursor.state {
            CursorState::AwaitingReply { offered } => offered,
            _ => return Err(StepError::NotAtChoice(dialogue_id)),
        };
        if !offered.contains(&option_id) {
            return Err(StepError::UnknownOption {
                dialogue: dialogue_id,
                option: option_id,
            });
        }
        let next = match &self.document.nodes()[cursor.at] {
            Node::Choice { options } => options[option_id].next,
            // AwaitingReply implies the cursor sits on a choice node.
            _ => return Err(StepError::NotAtChoice(dialogue_id)),
        };
        cursor.at = next;
        cursor.state = CursorState::Ready;
        Ok(())
    }

    /// Force an instance's cursor to an arbitrary node, discarding any
    /// pending choice state. Node 0 is the canonical dialogue start.
    pub fn reset(&mut self, dialogue_id: u32, node_index: usize) -> Result<(), StepError> {
        if node_index >= self.document.len() {
            return Err(StepError::NodeOutOfRange(node_index));
        }
        let cursor = self.cursors.entry(dialogue_id).or_default();
        cursor.at = node_index;
        cursor.state = CursorState::Ready;
        Ok(())
    }

    /// Resolve an authored node label to its index, for use with
    /// [`reset`](Self::reset).
    pub fn node_by_label(&self, label: &str) -> Option<usize> {
        self.document.node_by_label(label)
    }

    pub fn set_variable_bool(&mut self, name: impl Into<String>, value: bool) {
        self.variables.set_bool(name, value);
    }

    pub fn set_variable_str(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.variables.set_str(name, value);
    }

    /// Bind a handler to one event name. See
    /// [`CallbackRegistry::set`] for the mode-switch contract.
    pub fn set_callback(&mut self, name: impl Into<String>, handler: impl FnMut() + 'static) {
        self.callbacks.set(name, handler);
    }

    /// Bind one handler for every event; it receives the event name.
    /// Mutually exclusive with [`set_callback`](Self::set_callback) —
    /// the last registration decides the mode for the whole context.
    pub fn set_all_callbacks(&mut self, handler: impl FnMut(&str) + 'static) {
        self.callbacks.set_all(handler);
    }

    pub fn document(&self) -> &DialogueDocument {
        &self.document
    }
}

// Manual impl: the callback registry holds closures, so Debug can't be
// derived.
impl std::fmt::Debug for DialogueContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogueContext")
            .field("nodes", &self.document.len())
            .field("cursors", &self.cursors)
            .field("variables", &self.variables)
            .field("callbacks", &self.callbacks)
            .finish()
    }
}

impl DialogueContextBuilder {
    /// Seed for the branch resolver. 0 (the default) draws a seed from
    /// the platform entropy source at build time.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Disable `{name}` interpolation; authored text passes through
    /// verbatim, braces included.
    pub fn no_interpolate(mut self, no_interpolate: bool) -> Self {
        self.no_interpolate = no_interpolate;
        self
    }

    pub fn build(self, json: &str) -> Result<DialogueContext, ContextError> {
        let mode = if self.no_interpolate {
            TextMode::Verbatim
        } else {
            TextMode::Interpolated
        };
        let document = DialogueDocument::load_with(json, mode)?;
        let resolver = BranchResolver::from_seed(self.seed)?;
        Ok(DialogueContext {
            document,
            cursors: FxHashMap::default(),
            variables: VariableStore::new(),
            callbacks: CallbackRegistry::new(),
            resolver,
        })
    }
}
