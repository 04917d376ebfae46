/// Per-instance cursor state and the step result/error types.

use thiserror::Error;

/// Where one dialogue instance stands between calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorState {
    /// The next `step` will process the node at the cursor.
    Ready,
    /// Suspended on a choice; `offered` holds the option ids currently
    /// visible (indices into the authored option list, not renumbered).
    AwaitingReply { offered: Vec<usize> },
    /// A terminal node was reached. `step` keeps reporting `Done`.
    Done,
}

/// One independent execution cursor over the shared document.
///
/// Cursors are created implicitly on first reference, positioned at
/// node 0, the canonical dialogue start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    pub at: usize,
    pub state: CursorState,
}

impl Default for Cursor {
    fn default() -> Cursor {
        Cursor {
            at: 0,
            state: CursorState::Ready,
        }
    }
}

/// A line surfaced by `step`, fully interpolated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpokenLine {
    pub speaker: String,
    pub text: String,
    pub metadata: Option<String>,
}

/// One currently offered choice option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferedOption {
    /// The option's authored id — its index in the choice node's
    /// option list, stable under condition filtering.
    pub id: usize,
    pub text: String,
}

/// What a single `step` call surfaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepEvent {
    /// A line was spoken; the cursor already advanced past it.
    Line(SpokenLine),
    /// The instance is suspended on these options until `reply`.
    Options(Vec<OfferedOption>),
    /// A call node fired its handler (already dispatched) and advanced.
    FunctionCalled,
    /// A terminal node. Idempotent.
    Done,
}

/// Call-time misuse of the stepping API. The failing call leaves all
/// cursor and variable state untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StepError {
    #[error("dialogue {0} is awaiting a reply; call reply() before stepping")]
    AwaitingReply(u32),
    #[error("dialogue {0} is not suspended on a choice")]
    NotAtChoice(u32),
    #[error("option {option} is not currently offered by dialogue {dialogue}")]
    UnknownOption { dialogue: u32, option: usize },
    #[error("node index {0} is out of range")]
    NodeOutOfRange(usize),
    #[error("cycle through branch nodes detected at node {0}")]
    BranchCycle(usize),
}
