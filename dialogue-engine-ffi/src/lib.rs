//! C ABI for dialogue-engine — powers engine-integration plugins.
//!
//! Every slice handed to the caller is owned by the context (or by the
//! diagnostic it rode in on) and stays valid only until the next
//! mutating call on that context. Foreign code must copy out anything
//! it wants to keep.
//!
//! Call-time misuse (stepping while a reply is pending, replying with
//! an id that is not offered, resetting out of range) leaves all state
//! untouched; the void-returning entry points record the failure,
//! retrievable through [`dlg_context_last_error`].

use std::os::raw::c_void;

use dialogue_engine::core::context::{ContextError, DialogueContext};
use dialogue_engine::core::cursor::{StepError, StepEvent};
use dialogue_engine::schema::document::{JsonErrorKind, LoadError};

// ---------------------------------------------------------------------------
// ABI types
// ---------------------------------------------------------------------------

/// A borrowed utf8 slice. `ptr` is null when `len` is 0.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct StringSlice {
    pub ptr: *const u8,
    pub len: usize,
}

impl StringSlice {
    const EMPTY: StringSlice = StringSlice {
        ptr: std::ptr::null(),
        len: 0,
    };

    fn from_str(s: &str) -> StringSlice {
        if s.is_empty() {
            StringSlice::EMPTY
        } else {
            StringSlice {
                ptr: s.as_ptr(),
                len: s.len(),
            }
        }
    }
}

/// A line spoken by a character. `metadata.ptr` is null when the line
/// has none.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct Line {
    pub speaker: StringSlice,
    pub text: StringSlice,
    pub metadata: StringSlice,
}

impl Line {
    const EMPTY: Line = Line {
        speaker: StringSlice::EMPTY,
        text: StringSlice::EMPTY,
        metadata: StringSlice::EMPTY,
    };
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct LineSlice {
    pub ptr: *const Line,
    pub len: usize,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct SizeSlice {
    pub ptr: *const usize,
    pub len: usize,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct StepOptions {
    pub texts: LineSlice,
    pub ids: SizeSlice,
}

pub const STEP_RESULT_DONE: u8 = 0;
pub const STEP_RESULT_OPTIONS: u8 = 1;
pub const STEP_RESULT_LINE: u8 = 2;
pub const STEP_RESULT_FUNCTION_CALLED: u8 = 3;

#[repr(C)]
#[derive(Clone, Copy)]
pub union StepPayload {
    pub options: StepOptions,
    pub line: Line,
}

/// The tagged union returned from [`dlg_context_step`]. `payload` is
/// meaningful only for the options and line tags.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct StepResult {
    pub tag: u8,
    pub payload: StepPayload,
}

// Diagnostic codes, stable across releases. Grouped: alloc, json,
// domain.
pub const DIAG_NONE: i32 = 0;
pub const DIAG_OUT_OF_MEMORY: i32 = 1;
pub const DIAG_MISSING_FIELD: i32 = 2;
pub const DIAG_UNEXPECTED_TOKEN: i32 = 3;
pub const DIAG_OVERFLOW: i32 = 4;
pub const DIAG_INVALID_CHARACTER: i32 = 5;
pub const DIAG_INVALID_NUMBER: i32 = 6;
pub const DIAG_INVALID_ENUM_TAG: i32 = 7;
pub const DIAG_DUPLICATE_FIELD: i32 = 8;
pub const DIAG_UNKNOWN_FIELD: i32 = 9;
pub const DIAG_LENGTH_MISMATCH: i32 = 10;
pub const DIAG_SYNTAX_ERROR: i32 = 11;
pub const DIAG_UNEXPECTED_END_OF_INPUT: i32 = 12;
pub const DIAG_UNKNOWN_VERSION: i32 = 13;
pub const DIAG_BAD_NEXT_NODE: i32 = 14;
pub const DIAG_INVALID_NODE: i32 = 15;
pub const DIAG_DEFAULT_SEED_UNAVAILABLE: i32 = 16;

// Call-time error codes reported by dlg_context_last_error.
pub const STEP_ERROR_NONE: i32 = 0;
pub const STEP_ERROR_AWAITING_REPLY: i32 = 1;
pub const STEP_ERROR_NOT_AT_CHOICE: i32 = 2;
pub const STEP_ERROR_UNKNOWN_OPTION: i32 = 3;
pub const STEP_ERROR_NODE_OUT_OF_RANGE: i32 = 4;
pub const STEP_ERROR_BRANCH_CYCLE: i32 = 5;

/// Construction failure report. Initialize `needs_free` to 0; when a
/// create call fills a diagnostic, pass it to
/// [`dlg_diagnostic_destroy`] once done with it.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct Diagnostic {
    pub needs_free: u8,
    pub code: i32,
    pub message: StringSlice,
}

/// Payload handed to the catch-all callback: the payload registered by
/// the host plus the name of the event that fired.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CatchAllPayload {
    pub inner_payload: *mut c_void,
    pub name: StringSlice,
}

pub type EventCallback = unsafe extern "C" fn(*mut c_void);
pub type CatchAllCallback = unsafe extern "C" fn(*mut CatchAllPayload);

// ---------------------------------------------------------------------------
// Context wrapper
// ---------------------------------------------------------------------------

/// Owned storage backing the slices of the most recent step result.
/// Cleared and refilled on every step; pointers into it die with the
/// next mutating call, per the boundary contract.
#[derive(Default)]
struct StepScratch {
    speaker: String,
    text: String,
    metadata: Option<String>,
    option_texts: Vec<String>,
    option_lines: Vec<Line>,
    option_ids: Vec<usize>,
}

pub struct FfiDialogueContext {
    inner: DialogueContext,
    scratch: StepScratch,
    last_error: i32,
}

fn diagnostic_code(err: &ContextError) -> i32 {
    match err {
        ContextError::Document(doc) => match doc {
            LoadError::UnknownVersion(_) => DIAG_UNKNOWN_VERSION,
            LoadError::BadNextNode { .. } => DIAG_BAD_NEXT_NODE,
            LoadError::InvalidNode { .. } => DIAG_INVALID_NODE,
            LoadError::Json { kind, .. } => match kind {
                JsonErrorKind::SyntaxError => DIAG_SYNTAX_ERROR,
                JsonErrorKind::UnexpectedEndOfInput => DIAG_UNEXPECTED_END_OF_INPUT,
                JsonErrorKind::MissingField => DIAG_MISSING_FIELD,
                JsonErrorKind::UnknownField => DIAG_UNKNOWN_FIELD,
                JsonErrorKind::DuplicateField => DIAG_DUPLICATE_FIELD,
                JsonErrorKind::InvalidEnumTag => DIAG_INVALID_ENUM_TAG,
                JsonErrorKind::LengthMismatch => DIAG_LENGTH_MISMATCH,
                JsonErrorKind::InvalidNumber => DIAG_INVALID_NUMBER,
                JsonErrorKind::Overflow => DIAG_OVERFLOW,
                JsonErrorKind::UnexpectedToken => DIAG_UNEXPECTED_TOKEN,
            },
        },
        ContextError::Seed(_) => DIAG_DEFAULT_SEED_UNAVAILABLE,
    }
}

fn step_error_code(err: &StepError) -> i32 {
    match err {
        StepError::AwaitingReply(_) => STEP_ERROR_AWAITING_REPLY,
        StepError::NotAtChoice(_) => STEP_ERROR_NOT_AT_CHOICE,
        StepError::UnknownOption { .. } => STEP_ERROR_UNKNOWN_OPTION,
        StepError::NodeOutOfRange(_) => STEP_ERROR_NODE_OUT_OF_RANGE,
        StepError::BranchCycle(_) => STEP_ERROR_BRANCH_CYCLE,
    }
}

unsafe fn byte_slice<'a>(ptr: *const u8, len: usize) -> &'a [u8] {
    if len == 0 || ptr.is_null() {
        &[]
    } else {
        std::slice::from_raw_parts(ptr, len)
    }
}

unsafe fn lossy_str(ptr: *const u8, len: usize) -> String {
    String::from_utf8_lossy(byte_slice(ptr, len)).into_owned()
}

unsafe fn fill_diagnostic(out: *mut Diagnostic, code: i32, message: String) {
    if out.is_null() {
        return;
    }
    let bytes = message.into_bytes().into_boxed_slice();
    let len = bytes.len();
    let ptr = Box::into_raw(bytes) as *const u8;
    *out = Diagnostic {
        needs_free: 1,
        code,
        message: StringSlice { ptr, len },
    };
}

/// Release the message buffer of a diagnostic filled by a create call.
/// Safe to call on a zeroed or already-destroyed diagnostic.
///
/// # Safety
/// `diagnostic`, if non-null, must point at a `Diagnostic` previously
/// filled by this library and not destroyed since.
#[no_mangle]
pub unsafe extern "C" fn dlg_diagnostic_destroy(diagnostic: *mut Diagnostic) {
    if diagnostic.is_null() {
        return;
    }
    let diag = &mut *diagnostic;
    if diag.needs_free != 0 && !diag.message.ptr.is_null() {
        drop(Box::from_raw(std::ptr::slice_from_raw_parts_mut(
            diag.message.ptr as *mut u8,
            diag.message.len,
        )));
    }
    diag.needs_free = 0;
    diag.code = DIAG_NONE;
    diag.message = StringSlice::EMPTY;
}

/// Create a dialogue context from an authored JSON buffer. Returns null
/// on failure and fills `diagnostic` with the reason.
///
/// # Safety
/// `json_ptr` must be readable for `json_len` bytes. `diagnostic`, if
/// non-null, must point at writable memory for one `Diagnostic`.
#[no_mangle]
pub unsafe extern "C" fn dlg_context_create_json(
    json_ptr: *const u8,
    json_len: usize,
    random_seed: u64,
    no_interpolate: u8,
    diagnostic: *mut Diagnostic,
) -> *mut FfiDialogueContext {
    let json = match std::str::from_utf8(byte_slice(json_ptr, json_len)) {
        Ok(json) => json,
        Err(err) => {
            fill_diagnostic(
                diagnostic,
                DIAG_INVALID_CHARACTER,
                format!("document is not valid utf8: {err}"),
            );
            return std::ptr::null_mut();
        }
    };

    match DialogueContext::builder()
        .seed(random_seed)
        .no_interpolate(no_interpolate != 0)
        .build(json)
    {
        Ok(inner) => Box::into_raw(Box::new(FfiDialogueContext {
            inner,
            scratch: StepScratch::default(),
            last_error: STEP_ERROR_NONE,
        })),
        Err(err) => {
            fill_diagnostic(diagnostic, diagnostic_code(&err), err.to_string());
            std::ptr::null_mut()
        }
    }
}

/// Destroy a previously created context, releasing everything it owns.
///
/// # Safety
/// `ctx` must be null or a pointer returned by
/// [`dlg_context_create_json`] that has not been destroyed.
#[no_mangle]
pub unsafe extern "C" fn dlg_context_destroy(ctx: *mut FfiDialogueContext) {
    if !ctx.is_null() {
        drop(Box::from_raw(ctx));
    }
}

/// Step one dialogue instance and write the result into `out`. The
/// slices in `out` stay valid until the next mutating call on `ctx`.
///
/// # Safety
/// `ctx` must be a live context pointer; `out` must be writable.
#[no_mangle]
pub unsafe extern "C" fn dlg_context_step(
    ctx: *mut FfiDialogueContext,
    dialogue_id: u32,
    out: *mut StepResult,
) {
    if ctx.is_null() || out.is_null() {
        return;
    }
    let ctx = &mut *ctx;
    let done = StepResult {
        tag: STEP_RESULT_DONE,
        payload: StepPayload { line: Line::EMPTY },
    };

    match ctx.inner.step(dialogue_id) {
        Ok(StepEvent::Done) => {
            ctx.last_error = STEP_ERROR_NONE;
            *out = done;
        }
        Ok(StepEvent::FunctionCalled) => {
            ctx.last_error = STEP_ERROR_NONE;
            *out = StepResult {
                tag: STEP_RESULT_FUNCTION_CALLED,
                payload: StepPayload { line: Line::EMPTY },
            };
        }
        Ok(StepEvent::Line(line)) => {
            ctx.last_error = STEP_ERROR_NONE;
            let scratch = &mut ctx.scratch;
            scratch.speaker = line.speaker;
            scratch.text = line.text;
            scratch.metadata = line.metadata;
            *out = StepResult {
                tag: STEP_RESULT_LINE,
                payload: StepPayload {
                    line: Line {
                        speaker: StringSlice::from_str(&scratch.speaker),
                        text: StringSlice::from_str(&scratch.text),
                        metadata: scratch
                            .metadata
                            .as_deref()
                            .map(StringSlice::from_str)
                            .unwrap_or(StringSlice::EMPTY),
                    },
                },
            };
        }
        Ok(StepEvent::Options(options)) => {
            ctx.last_error = STEP_ERROR_NONE;
            let scratch = &mut ctx.scratch;
            scratch.option_texts.clear();
            scratch.option_lines.clear();
            scratch.option_ids.clear();
            for option in &options {
                scratch.option_texts.push(option.text.clone());
                scratch.option_ids.push(option.id);
            }
            // Pointers are taken only after the text vec stops growing.
            for text in &scratch.option_texts {
                scratch.option_lines.push(Line {
                    speaker: StringSlice::EMPTY,
                    text: StringSlice::from_str(text),
                    metadata: StringSlice::EMPTY,
                });
            }
            *out = StepResult {
                tag: STEP_RESULT_OPTIONS,
                payload: StepPayload {
                    options: StepOptions {
                        texts: LineSlice {
                            ptr: scratch.option_lines.as_ptr(),
                            len: scratch.option_lines.len(),
                        },
                        ids: SizeSlice {
                            ptr: scratch.option_ids.as_ptr(),
                            len: scratch.option_ids.len(),
                        },
                    },
                },
            };
        }
        Err(err) => {
            ctx.last_error = step_error_code(&err);
            *out = done;
        }
    }
}

/// Reply to a pending choice with an offered option id.
///
/// # Safety
/// `ctx` must be a live context pointer.
#[no_mangle]
pub unsafe extern "C" fn dlg_context_reply(
    ctx: *mut FfiDialogueContext,
    dialogue_id: u32,
    reply_id: usize,
) {
    if ctx.is_null() {
        return;
    }
    let ctx = &mut *ctx;
    ctx.last_error = match ctx.inner.reply(dialogue_id, reply_id) {
        Ok(()) => STEP_ERROR_NONE,
        Err(err) => step_error_code(&err),
    };
}

/// Reset one dialogue instance to a node index. 0 is always the start.
///
/// # Safety
/// `ctx` must be a live context pointer.
#[no_mangle]
pub unsafe extern "C" fn dlg_context_reset(
    ctx: *mut FfiDialogueContext,
    dialogue_id: u32,
    node_index: usize,
) {
    if ctx.is_null() {
        return;
    }
    let ctx = &mut *ctx;
    ctx.last_error = match ctx.inner.reset(dialogue_id, node_index) {
        Ok(()) => STEP_ERROR_NONE,
        Err(err) => step_error_code(&err),
    };
}

/// Resolve a node label to its index, or `SIZE_MAX` if no node carries
/// that label.
///
/// # Safety
/// `ctx` must be a live context pointer; `label_ptr` must be readable
/// for `label_len` bytes.
#[no_mangle]
pub unsafe extern "C" fn dlg_context_get_node_by_label(
    ctx: *mut FfiDialogueContext,
    _dialogue_id: u32,
    label_ptr: *const u8,
    label_len: usize,
) -> usize {
    if ctx.is_null() {
        return usize::MAX;
    }
    let ctx = &*ctx;
    let label = String::from_utf8_lossy(byte_slice(label_ptr, label_len));
    ctx.inner.node_by_label(&label).unwrap_or(usize::MAX)
}

/// The call-time error code recorded by the most recent step, reply,
/// or reset on this context. 0 means the call succeeded.
///
/// # Safety
/// `ctx` must be a live context pointer.
#[no_mangle]
pub unsafe extern "C" fn dlg_context_last_error(ctx: *const FfiDialogueContext) -> i32 {
    if ctx.is_null() {
        return STEP_ERROR_NONE;
    }
    (*ctx).last_error
}

/// Set a boolean variable by name.
///
/// # Safety
/// `ctx` must be a live context pointer; `name_ptr` must be readable
/// for `name_len` bytes.
#[no_mangle]
pub unsafe extern "C" fn dlg_context_set_variable_boolean(
    ctx: *mut FfiDialogueContext,
    name_ptr: *const u8,
    name_len: usize,
    value: u8,
) {
    if ctx.is_null() {
        return;
    }
    let name = lossy_str(name_ptr, name_len);
    (*ctx).inner.set_variable_bool(name, value != 0);
}

/// Set a string variable by name.
///
/// # Safety
/// `ctx` must be a live context pointer; both buffers must be readable
/// for their stated lengths.
#[no_mangle]
pub unsafe extern "C" fn dlg_context_set_variable_string(
    ctx: *mut FfiDialogueContext,
    name_ptr: *const u8,
    name_len: usize,
    value_ptr: *const u8,
    value_len: usize,
) {
    if ctx.is_null() {
        return;
    }
    let name = lossy_str(name_ptr, name_len);
    let value = lossy_str(value_ptr, value_len);
    (*ctx).inner.set_variable_str(name, value);
}

/// Register a callback for one event name. Mutually exclusive with
/// [`dlg_context_set_all_callbacks`]; the most recent registration
/// decides the dispatch mode for the whole context.
///
/// # Safety
/// `ctx` must be a live context pointer; `name_ptr` must be readable
/// for `name_len` bytes; `callback`, if non-null, must stay callable
/// with `payload` for the context's lifetime.
#[no_mangle]
pub unsafe extern "C" fn dlg_context_set_callback(
    ctx: *mut FfiDialogueContext,
    name_ptr: *const u8,
    name_len: usize,
    callback: Option<EventCallback>,
    payload: *mut c_void,
) {
    if ctx.is_null() {
        return;
    }
    let Some(callback) = callback else { return };
    let name = lossy_str(name_ptr, name_len);
    let payload = PayloadPtr(payload);
    (*ctx)
        .inner
        .set_callback(name, move || unsafe { callback(payload.0) });
}

/// Register one callback for every event; it receives a
/// [`CatchAllPayload`] naming the event. See
/// [`dlg_context_set_callback`] for the exclusivity contract.
///
/// # Safety
/// `ctx` must be a live context pointer; `callback`, if non-null, must
/// stay callable with `payload` for the context's lifetime.
#[no_mangle]
pub unsafe extern "C" fn dlg_context_set_all_callbacks(
    ctx: *mut FfiDialogueContext,
    callback: Option<CatchAllCallback>,
    payload: *mut c_void,
) {
    if ctx.is_null() {
        return;
    }
    let Some(callback) = callback else { return };
    let payload = PayloadPtr(payload);
    (*ctx).inner.set_all_callbacks(move |name| {
        let mut event = CatchAllPayload {
            inner_payload: payload.0,
            name: StringSlice::from_str(name),
        };
        unsafe { callback(&mut event) };
    });
}

// Raw payload pointers move into 'static closures; wrap them so the
// capture is a named type rather than a bare pointer.
#[derive(Clone, Copy)]
struct PayloadPtr(*mut c_void);
