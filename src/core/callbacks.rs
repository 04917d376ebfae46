/// Callback registry — host-registered handlers fired when a call node
/// is stepped over.

use rustc_hash::FxHashMap;

/// Handler bound to one event name.
pub type EventHandler = Box<dyn FnMut()>;

/// Handler receiving every event, with the triggering name as data.
pub type CatchAllHandler = Box<dyn FnMut(&str)>;

/// The two dispatch modes. A context is in exactly one at a time;
/// registering a handler of the other kind replaces the whole mode,
/// not just one name.
enum Dispatch {
    Named(FxHashMap<String, EventHandler>),
    CatchAll(CatchAllHandler),
}

pub struct CallbackRegistry {
    dispatch: Dispatch,
}

impl Default for CallbackRegistry {
    fn default() -> CallbackRegistry {
        CallbackRegistry {
            dispatch: Dispatch::Named(FxHashMap::default()),
        }
    }
}

impl CallbackRegistry {
    pub fn new() -> CallbackRegistry {
        CallbackRegistry::default()
    }

    /// Bind a handler to one event name. Re-registering a name replaces
    /// its prior handler. If the registry was in catch-all mode, the
    /// catch-all is discarded and named dispatch starts fresh.
    pub fn set(&mut self, name: impl Into<String>, handler: impl FnMut() + 'static) {
        if !matches!(self.dispatch, Dispatch::Named(_)) {
            self.dispatch = Dispatch::Named(FxHashMap::default());
        }
        if let Dispatch::Named(table) = &mut self.dispatch {
            table.insert(name.into(), Box::new(handler));
        }
    }

    /// Switch to catch-all mode, discarding any named handlers. The
    /// handler receives the event name on each dispatch.
    pub fn set_all(&mut self, handler: impl FnMut(&str) + 'static) {
        self.dispatch = Dispatch::CatchAll(Box::new(handler));
    }

    /// Fire the handler for `name`, if any. An event with no observer
    /// is valid authoring and dispatches to nothing.
    pub fn dispatch(&mut self, name: &str) {
        match &mut self.dispatch {
            Dispatch::Named(table) => {
                if let Some(handler) = table.get_mut(name) {
                    handler();
                }
            }
            Dispatch::CatchAll(handler) => handler(name),
        }
    }
}

impl std::fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mode = match &self.dispatch {
            Dispatch::Named(table) => format!("Named({} handlers)", table.len()),
            Dispatch::CatchAll(_) => "CatchAll".to_string(),
        };
        f.debug_struct("CallbackRegistry").field("mode", &mode).finish()
    }
}
