/// Variable store — the typed name/value mapping shared by every
/// dialogue instance under one context.

use rustc_hash::FxHashMap;

/// A tagged variable value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VarValue {
    Bool(bool),
    Str(String),
}

impl VarValue {
    /// Canonical text rendering used by interpolation. Booleans spell
    /// as `true` / `false`.
    pub fn render(&self) -> &str {
        match self {
            VarValue::Bool(true) => "true",
            VarValue::Bool(false) => "false",
            VarValue::Str(s) => s.as_str(),
        }
    }
}

/// Name → value mapping. Setters are total and last-write-wins across
/// both types under the same name.
#[derive(Debug, Clone, Default)]
pub struct VariableStore {
    values: FxHashMap<String, VarValue>,
}

impl VariableStore {
    pub fn new() -> VariableStore {
        VariableStore::default()
    }

    pub fn set_bool(&mut self, name: impl Into<String>, value: bool) {
        self.values.insert(name.into(), VarValue::Bool(value));
    }

    pub fn set_str(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), VarValue::Str(value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&VarValue> {
        self.values.get(name)
    }

    /// Condition evaluation for choice options: true only for a boolean
    /// variable currently set to true. Absent and string-typed
    /// variables are false.
    pub fn truthy(&self, name: &str) -> bool {
        matches!(self.values.get(name), Some(VarValue::Bool(true)))
    }
}
