use std::collections::{btree_map, BTreeMap};

use serde::{Deserialize, Serialize};

/// Lifetime of an execution context entry.
///
/// - `Job`: shared by every step of one job run and saved with the job execution.
/// - `Step`: private to one step execution; a later step never sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Job,
    Step,
}

/// A primitive value stored in an [`ExecutionContext`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContextValue {
    Bool(bool),
    Long(i64),
    Double(f64),
    String(String),
}

impl From<bool> for ContextValue {
    fn from(value: bool) -> Self {
        ContextValue::Bool(value)
    }
}

impl From<i64> for ContextValue {
    fn from(value: i64) -> Self {
        ContextValue::Long(value)
    }
}

impl From<usize> for ContextValue {
    fn from(value: usize) -> Self {
        ContextValue::Long(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<f64> for ContextValue {
    fn from(value: f64) -> Self {
        ContextValue::Double(value)
    }
}

impl From<String> for ContextValue {
    fn from(value: String) -> Self {
        ContextValue::String(value)
    }
}

impl From<&str> for ContextValue {
    fn from(value: &str) -> Self {
        ContextValue::String(value.to_string())
    }
}

/// String-keyed store used to share data between steps and to keep restart
/// metadata such as the read cursor.
///
/// Entries are kept ordered so the serialized form is stable.
///
/// # Examples
///
/// ```
/// use spring_batch_example::core::context::ExecutionContext;
///
/// let mut context = ExecutionContext::new();
/// context.put("jobKey", "job execution context");
/// context.put("read.count", 20_i64);
///
/// assert_eq!(context.get_string("jobKey", "emptyJobKey"), "job execution context");
/// assert_eq!(context.get_string("stepKey", "emptyStepKey"), "emptyStepKey");
/// assert_eq!(context.get_long("read.count", 0), 20);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionContext {
    entries: BTreeMap<String, ContextValue>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn put<V: Into<ContextValue>>(&mut self, key: &str, value: V) {
        self.entries.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        self.entries.get(key)
    }

    /// Returns the string stored under `key`, or `default` when the key is
    /// missing or holds another type.
    pub fn get_string(&self, key: &str, default: &str) -> String {
        match self.entries.get(key) {
            Some(ContextValue::String(value)) => value.clone(),
            _ => default.to_string(),
        }
    }

    /// Returns the integer stored under `key`, or `default` when the key is
    /// missing or holds another type.
    pub fn get_long(&self, key: &str, default: i64) -> i64 {
        match self.entries.get(key) {
            Some(ContextValue::Long(value)) => *value,
            _ => default,
        }
    }

    pub fn get_double(&self, key: &str, default: f64) -> f64 {
        match self.entries.get(key) {
            Some(ContextValue::Double(value)) => *value,
            _ => default,
        }
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.entries.get(key) {
            Some(ContextValue::Bool(value)) => *value,
            _ => default,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<ContextValue> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, ContextValue> {
        self.entries.iter()
    }
}
