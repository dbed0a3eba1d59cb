//! ObservationScope for automatic begin/complete logging
//!
//! - Logs `{name}_BEGIN` on creation (TRACE)
//! - Logs `{name}_COMPLETE` when `complete()` is called (INFO)
//! - Logs `{name}_ERROR` on `fail()` or when dropped incomplete (ERROR)

use std::cell::Cell;

use super::logger::Logger;

/// A scope that logs the lifecycle of one compile
///
/// # Usage
///
/// ```ignore
/// let scope = ObservationScope::with_fields("COMPILE_QUERY", &[("index", "idx")]);
/// // ... compile ...
/// scope.complete();
/// ```
pub struct ObservationScope<'a> {
    name: &'a str,
    completed: Cell<bool>,
    fields: Vec<(&'a str, String)>,
}

impl<'a> ObservationScope<'a> {
    /// Create a new observation scope
    pub fn new(name: &'a str) -> Self {
        Self::with_fields(name, &[])
    }

    /// Create a new observation scope carrying fields on every event
    pub fn with_fields(name: &'a str, fields: &[(&'a str, &str)]) -> Self {
        let scope = Self {
            name,
            completed: Cell::new(false),
            fields: fields.iter().map(|(k, v)| (*k, v.to_string())).collect(),
        };
        Logger::trace(&format!("{}_BEGIN", name), &scope.field_refs());
        scope
    }

    fn field_refs(&self) -> Vec<(&str, &str)> {
        self.fields.iter().map(|(k, v)| (*k, v.as_str())).collect()
    }

    /// Mark the scope as successfully completed with additional fields
    pub fn complete_with_fields(self, extra_fields: &[(&str, &str)]) {
        self.completed.set(true);
        let mut all_fields = self.field_refs();
        all_fields.extend(extra_fields.iter().copied());
        Logger::info(&format!("{}_COMPLETE", self.name), &all_fields);
    }

    /// Mark the scope as successfully completed
    pub fn complete(self) {
        self.complete_with_fields(&[]);
    }

    /// Mark the scope as failed with an error code and reason
    pub fn fail(self, code: &str, reason: &str) {
        self.completed.set(true);
        let mut all_fields = self.field_refs();
        all_fields.push(("code", code));
        all_fields.push(("reason", reason));
        Logger::error(&format!("{}_ERROR", self.name), &all_fields);
    }

    /// Check if the scope has been completed
    pub fn is_completed(&self) -> bool {
        self.completed.get()
    }
}

impl Drop for ObservationScope<'_> {
    fn drop(&mut self) {
        if !self.completed.get() {
            let mut all_fields = self.field_refs();
            all_fields.push(("reason", "scope dropped without completion"));
            Logger::error(&format!("{}_ERROR", self.name), &all_fields);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_complete_marks_completed() {
        let scope = ObservationScope::new("TEST_SCOPE");
        assert!(!scope.is_completed());
        scope.complete();
    }

    #[test]
    fn test_scope_with_fields_and_failure() {
        let scope = ObservationScope::with_fields("TEST_SCOPE", &[("index", "idx")]);
        scope.fail("RQ_UNKNOWN_SEPARATOR", "bad operator");
    }

    #[test]
    fn test_scope_drop_without_completion() {
        let _scope = ObservationScope::new("TEST_SCOPE");
    }
}
