use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::TaskFault;
use crate::executor::traits::{FnHandler, TaskHandler};
use crate::executor::validate::ValidationRules;

use super::ExecutionContext;

/// Anything that can be placed in a dependency graph.
pub trait TaskLike {
    fn id(&self) -> &str;
    fn dependencies(&self) -> &[String];
}

/// A named unit of work with declared upstream dependencies.
///
/// Built once with the builder methods below and never changed after it has
/// been registered.
#[derive(Clone)]
pub struct Task {
    name: String,
    handler: Arc<dyn TaskHandler>,
    required: bool,
    dependencies: Vec<String>,
    validation: Option<ValidationRules>,
}

impl Task {
    pub fn new(name: impl Into<String>, handler: impl TaskHandler + 'static) -> Self {
        Self::from_arc(name, Arc::new(handler))
    }

    pub fn from_arc(name: impl Into<String>, handler: Arc<dyn TaskHandler>) -> Self {
        Self {
            name: name.into(),
            handler,
            required: true,
            dependencies: Vec::new(),
            validation: None,
        }
    }

    /// Task backed by a synchronous closure.
    pub fn from_fn<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&ExecutionContext) -> Result<Value, TaskFault> + Send + Sync + 'static,
    {
        Self::new(name, FnHandler::new(f))
    }

    /// Mark the task optional (`required = false`).
    pub fn optional(self) -> Self {
        self.required(false)
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn depends_on<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = deps.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_validation(mut self, rules: ValidationRules) -> Self {
        self.validation = Some(rules);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn validation(&self) -> Option<&ValidationRules> {
        self.validation.as_ref()
    }

    pub fn handler(&self) -> &Arc<dyn TaskHandler> {
        &self.handler
    }
}

impl TaskLike for Task {
    fn id(&self) -> &str {
        &self.name
    }

    fn dependencies(&self) -> &[String] {
        &self.dependencies
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("required", &self.required)
            .field("dependencies", &self.dependencies)
            .field("validation", &self.validation)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_defaults() {
        let task = Task::from_fn("research", |_| Ok(json!({})));
        assert!(task.is_required());
        assert!(task.dependencies().is_empty());
        assert!(task.validation().is_none());
    }

    #[test]
    fn test_builder_overrides() {
        let task = Task::from_fn("pre_pitch", |_| Ok(json!({})))
            .optional()
            .depends_on(["mental_drivers", "market_analysis"])
            .with_validation(ValidationRules::object());

        assert!(!task.is_required());
        assert_eq!(task.dependencies(), ["mental_drivers", "market_analysis"]);
        assert!(task.validation().is_some());
        assert!(format!("{task:?}").contains("pre_pitch"));
    }
}
