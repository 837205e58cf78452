//! Successor templates used for task chaining.

use super::{BoardDomainError, Priority};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Template for the task spawned when its parent reaches `done`.
///
/// Every field is optional. Fields left unset are inherited from the
/// completed parent. Templates are validated when they are built or
/// deserialized, so a stored template is always usable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TaskTemplateFields", into = "TaskTemplateFields")]
pub struct TaskTemplate {
    title: Option<String>,
    description: Option<String>,
    assignee: Option<String>,
    priority: Option<Priority>,
    tags: Option<BTreeSet<String>>,
    requires_review: Option<bool>,
    max_retries: Option<u32>,
    next_task: Option<Box<TaskTemplate>>,
}

/// Wire representation of [`TaskTemplate`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct TaskTemplateFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tags: Option<BTreeSet<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    requires_review: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_retries: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    next_task: Option<Box<TaskTemplate>>,
}

impl TryFrom<TaskTemplateFields> for TaskTemplate {
    type Error = BoardDomainError;

    fn try_from(fields: TaskTemplateFields) -> Result<Self, Self::Error> {
        let template = Self {
            title: None,
            description: fields.description,
            assignee: fields.assignee,
            priority: fields.priority,
            tags: fields.tags,
            requires_review: fields.requires_review,
            max_retries: fields.max_retries,
            next_task: fields.next_task,
        };
        match fields.title {
            Some(title) => template.with_title(title),
            None => Ok(template),
        }
    }
}

impl From<TaskTemplate> for TaskTemplateFields {
    fn from(template: TaskTemplate) -> Self {
        Self {
            title: template.title,
            description: template.description,
            assignee: template.assignee,
            priority: template.priority,
            tags: template.tags,
            requires_review: template.requires_review,
            max_retries: template.max_retries,
            next_task: template.next_task,
        }
    }
}

impl TaskTemplate {
    /// Creates an empty template that inherits everything from its parent.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and validates a template from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`serde_json::Error`] when the document is malformed, carries
    /// unknown fields, or sets a blank title.
    pub fn from_json(document: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(document)
    }

    /// Sets the successor title.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::EmptyTemplateTitle`] when the title is
    /// blank.
    pub fn with_title(mut self, title: impl Into<String>) -> Result<Self, BoardDomainError> {
        let raw = title.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(BoardDomainError::EmptyTemplateTitle);
        }
        self.title = Some(trimmed.to_owned());
        Ok(self)
    }

    /// Sets the successor description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the successor assignee.
    #[must_use]
    pub fn with_assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assignee = Some(assignee.into());
        self
    }

    /// Sets the successor priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Replaces the successor tags.
    #[must_use]
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = String>) -> Self {
        self.tags = Some(tags.into_iter().collect());
        self
    }

    /// Sets whether the successor must pass through review.
    #[must_use]
    pub const fn with_requires_review(mut self, requires_review: bool) -> Self {
        self.requires_review = Some(requires_review);
        self
    }

    /// Sets the successor retry budget.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Chains a further template onto the successor.
    #[must_use]
    pub fn with_next_task(mut self, next: Self) -> Self {
        self.next_task = Some(Box::new(next));
        self
    }

    /// Returns the title override, if any.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Returns the description override, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the assignee override, if any.
    #[must_use]
    pub fn assignee(&self) -> Option<&str> {
        self.assignee.as_deref()
    }

    /// Returns the priority override, if any.
    #[must_use]
    pub const fn priority(&self) -> Option<Priority> {
        self.priority
    }

    /// Returns the tag override, if any.
    #[must_use]
    pub const fn tags(&self) -> Option<&BTreeSet<String>> {
        self.tags.as_ref()
    }

    /// Returns the review flag override, if any.
    #[must_use]
    pub const fn requires_review(&self) -> Option<bool> {
        self.requires_review
    }

    /// Returns the retry budget override, if any.
    #[must_use]
    pub const fn max_retries(&self) -> Option<u32> {
        self.max_retries
    }

    /// Returns the template chained after this one, if any.
    #[must_use]
    pub fn next_task(&self) -> Option<&Self> {
        self.next_task.as_deref()
    }
}
