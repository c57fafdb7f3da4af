// src/task/descriptor.rs

use std::collections::BTreeSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::TaskError;
use crate::task::body::{TaskBody, TaskContext};
use crate::types::TaskId;

pub type SuccessCallback = Box<dyn Fn() + Send + Sync>;
pub type FailureCallback = Box<dyn Fn(&TaskError) + Send + Sync>;

/// Immutable configuration for one unit of work in a batch.
///
/// Built with [`TaskDescriptor::new`] (async closure body) or
/// [`TaskDescriptor::from_body`] plus the chained `with_*` / `after*`
/// setters. Once handed to a scheduler it is only ever read.
pub struct TaskDescriptor {
    id: TaskId,
    priority: i32,
    /// Must end `Completed` before this task may launch.
    hard_deps: BTreeSet<TaskId>,
    /// Must end in any terminal state before this task may launch.
    soft_deps: BTreeSet<TaskId>,
    delay_before: Duration,
    delay_after: Duration,
    /// Zero means unbounded.
    timeout: Duration,
    enabled: bool,
    body: Arc<dyn TaskBody>,
    on_success: Option<SuccessCallback>,
    on_failure: Option<FailureCallback>,
}

impl TaskDescriptor {
    pub fn new<F, Fut>(id: impl Into<TaskId>, body: F) -> Self
    where
        F: Fn(TaskContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<bool>> + Send + 'static,
    {
        Self::from_body(id, Arc::new(body))
    }

    pub fn from_body(id: impl Into<TaskId>, body: Arc<dyn TaskBody>) -> Self {
        Self {
            id: id.into(),
            priority: 0,
            hard_deps: BTreeSet::new(),
            soft_deps: BTreeSet::new(),
            delay_before: Duration::ZERO,
            delay_after: Duration::ZERO,
            timeout: Duration::ZERO,
            enabled: true,
            body,
            on_success: None,
            on_failure: None,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Add a hard dependency.
    pub fn after(mut self, dep: impl Into<TaskId>) -> Self {
        self.hard_deps.insert(dep.into());
        self
    }

    /// Add a soft dependency.
    pub fn after_any(mut self, dep: impl Into<TaskId>) -> Self {
        self.soft_deps.insert(dep.into());
        self
    }

    pub fn with_delay_before(mut self, delay: Duration) -> Self {
        self.delay_before = delay;
        self
    }

    pub fn with_delay_after(mut self, delay: Duration) -> Self {
        self.delay_after = delay;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn on_success(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_success = Some(Box::new(f));
        self
    }

    pub fn on_failure(mut self, f: impl Fn(&TaskError) + Send + Sync + 'static) -> Self {
        self.on_failure = Some(Box::new(f));
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn hard_deps(&self) -> &BTreeSet<TaskId> {
        &self.hard_deps
    }

    pub fn soft_deps(&self) -> &BTreeSet<TaskId> {
        &self.soft_deps
    }

    /// Hard and soft dependencies together.
    pub fn all_deps(&self) -> impl Iterator<Item = &TaskId> {
        self.hard_deps.iter().chain(self.soft_deps.iter())
    }

    pub fn delay_before(&self) -> Duration {
        self.delay_before
    }

    pub fn delay_after(&self) -> Duration {
        self.delay_after
    }

    /// Body timeout, or `None` when unbounded.
    pub fn timeout(&self) -> Option<Duration> {
        (!self.timeout.is_zero()).then_some(self.timeout)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub(crate) fn body(&self) -> Arc<dyn TaskBody> {
        Arc::clone(&self.body)
    }

    pub(crate) fn success_callback(&self) -> Option<&SuccessCallback> {
        self.on_success.as_ref()
    }

    pub(crate) fn failure_callback(&self) -> Option<&FailureCallback> {
        self.on_failure.as_ref()
    }
}

impl fmt::Debug for TaskDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskDescriptor")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .field("hard_deps", &self.hard_deps)
            .field("soft_deps", &self.soft_deps)
            .field("delay_before", &self.delay_before)
            .field("delay_after", &self.delay_after)
            .field("timeout", &self.timeout)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}
