use async_trait::async_trait;
use serde_json::Value;

use crate::error::TaskFault;
use crate::executor::types::ExecutionContext;

/// The executable unit of a task.
///
/// Handlers are awaited one at a time; a handler may do network I/O but the
/// executor never runs two handlers concurrently.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn call(&self, ctx: &ExecutionContext) -> Result<Value, TaskFault>;
}

/// Adapter for plain synchronous closures.
pub struct FnHandler<F> {
    f: F,
}

impl<F> FnHandler<F>
where
    F: Fn(&ExecutionContext) -> Result<Value, TaskFault> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> TaskHandler for FnHandler<F>
where
    F: Fn(&ExecutionContext) -> Result<Value, TaskFault> + Send + Sync,
{
    async fn call(&self, ctx: &ExecutionContext) -> Result<Value, TaskFault> {
        (self.f)(ctx)
    }
}
