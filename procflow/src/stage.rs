//! Stage trait and adapters.
//!
//! A stage is the single capability the engine composes: consume the current
//! state, produce a fragment of new or updated fields.

use crate::state::{Fragment, State};
use async_trait::async_trait;
use std::fmt::Debug;

/// Trait for pipeline stages.
///
/// Stages are pure with respect to the state: they receive a read-only
/// snapshot and return only the keys they change. External I/O (printing,
/// a shared lookup table) is the stage's own responsibility.
#[async_trait]
pub trait Stage: Send + Sync + Debug {
    /// Returns the name of the stage.
    fn name(&self) -> &str;

    /// Executes the stage against the current state snapshot.
    ///
    /// # Errors
    ///
    /// A returned error aborts the run; the executor wraps it in
    /// [`crate::errors::PipelineError::StageExecution`] together with the
    /// node name.
    async fn run(&self, state: &State) -> anyhow::Result<Fragment>;
}

/// A simple function-based stage.
pub struct FnStage<F>
where
    F: Fn(&State) -> anyhow::Result<Fragment> + Send + Sync,
{
    name: String,
    func: F,
}

impl<F> FnStage<F>
where
    F: Fn(&State) -> anyhow::Result<Fragment> + Send + Sync,
{
    /// Creates a new function-based stage.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Debug for FnStage<F>
where
    F: Fn(&State) -> anyhow::Result<Fragment> + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStage").field("name", &self.name).finish()
    }
}

#[async_trait]
impl<F> Stage for FnStage<F>
where
    F: Fn(&State) -> anyhow::Result<Fragment> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, state: &State) -> anyhow::Result<Fragment> {
        (self.func)(state)
    }
}

/// A stage that produces an empty fragment, for testing.
#[derive(Debug, Clone)]
pub struct NoOpStage {
    name: String,
}

impl NoOpStage {
    /// Creates a new no-op stage.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Stage for NoOpStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, _state: &State) -> anyhow::Result<Fragment> {
        Ok(Fragment::new())
    }
}
