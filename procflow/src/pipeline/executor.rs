//! The executor: walks the compiled plan, merges fragments, records the trace.

use super::compile::{CompiledPipeline, Successor};
use crate::errors::PipelineError;
use crate::graph::{ENTRY, EXIT};
use crate::state::{State, TraceEntry};
use std::time::Instant;
use uuid::Uuid;

impl CompiledPipeline {
    /// Executes the plan against a fresh copy of `initial_state`.
    ///
    /// For each node in plan order the executor calls the stage with the
    /// current state snapshot, shallow-merges the returned fragment, appends
    /// a trace entry, and advances per the plan; a routed edge is decided
    /// against the merged state. Reaching EXIT returns the final state,
    /// trace included. The caller's `initial_state` is never mutated.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::StageExecution`] naming the failing node if
    /// a stage returns an error; no partial state is returned and nothing is
    /// rolled back.
    pub async fn invoke(&self, initial_state: &State) -> Result<State, PipelineError> {
        let run_id = Uuid::new_v4();
        let run_start = Instant::now();
        tracing::info!(%run_id, stages = self.stage_count(), "pipeline run started");

        let mut state = initial_state.clone();
        let mut current = ENTRY.to_string();

        while current != EXIT {
            let next = self.next_node(&current, &state)?;
            if next == EXIT {
                break;
            }

            let stage = self.stage(&next).ok_or_else(|| {
                PipelineError::Internal(format!("plan references unregistered node '{next}'"))
            })?;

            let stage_start = Instant::now();
            let fragment = stage.run(&state).await.map_err(|source| {
                tracing::error!(%run_id, stage = %next, error = %source, "stage failed");
                PipelineError::StageExecution {
                    stage: next.clone(),
                    source,
                }
            })?;

            tracing::debug!(
                %run_id,
                stage = %next,
                keys = fragment.len(),
                duration_ms = stage_start.elapsed().as_secs_f64() * 1000.0,
                "stage completed"
            );

            state.merge(&fragment);
            state.record_trace(TraceEntry::new(&next, fragment));
            current = next;
        }

        tracing::info!(
            %run_id,
            duration_ms = run_start.elapsed().as_secs_f64() * 1000.0,
            "pipeline run completed"
        );
        Ok(state)
    }

    /// Resolves the successor of `current`, consulting the router for a
    /// conditional edge.
    fn next_node(&self, current: &str, state: &State) -> Result<String, PipelineError> {
        match self.successor(current) {
            Some(Successor::Fixed(next)) => Ok(next.clone()),
            Some(Successor::Routed { router, targets }) => {
                let choice = router.route(state);
                if targets.contains(&choice) {
                    Ok(choice)
                } else {
                    Err(PipelineError::Internal(format!(
                        "router at '{current}' chose '{choice}', which is not a declared target"
                    )))
                }
            }
            None => Err(PipelineError::Internal(format!(
                "no successor recorded for node '{current}'"
            ))),
        }
    }
}
