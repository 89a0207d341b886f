//! Approval stage: applies the quantity policy.

use crate::config::WorkflowConfig;
use crate::stage::Stage;
use crate::state::{Fragment, State};
use async_trait::async_trait;

/// Approves a request when `quantity` is within the configured threshold;
/// larger quantities are left for manual approval.
#[derive(Debug)]
pub struct ApprovalStage {
    threshold: u32,
}

impl ApprovalStage {
    /// Creates an approval stage from the workflow configuration.
    #[must_use]
    pub fn new(config: &WorkflowConfig) -> Self {
        Self {
            threshold: config.approval_threshold,
        }
    }

    fn decide(&self, quantity: i64) -> (bool, String) {
        let threshold = i64::from(self.threshold);
        if quantity <= threshold {
            (
                true,
                format!("Quantity {quantity} is within auto-approval threshold (<= {threshold})."),
            )
        } else {
            (
                false,
                format!("Quantity {quantity} exceeds auto-approval threshold (> {threshold})."),
            )
        }
    }
}

#[async_trait]
impl Stage for ApprovalStage {
    fn name(&self) -> &str {
        "approval"
    }

    async fn run(&self, state: &State) -> anyhow::Result<Fragment> {
        let quantity = state.get_i64("quantity").unwrap_or(1);
        let (approved, reason) = self.decide(quantity);

        let mut logs = state.string_list("logs");
        logs.push(format!("Approval decision: approved={approved} ({reason})"));

        Ok(Fragment::new()
            .with("approved", approved)
            .with("reason", reason)
            .with("logs", logs))
    }
}
