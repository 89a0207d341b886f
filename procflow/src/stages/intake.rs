//! Intake stage: parses a free-form procurement request.

use super::singularize;
use crate::stage::Stage;
use crate::state::{Fragment, State};
use async_trait::async_trait;
use regex::Regex;

/// Verbs stripped from the request when isolating the item noun.
const REQUEST_VERBS: [&str; 6] = ["order", "buy", "purchase", "get", "acquire", "request"];

/// Parses the `original_request` field into `item` and `quantity`.
///
/// Quantity is the first integer in the request, defaulting to 1. The item
/// is what remains after dropping numbers and request verbs, lowercased and
/// normalized to its singular form.
#[derive(Debug)]
pub struct IntakeStage {
    quantity_re: Regex,
}

impl IntakeStage {
    /// Creates a new intake stage.
    #[must_use]
    pub fn new() -> Self {
        Self {
            quantity_re: Regex::new(r"\d+").expect("hard-coded pattern is valid"),
        }
    }

    fn extract_quantity(&self, request: &str) -> i64 {
        self.quantity_re
            .find(request)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(1)
    }

    fn extract_item(&self, request: &str) -> String {
        let cleaned = request
            .split_whitespace()
            .map(str::to_lowercase)
            .filter(|token| !token.chars().all(|c| c.is_ascii_digit()))
            .filter(|token| !REQUEST_VERBS.contains(&token.as_str()))
            .collect::<Vec<_>>()
            .join(" ");
        singularize(&cleaned)
    }
}

impl Default for IntakeStage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Stage for IntakeStage {
    fn name(&self) -> &str {
        "intake"
    }

    async fn run(&self, state: &State) -> anyhow::Result<Fragment> {
        let request = state
            .get_str("original_request")
            .ok_or_else(|| anyhow::anyhow!("state has no 'original_request' field"))?;

        let quantity = self.extract_quantity(request);
        let item = self.extract_item(request);

        let mut logs = state.string_list("logs");
        logs.push(format!("Intake parsed: item='{item}', quantity={quantity}"));

        Ok(Fragment::new()
            .with("item", item)
            .with("quantity", quantity)
            .with("logs", logs))
    }
}
