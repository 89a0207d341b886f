//! Supplier stage: maps an item to its preferred supplier.

use super::singularize;
use crate::config::WorkflowConfig;
use crate::stage::Stage;
use crate::state::{Fragment, State};
use async_trait::async_trait;
use std::collections::BTreeMap;

/// The supplier reported when the catalog has no entry for an item.
pub const UNKNOWN_SUPPLIER: &str = "Unknown Supplier";

/// Resolves the `item` field to a supplier via the injected catalog.
///
/// Lookup keys are normalized (trimmed, lowercased, singular). A miss gets
/// a second chance with the plural form toggled before falling back to
/// [`UNKNOWN_SUPPLIER`].
#[derive(Debug)]
pub struct SupplierStage {
    catalog: BTreeMap<String, String>,
}

impl SupplierStage {
    /// Creates a supplier stage from the workflow configuration.
    ///
    /// Catalog keys are normalized once here, not on every lookup.
    #[must_use]
    pub fn new(config: &WorkflowConfig) -> Self {
        let catalog = config
            .supplier_catalog
            .iter()
            .map(|(item, supplier)| (normalize(item), supplier.clone()))
            .collect();
        Self { catalog }
    }

    fn lookup(&self, item: &str) -> Option<&str> {
        let key = normalize(item);
        if let Some(supplier) = self.catalog.get(&key) {
            return Some(supplier);
        }
        self.catalog.get(&toggle_plural(&key)).map(String::as_str)
    }
}

fn normalize(text: &str) -> String {
    singularize(&text.trim().to_lowercase())
}

/// Toggles the naive plural form for a second-chance match.
fn toggle_plural(text: &str) -> String {
    if text.ends_with('s') && !text.ends_with("ss") {
        text[..text.len() - 1].to_string()
    } else {
        format!("{text}s")
    }
}

#[async_trait]
impl Stage for SupplierStage {
    fn name(&self) -> &str {
        "supplier"
    }

    async fn run(&self, state: &State) -> anyhow::Result<Fragment> {
        let item = state.get_str("item").unwrap_or_default();
        let supplier = self.lookup(item).unwrap_or(UNKNOWN_SUPPLIER).to_string();

        let mut logs = state.string_list("logs");
        logs.push(format!("Supplier selected: '{supplier}' for item '{item}'"));

        Ok(Fragment::new().with("supplier", supplier).with("logs", logs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn stage() -> SupplierStage {
        SupplierStage::new(&WorkflowConfig::default())
    }

    #[tokio::test]
    async fn resolves_known_item() {
        let state = State::new().with_field("item", "laptop");
        let fragment = stage().run(&state).await.unwrap();
        assert_eq!(
            fragment.get("supplier").and_then(|v| v.as_str()),
            Some("Acme Computers")
        );
    }

    #[tokio::test]
    async fn plural_query_matches_singular_catalog_key() {
        let state = State::new().with_field("item", "chairs");
        let fragment = stage().run(&state).await.unwrap();
        assert_eq!(
            fragment.get("supplier").and_then(|v| v.as_str()),
            Some("OfficeCo")
        );
    }

    #[tokio::test]
    async fn unknown_item_falls_back() {
        let state = State::new().with_field("item", "submarine");
        let fragment = stage().run(&state).await.unwrap();
        assert_eq!(
            fragment.get("supplier").and_then(|v| v.as_str()),
            Some(UNKNOWN_SUPPLIER)
        );
    }

    #[tokio::test]
    async fn missing_item_field_falls_back() {
        let fragment = stage().run(&State::new()).await.unwrap();
        assert_eq!(
            fragment.get("supplier").and_then(|v| v.as_str()),
            Some(UNKNOWN_SUPPLIER)
        );
    }

    #[test]
    fn second_chance_toggles_plural() {
        let mut config = WorkflowConfig::default();
        config
            .supplier_catalog
            .insert("glass".to_string(), "ClearCo".to_string());
        let stage = SupplierStage::new(&config);

        assert_eq!(stage.lookup("glass"), Some("ClearCo"));
        assert_eq!(stage.lookup("laptops"), Some("Acme Computers"));
    }
}
