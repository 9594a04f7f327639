//! Grocery list generation for a recipe selection.
//!
//! Ties the pieces together: local aggregation for recipes with structured
//! ingredient data, the consolidator for everything else, the selection cache
//! in front of both, and a local fallback when the service can't help.

use serde::Serialize;

use crate::ai::{AiConfig, AiError, ConsolidationMode, Consolidator, ParsedResult};
use crate::aggregate::{aggregate_recipes, merge_aggregates};
use crate::format::{
    apply_tiering_policy, empty_list_markdown, render_grocery_markdown, render_sections,
    EMPTY_SELECTION_MESSAGE,
};
use crate::selection_cache::SelectionMemo;
use crate::types::{AggregatedIngredient, DegradedReason, ListStatus, Recipe};

/// A generated grocery list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroceryList {
    pub items: Vec<AggregatedIngredient>,
    pub markdown: String,
    pub status: ListStatus,
    /// Whether the list came from the selection cache.
    pub cached: bool,
}

impl GroceryList {
    fn empty_selection() -> Self {
        Self {
            items: Vec::new(),
            markdown: empty_list_markdown(EMPTY_SELECTION_MESSAGE),
            status: ListStatus::Complete,
            cached: false,
        }
    }
}

/// A list that could not be fully consolidated, with the reason.
struct Degraded<T> {
    value: T,
    reason: DegradedReason,
}

/// Builds grocery lists and memoizes them per selection.
pub struct GroceryListGenerator {
    consolidator: Option<Consolidator>,
    items_memo: SelectionMemo<Vec<AggregatedIngredient>>,
    markdown_memo: SelectionMemo<String>,
}

impl GroceryListGenerator {
    /// `None` builds every list locally and marks it offline.
    pub fn new(consolidator: Option<Consolidator>) -> Self {
        Self {
            consolidator,
            items_memo: SelectionMemo::single_slot(),
            markdown_memo: SelectionMemo::single_slot(),
        }
    }

    /// Use custom memo storage.
    pub fn with_memos(
        consolidator: Option<Consolidator>,
        items_memo: SelectionMemo<Vec<AggregatedIngredient>>,
        markdown_memo: SelectionMemo<String>,
    ) -> Self {
        Self {
            consolidator,
            items_memo,
            markdown_memo,
        }
    }

    /// Build a generator from environment configuration.
    pub fn from_env() -> Result<Self, AiError> {
        let config = AiConfig::from_env()?;
        Self::from_config(&config)
    }

    pub fn from_config(config: &AiConfig) -> Result<Self, AiError> {
        let consolidator = config
            .create_client()?
            .map(|client| Consolidator::from_config(client, config));
        Ok(Self::new(consolidator))
    }

    pub fn is_online(&self) -> bool {
        self.consolidator.is_some()
    }

    /// Generate the grocery list for a selection.
    ///
    /// Never fails. When consolidation is unavailable or fails the list is
    /// built locally and `status` is `Degraded`; degraded lists are not
    /// cached.
    pub async fn generate(&self, recipes: &[Recipe], mode: ConsolidationMode) -> GroceryList {
        if recipes.is_empty() {
            return GroceryList::empty_selection();
        }

        let list = match mode {
            ConsolidationMode::PurchaseUnits => self.generate_purchase_units(recipes).await,
            ConsolidationMode::Markdown => self.generate_markdown(recipes).await,
        };

        if let ListStatus::Degraded(reason) = &list.status {
            tracing::warn!(
                mode = mode.as_str(),
                reason = ?reason,
                recipes = recipes.len(),
                "Returning degraded grocery list"
            );
        }
        list
    }

    async fn generate_purchase_units(&self, recipes: &[Recipe]) -> GroceryList {
        let memoized = self
            .items_memo
            .get_or_compute(recipes, || self.compute_purchase_units(recipes))
            .await;

        let (items, status, cached) = match memoized {
            Ok(memoized) => (memoized.items, ListStatus::Complete, memoized.cache_hit),
            Err(degraded) => (degraded.value, ListStatus::Degraded(degraded.reason), false),
        };

        GroceryList {
            markdown: render_grocery_markdown(&apply_tiering_policy(&items)),
            items,
            status,
            cached,
        }
    }

    /// Structured recipes aggregate locally; the rest go to the service.
    async fn compute_purchase_units(
        &self,
        recipes: &[Recipe],
    ) -> Result<Vec<AggregatedIngredient>, Degraded<Vec<AggregatedIngredient>>> {
        let (structured, remote): (Vec<Recipe>, Vec<Recipe>) = recipes
            .iter()
            .cloned()
            .partition(Recipe::has_structured_data);
        let local = aggregate_recipes(&structured);

        if remote.is_empty() {
            return Ok(local);
        }

        let Some(consolidator) = &self.consolidator else {
            return Err(Degraded {
                value: merge_aggregates([local, aggregate_recipes(&remote)]),
                reason: DegradedReason::Offline,
            });
        };

        let outcome = consolidator
            .consolidate(ConsolidationMode::PurchaseUnits, &remote)
            .await;
        let remote_items = match outcome.result {
            ParsedResult::PurchaseUnits(items) => items,
            ParsedResult::Categories(_) => aggregate_recipes(&remote),
        };
        let merged = merge_aggregates([local, remote_items]);

        match outcome.status {
            ListStatus::Complete => Ok(merged),
            ListStatus::Degraded(reason) => Err(Degraded {
                value: merged,
                reason,
            }),
        }
    }

    async fn generate_markdown(&self, recipes: &[Recipe]) -> GroceryList {
        let memoized = self
            .markdown_memo
            .get_or_compute(recipes, || self.compute_markdown(recipes))
            .await;

        let (markdown, status, cached) = match memoized {
            Ok(memoized) => (memoized.items, ListStatus::Complete, memoized.cache_hit),
            Err(degraded) => (degraded.value, ListStatus::Degraded(degraded.reason), false),
        };

        GroceryList {
            items: aggregate_recipes(recipes),
            markdown,
            status,
            cached,
        }
    }

    async fn compute_markdown(&self, recipes: &[Recipe]) -> Result<String, Degraded<String>> {
        let Some(consolidator) = &self.consolidator else {
            return Err(Degraded {
                value: render_grocery_markdown(&apply_tiering_policy(&aggregate_recipes(recipes))),
                reason: DegradedReason::Offline,
            });
        };

        let outcome = consolidator
            .consolidate(ConsolidationMode::Markdown, recipes)
            .await;
        let markdown = match outcome.result {
            ParsedResult::Categories(sections) => render_sections(&sections),
            ParsedResult::PurchaseUnits(items) => {
                render_grocery_markdown(&apply_tiering_policy(&items))
            }
        };

        match outcome.status {
            ListStatus::Complete => Ok(markdown),
            ListStatus::Degraded(reason) => Err(Degraded {
                value: markdown,
                reason,
            }),
        }
    }

    /// Forget every cached list.
    pub fn clear_cache(&self) {
        self.items_memo.clear();
        self.markdown_memo.clear();
    }
}
