//! Batched grocery consolidation through an [`AiClient`].

use std::sync::Arc;
use std::time::Duration;

use super::client::{AiClient, AiError};
use super::config::{AiConfig, DEFAULT_BATCH_DELAY_MS, DEFAULT_BATCH_SIZE};
use super::prompts::{
    render_grocery_list_prompt, render_purchase_units_prompt, GROCERY_LIST_PROMPT_NAME,
    GROCERY_LIST_SYSTEM_PROMPT, PURCHASE_UNITS_PROMPT_NAME, PURCHASE_UNITS_SYSTEM_PROMPT,
};
use super::response::{extract_text, parse_markdown_list, parse_purchase_units};
use super::types::{ChatMessage, ChatRequest};
use crate::aggregate::{aggregate_recipes, merge_aggregates};
use crate::format::{
    apply_tiering_policy, format_recipes_for_prompt, merge_sections, tiered_sections, ListSection,
};
use crate::ingredient_categorizer::categorize;
use crate::types::{AggregatedIngredient, Category, DegradedReason, ListStatus, Recipe, SourceRef};

/// What the consolidation service is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsolidationMode {
    /// A categorized Markdown list.
    Markdown,
    /// Structured aggregates in store purchase units.
    PurchaseUnits,
}

impl ConsolidationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsolidationMode::Markdown => "markdown",
            ConsolidationMode::PurchaseUnits => "purchase_units",
        }
    }

    fn prompt_name(&self) -> &'static str {
        match self {
            ConsolidationMode::Markdown => GROCERY_LIST_PROMPT_NAME,
            ConsolidationMode::PurchaseUnits => PURCHASE_UNITS_PROMPT_NAME,
        }
    }

    fn build_request(&self, batch: &[Recipe]) -> ChatRequest {
        let recipes = format_recipes_for_prompt(batch);
        let (system, user) = match self {
            ConsolidationMode::Markdown => {
                (GROCERY_LIST_SYSTEM_PROMPT, render_grocery_list_prompt(&recipes))
            }
            ConsolidationMode::PurchaseUnits => (
                PURCHASE_UNITS_SYSTEM_PROMPT,
                render_purchase_units_prompt(&recipes),
            ),
        };
        ChatRequest {
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            temperature: Some(0.2),
            json_response: *self == ConsolidationMode::PurchaseUnits,
        }
    }
}

/// A consolidated list in the shape the mode asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedResult {
    Categories(Vec<ListSection>),
    PurchaseUnits(Vec<AggregatedIngredient>),
}

impl ParsedResult {
    fn empty(mode: ConsolidationMode) -> Self {
        match mode {
            ConsolidationMode::Markdown => ParsedResult::Categories(Vec::new()),
            ConsolidationMode::PurchaseUnits => ParsedResult::PurchaseUnits(Vec::new()),
        }
    }

    /// Build the result locally, without the service.
    pub fn local(mode: ConsolidationMode, recipes: &[Recipe]) -> Self {
        let items = aggregate_recipes(recipes);
        match mode {
            ConsolidationMode::Markdown => {
                ParsedResult::Categories(tiered_sections(&apply_tiering_policy(&items)))
            }
            ConsolidationMode::PurchaseUnits => ParsedResult::PurchaseUnits(items),
        }
    }

    fn merge(mode: ConsolidationMode, results: Vec<ParsedResult>) -> Self {
        match mode {
            ConsolidationMode::Markdown => ParsedResult::Categories(merge_sections(
                results.into_iter().filter_map(|r| match r {
                    ParsedResult::Categories(sections) => Some(sections),
                    ParsedResult::PurchaseUnits(_) => None,
                }),
            )),
            ConsolidationMode::PurchaseUnits => ParsedResult::PurchaseUnits(merge_aggregates(
                results.into_iter().filter_map(|r| match r {
                    ParsedResult::PurchaseUnits(items) => Some(items),
                    ParsedResult::Categories(_) => None,
                }),
            )),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ParsedResult::Categories(sections) => sections.iter().all(|s| s.lines.is_empty()),
            ParsedResult::PurchaseUnits(items) => items.is_empty(),
        }
    }
}

/// Result of [`Consolidator::consolidate`]. Never an error: on failure the
/// result is the local list and the status says so.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsolidationOutcome {
    pub result: ParsedResult,
    pub status: ListStatus,
}

/// Sends recipes to the consolidation service in fixed-size batches.
#[derive(Debug, Clone)]
pub struct Consolidator {
    client: Arc<dyn AiClient>,
    batch_size: usize,
    batch_delay: Duration,
}

impl Consolidator {
    pub fn new(client: Arc<dyn AiClient>) -> Self {
        Self {
            client,
            batch_size: DEFAULT_BATCH_SIZE,
            batch_delay: Duration::from_millis(DEFAULT_BATCH_DELAY_MS),
        }
    }

    pub fn from_config(client: Arc<dyn AiClient>, config: &AiConfig) -> Self {
        Self::new(client)
            .with_batch_size(config.batch_size)
            .with_batch_delay(config.batch_delay())
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = delay;
        self
    }

    pub fn client(&self) -> &Arc<dyn AiClient> {
        &self.client
    }

    /// Consolidate, failing on the first batch that fails.
    ///
    /// Batches are sent one after another with the configured delay between
    /// them, and their results merged. There are no retries.
    pub async fn request(
        &self,
        mode: ConsolidationMode,
        recipes: &[Recipe],
    ) -> Result<ParsedResult, AiError> {
        if recipes.is_empty() {
            return Ok(ParsedResult::empty(mode));
        }

        let batch_count = recipes.len().div_ceil(self.batch_size);
        let mut results = Vec::with_capacity(batch_count);

        for (index, batch) in recipes.chunks(self.batch_size).enumerate() {
            if index > 0 && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }

            tracing::info!(
                mode = mode.as_str(),
                provider = self.client.provider_name(),
                batch = index + 1,
                of = batch_count,
                recipes = batch.len(),
                "Requesting consolidation"
            );

            let response = self
                .client
                .complete(mode.prompt_name(), mode.build_request(batch))
                .await
                .inspect_err(|e| {
                    tracing::warn!(batch = index + 1, error = %e, "Consolidation batch failed");
                })?;
            let text = extract_text(&response.body);

            let parsed = match mode {
                ConsolidationMode::Markdown => {
                    ParsedResult::Categories(attribute_sections(parse_markdown_list(&text)?, batch))
                }
                ConsolidationMode::PurchaseUnits => ParsedResult::PurchaseUnits(attribute_items(
                    parse_purchase_units(&text)?,
                    batch,
                )),
            };
            results.push(parsed);
        }

        Ok(ParsedResult::merge(mode, results))
    }

    /// Consolidate, falling back to the local list on any failure.
    pub async fn consolidate(
        &self,
        mode: ConsolidationMode,
        recipes: &[Recipe],
    ) -> ConsolidationOutcome {
        match self.request(mode, recipes).await {
            Ok(result) => ConsolidationOutcome {
                result,
                status: ListStatus::Complete,
            },
            Err(e) => {
                tracing::warn!(
                    mode = mode.as_str(),
                    error = %e,
                    "Consolidation failed, using local list"
                );
                ConsolidationOutcome {
                    result: ParsedResult::local(mode, recipes),
                    status: ListStatus::Degraded(DegradedReason::ServiceUnavailable),
                }
            }
        }
    }
}

/// Find the batch recipe a model-reported source refers to, by id first and
/// then by title.
fn resolve<'a>(batch: &'a [Recipe], recipe_id: &str, recipe_title: &str) -> Option<&'a Recipe> {
    let id = recipe_id.trim();
    let title = recipe_title.trim();
    batch
        .iter()
        .find(|r| !id.is_empty() && r.id == id)
        .or_else(|| {
            batch
                .iter()
                .find(|r| !title.is_empty() && r.title.trim().eq_ignore_ascii_case(title))
        })
}

/// Pin every source to a recipe of the batch. Items whose sources all name
/// unknown recipes are dropped.
fn attribute_items(items: Vec<AggregatedIngredient>, batch: &[Recipe]) -> Vec<AggregatedIngredient> {
    items
        .into_iter()
        .filter_map(|mut item| {
            let reported = item.sources.len();
            item.sources = std::mem::take(&mut item.sources)
                .into_iter()
                .filter_map(|source| {
                    let recipe = resolve(batch, &source.recipe_id, &source.recipe_title)?;
                    Some(SourceRef {
                        recipe_id: recipe.id.clone(),
                        recipe_title: recipe.title.clone(),
                        original_amount: source.original_amount,
                    })
                })
                .collect();

            if item.sources.is_empty() {
                tracing::warn!(
                    name = %item.name,
                    reported,
                    "Dropping consolidated item with no source in the selection"
                );
                return None;
            }
            if item.category == Category::Other {
                item.category = categorize(&item.name);
            }
            Some(item)
        })
        .collect()
}

/// Same guard for Markdown lines. Untagged lines (headers) are kept.
fn attribute_sections(sections: Vec<ListSection>, batch: &[Recipe]) -> Vec<ListSection> {
    sections
        .into_iter()
        .map(|mut section| {
            section.lines.retain_mut(|line| {
                if line.recipe_ids.is_empty() && line.recipe_titles.is_empty() {
                    return true;
                }
                let mut matched: Vec<&Recipe> = Vec::new();
                let candidates = line
                    .recipe_ids
                    .iter()
                    .map(|id| resolve(batch, id, ""))
                    .chain(line.recipe_titles.iter().map(|title| resolve(batch, "", title)));
                for recipe in candidates.flatten() {
                    if !matched.iter().any(|m| m.id == recipe.id) {
                        matched.push(recipe);
                    }
                }
                if matched.is_empty() {
                    tracing::warn!(line = %line.text, "Dropping line with no source in the selection");
                    return false;
                }
                line.recipe_ids = matched.iter().map(|r| r.id.clone()).collect();
                line.recipe_titles = matched.iter().map(|r| r.title.clone()).collect();
                true
            });
            section
        })
        .filter(|section| !section.lines.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::fake::FakeAiClient;
    use crate::types::RawIngredientLine;

    fn recipe(id: &str, title: &str, lines: &[&str]) -> Recipe {
        Recipe {
            id: id.to_string(),
            title: title.to_string(),
            ingredients: lines.iter().map(|l| RawIngredientLine::text(*l)).collect(),
            structured_ingredients: None,
        }
    }

    fn consolidator(client: &Arc<FakeAiClient>) -> Consolidator {
        Consolidator::new(client.clone()).with_batch_delay(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_empty_selection_makes_no_call() {
        let client = Arc::new(FakeAiClient::with_response("[]"));
        let result = consolidator(&client)
            .request(ConsolidationMode::PurchaseUnits, &[])
            .await
            .unwrap();
        assert!(result.is_empty());
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_request_shape() {
        let client = Arc::new(FakeAiClient::with_response("[]"));
        consolidator(&client)
            .request(
                ConsolidationMode::PurchaseUnits,
                &[recipe("1", "Soup", &["1 onion"])],
            )
            .await
            .unwrap();

        let request = &client.requests()[0];
        assert!(request.json_response);
        assert_eq!(request.system_prompt(), PURCHASE_UNITS_SYSTEM_PROMPT);
        assert!(request
            .user_prompt()
            .contains("• 1 onion [RECIPE_ID:1] [RECIPE_TITLE:Soup]"));
    }

    #[tokio::test]
    async fn test_reattributes_and_drops_unknown_sources() {
        let body = serde_json::json!({
            "text": serde_json::json!([
                {"name": "onion", "purchaseAmount": 2, "purchaseUnit": "",
                 "sources": [
                    {"recipeId": "1", "recipeTitle": "wrong title", "originalAmount": "1"},
                    {"recipeId": "", "recipeTitle": "stew", "originalAmount": "1"},
                    {"recipeId": "99", "recipeTitle": "Invented", "originalAmount": "4"}
                 ]},
                {"name": "saffron", "purchaseAmount": 1, "purchaseUnit": "jar",
                 "sources": [{"recipeId": "42", "recipeTitle": "Paella"}]}
            ])
            .to_string()
        })
        .to_string();
        let client = Arc::new(FakeAiClient::with_response(body));

        let result = consolidator(&client)
            .request(
                ConsolidationMode::PurchaseUnits,
                &[
                    recipe("1", "Soup", &["1 onion"]),
                    recipe("2", "Stew", &["1 onion"]),
                ],
            )
            .await
            .unwrap();

        let ParsedResult::PurchaseUnits(items) = result else {
            panic!("expected purchase units");
        };
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].category, Category::Produce);
        let sources: Vec<(&str, &str)> = items[0]
            .sources
            .iter()
            .map(|s| (s.recipe_id.as_str(), s.recipe_title.as_str()))
            .collect();
        assert_eq!(sources, vec![("1", "Soup"), ("2", "Stew")]);
    }

    #[tokio::test]
    async fn test_markdown_batches_merge_sections() {
        let client = Arc::new(FakeAiClient::new());
        client.push_response(
            "# Grocery List\n\n## Produce\n- 1 onion [RECIPE_ID:1] [RECIPE_TITLE:Soup]\n- 1 yam [RECIPE_ID:77]",
        );
        client.push_response("```markdown\n# Grocery List\n\n## produce\n- 2 leeks [RECIPE_ID:2]\n## Pantry\n- salt\n```");

        let result = consolidator(&client)
            .with_batch_size(1)
            .request(
                ConsolidationMode::Markdown,
                &[
                    recipe("1", "Soup", &["1 onion"]),
                    recipe("2", "Stew", &["2 leeks"]),
                ],
            )
            .await
            .unwrap();

        assert_eq!(client.call_count(), 2);
        let ParsedResult::Categories(sections) = result else {
            panic!("expected categories");
        };
        assert_eq!(sections.len(), 2);
        let produce: Vec<&str> = sections[0].lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(produce, vec!["1 onion", "2 leeks"]);
        assert_eq!(sections[0].lines[1].recipe_titles, vec!["Stew"]);
        assert_eq!(sections[1].lines[0].text, "salt");
    }

    #[tokio::test]
    async fn test_first_failed_batch_fails_request() {
        let client = Arc::new(FakeAiClient::new());
        client.push_error("connection reset");
        client.push_response("[]");

        let recipes: Vec<Recipe> = (1..=6)
            .map(|i| recipe(&i.to_string(), &format!("Recipe {i}"), &["1 onion"]))
            .collect();
        let err = consolidator(&client)
            .request(ConsolidationMode::PurchaseUnits, &recipes)
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::RequestFailed(_)));
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn test_consolidate_falls_back_locally() {
        let client = Arc::new(FakeAiClient::with_response("not json at all"));
        let outcome = consolidator(&client)
            .consolidate(
                ConsolidationMode::PurchaseUnits,
                &[
                    recipe("1", "Garlic Chicken", &["3 cloves garlic"]),
                    recipe("2", "Garlic Pasta", &["5 cloves garlic"]),
                ],
            )
            .await;

        assert_eq!(
            outcome.status,
            ListStatus::Degraded(DegradedReason::ServiceUnavailable)
        );
        let ParsedResult::PurchaseUnits(items) = outcome.result else {
            panic!("expected purchase units");
        };
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].purchase_amount, 8.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_batches_are_spaced_by_delay() {
        let client = Arc::new(FakeAiClient::with_response("[]"));
        let recipes: Vec<Recipe> = (1..=11)
            .map(|i| recipe(&i.to_string(), "R", &["1 onion"]))
            .collect();

        let start = tokio::time::Instant::now();
        Consolidator::new(client.clone())
            .with_batch_delay(Duration::from_millis(500))
            .request(ConsolidationMode::PurchaseUnits, &recipes)
            .await
            .unwrap();

        assert_eq!(client.call_count(), 3);
        assert!(start.elapsed() >= Duration::from_millis(1000));
    }
}
