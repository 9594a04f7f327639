pub mod aggregate;
pub mod ai;
pub mod format;
pub mod grocery;
pub mod ingredient_categorizer;
pub mod ingredient_parser;
pub mod normalize;
pub mod selection_cache;
pub mod types;
pub mod units;

pub use aggregate::{aggregate, aggregate_recipes, merge_aggregates};
pub use ai::{ConsolidationMode, ConsolidationOutcome, Consolidator, ParsedResult};
pub use format::{
    apply_tiering_policy, format_recipes_for_prompt, parse_source_tags, render_grocery_markdown,
    ListLine, ListSection, TieredEntry,
};
pub use grocery::{GroceryList, GroceryListGenerator};
pub use ingredient_categorizer::categorize;
pub use normalize::{normalize, normalize_recipe};
pub use selection_cache::{SelectionCache, SelectionMemo, SingleSlotCache};
pub use types::{
    AggregatedIngredient, CanonicalIngredient, Category, DegradedReason, ListStatus,
    RawIngredientLine, Recipe, SourceRef,
};
