//! Ingredient categorization for grocery list grouping.
//!
//! Maps ingredient names to aisle categories based on keyword matching.
//! Keyword data is loaded from `data/ingredients.json` at compile time.

use serde::Deserialize;
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::types::Category;

/// The raw JSON structure for the ingredients data file.
#[derive(Deserialize)]
struct IngredientsData {
    categories: HashMap<String, Category>,
}

/// Keyword map sorted by keyword length (longest first), so "peanut butter"
/// is tried before "butter".
static INGREDIENT_MAP: LazyLock<Vec<(String, Category)>> = LazyLock::new(|| {
    let json = include_str!("../../data/ingredients.json");
    let data: IngredientsData =
        serde_json::from_str(json).expect("Failed to parse ingredients.json");

    let mut map: Vec<(String, Category)> = data.categories.into_iter().collect();
    // Secondary sort by keyword for deterministic ordering.
    map.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));
    map
});

/// Categorize an ingredient by name.
///
/// Matching is case-insensitive and looks for keyword containment. Returns
/// `Category::Other` if nothing matches.
pub fn categorize(item: &str) -> Category {
    let lower = item.to_lowercase();

    INGREDIENT_MAP
        .iter()
        .find(|(keyword, _)| lower.contains(keyword.as_str()))
        .map(|(_, category)| *category)
        .unwrap_or(Category::Other)
}
