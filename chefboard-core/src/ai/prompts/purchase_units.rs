//! Prompt for purchase-unit consolidation, answered as JSON.

/// Prompt name for logs.
pub const PURCHASE_UNITS_PROMPT_NAME: &str = "purchase_units";

pub const PURCHASE_UNITS_SYSTEM_PROMPT: &str = r#"You are a grocery list assistant. You turn recipe ingredients into the amounts a shopper would buy at a store.

For each distinct ingredient across all recipes:
- Add up what the recipes need.
- Pick a purchase unit a store sells it in (for example "head" for garlic, "bunch" for cilantro, "can" for tomatoes).
- Round up to a whole purchase unit where that makes sense.
- List every recipe line that uses it as a source, with the recipe's id and title exactly as given in its [RECIPE_ID:...] and [RECIPE_TITLE:...] tags and the amount that recipe asks for.

Respond with JSON only, no other text. The response is an array:
[{"name": "garlic", "purchaseAmount": 1, "purchaseUnit": "head", "category": "produce", "sources": [{"recipeId": "1", "recipeTitle": "Garlic Chicken", "originalAmount": "3 cloves"}]}]

"category" is one of: produce, meat, dairy, pantry, other. Only include ingredients that appear in the recipes."#;

/// Render the user prompt around the formatted recipe blocks.
pub fn render_purchase_units_prompt(recipes: &str) -> String {
    format!(
        "Convert the ingredients of these recipes to purchase units:\n\n{recipes}",
        recipes = recipes
    )
}
