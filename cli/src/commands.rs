use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use chefboard_core::ai::prompts::{GROCERY_LIST_SYSTEM_PROMPT, PURCHASE_UNITS_SYSTEM_PROMPT};
use chefboard_core::{
    format_recipes_for_prompt, ConsolidationMode, GroceryListGenerator, RawIngredientLine, Recipe,
};

fn load_recipes(path: &Path) -> Result<Vec<Recipe>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let recipes: Vec<Recipe> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse recipes from {}", path.display()))?;
    tracing::debug!(count = recipes.len(), path = %path.display(), "Loaded recipes");
    Ok(recipes)
}

pub async fn grocery(path: &Path, mode: ConsolidationMode, json: bool, offline: bool) -> Result<()> {
    let recipes = load_recipes(path)?;

    let generator = if offline {
        GroceryListGenerator::new(None)
    } else {
        GroceryListGenerator::from_env().context("Invalid AI configuration")?
    };
    if !generator.is_online() {
        tracing::info!("No consolidation service configured, building the list locally");
    }

    let list = generator.generate(&recipes, mode).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&list)?);
    } else {
        if let Some(message) = list.status.user_message() {
            eprintln!("{}", message);
        }
        println!("{}", list.markdown);
    }

    Ok(())
}

pub fn normalize(lines: &[String]) -> Result<()> {
    let normalized: Vec<_> = lines
        .iter()
        .map(|line| chefboard_core::normalize(&RawIngredientLine::text(line.as_str()), "", ""))
        .collect();
    println!("{}", serde_json::to_string_pretty(&normalized)?);
    Ok(())
}

pub fn prompt(path: &Path, mode: Option<ConsolidationMode>) -> Result<()> {
    let recipes = load_recipes(path)?;

    match mode {
        Some(ConsolidationMode::Markdown) => println!("{}\n", GROCERY_LIST_SYSTEM_PROMPT),
        Some(ConsolidationMode::PurchaseUnits) => println!("{}\n", PURCHASE_UNITS_SYSTEM_PROMPT),
        None => {}
    }
    println!("{}", format_recipes_for_prompt(&recipes));
    Ok(())
}
