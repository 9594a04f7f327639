//! Resolves raw ingredient lines into [`CanonicalIngredient`]s.
//!
//! Everything downstream of this module only sees canonical ingredients.

use crate::ingredient_categorizer::categorize;
use crate::ingredient_parser::{extract_amount, parse_ingredient, skip_leading_parenthetical};
use crate::types::{CanonicalIngredient, RawIngredientLine, Recipe};
use crate::units::{format_amount, match_leading_unit, normalize_unit};

/// Normalize one raw ingredient line from a recipe.
///
/// Never fails. An unparsable quantity becomes amount 1 with no unit, and the
/// whole line is kept as the name.
pub fn normalize(raw: &RawIngredientLine, recipe_id: &str, recipe_title: &str) -> CanonicalIngredient {
    let original = match raw {
        RawIngredientLine::Text { value } => value.clone(),
        RawIngredientLine::Structured { name, amount, prep } => {
            structured_text(name, amount.as_deref(), prep.as_deref())
        }
    };
    let (name, amount, unit) = normalize_text(&original);

    CanonicalIngredient {
        category: categorize(&name),
        name,
        amount,
        unit,
        original,
        source_recipe_id: recipe_id.to_string(),
        source_recipe_title: recipe_title.to_string(),
    }
}

/// Normalize every ingredient of a recipe.
///
/// Structured ingredient data wins over raw lines when present; its names and
/// units are re-normalized and attributed to the recipe.
pub fn normalize_recipe(recipe: &Recipe) -> Vec<CanonicalIngredient> {
    if let Some(structured) = recipe
        .structured_ingredients
        .as_ref()
        .filter(|items| !items.is_empty())
    {
        return structured
            .iter()
            .map(|item| canonicalize(item, recipe))
            .collect();
    }

    recipe
        .ingredients
        .iter()
        .filter(|line| !line.to_text().is_empty())
        .map(|line| normalize(line, &recipe.id, &recipe.title))
        .collect()
}

/// Bring a pre-structured ingredient onto the same key space as parsed ones.
fn canonicalize(item: &CanonicalIngredient, recipe: &Recipe) -> CanonicalIngredient {
    let name = normalize_name(&item.name);
    let amount = if item.amount.is_finite() && item.amount >= 0.0 {
        item.amount
    } else {
        tracing::debug!(name = %item.name, amount = item.amount, "Invalid structured amount, defaulting to 1");
        1.0
    };
    let category = if item.category == Default::default() {
        categorize(&name)
    } else {
        item.category
    };

    CanonicalIngredient {
        name,
        amount,
        unit: normalize_unit(&item.unit),
        category,
        original: item.original.clone(),
        source_recipe_id: non_empty_or(&item.source_recipe_id, &recipe.id),
        source_recipe_title: non_empty_or(&item.source_recipe_title, &recipe.title),
    }
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

fn normalize_text(value: &str) -> (String, f64, String) {
    let parsed = parse_ingredient(value);

    match parsed.amount {
        Some(amount) if !parsed.item.eq(value.trim()) => {
            let name = normalize_name(&parsed.item);
            if name.is_empty() {
                return unparsed(value);
            }
            (name, amount, parsed.unit.unwrap_or_default())
        }
        _ => unparsed(value),
    }
}

/// Write a structured record as a line that the text rule reads back into the
/// same ingredient, so normalizing `original` again is stable.
///
/// Only units from the table stay in front of the name. Any other remainder
/// of the amount ("2 knobs") becomes an aside after the name, and an amount
/// with no leading quantity is kept the same way.
fn structured_text(name: &str, amount: Option<&str>, prep: Option<&str>) -> String {
    let name = name.trim();
    let mut text = match amount.map(str::trim).filter(|a| !a.is_empty()) {
        None => name.to_string(),
        Some(amount) => match extract_amount(amount) {
            Some((_, rest)) if is_unit_only(rest) => format!("{} {}", amount, name),
            Some((quantity, rest)) => {
                tracing::debug!(amount, name, "Amount has no known unit, keeping it as an aside");
                format!("{} {} ({})", format_amount(quantity), name, rest.trim())
            }
            None => {
                tracing::debug!(amount, name, "Unparsable amount, defaulting to 1");
                format!("{} ({})", name, amount)
            }
        },
    };
    if let Some(prep) = prep.map(str::trim).filter(|p| !p.is_empty()) {
        text.push_str(", ");
        text.push_str(prep);
    }
    text
}

/// Nothing, or one known unit optionally preceded by an aside ("(14 oz) can").
fn is_unit_only(rest: &str) -> bool {
    rest.trim().is_empty()
        || match_leading_unit(skip_leading_parenthetical(rest))
            .is_some_and(|(_, tail)| tail.trim().is_empty())
}

fn unparsed(value: &str) -> (String, f64, String) {
    tracing::debug!(line = value, "No leading quantity, keeping full text as name");
    (collapse_whitespace(&value.to_lowercase()), 1.0, String::new())
}

/// Reduce an item to its core noun phrase: lowercased, parenthetical asides
/// and preparation notes removed, whitespace collapsed.
pub fn normalize_name(item: &str) -> String {
    let lower = item.to_lowercase();
    let without_asides = strip_parentheticals(&lower);
    let core = without_asides.split(',').next().unwrap_or_default();
    let core = collapse_whitespace(core);
    let core = core.strip_prefix("of ").unwrap_or(&core);
    core.trim_matches(|c: char| c == '-' || c == '.' || c.is_whitespace())
        .to_string()
}

fn strip_parentheticals(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut depth = 0usize;
    for c in s.chars() {
        match c {
            '(' => depth += 1,
            ')' if depth > 0 => depth -= 1,
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Category;

    fn text(value: &str) -> CanonicalIngredient {
        normalize(&RawIngredientLine::text(value), "r1", "Recipe One")
    }

    #[test]
    fn test_text_line() {
        let result = text("2 cups flour, sifted");
        assert_eq!(result.name, "flour");
        assert_eq!(result.amount, 2.0);
        assert_eq!(result.unit, "cup");
        assert_eq!(result.category, Category::Pantry);
        assert_eq!(result.original, "2 cups flour, sifted");
        assert_eq!(result.source_recipe_id, "r1");
        assert_eq!(result.source_recipe_title, "Recipe One");
    }

    #[test]
    fn test_unit_synonyms_collapse() {
        assert_eq!(text("1 tbsp olive oil").unit, "tablespoon");
        assert_eq!(text("2 Tablespoons olive oil").unit, "tablespoon");
        assert_eq!(text("1 c milk").unit, "cup");
        assert_eq!(text("2 lbs ground beef").unit, "pound");
        assert_eq!(text("1 pound ground beef").unit, "pound");
    }

    #[test]
    fn test_mixed_number_and_unicode() {
        let result = text("1 1/2 cups water");
        assert_eq!(result.amount, 1.5);
        assert_eq!(result.name, "water");
        assert_eq!(text("½ tsp salt").amount, 0.5);
    }

    #[test]
    fn test_unparsable_quantity_keeps_text() {
        let result = text("Salt and pepper, to taste");
        assert_eq!(result.amount, 1.0);
        assert_eq!(result.unit, "");
        assert_eq!(result.name, "salt and pepper, to taste");
        assert_eq!(result.original, "Salt and pepper, to taste");
    }

    #[test]
    fn test_amount_without_item_keeps_text() {
        let result = text("2 cups");
        assert_eq!(result.amount, 1.0);
        assert_eq!(result.name, "2 cups");
    }

    #[test]
    fn test_name_cleanup() {
        assert_eq!(text("a pinch of salt").name, "salt");
        assert_eq!(text("1 (14 oz) can diced tomatoes").name, "diced tomatoes");
        assert_eq!(text("3 eggs (large)").name, "eggs");
        assert_eq!(text("2   Red   Onions").name, "red onions");
    }

    #[test]
    fn test_structured_line() {
        let line = RawIngredientLine::Structured {
            name: "Garlic".to_string(),
            amount: Some("3 cloves".to_string()),
            prep: Some("minced".to_string()),
        };
        let result = normalize(&line, "1", "Garlic Chicken");
        assert_eq!(result.name, "garlic");
        assert_eq!(result.amount, 3.0);
        assert_eq!(result.unit, "clove");
        assert_eq!(result.original, "3 cloves Garlic, minced");
    }

    #[test]
    fn test_structured_unknown_unit_becomes_aside() {
        let line = RawIngredientLine::structured("Ginger", Some("2 Knobs"));
        let result = normalize(&line, "1", "Stir Fry");
        assert_eq!(result.name, "ginger");
        assert_eq!(result.amount, 2.0);
        assert_eq!(result.unit, "");
        assert_eq!(result.original, "2 Ginger (Knobs)");
    }

    #[test]
    fn test_structured_can_size_is_skipped() {
        let line = RawIngredientLine::structured("Diced Tomatoes", Some("1 (14 oz) can"));
        let result = normalize(&line, "1", "Chili");
        assert_eq!(result.name, "diced tomatoes");
        assert_eq!(result.amount, 1.0);
        assert_eq!(result.unit, "can");
    }

    #[test]
    fn test_structured_missing_amount() {
        let result = normalize(&RawIngredientLine::structured("Salt", None), "1", "Soup");
        assert_eq!(result.amount, 1.0);
        assert_eq!(result.unit, "");
        assert_eq!(result.name, "salt");

        let result = normalize(
            &RawIngredientLine::structured("Salt", Some("some")),
            "1",
            "Soup",
        );
        assert_eq!(result.amount, 1.0);
        assert_eq!(result.unit, "");
    }

    #[test]
    fn test_normalize_recipe_prefers_structured() {
        let recipe = Recipe {
            id: "7".to_string(),
            title: "Soup".to_string(),
            ingredients: vec![RawIngredientLine::text("9 cups water")],
            structured_ingredients: Some(vec![CanonicalIngredient {
                name: "  Carrots ".to_string(),
                amount: 2.0,
                unit: "Cups".to_string(),
                category: Category::Other,
                original: "2 cups carrots".to_string(),
                source_recipe_id: String::new(),
                source_recipe_title: String::new(),
            }]),
        };
        let items = normalize_recipe(&recipe);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "carrots");
        assert_eq!(items[0].unit, "cup");
        assert_eq!(items[0].category, Category::Produce);
        assert_eq!(items[0].source_recipe_id, "7");
        assert_eq!(items[0].source_recipe_title, "Soup");
    }

    #[test]
    fn test_normalize_recipe_skips_blank_lines() {
        let recipe = Recipe {
            id: "1".to_string(),
            title: "Toast".to_string(),
            ingredients: vec![
                RawIngredientLine::text("2 slices bread"),
                RawIngredientLine::text("   "),
            ],
            structured_ingredients: None,
        };
        assert_eq!(normalize_recipe(&recipe).len(), 1);
    }

    #[test]
    fn test_renormalizing_original_is_stable() {
        for line in [
            "2 cups flour, sifted",
            "1 1/2 cups water",
            "3 cloves garlic, minced",
            "Salt to taste",
            "½ tsp salt",
        ] {
            let first = text(line);
            let second = text(&first.original);
            assert_eq!(first, second, "unstable for {line:?}");
        }
        for (name, amount, prep) in [
            ("Garlic", Some("3 cloves"), Some("minced")),
            ("Ginger", Some("2 Knobs"), None),
            ("Diced Tomatoes", Some("1 (14 oz) can"), None),
            ("Eggs", Some("3"), None),
            ("Salt", None, None),
            ("Salt", Some("some"), None),
        ] {
            let line = RawIngredientLine::Structured {
                name: name.to_string(),
                amount: amount.map(str::to_string),
                prep: prep.map(str::to_string),
            };
            let first = normalize(&line, "r1", "Recipe One");
            let second = text(&first.original);
            assert_eq!(first, second, "unstable for {name:?} {amount:?}");
        }
    }
}
