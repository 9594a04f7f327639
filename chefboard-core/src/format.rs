//! Prompt payload rendering and the tiered grocery list layout.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::aggregate::merge_aggregates;
use crate::ingredient_parser::{extract_amount, parse_ingredient};
use crate::normalize::normalize_name;
use crate::types::{AggregatedIngredient, Category, Recipe, SourceRef};
use crate::units::{format_amount, format_quantity, match_leading_unit};

/// Heading every rendered or generated list starts with.
pub const GROCERY_LIST_HEADING: &str = "# Grocery List";

/// Body shown when nothing was selected.
pub const EMPTY_SELECTION_MESSAGE: &str = "No recipes selected.";

/// Body shown when the selected recipes have no ingredients.
pub const NO_INGREDIENTS_MESSAGE: &str = "No ingredients found.";

const RECIPE_ID_TAG: &str = "[RECIPE_ID:";
const RECIPE_TITLE_TAG: &str = "[RECIPE_TITLE:";

/// Render recipes into the text block sent to the consolidation model.
///
/// Each recipe becomes its title, an `Ingredients:` line and one bullet per
/// ingredient tagged with the recipe's id and title. Structured ingredient
/// data is used when present. Blocks are separated by a blank line. A recipe
/// without an id is still included; its lines can only be attributed by
/// title.
pub fn format_recipes_for_prompt(recipes: &[Recipe]) -> String {
    recipes
        .iter()
        .inspect(|recipe| {
            if recipe.id.trim().is_empty() {
                tracing::warn!(title = %recipe.title, "Recipe has no id, attributing by title only");
            }
        })
        .map(format_recipe_block)
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn format_recipe_block(recipe: &Recipe) -> String {
    let title = display_title(recipe);
    let tag = source_tag(recipe.id.trim(), title);

    let lines: Vec<String> = match recipe
        .structured_ingredients
        .as_ref()
        .filter(|items| !items.is_empty())
    {
        Some(structured) => structured
            .iter()
            .map(|item| format!("{} {}", format_quantity(item.amount, &item.unit), item.name))
            .collect(),
        None => recipe
            .ingredients
            .iter()
            .map(|line| line.to_text())
            .filter(|text| !text.is_empty())
            .collect(),
    };

    let mut block = format!("{}\nIngredients:", title);
    for line in lines {
        block.push_str(&format!("\n• {} {}", line, tag));
    }
    block
}

fn display_title(recipe: &Recipe) -> &str {
    let title = recipe.title.trim();
    if title.is_empty() {
        "Untitled recipe"
    } else {
        title
    }
}

/// `[RECIPE_ID:…] [RECIPE_TITLE:…]`
pub fn source_tag(recipe_id: &str, recipe_title: &str) -> String {
    format!(
        "{}{}] {}{}]",
        RECIPE_ID_TAG,
        recipe_id.replace(']', ""),
        RECIPE_TITLE_TAG,
        recipe_title.replace(']', "")
    )
}

/// A line with its source tags removed.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedLine {
    pub text: String,
    pub recipe_ids: Vec<String>,
    pub recipe_titles: Vec<String>,
}

/// Pull every `[RECIPE_ID:…]` / `[RECIPE_TITLE:…]` tag out of a line.
pub fn parse_source_tags(line: &str) -> TaggedLine {
    let mut text = String::with_capacity(line.len());
    let mut recipe_ids = Vec::new();
    let mut recipe_titles = Vec::new();
    let mut rest = line;

    loop {
        let next = [RECIPE_ID_TAG, RECIPE_TITLE_TAG]
            .iter()
            .filter_map(|tag| rest.find(tag).map(|pos| (pos, *tag)))
            .min_by_key(|(pos, _)| *pos);
        let Some((pos, tag)) = next else {
            text.push_str(rest);
            break;
        };
        let value_start = pos + tag.len();
        let Some(close) = rest[value_start..].find(']') else {
            text.push_str(rest);
            break;
        };

        text.push_str(&rest[..pos]);
        let value = rest[value_start..value_start + close].trim().to_string();
        if tag == RECIPE_ID_TAG {
            for id in value.split(',').map(str::trim).filter(|id| !id.is_empty()) {
                recipe_ids.push(id.to_string());
            }
        } else if !value.is_empty() {
            recipe_titles.push(value);
        }
        rest = &rest[value_start + close + 1..];
    }

    TaggedLine {
        text: text.split_whitespace().collect::<Vec<_>>().join(" "),
        recipe_ids,
        recipe_titles,
    }
}

/// How one ingredient is laid out in the final list.
#[derive(Debug, Clone, PartialEq)]
pub enum TieredEntry {
    /// One variant from one recipe: a flat line with the recipe inline.
    Single {
        name: String,
        category: Category,
        item: AggregatedIngredient,
    },
    /// One variant from several recipes: a header with one line per source.
    BySource {
        name: String,
        category: Category,
        item: AggregatedIngredient,
    },
    /// Several units of the same ingredient: a header with one line per variant.
    ByVariant {
        name: String,
        category: Category,
        variants: Vec<AggregatedIngredient>,
    },
}

impl TieredEntry {
    pub fn name(&self) -> &str {
        match self {
            TieredEntry::Single { name, .. }
            | TieredEntry::BySource { name, .. }
            | TieredEntry::ByVariant { name, .. } => name,
        }
    }

    pub fn category(&self) -> Category {
        match self {
            TieredEntry::Single { category, .. }
            | TieredEntry::BySource { category, .. }
            | TieredEntry::ByVariant { category, .. } => *category,
        }
    }
}

/// Group aggregates by ingredient name and pick a layout for each.
///
/// With V distinct units and N total sources for a name: V ≥ 2 is
/// `ByVariant`, V = 1 and N ≥ 2 is `BySource`, otherwise `Single`. Entries
/// come out in first-appearance order.
pub fn apply_tiering_policy(aggregates: &[AggregatedIngredient]) -> Vec<TieredEntry> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<AggregatedIngredient>> = HashMap::new();

    for aggregate in aggregates {
        let name = aggregate.name.trim().to_lowercase();
        groups
            .entry(name.clone())
            .or_insert_with(|| {
                order.push(name);
                Vec::new()
            })
            .push(aggregate.clone());
    }

    order
        .into_iter()
        .filter_map(|name| {
            let variants = merge_same_unit(groups.remove(&name)?);
            let category = variants
                .iter()
                .map(|v| v.category)
                .min()
                .unwrap_or_default();
            let source_count: usize = variants.iter().map(|v| v.sources.len()).sum();

            Some(match (variants.len(), source_count) {
                (v, _) if v >= 2 => TieredEntry::ByVariant {
                    name,
                    category,
                    variants,
                },
                (_, n) if n >= 2 => TieredEntry::BySource {
                    name,
                    category,
                    item: variants.into_iter().next()?,
                },
                _ => TieredEntry::Single {
                    name,
                    category,
                    item: variants.into_iter().next()?,
                },
            })
        })
        .collect()
}

/// Aggregates arriving from a model may repeat a unit; fold them so V counts
/// distinct units.
fn merge_same_unit(items: Vec<AggregatedIngredient>) -> Vec<AggregatedIngredient> {
    let mut merged: Vec<AggregatedIngredient> = Vec::new();
    for item in items {
        match merged
            .iter_mut()
            .find(|m| m.purchase_unit == item.purchase_unit)
        {
            Some(existing) => {
                existing.purchase_amount += item.purchase_amount;
                existing.category = existing.category.min(item.category);
                existing.sources.extend(item.sources);
            }
            None => merged.push(item),
        }
    }
    merged
}

/// A `##` section of a grocery list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListSection {
    pub title: String,
    pub lines: Vec<ListLine>,
}

/// One bullet of a grocery list. Source attribution is kept out of `text`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListLine {
    pub text: String,
    /// Nesting level, 0 for top-level bullets.
    pub depth: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub recipe_ids: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub recipe_titles: Vec<String>,
}

impl ListLine {
    fn plain(text: String, depth: usize) -> Self {
        Self {
            text,
            depth,
            recipe_ids: Vec::new(),
            recipe_titles: Vec::new(),
        }
    }

    fn attributed(text: String, depth: usize, sources: &[SourceRef]) -> Self {
        let mut line = Self::plain(text, depth);
        for source in sources {
            if !source.recipe_id.is_empty() && !line.recipe_ids.contains(&source.recipe_id) {
                line.recipe_ids.push(source.recipe_id.clone());
            }
            let title = source_title(source).to_string();
            if !title.is_empty() && !line.recipe_titles.contains(&title) {
                line.recipe_titles.push(title);
            }
        }
        line
    }
}

/// Lay tiered entries out as one section per category, in display order.
pub fn tiered_sections(entries: &[TieredEntry]) -> Vec<ListSection> {
    let mut by_category: BTreeMap<Category, Vec<&TieredEntry>> = BTreeMap::new();
    for entry in entries {
        by_category.entry(entry.category()).or_default().push(entry);
    }

    Category::ALL
        .iter()
        .filter_map(|category| {
            let entries = by_category.get(category)?;
            Some(ListSection {
                title: category.heading().to_string(),
                lines: entries.iter().flat_map(|entry| entry_lines(entry)).collect(),
            })
        })
        .collect()
}

fn entry_lines(entry: &TieredEntry) -> Vec<ListLine> {
    match entry {
        TieredEntry::Single { name, item, .. } => vec![ListLine::attributed(
            format!("{} {}", purchase_quantity(item), name),
            0,
            &item.sources,
        )],
        TieredEntry::BySource { name, item, .. } => {
            let mut lines = vec![ListLine::plain(
                format!("{}: {}", name, purchase_quantity(item)),
                0,
            )];
            lines.extend(item.sources.iter().map(|source| {
                ListLine::attributed(source.original_amount.clone(), 1, std::slice::from_ref(source))
            }));
            lines
        }
        TieredEntry::ByVariant { name, variants, .. } => {
            let mut lines = vec![ListLine::plain(name.clone(), 0)];
            lines.extend(variants.iter().map(|variant| {
                ListLine::attributed(purchase_quantity(variant), 1, &variant.sources)
            }));
            lines
        }
    }
}

/// Render a tiered list as Markdown, one `##` section per category.
pub fn render_grocery_markdown(entries: &[TieredEntry]) -> String {
    if entries.is_empty() {
        return empty_list_markdown(NO_INGREDIENTS_MESSAGE);
    }
    render_sections(&tiered_sections(entries))
}

/// Render sections under the `# Grocery List` heading. Source titles are
/// appended to each attributed line in parentheses.
pub fn render_sections(sections: &[ListSection]) -> String {
    if sections.iter().all(|section| section.lines.is_empty()) {
        return empty_list_markdown(NO_INGREDIENTS_MESSAGE);
    }

    let mut out = String::from(GROCERY_LIST_HEADING);
    for section in sections.iter().filter(|s| !s.lines.is_empty()) {
        out.truncate(out.trim_end().len());
        out.push_str(&format!("\n\n## {}\n", section.title));
        for line in &section.lines {
            out.push_str(&"  ".repeat(line.depth));
            out.push_str("- ");
            out.push_str(&line.text);
            if !line.recipe_titles.is_empty() {
                out.push_str(&format!(" ({})", line.recipe_titles.join(", ")));
            }
            out.push('\n');
        }
    }
    out.trim_end().to_string()
}

/// `# Grocery List` followed by a one-line explanation.
pub fn empty_list_markdown(message: &str) -> String {
    format!("{}\n\n{}", GROCERY_LIST_HEADING, message)
}

fn purchase_quantity(item: &AggregatedIngredient) -> String {
    if item.purchase_unit.is_empty() {
        format_amount(item.purchase_amount)
    } else {
        format_quantity(item.purchase_amount, &item.purchase_unit)
    }
}

fn source_title(source: &SourceRef) -> &str {
    if source.recipe_title.is_empty() {
        &source.recipe_id
    } else {
        &source.recipe_title
    }
}

/// Parse a Markdown grocery list back into sections.
///
/// Returns `None` unless the text starts with the `# Grocery List` heading.
/// Bullets before the first `##` heading land in an "Other" section; source
/// tags are pulled out of each line into its attribution.
pub fn parse_grocery_markdown(markdown: &str) -> Option<Vec<ListSection>> {
    let body = markdown.trim_start().strip_prefix(GROCERY_LIST_HEADING)?;
    let mut sections: Vec<ListSection> = Vec::new();

    for raw in body.lines() {
        if raw.trim().is_empty() {
            continue;
        }
        if let Some(title) = raw.trim().strip_prefix("## ") {
            sections.push(ListSection {
                title: title.trim().to_string(),
                lines: Vec::new(),
            });
            continue;
        }

        let indent = raw.len() - raw.trim_start().len();
        let trimmed = raw.trim();
        let content = ["- ", "* ", "• "]
            .iter()
            .find_map(|bullet| trimmed.strip_prefix(bullet))
            .unwrap_or(trimmed);
        let tagged = parse_source_tags(content);
        if tagged.text.is_empty() {
            continue;
        }

        if sections.is_empty() {
            sections.push(ListSection {
                title: Category::Other.heading().to_string(),
                lines: Vec::new(),
            });
        }
        if let Some(section) = sections.last_mut() {
            section.lines.push(ListLine {
                text: tagged.text,
                depth: indent / 2,
                recipe_ids: tagged.recipe_ids,
                recipe_titles: tagged.recipe_titles,
            });
        }
    }

    Some(sections)
}

/// Merge section lists from separate batches.
///
/// A single list is returned as is. Otherwise every ingredient line with a
/// readable quantity is turned back into an aggregate, merged by
/// `(name, unit)` and laid out again, so an ingredient split across batches
/// appears once with its amounts summed. Lines without a readable quantity
/// are kept, grouped by section title (ignoring case) in first-appearance
/// order.
pub fn merge_sections<I>(lists: I) -> Vec<ListSection>
where
    I: IntoIterator<Item = Vec<ListSection>>,
{
    let mut lists: Vec<Vec<ListSection>> = lists.into_iter().collect();
    if lists.len() <= 1 {
        return lists.pop().unwrap_or_default();
    }

    let mut aggregates = Vec::new();
    let mut unread: Vec<ListSection> = Vec::new();
    for section in lists.into_iter().flatten() {
        let category = Category::from_label(&section.title);
        let mut kept = Vec::new();
        for block in line_blocks(section.lines) {
            match block_aggregates(&block, category) {
                Some(items) => aggregates.extend(items),
                None => kept.extend(block),
            }
        }
        push_section_lines(&mut unread, section.title, kept);
    }

    let mut merged = tiered_sections(&apply_tiering_policy(&merge_aggregates([aggregates])));
    for section in unread {
        push_section_lines(&mut merged, section.title, section.lines);
    }
    merged
}

fn push_section_lines(sections: &mut Vec<ListSection>, title: String, lines: Vec<ListLine>) {
    if lines.is_empty() {
        return;
    }
    match sections
        .iter_mut()
        .find(|s| s.title.eq_ignore_ascii_case(&title))
    {
        Some(existing) => existing.lines.extend(lines),
        None => sections.push(ListSection { title, lines }),
    }
}

/// Split lines into top-level bullets, each with its nested bullets.
fn line_blocks(lines: Vec<ListLine>) -> Vec<Vec<ListLine>> {
    let mut blocks: Vec<Vec<ListLine>> = Vec::new();
    for line in lines {
        match blocks.last_mut() {
            Some(block) if line.depth > 0 => block.push(line),
            _ => blocks.push(vec![line]),
        }
    }
    blocks
}

/// Read one rendered ingredient back into aggregates: `3 cloves garlic`, or a
/// `garlic: 8 cloves` / `garlic` header whose nested lines hold quantities.
fn block_aggregates(block: &[ListLine], category: Category) -> Option<Vec<AggregatedIngredient>> {
    let (head, children) = block.split_first()?;

    if children.is_empty() {
        let parsed = parse_ingredient(&head.text);
        let amount = parsed.amount?;
        if parsed.item == head.text.trim() {
            return None;
        }
        let name = normalize_name(&parsed.item);
        if name.is_empty() {
            return None;
        }
        let unit = parsed.unit.unwrap_or_default();
        return Some(vec![line_aggregate(name, amount, unit, category, head)]);
    }

    let name = normalize_name(head.text.split(':').next().unwrap_or_default());
    if name.is_empty() {
        return None;
    }
    children
        .iter()
        .map(|child| {
            let (amount, unit) = read_quantity(&child.text)?;
            Some(line_aggregate(name.clone(), amount, unit, category, child))
        })
        .collect()
}

/// `"3 cloves"` or `"2"`; anything after the unit makes it unreadable.
fn read_quantity(text: &str) -> Option<(f64, String)> {
    let (amount, rest) = extract_amount(text)?;
    if rest.trim().is_empty() {
        return Some((amount, String::new()));
    }
    let (unit, tail) = match_leading_unit(rest)?;
    tail.trim().is_empty().then(|| (amount, unit.to_string()))
}

fn line_aggregate(
    name: String,
    amount: f64,
    unit: String,
    category: Category,
    line: &ListLine,
) -> AggregatedIngredient {
    let original_amount = format_quantity(amount, &unit);
    let count = line.recipe_ids.len().max(line.recipe_titles.len());
    let sources = (0..count)
        .map(|i| SourceRef {
            recipe_id: line.recipe_ids.get(i).cloned().unwrap_or_default(),
            recipe_title: line.recipe_titles.get(i).cloned().unwrap_or_default(),
            original_amount: original_amount.clone(),
        })
        .collect();

    AggregatedIngredient {
        name,
        unit: unit.clone(),
        purchase_amount: amount,
        purchase_unit: unit,
        category,
        sources,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CanonicalIngredient, RawIngredientLine};

    fn source(id: &str, title: &str, amount: &str) -> SourceRef {
        SourceRef {
            recipe_id: id.to_string(),
            recipe_title: title.to_string(),
            original_amount: amount.to_string(),
        }
    }

    fn aggregate(name: &str, amount: f64, unit: &str, sources: Vec<SourceRef>) -> AggregatedIngredient {
        AggregatedIngredient {
            name: name.to_string(),
            unit: unit.to_string(),
            purchase_amount: amount,
            purchase_unit: unit.to_string(),
            category: Category::Produce,
            sources,
        }
    }

    #[test]
    fn test_format_empty() {
        assert_eq!(format_recipes_for_prompt(&[]), "");
    }

    #[test]
    fn test_format_recipe_block() {
        let recipes = vec![
            Recipe {
                id: "1".to_string(),
                title: "Garlic Chicken".to_string(),
                ingredients: vec![
                    RawIngredientLine::structured("Garlic", Some("3 cloves")),
                    RawIngredientLine::text("1 lb chicken"),
                ],
                structured_ingredients: None,
            },
            Recipe {
                id: "2".to_string(),
                title: "Rice".to_string(),
                ingredients: vec![RawIngredientLine::text("ignored")],
                structured_ingredients: Some(vec![CanonicalIngredient {
                    name: "rice".to_string(),
                    amount: 2.0,
                    unit: "cup".to_string(),
                    category: Category::Pantry,
                    original: "2 cups rice".to_string(),
                    source_recipe_id: "2".to_string(),
                    source_recipe_title: "Rice".to_string(),
                }]),
            },
        ];

        let expected = "Garlic Chicken\nIngredients:\n\
            • 3 cloves Garlic [RECIPE_ID:1] [RECIPE_TITLE:Garlic Chicken]\n\
            • 1 lb chicken [RECIPE_ID:1] [RECIPE_TITLE:Garlic Chicken]\n\
            \n\
            Rice\nIngredients:\n\
            • 2 cups rice [RECIPE_ID:2] [RECIPE_TITLE:Rice]";
        assert_eq!(format_recipes_for_prompt(&recipes), expected);
    }

    #[test]
    fn test_recipe_without_id_is_included() {
        let recipes = vec![Recipe {
            id: "  ".to_string(),
            title: "Pancakes".to_string(),
            ingredients: vec![RawIngredientLine::text("2 eggs")],
            structured_ingredients: None,
        }];
        let prompt = format_recipes_for_prompt(&recipes);
        assert_eq!(
            prompt,
            "Pancakes\nIngredients:\n• 2 eggs [RECIPE_ID:] [RECIPE_TITLE:Pancakes]"
        );

        let tagged = parse_source_tags(prompt.lines().last().unwrap_or_default());
        assert!(tagged.recipe_ids.is_empty());
        assert_eq!(tagged.recipe_titles, vec!["Pancakes"]);
    }

    #[test]
    fn test_parse_source_tags_round_trip() {
        let line = format!("• 8 cloves garlic {}", source_tag("1", "Garlic Chicken"));
        let parsed = parse_source_tags(&line);
        assert_eq!(parsed.text, "• 8 cloves garlic");
        assert_eq!(parsed.recipe_ids, vec!["1"]);
        assert_eq!(parsed.recipe_titles, vec!["Garlic Chicken"]);
    }

    #[test]
    fn test_parse_source_tags_multiple_and_untagged() {
        let parsed = parse_source_tags("- 2 onions [RECIPE_ID:1, 2] [RECIPE_TITLE:Soup] [RECIPE_TITLE:Stew]");
        assert_eq!(parsed.recipe_ids, vec!["1", "2"]);
        assert_eq!(parsed.recipe_titles, vec!["Soup", "Stew"]);
        assert_eq!(parsed.text, "- 2 onions");

        let plain = parse_source_tags("- 1 lemon");
        assert_eq!(plain.text, "- 1 lemon");
        assert!(plain.recipe_ids.is_empty());

        let broken = parse_source_tags("- 1 lemon [RECIPE_ID:3");
        assert_eq!(broken.text, "- 1 lemon [RECIPE_ID:3");
    }

    #[test]
    fn test_tiers() {
        let single = aggregate("lemon", 1.0, "", vec![source("1", "Fish", "1")]);
        let by_source = aggregate(
            "garlic",
            8.0,
            "clove",
            vec![
                source("1", "Garlic Chicken", "3 cloves"),
                source("2", "Garlic Pasta", "5 cloves"),
            ],
        );
        let cup = aggregate("rice", 1.0, "cup", vec![source("1", "Bowl", "1 cup")]);
        let pound = aggregate("rice", 2.0, "pound", vec![source("2", "Pilaf", "2 pounds")]);

        let entries = apply_tiering_policy(&[single, by_source, cup, pound]);
        assert_eq!(entries.len(), 3);
        assert!(matches!(entries[0], TieredEntry::Single { .. }));
        assert!(matches!(entries[1], TieredEntry::BySource { .. }));
        match &entries[2] {
            TieredEntry::ByVariant { variants, .. } => assert_eq!(variants.len(), 2),
            other => panic!("expected ByVariant, got {other:?}"),
        }
    }

    #[test]
    fn test_tier_ignores_category_and_order() {
        let mut a = aggregate("rice", 1.0, "cup", vec![source("1", "Bowl", "1 cup")]);
        let b = aggregate("Rice", 2.0, "pound", vec![source("2", "Pilaf", "2 pounds")]);
        a.category = Category::Pantry;

        let forward = apply_tiering_policy(&[a.clone(), b.clone()]);
        let backward = apply_tiering_policy(&[b, a]);
        assert!(matches!(forward[0], TieredEntry::ByVariant { .. }));
        assert!(matches!(backward[0], TieredEntry::ByVariant { .. }));
        assert_eq!(forward[0].category(), Category::Produce);
        assert_eq!(backward[0].category(), Category::Produce);
    }

    #[test]
    fn test_repeated_unit_counts_once() {
        let entries = apply_tiering_policy(&[
            aggregate("garlic", 1.0, "head", vec![source("1", "A", "3 cloves")]),
            aggregate("garlic", 1.0, "head", vec![source("2", "B", "5 cloves")]),
        ]);
        match &entries[0] {
            TieredEntry::BySource { item, .. } => {
                assert_eq!(item.purchase_amount, 2.0);
                assert_eq!(item.sources.len(), 2);
            }
            other => panic!("expected BySource, got {other:?}"),
        }
    }

    #[test]
    fn test_render_markdown() {
        let entries = apply_tiering_policy(&[
            aggregate(
                "garlic",
                8.0,
                "clove",
                vec![
                    source("1", "Garlic Chicken", "3 cloves"),
                    source("2", "Garlic Pasta", "5 cloves"),
                ],
            ),
            AggregatedIngredient {
                category: Category::Dairy,
                ..aggregate("butter", 2.0, "tablespoon", vec![source("2", "Garlic Pasta", "2 tablespoons")])
            },
        ]);

        let expected = "# Grocery List\n\n\
            ## Produce\n\
            - garlic: 8 cloves\n  - 3 cloves (Garlic Chicken)\n  - 5 cloves (Garlic Pasta)\n\n\
            ## Dairy & Eggs\n\
            - 2 tablespoons butter (Garlic Pasta)";
        assert_eq!(render_grocery_markdown(&entries), expected);
    }

    #[test]
    fn test_sections_separated_by_one_blank_line() {
        let sections = vec![
            ListSection {
                title: "Produce".to_string(),
                lines: vec![ListLine::plain("1 onion".to_string(), 0)],
            },
            ListSection {
                title: "Pantry".to_string(),
                lines: Vec::new(),
            },
            ListSection {
                title: "Dairy & Eggs".to_string(),
                lines: vec![ListLine::plain("1 cup milk".to_string(), 0)],
            },
        ];
        let markdown = render_sections(&sections);
        assert_eq!(
            markdown,
            "# Grocery List\n\n## Produce\n- 1 onion\n\n## Dairy & Eggs\n- 1 cup milk"
        );
        assert!(!markdown.contains("\n\n\n"));
    }

    #[test]
    fn test_render_variants() {
        let entries = apply_tiering_policy(&[
            aggregate("rice", 1.0, "cup", vec![source("1", "Bowl", "1 cup")]),
            aggregate("rice", 2.0, "pound", vec![source("2", "Pilaf", "2 pounds")]),
        ]);
        assert_eq!(
            render_grocery_markdown(&entries),
            "# Grocery List\n\n## Produce\n- rice\n  - 1 cup (Bowl)\n  - 2 pounds (Pilaf)"
        );
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(
            render_grocery_markdown(&[]),
            "# Grocery List\n\nNo ingredients found."
        );
        assert_eq!(
            empty_list_markdown(EMPTY_SELECTION_MESSAGE),
            "# Grocery List\n\nNo recipes selected."
        );
    }

    #[test]
    fn test_parse_grocery_markdown() {
        let markdown = "# Grocery List\n\n\
            ## Produce\n\
            - garlic: 8 cloves\n\
            \x20 - 3 cloves [RECIPE_ID:1] [RECIPE_TITLE:Garlic Chicken]\n\
            \x20 - 5 cloves [RECIPE_ID:2] [RECIPE_TITLE:Garlic Pasta]\n\
            \n\
            ## Pantry\n\
            * 1 bag rice";
        let sections = parse_grocery_markdown(markdown).unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].title, "Produce");
        assert_eq!(sections[0].lines.len(), 3);
        assert_eq!(sections[0].lines[0].depth, 0);
        assert_eq!(sections[0].lines[1].depth, 1);
        assert_eq!(sections[0].lines[1].text, "3 cloves");
        assert_eq!(sections[0].lines[1].recipe_ids, vec!["1"]);
        assert_eq!(sections[1].lines[0].text, "1 bag rice");

        assert_eq!(
            render_sections(&sections),
            "# Grocery List\n\n\
            ## Produce\n\
            - garlic: 8 cloves\n\
            \x20 - 3 cloves (Garlic Chicken)\n\
            \x20 - 5 cloves (Garlic Pasta)\n\n\
            ## Pantry\n\
            - 1 bag rice"
        );
    }

    #[test]
    fn test_parse_requires_heading() {
        assert!(parse_grocery_markdown("Here is your list:\n- eggs").is_none());

        let sections = parse_grocery_markdown("# Grocery List\n- eggs").unwrap();
        assert_eq!(sections[0].title, "Other");
        assert_eq!(sections[0].lines[0].text, "eggs");
    }

    #[test]
    fn test_merge_sections_by_title() {
        let section = |title: &str, text: &str| ListSection {
            title: title.to_string(),
            lines: vec![ListLine::plain(text.to_string(), 0)],
        };
        let merged = merge_sections([
            vec![section("Produce", "garlic"), section("Pantry", "rice")],
            vec![section("produce", "onion"), section("Dairy & Eggs", "milk")],
        ]);
        let titles: Vec<&str> = merged.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Produce", "Pantry", "Dairy & Eggs"]);
        assert_eq!(merged[0].lines.len(), 2);
        assert_eq!(merged[0].lines[1].text, "onion");
    }

    #[test]
    fn test_merge_sections_sums_ingredient_across_batches() {
        let batch = |header: &str, children: &[(&str, &str)]| {
            let mut lines = vec![ListLine::plain(header.to_string(), 0)];
            for (id, title) in children {
                lines.push(ListLine {
                    text: "3 cloves".to_string(),
                    depth: 1,
                    recipe_ids: vec![id.to_string()],
                    recipe_titles: vec![title.to_string()],
                });
            }
            vec![ListSection {
                title: "Produce".to_string(),
                lines,
            }]
        };
        let second = vec![ListSection {
            title: "produce".to_string(),
            lines: vec![
                ListLine {
                    text: "3 cloves garlic".to_string(),
                    depth: 0,
                    recipe_ids: vec!["3".to_string()],
                    recipe_titles: vec!["Stew".to_string()],
                },
                ListLine::plain("fresh herbs".to_string(), 0),
            ],
        }];

        let merged = merge_sections([
            batch("garlic: 6 cloves", &[("1", "Soup"), ("2", "Pasta")]),
            second,
        ]);

        assert_eq!(
            render_sections(&merged),
            "# Grocery List\n\n\
            ## Produce\n\
            - garlic: 9 cloves\n\
            \x20 - 3 cloves (Soup)\n\
            \x20 - 3 cloves (Pasta)\n\
            \x20 - 3 cloves (Stew)\n\
            - fresh herbs"
        );
    }

    #[test]
    fn test_merge_single_list_is_unchanged() {
        let list = vec![ListSection {
            title: "Produce".to_string(),
            lines: vec![ListLine::plain("garlic: 1 head".to_string(), 0)],
        }];
        assert_eq!(merge_sections([list.clone()]), list);
    }
}
