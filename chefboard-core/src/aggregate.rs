//! Merges canonical ingredients from many recipes into one list.
//!
//! Grouping is by `(name, unit)` after normalization. There is no cross-unit
//! conversion: "1 cup garlic" and "3 cloves garlic" stay separate aggregates
//! and are only grouped together when the list is rendered.

use std::collections::HashMap;

use crate::normalize::{normalize_name, normalize_recipe};
use crate::types::{AggregatedIngredient, CanonicalIngredient, Recipe, SourceRef};
use crate::units::{format_quantity, normalize_unit};

type GroupKey = (String, String);

/// Aggregate canonical ingredients.
///
/// Amounts are summed exactly; rounding happens only when formatting. Every
/// input item adds one entry to its group's `sources`, in input order. Groups
/// are returned in order of first appearance.
pub fn aggregate(items: &[CanonicalIngredient]) -> Vec<AggregatedIngredient> {
    let mut groups = Groups::default();

    for item in items {
        let unit = normalize_unit(&item.unit);
        let source = SourceRef {
            recipe_id: item.source_recipe_id.clone(),
            recipe_title: item.source_recipe_title.clone(),
            original_amount: format_quantity(item.amount, &unit),
        };
        groups.add(
            AggregatedIngredient {
                name: normalize_name(&item.name),
                purchase_unit: unit.clone(),
                unit,
                purchase_amount: item.amount,
                category: item.category,
                sources: Vec::new(),
            },
            vec![source],
        );
    }

    groups.into_vec()
}

/// Normalize and aggregate every ingredient of the given recipes locally.
pub fn aggregate_recipes(recipes: &[Recipe]) -> Vec<AggregatedIngredient> {
    let items: Vec<CanonicalIngredient> = recipes.iter().flat_map(normalize_recipe).collect();
    aggregate(&items)
}

/// Merge lists that were already aggregated, e.g. the results of separate
/// consolidation batches.
///
/// Aggregates with the same `(name, unit)` have their purchase amounts summed
/// and their sources concatenated. The purchase unit of the first occurrence
/// is kept.
pub fn merge_aggregates<I>(lists: I) -> Vec<AggregatedIngredient>
where
    I: IntoIterator<Item = Vec<AggregatedIngredient>>,
{
    let mut groups = Groups::default();

    for list in lists {
        for mut item in list {
            let sources = std::mem::take(&mut item.sources);
            item.name = normalize_name(&item.name);
            item.unit = normalize_unit(if item.unit.is_empty() {
                &item.purchase_unit
            } else {
                &item.unit
            });
            item.purchase_unit = normalize_unit(&item.purchase_unit);
            groups.add(item, sources);
        }
    }

    groups.into_vec()
}

/// Insertion-ordered groups keyed by `(name, unit)`. When contributors
/// disagree on the category the lowest one in display order wins, so the
/// result does not depend on input order.
#[derive(Default)]
struct Groups {
    index: HashMap<GroupKey, usize>,
    entries: Vec<AggregatedIngredient>,
}

impl Groups {
    fn add(&mut self, item: AggregatedIngredient, sources: Vec<SourceRef>) {
        let key = (item.name.clone(), item.unit.clone());
        match self.index.get(&key) {
            Some(&i) => {
                let entry = &mut self.entries[i];
                entry.purchase_amount += item.purchase_amount;
                entry.category = entry.category.min(item.category);
                entry.sources.extend(sources);
            }
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push(AggregatedIngredient { sources, ..item });
            }
        }
    }

    fn into_vec(self) -> Vec<AggregatedIngredient> {
        self.entries
    }
}
