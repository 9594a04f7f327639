use serde::{Deserialize, Deserializer, Serialize};

/// A recipe as supplied by the recipe source. Never mutated by this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub ingredients: Vec<RawIngredientLine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_ingredients: Option<Vec<CanonicalIngredient>>,
}

impl Recipe {
    /// Whether the recipe already carries normalized ingredient data that can be
    /// aggregated locally.
    pub fn has_structured_data(&self) -> bool {
        self.structured_ingredients
            .as_ref()
            .is_some_and(|items| !items.is_empty())
    }
}

/// An ingredient line as authored or imported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawIngredientLine {
    /// Free text, e.g. "2 cups flour, sifted".
    Text { value: String },
    /// A record split into fields by an importer.
    Structured {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        amount: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        prep: Option<String>,
    },
}

impl RawIngredientLine {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text {
            value: value.into(),
        }
    }

    pub fn structured(name: impl Into<String>, amount: Option<&str>) -> Self {
        Self::Structured {
            name: name.into(),
            amount: amount.map(str::to_string),
            prep: None,
        }
    }

    /// The line as a single piece of text, the way a person would write it.
    pub fn to_text(&self) -> String {
        match self {
            Self::Text { value } => value.trim().to_string(),
            Self::Structured { name, amount, prep } => {
                let mut text = match amount.as_deref().map(str::trim) {
                    Some(amount) if !amount.is_empty() => format!("{} {}", amount, name.trim()),
                    _ => name.trim().to_string(),
                };
                if let Some(prep) = prep.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
                    text.push_str(", ");
                    text.push_str(prep);
                }
                text
            }
        }
    }
}

/// Grocery aisle grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Produce,
    Meat,
    Dairy,
    Pantry,
    #[default]
    Other,
}

impl Category {
    /// Display order for rendered lists.
    pub const ALL: &'static [Category] = &[
        Category::Produce,
        Category::Meat,
        Category::Dairy,
        Category::Pantry,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Produce => "produce",
            Category::Meat => "meat",
            Category::Dairy => "dairy",
            Category::Pantry => "pantry",
            Category::Other => "other",
        }
    }

    pub fn heading(&self) -> &'static str {
        match self {
            Category::Produce => "Produce",
            Category::Meat => "Meat & Seafood",
            Category::Dairy => "Dairy & Eggs",
            Category::Pantry => "Pantry",
            Category::Other => "Other",
        }
    }

    /// Lenient label lookup. Unknown labels map to `Other`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "produce" | "fruit" | "vegetables" | "vegetable" => Category::Produce,
            "meat" | "seafood" | "meat & seafood" | "protein" => Category::Meat,
            "dairy" | "dairy & eggs" | "eggs" | "cheese" => Category::Dairy,
            "pantry" | "baking" | "spices" | "condiments" | "canned goods" => Category::Pantry,
            _ => Category::Other,
        }
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = Option::<String>::deserialize(deserializer)?;
        Ok(label.map(|l| Category::from_label(&l)).unwrap_or_default())
    }
}

/// Normalized form of one ingredient line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalIngredient {
    /// Lowercased, trimmed core noun phrase.
    pub name: String,
    /// Non-negative and finite.
    pub amount: f64,
    /// Normalized unit, the original token if unrecognized, or "" for counts.
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub category: Category,
    /// Verbatim source text.
    #[serde(default)]
    pub original: String,
    #[serde(default)]
    pub source_recipe_id: String,
    #[serde(default)]
    pub source_recipe_title: String,
}

/// One contributor to an aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRef {
    #[serde(default)]
    pub recipe_id: String,
    #[serde(default)]
    pub recipe_title: String,
    #[serde(default)]
    pub original_amount: String,
}

/// Merged result for one `(name, unit)` group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedIngredient {
    pub name: String,
    #[serde(default)]
    pub unit: String,
    #[serde(deserialize_with = "deserialize_amount", default = "default_amount")]
    pub purchase_amount: f64,
    #[serde(default)]
    pub purchase_unit: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub sources: Vec<SourceRef>,
}

fn default_amount() -> f64 {
    1.0
}

/// Models sometimes answer `"1.5"` or `"1 1/2"` where a number was asked for.
fn deserialize_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Amount {
        Number(f64),
        Text(String),
        Missing(Option<()>),
    }

    let amount = match Amount::deserialize(deserializer)? {
        Amount::Number(n) => n,
        Amount::Text(text) => crate::ingredient_parser::parse_amount(&text).unwrap_or(1.0),
        Amount::Missing(_) => 1.0,
    };
    Ok(if amount.is_finite() && amount >= 0.0 {
        amount
    } else {
        1.0
    })
}

/// Whether a generated list is the full consolidated result.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "camelCase")]
pub enum ListStatus {
    #[default]
    Complete,
    /// A local best-effort list stands in for the consolidated one.
    Degraded(DegradedReason),
}

impl ListStatus {
    pub fn is_degraded(&self) -> bool {
        matches!(self, ListStatus::Degraded(_))
    }

    /// Short notice for the user, if the list is degraded.
    pub fn user_message(&self) -> Option<&'static str> {
        match self {
            ListStatus::Complete => None,
            ListStatus::Degraded(reason) => Some(reason.user_message()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DegradedReason {
    /// No consolidation service is configured.
    Offline,
    /// The consolidation service failed or answered with something unusable.
    ServiceUnavailable,
}

impl DegradedReason {
    pub fn user_message(&self) -> &'static str {
        match self {
            DegradedReason::Offline => {
                "Smart consolidation is offline. Showing a basic combined list."
            }
            DegradedReason::ServiceUnavailable => {
                "Couldn't reach the grocery service. Showing a basic combined list."
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_line_tagged_json() {
        let json = r#"[
            {"kind": "text", "value": "2 cups flour"},
            {"kind": "structured", "name": "Garlic", "amount": "3 cloves"}
        ]"#;
        let lines: Vec<RawIngredientLine> = serde_json::from_str(json).unwrap();
        assert_eq!(lines[0], RawIngredientLine::text("2 cups flour"));
        assert_eq!(
            lines[1],
            RawIngredientLine::structured("Garlic", Some("3 cloves"))
        );
    }

    #[test]
    fn test_structured_to_text() {
        let line = RawIngredientLine::Structured {
            name: "Garlic".to_string(),
            amount: Some("3 cloves".to_string()),
            prep: Some("minced".to_string()),
        };
        assert_eq!(line.to_text(), "3 cloves Garlic, minced");
        assert_eq!(
            RawIngredientLine::structured("Salt", None).to_text(),
            "Salt"
        );
    }

    #[test]
    fn test_category_lenient_labels() {
        let parsed: Vec<Category> =
            serde_json::from_str(r#"["Produce", "dairy", "Frozen", null]"#).unwrap();
        assert_eq!(
            parsed,
            vec![
                Category::Produce,
                Category::Dairy,
                Category::Other,
                Category::Other
            ]
        );
        assert_eq!(serde_json::to_string(&Category::Meat).unwrap(), r#""meat""#);
    }

    #[test]
    fn test_aggregate_amount_accepts_strings() {
        let json = r#"{"name": "garlic", "purchaseAmount": "1 1/2", "purchaseUnit": "head"}"#;
        let item: AggregatedIngredient = serde_json::from_str(json).unwrap();
        assert_eq!(item.purchase_amount, 1.5);
        assert_eq!(item.category, Category::Other);
        assert!(item.sources.is_empty());
    }

    #[test]
    fn test_aggregate_amount_rejects_negative() {
        let json = r#"{"name": "garlic", "purchaseAmount": -3}"#;
        let item: AggregatedIngredient = serde_json::from_str(json).unwrap();
        assert_eq!(item.purchase_amount, 1.0);
    }

    #[test]
    fn test_list_status_json() {
        let degraded = ListStatus::Degraded(DegradedReason::ServiceUnavailable);
        assert_eq!(
            serde_json::to_string(&degraded).unwrap(),
            r#"{"state":"degraded","reason":"serviceUnavailable"}"#
        );
        assert_eq!(
            serde_json::to_string(&ListStatus::Complete).unwrap(),
            r#"{"state":"complete"}"#
        );
        assert!(degraded.user_message().is_some());
        assert!(ListStatus::Complete.user_message().is_none());
    }
}
