//! Getting model output out of whatever shape the service answered with.

use serde_json::Value;

use super::client::{truncate_body, AiError};
use crate::format::{parse_grocery_markdown, ListSection};
use crate::types::AggregatedIngredient;

type Extractor = fn(&Value) -> Option<String>;

/// Response shapes, tried in this order.
const EXTRACTORS: &[(&str, Extractor)] = &[
    ("text_field", text_field),
    ("gemini_candidates", gemini_candidates),
    ("openai_choices", openai_choices),
];

/// `{"text": "..."}`
fn text_field(value: &Value) -> Option<String> {
    value.get("text")?.as_str().map(str::to_string)
}

/// `{"candidates": [{"content": {"parts": [{"text": "..."}]}}]}`
fn gemini_candidates(value: &Value) -> Option<String> {
    value
        .pointer("/candidates/0/content/parts/0/text")?
        .as_str()
        .map(str::to_string)
}

/// `{"choices": [{"message": {"content": "..."}}]}`
fn openai_choices(value: &Value) -> Option<String> {
    value
        .pointer("/choices/0/message/content")?
        .as_str()
        .map(str::to_string)
}

/// Pull the model's text out of a response body.
///
/// Falls back to the raw body when no known shape matches.
pub fn extract_text(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        for (name, extractor) in EXTRACTORS {
            if let Some(text) = extractor(&value) {
                tracing::trace!(shape = *name, "Extracted response text");
                return text;
            }
        }
    }
    body.to_string()
}

/// Strip a surrounding Markdown code fence, if any.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json", "markdown", ...) on the opening line.
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    rest.trim_end()
        .strip_suffix("```")
        .unwrap_or(rest)
        .trim()
}

/// Parse a purchase-units answer: a JSON array of aggregates, or an object
/// holding one under `ingredients` or `items`.
///
/// Entries that don't deserialize are skipped.
pub fn parse_purchase_units(text: &str) -> Result<Vec<AggregatedIngredient>, AiError> {
    let text = strip_code_fences(text);
    let value: Value = serde_json::from_str(text)
        .or_else(|e| embedded_array(text).ok_or(e))
        .map_err(|e| {
            AiError::ParseError(format!(
                "Purchase units are not JSON ({}): {}",
                e,
                truncate_body(text)
            ))
        })?;

    let entries = match value {
        Value::Array(entries) => entries,
        Value::Object(mut map) => match map.remove("ingredients").or_else(|| map.remove("items")) {
            Some(Value::Array(entries)) => entries,
            _ => {
                return Err(AiError::ParseError(
                    "Expected a JSON array of ingredients".to_string(),
                ))
            }
        },
        _ => {
            return Err(AiError::ParseError(
                "Expected a JSON array of ingredients".to_string(),
            ))
        }
    };

    Ok(entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<AggregatedIngredient>(entry) {
            Ok(item) if !item.name.trim().is_empty() => Some(item),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed purchase unit entry");
                None
            }
        })
        .collect())
}

/// Models sometimes wrap the array in prose.
fn embedded_array(text: &str) -> Option<Value> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

/// Parse a Markdown answer into sections.
pub fn parse_markdown_list(text: &str) -> Result<Vec<ListSection>, AiError> {
    let text = strip_code_fences(text);
    parse_grocery_markdown(text).ok_or_else(|| {
        AiError::ParseError(format!(
            "Expected a list starting with \"# Grocery List\": {}",
            truncate_body(text)
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extractor_priority() {
        assert_eq!(extract_text(r#"{"text": "hello"}"#), "hello");
        assert_eq!(
            extract_text(r#"{"candidates": [{"content": {"parts": [{"text": "gemini"}]}}]}"#),
            "gemini"
        );
        assert_eq!(
            extract_text(r#"{"choices": [{"message": {"content": "openai"}}]}"#),
            "openai"
        );
        assert_eq!(
            extract_text(r#"{"text": "first", "choices": [{"message": {"content": "second"}}]}"#),
            "first"
        );
        assert_eq!(extract_text("# Grocery List"), "# Grocery List");
        assert_eq!(extract_text(r#"[{"name": "garlic"}]"#), r#"[{"name": "garlic"}]"#);
        assert_eq!(extract_text(r#"{"other": 1}"#), r#"{"other": 1}"#);
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n[1, 2]\n```"), "[1, 2]");
        assert_eq!(strip_code_fences("```\n# Grocery List\n```\n"), "# Grocery List");
        assert_eq!(strip_code_fences("  [1]  "), "[1]");
        assert_eq!(strip_code_fences("```json\n[1]"), "[1]");
    }

    #[test]
    fn test_parse_purchase_units() {
        let text = r#"```json
[
  {"name": "garlic", "purchaseAmount": 1, "purchaseUnit": "head", "category": "Produce",
   "sources": [{"recipeId": "1", "recipeTitle": "Garlic Chicken", "originalAmount": "3 cloves"}]},
  {"name": "butter", "purchaseAmount": "2", "purchaseUnit": "sticks", "category": "dairy"},
  {"purchaseAmount": 4},
  {"name": "", "purchaseAmount": 1}
]
```"#;
        let items = parse_purchase_units(text).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].purchase_unit, "head");
        assert_eq!(items[0].sources[0].original_amount, "3 cloves");
        assert_eq!(items[1].purchase_amount, 2.0);
    }

    #[test]
    fn test_parse_purchase_units_wrapped() {
        let items = parse_purchase_units(r#"{"ingredients": [{"name": "rice"}]}"#).unwrap();
        assert_eq!(items[0].name, "rice");
        assert_eq!(items[0].purchase_amount, 1.0);

        let items = parse_purchase_units(r#"Here you go: [{"name": "rice"}] Enjoy!"#).unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_parse_purchase_units_rejects_garbage() {
        assert!(parse_purchase_units("Sorry, I can't help with that.").is_err());
        assert!(parse_purchase_units(r#"{"name": "rice"}"#).is_err());
        assert!(parse_purchase_units("42").is_err());
    }

    #[test]
    fn test_parse_markdown_list() {
        let sections =
            parse_markdown_list("```markdown\n# Grocery List\n\n## Produce\n- 2 onions\n```")
                .unwrap();
        assert_eq!(sections[0].lines[0].text, "2 onions");
        assert!(parse_markdown_list("Here is a list").is_err());
    }
}
