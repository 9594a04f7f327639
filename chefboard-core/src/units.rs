//! Unit synonym table and display helpers.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Canonical unit followed by every spelling that maps to it (lowercase).
const UNIT_SYNONYMS: &[(&str, &[&str])] = &[
    // Volume - US
    ("fluid ounce", &["fluid ounces", "fluid ounce", "fl oz", "fl. oz", "floz"]),
    ("tablespoon", &["tablespoons", "tablespoon", "tbsp", "tbsps", "tbs", "tb", "T"]),
    ("teaspoon", &["teaspoons", "teaspoon", "tsp", "tsps", "ts", "t"]),
    ("gallon", &["gallons", "gallon", "gal"]),
    ("quart", &["quarts", "quart", "qt", "qts"]),
    ("pint", &["pints", "pint", "pt", "pts"]),
    ("cup", &["cups", "cup", "c"]),
    // Volume - metric
    ("milliliter", &["milliliters", "milliliter", "millilitres", "millilitre", "ml"]),
    ("liter", &["liters", "liter", "litres", "litre", "l"]),
    // Weight
    ("ounce", &["ounces", "ounce", "oz"]),
    ("pound", &["pounds", "pound", "lbs", "lb"]),
    ("kilogram", &["kilograms", "kilogram", "kilos", "kilo", "kg"]),
    ("milligram", &["milligrams", "milligram", "mg"]),
    ("gram", &["grams", "gram", "g"]),
    // Count / packaging
    ("package", &["packages", "package", "pkgs", "pkg"]),
    ("handful", &["handfuls", "handful"]),
    ("bottle", &["bottles", "bottle"]),
    ("bunch", &["bunches", "bunch"]),
    ("pinch", &["pinches", "pinch"]),
    ("slice", &["slices", "slice"]),
    ("sprig", &["sprigs", "sprig"]),
    ("stalk", &["stalks", "stalk"]),
    ("piece", &["pieces", "piece", "pcs", "pc"]),
    ("clove", &["cloves", "clove"]),
    ("dash", &["dashes", "dash"]),
    ("drop", &["drops", "drop"]),
    ("head", &["heads", "head"]),
    ("stick", &["sticks", "stick"]),
    ("cube", &["cubes", "cube"]),
    ("box", &["boxes", "box"]),
    ("can", &["cans", "can"]),
    ("jar", &["jars", "jar"]),
    ("bag", &["bags", "bag"]),
];

/// Case-sensitive spellings. "T" is tablespoon and "t" is teaspoon in older
/// cookbooks; everything else matches case-insensitively.
const CASE_SENSITIVE: &[&str] = &["T", "t"];

static SYNONYM_MAP: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    UNIT_SYNONYMS
        .iter()
        .flat_map(|(canonical, spellings)| spellings.iter().map(move |s| (*s, *canonical)))
        .collect()
});

/// Every spelling, longest first, so "tablespoons" is tried before "tb".
static SPELLINGS_SORTED: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    let mut spellings: Vec<&'static str> = SYNONYM_MAP.keys().copied().collect();
    spellings.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    spellings
});

/// Map a unit spelling to its canonical form.
///
/// Returns `None` when the token is not in the table.
pub fn canonical_unit(token: &str) -> Option<&'static str> {
    let token = token.trim().trim_end_matches('.');
    if token.is_empty() {
        return None;
    }
    if CASE_SENSITIVE.contains(&token) {
        return SYNONYM_MAP.get(token).copied();
    }
    let lower = token.to_lowercase();
    if CASE_SENSITIVE.contains(&lower.as_str()) {
        return None;
    }
    SYNONYM_MAP.get(lower.as_str()).copied()
}

/// Normalize a unit for use in grouping keys.
///
/// Known spellings collapse to their canonical form; anything else is kept as
/// the lowercased token so it is never silently dropped.
pub fn normalize_unit(unit: &str) -> String {
    match canonical_unit(unit) {
        Some(canonical) => canonical.to_string(),
        None => unit.trim().to_lowercase(),
    }
}

/// Match a unit at the start of `s`. Returns the canonical unit and the rest.
pub fn match_leading_unit(s: &str) -> Option<(&'static str, &str)> {
    let s = s.trim_start();
    for &spelling in SPELLINGS_SORTED.iter() {
        let Some(prefix) = s.get(..spelling.len()) else {
            continue;
        };
        let matches = if CASE_SENSITIVE.contains(&spelling) {
            prefix == spelling
        } else {
            !CASE_SENSITIVE.contains(&prefix) && prefix.eq_ignore_ascii_case(spelling)
        };
        if !matches {
            continue;
        }

        let after = &s[spelling.len()..];
        // Word boundary, so "c" does not match "carrots".
        if after.is_empty()
            || after.starts_with(|c: char| c.is_whitespace() || c == '.' || c == ',' || c == ')')
        {
            let canonical = SYNONYM_MAP.get(spelling).copied()?;
            let rest = after.strip_prefix('.').unwrap_or(after).trim_start();
            return Some((canonical, rest));
        }
    }
    None
}

/// Format an amount for display: integers exactly, anything else rounded to at
/// most two decimals with trailing zeros removed.
pub fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 && amount.abs() < 1e15 {
        return format!("{}", amount as i64);
    }
    let rounded = format!("{:.2}", amount);
    rounded.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Unit spelled for the given amount ("1 cup", "2 cups", "3 pinches").
pub fn display_unit(unit: &str, amount: f64) -> String {
    if unit.is_empty() || amount == 1.0 || canonical_unit(unit).is_none() {
        return unit.to_string();
    }
    if unit.ends_with("ch") || unit.ends_with("sh") || unit.ends_with('x') {
        format!("{}es", unit)
    } else {
        // "fluid ounce" -> "fluid ounces"
        format!("{}s", unit)
    }
}

/// "2 cups", "1 clove", "3" (no unit).
pub fn format_quantity(amount: f64, unit: &str) -> String {
    let unit = display_unit(unit, amount);
    if unit.is_empty() {
        format_amount(amount)
    } else {
        format!("{} {}", format_amount(amount), unit)
    }
}
