//! Ingredient parsing module.
//!
//! Parses raw ingredient strings (e.g., "2 cups flour, sifted") into an
//! amount, a unit and the remaining item text.

use serde::{Deserialize, Serialize};

use crate::units::match_leading_unit;

/// Parsed ingredient structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParsedIngredient {
    pub item: String,
    pub amount: Option<f64>,
    /// Canonical unit, if one was recognized.
    pub unit: Option<String>,
    pub note: Option<String>,
    pub raw: String,
}

/// Unicode vulgar fractions and their values.
const UNICODE_FRACTIONS: &[(char, f64)] = &[
    ('½', 1.0 / 2.0),
    ('⅓', 1.0 / 3.0),
    ('⅔', 2.0 / 3.0),
    ('¼', 1.0 / 4.0),
    ('¾', 3.0 / 4.0),
    ('⅕', 1.0 / 5.0),
    ('⅖', 2.0 / 5.0),
    ('⅗', 3.0 / 5.0),
    ('⅘', 4.0 / 5.0),
    ('⅙', 1.0 / 6.0),
    ('⅚', 5.0 / 6.0),
    ('⅐', 1.0 / 7.0),
    ('⅛', 1.0 / 8.0),
    ('⅜', 3.0 / 8.0),
    ('⅝', 5.0 / 8.0),
    ('⅞', 7.0 / 8.0),
    ('⅑', 1.0 / 9.0),
    ('⅒', 1.0 / 10.0),
];

/// Common preparation notes
const PREP_NOTES: &[&str] = &[
    "at room temperature",
    "room temperature",
    "loosely packed",
    "firmly packed",
    "lightly beaten",
    "roughly chopped",
    "coarsely chopped",
    "finely chopped",
    "thinly sliced",
    "plus more",
    "for garnish",
    "for serving",
    "for the",
    "julienned",
    "quartered",
    "shredded",
    "crumbled",
    "softened",
    "divided",
    "optional",
    "to taste",
    "as needed",
    "chopped",
    "crushed",
    "drained",
    "toasted",
    "trimmed",
    "minced",
    "sliced",
    "grated",
    "melted",
    "beaten",
    "thawed",
    "peeled",
    "rinsed",
    "packed",
    "sifted",
    "halved",
    "diced",
    "cubed",
];

/// Parse a single ingredient line into structured data.
///
/// This does best-effort parsing - if no leading quantity is found, the whole
/// trimmed line becomes the item and `amount` is `None`.
pub fn parse_ingredient(raw: &str) -> ParsedIngredient {
    let trimmed = raw.trim();
    let unparsed = || ParsedIngredient {
        item: trimmed.to_string(),
        amount: None,
        unit: None,
        note: None,
        raw: raw.to_string(),
    };

    let Some((amount, after_amount)) = extract_amount(trimmed) else {
        return unparsed();
    };

    // "1 (14 oz) can tomatoes": the aside sits between the amount and the unit.
    // Without a unit the aside stays in the item text.
    let (unit, after_unit) = match match_leading_unit(skip_leading_parenthetical(after_amount)) {
        Some((unit, rest)) => (Some(unit.to_string()), rest),
        None => (None, after_amount),
    };

    let (item, note) = split_note(after_unit);
    if item.is_empty() {
        return ParsedIngredient {
            amount: Some(amount),
            unit,
            ..unparsed()
        };
    }

    ParsedIngredient {
        item,
        amount: Some(amount),
        unit,
        note,
        raw: raw.to_string(),
    }
}

/// Parse multiple ingredient lines (separated by newlines).
pub fn parse_ingredients(blob: &str) -> Vec<ParsedIngredient> {
    blob.lines()
        .filter(|line| !line.trim().is_empty())
        .map(parse_ingredient)
        .collect()
}

/// Parse a standalone quantity such as "3", "1 1/2", "½" or "2-3".
///
/// Trailing text is ignored, so "3 cloves" parses as 3.
pub fn parse_amount(s: &str) -> Option<f64> {
    extract_amount(s.trim()).map(|(amount, _)| amount)
}

/// Extract an amount from the beginning of a string.
/// Returns (amount, remaining_string).
pub(crate) fn extract_amount(s: &str) -> Option<(f64, &str)> {
    let s = s.trim_start();

    if let Some(rest) = strip_article(s) {
        return Some((1.0, rest));
    }

    let (mut amount, mut rest) = leading_number(s)?;

    // Mixed number: "1 1/2", "1 ½". Only a whole number may be followed by a fraction.
    if amount.fract() == 0.0 {
        let candidate = rest.trim_start();
        if candidate.len() < rest.len() {
            if let Some((fraction, after)) = leading_fraction(candidate) {
                amount += fraction;
                rest = after;
            }
        }
    }

    // Range: "2-3", "2 - 3", "2 to 3". Buy for the upper bound.
    if let Some((upper, after)) = range_upper_bound(rest) {
        if upper >= amount {
            amount = upper;
            rest = after;
        }
    }

    if !amount.is_finite() || amount < 0.0 {
        return None;
    }

    Some((amount, rest.trim_start()))
}

/// "a pinch of salt", "an onion"
fn strip_article(s: &str) -> Option<&str> {
    let mut words = s.splitn(2, char::is_whitespace);
    let first = words.next()?;
    let rest = words.next()?.trim_start();
    if (first.eq_ignore_ascii_case("a") || first.eq_ignore_ascii_case("an")) && !rest.is_empty() {
        Some(rest)
    } else {
        None
    }
}

/// A number at the very start of `s`: integer, decimal, "1/2", "½" or "1½".
fn leading_number(s: &str) -> Option<(f64, &str)> {
    if let Some(result) = leading_fraction(s) {
        return Some(result);
    }

    let digits_end = s
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_digit() || *c == '.'))
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    let digits = &s[..digits_end];
    if digits.is_empty() || !digits.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    let digits = digits.trim_end_matches('.');
    let value: f64 = digits.parse().ok()?;
    let rest = &s[digits.len()..];
    if rest.starts_with(['/', '⁄']) {
        // A fraction that failed to parse, e.g. "1/0".
        return None;
    }

    // "1½"
    if value.fract() == 0.0 && !digits.contains('.') {
        if let Some((fraction, after)) = leading_unicode_fraction(rest) {
            return Some((value + fraction, after));
        }
    }

    Some((value, rest))
}

/// "1/2" or a unicode vulgar fraction at the start of `s`.
fn leading_fraction(s: &str) -> Option<(f64, &str)> {
    if let Some(result) = leading_unicode_fraction(s) {
        return Some(result);
    }

    let end = s
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_digit() || *c == '/' || *c == '⁄'))
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    let token = &s[..end];
    let (numerator, denominator) = token.split_once(['/', '⁄'])?;
    if numerator.is_empty()
        || denominator.is_empty()
        || !numerator.chars().all(|c| c.is_ascii_digit())
        || !denominator.chars().all(|c| c.is_ascii_digit())
    {
        return None;
    }
    let numerator: f64 = numerator.parse().ok()?;
    let denominator: f64 = denominator.parse().ok()?;
    if denominator == 0.0 {
        return None;
    }
    Some((numerator / denominator, &s[end..]))
}

fn leading_unicode_fraction(s: &str) -> Option<(f64, &str)> {
    let c = s.chars().next()?;
    UNICODE_FRACTIONS
        .iter()
        .find(|(f, _)| *f == c)
        .map(|(_, value)| (*value, &s[c.len_utf8()..]))
}

fn range_upper_bound(s: &str) -> Option<(f64, &str)> {
    let t = s.trim_start();
    let after_sep = if let Some(rest) = t.strip_prefix(['-', '–', '—']) {
        rest
    } else if let Some(rest) = t.strip_prefix("to ") {
        rest
    } else {
        return None;
    };
    let (upper, after) = leading_number(after_sep.trim_start())?;
    let (upper, after) = match after.strip_prefix(char::is_whitespace) {
        Some(candidate) if upper.fract() == 0.0 => match leading_fraction(candidate.trim_start())
        {
            Some((fraction, rest)) => (upper + fraction, rest),
            None => (upper, after),
        },
        _ => (upper, after),
    };
    Some((upper, after))
}

pub(crate) fn skip_leading_parenthetical(s: &str) -> &str {
    let t = s.trim_start();
    if let Some(inner) = t.strip_prefix('(') {
        if let Some(close) = inner.find(')') {
            return inner[close + 1..].trim_start();
        }
    }
    s
}

/// Split trailing comma-separated preparation notes off the item.
fn split_note(s: &str) -> (String, Option<String>) {
    let mut item = s.trim();
    let mut notes: Vec<&str> = Vec::new();

    while let Some(comma_idx) = item.rfind(',') {
        let potential_note = item[comma_idx + 1..].trim();
        if potential_note.is_empty() || is_prep_note(potential_note) {
            if !potential_note.is_empty() {
                notes.push(potential_note);
            }
            item = item[..comma_idx].trim_end();
        } else {
            break;
        }
    }

    let note = if notes.is_empty() {
        None
    } else {
        notes.reverse();
        Some(notes.join(", "))
    };
    (item.to_string(), note)
}

/// Check if a string looks like a preparation note.
fn is_prep_note(s: &str) -> bool {
    let s_lower = s.to_lowercase();
    PREP_NOTES.iter().any(|note| s_lower.contains(note))
}
