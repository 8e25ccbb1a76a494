//! Combining free-text quantities.

use std::sync::OnceLock;

use regex::Regex;

use crate::models::{DefaultItem, DefaultList};

static QUANTITY_RE: OnceLock<Regex> = OnceLock::new();

fn quantity_re() -> &'static Regex {
    QUANTITY_RE.get_or_init(|| Regex::new(r"^([\d.,]+)\s*([a-zA-Z]*)$").expect("quantity pattern"))
}

/// A quantity of the form `<number><optional unit>`.
#[derive(Debug, Clone, PartialEq)]
struct Parsed<'a> {
    value: f64,
    unit: &'a str,
}

fn parse(quantity: &str) -> Option<Parsed<'_>> {
    let caps = quantity_re().captures(quantity.trim())?;
    let number = caps.get(1)?.as_str().replacen(',', ".", 1);
    let value = number.parse::<f64>().ok()?;
    Some(Parsed {
        value,
        unit: caps.get(2).map_or("", |m| m.as_str()),
    })
}

/// Combines two quantities.
///
/// An empty operand yields the other one. Two numbers with the same unit
/// (case-insensitive, no unit counts as a unit) are summed and rounded to
/// three decimals, keeping the first operand's unit spelling. Anything else
/// is kept side by side as `"a + b"`.
pub fn merge_quantity(a: &str, b: &str) -> String {
    let (a, b) = (a.trim(), b.trim());
    if a.is_empty() {
        return b.to_string();
    }
    if b.is_empty() {
        return a.to_string();
    }

    match (parse(a), parse(b)) {
        (Some(qa), Some(qb)) if qa.unit.eq_ignore_ascii_case(qb.unit) => {
            let sum = ((qa.value + qb.value) * 1000.0).round() / 1000.0;
            if qa.unit.is_empty() {
                format!("{}", sum)
            } else {
                format!("{} {}", sum, qa.unit)
            }
        }
        _ => format!("{} + {}", a, b),
    }
}

/// Combines the items of several default lists into one item set.
///
/// Items with the same name (case-insensitive) are collapsed, their
/// quantities combined with [`merge_quantity`]. First occurrence wins for
/// name spelling and category.
pub fn combine_items<'a>(lists: impl IntoIterator<Item = &'a DefaultList>) -> Vec<DefaultItem> {
    let mut merged: Vec<DefaultItem> = Vec::new();
    for list in lists {
        for item in &list.items {
            let name_lower = item.name.to_lowercase();
            match merged
                .iter_mut()
                .find(|m| m.name.to_lowercase() == name_lower)
            {
                Some(existing) => {
                    existing.quantity = merge_quantity(&existing.quantity, &item.quantity);
                }
                None => merged.push(item.clone()),
            }
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CategoryId;

    fn list(items: &[(&str, &str)]) -> DefaultList {
        let mut dl = DefaultList::new("test");
        dl.items = items
            .iter()
            .map(|(n, q)| DefaultItem::new(*n, CategoryId::Builtin(1), *q))
            .collect();
        dl
    }

    #[test]
    fn test_combine_items_merges_quantities() {
        let a = list(&[("Oats", "30 g"), ("Milk", "1 L")]);
        let b = list(&[("oats", "30 g"), ("Apples", "")]);
        let combined = combine_items([&a, &b]);

        assert_eq!(combined.len(), 3);
        assert_eq!(combined[0].name, "Oats");
        assert_eq!(combined[0].quantity, "60 g");
        assert_eq!(combined[1].quantity, "1 L");
        assert_eq!(combined[2].name, "Apples");
    }

    #[test]
    fn test_same_unit_sums() {
        assert_eq!(merge_quantity("200 g", "100 g"), "300 g");
        assert_eq!(merge_quantity("100 g", "200 g"), "300 g");
        assert_eq!(merge_quantity("1 L", "1 l"), "2 L");
    }

    #[test]
    fn test_unitless_sums() {
        assert_eq!(merge_quantity("3", "2"), "5");
    }

    #[test]
    fn test_decimal_comma() {
        assert_eq!(merge_quantity("1,5 kg", "0.25 kg"), "1.75 kg");
    }

    #[test]
    fn test_rounds_to_three_decimals() {
        assert_eq!(merge_quantity("0.1", "0.2"), "0.3");
        assert_eq!(merge_quantity("0.0004 kg", "0.0004 kg"), "0.001 kg");
    }

    #[test]
    fn test_unit_mismatch_concatenates() {
        assert_eq!(merge_quantity("2 pz", "1 kg"), "2 pz + 1 kg");
        assert_eq!(merge_quantity("1 L", "500 ml"), "1 L + 500 ml");
        assert_eq!(merge_quantity("2", "1 kg"), "2 + 1 kg");
    }

    #[test]
    fn test_unparseable_concatenates() {
        assert_eq!(merge_quantity("a handful", "2"), "a handful + 2");
        assert_eq!(merge_quantity("1.2.3", "1"), "1.2.3 + 1");
    }

    #[test]
    fn test_empty_is_identity() {
        assert_eq!(merge_quantity("", "500 g"), "500 g");
        assert_eq!(merge_quantity("500 g", ""), "500 g");
        assert_eq!(merge_quantity("  ", ""), "");
    }
}
