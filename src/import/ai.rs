//! Parsing item lists pasted from an AI assistant.
//!
//! Accepted shapes:
//! - a JSON array of `{name, categoryId, quantity}` objects
//! - a JSON object with such an array under `items`
//! - either of the above inside a markdown code fence
//! - CSV rows `name,categoryId,quantity` (`;` also accepted), optional
//!   header row, double-quoted fields

use serde_json::Value;

use super::ImportError;
use crate::models::{builtin, resolve_legacy_category_id, CategoryId, DefaultItem};

/// Parses AI output into default-list items.
pub fn parse_ai_items(text: &str) -> Result<Vec<DefaultItem>, ImportError> {
    let body = strip_code_fence(text);
    if body.is_empty() {
        return Err(ImportError::Malformed("empty text".to_string()));
    }

    let items = if body.starts_with('[') || body.starts_with('{') {
        parse_json(body)?
    } else {
        parse_csv(body)
    };

    if items.is_empty() {
        return Err(ImportError::Malformed("no items found".to_string()));
    }
    tracing::debug!("Parsed {} items from AI text", items.len());
    Ok(items)
}

fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string (```json) up to the first newline.
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end().trim_end_matches("```").trim()
}

fn parse_json(body: &str) -> Result<Vec<DefaultItem>, ImportError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| ImportError::Malformed(format!("invalid JSON: {}", e)))?;
    let raw = match value {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("items") {
            Some(Value::Array(items)) => items,
            _ => return Err(ImportError::Malformed("JSON object has no items array".to_string())),
        },
        _ => return Err(ImportError::Malformed("expected a JSON array".to_string())),
    };
    Ok(raw.iter().filter_map(json_item).collect())
}

fn json_item(value: &Value) -> Option<DefaultItem> {
    let name = value.get("name")?.as_str()?.trim();
    if name.is_empty() {
        return None;
    }
    let category = value
        .get("categoryId")
        .or_else(|| value.get("category"))
        .map(known_category)
        .unwrap_or_default();
    let quantity = match value.get("quantity") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };
    Some(DefaultItem::new(name, category, quantity))
}

/// Resolves a category, falling back to "Other" for anything unknown.
fn known_category(raw: &Value) -> CategoryId {
    match resolve_legacy_category_id(raw) {
        CategoryId::Builtin(id) if builtin(id).is_some() => CategoryId::Builtin(id),
        custom @ CategoryId::Custom(_) if custom.is_custom() => custom,
        _ => CategoryId::other(),
    }
}

fn parse_csv(body: &str) -> Vec<DefaultItem> {
    let mut lines = body.lines().map(str::trim).filter(|l| !l.is_empty()).peekable();
    let separator = match lines.peek() {
        Some(first) if first.contains(';') && !first.contains(',') => ';',
        _ => ',',
    };

    let mut items = Vec::new();
    for (index, line) in lines.enumerate() {
        let fields = split_csv_line(line, separator);
        let name = fields.first().map(|f| f.trim()).unwrap_or_default();
        if index == 0 && name.eq_ignore_ascii_case("name") {
            continue;
        }
        if name.is_empty() {
            continue;
        }
        let category = fields
            .get(1)
            .map(|c| known_category(&Value::String(c.trim().to_string())))
            .unwrap_or_default();
        let quantity = fields.get(2).map(|q| q.trim()).unwrap_or_default();
        items.push(DefaultItem::new(name, category, quantity));
    }
    items
}

/// Splits one CSV line, honoring double quotes and `""` escapes.
fn split_csv_line(line: &str, separator: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            c if c == separator && !in_quotes => fields.push(std::mem::take(&mut field)),
            c => field.push(c),
        }
    }
    fields.push(field);
    fields
}
