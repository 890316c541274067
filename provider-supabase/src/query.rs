//! Translation of table queries into PostgREST query strings

use bridge_traits::remote::{scalar_text, Filter, FilterOp, Row, SelectQuery};
use serde_json::Value;

use crate::error::{Result, SupabaseError};

/// Query parameters for a select, in request order.
pub fn select_params(query: &SelectQuery) -> Result<Vec<(String, String)>> {
    let columns = if query.columns.is_empty() {
        "*".to_string()
    } else {
        query.columns.join(",")
    };

    let mut params = vec![("select".to_string(), columns)];
    params.extend(filter_params(&query.filters)?);

    if let Some(order) = &query.order {
        let direction = if order.ascending { "asc" } else { "desc" };
        params.push(("order".to_string(), format!("{}.{}", order.column, direction)));
    }

    if let Some(limit) = query.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }

    Ok(params)
}

/// Query parameters for a list of AND-ed filters.
pub fn filter_params(filters: &[Filter]) -> Result<Vec<(String, String)>> {
    filters
        .iter()
        .map(|filter| {
            let expression = match &filter.op {
                FilterOp::Eq(Value::Null) => "is.null".to_string(),
                FilterOp::Eq(value) => {
                    let text = scalar_text(value).ok_or_else(|| {
                        SupabaseError::InvalidQuery(format!(
                            "column '{}' cannot be compared with a non-scalar value",
                            filter.column
                        ))
                    })?;
                    format!("eq.{}", text)
                }
                FilterOp::ContainsIgnoreCase(text) => {
                    format!("ilike.*{}*", escape_like(text))
                }
            };
            Ok((filter.column.clone(), expression))
        })
        .collect()
}

/// Render parameters as a URL query string (without the leading `?`).
pub fn encode(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(value)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Escape LIKE metacharacters so the text matches literally.
///
/// PostgREST rewrites every `*` in a pattern to `%` and offers no escape for
/// it, so a literal `*` is sent as the single-character wildcard `_`. The
/// server then returns a superset that [`retain_literal_matches`] narrows.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' | '%' | '_' => {
                escaped.push('\\');
                escaped.push(ch);
            }
            '*' => escaped.push('_'),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Drop rows the server matched only through a widened `*`.
///
/// Rows that do not carry the filtered column (it was not projected) are
/// kept, since they cannot be checked locally.
pub fn retain_literal_matches(filters: &[Filter], rows: Vec<Row>) -> Vec<Row> {
    let widened: Vec<&Filter> = filters
        .iter()
        .filter(|filter| matches!(&filter.op, FilterOp::ContainsIgnoreCase(text) if text.contains('*')))
        .collect();
    if widened.is_empty() {
        return rows;
    }

    rows.into_iter()
        .filter(|row| {
            widened
                .iter()
                .all(|filter| !row.contains_key(&filter.column) || filter.matches(row))
        })
        .collect()
}
