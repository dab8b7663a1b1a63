//! The value-combination primitive shared by collision resolution and
//! duplicate-key aggregation.

use cohort_model::CellValue;

/// Delimiter between retained conflicting values. Reserved: a combined cell
/// re-expands on this character, so it cannot appear in source data tokens.
pub const CONFLICT_DELIMITER: char = '|';

/// Expand a cell into its distinct conflict tokens, preserving encounter
/// order. A previously combined `Text` splits back into its constituents so
/// repeated combination stays associative over the set of distinct values.
fn push_tokens(value: &CellValue, out: &mut Vec<String>) {
    match value {
        CellValue::Text(s) => {
            for part in s.split(CONFLICT_DELIMITER) {
                let token = part.trim();
                if !token.is_empty() && !out.iter().any(|t| t == token) {
                    out.push(token.to_string());
                }
            }
        }
        _ => {
            if let Some(token) = value.token()
                && !out.contains(&token)
            {
                out.push(token);
            }
        }
    }
}

/// Reconcile two candidate values for the same (key, column) position.
///
/// - both empty: `Null`
/// - exactly one empty: the other, unchanged
/// - equal after trimming (rendered-token identity, no numeric coercion):
///   the left value, keeping its original variant
/// - differing: the distinct tokens pipe-joined in encounter order, left
///   before right, no token repeated
pub fn combine(a: &CellValue, b: &CellValue) -> CellValue {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => CellValue::Null,
        (false, true) => a.clone(),
        (true, false) => b.clone(),
        (false, false) => {
            let mut tokens = Vec::new();
            push_tokens(a, &mut tokens);
            push_tokens(b, &mut tokens);
            if tokens.len() == 1 && a.token().as_deref() == Some(tokens[0].as_str()) {
                // Single shared token: keep the left value's variant.
                a.clone()
            } else {
                CellValue::Text(tokens.join(&CONFLICT_DELIMITER.to_string()))
            }
        }
    }
}

/// N-way generalization of [`combine`]: fold over values in encounter order.
/// An empty iterator, or one with no non-empty values, yields `Null`.
pub fn combine_all<'a>(values: impl IntoIterator<Item = &'a CellValue>) -> CellValue {
    values
        .into_iter()
        .fold(CellValue::Null, |acc, v| combine(&acc, v))
}
