//! Loosely typed cell values.

/// A single table cell.
///
/// Source extracts mix numeric-looking strings, real numbers, and missing
/// values. Equality for consolidation purposes is defined per variant with no
/// cross-variant coercion; identifier columns are always [`CellValue::Text`]
/// so values like `"007"` keep their formatting.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum CellValue {
    Null,
    Text(String),
    Number(f64),
}

impl CellValue {
    /// Build a text cell from a raw string, mapping blank input to `Null`.
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            CellValue::Null
        } else {
            CellValue::Text(trimmed.to_string())
        }
    }

    /// Absent, or text that trims to nothing.
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(_) => false,
        }
    }

    /// Canonical string form, used for CSV output and for conflict-token
    /// identity. `Null` renders as the empty string.
    pub fn render(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => n.to_string(),
        }
    }

    /// Trimmed rendered form, or `None` when empty.
    pub fn token(&self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(self.render().trim().to_string())
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view: `Number` directly, or `Text` that parses as a float.
    ///
    /// Used by cleaning transforms that operate on measurements; never used
    /// for equality during consolidation.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => s.trim().parse().ok(),
            CellValue::Null => None,
        }
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}
