//! Identifying-key configuration.

/// Names of the identifying columns for a study's tables.
///
/// The primary key identifies a patient and must be present in every table
/// the engine accepts. The secondary key identifies a visit and is optional
/// per table: a table either carries it (visit-level granularity) or lacks it
/// (patient-level granularity).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct KeySpec {
    /// Patient identifier column (e.g. `PATNO`).
    pub primary: String,
    /// Visit identifier column (e.g. `EVENT_ID`).
    pub secondary: String,
}

impl Default for KeySpec {
    fn default() -> Self {
        Self::new("PATNO", "EVENT_ID")
    }
}

impl KeySpec {
    pub fn new(primary: impl Into<String>, secondary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            secondary: secondary.into(),
        }
    }

    /// Whether `name` is one of the identifying columns.
    pub fn is_key(&self, name: &str) -> bool {
        name == self.primary || name == self.secondary
    }
}
