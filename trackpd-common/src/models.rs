//! Record models and store field names
//!
//! Records travel as loosely-typed JSON documents: upstream writers are not
//! validated, so consumers read fields by name and substitute defaults.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One stored document body
pub type Document = Map<String, Value>;

/// Profile document field names, in report column order
pub mod profile_fields {
    pub const NAME: &str = "name";
    pub const AGE: &str = "age";
    pub const GENDER: &str = "gender";
    pub const HEIGHT: &str = "height";
    pub const WEIGHT: &str = "weight";
    pub const BRADYKINESIA: &str = "Bradykinesia";
    pub const DYSKINESIA: &str = "Dyskinesia";
    pub const PD_DURATION: &str = "PD duration";
    pub const TREMOR: &str = "Tremor";

    pub const ALL: [&str; 9] = [
        NAME,
        AGE,
        GENDER,
        HEIGHT,
        WEIGHT,
        BRADYKINESIA,
        DYSKINESIA,
        PD_DURATION,
        TREMOR,
    ];
}

/// Activity event field names
pub mod activity_fields {
    pub const ACTIVITY_TYPE: &str = "activityType";
    pub const TIMESTAMP: &str = "timestamp";
}

/// Tremor sample field names
pub mod tremor_fields {
    pub const TIME: &str = "time";
    pub const INTENSITY: &str = "intensity";
    pub const SITUATION: &str = "situation";
}

/// Key of a single document: collection path plus document id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentKey {
    pub collection: String,
    pub id: String,
}

impl DocumentKey {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }
}

impl std::fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// Tremor intensity levels reported by the watch client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TremorLevel {
    None,
    Low,
    Medium,
    High,
    ExtraHigh,
}

impl TremorLevel {
    /// Map an integer intensity (0..=4) to its level
    pub fn from_intensity(intensity: i64) -> Option<Self> {
        match intensity {
            0 => Some(TremorLevel::None),
            1 => Some(TremorLevel::Low),
            2 => Some(TremorLevel::Medium),
            3 => Some(TremorLevel::High),
            4 => Some(TremorLevel::ExtraHigh),
            _ => None,
        }
    }

    /// Situation label the watch client attaches to this level
    pub fn situation_label(&self) -> &'static str {
        match self {
            TremorLevel::None => "No tremor",
            TremorLevel::Low => "Low intensity tremor",
            TremorLevel::Medium => "Medium intensity tremor",
            TremorLevel::High => "High intensity tremor",
            TremorLevel::ExtraHigh => "Extra high intensity tremor",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tremor_level_from_intensity() {
        assert_eq!(TremorLevel::from_intensity(0), Some(TremorLevel::None));
        assert_eq!(TremorLevel::from_intensity(4), Some(TremorLevel::ExtraHigh));
        assert_eq!(TremorLevel::from_intensity(5), None);
        assert_eq!(TremorLevel::from_intensity(-1), None);
    }

    #[test]
    fn test_situation_labels() {
        assert_eq!(TremorLevel::Medium.situation_label(), "Medium intensity tremor");
        assert_eq!(TremorLevel::None.situation_label(), "No tremor");
    }

    #[test]
    fn test_profile_columns_fixed_order() {
        assert_eq!(profile_fields::ALL.len(), 9);
        assert_eq!(profile_fields::ALL[0], "name");
        assert_eq!(profile_fields::ALL[7], "PD duration");
        assert_eq!(profile_fields::ALL[8], "Tremor");
    }

    #[test]
    fn test_document_key_display() {
        let key = DocumentKey::new("users", "abc");
        assert_eq!(key.to_string(), "users/abc");
    }
}
