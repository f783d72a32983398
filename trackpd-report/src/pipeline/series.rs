//! Series Builder
//!
//! Projects raw tremor and activity documents into parallel plotting
//! sequences. Fetch order is preserved; nothing is sorted, filtered,
//! deduplicated or converted. `None` marks an absent field.

use serde::Serialize;
use serde_json::Value;
use trackpd_common::models::{activity_fields, tremor_fields};
use trackpd_common::Document;

/// Tremor intensity against capture time
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TremorSeries {
    pub times: Vec<Option<String>>,
    pub intensities: Vec<Option<f64>>,
}

impl TremorSeries {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

/// Activity category against event timestamp
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ActivitySeries {
    pub timestamps: Vec<Option<String>>,
    pub types: Vec<Option<String>>,
}

impl ActivitySeries {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

/// Build the (time, intensity) series from tremor samples
pub fn build_tremor_series(samples: &[Document]) -> TremorSeries {
    let mut series = TremorSeries {
        times: Vec::with_capacity(samples.len()),
        intensities: Vec::with_capacity(samples.len()),
    };

    for sample in samples {
        series.times.push(label_field(sample, tremor_fields::TIME));
        series
            .intensities
            .push(sample.get(tremor_fields::INTENSITY).and_then(Value::as_f64));
    }

    series
}

/// Build the (timestamp, activity type) series from activity events
pub fn build_activity_series(events: &[Document]) -> ActivitySeries {
    let mut series = ActivitySeries {
        timestamps: Vec::with_capacity(events.len()),
        types: Vec::with_capacity(events.len()),
    };

    for event in events {
        series
            .timestamps
            .push(label_field(event, activity_fields::TIMESTAMP));
        series
            .types
            .push(label_field(event, activity_fields::ACTIVITY_TYPE));
    }

    series
}

/// Read a field used as an axis label. Scalars are stringified; null,
/// missing, arrays and objects are absent.
fn label_field(doc: &Document, field: &str) -> Option<String> {
    match doc.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
