//! School records data model
//!
//! One tenant's dataset is a single JSON object with five record arrays.
//! Field names are camelCase on the wire (`studentId`, `className`).

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Top-level keys of a School State blob, in storage order
pub const RECORD_KINDS: [&str; 5] = ["students", "fees", "courses", "staff", "results"];

/// An enrolled student. `student_id` is not required to be unique.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Student {
    pub student_id: String,
    pub name: String,
    pub class_name: String,
}

/// A fee payment. Amount and date are kept exactly as typed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeeRecord {
    pub student_id: String,
    pub amount: String,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Course {
    pub code: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StaffMember {
    pub name: String,
    pub role: String,
}

/// A grade for one student in one course
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResultRecord {
    pub student_id: String,
    pub course: String,
    pub grade: String,
}

/// Everything stored for one tenant
///
/// Unknown top-level keys found in storage are carried in `extra` and written
/// back untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SchoolState {
    #[serde(default)]
    pub students: Vec<Student>,
    #[serde(default)]
    pub fees: Vec<FeeRecord>,
    #[serde(default)]
    pub courses: Vec<Course>,
    #[serde(default)]
    pub staff: Vec<StaffMember>,
    #[serde(default)]
    pub results: Vec<ResultRecord>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SchoolState {
    /// Shallow-merge a stored blob over the five-empty-array default.
    ///
    /// Stored keys win one top-level key at a time. A known key whose value
    /// does not parse as that record array keeps the empty default.
    pub fn merge_stored(stored: Map<String, Value>) -> Self {
        let mut merged = Self::default();
        for (key, value) in stored {
            match key.as_str() {
                "students" => take_records(&key, value, &mut merged.students),
                "fees" => take_records(&key, value, &mut merged.fees),
                "courses" => take_records(&key, value, &mut merged.courses),
                "staff" => take_records(&key, value, &mut merged.staff),
                "results" => take_records(&key, value, &mut merged.results),
                _ => {
                    merged.extra.insert(key, value);
                }
            }
        }
        merged
    }

    /// Total records across all five arrays
    pub fn record_count(&self) -> usize {
        self.students.len()
            + self.fees.len()
            + self.courses.len()
            + self.staff.len()
            + self.results.len()
    }

    /// The `results` array as pretty-printed JSON (two-space indent)
    pub fn results_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.results)
    }
}

fn take_records<T: DeserializeOwned>(key: &str, value: Value, slot: &mut Vec<T>) {
    match serde_json::from_value(value) {
        Ok(records) => *slot = records,
        Err(e) => log::warn!("Discarding malformed '{}' records: {}", key, e),
    }
}
