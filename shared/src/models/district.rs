//! Cached district documents and the refresh cursor

use serde::{Deserialize, Deserializer, Serialize};

use crate::models::location::{DailyRow, GroupedRecord};
use crate::types::Coordinate;

/// Document id holding the refresh cursor
pub const CURSOR_DOCUMENT_ID: &str = "districtNumber5";

/// Cached 7-day data for one district
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistrictDocument {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub data0: DailyRow,
    pub data1: DailyRow,
    pub data2: DailyRow,
    pub data3: DailyRow,
    pub data4: DailyRow,
    pub data5: DailyRow,
    pub data6: DailyRow,
    /// Day the data was fetched, `YYYY-MM-DD`
    pub date: String,
}

impl DistrictDocument {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        centroid: Coordinate,
        record: GroupedRecord,
        date: impl Into<String>,
    ) -> Self {
        let [data0, data1, data2, data3, data4, data5, data6] = record.into_rows();
        Self {
            id: id.into(),
            name: name.into(),
            latitude: centroid.latitude,
            longitude: centroid.longitude,
            data0,
            data1,
            data2,
            data3,
            data4,
            data5,
            data6,
            date: date.into(),
        }
    }

    /// Whether the document was already refreshed on `today`
    pub fn is_current(&self, today: &str) -> bool {
        self.date == today
    }

    pub fn into_rows(self) -> Vec<DailyRow> {
        vec![
            self.data0, self.data1, self.data2, self.data3, self.data4, self.data5, self.data6,
        ]
    }
}

/// Persisted position of the district refresh job (1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorDocument {
    #[serde(rename = "districtNumber5")]
    pub district_number: u32,
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}
