//! Typed rows for the metric families, read tolerantly.
//!
//! Upstream collectors store numbers inconsistently (INTEGER, REAL, or numeric
//! TEXT such as `"812.50"`). Numeric columns are parsed with [`numeric`]; a
//! value that cannot be parsed becomes `None` rather than an error. Serialized
//! field names match the upstream column names the dashboard frontend reads.

use rusqlite::types::ValueRef;
use rusqlite::Row;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// Parse a loosely typed column into a number.
pub fn numeric(value: ValueRef<'_>) -> Option<f64> {
    match value {
        ValueRef::Integer(i) => Some(i as f64),
        ValueRef::Real(f) if f.is_finite() => Some(f),
        ValueRef::Text(bytes) => std::str::from_utf8(bytes)
            .ok()
            .and_then(|s| s.trim().parse::<f64>().ok())
            .filter(|f| f.is_finite()),
        _ => None,
    }
}

/// Read a column as text, rendering numbers in their natural form.
pub fn text(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Text(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Null | ValueRef::Blob(_) => None,
    }
}

/// Region flag: numeric `1` or text `"1"` is true, anything else false.
pub fn region_flag(value: ValueRef<'_>) -> bool {
    match value {
        ValueRef::Integer(i) => i == 1,
        ValueRef::Real(f) => f == 1.0,
        ValueRef::Text(bytes) => bytes == b"1",
        _ => false,
    }
}

/// Convert a column to JSON for pass-through panels.
pub fn json_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(_) => Value::Null,
    }
}

fn flag_as_int<S: Serializer>(flag: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u8(u8::from(*flag))
}

fn flag_from_any<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64() == Some(1.0),
        Value::String(s) => s == "1",
        _ => false,
    })
}

/// One AWS account's cost for one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwsCostRow {
    pub account_name: Option<String>,
    pub account_id: Option<String>,
    pub current_cost: Option<f64>,
    pub baseline_cost: Option<f64>,
}

impl AwsCostRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            account_name: text(row.get_ref(0)?),
            account_id: text(row.get_ref(1)?),
            current_cost: numeric(row.get_ref(2)?),
            baseline_cost: numeric(row.get_ref(3)?),
        })
    }
}

/// Cloudflare R2 storage usage for one month.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct R2UsageRow {
    #[serde(rename = "OBJECT_COUNT")]
    pub object_count: Option<f64>,
    #[serde(rename = "PAYLOAD_SIZE_TB")]
    pub payload_size_tb: Option<f64>,
    #[serde(rename = "Class_A_Requests_MM_PutObject")]
    pub class_a_requests_mm: Option<f64>,
    #[serde(rename = "Class_B_Requests_MM_GetObject")]
    pub class_b_requests_mm: Option<f64>,
    #[serde(rename = "LAST_REFRESH_TIME")]
    pub last_refresh_time: Option<String>,
}

impl R2UsageRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            object_count: numeric(row.get_ref(0)?),
            payload_size_tb: numeric(row.get_ref(1)?),
            class_a_requests_mm: numeric(row.get_ref(2)?),
            class_b_requests_mm: numeric(row.get_ref(3)?),
            last_refresh_time: text(row.get_ref(4)?),
        })
    }
}

/// One Cloudflare zone's traffic for one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneUsageRow {
    #[serde(rename = "Account_Name")]
    pub account_name: Option<String>,
    #[serde(rename = "Zone_Name")]
    pub zone_name: Option<String>,
    #[serde(rename = "Requests_M")]
    pub requests_m: Option<f64>,
    #[serde(rename = "Bandwidth_TB")]
    pub bandwidth_tb: Option<f64>,
    #[serde(
        rename = "Is_China",
        serialize_with = "flag_as_int",
        deserialize_with = "flag_from_any"
    )]
    pub is_china: bool,
    #[serde(rename = "refresh_time_ist", default)]
    pub refresh_time_ist: Option<String>,
}

impl ZoneUsageRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            account_name: text(row.get_ref(0)?),
            zone_name: text(row.get_ref(1)?),
            requests_m: numeric(row.get_ref(2)?),
            bandwidth_tb: numeric(row.get_ref(3)?),
            is_china: region_flag(row.get_ref(4)?),
            refresh_time_ist: text(row.get_ref(5)?),
        })
    }
}

/// One S3 bucket's size for one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct S3BucketRow {
    #[serde(rename = "Account_Name")]
    pub account_name: Option<String>,
    #[serde(rename = "Bucket_Name")]
    pub bucket_name: Option<String>,
    #[serde(rename = "Size_MB")]
    pub size_mb: Option<f64>,
    #[serde(rename = "Retention")]
    pub retention: Option<String>,
}

impl S3BucketRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            account_name: text(row.get_ref(0)?),
            bucket_name: text(row.get_ref(1)?),
            size_mb: numeric(row.get_ref(2)?),
            retention: text(row.get_ref(3)?),
        })
    }
}

/// Configured R2 limits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct R2ThresholdRow {
    #[serde(rename = "PAYLOAD_SIZE_TB")]
    pub payload_size_tb: Option<f64>,
    #[serde(rename = "Class_A_Requests_PutObject")]
    pub class_a_requests: Option<f64>,
    #[serde(rename = "Class_B_Requests_GetObject")]
    pub class_b_requests: Option<f64>,
}

impl R2ThresholdRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            payload_size_tb: numeric(row.get_ref(0)?),
            class_a_requests: numeric(row.get_ref(1)?),
            class_b_requests: numeric(row.get_ref(2)?),
        })
    }
}

/// Configured zone limits for one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneThresholdRow {
    #[serde(rename = "Requests_M")]
    pub requests_m: Option<f64>,
    #[serde(rename = "Bandwidth_TB")]
    pub bandwidth_tb: Option<f64>,
    #[serde(
        rename = "Is_China",
        serialize_with = "flag_as_int",
        deserialize_with = "flag_from_any"
    )]
    pub is_china: bool,
}

impl ZoneThresholdRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            requests_m: numeric(row.get_ref(0)?),
            bandwidth_tb: numeric(row.get_ref(1)?),
            is_china: region_flag(row.get_ref(2)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_accepts_loose_forms() {
        assert_eq!(numeric(ValueRef::Integer(7)), Some(7.0));
        assert_eq!(numeric(ValueRef::Real(1.25)), Some(1.25));
        assert_eq!(numeric(ValueRef::Text(b" 812.50 ")), Some(812.5));
        assert_eq!(numeric(ValueRef::Text(b"n/a")), None);
        assert_eq!(numeric(ValueRef::Text(b"NaN")), None);
        assert_eq!(numeric(ValueRef::Null), None);
    }

    #[test]
    fn region_flag_accepts_numeric_and_text_one() {
        assert!(region_flag(ValueRef::Integer(1)));
        assert!(region_flag(ValueRef::Text(b"1")));
        assert!(!region_flag(ValueRef::Integer(0)));
        assert!(!region_flag(ValueRef::Text(b"0")));
        assert!(!region_flag(ValueRef::Text(b"yes")));
        assert!(!region_flag(ValueRef::Null));
    }

    #[test]
    fn zone_row_serializes_flag_as_integer() {
        let row = ZoneUsageRow {
            account_name: Some("cf".into()),
            zone_name: Some("example.cn".into()),
            requests_m: Some(1.0),
            bandwidth_tb: None,
            is_china: true,
            refresh_time_ist: None,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["Is_China"], Value::from(1));
        assert_eq!(json["Bandwidth_TB"], Value::Null);

        let back: ZoneUsageRow = serde_json::from_value(json).unwrap();
        assert_eq!(back, row);
    }

    #[test]
    fn zone_row_deserializes_text_flag() {
        let row: ZoneUsageRow = serde_json::from_str(
            r#"{"Account_Name":null,"Zone_Name":"z","Requests_M":2,"Bandwidth_TB":3,"Is_China":"1"}"#,
        )
        .unwrap();
        assert!(row.is_china);
    }
}
