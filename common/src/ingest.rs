//! レコード読み込み（寛容モード）
//!
//! 1件の不正レコードで全体を失敗させない:
//! - 日付・数値は読めなければ None / 0
//! - オブジェクトとして読めないレコードはスキップして理由を残す

use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// スキップしたレコード
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Skipped {
    pub index: usize,
    pub reason: String,
}

/// 読み込み結果
#[derive(Debug, Clone)]
pub struct Decoded<T> {
    pub records: Vec<T>,
    pub skipped: Vec<Skipped>,
}

impl<T> Default for Decoded<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

/// JSON文字列からレコード列を読み込む
///
/// 配列そのもの、または `{"data": [...]}` / `{"items": [...]}` 形式を受け付ける。
pub fn decode_records<T: DeserializeOwned>(json: &str) -> Result<Decoded<T>> {
    let value: Value = serde_json::from_str(json)?;
    decode_values(value)
}

/// 解析済みJSONからレコード列を読み込む
pub fn decode_values<T: DeserializeOwned>(value: Value) -> Result<Decoded<T>> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("data").or_else(|| map.remove("items")) {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(Error::Config(
                    "expected a JSON array or an object with a \"data\" array".to_string(),
                ))
            }
        },
        Value::Null => Vec::new(),
        other => {
            return Err(Error::Config(format!(
                "expected a JSON array of records, got {}",
                json_kind(&other)
            )))
        }
    };

    let mut decoded = Decoded::default();
    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<T>(item) {
            Ok(record) => decoded.records.push(record),
            Err(e) => {
                tracing::warn!(index, error = %e, "skipping malformed record");
                decoded.skipped.push(Skipped {
                    index,
                    reason: e.to_string(),
                });
            }
        }
    }
    Ok(decoded)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// 日時文字列を解釈する（RFC 3339・"YYYY-MM-DD HH:MM:SS"・"YYYY-MM-DD"）
pub fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, pattern) {
            return Some(naive.and_utc());
        }
    }
    parse_date(s).and_then(|d| d.and_hms_opt(0, 0, 0)).map(|naive| naive.and_utc())
}

/// 日付文字列を解釈する（日時が付いていれば日付部分）
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| s.get(..10).and_then(|head| NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()))
}

/// serde用: 読めない日時は None
pub fn lenient_datetime<'de, D>(deserializer: D) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(s)) => parse_datetime(&s),
        // UNIXミリ秒
        Some(Value::Number(n)) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    })
}

/// serde用: 読めない日付は None
pub fn lenient_date<'de, D>(deserializer: D) -> std::result::Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(s)) => parse_date(&s),
        _ => None,
    })
}

/// serde用: 読めない数値は 0
pub fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().trim_end_matches('%').parse().unwrap_or(0.0),
        _ => 0.0,
    })
}

/// serde用: 読めない件数は 0
pub fn lenient_u64<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = lenient_f64(deserializer)?;
    Ok(if value.is_finite() && value > 0.0 { value as u64 } else { 0 })
}
