//! レコードの読み込み
//!
//! JSONファイル、スプレッドシート（1行目が見出し）、または組み込みのデモデータ。

use crate::error::{OpsboardError, Result};
use calamine::{open_workbook_auto, Data, Reader};
use chrono::{Duration, NaiveDate};
use opsboard_common::ingest::decode_values;
use opsboard_common::Decoded;
use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};
use std::fmt;
use std::path::{Path, PathBuf};

/// データの種類（ファイル名・デモデータと対応）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dataset {
    Folders,
    Clients,
    Projects,
    Tools,
    ToolCategories,
    Bills,
    Announcements,
}

impl Dataset {
    pub fn file_stem(&self) -> &'static str {
        match self {
            Dataset::Folders => "folders",
            Dataset::Clients => "clients",
            Dataset::Projects => "projects",
            Dataset::Tools => "tools",
            Dataset::ToolCategories => "tool-categories",
            Dataset::Bills => "bills",
            Dataset::Announcements => "announcements",
        }
    }

    fn demo(&self) -> &'static str {
        match self {
            Dataset::Folders => include_str!("../data/folders.json"),
            Dataset::Clients => include_str!("../data/clients.json"),
            Dataset::Projects => include_str!("../data/projects.json"),
            Dataset::Tools => include_str!("../data/tools.json"),
            Dataset::ToolCategories => include_str!("../data/tool-categories.json"),
            Dataset::Bills => include_str!("../data/bills.json"),
            Dataset::Announcements => include_str!("../data/announcements.json"),
        }
    }
}

/// 読み込み元
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    File(PathBuf),
    Demo(Dataset),
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::File(path) => write!(f, "{}", path.display()),
            Source::Demo(dataset) => write!(f, "demo:{}", dataset.file_stem()),
        }
    }
}

/// 明示パス → データディレクトリの `<name>.json` → デモデータ の順で決める
pub fn resolve(dataset: Dataset, path: Option<&Path>, data_dir: Option<&Path>) -> Source {
    if let Some(path) = path {
        return Source::File(path.to_path_buf());
    }
    if let Some(dir) = data_dir {
        let candidate = dir.join(format!("{}.json", dataset.file_stem()));
        if candidate.is_file() {
            return Source::File(candidate);
        }
        tracing::debug!(path = %candidate.display(), "no data file, using demo data");
    }
    Source::Demo(dataset)
}

pub fn load<T: DeserializeOwned>(source: &Source) -> Result<Decoded<T>> {
    let decoded = match source {
        Source::File(path) => read_records(path)?,
        Source::Demo(dataset) => decode_values(serde_json::from_str(dataset.demo())?)?,
    };
    if !decoded.skipped.is_empty() {
        tracing::warn!(
            source = %source,
            skipped = decoded.skipped.len(),
            "some records could not be read"
        );
    }
    Ok(decoded)
}

/// 読み込み元を決めてレコードだけを返す
pub fn load_records<T: DeserializeOwned>(
    dataset: Dataset,
    path: Option<&Path>,
    data_dir: Option<&Path>,
) -> Result<Vec<T>> {
    let source = resolve(dataset, path, data_dir);
    tracing::info!(source = %source, "loading records");
    Ok(load(&source)?.records)
}

/// ファイルからレコードを読む（拡張子で形式を判定）
pub fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Decoded<T>> {
    if !path.exists() {
        return Err(OpsboardError::FileNotFound(path.display().to_string()));
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    let value = match extension.as_str() {
        "json" => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        "xlsx" | "xlsm" | "xls" | "ods" => read_spreadsheet(path, None)?,
        _ => return Err(OpsboardError::UnsupportedFormat(path.display().to_string())),
    };
    Ok(decode_values(value)?)
}

/// スプレッドシートを JSON オブジェクトの配列に変換する
///
/// シート名を省略すると先頭シート。1行目を見出し（フィールド名）として扱う。
pub fn read_spreadsheet(path: &Path, sheet: Option<&str>) -> Result<Value> {
    let mut workbook = open_workbook_auto(path)?;
    let range = match sheet {
        Some(name) => workbook.worksheet_range(name)?,
        None => workbook
            .worksheet_range_at(0)
            .ok_or_else(|| OpsboardError::Spreadsheet(format!("シートがありません: {}", path.display())))??,
    };

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row.iter().map(|cell| header_key(&cell.to_string())).collect(),
        None => return Ok(Value::Array(Vec::new())),
    };

    let records = rows
        .filter_map(|row| {
            let mut record = Map::new();
            for (key, cell) in headers.iter().zip(row) {
                if key.is_empty() {
                    continue;
                }
                if let Some(value) = cell_value(key, cell) {
                    record.insert(key.clone(), value);
                }
            }
            (!record.is_empty()).then_some(Value::Object(record))
        })
        .collect();

    Ok(Value::Array(records))
}

/// 見出しをフィールド名にする（"Monthly Price" → "monthlyPrice"）
pub fn header_key(header: &str) -> String {
    let words: Vec<&str> = header
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    // 1語の見出しは camelCase のまま残す
    if let [word] = words.as_slice() {
        if !word.chars().any(char::is_lowercase) {
            return word.to_lowercase();
        }
        let mut chars = word.chars();
        return match chars.next() {
            Some(first) => first.to_lowercase().chain(chars).collect(),
            None => String::new(),
        };
    }

    words
        .iter()
        .enumerate()
        .map(|(i, word)| {
            let lower = word.to_lowercase();
            if i == 0 {
                return lower;
            }
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect()
}

/// リストとして読むフィールドと区切り文字
fn list_separator(key: &str) -> Option<char> {
    match key {
        "tags" => Some(','),
        "path" => Some('/'),
        _ => None,
    }
}

fn cell_value(key: &str, cell: &Data) -> Option<Value> {
    match cell {
        Data::String(s) if s.trim().is_empty() => None,
        Data::String(s) => Some(match list_separator(key) {
            Some(sep) => Value::Array(
                s.split(sep)
                    .map(str::trim)
                    .filter(|part| !part.is_empty())
                    .map(|part| Value::String(part.to_string()))
                    .collect(),
            ),
            None => Value::String(s.clone()),
        }),
        Data::Int(i) => Some(Value::from(*i)),
        Data::Float(f) => Some(float_value(*f)),
        Data::Bool(b) => Some(Value::Bool(*b)),
        Data::DateTime(dt) => excel_serial_to_iso(dt.as_f64()).map(Value::String),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(Value::String(s.clone())),
        Data::Error(e) => {
            tracing::debug!(key, error = ?e, "ignoring error cell");
            None
        }
        Data::Empty => None,
    }
}

/// 整数値の浮動小数はIDとして読めるよう整数にする
fn float_value(f: f64) -> Value {
    if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Value::from(f as i64)
    } else {
        Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
    }
}

/// Excelのシリアル値（1899-12-30起点の日数）をISO日時にする
fn excel_serial_to_iso(serial: f64) -> Option<String> {
    if !serial.is_finite() {
        return None;
    }
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    let datetime = base.checked_add_signed(Duration::milliseconds(millis))?;
    Some(datetime.format("%Y-%m-%dT%H:%M:%SZ").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_key() {
        assert_eq!(header_key("Monthly Price"), "monthlyPrice");
        assert_eq!(header_key("monthlyPrice"), "monthlyPrice");
        assert_eq!(header_key("Name"), "name");
        assert_eq!(header_key("ID"), "id");
        assert_eq!(header_key("category_id"), "categoryId");
        assert_eq!(header_key("  "), "");
    }

    #[test]
    fn test_cell_lists() {
        assert_eq!(
            cell_value("tags", &Data::String("vip, retail,".into())),
            Some(serde_json::json!(["vip", "retail"]))
        );
        assert_eq!(
            cell_value("path", &Data::String("Clients/Acme".into())),
            Some(serde_json::json!(["Clients", "Acme"]))
        );
        assert_eq!(cell_value("name", &Data::Empty), None);
    }

    #[test]
    fn test_float_ids_become_integers() {
        assert_eq!(float_value(3.0), serde_json::json!(3));
        assert_eq!(float_value(12.5), serde_json::json!(12.5));
    }

    #[test]
    fn test_excel_serial() {
        assert_eq!(excel_serial_to_iso(45458.5).as_deref(), Some("2024-06-15T12:00:00Z"));
    }

    #[test]
    fn test_resolve_order() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(resolve(Dataset::Bills, None, Some(dir.path())), Source::Demo(Dataset::Bills));

        let file = dir.path().join("bills.json");
        std::fs::write(&file, "[]").unwrap();
        assert_eq!(resolve(Dataset::Bills, None, Some(dir.path())), Source::File(file));

        let explicit = Path::new("other.json");
        assert_eq!(
            resolve(Dataset::Bills, Some(explicit), Some(dir.path())),
            Source::File(explicit.to_path_buf())
        );
    }
}
