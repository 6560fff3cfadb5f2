//! エラーケーステスト
//!
//! 各種エラー条件でのエラーハンドリングを検証

use opsboard::cli::ViewArgs;
use opsboard::config::Config;
use opsboard::dataset::read_records;
use opsboard::error::OpsboardError;
use opsboard_common::records::ToolSortKey;
use opsboard_common::{Bill, Error};
use tempfile::tempdir;

/// 存在しない入力ファイル
#[test]
fn test_missing_input_file() {
    let err = read_records::<Bill>(std::path::Path::new("/nonexistent/bills-12345.json")).unwrap_err();
    assert!(matches!(err, OpsboardError::FileNotFound(_)));
    assert!(err.to_string().contains("bills-12345.json"));
}

/// 壊れたJSON
#[test]
fn test_broken_json() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bills.json");
    std::fs::write(&path, "[{\"vendor\": ").unwrap();

    let err = read_records::<Bill>(&path).unwrap_err();
    assert!(matches!(err, OpsboardError::Json(_)));
}

/// 未知のキーは共通エラーのまま表示される
#[test]
fn test_unknown_group_key_message() {
    let args = ViewArgs {
        group: Some("weather".into()),
        ..Default::default()
    };
    let err = args.to_query::<Bill>("en-US").unwrap_err();
    assert!(matches!(err, OpsboardError::Common(Error::UnknownKey { .. })));
    assert_eq!(err.to_string(), "Unknown bill group key: weather");
}

#[test]
fn test_key_parse_is_lenient_about_case() {
    assert_eq!("MONTHLY_PRICE".parse::<ToolSortKey>().unwrap(), ToolSortKey::MonthlyPrice);
    assert!("".parse::<ToolSortKey>().is_err());
}

/// 壊れた表示条件ファイル
#[test]
fn test_broken_query_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("query.json");
    std::fs::write(&path, r#"{"sortDirection": "sideways"}"#).unwrap();

    let args = ViewArgs {
        query: Some(path),
        ..Default::default()
    };
    let result = args.to_query::<Bill>("en-US");
    assert!(matches!(result, Err(OpsboardError::Json(_))));
}

/// 範囲外のUTCオフセット
#[test]
fn test_invalid_utc_offset() {
    let mut config = Config::default();
    let err = config.set_utc_offset(15 * 60).unwrap_err();
    assert!(err.to_string().contains("設定エラー"));
    assert_eq!(config.utc_offset_minutes, 0);
}

/// 壊れた設定ファイル
#[test]
fn test_broken_config_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(Config::load_from(&path).is_err());
}

#[test]
fn test_error_conversions() {
    let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let err: OpsboardError = io.into();
    assert!(err.to_string().starts_with("IOエラー"));

    let common = Error::Config("bad".into());
    let err: OpsboardError = common.into();
    assert_eq!(err.to_string(), "Config error: bad");
}
