//! Excel/JSON出力の統合テスト

use calamine::{open_workbook_auto, Data, Reader};
use chrono::{TimeZone, Utc};
use opsboard::cli::OutputArgs;
use opsboard::dataset::{load_records, Dataset};
use opsboard::error::OpsboardError;
use opsboard::export::{self, excel};
use opsboard::pages::{self, Report};
use opsboard_common::{Cell, RenderContext, Table, Tool, ToolCategory, ViewQuery};
use tempfile::tempdir;

fn tools_report() -> Report {
    let ctx = RenderContext::new(
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap(),
        "en-US",
        0,
        "%Y-%m-%d",
    );
    let tools: Vec<Tool> = load_records(Dataset::Tools, None, None).unwrap();
    let categories: Vec<ToolCategory> = load_records(Dataset::ToolCategories, None, None).unwrap();
    pages::tools(&tools, &categories, &ViewQuery::default(), &ctx)
}

#[test]
fn test_excel_generation() {
    let dir = tempdir().expect("Failed to create temp dir");
    let output_path = dir.path().join("nested").join("tools.xlsx");
    let report = tools_report();

    let result = excel::generate_excel(&report.tables, &output_path);
    assert!(result.is_ok(), "Excel生成に失敗: {:?}", result.err());
    assert!(output_path.exists(), "Excelファイルが作成されていない");

    let mut workbook = open_workbook_auto(&output_path).expect("読み戻しに失敗");
    let names = workbook.sheet_names();
    assert_eq!(names.len(), report.tables.len());
    assert_eq!(names[0], "Tools");

    let range = workbook.worksheet_range("Tools").expect("シートがない");
    assert_eq!(range.get((0, 0)), Some(&Data::String("Name".to_string())));
    assert_eq!(range.get((1, 0)), Some(&Data::String("Notion".to_string())));
    // 金額は数値セル
    assert_eq!(range.get((1, 4)), Some(&Data::Float(96.0)));
}

#[test]
fn test_excel_generation_empty_tables() {
    let dir = tempdir().expect("Failed to create temp dir");
    let output_path = dir.path().join("empty.xlsx");

    let result = excel::generate_excel(&[], &output_path);
    assert!(result.is_ok(), "空のExcel生成に失敗: {:?}", result.err());
    assert!(output_path.exists());
}

/// 書き込めないセルは出力エラーになり、ファイルは作られない
#[test]
fn test_excel_write_failure() {
    let dir = tempdir().expect("Failed to create temp dir");
    let output_path = dir.path().join("broken.xlsx");
    let mut table = Table::new("Notes", &["Body"]);
    table.push(vec![Cell::text("x".repeat(40_000))]);

    let err = excel::generate_excel(&[table], &output_path).unwrap_err();
    assert!(matches!(err, OpsboardError::Export(_)));
    assert!(err.to_string().starts_with("出力エラー: セル書き込みエラー"));
    assert!(!output_path.exists());
}

#[test]
fn test_emit_into_directory_uses_title() {
    let dir = tempdir().expect("Failed to create temp dir");
    let report = tools_report();
    let output = OutputArgs {
        json: false,
        xlsx: Some(dir.path().to_path_buf()),
    };

    export::emit(&report, &output).unwrap();
    assert!(dir.path().join("tools.xlsx").exists());
}

#[test]
fn test_json_has_data_without_tables() {
    let report = tools_report();
    let text = export::to_json(&report).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();

    assert_eq!(value["title"], "Tools");
    assert_eq!(value["data"]["summary"]["count"], 7);
    assert!(value["data"]["costByTopLevel"].is_array());
    assert!(value.get("tables").is_none());
}
