//! Excel生成（共通ライブラリ）
//!
//! `Table` 1つにつき1シート。数値セルは数値として書く。

use crate::error::{Error, Result};
use crate::table::{Cell, Table};
use rust_xlsxwriter::*;

/// Excelのシート名上限
const SHEET_NAME_MAX: usize = 31;
const MIN_COL_WIDTH: usize = 8;
const MAX_COL_WIDTH: usize = 60;

/// シート名に使えない文字を除き、31文字に切り詰める
pub fn sheet_name(title: &str, index: usize) -> String {
    let cleaned: String = title
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\'))
        .take(SHEET_NAME_MAX)
        .collect();
    let cleaned = cleaned.trim().trim_matches('\'').to_string();
    if cleaned.is_empty() {
        format!("Sheet{}", index + 1)
    } else {
        cleaned
    }
}

fn column_width(table: &Table, col: usize) -> f64 {
    let header = table.headers.get(col).map(|h| h.chars().count()).unwrap_or(0);
    let widest = table
        .rows
        .iter()
        .filter_map(|row| row.get(col))
        .map(|cell| cell.to_string().chars().count())
        .max()
        .unwrap_or(0);
    (header.max(widest) + 2).clamp(MIN_COL_WIDTH, MAX_COL_WIDTH) as f64
}

/// Excelをバッファに生成
pub fn generate_excel_buffer(tables: &[Table]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();

    // フォーマット定義
    let header_format = Format::new()
        .set_bold()
        .set_font_color(Color::RGB(0x333333))
        .set_background_color(Color::RGB(0xF5F5F5))
        .set_align(FormatAlign::Center)
        .set_border(FormatBorder::Thin)
        .set_border_color(Color::RGB(0xAAAAAA));

    let text_format = Format::new()
        .set_align(FormatAlign::Left)
        .set_border(FormatBorder::Hair)
        .set_border_color(Color::RGB(0xCCCCCC));

    let number_format = Format::new()
        .set_num_format("#,##0.00")
        .set_border(FormatBorder::Hair)
        .set_border_color(Color::RGB(0xCCCCCC));

    let mut used_names: Vec<String> = Vec::new();

    for (index, table) in tables.iter().enumerate() {
        let mut name = sheet_name(&table.title, index);
        if used_names.iter().any(|n| n.eq_ignore_ascii_case(&name)) {
            let suffix = format!(" {}", index + 1);
            name = name.chars().take(SHEET_NAME_MAX - suffix.len()).collect::<String>() + &suffix;
        }
        used_names.push(name.clone());

        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(&name)
            .map_err(|e| Error::Export(format!("シート名設定エラー: {}", e)))?;

        for (col, header) in table.headers.iter().enumerate() {
            let col = col as u16;
            worksheet
                .write_string_with_format(0, col, header, &header_format)
                .map_err(|e| Error::Export(format!("見出し書き込みエラー: {}", e)))?;
        }

        for (i, row) in table.rows.iter().enumerate() {
            let r = (i + 1) as u32;
            for (col, cell) in row.iter().enumerate() {
                let col = col as u16;
                match cell {
                    Cell::Number { value, .. } if value.is_finite() => worksheet
                        .write_number_with_format(r, col, *value, &number_format)
                        .map(|_| ()),
                    Cell::Empty => worksheet.write_blank(r, col, &text_format).map(|_| ()),
                    other => worksheet
                        .write_string_with_format(r, col, other.to_string(), &text_format)
                        .map(|_| ()),
                }
                .map_err(|e| Error::Export(format!("セル書き込みエラー: {}", e)))?;
            }
        }

        for col in 0..table.headers.len() {
            worksheet
                .set_column_width(col as u16, column_width(table, col))
                .map_err(|e| Error::Export(format!("列幅設定エラー: {}", e)))?;
        }

        if !table.headers.is_empty() {
            worksheet
                .set_freeze_panes(1, 0)
                .map_err(|e| Error::Export(format!("ウィンドウ枠固定エラー: {}", e)))?;
        }
    }

    if tables.is_empty() {
        workbook.add_worksheet();
    }

    // バッファに書き出し
    workbook
        .save_to_buffer()
        .map_err(|e| Error::Export(format!("Excel保存エラー: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheet_name_sanitized() {
        assert_eq!(sheet_name("Bills: 2024/06", 0), "Bills 202406");
        assert_eq!(sheet_name("[]", 2), "Sheet3");
        assert_eq!(sheet_name(&"x".repeat(40), 0).len(), 31);
    }

    #[test]
    fn test_generate_buffer_is_zip() {
        let mut table = Table::new("Bills", &["Vendor", "Amount"]);
        table.push(vec![Cell::text("Acme"), Cell::number(12.5, "$12.50")]);
        table.push(vec![Cell::Empty, Cell::Empty]);
        let buffer = generate_excel_buffer(&[table.clone(), table]).unwrap();
        assert_eq!(&buffer[..2], b"PK");
    }

    #[test]
    fn test_write_failure_is_export_error() {
        // Excelのセル文字数上限（32,767）を超える
        let mut table = Table::new("Notes", &["Body"]);
        table.push(vec![Cell::text("x".repeat(40_000))]);
        match generate_excel_buffer(&[table]) {
            Err(Error::Export(message)) => assert!(message.contains("セル書き込みエラー")),
            other => panic!("unexpected: {:?}", other.map(|b| b.len())),
        }
    }
}
