pub mod excel;

use crate::cli::OutputArgs;
use crate::error::Result;
use crate::pages::Report;
use crate::render;
use std::path::{Path, PathBuf};

/// 出力先がディレクトリなら `<title>.xlsx` を付ける
fn output_path_for_xlsx(output: &Path, title: &str) -> PathBuf {
    if output.is_dir() || output.extension().is_none() {
        output.join(format!("{}.xlsx", title.to_lowercase()))
    } else {
        output.to_path_buf()
    }
}

/// JSON出力（データ部分とメモ）
pub fn to_json(report: &Report) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// 指定に応じて画面を出力する
///
/// `--json` は標準出力にJSON、`--xlsx` はファイル出力、どちらもなければ表を表示。
pub fn emit(report: &Report, output: &OutputArgs) -> Result<()> {
    if let Some(path) = &output.xlsx {
        let output_path = output_path_for_xlsx(path, &report.title);
        excel::generate_excel(&report.tables, &output_path)?;
        println!("✔ Excel出力: {}", output_path.display());
    }

    if output.json {
        println!("{}", to_json(report)?);
    } else if output.xlsx.is_none() {
        print!("{}", render::render_report(report));
    }

    Ok(())
}
