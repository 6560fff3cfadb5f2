//! Excel生成（CLI版）
//!
//! 共通ライブラリでバッファを作り、ファイルに書き出す。

use crate::error::{OpsboardError, Result};
use opsboard_common::export::excel_core::generate_excel_buffer;
use opsboard_common::Table;
use std::path::Path;

pub fn generate_excel(tables: &[Table], output_path: &Path) -> Result<()> {
    let buffer = generate_excel_buffer(tables).map_err(|e| match e {
        opsboard_common::Error::Export(message) => OpsboardError::Export(message),
        other => OpsboardError::Common(other),
    })?;

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(output_path, buffer)?;
    tracing::debug!(path = %output_path.display(), sheets = tables.len(), "wrote workbook");

    Ok(())
}
