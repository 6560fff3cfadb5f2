use thiserror::Error;

#[derive(Error, Debug)]
pub enum OpsboardError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("対応していない形式です: {0}（.json / .xlsx / .xls / .ods）")]
    UnsupportedFormat(String),

    #[error("スプレッドシート読み込みエラー: {0}")]
    Spreadsheet(String),

    #[error("出力エラー: {0}")]
    Export(String),

    #[error("JSON解析エラー: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] opsboard_common::Error),
}

impl From<calamine::Error> for OpsboardError {
    fn from(e: calamine::Error) -> Self {
        OpsboardError::Spreadsheet(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, OpsboardError>;
