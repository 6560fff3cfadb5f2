//! エラー型定義

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Unknown {kind} key: {value}")]
    UnknownKey { kind: &'static str, value: String },

    #[error("Re-parenting {id} under {parent} would create a cycle")]
    CyclicHierarchy { id: String, parent: String },

    #[error("Export error: {0}")]
    Export(String),
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_json() {
        let json_error = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let error = Error::Json(json_error);
        assert!(format!("{}", error).contains("JSON error"));
    }

    #[test]
    fn test_error_display_unknown_key() {
        let error = Error::UnknownKey { kind: "sort", value: "colour".to_string() };
        assert_eq!(format!("{}", error), "Unknown sort key: colour");
    }

    #[test]
    fn test_error_display_cycle() {
        let error = Error::CyclicHierarchy { id: "1".to_string(), parent: "3".to_string() };
        assert_eq!(format!("{}", error), "Re-parenting 1 under 3 would create a cycle");
    }
}
