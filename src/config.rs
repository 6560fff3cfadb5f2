use crate::error::{OpsboardError, Result};
use chrono::{DateTime, Utc};
use opsboard_common::{CurrencyFormat, RenderContext};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 表示ロケールを上書きする環境変数
pub const LOCALE_ENV: &str = "OPSBOARD_LOCALE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub locale: String,
    /// 通貨表記だけ別ロケールにする場合
    pub currency_locale: Option<String>,
    pub utc_offset_minutes: i32,
    /// chrono の書式文字列
    pub date_format: String,
    /// `<page>.json` を置くディレクトリ
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: "en-US".into(),
            currency_locale: None,
            utc_offset_minutes: 0,
            date_format: "%b %-d, %Y".into(),
            data_dir: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            tracing::debug!(path = %path.display(), "loaded config");
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| OpsboardError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("opsboard").join("config.json"))
    }

    /// 環境変数を優先したロケール
    pub fn effective_locale(&self) -> String {
        match std::env::var(LOCALE_ENV) {
            Ok(locale) if !locale.trim().is_empty() => locale,
            _ => self.locale.clone(),
        }
    }

    pub fn set_locale(&mut self, locale: &str) -> Result<()> {
        let locale = locale.trim();
        if locale.is_empty() {
            return Err(OpsboardError::Config("ロケールが空です".into()));
        }
        if CurrencyFormat::for_locale(locale).locale != locale {
            tracing::warn!(locale, "no currency format for locale, amounts will use en-US");
        }
        self.locale = locale.to_string();
        Ok(())
    }

    pub fn set_utc_offset(&mut self, minutes: i32) -> Result<()> {
        // 実在するオフセットは ±14時間
        if minutes.abs() > 14 * 60 {
            return Err(OpsboardError::Config(format!(
                "UTCオフセットが範囲外です: {}分",
                minutes
            )));
        }
        self.utc_offset_minutes = minutes;
        Ok(())
    }

    /// 表示設定を組み立てる（現在時刻は呼び出し側が渡す）
    pub fn render_context(&self, now: DateTime<Utc>) -> RenderContext {
        let locale = self.effective_locale();
        let currency_locale = self.currency_locale.as_deref().unwrap_or(&locale);
        RenderContext::new(now, currency_locale, self.utc_offset_minutes, &self.date_format)
    }
}
