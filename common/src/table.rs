//! 表形式の出力モデル
//!
//! テキスト表示・Excel出力の両方がこの形を受け取る。

use crate::money::{format_percent, CurrencyFormat, Money};
use crate::timefmt::{describe_due, format_absolute, format_relative, offset_from_minutes};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::Serialize;
use std::fmt;

/// セル
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    /// Excelでは数値として書き、テキストでは display を出す
    Number { value: f64, display: String },
    Empty,
}

impl Cell {
    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s)
        }
    }

    pub fn number(value: f64, display: impl Into<String>) -> Self {
        Cell::Number {
            value,
            display: display.into(),
        }
    }

    pub fn count(n: u64) -> Self {
        Cell::number(n as f64, n.to_string())
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Cell::Number { .. })
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Number { display, .. } => f.write_str(display),
            Cell::Empty => f.write_str("-"),
        }
    }
}

/// 表
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(title: impl Into<String>, headers: &[&str]) -> Self {
        Self {
            title: title.into(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// 行を追加（列数が足りなければ空セルで埋める）
    pub fn push(&mut self, mut row: Vec<Cell>) {
        row.resize(self.headers.len().max(row.len()), Cell::Empty);
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// 表示設定（ロケール・タイムゾーン・現在時刻）
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub now: DateTime<Utc>,
    pub currency: CurrencyFormat,
    pub offset: FixedOffset,
    pub date_format: String,
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::new(Utc::now(), "en-US", 0, "%b %-d, %Y")
    }
}

impl RenderContext {
    pub fn new(now: DateTime<Utc>, locale: &str, utc_offset_minutes: i32, date_format: &str) -> Self {
        Self {
            now,
            currency: CurrencyFormat::for_locale(locale),
            offset: offset_from_minutes(utc_offset_minutes),
            date_format: date_format.to_string(),
        }
    }

    /// 表示タイムゾーンでの今日
    pub fn today(&self) -> NaiveDate {
        self.now.with_timezone(&self.offset).date_naive()
    }

    pub fn money(&self, amount: Money) -> Cell {
        Cell::number(amount.to_major(), self.currency.format(amount))
    }

    pub fn percent(&self, value: f64) -> Cell {
        Cell::number(value, format_percent(value, 1))
    }

    pub fn relative(&self, ts: Option<DateTime<Utc>>) -> Cell {
        ts.map(|ts| Cell::Text(format_relative(ts, self.now)))
            .unwrap_or(Cell::Empty)
    }

    pub fn datetime(&self, ts: Option<DateTime<Utc>>) -> Cell {
        ts.map(|ts| Cell::Text(format_absolute(ts, self.offset, &self.date_format)))
            .unwrap_or(Cell::Empty)
    }

    pub fn date(&self, date: Option<NaiveDate>) -> Cell {
        date.map(|d| Cell::Text(d.format(&self.date_format).to_string()))
            .unwrap_or(Cell::Empty)
    }

    /// 期日（"Jun 18, 2024 (due in 3 days)"）
    pub fn due(&self, date: Option<NaiveDate>) -> Cell {
        date.map(|d| {
            Cell::Text(format!(
                "{} ({})",
                d.format(&self.date_format),
                describe_due(d, self.today())
            ))
        })
        .unwrap_or(Cell::Empty)
    }
}
