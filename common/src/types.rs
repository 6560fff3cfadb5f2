//! 共通の型定義
//!
//! - RecordId: 数値/文字列どちらのIDも受け付ける識別子
//! - Selection: UIの「すべて」選択を表す離散フィルタ値
//! - 各画面の固定語彙（未知の値は Unknown に落とす）

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// レコードID（JSONの数値・文字列の両方に対応）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(n) => write!(f, "{}", n),
            RecordId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl Default for RecordId {
    fn default() -> Self {
        RecordId::Number(0)
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        RecordId::Number(n)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        s.parse::<i64>()
            .map(RecordId::Number)
            .unwrap_or_else(|_| RecordId::Text(s.to_string()))
    }
}

/// 離散フィルタの選択状態
///
/// `All` はフィルタ無効（UIの「すべて」タブ）。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection<V> {
    #[default]
    All,
    Only(V),
}

impl<V> Selection<V> {
    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }

    pub fn as_option(&self) -> Option<&V> {
        match self {
            Selection::All => None,
            Selection::Only(v) => Some(v),
        }
    }
}

impl<V: PartialEq> Selection<V> {
    /// `All` なら常に一致
    pub fn accepts(&self, value: &V) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(wanted) => wanted == value,
        }
    }
}

impl<V: FromStr> Selection<V> {
    /// "all"・空文字は `All`
    pub fn parse(s: &str) -> Result<Self, V::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            return Ok(Selection::All);
        }
        trimmed.parse().map(Selection::Only)
    }
}

impl<V> From<Option<V>> for Selection<V> {
    fn from(value: Option<V>) -> Self {
        value.map(Selection::Only).unwrap_or_default()
    }
}

impl<V: fmt::Display> Serialize for Selection<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Selection::All => serializer.serialize_str("all"),
            Selection::Only(v) => serializer.collect_str(v),
        }
    }
}

impl<'de, V> Deserialize<'de> for Selection<V>
where
    V: FromStr,
    V::Err: fmt::Display,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw: Option<serde_json::Value> = Option::deserialize(deserializer)?;
        let text = match raw {
            None | Some(serde_json::Value::Null) => return Ok(Selection::All),
            Some(serde_json::Value::String(s)) => s,
            Some(other) => other.to_string(),
        };
        Selection::parse(&text).map_err(serde::de::Error::custom)
    }
}

/// 固定語彙（ステータス・カテゴリ）の共通インターフェース
pub trait Vocabulary: Sized + Copy + 'static {
    /// Unknown を除く全値
    const ALL: &'static [Self];

    /// 保存形式の文字列
    fn as_str(&self) -> &'static str;

    /// 表示ラベル
    fn label(&self) -> &'static str;

    /// 未知の値は Unknown になる
    fn from_str_lossy(s: &str) -> Self;

    /// 既知の値なら保存形式の表記（"unknown" そのものは受け付ける）
    fn canonical_key(s: &str) -> Option<&'static str> {
        let key = Self::from_str_lossy(s).as_str();
        if key == "unknown" && !s.trim().eq_ignore_ascii_case("unknown") {
            None
        } else {
            Some(key)
        }
    }
}

macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        $name:ident, unknown_label = $unknown_label:literal {
            $($variant:ident => ($key:literal, $label:literal)),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub enum $name {
            $($variant,)+
            #[default]
            Unknown,
        }

        impl Vocabulary for $name {
            const ALL: &'static [Self] = &[$($name::$variant),+];

            fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $key,)+
                    $name::Unknown => "unknown",
                }
            }

            fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                    $name::Unknown => $unknown_label,
                }
            }

            fn from_str_lossy(s: &str) -> Self {
                let normalized = s.trim().to_lowercase().replace(['_', ' '], "-");
                match normalized.as_str() {
                    $($key => $name::$variant,)+
                    _ => $name::Unknown,
                }
            }
        }

        impl FromStr for $name {
            type Err = std::convert::Infallible;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(<$name as Vocabulary>::from_str_lossy(s))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw: Option<serde_json::Value> = Option::deserialize(deserializer)?;
                Ok(match raw {
                    Some(serde_json::Value::String(s)) => <$name as Vocabulary>::from_str_lossy(&s),
                    _ => $name::Unknown,
                })
            }
        }
    };
}

vocabulary! {
    /// フォルダの資産カテゴリ
    AssetCategory, unknown_label = "Uncategorized" {
        Documents => ("documents", "Documents"),
        Contracts => ("contracts", "Contracts"),
        Invoices => ("invoices", "Invoices"),
        Media => ("media", "Media"),
        Reports => ("reports", "Reports"),
    }
}

vocabulary! {
    /// 顧客ステータス
    ClientStatus, unknown_label = "Other" {
        Active => ("active", "Active"),
        Lead => ("lead", "Lead"),
        Inactive => ("inactive", "Inactive"),
        Churned => ("churned", "Churned"),
    }
}

vocabulary! {
    /// 案件ステータス
    ProjectStatus, unknown_label = "Other" {
        Planning => ("planning", "Planning"),
        InProgress => ("in-progress", "In Progress"),
        OnHold => ("on-hold", "On Hold"),
        Completed => ("completed", "Completed"),
        Cancelled => ("cancelled", "Cancelled"),
    }
}

vocabulary! {
    /// 請求書ステータス
    BillStatus, unknown_label = "Other" {
        Pending => ("pending", "Pending"),
        Paid => ("paid", "Paid"),
        Overdue => ("overdue", "Overdue"),
    }
}

vocabulary! {
    /// お知らせの優先度
    AnnouncementPriority, unknown_label = "Normal" {
        Low => ("low", "Low"),
        Normal => ("normal", "Normal"),
        High => ("high", "High"),
        Urgent => ("urgent", "Urgent"),
    }
}
