//! 金額・パーセント表示モジュール
//!
//! 金額は補助単位（1/100）の整数で保持し、表示時のみロケール別にフォーマットする。
//! 浮動小数点の端数ずれを集計に持ち込まないため。

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub};

/// 金額（補助単位の整数）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// 補助単位（セント等）から生成
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// 主単位の小数から生成（四捨五入、NaN/∞は0）
    pub fn from_major(major: f64) -> Self {
        if !major.is_finite() {
            return Money::ZERO;
        }
        Money((major * 100.0).round() as i64)
    }

    pub fn minor(self) -> i64 {
        self.0
    }

    /// 主単位に変換（表示・比率計算用）
    pub fn to_major(self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// `format` の短縮形
    pub fn display(self, format: &CurrencyFormat) -> String {
        format.format(self)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(self.0.saturating_neg())
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

/// JSONでは主単位の数値としてやり取りする
impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_major())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // 文字列で届く金額（"1,200.50"）も受け付ける。読めない値は0扱い
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
            Null(Option<()>),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Money::from_major(n),
            Raw::Text(s) => s
                .trim()
                .trim_start_matches(['$', '€', '£', '¥'])
                .replace(',', "")
                .parse::<f64>()
                .map(Money::from_major)
                .unwrap_or(Money::ZERO),
            Raw::Null(_) => Money::ZERO,
        })
    }
}

/// 通貨記号の位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolPosition {
    /// $1,234.56
    Before,
    /// 1.234,56 €
    After,
}

/// ロケール別の通貨フォーマット
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyFormat {
    pub locale: String,
    pub code: &'static str,
    pub symbol: &'static str,
    pub decimals: u8,
    pub group_separator: &'static str,
    pub decimal_separator: &'static str,
    pub position: SymbolPosition,
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        Self::for_locale("en-US")
    }
}

impl CurrencyFormat {
    /// ロケールタグからフォーマットを取得（未知のロケールは en-US）
    pub fn for_locale(locale: &str) -> Self {
        let normalized = locale.trim().replace('_', "-").to_lowercase();
        let (code, symbol, decimals, group, decimal, position) = match normalized.as_str() {
            "en-gb" => ("GBP", "£", 2, ",", ".", SymbolPosition::Before),
            "de-de" | "de" => ("EUR", "€", 2, ".", ",", SymbolPosition::After),
            "fr-fr" | "fr" => ("EUR", "€", 2, "\u{202f}", ",", SymbolPosition::After),
            "ja-jp" | "ja" => ("JPY", "¥", 0, ",", ".", SymbolPosition::Before),
            _ => ("USD", "$", 2, ",", ".", SymbolPosition::Before),
        };
        let locale = match code {
            "USD" if normalized != "en-us" => "en-US".to_string(),
            _ => locale.trim().to_string(),
        };

        Self {
            locale,
            code,
            symbol,
            decimals,
            group_separator: group,
            decimal_separator: decimal,
            position,
        }
    }

    /// 金額を表示文字列に変換
    pub fn format(&self, amount: Money) -> String {
        let negative = amount.minor() < 0;
        let minor = amount.minor().unsigned_abs();

        let (whole, fraction) = match self.decimals {
            0 => ((minor + 50) / 100, None),
            _ => (minor / 100, Some(minor % 100)),
        };

        let mut body = group_digits(whole, self.group_separator);
        if let Some(fraction) = fraction {
            body.push_str(self.decimal_separator);
            body.push_str(&format!("{:02}", fraction));
        }

        let sign = if negative { "-" } else { "" };
        match self.position {
            SymbolPosition::Before => format!("{}{}{}", sign, self.symbol, body),
            SymbolPosition::After => format!("{}{} {}", sign, body, self.symbol),
        }
    }
}

/// 3桁区切り
fn group_digits(value: u64, separator: &str) -> String {
    let digits = value.to_string();
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3 * separator.len());

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push_str(separator);
        }
        out.push(c);
    }
    out
}

/// パーセント表示（"85.71%"）
pub fn format_percent(value: f64, decimals: usize) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    format!("{:.*}%", decimals, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_major_rounds_to_cents() {
        assert_eq!(Money::from_major(19.99).minor(), 1999);
        assert_eq!(Money::from_major(0.1 + 0.2).minor(), 30);
        assert_eq!(Money::from_major(f64::NAN), Money::ZERO);
    }

    #[test]
    fn test_sum_has_no_drift() {
        let total: Money = (0..10).map(|_| Money::from_major(0.1)).sum();
        assert_eq!(total, Money::from_major(1.0));
    }

    #[test]
    fn test_format_en_us() {
        let format = CurrencyFormat::for_locale("en-US");
        assert_eq!(format.format(Money::from_minor(123_456_78)), "$123,456.78");
        assert_eq!(format.format(Money::from_minor(-500)), "-$5.00");
        assert_eq!(format.format(Money::ZERO), "$0.00");
    }

    #[test]
    fn test_format_de_de() {
        let format = CurrencyFormat::for_locale("de_DE");
        assert_eq!(format.format(Money::from_minor(123_456)), "1.234,56 €");
    }

    #[test]
    fn test_format_ja_jp_has_no_fraction() {
        let format = CurrencyFormat::for_locale("ja-JP");
        assert_eq!(format.format(Money::from_minor(123_450)), "¥1,235");
    }

    #[test]
    fn test_unknown_locale_falls_back() {
        let format = CurrencyFormat::for_locale("xx-YY");
        assert_eq!(format.code, "USD");
        assert_eq!(format.locale, "en-US");
    }

    #[test]
    fn test_deserialize_variants() {
        let values: Vec<Money> = serde_json::from_str(r#"[10, 19.99, "$1,200.50", null, "n/a"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                Money::from_minor(1000),
                Money::from_minor(1999),
                Money::from_minor(120_050),
                Money::ZERO,
                Money::ZERO,
            ]
        );
    }

    #[test]
    fn test_serialize_as_major() {
        let json = serde_json::to_string(&Money::from_minor(2550)).unwrap();
        assert_eq!(json, "25.5");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(85.714285, 2), "85.71%");
        assert_eq!(format_percent(f64::NAN, 1), "0.0%");
    }
}
