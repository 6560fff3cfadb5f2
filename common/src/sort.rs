//! 並び替えモジュール
//!
//! ソートキー（文字列・数値・日時）と昇順/降順から比較関数を組み立てる。
//! 入力は変更せず、新しい並びを返す。同値は入力順を保つ（安定ソート）。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// ソート方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Asc),
            "desc" | "descending" => Ok(SortDirection::Desc),
            _ => Err(format!("Unknown direction: {}. Use asc or desc", s)),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "asc"),
            SortDirection::Desc => write!(f, "desc"),
        }
    }
}

/// 比較対象の値
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Text(String),
    Number(f64),
    Date(DateTime<Utc>),
    /// 値なし（方向に関係なく末尾）
    Missing,
}

impl SortValue {
    pub fn text(s: impl Into<String>) -> Self {
        SortValue::Text(s.into())
    }

    fn rank(&self) -> u8 {
        match self {
            SortValue::Number(_) => 0,
            SortValue::Date(_) => 1,
            SortValue::Text(_) => 2,
            SortValue::Missing => 3,
        }
    }

    /// Missing 以外同士の比較
    fn compare_present(&self, other: &SortValue, collation: Collation) -> Ordering {
        match (self, other) {
            (SortValue::Text(a), SortValue::Text(b)) => collation.compare(a, b),
            (SortValue::Number(a), SortValue::Number(b)) => a.total_cmp(b),
            (SortValue::Date(a), SortValue::Date(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl From<f64> for SortValue {
    fn from(n: f64) -> Self {
        SortValue::Number(n)
    }
}

impl From<DateTime<Utc>> for SortValue {
    fn from(d: DateTime<Utc>) -> Self {
        SortValue::Date(d)
    }
}

impl<T: Into<SortValue>> From<Option<T>> for SortValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(SortValue::Missing)
    }
}

/// 文字列の照合順（ロケール別）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Collation {
    /// アクセント付き文字は基本文字と同じ位置（en, de, fr, ja など）
    #[default]
    Root,
    /// å ä ö (æ ø) を z の後に置く（sv, fi）
    Swedish,
}

impl Collation {
    /// "sv-SE" → Swedish。知らない言語は Root
    pub fn for_locale(locale: &str) -> Self {
        let language = locale
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match language.as_str() {
            "sv" | "fi" => Collation::Swedish,
            _ => Collation::Root,
        }
    }

    /// 3段階で比較する
    ///
    /// 1. 基本文字（アクセントと大文字小文字を除く）
    /// 2. アクセント（なしが先）
    /// 3. 大文字小文字（先頭から1文字ずつ、小文字が先）
    ///
    /// すべて同じなら元の文字列のコードポイント順。
    pub fn compare(self, a: &str, b: &str) -> Ordering {
        let ea = collation_elements(a, self);
        let eb = collation_elements(b, self);

        ea.iter()
            .map(|e| e.primary)
            .cmp(eb.iter().map(|e| e.primary))
            .then_with(|| ea.iter().map(|e| &e.marks).cmp(eb.iter().map(|e| &e.marks)))
            .then_with(|| ea.iter().map(|e| e.upper).cmp(eb.iter().map(|e| e.upper)))
            .then_with(|| a.cmp(b))
    }
}

/// 基本文字1つ分の照合要素
struct Element {
    primary: u32,
    marks: Vec<char>,
    upper: bool,
}

/// 基本文字の重み。4倍して z の直後にロケール別の文字を差し込む余地を作る
fn base_weight(c: char) -> u32 {
    c.to_lowercase().next().unwrap_or(c) as u32 * 4
}

const AFTER_Z: u32 = 'z' as u32 * 4;

fn collation_elements(s: &str, collation: Collation) -> Vec<Element> {
    let mut out: Vec<Element> = Vec::with_capacity(s.len());
    for c in s.nfd() {
        if is_combining_mark(c) {
            if let Some(last) = out.last_mut() {
                last.marks.push(c);
                continue;
            }
        }
        out.push(Element {
            primary: base_weight(c),
            marks: Vec::new(),
            upper: c.is_uppercase(),
        });
    }

    if collation == Collation::Swedish {
        for element in &mut out {
            let tailored = match (element.primary, element.marks.as_slice()) {
                (p, ['\u{30A}']) if p == base_weight('a') => Some(AFTER_Z + 1),
                (p, ['\u{308}']) if p == base_weight('a') => Some(AFTER_Z + 2),
                (p, []) if p == base_weight('æ') => Some(AFTER_Z + 2),
                (p, ['\u{308}']) if p == base_weight('o') => Some(AFTER_Z + 3),
                (p, []) if p == base_weight('ø') => Some(AFTER_Z + 3),
                _ => None,
            };
            if let Some(primary) = tailored {
                element.primary = primary;
                element.marks.clear();
            }
        }
    }
    out
}

/// 既定（Root）の照合で比較
pub fn compare_text(a: &str, b: &str) -> Ordering {
    Collation::Root.compare(a, b)
}

/// 2値を方向付きで比較（Missing は常に末尾）
pub fn compare_values(
    a: &SortValue,
    b: &SortValue,
    direction: SortDirection,
    collation: Collation,
) -> Ordering {
    match (a, b) {
        (SortValue::Missing, SortValue::Missing) => Ordering::Equal,
        (SortValue::Missing, _) => Ordering::Greater,
        (_, SortValue::Missing) => Ordering::Less,
        _ => direction.apply(a.compare_present(b, collation)),
    }
}

type KeyFn<'f, T> = Box<dyn Fn(&T) -> SortValue + 'f>;

/// 複数キーのソート定義
pub struct Sorter<'f, T> {
    keys: Vec<(KeyFn<'f, T>, SortDirection)>,
    collation: Collation,
}

impl<'f, T> Default for Sorter<'f, T> {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            collation: Collation::Root,
        }
    }
}

impl<'f, T> Sorter<'f, T> {
    /// 第1キー
    pub fn by<F>(accessor: F, direction: SortDirection) -> Self
    where
        F: Fn(&T) -> SortValue + 'f,
    {
        Self::default().then_by(accessor, direction)
    }

    /// 同値時の次のキー
    pub fn then_by<F>(mut self, accessor: F, direction: SortDirection) -> Self
    where
        F: Fn(&T) -> SortValue + 'f,
    {
        self.keys.push((Box::new(accessor), direction));
        self
    }

    /// 文字列キーの照合順
    pub fn collate(mut self, collation: Collation) -> Self {
        self.collation = collation;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn compare(&self, a: &T, b: &T) -> Ordering {
        for (key, direction) in &self.keys {
            let ordering = compare_values(&key(a), &key(b), *direction, self.collation);
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    /// 並び替えた参照のリストを返す
    pub fn sorted<'a, I>(&self, items: I) -> Vec<&'a T>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let mut rows: Vec<&'a T> = items.into_iter().collect();
        if self.keys.is_empty() {
            return rows;
        }

        // キーを一度だけ計算する
        let mut keyed: Vec<(Vec<SortValue>, &'a T)> = rows
            .drain(..)
            .map(|item| (self.keys.iter().map(|(key, _)| key(item)).collect(), item))
            .collect();

        keyed.sort_by(|(a, _), (b, _)| {
            a.iter()
                .zip(b.iter())
                .zip(self.keys.iter())
                .map(|((va, vb), (_, direction))| compare_values(va, vb, *direction, self.collation))
                .find(|o| *o != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });

        keyed.into_iter().map(|(_, item)| item).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[derive(Debug, PartialEq)]
    struct Row {
        id: u32,
        name: &'static str,
        score: Option<f64>,
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { id: 1, name: "beta", score: Some(2.0) },
            Row { id: 2, name: "Alpha", score: Some(1.0) },
            Row { id: 3, name: "alpha", score: None },
            Row { id: 4, name: "gamma", score: Some(2.0) },
        ]
    }

    fn ids(rows: &[&Row]) -> Vec<u32> {
        rows.iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_sort_text_case_insensitive() {
        let data = rows();
        let sorted = Sorter::by(|r: &Row| SortValue::text(r.name), SortDirection::Asc).sorted(&data);
        assert_eq!(ids(&sorted), vec![3, 2, 1, 4]);
    }

    #[test]
    fn test_sort_is_stable_descending() {
        let data = rows();
        let sorted = Sorter::by(|r: &Row| r.score.into(), SortDirection::Desc).sorted(&data);
        // 2.0 同士は入力順、None は末尾
        assert_eq!(ids(&sorted), vec![1, 4, 2, 3]);
    }

    #[test]
    fn test_missing_last_ascending() {
        let data = rows();
        let sorted = Sorter::by(|r: &Row| r.score.into(), SortDirection::Asc).sorted(&data);
        assert_eq!(ids(&sorted), vec![2, 1, 4, 3]);
    }

    #[test]
    fn test_then_by() {
        let data = rows();
        let sorted = Sorter::by(|r: &Row| r.score.into(), SortDirection::Desc)
            .then_by(|r: &Row| SortValue::text(r.name), SortDirection::Desc)
            .sorted(&data);
        assert_eq!(ids(&sorted), vec![4, 1, 2, 3]);
    }

    #[test]
    fn test_sort_dates() {
        let a = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap();
        assert_eq!(
            compare_values(&SortValue::Date(a), &SortValue::Date(b), SortDirection::Asc, Collation::Root),
            Ordering::Greater
        );
    }

    #[test]
    fn test_input_not_mutated() {
        let data = rows();
        let _ = Sorter::by(|r: &Row| SortValue::text(r.name), SortDirection::Asc).sorted(&data);
        assert_eq!(data[0].id, 1);
    }

    #[test]
    fn test_empty_sorter_keeps_order() {
        let data = rows();
        let sorted = Sorter::<Row>::default().sorted(&data);
        assert_eq!(ids(&sorted), vec![1, 2, 3, 4]);
    }

    fn names_sorted(names: &[&'static str], collation: Collation) -> Vec<&'static str> {
        Sorter::by(|n: &&'static str| SortValue::text(*n), SortDirection::Asc)
            .collate(collation)
            .sorted(names)
            .into_iter()
            .copied()
            .collect()
    }

    #[test]
    fn test_accented_names_sort_with_base_letter() {
        let names = ["Zoe", "Émile", "Adam", "Ölaf", "Oscar"];
        assert_eq!(
            names_sorted(&names, Collation::Root),
            vec!["Adam", "Émile", "Ölaf", "Oscar", "Zoe"]
        );
    }

    #[test]
    fn test_swedish_letters_after_z() {
        let names = ["Zoe", "Ölaf", "Adam", "Åsa", "Äng", "Oscar"];
        assert_eq!(
            names_sorted(&names, Collation::for_locale("sv-SE")),
            vec!["Adam", "Oscar", "Zoe", "Åsa", "Äng", "Ölaf"]
        );
        assert_eq!(Collation::for_locale("de-DE"), Collation::Root);
        assert_eq!(Collation::for_locale("fi_FI"), Collation::Swedish);
    }

    #[test]
    fn test_unaccented_before_accented() {
        assert_eq!(compare_text("resume", "résumé"), Ordering::Less);
        assert_eq!(compare_text("Resume", "résumé"), Ordering::Less);
        // 基本文字の違いはアクセントより優先
        assert_eq!(compare_text("éa", "eb"), Ordering::Less);
    }

    #[test]
    fn test_case_compared_per_character() {
        // 最初に大文字小文字が異なる位置で決まる
        assert_eq!(compare_text("aB", "Ab"), Ordering::Less);
        assert_eq!(compare_text("Ab", "AB"), Ordering::Less);
        assert_eq!(compare_text("ab", "aB"), Ordering::Less);
    }

    #[test]
    fn test_direction_from_str() {
        assert_eq!("DESC".parse::<SortDirection>().unwrap(), SortDirection::Desc);
        assert!("up".parse::<SortDirection>().is_err());
    }
}
