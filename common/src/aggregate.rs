//! 集計モジュール
//!
//! グループ化（キー → メンバー）と、合計・件数・平均・構成比の計算。

use crate::money::Money;
use serde::Serialize;
use std::collections::HashMap;
use std::hash::Hash;

/// 1グループ
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group<K, V> {
    pub key: K,
    pub members: Vec<V>,
}

/// グループ化結果（初出順を保持）
#[derive(Debug, Clone)]
pub struct Groups<K, V> {
    groups: Vec<Group<K, V>>,
    index: HashMap<K, usize>,
}

impl<K, V> Default for Groups<K, V> {
    fn default() -> Self {
        Self {
            groups: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Clone, V> Groups<K, V> {
    fn push(&mut self, key: K, value: V) {
        match self.index.get(&key) {
            Some(&i) => self.groups[i].members.push(value),
            None => {
                self.index.insert(key.clone(), self.groups.len());
                self.groups.push(Group {
                    key,
                    members: vec![value],
                });
            }
        }
    }

    pub fn get(&self, key: &K) -> Option<&[V]> {
        self.index.get(key).map(|&i| self.groups[i].members.as_slice())
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.groups.iter().map(|g| &g.key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Group<K, V>> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// グループ別の件数
    pub fn count_by(&self) -> Vec<(K, usize)> {
        self.groups
            .iter()
            .map(|g| (g.key.clone(), g.members.len()))
            .collect()
    }

    /// グループ別の合計
    pub fn sum_by<F>(&self, amount: F) -> Vec<(K, Money)>
    where
        F: Fn(&V) -> Money,
    {
        self.groups
            .iter()
            .map(|g| (g.key.clone(), g.members.iter().map(&amount).sum()))
            .collect()
    }

    pub fn into_groups(self) -> Vec<Group<K, V>> {
        self.groups
    }
}

impl<K: Serialize, V: Serialize> Serialize for Groups<K, V> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.groups.serialize(serializer)
    }
}

/// キー関数でグループ化する
///
/// グループは初出順、メンバーは入力順。
pub fn group_by<'a, T, K, I, F>(items: I, key: F) -> Groups<K, &'a T>
where
    T: 'a,
    K: Eq + Hash + Clone,
    I: IntoIterator<Item = &'a T>,
    F: Fn(&T) -> K,
{
    let mut groups = Groups::default();
    for item in items {
        groups.push(key(item), item);
    }
    groups
}

pub fn sum_money<'a, T: 'a, I, F>(items: I, amount: F) -> Money
where
    I: IntoIterator<Item = &'a T>,
    F: Fn(&T) -> Money,
{
    items.into_iter().map(amount).sum()
}

pub fn sum_f64<'a, T: 'a, I, F>(items: I, metric: F) -> f64
where
    I: IntoIterator<Item = &'a T>,
    F: Fn(&T) -> f64,
{
    items
        .into_iter()
        .map(metric)
        .filter(|v| v.is_finite())
        .sum()
}

/// 平均（空なら None）
pub fn average<'a, T: 'a, I, F>(items: I, metric: F) -> Option<f64>
where
    I: IntoIterator<Item = &'a T>,
    F: Fn(&T) -> f64,
{
    let (sum, count) = items
        .into_iter()
        .map(metric)
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));

    (count > 0).then(|| sum / count as f64)
}

pub fn count_where<'a, T: 'a, I, F>(items: I, predicate: F) -> usize
where
    I: IntoIterator<Item = &'a T>,
    F: Fn(&T) -> bool,
{
    items.into_iter().filter(|item| predicate(item)).count()
}

/// 構成比（0〜100）。合計0のときは0
pub fn percentage_of_total(part: f64, total: f64) -> f64 {
    if total == 0.0 || !total.is_finite() || !part.is_finite() {
        return 0.0;
    }
    part / total * 100.0
}

/// 進捗・ヘルススコアを [0, 100] に丸める
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}

/// 内訳の1行
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownEntry<K> {
    pub key: K,
    pub count: usize,
    pub total: Money,
    pub percentage: f64,
}

/// 金額の内訳（カテゴリ別コストなど）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Breakdown<K> {
    pub entries: Vec<BreakdownEntry<K>>,
    pub total: Money,
}

impl<K> Default for Breakdown<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            total: Money::ZERO,
        }
    }
}

impl<K> Breakdown<K> {
    /// 金額の大きい順（同額は元の順）
    pub fn sorted_by_total(mut self) -> Self {
        self.entries.sort_by(|a, b| b.total.cmp(&a.total));
        self
    }

    pub fn get(&self, key: &K) -> Option<&BreakdownEntry<K>>
    where
        K: PartialEq,
    {
        self.entries.iter().find(|e| &e.key == key)
    }
}

/// グループ別の件数・合計・構成比を計算する
pub fn breakdown<'a, T, K, I, F, A>(items: I, key: F, amount: A) -> Breakdown<K>
where
    T: 'a,
    K: Eq + Hash + Clone,
    I: IntoIterator<Item = &'a T>,
    F: Fn(&T) -> K,
    A: Fn(&T) -> Money,
{
    let groups = group_by(items, key);
    breakdown_of(&groups, |item| amount(item))
}

/// グループ化済みの結果から内訳を作る
pub fn breakdown_of<K, V, A>(groups: &Groups<K, V>, amount: A) -> Breakdown<K>
where
    K: Eq + Hash + Clone,
    A: Fn(&V) -> Money,
{
    let sums = groups.sum_by(&amount);
    let total: Money = sums.iter().map(|(_, m)| *m).sum();

    let entries = groups
        .iter()
        .zip(sums)
        .map(|(group, (key, sum))| BreakdownEntry {
            key,
            count: group.members.len(),
            total: sum,
            percentage: percentage_of_total(sum.minor() as f64, total.minor() as f64),
        })
        .collect();

    Breakdown { entries, total }
}
