//! 画面共通の 絞り込み → 並び替え → グループ化 パイプライン
//!
//! 各画面はレコード型に `Listable` を実装し、`ViewQuery` を渡すだけで
//! 一覧・グループ・内訳・サマリーを得る。

use crate::aggregate::{breakdown_of, group_by, sum_money, Breakdown, Groups};
use crate::filter::Filter;
use crate::money::Money;
use crate::sort::{Collation, SortDirection, SortValue, Sorter};
use crate::types::Selection;
use serde::{Deserialize, Serialize};

/// 一覧表示できるレコード
pub trait Listable {
    /// 画面ごとのソートキー（閉じた列挙）
    type SortKey: Copy;
    /// 画面ごとのグループキー（閉じた列挙）
    type GroupKey: Copy;

    /// 検索対象のテキストフィールド
    fn search_fields(&self) -> Vec<&str>;

    /// タブ・カテゴリ選択と突き合わせる値
    fn category(&self) -> String;

    /// 選択値を `category()` と同じ表記にそろえる（"Active" → "active"）。未知の値は None
    fn canonical_category(value: &str) -> Option<String>
    where
        Self: Sized,
    {
        Some(value.trim().to_string())
    }

    fn sort_value(&self, key: Self::SortKey) -> SortValue;

    /// グループの見出し
    fn group_key(&self, key: Self::GroupKey) -> String;

    /// 集計対象の金額
    fn amount(&self) -> Money {
        Money::ZERO
    }

    /// 所属する事業体（テナント）
    fn entity(&self) -> Option<&str> {
        None
    }

    fn tags(&self) -> Vec<&str> {
        Vec::new()
    }
}

/// UIの選択状態
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewQuery<S, G> {
    pub search_text: String,
    pub selected_category: Selection<String>,
    pub selected_entity: Selection<String>,
    pub tag: Option<String>,
    pub sort_key: Option<S>,
    pub sort_direction: SortDirection,
    pub group_by: Option<G>,
    /// 文字列の照合に使うロケール（未指定は Root 照合）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

impl<S, G> Default for ViewQuery<S, G> {
    fn default() -> Self {
        Self {
            search_text: String::new(),
            selected_category: Selection::All,
            selected_entity: Selection::All,
            tag: None,
            sort_key: None,
            sort_direction: SortDirection::Asc,
            group_by: None,
            locale: None,
        }
    }
}

impl<S, G> ViewQuery<S, G> {
    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search_text = text.into();
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.selected_category = Selection::Only(category.into());
        self
    }

    pub fn entity(mut self, entity: impl Into<String>) -> Self {
        self.selected_entity = Selection::Only(entity.into());
        self
    }

    pub fn sort(mut self, key: S, direction: SortDirection) -> Self {
        self.sort_key = Some(key);
        self.sort_direction = direction;
        self
    }

    pub fn group(mut self, key: G) -> Self {
        self.group_by = Some(key);
        self
    }

    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn collation(&self) -> Collation {
        self.locale
            .as_deref()
            .map(Collation::for_locale)
            .unwrap_or_default()
    }
}

/// 件数と合計
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Summary {
    pub count: usize,
    pub total: Money,
}

/// パイプラインの出力
#[derive(Debug, Serialize)]
pub struct DerivedView<'a, T> {
    pub rows: Vec<&'a T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<Groups<String, &'a T>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<Breakdown<String>>,
    pub summary: Summary,
}

/// クエリの絞り込み部分だけを組み立てる
pub fn filter_for<'f, T: Listable + 'f>(
    query: &ViewQuery<T::SortKey, T::GroupKey>,
) -> Filter<'f, T> {
    // 表記ゆれだけ吸収し、未知の値はそのまま（一致なし）
    let category = match &query.selected_category {
        Selection::Only(value) => {
            Selection::Only(T::canonical_category(value).unwrap_or_else(|| value.clone()))
        }
        Selection::All => Selection::All,
    };

    Filter::new()
        .search(&query.search_text, |item: &T| item.search_fields())
        .select(&category, |item: &T| item.category())
        .select(&query.selected_entity, |item: &T| {
            item.entity().unwrap_or_default().to_string()
        })
        .with_tag(query.tag.as_deref(), |item: &T| item.tags())
}

/// 絞り込み → 並び替え → グループ化
///
/// 入力は借用のみ。画面固有の前段フィルタ（フォルダのパス等）は
/// 絞り込んだ参照列をそのまま渡せばよい。
pub fn derive_view<'a, T, I>(items: I, query: &ViewQuery<T::SortKey, T::GroupKey>) -> DerivedView<'a, T>
where
    T: Listable + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let items: Vec<&'a T> = items.into_iter().collect();
    let filtered = filter_for::<T>(query).apply(items.iter().copied());

    let rows = match query.sort_key {
        Some(key) => Sorter::by(move |item: &T| item.sort_value(key), query.sort_direction)
            .collate(query.collation())
            .sorted(filtered),
        None => filtered,
    };

    let groups = query
        .group_by
        .map(|key| group_by(rows.iter().copied(), |item: &T| item.group_key(key)));
    let breakdown = groups
        .as_ref()
        .map(|groups| breakdown_of(groups, |item| item.amount()));

    let summary = Summary {
        count: rows.len(),
        total: sum_money(rows.iter().copied(), T::amount),
    };

    tracing::debug!(
        input = items.len(),
        rows = summary.count,
        groups = groups.as_ref().map(|g| g.len()).unwrap_or(0),
        "derived view"
    );

    DerivedView {
        rows,
        groups,
        breakdown,
        summary,
    }
}
