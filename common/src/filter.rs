//! 絞り込みモジュール
//!
//! 検索文字列と離散フィルタ（タブ・カテゴリ・事業体）から述語を組み立てる。
//! レコードは全条件を満たすときだけ残る:
//! - 検索文字列が空、または指定フィールドのどれかに大文字小文字を無視して含まれる
//! - `Selection::All` 以外の離散フィルタはすべて完全一致

use crate::types::Selection;

type Predicate<'f, T> = Box<dyn Fn(&T) -> bool + 'f>;
type FieldsFn<'f, T> = Box<dyn Fn(&T) -> Vec<&str> + 'f>;

/// 絞り込み条件
pub struct Filter<'f, T> {
    search: Option<(String, FieldsFn<'f, T>)>,
    predicates: Vec<Predicate<'f, T>>,
}

impl<'f, T> Default for Filter<'f, T> {
    fn default() -> Self {
        Self {
            search: None,
            predicates: Vec::new(),
        }
    }
}

impl<'f, T> Filter<'f, T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 検索文字列（空白のみは無条件扱い）
    pub fn search<F>(mut self, text: &str, fields: F) -> Self
    where
        F: Fn(&T) -> Vec<&str> + 'f,
    {
        // 空判定だけ trim する。前後の空白も検索文字列の一部
        self.search = if text.trim().is_empty() {
            None
        } else {
            Some((text.to_lowercase(), Box::new(fields)))
        };
        self
    }

    /// 離散フィルタ（`All` は無視）
    pub fn select<V, F>(mut self, selection: &Selection<V>, accessor: F) -> Self
    where
        V: PartialEq + Clone + 'f,
        F: Fn(&T) -> V + 'f,
    {
        if let Selection::Only(wanted) = selection {
            let wanted = wanted.clone();
            self.predicates.push(Box::new(move |item| accessor(item) == wanted));
        }
        self
    }

    /// タグを持つレコードのみ
    pub fn with_tag<F>(mut self, tag: Option<&str>, tags: F) -> Self
    where
        F: Fn(&T) -> Vec<&str> + 'f,
    {
        if let Some(tag) = tag.map(str::trim).filter(|t| !t.is_empty()) {
            let wanted = tag.to_lowercase();
            self.predicates.push(Box::new(move |item| {
                tags(item).iter().any(|t| t.to_lowercase() == wanted)
            }));
        }
        self
    }

    /// 選択中パスの直下のみ（深さ = 選択パス長 + 1）
    pub fn under_path<F>(mut self, selected: &[String], path: F) -> Self
    where
        F: Fn(&T) -> &[String] + 'f,
    {
        let selected = selected.to_vec();
        self.predicates.push(Box::new(move |item| is_direct_child(path(item), &selected)));
        self
    }

    /// 任意の追加条件
    pub fn when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + 'f,
    {
        self.predicates.push(Box::new(predicate));
        self
    }

    /// 条件が一つもないか
    pub fn is_unconstrained(&self) -> bool {
        self.search.is_none() && self.predicates.is_empty()
    }

    pub fn matches(&self, item: &T) -> bool {
        if let Some((needle, fields)) = &self.search {
            let hit = fields(item)
                .iter()
                .any(|field| field.to_lowercase().contains(needle.as_str()));
            if !hit {
                return false;
            }
        }
        self.predicates.iter().all(|p| p(item))
    }

    /// 条件に合うレコードを入力順で返す
    pub fn apply<'a, I>(&self, items: I) -> Vec<&'a T>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        items.into_iter().filter(|item| self.matches(item)).collect()
    }
}

/// `path` が `selected` の直下の子か
pub fn is_direct_child(path: &[String], selected: &[String]) -> bool {
    path.len() == selected.len() + 1 && path.starts_with(selected)
}
