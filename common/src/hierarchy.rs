//! 階層モジュール
//!
//! フォルダ木・カテゴリ→サブカテゴリを、親IDを持つフラットな配列から
//! アリーナ（ノード配列 + ID索引）として構築する。親子の参照はO(1)。
//!
//! 読み込み時の扱い:
//! - 存在しない親を指すノードはルートとして扱う（MissingParent）
//! - 重複IDは先勝ち（DuplicateId）
//! - どのルートからも辿れないノード（循環とその配下）は落とす（CyclicBranch）
//!
//! 書き込み時は `validate_parent` で循環を拒否する。

use crate::error::{Error, Result};
use crate::money::Money;
use crate::types::RecordId;
use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};

/// 構築時に見つかった不整合
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum HierarchyIssue {
    MissingParent { id: RecordId, parent: RecordId },
    DuplicateId { id: RecordId },
    CyclicBranch { id: RecordId },
}

#[derive(Debug)]
struct Node<'a, T> {
    item: &'a T,
    id: RecordId,
    parent: Option<usize>,
    children: Vec<usize>,
    depth: usize,
}

/// 親子関係の木
#[derive(Debug)]
pub struct Hierarchy<'a, T> {
    nodes: Vec<Node<'a, T>>,
    index: HashMap<RecordId, usize>,
    roots: Vec<usize>,
    issues: Vec<HierarchyIssue>,
}

impl<'a, T> Hierarchy<'a, T> {
    /// レコード列から木を構築する
    ///
    /// # Arguments
    /// * `items` - レコード
    /// * `id` - IDの取り出し
    /// * `parent` - 親IDの取り出し（None ならルート）
    pub fn build<I, F, P>(items: I, id: F, parent: P) -> Self
    where
        I: IntoIterator<Item = &'a T>,
        F: Fn(&T) -> RecordId,
        P: Fn(&T) -> Option<RecordId>,
    {
        let mut issues = Vec::new();
        let mut candidates: Vec<(&'a T, RecordId, Option<RecordId>)> = Vec::new();
        let mut seen = HashSet::new();

        for item in items {
            let item_id = id(item);
            if !seen.insert(item_id.clone()) {
                issues.push(HierarchyIssue::DuplicateId { id: item_id });
                continue;
            }
            candidates.push((item, item_id, parent(item)));
        }

        let position: HashMap<RecordId, usize> = candidates
            .iter()
            .enumerate()
            .map(|(i, (_, item_id, _))| (item_id.clone(), i))
            .collect();

        // 親リンクの解決
        let mut parent_of: Vec<Option<usize>> = Vec::with_capacity(candidates.len());
        let mut children_of: Vec<Vec<usize>> = vec![Vec::new(); candidates.len()];
        let mut root_candidates = Vec::new();

        for (i, (_, item_id, parent_id)) in candidates.iter().enumerate() {
            let resolved = match parent_id {
                None => None,
                Some(p) => match position.get(p) {
                    Some(&pi) => Some(pi),
                    None => {
                        issues.push(HierarchyIssue::MissingParent {
                            id: item_id.clone(),
                            parent: p.clone(),
                        });
                        None
                    }
                },
            };
            match resolved {
                Some(pi) => children_of[pi].push(i),
                None => root_candidates.push(i),
            }
            parent_of.push(resolved);
        }

        // ルートから幅優先で辿り、到達できたノードだけを採用する
        let mut new_index: Vec<Option<usize>> = vec![None; candidates.len()];
        let mut order: Vec<(usize, usize)> = Vec::new();
        let mut queue: VecDeque<(usize, usize)> = root_candidates.iter().map(|&r| (r, 0)).collect();

        while let Some((old, depth)) = queue.pop_front() {
            if new_index[old].is_some() {
                continue;
            }
            new_index[old] = Some(order.len());
            order.push((old, depth));
            for &child in &children_of[old] {
                queue.push_back((child, depth + 1));
            }
        }

        for (old, (_, item_id, _)) in candidates.iter().enumerate() {
            if new_index[old].is_none() {
                tracing::warn!(id = %item_id, "dropping node on cyclic branch");
                issues.push(HierarchyIssue::CyclicBranch { id: item_id.clone() });
            }
        }

        let mut nodes: Vec<Node<'a, T>> = order
            .iter()
            .map(|&(old, depth)| Node {
                item: candidates[old].0,
                id: candidates[old].1.clone(),
                parent: parent_of[old].and_then(|p| new_index[p]),
                children: Vec::new(),
                depth,
            })
            .collect();

        // 子リストは入力順を保つ
        for (old, children) in children_of.iter().enumerate() {
            if let Some(new_parent) = new_index[old] {
                nodes[new_parent].children = children.iter().filter_map(|&c| new_index[c]).collect();
            }
        }

        let roots = root_candidates.iter().filter_map(|&r| new_index[r]).collect();
        let index = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();

        Self {
            nodes,
            index,
            roots,
            issues,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn issues(&self) -> &[HierarchyIssue] {
        &self.issues
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &RecordId) -> Option<&'a T> {
        self.index.get(id).map(|&i| self.nodes[i].item)
    }

    pub fn roots(&self) -> Vec<&'a T> {
        self.roots.iter().map(|&i| self.nodes[i].item).collect()
    }

    /// 直下の子
    pub fn children(&self, id: &RecordId) -> Vec<&'a T> {
        self.index
            .get(id)
            .map(|&i| self.nodes[i].children.iter().map(|&c| self.nodes[c].item).collect())
            .unwrap_or_default()
    }

    pub fn parent(&self, id: &RecordId) -> Option<&'a T> {
        let &i = self.index.get(id)?;
        self.nodes[i].parent.map(|p| self.nodes[p].item)
    }

    /// ルートからのパス（自身を含む、パンくず表示用）
    pub fn ancestors(&self, id: &RecordId) -> Vec<&'a T> {
        let mut path = Vec::new();
        let mut current = self.index.get(id).copied();
        while let Some(i) = current {
            path.push(self.nodes[i].item);
            current = self.nodes[i].parent;
        }
        path.reverse();
        path
    }

    /// 配下すべて（前順、自身を含まない）
    pub fn descendants(&self, id: &RecordId) -> Vec<&'a T> {
        let Some(&start) = self.index.get(id) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        let mut stack: Vec<usize> = self.nodes[start].children.iter().rev().copied().collect();
        while let Some(i) = stack.pop() {
            out.push(self.nodes[i].item);
            stack.extend(self.nodes[i].children.iter().rev());
        }
        out
    }

    pub fn depth(&self, id: &RecordId) -> Option<usize> {
        self.index.get(id).map(|&i| self.nodes[i].depth)
    }

    /// 木全体を前順で列挙（深さ付き）
    pub fn walk(&self) -> Vec<(usize, &'a T)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<usize> = self.roots.iter().rev().copied().collect();
        while let Some(i) = stack.pop() {
            out.push((self.nodes[i].depth, self.nodes[i].item));
            stack.extend(self.nodes[i].children.iter().rev());
        }
        out
    }

    /// 部分木の合計（自身を含む）
    pub fn rollup<F>(&self, id: &RecordId, amount: F) -> Money
    where
        F: Fn(&T) -> Money,
    {
        match self.get(id) {
            Some(item) => amount(item) + self.descendants(id).into_iter().map(&amount).sum::<Money>(),
            None => Money::ZERO,
        }
    }

    /// `id` を `new_parent` の下に移しても循環しないか検査する
    pub fn validate_parent(&self, id: &RecordId, new_parent: Option<&RecordId>) -> Result<()> {
        let Some(new_parent) = new_parent else {
            return Ok(());
        };

        let cycle = || Error::CyclicHierarchy {
            id: id.to_string(),
            parent: new_parent.to_string(),
        };

        if new_parent == id {
            return Err(cycle());
        }

        let mut current = self.index.get(new_parent).copied();
        while let Some(i) = current {
            if &self.nodes[i].id == id {
                return Err(cycle());
            }
            current = self.nodes[i].parent;
        }
        Ok(())
    }
}
