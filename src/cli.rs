use crate::error::Result;
use clap::{Args, Parser, Subcommand};
use opsboard_common::{Error, Listable, Selection, SortDirection, ViewQuery};
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Parser)]
#[command(name = "opsboard")]
#[command(about = "業務ダッシュボードの一覧・集計・出力ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// フォルダ一覧（パス絞り込み・ツリー表示）
    Folders {
        #[command(flatten)]
        view: ViewArgs,

        /// 親フォルダのパス（"Contracts/Vendors"）。直下の子だけを表示
        #[arg(long)]
        path: Option<String>,

        /// ツリー表示（パンくず付き）
        #[arg(long)]
        tree: bool,
    },

    /// 顧客一覧
    Clients {
        #[command(flatten)]
        view: ViewArgs,
    },

    /// 案件一覧（予算・進捗）
    Projects {
        #[command(flatten)]
        view: ViewArgs,
    },

    /// ツール契約とカテゴリ別コスト
    Tools {
        #[command(flatten)]
        view: ViewArgs,

        /// カテゴリ定義ファイル（.json/.xlsx）
        #[arg(long)]
        categories: Option<PathBuf>,
    },

    /// 請求書（支払い予定）
    Bills {
        #[command(flatten)]
        view: ViewArgs,

        /// 未払いのみ
        #[arg(long)]
        outstanding: bool,
    },

    /// お知らせ
    Announcements {
        #[command(flatten)]
        view: ViewArgs,

        /// 固定表示のみ
        #[arg(long)]
        pinned: bool,
    },

    /// 日時を相対表示に変換（"3 days ago"）
    Ago {
        /// 日時（RFC 3339 / "YYYY-MM-DD HH:MM:SS" / "YYYY-MM-DD"）
        #[arg(required = true)]
        timestamp: String,

        /// 基準時刻（省略時は現在）
        #[arg(long)]
        now: Option<String>,
    },

    /// 設定を表示/編集
    Config {
        /// 設定を表示
        #[arg(long)]
        show: bool,

        /// 表示ロケール（en-US / en-GB / de-DE / fr-FR / ja-JP）
        #[arg(long)]
        set_locale: Option<String>,

        /// UTCからのオフセット（分）
        #[arg(long, allow_hyphen_values = true)]
        set_utc_offset: Option<i32>,

        /// データディレクトリ
        #[arg(long)]
        set_data_dir: Option<PathBuf>,
    },
}

/// 一覧系コマンド共通の指定
#[derive(Args, Debug, Clone, Default)]
pub struct ViewArgs {
    /// 入力ファイル（.json/.xlsx、省略時はデータディレクトリかデモデータ）
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// 表示条件のJSON（{"searchText", "selectedCategory", "sortKey", ...}）
    #[arg(long)]
    pub query: Option<PathBuf>,

    /// 検索文字列
    #[arg(short, long)]
    pub search: Option<String>,

    /// タブ・カテゴリ（"all" で全件）
    #[arg(short, long)]
    pub category: Option<String>,

    /// 事業体
    #[arg(short, long)]
    pub entity: Option<String>,

    /// タグ
    #[arg(short, long)]
    pub tag: Option<String>,

    /// 並び替えキー
    #[arg(long)]
    pub sort: Option<String>,

    /// 並び順 (asc/desc)
    #[arg(short, long)]
    pub direction: Option<SortDirection>,

    /// グループ化キー
    #[arg(short, long)]
    pub group: Option<String>,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// 出力先
#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// JSONで出力
    #[arg(long)]
    pub json: bool,

    /// Excelファイルに出力
    #[arg(long)]
    pub xlsx: Option<PathBuf>,
}

impl ViewArgs {
    /// 表示条件を組み立てる（JSONファイル → コマンドライン指定の順で上書き）
    ///
    /// カテゴリは画面の語彙にそろえ、未知の値は設定エラー。
    /// ロケールはJSONファイルの指定がなければ `locale`。
    pub fn to_query<T>(&self, locale: &str) -> Result<ViewQuery<T::SortKey, T::GroupKey>>
    where
        T: Listable,
        T::SortKey: FromStr<Err = Error> + serde::de::DeserializeOwned,
        T::GroupKey: FromStr<Err = Error> + serde::de::DeserializeOwned,
    {
        let mut query: ViewQuery<T::SortKey, T::GroupKey> = match &self.query {
            Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
            None => ViewQuery::default(),
        };

        if let Some(search) = &self.search {
            query.search_text = search.clone();
        }
        if let Some(category) = &self.category {
            query.selected_category = Selection::parse(category).unwrap_or(Selection::All);
        }
        if let Some(entity) = &self.entity {
            query.selected_entity = Selection::parse(entity).unwrap_or(Selection::All);
        }
        if let Some(tag) = &self.tag {
            query.tag = Some(tag.clone());
        }
        if let Some(sort) = &self.sort {
            query.sort_key = Some(sort.parse()?);
        }
        if let Some(direction) = self.direction {
            query.sort_direction = direction;
        }
        if let Some(group) = &self.group {
            query.group_by = Some(group.parse()?);
        }
        if let Selection::Only(value) = &query.selected_category {
            let canonical = T::canonical_category(value).ok_or_else(|| Error::UnknownKey {
                kind: "category",
                value: value.clone(),
            })?;
            query.selected_category = Selection::Only(canonical);
        }
        if query.locale.is_none() {
            query.locale = Some(locale.to_string());
        }
        Ok(query)
    }
}
