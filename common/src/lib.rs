//! Opsboard Common Library
//!
//! 管理画面（フォルダ・顧客・案件・ツール・請求書・お知らせ）の
//! 絞り込み・並び替え・集計・表示整形を提供する純粋ライブラリ

pub mod aggregate;
pub mod error;
pub mod export;
pub mod filter;
pub mod hierarchy;
pub mod ingest;
pub mod money;
pub mod records;
pub mod sort;
pub mod table;
pub mod timefmt;
pub mod types;
pub mod view;

pub use aggregate::{breakdown, group_by, percentage_of_total, Breakdown, Groups};
pub use error::{Error, Result};
pub use filter::Filter;
pub use hierarchy::{Hierarchy, HierarchyIssue};
pub use ingest::{decode_records, Decoded};
pub use money::{CurrencyFormat, Money};
pub use records::{Announcement, Bill, Client, Folder, Project, Tool, ToolCategory};
pub use sort::{Collation, SortDirection, SortValue, Sorter};
pub use table::{Cell, RenderContext, Table};
pub use timefmt::{format_absolute, format_relative};
pub use types::{RecordId, Selection, Vocabulary};
pub use view::{derive_view, DerivedView, Listable, ViewQuery};
