//! 各画面のレコード型
//!
//! フォルダ・顧客・案件・ツール・請求書・お知らせ。
//! 欠けたフィールドは既定値、未知の語彙は Unknown、読めない日付は None になる。

use crate::error::Error;
use crate::ingest::{lenient_date, lenient_datetime, lenient_f64, lenient_u64};
use crate::money::Money;
use crate::sort::SortValue;
use crate::types::{
    AnnouncementPriority, AssetCategory, BillStatus, ClientStatus, ProjectStatus, RecordId,
    Vocabulary,
};
use crate::view::Listable;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// ソートキー・グループキーの列挙を定義する
///
/// 文字列からは camelCase / kebab-case / snake_case のどれでも読める。
macro_rules! view_keys {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($variant:ident => $key:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $key),+
                }
            }

            /// ヘルプ表示用（"name, email, ..."）
            pub fn choices() -> String {
                Self::ALL.iter().map(|k| k.as_str()).collect::<Vec<_>>().join(", ")
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = compact_key(s);
                Self::ALL
                    .iter()
                    .copied()
                    .find(|k| compact_key(k.as_str()) == wanted)
                    .ok_or_else(|| Error::UnknownKey {
                        kind: $kind,
                        value: s.to_string(),
                    })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

fn compact_key(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn text_or_missing(s: &str) -> SortValue {
    if s.trim().is_empty() {
        SortValue::Missing
    } else {
        SortValue::text(s)
    }
}

fn or_label(s: &str, fallback: &str) -> String {
    if s.trim().is_empty() {
        fallback.to_string()
    } else {
        s.to_string()
    }
}

fn date_value(date: Option<NaiveDate>) -> SortValue {
    date.and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| SortValue::Date(naive.and_utc()))
        .unwrap_or(SortValue::Missing)
}

fn money_value(m: Money) -> SortValue {
    SortValue::Number(m.minor() as f64)
}

// =============================================
// フォルダ
// =============================================

/// フォルダ（資産ライブラリ）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Folder {
    pub id: RecordId,
    pub name: String,
    /// ルートからのパス（自身を含む）
    pub path: Vec<String>,
    pub parent_id: Option<RecordId>,
    pub category: AssetCategory,
    pub entity_id: Option<String>,
    pub tags: Vec<String>,
    #[serde(deserialize_with = "lenient_u64")]
    pub file_count: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub size_bytes: u64,
    #[serde(deserialize_with = "lenient_datetime")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "lenient_datetime")]
    pub updated_at: Option<DateTime<Utc>>,
}

view_keys! {
    FolderSortKey, "folder sort" {
        Name => "name",
        Updated => "updatedAt",
        Created => "createdAt",
        Files => "fileCount",
        Size => "sizeBytes",
    }
}

view_keys! {
    FolderGroupKey, "folder group" {
        Category => "category",
        Parent => "parent",
        Entity => "entity",
    }
}

impl Listable for Folder {
    type SortKey = FolderSortKey;
    type GroupKey = FolderGroupKey;

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str()];
        fields.extend(self.tags.iter().map(String::as_str));
        fields
    }

    fn category(&self) -> String {
        self.category.as_str().to_string()
    }

    fn canonical_category(value: &str) -> Option<String> {
        AssetCategory::canonical_key(value).map(String::from)
    }

    fn sort_value(&self, key: FolderSortKey) -> SortValue {
        match key {
            FolderSortKey::Name => text_or_missing(&self.name),
            FolderSortKey::Updated => self.updated_at.into(),
            FolderSortKey::Created => self.created_at.into(),
            FolderSortKey::Files => SortValue::Number(self.file_count as f64),
            FolderSortKey::Size => SortValue::Number(self.size_bytes as f64),
        }
    }

    fn group_key(&self, key: FolderGroupKey) -> String {
        match key {
            FolderGroupKey::Category => self.category.label().to_string(),
            FolderGroupKey::Parent => self
                .parent_id
                .as_ref()
                .map(|p| p.to_string())
                .unwrap_or_else(|| "(root)".to_string()),
            FolderGroupKey::Entity => or_label(self.entity_id.as_deref().unwrap_or_default(), "Unassigned"),
        }
    }

    fn entity(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    fn tags(&self) -> Vec<&str> {
        self.tags.iter().map(String::as_str).collect()
    }
}

// =============================================
// 顧客
// =============================================

/// 顧客
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Client {
    pub id: RecordId,
    pub name: String,
    pub email: String,
    pub company: String,
    pub status: ClientStatus,
    pub entity_id: Option<String>,
    pub lifetime_value: Money,
    /// 0〜100
    #[serde(deserialize_with = "lenient_f64")]
    pub health_score: f64,
    #[serde(deserialize_with = "lenient_datetime")]
    pub last_contact: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "lenient_datetime")]
    pub created_at: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
}

view_keys! {
    ClientSortKey, "client sort" {
        Name => "name",
        Company => "company",
        LifetimeValue => "lifetimeValue",
        HealthScore => "healthScore",
        LastContact => "lastContact",
        Created => "createdAt",
    }
}

view_keys! {
    ClientGroupKey, "client group" {
        Status => "status",
        Company => "company",
        Entity => "entity",
    }
}

impl Listable for Client {
    type SortKey = ClientSortKey;
    type GroupKey = ClientGroupKey;

    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.email.as_str(), self.company.as_str()]
    }

    fn category(&self) -> String {
        self.status.as_str().to_string()
    }

    fn canonical_category(value: &str) -> Option<String> {
        ClientStatus::canonical_key(value).map(String::from)
    }

    fn sort_value(&self, key: ClientSortKey) -> SortValue {
        match key {
            ClientSortKey::Name => text_or_missing(&self.name),
            ClientSortKey::Company => text_or_missing(&self.company),
            ClientSortKey::LifetimeValue => money_value(self.lifetime_value),
            ClientSortKey::HealthScore => SortValue::Number(self.health()),
            ClientSortKey::LastContact => self.last_contact.into(),
            ClientSortKey::Created => self.created_at.into(),
        }
    }

    fn group_key(&self, key: ClientGroupKey) -> String {
        match key {
            ClientGroupKey::Status => self.status.label().to_string(),
            ClientGroupKey::Company => or_label(&self.company, "Independent"),
            ClientGroupKey::Entity => or_label(self.entity_id.as_deref().unwrap_or_default(), "Unassigned"),
        }
    }

    fn amount(&self) -> Money {
        self.lifetime_value
    }

    fn entity(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    fn tags(&self) -> Vec<&str> {
        self.tags.iter().map(String::as_str).collect()
    }
}

impl Client {
    /// 表示用ヘルススコア（0〜100）
    pub fn health(&self) -> f64 {
        crate::aggregate::clamp_percent(self.health_score)
    }
}

// =============================================
// 案件
// =============================================

/// 案件
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Project {
    pub id: RecordId,
    pub name: String,
    pub client: String,
    pub status: ProjectStatus,
    pub entity_id: Option<String>,
    /// 0〜100
    #[serde(deserialize_with = "lenient_f64")]
    pub progress: f64,
    pub budget: Money,
    pub spent: Money,
    #[serde(deserialize_with = "lenient_date")]
    pub due_date: Option<NaiveDate>,
    #[serde(deserialize_with = "lenient_datetime")]
    pub created_at: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
}

view_keys! {
    ProjectSortKey, "project sort" {
        Name => "name",
        Client => "client",
        Progress => "progress",
        Budget => "budget",
        Spent => "spent",
        DueDate => "dueDate",
        Created => "createdAt",
    }
}

view_keys! {
    ProjectGroupKey, "project group" {
        Status => "status",
        Client => "client",
        Entity => "entity",
    }
}

impl Listable for Project {
    type SortKey = ProjectSortKey;
    type GroupKey = ProjectGroupKey;

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str(), self.client.as_str()];
        fields.extend(self.tags.iter().map(String::as_str));
        fields
    }

    fn category(&self) -> String {
        self.status.as_str().to_string()
    }

    fn canonical_category(value: &str) -> Option<String> {
        ProjectStatus::canonical_key(value).map(String::from)
    }

    fn sort_value(&self, key: ProjectSortKey) -> SortValue {
        match key {
            ProjectSortKey::Name => text_or_missing(&self.name),
            ProjectSortKey::Client => text_or_missing(&self.client),
            ProjectSortKey::Progress => SortValue::Number(self.progress_percent()),
            ProjectSortKey::Budget => money_value(self.budget),
            ProjectSortKey::Spent => money_value(self.spent),
            ProjectSortKey::DueDate => date_value(self.due_date),
            ProjectSortKey::Created => self.created_at.into(),
        }
    }

    fn group_key(&self, key: ProjectGroupKey) -> String {
        match key {
            ProjectGroupKey::Status => self.status.label().to_string(),
            ProjectGroupKey::Client => or_label(&self.client, "No client"),
            ProjectGroupKey::Entity => or_label(self.entity_id.as_deref().unwrap_or_default(), "Unassigned"),
        }
    }

    fn amount(&self) -> Money {
        self.budget
    }

    fn entity(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    fn tags(&self) -> Vec<&str> {
        self.tags.iter().map(String::as_str).collect()
    }
}

impl Project {
    /// 表示用の進捗（0〜100）
    pub fn progress_percent(&self) -> f64 {
        crate::aggregate::clamp_percent(self.progress)
    }

    /// 予算残
    pub fn remaining(&self) -> Money {
        self.budget - self.spent
    }

    /// 予算消化率（0〜100）
    pub fn budget_used_percent(&self) -> f64 {
        crate::aggregate::clamp_percent(crate::aggregate::percentage_of_total(
            self.spent.minor() as f64,
            self.budget.minor() as f64,
        ))
    }
}

// =============================================
// ツール（SaaS契約）とカテゴリ
// =============================================

/// ツールのカテゴリ（親子2階層以上も可）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ToolCategory {
    pub id: RecordId,
    pub name: String,
    pub parent_id: Option<RecordId>,
}

/// ツール
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Tool {
    pub id: RecordId,
    pub name: String,
    pub vendor: String,
    pub category_id: Option<RecordId>,
    pub entity_id: Option<String>,
    pub monthly_price: Money,
    #[serde(deserialize_with = "lenient_u64")]
    pub seats: u64,
    #[serde(deserialize_with = "lenient_date")]
    pub renewal_date: Option<NaiveDate>,
    pub tags: Vec<String>,
}

view_keys! {
    ToolSortKey, "tool sort" {
        Name => "name",
        Vendor => "vendor",
        MonthlyPrice => "monthlyPrice",
        Seats => "seats",
        Renewal => "renewalDate",
    }
}

view_keys! {
    ToolGroupKey, "tool group" {
        Category => "category",
        Vendor => "vendor",
        Entity => "entity",
    }
}

/// カテゴリ未設定のツールのグループキー
pub const UNCATEGORIZED: &str = "uncategorized";

impl Tool {
    /// カテゴリIDの文字列（未設定は "uncategorized"）
    pub fn category_key(&self) -> String {
        self.category_id
            .as_ref()
            .map(|id| id.to_string())
            .unwrap_or_else(|| UNCATEGORIZED.to_string())
    }

    /// 年額
    pub fn annual_price(&self) -> Money {
        Money::from_minor(self.monthly_price.minor().saturating_mul(12))
    }
}

impl Listable for Tool {
    type SortKey = ToolSortKey;
    type GroupKey = ToolGroupKey;

    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.vendor.as_str()]
    }

    fn category(&self) -> String {
        self.category_key()
    }

    fn canonical_category(value: &str) -> Option<String> {
        let value = value.trim();
        if value.eq_ignore_ascii_case(UNCATEGORIZED) {
            Some(UNCATEGORIZED.to_string())
        } else {
            Some(value.to_string())
        }
    }

    fn sort_value(&self, key: ToolSortKey) -> SortValue {
        match key {
            ToolSortKey::Name => text_or_missing(&self.name),
            ToolSortKey::Vendor => text_or_missing(&self.vendor),
            ToolSortKey::MonthlyPrice => money_value(self.monthly_price),
            ToolSortKey::Seats => SortValue::Number(self.seats as f64),
            ToolSortKey::Renewal => date_value(self.renewal_date),
        }
    }

    fn group_key(&self, key: ToolGroupKey) -> String {
        match key {
            ToolGroupKey::Category => self.category_key(),
            ToolGroupKey::Vendor => or_label(&self.vendor, "Unknown vendor"),
            ToolGroupKey::Entity => or_label(self.entity_id.as_deref().unwrap_or_default(), "Unassigned"),
        }
    }

    fn amount(&self) -> Money {
        self.monthly_price
    }

    fn entity(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    fn tags(&self) -> Vec<&str> {
        self.tags.iter().map(String::as_str).collect()
    }
}

// =============================================
// 請求書
// =============================================

/// 請求書（支払い予定）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Bill {
    pub id: RecordId,
    pub vendor: String,
    pub description: String,
    pub category: String,
    pub amount: Money,
    pub status: BillStatus,
    pub entity_id: Option<String>,
    #[serde(deserialize_with = "lenient_date")]
    pub due_date: Option<NaiveDate>,
    #[serde(deserialize_with = "lenient_datetime")]
    pub issued_at: Option<DateTime<Utc>>,
}

view_keys! {
    BillSortKey, "bill sort" {
        Vendor => "vendor",
        Amount => "amount",
        DueDate => "dueDate",
        Issued => "issuedAt",
    }
}

view_keys! {
    BillGroupKey, "bill group" {
        Status => "status",
        Category => "category",
        Vendor => "vendor",
        Entity => "entity",
    }
}

impl Bill {
    /// 未払いか（支払済以外）
    pub fn is_outstanding(&self) -> bool {
        self.status != BillStatus::Paid
    }
}

impl Listable for Bill {
    type SortKey = BillSortKey;
    type GroupKey = BillGroupKey;

    fn search_fields(&self) -> Vec<&str> {
        vec![self.vendor.as_str(), self.description.as_str(), self.category.as_str()]
    }

    fn category(&self) -> String {
        self.status.as_str().to_string()
    }

    fn canonical_category(value: &str) -> Option<String> {
        BillStatus::canonical_key(value).map(String::from)
    }

    fn sort_value(&self, key: BillSortKey) -> SortValue {
        match key {
            BillSortKey::Vendor => text_or_missing(&self.vendor),
            BillSortKey::Amount => money_value(self.amount),
            BillSortKey::DueDate => date_value(self.due_date),
            BillSortKey::Issued => self.issued_at.into(),
        }
    }

    fn group_key(&self, key: BillGroupKey) -> String {
        match key {
            BillGroupKey::Status => self.status.label().to_string(),
            BillGroupKey::Category => or_label(&self.category, "Uncategorized"),
            BillGroupKey::Vendor => or_label(&self.vendor, "Unknown vendor"),
            BillGroupKey::Entity => or_label(self.entity_id.as_deref().unwrap_or_default(), "Unassigned"),
        }
    }

    fn amount(&self) -> Money {
        self.amount
    }

    fn entity(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }
}

// =============================================
// お知らせ
// =============================================

/// お知らせ
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Announcement {
    pub id: RecordId,
    pub title: String,
    pub body: String,
    pub author: String,
    pub audience: String,
    pub priority: AnnouncementPriority,
    pub pinned: bool,
    pub entity_id: Option<String>,
    #[serde(deserialize_with = "lenient_datetime")]
    pub published_at: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
}

view_keys! {
    AnnouncementSortKey, "announcement sort" {
        Title => "title",
        Published => "publishedAt",
        Priority => "priority",
    }
}

view_keys! {
    AnnouncementGroupKey, "announcement group" {
        Priority => "priority",
        Audience => "audience",
        Author => "author",
    }
}

impl AnnouncementPriority {
    /// 並び替え用の重み（Unknown は Normal 扱い）
    pub fn weight(&self) -> f64 {
        match self {
            AnnouncementPriority::Low => 0.0,
            AnnouncementPriority::Normal | AnnouncementPriority::Unknown => 1.0,
            AnnouncementPriority::High => 2.0,
            AnnouncementPriority::Urgent => 3.0,
        }
    }
}

impl Listable for Announcement {
    type SortKey = AnnouncementSortKey;
    type GroupKey = AnnouncementGroupKey;

    fn search_fields(&self) -> Vec<&str> {
        vec![self.title.as_str(), self.body.as_str(), self.author.as_str()]
    }

    fn category(&self) -> String {
        self.priority.as_str().to_string()
    }

    fn canonical_category(value: &str) -> Option<String> {
        AnnouncementPriority::canonical_key(value).map(String::from)
    }

    fn sort_value(&self, key: AnnouncementSortKey) -> SortValue {
        match key {
            AnnouncementSortKey::Title => text_or_missing(&self.title),
            AnnouncementSortKey::Published => self.published_at.into(),
            AnnouncementSortKey::Priority => SortValue::Number(self.priority.weight()),
        }
    }

    fn group_key(&self, key: AnnouncementGroupKey) -> String {
        match key {
            AnnouncementGroupKey::Priority => self.priority.label().to_string(),
            AnnouncementGroupKey::Audience => or_label(&self.audience, "Everyone"),
            AnnouncementGroupKey::Author => or_label(&self.author, "Unknown author"),
        }
    }

    fn entity(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    fn tags(&self) -> Vec<&str> {
        self.tags.iter().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_parsing_accepts_variants() {
        assert_eq!("lifetimeValue".parse::<ClientSortKey>().unwrap(), ClientSortKey::LifetimeValue);
        assert_eq!("lifetime-value".parse::<ClientSortKey>().unwrap(), ClientSortKey::LifetimeValue);
        assert_eq!("LIFETIME_VALUE".parse::<ClientSortKey>().unwrap(), ClientSortKey::LifetimeValue);

        let err = "colour".parse::<ClientSortKey>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown client sort key: colour");
    }

    #[test]
    fn test_client_deserialize_with_fallbacks() {
        let json = r#"{
            "id": 3,
            "name": "Jane Cooper",
            "status": "vip",
            "lifetimeValue": 1250.5,
            "healthScore": "140",
            "lastContact": "not a date"
        }"#;
        let client: Client = serde_json::from_str(json).unwrap();
        assert_eq!(client.status, ClientStatus::Unknown);
        assert_eq!(client.lifetime_value, Money::from_minor(125_050));
        assert_eq!(client.health(), 100.0);
        assert_eq!(client.last_contact, None);
        assert_eq!(client.group_key(ClientGroupKey::Status), "Other");
    }

    #[test]
    fn test_folder_minimal() {
        let folder: Folder = serde_json::from_str(r#"{"id": "f-1", "path": ["A"]}"#).unwrap();
        assert_eq!(folder.id, RecordId::Text("f-1".to_string()));
        assert_eq!(folder.category, AssetCategory::Unknown);
        assert_eq!(folder.group_key(FolderGroupKey::Category), "Uncategorized");
        assert_eq!(folder.group_key(FolderGroupKey::Parent), "(root)");
    }

    #[test]
    fn test_project_budget_math() {
        let project = Project {
            budget: Money::from_major(1000.0),
            spent: Money::from_major(1250.0),
            progress: -5.0,
            ..Default::default()
        };
        assert_eq!(project.remaining(), Money::from_major(-250.0));
        assert_eq!(project.budget_used_percent(), 100.0);
        assert_eq!(project.progress_percent(), 0.0);

        let unbudgeted = Project::default();
        assert_eq!(unbudgeted.budget_used_percent(), 0.0);
    }

    #[test]
    fn test_tool_category_key() {
        let tool: Tool = serde_json::from_str(r#"{"id": 1, "monthlyPrice": 10, "categoryId": 1}"#).unwrap();
        assert_eq!(tool.category_key(), "1");
        assert_eq!(tool.annual_price(), Money::from_major(120.0));

        let loose = Tool::default();
        assert_eq!(loose.category_key(), UNCATEGORIZED);
    }

    #[test]
    fn test_bill_outstanding() {
        let bill = Bill {
            status: BillStatus::Overdue,
            ..Default::default()
        };
        assert!(bill.is_outstanding());
        assert_eq!(bill.group_key(BillGroupKey::Category), "Uncategorized");
    }

    #[test]
    fn test_announcement_priority_weight() {
        let urgent = Announcement {
            priority: AnnouncementPriority::Urgent,
            ..Default::default()
        };
        assert_eq!(urgent.sort_value(AnnouncementSortKey::Priority), SortValue::Number(3.0));
    }

    #[test]
    fn test_sort_key_serde() {
        let key: ProjectSortKey = serde_json::from_str(r#""due-date""#).unwrap();
        assert_eq!(key, ProjectSortKey::DueDate);
        assert_eq!(serde_json::to_string(&key).unwrap(), r#""dueDate""#);
        assert!(serde_json::from_str::<ProjectSortKey>(r#""nope""#).is_err());
    }
}
