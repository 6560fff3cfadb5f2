//! 画面単位のテスト（固定の現在時刻で組み立てる）

use chrono::{NaiveDate, TimeZone, Utc};
use opsboard::pages;
use opsboard_common::records::{
    AnnouncementGroupKey, AnnouncementSortKey, BillGroupKey, BillSortKey, FolderGroupKey,
    FolderSortKey, ToolGroupKey, ToolSortKey,
};
use opsboard_common::types::BillStatus;
use opsboard_common::{
    Announcement, Bill, Folder, Money, RecordId, RenderContext, Tool, ToolCategory, ViewQuery,
};
use serde_json::json;

fn ctx() -> RenderContext {
    let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
    RenderContext::new(now, "en-US", 0, "%Y-%m-%d")
}

fn category(id: i64, name: &str, parent: Option<i64>) -> ToolCategory {
    ToolCategory {
        id: RecordId::from(id),
        name: name.to_string(),
        parent_id: parent.map(RecordId::from),
    }
}

fn tool(name: &str, price: f64, category: Option<i64>) -> Tool {
    Tool {
        name: name.to_string(),
        monthly_price: Money::from_major(price),
        category_id: category.map(RecordId::from),
        ..Default::default()
    }
}

/// サブカテゴリのコストが最上位カテゴリに積み上がる
#[test]
fn test_tools_rollup_by_top_level() {
    let categories = vec![
        category(1, "Productivity", None),
        category(2, "Engineering", None),
        category(3, "Communication", Some(1)),
        category(4, "Hosting", Some(2)),
    ];
    let tools = vec![
        tool("Notion", 10.0, Some(1)),
        tool("Slack", 15.0, Some(3)),
        tool("AWS", 50.0, Some(4)),
        tool("Figma", 25.0, None),
    ];

    let report = pages::tools(&tools, &categories, &ViewQuery::default(), &ctx());
    assert_eq!(
        report.data["costByTopLevel"],
        json!([
            {"category": "Productivity", "total": 25.0, "percentage": 25.0},
            {"category": "Engineering", "total": 50.0, "percentage": 50.0},
            {"category": "Uncategorized", "total": 25.0, "percentage": 25.0},
        ])
    );
    assert_eq!(report.data["summary"]["total"], json!(100.0));

    // ツール一覧・カテゴリ別・最上位別の3表
    assert_eq!(report.tables.len(), 3);
    assert_eq!(report.tables[0].rows[1][2].to_string(), "Productivity / Communication");
}

/// 循環するカテゴリは除外され、そのツールは未分類に入る
#[test]
fn test_tools_with_cyclic_categories() {
    let categories = vec![
        category(1, "Loop A", Some(2)),
        category(2, "Loop B", Some(1)),
        category(3, "Fine", None),
    ];
    let tools = vec![tool("Stuck", 25.0, Some(1)), tool("Ok", 75.0, Some(3))];

    let report = pages::tools(&tools, &categories, &ViewQuery::default(), &ctx());
    assert_eq!(
        report.data["costByTopLevel"],
        json!([
            {"category": "Fine", "total": 75.0, "percentage": 75.0},
            {"category": "Uncategorized", "total": 25.0, "percentage": 25.0},
        ])
    );
    assert!(report.notes.iter().any(|n| n.contains("循環")));
    assert_eq!(report.tables[0].rows[0][2].to_string(), "#1");
}

#[test]
fn test_tools_grouped_by_category() {
    let categories = vec![category(1, "Productivity", None)];
    let tools = vec![tool("Notion", 10.0, Some(1)), tool("Slack", 30.0, Some(1))];
    let query = ViewQuery::default()
        .sort(ToolSortKey::MonthlyPrice, opsboard_common::SortDirection::Desc)
        .group(ToolGroupKey::Category);

    let report = pages::tools(&tools, &categories, &query, &ctx());
    assert_eq!(report.tables[0].rows[0][0].to_string(), "Slack");
    let grouped = report.tables.last().unwrap();
    assert_eq!(grouped.title, "Monthly cost by group");
    assert_eq!(grouped.rows[0][0].to_string(), "Productivity");
}

fn bill(vendor: &str, amount: f64, status: BillStatus, due: Option<(i32, u32, u32)>) -> Bill {
    Bill {
        vendor: vendor.to_string(),
        amount: Money::from_major(amount),
        status,
        due_date: due.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
        ..Default::default()
    }
}

#[test]
fn test_bills_outstanding_and_overdue() {
    let bills = vec![
        bill("Lease", 1000.0, BillStatus::Paid, Some((2024, 6, 1))),
        bill("Power", 200.0, BillStatus::Pending, Some((2024, 6, 20))),
        bill("Cloud", 300.0, BillStatus::Pending, Some((2024, 6, 10))),
        bill("Legal", 50.0, BillStatus::Overdue, None),
    ];

    let all = pages::bills(&bills, &ViewQuery::default(), false, &ctx());
    assert_eq!(all.data["summary"]["count"], json!(4));
    assert_eq!(all.data["outstanding"], json!(550.0));
    assert_eq!(all.data["overdue"], json!(2));
    assert_eq!(all.tables[0].rows[1][5].to_string(), "2024-06-20 (due in 5 days)");
    assert_eq!(all.tables[0].rows[2][5].to_string(), "2024-06-10 (overdue by 5 days)");

    let query = ViewQuery::<BillSortKey, BillGroupKey>::default()
        .sort(BillSortKey::Amount, opsboard_common::SortDirection::Desc);
    let outstanding = pages::bills(&bills, &query, true, &ctx());
    let vendors: Vec<String> = outstanding.tables[0]
        .rows
        .iter()
        .map(|row| row[0].to_string())
        .collect();
    assert_eq!(vendors, vec!["Cloud", "Power", "Legal"]);
}

fn announcement(id: i64, title: &str, pinned: bool, hours_ago: i64) -> Announcement {
    Announcement {
        id: RecordId::from(id),
        title: title.to_string(),
        pinned,
        published_at: Some(ctx().now - chrono::Duration::hours(hours_ago)),
        ..Default::default()
    }
}

/// 並び替え未指定なら固定表示が先、その中は新しい順
#[test]
fn test_announcements_default_order() {
    let items = vec![
        announcement(1, "Old pinned", true, 48),
        announcement(2, "Fresh", false, 1),
        announcement(3, "New pinned", true, 2),
        announcement(4, "Older", false, 30),
    ];

    let report = pages::announcements(
        &items,
        &ViewQuery::<AnnouncementSortKey, AnnouncementGroupKey>::default(),
        false,
        &ctx(),
    );
    let titles: Vec<String> = report.tables[0].rows.iter().map(|r| r[0].to_string()).collect();
    assert_eq!(titles, vec!["New pinned", "Old pinned", "Fresh", "Older"]);
    assert_eq!(report.tables[0].rows[0][4].to_string(), "2 hours ago");

    let pinned = pages::announcements(&items, &ViewQuery::default(), true, &ctx());
    assert_eq!(pinned.data["summary"]["count"], json!(2));
}

fn folder(id: i64, name: &str, parent: Option<i64>, path: &[&str]) -> Folder {
    Folder {
        id: RecordId::from(id),
        name: name.to_string(),
        parent_id: parent.map(RecordId::from),
        path: path.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    }
}

#[test]
fn test_folders_path_and_tree() {
    let items = vec![
        folder(1, "A", None, &["A"]),
        folder(2, "B", Some(1), &["A", "B"]),
        folder(3, "C", None, &["C"]),
        folder(4, "D", Some(2), &["A", "B", "D"]),
    ];

    let selected = pages::parse_path("A/");
    let scoped = pages::folders(
        &items,
        &ViewQuery::<FolderSortKey, FolderGroupKey>::default(),
        Some(selected.as_slice()),
        false,
        &ctx(),
    );
    assert_eq!(scoped.data["summary"]["count"], json!(1));
    assert_eq!(scoped.tables[0].rows[0][0].to_string(), "B");

    let tree = pages::folders(&items, &ViewQuery::default(), None, true, &ctx());
    let rows: Vec<(String, String)> = tree.tables[0]
        .rows
        .iter()
        .map(|r| (r[0].to_string(), r[1].to_string()))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("A".to_string(), "A".to_string()),
            ("  B".to_string(), "A / B".to_string()),
            ("    D".to_string(), "A / B / D".to_string()),
            ("C".to_string(), "C".to_string()),
        ]
    );
}

/// 検索で親が外れても木の位置はそのまま、親なしの警告も出ない
#[test]
fn test_folder_tree_after_search() {
    let items = vec![
        folder(1, "A", None, &["A"]),
        folder(2, "B", Some(1), &["A", "B"]),
        folder(3, "C", None, &["C"]),
        folder(4, "Deeds", Some(2), &["A", "B", "Deeds"]),
        folder(5, "Drafts", Some(99), &["Drafts"]),
    ];
    let query = ViewQuery::<FolderSortKey, FolderGroupKey>::default().search("d");

    let tree = pages::folders(&items, &query, None, true, &ctx());
    let rows: Vec<(String, String)> = tree.tables[0]
        .rows
        .iter()
        .map(|r| (r[0].to_string(), r[1].to_string()))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("    Deeds".to_string(), "A / B / Deeds".to_string()),
            ("Drafts".to_string(), "Drafts".to_string()),
        ]
    );

    // 本当に親がないものだけ警告する
    let missing: Vec<&String> = tree.notes.iter().filter(|n| n.contains("見つからない")).collect();
    assert_eq!(missing.len(), 1);
    assert!(missing[0].contains("99"));
}

/// デモデータで全画面が組み立てられる
#[test]
fn test_demo_pages_render() {
    use opsboard::dataset::{load_records, Dataset};
    use opsboard::render::render_report;

    let ctx = ctx();
    let clients: Vec<opsboard_common::Client> = load_records(Dataset::Clients, None, None).unwrap();
    let report = pages::clients(&clients, &ViewQuery::default().search("acme"), &ctx);
    assert_eq!(report.data["summary"]["count"], json!(1));
    assert!(render_report(&report).contains("Jane Cooper"));

    let projects: Vec<opsboard_common::Project> =
        load_records(Dataset::Projects, None, None).unwrap();
    let report = pages::projects(&projects, &ViewQuery::default(), &ctx);
    assert!(render_report(&report).contains("Website Redesign"));
}
