//! 各画面の組み立て
//!
//! 画面ごとに共通パイプライン（`derive_view`）を設定し、表とJSONにまとめる。
//! ここでは失敗しない。失敗しうるのは読み込み・設定・出力だけ。

use opsboard_common::aggregate::{average, breakdown, count_where, sum_money, Breakdown};
use opsboard_common::records::{
    AnnouncementGroupKey, AnnouncementSortKey, BillGroupKey, BillSortKey, ClientGroupKey,
    ClientSortKey, FolderGroupKey, FolderSortKey, ProjectGroupKey, ProjectSortKey, ToolGroupKey,
    ToolSortKey, UNCATEGORIZED,
};
use opsboard_common::types::{BillStatus, ProjectStatus};
use opsboard_common::{
    derive_view, percentage_of_total, Announcement, Bill, Cell, Client, DerivedView, Filter,
    Folder, Hierarchy, HierarchyIssue, Money, Project, RecordId, RenderContext, SortDirection,
    SortValue, Sorter, Table, Tool, ToolCategory, ViewQuery, Vocabulary,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashSet;

/// 1画面分の出力
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub title: String,
    #[serde(skip)]
    pub tables: Vec<Table>,
    pub data: Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl Report {
    fn new(title: &str, data: Value) -> Self {
        Self {
            title: title.to_string(),
            tables: Vec::new(),
            data,
            notes: Vec::new(),
        }
    }
}

fn view_json<T: Serialize>(view: &DerivedView<'_, T>) -> Value {
    serde_json::to_value(view).unwrap_or(Value::Null)
}

fn issue_note(issue: &HierarchyIssue) -> String {
    match issue {
        HierarchyIssue::MissingParent { id, parent } => {
            format!("{} の親 {} が見つからないためルートとして表示", id, parent)
        }
        HierarchyIssue::DuplicateId { id } => format!("ID {} が重複しているため後のレコードを無視", id),
        HierarchyIssue::CyclicBranch { id } => format!("{} は循環する親子関係のため除外", id),
    }
}

/// グループ別の件数・合計・構成比の表
fn breakdown_table<F>(title: &str, breakdown: &Breakdown<String>, ctx: &RenderContext, label: F) -> Table
where
    F: Fn(&str) -> String,
{
    let mut table = Table::new(title, &["Group", "Count", "Total", "Share"]);
    for entry in &breakdown.entries {
        table.push(vec![
            Cell::text(label(entry.key.as_str())),
            Cell::count(entry.count as u64),
            ctx.money(entry.total),
            ctx.percent(entry.percentage),
        ]);
    }
    table
}

/// 件数だけのグループ表（金額を持たない画面用）
fn group_count_table<T>(title: &str, view: &DerivedView<'_, T>) -> Option<Table> {
    let groups = view.groups.as_ref()?;
    let mut table = Table::new(title, &["Group", "Count"]);
    for group in groups.iter() {
        table.push(vec![Cell::text(group.key.as_str()), Cell::count(group.members.len() as u64)]);
    }
    Some(table)
}

fn yes(flag: bool) -> Cell {
    if flag {
        Cell::text("yes")
    } else {
        Cell::Empty
    }
}

// =============================================
// フォルダ
// =============================================

/// "Contracts/Vendors" → ["Contracts", "Vendors"]
pub fn parse_path(path: &str) -> Vec<String> {
    path.split('/')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

pub fn folders(
    items: &[Folder],
    query: &ViewQuery<FolderSortKey, FolderGroupKey>,
    selected_path: Option<&[String]>,
    tree: bool,
    ctx: &RenderContext,
) -> Report {
    let scoped = match selected_path {
        Some(selected) => Filter::new()
            .under_path(selected, |f: &Folder| f.path.as_slice())
            .apply(items),
        None => items.iter().collect(),
    };
    let view = derive_view(scoped, query);

    let mut report = Report::new("Folders", view_json(&view));

    if tree {
        // 木は絞り込み前の全件で組み、表示するのは絞り込み結果だけ
        let hierarchy = Hierarchy::build(
            items,
            |f: &Folder| f.id.clone(),
            |f: &Folder| f.parent_id.clone(),
        );
        let visible: HashSet<*const Folder> = view.rows.iter().map(|f| *f as *const Folder).collect();
        let mut table = Table::new("Folder tree", &["Folder", "Path", "Category", "Files", "Updated"]);
        for (depth, folder) in hierarchy.walk() {
            if !visible.contains(&(folder as *const Folder)) {
                continue;
            }
            let breadcrumb = hierarchy
                .ancestors(&folder.id)
                .iter()
                .map(|f| f.name.as_str())
                .collect::<Vec<_>>()
                .join(" / ");
            table.push(vec![
                Cell::text(format!("{}{}", "  ".repeat(depth), folder.name)),
                Cell::text(breadcrumb),
                Cell::text(folder.category.label()),
                Cell::count(folder.file_count),
                ctx.relative(folder.updated_at),
            ]);
        }
        report.notes.extend(hierarchy.issues().iter().map(issue_note));
        report.tables.push(table);
    } else {
        let mut table = Table::new("Folders", &["Name", "Path", "Category", "Files", "Size (KB)", "Updated"]);
        for folder in &view.rows {
            table.push(vec![
                Cell::text(&folder.name),
                Cell::text(folder.path.join("/")),
                Cell::text(folder.category.label()),
                Cell::count(folder.file_count),
                Cell::count(folder.size_bytes / 1024),
                ctx.relative(folder.updated_at),
            ]);
        }
        report.tables.push(table);
    }

    if let Some(table) = group_count_table("Folders by group", &view) {
        report.tables.push(table);
    }

    let files: u64 = view.rows.iter().map(|f| f.file_count).sum();
    report.notes.push(format!("{} folders, {} files", view.summary.count, files));
    report
}

// =============================================
// 顧客
// =============================================

pub fn clients(
    items: &[Client],
    query: &ViewQuery<ClientSortKey, ClientGroupKey>,
    ctx: &RenderContext,
) -> Report {
    let view = derive_view(items, query);
    let average_health = average(view.rows.iter().copied(), Client::health);

    let mut data = view_json(&view);
    if let Value::Object(map) = &mut data {
        map.insert("averageHealth".into(), json!(average_health));
    }
    let mut report = Report::new("Clients", data);

    let mut table = Table::new(
        "Clients",
        &["Name", "Email", "Company", "Status", "Lifetime value", "Health", "Last contact"],
    );
    for client in &view.rows {
        table.push(vec![
            Cell::text(&client.name),
            Cell::text(&client.email),
            Cell::text(&client.company),
            Cell::text(client.status.label()),
            ctx.money(client.lifetime_value),
            ctx.percent(client.health()),
            ctx.relative(client.last_contact),
        ]);
    }
    report.tables.push(table);

    if let Some(breakdown) = &view.breakdown {
        report
            .tables
            .push(breakdown_table("Lifetime value by group", breakdown, ctx, str::to_string));
    }

    report.notes.push(format!(
        "{} clients, lifetime value {}, average health {}",
        view.summary.count,
        ctx.currency.format(view.summary.total),
        average_health
            .map(|h| format!("{:.1}", h))
            .unwrap_or_else(|| "-".to_string())
    ));
    report
}

// =============================================
// 案件
// =============================================

/// 期日を過ぎた進行中の案件か
fn is_late(project: &Project, ctx: &RenderContext) -> bool {
    !matches!(project.status, ProjectStatus::Completed | ProjectStatus::Cancelled)
        && project.due_date.is_some_and(|due| due < ctx.today())
}

pub fn projects(
    items: &[Project],
    query: &ViewQuery<ProjectSortKey, ProjectGroupKey>,
    ctx: &RenderContext,
) -> Report {
    let view = derive_view(items, query);
    let budget = view.summary.total;
    let spent = sum_money(view.rows.iter().copied(), |p: &Project| p.spent);
    let used = percentage_of_total(spent.minor() as f64, budget.minor() as f64);
    let late = count_where(view.rows.iter().copied(), |p: &Project| is_late(p, ctx));

    let mut data = view_json(&view);
    if let Value::Object(map) = &mut data {
        map.insert("spent".into(), json!(spent));
        map.insert("budgetUsedPercent".into(), json!(used));
        map.insert("late".into(), json!(late));
    }
    let mut report = Report::new("Projects", data);

    let mut table = Table::new(
        "Projects",
        &["Name", "Client", "Status", "Progress", "Budget", "Spent", "Remaining", "Due"],
    );
    for project in &view.rows {
        let due = match project.status {
            ProjectStatus::Completed | ProjectStatus::Cancelled => ctx.date(project.due_date),
            _ => ctx.due(project.due_date),
        };
        table.push(vec![
            Cell::text(&project.name),
            Cell::text(&project.client),
            Cell::text(project.status.label()),
            ctx.percent(project.progress_percent()),
            ctx.money(project.budget),
            ctx.money(project.spent),
            ctx.money(project.remaining()),
            due,
        ]);
    }
    report.tables.push(table);

    if let Some(breakdown) = &view.breakdown {
        report
            .tables
            .push(breakdown_table("Budget by group", breakdown, ctx, str::to_string));
    }

    report.notes.push(format!(
        "{} projects, budget {}, spent {} ({}), {} past due",
        view.summary.count,
        ctx.currency.format(budget),
        ctx.currency.format(spent),
        opsboard_common::money::format_percent(used, 1),
        late
    ));
    report
}

// =============================================
// ツール
// =============================================

/// カテゴリの表示名（パンくず）
fn category_label(hierarchy: &Hierarchy<'_, ToolCategory>, key: &str) -> String {
    if key == UNCATEGORIZED {
        return "Uncategorized".to_string();
    }
    let id = RecordId::from(key);
    let path = hierarchy.ancestors(&id);
    if path.is_empty() {
        format!("#{}", key)
    } else {
        path.iter().map(|c| c.name.as_str()).collect::<Vec<_>>().join(" / ")
    }
}

pub fn tools(
    items: &[Tool],
    categories: &[ToolCategory],
    query: &ViewQuery<ToolSortKey, ToolGroupKey>,
    ctx: &RenderContext,
) -> Report {
    let view = derive_view(items, query);
    let hierarchy = Hierarchy::build(
        categories,
        |c: &ToolCategory| c.id.clone(),
        |c: &ToolCategory| c.parent_id.clone(),
    );

    // 直接のカテゴリ別
    let direct = breakdown(view.rows.iter().copied(), Tool::category_key, |t: &Tool| t.monthly_price)
        .sorted_by_total();

    // 最上位カテゴリへの積み上げ
    let direct_cost = |category: &ToolCategory| {
        direct
            .get(&category.id.to_string())
            .map(|entry| entry.total)
            .unwrap_or(Money::ZERO)
    };
    let mut rolled: Vec<(String, Money)> = hierarchy
        .roots()
        .into_iter()
        .map(|root| (root.name.clone(), hierarchy.rollup(&root.id, direct_cost)))
        .collect();
    let placed: Money = rolled.iter().map(|(_, m)| *m).sum();
    let other = direct.total - placed;
    if !other.is_zero() {
        rolled.push(("Uncategorized".to_string(), other));
    }
    let rollup: Vec<Value> = rolled
        .iter()
        .map(|(name, total)| {
            json!({
                "category": name,
                "total": total,
                "percentage": percentage_of_total(total.minor() as f64, direct.total.minor() as f64),
            })
        })
        .collect();

    let mut data = view_json(&view);
    if let Value::Object(map) = &mut data {
        map.insert("costByCategory".into(), json!(direct));
        map.insert("costByTopLevel".into(), Value::Array(rollup));
    }
    let mut report = Report::new("Tools", data);

    let mut table = Table::new(
        "Tools",
        &["Name", "Vendor", "Category", "Seats", "Monthly", "Annual", "Renewal"],
    );
    for tool in &view.rows {
        table.push(vec![
            Cell::text(&tool.name),
            Cell::text(&tool.vendor),
            Cell::text(category_label(&hierarchy, &tool.category_key())),
            Cell::count(tool.seats),
            ctx.money(tool.monthly_price),
            ctx.money(tool.annual_price()),
            ctx.due(tool.renewal_date),
        ]);
    }
    report.tables.push(table);

    report.tables.push(breakdown_table("Monthly cost by category", &direct, ctx, |key| {
        category_label(&hierarchy, key)
    }));

    let mut top = Table::new("Monthly cost by top-level category", &["Category", "Total", "Share"]);
    for (name, total) in &rolled {
        top.push(vec![
            Cell::text(name),
            ctx.money(*total),
            ctx.percent(percentage_of_total(total.minor() as f64, direct.total.minor() as f64)),
        ]);
    }
    report.tables.push(top);

    if let Some(breakdown) = &view.breakdown {
        // カテゴリでのグループ化は上の表と同じなので名前だけ解決する
        let grouped_by_category = query.group_by == Some(ToolGroupKey::Category);
        report.tables.push(breakdown_table("Monthly cost by group", breakdown, ctx, |key| {
            if grouped_by_category {
                category_label(&hierarchy, key)
            } else {
                key.to_string()
            }
        }));
    }

    report.notes.extend(hierarchy.issues().iter().map(issue_note));
    report.notes.push(format!(
        "{} tools, {} per month, {} per year",
        view.summary.count,
        ctx.currency.format(view.summary.total),
        ctx.currency
            .format(Money::from_minor(view.summary.total.minor().saturating_mul(12)))
    ));
    report
}

// =============================================
// 請求書
// =============================================

pub fn bills(
    items: &[Bill],
    query: &ViewQuery<BillSortKey, BillGroupKey>,
    outstanding_only: bool,
    ctx: &RenderContext,
) -> Report {
    let scoped = Filter::new()
        .when(move |bill: &Bill| !outstanding_only || bill.is_outstanding())
        .apply(items);
    let view = derive_view(scoped, query);

    let today = ctx.today();
    let outstanding = sum_money(
        view.rows.iter().copied().filter(|b| b.is_outstanding()),
        |b: &Bill| b.amount,
    );
    let overdue = count_where(view.rows.iter().copied(), |b: &Bill| {
        b.status == BillStatus::Overdue || (b.is_outstanding() && b.due_date.is_some_and(|d| d < today))
    });

    let mut data = view_json(&view);
    if let Value::Object(map) = &mut data {
        map.insert("outstanding".into(), json!(outstanding));
        map.insert("overdue".into(), json!(overdue));
    }
    let mut report = Report::new("Bills", data);

    let mut table = Table::new(
        "Bills",
        &["Vendor", "Description", "Category", "Status", "Amount", "Due"],
    );
    for bill in &view.rows {
        let due = if bill.is_outstanding() {
            ctx.due(bill.due_date)
        } else {
            ctx.date(bill.due_date)
        };
        table.push(vec![
            Cell::text(&bill.vendor),
            Cell::text(&bill.description),
            Cell::text(&bill.category),
            Cell::text(bill.status.label()),
            ctx.money(bill.amount),
            due,
        ]);
    }
    report.tables.push(table);

    if let Some(breakdown) = &view.breakdown {
        report
            .tables
            .push(breakdown_table("Amount by group", breakdown, ctx, str::to_string));
    }

    report.notes.push(format!(
        "{} bills, total {}, outstanding {}, {} overdue",
        view.summary.count,
        ctx.currency.format(view.summary.total),
        ctx.currency.format(outstanding),
        overdue
    ));
    report
}

// =============================================
// お知らせ
// =============================================

pub fn announcements(
    items: &[Announcement],
    query: &ViewQuery<AnnouncementSortKey, AnnouncementGroupKey>,
    pinned_only: bool,
    ctx: &RenderContext,
) -> Report {
    let scoped = Filter::new()
        .when(move |a: &Announcement| !pinned_only || a.pinned)
        .apply(items);

    // 並び替え未指定なら新しい順、固定表示を先頭に
    let mut query = query.clone();
    let default_order = query.sort_key.is_none();
    if default_order {
        query.sort_key = Some(AnnouncementSortKey::Published);
        query.sort_direction = SortDirection::Desc;
    }
    let mut view = derive_view(scoped, &query);
    if default_order {
        view.rows = Sorter::by(
            |a: &Announcement| SortValue::Number(if a.pinned { 0.0 } else { 1.0 }),
            SortDirection::Asc,
        )
        .sorted(view.rows);
    }

    let mut report = Report::new("Announcements", view_json(&view));

    let mut table = Table::new(
        "Announcements",
        &["Title", "Priority", "Author", "Audience", "Published", "Pinned"],
    );
    for announcement in &view.rows {
        table.push(vec![
            Cell::text(&announcement.title),
            Cell::text(announcement.priority.label()),
            Cell::text(&announcement.author),
            Cell::text(&announcement.audience),
            ctx.relative(announcement.published_at),
            yes(announcement.pinned),
        ]);
    }
    report.tables.push(table);

    if let Some(table) = group_count_table("Announcements by group", &view) {
        report.tables.push(table);
    }

    let pinned = count_where(view.rows.iter().copied(), |a: &Announcement| a.pinned);
    report
        .notes
        .push(format!("{} announcements, {} pinned", view.summary.count, pinned));
    report
}
