//! テキスト表示（端末向けの桁揃えした表）

use crate::pages::Report;
use opsboard_common::Table;

/// 表示幅（文字数で数える）
fn width(s: &str) -> usize {
    s.chars().count()
}

fn pad(s: &str, target: usize, right_align: bool) -> String {
    let fill = " ".repeat(target.saturating_sub(width(s)));
    if right_align {
        format!("{}{}", fill, s)
    } else {
        format!("{}{}", s, fill)
    }
}

pub fn render_table(table: &Table) -> String {
    let columns = table
        .rows
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(table.headers.len()))
        .max()
        .unwrap_or(0);

    let mut widths = vec![0usize; columns];
    for (i, header) in table.headers.iter().enumerate() {
        widths[i] = width(header);
    }
    let rendered: Vec<Vec<(String, bool)>> = table
        .rows
        .iter()
        .map(|row| row.iter().map(|cell| (cell.to_string(), cell.is_numeric())).collect())
        .collect();
    for row in &rendered {
        for (i, (text, _)) in row.iter().enumerate() {
            widths[i] = widths[i].max(width(text));
        }
    }

    let mut out = String::new();
    if !table.title.is_empty() {
        out.push_str(&table.title);
        out.push('\n');
    }

    let header_line: Vec<String> = widths
        .iter()
        .enumerate()
        .map(|(i, &w)| pad(table.headers.get(i).map(String::as_str).unwrap_or(""), w, false))
        .collect();
    out.push_str(header_line.join("  ").trim_end());
    out.push('\n');

    let rule: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    out.push_str(&rule.join("  "));
    out.push('\n');

    if rendered.is_empty() {
        out.push_str("(no records)\n");
        return out;
    }

    for row in &rendered {
        let line: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, (text, numeric))| pad(text, widths[i], *numeric))
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    }
    out
}

pub fn render_report(report: &Report) -> String {
    let mut sections: Vec<String> = report.tables.iter().map(render_table).collect();
    if !report.notes.is_empty() {
        sections.push(
            report
                .notes
                .iter()
                .map(|note| format!("- {}", note))
                .collect::<Vec<_>>()
                .join("\n")
                + "\n",
        );
    }
    sections.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use opsboard_common::Cell;

    #[test]
    fn test_columns_align() {
        let mut table = Table::new("Bills", &["Vendor", "Amount"]);
        table.push(vec![Cell::text("Acme"), Cell::number(5.0, "$5.00")]);
        table.push(vec![Cell::text("PowerGrid"), Cell::number(642.37, "$642.37")]);

        let text = render_table(&table);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Bills");
        assert_eq!(lines[1], "Vendor     Amount");
        assert_eq!(lines[2], "---------  -------");
        assert_eq!(lines[3], "Acme         $5.00");
        assert_eq!(lines[4], "PowerGrid  $642.37");
    }

    #[test]
    fn test_empty_table() {
        let table = Table::new("Clients", &["Name"]);
        assert!(render_table(&table).ends_with("(no records)\n"));
    }
}
