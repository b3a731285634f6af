//! Plain-text rendering of a table page.

use std::fmt::Write;

use crmgrid_lib::model::FieldDescriptor;
use crmgrid_lib::model::FieldSource;
use crmgrid_lib::query::Direction;
use crmgrid_lib::query::Page;
use crmgrid_lib::query::PageMetadata;
use crmgrid_lib::query::SortDirective;
use crmgrid_lib::view::MergedRecord;
use unicode_width::UnicodeWidthStr;

/// Columns that only hold row actions in the browser.
const ACTIONS: &str = "actions";

/// Marks rows merged in from another collection.
const DERIVED_MARK: &str = "*";

fn cell(row: &MergedRecord, column: &str) -> String {
    row.field(column).to_value().to_string()
}

fn header(column: &FieldDescriptor, sort: Option<&SortDirective>) -> String {
    match sort {
        Some(sort) if sort.property() == column.id => {
            let arrow = match sort.direction() {
                Direction::Asc => "▲",
                Direction::Desc => "▼",
            };
            format!("{} {}", column.label, arrow)
        }
        _ => column.label.clone(),
    }
}

fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text.width());
    format!("{}{}", text, " ".repeat(fill))
}

/// Renders the visible columns of a page as an aligned text table.
pub fn table<'a>(
    columns: impl Iterator<Item = &'a FieldDescriptor>,
    page: &Page<MergedRecord>,
    sort: Option<&SortDirective>,
) -> String {
    let columns: Vec<&FieldDescriptor> = columns.filter(|c| c.id != ACTIONS).collect();

    let headers: Vec<String> = columns.iter().map(|c| header(c, sort)).collect();
    let rows: Vec<Vec<String>> = page
        .items()
        .iter()
        .map(|row| columns.iter().map(|c| cell(row, &c.id)).collect())
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            rows.iter()
                .map(|r| r[i].width())
                .chain(std::iter::once(h.width()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    let line = |cells: &[String], mark: &str, out: &mut String| {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| pad(c, *w))
            .collect();
        let _ = writeln!(out, "{} {}", pad(mark, 1), padded.join("  ").trim_end());
    };

    line(&headers, "", &mut out);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    line(&rule, "", &mut out);
    for (row, cells) in page.items().iter().zip(&rows) {
        let mark = if row.is_derived() { DERIVED_MARK } else { "" };
        line(cells, mark, &mut out);
    }
    out
}

/// Renders the pager line: range, page window and neighbours.
pub fn pager(meta: &PageMetadata) -> String {
    let Some((start, end)) = meta.range() else {
        return format!("No results ({} total)", meta.total_items);
    };
    let window: Vec<String> = meta
        .visible_pages()
        .map(|p| {
            if p == meta.current_page {
                format!("[{}]", p)
            } else {
                p.to_string()
            }
        })
        .collect();
    let ellipsis = if meta.has_hidden_pages_after() { " ..." } else { "" };
    format!(
        "Showing {} to {} of {}  |  Pages: {}{}",
        start,
        end,
        meta.total_items,
        window.join(" "),
        ellipsis
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crmgrid_lib::model::Record;

    fn page() -> Page<MergedRecord> {
        let rows = vec![
            MergedRecord::primary(Record::with_id(1).set("name", "Zoë").set("score", 7)),
            MergedRecord::primary(Record::with_id(22).set("name", "Al")),
        ];
        crmgrid_lib::query::paginate(rows, 1, 10)
    }

    #[test]
    fn test_table_alignment_uses_display_width() {
        let columns = [
            FieldDescriptor::new("id", "ID"),
            FieldDescriptor::new("name", "Name"),
            FieldDescriptor::new("actions", "Actions"),
        ];
        let sort = SortDirective::desc("id");
        let text = table(columns.iter(), &page(), Some(&sort));
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "  ID ▼  Name");
        assert_eq!(lines[2], "  1     Zoë");
        assert_eq!(lines[3], "  22    Al");
        assert!(!text.contains("Actions"));
    }

    #[test]
    fn test_pager_line() {
        let meta = PageMetadata::new(100, 10, 2);
        assert_eq!(
            pager(&meta),
            "Showing 11 to 20 of 100  |  Pages: 1 [2] 3 4 ..."
        );
        assert_eq!(pager(&PageMetadata::new(0, 10, 1)), "No results (0 total)");
    }

    #[test]
    fn test_pager_line_for_page_past_the_end() {
        assert_eq!(
            pager(&PageMetadata::new(12, 5, usize::MAX)),
            "No results (12 total)"
        );
    }
}
