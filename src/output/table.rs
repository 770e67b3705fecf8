use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::db::models::*;
use crate::pages::options::FieldOptions;
use crate::pages::PageOutput;

/// Limits applied when printing tables to a terminal.
#[derive(Debug, Clone, Copy)]
pub struct TableStyle {
    pub max_rows: usize,
    pub max_column_width: usize,
}

impl Default for TableStyle {
    fn default() -> Self {
        TableStyle {
            max_rows: crate::config::DEFAULT_MAX_ROWS,
            max_column_width: crate::config::DEFAULT_MAX_COLUMN_WIDTH,
        }
    }
}

/// Truncate a string to fit within max_width (respecting unicode width).
fn truncate(s: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(s) <= max_width {
        return s.to_string();
    }
    let mut result = String::new();
    let mut width = 0;
    for ch in s.chars() {
        let cw = UnicodeWidthChar::width(ch).unwrap_or(0);
        if width + cw + 3 > max_width {
            result.push_str("...");
            break;
        }
        result.push(ch);
        width += cw;
    }
    result
}

/// Left-pad to a display width; `{:<n}` counts chars, not columns.
fn pad(s: &str, width: usize) -> String {
    let w = UnicodeWidthStr::width(s);
    format!("{s}{}", " ".repeat(width.saturating_sub(w)))
}

/// Render a result table as aligned text lines.
pub fn render_table(table: &ResultTable, style: TableStyle) -> Vec<String> {
    if table.is_empty() {
        return vec!["No rows found.".to_string()];
    }

    let shown = table.len().min(style.max_rows);
    let header: Vec<String> = table
        .columns()
        .iter()
        .map(|c| truncate(&c.to_uppercase(), style.max_column_width))
        .collect();
    let cells: Vec<Vec<String>> = table.rows()[..shown]
        .iter()
        .map(|row| {
            row.values()
                .iter()
                .map(|v| truncate(&v.to_string().replace('\n', " "), style.max_column_width))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = header
        .iter()
        .enumerate()
        .map(|(i, h)| {
            cells
                .iter()
                .filter_map(|r| r.get(i))
                .map(|c| UnicodeWidthStr::width(c.as_str()))
                .chain(std::iter::once(UnicodeWidthStr::width(h.as_str())))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |values: &[String]| {
        let joined: Vec<String> = values
            .iter()
            .zip(&widths)
            .map(|(v, w)| pad(v, *w))
            .collect();
        format!("  {}", joined.join("  ").trim_end())
    };

    let mut out = Vec::with_capacity(shown + 3);
    out.push(line(&header));
    let rule_width = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
    out.push(format!("  {}", "-".repeat(rule_width)));
    for row in &cells {
        out.push(line(row));
    }
    if table.len() > shown {
        let hidden = table.len() - shown;
        out.push(format!(
            "  ... {hidden} more row{}",
            if hidden == 1 { "" } else { "s" }
        ));
    }
    out
}

/// Print a page: title, each section with its table, then notes.
pub fn print_page(page: &PageOutput, style: TableStyle) {
    println!("{}", page.title);
    println!("{}", "=".repeat(UnicodeWidthStr::width(page.title.as_str())));

    for section in &page.sections {
        let n = section.table.len();
        println!(
            "\n{} ({n} row{}):\n",
            section.title,
            if n == 1 { "" } else { "s" }
        );
        for line in render_table(&section.table, style) {
            println!("{line}");
        }
    }

    if !page.notes.is_empty() {
        println!();
        for note in &page.notes {
            println!("  * {note}");
        }
    }
}

/// Print the choice lists for a page's filters.
pub fn print_options(page: &str, options: &[FieldOptions]) {
    println!("Filter options for {page}:\n");
    for opt in options {
        println!("  {:<12} {}", opt.field, truncate(&opt.choices.join(", "), 100));
    }
}

/// Print database stats.
pub fn print_stats(stats: &DbStats) {
    println!("Database Statistics:");
    for rel in &stats.relations {
        let label = format!("{} ({})", rel.name, rel.kind);
        println!("  {:<32} {}", label, rel.rows);
    }
    println!("  {:<32} {}", "DB Size", format_bytes(stats.db_size_bytes));
}

pub fn format_bytes(bytes: u64) -> String {
    if bytes >= 1_073_741_824 {
        format!("{:.1} GB", bytes as f64 / 1_073_741_824.0)
    } else if bytes >= 1_048_576 {
        format!("{:.1} MB", bytes as f64 / 1_048_576.0)
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn venues(n: usize) -> ResultTable {
        ResultTable::new(
            vec!["name".into(), "capacity".into()],
            (0..n)
                .map(|i| {
                    Row::new(vec![
                        Scalar::Text(format!("Stadium {i}")),
                        Scalar::Integer(50_000 + i as i64),
                    ])
                })
                .collect(),
        )
    }

    #[test]
    fn empty_table_prints_placeholder() {
        let lines = render_table(&ResultTable::default(), TableStyle::default());
        assert_eq!(lines, vec!["No rows found."]);
    }

    #[test]
    fn columns_align_under_headers() {
        let lines = render_table(&venues(2), TableStyle::default());
        assert_eq!(lines[0], "  NAME       CAPACITY");
        assert_eq!(lines[1], "  -------------------");
        assert_eq!(lines[2], "  Stadium 0  50000");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn row_limit_adds_summary_line() {
        let style = TableStyle {
            max_rows: 2,
            ..Default::default()
        };
        let lines = render_table(&venues(5), style);
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[4], "  ... 3 more rows");
    }

    #[test]
    fn long_cells_are_truncated() {
        assert_eq!(truncate("Mercedes-Benz Stadium", 10), "Mercede...");
        assert_eq!(truncate("Rose Bowl", 10), "Rose Bowl");
    }

    #[test]
    fn null_renders_blank() {
        let table = ResultTable::new(
            vec!["roof_type".into()],
            vec![Row::new(vec![Scalar::Null])],
        );
        let lines = render_table(&table, TableStyle::default());
        assert_eq!(lines[2], "  ");
    }

    #[test]
    fn bytes_are_humanized() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1_048_576), "3.0 MB");
    }
}
