//! Roll-up report HTML

use super::stat::{format_percent, SummaryStat};
use super::tree::{SummaryNode, SummaryTree};

/// Component, type and name columns
const NAME_COLUMNS: usize = 3;

/// Render the whole tree as one HTML document.
///
/// Nodes with an entry get a row with their name in the column of their
/// depth, linked to their summary page. Every node with scraped entries
/// below it is closed by a `Total` row summing its children; the last row
/// is the grand total.
pub fn render_html(tree: &SummaryTree, title: &str) -> String {
    let title = escape_html(title);
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str(&format!("<title>{}</title>\n", title));
    out.push_str("</head>\n<body>\n");
    out.push_str(&format!("<h1>{}</h1>\n", title));
    out.push_str("<table border>\n");
    out.push_str(
        "<tr><th>Component</th><th>Type</th><th>Name</th>\
         <th>Files</th><th>Lines</th><th>Branches</th></tr>\n",
    );
    render_node(tree.root(), 0, &mut out);
    out.push_str("</table>\n</body>\n</html>\n");
    out
}

fn render_node(node: &SummaryNode, depth: usize, out: &mut String) {
    for child in node.children() {
        if let Some(entry) = &child.entry {
            let mut cells = empty_cells();
            cells[column(depth + 1)] = format!(
                "<a href=\"{}\">{}</a>",
                escape_html(&entry.report_file),
                escape_html(&child.name)
            );
            push_row(out, &cells, &entry.stat, false);
        }
        render_node(child, depth + 1, out);
    }

    if node.children().any(SummaryNode::has_entries) {
        let mut cells = empty_cells();
        if depth == 0 {
            cells[0] = "Total".to_string();
        } else {
            let name = escape_html(&node.name);
            if depth < NAME_COLUMNS {
                cells[column(depth)] = name;
                cells[depth] = "Total".to_string();
            } else {
                cells[NAME_COLUMNS - 1] = format!("{} Total", name);
            }
        }
        let stat = node.children().map(SummaryNode::total).sum::<SummaryStat>();
        push_row(out, &cells, &stat, true);
    }
}

/// Name column for a node at `depth` (1-based); deeper nodes share the last one
fn column(depth: usize) -> usize {
    depth.clamp(1, NAME_COLUMNS) - 1
}

fn empty_cells() -> [String; NAME_COLUMNS] {
    Default::default()
}

fn push_row(out: &mut String, names: &[String; NAME_COLUMNS], stat: &SummaryStat, total: bool) {
    out.push_str(if total { "<tr class=\"total\">" } else { "<tr>" });
    for name in names {
        if total && !name.is_empty() {
            out.push_str(&format!("<td><b>{}</b></td>", name));
        } else {
            out.push_str(&format!("<td>{}</td>", name));
        }
    }
    out.push_str(&format!(
        "<td>{}</td><td>{} of {}</td><td>{} of {}</td></tr>\n",
        stat.files,
        format_percent(stat.lines_executed, stat.lines_total),
        stat.lines_total,
        format_percent(stat.branches_executed, stat.branches_total),
        stat.branches_total
    ));
}

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
