//! Component / type / entry tree of scraped summaries

use super::stat::SummaryStat;
use std::collections::BTreeMap;

/// Summary page a node was scraped from, with its totals
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryEntry {
    pub report_file: String,
    pub stat: SummaryStat,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryNode {
    pub name: String,
    pub entry: Option<SummaryEntry>,
    children: BTreeMap<String, SummaryNode>,
}

impl SummaryNode {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Children in name order
    pub fn children(&self) -> impl Iterator<Item = &SummaryNode> {
        self.children.values()
    }

    pub fn child(&self, name: &str) -> Option<&SummaryNode> {
        self.children.get(name)
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Whether this node or anything below it was scraped
    pub fn has_entries(&self) -> bool {
        self.entry.is_some() || self.children().any(SummaryNode::has_entries)
    }

    /// Own stat plus everything below
    pub fn total(&self) -> SummaryStat {
        let own = self.entry.as_ref().map(|e| e.stat).unwrap_or_default();
        own + self.children().map(SummaryNode::total).sum::<SummaryStat>()
    }
}

/// Tree keyed by slash-delimited names such as `agents/unix/conf`
#[derive(Debug, Clone, Default)]
pub struct SummaryTree {
    root: SummaryNode,
}

impl SummaryTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// File `stat` under `name`. Adding the same name twice sums the stats
    /// and keeps the first report file.
    pub fn add(&mut self, name: &str, report_file: &str, stat: SummaryStat) {
        let mut node = &mut self.root;
        for part in name.split('/').filter(|p| !p.is_empty()) {
            node = node
                .children
                .entry(part.to_string())
                .or_insert_with(|| SummaryNode::new(part));
        }
        match &mut node.entry {
            Some(entry) => entry.stat += stat,
            None => {
                node.entry = Some(SummaryEntry {
                    report_file: report_file.to_string(),
                    stat,
                })
            }
        }
    }

    pub fn root(&self) -> &SummaryNode {
        &self.root
    }

    pub fn is_empty(&self) -> bool {
        !self.root.has_entries()
    }

    pub fn total(&self) -> SummaryStat {
        self.root.total()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stat(files: u64, lines: u64, executed: u64) -> SummaryStat {
        SummaryStat {
            files,
            lines_total: lines,
            lines_executed: executed,
            ..SummaryStat::default()
        }
    }

    fn names(node: &SummaryNode) -> Vec<&str> {
        node.children().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_children_sorted_regardless_of_insert_order() {
        let mut tree = SummaryTree::new();
        tree.add("lib/unit/zeta", "z.html", stat(1, 1, 1));
        tree.add("agents/unix/conf", "c.html", stat(1, 1, 1));
        tree.add("lib/unit/alpha", "a.html", stat(1, 1, 1));
        tree.add("lib/api/beta", "b.html", stat(1, 1, 1));

        assert_eq!(names(tree.root()), vec!["agents", "lib"]);
        let lib = tree.root().child("lib").unwrap();
        assert_eq!(names(lib), vec!["api", "unit"]);
        assert_eq!(names(lib.child("unit").unwrap()), vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_entry_on_leaf_only() {
        let mut tree = SummaryTree::new();
        tree.add("agents/unix/conf", "conf.html", stat(2, 10, 5));

        let agents = tree.root().child("agents").unwrap();
        assert!(agents.entry.is_none());
        let conf = agents.child("unix").unwrap().child("conf").unwrap();
        assert_eq!(conf.entry.as_ref().unwrap().report_file, "conf.html");
        assert!(agents.has_entries());
    }

    #[test]
    fn test_totals_roll_up() {
        let mut tree = SummaryTree::new();
        tree.add("agents/unix/conf", "a", stat(2, 10, 5));
        tree.add("agents/unix/rpc", "b", stat(1, 4, 4));
        tree.add("agents", "c", stat(1, 1, 0));
        tree.add("lib/tapi/job", "d", stat(3, 6, 3));

        let agents = tree.root().child("agents").unwrap();
        assert_eq!(agents.total(), stat(4, 15, 9));
        assert_eq!(tree.total(), stat(7, 21, 12));
    }

    #[test]
    fn test_duplicate_names_accumulate() {
        let mut tree = SummaryTree::new();
        tree.add("a/b/c", "first.html", stat(1, 2, 1));
        tree.add("a//b/c/", "second.html", stat(1, 2, 2));
        let node = tree.root().child("a").unwrap().child("b").unwrap().child("c").unwrap();
        let entry = node.entry.as_ref().unwrap();
        assert_eq!(entry.report_file, "first.html");
        assert_eq!(entry.stat, stat(2, 4, 3));
    }

    #[test]
    fn test_empty_tree() {
        let tree = SummaryTree::new();
        assert!(tree.is_empty());
        assert_eq!(tree.total(), SummaryStat::default());
    }
}
