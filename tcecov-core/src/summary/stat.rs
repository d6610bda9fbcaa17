//! Line and branch totals of a set of files

use serde::Serialize;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SummaryStat {
    pub files: u64,
    pub lines_total: u64,
    pub lines_executed: u64,
    pub branches_total: u64,
    pub branches_executed: u64,
}

impl SummaryStat {
    pub fn line_percent(&self) -> String {
        format_percent(self.lines_executed, self.lines_total)
    }

    pub fn branch_percent(&self) -> String {
        format_percent(self.branches_executed, self.branches_total)
    }
}

impl AddAssign for SummaryStat {
    fn add_assign(&mut self, other: Self) {
        self.files += other.files;
        self.lines_total += other.lines_total;
        self.lines_executed += other.lines_executed;
        self.branches_total += other.branches_total;
        self.branches_executed += other.branches_executed;
    }
}

impl Add for SummaryStat {
    type Output = Self;

    fn add(mut self, other: Self) -> Self {
        self += other;
        self
    }
}

impl Sum for SummaryStat {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

/// `executed` out of `total` with two decimals; nothing to cover counts as fully covered
pub fn format_percent(executed: u64, total: u64) -> String {
    if total == 0 {
        return "100.00%".to_string();
    }
    format!("{:.2}%", executed as f64 * 100.0 / total as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(0, 0), "100.00%");
        assert_eq!(format_percent(5, 0), "100.00%");
        assert_eq!(format_percent(8, 8), "100.00%");
        assert_eq!(format_percent(7, 8), "87.50%");
        assert_eq!(format_percent(1, 3), "33.33%");
        assert_eq!(format_percent(2, 3), "66.67%");
        assert_eq!(format_percent(0, 12), "0.00%");
    }

    #[test]
    fn test_sum() {
        let a = SummaryStat {
            files: 1,
            lines_total: 10,
            lines_executed: 5,
            branches_total: 4,
            branches_executed: 1,
        };
        let b = SummaryStat {
            files: 2,
            lines_total: 6,
            lines_executed: 6,
            branches_total: 0,
            branches_executed: 0,
        };
        let total: SummaryStat = [a, b].into_iter().sum();
        assert_eq!(total, b + a);
        assert_eq!(total.files, 3);
        assert_eq!(total.line_percent(), "68.75%");
        assert_eq!(total.branch_percent(), "25.00%");
    }
}
