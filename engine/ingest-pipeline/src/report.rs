//! End-of-run SUMMARY blocks

use std::fmt;

const RULE: &str = "============================================================";

/// A titled block of `label: value` rows plus optional listings
///
/// Every pipeline returns one; the binary prints it.
#[derive(Debug, Clone, Default)]
pub struct Summary {
    title: String,
    rows: Vec<(String, String)>,
    sections: Vec<(String, Vec<String>)>,
}

impl Summary {
    pub fn new(title: &str) -> Self {
        Self { title: title.to_string(), ..Self::default() }
    }

    pub fn row(mut self, label: &str, value: impl fmt::Display) -> Self {
        self.push_row(label, value);
        self
    }

    pub fn push_row(&mut self, label: &str, value: impl fmt::Display) {
        self.rows.push((label.to_string(), value.to_string()));
    }

    /// Add a listing; empty listings are not rendered
    pub fn section(mut self, heading: &str, lines: Vec<String>) -> Self {
        self.push_section(heading, lines);
        self
    }

    pub fn push_section(&mut self, heading: &str, lines: Vec<String>) {
        if !lines.is_empty() {
            self.sections.push((heading.to_string(), lines));
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Value of a row by label
    pub fn value(&self, label: &str) -> Option<&str> {
        self.rows.iter().find(|(l, _)| l == label).map(|(_, v)| v.as_str())
    }

    /// Value of a row parsed as a count
    pub fn count(&self, label: &str) -> Option<usize> {
        self.value(label).and_then(|v| v.parse().ok())
    }

    pub fn section_lines(&self, heading: &str) -> Option<&[String]> {
        self.sections.iter().find(|(h, _)| h == heading).map(|(_, lines)| lines.as_slice())
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "{RULE}")?;
        writeln!(f, "{}", self.title)?;
        writeln!(f, "{RULE}")?;
        let width = self.rows.iter().map(|(l, _)| l.len()).max().unwrap_or(0);
        for (label, value) in &self.rows {
            writeln!(f, "  {:<width$}  {}", format!("{label}:"), value, width = width + 1)?;
        }
        for (heading, lines) in &self.sections {
            writeln!(f)?;
            writeln!(f, "{heading}:")?;
            for line in lines {
                writeln!(f, "  {line}")?;
            }
        }
        Ok(())
    }
}

/// Keep the first `limit` lines and note how many were cut
pub fn truncated(mut lines: Vec<String>, limit: usize) -> Vec<String> {
    if lines.len() > limit {
        let rest = lines.len() - limit;
        lines.truncate(limit);
        lines.push(format!("... and {rest} more"));
    }
    lines
}

/// Percentage of `part` in `total`, 0 when `total` is 0
pub fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    part as f64 * 100.0 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render() {
        let summary = Summary::new("SUMMARY")
            .row("Matched", 12)
            .row("Unmatched", 3)
            .section("Unmatched players", vec!["Joe Test (WR)".to_string()])
            .section("Empty", vec![]);

        let text = summary.to_string();
        assert!(text.contains("SUMMARY"));
        assert!(text.contains("  Matched:    12"));
        assert!(text.contains("Unmatched players:\n  Joe Test (WR)"));
        assert!(!text.contains("Empty:"));
        assert_eq!(summary.count("Unmatched"), Some(3));
    }

    #[test]
    fn test_truncated() {
        let lines: Vec<String> = (0..5).map(|i| i.to_string()).collect();
        let cut = truncated(lines.clone(), 3);
        assert_eq!(cut, vec!["0", "1", "2", "... and 2 more"]);
        assert_eq!(truncated(lines, 10).len(), 5);
        assert_eq!(percent(1, 0), 0.0);
        assert_eq!(percent(1, 4), 25.0);
    }
}
