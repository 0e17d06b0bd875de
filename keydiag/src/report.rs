//! Report buffer: a flat, append-only list of lines.
//!
//! Hierarchy is expressed with literal leading tabs, nothing is ever
//! reordered or deduplicated, and the final text is the lines joined
//! with newlines.

#[derive(Debug, Default)]
pub struct Report {
    lines: Vec<String>,
}

impl Report {
    pub fn new() -> Self {
        Report::default()
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn extend(&mut self, lines: impl IntoIterator<Item = String>) {
        self.lines.extend(lines);
    }

    pub fn blank(&mut self) {
        self.lines.push(String::new());
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_text(self) -> String {
        self.lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_append_order() {
        let mut report = Report::new();
        report.push("keydiag: 0.3.0");
        report.blank();
        report.extend(vec!["\tfirst".to_string(), "\tsecond".to_string()]);
        assert_eq!(report.lines().len(), 4);
        assert_eq!(report.into_text(), "keydiag: 0.3.0\n\n\tfirst\n\tsecond");
    }

    #[test]
    fn test_empty_report_renders_empty() {
        assert_eq!(Report::new().into_text(), "");
    }
}
