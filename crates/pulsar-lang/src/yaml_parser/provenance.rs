// ---------------------------------------------------------------------------
// LineScanner — best-effort source-line attribution
// ---------------------------------------------------------------------------
//
// serde_yaml reports locations only for errors, so line provenance for
// successfully parsed nodes is recovered by a forward scan over the source
// text. Rules, conditions, and actions appear in document order in the
// deserialized structures, so a monotone cursor that looks for the next
// matching key line is exact for block-style documents and degrades to the
// nearest preceding line for flow-style one-liners.

pub(super) struct LineScanner<'a> {
    lines: Vec<&'a str>,
    cursor: usize,
}

impl<'a> LineScanner<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().collect(),
            cursor: 0,
        }
    }

    /// 1-based line of the next `key: value` entry at or after the cursor,
    /// advancing the cursor past it. Falls back to the current cursor line
    /// when no match exists (malformed hand-attribution never fails a parse).
    pub fn find_entry(&mut self, key: &str, value: &str) -> u32 {
        for (idx, line) in self.lines.iter().enumerate().skip(self.cursor) {
            if let Some(v) = entry_value(line, key)
                && (value.is_empty() || unquote(v) == value)
            {
                self.cursor = idx + 1;
                return (idx + 1) as u32;
            }
        }
        self.cursor.min(self.lines.len()).max(1) as u32
    }

    /// 1-based line of the next line containing `needle` at or after the
    /// cursor, advancing past it.
    pub fn find_containing(&mut self, needle: &str) -> u32 {
        for (idx, line) in self.lines.iter().enumerate().skip(self.cursor) {
            if line.contains(needle) {
                self.cursor = idx + 1;
                return (idx + 1) as u32;
            }
        }
        self.cursor.min(self.lines.len()).max(1) as u32
    }
}

/// Extract the value of a `key: value` line, ignoring leading `- ` markers
/// and indentation.
fn entry_value<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let trimmed = line.trim_start().trim_start_matches("- ").trim_start();
    let rest = trimmed.strip_prefix(key)?;
    let rest = rest.strip_prefix(':')?;
    Some(rest.trim())
}

fn unquote(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| s.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
        .unwrap_or(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "\
schema_version: 1
rules:
  - name: first
    conditions:
      all:
        - condition:
            type: comparison
  - name: second
    conditions:
      all:
        - condition:
            type: expression
";

    #[test]
    fn finds_rule_names_in_order() {
        let mut scanner = LineScanner::new(DOC);
        assert_eq!(scanner.find_entry("name", "first"), 3);
        assert_eq!(scanner.find_entry("name", "second"), 8);
    }

    #[test]
    fn cursor_is_monotone_over_types() {
        let mut scanner = LineScanner::new(DOC);
        scanner.find_entry("name", "first");
        assert_eq!(scanner.find_entry("type", "comparison"), 7);
        scanner.find_entry("name", "second");
        assert_eq!(scanner.find_entry("type", "expression"), 12);
    }

    #[test]
    fn missing_match_falls_back_without_panicking() {
        let mut scanner = LineScanner::new(DOC);
        let line = scanner.find_entry("name", "absent");
        assert!(line >= 1);
    }

    #[test]
    fn unquotes_values() {
        let mut scanner = LineScanner::new("name: \"quoted\"\n");
        assert_eq!(scanner.find_entry("name", "quoted"), 1);
    }
}
