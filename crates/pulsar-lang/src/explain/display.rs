use std::fmt;

use super::RuleExplanation;

impl fmt::Display for RuleExplanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "rule {} ({})", self.name, self.source)?;
        if let Some(ref description) = self.description {
            writeln!(f, "  {description}")?;
        }
        match self.group {
            Some(group) => writeln!(f, "  layer {}, group {}", self.layer, group)?,
            None => writeln!(f, "  layer {}", self.layer)?,
        }

        writeln!(f, "  when:")?;
        for line in &self.conditions {
            writeln!(f, "    {line}")?;
        }
        writeln!(f, "  then:")?;
        for action in &self.actions {
            writeln!(f, "    {action}")?;
        }

        if !self.temporal.is_empty() {
            writeln!(f, "  temporal windows:")?;
            for window in &self.temporal {
                writeln!(f, "    {window}")?;
            }
        }
        if !self.depends_on.is_empty() {
            writeln!(f, "  depends on: {}", self.depends_on.join(", "))?;
        }
        writeln!(
            f,
            "  reads: {}",
            if self.reads.is_empty() {
                "(none)".to_string()
            } else {
                self.reads.join(", ")
            }
        )?;
        writeln!(
            f,
            "  writes: {}",
            if self.writes.is_empty() {
                "(none)".to_string()
            } else {
                self.writes.join(", ")
            }
        )?;
        writeln!(f)
    }
}
