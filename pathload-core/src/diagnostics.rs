//! Structured diagnostics
//!
//! Errors carry a [`Diagnostic`]: a titled table of facts plus an optional
//! suggestion. The `Display` rendering is the human format; the `Serialize`
//! derive is the machine one.

use std::fmt;

use serde::Serialize;

/// An actionable hint attached to a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub text: String,
}

impl Suggestion {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// A titled table of facts about a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub title: String,
    pub summary: String,
    pub rows: Vec<(String, String)>,
    pub suggestion: Option<Suggestion>,
}

impl Diagnostic {
    pub fn new(title: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            summary: summary.into(),
            rows: Vec::new(),
            suggestion: None,
        }
    }

    /// Append a key/value row.
    pub fn row(&mut self, key: impl fmt::Display, value: impl fmt::Display) {
        self.rows.push((key.to_string(), value.to_string()));
    }

    pub fn suggest(&mut self, suggestion: Suggestion) {
        self.suggestion = Some(suggestion);
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner_width = self.title.chars().count() + 2;
        writeln!(f, "┌{}┐", "─".repeat(inner_width))?;
        writeln!(f, "│ {} │", self.title)?;
        writeln!(f, "└{}┘", "─".repeat(inner_width))?;
        writeln!(f)?;
        writeln!(f, "{}", self.summary)?;

        if !self.rows.is_empty() {
            writeln!(f)?;
            let key_width = self
                .rows
                .iter()
                .map(|(k, _)| k.chars().count())
                .max()
                .unwrap_or(0);
            for (key, value) in &self.rows {
                writeln!(f, "{:>width$} │ {}", key, value, width = key_width)?;
            }
        }

        if let Some(suggestion) = &self.suggestion {
            writeln!(f)?;
            writeln!(f, " ╲ {}", suggestion.text)?;
            writeln!(f, " ╱ ")?;
        }

        Ok(())
    }
}
