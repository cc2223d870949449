/// Coloured diagnostic and summary output
use std::io::{self, Write};

use crossterm::{
    queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use stlclean_core::{CleanedFile, Diagnostic, Severity};

/// Writes run results to any terminal or buffer.
#[derive(Debug, Clone, Copy)]
pub struct Reporter {
    color: bool,
}

impl Reporter {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn line<W: Write>(&self, out: &mut W, color: Color, text: &str) -> io::Result<()> {
        if self.color {
            queue!(
                out,
                SetForegroundColor(color),
                Print(text),
                ResetColor,
                Print("\n")
            )
        } else {
            queue!(out, Print(text), Print("\n"))
        }
    }

    /// One line per diagnostic, in pipeline order.
    pub fn diagnostics<W: Write>(&self, out: &mut W, diagnostics: &[Diagnostic]) -> io::Result<()> {
        for diagnostic in diagnostics {
            let color = match diagnostic.severity {
                Severity::Warning => Color::Yellow,
                Severity::Error => Color::Red,
            };
            self.line(out, color, &diagnostic.to_string())?;
        }
        Ok(())
    }

    pub fn summary<W: Write>(&self, out: &mut W, cleaned: &CleanedFile) -> io::Result<()> {
        let outcome = &cleaned.outcome;
        let text = format!(
            "wrote {} ({} → {}, {} solid(s), {} facet(s), {} warning(s), {} error(s))",
            cleaned.destination.display(),
            outcome.source_encoding,
            outcome.output_encoding,
            outcome.solid_count,
            outcome.facet_count,
            outcome.summary.warnings,
            outcome.summary.errors,
        );
        let color = if outcome.summary.errors > 0 {
            Color::Red
        } else if !outcome.summary.is_clean() {
            Color::Yellow
        } else {
            Color::Green
        };
        self.line(out, color, &text)
    }
}
