/// Diagnostic records produced by the pipeline stages
use std::fmt;

/// How serious a finding is. Neither level stops output generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Where in the model a finding applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Locator {
    Model,
    Solid { solid: usize },
    Facet { solid: usize, facet: usize },
    /// Byte offset into a binary source.
    Offset(u64),
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Model => write!(f, "model"),
            Locator::Solid { solid } => write!(f, "solid {solid}"),
            Locator::Facet { solid, facet } => write!(f, "solid {solid}, facet {facet}"),
            Locator::Offset(offset) => write!(f, "byte {offset}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    DegenerateFacet,
    NormalCorrected,
    NameMismatch,
    UnnamedSolid,
    TrailingData,
    Repositioned,
    SolidsMerged,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub locator: Locator,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(kind: DiagnosticKind, locator: Locator, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            kind,
            locator,
            message: message.into(),
        }
    }

    pub fn error(kind: DiagnosticKind, locator: Locator, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            kind,
            locator,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}: {}", self.severity, self.locator, self.message)
    }
}

/// Warning and error counts of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiagnosticSummary {
    pub warnings: usize,
    pub errors: usize,
}

impl DiagnosticSummary {
    pub fn from_diagnostics(diagnostics: &[Diagnostic]) -> Self {
        diagnostics
            .iter()
            .fold(Self::default(), |mut summary, d| {
                match d.severity {
                    Severity::Warning => summary.warnings += 1,
                    Severity::Error => summary.errors += 1,
                }
                summary
            })
    }

    pub fn is_clean(&self) -> bool {
        self.warnings == 0 && self.errors == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let d = Diagnostic::warning(
            DiagnosticKind::NormalCorrected,
            Locator::Facet { solid: 0, facet: 3 },
            "normal corrected",
        );
        assert_eq!(d.to_string(), "warning at solid 0, facet 3: normal corrected");
    }

    #[test]
    fn test_summary_counts() {
        let diagnostics = vec![
            Diagnostic::warning(DiagnosticKind::TrailingData, Locator::Offset(84), "x"),
            Diagnostic::error(
                DiagnosticKind::DegenerateFacet,
                Locator::Facet { solid: 0, facet: 0 },
                "y",
            ),
            Diagnostic::warning(DiagnosticKind::NameMismatch, Locator::Solid { solid: 0 }, "z"),
        ];
        let summary = DiagnosticSummary::from_diagnostics(&diagnostics);
        assert_eq!(summary, DiagnosticSummary { warnings: 2, errors: 1 });
        assert!(!summary.is_clean());
        assert!(DiagnosticSummary::default().is_clean());
    }
}
