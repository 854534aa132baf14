//! Validation reports.
//!
//! The two validation passes append diagnostics here instead of failing.
//! A game with diagnostics still loads; callers check `Game::is_safe`.

/// Which pass produced a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// The game lacks something a rule needs (a piece, a track).
    MissingRequirement,
    /// A rule would misbehave at runtime.
    WillCrash,
}

/// One finding of a validation pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Kind of node that reported it.
    pub node: &'static str,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.node, self.message)
    }
}

/// Collected diagnostics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Report {
    diagnostics: Vec<Diagnostic>,
}

impl Report {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic. Each one is also logged at `warn`.
    pub fn push(&mut self, kind: DiagnosticKind, node: &'static str, message: impl Into<String>) {
        let diagnostic = Diagnostic {
            kind,
            node,
            message: message.into(),
        };
        log::warn!("{kind:?} in {diagnostic}");
        self.diagnostics.push(diagnostic);
    }

    pub fn missing(&mut self, node: &'static str, message: impl Into<String>) {
        self.push(DiagnosticKind::MissingRequirement, node, message);
    }

    pub fn crash(&mut self, node: &'static str, message: impl Into<String>) {
        self.push(DiagnosticKind::WillCrash, node, message);
    }

    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    #[must_use]
    pub fn has(&self, kind: DiagnosticKind) -> bool {
        self.diagnostics.iter().any(|d| d.kind == kind)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_collects() {
        let mut report = Report::new();
        assert!(report.is_empty());
        report.missing("Sow", "no track to sow along");
        report.crash("Random", "no branch has positive probability");
        assert_eq!(report.len(), 2);
        assert!(report.has(DiagnosticKind::WillCrash));
        assert_eq!(report.diagnostics()[0].to_string(), "Sow: no track to sow along");
    }
}
