//! Translation errors and diagnostic reporting
//!
//! Two kinds of failure exist. [`TranslateError`] aborts the whole batch and
//! travels up through `Result`. Everything else is a recoverable diagnostic
//! collected by the [`Reporter`]: the offending node degrades locally and
//! translation continues.

use crate::error_codes::{error_registry, format_error_code};
use diagnostics::{Diagnostic, DiagnosticBuilder, Diagnostics, Origin};
use log::warn;
use std::cell::RefCell;
use std::fmt;

/// Fatal translation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslateError {
    /// A method base name contains the mangling separator.
    SeparatorInName { class: String, name: String },
    DuplicateClass { name: String },
    /// The chain starts and ends at the same class.
    CyclicInheritance { chain: Vec<String> },
    /// A compilation unit is not shaped like one.
    MalformedInput { file: String, message: String },
    Config(String),
}

impl TranslateError {
    pub fn code(&self) -> Option<u16> {
        use crate::error_codes::*;
        match self {
            TranslateError::SeparatorInName { .. } => Some(SEPARATOR_IN_NAME),
            TranslateError::DuplicateClass { .. } => Some(DUPLICATE_CLASS),
            TranslateError::CyclicInheritance { .. } => Some(CYCLIC_INHERITANCE),
            TranslateError::MalformedInput { .. } | TranslateError::Config(_) => None,
        }
    }

    /// Convert to a diagnostic for uniform display.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let origin = match self {
            TranslateError::SeparatorInName { class, name } => {
                Origin::default().with_class(class).with_member(name)
            }
            TranslateError::DuplicateClass { name } => Origin::default().with_class(name),
            TranslateError::CyclicInheritance { chain } => chain
                .first()
                .map(|class| Origin::default().with_class(class))
                .unwrap_or_default(),
            TranslateError::MalformedInput { file, .. } => Origin::file(file),
            TranslateError::Config(_) => Origin::unknown(),
        };
        let mut builder = DiagnosticBuilder::error(self.to_string(), origin);
        if let Some(code) = self.code() {
            builder = builder.code(format_error_code(code));
            if let Some(help) = error_registry().get(code).and_then(|c| c.help) {
                builder = builder.help(help);
            }
        }
        builder.build()
    }
}

impl fmt::Display for TranslateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranslateError::SeparatorInName { class, name } => {
                write!(f, "'$' is not allowed in method names: {} in {}", name, class)
            }
            TranslateError::DuplicateClass { name } => {
                write!(f, "class {} is declared more than once", name)
            }
            TranslateError::CyclicInheritance { chain } => {
                write!(f, "cyclic inheritance: {}", chain.join(" -> "))
            }
            TranslateError::MalformedInput { file, message } => {
                write!(f, "malformed input in {}: {}", file, message)
            }
            TranslateError::Config(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for TranslateError {}

pub type TranslateResult<T> = Result<T, TranslateError>;

/// Collects recoverable diagnostics for one translation run.
///
/// Resolution runs behind shared references, so the collection and the
/// current origin live in `RefCell`s.
#[derive(Debug, Default)]
pub struct Reporter {
    diagnostics: RefCell<Diagnostics>,
    origin: RefCell<Origin>,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_file(&self, file: &str) {
        *self.origin.borrow_mut() = Origin::file(file);
    }

    pub fn set_class(&self, class: Option<&str>) {
        let mut origin = self.origin.borrow_mut();
        origin.class = class.map(str::to_string);
        origin.member = None;
    }

    pub fn set_member(&self, member: Option<&str>) {
        self.origin.borrow_mut().member = member.map(str::to_string);
    }

    pub fn origin(&self) -> Origin {
        self.origin.borrow().clone()
    }

    /// Report a registered code with a specific message.
    ///
    /// Severity and help text come from the registry entry.
    pub fn report(&self, code: u16, message: impl Into<String>) {
        let message = message.into();
        let origin = self.origin();
        warn!("{} ({}): {}", format_error_code(code), origin, message);

        let entry = error_registry().get(code);
        let mut builder = match entry {
            Some(entry) if entry.is_warning => DiagnosticBuilder::warning(message, origin),
            _ => DiagnosticBuilder::error(message, origin),
        };
        builder = builder.code(format_error_code(code));
        if let Some(help) = entry.and_then(|e| e.help) {
            builder = builder.help(help);
        }
        self.diagnostics.borrow_mut().push(builder.build());
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.borrow().has_errors()
    }

    pub fn count(&self, code: u16) -> usize {
        let code = format_error_code(code);
        self.diagnostics.borrow().with_code(&code).count()
    }

    pub fn snapshot(&self) -> Diagnostics {
        self.diagnostics.borrow().clone()
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_codes::{NULL_CHECK_DEPTH, UNRESOLVED_TYPE};
    use diagnostics::DiagnosticSeverity;

    #[test]
    fn test_reporter_uses_registry_severity() {
        let reporter = Reporter::new();
        reporter.set_file("A.java");
        reporter.set_class(Some("p.A"));
        reporter.report(UNRESOLVED_TYPE, "unknown class Foo");
        reporter.report(NULL_CHECK_DEPTH, "too deep");

        let diags = reporter.into_diagnostics();
        assert_eq!(diags.len(), 2);
        assert_eq!(diags.diagnostics[0].severity, DiagnosticSeverity::Error);
        assert_eq!(diags.diagnostics[0].code.as_deref(), Some("E1002"));
        assert_eq!(diags.diagnostics[0].origin.class.as_deref(), Some("p.A"));
        assert_eq!(diags.diagnostics[1].severity, DiagnosticSeverity::Warning);
    }

    #[test]
    fn test_set_class_clears_member() {
        let reporter = Reporter::new();
        reporter.set_class(Some("A"));
        reporter.set_member(Some("run$void"));
        reporter.set_class(Some("B"));
        assert_eq!(reporter.origin().member, None);
    }

    #[test]
    fn test_fatal_error_display() {
        let err = TranslateError::CyclicInheritance {
            chain: vec!["A".into(), "B".into(), "A".into()],
        };
        assert_eq!(err.to_string(), "cyclic inheritance: A -> B -> A");
        let diag = err.to_diagnostic();
        assert_eq!(diag.code.as_deref(), Some("E2003"));
        assert_eq!(diag.origin.class.as_deref(), Some("A"));
    }
}
