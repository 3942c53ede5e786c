//! Diagnostics raised while translating a program.
//!
//! Input trees carry no source positions, so a [`Diagnostic`] is located by
//! its [`Origin`]: the file, class and member being translated when it was
//! raised. [`ErrorFormatter`] renders diagnostics as compiler-style text.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum DiagnosticSeverity {
    Error,
    Warning,
}

impl DiagnosticSeverity {
    fn label(self) -> &'static str {
        match self {
            DiagnosticSeverity::Error => "error",
            DiagnosticSeverity::Warning => "warning",
        }
    }
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The declaration under translation when a diagnostic was raised.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Origin {
    pub file: Option<String>,
    pub class: Option<String>,
    pub member: Option<String>,
}

impl Origin {
    pub fn unknown() -> Self {
        Self::default()
    }

    pub fn file(file: impl Into<String>) -> Self {
        Self {
            file: Some(file.into()),
            ..Self::default()
        }
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn with_member(mut self, member: impl Into<String>) -> Self {
        self.member = Some(member.into());
        self
    }

    pub fn is_unknown(&self) -> bool {
        *self == Self::default()
    }
}

/// `File.java: pkg.Class::member$tags`, omitting the parts that are unset.
impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            return f.write_str("<unknown>");
        }
        let declaration = match (&self.class, &self.member) {
            (Some(class), Some(member)) => format!("{}::{}", class, member),
            (Some(class), None) => class.clone(),
            (None, Some(member)) => member.clone(),
            (None, None) => String::new(),
        };
        match (&self.file, declaration.is_empty()) {
            (Some(file), true) => f.write_str(file),
            (Some(file), false) => write!(f, "{}: {}", file, declaration),
            (None, _) => f.write_str(&declaration),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    /// Registered code such as `E1002`.
    pub code: Option<String>,
    pub message: String,
    pub origin: Origin,
    pub notes: Vec<String>,
    pub help: Vec<String>,
}

impl Diagnostic {
    fn headline(&self) -> String {
        match &self.code {
            Some(code) => format!("{}[{}]", self.severity, code),
            None => self.severity.to_string(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.headline(), self.message)
    }
}

/// Diagnostics of one run, in report order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    pub diagnostics: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    fn of_severity(&self, severity: DiagnosticSeverity) -> impl Iterator<Item = &Diagnostic> {
        self.iter().filter(move |d| d.severity == severity)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.of_severity(DiagnosticSeverity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.of_severity(DiagnosticSeverity::Warning)
    }

    pub fn with_code<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.iter().filter(move |d| d.code.as_deref() == Some(code))
    }
}

pub struct DiagnosticBuilder {
    diagnostic: Diagnostic,
}

impl DiagnosticBuilder {
    fn new(severity: DiagnosticSeverity, message: impl Into<String>, origin: Origin) -> Self {
        Self {
            diagnostic: Diagnostic {
                severity,
                code: None,
                message: message.into(),
                origin,
                notes: Vec::new(),
                help: Vec::new(),
            },
        }
    }

    pub fn error(message: impl Into<String>, origin: Origin) -> Self {
        Self::new(DiagnosticSeverity::Error, message, origin)
    }

    pub fn warning(message: impl Into<String>, origin: Origin) -> Self {
        Self::new(DiagnosticSeverity::Warning, message, origin)
    }

    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.diagnostic.code = Some(code.into());
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.diagnostic.notes.push(note.into());
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.diagnostic.help.push(help.into());
        self
    }

    pub fn build(self) -> Diagnostic {
        self.diagnostic
    }
}

const RESET: &str = "\x1b[0m";

/// Renders diagnostics as text, optionally with ANSI colors.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorFormatter {
    use_colors: bool,
}

impl ErrorFormatter {
    pub fn new() -> Self {
        Self { use_colors: false }
    }

    pub fn with_colors() -> Self {
        Self { use_colors: true }
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.use_colors {
            format!("{}{}{}", color, text, RESET)
        } else {
            text.to_string()
        }
    }

    /// Diagnostics separated by blank lines.
    pub fn format_diagnostics(&self, diagnostics: &Diagnostics) -> String {
        diagnostics
            .iter()
            .map(|d| self.format_diagnostic(d))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn format_diagnostic(&self, diagnostic: &Diagnostic) -> String {
        let color = match diagnostic.severity {
            DiagnosticSeverity::Error => "\x1b[31m",
            DiagnosticSeverity::Warning => "\x1b[33m",
        };
        let mut out = format!(
            "{}: {}\n",
            self.paint(color, &diagnostic.headline()),
            self.paint("\x1b[1;97m", &diagnostic.message)
        );
        if !diagnostic.origin.is_unknown() {
            out += &format!("  {} {}\n", self.paint("\x1b[96m", "-->"), diagnostic.origin);
        }
        for help in &diagnostic.help {
            out += &format!("     {}: {}\n", self.paint("\x1b[32m", "help"), help);
        }
        for note in &diagnostic.notes {
            out += &format!("{}: {}\n", self.paint("\x1b[34m", "note"), note);
        }
        out
    }
}
