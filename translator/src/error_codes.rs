//! Diagnostic codes reported by the translator.
//!
//! The thousands digit names the phase that raises a code:
//!
//! - E1xxx type model (dimensions, class names)
//! - E2xxx declarations and the class hierarchy
//! - E3xxx scopes and name resolution
//! - E4xxx emission (null checks, unsupported nodes)
//! - E9xxx internal errors
//!
//! A code is reported with warning or error severity as registered here.

use fxhash::FxHashMap;
use std::fmt;

pub const NEGATIVE_DIMENSIONS: u16 = 1001;
pub const UNRESOLVED_TYPE: u16 = 1002;
pub const AMBIGUOUS_TYPE: u16 = 1003;
pub const RECURSIVE_RESOLUTION: u16 = 1004;

pub const SEPARATOR_IN_NAME: u16 = 2001;
pub const DUPLICATE_CLASS: u16 = 2002;
pub const CYCLIC_INHERITANCE: u16 = 2003;
pub const UNKNOWN_SUPERCLASS: u16 = 2004;
pub const DUPLICATE_MEMBER: u16 = 2005;

pub const REDECLARED_VARIABLE: u16 = 3001;
pub const UNRESOLVED_IDENTIFIER: u16 = 3002;
pub const UNRESOLVED_FIELD: u16 = 3003;

pub const NULL_CHECK_DEPTH: u16 = 4001;
pub const UNSUPPORTED_NODE: u16 = 4002;
pub const MISPLACED_DELEGATION: u16 = 4003;

pub const INTERNAL: u16 = 9001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Type,
    Declaration,
    Scope,
    Emission,
    Internal,
}

impl Phase {
    pub fn of(code: u16) -> Phase {
        match code / 1000 {
            1 => Phase::Type,
            2 => Phase::Declaration,
            3 => Phase::Scope,
            4 => Phase::Emission,
            _ => Phase::Internal,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Type => "type",
            Phase::Declaration => "declaration",
            Phase::Scope => "scope",
            Phase::Emission => "emission",
            Phase::Internal => "internal",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode {
    pub code: u16,
    pub description: &'static str,
    /// Shown as a help line under the diagnostic.
    pub help: Option<&'static str>,
    pub is_warning: bool,
}

impl ErrorCode {
    const fn error(code: u16, description: &'static str, help: Option<&'static str>) -> Self {
        Self {
            code,
            description,
            help,
            is_warning: false,
        }
    }

    const fn warning(code: u16, description: &'static str, help: Option<&'static str>) -> Self {
        Self {
            code,
            description,
            help,
            is_warning: true,
        }
    }

    pub fn phase(&self) -> Phase {
        Phase::of(self.code)
    }

    pub fn format_code(&self) -> String {
        format_error_code(self.code)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.format_code(), self.phase(), self.description)
    }
}

const CODES: &[ErrorCode] = &[
    ErrorCode::error(
        NEGATIVE_DIMENSIONS,
        "Negative array dimension count",
        Some("The dimension count is ignored and the element type is used"),
    ),
    ErrorCode::error(
        UNRESOLVED_TYPE,
        "Class type does not resolve to any known declaration",
        Some("Check the package declaration and imports; the type degrades to void"),
    ),
    ErrorCode::warning(
        AMBIGUOUS_TYPE,
        "Class name matches several on-demand imports",
        Some("Import the class by its qualified name"),
    ),
    ErrorCode::error(RECURSIVE_RESOLUTION, "Expression type depends on itself", None),
    ErrorCode::error(
        SEPARATOR_IN_NAME,
        "Method name contains the mangling separator '$'",
        Some("Rename the method; '$' is reserved for mangled names"),
    ),
    ErrorCode::error(DUPLICATE_CLASS, "Class declared more than once", None),
    ErrorCode::error(
        CYCLIC_INHERITANCE,
        "Cyclic inheritance",
        Some("A class cannot be its own ancestor"),
    ),
    ErrorCode::error(
        UNKNOWN_SUPERCLASS,
        "Superclass is not a known class",
        Some("The class is attached to the root class instead"),
    ),
    ErrorCode::error(
        DUPLICATE_MEMBER,
        "Member signature declared more than once",
        Some("The later declaration is ignored"),
    ),
    ErrorCode::error(
        REDECLARED_VARIABLE,
        "Variable already declared in this scope",
        Some("The later declaration is ignored"),
    ),
    ErrorCode::warning(
        UNRESOLVED_IDENTIFIER,
        "Identifier is neither a variable nor a visible class",
        None,
    ),
    ErrorCode::warning(
        UNRESOLVED_FIELD,
        "Selected field is not declared by the base type",
        None,
    ),
    ErrorCode::warning(
        NULL_CHECK_DEPTH,
        "Null-check collection stopped at the depth bound",
        Some("Raise max-null-check-depth in the translator configuration"),
    ),
    ErrorCode::warning(
        UNSUPPORTED_NODE,
        "Node kind is not supported and was skipped",
        None,
    ),
    ErrorCode::warning(
        MISPLACED_DELEGATION,
        "this(...) or super(...) is only honored as the first constructor statement",
        None,
    ),
    ErrorCode::error(
        INTERNAL,
        "Internal translator error",
        Some("An unexpected state was reached; please report it with the input tree"),
    ),
];

pub struct ErrorCodeRegistry {
    codes: FxHashMap<u16, ErrorCode>,
}

impl ErrorCodeRegistry {
    pub fn new() -> Self {
        Self {
            codes: CODES.iter().map(|entry| (entry.code, *entry)).collect(),
        }
    }

    pub fn get(&self, code: u16) -> Option<&ErrorCode> {
        self.codes.get(&code)
    }

    /// Look up a formatted code such as `E1001`.
    pub fn get_by_string(&self, code: &str) -> Option<&ErrorCode> {
        parse_error_code(code).and_then(|code| self.get(code))
    }

    /// Registered codes of one phase, ascending.
    pub fn in_phase(&self, phase: Phase) -> Vec<&ErrorCode> {
        let mut codes: Vec<&ErrorCode> = self
            .codes
            .values()
            .filter(|entry| entry.phase() == phase)
            .collect();
        codes.sort_by_key(|entry| entry.code);
        codes
    }

    pub fn is_valid_code(&self, code: u16) -> bool {
        self.codes.contains_key(&code)
    }
}

impl Default for ErrorCodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

static REGISTRY: std::sync::OnceLock<ErrorCodeRegistry> = std::sync::OnceLock::new();

pub fn error_registry() -> &'static ErrorCodeRegistry {
    REGISTRY.get_or_init(ErrorCodeRegistry::new)
}

pub fn get_error_code(code: u16) -> Option<&'static ErrorCode> {
    error_registry().get(code)
}

/// 1001 -> "E1001"
pub fn format_error_code(code: u16) -> String {
    format!("E{:04}", code)
}

/// "E1001" -> 1001
pub fn parse_error_code(code: &str) -> Option<u16> {
    code.strip_prefix('E')?.parse().ok()
}
