//! Translator configuration
//!
//! All fields have defaults, so an empty `jcpp.toml` (or none at all) gives
//! the standard behavior:
//!
//! ```toml
//! runtime-namespace = "__rt"
//! runtime-header = "java_lang.h"
//! output-header = "output.h"
//! null-checks = true
//! max-null-check-depth = 64
//! indent-width = 2
//! emit-entry-point = true
//! runtime-classes = ["Object", "String", "Class", "System", "Math"]
//! ```

use crate::error::TranslateError;
use serde::Deserialize;
use std::path::Path;

/// Classes of the implicit runtime package that exist without a declaration.
pub const DEFAULT_RUNTIME_CLASSES: &[&str] = &[
    "Object",
    "String",
    "Class",
    "System",
    "Math",
    "PrintStream",
    "Throwable",
    "Exception",
    "RuntimeException",
    "ClassCastException",
    "NullPointerException",
    "ArrayIndexOutOfBoundsException",
];

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TranslatorConfig {
    /// Namespace of the hand-written runtime support library
    pub runtime_namespace: String,
    /// Header the emitted header includes first
    pub runtime_header: String,
    /// Name under which the emitted source includes the emitted header
    pub output_header: String,
    /// Runtime classes known without a declaration, all in `java.lang`
    pub runtime_classes: Vec<String>,
    /// Emit `checkNotNull` guards before dereferences
    pub null_checks: bool,
    /// Recursion bound for null-check collection
    pub max_null_check_depth: usize,
    /// Spaces per indent level in emitted text
    pub indent_width: usize,
    /// Emit an `int main` wrapper for `public static void main(String[])`
    pub emit_entry_point: bool,
    /// Color diagnostics when formatting them for a terminal
    pub use_colors: bool,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            runtime_namespace: "__rt".to_string(),
            runtime_header: "java_lang.h".to_string(),
            output_header: "output.h".to_string(),
            runtime_classes: DEFAULT_RUNTIME_CLASSES
                .iter()
                .map(|name| name.to_string())
                .collect(),
            null_checks: true,
            max_null_check_depth: 64,
            indent_width: 2,
            emit_entry_point: true,
            use_colors: false,
        }
    }
}

impl TranslatorConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, TranslateError> {
        let mut config: TranslatorConfig = toml::from_str(content)
            .map_err(|e| TranslateError::Config(format!("failed to parse configuration: {}", e)))?;
        config.normalize();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, TranslateError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            TranslateError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// The root class must always be known to the runtime.
    fn normalize(&mut self) {
        if !self.runtime_classes.iter().any(|name| name == "Object") {
            self.runtime_classes.insert(0, "Object".to_string());
        }
        if self.indent_width == 0 {
            self.indent_width = 2;
        }
    }

    /// `ns::name` for a runtime support symbol.
    pub fn rt(&self, name: &str) -> String {
        format!("{}::{}", self.runtime_namespace, name)
    }
}
