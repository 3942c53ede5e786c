//! Translation pipeline: trees -> compilation context -> typed bodies -> text
//!
//! The pipeline runs the passes in a fixed order:
//! 1. Discovery registers every class, hierarchy edge and member signature
//!    across all compilation units
//! 2. Lowering converts each class body into the typed tree, building its
//!    scope chain
//! 3. Code generation resolves every expression on demand and emits one
//!    header and one source file
//!
//! Fatal errors stop the run and come back as `Err`. Everything else is
//! collected into the output's diagnostics.

use log::{debug, error, info};

use crate::codegen::CodeGenerator;
use crate::config::TranslatorConfig;
use crate::error::{Reporter, TranslateError, TranslateResult};
use crate::tast::discovery::Discovery;
use crate::tast::lowering::{ClassUnit, Lowering};
use diagnostics::{Diagnostics, ErrorFormatter};
use std::path::Path;
use tree::Node;

/// One compilation unit as handed over by the front end.
#[derive(Debug, Clone)]
pub struct SourceUnit {
    /// Display name used in diagnostics, usually the source path
    pub name: String,
    /// Root `CompilationUnit` node
    pub tree: Node,
}

impl SourceUnit {
    pub fn new(name: impl Into<String>, tree: Node) -> Self {
        Self {
            name: name.into(),
            tree,
        }
    }

    /// Parse a tree serialized as JSON.
    pub fn from_json(name: impl Into<String>, text: &str) -> TranslateResult<Self> {
        let name = name.into();
        let tree = Node::from_json(text).map_err(|e| TranslateError::MalformedInput {
            file: name.clone(),
            message: e.to_string(),
        })?;
        Ok(Self { name, tree })
    }

    pub fn from_path(path: &Path) -> TranslateResult<Self> {
        let name = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|e| TranslateError::MalformedInput {
            file: name.clone(),
            message: e.to_string(),
        })?;
        Self::from_json(name, &text)
    }
}

/// Counts gathered over one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationStats {
    pub units: usize,
    pub classes: usize,
    pub constructors: usize,
    pub methods: usize,
}

/// Result of a successful run. Diagnostics may still contain errors.
#[derive(Debug, Clone)]
pub struct TranslationOutput {
    pub header: String,
    pub source: String,
    pub diagnostics: Diagnostics,
    pub stats: TranslationStats,
}

impl TranslationOutput {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }
}

pub struct Translator {
    config: TranslatorConfig,
}

impl Translator {
    pub fn new(config: TranslatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    /// Translate all units of one program together.
    pub fn translate(&self, units: &[SourceUnit]) -> TranslateResult<TranslationOutput> {
        info!("translating {} unit(s)", units.len());
        let reporter = Reporter::new();

        let ctx = Discovery::new(&self.config, &reporter)
            .run(units)
            .map_err(|e| {
                error!("discovery failed: {}", e);
                e
            })?;

        info!("lowering class bodies");
        let lowering = Lowering::new(&ctx, &reporter);
        let lowered: Vec<ClassUnit<'_>> = ctx
            .translated_classes()
            .into_iter()
            .filter_map(|class| lowering.lower_class(class))
            .collect();

        let stats = TranslationStats {
            units: units.len(),
            classes: lowered.len(),
            constructors: lowered.iter().map(|unit| unit.constructors.len()).sum(),
            methods: lowered.iter().map(|unit| unit.methods.len()).sum(),
        };
        debug!("{:?}", stats);

        info!("generating code");
        let code = CodeGenerator::new(&ctx, &self.config, &reporter).generate(&lowered);
        drop(lowered);

        let diagnostics = reporter.into_diagnostics();
        info!(
            "translation finished: {} diagnostic(s), {} error(s)",
            diagnostics.len(),
            diagnostics.errors().count()
        );
        Ok(TranslationOutput {
            header: code.header,
            source: code.source,
            diagnostics,
            stats,
        })
    }

    /// Load every path as a JSON tree and translate them together.
    pub fn translate_paths(&self, paths: &[&Path]) -> TranslateResult<TranslationOutput> {
        let units = paths
            .iter()
            .map(|path| SourceUnit::from_path(path))
            .collect::<TranslateResult<Vec<_>>>()?;
        self.translate(&units)
    }

    fn formatter(&self) -> ErrorFormatter {
        if self.config.use_colors {
            ErrorFormatter::with_colors()
        } else {
            ErrorFormatter::new()
        }
    }

    /// Render diagnostics as text, colored when configured.
    pub fn format_diagnostics(&self, diagnostics: &Diagnostics) -> String {
        self.formatter().format_diagnostics(diagnostics)
    }

    /// Render a fatal error the same way as a diagnostic.
    pub fn format_error(&self, err: &TranslateError) -> String {
        self.formatter().format_diagnostic(&err.to_diagnostic())
    }
}

impl Default for Translator {
    fn default() -> Self {
        Self::new(TranslatorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tree::build::*;

    fn hello() -> SourceUnit {
        let main = method(
            &["public", "static"],
            void_type(),
            "main",
            vec![param(ty("String", 1), "args")],
            Some(block(vec![expr_stmt(call(
                Some(select(ident("System"), "out")),
                "println",
                vec![string_lit("hello")],
            ))])),
        );
        SourceUnit::new(
            "Hello.java",
            compilation_unit(Some("demo"), vec![], vec![class_decl(&["public"], "Hello", None, vec![main])]),
        )
    }

    #[test]
    fn test_translate_hello() {
        let output = Translator::default().translate(&[hello()]).unwrap();
        assert!(!output.has_errors(), "{:?}", output.diagnostics);
        assert_eq!(output.stats.classes, 1);
        assert_eq!(output.stats.methods, 1);
        assert!(output.header.contains("typedef __Hello* Hello;"));
        assert!(output.source.contains("std::cout << \"hello\" << std::endl;"));
        assert!(output.source.contains("demo::__Hello::main$StringArray(__rt::args(argc, argv));"));
    }

    #[test]
    fn test_entry_point_can_be_disabled() {
        let config = TranslatorConfig {
            emit_entry_point: false,
            ..TranslatorConfig::default()
        };
        let output = Translator::new(config).translate(&[hello()]).unwrap();
        assert!(!output.source.contains("int main"));
    }

    #[test]
    fn test_malformed_json() {
        let err = SourceUnit::from_json("broken.json", "{ not json").unwrap_err();
        assert!(matches!(err, TranslateError::MalformedInput { .. }));
    }

    #[test]
    fn test_duplicate_class_is_fatal() {
        let unit = hello();
        let translator = Translator::default();
        let err = translator.translate(&[unit.clone(), unit]).unwrap_err();
        assert!(matches!(err, TranslateError::DuplicateClass { .. }));
        assert!(translator.format_error(&err).starts_with("error[E2002]: class demo.Hello"));
    }

    #[test]
    fn test_json_round_trip_translates() {
        let text = hello().tree.to_json().unwrap();
        let unit = SourceUnit::from_json("Hello.json", &text).unwrap();
        let output = Translator::default().translate(&[unit]).unwrap();
        assert!(output.header.contains("struct __Hello {"));
    }
}
