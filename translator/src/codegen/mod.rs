//! Target code generation
//!
//! Emits one header and one source file for the whole program. The header
//! forward-declares every translated class, then lays out each class
//! ancestors first so that vtable initializers can name inherited
//! implementations. The source holds the member definitions and, when the
//! program has one, the `main` wrapper.

pub mod decl;
pub mod expr;
pub mod names;
pub mod printer;
pub mod stmt;

pub use decl::{vtable_layout, ClassEmitter, Slot};
pub use expr::ExprEmitter;
pub use names::Naming;
pub use printer::Printer;
pub use stmt::StmtEmitter;

use crate::config::TranslatorConfig;
use crate::error::Reporter;
use crate::tast::lowering::ClassUnit;
use crate::tast::symbols::CompilationContext;
use crate::tast::type_resolution::Resolver;
use decl::{close_namespace, entry_point, open_namespace};
use indexmap::IndexMap;
use log::{debug, info};

/// Emitted program text.
#[derive(Debug, Clone, Default)]
pub struct GeneratedCode {
    pub header: String,
    pub source: String,
}

pub struct CodeGenerator<'a> {
    ctx: &'a CompilationContext,
    config: &'a TranslatorConfig,
    reporter: &'a Reporter,
    names: Naming<'a>,
}

impl<'a> CodeGenerator<'a> {
    pub fn new(ctx: &'a CompilationContext, config: &'a TranslatorConfig, reporter: &'a Reporter) -> Self {
        Self {
            ctx,
            config,
            reporter,
            names: Naming::new(config),
        }
    }

    /// Emit `units`, which must be ordered ancestors first.
    pub fn generate(&self, units: &[ClassUnit<'_>]) -> GeneratedCode {
        let width = self.config.indent_width;
        let mut header = Printer::new(width);
        let mut source = Printer::new(width);

        self.prologue(units, &mut header, &mut source);

        for unit in units {
            let qualified = unit.qualified_name();
            debug!("emitting {}", qualified);
            self.reporter.set_class(Some(&qualified));

            let resolver = Resolver::new(self.ctx, unit, self.reporter);
            let emitter = ClassEmitter::new(unit, &resolver, &self.names);
            let package = &unit.class.package;

            open_namespace(package, &mut header);
            emitter.declare(&mut header);
            close_namespace(package, &mut header);

            open_namespace(package, &mut source);
            emitter.define(&mut source);
            close_namespace(package, &mut source);
        }
        self.reporter.set_class(None);

        if self.config.emit_entry_point {
            if let Some(class) = self.entry_class(units) {
                info!("entry point: {}", class);
                entry_point(&class, &self.names, &mut source);
            }
        }

        GeneratedCode {
            header: header.finish(),
            source: source.finish(),
        }
    }

    fn prologue(&self, units: &[ClassUnit<'_>], header: &mut Printer, source: &mut Printer) {
        header.line("#pragma once");
        header.newline();
        header.line(&format!("#include \"{}\"", self.config.runtime_header));
        for system in ["cmath", "iostream", "sstream"] {
            header.line(&format!("#include <{}>", system));
        }
        header.newline();

        let mut packages: IndexMap<&str, Vec<&str>> = IndexMap::new();
        for unit in units {
            packages
                .entry(unit.class.package.as_str())
                .or_default()
                .push(unit.class.name.as_str());
        }
        for (package, classes) in packages {
            open_namespace(package, header);
            for class in classes {
                header.line(&format!("struct __{};", class));
                header.line(&format!("struct {};", names::vtable_struct(class)));
                header.line(&format!("typedef __{}* {};", class, class));
                header.newline();
            }
            close_namespace(package, header);
        }

        source.line(&format!("#include \"{}\"", self.config.output_header));
        source.newline();
    }

    /// First class declaring `public static void main(String[])`.
    fn entry_class(&self, units: &[ClassUnit<'_>]) -> Option<String> {
        units
            .iter()
            .find(|unit| unit.class.methods.values().any(|m| m.is_entry_point()))
            .map(ClassUnit::qualified_name)
    }
}
