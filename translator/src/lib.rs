pub mod config;
pub mod error;
pub mod error_codes;
pub mod logging;
pub mod tast;
pub mod codegen;
pub mod pipeline;

pub use config::TranslatorConfig;
pub use error::{Reporter, TranslateError, TranslateResult};
pub use pipeline::{SourceUnit, TranslationOutput, TranslationStats, Translator};
