//! Log setup for the translator.
//!
//! All output goes through the `log` facade; these helpers install an
//! `env_logger` backend. Levels are used as follows:
//!
//! - `error!` fatal translation errors
//! - `warn!` every reported diagnostic
//! - `info!` pass boundaries
//! - `debug!` per class and per member
//! - `trace!` expression types and overload candidates
//!
//! `RUST_LOG` filters by module as usual, e.g.
//! `RUST_LOG=translator::tast::overload=trace`. [`init_pass`] does the same
//! for one pass without touching the environment.

use env_logger::Builder;
use log::LevelFilter;
use std::io::Write;
use std::sync::Once;

static INIT: Once = Once::new();

/// A translator pass whose log target can be selected on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    Discovery,
    Lowering,
    Resolution,
    Overload,
    NullCheck,
    Emission,
}

impl Pass {
    /// Module path the pass logs under.
    pub fn target(self) -> &'static str {
        match self {
            Pass::Discovery => "translator::tast::discovery",
            Pass::Lowering => "translator::tast::lowering",
            Pass::Resolution => "translator::tast::type_resolution",
            Pass::Overload => "translator::tast::overload",
            Pass::NullCheck => "translator::tast::null_check",
            Pass::Emission => "translator::codegen",
        }
    }
}

fn builder(level: LevelFilter) -> Builder {
    let mut builder = Builder::new();
    builder.filter_level(level).format(|buf, record| {
        writeln!(
            buf,
            "[{:5} {}] {}",
            record.level(),
            record.target().trim_start_matches("translator::"),
            record.args()
        )
    });
    builder
}

/// Warnings and errors only. Later calls are no-ops.
pub fn init() {
    init_with_level(LevelFilter::Warn);
}

pub fn init_with_level(level: LevelFilter) {
    INIT.call_once(|| builder(level).init());
}

/// Everything at `warn`, one pass at `level`.
pub fn init_pass(pass: Pass, level: LevelFilter) {
    INIT.call_once(|| {
        builder(LevelFilter::Warn)
            .filter_module(pass.target(), level)
            .init()
    });
}

/// Honor `RUST_LOG`, falling back to `warn`.
pub fn init_from_env() {
    INIT.call_once(|| {
        Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    });
}

/// Captured test output; safe to call from every test.
pub fn init_test() {
    let _ = env_logger::builder()
        .filter_level(LevelFilter::Warn)
        .is_test(true)
        .try_init();
}

pub fn is_initialized() -> bool {
    INIT.is_completed()
}
