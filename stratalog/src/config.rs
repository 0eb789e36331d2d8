//! Translator configuration.

use std::path::PathBuf;

/// Configuration consumed by the translator. Passed explicitly; there is
/// no global configuration state.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory input `.facts` files are read from.
    pub fact_dir: PathBuf,
    /// Directory `.csv`/`.facts` outputs and engine-staged files go to.
    pub output_dir: PathBuf,
    /// Whether a communication engine is configured; enables the
    /// external-predecessor load/store/drop phases.
    pub engine: bool,
    /// Whether provenance is enabled; emits subproof subroutines and
    /// suppresses dropping of intermediate relations.
    pub provenance: bool,
    /// Whether profiling is enabled; wraps the program in a timer labeled
    /// `runtime`.
    pub profile: bool,
    /// Where to write the debug report after translation, if anywhere.
    pub debug_report: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fact_dir: PathBuf::from("."),
            output_dir: PathBuf::from("."),
            engine: false,
            provenance: false,
            profile: false,
            debug_report: None,
        }
    }
}
