//! Application context — unified state passed to every command handler.

use crate::output::OutputContext;

/// Unified application context passed to every command handler.
///
/// Constructed once in `Cli::run()` from the global flags.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// When `true`, emit machine-readable JSON instead of human output.
    pub json: bool,
    /// When `true`, skip interactive prompts.
    ///
    /// Set when `--yes` / `-y` is passed, or when the `CI` environment
    /// variable is present.
    pub non_interactive: bool,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    #[must_use]
    pub fn new(no_color: bool, quiet: bool, json: bool, yes: bool) -> Self {
        let non_interactive = yes || std::env::var("CI").is_ok();
        Self {
            output: OutputContext::new(no_color, quiet),
            json,
            non_interactive,
        }
    }
}
