//! `TerminalReporter` — Presentation-layer implementation of `ProgressReporter`.
//!
//! Wraps `&OutputContext` and implements the `application::ports::ProgressReporter`
//! trait so application services can emit progress events without depending on
//! any presentation type directly. On a TTY, in-progress steps render as an
//! indicatif spinner that keeps ticking through the blocking waits (ping, ssh,
//! service settle delays); the next event replaces it.

use std::cell::RefCell;

use indicatif::ProgressBar;
use owo_colors::OwoColorize as _;

use crate::application::ports::ProgressReporter;
use crate::output::{OutputContext, progress};

/// Terminal progress reporter that wraps an `OutputContext`.
pub struct TerminalReporter<'a> {
    ctx: &'a OutputContext,
    spinner: RefCell<Option<ProgressBar>>,
}

impl<'a> TerminalReporter<'a> {
    /// Create a new `TerminalReporter` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self {
            ctx,
            spinner: RefCell::new(None),
        }
    }

    fn clear_spinner(&self) {
        if let Some(pb) = self.spinner.borrow_mut().take() {
            pb.finish_and_clear();
        }
    }
}

impl ProgressReporter for TerminalReporter<'_> {
    fn stage(&self, number: u8, total: u8, message: &str) {
        self.clear_spinner();
        if !self.ctx.quiet {
            println!();
            println!(
                "  {} {message}",
                format!("[{number}/{total}]").style(self.ctx.styles.header)
            );
        }
    }

    fn step(&self, message: &str) {
        self.clear_spinner();
        if self.ctx.show_progress() {
            *self.spinner.borrow_mut() = Some(progress::spinner(message));
        } else if !self.ctx.quiet {
            println!("  {} {message}", "→".style(self.ctx.styles.info));
        }
    }

    fn info(&self, message: &str) {
        self.clear_spinner();
        self.ctx.info(message);
    }

    fn success(&self, message: &str) {
        self.clear_spinner();
        self.ctx.success(message);
    }

    fn warn(&self, message: &str) {
        self.clear_spinner();
        self.ctx.warn(message);
    }

    fn log_line(&self, line: &str) {
        self.clear_spinner();
        if !self.ctx.quiet {
            println!("    {}", line.style(self.ctx.styles.dim));
        }
    }
}

impl Drop for TerminalReporter<'_> {
    fn drop(&mut self) {
        self.clear_spinner();
    }
}

/// Reporter that swallows every event; used for `--json` runs where stdout
/// must stay machine-readable.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {
    fn stage(&self, _: u8, _: u8, _: &str) {}
    fn step(&self, _: &str) {}
    fn info(&self, _: &str) {}
    fn success(&self, _: &str) {}
    fn warn(&self, _: &str) {}
    fn log_line(&self, _: &str) {}
}
