//! systemd unit-file text manipulation.
//!
//! Pure string-in, string-out helpers: extract the launch path from an
//! ExecStart line, rewrite that line in place, or render a fresh unit from
//! the fixed template. No filesystem access here.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

#[allow(clippy::expect_used)] // pattern is a compile-time constant
fn exec_start_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^(\s*ExecStart\s*=\s*)(\S*)").expect("valid regex"))
}

/// Extract the launch path from the first ExecStart line.
///
/// Returns `None` when no ExecStart line exists or its value is empty.
/// Arguments after the launch path are ignored. Extraction is best-effort:
/// malformed content simply yields `None`, which callers treat as a path
/// mismatch rather than an error.
#[must_use]
pub fn extract_exec_start(unit_text: &str) -> Option<String> {
    let caps = exec_start_re().captures(unit_text)?;
    let path = caps.get(2).map(|m| m.as_str())?;
    if path.is_empty() {
        None
    } else {
        Some(path.to_string())
    }
}

/// Whether the text contains an ExecStart line at all (even an empty one).
#[must_use]
pub fn has_exec_start(unit_text: &str) -> bool {
    exec_start_re().is_match(unit_text)
}

/// Rewrite the launch path on the first ExecStart line, leaving every other
/// byte of the file unchanged. Arguments after the path are preserved.
///
/// Callers must check [`has_exec_start`] first; text without an ExecStart
/// line is returned unchanged.
#[must_use]
pub fn rewrite_exec_start(unit_text: &str, binary: &Path) -> String {
    exec_start_re()
        .replacen(unit_text, 1, |caps: &regex::Captures<'_>| {
            format!("{}{}", &caps[1], binary.display())
        })
        .into_owned()
}

/// Render a fresh unit for the agent: restart-always, unlimited resource
/// limits, ordered after network availability.
#[must_use]
pub fn render_unit(binary: &Path) -> String {
    format!(
        "[Unit]\n\
         Description=Kubernetes node agent\n\
         After=network-online.target\n\
         Wants=network-online.target\n\
         \n\
         [Service]\n\
         Type=exec\n\
         ExecStart={}\n\
         Restart=always\n\
         RestartSec=5\n\
         LimitNOFILE=infinity\n\
         LimitNPROC=infinity\n\
         \n\
         [Install]\n\
         WantedBy=multi-user.target\n",
        binary.display()
    )
}

// ── Unit tests ────────────────────────────────────────────────────────────────
