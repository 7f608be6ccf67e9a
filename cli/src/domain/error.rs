//! Typed domain error enums.
//!
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator. Messages carry the remediation hint shown to the
//! operator; the first fatal condition aborts the whole run.

use std::path::PathBuf;

use thiserror::Error;

// ── Precondition errors ───────────────────────────────────────────────────────

/// Conditions detected before any mutation is attempted.
#[derive(Debug, Error)]
pub enum PreconditionError {
    #[error("nodemend must run as root. Re-run with sudo.")]
    NotPrivileged,

    #[error("Control plane address must not be empty.")]
    EmptyServerAddress,

    #[error(
        "Agent binary not found at {0}. Place the agent next to the nodemend \
         executable or set binary_path in the config file."
    )]
    AgentBinaryMissing(PathBuf),
}

// ── Connectivity errors ───────────────────────────────────────────────────────

/// Failures reaching the control plane over the network.
#[derive(Debug, Error)]
pub enum ConnectivityError {
    #[error("Control plane {addr} is unreachable. Check the address and the node's network link.")]
    ControlPlaneUnreachable { addr: String },

    #[error(
        "Fetching the join token from {addr} failed: {detail}\n\
         Copy the token onto this node manually, then re-run nodemend."
    )]
    TokenFetchFailed { addr: String, detail: String },

    #[error(
        "Join token fetched from {addr} was empty.\n\
         Copy the token onto this node manually, then re-run nodemend."
    )]
    TokenEmpty { addr: String },
}

// ── Service lifecycle errors ──────────────────────────────────────────────────

/// Failures in the agent service lifecycle after reconciliation.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Failed to start {unit}: {detail}")]
    StartFailed { unit: String, detail: String },

    #[error("{unit} did not reach active state after restart (state: {state}). See the log excerpt above.")]
    NotActiveAfterRestart { unit: String, state: String },
}
