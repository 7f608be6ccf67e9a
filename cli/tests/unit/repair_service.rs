//! Unit tests for the `node_repair` application service.
//!
//! Exercises the black-box remediation properties against mocked ports: no
//! real privileges, network, filesystem, or service manager involved.

#![allow(clippy::expect_used)]

use nodemend::application::services::node_repair::run_repair;
use nodemend::domain::error::{ConnectivityError, PreconditionError, ServiceError};

use crate::helpers::test_config;
use crate::mocks::{
    AddressNotExpected, FixedAddress, MemFiles, NoopReporter, PingMock, ServiceMock, TokenMock,
    UidRunner,
};

const ADDR: &str = "10.0.0.5";

const MATCHING_UNIT: &str = "[Unit]\n\
    Description=Kubernetes node agent\n\
    After=network-online.target\n\
    \n\
    [Service]\n\
    ExecStart=/opt/agent/node-agent\n\
    Restart=always\n\
    \n\
    [Install]\n\
    WantedBy=multi-user.target\n";

const MISMATCHED_UNIT: &str = "[Unit]\n\
    Description=Kubernetes node agent\n\
    \n\
    [Service]\n\
    ExecStart=/usr/local/bin/old-agent --log-level info\n\
    Restart=always\n";

/// Filesystem where everything a fully-healthy node needs is in place.
fn healthy_files() -> MemFiles {
    let cfg = test_config();
    MemFiles::new()
        .with_file(cfg.expected_binary.clone(), "\u{7f}ELF")
        .with_file(cfg.unit_path.clone(), MATCHING_UNIT)
        .with_file(cfg.token_path.clone(), "tok-abc123\n")
}

// ── Property 1: privilege check comes first ───────────────────────────────────

#[tokio::test]
async fn test_unprivileged_run_aborts_before_any_other_action() {
    let cfg = test_config();
    let net = PingMock::up();
    let fs = healthy_files();
    let svc = ServiceMock::healthy();
    let tokens = TokenMock::failing();

    let err = run_repair(
        &cfg,
        &AddressNotExpected,
        &UidRunner::unprivileged(),
        &net,
        &tokens,
        &svc,
        &fs,
        &NoopReporter,
    )
    .await
    .expect_err("must fail without privileges");

    let precondition = err
        .downcast_ref::<PreconditionError>()
        .expect("precondition error");
    assert!(matches!(precondition, PreconditionError::NotPrivileged));
    assert_eq!(net.call_count(), 0, "no probe before the privilege check");
    assert_eq!(fs.write_count(), 0);
    assert_eq!(svc.call_total(), 0);
    assert_eq!(tokens.call_count(), 0);
}

// ── Property 2: empty address aborts before the probe ─────────────────────────

#[tokio::test]
async fn test_empty_address_aborts_before_probe() {
    let cfg = test_config();
    let net = PingMock::up();
    let fs = healthy_files();
    let svc = ServiceMock::healthy();

    let err = run_repair(
        &cfg,
        &FixedAddress("   "),
        &UidRunner::root(),
        &net,
        &TokenMock::failing(),
        &svc,
        &fs,
        &NoopReporter,
    )
    .await
    .expect_err("must fail on empty address");

    assert!(matches!(
        err.downcast_ref::<PreconditionError>(),
        Some(PreconditionError::EmptyServerAddress)
    ));
    assert_eq!(net.call_count(), 0);
    assert_eq!(fs.write_count(), 0);
}

// ── Property 3: unreachable control plane mutates nothing ─────────────────────

#[tokio::test]
async fn test_unreachable_control_plane_mutates_nothing() {
    let cfg = test_config();
    let net = PingMock::down();
    let fs = healthy_files();
    let svc = ServiceMock::healthy();

    let err = run_repair(
        &cfg,
        &FixedAddress(ADDR),
        &UidRunner::root(),
        &net,
        &TokenMock::failing(),
        &svc,
        &fs,
        &NoopReporter,
    )
    .await
    .expect_err("must fail when unreachable");

    assert!(matches!(
        err.downcast_ref::<ConnectivityError>(),
        Some(ConnectivityError::ControlPlaneUnreachable { .. })
    ));
    assert_eq!(net.call_count(), 1);
    assert_eq!(fs.write_count(), 0);
    assert!(fs.backups().is_empty());
    assert_eq!(svc.call_total(), 0);
}

// ── Property 4: matching unit left byte-for-byte untouched ────────────────────

#[tokio::test]
async fn test_matching_unit_is_left_untouched() {
    let cfg = test_config();
    let fs = healthy_files();
    let svc = ServiceMock::healthy();

    let report = run_repair(
        &cfg,
        &FixedAddress(ADDR),
        &UidRunner::root(),
        &PingMock::up(),
        &TokenMock::failing(),
        &svc,
        &fs,
        &NoopReporter,
    )
    .await
    .expect("repair should succeed");

    assert!(fs.backups().is_empty(), "no backup when the path matches");
    assert_eq!(
        fs.content(&cfg.unit_path).expect("unit present"),
        MATCHING_UNIT,
        "unit content must be unchanged"
    );
    assert_eq!(svc.count("daemon-reload"), 0);
    assert!(report.service_active);
}

// ── Property 5: mismatched unit backed up and patched ─────────────────────────

#[tokio::test]
async fn test_mismatched_unit_is_backed_up_and_patched() {
    let cfg = test_config();
    let fs = healthy_files().with_file(cfg.unit_path.clone(), MISMATCHED_UNIT);
    let svc = ServiceMock::healthy();

    run_repair(
        &cfg,
        &FixedAddress(ADDR),
        &UidRunner::root(),
        &PingMock::up(),
        &TokenMock::failing(),
        &svc,
        &fs,
        &NoopReporter,
    )
    .await
    .expect("repair should succeed");

    let backups = fs.backups();
    assert_eq!(backups.len(), 1, "exactly one backup");
    assert_eq!(backups[0].1, MISMATCHED_UNIT, "backup holds the original");

    let patched = fs.content(&cfg.unit_path).expect("unit present");
    assert!(patched.contains("ExecStart=/opt/agent/node-agent --log-level info"));
    for (before, after) in MISMATCHED_UNIT.lines().zip(patched.lines()) {
        if !before.trim_start().starts_with("ExecStart=") {
            assert_eq!(before, after, "non-ExecStart lines must be unchanged");
        }
    }
    assert_eq!(svc.count("daemon-reload"), 1);
}

#[tokio::test]
async fn test_missing_unit_is_created_from_template() {
    let cfg = test_config();
    let fs = MemFiles::new()
        .with_file(cfg.expected_binary.clone(), "\u{7f}ELF")
        .with_file(cfg.token_path.clone(), "tok-abc123\n");
    let svc = ServiceMock::healthy();

    run_repair(
        &cfg,
        &FixedAddress(ADDR),
        &UidRunner::root(),
        &PingMock::up(),
        &TokenMock::failing(),
        &svc,
        &fs,
        &NoopReporter,
    )
    .await
    .expect("repair should succeed");

    let created = fs.content(&cfg.unit_path).expect("unit created");
    assert!(created.contains("ExecStart=/opt/agent/node-agent"));
    assert!(created.contains("Restart=always"));
    assert!(created.contains("LimitNOFILE=infinity"));
    assert!(fs.backups().is_empty(), "nothing to back up for a fresh unit");
    assert_eq!(svc.count("daemon-reload"), 1);
}

#[tokio::test]
async fn test_unit_without_exec_start_is_regenerated() {
    let cfg = test_config();
    let fs = healthy_files().with_file(cfg.unit_path.clone(), "[Unit]\nDescription=stale\n");
    let svc = ServiceMock::healthy();

    run_repair(
        &cfg,
        &FixedAddress(ADDR),
        &UidRunner::root(),
        &PingMock::up(),
        &TokenMock::failing(),
        &svc,
        &fs,
        &NoopReporter,
    )
    .await
    .expect("repair should succeed");

    assert_eq!(fs.backups().len(), 1);
    let rewritten = fs.content(&cfg.unit_path).expect("unit present");
    assert!(rewritten.contains("ExecStart=/opt/agent/node-agent"));
    assert!(rewritten.contains("WantedBy=multi-user.target"));
}

// ── Property 6: failed/empty token fetch is fatal and leaves no token ─────────

#[tokio::test]
async fn test_failed_token_fetch_aborts_and_leaves_no_token() {
    let cfg = test_config();
    let fs = MemFiles::new()
        .with_file(cfg.expected_binary.clone(), "\u{7f}ELF")
        .with_file(cfg.unit_path.clone(), MATCHING_UNIT);
    let tokens = TokenMock::failing();

    let err = run_repair(
        &cfg,
        &FixedAddress(ADDR),
        &UidRunner::root(),
        &PingMock::up(),
        &tokens,
        &ServiceMock::healthy(),
        &fs,
        &NoopReporter,
    )
    .await
    .expect_err("must fail when the fetch fails");

    assert!(matches!(
        err.downcast_ref::<ConnectivityError>(),
        Some(ConnectivityError::TokenFetchFailed { .. })
    ));
    assert_eq!(tokens.call_count(), 1);
    assert!(fs.content(&cfg.token_path).is_none(), "token must stay absent");
}

#[tokio::test]
async fn test_empty_token_fetch_aborts_and_leaves_no_token() {
    let cfg = test_config();
    let fs = MemFiles::new()
        .with_file(cfg.expected_binary.clone(), "\u{7f}ELF")
        .with_file(cfg.unit_path.clone(), MATCHING_UNIT);

    let err = run_repair(
        &cfg,
        &FixedAddress(ADDR),
        &UidRunner::root(),
        &PingMock::up(),
        &TokenMock::succeeding("  \n"),
        &ServiceMock::healthy(),
        &fs,
        &NoopReporter,
    )
    .await
    .expect_err("must fail when the fetch comes back empty");

    assert!(matches!(
        err.downcast_ref::<ConnectivityError>(),
        Some(ConnectivityError::TokenEmpty { .. })
    ));
    assert!(fs.content(&cfg.token_path).is_none());
}

#[tokio::test]
async fn test_missing_token_is_fetched_and_stored_as_secret() {
    let cfg = test_config();
    let fs = MemFiles::new()
        .with_file(cfg.expected_binary.clone(), "\u{7f}ELF")
        .with_file(cfg.unit_path.clone(), MATCHING_UNIT);

    run_repair(
        &cfg,
        &FixedAddress(ADDR),
        &UidRunner::root(),
        &PingMock::up(),
        &TokenMock::succeeding("tok-fresh-42\n"),
        &ServiceMock::healthy(),
        &fs,
        &NoopReporter,
    )
    .await
    .expect("repair should succeed");

    assert_eq!(
        fs.content(&cfg.token_path).expect("token written"),
        "tok-fresh-42\n"
    );
    assert_eq!(
        fs.secret_writes(),
        vec![cfg.token_path.clone()],
        "token must be written through the secret path"
    );
}

// ── Property 7: present token skips the remote fetch ──────────────────────────

#[tokio::test]
async fn test_present_token_skips_remote_fetch() {
    let cfg = test_config();
    let fs = healthy_files();
    let tokens = TokenMock::failing();

    run_repair(
        &cfg,
        &FixedAddress(ADDR),
        &UidRunner::root(),
        &PingMock::up(),
        &tokens,
        &ServiceMock::healthy(),
        &fs,
        &NoopReporter,
    )
    .await
    .expect("repair should succeed");

    assert_eq!(tokens.call_count(), 0, "no remote connection when token exists");
}

#[tokio::test]
async fn test_whitespace_only_token_triggers_fetch() {
    let cfg = test_config();
    let fs = healthy_files().with_file(cfg.token_path.clone(), "  \n");
    let tokens = TokenMock::succeeding("tok-new\n");

    run_repair(
        &cfg,
        &FixedAddress(ADDR),
        &UidRunner::root(),
        &PingMock::up(),
        &tokens,
        &ServiceMock::healthy(),
        &fs,
        &NoopReporter,
    )
    .await
    .expect("repair should succeed");

    assert_eq!(tokens.call_count(), 1);
    assert_eq!(fs.content(&cfg.token_path).expect("token"), "tok-new\n");
}

// ── Property 8: restart verification decides the exit ─────────────────────────

#[tokio::test]
async fn test_active_service_after_restart_succeeds() {
    let cfg = test_config();
    let svc = ServiceMock::healthy();

    let report = run_repair(
        &cfg,
        &FixedAddress(ADDR),
        &UidRunner::root(),
        &PingMock::up(),
        &TokenMock::failing(),
        &svc,
        &healthy_files(),
        &NoopReporter,
    )
    .await
    .expect("repair should succeed");

    assert!(report.service_active);
    assert_eq!(svc.count("stop"), 1);
    assert_eq!(svc.count("start"), 1);
    assert_eq!(svc.count("is-active"), 1);
}

#[tokio::test]
async fn test_inactive_service_after_restart_fails_and_dumps_logs() {
    let cfg = test_config();
    let svc = ServiceMock::failing();

    let err = run_repair(
        &cfg,
        &FixedAddress(ADDR),
        &UidRunner::root(),
        &PingMock::up(),
        &TokenMock::failing(),
        &svc,
        &healthy_files(),
        &NoopReporter,
    )
    .await
    .expect_err("must fail when the unit does not come up");

    assert!(matches!(
        err.downcast_ref::<ServiceError>(),
        Some(ServiceError::NotActiveAfterRestart { .. })
    ));
    assert_eq!(svc.count("logs:20"), 1, "failure path dumps the journal tail");
}

#[tokio::test]
async fn test_stop_failure_is_ignored() {
    let cfg = test_config();
    let svc = ServiceMock::healthy().with_failing_stop();

    let report = run_repair(
        &cfg,
        &FixedAddress(ADDR),
        &UidRunner::root(),
        &PingMock::up(),
        &TokenMock::failing(),
        &svc,
        &healthy_files(),
        &NoopReporter,
    )
    .await
    .expect("a failed stop must not abort the repair");

    assert!(report.service_active);
    assert_eq!(svc.count("start"), 1);
}

// ── Missing binary ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_missing_agent_binary_is_fatal_before_any_mutation() {
    let cfg = test_config();
    let fs = MemFiles::new().with_file(cfg.unit_path.clone(), MISMATCHED_UNIT);
    let svc = ServiceMock::healthy();

    let err = run_repair(
        &cfg,
        &FixedAddress(ADDR),
        &UidRunner::root(),
        &PingMock::up(),
        &TokenMock::failing(),
        &svc,
        &fs,
        &NoopReporter,
    )
    .await
    .expect_err("must fail without the agent binary");

    assert!(matches!(
        err.downcast_ref::<PreconditionError>(),
        Some(PreconditionError::AgentBinaryMissing(_))
    ));
    assert_eq!(fs.write_count(), 0);
    assert!(fs.backups().is_empty());
    assert_eq!(svc.call_total(), 0);
}
