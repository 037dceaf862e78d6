//! Approval, threshold, validation and backup behavior

use std::fs;

use meshcore_enum_sync::approval::{AutoApprover, Decision, ScriptedApprover};
use meshcore_enum_sync::sync::{SyncOptions, SyncOutcome, SyncPipeline};
use meshcore_enum_sync::validate::{Diagnostics, PassthroughValidator, SyntaxValidator};
use meshcore_enum_sync::{SyncConfig, SyncError};

use crate::common::{SyncFixture, PACKETS_PY, PROTOCOL_FRAME};

const SMALL_FRAME: &str =
    "public enum ResponseCode: UInt8, Sendable {\n    case ok = 0\n}\n\npublic enum PushCode: UInt8, Sendable {\n    case advert = 0x80\n}\n";

fn apply() -> SyncOptions {
    SyncOptions {
        dry_run: false,
        skip_backup: false,
        max_additions: 50,
    }
}

/// `PacketType` with `OK = 0` plus `count` new response codes
fn bulk_fixture(count: i64) -> SyncFixture {
    let fixture = SyncFixture::new();
    let names: Vec<String> = (0..count).map(|i| format!("CODE_{}", i + 10)).collect();
    let mut members: Vec<(&str, i64)> = vec![("OK", 0)];
    members.extend(names.iter().enumerate().map(|(i, n)| (n.as_str(), i as i64 + 10)));
    fixture.add_packet_type(&members).write_target(SMALL_FRAME);
    fixture
}

fn standard_fixture() -> SyncFixture {
    let fixture = SyncFixture::new();
    fixture
        .add_source("src/meshcore/packets.py", PACKETS_PY)
        .write_target(PROTOCOL_FRAME);
    fixture
}

struct FailingValidator;

impl SyntaxValidator for FailingValidator {
    fn validate(&self, _text: &str) -> Result<String, Diagnostics> {
        Err(Diagnostics::new(
            "ProtocolFrame.swift:3:5: error: expected declaration",
        ))
    }
}

// ============================================================================
// SAFETY THRESHOLD
// ============================================================================

#[test]
fn test_threshold_reject_aborts_without_mutation() {
    let fixture = bulk_fixture(60);
    let config = SyncConfig::default();
    // whole change set, ResponseCode, then the threshold question
    let mut approver = ScriptedApprover::new(
        [Decision::Approve, Decision::Approve, Decision::Reject],
        Decision::Reject,
    );

    let run = SyncPipeline::new(&config, &mut approver, &PassthroughValidator)
        .run(&fixture.source_dir(), "2.1.0", &fixture.target_path(), &apply())
        .unwrap();

    assert_eq!(
        run.outcome,
        SyncOutcome::ThresholdAborted {
            total: 60,
            limit: 50
        }
    );
    assert_eq!(approver.asked, 3);
    assert_eq!(fixture.read_target(), SMALL_FRAME);
    assert!(fixture.backups().is_empty());
}

#[test]
fn test_threshold_confirmation_applies() {
    let fixture = bulk_fixture(60);
    let config = SyncConfig::default();
    let mut approver = ScriptedApprover::new([], Decision::Approve);

    let run = SyncPipeline::new(&config, &mut approver, &PassthroughValidator)
        .run(&fixture.source_dir(), "2.1.0", &fixture.target_path(), &apply())
        .unwrap();

    assert!(matches!(run.outcome, SyncOutcome::Applied { added: 60, .. }));
    assert!(fixture.read_target().contains("case code69 = 69"));
}

#[test]
fn test_threshold_not_asked_at_limit() {
    let fixture = bulk_fixture(50);
    let config = SyncConfig::default();
    let mut approver = ScriptedApprover::new([Decision::Approve, Decision::Approve], Decision::Reject);

    let run = SyncPipeline::new(&config, &mut approver, &PassthroughValidator)
        .run(&fixture.source_dir(), "2.1.0", &fixture.target_path(), &apply())
        .unwrap();

    assert!(matches!(run.outcome, SyncOutcome::Applied { added: 50, .. }));
    assert_eq!(approver.asked, 2);
}

#[test]
fn test_auto_approve_bypasses_threshold() {
    let fixture = bulk_fixture(60);
    let config = SyncConfig::default();
    let mut approver = AutoApprover;
    let mut options = apply();
    options.max_additions = 5;

    let run = SyncPipeline::new(&config, &mut approver, &PassthroughValidator)
        .run(&fixture.source_dir(), "2.1.0", &fixture.target_path(), &options)
        .unwrap();

    assert!(matches!(run.outcome, SyncOutcome::Applied { added: 60, .. }));
}

// ============================================================================
// APPROVAL
// ============================================================================

#[test]
fn test_declined_change_set_leaves_file() {
    let fixture = standard_fixture();
    let config = SyncConfig::default();
    let mut approver = ScriptedApprover::new([Decision::Reject], Decision::Approve);

    let run = SyncPipeline::new(&config, &mut approver, &PassthroughValidator)
        .run(&fixture.source_dir(), "2.1.0", &fixture.target_path(), &apply())
        .unwrap();

    assert_eq!(run.outcome, SyncOutcome::Declined);
    assert_eq!(approver.asked, 1);
    assert_eq!(fixture.read_target(), PROTOCOL_FRAME);
}

#[test]
fn test_group_abort_discards_earlier_groups() {
    let fixture = standard_fixture();
    let config = SyncConfig::default();
    // change set, ResponseCode approved, PushCode aborted
    let mut approver = ScriptedApprover::new(
        [Decision::Approve, Decision::Approve, Decision::Reject],
        Decision::Approve,
    );

    let run = SyncPipeline::new(&config, &mut approver, &PassthroughValidator)
        .run(&fixture.source_dir(), "2.1.0", &fixture.target_path(), &apply())
        .unwrap();

    assert_eq!(run.outcome, SyncOutcome::Declined);
    assert_eq!(fixture.read_target(), PROTOCOL_FRAME);
    assert!(fixture.backups().is_empty());
}

#[test]
fn test_skipping_every_group_is_declined() {
    let fixture = standard_fixture();
    let config = SyncConfig::default();
    let mut approver = ScriptedApprover::new([Decision::Approve], Decision::Skip);

    let run = SyncPipeline::new(&config, &mut approver, &PassthroughValidator)
        .run(&fixture.source_dir(), "2.1.0", &fixture.target_path(), &apply())
        .unwrap();

    assert_eq!(run.outcome, SyncOutcome::Declined);
    assert_eq!(fixture.read_target(), PROTOCOL_FRAME);
}

// ============================================================================
// VALIDATION AND BACKUPS
// ============================================================================

#[test]
fn test_validation_failure_is_fatal_and_harmless() {
    let fixture = standard_fixture();
    let config = SyncConfig::default();
    let mut approver = AutoApprover;

    let err = SyncPipeline::new(&config, &mut approver, &FailingValidator)
        .run(&fixture.source_dir(), "2.1.0", &fixture.target_path(), &apply())
        .unwrap_err();

    match err {
        SyncError::ValidationFailed { diagnostics } => {
            assert!(diagnostics.contains("expected declaration"));
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(fixture.read_target(), PROTOCOL_FRAME);
    assert!(fixture.backups().is_empty());
}

#[test]
fn test_backup_holds_original_contents() {
    let fixture = standard_fixture();
    let config = SyncConfig::default();
    let mut approver = AutoApprover;
    let run = SyncPipeline::new(&config, &mut approver, &PassthroughValidator)
        .run(&fixture.source_dir(), "2.1.0", &fixture.target_path(), &apply())
        .unwrap();

    let SyncOutcome::Applied {
        backup: Some(backup),
        ..
    } = run.outcome
    else {
        panic!("expected a backup");
    };
    assert_eq!(fs::read_to_string(&backup).unwrap(), PROTOCOL_FRAME);
    assert!(backup
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("ProtocolFrame.swift.backup."));
    assert_eq!(fixture.backups(), vec![backup]);
}

#[test]
fn test_skip_backup_writes_without_copy() {
    let fixture = standard_fixture();
    let config = SyncConfig::default();
    let mut approver = AutoApprover;
    let mut options = apply();
    options.skip_backup = true;

    let run = SyncPipeline::new(&config, &mut approver, &PassthroughValidator)
        .run(&fixture.source_dir(), "2.1.0", &fixture.target_path(), &options)
        .unwrap();

    assert!(matches!(
        run.outcome,
        SyncOutcome::Applied { backup: None, added: 2, .. }
    ));
    assert!(fixture.backups().is_empty());
    assert_ne!(fixture.read_target(), PROTOCOL_FRAME);
}
