//! Tests for the `sync` CLI command

use meshcore_enum_sync::TargetGroup;

use crate::common::{
    assert_contains, assert_group, assert_json_type, assert_valid_json, SyncFixture, PACKETS_PY,
    PROTOCOL_FRAME,
};

fn fixture() -> SyncFixture {
    let fixture = SyncFixture::new();
    fixture
        .add_source("src/meshcore/packets.py", PACKETS_PY)
        .write_target(PROTOCOL_FRAME);
    fixture
}

// ============================================================================
// DRY RUN
// ============================================================================

#[test]
fn test_sync_defaults_to_dry_run() {
    let fixture = fixture();
    let output = fixture.run_cli_success(&[
        "sync",
        "--protocol-frame",
        "ProtocolFrame.swift",
        "--source-dir",
        "meshcore_py-2.1.0",
    ]);

    assert_contains(&output, "contactStart");
    assert_contains(&output, "Dry run");
    assert_eq!(fixture.read_target(), PROTOCOL_FRAME);
    assert!(fixture.backups().is_empty());
}

#[test]
fn test_sync_dry_run_json() {
    let fixture = fixture();
    let output = fixture.run_cli_success(&[
        "sync",
        "--protocol-frame",
        "ProtocolFrame.swift",
        "--source-dir",
        "meshcore_py-2.1.0",
        "-f",
        "json",
    ]);

    let json = assert_valid_json(&output, "sync dry run");
    assert_json_type(&json, "sync");
    assert_eq!(json["outcome"]["status"], "dry_run");
    assert_eq!(json["report"]["upstream_version"], "2.1.0");
    assert_eq!(json["report"]["totals"]["additions"], 2);
}

#[test]
fn test_source_version_overrides_directory_name() {
    let fixture = fixture();
    let output = fixture.run_cli_success(&[
        "sync",
        "--protocol-frame",
        "ProtocolFrame.swift",
        "--source-dir",
        "meshcore_py-2.1.0",
        "--source-version",
        "9.9.9",
        "-f",
        "json",
    ]);

    let json = assert_valid_json(&output, "sync with explicit version");
    assert_eq!(json["report"]["upstream_version"], "9.9.9");
}

// ============================================================================
// APPLY
// ============================================================================

#[test]
fn test_sync_apply_auto_approve() {
    let fixture = fixture();
    let output = fixture.run_cli_success(&[
        "sync",
        "--protocol-frame",
        "ProtocolFrame.swift",
        "--source-dir",
        "meshcore_py-2.1.0",
        "--apply",
        "--auto-approve",
        "--skip-validation",
    ]);

    assert_contains(&output, "2 cases added");
    let text = fixture.read_target();
    assert!(text.starts_with("// Synced to MeshCore_py v2.1.0 on "));
    assert_group(
        &text,
        TargetGroup::Response,
        &[("ok", 0), ("error", 1), ("contactStart", 2)],
    );
    assert_eq!(fixture.backups().len(), 1);

    let again = fixture.run_cli_success(&[
        "sync",
        "--protocol-frame",
        "ProtocolFrame.swift",
        "--source-dir",
        "meshcore_py-2.1.0",
        "--apply",
        "--auto-approve",
        "--skip-validation",
    ]);
    assert_contains(&again, "already in sync");
    assert_eq!(fixture.read_target(), text);
}

#[test]
fn test_sync_force_skips_backup() {
    let fixture = fixture();
    fixture.run_cli_success(&[
        "sync",
        "--protocol-frame",
        "ProtocolFrame.swift",
        "--source-dir",
        "meshcore_py-2.1.0",
        "--apply",
        "--auto-approve",
        "--force",
        "--skip-validation",
        "-f",
        "json",
    ]);

    assert!(fixture.backups().is_empty());
    assert_ne!(fixture.read_target(), PROTOCOL_FRAME);
}

#[test]
fn test_config_limit_does_not_stop_auto_approve() {
    let fixture = fixture();
    fixture.write_config("[safety]\nmax_additions = 1\n");
    let output = fixture.run_cli_success(&[
        "sync",
        "--protocol-frame",
        "ProtocolFrame.swift",
        "--source-dir",
        "meshcore_py-2.1.0",
        "--apply",
        "--auto-approve",
        "--skip-validation",
        "-f",
        "json",
    ]);

    let json = assert_valid_json(&output, "sync applied");
    assert_eq!(json["outcome"]["status"], "applied");
    assert_eq!(json["outcome"]["added"], 2);
}

// ============================================================================
// ERRORS
// ============================================================================

#[test]
fn test_auto_approve_requires_apply() {
    let fixture = fixture();
    let output = fixture
        .run_cli(&[
            "sync",
            "--protocol-frame",
            "ProtocolFrame.swift",
            "--source-dir",
            "meshcore_py-2.1.0",
            "--auto-approve",
        ])
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert_contains(&String::from_utf8_lossy(&output.stderr), "--auto-approve requires --apply");
    assert_eq!(fixture.read_target(), PROTOCOL_FRAME);
}

#[test]
fn test_force_requires_apply() {
    let fixture = fixture();
    let (_, stderr) = fixture.run_cli_failure(&[
        "sync",
        "--protocol-frame",
        "ProtocolFrame.swift",
        "--source-dir",
        "meshcore_py-2.1.0",
        "--force",
    ]);
    assert_contains(&stderr, "--force requires --apply");
}

#[test]
fn test_dry_run_conflicts_with_apply() {
    let fixture = fixture();
    let (_, stderr) = fixture.run_cli_failure(&[
        "sync",
        "--protocol-frame",
        "ProtocolFrame.swift",
        "--source-dir",
        "meshcore_py-2.1.0",
        "--dry-run",
        "--apply",
    ]);
    assert_contains(&stderr, "--dry-run and --apply cannot be used together");
    assert_eq!(fixture.read_target(), PROTOCOL_FRAME);
}

#[test]
fn test_missing_target_exits_with_error() {
    let fixture = fixture();
    let output = fixture
        .run_cli(&[
            "sync",
            "--protocol-frame",
            "Missing.swift",
            "--source-dir",
            "meshcore_py-2.1.0",
        ])
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert_contains(&String::from_utf8_lossy(&output.stderr), "Target file not found");
}

#[test]
fn test_invalid_config_exits_with_error() {
    let fixture = fixture();
    fixture.write_config("[safety]\nmax_additions = \"many\"\n");
    let (_, stderr) = fixture.run_cli_failure(&[
        "sync",
        "--protocol-frame",
        "ProtocolFrame.swift",
        "--source-dir",
        "meshcore_py-2.1.0",
    ]);
    assert_contains(&stderr, "Configuration error");
}
