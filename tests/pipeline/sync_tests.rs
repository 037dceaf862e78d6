//! End-to-end sync behavior against a fixture workspace

use meshcore_enum_sync::approval::{AutoApprover, Decision, ScriptedApprover};
use meshcore_enum_sync::merge::SplicePath;
use meshcore_enum_sync::sync::{SyncOptions, SyncOutcome, SyncPipeline};
use meshcore_enum_sync::target::parse_sync_marker;
use meshcore_enum_sync::validate::PassthroughValidator;
use meshcore_enum_sync::{SyncConfig, TargetGroup};

use crate::common::{assert_group, assert_non_case_lines_kept, SyncFixture, PACKETS_PY, PROTOCOL_FRAME};

fn apply() -> SyncOptions {
    SyncOptions {
        dry_run: false,
        skip_backup: false,
        max_additions: 50,
    }
}

fn run_auto(fixture: &SyncFixture, config: &SyncConfig, options: &SyncOptions) -> SyncOutcome {
    let mut approver = AutoApprover;
    SyncPipeline::new(config, &mut approver, &PassthroughValidator)
        .run(&fixture.source_dir(), "2.1.0", &fixture.target_path(), options)
        .expect("sync failed")
        .outcome
}

// ============================================================================
// ROUND TRIP
// ============================================================================

#[test]
fn test_new_case_is_added_and_extras_are_kept() {
    let fixture = SyncFixture::new();
    fixture.add_packet_type(&[("A", 1), ("B", 2)]).write_target(
        "public enum CommandCode: UInt8, Sendable {\n    case appStart = 1\n}\n\n\
         public enum ResponseCode: UInt8, Sendable {\n    case a = 1,\n    case c = 3\n}\n\n\
         public enum PushCode: UInt8, Sendable {\n    case advert = 0x80\n}\n",
    );

    let outcome = run_auto(&fixture, &SyncConfig::default(), &apply());
    assert!(matches!(outcome, SyncOutcome::Applied { added: 1, .. }));

    let text = fixture.read_target();
    assert_group(&text, TargetGroup::Response, &[("a", 1), ("b", 2), ("c", 3)]);
    assert_group(&text, TargetGroup::Command, &[("appStart", 1)]);
    assert_group(&text, TargetGroup::Push, &[("advert", 0x80)]);
    assert!(text.contains("case b = 2, // Python: B (packets.py v2.1.0)"));
}

#[test]
fn test_sync_is_idempotent() {
    let fixture = SyncFixture::new();
    fixture
        .add_source("src/meshcore/packets.py", PACKETS_PY)
        .write_target(PROTOCOL_FRAME);
    let config = SyncConfig::default();

    let first = run_auto(&fixture, &config, &apply());
    assert!(matches!(first, SyncOutcome::Applied { added: 2, .. }));
    let after_first = fixture.read_target();

    let second = run_auto(&fixture, &config, &apply());
    assert_eq!(second, SyncOutcome::InSync);
    assert_eq!(fixture.read_target(), after_first);
    assert_eq!(fixture.backups().len(), 1);
}

#[test]
fn test_marker_records_version() {
    let fixture = SyncFixture::new();
    fixture
        .add_source("src/meshcore/packets.py", PACKETS_PY)
        .write_target(PROTOCOL_FRAME);

    run_auto(&fixture, &SyncConfig::default(), &apply());

    let marker = parse_sync_marker(&fixture.read_target()).expect("marker written");
    assert_eq!(marker.label, "MeshCore_py");
    assert_eq!(marker.version, "2.1.0");
    assert_eq!(marker.date.len(), "2025-01-01".len());
}

#[test]
fn test_existing_cases_keep_their_text() {
    let fixture = SyncFixture::new();
    fixture
        .add_source("src/meshcore/packets.py", PACKETS_PY)
        .write_target(PROTOCOL_FRAME);

    run_auto(&fixture, &SyncConfig::default(), &apply());

    let text = fixture.read_target();
    assert!(text.contains("    case sendTxtMsg = 2 // text message\n"));
    assert!(text.contains("/// Commands sent to the device\n"));
    assert_group(
        &text,
        TargetGroup::Response,
        &[("ok", 0), ("error", 1), ("contactStart", 2)],
    );
    assert_group(
        &text,
        TargetGroup::Push,
        &[("advertisement", 0x80), ("pathUpdate", 0x81)],
    );
}

// ============================================================================
// HAND-WRITTEN BLOCK CONTENT
// ============================================================================

const ANNOTATED_RESPONSES: &str = "public enum ResponseCode: UInt8, Sendable {
    // Contact responses
    case ok = 0,
    case legacy
    case a = 1, b = 2
    case err = 5
}
";

const ANNOTATED_PUSHES: &str = "public enum PushCode: UInt8, Sendable {
    /// Unsolicited frames
    case advert = 0x80, // first push
    // Routing
    case pathUpdated = 0x81
    case rawData

    var isAdvert: Bool {
        self == .advert
    }
}
";

#[test]
fn test_structural_merge_keeps_comments_and_unparsed_cases() {
    let fixture = SyncFixture::new();
    fixture
        .add_packet_type(&[("OK", 0), ("NEW_ONE", 9)])
        .write_target(ANNOTATED_RESPONSES);

    let outcome = run_auto(&fixture, &SyncConfig::default(), &apply());
    let SyncOutcome::Applied { added, groups, .. } = outcome else {
        panic!("expected an applied outcome");
    };
    assert_eq!(added, 1);
    assert_eq!(groups, vec![(TargetGroup::Response, SplicePath::Structural)]);

    let text = fixture.read_target();
    assert_non_case_lines_kept(ANNOTATED_RESPONSES, &text);
    assert!(text.contains(
        "    // Contact responses\n    case ok = 0,\n    case legacy\n    case a = 1, b = 2\n    case err = 5,\n    case newOne = 9 // Python: NEW_ONE (packets.py v2.1.0)\n}\n"
    ));
}

#[test]
fn test_line_scan_merge_keeps_comments_and_unparsed_cases() {
    let fixture = SyncFixture::new();
    fixture
        .add_packet_type(&[("ADVERT", 0x80), ("LOG_DATA", 0x88)])
        .write_target(ANNOTATED_PUSHES);

    let outcome = run_auto(&fixture, &SyncConfig::default(), &apply());
    let SyncOutcome::Applied { added, groups, .. } = outcome else {
        panic!("expected an applied outcome");
    };
    assert_eq!(added, 1);
    assert_eq!(groups, vec![(TargetGroup::Push, SplicePath::LineScan)]);

    let text = fixture.read_target();
    assert_non_case_lines_kept(ANNOTATED_PUSHES, &text);
    assert!(text.contains("    case advert = 0x80, // first push\n    // Routing\n    case pathUpdated = 0x81,\n    case logData = 0x88 // Python: LOG_DATA (packets.py v2.1.0)\n    case rawData\n"));
    assert_group(
        &text,
        TargetGroup::Push,
        &[("advert", 0x80), ("pathUpdated", 0x81), ("logData", 0x88)],
    );
}

// ============================================================================
// COLLISIONS AND UPDATES
// ============================================================================

#[test]
fn test_value_collision_is_reported_not_added() {
    let fixture = SyncFixture::new();
    fixture.add_packet_type(&[("OK", 0), ("X", 5)]).write_target(
        "public enum ResponseCode: UInt8, Sendable {\n    case ok = 0,\n    case y = 5\n}\n",
    );
    let before = fixture.read_target();

    let mut approver = ScriptedApprover::new([], Decision::Approve);
    let config = SyncConfig::default();
    let run = SyncPipeline::new(&config, &mut approver, &PassthroughValidator)
        .run(&fixture.source_dir(), "2.1.0", &fixture.target_path(), &apply())
        .unwrap();

    assert_eq!(run.outcome, SyncOutcome::InSync);
    assert_eq!(run.report.totals.duplicates, 1);
    assert_eq!(run.report.totals.additions, 0);
    assert_eq!(fixture.read_target(), before);
    assert!(fixture.backups().is_empty());
}

#[test]
fn test_value_changes_are_never_applied() {
    let fixture = SyncFixture::new();
    fixture.add_packet_type(&[("OK", 0), ("ERROR", 7)]).write_target(
        "public enum ResponseCode: UInt8, Sendable {\n    case ok = 0,\n    case error = 1\n}\n",
    );
    let before = fixture.read_target();

    let mut approver = AutoApprover;
    let config = SyncConfig::default();
    let run = SyncPipeline::new(&config, &mut approver, &PassthroughValidator)
        .run(&fixture.source_dir(), "2.1.0", &fixture.target_path(), &apply())
        .unwrap();

    assert_eq!(run.outcome, SyncOutcome::InSync);
    assert_eq!(run.report.totals.updates, 1);
    assert_eq!(fixture.read_target(), before);
}

// ============================================================================
// MISSING BLOCKS
// ============================================================================

#[test]
fn test_missing_block_is_created() {
    let fixture = SyncFixture::new();
    fixture.add_packet_type(&[("OK", 0), ("ADVERT", 0x80)]).write_target(
        "public enum ResponseCode: UInt8, Sendable {\n    case ok = 0\n}\n",
    );

    let outcome = run_auto(&fixture, &SyncConfig::default(), &apply());
    let SyncOutcome::Applied { groups, .. } = outcome else {
        panic!("expected an applied outcome");
    };
    assert_eq!(groups, vec![(TargetGroup::Push, SplicePath::Created)]);

    let text = fixture.read_target();
    assert!(text.contains("public enum PushCode: UInt8, Sendable {\n"));
    assert_group(&text, TargetGroup::Push, &[("advert", 0x80)]);
}

#[test]
fn test_missing_block_without_creation_fails_cleanly() {
    let fixture = SyncFixture::new();
    fixture.add_packet_type(&[("OK", 0), ("ADVERT", 0x80)]).write_target(
        "public enum ResponseCode: UInt8, Sendable {\n    case ok = 0\n}\n",
    );
    let before = fixture.read_target();

    let mut config = SyncConfig::default();
    config.target.create_missing_blocks = false;
    let mut approver = AutoApprover;
    let err = SyncPipeline::new(&config, &mut approver, &PassthroughValidator)
        .run(&fixture.source_dir(), "2.1.0", &fixture.target_path(), &apply())
        .unwrap_err();

    assert!(err.to_string().contains("PushCode"), "{}", err);
    assert_eq!(fixture.read_target(), before);
}

// ============================================================================
// CROSS-SOURCE DEDUPLICATION
// ============================================================================

#[test]
fn test_all_enums_config_merges_every_definition() {
    let fixture = SyncFixture::new();
    fixture
        .add_source("src/meshcore/packets.py", PACKETS_PY)
        .add_source(
            "src/meshcore/events.py",
            "from enum import IntEnum\n\nclass ResponseType(IntEnum):\n    OK = 0\n    BATTERY = 12\n",
        )
        .write_target(PROTOCOL_FRAME);

    let mut config = SyncConfig::default();
    config.extraction.retained_enums.clear();
    let mut approver = AutoApprover;
    let run = SyncPipeline::new(&config, &mut approver, &PassthroughValidator)
        .run(&fixture.source_dir(), "2.1.0", &fixture.target_path(), &apply())
        .unwrap();

    assert!(matches!(run.outcome, SyncOutcome::Applied { added: 3, .. }));
    assert_group(
        &fixture.read_target(),
        TargetGroup::Response,
        &[("ok", 0), ("error", 1), ("contactStart", 2), ("battery", 12)],
    );
}
