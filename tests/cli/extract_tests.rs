//! Tests for the `extract` CLI command

use crate::common::{assert_contains, assert_json_type, assert_valid_json, SyncFixture, PACKETS_PY};

const EVENTS_PY: &str = r#"from enum import Enum


class EventType(Enum):
    CONTACTS = "contacts"
    SELF_INFO = "self_info"


class BinaryReqType(Enum):
    STATUS = 0x01
    TELEMETRY = 0x03
"#;

#[test]
fn test_extract_lists_retained_enum() {
    let fixture = SyncFixture::new();
    fixture
        .add_source("src/meshcore/packets.py", PACKETS_PY)
        .add_source("src/meshcore/events.py", EVENTS_PY);

    let output = fixture.run_cli_success(&["extract", "meshcore_py-2.1.0"]);

    assert_contains(&output, "PacketType (5 cases)");
    assert_contains(&output, "rule: packet-name -> ResponseCode, PushCode");
    assert!(!output.contains("BinaryReqType"));
    assert!(!output.contains("EventType"));
}

#[test]
fn test_extract_json_with_routes() {
    let fixture = SyncFixture::new();
    fixture.add_source("src/meshcore/packets.py", PACKETS_PY);

    let output = fixture.run_cli_success(&["extract", "meshcore_py-2.1.0", "-f", "json"]);
    let json = assert_valid_json(&output, "extract");
    assert_json_type(&json, "extract");

    let enums = json["enums"].as_array().expect("enums array");
    assert_eq!(enums.len(), 1);
    assert_eq!(enums[0]["name"], "PacketType");
    assert_eq!(enums[0]["route"]["rule"], "packet-name");
    assert_eq!(enums[0]["cases"][3]["name"], "advertisement");
    assert_eq!(enums[0]["cases"][3]["value"], 0x80);
    assert_eq!(json["files_scanned"], 1);
}

#[test]
fn test_extract_all_keeps_other_integer_enums() {
    let fixture = SyncFixture::new();
    fixture
        .add_source("src/meshcore/packets.py", PACKETS_PY)
        .add_source(
            "src/meshcore/status.py",
            "from enum import IntEnum\n\nclass StatusCode(IntEnum):\n    IDLE = 0\n    BUSY = 0x90\n",
        );

    let output = fixture.run_cli_success(&["extract", "meshcore_py-2.1.0", "--all"]);
    assert_contains(&output, "PacketType");
    assert_contains(&output, "StatusCode (2 cases)");
    assert_contains(&output, "rule: value-range -> ResponseCode, PushCode");
}

#[test]
fn test_extract_missing_directory_fails() {
    let fixture = SyncFixture::new();
    let (_, stderr) = fixture.run_cli_failure(&["extract", "does-not-exist"]);
    assert_contains(&stderr, "does-not-exist");
}
