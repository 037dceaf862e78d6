//! Common test utilities and fixtures for meshcore-enum-sync integration tests
//!
//! This module provides:
//! - `SyncFixture` for building a Python source tree next to a Swift target
//! - Custom assertions for CLI output and target file contents

#![allow(unused_imports)]
#![allow(dead_code)]


pub use assertions::*;
pub use fixture::SyncFixture;

/// Upstream module with one retained enum, spanning both value ranges
pub const PACKETS_PY: &str = r#"from enum import Enum


class PacketType(Enum):
    OK = 0
    ERROR = 1
    CONTACT_START = 2
    ADVERTISEMENT = 0x80
    PATH_UPDATE = 0x81
"#;

/// Declaration file with all three group enums
pub const PROTOCOL_FRAME: &str = r#"import Foundation

/// Commands sent to the device
public enum CommandCode: UInt8, Sendable {
    case appStart = 1,
    case sendTxtMsg = 2 // text message
}

public enum ResponseCode: UInt8, Sendable {
    case ok = 0,
    case error = 1
}

public enum PushCode: UInt8, Sendable {
    case pathUpdate = 0x81
}
"#;
