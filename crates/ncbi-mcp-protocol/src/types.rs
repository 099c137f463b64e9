//! Common types shared by handshake messages

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// MCP protocol revision announced in handshakes
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// JSON-RPC version tag
pub const JSONRPC_VERSION: &str = "2.0";

/// Name and version of a protocol participant
///
/// Serialized as `clientInfo` in an `initialize` request and as `serverInfo`
/// in a capability announcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Implementation {
    /// Participant name
    pub name: String,

    /// Participant version
    pub version: String,
}

impl Implementation {
    /// Create implementation info
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// Declared capability set
///
/// Each capability is an object keyed by name. An empty object means
/// "supported with no options".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capabilities(Map<String, Value>);

impl Capabilities {
    /// Create an empty capability set
    pub fn new() -> Self {
        Self::default()
    }

    /// Capabilities the NCBI server advertises: tool calls only
    pub fn tools() -> Self {
        Self::new().with("tools", Value::Object(Map::new()))
    }

    /// Add a capability
    pub fn with(mut self, name: impl Into<String>, options: Value) -> Self {
        self.0.insert(name.into(), options);
        self
    }

    /// Check whether a capability is declared
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Whether no capability is declared
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tools_capability_serializes_as_empty_object() {
        let caps = Capabilities::tools();
        let json = serde_json::to_value(&caps).unwrap();
        assert_eq!(json, serde_json::json!({ "tools": {} }));
        assert!(caps.contains("tools"));
        assert!(!caps.contains("resources"));
    }

    #[test]
    fn test_empty_capabilities() {
        let caps = Capabilities::new();
        assert!(caps.is_empty());
        assert_eq!(serde_json::to_string(&caps).unwrap(), "{}");
    }
}
