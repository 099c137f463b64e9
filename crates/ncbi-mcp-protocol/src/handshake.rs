//! Handshake messages written to the worker before any caller input
//!
//! Two shapes are in use. Neither is canonical; the launcher is configured
//! with one of them, or with none.
//!
//! - [`InitializeRequest`]: a JSON-RPC `initialize` call
//! - [`CapabilityAnnouncement`]: a bare `protocolVersion`/`capabilities`/`serverInfo` object
//!
//! Both are written as newline-delimited JSON (NDJSON).

use crate::error::{ProtocolError, Result};
use crate::types::{Capabilities, Implementation, JSONRPC_VERSION, PROTOCOL_VERSION};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Parameters of an `initialize` request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// Protocol revision requested by the client
    pub protocol_version: String,

    /// Client capabilities
    pub capabilities: Capabilities,

    /// Client name and version
    pub client_info: Implementation,
}

/// JSON-RPC `initialize` request envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitializeRequest {
    /// Always `"2.0"`
    pub jsonrpc: String,

    /// Request id
    pub id: u64,

    /// Always `"initialize"`
    pub method: String,

    /// Request parameters
    pub params: InitializeParams,
}

impl InitializeRequest {
    /// Method name of the request
    pub const METHOD: &'static str = "initialize";

    /// Create an `initialize` request with id 0 and no client capabilities
    pub fn new(client_info: Implementation) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: 0,
            method: Self::METHOD.to_string(),
            params: InitializeParams {
                protocol_version: PROTOCOL_VERSION.to_string(),
                capabilities: Capabilities::new(),
                client_info,
            },
        }
    }

    /// Set the request id
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = id;
        self
    }

    /// Set the declared client capabilities
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.params.capabilities = capabilities;
        self
    }
}

/// Bare capability object, without a JSON-RPC envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityAnnouncement {
    /// Protocol revision spoken by the server
    pub protocol_version: String,

    /// Server capabilities
    pub capabilities: Capabilities,

    /// Server name and version
    pub server_info: Implementation,
}

impl CapabilityAnnouncement {
    /// Create an announcement declaring tool support
    pub fn new(server_info: Implementation) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: Capabilities::tools(),
            server_info,
        }
    }
}

/// A handshake message, ready to be written to the worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Handshake {
    /// JSON-RPC `initialize` request
    Initialize(InitializeRequest),

    /// Bare capability announcement
    Capabilities(CapabilityAnnouncement),
}

impl Handshake {
    /// Serialize to compact JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(ProtocolError::from)
    }

    /// Serialize to a single newline-terminated line
    ///
    /// Compact JSON never contains a raw newline, so the result is exactly one line.
    pub fn to_line(&self) -> Result<String> {
        let mut line = self.to_json()?;
        line.push('\n');
        Ok(line)
    }

    /// Which configuration variant produced this message
    pub fn kind(&self) -> HandshakeKind {
        match self {
            Self::Initialize(_) => HandshakeKind::Initialize,
            Self::Capabilities(_) => HandshakeKind::Capabilities,
        }
    }
}

impl From<InitializeRequest> for Handshake {
    fn from(request: InitializeRequest) -> Self {
        Self::Initialize(request)
    }
}

impl From<CapabilityAnnouncement> for Handshake {
    fn from(announcement: CapabilityAnnouncement) -> Self {
        Self::Capabilities(announcement)
    }
}

/// Handshake selection, as given on the command line or in the environment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum HandshakeKind {
    /// Forward caller input untouched
    #[default]
    None,

    /// Send a JSON-RPC `initialize` request
    Initialize,

    /// Send a bare capability announcement
    Capabilities,
}

impl HandshakeKind {
    /// All kinds, in the order they are listed to users
    pub const ALL: [HandshakeKind; 3] = [Self::None, Self::Initialize, Self::Capabilities];

    /// Canonical name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Initialize => "initialize",
            Self::Capabilities => "capabilities",
        }
    }

    /// Build the message for this kind, or `None` for [`HandshakeKind::None`]
    pub fn build(&self, implementation: Implementation) -> Option<Handshake> {
        match self {
            Self::None => None,
            Self::Initialize => Some(InitializeRequest::new(implementation).into()),
            Self::Capabilities => Some(CapabilityAnnouncement::new(implementation).into()),
        }
    }
}

impl fmt::Display for HandshakeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HandshakeKind {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" | "off" => Ok(Self::None),
            "initialize" | "init" | "jsonrpc" => Ok(Self::Initialize),
            "capabilities" | "caps" => Ok(Self::Capabilities),
            other => Err(ProtocolError::UnknownHandshake(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn ncbi() -> Implementation {
        Implementation::new("ncbi-mcp", "2.0.0")
    }

    #[test]
    fn test_initialize_request_wire_shape() {
        let handshake: Handshake = InitializeRequest::new(ncbi()).with_id(1).into();
        let value: serde_json::Value = serde_json::from_str(&handshake.to_json().unwrap()).unwrap();

        assert_eq!(value["jsonrpc"], "2.0");
        assert_eq!(value["id"], 1);
        assert_eq!(value["method"], "initialize");
        assert_eq!(value["params"]["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(value["params"]["clientInfo"]["name"], "ncbi-mcp");
        assert_eq!(value["params"]["capabilities"], serde_json::json!({}));
    }

    #[test]
    fn test_capability_announcement_wire_shape() {
        let handshake: Handshake = CapabilityAnnouncement::new(ncbi()).into();
        let value: serde_json::Value = serde_json::from_str(&handshake.to_json().unwrap()).unwrap();

        assert_eq!(value["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(value["capabilities"], serde_json::json!({ "tools": {} }));
        assert_eq!(value["serverInfo"]["version"], "2.0.0");
        assert!(value.get("jsonrpc").is_none());
    }

    #[test]
    fn test_to_line_is_single_newline_terminated_line() {
        let capabilities = Capabilities::new().with(
            "experimental",
            serde_json::json!({ "note": "multi\nline" }),
        );
        let handshake: Handshake = InitializeRequest::new(ncbi())
            .with_capabilities(capabilities)
            .into();

        let line = handshake.to_line().unwrap();
        assert!(line.ends_with('\n'));
        assert_eq!(line.matches('\n').count(), 1);
    }

    #[test]
    fn test_untagged_decode_picks_matching_variant() {
        let line = Handshake::from(CapabilityAnnouncement::new(ncbi()))
            .to_line()
            .unwrap();
        let decoded: Handshake = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(decoded.kind(), HandshakeKind::Capabilities);
    }

    #[rstest]
    #[case("none", HandshakeKind::None)]
    #[case("", HandshakeKind::None)]
    #[case("initialize", HandshakeKind::Initialize)]
    #[case("JSONRPC", HandshakeKind::Initialize)]
    #[case("capabilities", HandshakeKind::Capabilities)]
    #[case(" caps ", HandshakeKind::Capabilities)]
    fn test_handshake_kind_parse(#[case] input: &str, #[case] expected: HandshakeKind) {
        assert_eq!(input.parse::<HandshakeKind>().unwrap(), expected);
    }

    #[test]
    fn test_handshake_kind_parse_rejects_unknown() {
        let err = "hello".parse::<HandshakeKind>().unwrap_err();
        assert_eq!(err, ProtocolError::UnknownHandshake("hello".to_string()));
    }

    #[test]
    fn test_handshake_kind_build() {
        assert!(HandshakeKind::None.build(ncbi()).is_none());
        for kind in HandshakeKind::ALL {
            if let Some(handshake) = kind.build(ncbi()) {
                assert_eq!(handshake.kind(), kind);
            }
        }
    }

    #[test]
    fn test_handshake_kind_display_round_trips() {
        for kind in HandshakeKind::ALL {
            assert_eq!(kind.to_string().parse::<HandshakeKind>().unwrap(), kind);
        }
    }
}
