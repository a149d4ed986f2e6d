//! Wire envelopes for the HTTP tool surface.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Catalog entry describing one tool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct ToolDescriptor {
    /// Tool name used in `call-tool` requests.
    pub(crate) name: &'static str,
    /// Human-readable description for the calling agent.
    pub(crate) description: &'static str,
    /// JSON schema of the `arguments` object.
    #[serde(rename = "inputSchema")]
    pub(crate) input_schema: Value,
}

/// Body of a `call-tool` request.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub(crate) struct CallToolRequest {
    /// Requested tool name; absent names are reported as unknown.
    #[serde(default)]
    pub(crate) name: Option<String>,
    /// Tool arguments; defaults to an empty object.
    #[serde(default)]
    pub(crate) arguments: Value,
}

/// Body of a `call-tool` response: either a result or an error text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub(crate) enum ToolResponse {
    /// Successful call.
    Result {
        /// Text produced by the tool.
        result: String,
    },
    /// Failed call.
    Error {
        /// Caller-facing failure text.
        error: String,
    },
}

impl ToolResponse {
    /// Wraps a successful tool output.
    pub(crate) const fn result(result: String) -> Self {
        Self::Result { result }
    }

    /// Wraps a failure message.
    pub(crate) const fn error(error: String) -> Self {
        Self::Error { error }
    }
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::missing_docs_in_private_items,
    reason = "test code uses expect for readability"
)]
mod tests {
    use serde_json::json;

    use super::{CallToolRequest, ToolDescriptor, ToolResponse};

    #[test]
    fn descriptor_uses_mcp_field_names() {
        let descriptor = ToolDescriptor {
            name: "get_current_balance",
            description: "Gets the balance.",
            input_schema: json!({"type": "object", "properties": {}}),
        };
        let value = serde_json::to_value(&descriptor).expect("serialize");
        assert_eq!(value["name"], "get_current_balance");
        assert_eq!(value["inputSchema"]["type"], "object");
        assert!(value.get("input_schema").is_none());
    }

    #[test]
    fn request_without_arguments_defaults_to_null_arguments() {
        let request: CallToolRequest =
            serde_json::from_str(r#"{"name": "get_current_balance"}"#).expect("deserialize");
        assert_eq!(request.name.as_deref(), Some("get_current_balance"));
        assert!(request.arguments.is_null());
    }

    #[test]
    fn request_without_name_deserializes() {
        let request: CallToolRequest = serde_json::from_str("{}").expect("deserialize");
        assert!(request.name.is_none());
    }

    #[test]
    fn response_envelopes_are_flat() {
        let ok = serde_json::to_value(ToolResponse::result("done".to_owned())).expect("ok");
        assert_eq!(ok, json!({"result": "done"}));
        let err = serde_json::to_value(ToolResponse::error("nope".to_owned())).expect("err");
        assert_eq!(err, json!({"error": "nope"}));
    }
}
