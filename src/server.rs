//! MCP stdio server exposing the ledger tools.
//!
//! Uses `rmcp` macros to register the tools; each handler builds a typed
//! [`ToolCall`] and hands it to the shared [`Dispatcher`]. Tool descriptions
//! and input schemas come from the static catalog in [`crate::tools`].

extern crate alloc;

use alloc::sync::Arc;

use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, ServerCapabilities, ServerInfo};
use rmcp::{ErrorData as McpError, ServerHandler, tool, tool_handler, tool_router};

use crate::dispatch::Dispatcher;
use crate::error::DispatchError;
use crate::params::{AddPurchaseParams, ValidateParams};
use crate::tools::{ToolCall, ToolName};

/// Converts a dispatch outcome into an MCP tool result.
///
/// Caller errors become error tool results carrying the message text;
/// only [`DispatchError::Internal`] is reported as a protocol error.
fn to_tool_result(outcome: Result<String, DispatchError>) -> Result<CallToolResult, McpError> {
    match outcome {
        Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
        Err(DispatchError::Internal) => Err(McpError::internal_error(
            DispatchError::Internal.to_string(),
            None,
        )),
        Err(err @ (DispatchError::UnknownTool(_) | DispatchError::Unauthorized)) => Ok(CallToolResult::error(vec![Content::text(err.to_string())])),
    }
}

/// MCP server wrapping the ledger dispatcher.
#[derive(Clone)]
pub(crate) struct LedgerMcpServer {
    /// Shared dispatcher.
    dispatcher: Arc<Dispatcher>,
    /// Tool router for dispatching MCP tool calls.
    tool_router: ToolRouter<Self>,
}

impl core::fmt::Debug for LedgerMcpServer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LedgerMcpServer").finish_non_exhaustive()
    }
}

#[tool_router]
impl LedgerMcpServer {
    /// Creates a new MCP server over `dispatcher`.
    pub(crate) fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            tool_router: Self::catalog_router(),
        }
    }

    /// Tool router whose listing matches the static catalog.
    fn catalog_router() -> ToolRouter<Self> {
        let mut router = Self::tool_router();
        for route in router.map.values_mut() {
            let Some(tool) = ToolName::from_name(&route.attr.name) else {
                continue;
            };
            route.attr.description = Some(tool.description().into());
            route.attr.input_schema = Arc::new(tool.input_object());
        }
        router
    }

    /// Reports the current balance.
    #[tool]
    async fn get_current_balance(&self) -> Result<CallToolResult, McpError> {
        to_tool_result(self.dispatcher.call(ToolCall::GetCurrentBalance).await)
    }

    /// Records a purchase.
    #[tool]
    async fn add_purchase(
        &self,
        params: Parameters<AddPurchaseParams>,
    ) -> Result<CallToolResult, McpError> {
        to_tool_result(self.dispatcher.call(ToolCall::AddPurchase(params.0)).await)
    }

    /// Checks a bearer token and returns the owner's phone number.
    #[tool]
    async fn validate(
        &self,
        params: Parameters<ValidateParams>,
    ) -> Result<CallToolResult, McpError> {
        let call = ToolCall::Validate {
            bearer_token: params.0.bearer_token,
        };
        to_tool_result(self.dispatcher.call(call).await)
    }
}

#[tool_handler]
impl ServerHandler for LedgerMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Personal spending ledger. Use get_current_balance to read the balance, \
                 add_purchase to record spending, and validate to check the bearer token."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::missing_docs_in_private_items,
    reason = "test code uses expect and indexing for readability"
)]
mod tests {
    extern crate alloc;

    use alloc::sync::Arc;

    use rmcp::handler::server::wrapper::Parameters;
    use rmcp::model::CallToolResult;
    use serde_json::{Value, json};

    use super::{LedgerMcpServer, to_tool_result};
    use crate::dispatch::tests::{IDENTITY, SECRET, dispatcher};
    use crate::error::DispatchError;
    use crate::params::{AddPurchaseParams, ValidateParams};
    use crate::store::memory::MemoryStore;
    use crate::tools;

    fn server() -> (LedgerMcpServer, Arc<MemoryStore>) {
        let (dispatcher, store) = dispatcher();
        (LedgerMcpServer::new(Arc::new(dispatcher)), store)
    }

    fn text_of(result: &CallToolResult) -> String {
        serde_json::to_value(result).expect("serialize")["content"][0]["text"]
            .as_str()
            .expect("text content")
            .to_owned()
    }

    #[test]
    fn router_lists_the_catalog() {
        let listed: Vec<Value> = LedgerMcpServer::catalog_router()
            .list_all()
            .into_iter()
            .map(|tool| {
                json!({
                    "name": tool.name,
                    "description": tool.description,
                    "inputSchema": Value::Object((*tool.input_schema).clone()),
                })
            })
            .collect();
        let mut expected: Vec<Value> = tools::catalog()
            .into_iter()
            .map(|tool| serde_json::to_value(tool).expect("serialize"))
            .collect();
        expected.sort_by(|left, right| left["name"].as_str().cmp(&right["name"].as_str()));
        assert_eq!(listed, expected);
        assert_eq!(
            listed[0]["inputSchema"]["required"],
            json!(["item_name", "cost", "category"])
        );
    }

    #[tokio::test]
    async fn add_purchase_then_balance() {
        let (server, store) = server();
        store.credit(500.0).await;
        let added = server
            .add_purchase(Parameters(AddPurchaseParams {
                item_name: json!("Coffee"),
                cost: json!(150),
                category: json!("Food"),
            }))
            .await
            .expect("tool result");
        assert_ne!(added.is_error, Some(true));
        assert!(text_of(&added).contains("Coffee"));

        let balance = server.get_current_balance().await.expect("tool result");
        assert_eq!(text_of(&balance), "💰 Current Balance: ₹350.00");
    }

    #[tokio::test]
    async fn validate_reports_identity_or_error_result() {
        let (server, _store) = server();
        let ok = server
            .validate(Parameters(ValidateParams {
                bearer_token: Some(SECRET.to_owned()),
            }))
            .await
            .expect("tool result");
        assert_eq!(text_of(&ok), IDENTITY);

        let denied = server
            .validate(Parameters(ValidateParams::default()))
            .await
            .expect("tool result");
        assert_eq!(denied.is_error, Some(true));
        assert_eq!(text_of(&denied), "Invalid bearer token");
    }

    #[test]
    fn internal_errors_become_protocol_errors() {
        assert!(to_tool_result(Err(DispatchError::Internal)).is_err());
    }
}
