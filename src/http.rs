//! HTTP surface: `GET /mcp/list-tools` and `POST /mcp/call-tool`.

extern crate alloc;

use alloc::sync::Arc;
use core::net::SocketAddr;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::trace::TraceLayer;

use crate::auth::bearer_token;
use crate::dispatch::Dispatcher;
use crate::error::DispatchError;
use crate::response::{CallToolRequest, ToolDescriptor, ToolResponse};
use crate::tools::ToolCall;

/// Status code reported for a dispatch failure.
const fn status_for(err: &DispatchError) -> StatusCode {
    match *err {
        DispatchError::UnknownTool(_) => StatusCode::BAD_REQUEST,
        DispatchError::Unauthorized => StatusCode::UNAUTHORIZED,
        DispatchError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Pairs an error with its status code and `{error}` body.
fn failure(err: &DispatchError) -> (StatusCode, Json<ToolResponse>) {
    (status_for(err), Json(ToolResponse::error(err.to_string())))
}

/// Builds the router serving the tool endpoints.
pub(crate) fn router(dispatcher: Arc<Dispatcher>) -> Router {
    Router::new()
        .route("/mcp/list-tools", get(list_tools))
        .route("/mcp/call-tool", post(call_tool))
        .layer(TraceLayer::new_for_http())
        .with_state(dispatcher)
}

/// GET /mcp/list-tools
async fn list_tools(State(dispatcher): State<Arc<Dispatcher>>) -> Json<Vec<ToolDescriptor>> {
    Json(dispatcher.list_tools().to_vec())
}

/// POST /mcp/call-tool
async fn call_tool(
    State(dispatcher): State<Arc<Dispatcher>>,
    headers: HeaderMap,
    body: Result<Json<CallToolRequest>, JsonRejection>,
) -> (StatusCode, Json<ToolResponse>) {
    let Json(request) = match body {
        Ok(request) => request,
        Err(rejection) => {
            tracing::warn!(%rejection, "rejected call-tool body");
            return (
                StatusCode::BAD_REQUEST,
                Json(ToolResponse::error(rejection.body_text())),
            );
        }
    };

    let header_token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(|value| bearer_token(value).to_owned());

    let call = match ToolCall::parse(request.name.as_deref(), &request.arguments, header_token) {
        Ok(call) => call,
        Err(err) => {
            tracing::warn!(%err, "rejected tool call");
            return failure(&err);
        }
    };

    // Run each call in its own task so a panic is contained to this request.
    let handle = tokio::spawn(async move { dispatcher.call(call).await });
    let outcome = handle.await.unwrap_or_else(|join_err| {
        tracing::error!(%join_err, "tool call task failed");
        Err(DispatchError::Internal)
    });

    match outcome {
        Ok(result) => (StatusCode::OK, Json(ToolResponse::result(result))),
        Err(err) => failure(&err),
    }
}

/// Serves the router on `addr` until Ctrl-C.
///
/// # Errors
///
/// Returns an I/O error if the listener cannot bind or the server fails.
pub(crate) async fn serve(addr: SocketAddr, dispatcher: Arc<Dispatcher>) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "HTTP server listening");
    axum::serve(listener, router(dispatcher))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

/// Resolves when the process receives Ctrl-C.
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutdown signal received");
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

    use axum::Router;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::router;
    use crate::dispatch::ADD_PURCHASE_FAILED;
    use crate::dispatch::tests::{IDENTITY, SECRET, dispatcher};
    use crate::store::memory::MemoryStore;

    fn app() -> (Router, Arc<MemoryStore>) {
        let (dispatcher, store) = dispatcher();
        (router(Arc::new(dispatcher)), store)
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.expect("router is infallible");
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let json = serde_json::from_slice(&body).expect("json body");
        (status, json)
    }

    fn call(body: &Value) -> Request<Body> {
        Request::post("/mcp/call-tool")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    #[tokio::test]
    async fn list_tools_returns_catalog_without_auth() {
        let (app, _store) = app();
        let request = Request::get("/mcp/list-tools")
            .body(Body::empty())
            .expect("request");
        let (status, json) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);
        let tools = json.as_array().expect("array");
        assert_eq!(tools.len(), 3);
        assert_eq!(tools[1]["name"], "add_purchase");
        assert_eq!(tools[1]["inputSchema"]["required"][0], "item_name");
    }

    #[tokio::test]
    async fn add_purchase_returns_confirmation() {
        let (app, store) = app();
        let body = json!({
            "name": "add_purchase",
            "arguments": {"item_name": "Coffee", "cost": 150, "category": "Food"}
        });
        let (status, json) = send(app, call(&body)).await;
        assert_eq!(status, StatusCode::OK);
        let text = json["result"].as_str().expect("result text");
        assert!(text.contains("Coffee") && text.contains("150") && text.contains("Food"));
        assert_eq!(store.purchases().await.len(), 1);
    }

    #[tokio::test]
    async fn balance_without_arguments_field() {
        let (app, store) = app();
        store.credit(42.0).await;
        let (status, json) = send(app, call(&json!({"name": "get_current_balance"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["result"], "💰 Current Balance: ₹42.00");
    }

    #[tokio::test]
    async fn balance_is_zero_with_200_when_store_fails() {
        let (app, store) = app();
        store.close().await;
        let (status, json) = send(app, call(&json!({"name": "get_current_balance"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["result"], "💰 Current Balance: ₹0.00");
    }

    #[tokio::test]
    async fn unknown_tool_is_400() {
        let (app, _store) = app();
        let body = json!({"name": "nonexistent_tool", "arguments": {}});
        let (status, json) = send(app, call(&body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json, json!({"error": "Unknown tool: nonexistent_tool"}));
    }

    #[tokio::test]
    async fn validate_with_header_returns_identity() {
        let (app, _store) = app();
        let request = Request::post("/mcp/call-tool")
            .header("content-type", "application/json")
            .header("authorization", format!("Bearer {SECRET}"))
            .body(Body::from(json!({"name": "validate"}).to_string()))
            .expect("request");
        let (status, json) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["result"], IDENTITY);
    }

    #[tokio::test]
    async fn validate_with_argument_token_returns_identity() {
        let (app, _store) = app();
        let body = json!({"name": "validate", "arguments": {"bearer_token": SECRET}});
        let (status, json) = send(app, call(&body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["result"], IDENTITY);
    }

    #[tokio::test]
    async fn validate_with_wrong_or_missing_token_is_401() {
        let (app, _store) = app();
        let wrong = Request::post("/mcp/call-tool")
            .header("content-type", "application/json")
            .header("authorization", "Bearer wrong")
            .body(Body::from(json!({"name": "validate"}).to_string()))
            .expect("request");
        let (status, json) = send(app.clone(), wrong).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json, json!({"error": "Invalid bearer token"}));

        let (missing_status, _body) = send(app, call(&json!({"name": "validate"}))).await;
        assert_eq!(missing_status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn validate_with_non_object_arguments_is_401() {
        let (app, _store) = app();
        let body = json!({"name": "validate", "arguments": "x"});
        let (status, json) = send(app, call(&body)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json, json!({"error": "Invalid bearer token"}));
    }

    #[tokio::test]
    async fn string_cost_is_stored_and_confirmed() {
        let (app, store) = app();
        let body = json!({
            "name": "add_purchase",
            "arguments": {"item_name": "Coffee", "cost": "150", "category": "Food"}
        });
        let (status, json) = send(app, call(&body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json["result"],
            "Purchase of Coffee for ₹150 in the Food category added successfully."
        );
        assert_eq!(store.purchases().await.len(), 1);
    }

    #[tokio::test]
    async fn uncastable_cost_is_200_with_failure_message() {
        let (app, store) = app();
        let body = json!({"name": "add_purchase", "arguments": {"cost": "lots"}});
        let (status, json) = send(app, call(&body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["result"], ADD_PURCHASE_FAILED);
        assert!(store.purchases().await.is_empty());
    }

    #[tokio::test]
    async fn malformed_body_is_400_with_error_envelope() {
        let (app, _store) = app();
        let request = Request::post("/mcp/call-tool")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .expect("request");
        let (status, json) = send(app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().is_some());
    }
}
