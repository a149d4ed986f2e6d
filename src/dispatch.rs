//! Tool dispatcher shared by the HTTP and stdio transports.
//!
//! Storage failures stop here: a failed balance read is reported as zero and
//! a failed insert as a fixed message. Both are logged with their cause.

use core::fmt;

use serde_json::Value;

use crate::auth::AuthGate;
use crate::error::DispatchError;
use crate::ledger::Ledger;
use crate::params::AddPurchaseParams;
use crate::response::ToolDescriptor;
use crate::store::NewPurchase;
use crate::tools::{self, ToolCall};

/// Message returned when a purchase could not be stored.
pub(crate) const ADD_PURCHASE_FAILED: &str = "An error occurred while adding the purchase.";

/// Renders an argument for the confirmation text.
///
/// Strings appear without quotes; everything else, null included, in its
/// JSON form, so `150.0` stays `150.0`.
struct Argument<'value>(&'value Value);

impl fmt::Display for Argument<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(text) = self.0.as_str() else {
            return fmt::Display::fmt(self.0, f);
        };
        f.write_str(text)
    }
}

/// Routes tool calls to the ledger and auth gate and formats their results.
#[derive(Debug)]
pub(crate) struct Dispatcher {
    /// Ledger the finance tools operate on.
    ledger: Ledger,
    /// Bearer token check for `validate`.
    auth: AuthGate,
    /// Currency symbol prefixed to amounts.
    currency: String,
    /// Catalog built at start-up.
    catalog: Vec<ToolDescriptor>,
}

impl Dispatcher {
    /// Creates a dispatcher.
    pub(crate) fn new(ledger: Ledger, auth: AuthGate, currency: String) -> Self {
        Self {
            ledger,
            auth,
            currency,
            catalog: tools::catalog(),
        }
    }

    /// The tool catalog; needs no authentication.
    pub(crate) fn list_tools(&self) -> &[ToolDescriptor] {
        &self.catalog
    }

    /// Executes `call` and returns the caller-facing text.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Unauthorized`] when `validate` is called with
    /// a missing or wrong token. The finance tools never fail.
    pub(crate) async fn call(&self, call: ToolCall) -> Result<String, DispatchError> {
        tracing::debug!(tool = call.tool().as_str(), "dispatching tool call");
        match call {
            ToolCall::GetCurrentBalance => Ok(self.current_balance().await),
            ToolCall::AddPurchase(params) => Ok(self.add_purchase(params).await),
            ToolCall::Validate { bearer_token } => self
                .auth
                .validate(bearer_token.as_deref())
                .map(ToOwned::to_owned)
                .ok_or_else(|| {
                    tracing::warn!("validate called with an invalid bearer token");
                    DispatchError::Unauthorized
                }),
        }
    }

    /// Formats the current balance, reporting zero when the store fails.
    async fn current_balance(&self) -> String {
        let balance = self.ledger.balance().await.unwrap_or_else(|err| {
            tracing::error!(%err, "error getting balance, reporting zero");
            0.0
        });
        format!("💰 Current Balance: {}{balance:.2}", self.currency)
    }

    /// Stores a purchase and formats the confirmation or failure text.
    async fn add_purchase(&self, params: AddPurchaseParams) -> String {
        let purchase = NewPurchase {
            item_name: params.item_name,
            amount: params.cost,
            category: params.category,
        };
        match self.ledger.add_purchase(&purchase).await {
            Ok(()) => format!(
                "Purchase of {} for {}{} in the {} category added successfully.",
                Argument(&purchase.item_name),
                self.currency,
                Argument(&purchase.amount),
                Argument(&purchase.category),
            ),
            Err(err) => {
                tracing::error!(%err, "error adding purchase");
                ADD_PURCHASE_FAILED.to_owned()
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    #![allow(
        clippy::expect_used,
        clippy::missing_docs_in_private_items,
        reason = "test code uses expect for readability"
    )]

    extern crate alloc;

    use alloc::sync::Arc;

    use serde_json::json;

    use super::{ADD_PURCHASE_FAILED, Dispatcher};
    use crate::auth::AuthGate;
    use crate::error::DispatchError;
    use crate::ledger::Ledger;
    use crate::params::AddPurchaseParams;
    use crate::store::memory::MemoryStore;
    use crate::tools::ToolCall;

    /// Secret configured on test dispatchers.
    pub(crate) const SECRET: &str = "s3cret";
    /// Identity returned by test dispatchers.
    pub(crate) const IDENTITY: &str = "+491234567890";

    /// Dispatcher over a fresh memory store, returned alongside the store.
    pub(crate) fn dispatcher() -> (Dispatcher, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let shared: Arc<MemoryStore> = Arc::clone(&store);
        let auth = AuthGate::new(SECRET.to_owned(), IDENTITY.to_owned()).expect("valid gate");
        let dispatcher = Dispatcher::new(Ledger::new(shared), auth, "₹".to_owned());
        (dispatcher, store)
    }

    fn coffee() -> ToolCall {
        ToolCall::AddPurchase(AddPurchaseParams {
            item_name: json!("Coffee"),
            cost: json!(150),
            category: json!("Food"),
        })
    }

    #[tokio::test]
    async fn add_purchase_confirms_with_all_inputs() {
        let (dispatcher, store) = dispatcher();
        let text = dispatcher.call(coffee()).await.expect("call");
        assert_eq!(
            text,
            "Purchase of Coffee for ₹150 in the Food category added successfully."
        );
        assert!(text.contains("Coffee") && text.contains("150") && text.contains("Food"));
        assert_eq!(store.purchases().await.len(), 1);
    }

    #[tokio::test]
    async fn add_purchase_keeps_fractional_cost() {
        let (dispatcher, _store) = dispatcher();
        let call = ToolCall::AddPurchase(AddPurchaseParams {
            item_name: json!("Tea"),
            cost: json!(12.5),
            category: json!("Food"),
        });
        let text = dispatcher.call(call).await.expect("call");
        assert!(text.contains("₹12.5 "));
    }

    #[tokio::test]
    async fn add_purchase_echoes_cost_as_sent() {
        let (dispatcher, store) = dispatcher();
        store.credit(500.0).await;
        for (cost, shown) in [(json!(150.0), "₹150.0 "), (json!("150"), "₹150 ")] {
            let call = ToolCall::AddPurchase(AddPurchaseParams {
                item_name: json!("Coffee"),
                cost,
                category: json!("Food"),
            });
            let text = dispatcher.call(call).await.expect("call");
            assert!(text.contains(shown), "{text}");
        }
        assert_eq!(
            dispatcher
                .call(ToolCall::GetCurrentBalance)
                .await
                .expect("call"),
            "💰 Current Balance: ₹200.00"
        );
    }

    #[tokio::test]
    async fn uncastable_cost_returns_fixed_message() {
        let (dispatcher, store) = dispatcher();
        let call = ToolCall::AddPurchase(AddPurchaseParams {
            item_name: json!("Coffee"),
            cost: json!("ten"),
            category: json!("Food"),
        });
        let text = dispatcher.call(call).await.expect("insert never errors");
        assert_eq!(text, ADD_PURCHASE_FAILED);
        assert!(store.purchases().await.is_empty());
    }

    #[tokio::test]
    async fn add_purchase_renders_missing_arguments_as_null() {
        let (dispatcher, store) = dispatcher();
        let text = dispatcher
            .call(ToolCall::AddPurchase(AddPurchaseParams::default()))
            .await
            .expect("call");
        assert_eq!(
            text,
            "Purchase of null for ₹null in the null category added successfully."
        );
        let stored = store.purchases().await;
        assert_eq!(stored.len(), 1);
        assert!(stored.iter().all(|row| row.amount.is_null()));
    }

    #[tokio::test]
    async fn balance_reflects_purchase_immediately() {
        let (dispatcher, store) = dispatcher();
        store.credit(1000.0).await;
        assert_eq!(
            dispatcher
                .call(ToolCall::GetCurrentBalance)
                .await
                .expect("call"),
            "💰 Current Balance: ₹1000.00"
        );
        let _confirmation = dispatcher.call(coffee()).await.expect("call");
        assert_eq!(
            dispatcher
                .call(ToolCall::GetCurrentBalance)
                .await
                .expect("call"),
            "💰 Current Balance: ₹850.00"
        );
    }

    #[tokio::test]
    async fn storage_failure_reports_zero_balance() {
        let (dispatcher, store) = dispatcher();
        store.credit(1000.0).await;
        store.close().await;
        let text = dispatcher
            .call(ToolCall::GetCurrentBalance)
            .await
            .expect("balance never errors");
        assert_eq!(text, "💰 Current Balance: ₹0.00");
    }

    #[tokio::test]
    async fn storage_failure_on_insert_returns_fixed_message() {
        let (dispatcher, store) = dispatcher();
        store.close().await;
        let text = dispatcher.call(coffee()).await.expect("insert never errors");
        assert_eq!(text, ADD_PURCHASE_FAILED);
    }

    #[tokio::test]
    async fn validate_returns_identity_for_secret() {
        let (dispatcher, _store) = dispatcher();
        let text = dispatcher
            .call(ToolCall::Validate {
                bearer_token: Some(SECRET.to_owned()),
            })
            .await
            .expect("authorized");
        assert_eq!(text, IDENTITY);
    }

    #[tokio::test]
    async fn validate_rejects_wrong_empty_and_missing_tokens() {
        let (dispatcher, _store) = dispatcher();
        for token in [Some("nope".to_owned()), Some(String::new()), None] {
            let err = dispatcher
                .call(ToolCall::Validate {
                    bearer_token: token,
                })
                .await
                .expect_err("unauthorized");
            assert!(matches!(err, DispatchError::Unauthorized));
        }
    }

    #[tokio::test]
    async fn failed_request_does_not_affect_the_next() {
        let (dispatcher, _store) = dispatcher();
        let parsed = ToolCall::parse(Some("nonexistent_tool"), &json!({}), None);
        assert!(parsed.is_err());
        assert!(dispatcher.call(ToolCall::GetCurrentBalance).await.is_ok());
    }

    #[test]
    fn catalog_is_listed_without_auth() {
        let (dispatcher, _store) = dispatcher();
        assert_eq!(dispatcher.list_tools().len(), 3);
    }
}
