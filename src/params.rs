//! Parameter structs for tool inputs.
//!
//! Each struct derives [`serde::Deserialize`] and [`schemars::JsonSchema`]
//! so that `rmcp` can decode stdio calls. Inputs are not validated: a
//! missing argument is passed through as null and a value of the wrong type
//! is passed through as sent.

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

/// Parameters for the `add_purchase` tool.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, JsonSchema)]
pub(crate) struct AddPurchaseParams {
    /// The name of the item purchased.
    #[serde(default)]
    pub(crate) item_name: Value,
    /// The cost of the item.
    #[serde(default)]
    pub(crate) cost: Value,
    /// The category of the purchase.
    #[serde(default)]
    pub(crate) category: Value,
}

impl AddPurchaseParams {
    /// Reads the fields out of a raw `arguments` value.
    ///
    /// Anything that is not an object yields all-null fields.
    pub(crate) fn from_arguments(arguments: &Value) -> Self {
        let field = |key: &str| arguments.get(key).cloned().unwrap_or_default();
        Self {
            item_name: field("item_name"),
            cost: field("cost"),
            category: field("category"),
        }
    }
}

/// Parameters for the `validate` tool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, JsonSchema)]
pub(crate) struct ValidateParams {
    /// Bearer token to check when the transport carries no `Authorization` header.
    #[serde(default)]
    pub(crate) bearer_token: Option<String>,
}

impl ValidateParams {
    /// Reads `bearer_token` out of a raw `arguments` value.
    ///
    /// A missing or non-string token reads as `None`.
    pub(crate) fn from_arguments(arguments: &Value) -> Self {
        Self {
            bearer_token: arguments
                .get("bearer_token")
                .and_then(Value::as_str)
                .map(ToOwned::to_owned),
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::missing_docs_in_private_items,
    reason = "test code uses expect for readability"
)]
mod tests {
    use serde_json::{Value, json};

    use super::{AddPurchaseParams, ValidateParams};

    #[test]
    fn add_purchase_full() {
        let json = r#"{"item_name": "Coffee", "cost": 150, "category": "Food"}"#;
        let params: AddPurchaseParams = serde_json::from_str(json).expect("should deserialize");
        assert_eq!(params.item_name, json!("Coffee"));
        assert_eq!(params.cost, json!(150));
        assert_eq!(params.category, json!("Food"));
    }

    #[test]
    fn add_purchase_missing_fields_become_null() {
        let params: AddPurchaseParams =
            serde_json::from_str("{}").expect("should deserialize empty object");
        assert_eq!(params, AddPurchaseParams::default());
        assert!(params.cost.is_null());
    }

    #[test]
    fn add_purchase_keeps_wrongly_typed_values() {
        let json = r#"{"item_name": 7, "cost": "150", "category": ["Food"]}"#;
        let params: AddPurchaseParams = serde_json::from_str(json).expect("should deserialize");
        assert_eq!(params.item_name, json!(7));
        assert_eq!(params.cost, json!("150"));
        assert_eq!(params.category, json!(["Food"]));
    }

    #[test]
    fn add_purchase_from_arguments_matches_deserialize() {
        let arguments = json!({"item_name": "Coffee", "cost": 2.5, "category": "Food", "note": "x"});
        let decoded: AddPurchaseParams =
            serde_json::from_value(arguments.clone()).expect("should deserialize");
        assert_eq!(AddPurchaseParams::from_arguments(&arguments), decoded);
    }

    #[test]
    fn add_purchase_from_non_object_is_all_null() {
        for arguments in [Value::Null, json!("x"), json!([1, 2])] {
            assert_eq!(
                AddPurchaseParams::from_arguments(&arguments),
                AddPurchaseParams::default()
            );
        }
    }

    #[test]
    fn validate_token_is_optional() {
        let params: ValidateParams = serde_json::from_str("{}").expect("should deserialize");
        assert!(params.bearer_token.is_none());

        let with_token: ValidateParams =
            serde_json::from_str(r#"{"bearer_token": "abc"}"#).expect("should deserialize");
        assert_eq!(with_token.bearer_token.as_deref(), Some("abc"));
    }

    #[test]
    fn validate_from_unreadable_arguments_has_no_token() {
        for arguments in [json!("x"), json!({"bearer_token": 42}), Value::Null] {
            assert_eq!(
                ValidateParams::from_arguments(&arguments),
                ValidateParams::default()
            );
        }
    }
}
