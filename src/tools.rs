//! Tool catalog and typed tool calls.
//!
//! Tool names are parsed once into [`ToolName`]; everything downstream
//! matches on the closed set of [`ToolCall`] variants.

use serde_json::{Map, Value, json};

use crate::error::DispatchError;
use crate::params::{AddPurchaseParams, ValidateParams};
use crate::response::ToolDescriptor;

/// The tools this server exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ToolName {
    /// Reports the derived ledger balance.
    GetCurrentBalance,
    /// Records a purchase.
    AddPurchase,
    /// Checks the bearer token and returns the owner's phone number.
    Validate,
}

impl ToolName {
    /// Every tool, in catalog order.
    pub(crate) const ALL: [Self; 3] = [Self::GetCurrentBalance, Self::AddPurchase, Self::Validate];

    /// Wire name of the tool.
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::GetCurrentBalance => "get_current_balance",
            Self::AddPurchase => "add_purchase",
            Self::Validate => "validate",
        }
    }

    /// Looks up a tool by wire name.
    pub(crate) fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.as_str() == name)
    }

    /// Description shown to the calling agent.
    pub(crate) const fn description(self) -> &'static str {
        match self {
            Self::GetCurrentBalance => "Gets the user's current financial balance.",
            Self::AddPurchase => "Adds a new purchase to the user's financial record.",
            Self::Validate => {
                "Validates the MCP server connection and returns the phone number in {country_code}{number} format."
            }
        }
    }

    /// JSON schema of the tool's arguments.
    fn input_schema(self) -> Value {
        match self {
            Self::GetCurrentBalance => json!({"type": "object", "properties": {}}),
            Self::AddPurchase => json!({
                "type": "object",
                "properties": {
                    "item_name": {"type": "string", "description": "The name of the item purchased."},
                    "cost": {"type": "number", "description": "The cost of the item."},
                    "category": {"type": "string", "description": "The category of the purchase."}
                },
                "required": ["item_name", "cost", "category"]
            }),
            Self::Validate => json!({
                "type": "object",
                "properties": {
                    "bearer_token": {
                        "type": "string",
                        "description": "Bearer token to check when the transport carries no Authorization header."
                    }
                }
            }),
        }
    }

    /// JSON schema of the tool's arguments as a bare object.
    pub(crate) fn input_object(self) -> Map<String, Value> {
        let Value::Object(schema) = self.input_schema() else {
            return Map::new();
        };
        schema
    }

    /// Catalog entry for this tool.
    pub(crate) fn descriptor(self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.as_str(),
            description: self.description(),
            input_schema: self.input_schema(),
        }
    }
}

/// Builds the static tool catalog.
pub(crate) fn catalog() -> Vec<ToolDescriptor> {
    ToolName::ALL.into_iter().map(ToolName::descriptor).collect()
}

/// A fully parsed tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ToolCall {
    /// `get_current_balance`; takes no arguments.
    GetCurrentBalance,
    /// `add_purchase` with its (possibly missing) fields.
    AddPurchase(AddPurchaseParams),
    /// `validate` with the token found in the request, if any.
    Validate {
        /// Candidate bearer token.
        bearer_token: Option<String>,
    },
}

impl ToolCall {
    /// Parses a raw `(name, arguments)` pair.
    ///
    /// Arguments are read leniently and never rejected. `header_token` is the
    /// token carried by the transport itself (an HTTP `Authorization`
    /// header); it takes precedence over `arguments.bearer_token` for
    /// `validate`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnknownTool`] for names outside the catalog.
    pub(crate) fn parse(
        name: Option<&str>,
        arguments: &Value,
        header_token: Option<String>,
    ) -> Result<Self, DispatchError> {
        let tool = name.and_then(ToolName::from_name).ok_or_else(|| {
            DispatchError::UnknownTool(name.map_or_else(|| "null".to_owned(), ToOwned::to_owned))
        })?;
        match tool {
            ToolName::GetCurrentBalance => Ok(Self::GetCurrentBalance),
            ToolName::AddPurchase => Ok(Self::AddPurchase(AddPurchaseParams::from_arguments(
                arguments,
            ))),
            ToolName::Validate => Ok(Self::Validate {
                bearer_token: header_token
                    .or_else(|| ValidateParams::from_arguments(arguments).bearer_token),
            }),
        }
    }

    /// The tool this call targets.
    pub(crate) const fn tool(&self) -> ToolName {
        match *self {
            Self::GetCurrentBalance => ToolName::GetCurrentBalance,
            Self::AddPurchase(_) => ToolName::AddPurchase,
            Self::Validate { .. } => ToolName::Validate,
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
    use serde_json::json;

    use super::{ToolCall, ToolName, catalog};
    use crate::params::AddPurchaseParams;

    #[test]
    fn catalog_has_exactly_three_tools_in_order() {
        let names: Vec<&str> = catalog().iter().map(|tool| tool.name).collect();
        assert_eq!(names, ["get_current_balance", "add_purchase", "validate"]);
    }

    #[test]
    fn add_purchase_schema_requires_all_fields() {
        let schema = ToolName::AddPurchase.descriptor().input_schema;
        assert_eq!(schema["required"], json!(["item_name", "cost", "category"]));
        assert_eq!(schema["properties"]["cost"]["type"], "number");
    }

    #[test]
    fn input_object_is_the_descriptor_schema() {
        for tool in ToolName::ALL {
            assert_eq!(
                serde_json::Value::Object(tool.input_object()),
                tool.descriptor().input_schema
            );
        }
    }

    #[test]
    fn names_round_trip_through_lookup() {
        for tool in ToolName::ALL {
            assert_eq!(ToolName::from_name(tool.as_str()), Some(tool));
        }
        assert_eq!(ToolName::from_name("GET_CURRENT_BALANCE"), None);
    }

    #[test]
    fn balance_call_ignores_arguments() {
        let call = ToolCall::parse(Some("get_current_balance"), &json!({"junk": 1}), None)
            .expect("parse");
        assert_eq!(call, ToolCall::GetCurrentBalance);
    }

    #[test]
    fn add_purchase_parses_fields() {
        let call = ToolCall::parse(
            Some("add_purchase"),
            &json!({"item_name": "Coffee", "cost": 150, "category": "Food"}),
            None,
        )
        .expect("parse");
        assert_eq!(
            call,
            ToolCall::AddPurchase(AddPurchaseParams {
                item_name: json!("Coffee"),
                cost: json!(150),
                category: json!("Food"),
            })
        );
    }

    #[test]
    fn add_purchase_with_null_arguments_passes_nulls_through() {
        let call = ToolCall::parse(Some("add_purchase"), &json!(null), None).expect("parse");
        assert_eq!(call, ToolCall::AddPurchase(AddPurchaseParams::default()));
    }

    #[test]
    fn add_purchase_passes_wrong_types_through() {
        let call = ToolCall::parse(Some("add_purchase"), &json!({"cost": "ten"}), None)
            .expect("arguments are not validated");
        assert_eq!(
            call,
            ToolCall::AddPurchase(AddPurchaseParams {
                cost: json!("ten"),
                ..AddPurchaseParams::default()
            })
        );
    }

    #[test]
    fn validate_with_non_object_arguments_has_no_token() {
        let call = ToolCall::parse(Some("validate"), &json!("x"), None).expect("parse");
        assert_eq!(call, ToolCall::Validate { bearer_token: None });
    }

    #[test]
    fn validate_prefers_header_token() {
        let call = ToolCall::parse(
            Some("validate"),
            &json!({"bearer_token": "from-args"}),
            Some("from-header".to_owned()),
        )
        .expect("parse");
        assert_eq!(
            call,
            ToolCall::Validate {
                bearer_token: Some("from-header".to_owned())
            }
        );
    }

    #[test]
    fn validate_falls_back_to_argument_token() {
        let call = ToolCall::parse(Some("validate"), &json!({"bearer_token": "abc"}), None)
            .expect("parse");
        assert_eq!(
            call,
            ToolCall::Validate {
                bearer_token: Some("abc".to_owned())
            }
        );
        assert_eq!(call.tool(), ToolName::Validate);
    }

    #[test]
    fn unknown_name_is_reported_verbatim() {
        let err = ToolCall::parse(Some("nonexistent_tool"), &json!({}), None).expect_err("unknown");
        assert_eq!(err.to_string(), "Unknown tool: nonexistent_tool");
    }

    #[test]
    fn missing_name_is_reported_as_null() {
        let err = ToolCall::parse(None, &json!({}), None).expect_err("unknown");
        assert_eq!(err.to_string(), "Unknown tool: null");
    }
}
