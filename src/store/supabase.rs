//! Supabase ledger store, spoken to through its PostgREST endpoint.

use core::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};

use super::{AmountRow, LedgerStore, NewPurchase, Table};
use crate::error::{ConfigError, StorageError};

/// Path prefix of the PostgREST API under the project URL.
const REST_PATH: &str = "rest/v1";

/// Ledger store backed by a Supabase project.
pub(crate) struct SupabaseStore {
    /// Shared HTTP client.
    client: Client,
    /// Project URL without a trailing slash.
    base_url: String,
    /// Service or anon key, sent as both `apikey` and bearer token.
    api_key: String,
}

impl core::fmt::Debug for SupabaseStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SupabaseStore")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl SupabaseStore {
    /// Creates a store for the project at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Client`] if the HTTP client cannot be built.
    pub(crate) fn new(
        base_url: &str,
        api_key: String,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key,
        })
    }

    /// URL of the PostgREST resource for `table`.
    fn table_url(&self, table: Table) -> String {
        format!("{}/{REST_PATH}/{}", self.base_url, table.name())
    }

    /// Turns a non-success response into [`StorageError::Status`].
    async fn check(table: Table, response: Response) -> Result<Response, StorageError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(StorageError::Status {
            table: table.name(),
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl LedgerStore for SupabaseStore {
    async fn amounts(&self, table: Table) -> Result<Vec<AmountRow>, StorageError> {
        let response = self
            .client
            .get(self.table_url(table))
            .query(&[("select", "amount")])
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        let rows = Self::check(table, response).await?.json().await?;
        Ok(rows)
    }

    async fn insert_purchase(&self, purchase: &NewPurchase) -> Result<(), StorageError> {
        let response = self
            .client
            .post(self.table_url(Table::Purchases))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=minimal")
            .json(purchase)
            .send()
            .await?;
        let _accepted = Self::check(Table::Purchases, response).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::panic,
    clippy::missing_docs_in_private_items,
    reason = "test code uses expect and panic for readability"
)]
mod tests {
    use core::time::Duration;

    use serde_json::{Value, json};
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::SupabaseStore;
    use crate::error::StorageError;
    use crate::store::{AmountRow, LedgerStore, NewPurchase, Table};

    fn store_for(server: &MockServer) -> SupabaseStore {
        SupabaseStore::new(&server.uri(), "test-key".to_owned(), Duration::from_secs(5))
            .expect("client builds")
    }

    #[tokio::test]
    async fn reads_amount_projection_with_auth_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/balance_updates"))
            .and(query_param("select", "amount"))
            .and(header("apikey", "test-key"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"amount": 1000}, {"amount": 250.5}])),
            )
            .mount(&server)
            .await;

        let rows = store_for(&server)
            .amounts(Table::BalanceUpdates)
            .await
            .expect("rows decode");
        assert_eq!(
            rows,
            vec![
                AmountRow {
                    amount: Some(1000.0)
                },
                AmountRow {
                    amount: Some(250.5)
                },
            ]
        );
    }

    #[tokio::test]
    async fn null_amounts_decode_as_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/purchases"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"amount": null}])))
            .mount(&server)
            .await;

        let rows = store_for(&server)
            .amounts(Table::Purchases)
            .await
            .expect("rows decode");
        assert_eq!(rows, vec![AmountRow { amount: None }]);
    }

    #[tokio::test]
    async fn inserts_purchase_row() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/purchases"))
            .and(header("prefer", "return=minimal"))
            .and(body_json(json!({
                "item_name": "Coffee",
                "amount": 150.0,
                "category": "Food"
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let purchase = NewPurchase {
            item_name: json!("Coffee"),
            amount: json!(150.0),
            category: json!("Food"),
        };
        store_for(&server)
            .insert_purchase(&purchase)
            .await
            .expect("insert succeeds");
    }

    #[tokio::test]
    async fn missing_fields_are_sent_as_null() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/purchases"))
            .and(body_json(json!({
                "item_name": "Tea",
                "amount": null,
                "category": null
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let purchase = NewPurchase {
            item_name: json!("Tea"),
            amount: Value::Null,
            category: Value::Null,
        };
        store_for(&server)
            .insert_purchase(&purchase)
            .await
            .expect("insert succeeds");
    }

    #[tokio::test]
    async fn string_cost_is_sent_as_given() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/purchases"))
            .and(body_json(json!({
                "item_name": "Coffee",
                "amount": "150",
                "category": "Food"
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let purchase = NewPurchase {
            item_name: json!("Coffee"),
            amount: json!("150"),
            category: json!("Food"),
        };
        store_for(&server)
            .insert_purchase(&purchase)
            .await
            .expect("store casts the value");
    }

    #[tokio::test]
    async fn error_status_becomes_storage_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/purchases"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let err = store_for(&server)
            .amounts(Table::Purchases)
            .await
            .expect_err("401 is an error");
        match err {
            StorageError::Status {
                table,
                status,
                body,
            } => {
                assert_eq!(table, "purchases");
                assert_eq!(status, 401);
                assert_eq!(body, "invalid api key");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn trailing_slash_in_base_url_is_ignored() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/purchases"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let store = SupabaseStore::new(
            &format!("{}/", server.uri()),
            "test-key".to_owned(),
            Duration::from_secs(5),
        )
        .expect("client builds");
        let rows = store.amounts(Table::Purchases).await.expect("rows decode");
        assert!(rows.is_empty());
    }
}
