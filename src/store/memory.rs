//! In-process ledger store for local runs and tests.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{AmountRow, LedgerStore, NewPurchase, Table};
use crate::error::StorageError;

/// Casts `value` into the numeric `amount` column.
///
/// Accepts numbers, numeric strings and null, like a Postgres `numeric`
/// column fed through PostgREST.
fn numeric_amount(value: &Value) -> Result<Option<f64>, StorageError> {
    if value.is_null() {
        return Ok(None);
    }
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|text| text.trim().parse().ok()))
        .map(Some)
        .ok_or_else(|| StorageError::Rejected {
            table: Table::Purchases.name(),
            column: "amount",
            value: value.to_string(),
        })
}

/// A stored purchase with its amount already cast.
#[derive(Debug, Clone)]
struct PurchaseRow {
    /// Row as inserted.
    row: NewPurchase,
    /// Numeric amount.
    amount: Option<f64>,
}

/// Rows held by [`MemoryStore`].
#[derive(Debug, Default)]
struct Rows {
    /// `balance_updates` rows.
    credits: Vec<AmountRow>,
    /// `purchases` rows.
    purchases: Vec<PurchaseRow>,
    /// When set, every operation fails with [`StorageError::Unavailable`].
    closed: bool,
}

/// Ledger store kept in memory; contents are lost on exit.
#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    /// Guarded row collections.
    rows: RwLock<Rows>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Appends a balance adjustment.
    pub(crate) async fn credit(&self, amount: f64) {
        self.rows.write().await.credits.push(AmountRow {
            amount: Some(amount),
        });
    }

    /// Makes every later operation fail, simulating a lost connection.
    #[cfg(test)]
    pub(crate) async fn close(&self) {
        self.rows.write().await.closed = true;
    }

    /// Returns a copy of the stored purchases.
    #[cfg(test)]
    pub(crate) async fn purchases(&self) -> Vec<NewPurchase> {
        self.rows
            .read()
            .await
            .purchases
            .iter()
            .map(|purchase| purchase.row.clone())
            .collect()
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn amounts(&self, table: Table) -> Result<Vec<AmountRow>, StorageError> {
        let rows = self.rows.read().await;
        if rows.closed {
            return Err(StorageError::Unavailable("memory store closed".to_owned()));
        }
        Ok(match table {
            Table::BalanceUpdates => rows.credits.clone(),
            Table::Purchases => rows
                .purchases
                .iter()
                .map(|purchase| AmountRow {
                    amount: purchase.amount,
                })
                .collect(),
        })
    }

    async fn insert_purchase(&self, purchase: &NewPurchase) -> Result<(), StorageError> {
        let mut rows = self.rows.write().await;
        if rows.closed {
            return Err(StorageError::Unavailable("memory store closed".to_owned()));
        }
        let amount = numeric_amount(&purchase.amount)?;
        rows.purchases.push(PurchaseRow {
            row: purchase.clone(),
            amount,
        });
        Ok(())
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

    use super::MemoryStore;
    use crate::error::StorageError;
    use crate::store::{AmountRow, LedgerStore, NewPurchase, Table};

    fn coffee() -> NewPurchase {
        NewPurchase {
            item_name: json!("Coffee"),
            amount: json!(150),
            category: json!("Food"),
        }
    }

    #[tokio::test]
    async fn new_store_is_empty() {
        let store = MemoryStore::new();
        let credits = store
            .amounts(Table::BalanceUpdates)
            .await
            .expect("read credits");
        let debits = store.amounts(Table::Purchases).await.expect("read debits");
        assert!(credits.is_empty());
        assert!(debits.is_empty());
    }

    #[tokio::test]
    async fn purchases_project_to_amount_rows() {
        let store = MemoryStore::new();
        store.insert_purchase(&coffee()).await.expect("insert");
        let rows = store.amounts(Table::Purchases).await.expect("read");
        assert_eq!(rows, vec![AmountRow { amount: Some(150.0) }]);
        assert_eq!(store.purchases().await, vec![coffee()]);
    }

    #[tokio::test]
    async fn numeric_string_amount_is_cast() {
        let store = MemoryStore::new();
        let purchase = NewPurchase {
            amount: json!(" 99.5 "),
            ..coffee()
        };
        store.insert_purchase(&purchase).await.expect("insert");
        let rows = store.amounts(Table::Purchases).await.expect("read");
        assert_eq!(rows, vec![AmountRow { amount: Some(99.5) }]);
    }

    #[tokio::test]
    async fn non_numeric_amount_is_rejected() {
        let store = MemoryStore::new();
        for amount in [json!("ten"), json!(true), json!({"value": 1})] {
            let purchase = NewPurchase {
                amount,
                ..coffee()
            };
            assert!(matches!(
                store.insert_purchase(&purchase).await,
                Err(StorageError::Rejected {
                    column: "amount",
                    ..
                })
            ));
        }
        assert!(store.purchases().await.is_empty());
    }

    #[tokio::test]
    async fn credits_land_in_balance_updates() {
        let store = MemoryStore::new();
        store.credit(500.0).await;
        let rows = store.amounts(Table::BalanceUpdates).await.expect("read");
        assert_eq!(rows, vec![AmountRow { amount: Some(500.0) }]);
    }

    #[tokio::test]
    async fn closed_store_rejects_everything() {
        let store = MemoryStore::new();
        store.close().await;
        assert!(matches!(
            store.amounts(Table::Purchases).await,
            Err(StorageError::Unavailable(_))
        ));
        assert!(matches!(
            store.insert_purchase(&coffee()).await,
            Err(StorageError::Unavailable(_))
        ));
    }
}
