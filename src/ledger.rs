//! Ledger accessor: balance aggregation and purchase recording.
//!
//! The balance is never stored. It is recomputed from the two append-only
//! tables on every call with two independent reads and no transaction, so a
//! purchase inserted between the reads can yield a half-updated figure.

extern crate alloc;

use alloc::sync::Arc;

use crate::error::StorageError;
use crate::store::{AmountRow, LedgerStore, NewPurchase, Table};

/// Sums the amounts of `rows`, failing on the first null amount.
fn sum_amounts(table: Table, rows: &[AmountRow]) -> Result<f64, StorageError> {
    rows.iter().try_fold(0.0_f64, |total, row| {
        row.amount
            .map(|amount| total + amount)
            .ok_or(StorageError::MissingAmount {
                table: table.name(),
            })
    })
}

/// Read/append access to the ledger tables.
#[derive(Debug, Clone)]
pub(crate) struct Ledger {
    /// Backing row store.
    store: Arc<dyn LedgerStore>,
}

impl Ledger {
    /// Creates a ledger over `store`.
    pub(crate) fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Computes `sum(balance_updates) - sum(purchases)`.
    ///
    /// # Errors
    ///
    /// Returns the first [`StorageError`] hit while reading either table.
    pub(crate) async fn balance(&self) -> Result<f64, StorageError> {
        let credits = self.store.amounts(Table::BalanceUpdates).await?;
        let total_added = sum_amounts(Table::BalanceUpdates, &credits)?;

        let debits = self.store.amounts(Table::Purchases).await?;
        let total_spent = sum_amounts(Table::Purchases, &debits)?;

        tracing::debug!(total_added, total_spent, "computed balance");
        Ok(total_added - total_spent)
    }

    /// Records one purchase. Inputs are stored as given, without validation.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the insert fails.
    pub(crate) async fn add_purchase(&self, purchase: &NewPurchase) -> Result<(), StorageError> {
        self.store.insert_purchase(purchase).await?;
        tracing::info!(
            item_name = %purchase.item_name,
            amount = %purchase.amount,
            category = %purchase.category,
            "purchase recorded"
        );
        Ok(())
    }
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::float_cmp,
    clippy::missing_docs_in_private_items,
    reason = "test code uses expect and exact float sums of small integers"
)]
mod tests {
    extern crate alloc;

    use alloc::sync::Arc;

    use serde_json::{Value, json};

    use super::{Ledger, sum_amounts};
    use crate::error::StorageError;
    use crate::store::memory::MemoryStore;
    use crate::store::{AmountRow, NewPurchase, Table};

    fn ledger_over(store: &Arc<MemoryStore>) -> Ledger {
        let shared: Arc<MemoryStore> = Arc::clone(store);
        Ledger::new(shared)
    }

    fn purchase(item: &str, cost: Value, category: &str) -> NewPurchase {
        NewPurchase {
            item_name: json!(item),
            amount: cost,
            category: json!(category),
        }
    }

    #[test]
    fn empty_table_sums_to_zero() {
        assert_eq!(sum_amounts(Table::Purchases, &[]).expect("sum"), 0.0);
    }

    #[test]
    fn null_amount_fails_the_sum() {
        let rows = [AmountRow { amount: Some(1.0) }, AmountRow { amount: None }];
        assert!(matches!(
            sum_amounts(Table::Purchases, &rows),
            Err(StorageError::MissingAmount { table: "purchases" })
        ));
    }

    #[tokio::test]
    async fn balance_is_credits_minus_purchases_after_each_mutation() {
        let store = Arc::new(MemoryStore::new());
        let ledger = ledger_over(&store);
        assert_eq!(ledger.balance().await.expect("balance"), 0.0);

        store.credit(1000.0).await;
        store.credit(250.0).await;
        assert_eq!(ledger.balance().await.expect("balance"), 1250.0);

        ledger
            .add_purchase(&purchase("Coffee", json!(150), "Food"))
            .await
            .expect("insert");
        assert_eq!(ledger.balance().await.expect("balance"), 1100.0);

        ledger
            .add_purchase(&purchase("Bus", json!(40), "Transport"))
            .await
            .expect("insert");
        assert_eq!(ledger.balance().await.expect("balance"), 1060.0);
    }

    #[tokio::test]
    async fn negative_cost_increases_balance() {
        let store = Arc::new(MemoryStore::new());
        let ledger = ledger_over(&store);
        store.credit(100.0).await;
        ledger
            .add_purchase(&purchase("Refund", json!(-20), "Misc"))
            .await
            .expect("insert");
        assert_eq!(ledger.balance().await.expect("balance"), 120.0);
    }

    #[tokio::test]
    async fn purchase_without_cost_breaks_balance_reads() {
        let ledger = Ledger::new(Arc::new(MemoryStore::new()));
        ledger
            .add_purchase(&purchase("Mystery", Value::Null, "Misc"))
            .await
            .expect("insert accepts null cost");
        assert!(matches!(
            ledger.balance().await,
            Err(StorageError::MissingAmount { .. })
        ));
    }

    #[tokio::test]
    async fn numeric_string_cost_counts_toward_balance() {
        let store = Arc::new(MemoryStore::new());
        let ledger = ledger_over(&store);
        store.credit(500.0).await;
        ledger
            .add_purchase(&purchase("Coffee", json!("150"), "Food"))
            .await
            .expect("store casts numeric strings");
        assert_eq!(ledger.balance().await.expect("balance"), 350.0);
    }

    #[tokio::test]
    async fn storage_failure_propagates_as_error() {
        let store = Arc::new(MemoryStore::new());
        let ledger = ledger_over(&store);
        store.close().await;
        assert!(ledger.balance().await.is_err());
        assert!(
            ledger
                .add_purchase(&purchase("Coffee", json!(1), "Food"))
                .await
                .is_err()
        );
    }
}
