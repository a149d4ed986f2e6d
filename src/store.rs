//! Row-store abstraction behind the ledger.
//!
//! The ledger only needs two projections (`amount` from each table) and one
//! insert, so any backend exposing read-all and insert primitives fits.

pub(crate) mod memory;
pub(crate) mod supabase;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StorageError;

/// Ledger tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Table {
    /// Credits applied by external events.
    BalanceUpdates,
    /// Purchases recorded through `add_purchase`.
    Purchases,
}

impl Table {
    /// Table name in the store.
    pub(crate) const fn name(self) -> &'static str {
        match self {
            Self::BalanceUpdates => "balance_updates",
            Self::Purchases => "purchases",
        }
    }
}

/// The `amount` projection of a ledger row.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub(crate) struct AmountRow {
    /// Row amount; `None` when the stored value is null.
    #[serde(default)]
    pub(crate) amount: Option<f64>,
}

/// A purchase row as inserted into the `purchases` table.
///
/// Values are passed through exactly as the caller sent them. Missing
/// arguments are stored as null, and type coercion is left to the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct NewPurchase {
    /// Name of the purchased item.
    pub(crate) item_name: Value,
    /// Cost of the item.
    pub(crate) amount: Value,
    /// Spending category.
    pub(crate) category: Value,
}

/// Backend holding the ledger rows.
#[async_trait]
pub(crate) trait LedgerStore: Send + Sync + core::fmt::Debug {
    /// Reads the `amount` column of every row in `table`.
    async fn amounts(&self, table: Table) -> Result<Vec<AmountRow>, StorageError>;

    /// Appends one row to the `purchases` table.
    async fn insert_purchase(&self, purchase: &NewPurchase) -> Result<(), StorageError>;
}
