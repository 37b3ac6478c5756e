//! Trait for ticket stores

use crate::types::{TicketId, TicketRecord};
use async_trait::async_trait;

/// Key-value store holding one [`TicketRecord`] per ticket id
///
/// Writes are last-writer-wins; there is no read-back after `set`. Record
/// lifetime (TTL) is the store's business, not the workflow's.
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Write `record` under `ticket`, replacing any previous value
    async fn set(&self, ticket: &TicketId, record: &TicketRecord) -> crate::Result<()>;

    /// Read the record under `ticket`; `None` if unknown or expired
    async fn get(&self, ticket: &TicketId) -> crate::Result<Option<TicketRecord>>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;

    /// Release connections held by the store
    async fn close(&self) {}
}
