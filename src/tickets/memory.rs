//! In-process ticket store

use super::traits::TicketStore;
use crate::types::{TicketId, TicketRecord};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Ticket store backed by a `HashMap`
///
/// Records live as long as the process. Useful for embedding in a single
/// process and for tests.
#[derive(Debug, Default)]
pub struct MemoryTicketStore {
    records: RwLock<HashMap<TicketId, TicketRecord>>,
}

impl MemoryTicketStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored tickets
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the store holds no tickets
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl TicketStore for MemoryTicketStore {
    async fn set(&self, ticket: &TicketId, record: &TicketRecord) -> crate::Result<()> {
        self.records
            .write()
            .await
            .insert(ticket.clone(), record.clone());
        Ok(())
    }

    async fn get(&self, ticket: &TicketId) -> crate::Result<Option<TicketRecord>> {
        Ok(self.records.read().await.get(ticket).cloned())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
