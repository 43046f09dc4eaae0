use async_trait::async_trait;
use boxoffice_core::repository::{InventoryStore, TicketTypeRepository};
use boxoffice_core::{CoreError, CoreResult};
use boxoffice_shared::{RecordState, TicketType};
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory ticket-type store.
///
/// Each quota operation takes the write lock once, so check and update happen together
/// and concurrent reservations cannot oversell.
pub struct InventoryManager {
    ticket_types: RwLock<HashMap<Uuid, TicketType>>,
}

impl InventoryManager {
    pub fn new() -> Self {
        Self {
            ticket_types: RwLock::new(HashMap::new()),
        }
    }

    /// Seeds the store with existing records.
    pub fn with_ticket_types(ticket_types: impl IntoIterator<Item = TicketType>) -> Self {
        let map = ticket_types.into_iter().map(|tt| (tt.id, tt)).collect();
        Self {
            ticket_types: RwLock::new(map),
        }
    }

    async fn list_where<F>(&self, keep: F) -> Vec<TicketType>
    where
        F: Fn(&TicketType) -> bool,
    {
        let guard = self.ticket_types.read().await;
        let mut out: Vec<TicketType> = guard
            .values()
            .filter(|tt| tt.is_active() && keep(tt))
            .cloned()
            .collect();
        out.sort_by_key(|tt| tt.created_at);
        out
    }
}

impl Default for InventoryManager {
    fn default() -> Self {
        Self::new()
    }
}

fn active_mut<'a>(map: &'a mut HashMap<Uuid, TicketType>, id: Uuid) -> CoreResult<&'a mut TicketType> {
    map.get_mut(&id)
        .filter(|tt| tt.is_active())
        .ok_or_else(|| CoreError::not_found("ticket type", id))
}

#[async_trait]
impl InventoryStore for InventoryManager {
    async fn fetch_ticket_type(&self, id: Uuid) -> CoreResult<TicketType> {
        let guard = self.ticket_types.read().await;
        guard
            .get(&id)
            .filter(|tt| tt.is_active())
            .cloned()
            .ok_or_else(|| CoreError::not_found("ticket type", id))
    }

    async fn reserve_quota(&self, id: Uuid, quantity: i32) -> CoreResult<TicketType> {
        let mut guard = self.ticket_types.write().await;
        let tt = active_mut(&mut guard, id)?;

        if tt.remaining_quota < quantity {
            return Err(CoreError::InsufficientInventory {
                ticket_type_id: id,
                requested: quantity,
                available: tt.remaining_quota,
            });
        }

        tt.remaining_quota -= quantity;
        tt.updated_at = Utc::now();
        Ok(tt.clone())
    }

    async fn release_quota(&self, id: Uuid, quantity: i32) -> CoreResult<TicketType> {
        let mut guard = self.ticket_types.write().await;
        let tt = active_mut(&mut guard, id)?;

        tt.remaining_quota = (tt.remaining_quota + quantity).min(tt.quota);
        tt.updated_at = Utc::now();
        Ok(tt.clone())
    }

    async fn resize_quota(&self, id: Uuid, new_quota: i32) -> CoreResult<TicketType> {
        let mut guard = self.ticket_types.write().await;
        let tt = active_mut(&mut guard, id)?;

        let sold = tt.sold();
        if new_quota < 0 || new_quota < sold {
            return Err(CoreError::InvalidQuota(format!(
                "quota {} is below the {} tickets already sold",
                new_quota, sold
            )));
        }

        let delta = new_quota - tt.quota;
        tt.quota = new_quota;
        tt.remaining_quota += delta;
        tt.updated_at = Utc::now();
        Ok(tt.clone())
    }
}

#[async_trait]
impl TicketTypeRepository for InventoryManager {
    async fn create_ticket_type(&self, ticket_type: &TicketType) -> CoreResult<()> {
        let mut guard = self.ticket_types.write().await;
        guard.insert(ticket_type.id, ticket_type.clone());
        Ok(())
    }

    async fn get_ticket_type(&self, id: Uuid) -> CoreResult<Option<TicketType>> {
        let guard = self.ticket_types.read().await;
        Ok(guard.get(&id).filter(|tt| tt.is_active()).cloned())
    }

    async fn list_ticket_types(&self) -> CoreResult<Vec<TicketType>> {
        Ok(self.list_where(|_| true).await)
    }

    async fn list_ticket_types_by_event(&self, event_id: Uuid) -> CoreResult<Vec<TicketType>> {
        Ok(self.list_where(|tt| tt.event_id == event_id).await)
    }

    async fn list_available_ticket_types(&self, event_id: Uuid) -> CoreResult<Vec<TicketType>> {
        Ok(self
            .list_where(|tt| tt.event_id == event_id && tt.remaining_quota > 0)
            .await)
    }

    async fn update_ticket_type_details(
        &self,
        id: Uuid,
        name: &str,
        description: &str,
        price: Decimal,
    ) -> CoreResult<Option<TicketType>> {
        let mut guard = self.ticket_types.write().await;
        let Some(tt) = guard.get_mut(&id).filter(|tt| tt.is_active()) else {
            return Ok(None);
        };

        tt.name = name.to_string();
        tt.description = description.to_string();
        tt.price = price;
        tt.updated_at = Utc::now();
        Ok(Some(tt.clone()))
    }

    async fn delete_unsold_ticket_type(&self, id: Uuid) -> CoreResult<bool> {
        let mut guard = self.ticket_types.write().await;
        match guard.get_mut(&id) {
            Some(tt) if tt.is_active() && !tt.has_sales() => {
                tt.record = RecordState::deleted_now();
                tt.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
