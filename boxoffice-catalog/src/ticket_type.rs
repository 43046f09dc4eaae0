use boxoffice_core::repository::{EventRepository, InventoryStore, TicketTypeRepository};
use boxoffice_core::{CoreError, CoreResult};
use boxoffice_shared::TicketType;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTicketType {
    pub event_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    pub quota: i32,
}

/// Partial update. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTicketType {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub quota: Option<i32>,
}

/// Lifecycle of ticket types: creation, edits, quota resizing and deletion.
pub struct TicketTypeService {
    repo: Arc<dyn TicketTypeRepository>,
    inventory: Arc<dyn InventoryStore>,
    events: Arc<dyn EventRepository>,
}

impl TicketTypeService {
    pub fn new(
        repo: Arc<dyn TicketTypeRepository>,
        inventory: Arc<dyn InventoryStore>,
        events: Arc<dyn EventRepository>,
    ) -> Self {
        Self { repo, inventory, events }
    }

    pub async fn create(&self, req: CreateTicketType) -> CoreResult<TicketType> {
        if req.name.trim().is_empty() {
            return Err(CoreError::ValidationError("name is required".to_string()));
        }
        validate_price(req.price)?;
        if req.quota < 0 {
            return Err(CoreError::InvalidQuota(format!("quota {} is negative", req.quota)));
        }
        if self.events.get_event(req.event_id).await?.is_none() {
            return Err(CoreError::not_found("event", req.event_id));
        }

        let ticket_type = TicketType::new(req.event_id, req.name, req.description, req.price, req.quota);
        self.repo.create_ticket_type(&ticket_type).await?;

        tracing::info!("Created ticket type {} for event {} with quota {}", ticket_type.id, ticket_type.event_id, ticket_type.quota);
        Ok(ticket_type)
    }

    pub async fn get(&self, id: Uuid) -> CoreResult<TicketType> {
        self.repo
            .get_ticket_type(id)
            .await?
            .ok_or_else(|| CoreError::not_found("ticket type", id))
    }

    pub async fn list(&self) -> CoreResult<Vec<TicketType>> {
        self.repo.list_ticket_types().await
    }

    pub async fn list_by_event(&self, event_id: Uuid) -> CoreResult<Vec<TicketType>> {
        self.repo.list_ticket_types_by_event(event_id).await
    }

    pub async fn list_available(&self, event_id: Uuid) -> CoreResult<Vec<TicketType>> {
        self.repo.list_available_ticket_types(event_id).await
    }

    /// Applies a partial update. A quota change goes through `resize_quota` first so an
    /// invalid quota leaves the other fields untouched. If the detail write then fails, the
    /// quota is resized back before the error is returned.
    pub async fn update(&self, id: Uuid, req: UpdateTicketType) -> CoreResult<TicketType> {
        let current = self.get(id).await?;

        if let Some(price) = req.price {
            validate_price(price)?;
        }
        if let Some(name) = &req.name {
            if name.trim().is_empty() {
                return Err(CoreError::ValidationError("name must not be empty".to_string()));
            }
        }

        let resized = match req.quota {
            Some(quota) if quota != current.quota => {
                self.resize_quota(id, quota).await?;
                true
            }
            _ => false,
        };

        let name = req.name.unwrap_or_else(|| current.name.clone());
        let description = req.description.unwrap_or_else(|| current.description.clone());
        let price = req.price.unwrap_or(current.price);

        let result = self
            .repo
            .update_ticket_type_details(id, &name, &description, price)
            .await
            .and_then(|updated| updated.ok_or_else(|| CoreError::not_found("ticket type", id)));

        if result.is_err() && resized {
            tracing::warn!("Detail update of ticket type {} failed, restoring quota {}", id, current.quota);
            if let Err(e) = self.inventory.resize_quota(id, current.quota).await {
                tracing::error!("Failed to restore quota of ticket type {}: {}", id, e);
            }
        }
        result
    }

    pub async fn resize_quota(&self, id: Uuid, new_quota: i32) -> CoreResult<TicketType> {
        let resized = self.inventory.resize_quota(id, new_quota).await?;
        tracing::info!("Resized ticket type {} to quota {} (remaining {})", id, resized.quota, resized.remaining_quota);
        Ok(resized)
    }

    /// Soft-deletes a ticket type that has no sales.
    pub async fn delete(&self, id: Uuid) -> CoreResult<()> {
        let current = self.get(id).await?;
        if current.has_sales() {
            return Err(CoreError::HasSoldTickets { ticket_type_id: id, sold: current.sold() });
        }

        if self.repo.delete_unsold_ticket_type(id).await? {
            tracing::info!("Deleted ticket type {}", id);
            return Ok(());
        }

        // Lost a race with a purchase or another delete
        match self.repo.get_ticket_type(id).await? {
            Some(tt) => Err(CoreError::HasSoldTickets { ticket_type_id: id, sold: tt.sold() }),
            None => Err(CoreError::not_found("ticket type", id)),
        }
    }
}

/// Largest price the `NUMERIC(12,2)` column holds.
fn max_price() -> Decimal {
    Decimal::new(999_999_999_999, 2)
}

fn validate_price(price: Decimal) -> CoreResult<()> {
    if price < Decimal::ZERO {
        return Err(CoreError::ValidationError(format!("price {} is negative", price)));
    }
    if price > max_price() {
        return Err(CoreError::ValidationError(format!("price {} exceeds {}", price, max_price())));
    }
    if price.normalize().scale() > 2 {
        return Err(CoreError::ValidationError(format!(
            "price {} has more than two decimal places",
            price
        )));
    }
    Ok(())
}
