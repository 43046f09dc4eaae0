use boxoffice_core::repository::InventoryStore;
use boxoffice_core::{CoreError, CoreResult};
use boxoffice_shared::TicketType;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// One requested (ticket type, quantity) pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LineRequest {
    pub ticket_type_id: Uuid,
    pub quantity: i32,
}

/// A requested line with the unit price captured at quote time.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PricedLine {
    pub ticket_type_id: Uuid,
    pub quantity: i32,
    pub price_per_ticket: Decimal,
    pub subtotal: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct Quote {
    pub event_id: Uuid,
    pub lines: Vec<PricedLine>,
    pub total_amount: Decimal,
    pub priced_at: DateTime<Utc>,
}

/// Resolves current prices and checks availability for a set of requested lines.
///
/// The availability check is advisory: it reads the stored remaining quota but reserves
/// nothing. The authoritative check is the atomic reservation that follows.
pub struct PricingEngine {
    inventory: Arc<dyn InventoryStore>,
}

impl PricingEngine {
    pub fn new(inventory: Arc<dyn InventoryStore>) -> Self {
        Self { inventory }
    }

    pub async fn quote(&self, event_id: Uuid, requests: &[LineRequest]) -> CoreResult<Quote> {
        // 1. Resolve each distinct ticket type once
        let mut ticket_types: HashMap<Uuid, TicketType> = HashMap::new();
        let mut requested: HashMap<Uuid, i32> = HashMap::new();

        for req in requests {
            if !ticket_types.contains_key(&req.ticket_type_id) {
                let tt = self.inventory.fetch_ticket_type(req.ticket_type_id).await?;
                if tt.event_id != event_id {
                    return Err(CoreError::ValidationError(format!(
                        "ticket type {} does not belong to event {}",
                        tt.id, event_id
                    )));
                }
                ticket_types.insert(tt.id, tt);
            }
            // Saturating sum; step 2 rejects it against the remaining quota
            let wanted = requested.entry(req.ticket_type_id).or_insert(0);
            *wanted = wanted.saturating_add(req.quantity);
        }

        // 2. Check availability against the summed quantity per ticket type
        for req in requests {
            let tt = &ticket_types[&req.ticket_type_id];
            let wanted = requested[&req.ticket_type_id];
            if tt.remaining_quota < wanted {
                return Err(CoreError::InsufficientInventory {
                    ticket_type_id: tt.id,
                    requested: wanted,
                    available: tt.remaining_quota,
                });
            }
        }

        // 3. Price each line from the snapshot
        let mut lines: Vec<PricedLine> = Vec::with_capacity(requests.len());
        let mut total_amount = Decimal::ZERO;
        for req in requests {
            let price = ticket_types[&req.ticket_type_id].price;
            let subtotal = price
                .checked_mul(Decimal::from(req.quantity))
                .ok_or_else(|| amount_overflow(req.ticket_type_id))?;
            total_amount = total_amount
                .checked_add(subtotal)
                .ok_or_else(|| amount_overflow(req.ticket_type_id))?;
            lines.push(PricedLine {
                ticket_type_id: req.ticket_type_id,
                quantity: req.quantity,
                price_per_ticket: price,
                subtotal,
            });
        }

        Ok(Quote {
            event_id,
            lines,
            total_amount,
            priced_at: Utc::now(),
        })
    }
}

fn amount_overflow(ticket_type_id: Uuid) -> CoreError {
    CoreError::ValidationError(format!("amount for ticket type {} is out of range", ticket_type_id))
}
