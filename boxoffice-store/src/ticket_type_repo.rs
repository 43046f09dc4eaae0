use async_trait::async_trait;
use boxoffice_core::repository::{InventoryStore, TicketTypeRepository};
use boxoffice_core::{CoreError, CoreResult};
use boxoffice_shared::TicketType;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

const COLUMNS: &str =
    "id, event_id, name, description, price, quota, remaining_quota, deleted_at, created_at, updated_at";

pub struct StoreTicketTypeRepository {
    pool: PgPool,
}

impl StoreTicketTypeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_optional(&self, id: Uuid) -> CoreResult<Option<TicketType>> {
        let sql = format!("SELECT {COLUMNS} FROM ticket_types WHERE id = $1 AND deleted_at IS NULL");
        let row = sqlx::query_as::<_, TicketTypeRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(CoreError::storage)?;
        Ok(row.map(TicketType::from))
    }

    async fn fetch_where(&self, filter: &str, event_id: Option<Uuid>) -> CoreResult<Vec<TicketType>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM ticket_types WHERE deleted_at IS NULL {filter} ORDER BY created_at"
        );
        let mut query = sqlx::query_as::<_, TicketTypeRow>(&sql);
        if let Some(event_id) = event_id {
            query = query.bind(event_id);
        }
        let rows = query.fetch_all(&self.pool).await.map_err(CoreError::storage)?;
        Ok(rows.into_iter().map(TicketType::from).collect())
    }
}

#[derive(sqlx::FromRow)]
struct TicketTypeRow {
    id: Uuid,
    event_id: Uuid,
    name: String,
    description: String,
    price: Decimal,
    quota: i32,
    remaining_quota: i32,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TicketTypeRow> for TicketType {
    fn from(row: TicketTypeRow) -> Self {
        TicketType {
            id: row.id,
            event_id: row.event_id,
            name: row.name,
            description: row.description,
            price: row.price,
            quota: row.quota,
            remaining_quota: row.remaining_quota,
            record: row.deleted_at.into(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl InventoryStore for StoreTicketTypeRepository {
    async fn fetch_ticket_type(&self, id: Uuid) -> CoreResult<TicketType> {
        self.fetch_optional(id)
            .await?
            .ok_or_else(|| CoreError::not_found("ticket type", id))
    }

    async fn reserve_quota(&self, id: Uuid, quantity: i32) -> CoreResult<TicketType> {
        let sql = format!(
            r#"
            UPDATE ticket_types
            SET remaining_quota = remaining_quota - $2, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL AND remaining_quota >= $2
            RETURNING {COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, TicketTypeRow>(&sql)
            .bind(id)
            .bind(quantity)
            .fetch_optional(&self.pool)
            .await
            .map_err(CoreError::storage)?;

        match row {
            Some(row) => Ok(row.into()),
            None => {
                // The guard rejected the update; report what it saw
                let current = self.fetch_ticket_type(id).await?;
                Err(CoreError::InsufficientInventory {
                    ticket_type_id: id,
                    requested: quantity,
                    available: current.remaining_quota,
                })
            }
        }
    }

    async fn release_quota(&self, id: Uuid, quantity: i32) -> CoreResult<TicketType> {
        let sql = format!(
            r#"
            UPDATE ticket_types
            SET remaining_quota = LEAST(quota, remaining_quota + $2), updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {COLUMNS}
            "#
        );
        sqlx::query_as::<_, TicketTypeRow>(&sql)
            .bind(id)
            .bind(quantity)
            .fetch_optional(&self.pool)
            .await
            .map_err(CoreError::storage)?
            .map(TicketType::from)
            .ok_or_else(|| CoreError::not_found("ticket type", id))
    }

    async fn resize_quota(&self, id: Uuid, new_quota: i32) -> CoreResult<TicketType> {
        // SET expressions read the pre-update row, so the delta uses the old quota
        let sql = format!(
            r#"
            UPDATE ticket_types
            SET quota = $2, remaining_quota = remaining_quota + ($2 - quota), updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL AND $2 >= 0 AND $2 >= quota - remaining_quota
            RETURNING {COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, TicketTypeRow>(&sql)
            .bind(id)
            .bind(new_quota)
            .fetch_optional(&self.pool)
            .await
            .map_err(CoreError::storage)?;

        match row {
            Some(row) => Ok(row.into()),
            None => {
                let current = self.fetch_ticket_type(id).await?;
                Err(CoreError::InvalidQuota(format!(
                    "quota {} is below the {} tickets already sold",
                    new_quota,
                    current.sold()
                )))
            }
        }
    }
}

#[async_trait]
impl TicketTypeRepository for StoreTicketTypeRepository {
    async fn create_ticket_type(&self, tt: &TicketType) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO ticket_types (id, event_id, name, description, price, quota, remaining_quota, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(tt.id)
        .bind(tt.event_id)
        .bind(tt.name.as_str())
        .bind(tt.description.as_str())
        .bind(tt.price)
        .bind(tt.quota)
        .bind(tt.remaining_quota)
        .bind(tt.created_at)
        .bind(tt.updated_at)
        .execute(&self.pool)
        .await
        .map_err(CoreError::storage)?;
        Ok(())
    }

    async fn get_ticket_type(&self, id: Uuid) -> CoreResult<Option<TicketType>> {
        self.fetch_optional(id).await
    }

    async fn list_ticket_types(&self) -> CoreResult<Vec<TicketType>> {
        self.fetch_where("", None).await
    }

    async fn list_ticket_types_by_event(&self, event_id: Uuid) -> CoreResult<Vec<TicketType>> {
        self.fetch_where("AND event_id = $1", Some(event_id)).await
    }

    async fn list_available_ticket_types(&self, event_id: Uuid) -> CoreResult<Vec<TicketType>> {
        self.fetch_where("AND event_id = $1 AND remaining_quota > 0", Some(event_id))
            .await
    }

    async fn update_ticket_type_details(
        &self,
        id: Uuid,
        name: &str,
        description: &str,
        price: Decimal,
    ) -> CoreResult<Option<TicketType>> {
        let sql = format!(
            r#"
            UPDATE ticket_types
            SET name = $2, description = $3, price = $4, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, TicketTypeRow>(&sql)
            .bind(id)
            .bind(name)
            .bind(description)
            .bind(price)
            .fetch_optional(&self.pool)
            .await
            .map_err(CoreError::storage)?;
        Ok(row.map(TicketType::from))
    }

    async fn delete_unsold_ticket_type(&self, id: Uuid) -> CoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE ticket_types
            SET deleted_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL AND quota = remaining_quota
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(CoreError::storage)?;
        Ok(result.rows_affected() == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_maps_deleted_at_to_record_state() {
        let now = Utc::now();
        let row = TicketTypeRow {
            id: Uuid::new_v4(),
            event_id: Uuid::new_v4(),
            name: "Early Bird".into(),
            description: String::new(),
            price: Decimal::new(3500, 2),
            quota: 50,
            remaining_quota: 12,
            deleted_at: Some(now),
            created_at: now,
            updated_at: now,
        };

        let tt = TicketType::from(row);
        assert!(!tt.is_active());
        assert_eq!(tt.record.deleted_at(), Some(now));
        assert_eq!(tt.sold(), 38);
    }
}
