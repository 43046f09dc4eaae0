use async_trait::async_trait;
use boxoffice_core::repository::{EventRepository, LocationRepository, ScheduleRepository};
use boxoffice_core::{CoreError, CoreResult};
use boxoffice_shared::{Event, Location, Schedule};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// Postgres storage for events and the locations and schedules they reference.
pub struct StoreCatalogRepository {
    pool: PgPool,
}

impl StoreCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn soft_delete(&self, table: &str, id: Uuid) -> CoreResult<bool> {
        let sql = format!(
            "UPDATE {table} SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL"
        );
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(CoreError::storage)?;
        Ok(result.rows_affected() == 1)
    }
}

// ============================================================================
// Row types
// ============================================================================

#[derive(sqlx::FromRow)]
struct LocationRow {
    id: Uuid,
    name: String,
    address: String,
    city: String,
    state: String,
    country: String,
    postal_code: String,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<LocationRow> for Location {
    fn from(row: LocationRow) -> Self {
        Location {
            id: row.id,
            name: row.name,
            address: row.address,
            city: row.city,
            state: row.state,
            country: row.country,
            postal_code: row.postal_code,
            record: row.deleted_at.into(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ScheduleRow {
    id: Uuid,
    title: String,
    description: String,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ScheduleRow> for Schedule {
    fn from(row: ScheduleRow) -> Self {
        Schedule {
            id: row.id,
            title: row.title,
            description: row.description,
            start_date: row.start_date,
            end_date: row.end_date,
            record: row.deleted_at.into(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct EventRow {
    id: Uuid,
    name: String,
    description: String,
    location_id: Uuid,
    schedule_id: Uuid,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Event {
            id: row.id,
            name: row.name,
            description: row.description,
            location_id: row.location_id,
            schedule_id: row.schedule_id,
            record: row.deleted_at.into(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const LOCATION_COLUMNS: &str =
    "id, name, address, city, state, country, postal_code, deleted_at, created_at, updated_at";
const SCHEDULE_COLUMNS: &str =
    "id, title, description, start_date, end_date, deleted_at, created_at, updated_at";
const EVENT_COLUMNS: &str =
    "id, name, description, location_id, schedule_id, deleted_at, created_at, updated_at";

#[async_trait]
impl LocationRepository for StoreCatalogRepository {
    async fn create_location(&self, l: &Location) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO locations (id, name, address, city, state, country, postal_code, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(l.id)
        .bind(l.name.as_str())
        .bind(l.address.as_str())
        .bind(l.city.as_str())
        .bind(l.state.as_str())
        .bind(l.country.as_str())
        .bind(l.postal_code.as_str())
        .bind(l.created_at)
        .bind(l.updated_at)
        .execute(&self.pool)
        .await
        .map_err(CoreError::storage)?;
        Ok(())
    }

    async fn get_location(&self, id: Uuid) -> CoreResult<Option<Location>> {
        let sql = format!("SELECT {LOCATION_COLUMNS} FROM locations WHERE id = $1 AND deleted_at IS NULL");
        let row = sqlx::query_as::<_, LocationRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(CoreError::storage)?;
        Ok(row.map(Location::from))
    }

    async fn list_locations(&self) -> CoreResult<Vec<Location>> {
        let sql = format!("SELECT {LOCATION_COLUMNS} FROM locations WHERE deleted_at IS NULL ORDER BY created_at");
        let rows = sqlx::query_as::<_, LocationRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(CoreError::storage)?;
        Ok(rows.into_iter().map(Location::from).collect())
    }

    async fn update_location(&self, l: &Location) -> CoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE locations
            SET name = $2, address = $3, city = $4, state = $5, country = $6, postal_code = $7, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(l.id)
        .bind(l.name.as_str())
        .bind(l.address.as_str())
        .bind(l.city.as_str())
        .bind(l.state.as_str())
        .bind(l.country.as_str())
        .bind(l.postal_code.as_str())
        .execute(&self.pool)
        .await
        .map_err(CoreError::storage)?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete_location(&self, id: Uuid) -> CoreResult<bool> {
        self.soft_delete("locations", id).await
    }
}

#[async_trait]
impl ScheduleRepository for StoreCatalogRepository {
    async fn create_schedule(&self, s: &Schedule) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO schedules (id, title, description, start_date, end_date, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(s.id)
        .bind(s.title.as_str())
        .bind(s.description.as_str())
        .bind(s.start_date)
        .bind(s.end_date)
        .bind(s.created_at)
        .bind(s.updated_at)
        .execute(&self.pool)
        .await
        .map_err(CoreError::storage)?;
        Ok(())
    }

    async fn get_schedule(&self, id: Uuid) -> CoreResult<Option<Schedule>> {
        let sql = format!("SELECT {SCHEDULE_COLUMNS} FROM schedules WHERE id = $1 AND deleted_at IS NULL");
        let row = sqlx::query_as::<_, ScheduleRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(CoreError::storage)?;
        Ok(row.map(Schedule::from))
    }

    async fn list_schedules(&self) -> CoreResult<Vec<Schedule>> {
        let sql = format!("SELECT {SCHEDULE_COLUMNS} FROM schedules WHERE deleted_at IS NULL ORDER BY start_date");
        let rows = sqlx::query_as::<_, ScheduleRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(CoreError::storage)?;
        Ok(rows.into_iter().map(Schedule::from).collect())
    }

    async fn update_schedule(&self, s: &Schedule) -> CoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE schedules
            SET title = $2, description = $3, start_date = $4, end_date = $5, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(s.id)
        .bind(s.title.as_str())
        .bind(s.description.as_str())
        .bind(s.start_date)
        .bind(s.end_date)
        .execute(&self.pool)
        .await
        .map_err(CoreError::storage)?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete_schedule(&self, id: Uuid) -> CoreResult<bool> {
        self.soft_delete("schedules", id).await
    }
}

#[async_trait]
impl EventRepository for StoreCatalogRepository {
    async fn create_event(&self, e: &Event) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO events (id, name, description, location_id, schedule_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(e.id)
        .bind(e.name.as_str())
        .bind(e.description.as_str())
        .bind(e.location_id)
        .bind(e.schedule_id)
        .bind(e.created_at)
        .bind(e.updated_at)
        .execute(&self.pool)
        .await
        .map_err(CoreError::storage)?;
        Ok(())
    }

    async fn get_event(&self, id: Uuid) -> CoreResult<Option<Event>> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1 AND deleted_at IS NULL");
        let row = sqlx::query_as::<_, EventRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(CoreError::storage)?;
        Ok(row.map(Event::from))
    }

    async fn list_events(&self) -> CoreResult<Vec<Event>> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE deleted_at IS NULL ORDER BY created_at");
        let rows = sqlx::query_as::<_, EventRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(CoreError::storage)?;
        Ok(rows.into_iter().map(Event::from).collect())
    }

    async fn update_event(&self, e: &Event) -> CoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE events
            SET name = $2, description = $3, location_id = $4, schedule_id = $5, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(e.id)
        .bind(e.name.as_str())
        .bind(e.description.as_str())
        .bind(e.location_id)
        .bind(e.schedule_id)
        .execute(&self.pool)
        .await
        .map_err(CoreError::storage)?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete_event(&self, id: Uuid) -> CoreResult<bool> {
        self.soft_delete("events", id).await
    }
}
