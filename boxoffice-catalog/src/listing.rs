use boxoffice_core::repository::{EventRepository, LocationRepository, ScheduleRepository};
use boxoffice_core::{CoreError, CoreResult};
use boxoffice_shared::{Event, EventDetails, Location, RecordState, Schedule};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

// ============================================================================
// Request types
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct LocationInput {
    pub name: String,
    pub address: String,
    pub city: String,
    #[serde(default)]
    pub state: String,
    pub country: String,
    #[serde(default)]
    pub postal_code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub location_id: Uuid,
    pub schedule_id: Uuid,
}

/// Events and the locations and schedules they reference.
pub struct EventService {
    events: Arc<dyn EventRepository>,
    locations: Arc<dyn LocationRepository>,
    schedules: Arc<dyn ScheduleRepository>,
}

impl EventService {
    pub fn new(
        events: Arc<dyn EventRepository>,
        locations: Arc<dyn LocationRepository>,
        schedules: Arc<dyn ScheduleRepository>,
    ) -> Self {
        Self { events, locations, schedules }
    }

    // ---- locations ----

    pub async fn create_location(&self, input: LocationInput) -> CoreResult<Location> {
        require("name", &input.name)?;
        require("city", &input.city)?;
        let now = Utc::now();
        let location = Location {
            id: Uuid::new_v4(),
            name: input.name,
            address: input.address,
            city: input.city,
            state: input.state,
            country: input.country,
            postal_code: input.postal_code,
            record: RecordState::Active,
            created_at: now,
            updated_at: now,
        };
        self.locations.create_location(&location).await?;
        Ok(location)
    }

    pub async fn get_location(&self, id: Uuid) -> CoreResult<Location> {
        self.locations
            .get_location(id)
            .await?
            .ok_or_else(|| CoreError::not_found("location", id))
    }

    pub async fn list_locations(&self) -> CoreResult<Vec<Location>> {
        self.locations.list_locations().await
    }

    pub async fn update_location(&self, id: Uuid, input: LocationInput) -> CoreResult<Location> {
        require("name", &input.name)?;
        require("city", &input.city)?;
        let mut location = self.get_location(id).await?;
        location.name = input.name;
        location.address = input.address;
        location.city = input.city;
        location.state = input.state;
        location.country = input.country;
        location.postal_code = input.postal_code;
        location.updated_at = Utc::now();

        if !self.locations.update_location(&location).await? {
            return Err(CoreError::not_found("location", id));
        }
        Ok(location)
    }

    pub async fn delete_location(&self, id: Uuid) -> CoreResult<()> {
        if !self.locations.delete_location(id).await? {
            return Err(CoreError::not_found("location", id));
        }
        Ok(())
    }

    // ---- schedules ----

    pub async fn create_schedule(&self, input: ScheduleInput) -> CoreResult<Schedule> {
        validate_schedule(&input)?;
        let now = Utc::now();
        let schedule = Schedule {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            start_date: input.start_date,
            end_date: input.end_date,
            record: RecordState::Active,
            created_at: now,
            updated_at: now,
        };
        self.schedules.create_schedule(&schedule).await?;
        Ok(schedule)
    }

    pub async fn get_schedule(&self, id: Uuid) -> CoreResult<Schedule> {
        self.schedules
            .get_schedule(id)
            .await?
            .ok_or_else(|| CoreError::not_found("schedule", id))
    }

    pub async fn list_schedules(&self) -> CoreResult<Vec<Schedule>> {
        self.schedules.list_schedules().await
    }

    pub async fn update_schedule(&self, id: Uuid, input: ScheduleInput) -> CoreResult<Schedule> {
        validate_schedule(&input)?;
        let mut schedule = self.get_schedule(id).await?;
        schedule.title = input.title;
        schedule.description = input.description;
        schedule.start_date = input.start_date;
        schedule.end_date = input.end_date;
        schedule.updated_at = Utc::now();

        if !self.schedules.update_schedule(&schedule).await? {
            return Err(CoreError::not_found("schedule", id));
        }
        Ok(schedule)
    }

    pub async fn delete_schedule(&self, id: Uuid) -> CoreResult<()> {
        if !self.schedules.delete_schedule(id).await? {
            return Err(CoreError::not_found("schedule", id));
        }
        Ok(())
    }

    // ---- events ----

    pub async fn create_event(&self, input: EventInput) -> CoreResult<EventDetails> {
        require("name", &input.name)?;
        let (location, schedule) = self.resolve_refs(input.location_id, input.schedule_id).await?;

        let now = Utc::now();
        let event = Event {
            id: Uuid::new_v4(),
            name: input.name,
            description: input.description,
            location_id: input.location_id,
            schedule_id: input.schedule_id,
            record: RecordState::Active,
            created_at: now,
            updated_at: now,
        };
        self.events.create_event(&event).await?;

        tracing::info!("Created event {} at location {}", event.id, event.location_id);
        Ok(EventDetails {
            event,
            location: Some(location),
            schedule: Some(schedule),
        })
    }

    /// Event with its location and schedule embedded.
    pub async fn get_event(&self, id: Uuid) -> CoreResult<EventDetails> {
        let event = self
            .events
            .get_event(id)
            .await?
            .ok_or_else(|| CoreError::not_found("event", id))?;
        self.embed(event).await
    }

    pub async fn list_events(&self) -> CoreResult<Vec<EventDetails>> {
        let events = self.events.list_events().await?;
        let mut out = Vec::with_capacity(events.len());
        for event in events {
            out.push(self.embed(event).await?);
        }
        Ok(out)
    }

    pub async fn update_event(&self, id: Uuid, input: EventInput) -> CoreResult<EventDetails> {
        require("name", &input.name)?;
        let mut event = self
            .events
            .get_event(id)
            .await?
            .ok_or_else(|| CoreError::not_found("event", id))?;
        let (location, schedule) = self.resolve_refs(input.location_id, input.schedule_id).await?;

        event.name = input.name;
        event.description = input.description;
        event.location_id = input.location_id;
        event.schedule_id = input.schedule_id;
        event.updated_at = Utc::now();

        if !self.events.update_event(&event).await? {
            return Err(CoreError::not_found("event", id));
        }
        Ok(EventDetails {
            event,
            location: Some(location),
            schedule: Some(schedule),
        })
    }

    pub async fn delete_event(&self, id: Uuid) -> CoreResult<()> {
        if !self.events.delete_event(id).await? {
            return Err(CoreError::not_found("event", id));
        }
        Ok(())
    }

    async fn resolve_refs(&self, location_id: Uuid, schedule_id: Uuid) -> CoreResult<(Location, Schedule)> {
        let location = self.get_location(location_id).await?;
        let schedule = self.get_schedule(schedule_id).await?;
        Ok((location, schedule))
    }

    async fn embed(&self, event: Event) -> CoreResult<EventDetails> {
        let location = self.locations.get_location(event.location_id).await?;
        let schedule = self.schedules.get_schedule(event.schedule_id).await?;
        Ok(EventDetails { event, location, schedule })
    }
}

fn require(field: &str, value: &str) -> CoreResult<()> {
    if value.trim().is_empty() {
        return Err(CoreError::ValidationError(format!("{} is required", field)));
    }
    Ok(())
}

fn validate_schedule(input: &ScheduleInput) -> CoreResult<()> {
    require("title", &input.title)?;
    if input.end_date < input.start_date {
        return Err(CoreError::ValidationError(
            "end_date must not be before start_date".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::InMemoryDirectory;
    use chrono::Duration;

    fn service() -> EventService {
        let dir = Arc::new(InMemoryDirectory::new());
        EventService::new(dir.clone(), dir.clone(), dir)
    }

    fn location_input() -> LocationInput {
        LocationInput {
            name: "Istora Senayan".into(),
            address: "Jl. Pintu Satu".into(),
            city: "Jakarta".into(),
            state: "DKI Jakarta".into(),
            country: "ID".into(),
            postal_code: "10270".into(),
        }
    }

    fn schedule_input(hours: i64) -> ScheduleInput {
        let start = Utc::now();
        ScheduleInput {
            title: "Evening".into(),
            description: String::new(),
            start_date: start,
            end_date: start + Duration::hours(hours),
        }
    }

    #[tokio::test]
    async fn test_schedule_must_not_end_before_start() {
        let svc = service();
        let err = svc.create_schedule(schedule_input(-1)).await.unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
        assert!(svc.create_schedule(schedule_input(0)).await.is_ok());
    }

    #[tokio::test]
    async fn test_event_embeds_references() {
        let svc = service();
        let location = svc.create_location(location_input()).await.unwrap();
        let schedule = svc.create_schedule(schedule_input(3)).await.unwrap();

        let created = svc
            .create_event(EventInput {
                name: "Java Jazz".into(),
                description: String::new(),
                location_id: location.id,
                schedule_id: schedule.id,
            })
            .await
            .unwrap();

        let fetched = svc.get_event(created.event.id).await.unwrap();
        assert_eq!(fetched.location.as_ref().map(|l| l.id), Some(location.id));
        assert_eq!(fetched.schedule.as_ref().map(|s| s.id), Some(schedule.id));

        let json = serde_json::to_value(&fetched).unwrap();
        assert_eq!(json["name"], "Java Jazz");
        assert_eq!(json["location"]["city"], "Jakarta");
    }

    #[tokio::test]
    async fn test_event_requires_existing_references() {
        let svc = service();
        let location = svc.create_location(location_input()).await.unwrap();

        let err = svc
            .create_event(EventInput {
                name: "Orphan".into(),
                description: String::new(),
                location_id: location.id,
                schedule_id: Uuid::new_v4(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
        assert!(svc.list_events().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deleted_location_is_not_found() {
        let svc = service();
        let location = svc.create_location(location_input()).await.unwrap();
        svc.delete_location(location.id).await.unwrap();

        assert!(matches!(svc.get_location(location.id).await, Err(CoreError::NotFound(_))));
        assert!(matches!(svc.delete_location(location.id).await, Err(CoreError::NotFound(_))));
        assert!(matches!(
            svc.update_location(location.id, location_input()).await,
            Err(CoreError::NotFound(_))
        ));
    }
}
