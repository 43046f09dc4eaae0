use async_trait::async_trait;
use boxoffice_core::repository::{EventRepository, LocationRepository, ScheduleRepository, UserRepository};
use boxoffice_core::{CoreError, CoreResult};
use boxoffice_shared::{Event, Location, RecordState, Schedule, User};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

trait Stored: Clone {
    fn id(&self) -> Uuid;
    fn record(&self) -> &RecordState;
    fn record_mut(&mut self) -> &mut RecordState;
    fn created_at(&self) -> DateTime<Utc>;
    fn set_created_at(&mut self, at: DateTime<Utc>);
    fn touch(&mut self);
}

macro_rules! stored {
    ($($ty:ty),*) => {
        $(impl Stored for $ty {
            fn id(&self) -> Uuid { self.id }
            fn record(&self) -> &RecordState { &self.record }
            fn record_mut(&mut self) -> &mut RecordState { &mut self.record }
            fn created_at(&self) -> DateTime<Utc> { self.created_at }
            fn set_created_at(&mut self, at: DateTime<Utc>) { self.created_at = at; }
            fn touch(&mut self) { self.updated_at = Utc::now(); }
        })*
    };
}

stored!(Event, Location, Schedule);

struct Table<T> {
    rows: RwLock<HashMap<Uuid, T>>,
}

impl<T: Stored> Table<T> {
    fn new() -> Self {
        Self { rows: RwLock::new(HashMap::new()) }
    }

    async fn insert(&self, row: &T) {
        self.rows.write().await.insert(row.id(), row.clone());
    }

    async fn get(&self, id: Uuid) -> Option<T> {
        self.rows.read().await.get(&id).filter(|r| r.record().is_active()).cloned()
    }

    async fn list(&self) -> Vec<T> {
        let guard = self.rows.read().await;
        let mut out: Vec<T> = guard.values().filter(|r| r.record().is_active()).cloned().collect();
        out.sort_by_key(|r| r.created_at());
        out
    }

    /// Replaces an active row, keeping its creation time and soft-delete state.
    async fn replace(&self, row: &T) -> bool {
        let mut guard = self.rows.write().await;
        match guard.get_mut(&row.id()) {
            Some(existing) if existing.record().is_active() => {
                let created_at = existing.created_at();
                *existing = row.clone();
                existing.set_created_at(created_at);
                *existing.record_mut() = RecordState::Active;
                existing.touch();
                true
            }
            _ => false,
        }
    }

    async fn soft_delete(&self, id: Uuid) -> bool {
        let mut guard = self.rows.write().await;
        match guard.get_mut(&id) {
            Some(existing) if existing.record().is_active() => {
                *existing.record_mut() = RecordState::deleted_now();
                existing.touch();
                true
            }
            _ => false,
        }
    }
}

/// Users keyed by id. Active users never share an email or a non-empty phone.
struct UserTable {
    rows: RwLock<HashMap<Uuid, User>>,
}

impl UserTable {
    fn new() -> Self {
        Self { rows: RwLock::new(HashMap::new()) }
    }

    /// The field a candidate would duplicate among the other active users, if any.
    fn clash(rows: &HashMap<Uuid, User>, candidate: &User) -> Option<&'static str> {
        let phone = candidate.phone.expose();
        rows.values()
            .filter(|u| u.id != candidate.id && u.record.is_active())
            .find_map(|u| {
                if u.email.expose() == candidate.email.expose() {
                    Some("email")
                } else if !phone.is_empty() && u.phone.expose() == phone {
                    Some("phone")
                } else {
                    None
                }
            })
    }

    async fn insert(&self, user: &User) -> CoreResult<()> {
        let mut guard = self.rows.write().await;
        if let Some(field) = Self::clash(&guard, user) {
            return Err(CoreError::AlreadyRegistered(field.to_string()));
        }
        guard.insert(user.id, user.clone());
        Ok(())
    }

    async fn find(&self, matches: impl Fn(&User) -> bool) -> Option<User> {
        self.rows
            .read()
            .await
            .values()
            .find(|u| u.record.is_active() && matches(u))
            .cloned()
    }

    async fn replace(&self, user: &User) -> CoreResult<bool> {
        let mut guard = self.rows.write().await;
        if !guard.get(&user.id).is_some_and(|u| u.record.is_active()) {
            return Ok(false);
        }
        if let Some(field) = Self::clash(&guard, user) {
            return Err(CoreError::AlreadyRegistered(field.to_string()));
        }
        if let Some(existing) = guard.get_mut(&user.id) {
            let created_at = existing.created_at;
            *existing = user.clone();
            existing.created_at = created_at;
            existing.record = RecordState::Active;
            existing.updated_at = Utc::now();
        }
        Ok(true)
    }

    async fn soft_delete(&self, id: Uuid) -> bool {
        let mut guard = self.rows.write().await;
        match guard.get_mut(&id) {
            Some(existing) if existing.record.is_active() => {
                existing.record = RecordState::deleted_now();
                existing.updated_at = Utc::now();
                true
            }
            _ => false,
        }
    }
}

/// In-memory implementation of the event, location, schedule and user repositories.
pub struct InMemoryDirectory {
    events: Table<Event>,
    locations: Table<Location>,
    schedules: Table<Schedule>,
    users: UserTable,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self {
            events: Table::new(),
            locations: Table::new(),
            schedules: Table::new(),
            users: UserTable::new(),
        }
    }
}

impl Default for InMemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LocationRepository for InMemoryDirectory {
    async fn create_location(&self, location: &Location) -> CoreResult<()> {
        self.locations.insert(location).await;
        Ok(())
    }

    async fn get_location(&self, id: Uuid) -> CoreResult<Option<Location>> {
        Ok(self.locations.get(id).await)
    }

    async fn list_locations(&self) -> CoreResult<Vec<Location>> {
        Ok(self.locations.list().await)
    }

    async fn update_location(&self, location: &Location) -> CoreResult<bool> {
        Ok(self.locations.replace(location).await)
    }

    async fn delete_location(&self, id: Uuid) -> CoreResult<bool> {
        Ok(self.locations.soft_delete(id).await)
    }
}

#[async_trait]
impl ScheduleRepository for InMemoryDirectory {
    async fn create_schedule(&self, schedule: &Schedule) -> CoreResult<()> {
        self.schedules.insert(schedule).await;
        Ok(())
    }

    async fn get_schedule(&self, id: Uuid) -> CoreResult<Option<Schedule>> {
        Ok(self.schedules.get(id).await)
    }

    async fn list_schedules(&self) -> CoreResult<Vec<Schedule>> {
        Ok(self.schedules.list().await)
    }

    async fn update_schedule(&self, schedule: &Schedule) -> CoreResult<bool> {
        Ok(self.schedules.replace(schedule).await)
    }

    async fn delete_schedule(&self, id: Uuid) -> CoreResult<bool> {
        Ok(self.schedules.soft_delete(id).await)
    }
}

#[async_trait]
impl EventRepository for InMemoryDirectory {
    async fn create_event(&self, event: &Event) -> CoreResult<()> {
        self.events.insert(event).await;
        Ok(())
    }

    async fn get_event(&self, id: Uuid) -> CoreResult<Option<Event>> {
        Ok(self.events.get(id).await)
    }

    async fn list_events(&self) -> CoreResult<Vec<Event>> {
        Ok(self.events.list().await)
    }

    async fn update_event(&self, event: &Event) -> CoreResult<bool> {
        Ok(self.events.replace(event).await)
    }

    async fn delete_event(&self, id: Uuid) -> CoreResult<bool> {
        Ok(self.events.soft_delete(id).await)
    }
}

#[async_trait]
impl UserRepository for InMemoryDirectory {
    async fn create_user(&self, user: &User) -> CoreResult<()> {
        self.users.insert(user).await
    }

    async fn get_user(&self, id: Uuid) -> CoreResult<Option<User>> {
        Ok(self.users.find(|u| u.id == id).await)
    }

    async fn list_users(&self) -> CoreResult<Vec<User>> {
        let guard = self.users.rows.read().await;
        let mut out: Vec<User> = guard.values().filter(|u| u.record.is_active()).cloned().collect();
        out.sort_by_key(|u| u.created_at);
        Ok(out)
    }

    async fn find_user_by_email(&self, email: &str) -> CoreResult<Option<User>> {
        Ok(self.users.find(|u| u.email.expose() == email).await)
    }

    async fn find_user_by_phone(&self, phone: &str) -> CoreResult<Option<User>> {
        Ok(self.users.find(|u| u.phone.expose() == phone).await)
    }

    async fn update_user(&self, user: &User) -> CoreResult<bool> {
        self.users.replace(user).await
    }

    async fn delete_user(&self, id: Uuid) -> CoreResult<bool> {
        Ok(self.users.soft_delete(id).await)
    }
}
