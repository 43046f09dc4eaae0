use boxoffice_core::repository::UserRepository;
use boxoffice_core::{CoreError, CoreResult};
use boxoffice_shared::{Masked, RecordState, User};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct UserInput {
    pub fullname: String,
    pub email: Masked<String>,
    #[serde(default)]
    pub phone: Masked<String>,
}

pub struct UserService {
    users: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    pub async fn create(&self, input: UserInput) -> CoreResult<User> {
        validate(&input)?;
        self.ensure_unregistered(None, &input).await?;
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            fullname: input.fullname,
            email: input.email,
            phone: input.phone,
            record: RecordState::Active,
            created_at: now,
            updated_at: now,
        };
        self.users.create_user(&user).await?;
        tracing::info!("Created user {}", user.id);
        Ok(user)
    }

    pub async fn get(&self, id: Uuid) -> CoreResult<User> {
        self.users
            .get_user(id)
            .await?
            .ok_or_else(|| CoreError::not_found("user", id))
    }

    pub async fn list(&self) -> CoreResult<Vec<User>> {
        self.users.list_users().await
    }

    pub async fn update(&self, id: Uuid, input: UserInput) -> CoreResult<User> {
        validate(&input)?;
        let mut user = self.get(id).await?;
        self.ensure_unregistered(Some(id), &input).await?;
        user.fullname = input.fullname;
        user.email = input.email;
        user.phone = input.phone;
        user.updated_at = Utc::now();

        if !self.users.update_user(&user).await? {
            return Err(CoreError::not_found("user", id));
        }
        Ok(user)
    }

    /// Rejects an email or non-empty phone already held by another active user.
    async fn ensure_unregistered(&self, owner: Option<Uuid>, input: &UserInput) -> CoreResult<()> {
        let taken_by_other = |found: Option<User>| found.is_some_and(|u| Some(u.id) != owner);

        if taken_by_other(self.users.find_user_by_email(input.email.expose()).await?) {
            return Err(CoreError::AlreadyRegistered("email".to_string()));
        }
        let phone = input.phone.expose();
        if !phone.is_empty() && taken_by_other(self.users.find_user_by_phone(phone).await?) {
            return Err(CoreError::AlreadyRegistered("phone".to_string()));
        }
        Ok(())
    }

    pub async fn delete(&self, id: Uuid) -> CoreResult<()> {
        if !self.users.delete_user(id).await? {
            return Err(CoreError::not_found("user", id));
        }
        Ok(())
    }
}

fn validate(input: &UserInput) -> CoreResult<()> {
    if input.fullname.trim().is_empty() {
        return Err(CoreError::ValidationError("fullname is required".to_string()));
    }
    if !input.email.expose().contains('@') {
        return Err(CoreError::ValidationError("email is invalid".to_string()));
    }
    Ok(())
}
