use async_trait::async_trait;
use boxoffice_core::repository::UserRepository;
use boxoffice_core::{CoreError, CoreResult};
use boxoffice_shared::{Masked, User};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

const COLUMNS: &str = "id, fullname, email, phone, deleted_at, created_at, updated_at";

pub struct StoreUserRepository {
    pool: PgPool,
}

impl StoreUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_by(&self, column: &str, value: &str) -> CoreResult<Option<User>> {
        let sql = format!("SELECT {COLUMNS} FROM users WHERE {column} = $1 AND deleted_at IS NULL LIMIT 1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(CoreError::storage)?;
        Ok(row.map(User::from))
    }
}

/// Turns a unique-index violation into `AlreadyRegistered`; anything else is a storage failure.
fn write_error(err: sqlx::Error) -> CoreError {
    let field: Option<&'static str> = err
        .as_database_error()
        .filter(|db| db.is_unique_violation())
        .map(|db| match db.constraint() {
            Some("users_phone_active") => "phone",
            _ => "email",
        });
    match field {
        Some(field) => CoreError::AlreadyRegistered(field.to_string()),
        None => CoreError::storage(err),
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    fullname: String,
    email: String,
    phone: String,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            fullname: row.fullname,
            email: Masked::new(row.email),
            phone: Masked::new(row.phone),
            record: row.deleted_at.into(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl UserRepository for StoreUserRepository {
    async fn create_user(&self, user: &User) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, fullname, email, phone, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user.id)
        .bind(user.fullname.as_str())
        .bind(user.email.expose().as_str())
        .bind(user.phone.expose().as_str())
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(write_error)?;
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> CoreResult<Option<User>> {
        let sql = format!("SELECT {COLUMNS} FROM users WHERE id = $1 AND deleted_at IS NULL");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(CoreError::storage)?;
        Ok(row.map(User::from))
    }

    async fn list_users(&self) -> CoreResult<Vec<User>> {
        let sql = format!("SELECT {COLUMNS} FROM users WHERE deleted_at IS NULL ORDER BY created_at");
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(CoreError::storage)?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn find_user_by_email(&self, email: &str) -> CoreResult<Option<User>> {
        self.find_by("email", email).await
    }

    async fn find_user_by_phone(&self, phone: &str) -> CoreResult<Option<User>> {
        self.find_by("phone", phone).await
    }

    async fn update_user(&self, user: &User) -> CoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET fullname = $2, email = $3, phone = $4, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(user.id)
        .bind(user.fullname.as_str())
        .bind(user.email.expose().as_str())
        .bind(user.phone.expose().as_str())
        .execute(&self.pool)
        .await
        .map_err(write_error)?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete_user(&self, id: Uuid) -> CoreResult<bool> {
        let result = sqlx::query(
            "UPDATE users SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
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
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;

    #[derive(Debug)]
    struct UniqueViolation {
        constraint: &'static str,
    }

    impl std::fmt::Display for UniqueViolation {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "duplicate key value violates unique constraint \"{}\"", self.constraint)
        }
    }

    impl std::error::Error for UniqueViolation {}

    impl DatabaseError for UniqueViolation {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed("23505"))
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn constraint(&self) -> Option<&str> {
            Some(self.constraint)
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::UniqueViolation
        }
    }

    #[test]
    fn test_unique_violation_is_a_conflict() {
        let email = sqlx::Error::Database(Box::new(UniqueViolation { constraint: "users_email_active" }));
        assert!(matches!(write_error(email), CoreError::AlreadyRegistered(ref f) if f == "email"));

        let phone = sqlx::Error::Database(Box::new(UniqueViolation { constraint: "users_phone_active" }));
        assert!(matches!(write_error(phone), CoreError::AlreadyRegistered(ref f) if f == "phone"));
    }

    #[test]
    fn test_other_errors_stay_storage() {
        assert!(matches!(write_error(sqlx::Error::PoolTimedOut), CoreError::Storage(_)));
    }
}
