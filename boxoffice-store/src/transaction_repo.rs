use async_trait::async_trait;
use boxoffice_core::repository::{TransactionDetailRepository, TransactionRepository};
use boxoffice_core::{CoreError, CoreResult};
use boxoffice_shared::{PaymentStatus, Transaction, TransactionDetail, TransactionStatus};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;
use uuid::Uuid;

const TX_COLUMNS: &str = "id, user_id, event_id, total_amount, status, payment_method, payment_status, \
     payment_url, payment_callback, deleted_at, created_at, updated_at";

const DETAIL_COLUMNS: &str =
    "id, transaction_id, ticket_type_id, quantity, price_per_ticket, subtotal, deleted_at, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct TransactionRow {
    id: Uuid,
    user_id: Uuid,
    event_id: Uuid,
    total_amount: Decimal,
    status: String,
    payment_method: String,
    payment_status: String,
    payment_url: String,
    payment_callback: Option<String>,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = CoreError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        // A status outside the known set means the row was written by something else
        let status: TransactionStatus = row.status.parse().map_err(CoreError::storage)?;
        let payment_status: PaymentStatus = row.payment_status.parse().map_err(CoreError::storage)?;

        Ok(Transaction {
            id: row.id,
            user_id: row.user_id,
            event_id: row.event_id,
            total_amount: row.total_amount,
            status,
            payment_method: row.payment_method,
            payment_status,
            payment_url: row.payment_url,
            payment_callback: row.payment_callback,
            record: row.deleted_at.into(),
            created_at: row.created_at,
            updated_at: row.updated_at,
            details: Vec::new(),
        })
    }
}

#[derive(sqlx::FromRow)]
struct DetailRow {
    id: Uuid,
    transaction_id: Uuid,
    ticket_type_id: Uuid,
    quantity: i32,
    price_per_ticket: Decimal,
    subtotal: Decimal,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<DetailRow> for TransactionDetail {
    fn from(row: DetailRow) -> Self {
        TransactionDetail {
            id: row.id,
            transaction_id: row.transaction_id,
            ticket_type_id: row.ticket_type_id,
            quantity: row.quantity,
            price_per_ticket: row.price_per_ticket,
            subtotal: row.subtotal,
            record: row.deleted_at.into(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub struct StoreTransactionRepository {
    pool: PgPool,
}

impl StoreTransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Converts header rows and attaches their details with one extra query.
    async fn hydrate(&self, rows: Vec<TransactionRow>) -> CoreResult<Vec<Transaction>> {
        let mut transactions = rows
            .into_iter()
            .map(Transaction::try_from)
            .collect::<CoreResult<Vec<_>>>()?;
        if transactions.is_empty() {
            return Ok(transactions);
        }

        let ids: Vec<Uuid> = transactions.iter().map(|t| t.id).collect();
        let sql = format!(
            "SELECT {DETAIL_COLUMNS} FROM transaction_details \
             WHERE transaction_id = ANY($1) AND deleted_at IS NULL ORDER BY created_at"
        );
        let detail_rows = sqlx::query_as::<_, DetailRow>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(CoreError::storage)?;

        let mut by_tx: HashMap<Uuid, Vec<TransactionDetail>> = HashMap::new();
        for row in detail_rows {
            by_tx.entry(row.transaction_id).or_default().push(row.into());
        }
        for tx in transactions.iter_mut() {
            tx.details = by_tx.remove(&tx.id).unwrap_or_default();
        }
        Ok(transactions)
    }

    async fn set_column(&self, id: Uuid, column: &str, value: &str) -> CoreResult<bool> {
        let sql = format!(
            "UPDATE transactions SET {column} = $2, updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL"
        );
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(value)
            .execute(&self.pool)
            .await
            .map_err(CoreError::storage)?;
        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl TransactionRepository for StoreTransactionRepository {
    async fn create_transaction(&self, tx: &Transaction) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO transactions (id, user_id, event_id, total_amount, status, payment_method,
                                      payment_status, payment_url, payment_callback, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(tx.id)
        .bind(tx.user_id)
        .bind(tx.event_id)
        .bind(tx.total_amount)
        .bind(tx.status.as_str())
        .bind(tx.payment_method.as_str())
        .bind(tx.payment_status.as_str())
        .bind(tx.payment_url.as_str())
        .bind(tx.payment_callback.as_deref())
        .bind(tx.created_at)
        .bind(tx.updated_at)
        .execute(&self.pool)
        .await
        .map_err(CoreError::storage)?;
        Ok(())
    }

    async fn get_transaction(&self, id: Uuid) -> CoreResult<Option<Transaction>> {
        let sql = format!("SELECT {TX_COLUMNS} FROM transactions WHERE id = $1 AND deleted_at IS NULL");
        let row = sqlx::query_as::<_, TransactionRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(CoreError::storage)?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_transactions(&self) -> CoreResult<Vec<Transaction>> {
        let sql = format!(
            "SELECT {TX_COLUMNS} FROM transactions WHERE deleted_at IS NULL ORDER BY created_at DESC"
        );
        let rows = sqlx::query_as::<_, TransactionRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(CoreError::storage)?;
        self.hydrate(rows).await
    }

    async fn list_transactions_by_user(&self, user_id: Uuid) -> CoreResult<Vec<Transaction>> {
        let sql = format!(
            "SELECT {TX_COLUMNS} FROM transactions \
             WHERE user_id = $1 AND deleted_at IS NULL ORDER BY created_at DESC"
        );
        let rows = sqlx::query_as::<_, TransactionRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(CoreError::storage)?;
        self.hydrate(rows).await
    }

    async fn update_status(&self, id: Uuid, status: TransactionStatus) -> CoreResult<bool> {
        self.set_column(id, "status", status.as_str()).await
    }

    async fn update_payment_status(&self, id: Uuid, status: PaymentStatus) -> CoreResult<bool> {
        self.set_column(id, "payment_status", status.as_str()).await
    }

    async fn void_transaction(&self, id: Uuid) -> CoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE transactions
            SET status = $2, payment_status = $3, deleted_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(TransactionStatus::Cancelled.as_str())
        .bind(PaymentStatus::Failed.as_str())
        .execute(&self.pool)
        .await
        .map_err(CoreError::storage)?;

        if result.rows_affected() == 0 {
            return Err(CoreError::not_found("transaction", id));
        }
        Ok(())
    }
}

pub struct StoreTransactionDetailRepository {
    pool: PgPool,
}

impl StoreTransactionDetailRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionDetailRepository for StoreTransactionDetailRepository {
    async fn insert_details(&self, details: &[TransactionDetail]) -> CoreResult<()> {
        if details.is_empty() {
            return Ok(());
        }

        // One multi-row INSERT, so the batch lands atomically
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO transaction_details \
             (id, transaction_id, ticket_type_id, quantity, price_per_ticket, subtotal, created_at, updated_at) ",
        );
        builder.push_values(details, |mut b, d| {
            b.push_bind(d.id)
                .push_bind(d.transaction_id)
                .push_bind(d.ticket_type_id)
                .push_bind(d.quantity)
                .push_bind(d.price_per_ticket)
                .push_bind(d.subtotal)
                .push_bind(d.created_at)
                .push_bind(d.updated_at);
        });

        builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(CoreError::storage)?;
        Ok(())
    }

    async fn list_details(&self, transaction_id: Uuid) -> CoreResult<Vec<TransactionDetail>> {
        let sql = format!(
            "SELECT {DETAIL_COLUMNS} FROM transaction_details \
             WHERE transaction_id = $1 AND deleted_at IS NULL ORDER BY created_at"
        );
        let rows = sqlx::query_as::<_, DetailRow>(&sql)
            .bind(transaction_id)
            .fetch_all(&self.pool)
            .await
            .map_err(CoreError::storage)?;
        Ok(rows.into_iter().map(TransactionDetail::from).collect())
    }
}
