use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;
use tokio_postgres::{Client, NoTls, Row};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::models::{
    member::{CreateReminderLog, Library, Member, ReminderType},
    queue::{NewQueueItem, QueueItem},
    status::QueueStatus,
};

/// Durable queue contract. Only `pending` items surface in the snapshot;
/// `claim` is the compare-and-swap that makes each item dispatch at most
/// once; `mark_sent`/`mark_failed` are the write-once terminal transitions.
#[async_trait]
pub trait QueueStore: Send + Sync {
    async fn pending_items(&self) -> Result<Vec<QueueItem>, Error>;

    async fn claim(&self, id: &Uuid) -> Result<bool, Error>;

    async fn mark_sent(&self, id: &Uuid) -> Result<(), Error>;

    async fn mark_failed(&self, id: &Uuid, error: &str) -> Result<(), Error>;

    /// Creates an item already claimed for dispatch, so the caller can run
    /// the delivery pipeline inline without racing the poll loop.
    async fn enqueue_claimed(&self, item: NewQueueItem) -> Result<QueueItem, Error>;
}

/// Read-only membership dataset plus the per-member reminder dedup log.
#[async_trait]
pub trait MembershipStore: Send + Sync {
    async fn list_libraries(&self) -> Result<Vec<Library>, Error>;

    async fn list_members(&self, library_id: &Uuid) -> Result<Vec<Member>, Error>;

    async fn has_reminder_log(&self, member_id: &Uuid, kind: ReminderType) -> Result<bool, Error>;

    async fn append_reminder_log(
        &self,
        member_id: &Uuid,
        log: CreateReminderLog,
    ) -> Result<(), Error>;
}

pub struct PgStore {
    client: Client,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> Result<Self, Error> {
        info!("Connecting to PostgreSQL database");

        let (client, connection) = tokio_postgres::connect(database_url, NoTls)
            .await
            .map_err(|e| anyhow!("Failed to connect to database: {}", e))?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!(error = %e, "Database connection closed");
            }
        });

        info!("PostgreSQL connection established");

        Ok(Self { client })
    }

    pub async fn health_check(&self) -> Result<(), Error> {
        self.client
            .query_one("SELECT 1", &[])
            .await
            .map_err(|e| anyhow!("Database health check failed: {}", e))?;

        Ok(())
    }

    fn queue_item_from_row(row: &Row) -> Result<QueueItem, Error> {
        let status_str: String = row.try_get("status")?;
        let status = QueueStatus::from_str(&status_str)
            .ok_or_else(|| anyhow!("Unknown queue status '{}'", status_str))?;

        Ok(QueueItem {
            id: row.try_get("id")?,
            to: row.try_get("recipient")?,
            member_name: row.try_get("member_name")?,
            payload: row.try_get("payload")?,
            status,
            error: row.try_get("error")?,
            sent_at: row.try_get("sent_at")?,
            checked_at: row.try_get("checked_at")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn member_from_row(row: &Row) -> Result<Member, Error> {
        let amount: i32 = row.try_get("amount")?;

        Ok(Member {
            id: row.try_get("id")?,
            library_id: row.try_get("library_id")?,
            name: row.try_get("name")?,
            contact: row.try_get("contact")?,
            amount: amount.max(0) as u32,
            expiry_at: row.try_get("expiry_at")?,
            status: row.try_get("status")?,
        })
    }
}

#[async_trait]
impl QueueStore for PgStore {
    async fn pending_items(&self) -> Result<Vec<QueueItem>, Error> {
        let rows = self
            .client
            .query(
                "SELECT id, recipient, member_name, payload, status, error, sent_at, checked_at, created_at \
                 FROM message_queue WHERE status = 'pending' ORDER BY created_at",
                &[],
            )
            .await
            .map_err(|e| anyhow!("Failed to read pending queue items: {}", e))?;

        rows.iter().map(Self::queue_item_from_row).collect()
    }

    async fn claim(&self, id: &Uuid) -> Result<bool, Error> {
        let updated = self
            .client
            .execute(
                "UPDATE message_queue SET status = 'processing' WHERE id = $1 AND status = 'pending'",
                &[id],
            )
            .await
            .map_err(|e| anyhow!("Failed to claim queue item: {}", e))?;

        Ok(updated == 1)
    }

    async fn mark_sent(&self, id: &Uuid) -> Result<(), Error> {
        let updated = self
            .client
            .execute(
                "UPDATE message_queue SET status = 'sent', sent_at = now(), checked_at = now(), error = NULL \
                 WHERE id = $1 AND status = 'processing'",
                &[id],
            )
            .await
            .map_err(|e| anyhow!("Failed to mark item as sent: {}", e))?;

        if updated != 1 {
            warn!(item_id = %id, "Sent write-back matched no claimed item");
        }

        Ok(())
    }

    async fn mark_failed(&self, id: &Uuid, error: &str) -> Result<(), Error> {
        let updated = self
            .client
            .execute(
                "UPDATE message_queue SET status = 'failed', error = $2, checked_at = now() \
                 WHERE id = $1 AND status = 'processing'",
                &[id, &error],
            )
            .await
            .map_err(|e| anyhow!("Failed to mark item as failed: {}", e))?;

        if updated != 1 {
            warn!(item_id = %id, "Failed write-back matched no claimed item");
        }

        Ok(())
    }

    async fn enqueue_claimed(&self, item: NewQueueItem) -> Result<QueueItem, Error> {
        let payload = serde_json::to_value(&item.payload)?;

        let row = self
            .client
            .query_one(
                "INSERT INTO message_queue (recipient, member_name, payload, status) \
                 VALUES ($1, $2, $3, 'processing') \
                 RETURNING id, recipient, member_name, payload, status, error, sent_at, checked_at, created_at",
                &[&item.to, &item.member_name, &payload],
            )
            .await
            .map_err(|e| anyhow!("Failed to enqueue item: {}", e))?;

        debug!(member = %item.member_name, "Queue item created");

        Self::queue_item_from_row(&row)
    }
}

#[async_trait]
impl MembershipStore for PgStore {
    async fn list_libraries(&self) -> Result<Vec<Library>, Error> {
        let rows = self
            .client
            .query("SELECT id, name FROM libraries ORDER BY name", &[])
            .await
            .map_err(|e| anyhow!("Failed to enumerate libraries: {}", e))?;

        rows.iter()
            .map(|row| {
                Ok(Library {
                    id: row.try_get("id")?,
                    name: row.try_get("name")?,
                })
            })
            .collect()
    }

    async fn list_members(&self, library_id: &Uuid) -> Result<Vec<Member>, Error> {
        let rows = self
            .client
            .query(
                "SELECT id, library_id, name, contact, amount, expiry_at, status \
                 FROM members WHERE library_id = $1 ORDER BY name",
                &[library_id],
            )
            .await
            .map_err(|e| anyhow!("Failed to read library members: {}", e))?;

        rows.iter().map(Self::member_from_row).collect()
    }

    async fn has_reminder_log(&self, member_id: &Uuid, kind: ReminderType) -> Result<bool, Error> {
        let row = self
            .client
            .query_one(
                "SELECT count(*) AS entries FROM whatsapp_logs WHERE member_id = $1 AND kind = $2",
                &[member_id, &kind.as_str()],
            )
            .await
            .map_err(|e| anyhow!("Failed to query reminder log: {}", e))?;

        let entries: i64 = row.try_get("entries")?;

        Ok(entries > 0)
    }

    async fn append_reminder_log(
        &self,
        member_id: &Uuid,
        log: CreateReminderLog,
    ) -> Result<(), Error> {
        self.client
            .execute(
                "INSERT INTO whatsapp_logs (member_id, kind, status, message, reason, sent_at) \
                 VALUES ($1, $2, $3, $4, $5, now())",
                &[
                    member_id,
                    &log.kind.as_str(),
                    &log.status.as_str(),
                    &log.message,
                    &log.reason,
                ],
            )
            .await
            .map_err(|e| anyhow!("Failed to append reminder log entry: {}", e))?;

        debug!(member_id = %member_id, kind = %log.kind, status = %log.status, "Reminder log entry written");

        Ok(())
    }
}
