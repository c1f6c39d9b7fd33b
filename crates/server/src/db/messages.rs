//! Chat message repository.
//!
//! Messages hang off a booking or an order. Each parent row carries two unread
//! counters, one per side, kept in step with message inserts and reads inside
//! the same transaction.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use vitrinex_core::{AccessToken, MessageId, ParentKind, SenderType, StoreId, ThreadRef};

use super::RepositoryError;
use crate::models::Message;

#[derive(sqlx::FromRow)]
struct MessageRow {
    id: MessageId,
    parent_kind: ParentKind,
    parent_id: i32,
    sender_type: SenderType,
    content: String,
    read: bool,
    created_at: DateTime<Utc>,
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Self {
            id: row.id,
            parent_kind: row.parent_kind,
            parent_id: row.parent_id,
            sender_type: row.sender_type,
            content: row.content,
            read: row.read,
            created_at: row.created_at,
        }
    }
}

/// Ownership facts about a chat parent, used to authorize callers.
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct ParentAccess {
    pub store_id: StoreId,
    pub access_token: AccessToken,
}

/// A thread with messages the owner has not read.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UnreadThread {
    pub parent_kind: ParentKind,
    /// Booking or order ID, per `parent_kind`. See `ThreadRef` for the typed form.
    pub parent_id: i32,
    pub customer_name: String,
    pub unread: i32,
}

/// Counter column holding what `side` has not read yet.
const fn unread_column(side: SenderType) -> &'static str {
    match side {
        SenderType::Owner => "unread_for_owner",
        SenderType::Customer => "unread_for_customer",
    }
}

/// Repository for chat messages.
pub struct MessageRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> MessageRepository<'a> {
    /// Create a new message repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store and token of a parent record.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn parent_access(
        &self,
        thread: ThreadRef,
    ) -> Result<Option<ParentAccess>, RepositoryError> {
        Ok(sqlx::query_as::<_, ParentAccess>(&format!(
            "SELECT store_id, access_token FROM {} WHERE id = $1",
            thread.kind().table()
        ))
        .bind(thread.parent_id())
        .fetch_optional(self.pool)
        .await?)
    }

    /// Messages of a thread in ascending order, optionally only those after
    /// `after`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        thread: ThreadRef,
        after: Option<MessageId>,
    ) -> Result<Vec<Message>, RepositoryError> {
        let rows = sqlx::query_as::<_, MessageRow>(
            r"
            SELECT id, parent_kind, parent_id, sender_type, content, read, created_at
            FROM vitrinex.message
            WHERE parent_kind = $1 AND parent_id = $2 AND ($3::integer IS NULL OR id > $3)
            ORDER BY id
            ",
        )
        .bind(thread.kind())
        .bind(thread.parent_id())
        .bind(after)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Message::from).collect())
    }

    /// Append a message and bump the other side's unread counter.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the parent does not exist.
    pub async fn post(
        &self,
        thread: ThreadRef,
        sender: SenderType,
        content: &str,
    ) -> Result<Message, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let column = unread_column(sender.counterpart());
        let bumped = sqlx::query(&format!(
            "UPDATE {table} SET {column} = {column} + 1 WHERE id = $1",
            table = thread.kind().table(),
        ))
        .bind(thread.parent_id())
        .execute(&mut *tx)
        .await?;
        if bumped.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        let row = sqlx::query_as::<_, MessageRow>(
            r"
            INSERT INTO vitrinex.message (parent_kind, parent_id, sender_type, content)
            VALUES ($1, $2, $3, $4)
            RETURNING id, parent_kind, parent_id, sender_type, content, read, created_at
            ",
        )
        .bind(thread.kind())
        .bind(thread.parent_id())
        .bind(sender)
        .bind(content)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Message::from(row))
    }

    /// Mark the other side's messages read and zero the reader's counter.
    ///
    /// Returns how many messages changed state.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the parent does not exist.
    pub async fn mark_read(
        &self,
        thread: ThreadRef,
        reader: SenderType,
    ) -> Result<u64, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let reset = sqlx::query(&format!(
            "UPDATE {table} SET {column} = 0 WHERE id = $1",
            table = thread.kind().table(),
            column = unread_column(reader),
        ))
        .bind(thread.parent_id())
        .execute(&mut *tx)
        .await?;
        if reset.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        let marked = sqlx::query(
            r"
            UPDATE vitrinex.message
            SET read = TRUE
            WHERE parent_kind = $1 AND parent_id = $2 AND sender_type = $3 AND NOT read
            ",
        )
        .bind(thread.kind())
        .bind(thread.parent_id())
        .bind(reader.counterpart())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(marked.rows_affected())
    }

    /// Threads of a store with unread customer messages.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn unread_for_owner(
        &self,
        store_id: StoreId,
    ) -> Result<Vec<UnreadThread>, RepositoryError> {
        Ok(sqlx::query_as::<_, UnreadThread>(
            r"
            SELECT 'booking'::vitrinex.parent_kind AS parent_kind, id AS parent_id,
                   customer_name, unread_for_owner AS unread
            FROM vitrinex.booking
            WHERE store_id = $1 AND unread_for_owner > 0
            UNION ALL
            SELECT 'order'::vitrinex.parent_kind, id, customer_name, unread_for_owner
            FROM vitrinex.customer_order
            WHERE store_id = $1 AND unread_for_owner > 0
            ORDER BY unread DESC, parent_id
            ",
        )
        .bind(store_id)
        .fetch_all(self.pool)
        .await?)
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    /// Recompute every unread counter from the message table.
    ///
    /// Returns the number of parent rows whose counters changed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn recount_unread(&self) -> Result<u64, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let mut changed = 0;

        for kind in [ParentKind::Booking, ParentKind::Order] {
            let result = sqlx::query(&format!(
                r"
                WITH counts AS (
                    SELECT p.id,
                           COUNT(m.id) FILTER (WHERE m.sender_type = 'customer' AND NOT m.read) AS for_owner,
                           COUNT(m.id) FILTER (WHERE m.sender_type = 'owner' AND NOT m.read) AS for_customer
                    FROM {table} p
                    LEFT JOIN vitrinex.message m
                        ON m.parent_kind = $1 AND m.parent_id = p.id
                    GROUP BY p.id
                )
                UPDATE {table} t
                SET unread_for_owner = c.for_owner::integer,
                    unread_for_customer = c.for_customer::integer
                FROM counts c
                WHERE t.id = c.id
                  AND (t.unread_for_owner <> c.for_owner OR t.unread_for_customer <> c.for_customer)
                ",
                table = kind.table(),
            ))
            .bind(kind)
            .execute(&mut *tx)
            .await?;
            changed += result.rows_affected();
        }

        tx.commit().await?;
        Ok(changed)
    }

    /// Delete messages older than `days` on threads whose parent reached a
    /// terminal status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn purge_closed_older_than(&self, days: i32) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM vitrinex.message m
            WHERE m.created_at < NOW() - make_interval(days => $1)
              AND (
                (m.parent_kind = 'booking' AND EXISTS (
                    SELECT 1 FROM vitrinex.booking b
                    WHERE b.id = m.parent_id AND b.status IN ('completed', 'cancelled')))
                OR
                (m.parent_kind = 'order' AND EXISTS (
                    SELECT 1 FROM vitrinex.customer_order o
                    WHERE o.id = m.parent_id AND o.status IN ('fulfilled', 'cancelled')))
              )
            ",
        )
        .bind(days)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unread_column_per_side() {
        assert_eq!(unread_column(SenderType::Owner), "unread_for_owner");
        assert_eq!(unread_column(SenderType::Customer), "unread_for_customer");
        // A customer post lands on the owner's counter.
        assert_eq!(
            unread_column(SenderType::Customer.counterpart()),
            "unread_for_owner"
        );
    }
}
