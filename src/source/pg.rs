//! Postgres-backed worklist source.
//!
//! Queries the `worklist_items` table through a shared SQLx pool. The
//! traversal engine is synchronous, so every query is driven to completion
//! on a tokio runtime handle owned by the caller. Do not call into this
//! source from a runtime worker thread; `block_on` would panic there.

use chrono::{DateTime, Utc};
use opentelemetry::KeyValue;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tokio::runtime::Handle;
use tracing::debug;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::model::{ItemRef, WorklistItem};
use crate::telemetry::metrics;

use super::{WorklistContext, WorklistSource};

pub struct PgWorklistSource {
    pool: PgPool,
    runtime: Handle,
}

impl PgWorklistSource {
    /// Connect to Postgres and create a small connection pool.
    pub fn connect(url: &str, runtime: Handle) -> Result<Self> {
        let pool = runtime.block_on(PgPoolOptions::new().max_connections(2).connect(url))?;
        Ok(Self { pool, runtime })
    }

    /// Run all pending migrations.
    pub fn migrate(&self) -> Result<()> {
        self.runtime
            .block_on(sqlx::migrate!("./migrations").run(&self.pool))?;
        Ok(())
    }

    /// Add an item to a worklist. Returns its reference.
    pub fn insert_item(&self, item: &WorklistItem, downtime: bool) -> Result<ItemRef> {
        let version = i32::try_from(item.item_ref.version).map_err(|_| {
            Error::Other(format!("version out of range on worklist item {}", item.item_ref))
        })?;
        self.runtime.block_on(
            sqlx::query(
                "INSERT INTO worklist_items (id, version, worklist, procedure_step, status, scheduled_at, downtime, attributes)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(item.item_ref.id)
            .bind(version)
            .bind(&item.worklist)
            .bind(&item.procedure_step)
            .bind(item.status.to_string())
            .bind(item.scheduled_at)
            .bind(downtime)
            .bind(&item.attributes)
            .execute(&self.pool),
        )?;
        Ok(item.item_ref)
    }

    /// Take an item off the available listing. A stand-in for the domain
    /// service's claim call, which is what hides an item from other users.
    ///
    /// Returns `false` only if someone else holds the claim. Claiming an item
    /// `staff` already holds succeeds and leaves the version alone.
    pub fn claim_item(&self, item_ref: &ItemRef, staff: &str) -> Result<bool> {
        let rows = self
            .runtime
            .block_on(
                sqlx::query(
                    "UPDATE worklist_items
                     SET version = CASE WHEN claimed_by IS NULL THEN version + 1 ELSE version END,
                         claimed_by = $1
                     WHERE id = $2 AND (claimed_by IS NULL OR claimed_by = $1)",
                )
                .bind(staff)
                .bind(item_ref.id)
                .execute(&self.pool),
            )?
            .rows_affected();
        Ok(rows > 0)
    }

    /// Drop a claim taken with [`claim_item`](Self::claim_item).
    pub fn release_item(&self, item_ref: &ItemRef) -> Result<()> {
        self.runtime.block_on(
            sqlx::query("UPDATE worklist_items SET claimed_by = NULL WHERE id = $1")
                .bind(item_ref.id)
                .execute(&self.pool),
        )?;
        Ok(())
    }

    /// Mark an item's step completed so it leaves the listing for good.
    pub fn complete_item(&self, item_ref: &ItemRef) -> Result<()> {
        self.runtime.block_on(
            sqlx::query(
                "UPDATE worklist_items SET status = 'completed', version = version + 1
                 WHERE id = $1",
            )
            .bind(item_ref.id)
            .execute(&self.pool),
        )?;
        Ok(())
    }

    fn record_call(context: &WorklistContext, operation: &'static str) {
        metrics::source_calls().add(
            1,
            &[
                KeyValue::new("worklist", context.worklist.clone()),
                KeyValue::new("operation", operation),
            ],
        );
    }
}

impl WorklistSource for PgWorklistSource {
    fn count(&mut self, context: &WorklistContext) -> Result<i64> {
        Self::record_call(context, "count");
        let row: (i64,) = self.runtime.block_on(
            sqlx::query_as(
                "SELECT COUNT(*) FROM worklist_items
                 WHERE worklist = $1 AND status = 'scheduled' AND claimed_by IS NULL
                 AND ($2 = FALSE OR downtime = TRUE)",
            )
            .bind(&context.worklist)
            .bind(context.downtime_recovery)
            .fetch_one(&self.pool),
        )?;
        Ok(row.0)
    }

    fn stream(
        &mut self,
        context: &WorklistContext,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<WorklistItem>> {
        Self::record_call(context, "stream");
        let rows: Vec<WorklistItemRow> = self.runtime.block_on(
            sqlx::query_as(
                "SELECT id, version, worklist, procedure_step, status, scheduled_at, attributes
                 FROM worklist_items
                 WHERE worklist = $1 AND status = 'scheduled' AND claimed_by IS NULL
                 AND ($2 = FALSE OR downtime = TRUE)
                 ORDER BY scheduled_at ASC NULLS LAST, id ASC
                 OFFSET $3 LIMIT $4",
            )
            .bind(&context.worklist)
            .bind(context.downtime_recovery)
            .bind(offset as i64)
            .bind(limit as i64)
            .fetch_all(&self.pool),
        )?;

        debug!(
            worklist = %context.worklist,
            offset,
            rows = rows.len(),
            "worklist page fetched"
        );

        rows.into_iter().map(WorklistItemRow::try_into_item).collect()
    }
}

/// Internal row type for sqlx::FromRow.
#[derive(sqlx::FromRow)]
struct WorklistItemRow {
    id: Uuid,
    version: i32,
    worklist: String,
    procedure_step: String,
    status: String,
    scheduled_at: Option<DateTime<Utc>>,
    attributes: serde_json::Value,
}

impl WorklistItemRow {
    fn try_into_item(self) -> Result<WorklistItem> {
        let version = u32::try_from(self.version)
            .map_err(|_| Error::Other(format!("negative version on worklist item {}", self.id)))?;
        Ok(WorklistItem {
            item_ref: ItemRef {
                id: self.id,
                version,
            },
            worklist: self.worklist,
            procedure_step: self.procedure_step,
            status: self.status.parse()?,
            scheduled_at: self.scheduled_at,
            attributes: self.attributes,
        })
    }
}
