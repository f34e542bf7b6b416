use std::fmt::Debug;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::pooled_connection::deadpool::{Object, Pool};
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use diesel_async_migrations::{embed_migrations, EmbeddedMigrations};
use stakegraph_common_types::EventPointer;
use tracing::{debug, info};

use crate::schema::{entities, event_cursor};
use crate::{EntityKey, EntityStore, WriteBatch};

const CURSOR_ROW_ID: i32 = 1;

#[derive(Insertable, Debug)]
#[diesel(table_name = entities)]
struct EntityRow {
    entity_type: String,
    id: String,
    data: serde_json::Value,
}

/// A Postgres-backed [`EntityStore`]. It uses [`Arc`](std::sync::Arc)
/// internally, so it's cheaply cloneable.
#[derive(Clone)]
pub struct PgStore {
    pool: Pool<AsyncPgConnection>,
}

impl Debug for PgStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // It might contain sensitive data, so don't print it.
        f.debug_struct("PgStore").finish()
    }
}

impl PgStore {
    const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

    /// Connects to the database and runs all pending migrations.
    pub async fn new(db_url: &str) -> anyhow::Result<Self> {
        info!("Initializing database connection pool");
        let manager = AsyncDieselConnectionManager::new(db_url);
        let pool = Pool::builder(manager).build()?;
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> anyhow::Result<()> {
        let mut conn = self.pool.get().await?;

        // Get a lock for running migrations. Blocks until we get the lock.
        // Different instances may attempt to run migrations concurrently.
        diesel::sql_query("select pg_advisory_lock(1)")
            .execute(&mut conn)
            .await?;
        info!("Run database migrations");

        Self::MIGRATIONS
            .run_pending_migrations(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!(e))?;

        // Release the migration lock.
        diesel::sql_query("select pg_advisory_unlock(1)")
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    async fn conn(&self) -> anyhow::Result<Object<AsyncPgConnection>> {
        Ok(self.pool.get().await?)
    }
}

#[async_trait]
impl EntityStore for PgStore {
    async fn get(&self, key: &EntityKey) -> anyhow::Result<Option<serde_json::Value>> {
        Ok(entities::table
            .select(entities::data)
            .filter(entities::entity_type.eq(key.kind.as_ref()))
            .filter(entities::id.eq(&key.id))
            .first::<serde_json::Value>(&mut self.conn().await?)
            .await
            .optional()?)
    }

    async fn commit(&self, batch: WriteBatch) -> anyhow::Result<()> {
        let rows: Vec<EntityRow> = batch
            .entities
            .into_iter()
            .map(|(key, data)| EntityRow {
                entity_type: key.kind.to_string(),
                id: key.id,
                data,
            })
            .collect();
        let cursor = batch.cursor;
        debug!(rows = rows.len(), "Committing write batch");

        self.conn()
            .await?
            .transaction::<_, anyhow::Error, _>(|conn| {
                async move {
                    if !rows.is_empty() {
                        diesel::insert_into(entities::table)
                            .values(&rows)
                            .on_conflict((entities::entity_type, entities::id))
                            .do_update()
                            .set(entities::data.eq(excluded(entities::data)))
                            .execute(conn)
                            .await?;
                    }

                    if let Some(cursor) = cursor {
                        let block_number = i64::try_from(cursor.block_number)?;
                        let log_index = i64::try_from(cursor.log_index)?;
                        diesel::insert_into(event_cursor::table)
                            .values((
                                event_cursor::id.eq(CURSOR_ROW_ID),
                                event_cursor::block_number.eq(block_number),
                                event_cursor::log_index.eq(log_index),
                            ))
                            .on_conflict(event_cursor::id)
                            .do_update()
                            .set((
                                event_cursor::block_number.eq(block_number),
                                event_cursor::log_index.eq(log_index),
                            ))
                            .execute(conn)
                            .await?;
                    }

                    Ok(())
                }
                .scope_boxed()
            })
            .await
    }

    async fn cursor(&self) -> anyhow::Result<Option<EventPointer>> {
        let row = event_cursor::table
            .select((event_cursor::block_number, event_cursor::log_index))
            .filter(event_cursor::id.eq(CURSOR_ROW_ID))
            .first::<(i64, i64)>(&mut self.conn().await?)
            .await
            .optional()?;

        row.map(|(block_number, log_index)| {
            Ok::<_, anyhow::Error>(EventPointer {
                block_number: u64::try_from(block_number)?,
                log_index: u64::try_from(log_index)?,
            })
        })
        .transpose()
    }
}
