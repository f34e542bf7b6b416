use std::collections::BTreeMap;
use std::sync::Arc;

use stakegraph_common_types::EventPointer;
use stakegraph_staking_client::StakingContract;
use stakegraph_store::{EntityCache, EntityKind, EntityStore};
use tracing::{debug, warn};

use crate::handlers::{self, HandlerContext};
use crate::{PrometheusMetrics, ProcessingError, StakingEvent};

/// What [`EventProcessor::process`] did with an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The event's writes were committed.
    Applied { entities_written: usize },
    /// The event is at or before the cursor, so it was applied before.
    Skipped { cursor: EventPointer },
}

/// Applies events one at a time, in order.
///
/// Each event's writes are committed together with its position, so after
/// a crash the processor picks up right after the last applied event and
/// replays of earlier events are no-ops.
pub struct EventProcessor {
    store: Arc<dyn EntityStore>,
    contract: Arc<dyn StakingContract>,
    cursor: Option<EventPointer>,
    metrics: &'static PrometheusMetrics,
}

impl EventProcessor {
    pub async fn new(
        store: Arc<dyn EntityStore>,
        contract: Arc<dyn StakingContract>,
        metrics: &'static PrometheusMetrics,
    ) -> anyhow::Result<Self> {
        let cursor = store.cursor().await?;
        match cursor {
            Some(cursor) => debug!(%cursor, "Resuming after last applied event"),
            None => debug!("No events applied yet"),
        }

        Ok(Self {
            store,
            contract,
            cursor,
            metrics,
        })
    }

    /// Position of the last applied event.
    pub fn cursor(&self) -> Option<EventPointer> {
        self.cursor
    }

    pub async fn process(&mut self, event: &StakingEvent) -> Result<Outcome, ProcessingError> {
        let pointer = event.pointer();
        let kind = event.event.kind();

        if let Some(cursor) = self.cursor.filter(|cursor| pointer <= *cursor) {
            warn!(
                kind,
                event = %pointer,
                %cursor,
                "Skipping event that was already applied"
            );
            self.metrics.events_skipped.inc();
            return Ok(Outcome::Skipped { cursor });
        }

        debug!(
            kind,
            block = pointer.block_number,
            log_index = pointer.log_index,
            "Processing event"
        );

        let cache = EntityCache::new(self.store.as_ref());
        let mut ctx = HandlerContext::new(cache, self.contract.as_ref(), &event.block);
        handlers::dispatch(&mut ctx, &event.event).await?;

        let mut written_by_kind = BTreeMap::<EntityKind, u64>::new();
        for key in ctx.cache.written_keys() {
            *written_by_kind.entry(key.kind).or_default() += 1;
        }

        let batch = ctx.cache.into_batch(Some(pointer));
        let entities_written = batch.entities.len();
        self.store
            .commit(batch)
            .await
            .map_err(ProcessingError::Store)?;
        self.cursor = Some(pointer);

        self.metrics
            .events_processed
            .with_label_values(&[kind])
            .inc();
        for (kind, count) in written_by_kind {
            self.metrics
                .entities_written
                .with_label_values(&[kind.as_ref()])
                .inc_by(count);
        }

        Ok(Outcome::Applied { entities_written })
    }
}
