use anyhow::Context;
use stakegraph_lib::{EventProcessor, Outcome, StakingEvent};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{error, info};

const PROGRESS_EVERY: u64 = 1000;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestStats {
    pub applied: u64,
    pub skipped: u64,
}

/// Feeds every JSON line of `input` to the processor, in order. Blank lines
/// are ignored. Stops at the first line that fails to parse or apply.
pub async fn apply_event_lines<R>(
    input: R,
    processor: &mut EventProcessor,
) -> anyhow::Result<IngestStats>
where
    R: AsyncBufRead + Unpin,
{
    let mut stats = IngestStats::default();
    let mut lines = input.lines();
    let mut line_number = 0u64;

    while let Some(line) = lines.next_line().await? {
        line_number += 1;
        if line.trim().is_empty() {
            continue;
        }

        let event: StakingEvent = serde_json::from_str(&line)
            .with_context(|| format!("invalid event on line {}", line_number))?;

        match processor.process(&event).await {
            Ok(Outcome::Applied { .. }) => stats.applied += 1,
            Ok(Outcome::Skipped { .. }) => stats.skipped += 1,
            Err(err) => {
                error!(
                    err = %err,
                    line = line_number,
                    kind = event.event.kind(),
                    event = %event.pointer(),
                    "Failed to apply event"
                );
                return Err(err).with_context(|| format!("failed to apply line {}", line_number));
            }
        }

        if (stats.applied + stats.skipped) % PROGRESS_EVERY == 0 {
            info!(
                applied = stats.applied,
                skipped = stats.skipped,
                cursor = ?processor.cursor(),
                "Progress"
            );
        }
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use stakegraph_lib::test_utils::events::{stake_deposited, stake_locked, EventStream};
    use stakegraph_lib::test_utils::{address, tokens, TestHarness};
    use stakegraph_store::models::Indexer;
    use tracing_test::traced_test;

    use super::*;

    fn to_lines(events: &[StakingEvent]) -> String {
        events
            .iter()
            .map(|event| serde_json::to_string(event).unwrap())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    #[tokio::test]
    async fn applies_lines_in_order() {
        let mut harness = TestHarness::new().await;
        let mut stream = EventStream::starting_at(1);
        let indexer = address(0xa1);
        let input = to_lines(&[
            stream.push(stake_deposited(indexer, 10)),
            stream.push(stake_deposited(indexer, 20)),
        ]);

        let stats = apply_event_lines(input.as_bytes(), &mut harness.processor)
            .await
            .unwrap();
        assert_eq!(
            stats,
            IngestStats {
                applied: 2,
                skipped: 0
            }
        );

        // Running the same input again is a no-op.
        let stats = apply_event_lines(input.as_bytes(), &mut harness.processor)
            .await
            .unwrap();
        assert_eq!(stats.skipped, 2);
        assert_eq!(
            harness
                .load::<Indexer>(&indexer.to_string())
                .await
                .staked_tokens,
            tokens(30)
        );
    }

    #[tokio::test]
    #[traced_test]
    async fn stops_at_the_first_failure() {
        let mut harness = TestHarness::new().await;
        let mut stream = EventStream::starting_at(1);
        let input = to_lines(&[
            // No deposit before the lock, so the indexer doesn't exist.
            stream.push(stake_locked(address(0xa1), 10, 10)),
            stream.push(stake_deposited(address(0xa2), 20)),
        ]);

        let err = apply_event_lines(input.as_bytes(), &mut harness.processor)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("line 1"));
        assert!(harness.get::<Indexer>(&address(0xa2).to_string()).await.is_none());
        assert!(logs_contain("Failed to apply event"));
    }

    #[tokio::test]
    async fn malformed_lines_are_reported() {
        let mut harness = TestHarness::new().await;
        let err = apply_event_lines(&b"{\"not\": \"an event\"}"[..], &mut harness.processor)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid event on line 1"));
    }
}
