//! Drives the journal cursor forward under the caller's pagination and
//! follow-mode policy, streaming one serialized record per chunk.
//!
//! Realized as an `async_stream::try_stream!` generator rather than a
//! hand-rolled `Poll::poll_next` impl: each yielded [`Bytes`] is one
//! complete serialized record, so `axum::body::Body::from_stream` (and
//! hyper underneath it) handles the byte-offset bookkeeping a pull-based
//! body reader otherwise needs. Bytes delivered to the client are always
//! the concatenation of records in emission order — the pump never
//! reorders, duplicates, or drops them.
use async_stream::try_stream;
use bytes::Bytes;
use futures_util::stream::Stream;
use journal_core::{Journal, StepOutcome};

use crate::error::GatewayError;
use crate::output_mode::OutputMode;
use crate::serialize::{check_spill_ceiling, serialize_entry};

pub struct EntryPumpConfig {
    pub mode: OutputMode,
    pub n_skip: i64,
    pub n_entries: Option<u64>,
    pub follow: bool,
    pub discrete: bool,
    pub discrete_cursor: Option<String>,
}

pub fn entry_pump(
    mut journal: Journal,
    mut cfg: EntryPumpConfig,
) -> impl Stream<Item = Result<Bytes, GatewayError>> {
    try_stream! {
        loop {
            if matches!(cfg.n_entries, Some(0)) {
                return;
            }

            loop {
                match advance(&mut journal, &mut cfg.n_skip).await? {
                    StepOutcome::Advanced => break,
                    StepOutcome::NoMoreEntries => {
                        if !cfg.follow {
                            return;
                        }
                        journal.wait(None).await?;
                    }
                }
            }

            if cfg.discrete {
                let is_match = match &cfg.discrete_cursor {
                    Some(c) => journal.test_cursor(c).await?,
                    None => false,
                };
                if !is_match {
                    return;
                }
            }

            let entry = journal
                .current_entry()
                .await?
                .ok_or_else(|| GatewayError::Internal("advanced but no current entry".to_owned()))?;
            let record = serialize_entry(cfg.mode, &entry);
            check_spill_ceiling(&record)?;
            yield Bytes::from(record);

            if let Some(n) = cfg.n_entries.as_mut() {
                *n -= 1;
            }
        }
    }
}

/// One advance step: a negative `n_skip` moves backward `|n_skip|+1`
/// records, a positive one moves forward `n_skip+1`, zero moves forward
/// one. `n_skip` is always zeroed after the first call so later advances
/// on the same connection are plain single steps.
async fn advance(journal: &mut Journal, n_skip: &mut i64) -> Result<StepOutcome, GatewayError> {
    let skip = *n_skip;
    *n_skip = 0;
    let outcome = if skip < 0 {
        journal.previous_skip((-skip) as u64 + 1).await?
    } else if skip > 0 {
        journal.next_skip(skip as u64 + 1).await?
    } else {
        journal.next().await?
    };
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    async fn seeded_journal() -> Journal {
        let mut j = Journal::open_in_memory().await.unwrap();
        for i in 0..3 {
            j.append(vec![("MESSAGE".to_owned(), format!("m{i}"))])
                .await
                .unwrap();
        }
        j
    }

    fn base_cfg() -> EntryPumpConfig {
        EntryPumpConfig {
            mode: OutputMode::Json,
            n_skip: 0,
            n_entries: None,
            follow: false,
            discrete: false,
            discrete_cursor: None,
        }
    }

    #[tokio::test]
    async fn forward_order_from_head_emits_all_records() {
        let mut journal = seeded_journal().await;
        journal.seek_head();
        let chunks: Vec<_> = entry_pump(journal, base_cfg()).collect().await;
        assert_eq!(chunks.len(), 3);
        for c in chunks {
            c.unwrap();
        }
    }

    #[tokio::test]
    async fn n_entries_caps_emitted_count() {
        let mut journal = seeded_journal().await;
        journal.seek_head();
        let mut cfg = base_cfg();
        cfg.n_entries = Some(2);
        let chunks: Vec<_> = entry_pump(journal, cfg).collect().await;
        assert_eq!(chunks.len(), 2);
    }

    #[tokio::test]
    async fn empty_journal_yields_no_chunks() {
        let mut journal = Journal::open_in_memory().await.unwrap();
        journal.seek_head();
        let chunks: Vec<_> = entry_pump(journal, base_cfg()).collect().await;
        assert!(chunks.is_empty());
    }

    #[tokio::test]
    async fn discrete_mode_emits_exactly_one_matching_record() {
        let mut journal = seeded_journal().await;
        journal.seek_head();
        journal.next().await.unwrap();
        let cursor = journal.current_entry().await.unwrap().unwrap().cursor;

        let mut reader = journal.handle();
        reader.seek_cursor(&cursor).await.unwrap();
        let mut cfg = base_cfg();
        cfg.discrete = true;
        cfg.discrete_cursor = Some(cursor);
        cfg.n_entries = Some(1);
        let chunks: Vec<_> = entry_pump(reader, cfg).collect().await;
        assert_eq!(chunks.len(), 1);
    }

    #[tokio::test]
    async fn follow_mode_blocks_then_emits_appended_record() {
        let journal = Journal::open_in_memory().await.unwrap();
        let mut reader = journal.handle();
        reader.seek_tail();
        let mut cfg = base_cfg();
        cfg.follow = true;
        cfg.n_entries = Some(1);

        let pump = entry_pump(reader, cfg);
        tokio::pin!(pump);

        let writer = journal.handle();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            writer
                .append(vec![("MESSAGE".to_owned(), "late".to_owned())])
                .await
                .unwrap();
        });

        let first = tokio::time::timeout(std::time::Duration::from_secs(1), pump.next())
            .await
            .expect("follow mode should not hang forever")
            .expect("stream should yield one chunk")
            .unwrap();
        assert!(String::from_utf8(first.to_vec()).unwrap().contains("late"));
    }

    #[tokio::test]
    async fn oversized_record_ends_stream_with_out_of_memory_error() {
        let mut journal = Journal::open_in_memory().await.unwrap();
        journal
            .append(vec![("MESSAGE".to_owned(), "x".repeat(crate::serialize::MAX_RECORD_BYTES + 1))])
            .await
            .unwrap();
        journal.seek_head();
        let chunks: Vec<_> = entry_pump(journal, base_cfg()).collect().await;
        assert_eq!(chunks.len(), 1);
        assert!(matches!(chunks[0], Err(GatewayError::OutOfMemory)));
    }
}
