//! Enumerates the next not-yet-seen unique value of the field queried by
//! the handler, one chunk per value; exhaustion ends the stream — unlike
//! the entries pump in follow mode, this one never blocks.

use async_stream::try_stream;
use bytes::Bytes;
use futures_util::stream::Stream;
use journal_core::Journal;

use crate::error::GatewayError;
use crate::output_mode::OutputMode;
use crate::serialize::{check_spill_ceiling, serialize_field_value};

pub fn field_pump(
    mut journal: Journal,
    field: String,
    mode: OutputMode,
) -> impl Stream<Item = Result<Bytes, GatewayError>> {
    try_stream! {
        journal.query_unique(&field);
        loop {
            let Some(raw) = journal.enumerate_unique().await? else {
                return;
            };
            if let Some(bytes) = serialize_field_value(mode, &raw) {
                check_spill_ceiling(&bytes)?;
                yield Bytes::from(bytes);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    #[tokio::test]
    async fn enumerates_each_unique_value_once_in_order() {
        let j = Journal::open_in_memory().await.unwrap();
        for (unit, msg) in [("a.service", "1"), ("b.service", "2"), ("a.service", "3")] {
            j.append(vec![
                ("UNIT".to_owned(), unit.to_owned()),
                ("MESSAGE".to_owned(), msg.to_owned()),
            ])
            .await
            .unwrap();
        }

        let chunks: Vec<_> = field_pump(j, "UNIT".to_owned(), OutputMode::Short)
            .collect()
            .await;
        let values: Vec<String> = chunks
            .into_iter()
            .map(|c| String::from_utf8(c.unwrap().to_vec()).unwrap())
            .collect();
        assert_eq!(values, vec!["a.service\n".to_owned(), "b.service\n".to_owned()]);
    }

    #[tokio::test]
    async fn json_mode_wraps_each_value() {
        let j = Journal::open_in_memory().await.unwrap();
        j.append(vec![("UNIT".to_owned(), "a.service".to_owned())])
            .await
            .unwrap();
        let chunks: Vec<_> = field_pump(j, "UNIT".to_owned(), OutputMode::Json)
            .collect()
            .await;
        assert_eq!(chunks.len(), 1);
        let text = String::from_utf8(chunks[0].as_ref().unwrap().to_vec()).unwrap();
        assert!(text.contains("\"UNIT\""));
    }

    #[tokio::test]
    async fn empty_field_yields_no_chunks() {
        let j = Journal::open_in_memory().await.unwrap();
        let chunks: Vec<_> = field_pump(j, "UNIT".to_owned(), OutputMode::Short)
            .collect()
            .await;
        assert!(chunks.is_empty());
    }
}
