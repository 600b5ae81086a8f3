//! Change streams: one stream per table, one shard per stream
//!
//! Records are appended in write order with zero-padded sequence numbers so
//! sequence strings sort the same way the numbers do. Shard iterators are
//! opaque `stream|shard|position` tokens; positions are indexes into the
//! record log.

use domain::requests::{
    Record, RecordEventName, SequenceNumberRange, Shard, ShardIteratorType, StreamDescription,
    StreamRecord, StreamStatus,
};
use domain::table::StreamViewType;
use domain::{DomainError, Item};
use uuid::Uuid;

/// The only shard a stream ever has.
pub(crate) const SHARD_ID: &str = "shard-0";

const TOKEN_SEPARATOR: char = '|';

#[derive(Debug)]
pub(crate) struct StreamState {
    id: String,
    view_type: StreamViewType,
    records: Vec<Record>,
    next_sequence: u64,
}

impl StreamState {
    pub fn new(table: &str, view_type: StreamViewType) -> Self {
        Self {
            id: format!("{table}/{}", Uuid::new_v4().simple()),
            view_type,
            records: Vec::new(),
            next_sequence: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Append one change record, shaping the images per the view type.
    pub fn append(
        &mut self,
        event: RecordEventName,
        keys: Item,
        old: Option<Item>,
        new: Option<Item>,
    ) {
        let sequence_number = format!("{:020}", self.next_sequence);
        self.next_sequence += 1;
        let (new_image, old_image) = match self.view_type {
            StreamViewType::KeysOnly => (None, None),
            StreamViewType::NewImage => (new, None),
            StreamViewType::OldImage => (None, old),
            StreamViewType::NewAndOldImages => (new, old),
        };
        self.records.push(Record {
            event_id: Uuid::new_v4().simple().to_string(),
            event_name: event,
            stream_record: StreamRecord {
                keys,
                new_image,
                old_image,
                sequence_number,
            },
        });
    }

    pub fn describe(&self, table: &str) -> StreamDescription {
        let starting_sequence_number = self
            .records
            .first()
            .map(|record| record.stream_record.sequence_number.clone());
        StreamDescription {
            stream_id: self.id.clone(),
            table_name: table.to_string(),
            stream_status: StreamStatus::Enabled,
            stream_view_type: self.view_type,
            shards: vec![Shard {
                shard_id: SHARD_ID.to_string(),
                sequence_number_range: SequenceNumberRange {
                    starting_sequence_number,
                    ending_sequence_number: None,
                },
            }],
        }
    }

    /// Resolve an iterator request to a position in the record log.
    pub fn position_for(
        &self,
        iterator_type: ShardIteratorType,
        sequence_number: Option<&str>,
    ) -> Result<usize, DomainError> {
        let parse = |text: Option<&str>| -> Result<u64, DomainError> {
            let text = text.ok_or_else(|| {
                DomainError::Validation(
                    "a sequence-number iterator requires a sequence number".to_string(),
                )
            })?;
            text.parse().map_err(|_| {
                DomainError::Validation(format!("invalid sequence number: {text}"))
            })
        };
        let position = match iterator_type {
            ShardIteratorType::TrimHorizon => 0,
            ShardIteratorType::Latest => self.records.len(),
            ShardIteratorType::AtSequenceNumber => {
                let target = parse(sequence_number)?;
                self.records
                    .partition_point(|record| sequence_of(record) < target)
            },
            ShardIteratorType::AfterSequenceNumber => {
                let target = parse(sequence_number)?;
                self.records
                    .partition_point(|record| sequence_of(record) <= target)
            },
        };
        Ok(position)
    }

    /// Read up to `limit` records starting at `position`; returns the
    /// records and the position the next iterator should continue from.
    pub fn read_from(&self, position: usize, limit: Option<usize>) -> (Vec<Record>, usize) {
        let start = position.min(self.records.len());
        let end = match limit {
            Some(limit) => (start + limit).min(self.records.len()),
            None => self.records.len(),
        };
        (self.records[start..end].to_vec(), end)
    }

    pub fn encode_iterator(&self, position: usize) -> String {
        format!("{}{TOKEN_SEPARATOR}{SHARD_ID}{TOKEN_SEPARATOR}{position}", self.id)
    }
}

/// Split an iterator token back into stream id, shard id, and position.
pub(crate) fn decode_iterator(token: &str) -> Result<(String, String, usize), DomainError> {
    let malformed = || DomainError::Validation(format!("malformed shard iterator: {token}"));
    let mut parts = token.rsplitn(3, TOKEN_SEPARATOR);
    let position = parts
        .next()
        .and_then(|text| text.parse().ok())
        .ok_or_else(malformed)?;
    let shard_id = parts.next().ok_or_else(malformed)?.to_string();
    let stream_id = parts.next().ok_or_else(malformed)?.to_string();
    Ok((stream_id, shard_id, position))
}

fn sequence_of(record: &Record) -> u64 {
    record
        .stream_record
        .sequence_number
        .parse()
        .unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use domain::AttributeValue;

    use super::*;

    fn keys(id: &str) -> Item {
        let mut keys = Item::new();
        keys.insert("pk".to_string(), AttributeValue::S(id.to_string()));
        keys
    }

    fn stream_with_records(view_type: StreamViewType, count: usize) -> StreamState {
        let mut stream = StreamState::new("orders", view_type);
        for i in 0..count {
            stream.append(
                RecordEventName::Insert,
                keys(&i.to_string()),
                None,
                Some(keys(&i.to_string())),
            );
        }
        stream
    }

    #[test]
    fn sequence_numbers_are_zero_padded_and_increasing() {
        let stream = stream_with_records(StreamViewType::KeysOnly, 2);
        let (records, _) = stream.read_from(0, None);
        assert_eq!(records[0].stream_record.sequence_number, format!("{:020}", 0));
        assert_eq!(records[1].stream_record.sequence_number, format!("{:020}", 1));
    }

    #[test]
    fn keys_only_view_drops_both_images() {
        let stream = stream_with_records(StreamViewType::KeysOnly, 1);
        let (records, _) = stream.read_from(0, None);
        assert!(records[0].stream_record.new_image.is_none());
        assert!(records[0].stream_record.old_image.is_none());
        assert!(!records[0].stream_record.keys.is_empty());
    }

    #[test]
    fn new_and_old_images_view_keeps_both() {
        let mut stream = StreamState::new("orders", StreamViewType::NewAndOldImages);
        stream.append(
            RecordEventName::Modify,
            keys("a"),
            Some(keys("a")),
            Some(keys("a")),
        );
        let (records, _) = stream.read_from(0, None);
        assert!(records[0].stream_record.new_image.is_some());
        assert!(records[0].stream_record.old_image.is_some());
    }

    #[test]
    fn trim_horizon_starts_at_zero_and_latest_at_the_end() {
        let stream = stream_with_records(StreamViewType::KeysOnly, 3);
        assert_eq!(
            stream.position_for(ShardIteratorType::TrimHorizon, None).unwrap(),
            0
        );
        assert_eq!(
            stream.position_for(ShardIteratorType::Latest, None).unwrap(),
            3
        );
    }

    #[test]
    fn at_and_after_sequence_number_positions() {
        let stream = stream_with_records(StreamViewType::KeysOnly, 3);
        assert_eq!(
            stream
                .position_for(ShardIteratorType::AtSequenceNumber, Some("1"))
                .unwrap(),
            1
        );
        assert_eq!(
            stream
                .position_for(ShardIteratorType::AfterSequenceNumber, Some("1"))
                .unwrap(),
            2
        );
    }

    #[test]
    fn sequence_number_iterator_without_number_is_rejected() {
        let stream = stream_with_records(StreamViewType::KeysOnly, 1);
        let err = stream
            .position_for(ShardIteratorType::AtSequenceNumber, None)
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn read_from_respects_the_limit() {
        let stream = stream_with_records(StreamViewType::KeysOnly, 5);
        let (records, next) = stream.read_from(1, Some(2));
        assert_eq!(records.len(), 2);
        assert_eq!(next, 3);
    }

    #[test]
    fn read_from_past_the_end_is_empty() {
        let stream = stream_with_records(StreamViewType::KeysOnly, 2);
        let (records, next) = stream.read_from(10, None);
        assert!(records.is_empty());
        assert_eq!(next, 2);
    }

    #[test]
    fn iterator_tokens_round_trip() {
        let stream = stream_with_records(StreamViewType::KeysOnly, 1);
        let token = stream.encode_iterator(7);
        let (stream_id, shard_id, position) = decode_iterator(&token).unwrap();
        assert_eq!(stream_id, stream.id());
        assert_eq!(shard_id, SHARD_ID);
        assert_eq!(position, 7);
    }

    #[test]
    fn malformed_iterator_is_rejected() {
        let err = decode_iterator("garbage").unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn describe_reports_a_single_shard() {
        let stream = stream_with_records(StreamViewType::KeysOnly, 2);
        let description = stream.describe("orders");
        assert_eq!(description.shards.len(), 1);
        assert_eq!(description.shards[0].shard_id, SHARD_ID);
        assert_eq!(description.table_name, "orders");
        assert_eq!(
            description.shards[0]
                .sequence_number_range
                .starting_sequence_number,
            Some(format!("{:020}", 0))
        );
    }
}
