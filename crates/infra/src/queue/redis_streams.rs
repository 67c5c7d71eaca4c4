//! Redis Streams-backed task queue (durable, at-least-once delivery).
//!
//! - **Durable delivery**: messages persist until acknowledged (XACK)
//! - **At-least-once**: stale pending entries are reclaimed and redelivered
//! - **Consumer group**: all narration workers share one group, so each
//!   message is processed by exactly one worker
//! - **Dead-letter stream**: failed payloads are XADDed verbatim to a
//!   secondary stream
//!
//! Stream keys: `fablecast:narration` for tasks, `fablecast:narration:dlq`
//! for dead letters.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{instrument, warn};

use fablecast_narration::{DeadLetterEntry, Delivery, QueueError, TaskQueue};

/// Default stream key for narration tasks.
const DEFAULT_STREAM_KEY: &str = "fablecast:narration";

/// Default dead-letter stream key.
const DEFAULT_DLQ_KEY: &str = "fablecast:narration:dlq";

/// Default consumer group name.
const DEFAULT_GROUP_NAME: &str = "narration-workers";

/// Default pending entry timeout (entries idle longer are reclaimed).
const DEFAULT_PENDING_TIMEOUT_MS: u64 = 60_000;

#[derive(Debug, Clone)]
pub struct RedisStreamsTaskQueue {
    client: Arc<redis::Client>,
    stream_key: String,
    dlq_key: String,
    group_name: String,
    pending_timeout_ms: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum RedisStreamsError {
    #[error("Redis connection error: {0}")]
    Connection(String),

    #[error("Redis command error: {0}")]
    Command(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl From<RedisStreamsError> for QueueError {
    fn from(err: RedisStreamsError) -> Self {
        match err {
            RedisStreamsError::Connection(msg) => QueueError::Connection(msg),
            RedisStreamsError::Command(msg) => QueueError::Command(msg),
            RedisStreamsError::Deserialization(msg) => QueueError::Serialization(msg),
        }
    }
}

impl RedisStreamsTaskQueue {
    /// Create a new Redis Streams task queue.
    ///
    /// Opens the client only; no connection is made until the first command.
    pub fn new(
        redis_url: impl AsRef<str>,
        stream_key: Option<String>,
        dlq_key: Option<String>,
    ) -> Result<Self, RedisStreamsError> {
        let client = redis::Client::open(redis_url.as_ref())
            .map_err(|e| RedisStreamsError::Connection(e.to_string()))?;

        Ok(Self {
            client: Arc::new(client),
            stream_key: stream_key.unwrap_or_else(|| DEFAULT_STREAM_KEY.to_string()),
            dlq_key: dlq_key.unwrap_or_else(|| DEFAULT_DLQ_KEY.to_string()),
            group_name: DEFAULT_GROUP_NAME.to_string(),
            pending_timeout_ms: DEFAULT_PENDING_TIMEOUT_MS,
        })
    }

    async fn connect(&self) -> Result<redis::aio::MultiplexedConnection, RedisStreamsError> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| RedisStreamsError::Connection(e.to_string()))
    }

    /// Ensure the consumer group exists (idempotent).
    ///
    /// XGROUP CREATE with MKSTREAM creates the stream if it doesn't exist;
    /// the BUSYGROUP error on re-creation is ignored.
    pub async fn ensure_consumer_group(&self) -> Result<(), RedisStreamsError> {
        let mut conn = self.connect().await?;
        let _: Result<String, _> = redis::cmd("XGROUP")
            .arg("CREATE")
            .arg(&self.stream_key)
            .arg(&self.group_name)
            .arg("0")
            .arg("MKSTREAM")
            .query_async(&mut conn)
            .await;
        Ok(())
    }

    /// Reclaim entries another (possibly dead) worker left pending too long.
    async fn claim_stale(
        &self,
        conn: &mut redis::aio::MultiplexedConnection,
        consumer_name: &str,
    ) -> Result<Option<Delivery>, RedisStreamsError> {
        // XAUTOCLAIM returns [next_cursor, entries, ...]; entries use the
        // same shape as XRANGE.
        let reply: redis::RedisResult<Vec<redis::Value>> = redis::cmd("XAUTOCLAIM")
            .arg(&self.stream_key)
            .arg(&self.group_name)
            .arg(consumer_name)
            .arg(self.pending_timeout_ms.to_string())
            .arg("0-0")
            .arg("COUNT")
            .arg("1")
            .query_async(conn)
            .await;

        let reply = match reply {
            Ok(reply) => reply,
            Err(_) => return Ok(None), // Group may not exist yet
        };

        let Some(redis::Value::Bulk(entries)) = reply.get(1) else {
            return Ok(None);
        };
        for entry in entries {
            if let Ok(mut delivery) = parse_stream_entry(entry.clone()) {
                // Reclaimed means at least one earlier delivery.
                delivery.delivery_count = 2;
                return Ok(Some(delivery));
            }
        }
        Ok(None)
    }

    async fn read_new(
        &self,
        conn: &mut redis::aio::MultiplexedConnection,
        consumer_name: &str,
        block_ms: u64,
    ) -> Result<Option<Delivery>, RedisStreamsError> {
        // XREADGROUP with ">" reads entries never delivered to this group.
        let reply: redis::RedisResult<HashMap<String, Vec<redis::Value>>> =
            redis::cmd("XREADGROUP")
                .arg("GROUP")
                .arg(&self.group_name)
                .arg(consumer_name)
                .arg("COUNT")
                .arg("1")
                .arg("BLOCK")
                .arg(block_ms.to_string())
                .arg("STREAMS")
                .arg(&self.stream_key)
                .arg(">")
                .query_async(conn)
                .await;

        let stream_data = match reply {
            Ok(data) => data,
            // A nil reply (blocking timeout) decodes as an error for the
            // HashMap type; treat it as "no message".
            Err(e) if e.kind() == redis::ErrorKind::TypeError => return Ok(None),
            Err(e) => {
                return Err(RedisStreamsError::Command(format!(
                    "XREADGROUP failed: {e}"
                )))
            }
        };

        let entries = stream_data
            .get(&self.stream_key)
            .cloned()
            .unwrap_or_default();
        for entry in entries {
            match parse_stream_entry(entry) {
                Ok(delivery) => return Ok(Some(delivery)),
                Err(e) => warn!(error = %e, "skipping unparseable stream entry"),
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl TaskQueue for RedisStreamsTaskQueue {
    #[instrument(skip(self, payload), fields(stream_key = %self.stream_key, key = %key), err)]
    async fn publish(&self, key: &str, payload: &str) -> Result<(), QueueError> {
        let mut conn = self.connect().await?;

        let _: String = redis::cmd("XADD")
            .arg(&self.stream_key)
            .arg("*")
            .arg("task_id")
            .arg(key)
            .arg("payload")
            .arg(payload)
            .query_async(&mut conn)
            .await
            .map_err(|e| RedisStreamsError::Command(format!("XADD failed: {e}")))?;

        Ok(())
    }

    async fn receive(
        &self,
        consumer_name: &str,
        wait: Duration,
    ) -> Result<Option<Delivery>, QueueError> {
        let mut conn = self.connect().await?;

        // Reclaim abandoned entries first so they don't starve behind new
        // traffic.
        if let Some(delivery) = self.claim_stale(&mut conn, consumer_name).await? {
            return Ok(Some(delivery));
        }

        let block_ms = wait.as_millis().max(1) as u64;
        Ok(self.read_new(&mut conn, consumer_name, block_ms).await?)
    }

    async fn ack(&self, delivery_id: &str) -> Result<(), QueueError> {
        let mut conn = self.connect().await?;

        let _: u64 = redis::cmd("XACK")
            .arg(&self.stream_key)
            .arg(&self.group_name)
            .arg(delivery_id)
            .query_async(&mut conn)
            .await
            .map_err(|e| RedisStreamsError::Command(format!("XACK failed: {e}")))?;

        Ok(())
    }

    #[instrument(skip(self, payload), fields(dlq_key = %self.dlq_key), err)]
    async fn send_to_dead_letter(&self, payload: &str, reason: &str) -> Result<(), QueueError> {
        let mut conn = self.connect().await?;

        let _: String = redis::cmd("XADD")
            .arg(&self.dlq_key)
            .arg("*")
            .arg("payload")
            .arg(payload)
            .arg("reason")
            .arg(reason)
            .arg("failed_at")
            .arg(Utc::now().to_rfc3339())
            .query_async(&mut conn)
            .await
            .map_err(|e| RedisStreamsError::Command(format!("DLQ XADD failed: {e}")))?;

        warn!(reason = %reason, "task payload sent to dead-letter stream");
        Ok(())
    }

    async fn read_dead_letters(&self, limit: usize) -> Result<Vec<DeadLetterEntry>, QueueError> {
        let mut conn = self.connect().await?;

        let entries: Vec<redis::Value> = redis::cmd("XRANGE")
            .arg(&self.dlq_key)
            .arg("-")
            .arg("+")
            .arg("COUNT")
            .arg(limit.to_string())
            .query_async(&mut conn)
            .await
            .map_err(|e| RedisStreamsError::Command(format!("XRANGE failed: {e}")))?;

        let mut dead_letters = Vec::new();
        for entry in entries {
            match parse_dead_letter_entry(entry) {
                Ok(dead_letter) => dead_letters.push(dead_letter),
                Err(e) => warn!(error = %e, "skipping unparseable dead-letter entry"),
            }
        }
        Ok(dead_letters)
    }
}

/// Parse one stream entry (`[message_id, [field, value, ...]]`) into a
/// [`Delivery`].
fn parse_stream_entry(entry: redis::Value) -> Result<Delivery, RedisStreamsError> {
    let (message_id, fields) = split_entry(entry)?;

    let payload = fields
        .get("payload")
        .cloned()
        .ok_or_else(|| RedisStreamsError::Deserialization("missing payload field".to_string()))?;

    Ok(Delivery {
        id: message_id,
        key: fields.get("task_id").cloned(),
        payload,
        delivery_count: 1,
    })
}

fn parse_dead_letter_entry(entry: redis::Value) -> Result<DeadLetterEntry, RedisStreamsError> {
    let (message_id, fields) = split_entry(entry)?;

    let payload = fields
        .get("payload")
        .cloned()
        .ok_or_else(|| RedisStreamsError::Deserialization("missing payload field".to_string()))?;
    let reason = fields.get("reason").cloned().unwrap_or_default();
    let failed_at = fields
        .get("failed_at")
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);

    Ok(DeadLetterEntry {
        id: message_id,
        payload,
        reason,
        failed_at,
    })
}

/// Split a stream entry into its message id and field map.
fn split_entry(entry: redis::Value) -> Result<(String, HashMap<String, String>), RedisStreamsError> {
    let redis::Value::Bulk(entry_vec) = entry else {
        return Err(RedisStreamsError::Deserialization(
            "invalid entry format".to_string(),
        ));
    };
    if entry_vec.len() < 2 {
        return Err(RedisStreamsError::Deserialization(
            "entry too short".to_string(),
        ));
    }

    let message_id = match &entry_vec[0] {
        redis::Value::Data(data) => String::from_utf8_lossy(data).to_string(),
        _ => {
            return Err(RedisStreamsError::Deserialization(
                "invalid message id format".to_string(),
            ))
        }
    };

    let redis::Value::Bulk(fields_vec) = &entry_vec[1] else {
        return Err(RedisStreamsError::Deserialization(
            "invalid fields format".to_string(),
        ));
    };

    let mut fields = HashMap::new();
    for chunk in fields_vec.chunks(2) {
        if let [redis::Value::Data(key), redis::Value::Data(value)] = chunk {
            fields.insert(
                String::from_utf8_lossy(key).to_string(),
                String::from_utf8_lossy(value).to_string(),
            );
        }
    }

    Ok((message_id, fields))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(s: &str) -> redis::Value {
        redis::Value::Data(s.as_bytes().to_vec())
    }

    fn entry(id: &str, fields: &[(&str, &str)]) -> redis::Value {
        let mut flat = Vec::new();
        for (k, v) in fields {
            flat.push(data(k));
            flat.push(data(v));
        }
        redis::Value::Bulk(vec![data(id), redis::Value::Bulk(flat)])
    }

    #[test]
    fn parses_task_entry() {
        let delivery = parse_stream_entry(entry(
            "1-0",
            &[("task_id", "a:b:c"), ("payload", "{\"v\":1}")],
        ))
        .unwrap();
        assert_eq!(delivery.id, "1-0");
        assert_eq!(delivery.key.as_deref(), Some("a:b:c"));
        assert_eq!(delivery.payload, "{\"v\":1}");
    }

    #[test]
    fn rejects_entry_without_payload() {
        let err = parse_stream_entry(entry("1-0", &[("task_id", "a")])).unwrap_err();
        assert!(matches!(err, RedisStreamsError::Deserialization(_)));
    }

    #[test]
    fn parses_dead_letter_entry_with_timestamp() {
        let dead_letter = parse_dead_letter_entry(entry(
            "2-0",
            &[
                ("payload", "raw"),
                ("reason", "boom"),
                ("failed_at", "2026-01-02T03:04:05+00:00"),
            ],
        ))
        .unwrap();
        assert_eq!(dead_letter.payload, "raw");
        assert_eq!(dead_letter.reason, "boom");
        assert_eq!(dead_letter.failed_at.to_rfc3339(), "2026-01-02T03:04:05+00:00");
    }
}
