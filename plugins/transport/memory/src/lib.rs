use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use tokio::sync::Notify;

use courier_api::{BoxFuture, Message, MessageReader, MessageWriter, TransportError};

// ═══════════════════════════════════════════════════════════════
//  MemoryBrokerConfig
// ═══════════════════════════════════════════════════════════════

fn default_max_records() -> usize {
    100_000
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct MemoryBrokerConfig {
    /// Retention per topic; the oldest messages are dropped beyond it.
    #[serde(default = "default_max_records")]
    pub max_records: usize,
}

impl Default for MemoryBrokerConfig {
    fn default() -> Self {
        Self {
            max_records: default_max_records(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  TopicLog — single-partition append-only log + group cursors
// ═══════════════════════════════════════════════════════════════

struct GroupCursor {
    /// Next offset to hand out from the log.
    next: i64,
    /// Offset after the highest committed message.
    committed: i64,
    /// Messages handed back by `requeue`, served before the log.
    redeliver: VecDeque<Message>,
}

struct TopicState {
    log: VecDeque<Message>,
    /// Offset of `log[0]`.
    base_offset: i64,
    next_offset: i64,
    groups: HashMap<String, GroupCursor>,
}

struct TopicLog {
    name: String,
    max_records: usize,
    state: Mutex<TopicState>,
    /// Woken on every append and requeue.
    notify: Notify,
}

impl TopicLog {
    fn new(name: String, max_records: usize) -> Self {
        Self {
            name,
            max_records,
            state: Mutex::new(TopicState {
                log: VecDeque::new(),
                base_offset: 0,
                next_offset: 0,
                groups: HashMap::new(),
            }),
            notify: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TopicState> {
        match self.state.lock() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!(topic = %self.name, "topic lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn append(&self, key: Vec<u8>, value: Vec<u8>) -> i64 {
        let offset = {
            let mut state = self.lock();
            let offset = state.next_offset;
            state.log.push_back(Message {
                key,
                value,
                partition: 0,
                offset,
            });
            state.next_offset += 1;
            while state.log.len() > self.max_records {
                state.log.pop_front();
                state.base_offset += 1;
            }
            offset
        };
        self.notify.notify_waiters();
        offset
    }

    fn take_next(&self, group: &str) -> Option<Message> {
        let mut state = self.lock();
        let base = state.base_offset;
        let end = state.next_offset;
        let cursor = state
            .groups
            .entry(group.to_string())
            .or_insert_with(|| GroupCursor {
                next: base,
                committed: base,
                redeliver: VecDeque::new(),
            });

        if let Some(message) = cursor.redeliver.pop_front() {
            return Some(message);
        }
        if cursor.next < base {
            tracing::warn!(
                topic = %self.name,
                group,
                skipped = base - cursor.next,
                "consumer fell behind retention, skipping"
            );
            cursor.next = base;
        }
        if cursor.next >= end {
            return None;
        }
        let idx = (cursor.next - base) as usize;
        cursor.next += 1;
        state.log.get(idx).cloned()
    }

    fn commit(&self, group: &str, offset: i64) {
        let mut state = self.lock();
        if let Some(cursor) = state.groups.get_mut(group) {
            cursor.committed = cursor.committed.max(offset + 1);
        }
    }

    fn requeue(&self, group: &str, message: Message) {
        {
            let mut state = self.lock();
            let base = state.base_offset;
            state
                .groups
                .entry(group.to_string())
                .or_insert_with(|| GroupCursor {
                    next: base,
                    committed: base,
                    redeliver: VecDeque::new(),
                })
                .redeliver
                .push_back(message);
        }
        self.notify.notify_waiters();
    }
}

// ═══════════════════════════════════════════════════════════════
//  MemoryBroker
// ═══════════════════════════════════════════════════════════════

/// In-process broker: named single-partition topics with consumer groups.
///
/// Every group reads the whole topic independently; readers sharing a group
/// share its cursor, so concurrent readers split the messages between them.
/// Nothing is committed on read: a message read and never committed is only
/// delivered again after `requeue`.
pub struct MemoryBroker {
    config: MemoryBrokerConfig,
    topics: RwLock<HashMap<String, Arc<TopicLog>>>,
}

impl Default for MemoryBroker {
    fn default() -> Self {
        Self::new(MemoryBrokerConfig::default())
    }
}

impl MemoryBroker {
    pub fn new(config: MemoryBrokerConfig) -> Self {
        Self {
            config,
            topics: RwLock::new(HashMap::new()),
        }
    }

    /// Create a topic. Returns `false` if it already exists.
    pub fn create_topic(&self, name: &str) -> bool {
        let mut guard = match self.topics.write() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("broker topic table write lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        if guard.contains_key(name) {
            return false;
        }
        guard.insert(
            name.to_string(),
            Arc::new(TopicLog::new(name.to_string(), self.config.max_records)),
        );
        tracing::info!(topic = name, "created topic");
        true
    }

    pub fn list_topics(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read_topics().keys().cloned().collect();
        names.sort();
        names
    }

    /// Open the read half for `group` on `topic`.
    pub fn reader(&self, topic: &str, group: &str) -> Result<MemoryReader, TransportError> {
        Ok(MemoryReader {
            topic: self.topic(topic)?,
            group: group.to_string(),
            closed: AtomicBool::new(false),
        })
    }

    /// Open the write half for `topic`.
    pub fn writer(&self, topic: &str) -> Result<MemoryWriter, TransportError> {
        Ok(MemoryWriter {
            topic: self.topic(topic)?,
            closed: AtomicBool::new(false),
        })
    }

    /// Number of messages currently retained by `topic`.
    pub fn topic_len(&self, topic: &str) -> Option<usize> {
        self.read_topics().get(topic).map(|t| t.lock().log.len())
    }

    /// Offset after the last message `group` committed on `topic`.
    pub fn committed_offset(&self, topic: &str, group: &str) -> Option<i64> {
        let topic = self.read_topics().get(topic).cloned()?;
        let state = topic.lock();
        state.groups.get(group).map(|c| c.committed)
    }

    fn topic(&self, name: &str) -> Result<Arc<TopicLog>, TransportError> {
        self.read_topics()
            .get(name)
            .cloned()
            .ok_or_else(|| TransportError::UnknownTopic(name.to_string()))
    }

    fn read_topics(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Arc<TopicLog>>> {
        match self.topics.read() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("broker topic table read lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  MemoryReader / MemoryWriter
// ═══════════════════════════════════════════════════════════════

pub struct MemoryReader {
    topic: Arc<TopicLog>,
    group: String,
    closed: AtomicBool,
}

impl MessageReader for MemoryReader {
    fn read_next(&self) -> BoxFuture<'_, Result<Message, TransportError>> {
        Box::pin(async move {
            loop {
                // Register interest before looking at the log so an append
                // between the check and the await is not missed.
                let notified = self.topic.notify.notified();
                tokio::pin!(notified);
                notified.as_mut().enable();

                if self.closed.load(Ordering::Acquire) {
                    return Err(TransportError::Closed);
                }
                if let Some(message) = self.topic.take_next(&self.group) {
                    return Ok(message);
                }
                notified.await;
            }
        })
    }

    fn commit(&self, message: &Message) -> BoxFuture<'_, Result<(), TransportError>> {
        let offset = message.offset;
        Box::pin(async move {
            if self.closed.load(Ordering::Acquire) {
                return Err(TransportError::Closed);
            }
            self.topic.commit(&self.group, offset);
            Ok(())
        })
    }

    fn requeue(&self, message: Message) -> BoxFuture<'_, Result<(), TransportError>> {
        Box::pin(async move {
            if self.closed.load(Ordering::Acquire) {
                return Err(TransportError::Closed);
            }
            self.topic.requeue(&self.group, message);
            Ok(())
        })
    }

    fn close(&self) -> BoxFuture<'_, Result<(), TransportError>> {
        Box::pin(async move {
            self.closed.store(true, Ordering::Release);
            self.topic.notify.notify_waiters();
            tracing::debug!(topic = %self.topic.name, group = %self.group, "reader closed");
            Ok(())
        })
    }
}

pub struct MemoryWriter {
    topic: Arc<TopicLog>,
    closed: AtomicBool,
}

impl MessageWriter for MemoryWriter {
    fn write(&self, key: Vec<u8>, value: Vec<u8>) -> BoxFuture<'_, Result<(), TransportError>> {
        Box::pin(async move {
            if self.closed.load(Ordering::Acquire) {
                return Err(TransportError::Closed);
            }
            let offset = self.topic.append(key, value);
            tracing::trace!(topic = %self.topic.name, offset, "appended");
            Ok(())
        })
    }

    fn close(&self) -> BoxFuture<'_, Result<(), TransportError>> {
        Box::pin(async move {
            self.closed.store(true, Ordering::Release);
            Ok(())
        })
    }
}
