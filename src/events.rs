//! In-process audit events, fanned out to SSE subscribers.
//!
//! Emission is fire-and-forget: a full or subscriber-less channel never fails
//! the operation that produced the event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::store::operations::items::ItemVariant;
use crate::store::operations::progress::ProgressStatus;

pub const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AuditEvent {
    #[serde(rename_all = "camelCase")]
    AttemptRecorded {
        user_id: String,
        attempt_id: String,
        item_id: String,
        variant: ItemVariant,
        is_correct: bool,
        at: DateTime<Utc>,
    },
    #[serde(rename_all = "camelCase")]
    ProgressUpdated {
        user_id: String,
        word_id: String,
        status: ProgressStatus,
        mastery_level: f64,
        next_review_at: Option<DateTime<Utc>>,
        at: DateTime<Utc>,
    },
    #[serde(rename_all = "camelCase")]
    ItemCreated {
        item_id: String,
        variant: ItemVariant,
        at: DateTime<Utc>,
    },
    #[serde(rename_all = "camelCase")]
    ItemSoftDeleted { item_id: String, at: DateTime<Utc> },
    #[serde(rename_all = "camelCase")]
    StatsRecomputed {
        user_id: String,
        date: chrono::NaiveDate,
        at: DateTime<Utc>,
    },
}

impl AuditEvent {
    /// The user the event belongs to; catalog events are global.
    pub fn user_scope(&self) -> Option<&str> {
        match self {
            Self::AttemptRecorded { user_id, .. }
            | Self::ProgressUpdated { user_id, .. }
            | Self::StatsRecomputed { user_id, .. } => Some(user_id),
            Self::ItemCreated { .. } | Self::ItemSoftDeleted { .. } => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<AuditEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn emit(&self, event: AuditEvent) {
        // Err means no subscriber is listening, which is fine.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuditEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
