// Realtime Fan-out - per-user logical channels for live message delivery
// At-most-once, best-effort: an unregistered recipient catches up on next poll

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info};

use crate::models::{EntityId, MessageWithSender};

/// Events pushed to a connected client over its channel.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerEvent {
    /// A message addressed to this client was just persisted.
    NewMessage(MessageWithSender),
    /// Acknowledgment to the sender that its message was persisted.
    MessageSent(MessageWithSender),
    /// A request on this connection failed; scoped to that request only.
    Error { message: String },
}

/// Events a client sends over its connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Register this connection under the user's channel.
    JoinRoom { user_id: EntityId },
    /// Persist a message and fan it out.
    SendMessage {
        sender_id: EntityId,
        #[serde(default)]
        receiver_id: Option<EntityId>,
        content: String,
    },
}

/// Registry of per-user outbound channels.
///
/// Delivery is fire-and-forget and never blocks the request path. A message
/// is delivered at most once by construction: each creation triggers exactly
/// one publish, and there is no queuing or replay for absent recipients.
#[derive(Debug, Default)]
pub struct RealtimeHub {
    channels: RwLock<HashMap<EntityId, mpsc::UnboundedSender<ServerEvent>>>,
}

impl RealtimeHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection under the user's channel. A newer connection for
    /// the same user replaces the previous one.
    pub async fn connect(&self, user_id: EntityId, sender: mpsc::UnboundedSender<ServerEvent>) {
        self.channels.write().await.insert(user_id, sender);
        info!("realtime: User {} connected", user_id);
    }

    pub async fn disconnect(&self, user_id: EntityId) {
        if self.channels.write().await.remove(&user_id).is_some() {
            info!("realtime: User {} disconnected", user_id);
        }
    }

    pub async fn is_connected(&self, user_id: EntityId) -> bool {
        self.channels.read().await.contains_key(&user_id)
    }

    /// Deliver a freshly created message to its receiver's channel, if the
    /// receiver is currently registered. Messages without a receiver (AI
    /// conversations) are never fanned out.
    pub async fn publish_message(&self, message: &MessageWithSender) {
        let Some(receiver_id) = message.message.receiver_id else {
            return;
        };

        let stale = {
            let channels = self.channels.read().await;
            match channels.get(&receiver_id) {
                Some(sender) => sender
                    .send(ServerEvent::NewMessage(message.clone()))
                    .is_err(),
                None => {
                    debug!(
                        "realtime: Receiver {} not connected, message {} awaits poll",
                        receiver_id, message.message.id
                    );
                    false
                }
            }
        };

        // The peer task hung up without unregistering; drop its channel.
        if stale {
            self.channels.write().await.remove(&receiver_id);
            debug!("realtime: Dropped stale channel for user {}", receiver_id);
        }
    }

    pub async fn connected_count(&self) -> usize {
        self.channels.read().await.len()
    }
}
