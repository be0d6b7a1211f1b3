//! Session registry — session identifiers to live conversation state.
//!
//! Lifecycle: an entry is inserted on first contact and removed when its
//! connection drops. Cross-session operations synchronize on one lock;
//! per-session message handling serializes on the session's own mutex.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use super::protocol::ServerMessage;
use super::session::SessionState;
use crate::error::DispatchError;

/// Handle to one registered session: its state machine and the outbound
/// side of its connection.
#[derive(Clone)]
pub struct SessionHandle {
    pub state: Arc<Mutex<SessionState>>,
    outbound: mpsc::UnboundedSender<ServerMessage>,
    connection_id: Uuid,
}

impl SessionHandle {
    pub fn connection_id(&self) -> Uuid {
        self.connection_id
    }
}

/// In-memory registry of active sessions. Lifecycle = process uptime.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl SessionRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            sessions: RwLock::new(HashMap::new()),
        })
    }

    /// Register a connection for `session_id`.
    ///
    /// Insert-if-absent for the state machine: a reconnect under the same
    /// identifier keeps the existing state and only replaces the outbound
    /// handle. Returns the handle and the receiver end the connection
    /// forwards to its socket.
    pub async fn connect(
        &self,
        session_id: &str,
    ) -> (SessionHandle, mpsc::UnboundedReceiver<ServerMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let connection_id = Uuid::new_v4();

        let mut sessions = self.sessions.write().await;
        let handle = match sessions.get(session_id) {
            Some(existing) => {
                debug!(session_id = %session_id, "Reconnect, replacing connection handle");
                SessionHandle {
                    state: Arc::clone(&existing.state),
                    outbound: tx,
                    connection_id,
                }
            }
            None => {
                info!(session_id = %session_id, "New session registered");
                SessionHandle {
                    state: Arc::new(Mutex::new(SessionState::new(session_id))),
                    outbound: tx,
                    connection_id,
                }
            }
        };
        sessions.insert(session_id.to_string(), handle.clone());
        (handle, rx)
    }

    /// Insert a fresh session with no live connection.
    ///
    /// Used when a message arrives for an identifier the registry does not
    /// know: the dispatcher treats it as a fresh `NotStarted` session.
    /// Sends will fail until a connection registers under the identifier.
    pub async fn insert_fresh(&self, session_id: &str) -> SessionHandle {
        let (tx, _rx) = mpsc::unbounded_channel();
        let handle = SessionHandle {
            state: Arc::new(Mutex::new(SessionState::new(session_id))),
            outbound: tx,
            connection_id: Uuid::new_v4(),
        };
        self.sessions
            .write()
            .await
            .insert(session_id.to_string(), handle.clone());
        handle
    }

    pub async fn get(&self, session_id: &str) -> Option<SessionHandle> {
        self.sessions.read().await.get(session_id).cloned()
    }

    /// Remove the entry for `session_id` if it still belongs to
    /// `connection_id` — a newer connection under the same identifier is
    /// left untouched.
    pub async fn disconnect(&self, session_id: &str, connection_id: Uuid) {
        let mut sessions = self.sessions.write().await;
        if sessions
            .get(session_id)
            .is_some_and(|h| h.connection_id == connection_id)
        {
            sessions.remove(session_id);
            info!(session_id = %session_id, "Session deregistered");
        }
    }

    /// Remove the entry unconditionally (delivery-failure teardown).
    pub async fn deregister(&self, session_id: &str) {
        if self.sessions.write().await.remove(session_id).is_some() {
            info!(session_id = %session_id, "Session deregistered");
        }
    }

    /// Deliver an outbound message to the session's connection.
    pub async fn send(
        &self,
        session_id: &str,
        message: ServerMessage,
    ) -> std::result::Result<(), DispatchError> {
        let handle = self.get(session_id).await.ok_or_else(|| {
            DispatchError::UnknownSession {
                session_id: session_id.to_string(),
            }
        })?;
        handle
            .outbound
            .send(message)
            .map_err(|_| DispatchError::DeliveryFailure {
                session_id: session_id.to_string(),
                reason: "connection closed".to_string(),
            })
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
