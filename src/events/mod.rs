//! Event fan-out hub.
//!
//! Keeps an explicit bidirectional index of live sessions: session ↔
//! user, session ↔ subscribed trips, trip → sessions. The index is
//! rebuilt purely from register/subscribe/unsubscribe/disconnect calls;
//! there is no ambient socket state. Delivery is best-effort to
//! currently-registered sessions; a session whose receiver is gone
//! simply misses the event.

use crate::db::{repo, Repository};
use crate::domain::{TripId, TripStatus, UserId};
use crate::error::AppError;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;
use uuid::Uuid;

/// Opaque handle for one connected session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SessionId(Uuid);

impl SessionId {
    fn generate() -> Self {
        SessionId(Uuid::new_v4())
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Event kinds delivered to sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    TripUpdated,
    TripNotification,
    DriverLocation,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::TripUpdated => "trip_updated",
            EventKind::TripNotification => "trip_notification",
            EventKind::DriverLocation => "driver_location",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a session's transport receives.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundEvent {
    pub event: String,
    pub data: serde_json::Value,
}

#[derive(Default)]
struct Topology {
    session_users: HashMap<SessionId, UserId>,
    user_sessions: HashMap<UserId, HashSet<SessionId>>,
    trip_rooms: HashMap<TripId, HashSet<SessionId>>,
    session_trips: HashMap<SessionId, HashSet<TripId>>,
    senders: HashMap<SessionId, UnboundedSender<OutboundEvent>>,
}

/// Fan-out hub: per-trip rooms and per-user channels.
#[derive(Default)]
pub struct EventHub {
    topology: RwLock<Topology>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session for an authenticated user. The returned
    /// receiver is the transport's half of the channel.
    pub fn register(&self, user_id: UserId) -> (SessionId, UnboundedReceiver<OutboundEvent>) {
        let session = SessionId::generate();
        let (tx, rx) = mpsc::unbounded_channel();

        if let Ok(mut topo) = self.topology.write() {
            topo.session_users.insert(session, user_id.clone());
            topo.user_sessions
                .entry(user_id)
                .or_default()
                .insert(session);
            topo.senders.insert(session, tx);
        }

        debug!("Session registered: {}", session);
        (session, rx)
    }

    /// Remove the session from every room and channel it belonged to.
    pub fn disconnect(&self, session: SessionId) {
        let Ok(mut topo) = self.topology.write() else {
            return;
        };

        if let Some(user) = topo.session_users.remove(&session) {
            if let Some(sessions) = topo.user_sessions.get_mut(&user) {
                sessions.remove(&session);
                if sessions.is_empty() {
                    topo.user_sessions.remove(&user);
                }
            }
        }

        if let Some(trips) = topo.session_trips.remove(&session) {
            for trip in trips {
                if let Some(room) = topo.trip_rooms.get_mut(&trip) {
                    room.remove(&session);
                    if room.is_empty() {
                        topo.trip_rooms.remove(&trip);
                    }
                }
            }
        }

        topo.senders.remove(&session);
        debug!("Session disconnected: {}", session);
    }

    /// The user a session authenticated as.
    pub fn session_user(&self, session: SessionId) -> Option<UserId> {
        self.topology
            .read()
            .ok()
            .and_then(|topo| topo.session_users.get(&session).cloned())
    }

    /// Join a trip room. Access is re-verified against current state:
    /// the session's user must be the trip's driver or one of its
    /// passengers right now, not at some earlier check.
    pub async fn subscribe_trip(
        &self,
        repo: &Repository,
        session: SessionId,
        trip_id: &TripId,
    ) -> Result<(), AppError> {
        let user = self
            .session_user(session)
            .ok_or_else(|| AppError::NotFound("session not registered".to_string()))?;

        let mut conn = repo.acquire().await?;
        if !repo::trips::is_party(&mut conn, trip_id, &user).await? {
            return Err(AppError::Forbidden(
                "user has no access to this trip".to_string(),
            ));
        }

        if let Ok(mut topo) = self.topology.write() {
            topo.trip_rooms
                .entry(trip_id.clone())
                .or_default()
                .insert(session);
            topo.session_trips
                .entry(session)
                .or_default()
                .insert(trip_id.clone());
        }

        debug!("Session {} subscribed to trip {}", session, trip_id);
        Ok(())
    }

    pub fn unsubscribe_trip(&self, session: SessionId, trip_id: &TripId) {
        let Ok(mut topo) = self.topology.write() else {
            return;
        };

        if let Some(room) = topo.trip_rooms.get_mut(trip_id) {
            room.remove(&session);
            if room.is_empty() {
                topo.trip_rooms.remove(trip_id);
            }
        }
        if let Some(trips) = topo.session_trips.get_mut(&session) {
            trips.remove(trip_id);
        }
    }

    /// Deliver to every session currently in the trip's room.
    pub fn publish_trip_event(&self, trip_id: &TripId, kind: EventKind, data: serde_json::Value) {
        let Ok(topo) = self.topology.read() else {
            return;
        };

        let Some(room) = topo.trip_rooms.get(trip_id) else {
            return;
        };

        let event = OutboundEvent {
            event: kind.as_str().to_string(),
            data,
        };

        for session in room {
            if let Some(tx) = topo.senders.get(session) {
                let _ = tx.send(event.clone());
            }
        }
    }

    /// Deliver to every session on the user's channel.
    pub fn publish_user_event(&self, user_id: &UserId, kind: EventKind, data: serde_json::Value) {
        let Ok(topo) = self.topology.read() else {
            return;
        };

        let Some(sessions) = topo.user_sessions.get(user_id) else {
            return;
        };

        let event = OutboundEvent {
            event: kind.as_str().to_string(),
            data,
        };

        for session in sessions {
            if let Some(tx) = topo.senders.get(session) {
                let _ = tx.send(event.clone());
            }
        }
    }

    /// Room broadcast for a trip status change, merging extra fields
    /// into the standard `{tripId, status}` payload.
    pub fn emit_trip_update(
        &self,
        trip_id: &TripId,
        status: TripStatus,
        extra: serde_json::Value,
    ) {
        let mut data = serde_json::json!({
            "tripId": trip_id,
            "status": status,
        });

        if let (Some(obj), Some(extra_obj)) = (data.as_object_mut(), extra.as_object()) {
            for (k, v) in extra_obj {
                obj.insert(k.clone(), v.clone());
            }
        }

        debug!("Emitting trip_updated for trip {} ({})", trip_id, status);
        self.publish_trip_event(trip_id, EventKind::TripUpdated, data);
    }
}
