//! Test fixtures shared by the unit tests

use crate::auth::StaticAuth;
use crate::connection::{ConnectionManager, ManagerConfig};
use crate::resolver::{Deployment, UriResolver};
use crate::subscription::Subscriber;
use crate::transport::{DialBehavior, LoopbackConnector};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tether_core::{ConnectionError, DisconnectReason, Envelope};

/// Everything a subscriber was told, in order
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Event {
    Connect,
    Disconnect(DisconnectReason),
    Message(Envelope),
    Error(ConnectionError),
}

#[derive(Debug, Default)]
pub(crate) struct Recorder {
    events: Mutex<Vec<Event>>,
}

impl Recorder {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn connects(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| matches!(e, Event::Connect))
            .count()
    }

    pub fn messages(&self) -> Vec<Envelope> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                Event::Message(m) => Some(m.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<ConnectionError> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                Event::Error(err) => Some(err.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn disconnects(&self) -> Vec<DisconnectReason> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                Event::Disconnect(reason) => Some(reason.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Subscriber for Recorder {
    fn on_message(&self, message: &Envelope) {
        self.events.lock().push(Event::Message(message.clone()));
    }

    fn on_connect(&self) {
        self.events.lock().push(Event::Connect);
    }

    fn on_disconnect(&self, reason: &DisconnectReason) {
        self.events.lock().push(Event::Disconnect(reason.clone()));
    }

    fn on_error(&self, error: &ConnectionError) {
        self.events.lock().push(Event::Error(error.clone()));
    }
}

pub(crate) struct Harness {
    pub manager: ConnectionManager,
    pub connector: Arc<LoopbackConnector>,
    pub auth: Arc<StaticAuth>,
}

/// Manager with default timers, a signed-in user, and a loopback connector
pub(crate) fn harness(fallback: DialBehavior) -> Harness {
    let auth = Arc::new(StaticAuth::signed_in("user-1", "a.b.c"));
    let connector = Arc::new(LoopbackConnector::new(fallback));
    let deployment = Deployment::dev_proxy("http://localhost:5173").unwrap();
    let manager = ConnectionManager::new(
        ManagerConfig::default(),
        UriResolver::new(deployment, auth.clone()),
        connector.clone(),
    );

    Harness {
        manager,
        connector,
        auth,
    }
}

/// Let every ready task run; advances a paused clock by 1ms
pub(crate) async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}
