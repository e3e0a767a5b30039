//! Ordered event dispatch
//!
//! Every notification the manager produces goes through one FIFO queue per
//! manager. Notifications are queued while the state lock is held, so the
//! queue order is the order of the state transitions that caused them. The
//! first caller to find the queue idle drains it; anyone who queues while a
//! drain is in progress (a callback calling back into the manager, or
//! another worker thread) leaves delivery to that drainer.

use super::registry::deliver;
use super::{Subscriber, SubscriptionRegistry};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tether_core::{ConnectionError, DisconnectReason, Envelope};

/// A subscriber notification
#[derive(Debug, Clone)]
pub(crate) enum Notice {
    Connect,
    Message(Envelope),
    Disconnect(DisconnectReason),
    Error(ConnectionError),
}

impl Notice {
    fn notify(&self, subscriber: &dyn Subscriber) {
        match self {
            Self::Connect => subscriber.on_connect(),
            Self::Message(message) => subscriber.on_message(message),
            Self::Disconnect(reason) => subscriber.on_disconnect(reason),
            Self::Error(error) => subscriber.on_error(error),
        }
    }
}

struct Queued {
    notice: Notice,
    /// Fixed recipients; `None` means whoever is subscribed at delivery
    recipients: Option<Vec<Arc<dyn Subscriber>>>,
}

#[derive(Default)]
struct Queue {
    pending: VecDeque<Queued>,
    draining: bool,
}

#[derive(Default)]
pub(crate) struct Dispatcher {
    queue: Mutex<Queue>,
}

impl Dispatcher {
    /// Queue a notice for every subscriber current at delivery time
    pub(crate) fn push(&self, notice: Notice) {
        self.queue.lock().pending.push_back(Queued {
            notice,
            recipients: None,
        });
    }

    /// Queue a notice for a fixed set of subscribers
    pub(crate) fn push_to(&self, notice: Notice, recipients: Vec<Arc<dyn Subscriber>>) {
        self.queue.lock().pending.push_back(Queued {
            notice,
            recipients: Some(recipients),
        });
    }

    /// Deliver queued notices in order
    ///
    /// Returns immediately if another caller is already draining. Must not
    /// be called with the manager's state lock held.
    pub(crate) fn drain(&self, registry: &SubscriptionRegistry) {
        {
            let mut queue = self.queue.lock();
            if queue.draining {
                return;
            }
            queue.draining = true;
        }

        loop {
            let next = {
                let mut queue = self.queue.lock();
                match queue.pending.pop_front() {
                    Some(next) => next,
                    None => {
                        queue.draining = false;
                        return;
                    }
                }
            };

            match next.recipients {
                Some(targets) => {
                    deliver(&targets, |s| next.notice.notify(s));
                }
                None => {
                    registry.broadcast(|s| next.notice.notify(s));
                }
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn is_idle(&self) -> bool {
        let queue = self.queue.lock();
        queue.pending.is_empty() && !queue.draining
    }
}
