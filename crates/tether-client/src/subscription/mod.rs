//! Subscribers and the subscription registry

mod dispatch;
mod registry;
mod subscriber;

pub use registry::{SubscriberId, Subscription, SubscriptionRegistry};
pub use subscriber::{Callbacks, Subscriber};

pub(crate) use dispatch::{Dispatcher, Notice};
