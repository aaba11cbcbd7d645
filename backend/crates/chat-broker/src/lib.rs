pub mod broker;
pub mod broker_state;
pub mod delivery_stats;
pub mod drop_reason;
pub mod error;
pub mod message;
pub mod metrics;
pub mod metrics_timer;
pub mod shutdown_coordinator;
pub mod shutdown_guard;
pub mod subscriber_registry;

pub use broker::Broker;
pub use broker_state::BrokerState;
pub use delivery_stats::{DeliveryStats, DeliveryStatsSnapshot};
pub use drop_reason::DropReason;
pub use error::{BrokerError, Result};
pub use message::{DeliveryMode, Message, UNSET_TIMESTAMP};
pub use metrics::Metrics;
pub use metrics_timer::MetricsTimer;
pub use shutdown_coordinator::ShutdownCoordinator;
pub use shutdown_guard::ShutdownGuard;
pub use subscriber_registry::SubscriberRegistry;


use tracing::info_span;

/// Create a tracing span for the dispatcher.
/// All log entries emitted by the event loop carry these fields.
pub fn create_event_loop_span(
    inbound_capacity: usize,
    delivery_capacity: usize,
) -> tracing::Span {
    info_span!(
        "broker_event_loop",
        inbound_capacity = inbound_capacity,
        delivery_capacity = delivery_capacity,
    )
}
