use crate::Result as ServerResult;

use chat_broker::{Broker, DeliveryStatsSnapshot};

use std::future::Future;

use log::info;

/// Run the broker's event loop until `stop` resolves, then shut it down.
///
/// Returns the final delivery statistics once the loop has exited.
pub async fn run_until<F>(broker: &Broker, stop: F) -> ServerResult<DeliveryStatsSnapshot>
where
    F: Future<Output = ()>,
{
    let handle = broker.spawn();

    stop.await;
    broker.shutdown();

    handle.await??;

    let stats = broker.stats();
    info!(
        "Final delivery stats: submitted={}, delivered={}, dropped(full={}, closed={}, no_recipient={}), discarded={}",
        stats.submitted,
        stats.delivered,
        stats.dropped_full,
        stats.dropped_closed,
        stats.dropped_no_recipient,
        stats.discarded_on_shutdown
    );

    Ok(stats)
}
