//! News fan-out to every registered user.

use futures::stream::{self, StreamExt};
use teloxide::types::ChatId;
use tracing::{debug, error, info};

use crate::transport::Transport;

/// Outcome of one broadcast
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub recipients: usize,
    pub delivered: usize,
    /// Users the message could not be delivered to
    pub failed: Vec<i64>,
}

/// Send `text` to every recipient with at most `concurrency` sends in flight.
/// A failed delivery is logged and never stops the others.
pub async fn broadcast(
    transport: &dyn Transport,
    recipients: Vec<i64>,
    text: &str,
    concurrency: usize,
) -> BroadcastReport {
    let total = recipients.len();
    let results: Vec<(i64, bool)> = stream::iter(recipients)
        .map(|user_id| async move {
            match transport.send_message(ChatId(user_id), text, None).await {
                Ok(()) => {
                    debug!(user_id, "News delivered");
                    (user_id, true)
                }
                Err(e) => {
                    error!(user_id, error = %e, "Failed to deliver news to user");
                    (user_id, false)
                }
            }
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let mut failed: Vec<i64> = results
        .into_iter()
        .filter(|(_, ok)| !ok)
        .map(|(user_id, _)| user_id)
        .collect();
    failed.sort_unstable();

    let report = BroadcastReport {
        recipients: total,
        delivered: total - failed.len(),
        failed,
    };
    info!(
        recipients = report.recipients,
        delivered = report.delivered,
        failed = report.failed.len(),
        "Broadcast finished"
    );
    report
}
