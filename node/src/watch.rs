//! Outbox polling for an external transport.

use std::future::Future;
use std::time::Duration;

use council_messages::Envelope;

use crate::node::GovernanceNode;
use crate::NodeError;

/// Poll the outbox every `interval`, handing each new signed envelope to
/// `on_message`, until `shutdown` resolves. Returns the last sequence seen.
pub async fn watch_outbox<F, S>(
    node: &GovernanceNode,
    interval: Duration,
    mut after: u64,
    shutdown: S,
    mut on_message: F,
) -> Result<u64, NodeError>
where
    F: FnMut(&Envelope),
    S: Future<Output = ()>,
{
    let mut ticker = tokio::time::interval(interval);
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let envelopes = node.signed_outbox(after)?;
                if !envelopes.is_empty() {
                    tracing::debug!(count = envelopes.len(), after, "new outbound messages");
                }
                for envelope in &envelopes {
                    on_message(envelope);
                    after = envelope.sequence;
                }
            }
            _ = &mut shutdown => {
                tracing::info!(last_sequence = after, "outbox watch stopped");
                return Ok(after);
            }
        }
    }
}
