use std::{sync::Arc, time::Duration};

use tokio::{
    sync::watch,
    time::{MissedTickBehavior, interval, sleep},
};
use tracing::{info, warn};

use crate::{
    clients::{gateway::Gateway, store::QueueStore},
    models::{
        phone::normalize_address,
        queue::{DeliveryError, MessagePayload, QueueItem},
    },
    session::SessionState,
    templates,
};

#[derive(Debug, Clone)]
pub struct DeliveryOptions {
    pub country_code: String,
    pub address_domain: String,
    /// Fixed pause before every send, to avoid tripping anti-automation
    /// defenses on the messaging network.
    pub send_delay: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Sent,
    Failed(String),
}

/// Turns one claimed queue item into exactly one terminal state, with
/// exactly one (or zero) message actually sent. Validate, normalize, check
/// reachability, throttle, render, send, write back; each step's failure
/// short-circuits the rest.
pub async fn process_item<G, Q>(
    gateway: &G,
    queue: &Q,
    item: &QueueItem,
    opts: &DeliveryOptions,
) -> DeliveryOutcome
where
    G: Gateway + ?Sized,
    Q: QueueStore + ?Sized,
{
    info!(item_id = %item.id, member = %item.member_name, "Processing queue item");

    let payload = match item.validate() {
        Ok(payload) => payload,
        Err(e) => return fail(queue, item, e.to_string()).await,
    };

    let address = match normalize_address(&item.to, &opts.country_code, &opts.address_domain) {
        Ok(address) => address,
        Err(e) => return fail(queue, item, e.to_string()).await,
    };

    match gateway.is_reachable(&address).await {
        Ok(true) => {}
        Ok(false) => {
            info!(item_id = %item.id, address = %address, "Recipient not registered on the network");
            return fail(queue, item, DeliveryError::NotRegistered.to_string()).await;
        }
        Err(e) => {
            let error = DeliveryError::Gateway(e.to_string());
            return fail(queue, item, error.to_string()).await;
        }
    }

    sleep(opts.send_delay).await;

    let text = match &payload {
        MessagePayload::Welcome(details) => templates::welcome_message(details),
        MessagePayload::PaymentConfirmation(details) => {
            templates::payment_confirmation_message(&item.member_name, details)
        }
        MessagePayload::Text { message } => message.clone(),
    };

    match gateway.send(&address, &text).await {
        Ok(()) => {
            if let Err(e) = queue.mark_sent(&item.id).await {
                warn!(item_id = %item.id, error = %e, "Failed to write back sent status");
            }

            info!(item_id = %item.id, address = %address, "Message sent");
            DeliveryOutcome::Sent
        }
        Err(e) => {
            let error = DeliveryError::Gateway(e.to_string());
            fail(queue, item, error.to_string()).await
        }
    }
}

async fn fail<Q>(queue: &Q, item: &QueueItem, error: String) -> DeliveryOutcome
where
    Q: QueueStore + ?Sized,
{
    warn!(item_id = %item.id, member = %item.member_name, error = %error, "Queue item failed");

    if let Err(e) = queue.mark_failed(&item.id, &error).await {
        warn!(item_id = %item.id, error = %e, "Failed to write back failed status");
    }

    DeliveryOutcome::Failed(error)
}

/// Poll-driven consumer: snapshots `pending` items, claims each through the
/// store's compare-and-swap, and dispatches every claimed item on its own
/// task. Dispatch is gated on the gateway session being connected so items
/// stay pending while the network is down.
pub async fn run_worker<G, Q>(
    gateway: Arc<G>,
    queue: Arc<Q>,
    opts: DeliveryOptions,
    poll_interval: Duration,
    session: watch::Receiver<SessionState>,
) where
    G: Gateway + 'static,
    Q: QueueStore + 'static,
{
    let mut ticker = interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!("Delivery worker started");

    loop {
        ticker.tick().await;

        if *session.borrow() != SessionState::Connected {
            continue;
        }

        let pending = match queue.pending_items().await {
            Ok(items) => items,
            Err(e) => {
                warn!(error = %e, "Failed to read pending queue snapshot");
                continue;
            }
        };

        for item in pending {
            match queue.claim(&item.id).await {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    warn!(item_id = %item.id, error = %e, "Failed to claim queue item");
                    continue;
                }
            }

            let gateway = Arc::clone(&gateway);
            let queue = Arc::clone(&queue);
            let opts = opts.clone();

            tokio::spawn(async move {
                process_item(gateway.as_ref(), queue.as_ref(), &item, &opts).await;
            });
        }
    }
}
