use std::{sync::Arc, time::Duration};

use anyhow::{Error, Result, anyhow};
use chrono::{DateTime, Days, FixedOffset, NaiveDate, Utc};
use tokio::{sync::watch, time::sleep};
use tracing::{info, warn};

use crate::{
    clients::{
        gateway::Gateway,
        store::{MembershipStore, QueueStore},
    },
    models::{
        member::{CreateReminderLog, ReminderType},
        queue::{MessagePayload, NewQueueItem},
        status::ReminderStatus,
    },
    session::SessionState,
    templates,
    worker::{DeliveryOptions, DeliveryOutcome, process_item},
};

/// Classifies a member's expiry against today. Both sides are calendar
/// dates, so the difference is whole days with no partial-day drift.
pub fn reminder_due(expiry: NaiveDate, today: NaiveDate) -> Option<ReminderType> {
    match (expiry - today).num_days() {
        7 => Some(ReminderType::Expiring7Days),
        0 => Some(ReminderType::ExpiringToday),
        -1 => Some(ReminderType::Expired1Day),
        _ => None,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub libraries: u32,
    pub members: u32,
    pub sent: u32,
    pub failed: u32,
    pub skipped: u32,
}

/// One full membership scan: at most one reminder per (member, threshold)
/// pair. Any existing log entry for the pair suppresses the send, whatever
/// its status. A failure to read one library or member is logged and that
/// unit skipped; the sweep never aborts.
pub async fn run_sweep<G, Q, M>(
    gateway: &G,
    queue: &Q,
    membership: &M,
    opts: &DeliveryOptions,
    today: NaiveDate,
) -> SweepSummary
where
    G: Gateway + ?Sized,
    Q: QueueStore + ?Sized,
    M: MembershipStore + ?Sized,
{
    let mut summary = SweepSummary::default();

    let libraries = match membership.list_libraries().await {
        Ok(libraries) => libraries,
        Err(e) => {
            warn!(error = %e, "Failed to enumerate libraries, aborting sweep");
            return summary;
        }
    };

    for library in libraries {
        summary.libraries += 1;

        let members = match membership.list_members(&library.id).await {
            Ok(members) => members,
            Err(e) => {
                warn!(library = %library.name, error = %e, "Failed to read library members, skipping");
                continue;
            }
        };

        for member in members {
            summary.members += 1;

            if !member.is_active() {
                continue;
            }

            let Some(expiry) = member.expiry_at else {
                continue;
            };

            let Some(kind) = reminder_due(expiry, today) else {
                continue;
            };

            match membership.has_reminder_log(&member.id, kind).await {
                Ok(true) => {
                    summary.skipped += 1;
                    continue;
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(member = %member.name, error = %e, "Failed to read reminder log, skipping member");
                    continue;
                }
            }

            info!(member = %member.name, kind = %kind, "Queuing reminder");

            let text = templates::reminder_message(kind, &member.name, member.amount, expiry);

            let new_item = NewQueueItem {
                to: member.contact.clone(),
                member_name: member.name.clone(),
                payload: MessagePayload::Text {
                    message: text.clone(),
                },
            };

            let item = match queue.enqueue_claimed(new_item).await {
                Ok(item) => item,
                Err(e) => {
                    warn!(member = %member.name, error = %e, "Failed to enqueue reminder, skipping member");
                    continue;
                }
            };

            let outcome = process_item(gateway, queue, &item, opts).await;

            let log = match &outcome {
                DeliveryOutcome::Sent => {
                    summary.sent += 1;
                    CreateReminderLog::new(kind, ReminderStatus::Sent, text)
                }
                DeliveryOutcome::Failed(reason) => {
                    summary.failed += 1;
                    CreateReminderLog::new(kind, ReminderStatus::Failed, text)
                        .with_reason(reason.clone())
                }
            };

            if let Err(e) = membership.append_reminder_log(&member.id, log).await {
                warn!(member = %member.name, error = %e, "Failed to append reminder log entry");
            }
        }
    }

    summary
}

/// Next occurrence of `HH:MM` in the given fixed-offset local time, strictly
/// after `now`.
pub fn next_run_after(
    now: DateTime<FixedOffset>,
    hour: u32,
    minute: u32,
) -> Result<DateTime<FixedOffset>, Error> {
    let today_run = now
        .date_naive()
        .and_hms_opt(hour, minute, 0)
        .ok_or_else(|| anyhow!("Invalid reminder time {:02}:{:02}", hour, minute))?
        .and_local_timezone(*now.offset())
        .single()
        .ok_or_else(|| anyhow!("Unrepresentable reminder time {:02}:{:02}", hour, minute))?;

    if today_run > now {
        Ok(today_run)
    } else {
        Ok(today_run + Days::new(1))
    }
}

pub async fn run_scheduler<G, Q, M>(
    gateway: Arc<G>,
    queue: Arc<Q>,
    membership: Arc<M>,
    opts: DeliveryOptions,
    timezone: FixedOffset,
    hour: u32,
    minute: u32,
    session: watch::Receiver<SessionState>,
) where
    G: Gateway + 'static,
    Q: QueueStore + 'static,
    M: MembershipStore + 'static,
{
    info!(hour, minute, offset = %timezone, "Reminder scheduler started");

    loop {
        let now = Utc::now().with_timezone(&timezone);

        let target = match next_run_after(now, hour, minute) {
            Ok(target) => target,
            Err(e) => {
                warn!(error = %e, "Cannot compute next reminder run, retrying in an hour");
                sleep(Duration::from_secs(3600)).await;
                continue;
            }
        };

        info!(next_run = %target, "Sleeping until next reminder run");

        let wait = (target - now).to_std().unwrap_or(Duration::ZERO);
        sleep(wait).await;

        if *session.borrow() != SessionState::Connected {
            warn!("Gateway session not connected at reminder time, skipping today's sweep");
            continue;
        }

        let today = target.date_naive();

        info!(date = %today, "Running daily membership reminder check");

        let summary = run_sweep(
            gateway.as_ref(),
            queue.as_ref(),
            membership.as_ref(),
            &opts,
            today,
        )
        .await;

        info!(
            libraries = summary.libraries,
            members = summary.members,
            sent = summary.sent,
            failed = summary.failed,
            skipped = summary.skipped,
            "Daily reminder check finished"
        );
    }
}
