use std::{sync::Arc, time::Duration};

use tokio::{sync::watch, time::sleep};
use tracing::{debug, info, warn};

use crate::{
    clients::{alerter::TelegramAlerter, gateway::HttpGateway},
    models::gateway::SessionStatus,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    QrPending,
    Connected,
    LoggedOut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayEvent {
    QrReady(String),
    Ready,
    AuthFailed(String),
    Disconnected(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    DisplayQr(String),
    Alert(String),
    ReconnectAfterBackoff,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next: SessionState,
    pub actions: Vec<SessionAction>,
}

/// Pure reaction to a gateway lifecycle event. Repeated faults in the same
/// state do not re-alert the operator.
pub fn apply_event(current: SessionState, event: GatewayEvent) -> Transition {
    match event {
        GatewayEvent::QrReady(qr) => Transition {
            next: SessionState::QrPending,
            actions: vec![SessionAction::DisplayQr(qr)],
        },
        GatewayEvent::Ready => Transition {
            next: SessionState::Connected,
            actions: vec![],
        },
        GatewayEvent::AuthFailed(reason) => {
            let actions = if current == SessionState::LoggedOut {
                vec![]
            } else {
                vec![SessionAction::Alert(format!(
                    "WhatsApp authentication failed: {}",
                    reason
                ))]
            };

            Transition {
                next: SessionState::LoggedOut,
                actions,
            }
        }
        GatewayEvent::Disconnected(reason) => {
            let actions = if current == SessionState::Disconnected {
                vec![SessionAction::ReconnectAfterBackoff]
            } else {
                vec![
                    SessionAction::Alert(format!("WhatsApp disconnected: {}", reason)),
                    SessionAction::ReconnectAfterBackoff,
                ]
            };

            Transition {
                next: SessionState::Disconnected,
                actions,
            }
        }
    }
}

fn state_for(status_state: &str) -> Option<SessionState> {
    match status_state {
        "qr" => Some(SessionState::QrPending),
        "ready" => Some(SessionState::Connected),
        "auth_failure" => Some(SessionState::LoggedOut),
        "disconnected" => Some(SessionState::Disconnected),
        _ => None,
    }
}

/// Diffs a polled session snapshot against the tracked state; only an
/// actual state change produces an event.
pub fn event_from_status(current: SessionState, status: &SessionStatus) -> Option<GatewayEvent> {
    let target = state_for(&status.state)?;

    if target == current {
        return None;
    }

    let reason = || {
        status
            .reason
            .clone()
            .unwrap_or_else(|| "unknown".to_string())
    };

    Some(match target {
        SessionState::QrPending => GatewayEvent::QrReady(status.qr.clone().unwrap_or_default()),
        SessionState::Connected => GatewayEvent::Ready,
        SessionState::LoggedOut => GatewayEvent::AuthFailed(reason()),
        SessionState::Disconnected => GatewayEvent::Disconnected(reason()),
    })
}

/// Polls the bridge's session status, feeds changes through `apply_event`,
/// and executes the resulting actions. The watch channel lets the worker
/// and scheduler gate dispatch on `Connected`.
pub async fn run_session_monitor(
    gateway: Arc<HttpGateway>,
    alerter: Arc<TelegramAlerter>,
    state_tx: watch::Sender<SessionState>,
    poll_interval: Duration,
    reconnect_backoff: Duration,
) {
    let mut current = SessionState::Disconnected;

    info!("Session monitor started");

    loop {
        let event = match gateway.session_status().await {
            Ok(status) => event_from_status(current, &status),
            Err(e) => {
                if current == SessionState::Connected {
                    Some(GatewayEvent::Disconnected(format!(
                        "session status poll failed: {}",
                        e
                    )))
                } else {
                    debug!(error = %e, "Gateway bridge unreachable");
                    None
                }
            }
        };

        if let Some(event) = event {
            let transition = apply_event(current, event);
            current = transition.next;
            state_tx.send_replace(current);

            info!(state = ?current, "Gateway session state changed");

            for action in transition.actions {
                match action {
                    SessionAction::DisplayQr(qr) => {
                        info!(qr = %qr, "Pairing QR received, scan to log in");
                    }
                    SessionAction::Alert(text) => {
                        alerter.notify(&text).await;
                    }
                    SessionAction::ReconnectAfterBackoff => {
                        warn!(
                            backoff_seconds = reconnect_backoff.as_secs(),
                            "Waiting before next reconnect attempt"
                        );
                        sleep(reconnect_backoff).await;
                    }
                }
            }
        }

        sleep(poll_interval).await;
    }
}
