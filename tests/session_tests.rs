use whatsapp_service::{
    models::gateway::SessionStatus,
    session::{GatewayEvent, SessionAction, SessionState, apply_event, event_from_status},
};

fn status(state: &str, qr: Option<&str>, reason: Option<&str>) -> SessionStatus {
    SessionStatus {
        state: state.to_string(),
        qr: qr.map(str::to_string),
        reason: reason.map(str::to_string),
    }
}

/// Test: a QR event moves to qr-pending and surfaces the payload
#[test]
fn test_qr_event_displays_payload() {
    let transition = apply_event(
        SessionState::Disconnected,
        GatewayEvent::QrReady("qr-payload".to_string()),
    );

    assert_eq!(transition.next, SessionState::QrPending);
    assert_eq!(
        transition.actions,
        vec![SessionAction::DisplayQr("qr-payload".to_string())]
    );
}

/// Test: a ready event connects without side effects
#[test]
fn test_ready_event_connects() {
    let transition = apply_event(SessionState::QrPending, GatewayEvent::Ready);

    assert_eq!(transition.next, SessionState::Connected);
    assert!(transition.actions.is_empty());
}

/// Test: a disconnect alerts the operator and schedules a reconnect
#[test]
fn test_disconnect_alerts_and_backs_off() {
    let transition = apply_event(
        SessionState::Connected,
        GatewayEvent::Disconnected("connection lost".to_string()),
    );

    assert_eq!(transition.next, SessionState::Disconnected);
    assert_eq!(
        transition.actions,
        vec![
            SessionAction::Alert("WhatsApp disconnected: connection lost".to_string()),
            SessionAction::ReconnectAfterBackoff,
        ]
    );
}

/// Test: a repeated disconnect in the same state does not re-alert
#[test]
fn test_repeated_disconnect_does_not_realert() {
    let transition = apply_event(
        SessionState::Disconnected,
        GatewayEvent::Disconnected("still down".to_string()),
    );

    assert_eq!(transition.next, SessionState::Disconnected);
    assert_eq!(
        transition.actions,
        vec![SessionAction::ReconnectAfterBackoff]
    );
}

/// Test: an authentication failure logs out and alerts once
#[test]
fn test_auth_failure_logs_out() {
    let transition = apply_event(
        SessionState::Connected,
        GatewayEvent::AuthFailed("session expired".to_string()),
    );

    assert_eq!(transition.next, SessionState::LoggedOut);
    assert_eq!(
        transition.actions,
        vec![SessionAction::Alert(
            "WhatsApp authentication failed: session expired".to_string()
        )]
    );

    let repeat = apply_event(
        SessionState::LoggedOut,
        GatewayEvent::AuthFailed("session expired".to_string()),
    );

    assert!(repeat.actions.is_empty());
}

/// Test: polling the same state produces no event
#[test]
fn test_unchanged_status_produces_no_event() {
    let event = event_from_status(SessionState::Connected, &status("ready", None, None));

    assert_eq!(event, None);
}

/// Test: a state change maps to the matching lifecycle event
#[test]
fn test_status_change_maps_to_event() {
    let event = event_from_status(SessionState::Disconnected, &status("ready", None, None));
    assert_eq!(event, Some(GatewayEvent::Ready));

    let event = event_from_status(
        SessionState::Connected,
        &status("disconnected", None, Some("socket closed")),
    );
    assert_eq!(
        event,
        Some(GatewayEvent::Disconnected("socket closed".to_string()))
    );

    let event = event_from_status(
        SessionState::Disconnected,
        &status("qr", Some("qr-payload"), None),
    );
    assert_eq!(event, Some(GatewayEvent::QrReady("qr-payload".to_string())));
}

/// Test: an unknown bridge state is ignored
#[test]
fn test_unknown_status_is_ignored() {
    let event = event_from_status(SessionState::Connected, &status("warming_up", None, None));

    assert_eq!(event, None);
}
