//! Route guard and session lifecycle

use terravale_core::Role;
use terravale_portal::{
    FileStorage, GuardDecision, HistoryNavigator, KeyValueStore, LoginPayload, MemoryStorage, Navigator,
    NotificationKind, PortalSession, RecordingNotifier, RouteRequirement, LOGIN_PATH, ROLE_KEY,
    TOKEN_KEY,
};

fn payload(role: &str) -> LoginPayload {
    serde_json::from_value(serde_json::json!({
        "token": "header.claims.signature",
        "role": role,
        "user": { "id": "u-1", "email": "a@x.com" }
    }))
    .unwrap()
}

fn session() -> PortalSession<MemoryStorage, HistoryNavigator, RecordingNotifier> {
    let mut session = PortalSession::new(
        MemoryStorage::new(),
        HistoryNavigator::new(),
        RecordingNotifier::new(),
    );
    session.restore().unwrap();
    session
}

#[test]
fn test_admin_route_without_user_redirects_to_login() {
    let mut session = session();

    let decision = session.guard(RouteRequirement::Role(Role::Admin));

    assert!(matches!(decision, GuardDecision::Redirect { ref to, .. } if to == LOGIN_PATH));
    assert_eq!(session.navigator().current(), Some(LOGIN_PATH));
    assert_eq!(session.notifier().count(NotificationKind::Unauthorized), 1);
}

#[test]
fn test_role_mismatch_never_renders() {
    let mut session = session();
    session.login_succeeded(&payload("buyer")).unwrap();
    assert_eq!(session.navigator().current(), Some("/buyer"));

    let decision = session.visit("/admin/reports");
    assert!(!decision.is_render());
    assert_eq!(session.navigator().current(), Some(LOGIN_PATH));
    assert!(!session
        .navigator()
        .history()
        .iter()
        .any(|path| path == "/admin/reports"));

    assert!(session.visit("/buyer/orders").is_render());
    assert_eq!(session.navigator().current(), Some("/buyer/orders"));
}

#[test]
fn test_logout_twice_leaves_no_token() {
    let mut session = session();
    session.login_succeeded(&payload("labour")).unwrap();
    assert_eq!(
        session.storage().get(TOKEN_KEY).unwrap().as_deref(),
        Some("header.claims.signature")
    );

    for _ in 0..2 {
        session.logout();

        assert!(session.storage().get(TOKEN_KEY).unwrap().is_none());
        assert!(session.storage().get(ROLE_KEY).unwrap().is_none());
        assert!(!session.state().is_authenticated);
        assert!(session.state().user.is_none());
        assert!(!session.state().loading);
        assert_eq!(session.navigator().current(), Some(LOGIN_PATH));
    }
    assert_eq!(session.notifier().count(NotificationKind::Info), 2);
    assert_eq!(session.notifier().count(NotificationKind::Unauthorized), 0);
}

#[test]
fn test_file_backed_session_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("portal.json");

    {
        let mut session = PortalSession::new(
            FileStorage::new(&path).unwrap(),
            HistoryNavigator::new(),
            RecordingNotifier::new(),
        );
        session.restore().unwrap();
        session.login_succeeded(&payload("admin")).unwrap();
    }

    let mut restarted = PortalSession::new(
        FileStorage::new(&path).unwrap(),
        HistoryNavigator::new(),
        RecordingNotifier::new(),
    );
    assert!(restarted.restore().unwrap().is_authenticated);
    assert!(restarted
        .guard(RouteRequirement::Role(Role::Admin))
        .is_render());
}
