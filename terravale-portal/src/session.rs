//! Portal session: stored token, auth state and guarded navigation

use crate::{
    guard::{check_route, GuardDecision, ProtectedRoute, RouteRequirement, LOGIN_PATH},
    navigation::Navigator,
    notify::{Notification, Notifier},
    state::{AuthState, LoginPayload, PortalUser},
    storage::{KeyValueStore, ROLE_KEY, TOKEN_KEY},
    PortalResult,
};
use terravale_core::Role;
use tracing::{debug, info, warn};

/// Landing page for each role after login
pub fn home_path(role: Role) -> &'static str {
    match role {
        Role::Admin => "/admin",
        Role::Buyer => "/buyer",
        Role::Labour => "/labour",
    }
}

/// Client session over injected storage, navigation and notification
#[derive(Debug)]
pub struct PortalSession<S, V, N> {
    storage: S,
    navigator: V,
    notifier: N,
    routes: Vec<ProtectedRoute>,
    state: AuthState,
}

impl<S, V, N> PortalSession<S, V, N>
where
    S: KeyValueStore,
    V: Navigator,
    N: Notifier,
{
    pub fn new(storage: S, navigator: V, notifier: N) -> Self {
        Self {
            storage,
            navigator,
            notifier,
            routes: ProtectedRoute::portal_routes(),
            state: AuthState::initial(),
        }
    }

    pub fn with_routes(mut self, routes: Vec<ProtectedRoute>) -> Self {
        self.routes = routes;
        self
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn navigator(&self) -> &V {
        &self.navigator
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Rebuild the auth state from storage at start-up.
    ///
    /// A token with a recognised role restores a signed-in state. Anything else
    /// settles signed-out and drops whatever partial keys were left behind.
    pub fn restore(&mut self) -> PortalResult<&AuthState> {
        let token = self.storage.get(TOKEN_KEY)?.filter(|t| !t.is_empty());
        let role = self.storage.get(ROLE_KEY)?;

        self.state = match (token, role.as_deref().map(str::parse::<Role>)) {
            (Some(_), Some(Ok(role))) => {
                debug!("Restored {} session from storage", role);
                AuthState::signed_in(PortalUser::with_role(role))
            }
            (token, role) => {
                if token.is_some() || role.is_some() {
                    warn!("Discarding incomplete stored session");
                    self.storage.remove(TOKEN_KEY)?;
                    self.storage.remove(ROLE_KEY)?;
                }
                AuthState::signed_out()
            }
        };

        Ok(&self.state)
    }

    /// Record a successful login and go to the user's landing page
    pub fn login_succeeded(&mut self, payload: &LoginPayload) -> PortalResult<()> {
        self.storage.set(TOKEN_KEY, &payload.token)?;
        self.storage.set(ROLE_KEY, payload.role.as_str())?;

        let user = payload.portal_user();
        info!("Signed in as {}", user.role);
        self.state = AuthState::signed_in(user);
        self.navigator.navigate(home_path(payload.role));
        Ok(())
    }

    /// Sign out. Safe to call repeatedly; storage failures are logged, not returned.
    pub fn logout(&mut self) {
        for key in [TOKEN_KEY, ROLE_KEY] {
            if let Err(e) = self.storage.remove(key) {
                warn!("Failed to remove '{}' from storage: {}", key, e);
            }
        }

        self.state = AuthState::signed_out();
        self.notifier.notify(Notification::info("You have been signed out"));
        self.navigator.navigate(LOGIN_PATH);
        info!("Signed out");
    }

    /// Check `requirement` against the current user. A redirect is applied
    /// immediately and raises an unauthorized notification.
    pub fn guard(&mut self, requirement: RouteRequirement) -> GuardDecision {
        let decision = check_route(self.state.user.as_ref(), requirement);

        if let GuardDecision::Redirect { to, reason } = &decision {
            debug!("Guard blocked route requiring {}", requirement);
            self.notifier.notify(Notification::unauthorized(reason.clone()));
            self.navigator.navigate(to);
        }

        decision
    }

    /// Navigate to `path`, guarding it when it is protected
    pub fn visit(&mut self, path: &str) -> GuardDecision {
        if let Some(requirement) = ProtectedRoute::requirement_for(&self.routes, path) {
            let decision = self.guard(requirement);
            if !decision.is_render() {
                return decision;
            }
        }

        self.navigator.navigate(path);
        GuardDecision::Render
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HistoryNavigator, MemoryStorage, NotificationKind, RecordingNotifier};

    type TestSession = PortalSession<MemoryStorage, HistoryNavigator, RecordingNotifier>;

    fn session_with(storage: MemoryStorage) -> TestSession {
        PortalSession::new(storage, HistoryNavigator::new(), RecordingNotifier::new())
    }

    #[test]
    fn test_restore_signed_in() {
        let mut storage = MemoryStorage::new();
        storage.set(TOKEN_KEY, "abc").unwrap();
        storage.set(ROLE_KEY, "buyer").unwrap();

        let mut session = session_with(storage);
        let state = session.restore().unwrap();
        assert!(state.is_authenticated);
        assert!(!state.loading);
        assert_eq!(state.user.as_ref().map(|u| u.role), Some(Role::Buyer));
    }

    #[test]
    fn test_restore_discards_unknown_role() {
        let mut storage = MemoryStorage::new();
        storage.set(TOKEN_KEY, "abc").unwrap();
        storage.set(ROLE_KEY, "labours").unwrap();

        let mut session = session_with(storage);
        assert_eq!(session.restore().unwrap(), &AuthState::signed_out());
        assert!(session.storage().is_empty());
    }

    #[test]
    fn test_guard_redirect_notifies_once() {
        let mut session = session_with(MemoryStorage::new());
        session.restore().unwrap();

        let decision = session.guard(RouteRequirement::Role(Role::Admin));
        assert!(!decision.is_render());
        assert_eq!(session.navigator().current(), Some(LOGIN_PATH));
        assert_eq!(session.notifier().count(NotificationKind::Unauthorized), 1);
    }

    #[test]
    fn test_visit_public_page() {
        let mut session = session_with(MemoryStorage::new());
        session.restore().unwrap();

        assert!(session.visit("/about").is_render());
        assert_eq!(session.navigator().current(), Some("/about"));
        assert!(session.notifier().notifications.is_empty());
    }
}
