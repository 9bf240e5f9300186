//! Terravale Portal
//!
//! Client-side half of the session boundary. Keeps the session token and role
//! in an injected key-value store, tracks the in-memory [`AuthState`] and
//! decides whether a protected route may render.
//!
//! The state here is only used for UI gating. The server re-checks the session
//! cookie and role on every request.

pub mod error;
pub mod guard;
pub mod navigation;
pub mod notify;
pub mod session;
pub mod state;
pub mod storage;

pub use error::{PortalError, PortalResult};
pub use guard::{check_route, GuardDecision, ProtectedRoute, RouteRequirement, LOGIN_PATH};
pub use navigation::{HistoryNavigator, Navigator};
pub use notify::{Notification, NotificationKind, Notifier, RecordingNotifier};
pub use session::PortalSession;
pub use state::{AuthState, LoginPayload, PortalUser};
pub use storage::{FileStorage, KeyValueStore, MemoryStorage, ROLE_KEY, TOKEN_KEY};
