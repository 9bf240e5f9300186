//! Route guard decisions
//!
//! [`check_route`] is a pure function of the current user and the route's
//! requirement. Side effects (navigation, notifications) are applied by
//! [`crate::PortalSession::guard`].

use crate::state::PortalUser;
use std::fmt;
use terravale_core::Role;

/// Where unauthorized navigations are sent
pub const LOGIN_PATH: &str = "/login";

/// What a protected route demands of the current user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteRequirement {
    /// Any signed-in user
    Authenticated,
    /// A signed-in user holding exactly this role
    Role(Role),
}

impl RouteRequirement {
    pub fn is_satisfied_by(&self, user: &PortalUser) -> bool {
        match self {
            RouteRequirement::Authenticated => true,
            RouteRequirement::Role(role) => user.role == *role,
        }
    }
}

impl fmt::Display for RouteRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteRequirement::Authenticated => write!(f, "authenticated"),
            RouteRequirement::Role(role) => write!(f, "role {}", role),
        }
    }
}

/// Outcome of a guard check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Render,
    Redirect { to: String, reason: String },
}

impl GuardDecision {
    pub fn is_render(&self) -> bool {
        matches!(self, GuardDecision::Render)
    }
}

/// Decide whether a route may render for `user`
pub fn check_route(user: Option<&PortalUser>, requirement: RouteRequirement) -> GuardDecision {
    match user {
        None => GuardDecision::Redirect {
            to: LOGIN_PATH.to_string(),
            reason: "Please sign in to continue".to_string(),
        },
        Some(user) if !requirement.is_satisfied_by(user) => GuardDecision::Redirect {
            to: LOGIN_PATH.to_string(),
            reason: format!(
                "Your {} account cannot open this page ({} required)",
                user.role, requirement
            ),
        },
        Some(_) => GuardDecision::Render,
    }
}

/// A path prefix together with its requirement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedRoute {
    pub prefix: &'static str,
    pub requirement: RouteRequirement,
}

impl ProtectedRoute {
    /// Route table of the Terravale portals
    pub fn portal_routes() -> Vec<ProtectedRoute> {
        vec![
            ProtectedRoute {
                prefix: "/admin",
                requirement: RouteRequirement::Role(Role::Admin),
            },
            ProtectedRoute {
                prefix: "/buyer",
                requirement: RouteRequirement::Role(Role::Buyer),
            },
            ProtectedRoute {
                prefix: "/labour",
                requirement: RouteRequirement::Role(Role::Labour),
            },
            ProtectedRoute {
                prefix: "/profile",
                requirement: RouteRequirement::Authenticated,
            },
        ]
    }

    /// Requirement for `path`, or `None` for public pages
    pub fn requirement_for(routes: &[ProtectedRoute], path: &str) -> Option<RouteRequirement> {
        routes
            .iter()
            .find(|route| {
                path == route.prefix
                    || path
                        .strip_prefix(route.prefix)
                        .is_some_and(|rest| rest.starts_with('/'))
            })
            .map(|route| route.requirement)
    }
}
