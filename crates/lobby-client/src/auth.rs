//! Route-guard decisions from locally cached claims
//!
//! The token and role claims are passed in explicitly; nothing here reads
//! ambient storage. Enforcement stays server-side, these decisions only pick
//! which screen to show.

use serde::{Deserialize, Serialize};

/// Role required for the admin console
pub const ADMIN_ROLE: &str = "admin";

/// Locally cached identity claims
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthContext {
    pub token: String,
    pub roles: Vec<String>,
}

impl AuthContext {
    pub fn new(token: impl Into<String>, roles: Vec<String>) -> Self {
        Self {
            token: token.into(),
            roles,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|r| r == ADMIN_ROLE)
    }
}

/// The client's top-level screens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Sign-in screen
    Login,
    /// Chat page (the non-admin landing spot)
    Chat,
    /// Admin console
    Admin,
    /// Restricted-access notice
    Restricted,
}

/// Where a session with these claims lands.
///
/// No token goes to login; a token without the admin role goes to chat.
pub fn landing_route(ctx: Option<&AuthContext>) -> Route {
    match ctx {
        None => Route::Login,
        Some(ctx) if ctx.token.is_empty() => Route::Login,
        Some(ctx) if ctx.is_admin() => Route::Admin,
        Some(_) => Route::Chat,
    }
}

/// Route override for an API failure: 401 bounces to login, 403 to the
/// restricted-access screen, anything else stays put.
pub fn route_for_error(error: &lobby_api::Error) -> Option<Route> {
    if error.is_unauthorized() {
        Some(Route::Login)
    } else if error.is_forbidden() {
        Some(Route::Restricted)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_token_lands_on_login() {
        assert_eq!(landing_route(None), Route::Login);
        let ctx = AuthContext::new("", vec!["admin".to_string()]);
        assert_eq!(landing_route(Some(&ctx)), Route::Login);
    }

    #[test]
    fn test_admin_lands_on_console() {
        let ctx = AuthContext::new("t", vec!["admin".to_string(), "user".to_string()]);
        assert_eq!(landing_route(Some(&ctx)), Route::Admin);
    }

    #[test]
    fn test_non_admin_lands_on_chat() {
        let ctx = AuthContext::new("t", vec!["user".to_string()]);
        assert_eq!(landing_route(Some(&ctx)), Route::Chat);
    }

    #[test]
    fn test_unauthorized_routes_to_login() {
        let e = lobby_api::Error::from_status(401, "");
        assert_eq!(route_for_error(&e), Some(Route::Login));
    }

    #[test]
    fn test_forbidden_routes_to_restricted() {
        let e = lobby_api::Error::from_status(403, "");
        assert_eq!(route_for_error(&e), Some(Route::Restricted));
    }

    #[test]
    fn test_other_errors_do_not_redirect() {
        let e = lobby_api::Error::from_status(500, "boom");
        assert_eq!(route_for_error(&e), None);
        let e = lobby_api::Error::from_status(409, r#"{"detail":"taken"}"#);
        assert_eq!(route_for_error(&e), None);
    }
}
