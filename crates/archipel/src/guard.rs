//! Route guard: gate protected routes on a stored token.

use std::sync::Arc;

use archipel_session::TokenStore;

use crate::Navigator;

/// What the guard decided for one route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    /// Go to the login page. `to` already carries the `returnUrl` query.
    Redirect { to: String },
}

impl GuardDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Allows a route when a token is stored in the active scope, otherwise
/// redirects to `login_route?returnUrl=<requested url>`.
///
/// The guard trusts the token's presence only. An expired token passes
/// here and is caught by the first 401.
pub struct AuthGuard {
    tokens: Arc<TokenStore>,
    navigator: Arc<dyn Navigator>,
    login_route: String,
}

impl AuthGuard {
    pub fn new(
        tokens: Arc<TokenStore>,
        navigator: Arc<dyn Navigator>,
        login_route: impl Into<String>,
    ) -> Self {
        Self {
            tokens,
            navigator,
            login_route: login_route.into(),
        }
    }

    /// Decides for `url` and, on a redirect, also asks the navigator to go
    /// there.
    pub fn can_activate(&self, url: &str) -> GuardDecision {
        if self.tokens.is_present() {
            return GuardDecision::Allow;
        }

        let to = format!(
            "{}?returnUrl={}",
            self.login_route,
            urlencoding::encode(url)
        );
        tracing::debug!(url, redirect = %to, "route blocked, no session");
        self.navigator.navigate(&to);
        GuardDecision::Redirect { to }
    }
}
