//! Route guard.
//!
//! Maps the session state and the requested route to a decision. The
//! mapping is a pure function; the caller decides what rendering means.

use std::fmt;

use crate::models::ResourceKind;
use crate::session::SessionState;

/// Upper bound on redirect chains; the rule table needs at most two hops
const MAX_REDIRECTS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Root,
    Login,
    Dashboard,
    Page(ResourceKind),
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Root => "/",
            Route::Login => "/login",
            Route::Dashboard => "/dashboard",
            Route::Page(kind) => kind.path(),
        }
    }

    /// Whether reaching the route requires an authenticated session
    pub fn is_protected(&self) -> bool {
        matches!(self, Route::Dashboard | Route::Page(_))
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Render(Route),
    Redirect(Route),
}

/// Decide a single hop
pub fn guard(state: SessionState, route: Route) -> RouteDecision {
    let authenticated = state == SessionState::Authenticated;
    match route {
        Route::Root => RouteDecision::Redirect(Route::Login),
        Route::Login if authenticated => RouteDecision::Redirect(Route::Dashboard),
        Route::Login => RouteDecision::Render(Route::Login),
        protected if authenticated => RouteDecision::Render(protected),
        _ => RouteDecision::Redirect(Route::Login),
    }
}

/// Follow redirects until a route renders
pub fn resolve(state: SessionState, route: Route) -> Route {
    let mut current = route;
    for _ in 0..MAX_REDIRECTS {
        match guard(state, current) {
            RouteDecision::Render(target) => return target,
            RouteDecision::Redirect(next) => current = next,
        }
    }
    // The table never loops; fall back to the public entry point
    Route::Login
}
