//! Route gating for protected views.

use crate::state::SessionStatus;

/// Whether a route needs an authenticated session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Protected,
}

/// What a view should do before rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// Restoration is still running. Show a loading state and check again.
    Wait,
    RedirectTo(String),
}

/// Decide whether a route with the given access may render.
///
/// ```
/// use penna::{Access, Decision, SessionStatus, route};
///
/// let decision = route::check(SessionStatus::Unauthenticated, Access::Protected, "/login");
/// assert_eq!(decision, Decision::RedirectTo("/login".into()));
/// ```
pub fn check(status: SessionStatus, access: Access, login_route: &str) -> Decision {
    match (access, status) {
        (Access::Public, _) => Decision::Allow,
        (Access::Protected, SessionStatus::Authenticated) => Decision::Allow,
        (Access::Protected, SessionStatus::Restoring) => Decision::Wait,
        (Access::Protected, SessionStatus::Unauthenticated) => {
            Decision::RedirectTo(login_route.to_string())
        }
    }
}

/// A table of protected route patterns plus the login route.
///
/// Patterns are slash-separated; a `:name` segment matches any single
/// non-empty segment.
#[derive(Debug, Clone)]
pub struct RouteGate {
    login_route: String,
    protected: Vec<Vec<Segment>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param,
}

impl RouteGate {
    pub fn new(login_route: impl Into<String>) -> Self {
        Self {
            login_route: login_route.into(),
            protected: Vec::new(),
        }
    }

    /// The routes of the blog front end.
    pub fn blog() -> Self {
        Self::new("/login")
            .protect("/blogs/create")
            .protect("/blogs/:id/edit")
            .protect("/profile")
            .protect("/my-blogs")
    }

    /// Mark a route pattern as protected.
    pub fn protect(mut self, pattern: &str) -> Self {
        let segments = segments(pattern)
            .map(|s| match s.strip_prefix(':') {
                Some(_) => Segment::Param,
                None => Segment::Literal(s.to_string()),
            })
            .collect();
        self.protected.push(segments);
        self
    }

    pub fn login_route(&self) -> &str {
        &self.login_route
    }

    /// Access required by `path`. Query strings and fragments are ignored.
    pub fn access_for(&self, path: &str) -> Access {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let parts: Vec<&str> = segments(path).collect();

        let protected = self.protected.iter().any(|pattern| {
            pattern.len() == parts.len()
                && pattern.iter().zip(&parts).all(|(seg, part)| match seg {
                    Segment::Param => true,
                    Segment::Literal(lit) => lit == part,
                })
        });

        if protected {
            Access::Protected
        } else {
            Access::Public
        }
    }

    /// Decide whether `path` may render in the given session status.
    pub fn check(&self, path: &str, status: SessionStatus) -> Decision {
        check(status, self.access_for(path), &self.login_route)
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}
