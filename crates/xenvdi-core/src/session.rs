//! Scoped management API sessions.

use std::fmt;

use tracing::{info, warn};

use crate::error::Result;
use crate::xenapi::{Transport, XenApi};

/// Host and login details for the management API.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub host: String,
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// An authenticated session that logs out when dropped.
///
/// Logout is best-effort: a failure is logged and never replaces the error
/// that caused the session to go out of scope.
#[derive(Debug)]
pub struct Session<'a, T: Transport> {
    api: &'a XenApi<T>,
    id: String,
}

impl<'a, T: Transport> Session<'a, T> {
    /// Log in with a username and password.
    pub fn login(api: &'a XenApi<T>, username: &str, password: &str) -> Result<Self> {
        let id = api.login_with_password(username, password)?;
        info!(session = %id, "created xapi session");
        Ok(Self { api, id })
    }

    /// The opaque session token.
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl<T: Transport> Drop for Session<'_, T> {
    fn drop(&mut self) {
        if let Err(e) = self.api.logout(&self.id) {
            warn!(session = %self.id, error = %e, "failed to log out of xapi session");
        }
    }
}
