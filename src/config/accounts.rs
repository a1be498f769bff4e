use std::fmt;

use crate::error::{Error, Result};

/// A username/password pair. The password never appears in `Debug` output.
#[derive(Clone)]
pub struct Login {
    pub user: String,
    pub password: String,
}

impl Login {
    /// Builds a login, refusing an absent or blank password.
    pub fn new(user: impl Into<String>, password: Option<String>) -> Result<Self> {
        let user = user.into();
        match password {
            Some(password) if !password.is_empty() => Ok(Self { user, password }),
            _ => Err(Error::MissingSecret(format!("password for '{user}'"))),
        }
    }
}

impl fmt::Debug for Login {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Login")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// The three fixed service accounts created by the administrative bootstrap.
#[derive(Debug, Clone)]
pub struct ServiceAccounts {
    pub admin: Login,
    pub root: Login,
    pub guard: Login,
}
