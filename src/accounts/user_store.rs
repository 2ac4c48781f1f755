use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::error::AccountError;

/// A registered user. Lives only in process memory.
#[derive(Debug, Clone)]
struct User {
    id:         u64,
    email:      String,
    password:   String,
    name:       String,
    created_at: DateTime<Local>,
}

/// What callers get back about a user; never includes the password.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProfile {
    pub id:         u64,
    pub email:      String,
    pub name:       String,
    pub created_at: DateTime<Local>,
}

impl From<&User> for UserProfile {
    fn from(u: &User) -> Self {
        UserProfile {
            id:         u.id,
            email:      u.email.clone(),
            name:       u.name.clone(),
            created_at: u.created_at,
        }
    }
}

/// Toy in-memory registration and login.
///
/// Passwords are compared as given; nothing here is fit for real
/// authentication.
#[derive(Debug, Default)]
pub struct UserStore {
    users: Mutex<Vec<User>>,
}

impl UserStore {
    pub fn new() -> Self {
        UserStore::default()
    }

    /// Registers a new user. Ids are assigned sequentially from 1.
    pub fn register(&self, email: &str, password: &str, name: &str) -> Result<UserProfile, AccountError> {
        if email.trim().is_empty() {
            return Err(AccountError::MissingField("email"));
        }
        if password.is_empty() {
            return Err(AccountError::MissingField("password"));
        }

        let mut users = self.users.lock().unwrap_or_else(PoisonError::into_inner);
        if users.iter().any(|u| u.email == email) {
            return Err(AccountError::AlreadyExists);
        }

        let user = User {
            id:         users.len() as u64 + 1,
            email:      email.to_owned(),
            password:   password.to_owned(),
            name:       name.to_owned(),
            created_at: Local::now(),
        };
        let profile = UserProfile::from(&user);
        users.push(user);
        Ok(profile)
    }

    pub fn login(&self, email: &str, password: &str) -> Result<UserProfile, AccountError> {
        let users = self.users.lock().unwrap_or_else(PoisonError::into_inner);
        users
            .iter()
            .find(|u| u.email == email && u.password == password)
            .map(UserProfile::from)
            .ok_or(AccountError::InvalidCredentials)
    }

    /// Profiles of every registered user, in registration order.
    pub fn profiles(&self) -> Vec<UserProfile> {
        self.users
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(UserProfile::from)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.users.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_then_login() {
        let store = UserStore::new();
        let alice = store.register("alice@example.com", "pw1", "Alice").unwrap();
        let bob   = store.register("bob@example.com", "pw2", "Bob").unwrap();
        assert_eq!(alice.id, 1);
        assert_eq!(bob.id, 2);

        let logged_in = store.login("bob@example.com", "pw2").unwrap();
        assert_eq!(logged_in.id, 2);
        assert_eq!(logged_in.name, "Bob");
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let store = UserStore::new();
        store.register("a@b.c", "x", "A").unwrap();
        assert_eq!(store.register("a@b.c", "y", "Other"), Err(AccountError::AlreadyExists));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn wrong_password_or_unknown_user_fails() {
        let store = UserStore::new();
        store.register("a@b.c", "right", "A").unwrap();
        assert_eq!(store.login("a@b.c", "wrong"), Err(AccountError::InvalidCredentials));
        assert_eq!(store.login("nobody@b.c", "right"), Err(AccountError::InvalidCredentials));
    }

    #[test]
    fn empty_fields_are_rejected() {
        let store = UserStore::new();
        assert_eq!(store.register("  ", "pw", "A"), Err(AccountError::MissingField("email")));
        assert_eq!(store.register("a@b.c", "", "A"), Err(AccountError::MissingField("password")));
        assert!(store.is_empty());
    }

    #[test]
    fn profile_never_serializes_password() {
        let store = UserStore::new();
        let profile = store.register("a@b.c", "secret", "A").unwrap();
        let json = serde_json::to_string(&profile).unwrap();
        assert!(!json.contains("secret"));
        assert!(json.contains("\"id\":1"));
    }

    #[test]
    fn profiles_list_in_registration_order() {
        let store = UserStore::new();
        store.register("a@b.c", "x", "A").unwrap();
        store.register("d@e.f", "y", "D").unwrap();
        let names: Vec<_> = store.profiles().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["A", "D"]);
    }
}
