//! User registry: username → credentials + home bank.
//!
//! Concurrent map with key-granular access; no cross-key atomicity is
//! needed. The registry is persisted to `users.json` so clients survive a
//! gateway restart without re-registering.

use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::json_store;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisteredUser {
    pub password: String,
    pub bank_address: String,
}

/// File row: the map key flattened next to the value.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedUser {
    username: String,
    password: String,
    bank_address: String,
}

pub struct UserRegistry {
    users: DashMap<String, RegisteredUser>,
    path: PathBuf,
    /// Serializes file rewrites; map access stays lock-free.
    io_lock: Mutex<()>,
}

impl UserRegistry {
    pub fn load(path: PathBuf) -> io::Result<Self> {
        let rows: Vec<PersistedUser> = json_store::load_json(&path)?;
        let users = DashMap::new();
        for row in rows {
            users.insert(
                row.username,
                RegisteredUser {
                    password: row.password,
                    bank_address: row.bank_address,
                },
            );
        }
        Ok(Self {
            users,
            path,
            io_lock: Mutex::new(()),
        })
    }

    /// Insert or overwrite a registration and persist.
    pub fn register(&self, username: &str, user: RegisteredUser) -> io::Result<()> {
        self.users.insert(username.to_string(), user);
        self.persist()
    }

    /// Remove a registration. Returns false when the user was not present.
    pub fn unregister(&self, username: &str) -> io::Result<bool> {
        let removed = self.users.remove(username).is_some();
        if removed {
            self.persist()?;
        }
        Ok(removed)
    }

    pub fn get(&self, username: &str) -> Option<RegisteredUser> {
        self.users.get(username).map(|r| r.value().clone())
    }

    pub fn contains(&self, username: &str) -> bool {
        self.users.contains_key(username)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    fn persist(&self) -> io::Result<()> {
        let _guard = self.io_lock.lock().unwrap();
        let mut rows: Vec<PersistedUser> = self
            .users
            .iter()
            .map(|entry| PersistedUser {
                username: entry.key().clone(),
                password: entry.value().password.clone(),
                bank_address: entry.value().bank_address.clone(),
            })
            .collect();
        rows.sort_by(|a, b| a.username.cmp(&b.username));
        json_store::store_json(&self.path, &rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(bank: &str) -> RegisteredUser {
        RegisteredUser {
            password: "pw".to_string(),
            bank_address: bank.to_string(),
        }
    }

    #[test]
    fn register_lookup_unregister() {
        let dir = tempfile::tempdir().unwrap();
        let registry = UserRegistry::load(dir.path().join("users.json")).unwrap();

        registry.register("alice", user("127.0.0.1:50052")).unwrap();
        assert!(registry.contains("alice"));
        assert_eq!(
            registry.get("alice").map(|u| u.bank_address),
            Some("127.0.0.1:50052".to_string())
        );

        assert!(registry.unregister("alice").unwrap());
        assert!(!registry.contains("alice"));
        assert!(!registry.unregister("alice").unwrap());
    }

    #[test]
    fn registrations_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");

        {
            let registry = UserRegistry::load(path.clone()).unwrap();
            registry.register("alice", user("bank-a:1")).unwrap();
            registry.register("bob", user("bank-b:1")).unwrap();
        }

        let reloaded = UserRegistry::load(path).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(
            reloaded.get("bob").map(|u| u.bank_address),
            Some("bank-b:1".to_string())
        );
    }

    #[test]
    fn reregistering_overwrites_binding() {
        let dir = tempfile::tempdir().unwrap();
        let registry = UserRegistry::load(dir.path().join("users.json")).unwrap();

        registry.register("alice", user("bank-a:1")).unwrap();
        registry.register("alice", user("bank-c:9")).unwrap();
        assert_eq!(
            registry.get("alice").map(|u| u.bank_address),
            Some("bank-c:9".to_string())
        );
        assert_eq!(registry.len(), 1);
    }
}
