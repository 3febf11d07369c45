//! Durable account storage for a bank server.
//!
//! Accounts live in memory and are authoritative for balances; every
//! successful commit rewrites the whole JSON file through the atomic
//! temp-and-rename path.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::json_store;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    pub username: String,
    pub password: String,
    pub balance: Decimal,
}

#[derive(Debug)]
pub struct AccountStore {
    accounts: HashMap<String, Account>,
    path: PathBuf,
}

impl AccountStore {
    /// Load accounts from the JSON file. The file must exist: a bank without
    /// an account book is a deployment error, not a first run.
    pub fn load(path: PathBuf) -> io::Result<Self> {
        if !path.exists() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("accounts file not found: {}", path.display()),
            ));
        }
        let list: Vec<Account> = json_store::load_json(&path)?;
        let accounts = list
            .into_iter()
            .map(|a| (a.username.clone(), a))
            .collect();
        Ok(Self { accounts, path })
    }

    /// Rewrite the accounts file. Output is sorted by username so the file
    /// diffs cleanly between commits.
    pub fn persist(&self) -> io::Result<()> {
        let mut list: Vec<&Account> = self.accounts.values().collect();
        list.sort_by(|a, b| a.username.cmp(&b.username));
        json_store::store_json(&self.path, &list)
    }

    pub fn balance(&self, username: &str) -> Option<Decimal> {
        self.accounts.get(username).map(|a| a.balance)
    }

    pub fn contains(&self, username: &str) -> bool {
        self.accounts.contains_key(username)
    }

    pub fn set_balance(&mut self, username: &str, balance: Decimal) {
        if let Some(account) = self.accounts.get_mut(username) {
            account.balance = balance;
        }
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    #[cfg(test)]
    pub fn insert(&mut self, account: Account) {
        self.accounts.insert(account.username.clone(), account);
    }
}
