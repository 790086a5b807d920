//! Credential checking.
//!
//! Accounts live in three role tables (moderators, organizers, participants)
//! owned by an external store. The gate only needs a role back, so the store
//! is reached through `CredentialCheck`.

use gatekeeper_common::{GatekeeperError, Role};
use serde::{Deserialize, Serialize};

/// An authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    pub email: String,
    pub role: Role,
    pub display_name: String,
}

/// Something that can classify a credential pair into a role.
///
/// `Ok(None)` means no table matched. `Err` is reserved for the store itself failing.
pub trait CredentialCheck: Send + Sync {
    fn authenticate(&self, email: &str, password: &str) -> Result<Option<Account>, GatekeeperError>;
}

/// Account record as written in the configuration file
#[derive(Debug, Clone, Deserialize)]
pub struct AccountEntry {
    pub email: String,
    pub password: String,
    pub role: Role,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// In-memory account directory loaded from configuration
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    entries: Vec<AccountEntry>,
}

impl StaticDirectory {
    pub fn new(entries: Vec<AccountEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CredentialCheck for StaticDirectory {
    fn authenticate(&self, email: &str, password: &str) -> Result<Option<Account>, GatekeeperError> {
        // Same precedence as querying the role tables one after another
        let hit = Role::LOOKUP_ORDER.iter().find_map(|role| {
            self.entries
                .iter()
                .find(|e| e.role == *role && e.email == email && e.password == password)
        });

        Ok(hit.map(|entry| Account {
            email: entry.email.clone(),
            role: entry.role,
            display_name: entry
                .display_name
                .clone()
                .unwrap_or_else(|| "Unknown".to_string()),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(email: &str, password: &str, role: Role) -> AccountEntry {
        AccountEntry {
            email: email.to_string(),
            password: password.to_string(),
            role,
            display_name: Some(format!("{} {}", role, email)),
        }
    }

    #[test]
    fn test_lookup_by_role() {
        let dir = StaticDirectory::new(vec![
            entry("org@example.com", "pw1", Role::Organizer),
            entry("user@example.com", "pw2", Role::Participant),
        ]);

        let account = dir.authenticate("org@example.com", "pw1").unwrap().unwrap();
        assert_eq!(account.role, Role::Organizer);

        let account = dir.authenticate("user@example.com", "pw2").unwrap().unwrap();
        assert_eq!(account.role, Role::Participant);
    }

    #[test]
    fn test_moderator_table_wins() {
        let dir = StaticDirectory::new(vec![
            entry("both@example.com", "pw", Role::Participant),
            entry("both@example.com", "pw", Role::Organizer),
            entry("both@example.com", "pw", Role::Moderator),
        ]);
        let account = dir.authenticate("both@example.com", "pw").unwrap().unwrap();
        assert_eq!(account.role, Role::Moderator);
    }

    #[test]
    fn test_wrong_password_or_unknown_email() {
        let dir = StaticDirectory::new(vec![entry("a@example.com", "right", Role::Participant)]);
        assert!(dir.authenticate("a@example.com", "wrong").unwrap().is_none());
        assert!(dir.authenticate("b@example.com", "right").unwrap().is_none());
    }

    #[test]
    fn test_empty_directory_rejects_everyone() {
        let dir = StaticDirectory::default();
        assert!(dir.is_empty());
        assert!(dir.authenticate("a@example.com", "right").unwrap().is_none());

        let dir = StaticDirectory::new(vec![entry("a@example.com", "right", Role::Participant)]);
        assert_eq!(dir.len(), 1);
        assert!(!dir.is_empty());
    }

    #[test]
    fn test_missing_display_name() {
        let dir = StaticDirectory::new(vec![AccountEntry {
            email: "x@example.com".into(),
            password: "pw".into(),
            role: Role::Participant,
            display_name: None,
        }]);
        let account = dir.authenticate("x@example.com", "pw").unwrap().unwrap();
        assert_eq!(account.display_name, "Unknown");
    }
}
