/// Moderation and Audit System
///
/// Administrative edits and deletes over the catalog, the flag lifecycle,
/// and the audit log that records every effective change.

pub mod audit;
pub mod flags;
pub mod moderation;
pub mod search;
pub mod versions;

pub use audit::{AuditLogEntry, AuditLogManager};
pub use flags::{FlagManager, ProjectFlag};
pub use moderation::ModerationManager;
pub use search::{BrowseParams, BrowseResult};

use crate::error::{RelmonError, RelmonResult};
use serde::{Deserialize, Serialize};

/// The identity performing an action, passed explicitly to every operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub username: String,
    pub email: Option<String>,
    pub is_admin: bool,
}

impl Actor {
    pub fn new(username: &str, email: Option<&str>, is_admin: bool) -> Self {
        Self {
            username: username.to_string(),
            email: email.map(String::from),
            is_admin,
        }
    }

    /// Every string this actor may appear under in the audit log
    pub fn identities(&self) -> Vec<String> {
        let mut ids = vec![self.username.clone()];
        if let Some(email) = &self.email {
            if email != &self.username {
                ids.push(email.clone());
            }
        }
        ids
    }
}

/// Administrator gate shared by all moderation operations
pub fn require_admin(actor: &Actor) -> RelmonResult<()> {
    if actor.is_admin {
        Ok(())
    } else {
        tracing::warn!("Refused moderation action for non-admin {}", actor.username);
        Err(RelmonError::Authorization("Admin role required".to_string()))
    }
}

/// Result of a moderation action that did not fail
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ActionOutcome {
    /// The change was applied and audited
    Completed { message: String },
    /// Nothing needed to change; nothing was written
    Unchanged { message: String },
    /// A destructive action was submitted without confirmation
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identities_include_email_once() {
        let actor = Actor::new("alice", Some("alice@example.org"), false);
        assert_eq!(actor.identities(), vec!["alice", "alice@example.org"]);

        let actor = Actor::new("bob", None, false);
        assert_eq!(actor.identities(), vec!["bob"]);
    }

    #[test]
    fn test_require_admin() {
        assert!(require_admin(&Actor::new("root", None, true)).is_ok());
        assert!(matches!(
            require_admin(&Actor::new("alice", None, false)),
            Err(RelmonError::Authorization(_))
        ));
    }

    #[test]
    fn test_outcome_serialization() {
        let value = serde_json::to_value(ActionOutcome::Cancelled).unwrap();
        assert_eq!(value["status"], "cancelled");

        let value = serde_json::to_value(ActionOutcome::Completed {
            message: "done".to_string(),
        })
        .unwrap();
        assert_eq!(value["status"], "completed");
        assert_eq!(value["message"], "done");
    }
}
