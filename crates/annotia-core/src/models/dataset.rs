use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "sqlx")]
use sqlx::FromRow;

/// Dataset record: groups images and carries the sharing lists the
/// capability checks consult.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
pub struct Dataset {
    pub id: i64,
    pub name: String,
    pub directory: String,
    pub owner: String,
    /// Usernames granted access by the owner.
    pub users: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Dataset {
    pub fn is_owner(&self, username: &str) -> bool {
        self.owner == username
    }

    pub fn is_member(&self, username: &str) -> bool {
        self.is_owner(username) || self.users.iter().any(|u| u == username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Dataset {
        Dataset {
            id: 1,
            name: "cats".into(),
            directory: "/datasets/cats".into(),
            owner: "ana".into(),
            users: vec!["bo".into()],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn membership_includes_owner_and_shared_users() {
        let ds = dataset();
        assert!(ds.is_member("ana"));
        assert!(ds.is_member("bo"));
        assert!(!ds.is_member("eve"));
    }
}
