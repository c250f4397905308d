use serde::{Deserialize, Serialize};

use super::Dataset;

/// Minimal user identity consulted by capability checks. Authentication
/// itself happens outside this workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub is_admin: bool,
}

impl User {
    /// Whether this user may delete resources belonging to `dataset`.
    /// Only admins and the dataset owner may delete.
    pub fn can_delete(&self, dataset: Option<&Dataset>) -> bool {
        match dataset {
            Some(ds) => self.is_admin || ds.is_owner(&self.username),
            // Unclassified images are only removable by admins.
            None => self.is_admin,
        }
    }

    /// Whether this user may download resources belonging to `dataset`.
    /// Any dataset member may download.
    pub fn can_download(&self, dataset: Option<&Dataset>) -> bool {
        match dataset {
            Some(ds) => self.is_admin || ds.is_member(&self.username),
            None => self.is_admin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn dataset(owner: &str, users: &[&str]) -> Dataset {
        Dataset {
            id: 7,
            name: "birds".into(),
            directory: "/datasets/birds".into(),
            owner: owner.into(),
            users: users.iter().map(|u| u.to_string()).collect(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn owner_can_delete_member_cannot() {
        let ds = dataset("ana", &["bo"]);
        let ana = User {
            username: "ana".into(),
            is_admin: false,
        };
        let bo = User {
            username: "bo".into(),
            is_admin: false,
        };

        assert!(ana.can_delete(Some(&ds)));
        assert!(!bo.can_delete(Some(&ds)));
        assert!(bo.can_download(Some(&ds)));
    }

    #[test]
    fn admin_bypasses_membership() {
        let ds = dataset("ana", &[]);
        let admin = User {
            username: "root".into(),
            is_admin: true,
        };
        assert!(admin.can_delete(Some(&ds)));
        assert!(admin.can_download(Some(&ds)));
        assert!(admin.can_delete(None));
    }

    #[test]
    fn unclassified_images_restricted_to_admins() {
        let user = User {
            username: "bo".into(),
            is_admin: false,
        };
        assert!(!user.can_delete(None));
        assert!(!user.can_download(None));
    }
}
