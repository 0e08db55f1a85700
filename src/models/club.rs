//! Reading club data structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::feed::{Engageable, Identified};

/// A club member: either a bare id or a populated profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClubMember {
    Profile {
        #[serde(alias = "_id")]
        id: String,
        #[serde(default)]
        username: String,
        #[serde(default, rename = "profilePicture")]
        profile_picture: Option<String>,
    },
    Id(String),
}

impl ClubMember {
    pub fn id(&self) -> &str {
        match self {
            ClubMember::Profile { id, .. } => id,
            ClubMember::Id(id) => id,
        }
    }
}

/// A reading club.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Club {
    #[serde(alias = "_id")]
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub cover: String,

    #[serde(default)]
    pub category: String,

    #[serde(default)]
    pub members: Vec<ClubMember>,

    #[serde(default)]
    pub current_book: Option<String>,

    #[serde(default)]
    pub next_meeting: Option<String>,

    #[serde(default)]
    pub is_private: bool,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Club {
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn has_member(&self, user_id: &str) -> bool {
        self.members.iter().any(|m| m.id() == user_id)
    }
}

impl Identified for Club {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Engageable for Club {
    fn is_engaged(&self, viewer: &str) -> bool {
        self.has_member(viewer)
    }

    fn engagement_count(&self) -> u32 {
        u32::try_from(self.members.len()).unwrap_or(u32::MAX)
    }

    fn set_engaged(&mut self, viewer: &str, engaged: bool) {
        if engaged == self.has_member(viewer) {
            return;
        }
        if engaged {
            self.members.push(ClubMember::Id(viewer.to_string()));
        } else {
            self.members.retain(|m| m.id() != viewer);
        }
    }
}

/// Request body for `POST /clubs`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClub {
    pub name: String,
    pub description: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    pub is_private: bool,
}
