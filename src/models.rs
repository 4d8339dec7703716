//! Domain records persisted by the store
//!
//! Roles, lifecycle status and material kinds are closed enums; their string
//! forms are what the database columns and JSON bodies carry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::models::UserRole;

/// Registration lifecycle of an account.
///
/// Accounts start `Pending`; only an administrator moves them to `Active`
/// or `Rejected`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Pending,
    Active,
    Rejected,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Pending => "pending",
            UserStatus::Active => "active",
            UserStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(UserStatus::Pending),
            "active" => Some(UserStatus::Active),
            "rejected" => Some(UserStatus::Rejected),
            _ => None,
        }
    }
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub full_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // bcrypt hash - never serialize
    pub role: UserRole,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }
}

/// Aggregate account counts for the admin dashboard.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct UserStats {
    pub total_users: i64,
    pub active_users: i64,
    pub pending_users: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Course {
    pub id: String,
    pub instructor_id: String,
    pub title: String,
    pub description: String,
    pub cover_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Kind of content a learning material carries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Text,
    Video,
    Pdf,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Text => "text",
            ContentKind::Video => "video",
            ContentKind::Pdf => "pdf",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "text" => Some(ContentKind::Text),
            "video" => Some(ContentKind::Video),
            "pdf" => Some(ContentKind::Pdf),
            _ => None,
        }
    }
}

/// Material payload; the variant always agrees with the content kind.
///
/// Serialized flat as `content_type` plus the single matching payload field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "content_type", rename_all = "lowercase")]
pub enum MaterialContent {
    Text { text_content: String },
    Video { video_url: String },
    Pdf { file_url: String },
}

impl MaterialContent {
    pub fn kind(&self) -> ContentKind {
        match self {
            MaterialContent::Text { .. } => ContentKind::Text,
            MaterialContent::Video { .. } => ContentKind::Video,
            MaterialContent::Pdf { .. } => ContentKind::Pdf,
        }
    }

    /// Build a payload from the flat wire/column representation.
    ///
    /// Exactly one non-blank payload must be present and it must be the one
    /// the kind calls for.
    pub fn from_parts(
        kind: ContentKind,
        text_content: Option<String>,
        video_url: Option<String>,
        file_url: Option<String>,
    ) -> Result<Self, String> {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        let populated = [&text_content, &video_url, &file_url]
            .into_iter()
            .filter(|v| present(*v))
            .count();
        if populated != 1 {
            return Err(format!(
                "exactly one content field must be set for a {} material",
                kind.as_str()
            ));
        }

        let mismatch = || {
            format!(
                "content_type '{}' does not match the supplied content field",
                kind.as_str()
            )
        };
        match kind {
            ContentKind::Text => text_content
                .filter(|s| !s.trim().is_empty())
                .map(|text_content| MaterialContent::Text { text_content })
                .ok_or_else(mismatch),
            ContentKind::Video => video_url
                .filter(|s| !s.trim().is_empty())
                .map(|video_url| MaterialContent::Video { video_url })
                .ok_or_else(mismatch),
            ContentKind::Pdf => file_url
                .filter(|s| !s.trim().is_empty())
                .map(|file_url| MaterialContent::Pdf { file_url })
                .ok_or_else(mismatch),
        }
    }

    /// Flat (text, video, file) columns for storage.
    pub fn columns(&self) -> (Option<&str>, Option<&str>, Option<&str>) {
        match self {
            MaterialContent::Text { text_content } => (Some(text_content.as_str()), None, None),
            MaterialContent::Video { video_url } => (None, Some(video_url.as_str()), None),
            MaterialContent::Pdf { file_url } => (None, None, Some(file_url.as_str())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LearningMaterial {
    pub id: String,
    pub course_id: String,
    pub title: String,
    #[serde(flatten)]
    pub content: MaterialContent,
    /// Ordinal within the course, assigned on insert and never renumbered.
    pub position: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Enrollment {
    pub student_id: String,
    pub course_id: String,
    pub enrolled_at: DateTime<Utc>,
}

/// A course together with its materials in position order.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CourseWithMaterials {
    #[serde(flatten)]
    pub course: Course,
    pub materials: Vec<LearningMaterial>,
}
