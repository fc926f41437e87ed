//! crates/nexskill_core/src/domain.rs
//!
//! Defines the pure, core data structures for the platform.
//! These structs are independent of any database or serialization target
//! beyond the serde derives needed to round-trip them as JSON documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::answer::{AnswerConfig, QuestionType};

//=========================================================================================
// Users and Roles
//=========================================================================================

/// The platform roles. Every account carries exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Student,
    Coach,
    SubCoach,
    ContentEditor,
    CommunityManager,
    Support,
    OrgOwner,
    PlatformOwner,
}

impl UserRole {
    /// The stable snake_case name used in storage and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Student => "student",
            UserRole::Coach => "coach",
            UserRole::SubCoach => "sub_coach",
            UserRole::ContentEditor => "content_editor",
            UserRole::CommunityManager => "community_manager",
            UserRole::Support => "support",
            UserRole::OrgOwner => "org_owner",
            UserRole::PlatformOwner => "platform_owner",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "student" => Some(UserRole::Student),
            "coach" => Some(UserRole::Coach),
            "sub_coach" => Some(UserRole::SubCoach),
            "content_editor" => Some(UserRole::ContentEditor),
            "community_manager" => Some(UserRole::CommunityManager),
            "support" => Some(UserRole::Support),
            "org_owner" => Some(UserRole::OrgOwner),
            "platform_owner" => Some(UserRole::PlatformOwner),
            _ => None,
        }
    }

    /// Whether this role may create and edit courses, lessons and quizzes.
    pub fn can_author_content(&self) -> bool {
        matches!(
            self,
            UserRole::Coach
                | UserRole::SubCoach
                | UserRole::ContentEditor
                | UserRole::OrgOwner
                | UserRole::PlatformOwner
        )
    }
}

/// Represents an account - used throughout the app.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub user_id: Uuid,
    pub email: Option<String>, // Optional because old accounts won't have it
    pub display_name: Option<String>,
    pub role: UserRole,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
    pub role: UserRole,
}

// Represents a browser login session (auth cookie)
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

//=========================================================================================
// Courses and Lessons
//=========================================================================================

/// A course in the catalog. Lessons and quizzes hang off it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub is_published: bool,
}

/// A student's membership in a course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub enrolled_at: DateTime<Utc>,
}

/// One lesson of a course. Its body is an ordered content-block sequence,
/// edited through the same store as question content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub position: usize,
    pub content: Vec<ContentBlock>,
}

//=========================================================================================
// Content Blocks
//=========================================================================================

/// The block kinds a lesson or question body can contain.
/// Fixed at creation; changing the kind means creating a new block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    Text,
    Heading,
    Image,
    Video,
    Code,
}

/// One atomic unit of rendered content with a stable identity and ordering rank.
///
/// `content` carries the primary payload: HTML for text, the heading text,
/// the asset URL for image/video, source text for code. `attributes` is a
/// type-dependent bag (heading level, image alt/caption, video playback flags,
/// code language, media metadata).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub block_type: BlockType,
    pub content: String,
    pub position: usize,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl ContentBlock {
    /// Creates a block of the given kind at the given rank, with the
    /// kind-specific default attributes.
    pub fn new(block_type: BlockType, position: usize) -> Self {
        let mut attributes = Map::new();
        if block_type == BlockType::Heading {
            attributes.insert("level".to_string(), Value::from(2));
        }
        Self {
            id: Uuid::new_v4(),
            block_type,
            content: String::new(),
            position,
            attributes,
        }
    }
}

/// Descriptor of a completed media upload, delivered by the host once an
/// image or video asset has landed in storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaMetadata {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
}

//=========================================================================================
// Quizzes
//=========================================================================================

/// Quiz settings. The ordered question list is held separately and kept in
/// sync by the owning editor; it is not a field of this entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub instructions: Option<String>,
    pub passing_score: Option<f64>,
    pub time_limit_minutes: Option<u32>,
    pub max_attempts: Option<u32>,
    pub late_penalty_percent: f64,
    pub late_submission_allowed: bool,
    pub available_from: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub requires_manual_grading: bool,
    pub is_published: bool,
}

/// One question of a quiz.
///
/// Invariant: the `answer_config` variant always matches `question_type`.
/// Changing the type discards the old config and installs the new type's
/// default; prior configuration is never migrated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub id: Uuid,
    pub quiz_id: Uuid,
    pub position: usize,
    pub question_type: QuestionType,
    pub question_content: Vec<ContentBlock>,
    pub points: f64,
    pub requires_manual_grading: bool,
    pub answer_config: AnswerConfig,
}

/// A question as submitted for creation, before the persistence layer has
/// assigned it an id. Creation is not purely local: the editor only appends
/// a question once the collaborator returns the stored record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionDraft {
    pub quiz_id: Uuid,
    pub position: usize,
    pub question_type: QuestionType,
    pub question_content: Vec<ContentBlock>,
    pub points: f64,
    pub requires_manual_grading: bool,
    pub answer_config: AnswerConfig,
}

impl QuestionDraft {
    /// The default draft for a freshly added question: multiple choice with
    /// that type's default config, one point, empty body.
    pub fn new_default(quiz_id: Uuid, position: usize) -> Self {
        Self {
            quiz_id,
            position,
            question_type: QuestionType::MultipleChoice,
            question_content: Vec::new(),
            points: 1.0,
            requires_manual_grading: false,
            answer_config: AnswerConfig::default_for(QuestionType::MultipleChoice),
        }
    }
}
