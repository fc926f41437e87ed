//! crates/nexskill_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    ContentBlock, Course, Enrollment, Lesson, QuestionDraft, Quiz, QuizQuestion, User,
    UserCredentials, UserRole,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The quiz editor's sole collaborator. Question creation goes through the
/// persistence layer first; the editor only appends the record it returns.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Stores a new question and returns it with its server-assigned id.
    async fn create_question(&self, draft: QuestionDraft) -> PortResult<QuizQuestion>;

    /// Persists the full question list of a quiz - the host's explicit save
    /// action. A full replacement, never a diff.
    async fn save_questions(&self, quiz_id: Uuid, questions: &[QuizQuestion]) -> PortResult<()>;

    async fn get_questions_for_quiz(&self, quiz_id: Uuid) -> PortResult<Vec<QuizQuestion>>;

    async fn delete_question(&self, question_id: Uuid) -> PortResult<()>;
}

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- User Management ---
    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User>;

    // --- Auth Methods ---
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
        display_name: Option<&str>,
        role: UserRole,
    ) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    // --- Course Catalog ---
    async fn create_course(
        &self,
        owner_id: Uuid,
        title: &str,
        description: Option<&str>,
    ) -> PortResult<Course>;

    async fn list_courses(&self, include_unpublished: bool) -> PortResult<Vec<Course>>;

    async fn get_course_by_id(&self, course_id: Uuid) -> PortResult<Course>;

    async fn create_enrollment(&self, user_id: Uuid, course_id: Uuid) -> PortResult<Enrollment>;

    // --- Lessons ---
    async fn create_lesson(
        &self,
        course_id: Uuid,
        title: &str,
        position: usize,
    ) -> PortResult<Lesson>;

    async fn get_lesson_by_id(&self, lesson_id: Uuid) -> PortResult<Lesson>;

    async fn save_lesson_content(
        &self,
        lesson_id: Uuid,
        content: &[ContentBlock],
    ) -> PortResult<()>;

    // --- Quizzes ---
    async fn create_quiz(&self, course_id: Uuid, title: &str) -> PortResult<Quiz>;

    async fn get_quiz_by_id(&self, quiz_id: Uuid) -> PortResult<Quiz>;

    async fn update_quiz(&self, quiz: &Quiz) -> PortResult<()>;

    async fn set_quiz_published(&self, quiz_id: Uuid, is_published: bool) -> PortResult<()>;
}
