//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` and `QuestionRepository` ports from the `core` crate.
//! It handles all interactions with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nexskill_core::answer::{AnswerConfig, QuestionType};
use nexskill_core::domain::{
    ContentBlock, Course, Enrollment, Lesson, QuestionDraft, Quiz, QuizQuestion, User,
    UserCredentials, UserRole,
};
use nexskill_core::ports::{DatabaseService, PortError, PortResult, QuestionRepository};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the persistence ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

fn parse_role(role: &str, user_id: Uuid) -> PortResult<UserRole> {
    UserRole::parse(role).ok_or_else(|| {
        PortError::Unexpected(format!("Unknown role '{}' for user {}", role, user_id))
    })
}

#[derive(FromRow)]
struct UserRecord {
    user_id: Uuid,
    email: Option<String>,
    display_name: Option<String>,
    role: String,
}
impl UserRecord {
    fn to_domain(self) -> PortResult<User> {
        let role = parse_role(&self.role, self.user_id)?;
        Ok(User {
            user_id: self.user_id,
            email: self.email,
            display_name: self.display_name,
            role,
        })
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    user_id: Uuid,
    email: String,
    hashed_password: String,
    role: String,
}
impl CredentialsRecord {
    fn to_domain(self) -> PortResult<UserCredentials> {
        let role = parse_role(&self.role, self.user_id)?;
        Ok(UserCredentials {
            user_id: self.user_id,
            email: self.email,
            hashed_password: self.hashed_password,
            role,
        })
    }
}

#[derive(FromRow)]
struct CourseRecord {
    id: Uuid,
    owner_id: Uuid,
    title: String,
    description: Option<String>,
    is_published: bool,
}
impl CourseRecord {
    fn to_domain(self) -> Course {
        Course {
            id: self.id,
            owner_id: self.owner_id,
            title: self.title,
            description: self.description,
            is_published: self.is_published,
        }
    }
}

#[derive(FromRow)]
struct EnrollmentRecord {
    user_id: Uuid,
    course_id: Uuid,
    enrolled_at: DateTime<Utc>,
}
impl EnrollmentRecord {
    fn to_domain(self) -> Enrollment {
        Enrollment {
            user_id: self.user_id,
            course_id: self.course_id,
            enrolled_at: self.enrolled_at,
        }
    }
}

#[derive(FromRow)]
struct LessonRecord {
    id: Uuid,
    course_id: Uuid,
    title: String,
    position: i32,
    content: Value,
}
impl LessonRecord {
    fn to_domain(self) -> PortResult<Lesson> {
        let content: Vec<ContentBlock> = serde_json::from_value(self.content).map_err(|e| {
            PortError::Unexpected(format!("Corrupt content for lesson {}: {}", self.id, e))
        })?;
        Ok(Lesson {
            id: self.id,
            course_id: self.course_id,
            title: self.title,
            position: self.position as usize,
            content,
        })
    }
}

#[derive(FromRow)]
struct QuizRecord {
    id: Uuid,
    course_id: Uuid,
    title: String,
    description: Option<String>,
    instructions: Option<String>,
    passing_score: Option<f64>,
    time_limit_minutes: Option<i32>,
    max_attempts: Option<i32>,
    late_penalty_percent: f64,
    late_submission_allowed: bool,
    available_from: Option<DateTime<Utc>>,
    due_date: Option<DateTime<Utc>>,
    requires_manual_grading: bool,
    is_published: bool,
}
impl QuizRecord {
    fn to_domain(self) -> Quiz {
        Quiz {
            id: self.id,
            course_id: self.course_id,
            title: self.title,
            description: self.description,
            instructions: self.instructions,
            passing_score: self.passing_score,
            time_limit_minutes: self.time_limit_minutes.map(|m| m as u32),
            max_attempts: self.max_attempts.map(|a| a as u32),
            late_penalty_percent: self.late_penalty_percent,
            late_submission_allowed: self.late_submission_allowed,
            available_from: self.available_from,
            due_date: self.due_date,
            requires_manual_grading: self.requires_manual_grading,
            is_published: self.is_published,
        }
    }
}

#[derive(FromRow)]
struct QuizQuestionRecord {
    id: Uuid,
    quiz_id: Uuid,
    position: i32,
    question_type: String,
    question_content: Value,
    points: f64,
    requires_manual_grading: bool,
    answer_config: Value,
}
impl QuizQuestionRecord {
    fn to_domain(self) -> PortResult<QuizQuestion> {
        let question_type = QuestionType::parse(&self.question_type).ok_or_else(|| {
            PortError::Unexpected(format!(
                "Unknown question type '{}' for question {}",
                self.question_type, self.id
            ))
        })?;
        let question_content: Vec<ContentBlock> = serde_json::from_value(self.question_content)
            .map_err(|e| {
                PortError::Unexpected(format!("Corrupt content for question {}: {}", self.id, e))
            })?;
        let answer_config: AnswerConfig =
            serde_json::from_value(self.answer_config).map_err(|e| {
                PortError::Unexpected(format!("Corrupt config for question {}: {}", self.id, e))
            })?;
        // The stored tag and column must agree; a mismatch means the row was
        // written outside the editor invariant.
        if answer_config.question_type() != question_type {
            return Err(PortError::Unexpected(format!(
                "Config tag does not match question type for question {}",
                self.id
            )));
        }
        Ok(QuizQuestion {
            id: self.id,
            quiz_id: self.quiz_id,
            position: self.position as usize,
            question_type,
            question_content,
            points: self.points,
            requires_manual_grading: self.requires_manual_grading,
            answer_config,
        })
    }
}

fn to_json<T: serde::Serialize>(value: &T, what: &str) -> PortResult<Value> {
    serde_json::to_value(value)
        .map_err(|e| PortError::Unexpected(format!("Failed to encode {}: {}", what, e)))
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT user_id, email, display_name, role FROM users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", user_id)),
            _ => PortError::Unexpected(e.to_string()),
        })?;
        record.to_domain()
    }

    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
        display_name: Option<&str>,
        role: UserRole,
    ) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (user_id, email, hashed_password, display_name, role) \
             VALUES ($1, $2, $3, $4, $5) RETURNING user_id, email, display_name, role",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(hashed_password)
        .bind(display_name)
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        record.to_domain()
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT user_id, email, hashed_password, role FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", email)),
            _ => PortError::Unexpected(e.to_string()),
        })?;
        record.to_domain()
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let row: Option<(Uuid,)> = sqlx::query_as(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > NOW()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        match row {
            Some((user_id,)) => Ok(user_id),
            None => Err(PortError::Unauthorized),
        }
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn create_course(
        &self,
        owner_id: Uuid,
        title: &str,
        description: Option<&str>,
    ) -> PortResult<Course> {
        let record = sqlx::query_as::<_, CourseRecord>(
            "INSERT INTO courses (id, owner_id, title, description) VALUES ($1, $2, $3, $4) \
             RETURNING id, owner_id, title, description, is_published",
        )
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(title)
        .bind(description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(record.to_domain())
    }

    async fn list_courses(&self, include_unpublished: bool) -> PortResult<Vec<Course>> {
        let records = sqlx::query_as::<_, CourseRecord>(
            "SELECT id, owner_id, title, description, is_published FROM courses \
             WHERE is_published OR $1 ORDER BY title ASC",
        )
        .bind(include_unpublished)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn get_course_by_id(&self, course_id: Uuid) -> PortResult<Course> {
        let record = sqlx::query_as::<_, CourseRecord>(
            "SELECT id, owner_id, title, description, is_published FROM courses WHERE id = $1",
        )
        .bind(course_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("Course {} not found", course_id))
            }
            _ => PortError::Unexpected(e.to_string()),
        })?;
        Ok(record.to_domain())
    }

    async fn create_enrollment(&self, user_id: Uuid, course_id: Uuid) -> PortResult<Enrollment> {
        sqlx::query(
            "INSERT INTO enrollments (user_id, course_id) VALUES ($1, $2) \
             ON CONFLICT (user_id, course_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(course_id)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let record = sqlx::query_as::<_, EnrollmentRecord>(
            "SELECT user_id, course_id, enrolled_at FROM enrollments \
             WHERE user_id = $1 AND course_id = $2",
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(record.to_domain())
    }

    async fn create_lesson(
        &self,
        course_id: Uuid,
        title: &str,
        position: usize,
    ) -> PortResult<Lesson> {
        let record = sqlx::query_as::<_, LessonRecord>(
            "INSERT INTO lessons (id, course_id, title, position, content) \
             VALUES ($1, $2, $3, $4, '[]'::jsonb) \
             RETURNING id, course_id, title, position, content",
        )
        .bind(Uuid::new_v4())
        .bind(course_id)
        .bind(title)
        .bind(position as i32)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        record.to_domain()
    }

    async fn get_lesson_by_id(&self, lesson_id: Uuid) -> PortResult<Lesson> {
        let record = sqlx::query_as::<_, LessonRecord>(
            "SELECT id, course_id, title, position, content FROM lessons WHERE id = $1",
        )
        .bind(lesson_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("Lesson {} not found", lesson_id))
            }
            _ => PortError::Unexpected(e.to_string()),
        })?;
        record.to_domain()
    }

    async fn save_lesson_content(
        &self,
        lesson_id: Uuid,
        content: &[ContentBlock],
    ) -> PortResult<()> {
        let encoded = to_json(&content, "lesson content")?;
        let result = sqlx::query("UPDATE lessons SET content = $1 WHERE id = $2")
            .bind(encoded)
            .bind(lesson_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Lesson {} not found",
                lesson_id
            )));
        }
        Ok(())
    }

    async fn create_quiz(&self, course_id: Uuid, title: &str) -> PortResult<Quiz> {
        let record = sqlx::query_as::<_, QuizRecord>(
            "INSERT INTO quizzes (id, course_id, title) VALUES ($1, $2, $3) \
             RETURNING id, course_id, title, description, instructions, passing_score, \
                       time_limit_minutes, max_attempts, late_penalty_percent, \
                       late_submission_allowed, available_from, due_date, \
                       requires_manual_grading, is_published",
        )
        .bind(Uuid::new_v4())
        .bind(course_id)
        .bind(title)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(record.to_domain())
    }

    async fn get_quiz_by_id(&self, quiz_id: Uuid) -> PortResult<Quiz> {
        let record = sqlx::query_as::<_, QuizRecord>(
            "SELECT id, course_id, title, description, instructions, passing_score, \
                    time_limit_minutes, max_attempts, late_penalty_percent, \
                    late_submission_allowed, available_from, due_date, \
                    requires_manual_grading, is_published \
             FROM quizzes WHERE id = $1",
        )
        .bind(quiz_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("Quiz {} not found", quiz_id)),
            _ => PortError::Unexpected(e.to_string()),
        })?;
        Ok(record.to_domain())
    }

    async fn update_quiz(&self, quiz: &Quiz) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE quizzes SET title = $1, description = $2, instructions = $3, \
             passing_score = $4, time_limit_minutes = $5, max_attempts = $6, \
             late_penalty_percent = $7, late_submission_allowed = $8, available_from = $9, \
             due_date = $10, requires_manual_grading = $11 WHERE id = $12",
        )
        .bind(&quiz.title)
        .bind(&quiz.description)
        .bind(&quiz.instructions)
        .bind(quiz.passing_score)
        .bind(quiz.time_limit_minutes.map(|m| m as i32))
        .bind(quiz.max_attempts.map(|a| a as i32))
        .bind(quiz.late_penalty_percent)
        .bind(quiz.late_submission_allowed)
        .bind(quiz.available_from)
        .bind(quiz.due_date)
        .bind(quiz.requires_manual_grading)
        .bind(quiz.id)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Quiz {} not found", quiz.id)));
        }
        Ok(())
    }

    async fn set_quiz_published(&self, quiz_id: Uuid, is_published: bool) -> PortResult<()> {
        let result = sqlx::query("UPDATE quizzes SET is_published = $1 WHERE id = $2")
            .bind(is_published)
            .bind(quiz_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Quiz {} not found", quiz_id)));
        }
        Ok(())
    }
}

//=========================================================================================
// `QuestionRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl QuestionRepository for DbAdapter {
    async fn create_question(&self, draft: QuestionDraft) -> PortResult<QuizQuestion> {
        let content = to_json(&draft.question_content, "question content")?;
        let config = to_json(&draft.answer_config, "answer config")?;
        let record = sqlx::query_as::<_, QuizQuestionRecord>(
            "INSERT INTO quiz_questions \
             (id, quiz_id, position, question_type, question_content, points, \
              requires_manual_grading, answer_config) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING id, quiz_id, position, question_type, question_content, points, \
                       requires_manual_grading, answer_config",
        )
        .bind(Uuid::new_v4())
        .bind(draft.quiz_id)
        .bind(draft.position as i32)
        .bind(draft.question_type.as_str())
        .bind(content)
        .bind(draft.points)
        .bind(draft.requires_manual_grading)
        .bind(config)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        record.to_domain()
    }

    async fn save_questions(&self, quiz_id: Uuid, questions: &[QuizQuestion]) -> PortResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Full replacement of the quiz's question list, never a diff.
        sqlx::query("DELETE FROM quiz_questions WHERE quiz_id = $1")
            .bind(quiz_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        for question in questions {
            let content = to_json(&question.question_content, "question content")?;
            let config = to_json(&question.answer_config, "answer config")?;
            sqlx::query(
                "INSERT INTO quiz_questions \
                 (id, quiz_id, position, question_type, question_content, points, \
                  requires_manual_grading, answer_config) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(question.id)
            .bind(quiz_id)
            .bind(question.position as i32)
            .bind(question.question_type.as_str())
            .bind(content)
            .bind(question.points)
            .bind(question.requires_manual_grading)
            .bind(config)
            .execute(&mut *tx)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn get_questions_for_quiz(&self, quiz_id: Uuid) -> PortResult<Vec<QuizQuestion>> {
        let records = sqlx::query_as::<_, QuizQuestionRecord>(
            "SELECT id, quiz_id, position, question_type, question_content, points, \
                    requires_manual_grading, answer_config \
             FROM quiz_questions WHERE quiz_id = $1 ORDER BY position ASC",
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn delete_question(&self, question_id: Uuid) -> PortResult<()> {
        sqlx::query("DELETE FROM quiz_questions WHERE id = $1")
            .bind(question_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn question_record_round_trips_tagged_config() {
        let record = QuizQuestionRecord {
            id: Uuid::from_u128(1),
            quiz_id: Uuid::from_u128(2),
            position: 0,
            question_type: "true_false".to_string(),
            question_content: json!([]),
            points: 1.5,
            requires_manual_grading: false,
            answer_config: json!({"type": "true_false", "correct_answer": false}),
        };
        let question = record.to_domain().expect("record should convert");
        assert_eq!(question.question_type, QuestionType::TrueFalse);
        assert_eq!(
            question.answer_config,
            AnswerConfig::TrueFalse(nexskill_core::answer::TrueFalseConfig {
                correct_answer: false
            })
        );
    }

    #[test]
    fn question_record_rejects_mismatched_tag() {
        let record = QuizQuestionRecord {
            id: Uuid::from_u128(1),
            quiz_id: Uuid::from_u128(2),
            position: 0,
            question_type: "essay".to_string(),
            question_content: json!([]),
            points: 1.0,
            requires_manual_grading: true,
            answer_config: json!({"type": "true_false", "correct_answer": true}),
        };
        assert!(record.to_domain().is_err());
    }

    #[test]
    fn question_record_rejects_unknown_type() {
        let record = QuizQuestionRecord {
            id: Uuid::from_u128(1),
            quiz_id: Uuid::from_u128(2),
            position: 0,
            question_type: "matching".to_string(),
            question_content: json!([]),
            points: 1.0,
            requires_manual_grading: false,
            answer_config: json!({"type": "true_false", "correct_answer": true}),
        };
        assert!(record.to_domain().is_err());
    }

    #[test]
    fn lesson_record_parses_stored_blocks() {
        let block_id = Uuid::from_u128(42);
        let record = LessonRecord {
            id: Uuid::from_u128(1),
            course_id: Uuid::from_u128(2),
            title: "Intro".to_string(),
            position: 0,
            content: json!([{
                "id": block_id,
                "type": "heading",
                "content": "Welcome",
                "position": 0,
                "attributes": {"level": 2}
            }]),
        };
        let lesson = record.to_domain().expect("record should convert");
        assert_eq!(lesson.content.len(), 1);
        assert_eq!(lesson.content[0].id, block_id);
        assert_eq!(lesson.content[0].content, "Welcome");
    }

    #[test]
    fn user_record_rejects_unknown_role() {
        let record = UserRecord {
            user_id: Uuid::from_u128(1),
            email: Some("a@b.c".to_string()),
            display_name: None,
            role: "janitor".to_string(),
        };
        assert!(record.to_domain().is_err());
    }
}
