//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::middleware::AuthUser;
use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::{DateTime, Utc};
use nexskill_core::blocks::ContentBlockStore;
use nexskill_core::domain::{ContentBlock, Course, Enrollment, Lesson, Quiz, QuizQuestion, UserRole};
use nexskill_core::editor::{renumber_questions, QuizEditor};
use nexskill_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::auth::signup_handler,
        crate::web::auth::login_handler,
        crate::web::auth::logout_handler,
        create_quiz_handler,
        get_quiz_handler,
        update_quiz_handler,
        publish_quiz_handler,
        create_question_handler,
        save_questions_handler,
        delete_question_handler,
        list_courses_handler,
        create_course_handler,
        enroll_handler,
        create_lesson_handler,
        get_lesson_handler,
        save_lesson_content_handler,
    ),
    components(
        schemas(
            crate::web::auth::SignupRequest,
            crate::web::auth::LoginRequest,
            crate::web::auth::AuthResponse,
            CreateQuizRequest,
            UpdateQuizRequest,
            PublishQuizRequest,
            QuizResponse,
            QuestionResponse,
            SaveQuestionsRequest,
            SaveQuestionsResponse,
            QuestionWarnings,
            CreateCourseRequest,
            CoursesResponse,
            CourseResponse,
            EnrollmentResponse,
            CreateLessonRequest,
            LessonResponse,
            SaveLessonContentRequest,
        )
    ),
    tags(
        (name = "NexSkill Authoring API", description = "Quiz, lesson and course authoring endpoints.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct CreateQuizRequest {
    pub course_id: Uuid,
    pub title: String,
}

/// Full replacement of a quiz's settings. The question list is saved through
/// its own endpoint.
#[derive(Deserialize, ToSchema)]
pub struct UpdateQuizRequest {
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
}

#[derive(Deserialize, ToSchema)]
pub struct PublishQuizRequest {
    pub is_published: bool,
}

#[derive(Serialize, ToSchema)]
pub struct QuizResponse {
    #[schema(value_type = Object)]
    pub quiz: Quiz,
    #[schema(value_type = Vec<Object>)]
    pub questions: Vec<QuizQuestion>,
    /// Derived from the question list on every read; never stored.
    pub total_points: f64,
}

#[derive(Serialize, ToSchema)]
pub struct QuestionResponse {
    #[schema(value_type = Object)]
    pub question: QuizQuestion,
    pub warnings: Vec<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct SaveQuestionsRequest {
    #[schema(value_type = Vec<Object>)]
    pub questions: Vec<QuizQuestion>,
}

/// Authoring warnings for one saved question, keyed by id. Informational
/// only; the save has already applied.
#[derive(Serialize, ToSchema)]
pub struct QuestionWarnings {
    pub question_id: Uuid,
    pub warnings: Vec<String>,
}

#[derive(Serialize, ToSchema)]
pub struct SaveQuestionsResponse {
    #[schema(value_type = Vec<Object>)]
    pub questions: Vec<QuizQuestion>,
    pub warnings: Vec<QuestionWarnings>,
    pub total_points: f64,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateCourseRequest {
    pub title: String,
    pub description: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct CoursesResponse {
    #[schema(value_type = Vec<Object>)]
    pub courses: Vec<Course>,
}

#[derive(Serialize, ToSchema)]
pub struct CourseResponse {
    #[schema(value_type = Object)]
    pub course: Course,
}

#[derive(Serialize, ToSchema)]
pub struct EnrollmentResponse {
    #[schema(value_type = Object)]
    pub enrollment: Enrollment,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateLessonRequest {
    pub title: String,
    pub position: usize,
}

#[derive(Serialize, ToSchema)]
pub struct LessonResponse {
    #[schema(value_type = Object)]
    pub lesson: Lesson,
}

#[derive(Deserialize, ToSchema)]
pub struct SaveLessonContentRequest {
    #[schema(value_type = Vec<Object>)]
    pub content: Vec<ContentBlock>,
}

//=========================================================================================
// Shared Handler Helpers
//=========================================================================================

/// Maps a port failure onto an HTTP response, logging the original error.
fn port_error_response(context: &str, e: PortError) -> (StatusCode, String) {
    error!("{}: {:?}", context, e);
    match e {
        PortError::NotFound(message) => (StatusCode::NOT_FOUND, message),
        PortError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
        PortError::Unexpected(_) => (StatusCode::INTERNAL_SERVER_ERROR, context.to_string()),
    }
}

/// Authoring endpoints are restricted to content-authoring roles.
fn require_author(auth: &AuthUser) -> Result<(), (StatusCode, String)> {
    if auth.role.can_author_content() {
        Ok(())
    } else {
        Err((
            StatusCode::FORBIDDEN,
            "This role cannot author content".to_string(),
        ))
    }
}

/// Returns the id of the first question whose config tag disagrees with its
/// declared type, if any. Such a payload violates the editor invariant and is
/// rejected before anything is persisted.
fn find_mismatched_config(questions: &[QuizQuestion]) -> Option<Uuid> {
    questions
        .iter()
        .find(|q| q.answer_config.question_type() != q.question_type)
        .map(|q| q.id)
}

fn warning_messages(question: &QuizQuestion) -> Vec<String> {
    question
        .answer_config
        .warnings()
        .iter()
        .map(|w| w.message().to_string())
        .collect()
}

//=========================================================================================
// Quiz Handlers
//=========================================================================================

/// Create a new quiz under a course.
#[utoipa::path(
    post,
    path = "/quizzes",
    request_body = CreateQuizRequest,
    responses(
        (status = 201, description = "Quiz created successfully", body = QuizResponse),
        (status = 403, description = "Caller cannot author content"),
        (status = 404, description = "Course not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_quiz_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    require_author(&auth)?;

    // Creating against a missing course should 404, not fail the insert.
    state
        .db
        .get_course_by_id(req.course_id)
        .await
        .map_err(|e| port_error_response("Failed to load course", e))?;

    let quiz = state
        .db
        .create_quiz(req.course_id, &req.title)
        .await
        .map_err(|e| port_error_response("Failed to create quiz", e))?;

    let response = QuizResponse {
        quiz,
        questions: Vec::new(),
        total_points: 0.0,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Fetch a quiz together with its ordered question list.
#[utoipa::path(
    get,
    path = "/quizzes/{quiz_id}",
    responses(
        (status = 200, description = "The quiz and its questions", body = QuizResponse),
        (status = 404, description = "Quiz not found"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("quiz_id" = Uuid, Path, description = "The quiz to fetch.")
    )
)]
pub async fn get_quiz_handler(
    State(state): State<Arc<AppState>>,
    Path(quiz_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let quiz = state
        .db
        .get_quiz_by_id(quiz_id)
        .await
        .map_err(|e| port_error_response("Failed to load quiz", e))?;
    let questions = state
        .questions
        .get_questions_for_quiz(quiz_id)
        .await
        .map_err(|e| port_error_response("Failed to load questions", e))?;

    let total_points = questions.iter().map(|q| q.points).sum();
    Ok(Json(QuizResponse {
        quiz,
        questions,
        total_points,
    }))
}

/// Replace a quiz's settings.
#[utoipa::path(
    put,
    path = "/quizzes/{quiz_id}",
    request_body = UpdateQuizRequest,
    responses(
        (status = 200, description = "Quiz updated", body = QuizResponse),
        (status = 403, description = "Caller cannot author content"),
        (status = 404, description = "Quiz not found"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("quiz_id" = Uuid, Path, description = "The quiz to update.")
    )
)]
pub async fn update_quiz_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(quiz_id): Path<Uuid>,
    Json(req): Json<UpdateQuizRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    require_author(&auth)?;

    let mut quiz = state
        .db
        .get_quiz_by_id(quiz_id)
        .await
        .map_err(|e| port_error_response("Failed to load quiz", e))?;

    quiz.title = req.title;
    quiz.description = req.description;
    quiz.instructions = req.instructions;
    quiz.passing_score = req.passing_score;
    quiz.time_limit_minutes = req.time_limit_minutes;
    quiz.max_attempts = req.max_attempts;
    quiz.late_penalty_percent = req.late_penalty_percent;
    quiz.late_submission_allowed = req.late_submission_allowed;
    quiz.available_from = req.available_from;
    quiz.due_date = req.due_date;
    quiz.requires_manual_grading = req.requires_manual_grading;

    state
        .db
        .update_quiz(&quiz)
        .await
        .map_err(|e| port_error_response("Failed to update quiz", e))?;

    let questions = state
        .questions
        .get_questions_for_quiz(quiz_id)
        .await
        .map_err(|e| port_error_response("Failed to load questions", e))?;
    let total_points = questions.iter().map(|q| q.points).sum();
    Ok(Json(QuizResponse {
        quiz,
        questions,
        total_points,
    }))
}

/// Publish or unpublish a quiz.
#[utoipa::path(
    post,
    path = "/quizzes/{quiz_id}/publish",
    request_body = PublishQuizRequest,
    responses(
        (status = 204, description = "Publication state updated"),
        (status = 403, description = "Caller cannot author content"),
        (status = 404, description = "Quiz not found"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("quiz_id" = Uuid, Path, description = "The quiz to publish.")
    )
)]
pub async fn publish_quiz_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(quiz_id): Path<Uuid>,
    Json(req): Json<PublishQuizRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    require_author(&auth)?;
    state
        .db
        .set_quiz_published(quiz_id, req.is_published)
        .await
        .map_err(|e| port_error_response("Failed to update publication state", e))?;
    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// Question Handlers
//=========================================================================================

/// Create a new default question at the end of a quiz.
///
/// Creation is pessimistic: the question only exists once the persistence
/// layer has assigned it an id. A failed create leaves the quiz untouched.
#[utoipa::path(
    post,
    path = "/quizzes/{quiz_id}/questions",
    responses(
        (status = 201, description = "Question created", body = QuestionResponse),
        (status = 403, description = "Caller cannot author content"),
        (status = 404, description = "Quiz not found"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("quiz_id" = Uuid, Path, description = "The quiz to extend.")
    )
)]
pub async fn create_question_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(quiz_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    require_author(&auth)?;

    let quiz = state
        .db
        .get_quiz_by_id(quiz_id)
        .await
        .map_err(|e| port_error_response("Failed to load quiz", e))?;
    let questions = state
        .questions
        .get_questions_for_quiz(quiz_id)
        .await
        .map_err(|e| port_error_response("Failed to load questions", e))?;

    let mut editor = QuizEditor::new(quiz, questions, state.questions.clone());
    let question = editor
        .add_question()
        .await
        .map_err(|e| port_error_response("Failed to create question", e))?
        .clone();

    let warnings = warning_messages(&question);
    Ok((
        StatusCode::CREATED,
        Json(QuestionResponse { question, warnings }),
    ))
}

/// Replace a quiz's full question list - the editor's explicit save action.
#[utoipa::path(
    put,
    path = "/quizzes/{quiz_id}/questions",
    request_body = SaveQuestionsRequest,
    responses(
        (status = 200, description = "Questions saved", body = SaveQuestionsResponse),
        (status = 400, description = "A question's config does not match its type"),
        (status = 403, description = "Caller cannot author content"),
        (status = 404, description = "Quiz not found"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("quiz_id" = Uuid, Path, description = "The quiz whose questions are saved.")
    )
)]
pub async fn save_questions_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(quiz_id): Path<Uuid>,
    Json(req): Json<SaveQuestionsRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    require_author(&auth)?;

    // The quiz must exist before its question list can be replaced.
    state
        .db
        .get_quiz_by_id(quiz_id)
        .await
        .map_err(|e| port_error_response("Failed to load quiz", e))?;

    if let Some(question_id) = find_mismatched_config(&req.questions) {
        return Err((
            StatusCode::BAD_REQUEST,
            format!(
                "Answer config does not match question type for question {}",
                question_id
            ),
        ));
    }

    // Positions are assigned from request order; the client's ranks are not
    // trusted to be contiguous.
    let mut questions = req.questions;
    for question in &mut questions {
        question.quiz_id = quiz_id;
    }
    renumber_questions(&mut questions);

    state
        .questions
        .save_questions(quiz_id, &questions)
        .await
        .map_err(|e| port_error_response("Failed to save questions", e))?;

    let warnings = questions
        .iter()
        .map(|q| QuestionWarnings {
            question_id: q.id,
            warnings: warning_messages(q),
        })
        .filter(|w| !w.warnings.is_empty())
        .collect();
    let total_points = questions.iter().map(|q| q.points).sum();
    Ok(Json(SaveQuestionsResponse {
        questions,
        warnings,
        total_points,
    }))
}

/// Delete one question and close the position gap it leaves.
#[utoipa::path(
    delete,
    path = "/quizzes/{quiz_id}/questions/{question_id}",
    responses(
        (status = 204, description = "Question deleted"),
        (status = 403, description = "Caller cannot author content"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("quiz_id" = Uuid, Path, description = "The owning quiz."),
        ("question_id" = Uuid, Path, description = "The question to delete.")
    )
)]
pub async fn delete_question_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path((quiz_id, question_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    require_author(&auth)?;

    state
        .questions
        .delete_question(question_id)
        .await
        .map_err(|e| port_error_response("Failed to delete question", e))?;

    // Renumber the remaining questions so positions stay contiguous from zero.
    let mut remaining = state
        .questions
        .get_questions_for_quiz(quiz_id)
        .await
        .map_err(|e| port_error_response("Failed to load questions", e))?;
    renumber_questions(&mut remaining);
    state
        .questions
        .save_questions(quiz_id, &remaining)
        .await
        .map_err(|e| port_error_response("Failed to renumber questions", e))?;

    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// Course Handlers
//=========================================================================================

/// List the course catalog. Students only see published courses; authoring
/// roles also see drafts.
#[utoipa::path(
    get,
    path = "/courses",
    responses(
        (status = 200, description = "The visible courses", body = CoursesResponse),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_courses_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let courses = state
        .db
        .list_courses(auth.role.can_author_content())
        .await
        .map_err(|e| port_error_response("Failed to list courses", e))?;
    Ok(Json(CoursesResponse { courses }))
}

/// Create a new course owned by the caller.
#[utoipa::path(
    post,
    path = "/courses",
    request_body = CreateCourseRequest,
    responses(
        (status = 201, description = "Course created", body = CourseResponse),
        (status = 403, description = "Caller cannot author content"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_course_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<CreateCourseRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    require_author(&auth)?;
    let course = state
        .db
        .create_course(auth.user_id, &req.title, req.description.as_deref())
        .await
        .map_err(|e| port_error_response("Failed to create course", e))?;
    Ok((StatusCode::CREATED, Json(CourseResponse { course })))
}

/// Enroll the calling student in a course.
#[utoipa::path(
    post,
    path = "/courses/{course_id}/enroll",
    responses(
        (status = 201, description = "Enrollment created", body = EnrollmentResponse),
        (status = 403, description = "Only students enroll in courses"),
        (status = 404, description = "Course not found"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("course_id" = Uuid, Path, description = "The course to enroll in.")
    )
)]
pub async fn enroll_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(course_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if auth.role != UserRole::Student {
        return Err((
            StatusCode::FORBIDDEN,
            "Only students enroll in courses".to_string(),
        ));
    }

    let course = state
        .db
        .get_course_by_id(course_id)
        .await
        .map_err(|e| port_error_response("Failed to load course", e))?;
    if !course.is_published {
        return Err((
            StatusCode::NOT_FOUND,
            format!("Course {} not found", course_id),
        ));
    }

    let enrollment = state
        .db
        .create_enrollment(auth.user_id, course_id)
        .await
        .map_err(|e| port_error_response("Failed to enroll", e))?;
    Ok((StatusCode::CREATED, Json(EnrollmentResponse { enrollment })))
}

//=========================================================================================
// Lesson Handlers
//=========================================================================================

/// Create a new lesson under a course.
#[utoipa::path(
    post,
    path = "/courses/{course_id}/lessons",
    request_body = CreateLessonRequest,
    responses(
        (status = 201, description = "Lesson created", body = LessonResponse),
        (status = 403, description = "Caller cannot author content"),
        (status = 404, description = "Course not found"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("course_id" = Uuid, Path, description = "The owning course.")
    )
)]
pub async fn create_lesson_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(course_id): Path<Uuid>,
    Json(req): Json<CreateLessonRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    require_author(&auth)?;

    state
        .db
        .get_course_by_id(course_id)
        .await
        .map_err(|e| port_error_response("Failed to load course", e))?;

    let lesson = state
        .db
        .create_lesson(course_id, &req.title, req.position)
        .await
        .map_err(|e| port_error_response("Failed to create lesson", e))?;
    Ok((StatusCode::CREATED, Json(LessonResponse { lesson })))
}

/// Fetch one lesson with its content blocks.
#[utoipa::path(
    get,
    path = "/lessons/{lesson_id}",
    responses(
        (status = 200, description = "The lesson", body = LessonResponse),
        (status = 404, description = "Lesson not found"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("lesson_id" = Uuid, Path, description = "The lesson to fetch.")
    )
)]
pub async fn get_lesson_handler(
    State(state): State<Arc<AppState>>,
    Path(lesson_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let lesson = state
        .db
        .get_lesson_by_id(lesson_id)
        .await
        .map_err(|e| port_error_response("Failed to load lesson", e))?;
    Ok(Json(LessonResponse { lesson }))
}

/// Replace a lesson's content-block sequence - the block editor's save action.
#[utoipa::path(
    put,
    path = "/lessons/{lesson_id}/content",
    request_body = SaveLessonContentRequest,
    responses(
        (status = 200, description = "Content saved", body = LessonResponse),
        (status = 403, description = "Caller cannot author content"),
        (status = 404, description = "Lesson not found"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("lesson_id" = Uuid, Path, description = "The lesson to update.")
    )
)]
pub async fn save_lesson_content_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(lesson_id): Path<Uuid>,
    Json(req): Json<SaveLessonContentRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    require_author(&auth)?;

    // Normalize through the block store so stored ranks are contiguous.
    let store = ContentBlockStore::from_blocks(req.content);
    let content = store.into_blocks();
    state
        .db
        .save_lesson_content(lesson_id, &content)
        .await
        .map_err(|e| port_error_response("Failed to save lesson content", e))?;

    let lesson = state
        .db
        .get_lesson_by_id(lesson_id)
        .await
        .map_err(|e| port_error_response("Failed to load lesson", e))?;
    Ok(Json(LessonResponse { lesson }))
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use nexskill_core::answer::{AnswerConfig, QuestionType};

    fn question(question_type: QuestionType, config: AnswerConfig) -> QuizQuestion {
        QuizQuestion {
            id: Uuid::from_u128(1),
            quiz_id: Uuid::from_u128(2),
            position: 0,
            question_type,
            question_content: Vec::new(),
            points: 1.0,
            requires_manual_grading: false,
            answer_config: config,
        }
    }

    #[test]
    fn matching_config_passes_validation() {
        let questions = vec![question(
            QuestionType::Essay,
            AnswerConfig::default_for(QuestionType::Essay),
        )];
        assert_eq!(find_mismatched_config(&questions), None);
    }

    #[test]
    fn mismatched_config_is_flagged_by_id() {
        let questions = vec![question(
            QuestionType::Essay,
            AnswerConfig::default_for(QuestionType::TrueFalse),
        )];
        assert_eq!(find_mismatched_config(&questions), Some(Uuid::from_u128(1)));
    }

    #[test]
    fn warning_messages_surface_config_warnings() {
        let q = question(
            QuestionType::ShortAnswer,
            AnswerConfig::default_for(QuestionType::ShortAnswer),
        );
        let messages = warning_messages(&q);
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("manual grading"));
    }
}
