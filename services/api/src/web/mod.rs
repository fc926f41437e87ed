pub mod auth;
pub mod middleware;
pub mod rest;
pub mod state;

// Re-export the handlers the binary needs to build the web server router.
pub use middleware::require_auth;
pub use rest::{
    create_course_handler, create_lesson_handler, create_question_handler, create_quiz_handler,
    delete_question_handler, enroll_handler, get_lesson_handler, get_quiz_handler,
    list_courses_handler, publish_quiz_handler, save_lesson_content_handler,
    save_questions_handler, update_quiz_handler,
};
