pub mod answer;
pub mod blocks;
pub mod domain;
pub mod editor;
pub mod ports;

pub use answer::{
    AnswerConfig, ChoiceOption, ConfigWarning, EssayConfig, FileUploadConfig,
    MultipleChoiceConfig, QuestionType, ShortAnswerConfig, TrueFalseConfig,
    VideoSubmissionConfig,
};
pub use blocks::{ContentBlockStore, MoveDirection};
pub use domain::{
    AuthSession, BlockType, ContentBlock, Course, Enrollment, Lesson, MediaMetadata,
    QuestionDraft, Quiz, QuizQuestion, User, UserCredentials, UserRole,
};
pub use editor::{parse_points_input, QuestionEditor, QuestionUpdate, QuizEditor};
pub use ports::{DatabaseService, PortError, PortResult, QuestionRepository};
