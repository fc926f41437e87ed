//! crates/nexskill_core/src/editor.rs
//!
//! The question and quiz editors. A `QuestionEditor` wraps one question and
//! delegates body editing to a `ContentBlockStore`; a `QuizEditor` owns the
//! ordered question list of one quiz and the single remote boundary of the
//! core, question creation.

use std::sync::Arc;

use tracing::error;
use uuid::Uuid;

use crate::answer::{AnswerConfig, ConfigWarning, QuestionType};
use crate::blocks::{ContentBlockStore, MoveDirection};
use crate::domain::{ContentBlock, QuestionDraft, Quiz, QuizQuestion};
use crate::ports::{PortResult, QuestionRepository};

//=========================================================================================
// Points Input
//=========================================================================================

/// Parses a raw points entry. Anything unparseable falls back to one point;
/// range validation beyond the 0.5 step is the persistence layer's concern.
pub fn parse_points_input(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|points| points.is_finite())
        .unwrap_or(1.0)
}

//=========================================================================================
// QuestionEditor
//=========================================================================================

/// Edits a single question: its body blocks, its answer configuration and its
/// question-level metadata. Ordering and removal belong to the owning
/// `QuizEditor`; this editor is stateless with respect to both.
#[derive(Debug)]
pub struct QuestionEditor {
    id: Uuid,
    quiz_id: Uuid,
    position: usize,
    question_type: QuestionType,
    points: f64,
    requires_manual_grading: bool,
    answer_config: AnswerConfig,
    content: ContentBlockStore,
}

impl QuestionEditor {
    pub fn from_question(question: QuizQuestion) -> Self {
        Self {
            id: question.id,
            quiz_id: question.quiz_id,
            position: question.position,
            question_type: question.question_type,
            points: question.points,
            requires_manual_grading: question.requires_manual_grading,
            answer_config: question.answer_config,
            content: ContentBlockStore::from_blocks(question.question_content),
        }
    }

    /// A full snapshot of the question in its current state.
    pub fn question(&self) -> QuizQuestion {
        QuizQuestion {
            id: self.id,
            quiz_id: self.quiz_id,
            position: self.position,
            question_type: self.question_type,
            question_content: self.content.blocks().to_vec(),
            points: self.points,
            requires_manual_grading: self.requires_manual_grading,
            answer_config: self.answer_config.clone(),
        }
    }

    pub fn into_question(self) -> QuizQuestion {
        QuizQuestion {
            id: self.id,
            quiz_id: self.quiz_id,
            position: self.position,
            question_type: self.question_type,
            question_content: self.content.into_blocks(),
            points: self.points,
            requires_manual_grading: self.requires_manual_grading,
            answer_config: self.answer_config,
        }
    }

    pub fn question_type(&self) -> QuestionType {
        self.question_type
    }

    /// Switches the question to a new type. The previous answer configuration
    /// is discarded and the new type's default installed; this transition is
    /// intentionally data-losing, configs are never migrated across types.
    pub fn set_question_type(&mut self, question_type: QuestionType) {
        if self.question_type == question_type {
            return;
        }
        self.question_type = question_type;
        self.answer_config = AnswerConfig::default_for(question_type);
    }

    pub fn points(&self) -> f64 {
        self.points
    }

    /// Commits a raw points entry, coercing unparseable input to one point.
    pub fn set_points_input(&mut self, raw: &str) {
        self.points = parse_points_input(raw);
    }

    pub fn set_requires_manual_grading(&mut self, requires_manual_grading: bool) {
        self.requires_manual_grading = requires_manual_grading;
    }

    /// The block store holding the question body.
    pub fn content(&mut self) -> &mut ContentBlockStore {
        &mut self.content
    }

    pub fn content_blocks(&self) -> &[ContentBlock] {
        self.content.blocks()
    }

    /// The current answer configuration, for the type-specific editing
    /// surface selected by `question_type`.
    pub fn answer_config(&self) -> &AnswerConfig {
        &self.answer_config
    }

    pub fn answer_config_mut(&mut self) -> &mut AnswerConfig {
        &mut self.answer_config
    }

    pub fn warnings(&self) -> Vec<ConfigWarning> {
        self.answer_config.warnings()
    }
}

//=========================================================================================
// Question Patches
//=========================================================================================

/// A partial update applied locally to one question. Absent fields are left
/// untouched. A type change resets the answer config to the new type's
/// default; an explicit config in the same patch only applies when its tag
/// matches the question's resulting type.
#[derive(Debug, Default, Clone)]
pub struct QuestionUpdate {
    pub question_type: Option<QuestionType>,
    pub question_content: Option<Vec<ContentBlock>>,
    pub points: Option<f64>,
    pub requires_manual_grading: Option<bool>,
    pub answer_config: Option<AnswerConfig>,
}

//=========================================================================================
// QuizEditor
//=========================================================================================

/// Owns the ordered question list for one quiz.
///
/// Question creation is pessimistic: the draft goes to the persistence
/// collaborator first and only the returned record is appended. Every other
/// edit is local; persisting them is the host's explicit save action.
pub struct QuizEditor {
    quiz: Quiz,
    questions: Vec<QuizQuestion>,
    repository: Arc<dyn QuestionRepository>,
    preview: bool,
}

impl QuizEditor {
    pub fn new(
        quiz: Quiz,
        mut questions: Vec<QuizQuestion>,
        repository: Arc<dyn QuestionRepository>,
    ) -> Self {
        questions.sort_by_key(|q| q.position);
        renumber_questions(&mut questions);
        Self {
            quiz,
            questions,
            repository,
            preview: false,
        }
    }

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    /// Creates a new default question through the persistence collaborator
    /// and appends the stored record. On failure nothing is appended and no
    /// local placeholder is created; the attempt is logged and abandoned.
    pub async fn add_question(&mut self) -> PortResult<&QuizQuestion> {
        let draft = QuestionDraft::new_default(self.quiz.id, self.questions.len());
        match self.repository.create_question(draft).await {
            Ok(question) => {
                self.questions.push(question);
                Ok(&self.questions[self.questions.len() - 1])
            }
            Err(e) => {
                error!("Failed to create question for quiz {}: {:?}", self.quiz.id, e);
                Err(e)
            }
        }
    }

    /// Applies a local partial update to one question. Returns false for an
    /// unknown id. No remote call is made here.
    pub fn update_question(&mut self, question_id: Uuid, update: QuestionUpdate) -> bool {
        let Some(question) = self.questions.iter_mut().find(|q| q.id == question_id) else {
            return false;
        };
        if let Some(question_type) = update.question_type {
            if question.question_type != question_type {
                question.question_type = question_type;
                question.answer_config = AnswerConfig::default_for(question_type);
            }
        }
        if let Some(content) = update.question_content {
            question.question_content = content;
        }
        if let Some(points) = update.points {
            question.points = points;
        }
        if let Some(requires_manual_grading) = update.requires_manual_grading {
            question.requires_manual_grading = requires_manual_grading;
        }
        if let Some(answer_config) = update.answer_config {
            if answer_config.question_type() == question.question_type {
                question.answer_config = answer_config;
            }
        }
        true
    }

    /// Runs a `QuestionEditor` session over one question and writes the
    /// resulting snapshot back in place. Ordering stays owned by this editor:
    /// the question keeps its list rank regardless of what the session did.
    pub fn edit_question<F>(&mut self, question_id: Uuid, edit: F) -> bool
    where
        F: FnOnce(&mut QuestionEditor),
    {
        let Some(index) = self.questions.iter().position(|q| q.id == question_id) else {
            return false;
        };
        let mut editor = QuestionEditor::from_question(self.questions[index].clone());
        edit(&mut editor);
        let mut updated = editor.into_question();
        updated.position = index;
        self.questions[index] = updated;
        true
    }

    /// Removes a question and renumbers the remainder contiguously from zero.
    pub fn remove_question(&mut self, question_id: Uuid) {
        self.questions.retain(|q| q.id != question_id);
        renumber_questions(&mut self.questions);
    }

    /// Swaps a question with its adjacent neighbor; a no-op at either
    /// boundary. The content-block move pattern, one level up.
    pub fn move_question(&mut self, question_id: Uuid, direction: MoveDirection) {
        let Some(index) = self.questions.iter().position(|q| q.id == question_id) else {
            return;
        };
        let target = match direction {
            MoveDirection::Up if index > 0 => index - 1,
            MoveDirection::Down if index + 1 < self.questions.len() => index + 1,
            _ => return,
        };
        self.questions.swap(index, target);
        renumber_questions(&mut self.questions);
    }

    /// Read-only preview toggle. Entering and leaving preview touches no
    /// question or quiz state.
    pub fn set_preview(&mut self, preview: bool) {
        self.preview = preview;
    }

    pub fn preview(&self) -> bool {
        self.preview
    }

    /// The displayed points total. Derived from the current list on every
    /// call and never stored.
    pub fn total_points(&self) -> f64 {
        self.questions.iter().map(|q| q.points).sum()
    }
}

/// Reassigns contiguous zero-based positions in current list order.
pub fn renumber_questions(questions: &mut [QuizQuestion]) {
    for (index, question) in questions.iter_mut().enumerate() {
        question.position = index;
    }
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answer::{AnswerConfig, QuestionType};
    use crate::domain::BlockType;
    use crate::ports::{PortError, QuestionRepository};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// In-memory stand-in for the persistence collaborator. Assigns
    /// deterministic ids so scenarios can assert on them.
    struct StubRepository {
        fail_creates: bool,
        created: AtomicU32,
    }

    impl StubRepository {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                fail_creates: false,
                created: AtomicU32::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                fail_creates: true,
                created: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl QuestionRepository for StubRepository {
        async fn create_question(&self, draft: QuestionDraft) -> PortResult<QuizQuestion> {
            if self.fail_creates {
                return Err(PortError::Unexpected("connection reset".to_string()));
            }
            let n = self.created.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(QuizQuestion {
                id: Uuid::from_u128(n as u128),
                quiz_id: draft.quiz_id,
                position: draft.position,
                question_type: draft.question_type,
                question_content: draft.question_content,
                points: draft.points,
                requires_manual_grading: draft.requires_manual_grading,
                answer_config: draft.answer_config,
            })
        }

        async fn save_questions(
            &self,
            _quiz_id: Uuid,
            _questions: &[QuizQuestion],
        ) -> PortResult<()> {
            Ok(())
        }

        async fn get_questions_for_quiz(&self, _quiz_id: Uuid) -> PortResult<Vec<QuizQuestion>> {
            Ok(Vec::new())
        }

        async fn delete_question(&self, _question_id: Uuid) -> PortResult<()> {
            Ok(())
        }
    }

    fn empty_quiz() -> Quiz {
        Quiz {
            id: Uuid::from_u128(99),
            course_id: Uuid::from_u128(7),
            title: "Module check".to_string(),
            description: None,
            instructions: None,
            passing_score: None,
            time_limit_minutes: None,
            max_attempts: None,
            late_penalty_percent: 0.0,
            late_submission_allowed: false,
            available_from: None,
            due_date: None,
            requires_manual_grading: false,
            is_published: false,
        }
    }

    fn editor_with_questions(count: usize) -> QuizEditor {
        let quiz = empty_quiz();
        let questions = (0..count)
            .map(|index| QuizQuestion {
                id: Uuid::from_u128(1000 + index as u128),
                quiz_id: quiz.id,
                position: index,
                question_type: QuestionType::MultipleChoice,
                question_content: Vec::new(),
                points: 1.0,
                requires_manual_grading: false,
                answer_config: AnswerConfig::default_for(QuestionType::MultipleChoice),
            })
            .collect();
        QuizEditor::new(quiz, questions, StubRepository::new())
    }

    #[tokio::test]
    async fn add_move_remove_scenario() {
        let mut editor = QuizEditor::new(empty_quiz(), Vec::new(), StubRepository::new());

        let created_id = editor
            .add_question()
            .await
            .expect("creation should succeed")
            .id;
        assert_eq!(editor.questions().len(), 1);
        let question = &editor.questions()[0];
        assert_eq!(question.id, created_id);
        assert_eq!(question.position, 0);
        assert_eq!(question.question_type, QuestionType::MultipleChoice);
        assert_eq!(question.points, 1.0);
        let AnswerConfig::MultipleChoice(config) = &question.answer_config else {
            panic!("new questions default to multiple choice");
        };
        assert_eq!(config.options.len(), 2);
        assert!(!config.allow_multiple);
        assert!(!config.randomize_options);

        // Boundary move leaves the list untouched.
        let before = editor.questions().to_vec();
        editor.move_question(created_id, MoveDirection::Up);
        assert_eq!(editor.questions(), before.as_slice());

        editor.remove_question(created_id);
        assert!(editor.questions().is_empty());
    }

    #[tokio::test]
    async fn failed_creation_appends_nothing() {
        let mut editor = QuizEditor::new(empty_quiz(), Vec::new(), StubRepository::failing());
        let result = editor.add_question().await;
        assert!(result.is_err());
        assert!(editor.questions().is_empty());
    }

    #[test]
    fn question_positions_stay_contiguous() {
        let mut editor = editor_with_questions(4);
        let second = editor.questions()[1].id;
        editor.remove_question(second);
        let positions: Vec<usize> = editor.questions().iter().map(|q| q.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);

        let last = editor.questions()[2].id;
        editor.move_question(last, MoveDirection::Up);
        let positions: Vec<usize> = editor.questions().iter().map(|q| q.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn type_change_resets_config_to_the_default() {
        let mut editor = editor_with_questions(1);
        let id = editor.questions()[0].id;

        editor.update_question(
            id,
            QuestionUpdate {
                question_type: Some(QuestionType::Essay),
                ..Default::default()
            },
        );
        editor.edit_question(id, |question| {
            let AnswerConfig::Essay(config) = question.answer_config_mut() else {
                panic!("config should follow the type");
            };
            config.rubric = Some("Clarity and sources".to_string());
        });

        editor.update_question(
            id,
            QuestionUpdate {
                question_type: Some(QuestionType::TrueFalse),
                ..Default::default()
            },
        );
        assert_eq!(
            editor.questions()[0].answer_config,
            AnswerConfig::TrueFalse(crate::answer::TrueFalseConfig {
                correct_answer: true
            })
        );
    }

    #[test]
    fn patch_config_with_mismatched_tag_is_ignored() {
        let mut editor = editor_with_questions(1);
        let id = editor.questions()[0].id;
        let applied = editor.update_question(
            id,
            QuestionUpdate {
                answer_config: Some(AnswerConfig::default_for(QuestionType::Essay)),
                ..Default::default()
            },
        );
        assert!(applied);
        assert_eq!(
            editor.questions()[0].question_type,
            QuestionType::MultipleChoice
        );
        assert!(matches!(
            editor.questions()[0].answer_config,
            AnswerConfig::MultipleChoice(_)
        ));
    }

    #[test]
    fn points_input_coercion() {
        assert_eq!(parse_points_input("2.5"), 2.5);
        assert_eq!(parse_points_input("  3 "), 3.0);
        assert_eq!(parse_points_input("abc"), 1.0);
        assert_eq!(parse_points_input(""), 1.0);
        assert_eq!(parse_points_input("NaN"), 1.0);
    }

    #[test]
    fn total_points_is_derived_from_the_list() {
        let mut editor = editor_with_questions(3);
        assert_eq!(editor.total_points(), 3.0);

        let first = editor.questions()[0].id;
        editor.update_question(
            first,
            QuestionUpdate {
                points: Some(2.5),
                ..Default::default()
            },
        );
        assert_eq!(editor.total_points(), 4.5);

        editor.remove_question(first);
        assert_eq!(editor.total_points(), 2.0);
    }

    #[test]
    fn preview_toggle_preserves_state() {
        let mut editor = editor_with_questions(2);
        editor.edit_question(editor.questions()[0].id, |question| {
            question.content().add_block(BlockType::Heading);
            question.set_points_input("2");
        });
        let before = editor.questions().to_vec();

        editor.set_preview(true);
        assert!(editor.preview());
        editor.set_preview(false);
        assert_eq!(editor.questions(), before.as_slice());
    }

    #[test]
    fn question_editor_session_keeps_list_rank() {
        let mut editor = editor_with_questions(2);
        let second = editor.questions()[1].id;
        editor.edit_question(second, |question| {
            question.set_question_type(QuestionType::ShortAnswer);
            question.content().add_block(BlockType::Text);
        });
        assert_eq!(editor.questions()[1].id, second);
        assert_eq!(editor.questions()[1].position, 1);
        assert_eq!(
            editor.questions()[1].question_type,
            QuestionType::ShortAnswer
        );
        assert_eq!(editor.questions()[1].question_content.len(), 1);
    }
}
