//! crates/nexskill_core/src/answer.rs
//!
//! The grading-relevant configuration attached to a quiz question. The shape
//! is a closed tagged union keyed by the question type; each variant carries
//! its own editing surface and default-construction rule.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

//=========================================================================================
// Question Types
//=========================================================================================

/// The six supported question kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
    Essay,
    FileUpload,
    VideoSubmission,
}

impl QuestionType {
    /// The stable snake_case name used in storage and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "multiple_choice",
            QuestionType::TrueFalse => "true_false",
            QuestionType::ShortAnswer => "short_answer",
            QuestionType::Essay => "essay",
            QuestionType::FileUpload => "file_upload",
            QuestionType::VideoSubmission => "video_submission",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "multiple_choice" => Some(QuestionType::MultipleChoice),
            "true_false" => Some(QuestionType::TrueFalse),
            "short_answer" => Some(QuestionType::ShortAnswer),
            "essay" => Some(QuestionType::Essay),
            "file_upload" => Some(QuestionType::FileUpload),
            "video_submission" => Some(QuestionType::VideoSubmission),
            _ => None,
        }
    }

    /// Whether answers of this kind can never be auto-graded.
    pub fn is_manually_graded(&self) -> bool {
        matches!(
            self,
            QuestionType::Essay | QuestionType::FileUpload | QuestionType::VideoSubmission
        )
    }
}

//=========================================================================================
// The Tagged Union
//=========================================================================================

/// Per-type answer configuration. Stored as a self-describing JSON document;
/// the `type` tag always matches the owning question's `question_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnswerConfig {
    MultipleChoice(MultipleChoiceConfig),
    TrueFalse(TrueFalseConfig),
    ShortAnswer(ShortAnswerConfig),
    Essay(EssayConfig),
    FileUpload(FileUploadConfig),
    VideoSubmission(VideoSubmissionConfig),
}

impl AnswerConfig {
    /// The default configuration installed whenever a question takes on the
    /// given type. Deterministic except for fresh option ids.
    pub fn default_for(question_type: QuestionType) -> Self {
        match question_type {
            QuestionType::MultipleChoice => AnswerConfig::MultipleChoice(MultipleChoiceConfig {
                options: vec![ChoiceOption::empty(), ChoiceOption::empty()],
                allow_multiple: false,
                randomize_options: false,
            }),
            QuestionType::TrueFalse => AnswerConfig::TrueFalse(TrueFalseConfig {
                correct_answer: true,
            }),
            QuestionType::ShortAnswer => AnswerConfig::ShortAnswer(ShortAnswerConfig {
                max_length: 500,
                accepted_answers: Vec::new(),
                case_sensitive: false,
            }),
            QuestionType::Essay => AnswerConfig::Essay(EssayConfig {
                min_words: None,
                max_words: None,
                rubric: None,
            }),
            QuestionType::FileUpload => AnswerConfig::FileUpload(FileUploadConfig {
                accepted_file_types: vec!["pdf".to_string()],
                max_file_size_mb: 10.0,
                max_files: 1,
                instructions: None,
            }),
            QuestionType::VideoSubmission => {
                AnswerConfig::VideoSubmission(VideoSubmissionConfig {
                    accepted_formats: vec!["mp4".to_string()],
                    max_duration_minutes: None,
                    max_file_size_mb: 100.0,
                    instructions: None,
                })
            }
        }
    }

    /// The question type this configuration belongs to.
    pub fn question_type(&self) -> QuestionType {
        match self {
            AnswerConfig::MultipleChoice(_) => QuestionType::MultipleChoice,
            AnswerConfig::TrueFalse(_) => QuestionType::TrueFalse,
            AnswerConfig::ShortAnswer(_) => QuestionType::ShortAnswer,
            AnswerConfig::Essay(_) => QuestionType::Essay,
            AnswerConfig::FileUpload(_) => QuestionType::FileUpload,
            AnswerConfig::VideoSubmission(_) => QuestionType::VideoSubmission,
        }
    }

    /// Non-blocking authoring warnings for the current state. Derived on
    /// read; never stored, never prevents a mutation from applying.
    pub fn warnings(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        match self {
            AnswerConfig::MultipleChoice(config) => {
                if !config.options.iter().any(|o| o.is_correct) {
                    warnings.push(ConfigWarning::NoCorrectOption);
                }
            }
            AnswerConfig::TrueFalse(_) => {}
            AnswerConfig::ShortAnswer(config) => {
                if config.accepted_answers.is_empty() {
                    warnings.push(ConfigWarning::NoAcceptedAnswers);
                }
            }
            AnswerConfig::Essay(_) => warnings.push(ConfigWarning::ManualGradingRequired),
            AnswerConfig::FileUpload(config) => {
                warnings.push(ConfigWarning::ManualGradingRequired);
                if config.accepted_file_types.is_empty() {
                    warnings.push(ConfigWarning::NoFileTypesSelected);
                }
            }
            AnswerConfig::VideoSubmission(config) => {
                warnings.push(ConfigWarning::ManualGradingRequired);
                if config.accepted_formats.is_empty() {
                    warnings.push(ConfigWarning::NoFormatsSelected);
                }
            }
        }
        warnings
    }
}

/// Authoring warnings surfaced next to the config editors. Informational
/// only; the underlying state mutation has already applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigWarning {
    NoCorrectOption,
    NoAcceptedAnswers,
    NoFileTypesSelected,
    NoFormatsSelected,
    ManualGradingRequired,
}

impl ConfigWarning {
    pub fn message(&self) -> &'static str {
        match self {
            ConfigWarning::NoCorrectOption => "No option is marked as correct",
            ConfigWarning::NoAcceptedAnswers => {
                "No accepted answers defined; responses will require manual grading"
            }
            ConfigWarning::NoFileTypesSelected => "No accepted file types selected",
            ConfigWarning::NoFormatsSelected => "No accepted video formats selected",
            ConfigWarning::ManualGradingRequired => {
                "Responses to this question type are graded manually"
            }
        }
    }
}

//=========================================================================================
// Multiple Choice
//=========================================================================================

/// One selectable option of a multiple-choice question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub id: String,
    pub text: String,
    pub is_correct: bool,
}

impl ChoiceOption {
    /// A fresh, blank, non-correct option. Ids only need to be unique within
    /// an editing session.
    pub fn empty() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: String::new(),
            is_correct: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultipleChoiceConfig {
    pub options: Vec<ChoiceOption>,
    pub allow_multiple: bool,
    pub randomize_options: bool,
}

impl MultipleChoiceConfig {
    /// Appends a blank option.
    pub fn add_option(&mut self) {
        self.options.push(ChoiceOption::empty());
    }

    /// Removes an option. Silent no-op when the list would drop below the
    /// two-option minimum, or when the id is unknown.
    pub fn remove_option(&mut self, option_id: &str) {
        if self.options.len() <= 2 {
            return;
        }
        self.options.retain(|o| o.id != option_id);
    }

    /// Replaces an option's display text.
    pub fn set_option_text(&mut self, option_id: &str, text: impl Into<String>) {
        if let Some(option) = self.options.iter_mut().find(|o| o.id == option_id) {
            option.text = text.into();
        }
    }

    /// Toggles correctness on one option. With `allow_multiple` this flips
    /// only the named option; otherwise radio semantics apply and every other
    /// option is cleared.
    pub fn toggle_correct(&mut self, option_id: &str) {
        if self.allow_multiple {
            if let Some(option) = self.options.iter_mut().find(|o| o.id == option_id) {
                option.is_correct = !option.is_correct;
            }
        } else {
            if !self.options.iter().any(|o| o.id == option_id) {
                return;
            }
            for option in &mut self.options {
                option.is_correct = option.id == option_id;
            }
        }
    }
}

//=========================================================================================
// True / False
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrueFalseConfig {
    pub correct_answer: bool,
}

//=========================================================================================
// Short Answer
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortAnswerConfig {
    pub max_length: usize,
    pub accepted_answers: Vec<String>,
    pub case_sensitive: bool,
}

impl ShortAnswerConfig {
    pub fn add_accepted_answer(&mut self, answer: impl Into<String>) {
        self.accepted_answers.push(answer.into());
    }

    /// Edits an accepted answer in place; out-of-range indices are ignored.
    pub fn update_accepted_answer(&mut self, index: usize, answer: impl Into<String>) {
        if let Some(slot) = self.accepted_answers.get_mut(index) {
            *slot = answer.into();
        }
    }

    /// Removes an accepted answer; out-of-range indices are ignored. An empty
    /// list stays valid and is surfaced as a warning, not an error.
    pub fn remove_accepted_answer(&mut self, index: usize) {
        if index < self.accepted_answers.len() {
            self.accepted_answers.remove(index);
        }
    }
}

//=========================================================================================
// Essay
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EssayConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_words: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_words: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rubric: Option<String>,
}

//=========================================================================================
// File Upload
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileUploadConfig {
    pub accepted_file_types: Vec<String>,
    pub max_file_size_mb: f64,
    pub max_files: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

impl FileUploadConfig {
    /// Toggle-set membership for an accepted file type.
    pub fn toggle_file_type(&mut self, file_type: &str) {
        if let Some(index) = self.accepted_file_types.iter().position(|t| t == file_type) {
            self.accepted_file_types.remove(index);
        } else {
            self.accepted_file_types.push(file_type.to_string());
        }
    }
}

//=========================================================================================
// Video Submission
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoSubmissionConfig {
    pub accepted_formats: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_duration_minutes: Option<u32>,
    pub max_file_size_mb: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

impl VideoSubmissionConfig {
    /// Toggle-set membership for an accepted container format.
    pub fn toggle_format(&mut self, format: &str) {
        if let Some(index) = self.accepted_formats.iter().position(|f| f == format) {
            self.accepted_formats.remove(index);
        } else {
            self.accepted_formats.push(format.to_string());
        }
    }
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn three_option_config() -> MultipleChoiceConfig {
        let mut config = MultipleChoiceConfig {
            options: vec![
                ChoiceOption::empty(),
                ChoiceOption::empty(),
                ChoiceOption::empty(),
            ],
            allow_multiple: false,
            randomize_options: false,
        };
        config.options[0].is_correct = true;
        config
    }

    #[test]
    fn default_matches_declared_type() {
        let types = [
            QuestionType::MultipleChoice,
            QuestionType::TrueFalse,
            QuestionType::ShortAnswer,
            QuestionType::Essay,
            QuestionType::FileUpload,
            QuestionType::VideoSubmission,
        ];
        for question_type in types {
            assert_eq!(
                AnswerConfig::default_for(question_type).question_type(),
                question_type
            );
        }
    }

    #[test]
    fn multiple_choice_default_has_two_blank_options() {
        let AnswerConfig::MultipleChoice(config) =
            AnswerConfig::default_for(QuestionType::MultipleChoice)
        else {
            panic!("wrong variant");
        };
        assert_eq!(config.options.len(), 2);
        assert!(config.options.iter().all(|o| o.text.is_empty()));
        assert!(config.options.iter().all(|o| !o.is_correct));
        assert!(!config.allow_multiple);
        assert!(!config.randomize_options);
        assert_ne!(config.options[0].id, config.options[1].id);
    }

    #[test]
    fn remove_option_rejected_at_two_options() {
        let AnswerConfig::MultipleChoice(mut config) =
            AnswerConfig::default_for(QuestionType::MultipleChoice)
        else {
            panic!("wrong variant");
        };
        let before = config.clone();
        let first_id = config.options[0].id.clone();
        config.remove_option(&first_id);
        assert_eq!(config, before);
    }

    #[test]
    fn remove_option_works_above_minimum() {
        let mut config = three_option_config();
        let removed_id = config.options[2].id.clone();
        config.remove_option(&removed_id);
        assert_eq!(config.options.len(), 2);
        assert!(config.options.iter().all(|o| o.id != removed_id));
    }

    #[test]
    fn single_select_toggle_is_exclusive() {
        let mut config = three_option_config();
        let target = config.options[1].id.clone();
        config.toggle_correct(&target);
        let flags: Vec<bool> = config.options.iter().map(|o| o.is_correct).collect();
        assert_eq!(flags, vec![false, true, false]);
    }

    #[test]
    fn multi_select_toggle_flips_only_the_target() {
        let mut config = three_option_config();
        config.allow_multiple = true;
        let target = config.options[1].id.clone();
        config.toggle_correct(&target);
        let flags: Vec<bool> = config.options.iter().map(|o| o.is_correct).collect();
        assert_eq!(flags, vec![true, true, false]);
        config.toggle_correct(&target);
        assert!(!config.options[1].is_correct);
    }

    #[test]
    fn single_select_toggle_ignores_unknown_id() {
        let mut config = three_option_config();
        let before = config.clone();
        config.toggle_correct("not-an-option");
        assert_eq!(config, before);
    }

    #[test]
    fn no_correct_option_is_a_warning_not_an_error() {
        let config = AnswerConfig::default_for(QuestionType::MultipleChoice);
        assert_eq!(config.warnings(), vec![ConfigWarning::NoCorrectOption]);
    }

    #[test]
    fn short_answer_empty_accepted_list_warns() {
        let config = AnswerConfig::default_for(QuestionType::ShortAnswer);
        assert_eq!(config.warnings(), vec![ConfigWarning::NoAcceptedAnswers]);
    }

    #[test]
    fn manual_types_carry_the_manual_grading_notice() {
        for question_type in [
            QuestionType::Essay,
            QuestionType::FileUpload,
            QuestionType::VideoSubmission,
        ] {
            let warnings = AnswerConfig::default_for(question_type).warnings();
            assert!(warnings.contains(&ConfigWarning::ManualGradingRequired));
            assert!(question_type.is_manually_graded());
        }
    }

    #[test]
    fn file_type_toggle_is_set_membership() {
        let AnswerConfig::FileUpload(mut config) =
            AnswerConfig::default_for(QuestionType::FileUpload)
        else {
            panic!("wrong variant");
        };
        config.toggle_file_type("docx");
        assert!(config.accepted_file_types.contains(&"docx".to_string()));
        config.toggle_file_type("docx");
        assert!(!config.accepted_file_types.contains(&"docx".to_string()));
    }

    #[test]
    fn config_json_is_tagged_with_the_question_type() {
        let config = AnswerConfig::default_for(QuestionType::TrueFalse);
        let json = serde_json::to_value(&config).expect("config should serialize");
        assert_eq!(json["type"], "true_false");
        assert_eq!(json["correct_answer"], true);

        let parsed: AnswerConfig =
            serde_json::from_value(json).expect("config should deserialize");
        assert_eq!(parsed, config);
    }

    #[test]
    fn accepted_answer_edits_by_index() {
        let AnswerConfig::ShortAnswer(mut config) =
            AnswerConfig::default_for(QuestionType::ShortAnswer)
        else {
            panic!("wrong variant");
        };
        config.add_accepted_answer("Paris");
        config.add_accepted_answer("paris");
        config.update_accepted_answer(1, "PARIS");
        assert_eq!(config.accepted_answers, vec!["Paris", "PARIS"]);
        config.remove_accepted_answer(0);
        assert_eq!(config.accepted_answers, vec!["PARIS"]);
        config.remove_accepted_answer(5);
        assert_eq!(config.accepted_answers.len(), 1);
    }
}
