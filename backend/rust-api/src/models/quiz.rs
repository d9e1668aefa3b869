use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use super::user::bson_datetime_as_chrono;

/// A single multiple-choice question.
///
/// `correct_answer_text` always equals one of `options`; questions that
/// fail that invariant never survive parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub question_text: String,
    pub options: Vec<String>,
    pub answer_letter: String,
    pub correct_answer_text: String,
}

/// A named, ordered collection of questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    pub title: String,
    pub questions: Vec<Question>,
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("quiz text must start with a 'Title:' line")]
    MissingTitle,
    #[error("no valid questions found in quiz text")]
    NoValidQuestions,
}

impl Quiz {
    /// Parses the plain-text quiz format:
    ///
    /// ```text
    /// Title: Capitals
    /// ---
    /// What is the capital of France?
    /// A. Lyon
    /// B. Paris
    /// answer: B
    /// ```
    ///
    /// Segments are split on a literal `---` (the format supports no
    /// escaping, so a `---` inside a question body splits it). Segments
    /// that do not form a valid question are dropped silently; the parse
    /// as a whole fails only when the title is missing or no question
    /// survives.
    pub fn parse(text: &str) -> Result<Quiz, ParseError> {
        let mut segments = text.split("---").map(str::trim).filter(|s| !s.is_empty());

        let header = segments.next().ok_or(ParseError::MissingTitle)?;
        let title = header
            .lines()
            .next()
            .unwrap_or_default()
            .trim()
            .strip_prefix("Title:")
            .ok_or(ParseError::MissingTitle)?
            .trim()
            .to_string();

        let questions: Vec<Question> = segments.filter_map(parse_question).collect();

        if questions.is_empty() {
            return Err(ParseError::NoValidQuestions);
        }

        Ok(Quiz { title, questions })
    }
}

/// Parses one `---`-delimited segment; `None` drops the segment.
fn parse_question(segment: &str) -> Option<Question> {
    let lines: Vec<&str> = segment
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    // Minimum shape: question, at least one option, answer line.
    if lines.len() < 3 {
        return None;
    }

    let question_text = lines[0].to_string();
    let answer_letter = strip_answer_label(lines[lines.len() - 1])?
        .trim()
        .to_uppercase();

    let options: Vec<String> = lines[1..lines.len() - 1]
        .iter()
        .map(|l| l.to_string())
        .collect();

    // The letter resolves to the first option whose text starts with it.
    let correct_answer_text = options
        .iter()
        .find(|opt| opt.trim().to_uppercase().starts_with(&answer_letter))?
        .clone();

    Some(Question {
        question_text,
        options,
        answer_letter,
        correct_answer_text,
    })
}

/// Strips a case-insensitive `answer:` label, `None` if absent.
fn strip_answer_label(line: &str) -> Option<&str> {
    const LABEL: &str = "answer:";
    let head = line.get(..LABEL.len())?;
    if head.eq_ignore_ascii_case(LABEL) {
        line.get(LABEL.len()..)
    } else {
        None
    }
}

/// Quiz record stored in the MongoDB "quizzes" collection, scoped to the
/// user who uploaded it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    pub questions: Vec<Question>,
    #[serde(rename = "ownerId")]
    pub owner_id: ObjectId,
    #[serde(rename = "createdAt", with = "bson_datetime_as_chrono")]
    pub created_at: DateTime<Utc>,
}

impl QuizDocument {
    pub fn into_quiz(self) -> Quiz {
        Quiz {
            title: self.title,
            questions: self.questions,
        }
    }
}

/// Request to upload a quiz text file
#[derive(Debug, Deserialize)]
pub struct UploadQuizRequest {
    pub text: String,
}

/// Summary row for the quiz listing
#[derive(Debug, Serialize)]
pub struct QuizSummary {
    pub id: String,
    pub title: String,
    pub question_count: usize,
    pub created_at: DateTime<Utc>,
}

/// Full quiz returned to its owner
#[derive(Debug, Serialize)]
pub struct QuizDetail {
    pub id: String,
    pub title: String,
    pub questions: Vec<Question>,
    pub created_at: DateTime<Utc>,
}

impl From<QuizDocument> for QuizDetail {
    fn from(doc: QuizDocument) -> Self {
        QuizDetail {
            id: doc.id.map(|id| id.to_hex()).unwrap_or_default(),
            title: doc.title,
            questions: doc.questions,
            created_at: doc.created_at,
        }
    }
}
