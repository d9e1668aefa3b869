use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::feedback::{select_feedback, FeedbackEntry};
use super::quiz::{Question, Quiz};
use crate::utils::shuffle::shuffled;

/// A session never asks more than this many questions, however large the
/// uploaded quiz is.
pub const MAX_SESSION_QUESTIONS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    NotStarted,
    InProgress,
    Completed,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("quiz has no questions")]
    EmptyQuiz,
    #[error("invalid session transition: {action} while {phase:?}")]
    InvalidTransition {
        action: &'static str,
        phase: SessionPhase,
    },
}

/// One user's attempt at a quiz subset.
///
/// The session owns a private shuffled copy of the quiz questions; the
/// stored quiz record is never mutated. Nothing outside this type touches
/// the question pointer or the recorded answers.
#[derive(Debug)]
pub struct QuizSession {
    pub id: String,
    pub owner_id: String,
    pub quiz_title: String,
    pub expires_at: DateTime<Utc>,
    questions: Vec<Question>,
    current_index: usize,
    answers: HashMap<usize, String>,
    phase: SessionPhase,
    feedback: Option<FeedbackEntry>,
}

impl QuizSession {
    pub fn new(id: String, owner_id: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            id,
            owner_id,
            quiz_title: String::new(),
            expires_at,
            questions: Vec::new(),
            current_index: 0,
            answers: HashMap::new(),
            phase: SessionPhase::NotStarted,
            feedback: None,
        }
    }

    /// Copies the quiz questions, shuffles them, and keeps at most
    /// [`MAX_SESSION_QUESTIONS`]. Starting an already-started session or
    /// a quiz with no questions is a caller error.
    pub fn start(&mut self, quiz: &Quiz) -> Result<(), SessionError> {
        if self.phase != SessionPhase::NotStarted {
            return Err(SessionError::InvalidTransition {
                action: "start",
                phase: self.phase,
            });
        }
        if quiz.questions.is_empty() {
            return Err(SessionError::EmptyQuiz);
        }

        let mut questions = shuffled(&quiz.questions);
        questions.truncate(MAX_SESSION_QUESTIONS);

        self.quiz_title = quiz.title.clone();
        self.questions = questions;
        self.current_index = 0;
        self.answers.clear();
        self.feedback = None;
        self.phase = SessionPhase::InProgress;
        Ok(())
    }

    /// The question under the pointer, with its options re-shuffled on
    /// every call (the order is presentation state, never cached).
    pub fn current_question(&self) -> Result<QuestionPresentation, SessionError> {
        self.require_in_progress("present")?;

        let question = &self.questions[self.current_index];
        Ok(QuestionPresentation {
            index: self.current_index,
            total: self.questions.len(),
            question_text: question.question_text.clone(),
            options: shuffled(&question.options),
        })
    }

    /// Records the chosen option text for the current question and reports
    /// whether it matches. The caller is expected to advance afterwards.
    pub fn submit_answer(&mut self, option_text: &str) -> Result<AnswerOutcome, SessionError> {
        self.require_in_progress("submit_answer")?;

        self.answers
            .insert(self.current_index, option_text.to_string());

        let question = &self.questions[self.current_index];
        Ok(AnswerOutcome {
            correct: option_text == question.correct_answer_text,
            correct_answer: question.correct_answer_text.clone(),
        })
    }

    /// Moves the pointer to the next question, or completes the session
    /// when the last question has been answered. Feedback is selected
    /// exactly once, at the moment of completion.
    pub fn advance(&mut self) -> Result<SessionPhase, SessionError> {
        self.require_in_progress("advance")?;

        self.current_index += 1;
        if self.current_index >= self.questions.len() {
            self.phase = SessionPhase::Completed;
            self.feedback = select_feedback(self.score(), self.questions.len());
        }
        Ok(self.phase)
    }

    /// Count of answers equal to their question's correct option text.
    /// Authoritative once the session is completed.
    pub fn score(&self) -> usize {
        self.questions
            .iter()
            .enumerate()
            .filter(|(i, q)| {
                self.answers
                    .get(i)
                    .is_some_and(|a| *a == q.correct_answer_text)
            })
            .count()
    }

    pub fn results(&self) -> Result<SessionResults, SessionError> {
        if self.phase != SessionPhase::Completed {
            return Err(SessionError::InvalidTransition {
                action: "results",
                phase: self.phase,
            });
        }

        Ok(SessionResults {
            score: self.score(),
            total: self.questions.len(),
            feedback: self.feedback.clone(),
        })
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }

    fn require_in_progress(&self, action: &'static str) -> Result<(), SessionError> {
        if matches!(self.phase, SessionPhase::InProgress) {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                action,
                phase: self.phase,
            })
        }
    }
}

/// What the browser renders for one question.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionPresentation {
    pub index: usize,
    pub total: usize,
    pub question_text: String,
    pub options: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct AnswerOutcome {
    pub correct: bool,
    pub correct_answer: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResults {
    pub score: usize,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<FeedbackEntry>,
}

/// Current state of a session as seen by the client.
#[derive(Debug, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum SessionView {
    InProgress { question: QuestionPresentation },
    Completed { results: SessionResults },
}

#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
    pub quiz_id: String,
}

#[derive(Debug, Serialize)]
pub struct StartSessionResponse {
    pub session_id: String,
    pub title: String,
    pub question: QuestionPresentation,
}

#[derive(Debug, Deserialize)]
pub struct SubmitAnswerRequest {
    pub answer: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn quiz_with(n: usize) -> Quiz {
        Quiz {
            title: "Test".to_string(),
            questions: (0..n)
                .map(|i| Question {
                    question_text: format!("Question {}?", i),
                    options: vec![
                        "A. first".to_string(),
                        "B. second".to_string(),
                        "C. third".to_string(),
                    ],
                    answer_letter: "B".to_string(),
                    correct_answer_text: "B. second".to_string(),
                })
                .collect(),
        }
    }

    fn fresh_session() -> QuizSession {
        QuizSession::new(
            "s1".to_string(),
            "owner".to_string(),
            Utc::now() + Duration::hours(1),
        )
    }

    #[test]
    fn start_truncates_long_quizzes_to_ten_unique_questions() {
        let quiz = quiz_with(15);
        let mut session = fresh_session();
        session.start(&quiz).unwrap();

        assert_eq!(session.questions().len(), MAX_SESSION_QUESTIONS);

        // Every selected question comes from the source, no duplicates.
        let mut texts: Vec<&str> = session
            .questions()
            .iter()
            .map(|q| q.question_text.as_str())
            .collect();
        texts.sort_unstable();
        texts.dedup();
        assert_eq!(texts.len(), MAX_SESSION_QUESTIONS);
        for q in session.questions() {
            assert!(quiz.questions.contains(q));
        }
    }

    #[test]
    fn start_keeps_all_questions_of_a_short_quiz() {
        let quiz = quiz_with(7);
        let mut session = fresh_session();
        session.start(&quiz).unwrap();

        assert_eq!(session.questions().len(), 7);
        let mut texts: Vec<&str> = session
            .questions()
            .iter()
            .map(|q| q.question_text.as_str())
            .collect();
        texts.sort_unstable();
        texts.dedup();
        assert_eq!(texts.len(), 7);
    }

    #[test]
    fn start_rejects_empty_quiz() {
        let quiz = Quiz {
            title: "Empty".to_string(),
            questions: Vec::new(),
        };
        let mut session = fresh_session();
        assert!(matches!(session.start(&quiz), Err(SessionError::EmptyQuiz)));
        assert_eq!(session.phase(), SessionPhase::NotStarted);
    }

    #[test]
    fn presentation_reshuffles_options_but_keeps_their_contents() {
        let quiz = quiz_with(1);
        let mut session = fresh_session();
        session.start(&quiz).unwrap();

        let p = session.current_question().unwrap();
        let mut options = p.options.clone();
        options.sort_unstable();
        assert_eq!(options, vec!["A. first", "B. second", "C. third"]);
        assert_eq!(p.index, 0);
        assert_eq!(p.total, 1);
    }

    #[test]
    fn full_run_counts_correct_answers() {
        let quiz = Quiz {
            title: "Two".to_string(),
            questions: vec![
                Question {
                    question_text: "q1".to_string(),
                    options: vec!["A. no".to_string(), "B. yes".to_string()],
                    answer_letter: "B".to_string(),
                    correct_answer_text: "B. yes".to_string(),
                },
                Question {
                    question_text: "q2".to_string(),
                    options: vec!["A. yes".to_string(), "C. no".to_string()],
                    answer_letter: "A".to_string(),
                    correct_answer_text: "A. yes".to_string(),
                },
            ],
        };
        let mut session = fresh_session();
        session.start(&quiz).unwrap();

        // Answer the first presented question correctly, the second wrong.
        let first = session.current_question().unwrap();
        let correct = quiz
            .questions
            .iter()
            .find(|q| q.question_text == first.question_text)
            .unwrap()
            .correct_answer_text
            .clone();
        let outcome = session.submit_answer(&correct).unwrap();
        assert!(outcome.correct);
        assert_eq!(session.advance().unwrap(), SessionPhase::InProgress);

        let outcome = session.submit_answer("C. wrong").unwrap();
        assert!(!outcome.correct);
        assert_eq!(session.advance().unwrap(), SessionPhase::Completed);

        assert_eq!(session.score(), 1);
        let results = session.results().unwrap();
        assert_eq!(results.score, 1);
        assert_eq!(results.total, 2);
    }

    #[test]
    fn submit_and_advance_outside_in_progress_are_rejected() {
        let mut session = fresh_session();
        assert!(matches!(
            session.submit_answer("A. first"),
            Err(SessionError::InvalidTransition { .. })
        ));
        assert!(matches!(
            session.advance(),
            Err(SessionError::InvalidTransition { .. })
        ));

        let quiz = quiz_with(1);
        session.start(&quiz).unwrap();
        session.submit_answer("B. second").unwrap();
        session.advance().unwrap();
        assert_eq!(session.phase(), SessionPhase::Completed);

        assert!(matches!(
            session.submit_answer("B. second"),
            Err(SessionError::InvalidTransition { .. })
        ));
        assert!(matches!(
            session.advance(),
            Err(SessionError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn restart_of_a_started_session_is_rejected() {
        let quiz = quiz_with(2);
        let mut session = fresh_session();
        session.start(&quiz).unwrap();
        assert!(matches!(
            session.start(&quiz),
            Err(SessionError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn resubmission_overwrites_the_recorded_answer() {
        let quiz = quiz_with(1);
        let mut session = fresh_session();
        session.start(&quiz).unwrap();

        session.submit_answer("A. first").unwrap();
        session.submit_answer("B. second").unwrap();
        session.advance().unwrap();
        assert_eq!(session.score(), 1);
    }

    #[test]
    fn completion_fixes_the_feedback_entry() {
        let quiz = quiz_with(1);
        let mut session = fresh_session();
        session.start(&quiz).unwrap();
        session.submit_answer("B. second").unwrap();
        session.advance().unwrap();

        // Perfect run on a single question: celebratory entry, stable
        // across repeated result reads.
        let first = session.results().unwrap().feedback.unwrap();
        let second = session.results().unwrap().feedback.unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn results_before_completion_are_rejected() {
        let quiz = quiz_with(2);
        let mut session = fresh_session();
        session.start(&quiz).unwrap();
        assert!(matches!(
            session.results(),
            Err(SessionError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn expiry_is_based_on_the_stamp() {
        let session = QuizSession::new(
            "s".to_string(),
            "o".to_string(),
            Utc::now() - Duration::seconds(1),
        );
        assert!(session.is_expired(Utc::now()));
    }
}
