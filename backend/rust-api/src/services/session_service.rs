use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::{Duration, Utc};
use mongodb::bson::oid::ObjectId;
use uuid::Uuid;

use super::quiz_service::QuizService;
use super::AppState;
use crate::metrics::{ANSWERS_SUBMITTED_TOTAL, SESSIONS_ACTIVE, SESSIONS_TOTAL};
use crate::models::session::{
    AnswerOutcome, QuizSession, SessionPhase, SessionView, StartSessionResponse,
};

/// Drives quiz sessions over the in-memory registry in [`AppState`]. The
/// registry mutex is only ever held for synchronous map access, never
/// across an await.
pub struct SessionService {
    state: Arc<AppState>,
}

impl SessionService {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Starts a new attempt at one of the owner's stored quizzes. The
    /// stored record is copied; shuffling and truncation happen on the
    /// session's private copy only.
    pub async fn start(&self, quiz_id: &str, owner_id: &ObjectId) -> Result<StartSessionResponse> {
        let quiz = QuizService::new(self.state.mongo.clone())
            .get(quiz_id, owner_id)
            .await?
            .into_quiz();

        let session_id = Uuid::new_v4().to_string();
        let ttl = Duration::seconds(self.state.config.session_ttl_seconds);
        let mut session = QuizSession::new(session_id.clone(), owner_id.to_hex(), Utc::now() + ttl);
        session.start(&quiz)?;
        let question = session.current_question()?;
        let title = session.quiz_title.clone();

        {
            let mut sessions = self.state.sessions.lock().expect("session registry poisoned");
            let now = Utc::now();
            sessions.retain(|_, s| !s.is_expired(now));
            sessions.insert(session_id.clone(), session);
            SESSIONS_ACTIVE.set(sessions.len() as i64);
        }

        SESSIONS_TOTAL.with_label_values(&["started"]).inc();
        tracing::info!(
            session_id = %session_id,
            quiz_id = %quiz_id,
            owner_id = %owner_id.to_hex(),
            "Session started"
        );

        Ok(StartSessionResponse {
            session_id,
            title,
            question,
        })
    }

    /// Current state of a session: the question under the pointer (with
    /// freshly shuffled options) while in progress, the results once
    /// completed.
    pub fn view(&self, session_id: &str, owner_id: &ObjectId) -> Result<SessionView> {
        let sessions = self.state.sessions.lock().expect("session registry poisoned");
        let session = Self::find(&sessions, session_id, owner_id)?;

        match session.phase() {
            SessionPhase::Completed => Ok(SessionView::Completed {
                results: session.results()?,
            }),
            _ => Ok(SessionView::InProgress {
                question: session.current_question()?,
            }),
        }
    }

    /// Records the chosen option for the current question.
    pub fn submit_answer(
        &self,
        session_id: &str,
        owner_id: &ObjectId,
        answer: &str,
    ) -> Result<AnswerOutcome> {
        let mut sessions = self.state.sessions.lock().expect("session registry poisoned");
        let session = Self::find_mut(&mut sessions, session_id, owner_id)?;

        let outcome = session.submit_answer(answer)?;

        let correct_label = if outcome.correct { "true" } else { "false" };
        ANSWERS_SUBMITTED_TOTAL
            .with_label_values(&[correct_label])
            .inc();

        Ok(outcome)
    }

    /// Moves to the next question or completes the session. The browser
    /// imposes its 1.5 s feedback pause before calling this; the session
    /// itself transitions immediately.
    pub fn advance(&self, session_id: &str, owner_id: &ObjectId) -> Result<SessionView> {
        let mut sessions = self.state.sessions.lock().expect("session registry poisoned");
        let session = Self::find_mut(&mut sessions, session_id, owner_id)?;

        let phase = session.advance()?;

        if phase == SessionPhase::Completed {
            SESSIONS_TOTAL.with_label_values(&["completed"]).inc();
            let results = session.results()?;
            tracing::info!(
                session_id = %session_id,
                score = results.score,
                total = results.total,
                "Session completed"
            );
            return Ok(SessionView::Completed { results });
        }

        Ok(SessionView::InProgress {
            question: session.current_question()?,
        })
    }

    /// Discards a session (the navigate-home path).
    pub fn discard(&self, session_id: &str, owner_id: &ObjectId) -> Result<()> {
        let mut sessions = self.state.sessions.lock().expect("session registry poisoned");
        Self::find(&sessions, session_id, owner_id)?;
        sessions.remove(session_id);
        SESSIONS_ACTIVE.set(sessions.len() as i64);

        SESSIONS_TOTAL.with_label_values(&["discarded"]).inc();
        tracing::info!(session_id = %session_id, "Session discarded");
        Ok(())
    }

    fn find<'a>(
        sessions: &'a std::collections::HashMap<String, QuizSession>,
        session_id: &str,
        owner_id: &ObjectId,
    ) -> Result<&'a QuizSession> {
        sessions
            .get(session_id)
            .filter(|s| s.owner_id == owner_id.to_hex() && !s.is_expired(Utc::now()))
            .ok_or_else(|| anyhow!("Session not found"))
    }

    fn find_mut<'a>(
        sessions: &'a mut std::collections::HashMap<String, QuizSession>,
        session_id: &str,
        owner_id: &ObjectId,
    ) -> Result<&'a mut QuizSession> {
        sessions
            .get_mut(session_id)
            .filter(|s| s.owner_id == owner_id.to_hex() && !s.is_expired(Utc::now()))
            .ok_or_else(|| anyhow!("Session not found"))
    }
}
