use chrono::{Duration, Utc};

use quizdeck_api::models::feedback::{CELEBRATORY, COMMISERATING};
use quizdeck_api::models::quiz::Quiz;
use quizdeck_api::models::session::{QuizSession, SessionPhase, MAX_SESSION_QUESTIONS};

/// Builds a quiz text with `n` well-formed question segments.
fn quiz_text(n: usize) -> String {
    let mut text = String::from("Title: Flow Test\n");
    for i in 0..n {
        text.push_str(&format!(
            "---\nQuestion {}?\nA. wrong one\nB. right one\nC. also wrong\nanswer: B\n",
            i
        ));
    }
    text
}

fn started_session(quiz: &Quiz) -> QuizSession {
    let mut session = QuizSession::new(
        "flow-session".to_string(),
        "flow-owner".to_string(),
        Utc::now() + Duration::hours(1),
    );
    session.start(quiz).unwrap();
    session
}

/// Answers the current question; `correctly` controls whether the source
/// quiz's correct option or a known-wrong text is submitted.
fn answer_current(session: &mut QuizSession, quiz: &Quiz, correctly: bool) {
    let presented = session.current_question().unwrap();
    let source = quiz
        .questions
        .iter()
        .find(|q| q.question_text == presented.question_text)
        .expect("presented question must come from the source quiz");

    let answer = if correctly {
        source.correct_answer_text.clone()
    } else {
        "Z. definitely not an option".to_string()
    };
    session.submit_answer(&answer).unwrap();
}

#[test]
fn upload_text_parses_to_expected_question_count() {
    let quiz = Quiz::parse(&quiz_text(8)).unwrap();
    assert_eq!(quiz.title, "Flow Test");
    assert_eq!(quiz.questions.len(), 8);
}

#[test]
fn perfect_run_yields_celebratory_feedback() {
    let quiz = Quiz::parse(&quiz_text(8)).unwrap();
    let mut session = started_session(&quiz);

    while session.phase() == SessionPhase::InProgress {
        answer_current(&mut session, &quiz, true);
        session.advance().unwrap();
    }

    let results = session.results().unwrap();
    assert_eq!(results.score, 8);
    assert_eq!(results.total, 8);
    let feedback = results.feedback.expect("perfect score must produce feedback");
    assert!(CELEBRATORY.contains(&feedback));
}

#[test]
fn low_score_run_yields_commiserating_feedback() {
    let quiz = Quiz::parse(&quiz_text(8)).unwrap();
    let mut session = started_session(&quiz);

    // Three correct answers, then all wrong.
    let mut correct_left: i32 = 3;
    while session.phase() == SessionPhase::InProgress {
        answer_current(&mut session, &quiz, correct_left > 0);
        correct_left = correct_left.saturating_sub(1);
        session.advance().unwrap();
    }

    let results = session.results().unwrap();
    assert_eq!(results.score, 3);
    assert_eq!(results.total, 8);
    let feedback = results.feedback.expect("low score must produce feedback");
    assert!(COMMISERATING.contains(&feedback));
}

#[test]
fn mid_range_run_yields_no_feedback() {
    let quiz = Quiz::parse(&quiz_text(8)).unwrap();
    let mut session = started_session(&quiz);

    let mut correct_left: i32 = 6;
    while session.phase() == SessionPhase::InProgress {
        answer_current(&mut session, &quiz, correct_left > 0);
        correct_left = correct_left.saturating_sub(1);
        session.advance().unwrap();
    }

    let results = session.results().unwrap();
    assert_eq!(results.score, 6);
    assert!(results.feedback.is_none());
}

#[test]
fn long_quiz_session_is_capped_at_ten_questions() {
    let quiz = Quiz::parse(&quiz_text(15)).unwrap();
    let session = started_session(&quiz);

    assert_eq!(session.questions().len(), MAX_SESSION_QUESTIONS);

    // All drawn from the source, no duplicates.
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
fn short_quiz_session_keeps_every_question() {
    let quiz = Quiz::parse(&quiz_text(7)).unwrap();
    let session = started_session(&quiz);
    assert_eq!(session.questions().len(), 7);
}

#[test]
fn short_quiz_imperfect_run_commiserates_under_the_absolute_threshold() {
    // On a three-question quiz any imperfect score is below the absolute
    // cutoff, so commiseration fires. Deliberate behavior.
    let quiz = Quiz::parse(&quiz_text(3)).unwrap();
    let mut session = started_session(&quiz);

    let mut correct_left: i32 = 2;
    while session.phase() == SessionPhase::InProgress {
        answer_current(&mut session, &quiz, correct_left > 0);
        correct_left = correct_left.saturating_sub(1);
        session.advance().unwrap();
    }

    let results = session.results().unwrap();
    assert_eq!(results.score, 2);
    assert_eq!(results.total, 3);
    let feedback = results.feedback.expect("2/3 must produce feedback");
    assert!(COMMISERATING.contains(&feedback));
}

#[test]
fn segments_with_bad_answer_lines_are_dropped_end_to_end() {
    let text = "Title: Mixed\n\
                ---\n\
                Good one?\nA. x\nB. y\nanswer: A\n\
                ---\n\
                Bad one?\nA. x\nB. y\n\
                ---\n\
                Another good one?\nA. x\nB. y\nanswer: b\n";
    let quiz = Quiz::parse(text).unwrap();
    assert_eq!(quiz.questions.len(), 2);

    let session = started_session(&quiz);
    assert_eq!(session.questions().len(), 2);
}
