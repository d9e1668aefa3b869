pub mod feedback;
pub mod quiz;
pub mod refresh_token;
pub mod session;
pub mod user;

pub use quiz::{ParseError, Question, Quiz, QuizDocument};
pub use session::{QuizSession, SessionError, SessionPhase};
