use rand::Rng;
use serde::Serialize;

/// A flavor message paired with a static asset the browser resolves and
/// renders next to the final score. The API only hands out catalog
/// entries; it never touches the asset files themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackEntry {
    pub message: &'static str,
    pub asset_ref: &'static str,
}

/// Shown only on a perfect score.
pub const CELEBRATORY: [FeedbackEntry; 12] = [
    FeedbackEntry {
        message: "Outstanding! A perfect score!",
        asset_ref: "assets/congrats/1.gif",
    },
    FeedbackEntry {
        message: "Flawless victory! You're a genius!",
        asset_ref: "assets/congrats/2.gif",
    },
    FeedbackEntry {
        message: "Not a single miss. Take a bow!",
        asset_ref: "assets/congrats/3.gif",
    },
    FeedbackEntry {
        message: "Perfection! The quiz never stood a chance.",
        asset_ref: "assets/congrats/4.gif",
    },
    FeedbackEntry {
        message: "100%! Somebody call the quiz police.",
        asset_ref: "assets/congrats/5.gif",
    },
    FeedbackEntry {
        message: "Every. Single. One. Incredible!",
        asset_ref: "assets/congrats/6.gif",
    },
    FeedbackEntry {
        message: "A clean sweep! You made it look easy.",
        asset_ref: "assets/congrats/7.gif",
    },
    FeedbackEntry {
        message: "Top marks! Frame this one.",
        asset_ref: "assets/congrats/8.gif",
    },
    FeedbackEntry {
        message: "Perfect run! Your brain deserves a raise.",
        asset_ref: "assets/congrats/9.gif",
    },
    FeedbackEntry {
        message: "Unstoppable! That was a masterclass.",
        asset_ref: "assets/congrats/10.gif",
    },
    FeedbackEntry {
        message: "All correct! Are you the one who wrote this quiz?",
        asset_ref: "assets/congrats/11.gif",
    },
    FeedbackEntry {
        message: "Maximum score! Legends are made of this.",
        asset_ref: "assets/congrats/12.gif",
    },
];

/// Shown on a low score.
pub const COMMISERATING: [FeedbackEntry; 5] = [
    FeedbackEntry {
        message: "Well, that was certainly an attempt.",
        asset_ref: "assets/troll/1.gif",
    },
    FeedbackEntry {
        message: "Did you try closing your eyes?",
        asset_ref: "assets/troll/2.gif",
    },
    FeedbackEntry {
        message: "The questions won this round.",
        asset_ref: "assets/troll/3.gif",
    },
    FeedbackEntry {
        message: "Bold strategy, answering at random.",
        asset_ref: "assets/troll/4.gif",
    },
    FeedbackEntry {
        message: "Maybe read the questions next time?",
        asset_ref: "assets/troll/5.gif",
    },
];

/// Picks the feedback for a finished attempt, perfect-score check first.
///
/// `score < 5` is an absolute count, independent of quiz length; on a
/// quiz shorter than five questions any imperfect run draws commiseration.
/// Mid-range scores get no entry at all.
pub fn select_feedback(score: usize, total: usize) -> Option<FeedbackEntry> {
    if total == 0 {
        return None;
    }

    let mut rng = rand::rng();
    if score == total {
        Some(CELEBRATORY[rng.random_range(0..CELEBRATORY.len())].clone())
    } else if score < 5 {
        Some(COMMISERATING[rng.random_range(0..COMMISERATING.len())].clone())
    } else {
        None
    }
}
