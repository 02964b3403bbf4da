use std::collections::HashMap;

use crate::model::{Question, SessionResult, UserAnswer};

/// Lowest percentage that still counts as a pass.
pub const PASS_MARK: u32 = 60;

/// Score a finished session.
///
/// A question is correct when its answer's selection equals the correct
/// option id; a missing answer or a null selection counts as unanswered.
pub fn calculate(questions: &[Question], answers: &HashMap<String, UserAnswer>) -> SessionResult {
    let mut correct = 0;
    let mut incorrect = 0;
    let mut unanswered = 0;

    for q in questions {
        match answers
            .get(&q.id)
            .and_then(|a| a.selected_option_id.as_deref())
        {
            Some(selected) if selected == q.correct_option_id => correct += 1,
            Some(_) => incorrect += 1,
            None => unanswered += 1,
        }
    }

    let total = questions.len();
    let percentage = percentage(correct, total);

    SessionResult {
        total,
        correct,
        incorrect,
        unanswered,
        percentage,
        passed: percentage >= PASS_MARK,
    }
}

/// `round(correct / total * 100)`, half away from zero; 0 for an empty set.
fn percentage(correct: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((correct as f64 / total as f64) * 100.0).round() as u32
}
