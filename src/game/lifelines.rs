//! Lifeline simulations.
//!
//! All three take the currently displayed options so they compose: a poll
//! after fifty-fifty only covers the two remaining answers.

use crate::types::{AnswerOption, PollResult, Question};
use rand::Rng;

/// Remove all but one incorrect option, keeping the correct answer and the
/// original display order. From four options, exactly two remain.
pub(crate) fn fifty_fifty<R: Rng>(displayed: &[AnswerOption], rng: &mut R) -> Vec<AnswerOption> {
    let wrong_indices: Vec<usize> = displayed
        .iter()
        .enumerate()
        .filter(|(_, a)| !a.is_correct)
        .map(|(i, _)| i)
        .collect();

    if wrong_indices.len() <= 1 {
        return displayed.to_vec();
    }
    let kept_wrong = wrong_indices[rng.random_range(0..wrong_indices.len())];

    displayed
        .iter()
        .enumerate()
        .filter(|(i, a)| a.is_correct || *i == kept_wrong)
        .map(|(_, a)| a.clone())
        .collect()
}

/// An advisory suggestion from the "friend". Right about 70% of the time when
/// the correct answer is still on screen; the wording signals confidence.
pub(crate) fn phone_a_friend<R: Rng>(
    question: &Question,
    displayed: &[AnswerOption],
    rng: &mut R,
) -> String {
    let correct = displayed.iter().find(|a| a.is_correct);
    let pick = match correct {
        Some(answer) if rng.random_bool(0.7) => answer,
        _ => &displayed[rng.random_range(0..displayed.len())],
    };

    let confident = rng.random_bool(0.5);
    if confident {
        format!(
            "I'm fairly sure about this one. For \"{}\" I'd go with \"{}\".",
            question.text, pick.text
        )
    } else {
        format!(
            "Hmm, \"{}\" is a tough one... my gut says \"{}\", but don't hold me to it.",
            question.text, pick.text
        )
    }
}

/// Simulate an audience vote over the displayed options. Percentages sum to
/// 100 and the distribution is weighted toward the correct answer.
pub(crate) fn audience_poll<R: Rng>(displayed: &[AnswerOption], rng: &mut R) -> Vec<PollResult> {
    if displayed.is_empty() {
        return Vec::new();
    }
    if displayed.len() == 1 {
        return vec![PollResult {
            text: displayed[0].text.clone(),
            percentage: 100,
        }];
    }

    // Correct answer takes a large but not certain share; the rest is split
    // with random weights among the other options.
    let correct_share: u8 = rng.random_range(45..=75);
    let remainder = 100 - correct_share as u32;

    let others: Vec<usize> = displayed
        .iter()
        .enumerate()
        .filter(|(_, a)| !a.is_correct)
        .map(|(i, _)| i)
        .collect();

    let weights: Vec<u32> = others.iter().map(|_| rng.random_range(1..=10)).collect();
    let weight_sum: u32 = weights.iter().sum();

    let mut shares = vec![0u8; displayed.len()];
    let mut allotted = 0u32;
    for (pos, &idx) in others.iter().enumerate() {
        let share = if pos == others.len() - 1 {
            remainder - allotted
        } else {
            remainder * weights[pos] / weight_sum
        };
        allotted += share;
        shares[idx] = share as u8;
    }
    if let Some(correct_idx) = displayed.iter().position(|a| a.is_correct) {
        shares[correct_idx] = correct_share;
    } else {
        // No correct option on screen (cannot happen after fifty-fifty, which
        // always keeps it); fold the correct share into the first option.
        shares[0] += correct_share;
    }

    displayed
        .iter()
        .zip(shares)
        .map(|(answer, percentage)| PollResult {
            text: answer.text.clone(),
            percentage,
        })
        .collect()
}
