//! Qualification score for a prospect.
//!
//! Scores range from 0 to 100 and are recomputed from their inputs on every
//! mutation that touches contact data, business info, size, or interaction
//! history. The stored score is never edited directly.

use crate::prospect::CompanySize;

pub const BASE_SCORE: i32 = 50;
/// Contact email on file.
pub const W_EMAIL: i32 = 10;
/// Contact phone on file.
pub const W_PHONE: i32 = 10;
/// Monthly shipment estimate present and non-zero.
pub const W_SHIPMENTS: i32 = 15;
/// Website on file.
pub const W_WEBSITE: i32 = 5;
/// Per positive interaction.
pub const W_POSITIVE: i32 = 5;
/// Per negative interaction (subtracted).
pub const W_NEGATIVE: i32 = 10;

/// Everything the score depends on, extracted from a prospect record.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreInputs {
    pub has_email: bool,
    pub has_phone: bool,
    pub has_monthly_shipments: bool,
    pub has_website: bool,
    pub size: Option<CompanySize>,
    pub positive_interactions: i64,
    pub negative_interactions: i64,
}

/// Recompute the qualification score, clamped to `[0, 100]`.
#[must_use]
pub fn recompute_score(inputs: &ScoreInputs) -> i32 {
    let mut score = BASE_SCORE;

    if inputs.has_email {
        score += W_EMAIL;
    }
    if inputs.has_phone {
        score += W_PHONE;
    }
    if inputs.has_monthly_shipments {
        score += W_SHIPMENTS;
    }
    if inputs.has_website {
        score += W_WEBSITE;
    }
    if let Some(size) = inputs.size {
        score += size.score_bonus();
    }

    let positive = i32::try_from(inputs.positive_interactions).unwrap_or(i32::MAX / W_POSITIVE);
    let negative = i32::try_from(inputs.negative_interactions).unwrap_or(i32::MAX / W_NEGATIVE);
    score = score.saturating_add(positive.saturating_mul(W_POSITIVE));
    score = score.saturating_sub(negative.saturating_mul(W_NEGATIVE));

    score.clamp(0, 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_prospect_scores_base() {
        assert_eq!(recompute_score(&ScoreInputs::default()), BASE_SCORE);
    }

    #[test]
    fn complete_profile_accumulates_bonuses() {
        let inputs = ScoreInputs {
            has_email: true,
            has_phone: true,
            has_monthly_shipments: true,
            has_website: true,
            size: Some(CompanySize::Medium),
            positive_interactions: 1,
            negative_interactions: 0,
        };
        // 50 + 10 + 10 + 15 + 5 + 15 + 5
        assert_eq!(recompute_score(&inputs), 100);
    }

    #[test]
    fn score_is_clamped_to_upper_bound() {
        let inputs = ScoreInputs {
            has_email: true,
            has_phone: true,
            has_monthly_shipments: true,
            has_website: true,
            size: Some(CompanySize::Enterprise),
            positive_interactions: 40,
            negative_interactions: 0,
        };
        assert_eq!(recompute_score(&inputs), 100);
    }

    #[test]
    fn score_is_clamped_to_zero_with_adversarial_negatives() {
        let inputs = ScoreInputs {
            negative_interactions: 50,
            ..ScoreInputs::default()
        };
        assert_eq!(recompute_score(&inputs), 0);
    }

    #[test]
    fn score_survives_absurd_interaction_counts() {
        let inputs = ScoreInputs {
            positive_interactions: i64::MAX,
            negative_interactions: i64::MAX,
            ..ScoreInputs::default()
        };
        let score = recompute_score(&inputs);
        assert!((0..=100).contains(&score));
    }

    #[test]
    fn size_bonus_matches_tier() {
        for (size, bonus) in [
            (CompanySize::Startup, 5),
            (CompanySize::Small, 10),
            (CompanySize::Medium, 15),
            (CompanySize::Large, 20),
            (CompanySize::Enterprise, 25),
        ] {
            let inputs = ScoreInputs {
                size: Some(size),
                ..ScoreInputs::default()
            };
            assert_eq!(recompute_score(&inputs), BASE_SCORE + bonus);
        }
    }

    #[test]
    fn recompute_is_deterministic() {
        let inputs = ScoreInputs {
            has_email: true,
            size: Some(CompanySize::Small),
            positive_interactions: 2,
            ..ScoreInputs::default()
        };
        assert_eq!(recompute_score(&inputs), recompute_score(&inputs));
    }
}
