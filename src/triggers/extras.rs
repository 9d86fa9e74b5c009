//! Progress encouragement and profile-based question variations.

use crate::models::QuestionRecord;
use serde::{Deserialize, Serialize};

/// Encouragement shown at exactly 25%, 50% and 75% of the script.
pub fn encouragement(answered: usize, total: usize) -> Option<&'static str> {
    if total == 0 {
        return None;
    }
    // Integer comparison avoids float rounding on the quarter marks
    let quarter = |k: usize| answered * 4 == total * k;

    if quarter(1) {
        Some("You're doing great! Your answers are painting a clear picture... 🎨")
    } else if quarter(2) {
        Some("Halfway there! I'm already seeing some exciting possibilities for you... ⚡")
    } else if quarter(3) {
        Some("Home stretch! Your blueprint is taking shape beautifully... 🏗️")
    } else {
        None
    }
}

/// Coarse classification used to pick a question variation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileKind {
    #[default]
    Default,
    Experienced,
    Struggling,
}

/// Answers that put someone past fifteen years of experience.
const SENIOR_EXPERIENCE: &[&str] = &["15-20 years", "More than 20 years"];

impl ProfileKind {
    /// Classify from history. Frustration outranks seniority.
    pub fn classify(history: &[QuestionRecord]) -> Self {
        if history.iter().any(|r| r.response.contains_ignore_case("stuck")) {
            return ProfileKind::Struggling;
        }

        let senior: Vec<String> = SENIOR_EXPERIENCE.iter().map(|s| s.to_string()).collect();
        if history.iter().any(|r| r.response.is_member_of(&senior)) {
            return ProfileKind::Experienced;
        }

        ProfileKind::Default
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Insight, Response};
    use chrono::Utc;

    fn record(response: &str) -> QuestionRecord {
        QuestionRecord {
            question_id: "q".to_string(),
            response: Response::from(response),
            insight: Insight::neutral(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_encouragement_quarter_marks() {
        assert!(encouragement(4, 16).unwrap().starts_with("You're doing great"));
        assert!(encouragement(8, 16).unwrap().starts_with("Halfway"));
        assert!(encouragement(12, 16).unwrap().starts_with("Home stretch"));
        assert_eq!(encouragement(5, 16), None);
        assert_eq!(encouragement(16, 16), None);
        assert_eq!(encouragement(1, 3), None);
        assert_eq!(encouragement(0, 0), None);
    }

    #[test]
    fn test_classify_profile_kind() {
        assert_eq!(ProfileKind::classify(&[]), ProfileKind::Default);
        assert_eq!(
            ProfileKind::classify(&[record("More than 20 years")]),
            ProfileKind::Experienced
        );
        assert_eq!(
            ProfileKind::classify(&[record("More than 20 years"), record("I feel Stuck")]),
            ProfileKind::Struggling
        );
    }
}
