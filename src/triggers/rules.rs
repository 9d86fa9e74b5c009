//! Trigger rule definitions and the built-in conversational tables.

use serde::{Deserialize, Serialize};

/// Pseudo-section reported once the script has nothing left to schedule.
pub const FINISH_SECTION: &str = "finish";

/// Matches used by threshold-based rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseTest {
    /// Exact, case-sensitive membership.
    AnyOf(Vec<String>),
    /// Case-sensitive substring containment.
    ContainsAny(Vec<String>),
}

/// What a keyword rule produces when it fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordReaction {
    Message(String),
    Probe {
        question: String,
        options: Vec<String>,
    },
}

/// Evaluation order of rule categories, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RuleCategory {
    InsightPattern,
    KeywordProbe,
    ContextualResponse,
    SectionBridge,
}

/// A named pattern evaluated against a session's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum TriggerRule {
    /// Fires once `threshold` responses across history pass `test`.
    InsightPattern {
        name: String,
        test: ResponseTest,
        threshold: usize,
        message: String,
    },
    /// Fires when the latest response contains any keyword (case-insensitive).
    /// With `question_id` set, only when that question was just answered.
    KeywordProbe {
        name: String,
        question_id: Option<String>,
        keywords: Vec<String>,
        reaction: KeywordReaction,
    },
    /// Fires once `min_match_count` responses are members of `triggers`.
    ContextualResponse {
        name: String,
        triggers: Vec<String>,
        min_match_count: usize,
        responses: Vec<String>,
    },
    /// Fires when the quiz moves from section `from` to section `to`.
    SectionBridge {
        name: String,
        from: String,
        to: String,
        message: String,
    },
}

impl TriggerRule {
    pub fn name(&self) -> &str {
        match self {
            TriggerRule::InsightPattern { name, .. }
            | TriggerRule::KeywordProbe { name, .. }
            | TriggerRule::ContextualResponse { name, .. }
            | TriggerRule::SectionBridge { name, .. } => name,
        }
    }

    pub fn category(&self) -> RuleCategory {
        match self {
            TriggerRule::InsightPattern { .. } => RuleCategory::InsightPattern,
            TriggerRule::KeywordProbe { .. } => RuleCategory::KeywordProbe,
            TriggerRule::ContextualResponse { .. } => RuleCategory::ContextualResponse,
            TriggerRule::SectionBridge { .. } => RuleCategory::SectionBridge,
        }
    }
}

/// Default minimum for contextual responses.
pub const DEFAULT_MIN_MATCH_COUNT: usize = 2;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Answers that mark a high achiever.
pub fn high_achiever_triggers() -> Vec<String> {
    strings(&[
        "Master's Degree",
        "Doctoral Degree",
        "Executive",
        "More than 20 years",
    ])
}

/// The built-in rule table.
pub fn default_rules() -> Vec<TriggerRule> {
    let mut rules = Vec::new();
    rules.extend(insight_patterns());
    rules.extend(keyword_probes());
    rules.extend(contextual_responses());
    rules.extend(section_bridges());
    rules
}

fn insight_patterns() -> Vec<TriggerRule> {
    vec![
        TriggerRule::InsightPattern {
            name: "high_achiever".to_string(),
            test: ResponseTest::AnyOf(high_achiever_triggers()),
            threshold: 2,
            message: "I'm noticing a pattern of excellence in your background. Let's make sure your next move lives up to your standards...".to_string(),
        },
        TriggerRule::InsightPattern {
            name: "uncertainty".to_string(),
            test: ResponseTest::ContainsAny(strings(&["unsure", "exploring"])),
            threshold: 2,
            message: "It's perfectly okay to be exploring options. Sometimes the best insights come from these questions themselves...".to_string(),
        },
    ]
}

fn keyword_probes() -> Vec<TriggerRule> {
    vec![
        // Deeper probes
        TriggerRule::KeywordProbe {
            name: "financial_value_probe".to_string(),
            question_id: Some("q8_biggest_concern".to_string()),
            keywords: strings(&["Financial investment and value"]),
            reaction: KeywordReaction::Probe {
                question: "Money matters are real. What would 'worth it' look like for you? A specific salary increase? New opportunities?".to_string(),
                options: strings(&[
                    "Specific salary goal",
                    "20-30% increase",
                    "More about opportunities",
                ]),
            },
        },
        TriggerRule::KeywordProbe {
            name: "leadership_probe".to_string(),
            question_id: Some("q15_ideal_role".to_string()),
            keywords: strings(&["leadership", "manage", "director"]),
            reaction: KeywordReaction::Probe {
                question: "Leadership is calling! What draws you most: the strategic thinking, developing people, or driving results?".to_string(),
                options: strings(&[
                    "Strategic vision",
                    "Developing teams",
                    "Driving outcomes",
                    "All of the above",
                ]),
            },
        },
        // Mini-insights
        TriggerRule::KeywordProbe {
            name: "hands_on_insight".to_string(),
            question_id: Some("q5_favorite_aspect".to_string()),
            keywords: strings(&["Hands-on projects"]),
            reaction: KeywordReaction::Message(
                "📊 Hands-on learners tend to thrive in project-based programs.".to_string(),
            ),
        },
        TriggerRule::KeywordProbe {
            name: "working_student_insight".to_string(),
            question_id: Some("q9_employment_status".to_string()),
            keywords: strings(&["Employed full-time"]),
            reaction: KeywordReaction::Message(
                "💼 You're in good company: most of our students study while working full-time."
                    .to_string(),
            ),
        },
        TriggerRule::KeywordProbe {
            name: "mid_career_insight".to_string(),
            question_id: Some("q11_years_experience".to_string()),
            keywords: strings(&["10-15 years"]),
            reaction: KeywordReaction::Message(
                "🎯 The 10-15 year mark is a great moment to invest in advanced education."
                    .to_string(),
            ),
        },
        // Personality remarks, not tied to a question
        TriggerRule::KeywordProbe {
            name: "schedule_remark".to_string(),
            question_id: None,
            keywords: strings(&["morning"]),
            reaction: KeywordReaction::Message(
                "Early bird or night owl? Either way, there are classes that fit your schedule! 🌅🌙"
                    .to_string(),
            ),
        },
        TriggerRule::KeywordProbe {
            name: "technology_remark".to_string(),
            question_id: None,
            keywords: strings(&["technology"]),
            reaction: KeywordReaction::Message(
                "Don't worry about the tech. If you can use a smartphone, you can handle the learning platform! 📱"
                    .to_string(),
            ),
        },
        TriggerRule::KeywordProbe {
            name: "family_remark".to_string(),
            question_id: None,
            keywords: strings(&["family"]),
            reaction: KeywordReaction::Message(
                "Family support is crucial. Many graduates say their kids became their biggest cheerleaders!"
                    .to_string(),
            ),
        },
    ]
}

fn contextual_responses() -> Vec<TriggerRule> {
    vec![
        TriggerRule::ContextualResponse {
            name: "career_changer".to_string(),
            triggers: strings(&[
                "transition to a new field",
                "Want to change careers",
                "Different person now",
            ]),
            min_match_count: DEFAULT_MIN_MATCH_COUNT,
            responses: strings(&[
                "Career pivots take courage! Let's make sure your next move is strategic.",
                "Starting fresh can be the best decision you make.",
                "You're not alone: plenty of students are making career transitions too!",
            ]),
        },
        TriggerRule::ContextualResponse {
            name: "returning_student".to_string(),
            triggers: strings(&["Academic confidence after time away", "More than 10 years ago"]),
            min_match_count: DEFAULT_MIN_MATCH_COUNT,
            responses: strings(&[
                "Welcome back to learning! It's like riding a bike, with better support this time.",
                "The best students are often those who return with life experience.",
                "Programs for working adults are designed for people getting back into academics.",
            ]),
        },
    ]
}

fn section_bridges() -> Vec<TriggerRule> {
    let bridge = |from: &str, to: &str, message: &str| TriggerRule::SectionBridge {
        name: format!("{}_to_{}", from, to),
        from: from.to_string(),
        to: to.to_string(),
        message: message.to_string(),
    };

    vec![
        bridge(
            "education",
            "experience",
            "Great! Now I have a clear picture of your educational journey. Let's talk about how you've been putting that knowledge to work...",
        ),
        bridge(
            "experience",
            "vision",
            "Your experience tells quite a story! Now comes the fun part: let's dream about where you're headed...",
        ),
        bridge(
            "vision",
            "decision",
            "I love your vision! 🚀 Now let's get practical about making it happen...",
        ),
        bridge(
            "decision",
            FINISH_SECTION,
            "Almost there! Just a few more insights to create your roadmap...",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules_are_grouped_by_priority() {
        let rules = default_rules();
        let categories: Vec<_> = rules.iter().map(|r| r.category()).collect();
        let mut sorted = categories.clone();
        sorted.sort();
        assert_eq!(categories, sorted);
    }

    #[test]
    fn test_rule_names_are_unique_per_category() {
        let rules = default_rules();
        let mut seen = std::collections::HashSet::new();
        for rule in &rules {
            assert!(seen.insert((rule.category(), rule.name().to_string())));
        }
    }

    #[test]
    fn test_category_order() {
        assert!(RuleCategory::InsightPattern < RuleCategory::KeywordProbe);
        assert!(RuleCategory::KeywordProbe < RuleCategory::ContextualResponse);
        assert!(RuleCategory::ContextualResponse < RuleCategory::SectionBridge);
    }

    #[test]
    fn test_bridge_names() {
        let names: Vec<_> = section_bridges().iter().map(|r| r.name().to_string()).collect();
        assert_eq!(names[0], "education_to_experience");
        assert_eq!(names[3], "decision_to_finish");
    }
}
