//! Aggregate profile and statistics.
//!
//! The aggregate is a multiset union of every insight seen in a session.
//! Lists keep arrival order and duplicates; counting happens on read.

use crate::models::{Insight, QuestionRecord, Sentiment};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How many answers fell into each sentiment bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentTally {
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
}

impl SentimentTally {
    fn add(&mut self, sentiment: Sentiment) {
        match sentiment {
            Sentiment::Positive => self.positive += 1,
            Sentiment::Neutral => self.neutral += 1,
            Sentiment::Negative => self.negative += 1,
        }
    }

    /// The most frequent sentiment. Any tie with neutral resolves to neutral.
    pub fn dominant(&self) -> Sentiment {
        if self.positive > self.neutral && self.positive >= self.negative {
            Sentiment::Positive
        } else if self.negative > self.neutral && self.negative > self.positive {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }
}

/// Running union of all insights in a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateProfile {
    pub themes: Vec<String>,
    pub motivations: Vec<String>,
    pub concerns: Vec<String>,
    pub recommended_programs: Vec<String>,
    pub fit_scores: Vec<u8>,
    pub sentiments: SentimentTally,
}

impl AggregateProfile {
    /// Rebuild an aggregate from records in arrival order.
    pub fn fold<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a QuestionRecord>,
    {
        records
            .into_iter()
            .fold(Self::default(), |mut aggregate, record| {
                aggregate.extend(&record.insight);
                aggregate
            })
    }

    /// Append one insight.
    pub fn extend(&mut self, insight: &Insight) {
        self.themes.extend(insight.key_themes.iter().cloned());
        self.motivations.extend(insight.motivations.iter().cloned());
        self.concerns.extend(insight.concerns.iter().cloned());
        self.recommended_programs
            .extend(insight.program_fit.recommended_programs.iter().cloned());
        self.fit_scores.push(insight.program_fit.fit_score);
        self.sentiments.add(insight.sentiment);
    }

    /// Number of insights folded in.
    pub fn insight_count(&self) -> usize {
        self.fit_scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fit_scores.is_empty()
    }

    pub fn theme_count(&self, theme: &str) -> usize {
        count_of(&self.themes, theme)
    }

    pub fn motivation_count(&self, motivation: &str) -> usize {
        count_of(&self.motivations, motivation)
    }

    pub fn concern_count(&self, concern: &str) -> usize {
        count_of(&self.concerns, concern)
    }

    pub fn program_count(&self, program: &str) -> usize {
        count_of(&self.recommended_programs, program)
    }

    /// Mean fit score, if any insight has been recorded.
    pub fn average_fit_score(&self) -> Option<f64> {
        if self.fit_scores.is_empty() {
            return None;
        }
        let total: u32 = self.fit_scores.iter().map(|&s| u32::from(s)).sum();
        Some(f64::from(total) / self.fit_scores.len() as f64)
    }

    /// Top themes by count.
    pub fn top_themes(&self, n: usize) -> Vec<(String, usize)> {
        top_n(ranked(&self.themes), n)
    }

    pub fn top_motivations(&self, n: usize) -> Vec<(String, usize)> {
        top_n(ranked(&self.motivations), n)
    }

    pub fn top_concerns(&self, n: usize) -> Vec<(String, usize)> {
        top_n(ranked(&self.concerns), n)
    }

    /// Recommended programs ranked by how often they were suggested.
    pub fn ranked_programs(&self) -> Vec<(String, usize)> {
        ranked(&self.recommended_programs)
    }
}

fn count_of(items: &[String], needle: &str) -> usize {
    items.iter().filter(|item| item.as_str() == needle).count()
}

/// Distinct items with counts, highest first; ties keep first-seen order.
pub fn ranked(items: &[String]) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();

    for item in items {
        let count = counts.entry(item.as_str()).or_insert(0);
        if *count == 0 {
            order.push(item.as_str());
        }
        *count += 1;
    }

    let mut ranked: Vec<(String, usize)> = order
        .into_iter()
        .map(|item| (item.to_string(), counts[item]))
        .collect();

    // Stable sort keeps first-seen order among equal counts
    ranked.sort_by_key(|(_, count)| std::cmp::Reverse(*count));
    ranked
}

fn top_n(mut ranked: Vec<(String, usize)>, n: usize) -> Vec<(String, usize)> {
    ranked.truncate(n);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProgramFit, Response};
    use chrono::Utc;

    fn insight(themes: &[&str], programs: &[&str], score: u8, sentiment: Sentiment) -> Insight {
        Insight {
            sentiment,
            key_themes: themes.iter().map(|s| s.to_string()).collect(),
            motivations: vec!["growth".to_string()],
            concerns: vec![],
            program_fit: ProgramFit {
                recommended_programs: programs.iter().map(|s| s.to_string()).collect(),
                fit_score: score,
            },
            follow_up_needed: false,
            suggested_probe: None,
        }
    }

    fn record(id: &str, insight: Insight) -> QuestionRecord {
        QuestionRecord {
            question_id: id.to_string(),
            response: Response::from("answer"),
            insight,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_extend_keeps_duplicates_in_order() {
        let mut aggregate = AggregateProfile::default();
        aggregate.extend(&insight(&["ambition", "family"], &[], 60, Sentiment::Positive));
        aggregate.extend(&insight(&["ambition"], &[], 40, Sentiment::Neutral));

        assert_eq!(aggregate.themes, vec!["ambition", "family", "ambition"]);
        assert_eq!(aggregate.theme_count("ambition"), 2);
        assert_eq!(aggregate.motivation_count("growth"), 2);
        assert_eq!(aggregate.insight_count(), 2);
    }

    #[test]
    fn test_fold_matches_incremental_extend() {
        let records = vec![
            record("q1", insight(&["ambition"], &["Nursing"], 70, Sentiment::Positive)),
            record("q2", insight(&["balance"], &["Education"], 55, Sentiment::Negative)),
            record("q3", insight(&["ambition"], &["Nursing"], 90, Sentiment::Positive)),
        ];

        let mut incremental = AggregateProfile::default();
        for r in &records {
            incremental.extend(&r.insight);
        }

        assert_eq!(AggregateProfile::fold(&records), incremental);
    }

    #[test]
    fn test_ranked_programs_ties_keep_first_seen() {
        let mut aggregate = AggregateProfile::default();
        aggregate.extend(&insight(&[], &["Nursing", "Psychology"], 50, Sentiment::Neutral));
        aggregate.extend(&insight(&[], &["Psychology", "Education"], 50, Sentiment::Neutral));

        let ranked = aggregate.ranked_programs();
        assert_eq!(ranked[0], ("Psychology".to_string(), 2));
        assert_eq!(ranked[1], ("Nursing".to_string(), 1));
        assert_eq!(ranked[2], ("Education".to_string(), 1));
    }

    #[test]
    fn test_average_fit_score() {
        let mut aggregate = AggregateProfile::default();
        assert_eq!(aggregate.average_fit_score(), None);

        aggregate.extend(&insight(&[], &[], 40, Sentiment::Neutral));
        aggregate.extend(&insight(&[], &[], 80, Sentiment::Neutral));
        assert_eq!(aggregate.average_fit_score(), Some(60.0));
    }

    #[test]
    fn test_dominant_sentiment() {
        let mut tally = SentimentTally::default();
        assert_eq!(tally.dominant(), Sentiment::Neutral);

        tally.add(Sentiment::Positive);
        tally.add(Sentiment::Positive);
        tally.add(Sentiment::Neutral);
        assert_eq!(tally.dominant(), Sentiment::Positive);

        tally.add(Sentiment::Negative);
        tally.add(Sentiment::Negative);
        tally.add(Sentiment::Negative);
        assert_eq!(tally.dominant(), Sentiment::Negative);
    }
}
