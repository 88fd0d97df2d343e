//! Brute-force nearest match over a gesture library.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::library::GestureLibrary;
use crate::normalize::NormalizedPose;
use crate::similarity::{closeness, Closeness};

/// One stored example scored against a query pose.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub score: u32,
    pub name: String,
    pub image_reference: String,
    pub closeness: Closeness,
}

/// The best match for a query, with ties across names kept explicit.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    /// The library is empty.
    NoMatch,
    /// The lowest score belongs to a single name.
    Unique(Candidate),
    /// The lowest score is shared by several names.
    Ambiguous { score: u32, names: Vec<String> },
}

/// Scores `pose` against every stored example. The result is unsorted.
pub fn rank(pose: &NormalizedPose, library: &GestureLibrary) -> Vec<Candidate> {
    library
        .iter()
        .map(|(name, example)| {
            let closeness = closeness(pose, &example.pose);
            Candidate {
                score: closeness.score,
                name: name.to_string(),
                image_reference: example.image_reference.clone(),
                closeness,
            }
        })
        .collect()
}

/// Orders candidates best first. Equal scores keep their library order.
pub fn sort_by_score(candidates: &mut [Candidate]) {
    candidates.sort_by_key(|c| c.score);
}

/// Picks the lowest-scoring candidate, or reports every name tied for it.
pub fn best_match(candidates: Vec<Candidate>) -> MatchOutcome {
    let Some(best_score) = candidates.iter().map(|c| c.score).min() else {
        return MatchOutcome::NoMatch;
    };

    let names: BTreeSet<&str> = candidates
        .iter()
        .filter(|c| c.score == best_score)
        .map(|c| c.name.as_str())
        .collect();
    if names.len() > 1 {
        return MatchOutcome::Ambiguous {
            score: best_score,
            names: names.into_iter().map(str::to_string).collect(),
        };
    }

    match candidates.into_iter().find(|c| c.score == best_score) {
        Some(best) => MatchOutcome::Unique(best),
        None => MatchOutcome::NoMatch,
    }
}
