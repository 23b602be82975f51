// SPDX-FileCopyrightText: 2025 The jenkins-tui Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use std::collections::HashMap;

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

use super::node::NodeId;
use super::store::NodeStore;

#[derive(Debug, Clone)]
struct SearchEntry {
    key: String,
    id: NodeId,
    synonyms: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum MatchTier {
    KeyPrefix,
    SegmentPrefix,
    Typo(usize),
    Fuzzy(i64),
}

/// Typo tolerant index over the qualified names of every materialized node.
#[derive(Debug)]
pub struct SearchIndex {
    entries: Vec<SearchEntry>,
    words: HashMap<String, NodeId>,
    predictions: Vec<String>,
    cursor: usize,
    limit: usize,
    max_typo_cost: usize,
}

impl SearchIndex {
    pub fn new(limit: usize, max_typo_cost: usize) -> Self {
        Self {
            entries: Vec::new(),
            words: HashMap::new(),
            predictions: Vec::new(),
            cursor: 0,
            limit,
            max_typo_cost,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn rebuild(&mut self, store: &NodeStore) {
        self.entries.clear();
        self.words.clear();
        self.predictions.clear();
        self.cursor = 0;

        for node in store.iter_depth_first() {
            let key = node.qualified_name.to_lowercase();
            let synonyms = key.split('/').map(str::to_string).collect();
            self.words.insert(key.clone(), node.id);
            self.entries.push(SearchEntry {
                key,
                id: node.id,
                synonyms,
            });
        }
    }

    pub fn lookup_exact(&self, text: &str) -> Option<NodeId> {
        self.words.get(&text.trim().to_lowercase()).copied()
    }

    /// Candidates for `prefix`, best first. Also becomes the set `cycle_prediction` walks.
    pub fn suggest(&mut self, prefix: &str) -> Vec<String> {
        self.cursor = 0;
        let query = prefix.trim().to_lowercase();
        if query.is_empty() {
            self.predictions.clear();
            return Vec::new();
        }

        let matcher = SkimMatcherV2::default();
        let mut ranked: Vec<(MatchTier, &str)> = self
            .entries
            .iter()
            .filter_map(|entry| {
                self.classify(&matcher, entry, &query)
                    .map(|tier| (tier, entry.key.as_str()))
            })
            .collect();
        ranked.sort();

        self.predictions = ranked
            .into_iter()
            .take(self.limit)
            .map(|(_, key)| key.to_string())
            .collect();
        self.predictions.clone()
    }

    /// Returns the prediction under the cursor and advances it, wrapping at the end.
    pub fn cycle_prediction(&mut self) -> Option<&str> {
        if self.predictions.is_empty() {
            return None;
        }
        let index = self.cursor % self.predictions.len();
        self.cursor = (index + 1) % self.predictions.len();
        Some(self.predictions[index].as_str())
    }

    fn classify(&self, matcher: &SkimMatcherV2, entry: &SearchEntry, query: &str) -> Option<MatchTier> {
        if entry.key.starts_with(query) {
            return Some(MatchTier::KeyPrefix);
        }
        if entry.synonyms.iter().any(|s| s.starts_with(query)) {
            return Some(MatchTier::SegmentPrefix);
        }
        let typo = entry
            .synonyms
            .iter()
            .map(|s| prefix_edit_distance(query, s))
            .min()
            .filter(|cost| *cost <= self.max_typo_cost);
        if let Some(cost) = typo {
            return Some(MatchTier::Typo(cost));
        }
        matcher
            .fuzzy_match(&entry.key, query)
            .map(|score| MatchTier::Fuzzy(-score))
    }
}

/// Smallest edit distance between `query` and any prefix of `candidate`.
fn prefix_edit_distance(query: &str, candidate: &str) -> usize {
    let query: Vec<char> = query.chars().collect();
    let candidate: Vec<char> = candidate.chars().collect();

    // row[j]: distance between the query read so far and candidate[..j]
    let mut row: Vec<usize> = (0..=candidate.len()).collect();
    for (i, qc) in query.iter().enumerate() {
        let mut previous_diagonal = row[0];
        row[0] = i + 1;
        for (j, cc) in candidate.iter().enumerate() {
            let substitution = previous_diagonal + usize::from(qc != cc);
            previous_diagonal = row[j + 1];
            row[j + 1] = substitution.min(row[j] + 1).min(row[j + 1] + 1);
        }
    }
    row.into_iter().min().unwrap_or(query.len())
}
