//! Message template clustering
//!
//! Messages are first merged by their normalized template, then templates that
//! are close enough by edit distance are folded together in a single pass.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::normalizer::normalize;

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.85;
pub const MAX_SAMPLES_PER_GROUP: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageGroup {
    pub template: String,
    pub count: u64,
    pub samples: Vec<String>,
}

impl MessageGroup {
    fn new(template: String) -> Self {
        Self {
            template,
            count: 0,
            samples: Vec::with_capacity(MAX_SAMPLES_PER_GROUP),
        }
    }

    fn push_sample(&mut self, sample: &str) {
        if self.samples.len() < MAX_SAMPLES_PER_GROUP {
            self.samples.push(sample.to_string());
        }
    }

    /// Fold another group's count and as many samples as still fit
    fn absorb(&mut self, other: MessageGroup) {
        self.count += other.count;
        for sample in other.samples {
            if self.samples.len() >= MAX_SAMPLES_PER_GROUP {
                break;
            }
            self.samples.push(sample);
        }
    }
}

/// Cluster messages with the default similarity threshold
pub fn group(messages: &[String]) -> Vec<MessageGroup> {
    group_with_threshold(messages, DEFAULT_SIMILARITY_THRESHOLD)
}

pub fn group_with_threshold(messages: &[String], threshold: f64) -> Vec<MessageGroup> {
    if messages.is_empty() {
        return Vec::new();
    }

    // Exact merge, keeping first-seen order
    let mut provisional: Vec<MessageGroup> = Vec::new();
    let mut index_by_template: HashMap<String, usize> = HashMap::new();

    for message in messages {
        let template = normalize(message);
        let idx = match index_by_template.get(&template) {
            Some(&idx) => idx,
            None => {
                provisional.push(MessageGroup::new(template.clone()));
                index_by_template.insert(template, provisional.len() - 1);
                provisional.len() - 1
            }
        };
        let group = &mut provisional[idx];
        group.count += 1;
        group.push_sample(message);
    }

    // Single pass: j folds into the first live i it is similar to
    let mut slots: Vec<Option<MessageGroup>> = provisional.into_iter().map(Some).collect();
    for i in 0..slots.len() {
        if slots[i].is_none() {
            continue;
        }
        for j in (i + 1)..slots.len() {
            let merge = match (&slots[i], &slots[j]) {
                (Some(a), Some(b)) => similarity(&a.template, &b.template) >= threshold,
                _ => false,
            };
            if !merge {
                continue;
            }
            if let Some(absorbed) = slots[j].take() {
                if let Some(target) = slots[i].as_mut() {
                    target.absorb(absorbed);
                }
            }
        }
    }

    let mut groups: Vec<MessageGroup> = slots.into_iter().flatten().collect();
    groups.sort_by(|a, b| b.count.cmp(&a.count));
    groups
}

/// Normalized edit similarity in `[0, 1]`
pub fn similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f64 / max_len as f64
}

/// Unit-cost edit distance over characters
pub fn levenshtein(a: &str, b: &str) -> usize {
    strsim::levenshtein(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msgs(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_group_empty() {
        assert!(group(&[]).is_empty());
    }

    #[test]
    fn test_group_uuid_variants_merge() {
        let messages = msgs(&[
            "Failed request 550e8400-e29b-41d4-a716-446655440000",
            "Failed request 660e8400-e29b-41d4-a716-446655440001",
            "Failed request 770e8400-e29b-41d4-a716-446655440002",
        ]);

        let groups = group(&messages);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].template, "Failed request <UUID>");
        assert_eq!(groups[0].count, 3);
        assert_eq!(groups[0].samples.len(), 3);
    }

    #[test]
    fn test_group_distinct_messages_stay_apart() {
        let messages = msgs(&[
            "Error: connection refused",
            "Warning: disk space low",
            "Info: deployment started",
        ]);

        let groups = group(&messages);
        assert_eq!(groups.len(), 3);
        assert!(groups.iter().all(|g| g.count == 1));
    }

    #[test]
    fn test_group_identical_messages_cap_samples() {
        let messages = vec!["disk full".to_string(); 7];

        let groups = group(&messages);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].count, 7);
        assert_eq!(groups[0].samples.len(), MAX_SAMPLES_PER_GROUP);
    }

    #[test]
    fn test_group_similar_templates_merge() {
        let messages = msgs(&[
            "user login failed for account alpha",
            "user login failed for account alphb",
            "user login failed for account alpha",
        ]);

        let groups = group(&messages);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].count, 3);
        assert_eq!(groups[0].template, "user login failed for account alpha");
    }

    #[test]
    fn test_group_sorted_by_count_desc() {
        let messages = msgs(&["rare event", "common thing", "common thing", "common thing"]);

        let groups = group(&messages);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].template, "common thing");
        assert_eq!(groups[0].count, 3);
        assert_eq!(groups[1].count, 1);
    }

    #[test]
    fn test_group_counts_sum_to_input() {
        let messages = msgs(&[
            "timeout after 30 seconds",
            "timeout after 45 seconds",
            "cache miss for key users",
            "cache miss for key orders",
            "shutdown requested",
        ]);

        let groups = group(&messages);
        let total: u64 = groups.iter().map(|g| g.count).sum();
        assert_eq!(total, messages.len() as u64);
        assert!(groups.iter().all(|g| g.samples.len() <= MAX_SAMPLES_PER_GROUP));
    }

    #[test]
    fn test_threshold_one_only_merges_exact_templates() {
        let messages = msgs(&["abcdef", "abcdeg"]);
        assert_eq!(group_with_threshold(&messages, 1.0).len(), 2);
        assert_eq!(group_with_threshold(&messages, 0.5).len(), 1);
    }

    #[test]
    fn test_similarity() {
        assert_eq!(similarity("", ""), 1.0);
        assert_eq!(similarity("same", "same"), 1.0);
        assert_eq!(similarity("abc", ""), 0.0);
        assert!((similarity("kitten", "sitting") - (1.0 - 3.0 / 7.0)).abs() < 1e-9);
    }

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("flaw", "lawn"), 2);
        assert_eq!(levenshtein("same", "same"), 0);
    }
}
