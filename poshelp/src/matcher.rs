//! Topic matching between user queries and section titles.
//!
//! Titles are scored with the Ratcliff/Obershelp "gestalt" ratio: the
//! longest common block is found, then the same search recurses on both
//! sides of it. The ratio is `2 * matched / (len(a) + len(b))`. In a second
//! sequence of 200 or more characters, characters occurring more than
//! `len / 100 + 1` times are not used to seed blocks.

use std::collections::HashMap;

use crate::library::HelpEntry;

/// Default similarity a title must exceed to match without a substring hit.
pub const DEFAULT_THRESHOLD: f64 = 0.6;

/// Sequences at least this long get the popular-element heuristic.
const AUTOJUNK_MIN_LEN: usize = 200;

/// Normalize text for matching: lowercase, `_`/`-` to spaces, trimmed.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .replace(['_', '-'], " ")
        .trim()
        .to_string()
}

/// Similarity ratio in `0.0..=1.0` between two strings.
///
/// Two empty strings are identical (`1.0`).
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let matched = SequenceMatcher::new(&a, &b).matched_len();
    2.0 * matched as f64 / total as f64
}

/// Longest-matching-block search over two char sequences.
#[derive(Debug)]
struct SequenceMatcher<'a> {
    /// First sequence.
    a: &'a [char],
    /// Second sequence.
    b: &'a [char],
    /// Positions of each element of `b`, minus popular elements.
    b_index: HashMap<char, Vec<usize>>,
}

impl<'a> SequenceMatcher<'a> {
    /// Index `b`, dropping elements that occur in more than 1% of a long `b`.
    fn new(a: &'a [char], b: &'a [char]) -> Self {
        let mut b_index: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, &c) in b.iter().enumerate() {
            b_index.entry(c).or_default().push(j);
        }

        if b.len() >= AUTOJUNK_MIN_LEN {
            let popular_limit = b.len() / 100 + 1;
            b_index.retain(|_, positions| positions.len() <= popular_limit);
        }

        Self { a, b, b_index }
    }

    /// Longest block `a[i..i+k] == b[j..j+k]` within the given bounds.
    ///
    /// Earliest `i` wins, then earliest `j`.
    fn find_longest_match(
        &self,
        alo: usize,
        ahi: usize,
        blo: usize,
        bhi: usize,
    ) -> (usize, usize, usize) {
        let (mut best_i, mut best_j, mut best_len) = (alo, blo, 0);
        let mut run_len: HashMap<usize, usize> = HashMap::new();

        for i in alo..ahi {
            let mut next_run_len = HashMap::new();
            if let Some(positions) = self.b_index.get(&self.a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| run_len.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    next_run_len.insert(j, k);
                    if k > best_len {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_len = k;
                    }
                }
            }
            run_len = next_run_len;
        }

        // Popular elements are missing from b_index; extend the block over them.
        while best_i > alo && best_j > blo && self.a[best_i - 1] == self.b[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_len += 1;
        }
        while best_i + best_len < ahi
            && best_j + best_len < bhi
            && self.a[best_i + best_len] == self.b[best_j + best_len]
        {
            best_len += 1;
        }

        (best_i, best_j, best_len)
    }

    /// Total size of all matching blocks.
    fn matched_len(&self) -> usize {
        let mut total = 0;
        let mut pending = vec![(0, self.a.len(), 0, self.b.len())];

        while let Some((alo, ahi, blo, bhi)) = pending.pop() {
            let (i, j, k) = self.find_longest_match(alo, ahi, blo, bhi);
            if k == 0 {
                continue;
            }
            total += k;
            if alo < i && blo < j {
                pending.push((alo, i, blo, j));
            }
            if i + k < ahi && j + k < bhi {
                pending.push((i + k, ahi, j + k, bhi));
            }
        }

        total
    }
}

/// One matching entry.
#[derive(Debug, Clone, Copy, PartialEq)]
#[non_exhaustive]
pub struct Hit {
    /// Position of the entry in the searched slice.
    pub index: usize,
    /// Similarity between the normalized query and title.
    pub score: f64,
    /// Whether the query occurs verbatim inside the title.
    pub substring: bool,
}

/// Result of matching a query against a set of entries.
#[derive(Debug, Clone, Default, PartialEq)]
#[non_exhaustive]
pub struct TopicMatch {
    /// Matching entries in original entry order.
    pub hits: Vec<Hit>,
    /// Position in `hits` of the best match.
    pub best: Option<usize>,
}

impl TopicMatch {
    /// Whether nothing matched.
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Number of matching entries.
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// The best hit.
    pub fn best_hit(&self) -> Option<&Hit> {
        self.best.and_then(|b| self.hits.get(b))
    }

    /// Step order: best match first, then the other hits in entry order.
    pub fn step_order(&self) -> Vec<usize> {
        let Some(best) = self.best_hit() else {
            return Vec::new();
        };
        std::iter::once(best.index)
            .chain(
                self.hits
                    .iter()
                    .map(|h| h.index)
                    .filter(|&i| i != best.index),
            )
            .collect()
    }
}

/// Match a raw query against entry titles.
///
/// An entry matches when the normalized query is a substring of its
/// normalized title, or when their similarity exceeds `threshold`.
pub fn match_topic(query: &str, entries: &[HelpEntry], threshold: f64) -> TopicMatch {
    let query = normalize(query);
    let mut result = TopicMatch::default();
    if query.is_empty() {
        return result;
    }
    let mut best_score = f64::NEG_INFINITY;

    for (index, entry) in entries.iter().enumerate() {
        let title = normalize(&entry.title);
        let score = similarity(&query, &title);
        let substring = title.contains(query.as_str());

        if substring || score > threshold {
            if score > best_score {
                best_score = score;
                result.best = Some(result.hits.len());
            }
            result.hits.push(Hit {
                index,
                score,
                substring,
            });
        }
    }

    tracing::debug!(
        query = %query,
        hits = result.hits.len(),
        best = ?result.best_hit().map(|h| h.index),
        "matched topic"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(titles: &[&str]) -> Vec<HelpEntry> {
        titles
            .iter()
            .enumerate()
            .map(|(i, t)| HelpEntry::new(*t, "...", format!("p{}.png", i + 1)))
            .collect()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Void_Sale-Item "), "void sale item");
        assert_eq!(normalize("PRINT RECEIPT"), "print receipt");
    }

    #[test]
    fn test_similarity_known_ratios() {
        assert!(approx(similarity("abcd", "bcde"), 0.75));
        assert!(approx(similarity("print", "print label"), 10.0 / 16.0));
        assert!(approx(similarity("print", "print receipt"), 10.0 / 18.0));
        assert!(approx(similarity("abxcd", "abcd"), 8.0 / 9.0));
        assert!(approx(similarity("", ""), 1.0));
        assert!(approx(similarity("abc", ""), 0.0));
    }

    #[test]
    fn test_similarity_recurses_on_both_sides() {
        // "xxd" is found first, then "ab" to its left.
        assert!(approx(similarity("abxxd", "abyxxd"), 2.0 * 5.0 / 11.0));
    }

    #[test]
    fn test_similarity_popular_elements_in_long_sequences() {
        let long = format!("b{}", "a".repeat(199));
        assert!(approx(similarity("aab", &long), 2.0 / 203.0));
        let short = format!("b{}", "a".repeat(198));
        assert!(approx(similarity("aab", &short), 4.0 / 202.0));
        // A popular element can still be reached by block extension.
        assert!(approx(similarity("a", &"a".repeat(200)), 2.0 / 201.0));
    }

    #[test]
    fn test_substring_matches_regardless_of_score() {
        let set = entries(&["CLOSING THE REGISTER AT END OF DAY AND PRINTING Z REPORT"]);
        let result = match_topic("z report", &set, DEFAULT_THRESHOLD);
        assert_eq!(result.len(), 1);
        assert!(result.hits[0].substring);
        assert!(result.hits[0].score < DEFAULT_THRESHOLD);
    }

    #[test]
    fn test_print_matches_both_entries() {
        let set = entries(&["PRINT RECEIPT", "PRINT LABEL"]);
        let result = match_topic("print", &set, DEFAULT_THRESHOLD);
        assert_eq!(result.hits.iter().map(|h| h.index).collect::<Vec<_>>(), vec![0, 1]);
        // "print label" is the shorter title, so it scores higher.
        assert_eq!(result.best_hit().map(|h| h.index), Some(1));
        assert_eq!(result.step_order(), vec![1, 0]);
    }

    #[test]
    fn test_tie_goes_to_first_entry() {
        let set = entries(&["PRINT RECEIPT", "PRINT REPORTS"]);
        let result = match_topic("print", &set, DEFAULT_THRESHOLD);
        assert_eq!(result.len(), 2);
        assert!(approx(result.hits[0].score, result.hits[1].score));
        assert_eq!(result.best_hit().map(|h| h.index), Some(0));
        assert_eq!(result.step_order(), vec![0, 1]);
    }

    #[test]
    fn test_best_has_highest_score() {
        let set = entries(&["SALE", "VOID SALE", "SALES REPORT", "VOID ITEM", "RETURNS"]);
        let result = match_topic("void sale", &set, DEFAULT_THRESHOLD);
        let best = result.best_hit().unwrap();
        assert_eq!(best.index, 1);
        assert!(result.hits.iter().all(|h| best.score >= h.score));
    }

    #[test]
    fn test_fuzzy_match_above_threshold() {
        let set = entries(&["PRICE OVERRIDE"]);
        let result = match_topic("price overide", &set, DEFAULT_THRESHOLD);
        assert_eq!(result.len(), 1);
        assert!(!result.hits[0].substring);
    }

    #[test]
    fn test_ratio_equal_to_threshold_does_not_match() {
        assert!(approx(similarity("price", "print"), 0.6));
        let set = entries(&["PRINT"]);
        assert!(match_topic("price", &set, DEFAULT_THRESHOLD).is_empty());
    }

    #[test]
    fn test_ratio_just_above_threshold_matches() {
        assert!(approx(similarity("refund", "returns"), 8.0 / 13.0));
        let set = entries(&["RETURNS"]);
        let result = match_topic("refund", &set, DEFAULT_THRESHOLD);
        assert_eq!(result.len(), 1);
        assert!(!result.hits[0].substring);
    }

    #[test]
    fn test_empty_normalized_query_matches_nothing() {
        let set = entries(&["LOGIN", "PRINT LABEL", "VOID SALE"]);
        assert!(match_topic("-", &set, DEFAULT_THRESHOLD).is_empty());
        assert!(match_topic(" __ ", &set, DEFAULT_THRESHOLD).is_empty());
    }

    #[test]
    fn test_no_match_is_empty() {
        let set = entries(&["PRINT RECEIPT", "CASH DRAWER", "LOGIN"]);
        let result = match_topic("refund policy", &set, DEFAULT_THRESHOLD);
        assert!(result.is_empty());
        assert!(result.best_hit().is_none());
        assert!(result.step_order().is_empty());
    }

    #[test]
    fn test_query_normalization_applies_to_query() {
        let set = entries(&["GIFT CARD BALANCE"]);
        let result = match_topic("  Gift_Card ", &set, DEFAULT_THRESHOLD);
        assert_eq!(result.len(), 1);
        assert!(result.hits[0].substring);
    }
}
