//! Near-duplicate detection for generated titles and poll questions.
//!
//! Two strings are similar when one contains the other with a length
//! difference under [`CONTAINMENT_LENGTH_SLACK`], or when their normalized
//! Levenshtein similarity reaches the threshold. Comparison is
//! case-insensitive and counts Unicode scalar values.

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.7;

/// Containment only short-circuits when lengths differ by less than this.
pub const CONTAINMENT_LENGTH_SLACK: usize = 10;

/// A lowercased string with its characters split out once.
#[derive(Debug, Clone)]
struct Folded {
    text: String,
    chars: Vec<char>,
}

impl Folded {
    fn new(raw: &str) -> Self {
        let text = raw.to_lowercase();
        let chars = text.chars().collect();
        Self { text, chars }
    }

    fn len(&self) -> usize {
        self.chars.len()
    }

    fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }
}

/// Case-insensitive edit distance with unit insert, delete and substitute costs.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    char_distance(&Folded::new(a).chars, &Folded::new(b).chars)
}

/// Returns `1 - distance / max_len`, or `0.0` when both strings are empty.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    folded_ratio(&Folded::new(a), &Folded::new(b))
}

/// Returns whether `candidate` is too close to any of `existing`.
pub fn is_similar_to_existing<S: AsRef<str>>(
    candidate: &str,
    existing: &[S],
    threshold: f64,
) -> bool {
    let candidate = Folded::new(candidate);
    existing
        .iter()
        .any(|entry| folded_similar(&candidate, &Folded::new(entry.as_ref()), threshold))
}

/// Comparison set that grows with every admitted candidate.
#[derive(Debug, Clone)]
pub struct DuplicateFilter {
    seen: Vec<Folded>,
    threshold: f64,
}

impl DuplicateFilter {
    pub fn new<I, S>(existing: I, threshold: f64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            seen: existing
                .into_iter()
                .map(|entry| Folded::new(entry.as_ref()))
                .collect(),
            threshold,
        }
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub fn is_duplicate(&self, candidate: &str) -> bool {
        let candidate = Folded::new(candidate);
        self.seen
            .iter()
            .any(|entry| folded_similar(&candidate, entry, self.threshold))
    }

    /// Adds `candidate` to the set unless it is a near-duplicate.
    pub fn admit(&mut self, candidate: &str) -> bool {
        let folded = Folded::new(candidate);
        if self
            .seen
            .iter()
            .any(|entry| folded_similar(&folded, entry, self.threshold))
        {
            return false;
        }

        self.seen.push(folded);
        true
    }
}

fn folded_similar(candidate: &Folded, existing: &Folded, threshold: f64) -> bool {
    if candidate.is_empty() && existing.is_empty() {
        return false;
    }

    if !candidate.is_empty() && !existing.is_empty() {
        let contained =
            candidate.text.contains(&existing.text) || existing.text.contains(&candidate.text);
        if contained && candidate.len().abs_diff(existing.len()) < CONTAINMENT_LENGTH_SLACK {
            return true;
        }
    }

    folded_ratio(candidate, existing) >= threshold
}

fn folded_ratio(a: &Folded, b: &Folded) -> f64 {
    let max_len = a.len().max(b.len());
    if max_len == 0 {
        return 0.0;
    }

    let distance = char_distance(&a.chars, &b.chars);
    1.0 - distance as f64 / max_len as f64
}

fn char_distance(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];

    for (i, a_char) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, b_char) in b.iter().enumerate() {
            current[j + 1] = if a_char == b_char {
                previous[j]
            } else {
                1 + previous[j].min(previous[j + 1]).min(current[j])
            };
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

#[cfg(test)]
mod tests {
    use super::{
        DEFAULT_SIMILARITY_THRESHOLD, DuplicateFilter, is_similar_to_existing,
        levenshtein_distance, similarity_ratio,
    };

    #[test]
    fn distance_matches_classic_examples() {
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("abc", ""), 3);
        assert_eq!(levenshtein_distance("Flaw", "lawn"), 2);
        assert_eq!(levenshtein_distance("SAME", "same"), 0);
    }

    #[test]
    fn exact_match_ignores_case() {
        assert!(is_similar_to_existing(
            "React Hooks Guide",
            &["react hooks guide"],
            DEFAULT_SIMILARITY_THRESHOLD,
        ));
    }

    #[test]
    fn ratio_below_threshold_is_unique() {
        let candidate = "Using useEffect for Data Fetching";
        let existing = "Using useMemo for Performance";

        assert_eq!(levenshtein_distance(candidate, existing), 17);
        let ratio = similarity_ratio(candidate, existing);
        assert!((ratio - (1.0 - 17.0 / 33.0)).abs() < 1e-9);
        assert!(!is_similar_to_existing(
            candidate,
            &[existing],
            DEFAULT_SIMILARITY_THRESHOLD
        ));
    }

    #[test]
    fn ratio_at_or_above_threshold_is_similar() {
        assert!(is_similar_to_existing(
            "What is the default port for PostgreSQL?",
            &["What is the default port for MySQL?"],
            DEFAULT_SIMILARITY_THRESHOLD,
        ));
        assert!(!is_similar_to_existing(
            "Async Rust basics",
            &["Advanced SQL window functions"],
            DEFAULT_SIMILARITY_THRESHOLD,
        ));
    }

    #[test]
    fn containment_short_circuits_for_close_lengths_only() {
        assert!(is_similar_to_existing("Rust Traits", &["rust traits 101"], 0.99));
        assert!(!is_similar_to_existing(
            "Rust",
            &["Rust error handling with anyhow and thiserror"],
            DEFAULT_SIMILARITY_THRESHOLD,
        ));
    }

    #[test]
    fn empty_existing_list_is_never_similar() {
        let existing: [&str; 0] = [];
        assert!(!is_similar_to_existing(
            "Totally Unrelated Title About Cooking",
            &existing,
            DEFAULT_SIMILARITY_THRESHOLD,
        ));
    }

    // Two empty strings are treated as dissimilar, and an empty string does
    // not match anything through containment.
    #[test]
    fn empty_strings_do_not_block() {
        assert!(!is_similar_to_existing("", &[""], DEFAULT_SIMILARITY_THRESHOLD));
        assert!(!is_similar_to_existing("", &["abc"], DEFAULT_SIMILARITY_THRESHOLD));
        assert_eq!(similarity_ratio("", ""), 0.0);
    }

    #[test]
    fn stops_at_first_match_anywhere_in_list() {
        assert!(is_similar_to_existing(
            "Understanding Rust Lifetimes",
            &["Cooking pasta", "Understanding Rust Lifetime"],
            DEFAULT_SIMILARITY_THRESHOLD,
        ));
    }

    #[test]
    fn filter_rejects_duplicates_within_a_batch() {
        let mut filter = DuplicateFilter::new(["Docker layer caching"], DEFAULT_SIMILARITY_THRESHOLD);

        assert!(!filter.admit("docker layer caching!"));
        assert!(filter.admit("Understanding Rust Lifetimes"));
        assert!(!filter.admit("Understanding Rust Lifetime"));
        assert!(filter.is_duplicate("understanding rust lifetimes"));
        assert_eq!(filter.len(), 2);
    }
}
