//! Approximate name matching for "did you mean" suggestions.

/// Default upper bound on edit distance for a name to count as a suggestion.
pub const DEFAULT_MAX_DISTANCE: usize = 3;

/// Default number of suggestions returned.
pub const DEFAULT_LIMIT: usize = 5;

/// A candidate name and its distance from the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimilarityCandidate {
    pub name: String,
    pub distance: usize,
}

/// Case-insensitive Levenshtein distance.
///
/// `table[i][j]` holds the distance between the first `j` characters of `a`
/// and the first `i` characters of `b`.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().flat_map(char::to_lowercase).collect();
    let b: Vec<char> = b.chars().flat_map(char::to_lowercase).collect();

    let mut table = vec![vec![0usize; a.len() + 1]; b.len() + 1];
    for (i, row) in table.iter_mut().enumerate() {
        row[0] = i;
    }
    for (j, cell) in table[0].iter_mut().enumerate() {
        *cell = j;
    }

    for i in 1..=b.len() {
        for j in 1..=a.len() {
            table[i][j] = if b[i - 1] == a[j - 1] {
                table[i - 1][j - 1]
            } else {
                1 + table[i - 1][j - 1]
                    .min(table[i][j - 1])
                    .min(table[i - 1][j])
            };
        }
    }

    table[b.len()][a.len()]
}

/// Scores every candidate against `target` and keeps the near misses.
///
/// Exact (case-insensitive) matches and anything farther than `max_distance`
/// are dropped. The result is sorted by distance; ties keep input order.
pub fn rank_candidates<S: AsRef<str>>(
    target: &str,
    candidates: &[S],
    max_distance: usize,
    limit: usize,
) -> Vec<SimilarityCandidate> {
    let target = target.to_lowercase();
    let mut scored: Vec<SimilarityCandidate> = candidates
        .iter()
        .map(|c| SimilarityCandidate {
            name: c.as_ref().to_string(),
            distance: edit_distance(&target, c.as_ref()),
        })
        .filter(|c| c.distance > 0 && c.distance <= max_distance)
        .collect();

    scored.sort_by_key(|c| c.distance);
    scored.truncate(limit);
    scored
}

/// Names from `candidates` that look like typos of `target`, closest first.
pub fn rank_similar<S: AsRef<str>>(
    target: &str,
    candidates: &[S],
    max_distance: usize,
    limit: usize,
) -> Vec<String> {
    rank_candidates(target, candidates, max_distance, limit)
        .into_iter()
        .map(|c| c.name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_and_empty() {
        for s in ["", "users", "Ünïcode", "a b c"] {
            assert_eq!(edit_distance(s, s), 0);
        }
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("abc", ""), 3);
    }

    #[test]
    fn test_symmetry() {
        let pairs = [("kitten", "sitting"), ("users", "usres"), ("flaw", "lawn"), ("", "x")];
        for (a, b) in pairs {
            assert_eq!(edit_distance(a, b), edit_distance(b, a), "{a} / {b}");
        }
    }

    #[test]
    fn test_known_distances() {
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("usres", "users"), 2);
        assert_eq!(edit_distance("naem", "name"), 2);
        assert_eq!(edit_distance("email", "emails"), 1);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(edit_distance("USERS", "users"), 0);
        assert_eq!(edit_distance("Name", "naME"), 0);
    }

    #[test]
    fn test_rank_similar_typo() {
        let candidates = ["users", "orders", "user_roles"];
        assert_eq!(rank_similar("usres", &candidates, 3, 5), vec!["users"]);
    }

    #[test]
    fn test_rank_excludes_exact_match() {
        let candidates = ["users", "Users", "user"];
        assert_eq!(rank_similar("users", &candidates, 3, 5), vec!["user"]);
    }

    #[test]
    fn test_rank_orders_by_distance_then_input() {
        let candidates = ["cart", "card", "cards", "car"];
        let ranked = rank_candidates("carx", &candidates, 3, 5);
        let names: Vec<_> = ranked.iter().map(|c| c.name.as_str()).collect();
        // cart, card and car are all one edit away and keep input order
        assert_eq!(names, vec!["cart", "card", "car", "cards"]);
        assert_eq!(ranked[0].distance, 1);
        assert_eq!(ranked[3].distance, 2);
    }

    #[test]
    fn test_rank_respects_limit_and_max_distance() {
        let candidates = ["ab", "ac", "ad", "ae", "af", "ag", "zzzzzz"];
        assert_eq!(rank_similar("aa", &candidates, 3, 5).len(), 5);
        assert!(rank_similar("aa", &candidates, 0, 5).is_empty());
        assert!(!rank_similar("aa", &candidates, 3, 10).contains(&"zzzzzz".to_string()));
    }

    #[test]
    fn test_rank_returns_original_casing() {
        assert_eq!(rank_similar("custmers", &["Customers"], 3, 5), vec!["Customers"]);
    }
}
