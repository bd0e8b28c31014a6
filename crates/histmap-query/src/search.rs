//! Relevance-ranked location search
//!
//! Three match strategies in relevance order: exact name, prefix,
//! substring. Results sort by relevance class then name, so the same
//! query over the same corpus always returns the same list.

use serde::Serialize;

use histmap_core::Location;

/// Queries shorter than this return nothing rather than matching half
/// the corpus
pub const MIN_QUERY_LEN: usize = 2;

/// One search result with its relevance class (1 = exact, 2 = prefix,
/// 3 = contains)
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub location: Location,
    pub relevance: u8,
}

/// Rank stored locations against a query, case-insensitive, capped at
/// `limit` results
pub fn search_locations(locations: &[Location], query: &str, limit: usize) -> Vec<SearchHit> {
    let query = query.trim().to_lowercase();
    if query.len() < MIN_QUERY_LEN {
        return Vec::new();
    }

    let mut hits: Vec<SearchHit> = locations
        .iter()
        .filter_map(|location| {
            let name = location.name.to_lowercase();
            let relevance = if name == query {
                1
            } else if name.starts_with(&query) {
                2
            } else if name.contains(&query) {
                3
            } else {
                return None;
            };
            Some(SearchHit {
                location: location.clone(),
                relevance,
            })
        })
        .collect();

    hits.sort_by(|a, b| {
        a.relevance
            .cmp(&b.relevance)
            .then(a.location.name.cmp(&b.location.name))
    });
    hits.truncate(limit);
    hits
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<Location> {
        ["Rome", "Romagna", "Oromocto", "Aachen", "Romainville"]
            .iter()
            .map(|name| Location::new(*name))
            .collect()
    }

    #[test]
    fn test_relevance_classes() {
        let hits = search_locations(&corpus(), "rome", 20);

        assert_eq!(hits[0].location.name, "Rome");
        assert_eq!(hits[0].relevance, 1);
        // No other location starts with or contains "rome"
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_prefix_before_contains() {
        let hits = search_locations(&corpus(), "rom", 20);

        let names: Vec<&str> = hits.iter().map(|h| h.location.name.as_str()).collect();
        assert_eq!(names, vec!["Romagna", "Romainville", "Rome", "Oromocto"]);
        assert_eq!(hits.last().unwrap().relevance, 3);
    }

    #[test]
    fn test_limit_applies_after_ranking() {
        let hits = search_locations(&corpus(), "rom", 2);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].location.name, "Romagna");
    }

    #[test]
    fn test_short_query_returns_nothing() {
        assert!(search_locations(&corpus(), "r", 20).is_empty());
        assert!(search_locations(&corpus(), "  ", 20).is_empty());
    }

    #[test]
    fn test_no_match() {
        assert!(search_locations(&corpus(), "atlantis", 20).is_empty());
    }
}
