//! Gazetteer resolution cascade
//!
//! Maps recognized spans to de-duplicated locations through a strict
//! exact -> alias -> fuzzy cascade. The first tier that succeeds wins;
//! there is no backtracking to a lower tier even when it would score a
//! higher raw similarity, so strategy and confidence are reproducible
//! for any given span text.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use strsim::jaro_winkler;
use tracing::trace;

use histmap_core::{Location, MatchStrategy, ResolverConfig};
use histmap_gazetteer::{normalize_name, GazetteerEntry, GazetteerIndex};

use crate::Result;

// ============================================================================
// Resolution outcome
// ============================================================================

/// A successful cascade match
#[derive(Debug, Clone)]
pub struct Resolution {
    /// The de-duplicated location the span resolved to
    pub location: Location,

    pub strategy: MatchStrategy,

    /// 1.0 for exact, the fixed alias constant for alias matches,
    /// scaled similarity (always below the alias constant) for fuzzy
    pub confidence: f32,
}

// ============================================================================
// Location registry
// ============================================================================

/// Append-only map from gazetteer identity to Location.
///
/// Guarantees at most one Location per normalized canonical name for the
/// lifetime of a run; shared across concurrently processed documents.
#[derive(Default)]
pub struct LocationRegistry {
    inner: Mutex<HashMap<String, Location>>,
}

impl LocationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The Location for a gazetteer entry, created on first sight
    pub fn get_or_create(&self, entry: &GazetteerEntry) -> Location {
        let mut inner = self.inner.lock().expect("location registry poisoned");
        inner
            .entry(entry.key.clone())
            .or_insert_with(|| {
                let mut location = Location::new(&entry.name);
                location.point = entry.point;
                location.country_code = entry.country_code.clone();
                location.population = entry.population;
                location
            })
            .clone()
    }

    /// All locations created so far, sorted by name
    pub fn locations(&self) -> Vec<Location> {
        let inner = self.inner.lock().expect("location registry poisoned");
        let mut locations: Vec<Location> = inner.values().cloned().collect();
        locations.sort_by(|a, b| a.name.cmp(&b.name));
        locations
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("location registry poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// Resolver
// ============================================================================

/// The resolution cascade over a shared read-only gazetteer index
pub struct Resolver {
    index: Arc<GazetteerIndex>,
    registry: Arc<LocationRegistry>,
    config: ResolverConfig,
}

impl Resolver {
    /// Create a resolver; rejects configurations that break the
    /// exact > alias > fuzzy confidence ordering
    pub fn new(index: Arc<GazetteerIndex>, config: ResolverConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            index,
            registry: Arc::new(LocationRegistry::new()),
            config,
        })
    }

    /// Share the location registry with the storage hand-off
    pub fn registry(&self) -> Arc<LocationRegistry> {
        Arc::clone(&self.registry)
    }

    /// Run the cascade for one span text.
    ///
    /// `None` is the expected outcome for spans the gazetteer does not
    /// know; it is counted, never raised.
    pub fn resolve(&self, span_text: &str) -> Option<Resolution> {
        let key = normalize_name(span_text);
        if key.is_empty() {
            return None;
        }

        let candidates = self.index.lookup(&key);

        // Tier 1: the normalized span is a canonical name
        if let Some(entry) = candidates.iter().find(|entry| entry.key == key) {
            return Some(self.resolution(entry, MatchStrategy::Exact, 1.0));
        }

        // Tier 2: alias match - key equality against an alias first,
        // then substring/superstring containment against candidate keys
        if let Some(entry) = candidates.first() {
            return Some(self.resolution(entry, MatchStrategy::Alias, self.config.alias_confidence));
        }
        if let Some(entry) = self.containment_match(&key) {
            return Some(self.resolution(entry, MatchStrategy::Alias, self.config.alias_confidence));
        }

        // Tier 3: fuzzy similarity over the approximate candidate set
        if let Some((entry, similarity)) = self.fuzzy_match(&key) {
            let confidence = similarity * self.config.fuzzy_scale;
            return Some(self.resolution(entry, MatchStrategy::Fuzzy, confidence));
        }

        trace!(span = span_text, "span unresolved");
        None
    }

    /// Closest containment pair among the approximate candidates,
    /// picked by smallest length difference then lexicographic key
    fn containment_match(&self, key: &str) -> Option<&GazetteerEntry> {
        if key.len() < self.config.min_containment_len {
            return None;
        }

        let mut best: Option<(usize, &str, &GazetteerEntry)> = None;
        for entry in self.index.fuzzy_candidates(key) {
            for candidate_key in entry.keys() {
                if candidate_key.len() < self.config.min_containment_len
                    || candidate_key == key
                    || !(candidate_key.contains(key) || key.contains(candidate_key))
                {
                    continue;
                }
                let distance = candidate_key.len().abs_diff(key.len());
                let closer = match &best {
                    None => true,
                    Some((best_distance, best_key, _)) => {
                        distance < *best_distance
                            || (distance == *best_distance && candidate_key < *best_key)
                    }
                };
                if closer {
                    best = Some((distance, candidate_key, entry));
                }
            }
        }
        best.map(|(_, _, entry)| entry)
    }

    /// Best Jaro-Winkler score at or above the threshold (inclusive)
    fn fuzzy_match(&self, key: &str) -> Option<(&GazetteerEntry, f32)> {
        if key.len() < self.config.min_fuzzy_len {
            return None;
        }

        let mut best: Option<(f32, &str, &GazetteerEntry)> = None;
        for entry in self.index.fuzzy_candidates(key) {
            for candidate_key in entry.keys() {
                let similarity = jaro_winkler(key, candidate_key) as f32;
                let better = match &best {
                    None => true,
                    Some((best_similarity, best_key, _)) => {
                        similarity > *best_similarity
                            || (similarity == *best_similarity && candidate_key < *best_key)
                    }
                };
                if better {
                    best = Some((similarity, candidate_key, entry));
                }
            }
        }

        match best {
            Some((similarity, _, entry)) if similarity >= self.config.fuzzy_threshold => {
                Some((entry, similarity))
            }
            _ => None,
        }
    }

    fn resolution(
        &self,
        entry: &GazetteerEntry,
        strategy: MatchStrategy,
        confidence: f32,
    ) -> Resolution {
        Resolution {
            location: self.registry.get_or_create(entry),
            strategy,
            confidence,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
