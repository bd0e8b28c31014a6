//! Gazetteer index construction and lookup
//!
//! The builder flattens raw sources in application order and merges them
//! by normalized canonical name with last-source-wins semantics, so a
//! rebuild from the same sources in the same order always yields the
//! same index. The built index exposes an exact hash lookup plus a
//! trigram candidate index for the resolver's fuzzy tier.

use std::collections::HashMap;

use tracing::{info, warn};

use histmap_core::GeoPoint;

use crate::normalize::normalize_name;
use crate::source::{RawPlace, SourceTag};
use crate::{GazetteerError, Result};

/// Cap on candidates returned by the approximate path; keeps fuzzy
/// scoring bounded on short, common trigram sets
const MAX_FUZZY_CANDIDATES: usize = 64;

// ============================================================================
// Entries
// ============================================================================

/// One merged, immutable reference record
#[derive(Debug, Clone)]
pub struct GazetteerEntry {
    /// Canonical display name
    pub name: String,

    /// Normalized canonical name; the merge identity
    pub key: String,

    /// Normalized alias keys, sorted and de-duplicated
    pub aliases: Vec<String>,

    /// Coordinates, absent for some historical entries
    pub point: Option<GeoPoint>,

    pub country_code: Option<String>,
    pub population: Option<u64>,

    /// Which source last wrote this entry
    pub source: SourceTag,
}

impl GazetteerEntry {
    /// Does a normalized key match this entry exactly (canonical or alias)?
    pub fn matches_key(&self, key: &str) -> bool {
        self.key == key || self.aliases.binary_search_by(|a| a.as_str().cmp(key)).is_ok()
    }

    /// All normalized keys this entry answers to
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.key.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Accumulates raw sources in application order and builds the index.
///
/// Later sources override earlier ones on identical normalized canonical
/// names: present fields replace, absent fields inherit, aliases
/// accumulate.
#[derive(Default)]
pub struct GazetteerBuilder {
    places: Vec<RawPlace>,
}

impl GazetteerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one source's rows; call order is merge order
    pub fn add_source(mut self, places: Vec<RawPlace>) -> Self {
        self.places.extend(places);
        self
    }

    /// Merge and build the immutable index
    pub fn build(self) -> Result<GazetteerIndex> {
        let mut entries: Vec<GazetteerEntry> = Vec::new();
        let mut by_canonical: HashMap<String, usize> = HashMap::new();
        let mut skipped = 0usize;

        for place in self.places {
            let key = normalize_name(&place.name);
            if key.is_empty() {
                skipped += 1;
                warn!(name = %place.name, "skipping place that normalizes to nothing");
                continue;
            }

            let mut aliases: Vec<String> = place
                .aliases
                .iter()
                .map(|alias| normalize_name(alias))
                .filter(|alias| !alias.is_empty() && *alias != key)
                .collect();

            let point = match (place.latitude, place.longitude) {
                (Some(lat), Some(lon)) => {
                    let point = GeoPoint::new(lat, lon);
                    if point.is_valid() {
                        Some(point)
                    } else {
                        warn!(name = %place.name, lat, lon, "dropping out-of-range coordinates");
                        None
                    }
                }
                _ => None,
            };

            match by_canonical.get(&key) {
                Some(&index) => {
                    // Present fields replace, absent fields inherit,
                    // aliases accumulate
                    let existing = &mut entries[index];
                    aliases.append(&mut existing.aliases);
                    existing.name = place.name;
                    existing.aliases = aliases;
                    if point.is_some() {
                        existing.point = point;
                    }
                    if place.country_code.is_some() {
                        existing.country_code = place.country_code;
                    }
                    if place.population.is_some() {
                        existing.population = place.population;
                    }
                    existing.source = place.source;
                }
                None => {
                    by_canonical.insert(key.clone(), entries.len());
                    entries.push(GazetteerEntry {
                        name: place.name,
                        key,
                        aliases,
                        point,
                        country_code: place.country_code,
                        population: place.population,
                        source: place.source,
                    });
                }
            }
        }

        if entries.is_empty() {
            return Err(GazetteerError::EmptyIndex);
        }

        for entry in &mut entries {
            entry.aliases.sort();
            entry.aliases.dedup();
        }

        let mut by_key: HashMap<String, Vec<u32>> = HashMap::new();
        let mut trigram_index: HashMap<String, Vec<u32>> = HashMap::new();

        for (index, entry) in entries.iter().enumerate() {
            let id = index as u32;
            for key in entry.keys() {
                let bucket = by_key.entry(key.to_string()).or_default();
                if bucket.last() != Some(&id) {
                    bucket.push(id);
                }
                for gram in trigrams(key) {
                    let bucket = trigram_index.entry(gram).or_default();
                    if bucket.last() != Some(&id) {
                        bucket.push(id);
                    }
                }
            }
        }

        info!(
            entries = entries.len(),
            keys = by_key.len(),
            skipped,
            "gazetteer index built"
        );

        Ok(GazetteerIndex {
            entries,
            by_key,
            trigram_index,
        })
    }
}

// ============================================================================
// Index
// ============================================================================

/// Immutable in-memory gazetteer lookup structure.
///
/// Built once, then shared read-only; all lookups return candidates in
/// an explicitly sorted, deterministic order.
pub struct GazetteerIndex {
    entries: Vec<GazetteerEntry>,
    by_key: HashMap<String, Vec<u32>>,
    trigram_index: HashMap<String, Vec<u32>>,
}

impl GazetteerIndex {
    /// Number of merged entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, in merge order
    pub fn entries(&self) -> &[GazetteerEntry] {
        &self.entries
    }

    /// Exact lookup on a normalized key.
    ///
    /// Returns every entry whose canonical name or alias equals the key,
    /// ordered by specificity: canonical matches before alias matches,
    /// then longer canonical keys first, then lexicographic.
    pub fn lookup(&self, normalized: &str) -> Vec<&GazetteerEntry> {
        let Some(bucket) = self.by_key.get(normalized) else {
            return Vec::new();
        };

        let mut matches: Vec<&GazetteerEntry> =
            bucket.iter().map(|&id| &self.entries[id as usize]).collect();
        matches.sort_by(|a, b| {
            let a_canonical = a.key == normalized;
            let b_canonical = b.key == normalized;
            b_canonical
                .cmp(&a_canonical)
                .then(b.key.len().cmp(&a.key.len()))
                .then(a.key.cmp(&b.key))
        });
        matches
    }

    /// Approximate lookup: entries sharing enough trigrams with the key.
    ///
    /// This is the candidate set for fuzzy scoring, not a match by
    /// itself. Ordered by shared-trigram count (descending), then key,
    /// and capped, so scoring work stays bounded and deterministic.
    pub fn fuzzy_candidates(&self, normalized: &str) -> Vec<&GazetteerEntry> {
        let grams = trigrams(normalized);
        if grams.is_empty() {
            return Vec::new();
        }
        let min_overlap = if grams.len() <= 2 { 1 } else { 2 };

        let mut overlap: HashMap<u32, usize> = HashMap::new();
        for gram in &grams {
            if let Some(bucket) = self.trigram_index.get(gram) {
                for &id in bucket {
                    *overlap.entry(id).or_insert(0) += 1;
                }
            }
        }

        let mut scored: Vec<(usize, &GazetteerEntry)> = overlap
            .into_iter()
            .filter(|&(_, count)| count >= min_overlap)
            .map(|(id, count)| (count, &self.entries[id as usize]))
            .collect();
        scored.sort_by(|(a_count, a), (b_count, b)| {
            b_count.cmp(a_count).then(a.key.cmp(&b.key))
        });
        scored.truncate(MAX_FUZZY_CANDIDATES);

        scored.into_iter().map(|(_, entry)| entry).collect()
    }
}

/// Distinct character trigrams of a normalized key; a key shorter than
/// three characters is its own single gram
fn trigrams(key: &str) -> Vec<String> {
    let chars: Vec<char> = key.chars().collect();
    if chars.is_empty() {
        return Vec::new();
    }
    if chars.len() < 3 {
        return vec![key.to_string()];
    }

    let mut grams: Vec<String> = chars.windows(3).map(|w| w.iter().collect()).collect();
    grams.sort();
    grams.dedup();
    grams
}

// ============================================================================
// Tests
// ============================================================================
