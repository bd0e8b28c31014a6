//! Raw gazetteer source parsing
//!
//! Three heterogeneous source shapes feed the index build:
//! - a bulk cities table (TSV: name, alternate names, lat, lon, country
//!   code, population)
//! - a historical supplement in Linked Places Format JSON (features with
//!   a title, an optional Point geometry, and toponym variants)
//! - a regional override table (TOML), applied last so curated entries
//!   win over the bulk data
//!
//! A malformed row is skipped with a warning; only an unreadable file or
//! an unparseable top-level document is an error.

use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::{GazetteerError, Result};

// ============================================================================
// Raw place records
// ============================================================================

/// Which raw source a record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTag {
    /// Bulk cities table
    Cities,
    /// Historical Linked Places supplement
    LinkedPlaces,
    /// Regional override table
    Overrides,
}

impl SourceTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cities => "cities",
            Self::LinkedPlaces => "linked_places",
            Self::Overrides => "overrides",
        }
    }
}

impl std::fmt::Display for SourceTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One place row as parsed from a raw source, before merging
#[derive(Debug, Clone)]
pub struct RawPlace {
    /// Canonical (display) name
    pub name: String,

    /// Alternate names, not yet normalized
    pub aliases: Vec<String>,

    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub country_code: Option<String>,
    pub population: Option<u64>,

    pub source: SourceTag,
}

// ============================================================================
// Bulk cities TSV
// ============================================================================

/// Parse the bulk cities table.
///
/// Expected columns, tab-separated:
/// `name <TAB> alternate,names <TAB> latitude <TAB> longitude <TAB> country_code <TAB> population`
///
/// Lines starting with `#` are comments. Rows with a missing name or
/// unparseable coordinates are skipped with a warning.
pub fn parse_cities_tsv(path: &Path) -> Result<Vec<RawPlace>> {
    let content = std::fs::read_to_string(path).map_err(|e| GazetteerError::IoError {
        path: path.display().to_string(),
        source: e,
    })?;

    let mut places = Vec::new();
    let mut skipped = 0usize;

    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim_end();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match parse_cities_row(line) {
            Some(place) => places.push(place),
            None => {
                skipped += 1;
                warn!(line = line_no + 1, path = %path.display(), "skipping malformed cities row");
            }
        }
    }

    if skipped > 0 {
        warn!(skipped, kept = places.len(), "cities source had malformed rows");
    }
    Ok(places)
}

fn parse_cities_row(line: &str) -> Option<RawPlace> {
    let mut fields = line.split('\t');

    let name = fields.next()?.trim();
    if name.is_empty() {
        return None;
    }

    let aliases: Vec<String> = fields
        .next()
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|alias| !alias.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let latitude: f64 = fields.next()?.trim().parse().ok()?;
    let longitude: f64 = fields.next()?.trim().parse().ok()?;

    let country_code = fields
        .next()
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(str::to_string);
    let population = fields.next().and_then(|raw| raw.trim().parse().ok());

    Some(RawPlace {
        name: name.to_string(),
        aliases,
        latitude: Some(latitude),
        longitude: Some(longitude),
        country_code,
        population,
        source: SourceTag::Cities,
    })
}

// ============================================================================
// Linked Places JSON
// ============================================================================

#[derive(Debug, Deserialize)]
struct LinkedPlacesFile {
    #[serde(default)]
    features: Vec<LinkedPlacesFeature>,
}

#[derive(Debug, Deserialize)]
struct LinkedPlacesFeature {
    #[serde(default)]
    properties: LinkedPlacesProperties,
    geometry: Option<LinkedPlacesGeometry>,
    #[serde(default)]
    names: Vec<LinkedPlacesName>,
}

#[derive(Debug, Default, Deserialize)]
struct LinkedPlacesProperties {
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LinkedPlacesGeometry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    coordinates: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct LinkedPlacesName {
    toponym: Option<String>,
}

/// Parse a Linked Places Format historical gazetteer.
///
/// Each feature contributes its `properties.title` as the canonical name
/// and every `names[].toponym` as an alias. Point geometries yield
/// coordinates (`[lon, lat]` order per GeoJSON); features without a
/// usable geometry are kept without coordinates, since many historical
/// places have none. Features without a title are skipped with a warning.
pub fn parse_linked_places(path: &Path) -> Result<Vec<RawPlace>> {
    let content = std::fs::read_to_string(path).map_err(|e| GazetteerError::IoError {
        path: path.display().to_string(),
        source: e,
    })?;

    let file: LinkedPlacesFile =
        serde_json::from_str(&content).map_err(|e| GazetteerError::ParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

    let mut places = Vec::new();
    let mut skipped = 0usize;

    for (index, feature) in file.features.into_iter().enumerate() {
        let Some(name) = feature.properties.title.filter(|t| !t.trim().is_empty()) else {
            skipped += 1;
            warn!(feature = index, path = %path.display(), "skipping feature without a title");
            continue;
        };

        let (latitude, longitude) = match feature.geometry {
            Some(geometry) if geometry.kind == "Point" && geometry.coordinates.len() >= 2 => {
                (Some(geometry.coordinates[1]), Some(geometry.coordinates[0]))
            }
            _ => (None, None),
        };

        let aliases: Vec<String> = feature
            .names
            .into_iter()
            .filter_map(|variant| variant.toponym)
            .filter(|toponym| !toponym.trim().is_empty())
            .collect();

        places.push(RawPlace {
            name: name.trim().to_string(),
            aliases,
            latitude,
            longitude,
            country_code: None,
            population: None,
            source: SourceTag::LinkedPlaces,
        });
    }

    if skipped > 0 {
        warn!(skipped, kept = places.len(), "linked places source had unusable features");
    }
    Ok(places)
}

// ============================================================================
// Regional override table (TOML)
// ============================================================================

#[derive(Debug, Deserialize)]
struct OverridesFile {
    #[serde(default)]
    places: Vec<OverridePlace>,
}

#[derive(Debug, Deserialize)]
struct OverridePlace {
    name: String,
    #[serde(default)]
    aliases: Vec<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    country_code: Option<String>,
}

/// Parse the regional override table.
///
/// ```toml
/// [[places]]
/// name = "Aix-la-Chapelle"
/// aliases = ["Aachen", "Aix", "Aquisgranum"]
/// latitude = 50.7753
/// longitude = 6.0839
/// country_code = "DE"
/// ```
pub fn parse_overrides_toml(path: &Path) -> Result<Vec<RawPlace>> {
    let content = std::fs::read_to_string(path).map_err(|e| GazetteerError::IoError {
        path: path.display().to_string(),
        source: e,
    })?;

    let file: OverridesFile = toml::from_str(&content).map_err(|e| GazetteerError::ParseError {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let mut places = Vec::new();
    for (index, row) in file.places.into_iter().enumerate() {
        if row.name.trim().is_empty() {
            warn!(entry = index, path = %path.display(), "skipping override with empty name");
            continue;
        }
        places.push(RawPlace {
            name: row.name.trim().to_string(),
            aliases: row.aliases,
            latitude: row.latitude,
            longitude: row.longitude,
            country_code: row.country_code,
            population: None,
            source: SourceTag::Overrides,
        });
    }
    Ok(places)
}

// ============================================================================
// Tests
// ============================================================================
