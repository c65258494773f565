//! Region metadata from the Wikidata knowledge base.
//!
//! Lookups are best effort: the region name is searched with progressively
//! less context until some entity matches, and only the first match is
//! read. Every field of the result is optional.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use tracing::debug;

use crate::config::MetadataConfig;
use crate::models::{Region, RegionKind};

const POPULATION: &str = "P1082";
const COORDINATES: &str = "P625";
const AREA: &str = "P2046";
const COUNTRY: &str = "P17";
const CAPITAL: &str = "P36";
const OFFICIAL_WEBSITE: &str = "P856";
const OSM_RELATION: &str = "P402";

/// Latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    /// Degrees north
    pub latitude: f64,
    /// Degrees east
    pub longitude: f64,
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Area amount with its unit label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Area {
    /// Amount
    pub amount: f64,
    /// Unit label (e.g., "square kilometre")
    pub unit: String,
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unit.is_empty() {
            write!(f, "{}", self.amount)
        } else {
            write!(f, "{} {}", self.amount, self.unit)
        }
    }
}

/// Everything the knowledge base may know about a region.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RegionMetadata {
    /// Entity id (e.g., "Q11198")
    pub entity: String,
    /// Population
    pub population: Option<u64>,
    /// Coordinate location
    pub coordinates: Option<Coordinates>,
    /// Area
    pub area: Option<Area>,
    /// Country label
    pub country: Option<String>,
    /// Capital or county seat label
    pub capital: Option<String>,
    /// Official website URL
    pub official_website: Option<String>,
    /// OpenStreetMap relation id
    pub osm_relation: Option<String>,
    /// English Wikipedia URL
    pub wikipedia: Option<String>,
}

/// Raw claims of one entity, before entity references are labelled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityClaims {
    /// Entity id
    pub entity: String,
    /// Population
    pub population: Option<u64>,
    /// Coordinate location
    pub coordinates: Option<Coordinates>,
    /// Area amount
    pub area_amount: Option<f64>,
    /// Area unit entity id ("1" for unitless)
    pub area_unit: Option<String>,
    /// Country entity id
    pub country: Option<String>,
    /// Capital entity id
    pub capital: Option<String>,
    /// Official website URL
    pub official_website: Option<String>,
    /// OpenStreetMap relation id
    pub osm_relation: Option<String>,
    /// English Wikipedia article title
    pub wikipedia_title: Option<String>,
}

impl EntityClaims {
    /// Entity ids that need a label to be displayed.
    #[must_use]
    pub fn label_ids(&self) -> Vec<String> {
        [&self.country, &self.capital, &self.area_unit]
            .into_iter()
            .flatten()
            .filter(|id| is_entity_id(id))
            .cloned()
            .collect()
    }

    /// Builds display metadata, replacing entity ids with their labels.
    #[must_use]
    pub fn resolve(self, labels: &BTreeMap<String, String>) -> RegionMetadata {
        let label = |id: Option<String>| id.map(|id| labels.get(&id).cloned().unwrap_or(id));

        let area = self.area_amount.map(|amount| Area {
            amount,
            unit: match self.area_unit.as_deref() {
                None | Some("1") => String::new(),
                Some(unit) => labels.get(unit).cloned().unwrap_or_else(|| unit.to_string()),
            },
        });

        RegionMetadata {
            entity: self.entity,
            population: self.population,
            coordinates: self.coordinates,
            area,
            country: label(self.country),
            capital: label(self.capital),
            official_website: self.official_website,
            osm_relation: self.osm_relation,
            wikipedia: self.wikipedia_title.map(|title| wikipedia_url(&title)),
        }
    }
}

/// A knowledge base that can be searched by text.
pub trait SearchBackend {
    /// Entity ids matching `text`, best match first.
    fn search(&self, text: &str) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Metadata of one entity.
    fn entity(&self, id: &str) -> impl Future<Output = Result<RegionMetadata>> + Send;
}

/// Wikidata action API client.
#[derive(Debug, Clone)]
pub struct WikidataBackend {
    client: reqwest::Client,
    endpoint: String,
    language: String,
}

impl WikidataBackend {
    /// Creates a client for the given API endpoint.
    pub fn new(endpoint: &str, user_agent: &str, language: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            language: language.to_string(),
        })
    }

    /// Creates a client from the `[metadata]` config section.
    pub fn from_config(config: &MetadataConfig) -> Result<Self> {
        Self::new(&config.endpoint, &config.user_agent, &config.language)
    }

    async fn get(&self, params: &[(&str, &str)]) -> Result<Value> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(params)
            .query(&[("format", "json")])
            .send()
            .await
            .with_context(|| format!("Request to {} failed", self.endpoint))?
            .error_for_status()
            .context("Knowledge base returned an error status")?;

        response
            .json()
            .await
            .context("Knowledge base returned invalid JSON")
    }

    async fn labels(&self, ids: &[String]) -> Result<BTreeMap<String, String>> {
        if ids.is_empty() {
            return Ok(BTreeMap::new());
        }
        let joined = ids.join("|");
        let body = self
            .get(&[
                ("action", "wbgetentities"),
                ("ids", joined.as_str()),
                ("props", "labels"),
                ("languages", self.language.as_str()),
            ])
            .await?;
        Ok(parse_labels(&body, &self.language))
    }
}

impl SearchBackend for WikidataBackend {
    async fn search(&self, text: &str) -> Result<Vec<String>> {
        let body = self
            .get(&[
                ("action", "wbsearchentities"),
                ("search", text),
                ("language", self.language.as_str()),
                ("type", "item"),
                ("limit", "5"),
            ])
            .await?;
        Ok(parse_search(&body))
    }

    async fn entity(&self, id: &str) -> Result<RegionMetadata> {
        let body = self
            .get(&[
                ("action", "wbgetentities"),
                ("ids", id),
                ("props", "claims|sitelinks"),
                ("sitefilter", "enwiki"),
            ])
            .await?;
        let claims = parse_entity(&body, id)?;
        let labels = self.labels(&claims.label_ids()).await?;
        Ok(claims.resolve(&labels))
    }
}

/// Search strategy over a backend.
#[derive(Debug, Clone)]
pub struct MetadataLookup<B> {
    backend: B,
}

impl<B: SearchBackend> MetadataLookup<B> {
    /// Wraps a backend.
    pub const fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Looks up metadata for a region of the catalog.
    pub async fn lookup_region(&self, region: &Region) -> Result<Option<RegionMetadata>> {
        self.lookup(&region.name, region.kind, region.parent.as_deref())
            .await
    }

    /// Searches "name type parent", then "name parent", then "name" and
    /// reads the first entity of the first non-empty result set.
    pub async fn lookup(
        &self,
        name: &str,
        kind: RegionKind,
        parent: Option<&str>,
    ) -> Result<Option<RegionMetadata>> {
        for query in search_queries(name, kind, parent) {
            let ids = self.backend.search(&query).await?;
            debug!("Search '{}' matched {} entities", query, ids.len());

            if let Some(id) = ids.first() {
                return self.backend.entity(id).await.map(Some);
            }
        }
        Ok(None)
    }
}

/// Queries tried in order, most specific first, without duplicates.
#[must_use]
pub fn search_queries(name: &str, kind: RegionKind, parent: Option<&str>) -> Vec<String> {
    let term = kind.search_term();
    let candidates = match parent {
        Some(parent) => vec![
            format!("{name} {term} {parent}"),
            format!("{name} {parent}"),
            name.to_string(),
        ],
        None => vec![format!("{name} {term}"), name.to_string()],
    };

    let mut queries: Vec<String> = Vec::with_capacity(candidates.len());
    for query in candidates {
        if !queries.contains(&query) {
            queries.push(query);
        }
    }
    queries
}

/// Entity ids from a `wbsearchentities` response.
#[must_use]
pub fn parse_search(body: &Value) -> Vec<String> {
    body.get("search")
        .and_then(Value::as_array)
        .map(|hits| {
            hits.iter()
                .filter_map(|hit| hit.get("id").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Labels from a `wbgetentities` response with `props=labels`.
#[must_use]
pub fn parse_labels(body: &Value, language: &str) -> BTreeMap<String, String> {
    body.get("entities")
        .and_then(Value::as_object)
        .map(|entities| {
            entities
                .iter()
                .filter_map(|(id, entity)| {
                    let label = entity.pointer(&format!("/labels/{language}/value"))?.as_str()?;
                    Some((id.clone(), label.to_string()))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Claims of entity `id` from a `wbgetentities` response.
pub fn parse_entity(body: &Value, id: &str) -> Result<EntityClaims> {
    let entity = body
        .get("entities")
        .and_then(|entities| entities.get(id))
        .with_context(|| format!("Response has no entity '{id}'"))?;

    if entity.get("missing").is_some() {
        anyhow::bail!("Entity '{id}' does not exist");
    }

    let empty = serde_json::Map::new();
    let claims = entity
        .get("claims")
        .and_then(Value::as_object)
        .unwrap_or(&empty);
    let value = |property: &str| claims.get(property).and_then(claim_value);

    let area = value(AREA);

    Ok(EntityClaims {
        entity: id.to_string(),
        population: value(POPULATION)
            .and_then(parse_amount)
            .filter(|amount| *amount >= 0.0)
            .map(|amount| amount.round() as u64),
        coordinates: value(COORDINATES).and_then(|v| {
            Some(Coordinates {
                latitude: v.get("latitude")?.as_f64()?,
                longitude: v.get("longitude")?.as_f64()?,
            })
        }),
        area_amount: area.and_then(parse_amount),
        area_unit: area
            .and_then(|v| v.get("unit"))
            .and_then(Value::as_str)
            .map(|unit| unit.rsplit('/').next().unwrap_or(unit).to_string()),
        country: value(COUNTRY).and_then(entity_ref),
        capital: value(CAPITAL).and_then(entity_ref),
        official_website: value(OFFICIAL_WEBSITE)
            .and_then(Value::as_str)
            .map(str::to_string),
        osm_relation: value(OSM_RELATION).and_then(Value::as_str).map(str::to_string),
        wikipedia_title: entity
            .pointer("/sitelinks/enwiki/title")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

/// URL of an English Wikipedia article.
#[must_use]
pub fn wikipedia_url(title: &str) -> String {
    format!("https://en.wikipedia.org/wiki/{}", title.replace(' ', "_"))
}

/// Datavalue of the preferred statement, or of the first one.
fn claim_value(statements: &Value) -> Option<&Value> {
    let statements = statements.as_array()?;
    let chosen = statements
        .iter()
        .find(|s| s.get("rank").and_then(Value::as_str) == Some("preferred"))
        .or_else(|| statements.first())?;
    chosen.pointer("/mainsnak/datavalue/value")
}

fn parse_amount(value: &Value) -> Option<f64> {
    value
        .get("amount")?
        .as_str()?
        .trim_start_matches('+')
        .parse()
        .ok()
}

fn entity_ref(value: &Value) -> Option<String> {
    value.get("id").and_then(Value::as_str).map(str::to_string)
}

fn is_entity_id(id: &str) -> bool {
    id.strip_prefix('Q')
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
}
