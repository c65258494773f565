//! Knowledge-base lookup command.

use crate::cli::common::{load_config, print_heading, print_json, CliError, CliResult, MapInput};
use crate::cli::regions::KindFilter;
use crate::models::RegionKind;
use crate::services::{MetadataLookup, RegionMetadata, WikidataBackend};
use clap::Args;
use std::path::PathBuf;

/// Look up knowledge-base metadata for a county or state
#[derive(Debug, Clone, Args)]
pub struct LookupArgs {
    /// Region name, e.g. "Travis" or "Texas"
    #[arg(value_name = "NAME", required_unless_present = "region")]
    pub name: Option<String>,

    /// Region level of NAME
    #[arg(long, value_enum, default_value = "county")]
    pub kind: KindFilter,

    /// Containing state of NAME, for counties
    #[arg(long, value_name = "STATE")]
    pub parent: Option<String>,

    /// Look up a region of a map catalog by id instead of by name
    #[arg(long, value_name = "ID", requires = "map", conflicts_with = "name")]
    pub region: Option<String>,

    /// Map catalog used with --region
    #[arg(short, long, value_name = "FILE")]
    pub map: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl LookupArgs {
    /// Execute the lookup command
    pub fn execute(&self) -> CliResult<()> {
        let (name, kind, parent) = self.target()?;
        let config = load_config()?;

        let backend = WikidataBackend::from_config(&config.metadata)
            .map_err(|e| CliError::io(format!("{e:#}")))?;
        let lookup = MetadataLookup::new(backend);
        let runtime = tokio::runtime::Runtime::new()
            .map_err(|e| CliError::io(format!("Failed to start async runtime: {e}")))?;

        let found = runtime
            .block_on(lookup.lookup(&name, kind, parent.as_deref()))
            .map_err(|e| CliError::io(format!("Lookup failed: {e:#}")))?;

        let Some(metadata) = found else {
            return Err(CliError::validation(format!("No results found for '{name}'")));
        };

        if self.json {
            return print_json(&metadata);
        }

        let title = match &parent {
            Some(parent) => format!("{name}, {parent}"),
            None => name.clone(),
        };
        print_heading(&title);
        print_metadata(&metadata);
        Ok(())
    }

    /// Name, level and parent to search for.
    fn target(&self) -> CliResult<(String, RegionKind, Option<String>)> {
        if let (Some(id), Some(map)) = (&self.region, &self.map) {
            let input = MapInput {
                map: map.clone(),
                script: None,
            };
            let catalog = input.catalog()?;
            let region = catalog
                .get(id)
                .ok_or_else(|| CliError::validation(format!("Unknown region '{id}'")))?;
            return Ok((region.name.clone(), region.kind, region.parent.clone()));
        }

        let name = self
            .name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| CliError::validation("A region name or --region is required"))?;
        Ok((name, self.kind.into(), self.parent.clone()))
    }
}

fn print_metadata(metadata: &RegionMetadata) {
    let rows = [
        ("Entity", Some(metadata.entity.clone())),
        ("Population", metadata.population.map(|p| p.to_string())),
        ("Coordinates", metadata.coordinates.map(|c| c.to_string())),
        ("Area", metadata.area.as_ref().map(ToString::to_string)),
        ("Country", metadata.country.clone()),
        ("Capital", metadata.capital.clone()),
        ("Website", metadata.official_website.clone()),
        ("OSM relation", metadata.osm_relation.clone()),
        ("Wikipedia", metadata.wikipedia.clone()),
    ];
    for (label, value) in rows {
        println!("{:<14} {}", format!("{label}:"), value.as_deref().unwrap_or("N/A"));
    }
}
