//! Region listing command.

use crate::cli::common::{print_heading, print_json, CliError, CliResult, MapInput};
use crate::models::{Region, RegionKind};
use clap::{Args, ValueEnum};
use serde::Serialize;

/// Region level filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindFilter {
    /// Counties only
    County,
    /// States only
    State,
}

impl From<KindFilter> for RegionKind {
    fn from(kind: KindFilter) -> Self {
        match kind {
            KindFilter::County => Self::County,
            KindFilter::State => Self::State,
        }
    }
}

/// List the regions of a map catalog
#[derive(Debug, Clone, Args)]
pub struct RegionsArgs {
    /// Path to a TopoJSON or GeoJSON region catalog
    #[arg(short, long, value_name = "FILE")]
    pub map: std::path::PathBuf,

    /// Only list regions of this level
    #[arg(long, value_enum)]
    pub kind: Option<KindFilter>,

    /// Only list members of a Census region, division or state
    #[arg(long, value_name = "NAME")]
    pub group: Option<String>,

    /// List isolation group names instead of regions
    #[arg(long, conflicts_with_all = ["kind", "group"])]
    pub groups: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// One listed region.
#[derive(Debug, Serialize)]
struct RegionInfo {
    id: String,
    name: String,
    kind: RegionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent: Option<String>,
}

impl From<&Region> for RegionInfo {
    fn from(region: &Region) -> Self {
        Self {
            id: region.id.clone(),
            name: region.name.clone(),
            kind: region.kind,
            parent: region.parent.clone(),
        }
    }
}

impl RegionsArgs {
    /// Execute the regions command
    pub fn execute(&self) -> CliResult<()> {
        let input = MapInput {
            map: self.map.clone(),
            script: None,
        };
        let catalog = input.catalog()?;

        if self.groups {
            let names = catalog.group_names();
            if self.json {
                return print_json(&names);
            }
            print_heading("Region Groups");
            for name in names {
                println!("  {name}");
            }
            return Ok(());
        }

        let members = match &self.group {
            Some(group) => {
                let members = catalog.group_members(group);
                if members.is_empty() {
                    return Err(CliError::validation(format!(
                        "Group '{group}' matches no regions"
                    )));
                }
                Some(members)
            }
            None => None,
        };
        let kind = self.kind.map(RegionKind::from);

        let regions: Vec<RegionInfo> = catalog
            .regions()
            .filter(|region| kind.map_or(true, |k| k == region.kind))
            .filter(|region| members.as_ref().map_or(true, |m| m.contains(&region.id)))
            .map(RegionInfo::from)
            .collect();

        if self.json {
            return print_json(&regions);
        }

        print_heading(&format!("Regions ({})", regions.len()));
        for region in &regions {
            match &region.parent {
                Some(parent) => println!(
                    "  {:<6} {}, {} ({})",
                    region.id, region.name, parent, region.kind
                ),
                None => println!("  {:<6} {} ({})", region.id, region.name, region.kind),
            }
        }
        Ok(())
    }
}
