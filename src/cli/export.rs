//! Export commands for map images and region data.

use crate::cli::common::{load_config, report_notices, CliError, CliResult, MapInput};
use crate::config::{Config, ImageFormat};
use crate::export::{
    build_records, deliver, to_json, Destination, ExportComposer, ExportError, ExportField,
    ExportOptions,
};
use crate::models::Region;
use crate::services::{MetadataLookup, RegionMetadata, WikidataBackend};
use chrono::Utc;
use clap::{Args, Subcommand, ValueEnum};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{info, warn};

/// Export the colored map as an image or the selection as JSON
#[derive(Debug, Clone, Args)]
pub struct ExportArgs {
    /// Export target
    #[command(subcommand)]
    pub command: ExportCommand,
}

/// Export targets.
#[derive(Debug, Clone, Subcommand)]
pub enum ExportCommand {
    /// Render the map and its key to PNG, JPEG or SVG
    Image(ImageArgs),
    /// Write the colored regions and their metadata as JSON
    Json(JsonArgs),
}

/// Image output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// PNG raster
    Png,
    /// JPEG raster
    #[value(alias = "jpg")]
    Jpeg,
    /// SVG vector document
    Svg,
}

/// Output location flags shared by export targets.
#[derive(Debug, Clone, Args)]
pub struct OutputArgs {
    /// Exact output file
    #[arg(short, long, value_name = "FILE", conflicts_with = "output_dir")]
    pub output: Option<PathBuf>,

    /// Directory for a generated, timestamped file name
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

impl OutputArgs {
    fn destination(&self, config: &Config) -> Destination {
        if let Some(path) = &self.output {
            return Destination::File(path.clone());
        }
        let dir = self
            .output_dir
            .clone()
            .or_else(|| config.export.output_dir.clone())
            .unwrap_or_else(|| PathBuf::from("."));
        Destination::Directory(dir)
    }
}

/// Render the colored map
#[derive(Debug, Clone, Args)]
pub struct ImageArgs {
    /// Map catalog and script
    #[command(flatten)]
    pub input: MapInput,

    /// Output location
    #[command(flatten)]
    pub output: OutputArgs,

    /// Image format (defaults to the configured format)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Resolution multiplier (defaults to the configured scale)
    #[arg(long, value_name = "FACTOR")]
    pub scale: Option<f64>,

    /// Leave the map key out of the image
    #[arg(long)]
    pub no_legend: bool,
}

/// Export colored regions as JSON
#[derive(Debug, Clone, Args)]
pub struct JsonArgs {
    /// Map catalog and script
    #[command(flatten)]
    pub input: MapInput,

    /// Output location
    #[command(flatten)]
    pub output: OutputArgs,

    /// Comma-separated fields to include (defaults to all)
    #[arg(long, value_delimiter = ',', value_name = "FIELDS")]
    pub fields: Vec<ExportField>,

    /// Skip knowledge-base lookups; metadata fields become "N/A"
    #[arg(long)]
    pub offline: bool,
}

impl ExportArgs {
    /// Execute the export command
    pub fn execute(&self) -> CliResult<()> {
        match &self.command {
            ExportCommand::Image(args) => args.execute(),
            ExportCommand::Json(args) => args.execute(),
        }
    }
}

impl ImageArgs {
    /// Execute the image export
    pub fn execute(&self) -> CliResult<()> {
        let config = load_config()?;
        let session = self.input.session(&config)?;
        report_notices(session.notices());

        let mut options = ExportOptions::from(&config.export);
        if let Some(scale) = self.scale {
            options.scale = scale;
        }
        if self.no_legend {
            options.show_legend = false;
        }
        let format = self.format.unwrap_or(match config.export.format {
            ImageFormat::Png => OutputFormat::Png,
            ImageFormat::Jpeg => OutputFormat::Jpeg,
        });
        match format {
            OutputFormat::Png => options.format = ImageFormat::Png,
            OutputFormat::Jpeg => options.format = ImageFormat::Jpeg,
            OutputFormat::Svg => {}
        }

        let composer = ExportComposer::new(options);
        let destination = self.output.destination(&config);
        let now = Utc::now();

        let path = match format {
            OutputFormat::Svg => composer.export_svg(session.store(), &destination, now),
            OutputFormat::Png | OutputFormat::Jpeg => {
                composer.export_image(session.store(), &destination, now)
            }
        }
        .map_err(export_error)?;

        println!("Exported map to {}", path.display());
        Ok(())
    }
}

impl JsonArgs {
    /// Execute the JSON export
    pub fn execute(&self) -> CliResult<()> {
        let config = load_config()?;
        let session = self.input.session(&config)?;
        report_notices(session.notices());

        let store = session.store();
        let fields: Vec<ExportField> = if self.fields.is_empty() {
            ExportField::ALL.to_vec()
        } else {
            self.fields.clone()
        };

        let regions: Vec<&Region> = store
            .selections()
            .filter_map(|(id, _)| store.catalog().get(id))
            .collect();

        let metadata = if self.offline || !fields.iter().any(|f| f.needs_metadata()) {
            BTreeMap::new()
        } else {
            fetch_metadata(&config, &regions)?
        };

        let records = build_records(store, &metadata, &fields);
        let json = to_json(&records).map_err(export_error)?;

        let path = deliver(
            json.as_bytes(),
            &self.output.destination(&config),
            "json",
            Utc::now(),
        )
        .map_err(export_error)?;

        println!("Exported {} regions to {}", records.len(), path.display());
        Ok(())
    }
}

/// Looks up every region; failures are logged and leave the region out.
fn fetch_metadata(
    config: &Config,
    regions: &[&Region],
) -> CliResult<BTreeMap<String, RegionMetadata>> {
    if regions.is_empty() {
        return Ok(BTreeMap::new());
    }

    let backend = WikidataBackend::from_config(&config.metadata)
        .map_err(|e| CliError::io(format!("{e:#}")))?;
    let lookup = MetadataLookup::new(backend);
    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::io(format!("Failed to start async runtime: {e}")))?;

    let metadata = runtime.block_on(async {
        let mut metadata = BTreeMap::new();
        for region in regions {
            match lookup.lookup_region(region).await {
                Ok(Some(found)) => {
                    metadata.insert(region.id.clone(), found);
                }
                Ok(None) => info!("No knowledge-base entry for {}", region.display_name()),
                Err(e) => warn!("Metadata lookup for {} failed: {e:#}", region.display_name()),
            }
        }
        metadata
    });

    Ok(metadata)
}

fn export_error(err: ExportError) -> CliError {
    match err {
        ExportError::InvalidDimensions { .. } => CliError::validation(err.to_string()),
        other => CliError::io(other.to_string()),
    }
}
