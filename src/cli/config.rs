//! Configuration management CLI commands.

use crate::cli::common::{load_config, print_heading, print_json, CliError, CliResult};
use crate::config::{Config, ImageFormat};
use crate::models::RgbColor;
use clap::{Args, Subcommand};
use std::path::PathBuf;

/// Configuration management commands
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Display current configuration
    Show(ConfigShowArgs),
    /// Print the configuration file location
    Path,
    /// Set configuration values
    Set(ConfigSetArgs),
    /// Write a default configuration file
    Init(ConfigInitArgs),
}

/// Display current configuration
#[derive(Args, Debug)]
pub struct ConfigShowArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Set configuration values
#[derive(Args, Debug)]
pub struct ConfigSetArgs {
    /// Maximum number of distinct map key colors
    #[arg(long, value_name = "N")]
    max_colors: Option<usize>,

    /// Maximum map key label length
    #[arg(long, value_name = "N")]
    max_label_len: Option<usize>,

    /// Default image format (png or jpeg)
    #[arg(long, value_name = "FORMAT")]
    format: Option<String>,

    /// Default resolution multiplier
    #[arg(long, value_name = "FACTOR")]
    scale: Option<f64>,

    /// Image background color
    #[arg(long, value_name = "COLOR")]
    background: Option<String>,

    /// Directory for exported files
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Draw the map key on images (true or false)
    #[arg(long, value_name = "BOOL")]
    show_legend: Option<bool>,

    /// Knowledge base API endpoint
    #[arg(long, value_name = "URL")]
    endpoint: Option<String>,

    /// Knowledge base language
    #[arg(long, value_name = "LANG")]
    language: Option<String>,
}

/// Write a default configuration file
#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Overwrite an existing file
    #[arg(long)]
    force: bool,
}

impl ConfigArgs {
    /// Execute config subcommand
    pub fn execute(&self) -> CliResult<()> {
        match &self.command {
            ConfigCommand::Show(args) => args.execute(),
            ConfigCommand::Path => {
                println!("{}", config_path()?.display());
                Ok(())
            }
            ConfigCommand::Set(args) => args.execute(),
            ConfigCommand::Init(args) => args.execute(),
        }
    }
}

fn config_path() -> CliResult<PathBuf> {
    Config::config_file_path().map_err(|e| CliError::io(format!("{e:#}")))
}

impl ConfigShowArgs {
    /// Execute show command
    pub fn execute(&self) -> CliResult<()> {
        let config = load_config()?;

        if self.json {
            print_json(&config)
        } else {
            output_human_readable(&config);
            Ok(())
        }
    }
}

impl ConfigSetArgs {
    const fn is_empty(&self) -> bool {
        self.max_colors.is_none()
            && self.max_label_len.is_none()
            && self.format.is_none()
            && self.scale.is_none()
            && self.background.is_none()
            && self.output_dir.is_none()
            && self.show_legend.is_none()
            && self.endpoint.is_none()
            && self.language.is_none()
    }

    /// Execute set command
    pub fn execute(&self) -> CliResult<()> {
        if self.is_empty() {
            return Err(CliError::validation(
                "At least one configuration option must be specified (see --help)",
            ));
        }

        let mut config = load_config()?;

        if let Some(n) = self.max_colors {
            config.legend.max_colors = n;
        }
        if let Some(n) = self.max_label_len {
            config.legend.max_label_len = n;
        }
        if let Some(format) = &self.format {
            config.export.format = format
                .parse::<ImageFormat>()
                .map_err(|e| CliError::validation(e.to_string()))?;
        }
        if let Some(scale) = self.scale {
            config.export.scale = scale;
        }
        if let Some(color) = &self.background {
            config.export.background = RgbColor::parse(color)
                .map_err(|e| CliError::validation(format!("Invalid background color: {e}")))?;
        }
        if let Some(path) = &self.output_dir {
            std::fs::create_dir_all(path).map_err(|e| {
                CliError::io(format!(
                    "Failed to create output directory {}: {}",
                    path.display(),
                    e
                ))
            })?;
            config.export.output_dir = Some(path.clone());
        }
        if let Some(show) = self.show_legend {
            config.export.show_legend = show;
        }
        if let Some(endpoint) = &self.endpoint {
            config.metadata.endpoint.clone_from(endpoint);
        }
        if let Some(language) = &self.language {
            config.metadata.language.clone_from(language);
        }

        config
            .validate()
            .map_err(|e| CliError::validation(format!("Invalid configuration: {e}")))?;
        config
            .save()
            .map_err(|e| CliError::io(format!("Failed to save configuration: {e:#}")))?;

        println!("Configuration updated successfully.");
        Ok(())
    }
}

impl ConfigInitArgs {
    /// Execute init command
    pub fn execute(&self) -> CliResult<()> {
        let path = config_path()?;
        if path.exists() && !self.force {
            return Err(CliError::validation(format!(
                "Configuration already exists at {} (use --force to overwrite)",
                path.display()
            )));
        }

        Config::new()
            .save_to(&path)
            .map_err(|e| CliError::io(format!("Failed to save configuration: {e:#}")))?;

        println!("Wrote default configuration to {}", path.display());
        Ok(())
    }
}

/// Output configuration in human-readable format
fn output_human_readable(config: &Config) {
    print_heading("CountyMap Configuration");
    println!();

    println!("Legend:");
    println!("  Max Colors: {}", config.legend.max_colors);
    println!("  Max Label Length: {}", config.legend.max_label_len);
    println!();

    println!("Export:");
    println!("  Format: {}", config.export.format);
    println!("  Scale: {}", config.export.scale);
    println!(
        "  Base Size: {}x{}",
        config.export.base_width, config.export.base_height
    );
    println!("  Show Legend: {}", config.export.show_legend);
    println!("  Background: {}", config.export.background);
    match &config.export.output_dir {
        Some(dir) => println!("  Output Directory: {}", dir.display()),
        None => println!("  Output Directory: (current directory)"),
    }
    println!();

    println!("Metadata:");
    println!("  Endpoint: {}", config.metadata.endpoint);
    println!("  Language: {}", config.metadata.language);
    println!();
}
