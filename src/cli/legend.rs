//! Map key command.

use crate::cli::common::{
    load_config, print_heading, print_json, report_notices, CliError, CliResult, MapInput,
};
use crate::map::LegendRow;
use clap::Args;
use serde::Serialize;

/// Show the map key produced by an action script
#[derive(Debug, Clone, Args)]
pub struct LegendArgs {
    /// Map catalog and script
    #[command(flatten)]
    pub input: MapInput,

    /// Scale used to measure the rendered key
    #[arg(long, value_name = "FACTOR", default_value_t = 1.0)]
    pub scale: f64,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// JSON output of the legend command.
#[derive(Debug, Serialize)]
struct LegendOutput {
    max_colors: usize,
    scale: f64,
    width: f64,
    height: f64,
    rows: Vec<LegendRow>,
}

impl LegendArgs {
    /// Execute the legend command
    pub fn execute(&self) -> CliResult<()> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(CliError::validation(format!(
                "Scale must be a positive number, got {}",
                self.scale
            )));
        }

        let config = load_config()?;
        let session = self.input.session(&config)?;
        report_notices(session.notices());

        let legend = session.store().legend();
        let output = LegendOutput {
            max_colors: legend.max_colors(),
            scale: self.scale,
            width: legend.measure(self.scale),
            height: legend.measure_height(self.scale),
            rows: legend.rows(),
        };

        if self.json {
            return print_json(&output);
        }

        print_heading("Map Key");
        if output.rows.is_empty() {
            println!("No colors on the map");
            return Ok(());
        }
        for row in &output.rows {
            println!("  {}  {:<30} {}", row.color, row.label, row.members.join(", "));
        }
        println!();
        println!(
            "Rendered size at {}x: {:.0} x {:.0} px",
            output.scale, output.width, output.height
        );
        Ok(())
    }
}
