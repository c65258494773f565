//! Session replay command.

use crate::cli::common::{
    load_config, print_heading, print_json, report_notices, CliResult, MapInput,
};
use crate::map::{Notice, SelectionSnapshot};
use clap::Args;
use serde::Serialize;
use std::collections::BTreeMap;

/// Replay an action script and print the resulting map state
#[derive(Debug, Clone, Args)]
pub struct SessionArgs {
    /// Map catalog and script
    #[command(flatten)]
    pub input: MapInput,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// JSON output of a replayed session.
#[derive(Debug, Serialize)]
struct SessionOutput<'a> {
    #[serde(flatten)]
    snapshot: SelectionSnapshot,
    tooltips: BTreeMap<String, String>,
    notices: &'a [Notice],
}

impl SessionArgs {
    /// Execute the session command
    pub fn execute(&self) -> CliResult<()> {
        let config = load_config()?;
        let session = self.input.session(&config)?;
        let store = session.store();

        if self.json {
            let tooltips = store
                .selections()
                .map(|(id, selection)| (id.clone(), selection.tooltip()))
                .collect();
            return print_json(&SessionOutput {
                snapshot: store.snapshot(),
                tooltips,
                notices: session.notices(),
            });
        }

        report_notices(session.notices());

        print_heading("Map Session");
        println!(
            "Mode: {}",
            if store.multi_color() { "multi-color" } else { "single color" }
        );
        match store.isolation().mode() {
            Some(mode) => println!(
                "Isolation: {mode} ({} visible regions)",
                store.isolation().visible().len()
            ),
            None => println!("Isolation: off"),
        }

        println!();
        println!("Colored regions ({}):", store.selections().count());
        for (id, selection) in store.selections() {
            println!(
                "  {:<6} {:<16} {}",
                id,
                selection.colors.to_hex_vec().join(" / "),
                selection.tooltip()
            );
        }

        println!();
        println!(
            "Map key ({} of {} colors):",
            store.legend().len(),
            store.legend().max_colors()
        );
        for row in store.legend().rows() {
            println!("  {}  {} ({} regions)", row.color, row.label, row.members.len());
        }

        Ok(())
    }
}
