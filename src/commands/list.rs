//! List command implementation
//!
//! Lists every unit of the store with its version, tier, state and the
//! location it was installed from.

use std::path::PathBuf;
use std::sync::Arc;

use console::Style;

use crate::cli::ListArgs;
use crate::error::Result;
use crate::registry::{FsRegistry, Unit, UnitRegistry, UnitState};
use crate::source::UrlSource;

/// Run list command
pub fn run(store: Option<PathBuf>, args: ListArgs) -> Result<()> {
    let registry = FsRegistry::open(&super::store_path(store), Arc::new(UrlSource::default()))?;
    let units = registry.installed_units()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&units)?);
    } else {
        print_units(&units);
    }
    Ok(())
}

fn print_units(units: &[Unit]) {
    println!("Installed units ({}):", units.len());
    println!();

    for unit in units {
        let state = match unit.state {
            UnitState::Active => Style::new().green().apply_to("active"),
            UnitState::Installed => Style::new().dim().apply_to("installed"),
        };
        println!(
            "  {:>4}  {} {}  {}",
            unit.id,
            Style::new().bold().yellow().apply_to(&unit.symbolic_name),
            unit.version,
            state
        );
        println!(
            "        {} {}  {} {}{}",
            Style::new().bold().apply_to("Tier:"),
            unit.tier,
            Style::new().bold().apply_to("Location:"),
            unit.location,
            if unit.fragment { "  (fragment)" } else { "" }
        );
    }
}
