use crate::output::{or_dash, print_json, print_table};
use chrono::Utc;
use clap::Subcommand;
use ordenes_core::area::NewArea;
use std::path::Path;

#[derive(Subcommand)]
pub enum AreaSubcommand {
    /// Add an area to the catalog
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        responsible: String,
        #[arg(long)]
        contact: Option<String>,
    },

    /// List catalog areas
    List,
}

pub fn run(root: &Path, subcmd: AreaSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        AreaSubcommand::Create {
            name,
            responsible,
            contact,
        } => create(
            root,
            &NewArea {
                name,
                responsible,
                contact,
            },
            json,
        ),
        AreaSubcommand::List => list(root, json),
    }
}

fn create(root: &Path, new: &NewArea, json: bool) -> anyhow::Result<()> {
    let engine = super::open_engine(root)?;
    let area = engine.store().create_area(new, Utc::now())?;
    if json {
        return print_json(&area);
    }
    println!("Created area {} '{}'", area.id, area.name);
    Ok(())
}

fn list(root: &Path, json: bool) -> anyhow::Result<()> {
    let engine = super::open_engine(root)?;
    let areas = engine.store().list_areas(None)?;
    if json {
        return print_json(&areas);
    }
    if areas.is_empty() {
        println!("No areas.");
        return Ok(());
    }
    let rows = areas
        .iter()
        .map(|a| {
            vec![
                a.id.to_string(),
                a.name.clone(),
                a.responsible.clone(),
                or_dash(a.contact.as_deref()),
                if a.active { "yes" } else { "no" }.to_string(),
            ]
        })
        .collect();
    print_table(&["ID", "NAME", "RESPONSIBLE", "CONTACT", "ACTIVE"], rows);
    Ok(())
}
