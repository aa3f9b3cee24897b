//! Inspection of the detector class table.

use std::io::{self, Write};

use anyhow::Context;
use clap::Args;
use idscan_core::ClassTable;
use serde::Serialize;

use crate::config::BackendConfig;

/// Arguments of `idscan labels`.
#[derive(Debug, Clone, Args)]
pub struct LabelsArgs {
    /// Print the table as JSON.
    #[arg(long)]
    pub json: bool,

    #[clap(flatten)]
    pub backends: BackendConfig,
}

/// One row of the class table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct ClassRow {
    id: u32,
    name: String,
    text: bool,
}

/// Prints every class and whether its regions are sent to recognition.
///
/// Configured text labels that the table lacks are listed afterwards.
pub fn run(args: &LabelsArgs) -> anyhow::Result<()> {
    args.backends
        .pipeline
        .validate()
        .context("invalid pipeline configuration")?;

    let table = args.backends.class_table()?;
    let taxonomy = args.backends.pipeline.taxonomy();
    let bound = taxonomy.bind(&table);
    let rows = class_rows(&table, |id| bound.classify(id).is_some());

    let mut stdout = io::stdout().lock();
    if args.json {
        let report = serde_json::json!({
            "classes": rows,
            "missing_labels": bound.missing_labels(),
        });
        writeln!(stdout, "{}", serde_json::to_string_pretty(&report)?)?;
        return Ok(());
    }

    writeln!(stdout, "{:>4}  {:<20}  TEXT", "ID", "NAME")?;
    for row in &rows {
        let marker = if row.text { "yes" } else { "-" };
        writeln!(stdout, "{:>4}  {:<20}  {marker}", row.id, row.name)?;
    }

    let text_classes = rows.iter().filter(|row| row.text).count();
    writeln!(stdout)?;
    writeln!(
        stdout,
        "{} classes, {text_classes} text-bearing",
        rows.len()
    )?;

    if !bound.missing_labels().is_empty() {
        writeln!(
            stdout,
            "labels not in the table: {}",
            bound.missing_labels().join(", ")
        )?;
    }

    Ok(())
}

fn class_rows(table: &ClassTable, is_text: impl Fn(u32) -> bool) -> Vec<ClassRow> {
    table
        .iter()
        .map(|(id, name)| ClassRow {
            id: *id,
            name: name.clone(),
            text: is_text(*id),
        })
        .collect()
}
