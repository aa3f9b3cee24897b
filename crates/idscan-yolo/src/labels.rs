//! Class table loading.

use std::collections::BTreeMap;
use std::path::Path;

use idscan_core::ClassTable;

use crate::{Error, Result, TRACING_TARGET_MODEL};

/// Reads a labels file into a class table.
///
/// See [`parse_class_table`] for the accepted formats.
pub fn load_class_table(path: &Path) -> Result<ClassTable> {
    let content = std::fs::read_to_string(path)?;
    let table = parse_class_table(&content).map_err(|message| Error::Labels {
        path: path.to_path_buf(),
        message,
    })?;

    tracing::debug!(
        target: TRACING_TARGET_MODEL,
        path = %path.display(),
        num_classes = table.len(),
        "loaded class table"
    );

    Ok(table)
}

/// Parses the content of a labels file.
///
/// Two formats are accepted: a JSON object keyed by class identifier
/// (`{"0": "bhyt", "1": "cccd"}`), or plain text with one class name per
/// line where the line index is the identifier. Blank lines are skipped in
/// plain text but still consume an identifier.
pub fn parse_class_table(content: &str) -> std::result::Result<ClassTable, String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err("no class names".to_owned());
    }

    if trimmed.starts_with('{') {
        let raw: BTreeMap<String, String> =
            serde_json::from_str(trimmed).map_err(|e| e.to_string())?;

        return raw
            .into_iter()
            .map(|(id, name)| {
                id.trim()
                    .parse::<u32>()
                    .map(|id| (id, name))
                    .map_err(|_| format!("class identifier '{id}' is not an integer"))
            })
            .collect();
    }

    Ok((0u32..)
        .zip(content.lines())
        .filter_map(|(id, line)| {
            let name = line.trim();
            (!name.is_empty()).then(|| (id, name.to_owned()))
        })
        .collect())
}
