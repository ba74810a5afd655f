use std::{fs, io, path::Path};

use log::warn;

/// Read the indicator codes, one per line.  Blank lines are skipped, the
/// order and any duplicates are kept.
pub fn read_indicators(path: &Path) -> Result<Vec<String>, io::Error> {
    let content = fs::read_to_string(path)?;
    Ok(parse_indicators(&content))
}

pub fn parse_indicators(content: &str) -> Vec<String> {
    content
        .lines()
        .enumerate()
        .filter_map(|(i, line)| {
            let code = line.trim();
            if code.is_empty() {
                warn!("Skipping blank line {} in the indicator list", i + 1);
                None
            } else {
                Some(code.to_string())
            }
        })
        .collect()
}
