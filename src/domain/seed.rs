//! Local seed list of candidate subscription URLs.

use std::collections::BTreeSet;
use std::path::Path;

use crate::app::Result;

const COMMENT_MARKER: char = '#';

/// Parse a seed list. Any line containing the comment marker is skipped
/// entirely, as are blank lines.
pub fn parse_seed(content: &str) -> BTreeSet<String> {
    content
        .lines()
        .map(|line| line.trim_end_matches(['\r', '\n']))
        .filter(|line| !line.is_empty() && !line.contains(COMMENT_MARKER))
        .map(String::from)
        .collect()
}

pub fn read_seed_file(path: &Path) -> Result<BTreeSet<String>> {
    let content = std::fs::read_to_string(path)?;
    let seed = parse_seed(&content);
    tracing::debug!("Read {} seed addresses from {}", seed.len(), path.display());
    Ok(seed)
}
