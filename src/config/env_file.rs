//! `secrets.env` style `KEY=VALUE` files.

use std::collections::HashMap;

pub const HOST_KEY: &str = "PIHOLE_HOST";
pub const PASSWORD_KEY: &str = "WEBPASSWORD";

/// Parse `KEY=VALUE` lines. Only the first `=` splits, so values may contain
/// `=`. Blank lines and lines without `=` are ignored.
pub fn parse_env(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.is_empty())
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}
