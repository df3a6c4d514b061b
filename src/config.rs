use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::fs;

/// Slot token marking an inert (switched-off) projector point.
pub const OFF_SENTINEL: &str = "0x00000000";

/// One slot within a pattern. The colour payload of an active slot is
/// opaque to the protocol; only its presence feeds the point count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum PatternEntry {
    Off,
    Active,
}

impl From<String> for PatternEntry {
    fn from(token: String) -> Self {
        if token.contains(OFF_SENTINEL) {
            PatternEntry::Off
        } else {
            PatternEntry::Active
        }
    }
}

/// A named pattern exactly as it appears in the patterns file.
#[derive(Debug, Clone)]
pub struct PatternDef {
    pub name: String,
    pub entries: Vec<PatternEntry>,
}

/// Load pattern definitions from a JSON file, preserving key order.
pub fn load_patterns(path: &str) -> Result<Vec<PatternDef>> {
    let data = fs::read_to_string(path)
        .context(format!("Failed to read patterns file {}", path))?;

    parse_patterns(&data)
}

/// Parse the patterns JSON: a top-level object mapping pattern name to an
/// ordered list of slot tokens. Key order assigns pattern ids, so the map
/// must iterate in insertion order.
pub fn parse_patterns(data: &str) -> Result<Vec<PatternDef>> {
    let raw: serde_json::Map<String, Value> =
        serde_json::from_str(data).context("Patterns file is not a JSON object")?;

    let mut patterns = Vec::with_capacity(raw.len());

    for (name, slots) in raw {
        let entries: Vec<PatternEntry> = serde_json::from_value(slots)
            .context(format!("Pattern \"{}\" is not an array of slot strings", name))?;

        patterns.push(PatternDef { name, entries });
    }

    Ok(patterns)
}
