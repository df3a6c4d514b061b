use anyhow::Result;

use crate::config::{PatternDef, PatternEntry};
use crate::protocol::{build_body_frame, build_header_frame};

/// The pre-encoded frame pair for one pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedPattern {
    pub header: [u8; 4],
    pub body: [u8; 4],
}

/// Immutable collection of all patterns, encoded once at startup.
#[derive(Debug)]
pub struct Catalog {
    names: Vec<String>,
    frames: Vec<EncodedPattern>,
}

impl Catalog {
    /// Encode every pattern in file order. A pattern's position in the
    /// input is its pattern id, so input order is significant.
    pub fn build(patterns: Vec<PatternDef>) -> Result<Catalog> {
        if patterns.is_empty() {
            anyhow::bail!("No patterns defined, nothing to cycle");
        }

        let mut names = Vec::with_capacity(patterns.len());
        let mut frames = Vec::with_capacity(patterns.len());

        for (pattern_id, pattern) in patterns.into_iter().enumerate() {
            let point_count = pattern
                .entries
                .iter()
                .filter(|entry| **entry == PatternEntry::Active)
                .count();

            frames.push(EncodedPattern {
                header: build_header_frame(point_count as u32),
                body: build_body_frame(pattern_id as u32),
            });
            names.push(pattern.name);
        }

        Ok(Catalog { names, frames })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Bounds-checked frame lookup by pattern id.
    pub fn get(&self, pattern_id: usize) -> Option<&EncodedPattern> {
        self.frames.get(pattern_id)
    }

    pub fn name(&self, pattern_id: usize) -> Option<&str> {
        self.names.get(pattern_id).map(String::as_str)
    }
}
