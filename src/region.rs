use serde::{Deserialize, Serialize};

use std::fmt;

/// Issuing region of a plate, read off its leading character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegionLabel {
    Malacca,
    Selangor,
    Military,
    Penang,
    Terengganu,
    Unknown,
}

// leading plate character → issuing region
const REGION_TABLE: [(char, RegionLabel); 5] = [
    ('M', RegionLabel::Malacca),
    ('B', RegionLabel::Selangor),
    ('Z', RegionLabel::Military),
    ('P', RegionLabel::Penang),
    ('T', RegionLabel::Terengganu),
];

impl RegionLabel {
    pub fn name(&self) -> &'static str {
        match self {
            RegionLabel::Malacca => "Malacca",
            RegionLabel::Selangor => "Selangor",
            RegionLabel::Military => "Military",
            RegionLabel::Penang => "Penang",
            RegionLabel::Terengganu => "Terengganu",
            RegionLabel::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for RegionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Region for the first character of `text`, `Unknown` when empty or unmapped.
pub fn resolve(text: &str) -> RegionLabel {
    let first = match text.chars().next() {
        Some(c) => c.to_ascii_uppercase(),
        None => return RegionLabel::Unknown,
    };
    REGION_TABLE.iter()
        .find(|(c, _)| *c == first)
        .map(|(_, region)| *region)
        .unwrap_or(RegionLabel::Unknown)
}
