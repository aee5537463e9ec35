//! Identifier types shared by the collections

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a pathway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct PathwayId(pub u32);

impl PathwayId {
    pub fn new(id: u32) -> Self {
        PathwayId(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for PathwayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PathwayId({})", self.0)
    }
}

impl From<u32> for PathwayId {
    fn from(id: u32) -> Self {
        PathwayId(id)
    }
}

/// Unique identifier for a gene (its row in the compendium)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct GeneId(pub u32);

impl GeneId {
    pub fn new(id: u32) -> Self {
        GeneId(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for GeneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GeneId({})", self.0)
    }
}

impl From<u32> for GeneId {
    fn from(id: u32) -> Self {
        GeneId(id)
    }
}

/// Which side of a model feature an edge was found on.
///
/// Stored as `1` / `-1` in the `type` field of `network_edges`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum EdgeSide {
    Positive,
    Negative,
}

impl EdgeSide {
    pub fn as_i8(&self) -> i8 {
        match self {
            EdgeSide::Positive => 1,
            EdgeSide::Negative => -1,
        }
    }
}

impl TryFrom<i8> for EdgeSide {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(EdgeSide::Positive),
            -1 => Ok(EdgeSide::Negative),
            other => Err(format!("edge type must be 1 or -1, got {}", other)),
        }
    }
}

impl From<EdgeSide> for i8 {
    fn from(side: EdgeSide) -> Self {
        side.as_i8()
    }
}

impl fmt::Display for EdgeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i8())
    }
}
