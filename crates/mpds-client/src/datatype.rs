use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// MPDS data types, i.e. harvesting approaches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// Values reported in the peer-reviewed literature.
    #[default]
    PeerReviewed,
    /// Machine-learning predictions.
    MachineLearning,
    /// In-house ab initio calculations.
    AbInitio,
    /// Everything above.
    All,
}

impl DataType {
    /// The `dtype` code sent to the API.
    pub const fn code(self) -> u8 {
        match self {
            Self::PeerReviewed => 1,
            Self::MachineLearning => 2,
            Self::AbInitio => 4,
            Self::All => 7,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PeerReviewed => "peer_reviewed",
            Self::MachineLearning => "machine_learning",
            Self::AbInitio => "ab_initio",
            Self::All => "all",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "peer_reviewed" | "1" => Ok(Self::PeerReviewed),
            "machine_learning" | "2" => Ok(Self::MachineLearning),
            "ab_initio" | "4" => Ok(Self::AbInitio),
            "all" | "7" => Ok(Self::All),
            other => Err(format!(
                "unknown data type {other:?} (expected peer_reviewed, machine_learning, ab_initio or all)"
            )),
        }
    }
}
