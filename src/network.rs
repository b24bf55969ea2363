//! Network Signal Module
//!
//! Classifies the host's effective connection so speculative work can be
//! throttled on constrained links.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::PreloadError;

// == Network Class ==
/// Effective connection class reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NetworkClass {
    Fast,
    Slow,
    SaveData,
    /// No signal available; treated like `Fast`
    Unknown,
}

impl NetworkClass {
    /// Returns true when speculative (non-critical) preloading may run.
    ///
    /// Only `Slow` and `SaveData` suppress it.
    pub fn allows_speculative(self) -> bool {
        !matches!(self, NetworkClass::Slow | NetworkClass::SaveData)
    }

    fn as_u8(self) -> u8 {
        match self {
            NetworkClass::Fast => 0,
            NetworkClass::Slow => 1,
            NetworkClass::SaveData => 2,
            NetworkClass::Unknown => 3,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => NetworkClass::Fast,
            1 => NetworkClass::Slow,
            2 => NetworkClass::SaveData,
            _ => NetworkClass::Unknown,
        }
    }
}

impl fmt::Display for NetworkClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NetworkClass::Fast => "fast",
            NetworkClass::Slow => "slow",
            NetworkClass::SaveData => "save-data",
            NetworkClass::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

impl FromStr for NetworkClass {
    type Err = PreloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fast" => Ok(NetworkClass::Fast),
            "slow" => Ok(NetworkClass::Slow),
            "save-data" | "save_data" | "savedata" => Ok(NetworkClass::SaveData),
            "unknown" => Ok(NetworkClass::Unknown),
            other => Err(PreloadError::InvalidRequest(format!(
                "Unknown network class '{}'",
                other
            ))),
        }
    }
}

/// Maps a raw connection reading (effective type plus the save-data
/// preference) onto a `NetworkClass`.
///
/// The save-data preference wins over any effective type.
pub fn classify_connection(effective_type: Option<&str>, save_data: bool) -> NetworkClass {
    if save_data {
        return NetworkClass::SaveData;
    }
    match effective_type.map(|t| t.trim().to_ascii_lowercase()) {
        Some(t) if t == "slow-2g" || t == "2g" => NetworkClass::Slow,
        Some(t) if t == "3g" || t == "4g" => NetworkClass::Fast,
        _ => NetworkClass::Unknown,
    }
}

// == Network Signal ==
/// Source of the current network class.
///
/// Implementations must be cheap and must never panic; a source without a
/// reading returns `NetworkClass::Unknown`.
pub trait NetworkSignal: Send + Sync {
    fn classify(&self) -> NetworkClass;
}

/// Network signal the host pushes updates into.
#[derive(Debug)]
pub struct SharedNetworkSignal {
    class: AtomicU8,
}

impl SharedNetworkSignal {
    pub fn new(initial: NetworkClass) -> Self {
        Self {
            class: AtomicU8::new(initial.as_u8()),
        }
    }

    /// Records a new reading; subsequent `classify` calls observe it.
    pub fn set(&self, class: NetworkClass) {
        self.class.store(class.as_u8(), Ordering::Relaxed);
    }
}

impl Default for SharedNetworkSignal {
    fn default() -> Self {
        Self::new(NetworkClass::Unknown)
    }
}

impl NetworkSignal for SharedNetworkSignal {
    fn classify(&self) -> NetworkClass {
        NetworkClass::from_u8(self.class.load(Ordering::Relaxed))
    }
}
