use cutstock::config::{CgConfig, SoftFixConfig};
use serde::{Deserialize, Serialize};

/// Combined configuration of the driver, deserializable from a JSON file.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CgsfConfig {
    #[serde(default)]
    pub cg: CgConfig,
    #[serde(default)]
    pub softfix: SoftFixConfig,
}
