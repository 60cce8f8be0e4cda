// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::{bail, Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Runtime configuration for a coordinator instance.
///
/// Values are merged lowest-to-highest precedence: built-in defaults, then a
/// YAML config file, then `VEIL_`-prefixed environment variables.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
#[serde(deny_unknown_fields)]
pub struct CoordinatorConfig {
    /// Identity string the commitment binds to. Two coordinators over the
    /// same accumulator state produce different commitments.
    pub identity: String,
    /// Address that owns the registry when the store is empty.
    pub initial_owner: String,
    /// Global cooldown applied to submissions and decryption requests.
    pub cooldown_secs: u64,
    /// Where the sled database lives.
    pub data_dir: PathBuf,
    /// Use the in-memory store instead of sled. Testing only.
    pub in_mem_store: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            identity: String::from("veil-coordinator"),
            initial_owner: String::new(),
            cooldown_secs: 60,
            data_dir: PathBuf::from("veil-data"),
            in_mem_store: false,
        }
    }
}

impl CoordinatorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.cooldown_secs == 0 {
            bail!("cooldown_secs must be strictly positive");
        }
        if self.initial_owner.is_empty() {
            bail!("initial_owner must be set");
        }
        Ok(())
    }
}

/// Load configuration from the given YAML file if it exists, then apply env
/// overrides.
pub fn load_config(config_file: Option<PathBuf>) -> Result<CoordinatorConfig> {
    let mut figment = Figment::from(Serialized::defaults(CoordinatorConfig::default()));

    if let Some(path) = config_file {
        figment = figment.merge(Yaml::file(path));
    }

    let config: CoordinatorConfig = figment
        .merge(Env::prefixed("VEIL_"))
        .extract()
        .context("Could not parse configuration")?;

    config.validate()?;
    Ok(config)
}
