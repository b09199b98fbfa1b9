//! `adsched config` – show the config path and effective values.

use adsched_core::config::{self, SchedConfig};
use anyhow::Result;

pub fn run_config(cfg: &SchedConfig) -> Result<()> {
    println!("# {}", config::config_path()?.display());
    let effective = SchedConfig {
        weights: Some(cfg.weights()),
        shares: Some(cfg.shares()),
        ..cfg.clone()
    };
    print!("{}", toml::to_string_pretty(&effective)?);
    Ok(())
}
