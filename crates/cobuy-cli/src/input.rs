use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::ArgMatches;

use cobuy_engine::config::{load_engine_config, EngineConfig, ModelType};
use cobuy_engine::ProductId;

/// Build the engine configuration for one CLI invocation.
///
/// Starts from the JSON file passed with `--config` (or the defaults), then
/// applies whatever overrides the subcommand defines and the user passed.
pub fn from_arguments(matches: &ArgMatches) -> Result<EngineConfig> {
    let mut config = match optional::<PathBuf>(matches, "config") {
        Some(path) => {
            log::info!("Using config: {}", path.display());
            load_engine_config(path)?
        }
        None => EngineConfig::default(),
    };

    if let Some(dataset) = optional::<PathBuf>(matches, "dataset") {
        validate_tsv_or_csv_file(dataset)?;
        config.dataset = dataset.clone();
    }

    if let Some(model_type) = optional::<String>(matches, "model_type") {
        config.model.model_type = ModelType::from_str(model_type).map_err(anyhow::Error::msg)?;
    }

    if let Some(seed) = optional::<u64>(matches, "seed") {
        config.model.seed = *seed;
    }

    if let Some(fallback) = optional::<String>(matches, "fallback") {
        config.fallback = parse_fallback(fallback)?;
    }

    if let Some(history) = optional::<PathBuf>(matches, "history") {
        config.history = Some(history.clone());
    }

    if let Some(bind) = optional::<String>(matches, "bind") {
        config.bind = bind.clone();
    }

    if optional::<bool>(matches, "no_pretrain").copied().unwrap_or(false) {
        config.pretrain = false;
    }

    config.validate()?;
    Ok(config)
}

/// Value of `id`, or `None` when absent or not defined on this subcommand.
fn optional<'a, T: Clone + Send + Sync + 'static>(
    matches: &'a ArgMatches,
    id: &str,
) -> Option<&'a T> {
    matches.try_get_one::<T>(id).ok().flatten()
}

fn parse_fallback(value: &str) -> Result<Vec<ProductId>> {
    value
        .split(',')
        .map(|item| {
            item.trim()
                .parse::<ProductId>()
                .with_context(|| format!("Invalid fallback product id: {:?}", item))
        })
        .collect()
}

pub fn validate_tsv_or_csv_file(path: &Path) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase());
    match ext.as_deref() {
        Some("tsv") | Some("csv") => {}
        _ => anyhow::bail!("File must have a .tsv or .csv extension: {}", path.display()),
    }

    if !path.exists() {
        anyhow::bail!("File does not exist: {}", path.display());
    }

    Ok(())
}
