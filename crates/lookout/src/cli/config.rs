use dotenvy::dotenv;
use eyre::Result;
use lookout_core::config::{LookoutConfig, OutputFormat};
use std::path::Path;

pub fn load_env() -> Result<()> {
    dotenv().ok();
    Ok(())
}

/// Resolve the effective config.
///
/// An explicit path must exist and parse. Without one the user config is
/// loaded leniently, and the error that made it fall back to defaults is
/// returned for logging once tracing is up. `format` overrides the file's
/// output format.
pub fn resolve(
    path: Option<&Path>,
    format: Option<OutputFormat>,
) -> Result<(LookoutConfig, Option<lookout_core::Error>)> {
    let (mut config, ignored) = match path {
        Some(path) => {
            let config = LookoutConfig::from_path(path)
                .map_err(|e| eyre::eyre!("Failed to load config {}: {}", path.display(), e))?;
            (config, None)
        }
        None => LookoutConfig::load().unwrap_or_else(|e| (LookoutConfig::default(), Some(e))),
    };

    if let Some(format) = format {
        config.output.format = format;
    }
    Ok((config, ignored))
}
