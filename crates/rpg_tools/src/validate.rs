//! Config validation utilities.

use std::path::{Path, PathBuf};

use rpg_core::config::WorldConfig;
use rpg_core::error::{GameError, Result};

/// Parse and validate one world config file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, does not parse, or holds
/// values the world cannot run with.
pub fn validate_world_config(path: &Path) -> Result<WorldConfig> {
    let source_name = path.display().to_string();
    let text = std::fs::read_to_string(path).map_err(|e| GameError::ConfigParse {
        source_name: source_name.clone(),
        message: e.to_string(),
    })?;
    WorldConfig::from_ron_str(&source_name, &text)
}

/// Validate a config file, or every `.ron` file directly inside a directory.
///
/// Returns the files that were checked, in sorted order.
///
/// # Errors
///
/// Returns the first failure. An empty directory is an error.
pub fn validate_path(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        validate_world_config(path)?;
        return Ok(vec![path.to_path_buf()]);
    }

    let entries = std::fs::read_dir(path).map_err(|e| GameError::ConfigParse {
        source_name: path.display().to_string(),
        message: e.to_string(),
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "ron"))
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(GameError::ConfigParse {
            source_name: path.display().to_string(),
            message: "no .ron files found".to_string(),
        });
    }

    for file in &files {
        validate_world_config(file)?;
        tracing::debug!(file = %file.display(), "Config valid");
    }
    Ok(files)
}
