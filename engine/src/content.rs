use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::info;

use crate::store::{CHARACTER_STEM, SESSION_STEM, SETTINGS_STEM};

pub fn builtin_documents() -> [(&'static str, &'static str); 3] {
    [
        (CHARACTER_STEM, include_str!("../content/character-config.json")),
        (SESSION_STEM, include_str!("../content/session-data.json")),
        (SETTINGS_STEM, include_str!("../content/settings.json")),
    ]
}

/// Write the bundled sample configuration into `dir`.
pub fn write_sample_config(dir: &Path, force: bool) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create config directory: {}", dir.display()))?;

    let targets: Vec<(PathBuf, &str)> = builtin_documents()
        .into_iter()
        .map(|(stem, text)| (dir.join(format!("{}.json", stem)), text))
        .collect();

    if !force {
        if let Some((existing, _)) = targets.iter().find(|(p, _)| p.exists()) {
            bail!(
                "{} already exists; pass --force to overwrite",
                existing.display()
            );
        }
    }

    let mut written = Vec::with_capacity(targets.len());
    for (path, text) in targets {
        fs::write(&path, text)
            .with_context(|| format!("failed to write sample config: {}", path.display()))?;
        info!(path = %path.display(), "wrote sample config");
        written.push(path);
    }
    Ok(written)
}
