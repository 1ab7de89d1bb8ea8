//! Scaffold a new service.

use anyhow::{Context as _, Result};
use monad_config::Settings;
use monad_config::scaffold::{self, Language};
use monad_config::settings::keys;
use std::path::PathBuf;

pub fn init(settings: &Settings, language: Language, force: bool) -> Result<()> {
    let dir = match settings.get(keys::CHDIR) {
        Some(dir) => PathBuf::from(dir),
        None => std::env::current_dir().context("Failed to read current directory")?,
    };

    for path in scaffold::write(&dir, language, force)? {
        println!("wrote {}", path.display());
    }
    Ok(())
}
