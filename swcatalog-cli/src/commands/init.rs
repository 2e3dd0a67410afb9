//! Init command - initialize configuration file.

use swcatalog::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Run the init command.
///
/// Existing values are kept unless `force` is set; missing ones are filled
/// with the built-in defaults.
pub fn run(force: bool) -> Result<(), CliError> {
    let path = config_file_path();
    let existing = if force {
        ConfigFile::default()
    } else {
        ConfigFile::load_from(&path)?
    };

    let config = merge_defaults(existing);
    config.save_to(&path)?;

    println!("Configuration file: {}", path.display());
    println!();
    println!("Edit this file to customize swcatalog settings.");
    println!("CLI arguments override config file values when specified.");
    Ok(())
}

fn merge_defaults(existing: ConfigFile) -> ConfigFile {
    let defaults = ConfigFile::with_defaults();
    ConfigFile {
        catalog_url: existing.catalog_url.or(defaults.catalog_url),
        workdir: existing.workdir.or(defaults.workdir),
        mirror: existing.mirror.or(defaults.mirror),
        discover_mirror: existing.discover_mirror.or(defaults.discover_mirror),
        user_agent: existing.user_agent.or(defaults.user_agent),
        target_version: existing.target_version.or(defaults.target_version),
        machine_model: existing.machine_model.or(defaults.machine_model),
        error_grace_secs: existing.error_grace_secs.or(defaults.error_grace_secs),
        installer_only: existing.installer_only.or(defaults.installer_only),
        log_dir: existing.log_dir.or(defaults.log_dir),
    }
}
