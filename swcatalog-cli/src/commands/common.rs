//! Arguments shared by the catalog commands.

use std::path::PathBuf;

use clap::Args;
use swcatalog::config::RunConfig;

/// Overrides applied on top of the config file.
#[derive(Debug, Clone, Default, Args)]
pub struct RunArgs {
    /// Catalog URL (default: the catalog for this macOS version)
    #[arg(long)]
    pub catalog_url: Option<String>,

    /// Directory to replicate downloads into
    #[arg(long, short = 'w')]
    pub workdir: Option<PathBuf>,

    /// Caching server host:port to try before Apple's servers
    #[arg(long)]
    pub mirror: Option<String>,

    /// Do not look for a caching server on the local network
    #[arg(long)]
    pub no_mirror_discovery: bool,

    /// Version or title to select, e.g. 10.15 or "Big Sur" (default: latest)
    #[arg(long = "target", short = 't')]
    pub target_version: Option<String>,

    /// Machine model to check compatibility against (default: this Mac)
    #[arg(long)]
    pub model: Option<String>,

    /// User-Agent header for every request
    #[arg(long)]
    pub user_agent: Option<String>,
}

impl RunArgs {
    /// Apply CLI values over `config`. CLI takes precedence.
    pub fn apply(self, mut config: RunConfig) -> RunConfig {
        if let Some(url) = self.catalog_url {
            config = config.with_catalog_url(url);
        }
        if let Some(workdir) = self.workdir {
            config.workdir = workdir;
        }
        if let Some(mirror) = self.mirror {
            config = config.with_mirror(mirror);
        }
        if self.no_mirror_discovery {
            config = config.with_discover_mirror(false);
        }
        if let Some(target) = self.target_version {
            config = config.with_target_version(target);
        }
        if let Some(model) = self.model {
            config = config.with_machine_model(model);
        }
        if let Some(user_agent) = self.user_agent {
            config = config.with_user_agent(user_agent);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swcatalog::config::ConfigFile;

    #[test]
    fn test_cli_overrides_config_file() {
        let file = ConfigFile {
            mirror: Some("cache.lan:49180".to_string()),
            target_version: Some("10.15".to_string()),
            discover_mirror: Some(true),
            ..Default::default()
        };

        let args = RunArgs {
            target_version: Some("11.0".to_string()),
            no_mirror_discovery: true,
            ..Default::default()
        };
        let config = args.apply(file.to_run_config());

        assert_eq!(config.target_version.as_deref(), Some("11.0"));
        assert_eq!(config.mirror.as_deref(), Some("cache.lan:49180"));
        assert!(!config.discover_mirror);
    }

    #[test]
    fn test_no_args_keeps_defaults() {
        let config = RunArgs::default().apply(RunConfig::default());
        assert!(config.catalog_url.is_none());
        assert!(config.discover_mirror);
    }
}
