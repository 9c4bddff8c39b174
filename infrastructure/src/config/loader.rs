//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

/// Project-level config file names, checked in order
const PROJECT_CONFIG_FILES: [&str; 2] = ["verinox.toml", ".verinox.toml"];

/// Prefix of environment overrides, e.g. `VERINOX_PROVIDERS__OPENAI__MODEL`
const ENV_PREFIX: &str = "VERINOX_";

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. Environment: `VERINOX_<SECTION>__<KEY>`
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./verinox.toml` or `./.verinox.toml`
    /// 4. Global: `$XDG_CONFIG_HOME/verinox/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&PathBuf>) -> Result<FileConfig, Box<figment::Error>> {
        Self::figment(config_path, Self::global_config_path().as_deref(), Path::new("."))
            .extract()
            .map_err(Box::new)
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    fn figment(
        config_path: Option<&PathBuf>,
        global_path: Option<&Path>,
        project_dir: &Path,
    ) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(global_path) = global_path
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(global_path));
        }

        if let Some(path) = Self::find_project_config(project_dir) {
            figment = figment.merge(Toml::file(path));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Get the global config file path
    ///
    /// Returns XDG_CONFIG_HOME/verinox/config.toml if set,
    /// otherwise the platform config directory.
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("verinox").join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        Self::find_project_config(Path::new("."))
    }

    fn find_project_config(dir: &Path) -> Option<PathBuf> {
        PROJECT_CONFIG_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.exists())
    }

    /// Print the config file locations being used (for debugging)
    pub fn print_config_sources(config_path: Option<&PathBuf>) {
        println!("Configuration sources (in priority order):");

        println!("  [ENV  ] Environment: {}<SECTION>__<KEY>", ENV_PREFIX);

        if let Some(path) = config_path {
            let mark = if path.exists() { "FOUND" } else { "MISS " };
            println!("  [{}] Explicit: {}", mark, path.display());
        }

        if let Some(path) = Self::project_config_path() {
            println!("  [FOUND] Project: {}", path.display());
        } else {
            println!("  [     ] Project: ./verinox.toml or ./.verinox.toml");
        }

        if let Some(path) = Self::global_config_path() {
            if path.exists() {
                println!("  [FOUND] Global:  {}", path.display());
            } else {
                println!("  [     ] Global:  {}", path.display());
            }
        }

        println!("  [     ] Default: built-in defaults");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use verinox_domain::Model;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::load_defaults();
        assert_eq!(config, FileConfig::default());
    }

    #[test]
    fn test_global_config_path_returns_some() {
        // Should return a path (even if file doesn't exist)
        let path = ConfigLoader::global_config_path();
        assert!(path.is_some());
        let path = path.unwrap();
        assert!(path.ends_with("verinox/config.toml"));
    }

    #[test]
    fn test_sources_merge_by_priority() {
        let global_dir = tempfile::tempdir().unwrap();
        let project_dir = tempfile::tempdir().unwrap();

        let global = write(
            global_dir.path(),
            "config.toml",
            "[providers.openai]\nmodel = \"gpt-4o\"\nmax_tokens = 100\n\n[output]\ncolor = false\n",
        );
        write(
            project_dir.path(),
            "verinox.toml",
            "[providers.openai]\nmodel = \"gpt-4.1\"\n",
        );
        let explicit = write(
            project_dir.path(),
            "custom.toml",
            "[providers.openai]\nmax_tokens = 300\n",
        );

        let config: FileConfig =
            ConfigLoader::figment(Some(&explicit), Some(&global), project_dir.path())
                .extract()
                .unwrap();

        // project beats global, explicit beats project, untouched keys survive
        assert_eq!(config.model(), Model::Gpt41);
        assert_eq!(config.providers.openai.max_tokens, 300);
        assert!(!config.output.color);
        assert_eq!(config.providers.openai.temperature, 0.7);
    }

    #[test]
    fn test_dotfile_project_config_is_found() {
        let project_dir = tempfile::tempdir().unwrap();
        write(project_dir.path(), ".verinox.toml", "[repl]\nshow_typing = false\n");

        let config: FileConfig = ConfigLoader::figment(None, None, project_dir.path())
            .extract()
            .unwrap();
        assert!(!config.repl.show_typing);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let bad = write(dir.path(), "bad.toml", "[providers.openai\nmodel = ");

        let result: Result<FileConfig, _> =
            ConfigLoader::figment(Some(&bad), None, dir.path()).extract();
        assert!(result.is_err());
    }
}
