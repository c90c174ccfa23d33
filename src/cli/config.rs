use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::cli::args::OutputFormat;
use crate::cli::{InfoArgs, SearchArgs, ServeArgs};

/// Top-level representation of `.operadoras/config.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub data: Option<DataSection>,

    #[serde(default)]
    pub serve: Option<ServeSection>,

    #[serde(default)]
    pub search: Option<SearchSection>,

    #[serde(default)]
    pub info: Option<InfoSection>,

    #[serde(default)]
    pub http: Option<HttpSection>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DataSection {
    /// Data file path; relative paths resolve against the directory
    /// holding `.operadoras/`.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ServeSection {
    #[serde(default)]
    pub addr: Option<String>,
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchSection {
    #[serde(default)]
    pub format: Option<OutputFormat>,
    #[serde(default)]
    pub server: Option<String>,
    #[serde(default)]
    pub no_server: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct InfoSection {
    #[serde(default)]
    pub format: Option<OutputFormat>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HttpSection {
    #[serde(default)]
    pub server_url: Option<String>,
}

/// A parsed config file together with the project root it was found in.
#[derive(Debug)]
pub struct LoadedConfig {
    pub root: PathBuf,
    pub config: CliConfig,
}

impl LoadedConfig {
    fn data_path(&self) -> Option<PathBuf> {
        let path = self.config.data.as_ref()?.path.as_ref()?;
        if path.is_absolute() {
            Some(path.clone())
        } else {
            Some(self.root.join(path))
        }
    }
}

/// Discover and load a project-local `.operadoras/config.toml`
/// starting from the current working directory and walking up parent
/// directories.
pub fn load_cli_config() -> Result<Option<LoadedConfig>> {
    let cwd = std::env::current_dir().context("failed to read current directory")?;
    load_cli_config_from(&cwd)
}

pub fn load_cli_config_from(start: &Path) -> Result<Option<LoadedConfig>> {
    let Some(path) = find_project_config(start) else {
        return Ok(None);
    };

    let contents = fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: CliConfig = toml::from_str(&contents)
        .with_context(|| format!("failed to parse TOML config at {}", path.display()))?;

    // `<root>/.operadoras/config.toml`
    let root = path
        .parent()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .unwrap_or_else(|| start.to_path_buf());

    Ok(Some(LoadedConfig { root, config }))
}

fn find_project_config(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);

    while let Some(current) = dir {
        let config_toml = current.join(".operadoras").join("config.toml");
        if config_toml.is_file() {
            return Some(config_toml);
        }

        dir = current.parent();
    }

    None
}

pub fn apply_serve_config_defaults(loaded: &LoadedConfig, args: &mut ServeArgs) {
    if args.data.is_none() {
        args.data = loaded.data_path();
    }

    if let Some(serve) = &loaded.config.serve {
        if args.addr.is_none() {
            args.addr = serve.addr.clone();
        }

        if args.cors_origins.is_empty() && !serve.cors_origins.is_empty() {
            args.cors_origins = serve.cors_origins.clone();
        }
    }
}

pub fn apply_search_config_defaults(loaded: &LoadedConfig, args: &mut SearchArgs) {
    let config = &loaded.config;

    if args.data.is_none() {
        args.data = loaded.data_path();
    }

    if let Some(search) = &config.search {
        if matches!(args.format, OutputFormat::Text) {
            if let Some(format) = search.format {
                args.format = format;
            }
        }

        if args.server.is_none() {
            if let Some(server) = &search.server {
                args.server = Some(server.clone());
            }
        }

        if !args.no_server {
            if let Some(true) = search.no_server {
                args.no_server = true;
            }
        }
    }

    // Fall back to a global HTTP server URL when present.
    if args.server.is_none() {
        if let Some(url) = config.http.as_ref().and_then(|h| h.server_url.as_ref()) {
            args.server = Some(url.clone());
        }
    }
}

pub fn apply_info_config_defaults(loaded: &LoadedConfig, args: &mut InfoArgs) {
    if args.data.is_none() {
        args.data = loaded.data_path();
    }

    if let Some(info) = &loaded.config.info {
        if matches!(args.format, OutputFormat::Text) {
            if let Some(format) = info.format {
                args.format = format;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::args::DEFAULT_ADDR;
    use tempfile::tempdir;

    fn write_config(root: &Path, contents: &str) {
        let dir = root.join(".operadoras");
        fs::create_dir_all(&dir).expect("create .operadoras");
        fs::write(dir.join("config.toml"), contents).expect("write config");
    }

    fn search_args() -> SearchArgs {
        SearchArgs {
            term: "alfa".to_string(),
            data: None,
            format: OutputFormat::Text,
            server: None,
            no_server: false,
        }
    }

    #[test]
    fn config_is_found_from_nested_directory() {
        let tmp = tempdir().expect("tempdir");
        write_config(tmp.path(), "[data]\npath = \"dados/operadoras.csv\"\n");
        let nested = tmp.path().join("a").join("b");
        fs::create_dir_all(&nested).expect("create nested");

        let loaded = load_cli_config_from(&nested)
            .expect("load")
            .expect("config found");
        assert_eq!(loaded.root, tmp.path());
        assert_eq!(
            loaded.data_path(),
            Some(tmp.path().join("dados/operadoras.csv"))
        );
    }

    #[test]
    fn missing_config_is_none() {
        let tmp = tempdir().expect("tempdir");
        assert!(load_cli_config_from(tmp.path()).expect("load").is_none());
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let tmp = tempdir().expect("tempdir");
        write_config(tmp.path(), "[serve\naddr = 1");
        let err = load_cli_config_from(tmp.path()).expect_err("parse error");
        assert!(err.to_string().contains("failed to parse TOML config"));
    }

    #[test]
    fn search_defaults_fill_unset_flags_only() {
        let tmp = tempdir().expect("tempdir");
        write_config(
            tmp.path(),
            r#"
[search]
format = "json"
no_server = true

[http]
server_url = "http://127.0.0.1:9"
"#,
        );
        let loaded = load_cli_config_from(tmp.path()).expect("load").expect("config");

        let mut args = search_args();
        apply_search_config_defaults(&loaded, &mut args);
        assert_eq!(args.format, OutputFormat::Json);
        assert!(args.no_server);
        assert_eq!(args.server.as_deref(), Some("http://127.0.0.1:9"));

        let mut explicit = search_args();
        explicit.server = Some("http://example.test".to_string());
        apply_search_config_defaults(&loaded, &mut explicit);
        assert_eq!(explicit.server.as_deref(), Some("http://example.test"));
    }

    #[test]
    fn serve_defaults_respect_explicit_addr() {
        let tmp = tempdir().expect("tempdir");
        write_config(
            tmp.path(),
            r#"
[serve]
addr = "0.0.0.0:8000"
cors_origins = ["http://localhost:8080"]
"#,
        );
        let loaded = load_cli_config_from(tmp.path()).expect("load").expect("config");

        let mut args = ServeArgs {
            data: None,
            addr: None,
            cors_origins: Vec::new(),
        };
        apply_serve_config_defaults(&loaded, &mut args);
        assert_eq!(args.addr.as_deref(), Some("0.0.0.0:8000"));
        assert_eq!(args.cors_origins, vec!["http://localhost:8080".to_string()]);
        assert!(args.data.is_none());

        // An explicit flag equal to the built-in default still wins.
        let mut explicit = ServeArgs {
            data: None,
            addr: Some(DEFAULT_ADDR.to_string()),
            cors_origins: Vec::new(),
        };
        apply_serve_config_defaults(&loaded, &mut explicit);
        assert_eq!(explicit.addr.as_deref(), Some(DEFAULT_ADDR));
    }
}
