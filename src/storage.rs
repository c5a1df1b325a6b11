use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

/// Caminhos dos documentos persistidos. Configuração explícita passada aos
/// componentes, nada de estado global: quem quiser outro local edita o
/// `config.json`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_ledger_file")]
    pub ledger_file: PathBuf,
    #[serde(default = "default_errors_file")]
    pub errors_file: PathBuf,
    #[serde(default = "default_scratch_root")]
    pub scratch_root: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ledger_file: default_ledger_file(),
            errors_file: default_errors_file(),
            scratch_root: default_scratch_root(),
        }
    }
}

fn default_ledger_file() -> PathBuf {
    base_dir().join("resultado.json")
}

fn default_errors_file() -> PathBuf {
    base_dir().join("catalogo_erros.json")
}

fn default_scratch_root() -> PathBuf {
    base_dir().join("scratch")
}

pub fn load_config() -> AppConfig {
    let data = fs::read_to_string(config_path()).ok();
    data.and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default()
}

pub fn save_config(cfg: &AppConfig) -> Result<()> {
    let json = serde_json::to_string_pretty(cfg)?;
    if let Some(dir) = config_path().parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(config_path(), json).context("gravando config.json")?;
    Ok(())
}

pub fn base_dir() -> PathBuf {
    let proj = ProjectDirs::from("dev", "benapro", "benapro-annotator");
    proj.map(|p| p.data_local_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn logs_dir() -> PathBuf {
    base_dir().join("logs")
}

fn config_path() -> PathBuf {
    base_dir().join("config.json")
}

/// Diretório de extração dedicado a um ZIP, derivado do nome do arquivo.
pub fn scratch_dir_for(scratch_root: &Path, zip_name: &str) -> PathBuf {
    scratch_root.join(sanitize_path_component(zip_name))
}

pub fn sanitize_path_component(name: &str) -> String {
    let mut cleaned = name
        .chars()
        .map(|c| match c {
            ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\\' | '/' => '_',
            _ => c,
        })
        .collect::<String>();
    cleaned.truncate(100);
    cleaned.trim().trim_matches('.').trim().to_string()
}

pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_path_component_replaces_illegal_chars() {
        let name = sanitize_path_component("Coleta: 2024?05*.zip");
        assert!(name.contains('_'));
        assert!(!name.contains(':'));
        assert!(!name.contains('?'));
        assert!(!name.contains('*'));
    }

    #[test]
    fn scratch_dir_is_per_archive() {
        let root = Path::new("/tmp/scratch");
        let a = scratch_dir_for(root, "Coleta_2024 05.zip");
        let b = scratch_dir_for(root, "Coleta_2024 06.zip");
        assert_ne!(a, b);
        assert!(a.starts_with(root));
    }

    #[test]
    fn config_defaults_are_filled_from_partial_json() {
        let cfg: AppConfig = serde_json::from_str(r#"{"ledger_file": "/tmp/r.json"}"#).unwrap();
        assert_eq!(cfg.ledger_file, PathBuf::from("/tmp/r.json"));
        assert_eq!(cfg.errors_file, default_errors_file());
        assert_eq!(cfg.scratch_root, default_scratch_root());
    }
}
