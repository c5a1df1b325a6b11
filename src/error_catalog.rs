use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Catálogo de erros editável pelo avaliador: nomes e, para cada nome, suas
/// descrições. Documento independente do ledger (`catalogo_erros.json`),
/// regravado por inteiro a cada edição.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorCatalog {
    #[serde(default)]
    pub nomes: Vec<String>,
    #[serde(default)]
    pub descricoes: HashMap<String, Vec<String>>,
}

impl ErrorCatalog {
    /// Arquivo ausente ou ilegível vira a estrutura vazia.
    pub fn load(path: &Path) -> Self {
        let data = fs::read_to_string(path).ok();
        data.and_then(|s| match serde_json::from_str(&s) {
            Ok(catalog) => Some(catalog),
            Err(err) => {
                warn!(path = %path.display(), "catalogo_erros.json ilegível, começando vazio: {err}");
                None
            }
        })
        .unwrap_or_default()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, json).context("gravando catalogo_erros.json")?;
        Ok(())
    }

    /// Cadastra um nome de erro; retorna false se já existia.
    pub fn add_name(&mut self, nome: &str) -> bool {
        if self.nomes.iter().any(|n| n == nome) {
            return false;
        }
        self.nomes.push(nome.to_string());
        self.descricoes.insert(nome.to_string(), Vec::new());
        true
    }

    /// Cadastra uma descrição sob um nome já existente; retorna false se a
    /// descrição já existia.
    pub fn add_description(&mut self, nome: &str, descricao: &str) -> Result<bool> {
        if !self.nomes.iter().any(|n| n == nome) {
            bail!("nome de erro não cadastrado: {nome}");
        }
        let list = self.descricoes.entry(nome.to_string()).or_default();
        if list.iter().any(|d| d == descricao) {
            return Ok(false);
        }
        list.push(descricao.to_string());
        Ok(true)
    }

    /// Remove um nome e todas as suas descrições.
    pub fn remove_name(&mut self, nome: &str) -> bool {
        let before = self.nomes.len();
        self.nomes.retain(|n| n != nome);
        self.descricoes.remove(nome);
        self.nomes.len() != before
    }

    pub fn remove_description(&mut self, nome: &str, descricao: &str) -> bool {
        match self.descricoes.get_mut(nome) {
            Some(list) => {
                let before = list.len();
                list.retain(|d| d != descricao);
                list.len() != before
            }
            None => false,
        }
    }

    pub fn descriptions_for(&self, nome: &str) -> &[String] {
        self.descricoes.get(nome).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// O par `(nome, descricao)` existe no catálogo?
    pub fn contains(&self, nome: &str, descricao: &str) -> bool {
        self.descriptions_for(nome).iter().any(|d| d == descricao)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempdir().unwrap();
        let catalog = ErrorCatalog::load(&dir.path().join("nada.json"));
        assert!(catalog.nomes.is_empty());
        assert!(catalog.descricoes.is_empty());
    }

    #[test]
    fn add_name_and_description() {
        let mut catalog = ErrorCatalog::default();
        assert!(catalog.add_name("Borrado"));
        assert!(!catalog.add_name("Borrado"));

        assert!(catalog.add_description("Borrado", "Mancha central").unwrap());
        assert!(!catalog.add_description("Borrado", "Mancha central").unwrap());
        assert!(catalog.add_description("Inexistente", "x").is_err());

        assert!(catalog.contains("Borrado", "Mancha central"));
        assert!(!catalog.contains("Borrado", "Outra"));
    }

    #[test]
    fn remove_name_drops_descriptions() {
        let mut catalog = ErrorCatalog::default();
        catalog.add_name("Corte");
        catalog.add_description("Corte", "Borda esquerda").unwrap();

        assert!(catalog.remove_name("Corte"));
        assert!(!catalog.remove_name("Corte"));
        assert!(catalog.descriptions_for("Corte").is_empty());
    }

    #[test]
    fn remove_single_description() {
        let mut catalog = ErrorCatalog::default();
        catalog.add_name("Corte");
        catalog.add_description("Corte", "Borda esquerda").unwrap();
        catalog.add_description("Corte", "Borda direita").unwrap();

        assert!(catalog.remove_description("Corte", "Borda esquerda"));
        assert!(!catalog.remove_description("Corte", "Borda esquerda"));
        assert_eq!(catalog.descriptions_for("Corte"), ["Borda direita"]);
    }

    #[test]
    fn save_and_reload_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalogo_erros.json");

        let mut catalog = ErrorCatalog::default();
        catalog.add_name("Borrado");
        catalog.add_description("Borrado", "Mancha central").unwrap();
        catalog.save(&path).unwrap();

        let reloaded = ErrorCatalog::load(&path);
        assert_eq!(reloaded, catalog);
    }

    #[test]
    fn accepts_handwritten_document() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalogo_erros.json");
        fs::write(
            &path,
            r#"{"nomes": ["Borrado"], "descricoes": {"Borrado": ["Mancha"]}}"#,
        )
        .unwrap();

        let catalog = ErrorCatalog::load(&path);
        assert_eq!(catalog.nomes, ["Borrado"]);
        assert!(catalog.contains("Borrado", "Mancha"));
    }
}
