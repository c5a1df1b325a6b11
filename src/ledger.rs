use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result, anyhow};
use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Um erro apontado em uma imagem, com nota de 1 a 5 estrelas.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorEntry {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "avaliacao")]
    pub rating: u8,
    pub timestamp: String,
}

/// Avaliação persistida de um arquivo dentro de um ZIP. No máximo um registro
/// por `(zip, arquivo)`; salvar de novo mescla os erros no registro existente.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct EvaluationRecord {
    #[serde(rename = "arquivo")]
    pub file_name: String,
    #[serde(rename = "data")]
    pub capture_date: String,
    #[serde(rename = "id")]
    pub subject_id: String,
    #[serde(rename = "dedo")]
    pub finger_label: String,
    #[serde(rename = "erros")]
    pub errors: Vec<ErrorEntry>,
}

pub type Ledger = BTreeMap<String, Vec<EvaluationRecord>>;

/// Store de avaliações: `resultado.json` inteiro em memória, regravado por
/// completo a cada salvamento. Uma única sessão ativa por arquivo; o último
/// salvamento vence.
#[derive(Debug)]
pub struct LedgerStore {
    path: PathBuf,
    inner: Mutex<Ledger>,
}

impl LedgerStore {
    /// Carrega o ledger do disco; arquivo ausente ou ilegível vira um ledger
    /// vazio, nunca um erro.
    pub fn load(path: PathBuf) -> Self {
        let data = fs::read_to_string(&path).ok();
        let inner = data
            .and_then(|s| match serde_json::from_str(&s) {
                Ok(ledger) => Some(ledger),
                Err(err) => {
                    warn!(path = %path.display(), "resultado.json ilegível, começando vazio: {err}");
                    None
                }
            })
            .unwrap_or_default();
        Self {
            path,
            inner: Mutex::new(inner),
        }
    }

    /// Insere ou mescla um registro. Erros com par `(nome, descricao)` já
    /// presente são pulados, então a operação é idempotente e a primeira nota
    /// salva de um erro é mantida.
    pub fn upsert(&self, archive_name: &str, record: EvaluationRecord) {
        if let Ok(mut guard) = self.inner.lock() {
            let records = guard.entry(archive_name.to_string()).or_default();
            match records.iter_mut().find(|r| r.file_name == record.file_name) {
                Some(existing) => {
                    for err in record.errors {
                        let duplicate = existing
                            .errors
                            .iter()
                            .any(|e| e.name == err.name && e.description == err.description);
                        if !duplicate {
                            existing.errors.push(err);
                        }
                    }
                }
                None => records.push(record),
            }
        }
    }

    /// Nomes de arquivo que já têm registro para o ZIP; usado para retomar de
    /// onde parou.
    pub fn evaluated_files(&self, archive_name: &str) -> HashSet<String> {
        self.inner
            .lock()
            .ok()
            .and_then(|guard| {
                guard
                    .get(archive_name)
                    .map(|records| records.iter().map(|r| r.file_name.clone()).collect())
            })
            .unwrap_or_default()
    }

    pub fn records(&self, archive_name: &str) -> Vec<EvaluationRecord> {
        self.inner
            .lock()
            .ok()
            .and_then(|guard| guard.get(archive_name).cloned())
            .unwrap_or_default()
    }

    /// Regrava o ledger completo. Em caso de falha o estado em memória fica
    /// intacto e o erro sobe para o chamador.
    pub fn save(&self) -> Result<()> {
        let guard = self
            .inner
            .lock()
            .map_err(|e| anyhow!("lock do ledger envenenado: {e}"))?;
        let json = serde_json::to_string_pretty(&*guard)?;
        fs::write(&self.path, json).context("gravando resultado.json")?;
        Ok(())
    }
}

/// Timestamp local no formato do ledger, `YYYY-MM-DD HH:MM:SS`.
pub fn current_timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
