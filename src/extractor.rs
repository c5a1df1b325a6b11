use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::mpsc;
use std::thread;

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::{error, info};
use zip::ZipArchive;

use crate::catalog;
use crate::media::MediaItem;

/// Eventos emitidos pelo worker de extração. O chamador só retoma ao receber
/// `Finished` ou `Failed`; `Progress` é o único sinal de vida no meio tempo.
#[derive(Debug)]
pub enum ExtractEvent {
    Progress { percent: i32, status: String },
    Finished(Vec<MediaItem>),
    Failed(String),
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("entrada de ZIP com caminho inválido: {0}")]
    UnsafePath(String),
    #[error("entrada de ZIP com nome vazio")]
    EmptyPath,
}

/// Extrai o ZIP em segundo plano e monta o catálogo ao final.
///
/// O worker é dono do diretório de extração durante a execução e se comunica
/// apenas pelo canal retornado. Em caso de falha os arquivos já extraídos
/// ficam no lugar; a limpeza acontece no próximo carregamento.
pub fn start_extraction(zip_path: PathBuf, scratch_dir: PathBuf) -> mpsc::Receiver<ExtractEvent> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        match run_extraction(&zip_path, &scratch_dir, &tx) {
            Ok(items) => {
                info!(total = items.len(), zip = %zip_path.display(), "extração concluída");
                let _ = tx.send(ExtractEvent::Finished(items));
            }
            Err(err) => {
                error!(zip = %zip_path.display(), "falha na extração: {err:#}");
                let _ = tx.send(ExtractEvent::Failed(format!("{err:#}")));
            }
        }
    });
    rx
}

fn run_extraction(
    zip_path: &Path,
    scratch_dir: &Path,
    tx: &mpsc::Sender<ExtractEvent>,
) -> Result<Vec<MediaItem>> {
    let _ = tx.send(ExtractEvent::Progress {
        percent: 0,
        status: "Iniciando extração...".to_string(),
    });

    let file = fs::File::open(zip_path).context("abrindo arquivo ZIP")?;
    let mut archive = ZipArchive::new(file).context("lendo arquivo ZIP")?;
    let total = archive.len();

    for i in 0..total {
        let mut member = archive.by_index(i).context("lendo entrada do ZIP")?;
        let member_name = member.name().to_string();
        let outpath = build_safe_path(scratch_dir, &member_name)?;

        if member.is_dir() {
            fs::create_dir_all(&outpath)
                .with_context(|| format!("criando pasta {}", outpath.display()))?;
        } else {
            if let Some(parent) = outpath.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("criando pasta {}", parent.display()))?;
            }
            let mut outfile = fs::File::create(&outpath)
                .with_context(|| format!("criando arquivo {}", outpath.display()))?;
            io::copy(&mut member, &mut outfile).context("gravando arquivo extraído")?;
        }

        let percent = (((i + 1) as f64 / total as f64) * 100.0).round() as i32;
        let _ = tx.send(ExtractEvent::Progress {
            percent,
            status: format!("Extraindo: {member_name}"),
        });
    }

    let _ = tx.send(ExtractEvent::Progress {
        percent: 100,
        status: "Organizando arquivos...".to_string(),
    });

    let archive_name = zip_path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();
    Ok(catalog::build_catalog(scratch_dir, &archive_name))
}

/// Monta o caminho de saída de uma entrada do ZIP rejeitando componentes que
/// escapariam do diretório de extração (Zip Slip).
fn build_safe_path(base: &Path, inside_zip: &str) -> Result<PathBuf> {
    let mut clean = PathBuf::new();
    for comp in Path::new(inside_zip).components() {
        match comp {
            Component::Normal(s) => clean.push(s),
            Component::CurDir => continue,
            _ => return Err(ExtractError::UnsafePath(inside_zip.to_string()).into()),
        }
    }
    if clean.as_os_str().is_empty() {
        return Err(ExtractError::EmptyPath.into());
    }
    Ok(base.join(clean))
}
