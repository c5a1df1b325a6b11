use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::media::{self, MediaItem};

/// Extensões de imagem reconhecidas; qualquer outro arquivo é ignorado em
/// silêncio.
const VALID_EXTENSIONS: [&str; 8] = ["jpg", "jpeg", "png", "bmp", "gif", "webp", "tif", "tiff"];

/// Varre o diretório de extração e monta o catálogo ordenado de mídias.
///
/// Os metadados vêm da estrutura de pastas (`.../<dia>/<id>/arquivo`) e do
/// nome do ZIP (`(ano, mes)`); segmentos ausentes degradam para os valores
/// sentinela em vez de falhar. O resultado é ordenado por
/// `(data, id, nome do arquivo)`, com empates preservando a ordem de
/// enumeração.
pub fn build_catalog(scratch_dir: &Path, archive_name: &str) -> Vec<MediaItem> {
    let (ano, mes) = media::parse_archive_date(archive_name);

    let mut files = Vec::new();
    collect_image_files(scratch_dir, &mut files);

    let mut items: Vec<MediaItem> = files
        .into_iter()
        .map(|path| build_item(scratch_dir, &path, &ano, &mes))
        .collect();

    items.sort_by(|a, b| {
        a.capture_date
            .cmp(&b.capture_date)
            .then_with(|| a.subject_id.cmp(&b.subject_id))
            .then_with(|| a.file_name.cmp(&b.file_name))
    });

    debug!(total = items.len(), "catálogo montado");
    items
}

fn build_item(scratch_dir: &Path, path: &Path, ano: &str, mes: &str) -> MediaItem {
    let file_name = path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();
    let name_without_ext = path
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();

    let segments: Vec<String> = path
        .strip_prefix(scratch_dir)
        .unwrap_or(path)
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().to_string()),
            _ => None,
        })
        .collect();

    let dia = if segments.len() >= 3 {
        segments[segments.len() - 3].clone()
    } else {
        "??".to_string()
    };
    let subject_id = if segments.len() >= 2 {
        segments[segments.len() - 2].clone()
    } else {
        "Unknown".to_string()
    };

    MediaItem {
        file_path: path.to_path_buf(),
        file_name,
        capture_date: format!("{dia}/{mes}/{ano}"),
        subject_id,
        finger_label: media::extract_finger_label(&name_without_ext),
        frame_number: media::extract_frame_number(&name_without_ext),
        name_without_ext,
    }
}

/// Caminhada recursiva em ordem de nome, para que a enumeração (e portanto o
/// desempate da ordenação) seja igual entre execuções e sistemas de arquivos.
fn collect_image_files(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(read) = fs::read_dir(dir) else {
        return;
    };
    let mut entries: Vec<PathBuf> = read.filter_map(|e| e.ok()).map(|e| e.path()).collect();
    entries.sort();

    for path in entries {
        if path.is_dir() {
            collect_image_files(&path, out);
        } else if has_valid_extension(&path) {
            out.push(path);
        }
    }
}

fn has_valid_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy().to_lowercase();
            VALID_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}
