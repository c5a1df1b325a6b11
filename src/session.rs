use std::collections::HashSet;

use crate::media::MediaItem;

/// Contagem de progresso de avaliação de um catálogo.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProgressSummary {
    pub total: usize,
    pub evaluated: usize,
    pub pending: usize,
}

pub fn summarize(catalog: &[MediaItem], evaluated: &HashSet<String>) -> ProgressSummary {
    let done = catalog
        .iter()
        .filter(|item| evaluated.contains(&item.file_name))
        .count();
    ProgressSummary {
        total: catalog.len(),
        evaluated: done,
        pending: catalog.len() - done,
    }
}

/// Índice da primeira imagem ainda não avaliada; quando todas já foram
/// avaliadas a sessão recomeça do início.
pub fn first_unevaluated(catalog: &[MediaItem], evaluated: &HashSet<String>) -> usize {
    catalog
        .iter()
        .position(|item| !evaluated.contains(&item.file_name))
        .unwrap_or(0)
}

/// Próxima imagem não avaliada estritamente depois de `current`; `None` quando
/// o fim da lista foi alcançado.
pub fn next_unevaluated(
    catalog: &[MediaItem],
    evaluated: &HashSet<String>,
    current: usize,
) -> Option<usize> {
    catalog
        .iter()
        .enumerate()
        .skip(current + 1)
        .find(|(_, item)| !evaluated.contains(&item.file_name))
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str) -> MediaItem {
        MediaItem {
            file_path: name.into(),
            file_name: name.to_string(),
            name_without_ext: name.trim_end_matches(".jpg").to_string(),
            capture_date: "15/05/2024".to_string(),
            subject_id: "SUBJ01".to_string(),
            finger_label: "Desconhecido".to_string(),
            frame_number: 0,
        }
    }

    fn evaluated(names: &[&str]) -> HashSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn resumes_at_first_pending_image() {
        let catalog = vec![item("a.jpg"), item("b.jpg"), item("c.jpg")];
        assert_eq!(first_unevaluated(&catalog, &evaluated(&[])), 0);
        assert_eq!(first_unevaluated(&catalog, &evaluated(&["a.jpg"])), 1);
        assert_eq!(
            first_unevaluated(&catalog, &evaluated(&["a.jpg", "b.jpg"])),
            2
        );
    }

    #[test]
    fn fully_evaluated_restarts_at_zero() {
        let catalog = vec![item("a.jpg"), item("b.jpg")];
        let done = evaluated(&["a.jpg", "b.jpg"]);
        assert_eq!(first_unevaluated(&catalog, &done), 0);
    }

    #[test]
    fn jump_skips_evaluated_images() {
        let catalog = vec![item("a.jpg"), item("b.jpg"), item("c.jpg"), item("d.jpg")];
        let done = evaluated(&["b.jpg", "c.jpg"]);
        assert_eq!(next_unevaluated(&catalog, &done, 0), Some(3));
        assert_eq!(next_unevaluated(&catalog, &done, 3), None);
    }

    #[test]
    fn jump_at_end_of_list_returns_none() {
        let catalog = vec![item("a.jpg")];
        assert_eq!(next_unevaluated(&catalog, &evaluated(&[]), 0), None);
    }

    #[test]
    fn summary_counts_only_catalog_files() {
        let catalog = vec![item("a.jpg"), item("b.jpg")];
        // Registros de arquivos que não estão mais no ZIP não contam.
        let done = evaluated(&["a.jpg", "fantasma.jpg"]);
        assert_eq!(
            summarize(&catalog, &done),
            ProgressSummary {
                total: 2,
                evaluated: 1,
                pending: 1,
            }
        );
    }
}
