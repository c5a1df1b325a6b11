use std::path::PathBuf;

use once_cell::sync::Lazy;
use regex::Regex;

static ARCHIVE_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4})[ _](\d{2})").expect("regex de data"));
static FRAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)_frame_(\d+)").expect("regex de frame"));

/// Uma entrada do catálogo: um arquivo de imagem extraído do ZIP com os
/// metadados de aquisição recuperados do caminho e do nome do arquivo.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaItem {
    pub file_path: PathBuf,
    pub file_name: String,
    pub name_without_ext: String,
    /// `DD/MM/YYYY`; segmentos ausentes viram `??`/`????`.
    pub capture_date: String,
    pub subject_id: String,
    pub finger_label: String,
    pub frame_number: u32,
}

/// Extrai `(ano, mes)` do nome do arquivo ZIP: 4 dígitos, espaço ou
/// underscore, 2 dígitos. Sem correspondência vira `("????", "??")`.
pub fn parse_archive_date(archive_name: &str) -> (String, String) {
    match ARCHIVE_DATE_RE.captures(archive_name) {
        Some(caps) => (caps[1].to_string(), caps[2].to_string()),
        None => ("????".to_string(), "??".to_string()),
    }
}

/// Determina qual dedo e mão a imagem representa a partir dos tokens do nome
/// do arquivo (sem extensão), separados por `_`. A varredura não tem saída
/// antecipada: o último token que casa em cada categoria vence.
pub fn extract_finger_label(stem: &str) -> String {
    let lowered = stem.to_lowercase();
    let mut finger = "";
    let mut side = "";

    for part in lowered.split('_') {
        match part {
            "dedao" => finger = "Dedão",
            "indic" => finger = "Indicador",
            "medio" => finger = "Médio",
            "anel" => finger = "Anelar",
            "mind" => finger = "Mindinho",
            _ => {}
        }
        match part {
            "d" => side = "Direita",
            "e" => side = "Esquerda",
            _ => {}
        }
        // Padrão "<dígito><d|e>", ex: "1d" em coletas antigas.
        let mut chars = part.chars();
        if let (Some(a), Some(b), None) = (chars.next(), chars.next(), chars.next()) {
            if a.is_ascii_digit() {
                match b {
                    'd' => side = "Direita",
                    'e' => side = "Esquerda",
                    _ => {}
                }
            }
        }
    }

    if !finger.is_empty() && !side.is_empty() {
        format!("{finger} - {side}")
    } else if !finger.is_empty() {
        finger.to_string()
    } else {
        "Desconhecido".to_string()
    }
}

/// Número do frame a partir do primeiro token `_frame_<dígitos>` do nome do
/// arquivo; ausente ou inválido vira 0.
pub fn extract_frame_number(stem: &str) -> u32 {
    FRAME_RE
        .captures(stem)
        .and_then(|caps| caps[1].parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_date_space_and_underscore() {
        assert_eq!(
            parse_archive_date("Coleta_2024 05.zip"),
            ("2024".to_string(), "05".to_string())
        );
        assert_eq!(
            parse_archive_date("Coleta 2024_11.zip"),
            ("2024".to_string(), "11".to_string())
        );
    }

    #[test]
    fn archive_date_missing_yields_placeholders() {
        assert_eq!(
            parse_archive_date("coleta-sem-data.zip"),
            ("????".to_string(), "??".to_string())
        );
    }

    #[test]
    fn archive_date_first_match_wins() {
        assert_eq!(
            parse_archive_date("2023_01 e 2024_05.zip"),
            ("2023".to_string(), "01".to_string())
        );
    }

    #[test]
    fn finger_and_side_from_tokens() {
        assert_eq!(extract_finger_label("dedao_d_frame_12"), "Dedão - Direita");
        assert_eq!(extract_finger_label("INDIC_E"), "Indicador - Esquerda");
        assert_eq!(extract_finger_label("medio_sozinho"), "Médio");
    }

    #[test]
    fn side_alone_is_unknown() {
        // "d" casa como lado, mas sem dedo o rótulo degrada para Desconhecido.
        assert_eq!(extract_finger_label("2024_05_1_d"), "Desconhecido");
        assert_eq!(extract_finger_label("qualquer_coisa"), "Desconhecido");
    }

    #[test]
    fn digit_side_token() {
        assert_eq!(extract_finger_label("anel_1d"), "Anelar - Direita");
        assert_eq!(extract_finger_label("mind_3e"), "Mindinho - Esquerda");
    }

    #[test]
    fn last_match_wins_per_category() {
        assert_eq!(
            extract_finger_label("dedao_mind_e_d"),
            "Mindinho - Direita"
        );
        assert_eq!(extract_finger_label("anel_d_2e"), "Anelar - Esquerda");
    }

    #[test]
    fn frame_number_parsing() {
        assert_eq!(extract_frame_number("dedao_d_frame_12"), 12);
        assert_eq!(extract_frame_number("dedao_d_FRAME_007"), 7);
        assert_eq!(extract_frame_number("dedao_d"), 0);
    }
}
