mod catalog;
mod error_catalog;
mod extractor;
mod ledger;
mod media;
mod session;
mod storage;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use error_catalog::ErrorCatalog;
use extractor::ExtractEvent;
use ledger::{ErrorEntry, EvaluationRecord, LedgerStore};
use storage::AppConfig;

#[derive(Parser)]
#[command(
    name = "benapro",
    about = "Avaliador de erros em datasets de impressões digitais"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extrai um arquivo ZIP e lista o catálogo de imagens
    Carregar { zip: PathBuf },
    /// Mostra o progresso de avaliação de um ZIP já carregado
    Status { zip: String },
    /// Registra um erro avaliado para uma imagem do ZIP carregado
    Anotar {
        zip: PathBuf,
        /// Nome do arquivo de imagem dentro do ZIP
        #[arg(long)]
        arquivo: String,
        /// Nome do erro, conforme o catálogo de erros
        #[arg(long)]
        nome: String,
        /// Descrição do erro, conforme o catálogo de erros
        #[arg(long)]
        descricao: String,
        /// Nota de 1 a 5 estrelas
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
        avaliacao: u8,
    },
    /// Gerencia o catálogo de erros
    Catalogo {
        #[command(subcommand)]
        action: CatalogoCmd,
    },
}

#[derive(Subcommand)]
enum CatalogoCmd {
    /// Lista os nomes e descrições cadastrados
    Listar,
    /// Cadastra um nome de erro
    AddNome { nome: String },
    /// Cadastra uma descrição sob um nome existente
    AddDescricao { nome: String, descricao: String },
    /// Remove um nome e todas as suas descrições
    RemoverNome { nome: String },
    /// Remove uma descrição de um nome
    RemoverDescricao { nome: String, descricao: String },
}

fn main() -> Result<()> {
    storage::ensure_dir(&storage::base_dir())?;
    storage::ensure_dir(&storage::logs_dir())?;

    let file_appender = tracing_appender::rolling::never(storage::logs_dir(), "benapro.log");
    let (nb_writer, _log_guard) = tracing_appender::non_blocking(file_appender);
    let console_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    let file_layer = tracing_subscriber::fmt::layer().with_writer(nb_writer);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(console_layer)
        .with(file_layer)
        .init();

    let cli = Cli::parse();
    let cfg = storage::load_config();
    if let Err(err) = storage::save_config(&cfg) {
        warn!("não foi possível regravar config.json: {err:#}");
    }
    storage::ensure_dir(&cfg.scratch_root)?;

    match cli.command {
        Command::Carregar { zip } => cmd_carregar(&cfg, &zip),
        Command::Status { zip } => cmd_status(&cfg, &zip),
        Command::Anotar {
            zip,
            arquivo,
            nome,
            descricao,
            avaliacao,
        } => cmd_anotar(&cfg, &zip, &arquivo, &nome, &descricao, avaliacao),
        Command::Catalogo { action } => cmd_catalogo(&cfg, action),
    }
}

fn cmd_carregar(cfg: &AppConfig, zip: &Path) -> Result<()> {
    let zip_name = archive_name(zip)?;
    let scratch = storage::scratch_dir_for(&cfg.scratch_root, &zip_name);
    // Restos de uma carga anterior (inclusive de uma extração que falhou)
    // são descartados aqui.
    if scratch.exists() {
        fs::remove_dir_all(&scratch).context("limpando extração anterior")?;
    }
    fs::create_dir_all(&scratch).context("criando diretório de extração")?;

    info!(zip = %zip.display(), "iniciando carregamento");
    let rx = extractor::start_extraction(zip.to_path_buf(), scratch);
    let items = loop {
        match rx.recv() {
            Ok(ExtractEvent::Progress { percent, status }) => {
                println!("[{percent:>3}%] {status}");
            }
            Ok(ExtractEvent::Finished(items)) => break items,
            Ok(ExtractEvent::Failed(msg)) => bail!("falha ao carregar o ZIP: {msg}"),
            Err(_) => bail!("worker de extração encerrou sem responder"),
        }
    };

    if items.is_empty() {
        println!("Nenhuma imagem encontrada.");
        return Ok(());
    }

    let store = LedgerStore::load(cfg.ledger_file.clone());
    let evaluated = store.evaluated_files(&zip_name);
    let summary = session::summarize(&items, &evaluated);

    println!();
    for (i, item) in items.iter().enumerate() {
        let marca = if evaluated.contains(&item.file_name) {
            "✓"
        } else {
            " "
        };
        println!(
            "{marca} {:>4}  {}  {}  {}  frame {}  {}",
            i + 1,
            item.capture_date,
            item.subject_id,
            item.finger_label,
            item.frame_number,
            item.file_name
        );
    }
    println!();
    println!("Total: {} arquivos", summary.total);
    println!("Avaliados: {}", summary.evaluated);
    println!("Pendentes: {}", summary.pending);

    let first = session::first_unevaluated(&items, &evaluated);
    println!("Próxima imagem: {} ({})", first + 1, items[first].file_name);
    Ok(())
}

fn cmd_status(cfg: &AppConfig, zip: &str) -> Result<()> {
    let zip_name = Path::new(zip)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| zip.to_string());

    let store = LedgerStore::load(cfg.ledger_file.clone());
    let records = store.records(&zip_name);
    if records.is_empty() {
        println!("Nenhuma avaliação registrada para {zip_name}.");
        return Ok(());
    }

    println!("{} arquivo(s) avaliado(s) em {zip_name}:", records.len());
    for rec in &records {
        println!(
            "  {}  {} erro(s)  {}  {}  {}",
            rec.file_name,
            rec.errors.len(),
            rec.capture_date,
            rec.subject_id,
            rec.finger_label
        );
    }
    Ok(())
}

fn cmd_anotar(
    cfg: &AppConfig,
    zip: &Path,
    arquivo: &str,
    nome: &str,
    descricao: &str,
    avaliacao: u8,
) -> Result<()> {
    let zip_name = archive_name(zip)?;
    let scratch = storage::scratch_dir_for(&cfg.scratch_root, &zip_name);
    if !scratch.exists() {
        bail!("nenhuma extração encontrada para {zip_name}; rode `carregar` primeiro");
    }

    let catalogo = ErrorCatalog::load(&cfg.errors_file);
    if !catalogo.nomes.iter().any(|n| n == nome) {
        bail!("erro \"{nome}\" não está no catálogo; cadastre com `catalogo add-nome`");
    }
    if !catalogo.contains(nome, descricao) {
        bail!(
            "descrição \"{descricao}\" não cadastrada para \"{nome}\"; use `catalogo add-descricao`"
        );
    }

    let items = catalog::build_catalog(&scratch, &zip_name);
    let pos = items
        .iter()
        .position(|i| i.file_name == arquivo)
        .with_context(|| format!("arquivo {arquivo} não encontrado no catálogo de {zip_name}"))?;
    let item = &items[pos];

    let record = EvaluationRecord {
        file_name: item.file_name.clone(),
        capture_date: item.capture_date.clone(),
        subject_id: item.subject_id.clone(),
        finger_label: item.finger_label.clone(),
        errors: vec![ErrorEntry {
            name: nome.to_string(),
            description: descricao.to_string(),
            rating: avaliacao,
            timestamp: ledger::current_timestamp(),
        }],
    };

    let store = LedgerStore::load(cfg.ledger_file.clone());
    store.upsert(&zip_name, record);
    store
        .save()
        .context("falha ao gravar no arquivo resultado.json")?;

    println!("Avaliação salva com sucesso!");
    println!("Arquivo: {arquivo}");

    let evaluated = store.evaluated_files(&zip_name);
    match session::next_unevaluated(&items, &evaluated, pos) {
        Some(idx) => println!("Próxima pendente: {} ({})", idx + 1, items[idx].file_name),
        None => println!(
            "Você chegou ao fim da lista ou todas as imagens seguintes já foram avaliadas!"
        ),
    }
    Ok(())
}

fn cmd_catalogo(cfg: &AppConfig, action: CatalogoCmd) -> Result<()> {
    let mut catalogo = ErrorCatalog::load(&cfg.errors_file);
    match action {
        CatalogoCmd::Listar => {
            if catalogo.nomes.is_empty() {
                println!("Catálogo de erros vazio.");
                return Ok(());
            }
            for nome in &catalogo.nomes {
                println!("{nome}");
                for desc in catalogo.descriptions_for(nome) {
                    println!("  - {desc}");
                }
            }
            return Ok(());
        }
        CatalogoCmd::AddNome { nome } => {
            if catalogo.add_name(&nome) {
                println!("Nome cadastrado: {nome}");
            } else {
                println!("Nome já existia: {nome}");
            }
        }
        CatalogoCmd::AddDescricao { nome, descricao } => {
            if catalogo.add_description(&nome, &descricao)? {
                println!("Descrição cadastrada em {nome}: {descricao}");
            } else {
                println!("Descrição já existia em {nome}: {descricao}");
            }
        }
        CatalogoCmd::RemoverNome { nome } => {
            if catalogo.remove_name(&nome) {
                println!("Nome removido: {nome}");
            } else {
                println!("Nome não encontrado: {nome}");
            }
        }
        CatalogoCmd::RemoverDescricao { nome, descricao } => {
            if catalogo.remove_description(&nome, &descricao) {
                println!("Descrição removida de {nome}: {descricao}");
            } else {
                println!("Descrição não encontrada em {nome}: {descricao}");
            }
        }
    }
    catalogo.save(&cfg.errors_file)?;
    Ok(())
}

fn archive_name(zip: &Path) -> Result<String> {
    zip.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| anyhow!("caminho de ZIP sem nome de arquivo"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_name_is_the_base_name() {
        let name = archive_name(Path::new("/dados/coletas/Coleta_2024 05.zip")).unwrap();
        assert_eq!(name, "Coleta_2024 05.zip");
        assert!(archive_name(Path::new("/")).is_err());
    }
}
