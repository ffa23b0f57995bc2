use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use visual_novel_interface::{
    collect_script_keys, ActionOutcome, InterfaceConfig, LocalizationCatalog,
    LocalizationIssueKind, NarrationController, NarrationInterface, NarrativeScript,
    ScriptedNarrative, Store, Translator, Typewriter, TypewriterState,
};

#[derive(Parser)]
#[command(author, version, about = "Headless visual novel interface")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Play a script, printing each dialogue view and choice menu.
    Play {
        script: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        /// Menu positions to pick, in order; the first entry is used afterwards.
        #[arg(long = "choose")]
        choices: Vec<usize>,
        #[arg(long, default_value_t = 200)]
        steps: usize,
    },
    /// Play a script and print its narrative history.
    History {
        script: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        search: Option<String>,
        #[arg(long = "choose")]
        choices: Vec<usize>,
        #[arg(long, default_value_t = 200)]
        steps: usize,
    },
    /// Report missing and orphan localization keys for a script.
    Lint {
        script: PathBuf,
        #[arg(long)]
        catalog: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Play {
            script,
            config,
            choices,
            steps,
        } => play(&script, config.as_deref(), &choices, steps, None),
        Command::History {
            script,
            config,
            search,
            choices,
            steps,
        } => play(&script, config.as_deref(), &choices, steps, Some(search)),
        Command::Lint { script, catalog } => lint(&script, &catalog),
    }
}

fn load_script(path: &Path) -> Result<ScriptedNarrative> {
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let script = NarrativeScript::from_json(&raw).context("parse script")?;
    Ok(ScriptedNarrative::new(script)?)
}

fn load_translator(config_path: Option<&Path>) -> Result<(InterfaceConfig, Translator)> {
    let config = match config_path {
        Some(path) => InterfaceConfig::load_from(path)
            .with_context(|| format!("load config {}", path.display()))?,
        None => InterfaceConfig::default(),
    };
    let base = config_path
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let translator = config.translator(&base).context("load catalog")?;
    Ok((config, translator))
}

/// Drives the script headlessly; `history` switches from per-step output to
/// a final history dump filtered by the optional search string.
fn play(
    script_path: &Path,
    config_path: Option<&Path>,
    choices: &[usize],
    max_steps: usize,
    history: Option<Option<String>>,
) -> Result<()> {
    let engine = load_script(script_path)?;
    let (config, translator) = load_translator(config_path)?;
    let interface = NarrationInterface::with_config(translator, &config);
    let controller = NarrationController::default();
    let typewriter_store = Store::new(TypewriterState {
        delay_ms: config.typewriter_delay_ms,
        in_progress: false,
    });
    let mut picks = choices.iter().copied();
    let verbose = history.is_none();

    for _ in 0..max_steps {
        if engine.is_finished() {
            break;
        }
        let view = interface.dialogue(&engine);
        let menu = interface.choice_menu_options(&engine);
        if verbose {
            let mut typewriter = Typewriter::new(view.clone(), typewriter_store.clone());
            typewriter.skip();
            if let Some(speaker) = &view.speaker {
                println!("[{}]", speaker.display_name());
            }
            println!("{}{{{}}}", view.stable_text, view.delta_text);
            if !controller.menu_hidden(&menu) {
                for (position, item) in menu.iter().enumerate() {
                    println!("  {}. {}", position + 1, item.text);
                }
            }
        }

        let outcome = if menu.is_empty() {
            if interface.input_value(&engine).is_required {
                bail!("script requires player input, which the headless player cannot provide");
            }
            pollster::block_on(controller.go_next(&engine, &interface))
        } else {
            let position = picks.next().unwrap_or(0);
            let item = menu
                .get(position)
                .with_context(|| format!("menu has no option {position}"))?;
            pollster::block_on(controller.select_choice(&engine, &interface, item))
        };
        if outcome != ActionOutcome::Applied {
            bail!("engine refused to continue ({outcome:?})");
        }
    }

    if let Some(search) = history {
        let entries = interface.narrative_history(&engine, search.as_deref());
        for entry in entries.iter() {
            match &entry.speaker {
                Some(speaker) => println!("{speaker}: {}", entry.text),
                None => println!("{}", entry.text),
            }
            for choice in entry.visible_choices() {
                let marker = if choice.is_response { "*" } else { "-" };
                println!("  {marker} {}", choice.text);
            }
            if let Some(value) = &entry.input_value {
                println!("  > {value}");
            }
        }
    }
    Ok(())
}

fn lint(script_path: &Path, catalog_path: &Path) -> Result<()> {
    let engine = load_script(script_path)?;
    let catalog = LocalizationCatalog::load_from(catalog_path)
        .with_context(|| format!("load catalog {}", catalog_path.display()))?;
    let keys = collect_script_keys(engine.script());
    let issues = catalog.validate_keys(keys.iter().map(String::as_str));
    for issue in &issues {
        let kind = match issue.kind {
            LocalizationIssueKind::MissingKey => "missing",
            LocalizationIssueKind::OrphanKey => "orphan",
        };
        println!("{}\t{kind}\t{}", issue.locale, issue.key);
    }
    Ok(())
}
