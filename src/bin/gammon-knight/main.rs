/*
 * main.rs
 * Part of the gammon-knight project
 * Created Date: Thursday, March 13th 2025
 * Author: Paul Tsouchlos (DeveloperPaul123) (developer.paul.123@gmail.com)
 * -----
 * Last Modified: Tue Jul 15 2025
 * -----
 * Copyright (c) 2025 Paul Tsouchlos (DeveloperPaul123)
 * GNU General Public License v3.0 or later
 * https://www.gnu.org/licenses/gpl-3.0-standalone.html
 *
 */

use std::{fs, path::PathBuf, process::exit};

use anyhow::{Context, Result, bail};
use backgammon::xgid::decode_xgid;
use cards::{
    analyzer::Analyzer,
    colors,
    match_text::parse_match_text,
    note::build_note,
    output_parser::parse_analysis,
    pipeline,
    render::BoardRenderer,
    settings::Settings,
};
use clap::{Parser, Subcommand};
use colored::Colorize;
use console::Emoji;
use indicatif::ProgressBar;
use log::LevelFilter;

static CHECK_BOX: Emoji = Emoji("✅", "");
static CARDS: Emoji = Emoji("🂠", "");

#[derive(Parser)]
#[command(
    name = "gammon-knight",
    about = "Turn backgammon analyses into spaced-repetition study cards",
    version
)]
struct Options {
    #[command(subcommand)]
    command: Command,

    /// Path to a JSON settings file.
    #[arg(long, short)]
    settings: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    verbose: bool,
}

#[derive(Subcommand)]
#[command(about = "Available commands")]
enum Command {
    /// Render a position id as an SVG board.
    Render {
        /// XGID of the position to draw.
        id: String,
        /// Output file; stdout when omitted.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Analyze one position id with GNU Backgammon and print the
    /// candidates.
    Analyze {
        /// XGID or GNUID to analyze.
        id: String,
        /// Path to the gnubg CLI executable (overrides settings).
        #[arg(long)]
        gnubg: Option<PathBuf>,
    },
    /// Run the card pipeline over a file of position ids or a match
    /// transcript and write notes plus board media.
    Import {
        /// Input file: position ids one per line, or a GNU Backgammon
        /// match text export.
        input: PathBuf,
        /// Directory for the emitted notes and media.
        #[arg(long, short, default_value = "cards-out")]
        output: PathBuf,
        /// Treat the input as a match-text transcript.
        #[arg(long, default_value_t = false)]
        transcript: bool,
    },
    /// List the built-in board color schemes.
    Schemes,
}

fn main() {
    let options = Options::parse();
    let level = if options.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    if simplelog::TermLogger::init(
        level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )
    .is_err()
    {
        eprintln!("logger initialization failed");
    }

    if let Err(error) = dispatch(options) {
        eprintln!("{} {error:#}", "error:".red().bold());
        exit(1);
    }
}

fn load_settings(path: Option<&PathBuf>) -> Result<Settings> {
    match path {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("reading settings from {}", path.display()))?;
            Ok(Settings::from_json(&json)?)
        }
        None => Ok(Settings::default()),
    }
}

fn build_analyzer(settings: &Settings, gnubg: Option<&PathBuf>) -> Result<Analyzer> {
    let path = gnubg
        .map(|p| p.display().to_string())
        .or_else(|| settings.analyzer_executable_path.clone());
    let Some(path) = path else {
        bail!("no analyzer configured; pass --gnubg or set analyzer_executable_path");
    };
    Ok(Analyzer::new(path, settings.analyzer_plies)?)
}

fn dispatch(options: Options) -> Result<()> {
    let settings = load_settings(options.settings.as_ref())?;
    let renderer = BoardRenderer::new(settings.palette(), settings.orientation);

    match options.command {
        Command::Render { id, output } => {
            let (position, info) = decode_xgid(&id)?;
            let svg = renderer.render(
                &position,
                info.on_roll,
                info.dice,
                info.cube_value,
                info.cube_owner,
            );
            match output {
                Some(path) => {
                    fs::write(&path, svg)
                        .with_context(|| format!("writing {}", path.display()))?;
                    println!("{CHECK_BOX} wrote {}", path.display());
                }
                None => println!("{svg}"),
            }
        }
        Command::Analyze { id, gnubg } => {
            let analyzer = build_analyzer(&settings, gnubg.as_ref())?;
            let analysis = analyzer.analyze_position(&id)?;
            let candidates = parse_analysis(&analysis.output, analysis.kind)?;
            println!("{} ({})", "candidates".bold(), analysis.kind);
            for candidate in &candidates {
                println!("  {candidate}");
            }
        }
        Command::Import {
            input,
            output,
            transcript,
        } => {
            let raw = fs::read_to_string(&input)
                .with_context(|| format!("reading {}", input.display()))?;
            let (notes, media) = if transcript {
                import_transcript(&raw, &settings, &renderer)
            } else {
                import_position_ids(&raw, &settings)?
            };

            fs::create_dir_all(&output)
                .with_context(|| format!("creating {}", output.display()))?;
            for artifact in &media {
                fs::write(output.join(&artifact.name), &artifact.svg)?;
            }
            let manifest: Vec<serde_json::Value> = notes
                .iter()
                .map(|note| {
                    serde_json::json!({
                        "xgid": note.canonical_xgid,
                        "front": note.front_html,
                        "back": note.back_html,
                        "tags": note.tags,
                    })
                })
                .collect();
            fs::write(
                output.join("notes.json"),
                serde_json::to_string_pretty(&manifest)?,
            )?;
            println!(
                "{CHECK_BOX} {CARDS} {} notes and {} media files in {}",
                notes.len(),
                media.len(),
                output.display()
            );
        }
        Command::Schemes => {
            println!("Available color schemes:");
            for name in colors::scheme_names() {
                println!("  {name}");
            }
        }
    }
    Ok(())
}

fn import_transcript(
    raw: &str,
    settings: &Settings,
    renderer: &BoardRenderer,
) -> (Vec<cards::note::NoteRecord>, Vec<cards::note::MediaArtifact>) {
    let imported = parse_match_text(raw);
    let decisions: Vec<_> = imported.into_iter().map(|i| i.decision).collect();
    let (mut kept, skipped) = pipeline::filter_imported(
        decisions,
        &settings.import_player_mask,
        settings.import_error_threshold,
    );
    for item in &skipped {
        log::debug!("skipped {}: {}", item.index, item.reason);
    }
    let mut notes = Vec::new();
    let mut media = Vec::new();
    for decision in &mut kept {
        pipeline::attach_resulting_positions(decision);
        let (note, mut artifacts) = build_note(decision, renderer);
        notes.push(note);
        media.append(&mut artifacts);
    }
    (notes, media)
}

fn import_position_ids(
    raw: &str,
    settings: &Settings,
) -> Result<(Vec<cards::note::NoteRecord>, Vec<cards::note::MediaArtifact>)> {
    let analyzer = match &settings.analyzer_executable_path {
        Some(path) => Some(Analyzer::new(path, settings.analyzer_plies)?),
        None => None,
    };

    let progress_bar = ProgressBar::new(0);
    let progress = |completed: usize, total: usize| {
        progress_bar.set_length(total as u64);
        progress_bar.set_position(completed as u64);
    };

    let report = pipeline::run(raw, settings, analyzer.as_ref(), Some(&progress), None);
    progress_bar.finish_and_clear();

    if let Some(fatal) = report.fatal {
        return Err(fatal.into());
    }
    for item in &report.skipped {
        log::warn!("skipped input {} at {}: {}", item.index, item.stage, item.reason);
    }
    Ok((report.notes, report.media))
}
