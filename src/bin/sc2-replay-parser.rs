//! StarCraft II replay (.SC2Replay) parser CLI
//!
//! A command-line interface for parsing, validating, and inspecting replays.
//!
//! ## Commands
//!
//! - `info` - Display match metadata and players
//! - `parse` - Parse a replay with output format options
//! - `validate` - Run every stage and report which succeeded (exit codes for scripting)
//! - `events` - Decode a raw `replay.game.events` file for a given build

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use sc2_replay_parser::events::{GameEventDecoder, GameEventStream};
use sc2_replay_parser::replay::{ChatMessage, Player, Replay};
use sc2_replay_parser::{
    ArchiveExtractor, CommandExtractor, DirectoryExtractor, GameEvent, GameSpeed, ParserConfig,
    ParserError, PipelineEvent, ReplayParser,
};

/// StarCraft II replay (.SC2Replay) parser
#[derive(Parser)]
#[command(name = "sc2-replay-parser")]
#[command(about = "StarCraft II replay (.SC2Replay) parser", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Read section files from this directory instead of running the extractor
    #[arg(long, global = true)]
    extracted: Option<PathBuf>,
    /// Streaming read size in bytes (overrides the config file)
    #[arg(long, global = true)]
    chunk_size: Option<usize>,
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    debug: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display replay information
    Info {
        /// Path to the replay file
        file: PathBuf,
    },
    /// Parse a replay file
    Parse {
        /// Path to the replay file
        file: PathBuf,
        /// Output format: json, pretty
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
        /// Include game events in output
        #[arg(long)]
        actions: bool,
        /// Include player details
        #[arg(long)]
        players: bool,
        /// Show event statistics
        #[arg(long)]
        stats: bool,
        /// Include chat messages
        #[arg(long)]
        chat: bool,
    },
    /// Validate a replay
    Validate {
        /// Path to the replay file
        file: PathBuf,
        /// Verbose error reporting
        #[arg(short, long)]
        verbose: bool,
    },
    /// Decode a raw game-events section
    Events {
        /// Path to a replay.game.events file
        file: PathBuf,
        /// Client build that recorded it
        #[arg(short, long)]
        build: u32,
        /// Maximum number of events to print
        #[arg(short, long, default_value = "50")]
        limit: usize,
    },
}

/// Output format options
#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Json,
    Pretty,
}

/// The two ways the CLI can produce section files.
enum Extractor {
    Command(CommandExtractor),
    Directory(DirectoryExtractor),
}

impl ArchiveExtractor for Extractor {
    fn extract(&self, replay: &Path, out_dir: &Path) -> sc2_replay_parser::Result<()> {
        match self {
            Extractor::Command(e) => e.extract(replay, out_dir),
            Extractor::Directory(e) => e.extract(replay, out_dir),
        }
    }
}

// ============================================================================
// Serializable Output Structures
// ============================================================================

#[derive(Serialize)]
struct ParseOutput<'a> {
    info: &'a sc2_replay_parser::Info,
    map: &'a sc2_replay_parser::MapInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    players: Option<&'a [Player]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    chat: Option<&'a [ChatMessage]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    actions: Option<&'a [GameEvent]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    statistics: Option<Statistics>,
}

#[derive(Serialize, Default)]
struct Statistics {
    total_events: usize,
    unknown_events: usize,
    events_by_type: BTreeMap<String, usize>,
    events_by_player: BTreeMap<u8, PlayerStats>,
}

#[derive(Serialize, Default)]
struct PlayerStats {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    total: usize,
    apm: f64,
}

// ============================================================================
// Validation Result Structure
// ============================================================================

#[derive(Default)]
struct ValidationResult {
    header_valid: bool,
    details_valid: bool,
    attributes_valid: bool,
    messages_valid: bool,
    game_events_valid: bool,
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ValidationResult {
    fn is_valid(&self) -> bool {
        self.header_valid
            && self.details_valid
            && self.attributes_valid
            && self.messages_valid
            && self.game_events_valid
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let config = match load_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Info { file } => cmd_info(&config, cli.extracted.as_deref(), &file),
        Commands::Parse {
            file,
            output,
            actions,
            players,
            stats,
            chat,
        } => {
            let options = ParseOptions {
                output,
                actions,
                players,
                stats,
                chat,
            };
            cmd_parse(config, cli.extracted.as_deref(), &file, &options)
        }
        Commands::Validate { file, verbose } => {
            cmd_validate(config, cli.extracted.as_deref(), &file, verbose)
        }
        Commands::Events { file, build, limit } => cmd_events(&config, &file, build, limit),
    }
}

fn load_config(cli: &Cli) -> sc2_replay_parser::Result<ParserConfig> {
    let mut config = match &cli.config {
        Some(path) => ParserConfig::from_json_file(path)?,
        None => ParserConfig::default(),
    };
    if let Some(chunk_size) = cli.chunk_size {
        config.chunk_size = chunk_size;
    }
    config.validate()?;
    Ok(config)
}

fn build_parser(
    config: ParserConfig,
    extracted: Option<&Path>,
) -> sc2_replay_parser::Result<ReplayParser<Extractor>> {
    let extractor = match extracted {
        Some(dir) => Extractor::Directory(DirectoryExtractor::new(dir)),
        None => Extractor::Command(CommandExtractor::new(config.extractor.clone())),
    };
    ReplayParser::new(config, extractor)
}

fn parse_replay(
    config: ParserConfig,
    extracted: Option<&Path>,
    file: &Path,
) -> Result<Replay, String> {
    let parser = build_parser(config, extracted).map_err(|e| e.to_string())?;
    parser.parse(file).map_err(|e| e.to_string())
}

// ============================================================================
// Info Command Implementation
// ============================================================================

fn cmd_info(config: &ParserConfig, extracted: Option<&Path>, file: &Path) -> ExitCode {
    let config = ParserConfig {
        keep_game_events: false,
        ..config.clone()
    };
    let replay = match parse_replay(config, extracted, file) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    print_info(&replay);
    ExitCode::SUCCESS
}

fn print_info(replay: &Replay) {
    let info = &replay.info;
    println!("=== Replay Information ===\n");

    println!("Game:");
    println!("  Version: {}", info.version);
    println!(
        "  Length: {} ({} frames)",
        format_duration(info.game_length_seconds),
        info.game_length
    );
    println!("  Speed: {}", display_or_unknown(info.speed.as_ref().map(GameSpeed::name)));
    println!("  Format: {}", display_or_unknown(info.format.as_deref()));
    println!("  Type: {}", display_or_unknown(info.game_type.as_deref()));
    println!("  Region: {}", display_or_unknown(info.region.as_deref()));
    println!(
        "  Date: {} (UTC offset {}s)",
        info.date.unix, info.date.timezone_offset
    );

    println!();

    println!("Map:");
    println!("  Name: {}", display_or_unknown(replay.map.name.as_deref()));
    for file in &replay.map.files {
        println!("  - {} {}", file.region, file.filename);
    }

    println!();

    println!("Players:");
    for player in &replay.players {
        let mut line = format!("  {player}");
        if let Some(team) = player.team {
            line.push_str(" team ");
            line.push_str(&(team + 1).to_string());
        }
        if player.is_winner() {
            line.push_str(" [winner]");
        }
        if info.recorded_by == Some(player.slot) {
            line.push_str(" [recorder]");
        }
        println!("{line}");
    }
}

fn display_or_unknown(value: Option<&str>) -> &str {
    value.unwrap_or("Unknown")
}

fn format_duration(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

// ============================================================================
// Parse Command Implementation
// ============================================================================

#[allow(clippy::struct_excessive_bools)]
struct ParseOptions {
    output: OutputFormat,
    actions: bool,
    players: bool,
    stats: bool,
    chat: bool,
}

fn cmd_parse(
    config: ParserConfig,
    extracted: Option<&Path>,
    file: &Path,
    options: &ParseOptions,
) -> ExitCode {
    let config = ParserConfig {
        keep_game_events: options.actions || options.stats,
        ..config
    };
    let replay = match parse_replay(config, extracted, file) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let output = ParseOutput {
        info: &replay.info,
        map: &replay.map,
        players: options.players.then_some(replay.players.as_slice()),
        chat: options.chat.then_some(replay.messages.as_slice()),
        actions: options.actions.then_some(replay.events.as_slice()),
        statistics: options.stats.then(|| collect_statistics(&replay)),
    };

    match options.output {
        OutputFormat::Json => print_json(&output),
        OutputFormat::Pretty => print_pretty(&output, &replay),
    }

    ExitCode::SUCCESS
}

#[allow(clippy::cast_precision_loss)]
fn collect_statistics(replay: &Replay) -> Statistics {
    let mut stats = Statistics::default();

    for event in &replay.events {
        stats.total_events += 1;
        if event.kind.is_unknown() {
            stats.unknown_events += 1;
        }
        *stats
            .events_by_type
            .entry(event.kind.type_name().to_string())
            .or_insert(0) += 1;
        stats
            .events_by_player
            .entry(event.player_id())
            .or_default()
            .total += 1;
    }

    let minutes = replay.info.game_length_seconds as f64 / 60.0;
    for (player_id, ps) in &mut stats.events_by_player {
        // Event player ids are 1-based slots
        ps.name = player_id
            .checked_sub(1)
            .and_then(|slot| replay.player(slot))
            .and_then(|p| p.name.clone());
        if minutes > 0.0 {
            ps.apm = ps.total as f64 / minutes;
        }
    }

    stats
}

fn print_json(output: &ParseOutput<'_>) {
    match serde_json::to_string_pretty(output) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Error serializing to JSON: {e}"),
    }
}

fn print_pretty(output: &ParseOutput<'_>, replay: &Replay) {
    print_info(replay);
    println!();

    if let Some(chat) = output.chat {
        let speed = replay.info.speed.unwrap_or(GameSpeed::Normal);
        println!("=== Chat Messages ({}) ===", chat.len());
        for msg in chat {
            let sender = msg
                .player
                .and_then(|slot| replay.player(slot))
                .and_then(|p| p.name.as_deref())
                .unwrap_or("Unknown");
            println!(
                "  [{}] ({}) {}: {}",
                format_duration(msg.seconds(speed)),
                msg.channel,
                sender,
                msg.text
            );
        }
        println!();
    }

    if let Some(stats) = &output.statistics {
        println!("=== Statistics ===");
        println!("Total Events: {}", stats.total_events);
        println!("Unknown Events: {}", stats.unknown_events);
        println!("\nEvents by Type:");
        let mut types: Vec<_> = stats.events_by_type.iter().collect();
        types.sort_by(|a, b| b.1.cmp(a.1));
        for (event_type, count) in types {
            println!("  {event_type}: {count}");
        }

        println!("\n=== Player Stats ===");
        for (player_id, ps) in &stats.events_by_player {
            let name = ps.name.as_deref().unwrap_or("Unknown");
            println!("  Player {player_id} ({name}): {} events, {:.1} APM", ps.total, ps.apm);
        }
        println!();
    }

    if let Some(actions) = output.actions {
        println!("=== Game Events ({}) ===", actions.len());
        // Only show first 50 events in pretty mode to avoid spam
        let display_count = std::cmp::min(actions.len(), 50);
        for event in &actions[..display_count] {
            println!("  {event}");
        }
        if actions.len() > 50 {
            println!("  ... and {} more events", actions.len() - 50);
        }
    }
}

// ============================================================================
// Validate Command Implementation
// ============================================================================

fn cmd_validate(
    config: ParserConfig,
    extracted: Option<&Path>,
    file: &Path,
    verbose: bool,
) -> ExitCode {
    let result = validate_replay(config, extracted, file);

    if verbose {
        print_validation_details(&result, file);
    } else {
        print_validation_summary(&result, file);
    }

    if result.is_valid() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn validate_replay(
    config: ParserConfig,
    extracted: Option<&Path>,
    file: &Path,
) -> ValidationResult {
    let mut result = ValidationResult::default();

    let config = ParserConfig {
        keep_game_events: false,
        ..config
    };
    let parser = match build_parser(config, extracted) {
        Ok(p) => p,
        Err(e) => {
            result.errors.push(format!("Invalid configuration: {e}"));
            return result;
        }
    };

    let (tx, rx) = crossbeam_channel::unbounded();
    let parsed = parser.parse_with_events(file, &tx);
    drop(tx);

    let mut unknown_events = 0usize;
    for event in rx.iter() {
        match event {
            PipelineEvent::Header(_) => result.header_valid = true,
            PipelineEvent::Details(_) => result.details_valid = true,
            PipelineEvent::Attributes(_) => result.attributes_valid = true,
            PipelineEvent::MessagesDone => result.messages_valid = true,
            PipelineEvent::GameEvents(batch) => {
                unknown_events += batch.iter().filter(|e| e.kind.is_unknown()).count();
            }
            PipelineEvent::GameEventsDone => result.game_events_valid = true,
            PipelineEvent::Error { message } => result.errors.push(message),
            PipelineEvent::Partial(_) | PipelineEvent::Messages(_) | PipelineEvent::Done => {}
        }
    }

    if let Ok(replay) = parsed {
        if replay.players.is_empty() {
            result.warnings.push("No players found in replay".to_string());
        }
        if replay.info.recorded_by.is_none() {
            result
                .warnings
                .push("Could not determine who recorded the replay".to_string());
        }
    }
    if unknown_events > 0 {
        result
            .warnings
            .push(format!("{unknown_events} game events have no decoded layout"));
    }

    result
}

fn print_validation_summary(result: &ValidationResult, file: &Path) {
    let status = if result.is_valid() { "VALID" } else { "INVALID" };
    println!("{}: {}", file.display(), status);
}

fn print_validation_details(result: &ValidationResult, file: &Path) {
    println!("Validating: {}\n", file.display());

    println!("Checks:");
    println!("  Header:        {}", status_icon(result.header_valid));
    println!("  Details:       {}", status_icon(result.details_valid));
    println!("  Attributes:    {}", status_icon(result.attributes_valid));
    println!("  Messages:      {}", status_icon(result.messages_valid));
    println!("  Game events:   {}", status_icon(result.game_events_valid));

    if !result.errors.is_empty() {
        println!("\nErrors:");
        for error in &result.errors {
            println!("  - {error}");
        }
    }

    if !result.warnings.is_empty() {
        println!("\nWarnings:");
        for warning in &result.warnings {
            println!("  - {warning}");
        }
    }

    println!(
        "\nResult: {}",
        if result.is_valid() { "VALID" } else { "INVALID" }
    );
}

fn status_icon(valid: bool) -> &'static str {
    if valid {
        "[OK]"
    } else {
        "[FAIL]"
    }
}

// ============================================================================
// Events Command Implementation
// ============================================================================

fn cmd_events(config: &ParserConfig, file: &Path, build: u32, limit: usize) -> ExitCode {
    match decode_events_file(file, build, config.chunk_size, limit) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn decode_events_file(
    file: &Path,
    build: u32,
    chunk_size: usize,
    limit: usize,
) -> Result<(), ParserError> {
    let mut input = File::open(file)?;
    let mut stream = GameEventStream::new(GameEventDecoder::for_build(build));
    let mut buffer = vec![0u8; chunk_size];
    let mut printed = 0usize;
    let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();

    println!(
        "Decoding {} with the table for build {}",
        file.display(),
        stream.decoder().version().min_build
    );

    loop {
        let read = input.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        for event in stream.feed(&buffer[..read])? {
            *counts.entry(event.kind.type_name()).or_insert(0) += 1;
            if printed < limit {
                println!("  {event}");
                printed += 1;
            }
        }
    }

    let total = stream.records();
    let last_frame = stream.frame();
    stream.finish()?;

    println!("\n{total} events, last frame {last_frame}");
    for (name, count) in counts {
        println!("  {name}: {count}");
    }
    Ok(())
}
