//! Vigil CLI - Command-line interface for the Vigil engine
//!
//! Commands:
//! - replay: Drive a session from a scripted observation timeline and emit
//!   the final report (deterministic, synthetic timestamps)
//! - schema: Print input-script and report schema information

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::{DateTime, Utc};
use vigil::{
    EngineConfig, EngineError, FaceObservation, ObjectObservation, Report, Session, ENGINE_VERSION,
};

/// Vigil - Temporal violation detection and integrity scoring for proctored sessions
#[derive(Parser)]
#[command(name = "vigil")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Replay proctoring observations into an integrity report", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a scripted observation timeline through a session
    Replay {
        /// Input script path, NDJSON, one record per line (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Candidate identifier recorded in the session
        #[arg(long, default_value = "unknown")]
        candidate: String,

        /// Engine configuration as a JSON file (defaults apply otherwise)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output format (defaults to text on a TTY, json otherwise)
        #[arg(long)]
        format: Option<OutputFormat>,
    },

    /// Print schema information
    Schema {
        /// Schema to print
        #[arg(value_enum)]
        schema_type: SchemaType,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
    /// Plain text report
    Text,
}

#[derive(Clone, Copy, ValueEnum)]
enum SchemaType {
    /// Replay script record schema
    Input,
    /// Report schema
    Output,
}

/// One scripted tick. The session starts at the first record's timestamp and
/// stops at the last one unless an explicit `stop` record appears earlier.
#[derive(serde::Deserialize)]
struct ScriptRecord {
    at: DateTime<Utc>,
    #[serde(flatten)]
    step: ScriptStep,
}

#[derive(serde::Deserialize)]
#[serde(tag = "tick", rename_all = "snake_case")]
enum ScriptStep {
    Face { face: FaceObservation },
    Objects { objects: Vec<ObjectObservation> },
    Stats,
    Pause,
    Resume,
    Stop,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), VigilCliError> {
    match cli.command {
        Commands::Replay {
            input,
            output,
            candidate,
            config,
            format,
        } => cmd_replay(&input, &output, &candidate, config.as_deref(), format),
        Commands::Schema { schema_type } => cmd_schema(schema_type),
    }
}

fn cmd_replay(
    input: &Path,
    output: &Path,
    candidate: &str,
    config: Option<&Path>,
    format: Option<OutputFormat>,
) -> Result<(), VigilCliError> {
    let input_data = if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    let records = parse_script(&input_data)?;
    if records.is_empty() {
        return Err(VigilCliError::EmptyScript);
    }

    let engine_config = match config {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => EngineConfig::default(),
    };

    let report = replay(records, candidate, engine_config)?;

    let format = format.unwrap_or_else(|| {
        if atty::is(atty::Stream::Stdout) {
            OutputFormat::Text
        } else {
            OutputFormat::Json
        }
    });
    let rendered = match format {
        OutputFormat::Json => report.to_json().map(|s| s + "\n")?,
        OutputFormat::JsonPretty => report.to_json_pretty().map(|s| s + "\n")?,
        OutputFormat::Text => report.render_text(),
    };

    if output.to_string_lossy() == "-" {
        print!("{rendered}");
        io::stdout().flush()?;
    } else {
        fs::write(output, rendered)?;
    }

    Ok(())
}

fn parse_script(input: &str) -> Result<Vec<ScriptRecord>, VigilCliError> {
    let mut records = Vec::new();
    for (line_no, line) in input.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let record: ScriptRecord = serde_json::from_str(trimmed).map_err(|e| {
            VigilCliError::ParseError(format!("line {}: {}", line_no + 1, e))
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Feed the scripted timeline through a session and return the final report
fn replay(
    records: Vec<ScriptRecord>,
    candidate: &str,
    config: EngineConfig,
) -> Result<Report, VigilCliError> {
    let started_at = records[0].at;
    let mut last_at = started_at;
    let mut session = Session::start(candidate, config, started_at)?;

    for record in &records {
        last_at = record.at;
        match &record.step {
            ScriptStep::Face { face } => {
                session.face_tick(face, record.at);
            }
            ScriptStep::Objects { objects } => {
                session.object_tick(objects, record.at);
            }
            ScriptStep::Stats => session.stats_tick(record.at),
            ScriptStep::Pause => session.pause(record.at)?,
            ScriptStep::Resume => session.resume(record.at)?,
            ScriptStep::Stop => return Ok(session.stop(record.at)?),
        }
    }

    Ok(session.stop(last_at)?)
}

fn cmd_schema(schema_type: SchemaType) -> Result<(), VigilCliError> {
    match schema_type {
        SchemaType::Input => {
            println!("Replay script schema (NDJSON, one record per line)");
            println!();
            println!("Every record carries \"at\" (RFC3339 timestamp) and \"tick\":");
            println!();
            println!("1. face - one face-detection tick");
            println!("   {{\"at\": \"...\", \"tick\": \"face\", \"face\": {{\"count\": 1, \"landmarks\": {{...}}}}}}");
            println!("   landmarks is optional; eye/nose point sets may be empty");
            println!();
            println!("2. objects - one object-detection tick");
            println!("   {{\"at\": \"...\", \"tick\": \"objects\", \"objects\": [{{\"label\": \"cell phone\", \"confidence\": 0.92, \"bbox\": {{...}}}}]}}");
            println!();
            println!("3. stats - one duration/statistics tick");
            println!("   {{\"at\": \"...\", \"tick\": \"stats\"}}");
            println!();
            println!("4. pause / resume / stop - session control");
            println!("   {{\"at\": \"...\", \"tick\": \"pause\"}}");
            println!();
            println!("The session starts at the first record's timestamp and stops at the");
            println!("last one unless an explicit stop record appears earlier.");
        }
        SchemaType::Output => {
            println!("Report schema");
            println!();
            println!("- producer: {{ name, version }}");
            println!("- session_id, candidate_id, started_at, generated_at");
            println!("- duration_seconds");
            println!("- integrity_score (0-100), band, interpretation");
            println!("- stats: {{ duration_seconds, focus_loss_events, suspicious_items,");
            println!("           multiple_face_events, no_face_events, integrity_score }}");
            println!("- timeline: [{{ elapsed (HH:MM:SS since start), kind, severity, detail }}]");
            println!("- recommendations: [{{ severity, message }}]");
        }
    }

    Ok(())
}

// Error types

#[derive(Debug)]
enum VigilCliError {
    Io(io::Error),
    Engine(EngineError),
    Json(serde_json::Error),
    EmptyScript,
    ParseError(String),
}

impl From<io::Error> for VigilCliError {
    fn from(e: io::Error) -> Self {
        VigilCliError::Io(e)
    }
}

impl From<EngineError> for VigilCliError {
    fn from(e: EngineError) -> Self {
        VigilCliError::Engine(e)
    }
}

impl From<serde_json::Error> for VigilCliError {
    fn from(e: serde_json::Error) -> Self {
        VigilCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<VigilCliError> for CliError {
    fn from(e: VigilCliError) -> Self {
        match e {
            VigilCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            VigilCliError::Engine(e) => CliError {
                code: "ENGINE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check configuration values and script ordering".to_string()),
            },
            VigilCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            VigilCliError::EmptyScript => CliError {
                code: "EMPTY_SCRIPT".to_string(),
                message: "No records found in input".to_string(),
                hint: Some("Ensure the script file is not empty".to_string()),
            },
            VigilCliError::ParseError(msg) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: msg,
                hint: Some("Run 'vigil schema input' for the record format".to_string()),
            },
        }
    }
}
