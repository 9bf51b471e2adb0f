//! Typerank CLI - batch front end for the submission engine
//!
//! Commands:
//! - replay: feed a log of submission claims through an in-memory engine
//! - validate: report which claims would be rejected and why
//! - recompute: print the server-side scores for a single claim

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use typerank::types::{Scores, StatsView};
use typerank::{
    EngineError, MemoryStore, RejectReason, SubmissionClaim, SubmissionEngine, ENGINE_VERSION,
};

/// Typerank - result validation and statistics for typing-speed tests
#[derive(Parser)]
#[command(name = "typerank")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Validate and aggregate typing-test submissions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Feed a log of submission claims through an in-memory engine
    Replay {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        /// Print the top-N leaderboard after the replay
        #[arg(long)]
        leaderboard: Option<usize>,
    },

    /// Report which claims would be rejected and why
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the server-side scores for a single claim
    Recompute {
        /// Input file path containing one claim (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one claim per line)
    Ndjson,
    /// JSON array of claims
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one outcome per line)
    Ndjson,
    /// JSON array of outcomes
    Json,
    /// Pretty-printed JSON
    JsonPretty,
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

fn run(cli: Cli) -> Result<(), TyperankCliError> {
    match cli.command {
        Commands::Replay {
            input,
            input_format,
            output_format,
            leaderboard,
        } => cmd_replay(&input, input_format, output_format, leaderboard),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Recompute { input } => cmd_recompute(&input),
    }
}

#[derive(serde::Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum ReplayOutcome {
    Accepted { user_id: String, stats: StatsView },
    Rejected { user_id: String, cause: RejectReason },
}

fn cmd_replay(
    input: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    leaderboard: Option<usize>,
) -> Result<(), TyperankCliError> {
    let claims = read_claims(input, &input_format)?;
    if claims.is_empty() {
        return Err(TyperankCliError::NoClaims);
    }

    let engine = SubmissionEngine::new(MemoryStore::new());
    let mut outcomes = Vec::with_capacity(claims.len());

    for claim in &claims {
        engine.register_user(&claim.user_id)?;
        engine.record_test_started(&claim.user_id)?;

        match engine.submit_result(claim) {
            Ok(stats) => outcomes.push(ReplayOutcome::Accepted {
                user_id: claim.user_id.clone(),
                stats,
            }),
            Err(EngineError::Rejected(cause)) => outcomes.push(ReplayOutcome::Rejected {
                user_id: claim.user_id.clone(),
                cause,
            }),
            Err(e) => return Err(e.into()),
        }
    }

    print!("{}", format_output(&outcomes, &output_format)?);

    if let Some(limit) = leaderboard {
        let rows = engine.leaderboard(limit)?;
        println!("{}", serde_json::to_string_pretty(&rows)?);
    }

    Ok(())
}

fn cmd_validate(
    input: &Path,
    input_format: InputFormat,
    json: bool,
) -> Result<(), TyperankCliError> {
    let claims = read_claims(input, &input_format)?;

    let mut errors: Vec<ValidationErrorDetail> = Vec::new();
    for (index, claim) in claims.iter().enumerate() {
        if let Err(cause) = typerank::validator::validate(claim) {
            errors.push(ValidationErrorDetail {
                index,
                user_id: claim.user_id.clone(),
                cause: cause.to_string(),
            });
        }
    }

    let report = ValidationReport {
        total_claims: claims.len(),
        valid_claims: claims.len() - errors.len(),
        invalid_claims: errors.len(),
        errors,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total claims:   {}", report.total_claims);
        println!("Valid claims:   {}", report.valid_claims);
        println!("Invalid claims: {}", report.invalid_claims);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!("  - claim {} (user {}): {}", err.index, err.user_id, err.cause);
            }
        }
    }

    if report.invalid_claims > 0 {
        Err(TyperankCliError::ValidationFailed(report.invalid_claims))
    } else {
        Ok(())
    }
}

fn cmd_recompute(input: &Path) -> Result<(), TyperankCliError> {
    let data = read_input(input)?;
    let claim: SubmissionClaim = serde_json::from_str(data.trim())?;

    let scores: Scores = typerank::scoring::recompute(&claim.keystrokes, claim.elapsed_seconds)
        .ok_or(TyperankCliError::Unscorable)?;

    println!("{}", serde_json::to_string_pretty(&scores)?);
    Ok(())
}

// Helper functions

fn read_input(input: &Path) -> Result<String, TyperankCliError> {
    if input.to_string_lossy() == "-" {
        if atty::is(atty::Stream::Stdin) {
            eprintln!("reading claims from terminal; pipe NDJSON or finish with Ctrl-D");
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn read_claims(
    input: &Path,
    format: &InputFormat,
) -> Result<Vec<SubmissionClaim>, TyperankCliError> {
    let data = read_input(input)?;
    match format {
        InputFormat::Json => Ok(serde_json::from_str(&data)?),
        InputFormat::Ndjson => {
            let mut claims = Vec::new();
            for (line_num, line) in data.lines().enumerate() {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let claim: SubmissionClaim = serde_json::from_str(trimmed).map_err(|e| {
                    TyperankCliError::ParseError(format!(
                        "failed to parse line {}: {}",
                        line_num + 1,
                        e
                    ))
                })?;
                claims.push(claim);
            }
            Ok(claims)
        }
    }
}

fn format_output(
    outcomes: &[ReplayOutcome],
    format: &OutputFormat,
) -> Result<String, TyperankCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for outcome in outcomes {
                lines.push(serde_json::to_string(outcome)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(outcomes)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(outcomes)?),
    }
}

// Error types

#[derive(Debug)]
enum TyperankCliError {
    Io(io::Error),
    Json(serde_json::Error),
    Engine(EngineError),
    ParseError(String),
    NoClaims,
    ValidationFailed(usize),
    Unscorable,
}

impl From<io::Error> for TyperankCliError {
    fn from(e: io::Error) -> Self {
        TyperankCliError::Io(e)
    }
}

impl From<serde_json::Error> for TyperankCliError {
    fn from(e: serde_json::Error) -> Self {
        TyperankCliError::Json(e)
    }
}

impl From<EngineError> for TyperankCliError {
    fn from(e: EngineError) -> Self {
        TyperankCliError::Engine(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<TyperankCliError> for CliError {
    fn from(e: TyperankCliError) -> Self {
        match e {
            TyperankCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            TyperankCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            TyperankCliError::Engine(e) => CliError {
                code: "ENGINE_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            TyperankCliError::ParseError(msg) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: msg,
                hint: Some("Ensure each line is one submission-claim JSON object".to_string()),
            },
            TyperankCliError::NoClaims => CliError {
                code: "NO_CLAIMS".to_string(),
                message: "No claims found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            TyperankCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} claims failed validation", count),
                hint: Some("Run 'typerank validate --json' for details".to_string()),
            },
            TyperankCliError::Unscorable => CliError {
                code: "UNSCORABLE".to_string(),
                message: "Claim cannot be scored (empty trace or non-positive elapsed time)"
                    .to_string(),
                hint: Some("Check keystrokes and elapsed_seconds".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_claims: usize,
    valid_claims: usize,
    invalid_claims: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    user_id: String,
    cause: String,
}
