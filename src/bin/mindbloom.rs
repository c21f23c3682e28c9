//! MindBloom CLI - score behavioral traces from the command line
//!
//! Commands:
//! - score: run the full pipeline on an `/emotion_state` request
//! - stage: run a single inference stage
//! - doctor: check that every rule base builds and the reference traces score

use clap::{Parser, Subcommand, ValueEnum};
use log::{debug, info, LevelFilter};
use serde::Deserialize;
use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use mindbloom::fixtures::sample_request;
use mindbloom::types::{EmotionOnlyRequest, StabilityScore};
use mindbloom::{
    BehavioralTrace, ComputeError, EmotionStateRequest, EmotionTrace, FuzzyPipeline,
    PipelineConfig, StageKind, VERSION,
};

/// MindBloom - fuzzy-inference scoring of movement and emotion traces
#[derive(Parser)]
#[command(name = "mindbloom")]
#[command(version = VERSION)]
#[command(about = "Score focus, motor engagement and emotional stability", long_about = None)]
struct Cli {
    /// Log at info level regardless of RUST_LOG
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score an /emotion_state request
    Score {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - or omit for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pipeline configuration JSON file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,

        /// Emit every intermediate value, not just the three scores
        #[arg(long)]
        report: bool,
    },

    /// Run a single stage
    Stage {
        #[arg(value_enum)]
        stage: StageArg,

        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Pipeline configuration JSON file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Diagnose pipeline health
    Doctor {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StageArg {
    /// Per-frame reaction time
    ReactionTime,
    /// Pause frequency of the whole trace
    PauseFrequency,
    /// Motor engagement score
    MotorEngagement,
    /// Focus attention score
    Focus,
    /// Emotional stability score
    Stability,
}

/// Behavioral half of an /emotion_state request
#[derive(Deserialize)]
struct MotionRequest {
    speed: Vec<f64>,
    ranges: Vec<f64>,
    symmetry: Vec<f64>,
}

impl MotionRequest {
    fn trace(self) -> Result<BehavioralTrace, ComputeError> {
        BehavioralTrace::new(self.speed, self.ranges, self.symmetry)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.verbose {
        env_logger::builder().filter_level(LevelFilter::Info).init();
        info!("Verbose output enabled (ignoring RUST_LOG environment variable)");
    } else {
        env_logger::init();
        debug!("Logging configured from environment variables");
    }

    match run(cli.command) {
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

fn run(command: Commands) -> Result<(), MindbloomCliError> {
    match command {
        Commands::Score {
            input,
            output,
            config,
            pretty,
            report,
        } => cmd_score(&input, output.as_deref(), config.as_deref(), pretty, report),

        Commands::Stage {
            stage,
            input,
            config,
        } => cmd_stage(stage, &input, config.as_deref()),

        Commands::Doctor { json } => cmd_doctor(json),
    }
}

fn read_input(input: &Path) -> Result<String, MindbloomCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn load_pipeline(config: Option<&Path>) -> Result<FuzzyPipeline, MindbloomCliError> {
    let config = match config {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            PipelineConfig::from_json(&fs::read_to_string(path)?)?
        }
        None => PipelineConfig::default(),
    };
    Ok(FuzzyPipeline::with_config(config)?)
}

fn cmd_score(
    input: &Path,
    output: Option<&Path>,
    config: Option<&Path>,
    pretty: bool,
    report: bool,
) -> Result<(), MindbloomCliError> {
    let pipeline = load_pipeline(config)?;
    let input_data = read_input(input)?;

    let response = if report {
        let request: EmotionStateRequest = serde_json::from_str(&input_data)?;
        let emotions = request.emotion_trace()?;
        let trace = request.behavioral_trace()?;
        serde_json::to_value(pipeline.analyze(&emotions, &trace)?)?
    } else {
        serde_json::from_str(&pipeline.process_json(&input_data)?)?
    };

    let output_data = if pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };

    match output {
        Some(path) if path.to_string_lossy() != "-" => fs::write(path, output_data)?,
        _ => println!("{}", output_data),
    }
    Ok(())
}

fn cmd_stage(stage: StageArg, input: &Path, config: Option<&Path>) -> Result<(), MindbloomCliError> {
    let pipeline = load_pipeline(config)?;
    let input_data = read_input(input)?;

    let response = match stage {
        StageArg::ReactionTime => {
            let trace = serde_json::from_str::<MotionRequest>(&input_data)?.trace()?;
            serde_json::json!({ "reaction_times": pipeline.reaction_time_array(&trace)? })
        }
        StageArg::PauseFrequency => {
            let trace = serde_json::from_str::<MotionRequest>(&input_data)?.trace()?;
            serde_json::json!({ "pause_frequency": pipeline.pause_frequency(&trace)? })
        }
        StageArg::MotorEngagement => {
            let trace = serde_json::from_str::<MotionRequest>(&input_data)?.trace()?;
            serde_json::json!({ "motor_engagement_score": pipeline.motor_engagement(&trace)? })
        }
        StageArg::Focus => {
            let request: EmotionStateRequest = serde_json::from_str(&input_data)?;
            let emotions = request.emotion_trace()?;
            let trace = request.behavioral_trace()?;
            serde_json::json!({ "focus_score": pipeline.focus_score(&emotions, &trace)? })
        }
        StageArg::Stability => {
            let request: EmotionOnlyRequest = serde_json::from_str(&input_data)?;
            let emotions = EmotionTrace::new(request.emotion)?;
            serde_json::to_value(StabilityScore {
                emotion_stability_score: pipeline.emotion_stability(&emotions)?,
            })?
        }
    };

    println!("{}", serde_json::to_string(&response)?);
    Ok(())
}

fn cmd_doctor(json: bool) -> Result<(), MindbloomCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "version".to_string(),
        status: CheckStatus::Ok,
        message: format!("MindBloom version {}", VERSION),
    });

    match FuzzyPipeline::new() {
        Ok(pipeline) => {
            for stage in StageKind::ALL {
                checks.push(DoctorCheck {
                    name: stage.name().to_string(),
                    status: CheckStatus::Ok,
                    message: format!("{} rules", pipeline.systems().rule_count(stage)),
                });
            }

            let self_test = match pipeline.score_request(&sample_request()) {
                Ok(scores) => {
                    let in_range = [
                        scores.focus_score,
                        scores.motor_engagement_score,
                        scores.emotion_stability_score,
                    ]
                    .iter()
                    .all(|s| (0.0..=1.0).contains(s));
                    DoctorCheck {
                        name: "self_test".to_string(),
                        status: if in_range {
                            CheckStatus::Ok
                        } else {
                            CheckStatus::Error
                        },
                        message: format!(
                            "focus {:.3}, motor {:.3}, stability {:.3}",
                            scores.focus_score,
                            scores.motor_engagement_score,
                            scores.emotion_stability_score
                        ),
                    }
                }
                Err(e) => DoctorCheck {
                    name: "self_test".to_string(),
                    status: CheckStatus::Error,
                    message: e.to_string(),
                },
            };
            checks.push(self_test);
        }
        Err(e) => checks.push(DoctorCheck {
            name: "rule_bases".to_string(),
            status: CheckStatus::Error,
            message: e.to_string(),
        }),
    }

    let stdin_check = if io::stdin().is_terminal() {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (use -i - to read requests)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        version: VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("MindBloom Doctor Report");
        println!("=======================");
        println!("Version: {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(MindbloomCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Error types

#[derive(Debug)]
enum MindbloomCliError {
    Io(io::Error),
    Compute(ComputeError),
    Json(serde_json::Error),
    DoctorFailed,
}

impl From<io::Error> for MindbloomCliError {
    fn from(e: io::Error) -> Self {
        MindbloomCliError::Io(e)
    }
}

impl From<ComputeError> for MindbloomCliError {
    fn from(e: ComputeError) -> Self {
        MindbloomCliError::Compute(e)
    }
}

impl From<serde_json::Error> for MindbloomCliError {
    fn from(e: serde_json::Error) -> Self {
        MindbloomCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<MindbloomCliError> for CliError {
    fn from(e: MindbloomCliError) -> Self {
        match e {
            MindbloomCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            MindbloomCliError::Compute(e) => {
                let hint = match e {
                    ComputeError::Validation(_) => {
                        "Traces need at least 2 frames, equal behavioral lengths and 7 confidences in [0, 1] per emotion frame"
                    }
                    ComputeError::Configuration(_) => "Check the configuration file",
                    ComputeError::Degenerate { .. } => "No rule fired for these inputs",
                    ComputeError::Json(_) => "Check JSON syntax",
                };
                CliError {
                    code: e.code().to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            MindbloomCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            MindbloomCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct DoctorReport {
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Error,
}
