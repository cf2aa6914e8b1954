//! `prost-validate`: check protobuf messages against the constraints declared
//! in a descriptor set.
//!
//! Exits with 0 when the message is valid, 1 when it has violations and 2
//! when the input or the constraints themselves are broken.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, bail};
use clap::{Parser, ValueEnum};
use prost_reflect::{DescriptorPool, DynamicMessage, MessageDescriptor};
use prost_validators::{
    ConstraintRegistry, Error, ValidationOption, Validator, ValidatorOption, Violation,
};

/// Validate a protobuf message against option-declared constraints.
#[derive(Parser, Debug)]
#[command(name = "prost-validate", version, about)]
struct Cli {
    /// Binary `FileDescriptorSet` holding the message type and its imports
    /// (e.g. `protoc --include_imports -o types.binpb`).
    #[arg(short = 'd', long)]
    descriptor_set: PathBuf,

    /// Fully-qualified name of the message type, e.g. `acme.v1.Contact`.
    #[arg(short, long)]
    message: String,

    /// JSON-encoded message instance; reads stdin when omitted or `-`.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output format for violations.
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Stop at the first violation.
    #[arg(long)]
    fail_fast: bool,

    /// Limit on nested message depth.
    #[arg(long)]
    max_depth: Option<usize>,

    /// Package that declares the constraint options.
    #[arg(long, default_value = prost_validators::DEFAULT_PACKAGE)]
    package: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// One numbered line per violation.
    Text,
    /// A JSON array of violation objects.
    Json,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(violations) if violations.is_empty() => ExitCode::SUCCESS,
        Ok(violations) => {
            println!("{}", render(&violations, cli.format));
            ExitCode::from(1)
        }
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<Vec<Violation>> {
    let descriptor = load_descriptor(&cli.descriptor_set, &cli.message)?;
    let input = read_input(cli.input.as_deref())?;
    let message = decode(descriptor, &input)
        .with_context(|| format!("failed to decode {} input", cli.message))?;

    let mut options = vec![ValidatorOption::Registry(ConstraintRegistry::with_package(
        cli.package.clone(),
    ))];
    if let Some(depth) = cli.max_depth {
        options.push(ValidatorOption::MaxDepth(depth));
    }
    let validator = Validator::with_options(&options);

    let mut per_call = Vec::new();
    if cli.fail_fast {
        per_call.push(ValidationOption::FailFast);
    }

    tracing::debug!(message_type = %cli.message, "validating input");
    match validator.validate_with(&message, &per_call) {
        Ok(()) => Ok(Vec::new()),
        Err(Error::Validation(err)) => Ok(err.violations),
        Err(err) => Err(err).context("constraints could not be evaluated"),
    }
}

fn load_descriptor(path: &Path, message: &str) -> anyhow::Result<MessageDescriptor> {
    let bytes = fs::read(path)
        .with_context(|| format!("failed to read descriptor set {}", path.display()))?;
    let pool = DescriptorPool::decode(bytes.as_slice())
        .with_context(|| format!("failed to decode descriptor set {}", path.display()))?;
    match pool.get_message_by_name(message) {
        Some(descriptor) => Ok(descriptor),
        None => bail!("message type {message} not found in {}", path.display()),
    }
}

fn read_input(path: Option<&Path>) -> anyhow::Result<Vec<u8>> {
    match path {
        Some(path) if path.as_os_str() != "-" => {
            fs::read(path).with_context(|| format!("failed to read {}", path.display()))
        }
        _ => {
            let mut buf = Vec::new();
            io::stdin()
                .read_to_end(&mut buf)
                .context("failed to read stdin")?;
            Ok(buf)
        }
    }
}

fn decode(descriptor: MessageDescriptor, input: &[u8]) -> anyhow::Result<DynamicMessage> {
    let mut deserializer = serde_json::Deserializer::from_slice(input);
    let message = DynamicMessage::deserialize(descriptor, &mut deserializer)?;
    deserializer.end()?;
    Ok(message)
}

fn render(violations: &[Violation], format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => violations
            .iter()
            .enumerate()
            .map(|(idx, violation)| format!("{}. {violation}", idx + 1))
            .collect::<Vec<_>>()
            .join("\n"),
        OutputFormat::Json => {
            let items: Vec<_> = violations
                .iter()
                .map(|violation| {
                    serde_json::json!({
                        "message_type": violation.message_type(),
                        "field_path": violation.field_path().to_string(),
                        "rule_id": violation.rule_id(),
                        "message": violation.message(),
                        "params": violation.template().params(),
                    })
                })
                .collect();
            serde_json::Value::Array(items).to_string()
        }
    }
}
