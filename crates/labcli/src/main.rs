// crates/labcli/src/main.rs

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use labcore::{Agent, Literal, ParameterValue, Protocol};
use labruntime::{ExecutionEngine, PrimitiveRegistry};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "labproto")]
#[command(about = "Laboratory protocol execution CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a protocol file and record the run
    Run {
        /// Path to protocol JSON file
        #[arg(short, long)]
        file: PathBuf,

        /// Input parameter bindings as a JSON object, keyed by parameter name
        #[arg(short, long)]
        input: Option<String>,

        /// Write the sealed execution record to this file (default: stdout)
        #[arg(short, long)]
        record: Option<PathBuf>,

        /// Name of the agent performing the run
        #[arg(short, long, default_value = "labproto")]
        agent: String,

        /// Explicit start time (RFC 3339) for replays
        #[arg(long)]
        start_time: Option<String>,

        /// Use the deterministic ordinal clock instead of wall-clock time
        #[arg(long)]
        ordinal_time: bool,

        /// Show verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Validate a protocol file without executing it
    Validate {
        /// Path to protocol JSON file
        file: PathBuf,
    },

    /// List registered primitives
    Primitives,

    /// Create a new example protocol
    Init {
        /// Output file path
        #[arg(short, long, default_value = "protocol.json")]
        output: PathBuf,
    },
}

/// Convert a plain serde_json::Value into a protocol literal
fn json_to_literal(json: serde_json::Value) -> Literal {
    match json {
        serde_json::Value::Null => Literal::Null,
        serde_json::Value::Bool(b) => Literal::Bool(b),
        serde_json::Value::Number(n) => Literal::Number(n.as_f64().unwrap_or(0.0)),
        serde_json::Value::String(s) => Literal::String(s),
        other => Literal::Json(other),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            file,
            input,
            record,
            agent,
            start_time,
            ordinal_time,
            verbose,
        } => {
            let level = if verbose {
                tracing::Level::DEBUG
            } else {
                tracing::Level::INFO
            };
            tracing_subscriber::fmt().with_max_level(level).init();

            run_protocol(file, input, record, agent, start_time, ordinal_time)?;
        }

        Commands::Validate { file } => {
            validate_protocol_file(file)?;
        }

        Commands::Primitives => {
            list_primitives();
        }

        Commands::Init { output } => {
            create_example_protocol(output)?;
        }
    }

    Ok(())
}

fn run_protocol(
    file: PathBuf,
    input: Option<String>,
    record: Option<PathBuf>,
    agent: String,
    start_time: Option<String>,
    ordinal_time: bool,
) -> Result<()> {
    println!("🧪 Loading protocol from: {}", file.display());

    let protocol_json = std::fs::read_to_string(&file)?;
    let protocol: Protocol = serde_json::from_str(&protocol_json)?;

    println!("📋 Protocol: {}", protocol.name);
    println!("   Nodes: {}", protocol.nodes.len());
    println!("   Edges: {}", protocol.edges.len());
    println!();

    // Bind caller-supplied inputs by parameter name
    let mut parameter_values: Vec<ParameterValue> = Vec::new();
    if let Some(input_str) = input {
        let json: serde_json::Value = serde_json::from_str(&input_str)?;
        let serde_json::Value::Object(bindings) = json else {
            return Err(anyhow::anyhow!("input must be a JSON object"));
        };
        for (name, value) in bindings {
            let param = protocol
                .parameter_by_name(&name)
                .ok_or_else(|| anyhow::anyhow!("protocol has no parameter named '{}'", name))?;
            parameter_values.push(ParameterValue::new(param.id, json_to_literal(value)));
        }
    }

    let start_time: Option<DateTime<Utc>> = match start_time {
        Some(s) => Some(DateTime::parse_from_rfc3339(&s)?.with_timezone(&Utc)),
        None => None,
    };

    let mut registry = PrimitiveRegistry::new();
    labprimitives::register_all(&mut registry);

    let mut engine = ExecutionEngine::new(Arc::new(registry)).with_ordinal_time(ordinal_time);
    let ex = engine.execute(&protocol, Agent::new(agent), parameter_values, None, start_time)?;

    println!();
    println!("📊 Execution Summary:");
    println!("   Run ID: {}", ex.id);
    println!("   Firings: {}", ex.executions.len());
    println!("   Tokens: {}", ex.flows.len());
    if ex.completed_normally {
        println!("✨ Protocol completed normally");
    } else {
        println!("💥 Protocol did not complete normally (missing required outputs)");
    }

    if !ex.parameter_values.is_empty() {
        println!();
        println!("📤 Parameter values:");
        let names: HashMap<_, _> = protocol
            .parameters
            .values()
            .map(|p| (p.id, p.name.as_str()))
            .collect();
        for pv in &ex.parameter_values {
            let name = names.get(&pv.parameter).copied().unwrap_or("(behavior pin)");
            println!("   {}: {:?}", name, pv.value);
        }
    }

    let record_json = serde_json::to_string_pretty(&ex)?;
    match record {
        Some(path) => {
            std::fs::write(&path, record_json)?;
            println!();
            println!("💾 Execution record written to: {}", path.display());
        }
        None => {
            println!();
            println!("{}", record_json);
        }
    }

    Ok(())
}

fn validate_protocol_file(file: PathBuf) -> Result<()> {
    println!("🔍 Validating protocol: {}", file.display());

    let protocol_json = std::fs::read_to_string(&file)?;
    let protocol: Protocol = serde_json::from_str(&protocol_json)?;
    labruntime::validate_protocol(&protocol)?;

    println!("✅ Protocol is valid:");
    println!("   Name: {}", protocol.name);
    println!("   Nodes: {}", protocol.nodes.len());
    println!("   Edges: {}", protocol.edges.len());
    println!("   Behaviors: {}", protocol.behaviors.len());

    Ok(())
}

fn list_primitives() {
    println!("📦 Registered primitives:");
    println!();

    let mut registry = PrimitiveRegistry::new();
    labprimitives::register_all(&mut registry);

    for identity in registry.list_identities() {
        println!("  • {}", identity);
    }
    println!();
    println!("Behaviors without a primitive fall back to placeholder outputs.");
}

fn create_example_protocol(output: PathBuf) -> Result<()> {
    let mut protocol = Protocol::new("Example absorbance protocol");
    protocol.description =
        Some("Creates two plates in parallel and reports their sample arrays".to_string());

    let empty_container = protocol.add_behavior(labprimitives::empty_container_behavior());

    let initial = protocol.add_initial();
    let fork = protocol.add_fork();
    protocol.add_control_flow(initial, fork);

    for spec in ["96-well-plate", "24-well-plate"] {
        let action = protocol.add_call_behavior(empty_container)?;
        protocol.set_pin_value(action, "specification", Literal::Reference(spec.to_string()))?;
        protocol.add_control_flow(fork, action);
        let flow_final = protocol.add_flow_final();
        protocol.add_control_flow(action, flow_final);
        // the samples output pin is left unconnected on purpose: it becomes
        // a possible protocol output
    }

    let json = serde_json::to_string_pretty(&protocol)?;
    std::fs::write(&output, json)?;

    println!("✨ Created example protocol: {}", output.display());
    println!();
    println!("Run it with:");
    println!("  labproto run --file {} --ordinal-time", output.display());

    Ok(())
}
