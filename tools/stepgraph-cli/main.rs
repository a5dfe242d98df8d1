use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use stepgraph::config::EditorConfig;
use stepgraph::prelude::*;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Inspect and edit step pipelines from the command line
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the editor config TOML file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Descriptor catalog (YAML or JSON); overrides the configured one
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Write the edited pipeline back to its file instead of printing it
    #[arg(short, long, global = true)]
    write: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the flattened pipeline
    Show { pipeline: PathBuf },
    /// Insert a step right after another one
    Insert {
        pipeline: PathBuf,
        /// Step name or identity to insert after
        #[arg(long)]
        after: String,
        /// Step type from the catalog
        #[arg(long)]
        step: String,
    },
    /// Append a step after the last step of a sequence
    Append {
        pipeline: PathBuf,
        #[arg(long)]
        after: String,
        #[arg(long)]
        step: String,
        #[arg(long, default_value = "middle")]
        position: AppendPosition,
    },
    /// Delete a step
    Delete {
        pipeline: PathBuf,
        #[arg(long)]
        target: String,
    },
    /// Replace a step with another step type
    Replace {
        pipeline: PathBuf,
        #[arg(long)]
        target: String,
        #[arg(long)]
        step: String,
    },
    /// Set step parameters, given as key=value pairs
    Configure {
        pipeline: PathBuf,
        #[arg(long)]
        target: String,
        #[arg(long = "set", value_name = "KEY=VALUE")]
        values: Vec<String>,
    },
}

impl Command {
    fn pipeline_path(&self) -> &PathBuf {
        match self {
            Command::Show { pipeline }
            | Command::Insert { pipeline, .. }
            | Command::Append { pipeline, .. }
            | Command::Delete { pipeline, .. }
            | Command::Replace { pipeline, .. }
            | Command::Configure { pipeline, .. } => pipeline,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let config = EditorConfig::load(cli.config.as_deref())
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to load config: {}", e)));
    init_logging(&config);

    let serializer = YamlSerializer::new();
    let path = cli.command.pipeline_path().clone();
    let text = fs::read_to_string(&path).unwrap_or_else(|e| {
        exit_with_error(&format!(
            "Failed to read pipeline file '{}': {}",
            path.display(),
            e
        ))
    });
    let pipeline = serializer
        .deserialize(&text)
        .unwrap_or_else(|e| exit_with_error(&e.to_string()));

    if let Command::Show { .. } = cli.command {
        print_view(&pipeline, &config.slot_label);
        return;
    }

    let catalog = load_catalog(cli.catalog.or(config.catalog_path.clone()));
    let mut session = EditSession::new(pipeline);

    let outcome = match cli.command {
        Command::Show { .. } => return,
        Command::Insert { after, step, .. } => {
            let after = resolve(session.pipeline(), &after);
            session
                .fetch_and_apply(
                    &catalog,
                    EditIntent::InsertBetween {
                        after,
                        step_type: step,
                    },
                )
                .await
                .map(|_| ())
        }
        Command::Append {
            after,
            step,
            position,
            ..
        } => {
            let after = resolve(session.pipeline(), &after);
            session
                .fetch_and_apply(
                    &catalog,
                    EditIntent::AppendAfter {
                        after,
                        step_type: step,
                        position,
                    },
                )
                .await
                .map(|_| ())
        }
        Command::Delete { target, .. } => {
            let id = resolve(session.pipeline(), &target);
            session.apply(EditOp::Delete { id }).map(|_| ())
        }
        Command::Replace { target, step, .. } => {
            let target = resolve(session.pipeline(), &target);
            session
                .fetch_and_apply(
                    &catalog,
                    EditIntent::Replace {
                        target,
                        step_type: step,
                    },
                )
                .await
                .map(|_| ())
        }
        Command::Configure { target, values, .. } => {
            let id = resolve(session.pipeline(), &target);
            configure(&mut session, &catalog, id, &values)
        }
    };

    if let Err(err) = outcome {
        match err.alert() {
            Some(alert) => exit_with_error(&format!("{}: {}", alert.title, alert.reason)),
            None => exit_with_error(&err.to_string()),
        }
    }

    let yaml = serializer
        .serialize(session.pipeline())
        .unwrap_or_else(|e| exit_with_error(&e.to_string()));
    if cli.write {
        fs::write(&path, yaml).unwrap_or_else(|e| {
            exit_with_error(&format!("Failed to write '{}': {}", path.display(), e))
        });
        println!("Pipeline written to '{}'", path.display());
    } else {
        print_view(session.pipeline(), &config.slot_label);
        println!("\n{}", yaml);
    }
}

fn init_logging(config: &EditorConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|e| exit_with_error(&format!("Invalid log filter: {}", e)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_catalog(path: Option<PathBuf>) -> Catalog {
    let Some(path) = path else {
        exit_with_error("A descriptor catalog is required for this command (--catalog)");
    };
    Catalog::from_file(&path).unwrap_or_else(|e| exit_with_error(&e.to_string()))
}

/// Accepts either a step identity or a step name.
fn resolve(pipeline: &Pipeline, reference: &str) -> StepId {
    if let Ok(uuid) = Uuid::parse_str(reference) {
        return StepId::from(uuid);
    }
    pipeline
        .find_by_name(reference)
        .map(Step::id)
        .unwrap_or_else(|| exit_with_error(&format!("No step named '{}'", reference)))
}

fn configure(
    session: &mut EditSession,
    catalog: &Catalog,
    id: StepId,
    values: &[String],
) -> std::result::Result<(), EditError> {
    let (step_name, mut parameters) = session
        .pipeline()
        .all_steps()
        .into_iter()
        .find(|step| step.id() == id)
        .map(|step| (step.name.clone(), step.parameters.clone()))
        .ok_or_else(|| EditError::NotFound {
            identity: id.to_string(),
        })?;
    // Steps without a catalog entry accept any parameters.
    let descriptor = catalog
        .get(&step_name)
        .cloned()
        .unwrap_or_else(|| StepDescriptor::new(step_name, RoleClass::Middle));

    for pair in values {
        let Some((key, raw)) = pair.split_once('=') else {
            exit_with_error(&format!("Expected KEY=VALUE, got '{}'", pair));
        };
        parameters.insert(key.trim().to_string(), parse_value(raw.trim()));
    }
    session.configure(id, parameters, &descriptor).map(|_| ())
}

/// Reads JSON scalars and objects; anything else is kept as a string.
fn parse_value(raw: &str) -> ParamValue {
    serde_json::from_str::<serde_json::Value>(raw)
        .ok()
        .and_then(|value| ParamValue::try_from(value).ok())
        .unwrap_or_else(|| ParamValue::from(raw))
}

fn print_view(pipeline: &Pipeline, slot_label: &str) {
    let view = project(pipeline).with_slot_label(slot_label);
    println!("--- Pipeline ({} steps) ---", pipeline.all_steps().len());
    for node in view.iter() {
        let depth = node.branch().map_or(0, |ctx| ctx.depth);
        let indent = "  ".repeat(depth);
        match node {
            RenderNode::Occupied { step, is_last, .. } => {
                let marker = if is_last { "'-" } else { "|-" };
                println!(
                    "{}{} {} [{}] {}",
                    indent,
                    marker,
                    step.title.as_deref().unwrap_or(&step.name),
                    step.role,
                    step.id()
                );
            }
            RenderNode::Slot { label, id, .. } => {
                println!("{}|- <{}> {}", indent, label, id);
            }
        }
    }
    println!("Edges: {}", view.edges().len());
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
