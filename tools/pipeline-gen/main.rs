use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs;
use stepgraph::prelude::*;
use tracing_subscriber::EnvFilter;

/// A CLI tool to generate random valid pipelines by driving the edit engine
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// The path to write the generated YAML file to
    #[arg(short, long, default_value = "generated_pipeline.yaml")]
    output: String,

    /// Number of edits to attempt
    #[arg(long, default_value_t = 12)]
    edits: usize,

    /// Seed for reproducible output; random when omitted
    #[arg(long)]
    seed: Option<u64>,
}

const MIDDLE_TYPES: [&str; 5] = ["aggregate", "filter", "set-body", "split", "choice"];

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let seed = cli.seed.unwrap_or_else(|| rand::rng().random());
    let mut rng = StdRng::seed_from_u64(seed);
    let catalog = build_catalog();

    println!("Generating pipeline with {} edits (seed {})...", cli.edits, seed);

    let source = lookup(&catalog, "timer-source")?.materialize();
    let sink = lookup(&catalog, "log-sink")?.materialize();
    let mut pipeline = Pipeline::new(vec![source, sink])?;

    let mut applied = 0;
    let mut rejected = 0;
    for _ in 0..cli.edits {
        match random_edit(&pipeline, &catalog, &mut rng)? {
            Ok(next) => {
                pipeline = next;
                applied += 1;
            }
            Err(err) => {
                tracing::debug!(error = %err, "generated edit rejected");
                rejected += 1;
            }
        }
    }

    let yaml = YamlSerializer::new().serialize(&pipeline)?;
    fs::write(&cli.output, yaml)?;

    println!(
        "-> {} edit(s) applied, {} rejected, {} step(s) total.",
        applied,
        rejected,
        pipeline.all_steps().len()
    );
    println!("Successfully saved pipeline to '{}'", cli.output);
    Ok(())
}

/// Attempts one random edit. The outer error is for a broken catalog, the
/// inner one for an edit the engine refused.
fn random_edit(
    pipeline: &Pipeline,
    catalog: &Catalog,
    rng: &mut StdRng,
) -> std::result::Result<std::result::Result<Pipeline, EditError>, Box<dyn std::error::Error>> {
    let step_type = MIDDLE_TYPES[rng.random_range(0..MIDDLE_TYPES.len())];
    let step = lookup(catalog, step_type)?.materialize();

    let steps = pipeline.all_steps();
    let owners: Vec<&Step> = steps.iter().copied().filter(|s| s.supports_branches).collect();
    let branches: Vec<BranchId> = steps
        .iter()
        .flat_map(|s| s.branches().iter().map(Branch::id))
        .collect();

    if !owners.is_empty() && rng.random_bool(0.2) {
        let owner = owners[rng.random_range(0..owners.len())];
        return Ok(add_branch(pipeline, owner.id()).map(|(next, _)| next));
    }
    if !branches.is_empty() && rng.random_bool(0.3) {
        let branch = branches[rng.random_range(0..branches.len())];
        return Ok(append_to_branch(pipeline, branch, step));
    }

    let anchors: Vec<&Step> = steps
        .iter()
        .copied()
        .filter(|s| s.role != RoleClass::End)
        .collect();
    if anchors.is_empty() {
        return Ok(Ok(pipeline.clone()));
    }
    let anchor = anchors[rng.random_range(0..anchors.len())];
    Ok(insert_between(pipeline, anchor.id(), step))
}

fn lookup<'a>(
    catalog: &'a Catalog,
    name: &str,
) -> std::result::Result<&'a StepDescriptor, Box<dyn std::error::Error>> {
    catalog
        .get(name)
        .ok_or_else(|| format!("step type '{}' missing from the generator catalog", name).into())
}

fn build_catalog() -> Catalog {
    let mut catalog = Catalog::new()
        .with(titled("timer-source", RoleClass::Start, "Timer"))
        .with(titled("log-sink", RoleClass::End, "Log"));
    for name in MIDDLE_TYPES {
        let mut descriptor = titled(name, RoleClass::Middle, name);
        descriptor.sub_type = Some("EIP".to_string());
        descriptor.supports_branches = name == "choice";
        catalog.insert(descriptor);
    }
    catalog
}

fn titled(name: &str, role: RoleClass, title: &str) -> StepDescriptor {
    let mut descriptor = StepDescriptor::new(name, role);
    descriptor.title = Some(title.to_string());
    descriptor.api_version = "v1".to_string();
    descriptor
}
