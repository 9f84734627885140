//! CLI for `httprule-build`.
//!
//! # Subcommands
//!
//! ```text
//! # Print the compiled program of one or more templates
//! httprule compile '/v1/{name=shelves/*/books/*}:archive'
//!
//! # Check templates against the routing policy and the grammar
//! httprule validate --config httprule.yaml '/v1/{name=shelves/*}'
//!
//! # Match a request path and print the captured variables
//! httprule match '/v1/{name=messages/*}' /v1/messages/42
//!
//! # List the bindings of a compiled descriptor set
//! httprule bindings --descriptor descriptor.bin
//!
//! # Write the static route table
//! httprule generate --descriptor descriptor.bin --output src/routes.rs
//! ```

#![forbid(unsafe_code)]

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Parser;
use httprule_build::{BindingConfig, ProjectConfig};
use httprule_core::{Template, ValidatorConfig};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Compile, validate and match Google API HTTP-binding path templates.
#[derive(Parser)]
#[command(name = "httprule", version, about)]
enum Cli {
    /// Print the compiled op-codes, pool and verb of templates.
    Compile(CompileArgs),

    /// Check templates against the URL pattern policy and the grammar.
    ///
    /// Exits with an error if any template is rejected.
    Validate(ValidateArgs),

    /// Match a request path against a template and print the variables.
    Match(MatchArgs),

    /// List the HTTP bindings found in a compiled descriptor set.
    Bindings(BindingsArgs),

    /// Generate the static route table from a compiled descriptor set.
    Generate(GenerateArgs),
}

/// Policy flags shared by every subcommand that validates.
#[derive(clap::Args)]
struct PolicyArgs {
    /// Path to a project config YAML file.
    ///
    /// CLI flags override values from the config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Maximum static segments before the first variable.
    #[arg(long)]
    max_static: Option<usize>,

    /// Accept adjacent static segments after a variable.
    #[arg(long)]
    allow_consecutive_statics: bool,

    /// Skip the URL pattern policy; only the grammar is checked.
    #[arg(long)]
    no_validation: bool,
}

#[derive(Parser)]
struct CompileArgs {
    /// Path templates, e.g. `/v1/{name=messages/*}`.
    #[arg(required = true)]
    templates: Vec<String>,

    /// Print JSON instead of YAML.
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
struct ValidateArgs {
    /// Path templates to check.
    #[arg(required = true)]
    templates: Vec<String>,

    #[command(flatten)]
    policy: PolicyArgs,
}

#[derive(Parser)]
struct MatchArgs {
    /// Path template.
    template: String,

    /// Request path, e.g. `/v1/messages/42`.
    path: String,
}

#[derive(Parser)]
struct BindingsArgs {
    /// Path to the compiled proto `FileDescriptorSet` (binary).
    #[arg(short, long)]
    descriptor: PathBuf,

    /// Print JSON instead of YAML.
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    policy: PolicyArgs,
}

#[derive(Parser)]
struct GenerateArgs {
    /// Path to the compiled proto `FileDescriptorSet` (binary).
    #[arg(short, long)]
    descriptor: PathBuf,

    /// Output file. Defaults to stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Runtime crate path in generated code.
    /// Overrides `runtime_crate` from the config file.
    #[arg(long)]
    runtime_crate: Option<String>,

    #[command(flatten)]
    policy: PolicyArgs,
}

/// One `compile` result.
#[derive(Serialize)]
struct Compiled<'a> {
    template: &'a str,
    fields: Vec<&'a str>,
    #[serde(flatten)]
    compiled: &'a Template,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse() {
        Cli::Compile(args) => run_compile(&args),
        Cli::Validate(args) => run_validate(&args),
        Cli::Match(args) => run_match(&args),
        Cli::Bindings(args) => run_bindings(&args),
        Cli::Generate(args) => run_generate(&args),
    }
}

fn run_compile(args: &CompileArgs) -> anyhow::Result<()> {
    let templates = args
        .templates
        .iter()
        .map(|t| httprule_core::compile(t).with_context(|| format!("Failed to compile {t}")))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let entries: Vec<_> = args
        .templates
        .iter()
        .zip(&templates)
        .map(|(template, compiled)| Compiled {
            template,
            fields: compiled.fields(),
            compiled,
        })
        .collect();
    print_document(&entries, args.json)
}

fn run_validate(args: &ValidateArgs) -> anyhow::Result<()> {
    let policy = load_project(&args.policy)?.validation;

    let mut rejected = 0;
    for template in &args.templates {
        let verdict = policy
            .validate(template)
            .map_err(anyhow::Error::from)
            .and_then(|()| httprule_core::parse(template).map(drop).map_err(Into::into));
        match verdict {
            Ok(()) => println!("ok     {template}"),
            Err(e) => {
                rejected += 1;
                println!("error  {e}");
            }
        }
    }

    if rejected > 0 {
        bail!("{rejected} of {} templates rejected", args.templates.len());
    }
    Ok(())
}

fn run_match(args: &MatchArgs) -> anyhow::Result<()> {
    let template = httprule_core::compile(&args.template)
        .with_context(|| format!("Failed to compile {}", args.template))?;
    let pattern = httprule::Pattern::from_template(&template)
        .with_context(|| format!("Malformed program for {}", args.template))?;

    let Some(params) = pattern.match_path(&args.path) else {
        bail!("{} does not match {}", args.path, args.template);
    };
    for (field, value) in params.iter() {
        println!("{field}={value}");
    }
    Ok(())
}

fn run_bindings(args: &BindingsArgs) -> anyhow::Result<()> {
    let config = load_project(&args.policy)?.binding_config();
    let bindings = read_bindings(&args.descriptor, &config)?;
    eprintln!("Found {} bindings", bindings.len());
    print_document(&bindings, args.json)
}

fn run_generate(args: &GenerateArgs) -> anyhow::Result<()> {
    let project = load_project(&args.policy)?;
    let mut config = project.binding_config();
    if let Some(path) = &args.runtime_crate {
        config = config.runtime_crate(path);
    }

    let descriptor = fs::read(&args.descriptor)
        .with_context(|| format!("Failed to read descriptor: {}", args.descriptor.display()))?;
    let code = httprule_build::generate(&descriptor, &config)
        .context("Failed to generate route table")?;

    match &args.output {
        Some(path) => {
            fs::write(path, &code)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Route table ready: {}", path.display());
        }
        None => print!("{code}"),
    }
    Ok(())
}

fn read_bindings(
    path: &Path,
    config: &BindingConfig,
) -> anyhow::Result<Vec<httprule_build::Binding>> {
    let descriptor = fs::read(path)
        .with_context(|| format!("Failed to read descriptor: {}", path.display()))?;
    httprule_build::extract_bindings(&descriptor, config).context("Failed to extract bindings")
}

/// Load the config file, then apply flag overrides.
fn load_project(policy: &PolicyArgs) -> anyhow::Result<ProjectConfig> {
    let mut project = match &policy.config {
        Some(path) => {
            eprintln!("Loading config: {}", path.display());
            ProjectConfig::load(path)
                .with_context(|| format!("Failed to load config: {}", path.display()))?
        }
        None => ProjectConfig::default(),
    };

    let mut validation: ValidatorConfig = project.validation;
    if let Some(max) = policy.max_static {
        validation = validation.max_static_segments_at_start(max);
    }
    if policy.allow_consecutive_statics {
        validation = validation.allow_consecutive_statics(true);
    }
    if policy.no_validation {
        validation = validation.enabled(false);
    }
    project.validation = validation;
    Ok(project)
}

fn print_document<T: Serialize + ?Sized>(value: &T, json: bool) -> anyhow::Result<()> {
    let text = if json {
        serde_json::to_string_pretty(value).context("Failed to serialize JSON")? + "\n"
    } else {
        serde_yaml_ng::to_string(value).context("Failed to serialize YAML")?
    };
    print!("{text}");
    Ok(())
}
