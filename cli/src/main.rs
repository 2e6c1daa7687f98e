use std::{
    fs,
    path::{Path, PathBuf},
};

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use miette::{Context as _, IntoDiagnostic as _, Result};
use semver::Version;
use sonobuoy_config::{AggregatorPermissions, Config};
use sonobuoy_generator::{GenerationRequest, Generator};
use sonobuoy_plugin::{Driver, E2eMode, PluginDefinition, PullPolicy};
use tracing::debug;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt as tracing_fmt, prelude::*};

#[derive(Parser)]
#[command(name = "sonobuoy")]
#[command(version)]
#[command(about = "Generate the manifests that launch a sonobuoy run")]
struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv, -vvvv).
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the manifest bundle for a run.
    Gen(GenArgs),
    /// Print the pod spec plugins get when they bring none of their own.
    DefaultPodSpec(DefaultPodSpecArgs),
}

#[derive(Args)]
struct GenArgs {
    /// Load the whole generation request from a YAML or JSON file. Flags
    /// below are applied on top of it.
    #[arg(long, value_name = "FILE")]
    request: Option<PathBuf>,

    /// Aggregator config (JSON) to start from instead of the defaults.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[arg(short = 'n', long)]
    namespace: Option<String>,

    /// Canned e2e test selection.
    #[arg(long, value_name = "MODE")]
    mode: Option<E2eMode>,

    #[arg(long, value_name = "REGEX")]
    e2e_focus: Option<String>,

    #[arg(long, value_name = "REGEX")]
    e2e_skip: Option<String>,

    #[arg(long)]
    e2e_parallel: bool,

    /// Built-in plugin name or path to a plugin definition file. Repeatable.
    #[arg(short = 'p', long = "plugin", value_name = "PLUGIN")]
    plugins: Vec<String>,

    /// Env override in the form `plugin.NAME=value`; an empty value removes
    /// the variable. Repeatable.
    #[arg(long = "plugin-env", value_name = "PLUGIN.NAME=VALUE", value_parser = parse_plugin_env)]
    plugin_env: Vec<PluginEnv>,

    /// Private key handed to the e2e plugin for node SSH access.
    #[arg(long, value_name = "FILE")]
    ssh_key: Option<PathBuf>,

    #[arg(long)]
    ssh_user: Option<String>,

    /// Embed the default pod spec in plugins that do not define one.
    #[arg(long = "show-default-podspec")]
    show_default_pod_spec: bool,

    #[arg(long, value_name = "SECRET")]
    image_pull_secrets: Option<String>,

    #[arg(long, value_name = "POLICY")]
    image_pull_policy: Option<PullPolicy>,

    /// Aggregator and worker image.
    #[arg(long, value_name = "IMAGE")]
    sonobuoy_image: Option<String>,

    #[arg(long, value_name = "IMAGE")]
    kube_conformance_image: Option<String>,

    /// Kubernetes version used to pick the conformance image tag.
    #[arg(long, value_name = "VERSION", value_parser = parse_kube_version)]
    kubernetes_version: Option<Version>,

    #[arg(long, value_name = "IMAGE")]
    systemd_logs_image: Option<String>,

    #[arg(long, value_name = "MODE")]
    aggregator_permissions: Option<AggregatorPermissions>,

    /// Write the bundle here instead of stdout.
    #[arg(short = 'o', long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct DefaultPodSpecArgs {
    #[arg(long = "driver", value_enum, default_value_t = DriverArg::Job)]
    driver: DriverArg,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DriverArg {
    Job,
    Daemonset,
}

impl From<DriverArg> for Driver {
    fn from(arg: DriverArg) -> Self {
        match arg {
            DriverArg::Job => Driver::Job,
            DriverArg::Daemonset => Driver::DaemonSet,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct PluginEnv {
    plugin: String,
    name: String,
    value: String,
}

fn main() -> Result<()> {
    miette::set_panic_hook();
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    match cli.command {
        Command::Gen(args) => generate(args),
        Command::DefaultPodSpec(args) => default_pod_spec(args),
    }
}

fn init_tracing(verbose: u8) -> Result<()> {
    let filter = if std::env::var_os("RUST_LOG").is_some() {
        EnvFilter::try_from_default_env().into_diagnostic()?
    } else {
        let level = match verbose {
            0 => "error",
            1 => "warn",
            2 => "info",
            3 => "debug",
            _ => "trace",
        };
        EnvFilter::new(format!("error,sonobuoy={level},sonobuoy_={level}"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_fmt::layer().with_writer(std::io::stderr))
        .with(ErrorLayer::default())
        .init();

    Ok(())
}

fn generate(args: GenArgs) -> Result<()> {
    let generator = Generator::new();
    let request = build_request(&args, &generator)?;
    let bundle = generator.generate_manifest(request.as_ref())?;

    match &args.output {
        Some(path) => fs::write(path, bundle.as_bytes())
            .into_diagnostic()
            .wrap_err_with(|| format!("failed to write `{}`", path.display())),
        None => {
            print!("{bundle}");
            Ok(())
        }
    }
}

fn default_pod_spec(args: DefaultPodSpecArgs) -> Result<()> {
    let generator = Generator::new();
    let spec = generator.pod_specs().for_driver(args.driver.into());
    let yaml = serde_yaml::to_string(spec).into_diagnostic()?;
    print!("{yaml}");
    Ok(())
}

/// The request described by the flags, or `None` when a request file holds
/// an explicit null.
fn build_request(args: &GenArgs, generator: &Generator) -> Result<Option<GenerationRequest>> {
    let mut request = match &args.request {
        Some(path) => match load_request(path)? {
            Some(request) => request,
            None => return Ok(None),
        },
        None => GenerationRequest::default(),
    };

    if let Some(path) = &args.config {
        let raw = read(path)?;
        request.config = Config::from_json(&raw)
            .wrap_err_with(|| format!("invalid config `{}`", path.display()))?;
    }
    request.config.ensure_uuid();
    apply_config_flags(args, &mut request.config);

    // A request file keeps its own e2e selection unless a mode is given.
    let mode = args
        .mode
        .or_else(|| args.request.is_none().then(E2eMode::default));
    if let Some(mode) = mode {
        request.e2e = mode.e2e_config();
    }
    if let Some(focus) = &args.e2e_focus {
        request.e2e.focus = focus.clone();
    }
    if let Some(skip) = &args.e2e_skip {
        request.e2e.skip = skip.clone();
    }
    request.e2e.parallel |= args.e2e_parallel;

    for plugin in &args.plugins {
        if generator.catalog().contains(plugin) {
            request.dynamic_plugins.push(plugin.clone());
        } else {
            request.static_plugins.push(load_plugin(Path::new(plugin))?);
        }
    }

    for env in &args.plugin_env {
        request
            .plugin_env_overrides
            .entry(env.plugin.clone())
            .or_default()
            .insert(env.name.clone(), env.value.clone());
    }

    if args.ssh_key.is_some() {
        request.ssh_key_path = args.ssh_key.clone();
    }
    if args.ssh_user.is_some() {
        request.ssh_user = args.ssh_user.clone();
    }
    request.show_default_pod_spec |= args.show_default_pod_spec;
    if args.kube_conformance_image.is_some() {
        request.kube_conformance_image = args.kube_conformance_image.clone();
    }
    if args.kubernetes_version.is_some() {
        request.kube_version = args.kubernetes_version.clone();
    }
    if args.systemd_logs_image.is_some() {
        request.systemd_logs_image = args.systemd_logs_image.clone();
    }

    debug!(
        dynamic = ?request.dynamic_plugins,
        static_plugins = request.static_plugins.len(),
        "built generation request"
    );
    Ok(Some(request))
}

fn apply_config_flags(args: &GenArgs, config: &mut Config) {
    if let Some(namespace) = &args.namespace {
        config.namespace = namespace.clone();
    }
    if let Some(image) = &args.sonobuoy_image {
        config.worker_image = image.clone();
    }
    if let Some(policy) = args.image_pull_policy {
        config.image_pull_policy = policy;
    }
    if let Some(secret) = &args.image_pull_secrets {
        config.image_pull_secrets = secret.clone();
    }
    if let Some(permissions) = args.aggregator_permissions {
        config.aggregator_permissions = permissions;
    }
}

fn load_request(path: &Path) -> Result<Option<GenerationRequest>> {
    let raw = read(path)?;
    serde_yaml::from_str(&raw)
        .into_diagnostic()
        .wrap_err_with(|| format!("invalid request `{}`", path.display()))
}

fn load_plugin(path: &Path) -> Result<PluginDefinition> {
    let raw = read(path).wrap_err("plugin is neither a built-in name nor a readable file")?;
    PluginDefinition::from_yaml(&raw)
        .wrap_err_with(|| format!("invalid plugin definition `{}`", path.display()))
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to read `{}`", path.display()))
}

fn parse_plugin_env(input: &str) -> std::result::Result<PluginEnv, String> {
    let (key, value) = input
        .split_once('=')
        .ok_or_else(|| format!("expected `plugin.NAME=value`, got `{input}`"))?;
    let (plugin, name) = key
        .split_once('.')
        .ok_or_else(|| format!("expected `plugin.NAME` before `=`, got `{key}`"))?;
    if plugin.is_empty() || name.is_empty() {
        return Err(format!("plugin and variable name must be non-empty in `{input}`"));
    }
    Ok(PluginEnv {
        plugin: plugin.to_string(),
        name: name.to_string(),
        value: value.to_string(),
    })
}

fn parse_kube_version(input: &str) -> std::result::Result<Version, String> {
    let trimmed = input.strip_prefix('v').unwrap_or(input);
    Version::parse(trimmed).map_err(|e| format!("invalid Kubernetes version `{input}`: {e}"))
}
