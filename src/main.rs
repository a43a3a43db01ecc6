use anyhow::{Context, Result};
use azrm_lngw::azure::auth::ArmCredentials;
use azrm_lngw::azure::client::ArmClient;
use azrm_lngw::azure::http::format_arm_error;
use azrm_lngw::azure::network::LocalNetworkGatewaysClient;
use azrm_lngw::config::Config;
use azrm_lngw::resource::{LocalNetworkGatewayResource, Resource, ResourceData};
use azrm_lngw::state::StateStore;
use azrm_lngw::VERSION;
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Manage Azure local network gateways declaratively
#[derive(Parser, Debug)]
#[command(name = "azrm-lngw", version, about, long_about = None)]
struct Args {
    /// Azure subscription id
    #[arg(short, long, global = true)]
    subscription: Option<String>,

    /// ARM management endpoint
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// State file
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create or update the gateway declared in a YAML/JSON file
    Apply {
        /// Declaration file
        #[arg(short, long)]
        file: PathBuf,
        /// State label, defaults to the gateway name
        #[arg(short, long)]
        label: Option<String>,
    },
    /// Refresh stored state from Azure
    Refresh {
        #[arg(short, long)]
        label: String,
    },
    /// Delete the gateway and forget it
    Destroy {
        #[arg(short, long)]
        label: String,
    },
    /// Start tracking an existing gateway by resource id
    Import {
        #[arg(short, long)]
        label: String,
        /// ARM resource id
        id: String,
    },
    /// Print stored state
    Show {
        #[arg(short, long)]
        label: Option<String>,
    },
    /// Save the global options as defaults
    Configure {
        /// Seconds between long-running operation polls
        #[arg(long)]
        poll_interval: Option<u64>,
        /// Network provider API version
        #[arg(long)]
        api_version: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Cannot open log file {:?}: {}", log_path, e);
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("azrm-lngw {} started with log level: {:?}", VERSION, level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("azrm-lngw").join("azrm-lngw.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".azrm-lngw").join("azrm-lngw.log");
    }
    PathBuf::from("azrm-lngw.log")
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{:#}", err);
            eprintln!("Error: {}", format_arm_error(&err));
            ExitCode::FAILURE
        }
    }
}

/// Config file values overridden by command line flags
fn effective_config(args: &Args) -> Config {
    let mut config = Config::load();
    if let Some(subscription) = &args.subscription {
        config.subscription_id = Some(subscription.clone());
    }
    if let Some(endpoint) = &args.endpoint {
        config.endpoint = Some(endpoint.clone());
    }
    if let Some(state) = &args.state {
        config.state_path = Some(state.clone());
    }
    config
}

fn build_resource(config: &Config) -> Result<LocalNetworkGatewayResource<LocalNetworkGatewaysClient>> {
    let subscription = config.effective_subscription()?.ok_or_else(|| {
        anyhow::anyhow!(
            "No Azure subscription configured. Set AZURE_SUBSCRIPTION_ID or use --subscription"
        )
    })?;
    tracing::info!("Using subscription: {}", subscription);

    let arm = ArmClient::new(ArmCredentials::from_env()?, &subscription)?
        .with_endpoint(&config.effective_endpoint())
        .with_api_version(&config.effective_api_version())
        .with_poll_interval(config.effective_poll_interval());

    Ok(LocalNetworkGatewayResource::new(LocalNetworkGatewaysClient::new(arm)))
}

/// Read a declaration block from YAML or JSON
fn load_declaration(path: &Path) -> Result<Map<String, Value>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read declaration {:?}", path))?;
    let value: Value = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse declaration {:?}", path))?;

    match value {
        Value::Object(map) => Ok(map),
        _ => Err(anyhow::anyhow!("Declaration {:?} must be a mapping of attributes", path)),
    }
}

fn print_data(label: &str, data: &ResourceData) -> Result<()> {
    let out = serde_json::json!({ "label": label, "id": data.id(), "attributes": data.attributes() });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

async fn run(args: Args) -> Result<()> {
    let config = effective_config(&args);
    let store = StateStore::new(config.effective_state_path());

    match args.command {
        Command::Apply { file, label } => {
            let resource = build_resource(&config)?;
            let mut desired = resource.schema().decode(&load_declaration(&file)?)?;
            let label = label
                .or_else(|| desired.get_str("name").map(str::to_string))
                .unwrap_or_default();

            let mut state = store.load()?;
            match state.get(&label).map(|entry| entry.data.clone()) {
                Some(mut prior) if !prior.is_absent() => {
                    let replace = resource.schema().replacement_fields(&prior, &desired);
                    if replace.is_empty() {
                        desired.set_id(prior.id());
                        resource.update(&mut desired).await?;
                    } else {
                        tracing::info!("Replacing {}: {:?} changed", label, replace);
                        println!("Replacing {} ({} changed)", label, replace.join(", "));
                        resource.delete(&mut prior).await?;
                        // The remote object is gone; keep state honest if create fails
                        state.remove(&label);
                        store.save(&state)?;
                        resource.create(&mut desired).await?;
                    }
                }
                _ => resource.create(&mut desired).await?,
            }

            state.put(&label, resource.type_name(), desired.clone());
            store.save(&state)?;
            print_data(&label, &desired)
        }
        Command::Refresh { label } => {
            let resource = build_resource(&config)?;
            let mut state = store.load()?;
            let Some(entry) = state.get(&label) else {
                return Err(anyhow::anyhow!("No resource labelled {:?} in state", label));
            };

            let mut data = entry.data.clone();
            resource.read(&mut data).await?;
            if data.is_absent() {
                println!("{} no longer exists in Azure, removed from state", label);
            }
            state.put(&label, resource.type_name(), data.clone());
            store.save(&state)?;
            if data.is_absent() {
                return Ok(());
            }
            print_data(&label, &data)
        }
        Command::Destroy { label } => {
            let resource = build_resource(&config)?;
            let mut state = store.load()?;
            let Some(entry) = state.get(&label) else {
                return Err(anyhow::anyhow!("No resource labelled {:?} in state", label));
            };

            let mut data = entry.data.clone();
            resource.delete(&mut data).await?;
            state.remove(&label);
            store.save(&state)?;
            println!("Destroyed {}", label);
            Ok(())
        }
        Command::Import { label, id } => {
            let resource = build_resource(&config)?;
            let mut state = store.load()?;
            if state.get(&label).is_some() {
                return Err(anyhow::anyhow!("Label {:?} is already in state", label));
            }

            let mut data = resource.import(&id)?;
            resource.read(&mut data).await?;
            if data.is_absent() {
                return Err(anyhow::anyhow!("Cannot import non-existent resource {}", id));
            }
            state.put(&label, resource.type_name(), data.clone());
            store.save(&state)?;
            print_data(&label, &data)
        }
        Command::Show { label } => {
            let state = store.load()?;
            match label {
                Some(label) => {
                    let entry = state
                        .get(&label)
                        .ok_or_else(|| anyhow::anyhow!("No resource labelled {:?} in state", label))?;
                    print_data(&label, &entry.data)
                }
                None => {
                    println!("{}", serde_json::to_string_pretty(&state)?);
                    Ok(())
                }
            }
        }
        Command::Configure {
            poll_interval,
            api_version,
        } => {
            let mut saved = Config::load();
            if let Some(subscription) = args.subscription {
                saved.subscription_id = Some(subscription);
            }
            if let Some(endpoint) = args.endpoint {
                saved.endpoint = Some(endpoint);
            }
            if let Some(state) = args.state {
                saved.state_path = Some(state);
            }
            if let Some(secs) = poll_interval {
                saved.poll_interval_secs = Some(secs);
            }
            if let Some(api_version) = api_version {
                saved.api_version = Some(api_version);
            }
            saved.save()?;
            println!("{}", serde_json::to_string_pretty(&saved)?);
            Ok(())
        }
    }
}
