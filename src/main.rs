use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use clouding::clouding::firewall::{Firewall, FirewallRule, FirewallRuleBinding, FirewallUpdate};
use clouding::clouding::server::Server;
use clouding::clouding::sshkey::SshKey;
use clouding::{format_api_error, ActionPoller, CloudingClient, Config, Lifecycle, Tracked};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

/// Version injected at compile time via CLOUDING_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("CLOUDING_VERSION") {
    Some(v) => v,
    None => "dev",
};

/// Command line client for the Clouding.io API
#[derive(Parser, Debug)]
#[command(name = "clouding", version, about, long_about = None)]
struct Args {
    /// API token (overrides CLOUDING_TOKEN and the config file)
    #[arg(long, global = true)]
    token: Option<String>,

    /// API endpoint (overrides CLOUDING_ENDPOINT and the config file)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Servers
    #[command(subcommand)]
    Server(ServerCommand),
    /// Firewalls
    #[command(subcommand)]
    Firewall(FirewallCommand),
    /// Firewall rules
    #[command(subcommand)]
    Rule(RuleCommand),
    /// SSH key pairs
    #[command(subcommand)]
    Sshkey(SshKeyCommand),
    /// Images
    #[command(subcommand)]
    Image(GetCommand),
    /// Backups
    #[command(subcommand)]
    Backup(GetCommand),
    /// Snapshots
    #[command(subcommand)]
    Snapshot(GetCommand),
    /// Long-running actions
    #[command(subcommand)]
    Action(ActionCommand),
    /// Settings stored in the config file
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(ClapArgs, Debug)]
struct IdArg {
    id: String,
}

#[derive(Subcommand, Debug)]
enum GetCommand {
    Get(IdArg),
}

#[derive(Subcommand, Debug)]
enum ServerCommand {
    Get(IdArg),
    /// Create a server from a JSON definition and wait until it is built
    Create {
        /// Path to a JSON server definition (camelCase keys)
        #[arg(long)]
        from: PathBuf,
    },
    /// Delete a server and wait for the teardown
    Delete(IdArg),
    Rename {
        id: String,
        name: String,
    },
}

#[derive(Subcommand, Debug)]
enum FirewallCommand {
    Get(IdArg),
    Create {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    Delete(IdArg),
}

#[derive(Subcommand, Debug)]
enum RuleCommand {
    Get(IdArg),
    Create {
        /// Firewall the rule is added to
        firewall_id: String,
        #[arg(long)]
        source_ip: String,
        #[arg(long)]
        protocol: String,
        #[arg(long)]
        port_min: i64,
        #[arg(long)]
        port_max: i64,
        #[arg(long, default_value = "")]
        description: String,
    },
    Delete(IdArg),
}

#[derive(Subcommand, Debug)]
enum SshKeyCommand {
    Get(IdArg),
    /// Upload a public key, or let the provider generate a pair
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        public_key: Option<String>,
    },
    Delete(IdArg),
}

#[derive(Subcommand, Debug)]
enum ActionCommand {
    Get(IdArg),
    /// Poll an action until it completes or errors
    Wait {
        id: String,
        /// Give up after this many seconds (defaults to the configured create timeout)
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Print the config file path and its settings (token masked)
    Show,
    /// Store one setting, e.g. `config set token <key>`; an empty value clears it
    Set { key: String, value: String },
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
            eprintln!("Failed to open log file {:?}: {}", log_path, e);
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(tracing_level).into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("clouding {} started with log level: {:?}", VERSION, level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("clouding").join("clouding.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".clouding").join("clouding.log");
    }
    PathBuf::from("clouding.log")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Token cancelled by Ctrl-C or after `timeout`, whichever comes first
fn interruptible(timeout: Duration) -> CancellationToken {
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => tracing::warn!("Interrupted, cancelling wait"),
            _ = tokio::time::sleep(timeout) => tracing::warn!("Timed out after {:?}", timeout),
        }
        on_signal.cancel();
    });
    cancel
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level);

    if let Err(err) = run(args).await {
        tracing::error!("{:#}", err);
        match err.downcast_ref::<clouding::Error>() {
            Some(api) => eprintln!("Error: {}", format_api_error(api)),
            None => eprintln!("Error: {err:#}"),
        }
        std::process::exit(1);
    }
}

fn config_command(cmd: ConfigCommand) -> Result<()> {
    let path = Config::config_path().context("no config directory on this platform")?;
    let mut config = Config::load_from(&path);
    match cmd {
        ConfigCommand::Show => {
            eprintln!("{}", path.display());
            print_json(&config.redacted())
        }
        ConfigCommand::Set { key, value } => {
            config.set(&key, &value)?;
            config.save_to(&path)?;
            tracing::info!("Updated {} in {:?}", key, path);
            eprintln!("Saved {} to {}", key, path.display());
            Ok(())
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let command = match args.command {
        Command::Config(cmd) => return config_command(cmd),
        command => command,
    };
    let config = Config::load()
        .with_env()
        .with_overrides(args.token, args.endpoint);
    let client = CloudingClient::new(&config.client_config()?)?;
    let lifecycle = Lifecycle::new(client.clone())
        .with_poll_config(config.poll_config())
        .with_action_timeout(config.action_timeout());

    match command {
        Command::Config(cmd) => config_command(cmd),
        Command::Server(cmd) => server_command(&lifecycle, cmd).await,
        Command::Firewall(cmd) => firewall_command(&lifecycle, cmd).await,
        Command::Rule(cmd) => rule_command(&lifecycle, cmd).await,
        Command::Sshkey(cmd) => sshkey_command(&lifecycle, cmd).await,
        Command::Image(GetCommand::Get(arg)) => print_json(&client.get_image(&arg.id).await?),
        Command::Backup(GetCommand::Get(arg)) => print_json(&client.get_backup(&arg.id).await?),
        Command::Snapshot(GetCommand::Get(arg)) => {
            print_json(&client.get_snapshot(&arg.id).await?)
        }
        Command::Action(ActionCommand::Get(arg)) => print_json(&client.get_action(&arg.id).await?),
        Command::Action(ActionCommand::Wait { id, timeout_secs }) => {
            let timeout = timeout_secs
                .map(Duration::from_secs)
                .unwrap_or_else(|| config.action_timeout());
            let mut action = client.get_action(&id).await?;
            if !action.status.is_terminal() {
                let cancel = interruptible(timeout);
                ActionPoller::new(client)
                    .with_config(config.poll_config())
                    .wait(&mut action, &cancel)
                    .await?;
            }
            print_json(&action)
        }
    }
}

async fn server_command(lifecycle: &Lifecycle, cmd: ServerCommand) -> Result<()> {
    match cmd {
        ServerCommand::Get(arg) => print_json(&lifecycle.client().get_server(&arg.id).await?),
        ServerCommand::Create { from } => {
            let definition = std::fs::read_to_string(&from)
                .with_context(|| format!("reading server definition {:?}", from))?;
            let server: Server = serde_json::from_str(&definition)
                .with_context(|| format!("parsing server definition {:?}", from))?;
            let mut tracked = Tracked::new(server);
            lifecycle.create_server(&mut tracked).await?;
            lifecycle.read_server(&mut tracked).await?;
            print_json(&tracked)
        }
        ServerCommand::Delete(arg) => {
            lifecycle.delete_server(&arg.id).await?;
            eprintln!("Deleted server {}", arg.id);
            Ok(())
        }
        ServerCommand::Rename { id, name } => {
            let mut tracked = Tracked::new(lifecycle.client().get_server(&id).await?);
            lifecycle.rename_server(&mut tracked, &name).await?;
            print_json(&tracked)
        }
    }
}

async fn firewall_command(lifecycle: &Lifecycle, cmd: FirewallCommand) -> Result<()> {
    match cmd {
        FirewallCommand::Get(arg) => print_json(&lifecycle.client().get_firewall(&arg.id).await?),
        FirewallCommand::Create { name, description } => {
            let mut tracked = Tracked::new(Firewall {
                name,
                description,
                ..Default::default()
            });
            lifecycle.create_firewall(&mut tracked).await?;
            print_json(&tracked)
        }
        FirewallCommand::Update {
            id,
            name,
            description,
        } => {
            let mut tracked = Tracked::new(lifecycle.client().get_firewall(&id).await?);
            let update = FirewallUpdate {
                new_name: name.unwrap_or_else(|| tracked.record.name.clone()),
                new_description: description
                    .unwrap_or_else(|| tracked.record.description.clone()),
            };
            lifecycle.update_firewall(&mut tracked, &update).await?;
            print_json(&tracked)
        }
        FirewallCommand::Delete(arg) => {
            lifecycle.delete_firewall(&arg.id).await?;
            eprintln!("Deleted firewall {}", arg.id);
            Ok(())
        }
    }
}

async fn rule_command(lifecycle: &Lifecycle, cmd: RuleCommand) -> Result<()> {
    match cmd {
        RuleCommand::Get(arg) => {
            print_json(&lifecycle.client().get_firewall_rule(&arg.id).await?)
        }
        RuleCommand::Create {
            firewall_id,
            source_ip,
            protocol,
            port_min,
            port_max,
            description,
        } => {
            let mut tracked = Tracked::new(FirewallRuleBinding {
                firewall_id,
                firewall_rule: FirewallRule {
                    source_ip,
                    protocol,
                    description,
                    port_range_min: port_min,
                    port_range_max: port_max,
                    ..Default::default()
                },
            });
            lifecycle.create_firewall_rule(&mut tracked).await?;
            print_json(&tracked)
        }
        RuleCommand::Delete(arg) => {
            lifecycle.delete_firewall_rule(&arg.id).await?;
            eprintln!("Deleted firewall rule {}", arg.id);
            Ok(())
        }
    }
}

async fn sshkey_command(lifecycle: &Lifecycle, cmd: SshKeyCommand) -> Result<()> {
    match cmd {
        SshKeyCommand::Get(arg) => print_json(&lifecycle.client().get_ssh_key(&arg.id).await?),
        SshKeyCommand::Create { name, public_key } => {
            let mut tracked = Tracked::new(SshKey {
                name,
                public_key: public_key.unwrap_or_default(),
                ..Default::default()
            });
            lifecycle.create_ssh_key(&mut tracked).await?;
            print_json(&tracked)
        }
        SshKeyCommand::Delete(arg) => {
            lifecycle.delete_ssh_key(&arg.id).await?;
            eprintln!("Deleted ssh key {}", arg.id);
            Ok(())
        }
    }
}
