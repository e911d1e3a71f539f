use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tkn::config::Config;
use tkn::kube::auth::kubeconfig_path;
use tkn::kube::client::KubeClient;
use tkn::task::{create_task, loader::content_client};
use tkn::TaskError;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// CLI for Tekton pipelines
#[derive(Parser, Debug)]
#[command(name = "tkn", version, about, long_about = None)]
struct Cli {
    /// Namespace to use (default: from config or kubeconfig context)
    #[arg(short, long, global = true)]
    namespace: Option<String>,

    /// Kubeconfig file to use
    #[arg(short, long, global = true)]
    kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use
    #[arg(short, long, global = true)]
    context: Option<String>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage tasks
    Task {
        #[command(subcommand)]
        command: TaskCommand,
    },
}

#[derive(Subcommand, Debug)]
enum TaskCommand {
    /// Create a task resource in a namespace
    ///
    /// Example: tkn task create -f foo.yaml -n bar
    Create(CreateArgs),
}

#[derive(Args, Debug)]
struct CreateArgs {
    /// Filename or URL to use to create the resource
    #[arg(short = 'f', long = "from", required = true)]
    from: String,
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
            eprintln!("Warning: cannot open log file {}: {}", log_path.display(), e);
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

    tracing::info!("tkn started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("tkn").join("tkn.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".tkn").join("tkn.log");
    }
    PathBuf::from("tkn.log")
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let _log_guard = setup_logging(cli.log_level);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{:#}", err);
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Command::Task {
            command: TaskCommand::Create(create),
        } => run_task_create(&cli, create).await,
    }
}

fn client_error(err: anyhow::Error) -> TaskError {
    TaskError::Client { source: err.into() }
}

async fn run_task_create(cli: &Cli, create: &CreateArgs) -> Result<()> {
    let config = Config::load();

    let kubeconfig = cli.kubeconfig.as_deref().or(config.kubeconfig.as_deref());
    let path = kubeconfig_path(kubeconfig)
        .ok_or_else(|| client_error(anyhow::anyhow!("no kubeconfig found")))?;
    let context = cli.context.as_deref().or(config.context.as_deref());

    let client = KubeClient::from_kubeconfig(&path, context).map_err(client_error)?;
    let http = content_client().map_err(client_error)?;

    let namespace =
        config.effective_namespace(cli.namespace.as_deref(), client.context_namespace.as_deref());
    tracing::info!("Using namespace: {}", namespace);

    let created = create_task(&client, &http, &namespace, &create.from).await?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(created.confirmation().as_bytes())?;
    stdout.flush()?;

    Ok(())
}
