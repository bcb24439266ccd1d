use clap::{Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use vaultorders::application::orchestrator::OrderOrchestrator;
use vaultorders::config::OrderConfig;
use vaultorders::domain::order::OrderId;
use vaultorders::domain::payment::{CaptureStatus, GatewayReference};
use vaultorders::domain::ports::OrderStoreBox;
use vaultorders::infrastructure::in_memory::InMemoryOrderStore;
use vaultorders::infrastructure::log_notifier::LogNotifier;
use vaultorders::infrastructure::sandbox_gateway::SandboxGateway;
use vaultorders::interfaces::json::{OrderPayloadReader, ResponseWriter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    /// Currency applied to payloads that name none
    #[arg(long, env = "VAULTORDERS_DEFAULT_CURRENCY", default_value = "USD", global = true)]
    default_currency: String,

    /// Mailbox that receives a copy of every order confirmation
    #[arg(
        long,
        env = "VAULTORDERS_OPERATIONS_INBOX",
        default_value = "orders@vintagevault.test",
        global = true
    )]
    operations_inbox: String,

    /// Brand shown on the payment approval page
    #[arg(long, env = "VAULTORDERS_BRAND_NAME", default_value = "VintageVault", global = true)]
    brand_name: String,

    /// Seconds allowed for a single confirmation send
    #[arg(long, default_value_t = 10, global = true)]
    notify_timeout_secs: u64,

    /// Skip the confirmation sent after a successful capture
    #[arg(long, global = true)]
    no_payment_notification: bool,

    /// Outcome the sandbox gateway reports for captures
    #[arg(long, value_enum, default_value_t = CaptureOutcomeArg::Completed, global = true)]
    capture_outcome: CaptureOutcomeArg,

    /// Base URL of sandbox approval links
    #[arg(long, default_value = "https://sandbox.gateway.test", global = true)]
    approval_base_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Place an order paid through the gateway
    Prepay { payload: PathBuf },
    /// Place a cash-on-delivery order
    Cod { payload: PathBuf },
    /// Capture the payment of a prepay order
    Confirm {
        #[arg(long)]
        order_id: String,
        #[arg(long)]
        reference: String,
    },
    /// Request a new payment intent for an order whose first attempt failed
    Retry { order_id: String },
    /// Print the stored order
    Show { order_id: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum CaptureOutcomeArg {
    Completed,
    Declined,
    Pending,
}

impl From<CaptureOutcomeArg> for CaptureStatus {
    fn from(arg: CaptureOutcomeArg) -> Self {
        match arg {
            CaptureOutcomeArg::Completed => CaptureStatus::Completed,
            CaptureOutcomeArg::Declined => CaptureStatus::Declined,
            CaptureOutcomeArg::Pending => CaptureStatus::Pending,
        }
    }
}

fn open_store(db_path: Option<PathBuf>) -> Result<OrderStoreBox> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => {
            let store = vaultorders::infrastructure::rocksdb::RocksDBOrderStore::open(path)
                .into_diagnostic()?;
            Ok(Box::new(store))
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            tracing::warn!(
                "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
            Ok(Box::new(InMemoryOrderStore::new()))
        }
        None => Ok(Box::new(InMemoryOrderStore::new())),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .init();

    let cli = Cli::parse();

    let config = OrderConfig {
        default_currency: cli.default_currency,
        operations_inbox: cli.operations_inbox,
        brand_name: cli.brand_name,
        notify_timeout: Duration::from_secs(cli.notify_timeout_secs),
        notify_on_payment: !cli.no_payment_notification,
    };
    let orchestrator = OrderOrchestrator::new(
        open_store(cli.db_path)?,
        Box::new(SandboxGateway::new(
            cli.approval_base_url,
            cli.capture_outcome.into(),
        )),
        Box::new(LogNotifier::new()),
        config,
    );

    let stdout = io::stdout();
    let mut writer = ResponseWriter::new(stdout.lock());

    match cli.command {
        Command::Prepay { payload } => {
            let file = File::open(payload).into_diagnostic()?;
            let payload = OrderPayloadReader::new(file).payload().into_diagnostic()?;
            let placed = orchestrator
                .place_prepay_order(payload)
                .await
                .into_diagnostic()?;
            writer.write(&placed).into_diagnostic()?;
        }
        Command::Cod { payload } => {
            let file = File::open(payload).into_diagnostic()?;
            let payload = OrderPayloadReader::new(file).payload().into_diagnostic()?;
            let placed = orchestrator
                .place_cod_order(payload)
                .await
                .into_diagnostic()?;
            writer.write(&placed).into_diagnostic()?;
        }
        Command::Confirm {
            order_id,
            reference,
        } => {
            let order_id: OrderId = order_id.parse().into_diagnostic()?;
            let confirmation = orchestrator
                .confirm_payment(order_id, &GatewayReference::new(reference))
                .await
                .into_diagnostic()?;
            writer.write(&confirmation).into_diagnostic()?;
        }
        Command::Retry { order_id } => {
            let order_id: OrderId = order_id.parse().into_diagnostic()?;
            let placed = orchestrator
                .retry_prepay_order(order_id)
                .await
                .into_diagnostic()?;
            writer.write(&placed).into_diagnostic()?;
        }
        Command::Show { order_id } => {
            let order_id: OrderId = order_id.parse().into_diagnostic()?;
            let order = orchestrator.get_order(order_id).await.into_diagnostic()?;
            writer.write(&order).into_diagnostic()?;
        }
    }

    Ok(())
}
