//! Puya kiosk entry point.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use puya_lookup::{CaptureMode, OdooClient};
use puya_kiosk::config::{KioskSettings, Overrides};
use puya_kiosk::kiosk;
use puya_kiosk::render::OutputFormat;
use puya_kiosk::session::KioskSession;
use puya_kiosk::types::KioskError;

#[derive(Parser)]
#[command(
    name = "puya-kiosk",
    about = "Price-check kiosk: scan a code, see name, price and stock from Odoo",
    version
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    /// Print outcomes as JSON lines instead of text.
    #[arg(long, global = true)]
    json: bool,

    /// Per-request timeout in seconds (default: none).
    /// Also reads from PUYA_TIMEOUT_SECS.
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Reuse the ERP session for this many seconds instead of logging in per lookup.
    /// Also reads from PUYA_SESSION_TTL_SECS.
    #[arg(long, global = true)]
    session_ttl_secs: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the interactive kiosk prompt (default).
    Repl,

    /// Look up a single code and exit.
    ///
    /// Exits 0 when the product was found, 3 when it was not, 4 on
    /// authentication failure and 5 on transport errors.
    Lookup {
        /// Barcode, QR payload or internal code.
        identifier: String,
    },

    /// Read codes from a capture source until it closes.
    ///
    /// Examples:
    ///   scanner-bridge | puya-kiosk scan
    ///   puya-kiosk scan --source file:shelf-a.txt
    Scan {
        /// Capture source: stdin or file:<path>.
        #[arg(long, default_value = "stdin")]
        source: CaptureMode,
    },

    /// Validate configuration and try to log in, without looking anything up.
    Check,

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   puya-kiosk completions bash > ~/.local/share/bash-completion/completions/puya-kiosk
    ///   puya-kiosk completions zsh > ~/.zfunc/_puya-kiosk
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let command = cli.command.unwrap_or(Commands::Repl);

    if let Commands::Completions { shell } = &command {
        let mut cmd = Cli::command();
        clap_complete::generate(*shell, &mut cmd, "puya-kiosk", &mut std::io::stdout());
        return Ok(());
    }

    let overrides = Overrides {
        timeout_secs: cli.timeout_secs,
        session_ttl_secs: cli.session_ttl_secs,
    };
    let settings = match KioskSettings::load(overrides) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("Set ODOO_URL, ODOO_DB, ODOO_USERNAME and ODOO_PASSWORD before starting.");
            std::process::exit(e.exit_code());
        }
    };

    tracing::info!(
        "ERP {} (db {}, user {})",
        settings.credentials.endpoint(),
        settings.credentials.database(),
        settings.credentials.username()
    );

    let client = OdooClient::connect(settings.credentials, settings.timeout)
        .with_session_ttl(settings.session_ttl);
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    match command {
        Commands::Repl => {
            puya_kiosk::repl::run(&client, format).await?;
        }

        Commands::Lookup { identifier } => {
            let Some(identifier) = puya_lookup::normalize_identifier(&identifier) else {
                eprintln!("Error: empty identifier");
                std::process::exit(2);
            };
            let mut session = KioskSession::new();
            let outcome = kiosk::lookup_and_render(
                &identifier,
                &client,
                &mut session,
                format,
                &mut std::io::stdout(),
            )
            .await?;
            let code = match outcome {
                puya_lookup::LookupOutcome::Found { .. } => 0,
                puya_lookup::LookupOutcome::NotFound => 3,
                puya_lookup::LookupOutcome::AuthenticationFailed { .. } => 4,
                puya_lookup::LookupOutcome::TransportError { .. } => 5,
            };
            if code != 0 {
                std::process::exit(code);
            }
        }

        Commands::Scan { source } => {
            let Some(mut source) = source.open().map_err(KioskError::from)? else {
                eprintln!("Error: the prompt source is interactive; use `puya-kiosk repl`");
                std::process::exit(2);
            };
            let mut session = KioskSession::new();
            kiosk::run(
                &mut source,
                &client,
                &mut session,
                format,
                &mut std::io::stdout(),
            )
            .await?;
            let stats = session.stats();
            tracing::info!(
                "Scan finished: {} lookups, {} found, {} not found, {} failed, {} repeats skipped",
                stats.lookups,
                stats.found,
                stats.not_found,
                stats.failed,
                stats.duplicates_skipped
            );
        }

        Commands::Check => match client.authenticate().await {
            Ok(handle) => {
                println!("Configuration OK");
                println!("  Endpoint: {}", client.credentials().endpoint());
                println!("  Database: {}", client.credentials().database());
                println!(
                    "  User:     {} (uid {})",
                    client.credentials().username(),
                    handle.uid()
                );
            }
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(4);
            }
        },

        // Generated above, before configuration is loaded.
        Commands::Completions { .. } => {}
    }

    Ok(())
}
