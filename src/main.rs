use std::process::ExitCode;

use clap::Parser;

use clinic_desk::client::{HttpTransport, SettingField};
use clinic_desk::commands::settings::{self as settings_cmd, SettingsPatch};
use clinic_desk::error::AppError;
use clinic_desk::{config, logging};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Command to execute (defaults to `serve`)
    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Run the HTTP server
    Serve,
    /// Read or change clinic settings on a running server
    Settings {
        /// Server base URL (defaults to the configured bind address)
        #[arg(long, env = "CLINIC_SERVER_URL")]
        server: Option<String>,
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(clap::Subcommand, Debug)]
enum SettingsAction {
    /// Print the current clinic information
    Show,
    /// Change one field: name, address, phone or email
    Set { field: SettingField, value: String },
    /// Change several fields at once
    Update {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize Sentry before anything else so panics during startup are captured.
    // Returns a no-op guard when SENTRY_DSN is absent (local dev).
    let _sentry_guard = sentry::init(sentry_options());

    logging::init();
    let args = Args::parse();

    match dispatch(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(args: Args) -> Result<(), AppError> {
    let config = config::load()?;

    match args.cmd.unwrap_or(Command::Serve) {
        Command::Serve => clinic_desk::run(config).await,
        Command::Settings { server, action } => {
            let url = server.unwrap_or_else(|| format!("http://{}", config.bind_addr));
            let transport = HttpTransport::new(url)?;
            let defaults = config.defaults;

            let settings = match action {
                SettingsAction::Show => settings_cmd::show(transport, defaults).await?,
                SettingsAction::Set { field, value } => {
                    settings_cmd::set_field(transport, defaults, field, value).await?
                }
                SettingsAction::Update {
                    name,
                    address,
                    phone,
                    email,
                } => {
                    let patch = SettingsPatch {
                        name,
                        address,
                        phone,
                        email,
                    };
                    settings_cmd::update(transport, defaults, patch).await?
                }
            };

            println!("{}", settings_cmd::render(&settings));
            Ok(())
        }
    }
}

fn sentry_options() -> sentry::ClientOptions {
    sentry::ClientOptions {
        dsn: option_env!("SENTRY_DSN").and_then(|s| s.parse().ok()),
        release: Some(env!("CARGO_PKG_VERSION").into()),
        traces_sample_rate: 0.0,
        send_default_pii: false,
        before_send: Some(std::sync::Arc::new(|mut event| {
            // Patient and clinic data never leaves the machine.
            if let Some(ref mut request) = event.request {
                request.data = None;
            }
            event.user = None;
            Some(event)
        })),
        ..Default::default()
    }
}
