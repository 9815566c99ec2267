use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use sma::logging::{init_logging, LogLevel};
use sma::{App, AppConfig};

/// S.M.A - Send Message Anon
///
/// Manages your anonymous identities and encrypts message payloads for them.
#[derive(Parser, Debug)]
#[command(name = "sma")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to $CONFIG_PATH, then the platform config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn", global = true)]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load or create the config and show the default identity
    Init,

    /// List known identities
    Identities,

    /// Generate a new identity
    NewIdentity {
        /// Make it the default identity
        #[arg(long)]
        default: bool,
    },

    /// Import an armored public key file as an identity
    Import {
        file: PathBuf,

        /// Mark the identity as publicly discoverable
        #[arg(long)]
        public: bool,
    },

    /// Print an identity's armored public key (default identity if omitted)
    Export { fingerprint: Option<String> },

    /// Make an identity the default
    Use { fingerprint: String },

    /// Encrypt a message for an identity (reads stdin when no message given)
    Encrypt {
        #[arg(short, long)]
        to: String,

        message: Option<String>,
    },

    /// Decrypt a payload (reads stdin when no payload given)
    Decrypt {
        /// Identity to decrypt as (default identity if omitted)
        #[arg(long = "as")]
        as_identity: Option<String>,

        payload: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = LogLevel::from_str(&cli.log_level).unwrap_or_else(|| {
        eprintln!("Invalid log level '{}', using 'warn'", cli.log_level);
        LogLevel::Warn
    });

    let config = AppConfig::from_env(cli.config)
        .with_log_level(log_level)
        .with_json_logs(cli.json_logs);
    init_logging(config.log_config())?;

    let mut app = App::new(config).context("could not initialize identity")?;

    match cli.command.unwrap_or(Command::Init) {
        Command::Init => {
            let identity = app.default_identity()?;
            println!("Config:   {}", app.config().config_path.display());
            println!("Identity: {}", identity.fingerprint);
        }
        Command::Identities => {
            let default = &app.state().default_identity;
            for (fingerprint, identity) in app.identities().iter() {
                let marker = if fingerprint == default { "*" } else { " " };
                let kind = if identity.is_owned() { "owned" } else { "contact" };
                let visibility = if identity.is_public { "public" } else { "private" };
                println!("{} {}  {:<7}  {}", marker, fingerprint, kind, visibility);
            }
        }
        Command::NewIdentity { default } => {
            let fingerprint = app.create_identity(default)?;
            println!("{}", fingerprint);
        }
        Command::Import { file, public } => {
            let armored = fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let fingerprint = app.import_identity(&armored, public)?;
            println!("{}", fingerprint);
        }
        Command::Export { fingerprint } => {
            print!("{}", app.export_public_key(fingerprint.as_deref())?);
        }
        Command::Use { fingerprint } => {
            app.set_default_identity(&fingerprint)?;
            println!("Default identity: {}", fingerprint);
        }
        Command::Encrypt { to, message } => {
            let message = read_input(message)?;
            println!("{}", app.encrypt_for(&to, message.as_bytes())?);
        }
        Command::Decrypt {
            as_identity,
            payload,
        } => {
            let payload = read_input(payload)?;
            let plaintext = app.decrypt_as(as_identity.as_deref(), payload.trim())?;
            let mut stdout = io::stdout();
            stdout.write_all(&plaintext)?;
            stdout.flush()?;
        }
    }

    Ok(())
}

/// Use the argument if present, otherwise all of stdin
fn read_input(arg: Option<String>) -> Result<String> {
    match arg {
        Some(value) => Ok(value),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read stdin")?;
            Ok(buffer)
        }
    }
}
