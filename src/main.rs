//! Command line access to stored sessions
//!
//! `show` and `logout` operate on the session registry, `fetch` sends a
//! single request through the recording transport, `accounts` calls the
//! brokerage API with the stored session and `confirm` runs the
//! confirmation prompt on its own.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};

use tbank_session::auth::AuthFlowError;
use tbank_session::invest::{TradeAccountsIn, API_BASE_URL};
use tbank_session::security::Sanitizer;
use tbank_session::transport::{CookieTransport, HttpRequest};
use tbank_session::{
    AuthFlow, Authorizer, Client, ClientConfig, ClientParams, Credential, HttpTransport,
    JsonSessionStorage, PromptAuthorizer, Session, SessionStorage, TrafficRecorder, Transport,
};

#[derive(Parser)]
#[command(name = "tbank-session", version, about = "Inspect and manage T-Bank API sessions")]
struct Cli {
    /// Phone number to act for (overrides TBANK_PHONE)
    #[arg(long, global = true)]
    phone: Option<String>,

    /// Session registry file (overrides TBANK_SESSIONS_FILE)
    #[arg(long, global = true)]
    sessions_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the stored session
    Show {
        /// Print the whole registry instead
        #[arg(long)]
        all: bool,
    },
    /// Delete the stored session
    Logout,
    /// Send a GET request and print the response body
    Fetch { url: String },
    /// Print brokerage accounts using the stored session
    Accounts {
        /// Currency of the totals
        #[arg(long, default_value = "RUB")]
        currency: String,
    },
    /// Ask for a confirmation code and echo it
    Confirm,
}

/// Login flow of the binary: there is no built-in protocol, so a session
/// must already be stored
struct StoredSessionOnly;

#[async_trait]
impl AuthFlow for StoredSessionOnly {
    async fn login(
        &self,
        credential: &Credential,
        _authorizer: &dyn Authorizer,
        _transport: &dyn Transport,
    ) -> Result<Session, AuthFlowError> {
        Err(AuthFlowError::Rejected(format!(
            "no stored session for {}",
            credential.masked_phone()
        )))
    }
}

/// Cookie jar over the optional recorder over the network
fn transport_stack(dump_traffic: bool) -> Result<Arc<dyn Transport>> {
    let http = HttpTransport::new().context("build HTTP client")?;
    Ok(if dump_traffic {
        Arc::new(CookieTransport::new(TrafficRecorder::new(http)))
    } else {
        Arc::new(CookieTransport::new(http))
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    tbank_session::init_logging();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env().context("read configuration")?;
    if let Some(phone) = cli.phone {
        config.phone = Some(phone);
    }
    if let Some(path) = cli.sessions_file {
        config.sessions_file = path;
    }

    tracing::debug!("Using sessions file {}", config.sessions_file.display());
    let storage = JsonSessionStorage::new(&config.sessions_file);

    match cli.command {
        Command::Show { all: true } => {
            let sessions = storage.sessions().await?;
            println!("{}", serde_json::to_string_pretty(&sessions)?);
        }
        Command::Show { all: false } => {
            let phone = config.require_phone()?;
            match storage.load_session(phone).await? {
                Some(session) => println!("{}", serde_json::to_string_pretty(&session)?),
                None => println!("No session stored for {}", Sanitizer::mask_phone(phone)),
            }
        }
        Command::Logout => {
            let phone = config.require_phone()?;
            storage
                .update_session(phone, None)
                .await
                .with_context(|| format!("remove session for {}", Sanitizer::mask_phone(phone)))?;
            println!("Logged out {}", Sanitizer::mask_phone(phone));
        }
        Command::Fetch { url } => {
            let transport = transport_stack(config.dump_traffic)?;
            let request = HttpRequest::get(&url)?;
            let response = transport
                .execute(request)
                .await
                .with_context(|| format!("fetch {}", Sanitizer::sanitize_url(&url)))?;

            if !config.dump_traffic {
                println!("{}", response.text());
            }
            if !response.status.is_success() {
                anyhow::bail!("server answered {}", response.status);
            }
        }
        Command::Accounts { currency } => {
            let client = Client::new(ClientParams {
                credential: config.credential()?,
                storage: Arc::new(storage),
                transport: transport_stack(config.dump_traffic)?,
                auth_flow: Arc::new(StoredSessionOnly),
                authorizer: Arc::new(PromptAuthorizer::stdio()),
            });

            let accounts = client
                .get(API_BASE_URL, &TradeAccountsIn { currency })
                .await
                .context("fetch brokerage accounts")?;
            println!("{}", serde_json::to_string_pretty(&accounts)?);
        }
        Command::Confirm => {
            let phone = config.require_phone()?;
            let code = PromptAuthorizer::stdio().confirmation_code(phone).await?;
            tracing::debug!("Received code {}", Sanitizer::sanitize_token(&code));
            println!("{}", code);
        }
    }

    Ok(())
}
