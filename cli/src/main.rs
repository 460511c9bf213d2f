use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use copytrade_client::config::{ClientConfig, ConfigError};
use copytrade_client::net::api::{self, ApiError, DepositRequest, OtpContext, OtpPurpose, Signup};
use copytrade_client::net::fetch::{ApiClient, Auth};
use copytrade_client::net::http::{APPLICATION_JSON, Body, CONTENT_TYPE, HttpRequest, Method};
use copytrade_client::net::intercept;
use copytrade_client::net::native::ReqwestTransport;
use copytrade_client::net::transport::{Fetch, FetchError};
use copytrade_client::net::types::{TransactionStatus, User};
use copytrade_client::session::SessionStore;
use copytrade_client::state::activity::{ALL_ACTIONS, ActivityFilter, action_label, unique_actions};
use copytrade_client::state::auth::AuthState;
use copytrade_client::state::maintenance::MaintenanceState;
use copytrade_client::state::rankings;
use copytrade_client::storage::{FileStorage, StorageError};
use copytrade_client::util::validate::{self, FormErrors};
use serde::Serialize;
use serde_json::Value;


#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("http request failed: {0}")]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("not signed in; run `copytrade login` first")]
    NotSignedIn,
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error("unsupported HTTP method: {0}")]
    InvalidMethod(String),
    #[error("deposit {0} not found")]
    DepositNotFound(String),
    #[error("server returned {status}: {body}")]
    RawStatus { status: u16, body: String },
}

impl CliError {
    fn from_form(errors: &FormErrors) -> Option<Self> {
        if errors.is_empty() {
            return None;
        }
        let joined = errors
            .iter()
            .map(|(field, message)| format!("{field}: {message}"))
            .collect::<Vec<_>>()
            .join("; ");
        Some(Self::Invalid(joined))
    }
}

#[derive(Parser, Debug)]
#[command(name = "copytrade", about = "Copy-trading platform API CLI")]
struct Cli {
    /// API base URL (overrides `COPYTRADE_SERVER_URL` from the environment).
    #[arg(long, env = "COPYTRADE_SERVER_URL")]
    base_url: Option<String>,

    /// Directory holding the persisted session.
    #[arg(long, env = "COPYTRADE_SESSION_DIR")]
    session_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in with an email or username.
    Login {
        identifier: String,
        #[arg(long, env = "COPYTRADE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session.
    Logout,
    /// Show the signed-in user.
    Whoami {
        /// Re-fetch the user from the server first.
        #[arg(long)]
        refresh: bool,
    },
    /// Register a new account; a verification code is sent afterwards.
    Signup(SignupArgs),
    /// Confirm a one-time code.
    VerifyOtp(VerifyOtpArgs),
    /// Ask for a new one-time code.
    ResendOtp(ResendOtpArgs),
    /// Set a new password.
    ResetPassword {
        identifier: String,
        #[arg(long, env = "COPYTRADE_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        confirm: String,
    },
    Maintenance(MaintenanceCommand),
    Deposits(DepositsCommand),
    Users(UsersCommand),
    /// Admin audit log.
    Logs {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long, default_value = ALL_ACTIONS)]
        action: String,
        #[arg(long, default_value_t = api::DEFAULT_LOG_LIMIT)]
        limit: u32,
        /// List the distinct actions instead of entries.
        #[arg(long)]
        actions: bool,
    },
    /// Rank tiers for a user (defaults to the signed-in user).
    Rankings {
        #[arg(long)]
        email: Option<String>,
    },
    /// Send an arbitrary request through the global fetch primitive.
    Raw {
        method: String,
        path: String,
        /// JSON request body.
        #[arg(long)]
        data: Option<String>,
        /// Send without the bearer token.
        #[arg(long)]
        no_auth: bool,
    },
}

#[derive(Args, Debug)]
struct SignupArgs {
    #[arg(long)]
    email: String,
    #[arg(long)]
    username: String,
    #[arg(long, env = "COPYTRADE_PASSWORD", hide_env_values = true)]
    password: String,
    #[arg(long, default_value = "")]
    referred_by: String,
    /// Accept the Terms & Conditions.
    #[arg(long)]
    accept_terms: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PurposeArg {
    Register,
    Login,
    Reset,
    Withdraw,
}

impl From<PurposeArg> for OtpPurpose {
    fn from(value: PurposeArg) -> Self {
        match value {
            PurposeArg::Register => Self::RegisterVerification,
            PurposeArg::Login => Self::LoginVerification,
            PurposeArg::Reset => Self::ResetPassword,
            PurposeArg::Withdraw => Self::WithdrawVerification,
        }
    }
}

#[derive(Args, Debug, Default)]
struct OtpFields {
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    username: Option<String>,
    #[arg(long, env = "COPYTRADE_PASSWORD", hide_env_values = true)]
    password: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    amount: Option<f64>,
    #[arg(long)]
    address: Option<String>,
}

impl OtpFields {
    fn into_context(self) -> OtpContext {
        OtpContext {
            email: self.email,
            username: self.username,
            password: self.password,
            phone_number: self.phone,
            amount: self.amount,
            address: self.address,
        }
    }
}

#[derive(Args, Debug)]
struct VerifyOtpArgs {
    code: String,
    #[arg(long, value_enum)]
    purpose: PurposeArg,
    #[command(flatten)]
    fields: OtpFields,
}

#[derive(Args, Debug)]
struct ResendOtpArgs {
    #[arg(long, value_enum)]
    purpose: PurposeArg,
    #[command(flatten)]
    fields: OtpFields,
}

#[derive(Args, Debug)]
struct MaintenanceCommand {
    #[command(subcommand)]
    command: MaintenanceSubcommand,
}

#[derive(Subcommand, Debug)]
enum MaintenanceSubcommand {
    Status,
    Enable {
        #[arg(long)]
        message: Option<String>,
    },
    Disable,
}

#[derive(Args, Debug)]
struct DepositsCommand {
    #[command(subcommand)]
    command: DepositsSubcommand,
}

#[derive(Subcommand, Debug)]
enum DepositsSubcommand {
    /// Deposits for a user (defaults to the signed-in user).
    List {
        #[arg(long)]
        email: Option<String>,
        /// Only the deposit awaiting review.
        #[arg(long)]
        pending: bool,
    },
    /// Open a crypto (`--coin`) or wire (`--wire`) deposit.
    Create {
        #[arg(long)]
        amount: f64,
        #[arg(long, conflicts_with = "wire", required_unless_present = "wire")]
        coin: Option<String>,
        #[arg(long)]
        wire: bool,
    },
    /// Cancel a deposit (defaults to the pending one).
    Cancel { id: Option<String> },
    Approve {
        id: String,
        #[arg(long)]
        email: String,
    },
    Reject {
        id: String,
        #[arg(long)]
        email: String,
    },
}

#[derive(Args, Debug)]
struct UsersCommand {
    #[command(subcommand)]
    command: UsersSubcommand,
}

#[derive(Subcommand, Debug)]
enum UsersSubcommand {
    List,
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = cli.base_url.as_deref() {
        config = config.with_server_url(url)?;
    }
    if let Some(dir) = cli.session_dir {
        config = config.with_session_dir(dir);
    }

    let session = SessionStore::new(Arc::new(FileStorage::new(&config.session_dir)));
    let transport: Arc<dyn Fetch> = Arc::new(ReqwestTransport::new(config.timeouts)?);
    intercept::install(transport.clone(), session.clone());
    let client = ApiClient::new(config.server_url, session, transport);

    run(&client, cli.command).await
}

async fn run(client: &ApiClient, command: Command) -> Result<(), CliError> {
    match command {
        Command::Login { identifier, password } => run_login(client, &identifier, &password).await,
        Command::Logout => {
            AuthState::default().logout(client.session())?;
            eprintln!("signed out");
            Ok(())
        }
        Command::Whoami { refresh } => run_whoami(client, refresh).await,
        Command::Signup(args) => run_signup(client, args).await,
        Command::VerifyOtp(args) => run_verify_otp(client, args).await,
        Command::ResendOtp(args) => {
            api::resend_otp(client, args.purpose.into(), &args.fields.into_context()).await?;
            eprintln!("a new verification code has been sent");
            Ok(())
        }
        Command::ResetPassword { identifier, password, confirm } => {
            if let Some(e) = CliError::from_form(&validate::validate_reset(&identifier, &password, &confirm)) {
                return Err(e);
            }
            let resp = api::reset_password(client, &identifier, &password).await?;
            print_message(resp.message.as_deref(), "password updated");
            Ok(())
        }
        Command::Maintenance(cmd) => run_maintenance(client, cmd).await,
        Command::Deposits(cmd) => run_deposits(client, cmd).await,
        Command::Users(cmd) => run_users(client, cmd).await,
        Command::Logs { search, action, limit, actions } => run_logs(client, search, action, limit, actions).await,
        Command::Rankings { email } => {
            let email = match email {
                Some(email) => email,
                None => signed_in_email(client)?,
            };
            let resp = rankings::load_or_default(client, &email).await;
            if !resp.is_custom {
                eprintln!("showing standard tiers");
            }
            print_json(&resp.rankings)
        }
        Command::Raw { method, path, data, no_auth } => run_raw(client, &method, &path, data, no_auth).await,
    }
}

async fn run_login(client: &ApiClient, identifier: &str, password: &str) -> Result<(), CliError> {
    if let Some(e) = CliError::from_form(&validate::validate_login(identifier, password)) {
        return Err(e);
    }
    let auth = api::login(client, identifier, password).await?;
    if auth.token.is_none() {
        tracing::warn!("server returned no token; requests will be sent without auth");
    }
    match auth.user {
        Some(user) => print_json(&user),
        None => {
            print_message(auth.message.as_deref(), "signed in");
            Ok(())
        }
    }
}

async fn run_whoami(client: &ApiClient, refresh: bool) -> Result<(), CliError> {
    let mut state = AuthState::restore(client.session());
    if refresh {
        state.refresh(client).await?;
    } else {
        state.user = client.session().user();
    }
    let Some(user) = state.user.as_ref() else {
        return Err(CliError::NotSignedIn);
    };
    if state.needs_account_setup() {
        eprintln!("account setup is incomplete");
    }
    eprintln!("total balance: {:.2}", state.total_balance());
    print_json(user)
}

async fn run_signup(client: &ApiClient, args: SignupArgs) -> Result<(), CliError> {
    let errors = validate::validate_signup(&args.username, &args.email, &args.password, args.accept_terms);
    if let Some(e) = CliError::from_form(&errors) {
        return Err(e);
    }
    let form = Signup {
        email: args.email,
        username: args.username,
        password: args.password,
        referred_by: args.referred_by,
    };
    let resp = api::signup(client, &form).await?;
    print_message(resp.message.as_deref(), "check your email for a verification code");
    Ok(())
}

async fn run_verify_otp(client: &ApiClient, args: VerifyOtpArgs) -> Result<(), CliError> {
    if !validate::otp_complete(&args.code) {
        return Err(CliError::Invalid(format!("code must be {} digits", validate::OTP_LENGTH)));
    }
    let auth = api::verify_otp(client, &args.code, args.purpose.into(), &args.fields.into_context()).await?;
    match auth.user {
        Some(user) => print_json(&user),
        None => {
            print_message(auth.message.as_deref(), "verified");
            Ok(())
        }
    }
}

async fn run_maintenance(client: &ApiClient, cmd: MaintenanceCommand) -> Result<(), CliError> {
    let mut state = MaintenanceState::default();
    match cmd.command {
        MaintenanceSubcommand::Status => state.check(client).await,
        MaintenanceSubcommand::Enable { message } => {
            if !state.toggle(client, true, message.as_deref()).await {
                return Err(CliError::Invalid("maintenance mode was not enabled".to_owned()));
            }
        }
        MaintenanceSubcommand::Disable => {
            if !state.toggle(client, false, None).await {
                return Err(CliError::Invalid("maintenance mode was not disabled".to_owned()));
            }
        }
    }
    if state.enabled {
        println!("maintenance: {}", state.message);
    } else {
        println!("operational");
    }
    Ok(())
}

async fn run_deposits(client: &ApiClient, cmd: DepositsCommand) -> Result<(), CliError> {
    match cmd.command {
        DepositsSubcommand::List { email, pending } => {
            let email = match email {
                Some(email) => email,
                None => signed_in_email(client)?,
            };
            if pending {
                let deposit = api::pending_deposit(client, &email).await?;
                print_json(&deposit)
            } else {
                print_json(&api::user_deposits(client, &email).await?)
            }
        }
        DepositsSubcommand::Create { amount, coin, wire } => {
            let user = signed_in_user(client)?;
            let user_id = user.id.ok_or(CliError::NotSignedIn)?;
            let request = if wire {
                let wire = api::utils(client).await?.wire_transfer.unwrap_or_default();
                DepositRequest::wire(&user_id, amount, wire)
            } else {
                let wanted = coin.unwrap_or_default();
                let coins = api::deposit_coins(client).await?;
                let Some(coin) = coins.iter().find(|c| c.name.eq_ignore_ascii_case(&wanted)) else {
                    let names = coins.iter().map(|c| c.name.as_str()).collect::<Vec<_>>().join(", ");
                    return Err(CliError::Invalid(format!("unknown coin '{wanted}'; available: {names}")));
                };
                DepositRequest::crypto(&user_id, amount, coin)
            };
            let resp = api::create_deposit(client, &request).await?;
            print_message(resp.message.as_deref(), "deposit submitted");
            Ok(())
        }
        DepositsSubcommand::Cancel { id } => {
            let id = match id {
                Some(id) => id,
                None => {
                    let email = signed_in_email(client)?;
                    api::pending_deposit(client, &email)
                        .await?
                        .map(|d| d.id)
                        .ok_or_else(|| CliError::DepositNotFound("pending".to_owned()))?
                }
            };
            let resp = api::cancel_deposit(client, &id).await?;
            print_message(resp.message.as_deref(), "deposit cancelled");
            Ok(())
        }
        DepositsSubcommand::Approve { id, email } => {
            review_deposit(client, &id, &email, TransactionStatus::Success).await
        }
        DepositsSubcommand::Reject { id, email } => review_deposit(client, &id, &email, TransactionStatus::Failed).await,
    }
}

async fn review_deposit(client: &ApiClient, id: &str, email: &str, status: TransactionStatus) -> Result<(), CliError> {
    let deposits = api::user_deposits(client, email).await?;
    let deposit = deposits
        .iter()
        .find(|d| d.id == id)
        .ok_or_else(|| CliError::DepositNotFound(id.to_owned()))?;
    let resp = api::update_deposit_status(client, deposit, status).await?;
    print_message(resp.message.as_deref(), "deposit updated");
    Ok(())
}

async fn run_users(client: &ApiClient, cmd: UsersCommand) -> Result<(), CliError> {
    match cmd.command {
        UsersSubcommand::List => {
            let own_id = client.session().user().and_then(|u| u.id);
            let users: Vec<User> = api::list_users(client)
                .await?
                .into_iter()
                .filter(|u| u.id.is_none() || u.id != own_id)
                .collect();
            print_json(&users)
        }
        UsersSubcommand::Delete { ids } => {
            let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
            let resp = api::delete_users(client, &ids).await?;
            print_message(resp.message.as_deref(), "users deleted");
            Ok(())
        }
    }
}

async fn run_logs(client: &ApiClient, search: String, action: String, limit: u32, actions: bool) -> Result<(), CliError> {
    let logs = api::activity_logs(client, limit).await?;
    if actions {
        for action in unique_actions(&logs) {
            println!("{action}\t{}", action_label(&action));
        }
        return Ok(());
    }
    let filter = ActivityFilter { action, search };
    let matched = filter.apply(&logs);
    eprintln!("{} of {} entries", matched.len(), logs.len());
    print_json(&matched)
}

async fn run_raw(
    client: &ApiClient,
    method: &str,
    path: &str,
    data: Option<String>,
    no_auth: bool,
) -> Result<(), CliError> {
    let method = Method::parse(method).ok_or_else(|| CliError::InvalidMethod(method.to_owned()))?;
    let mut request = HttpRequest::new(method, client.url(path));
    if let Some(data) = data {
        let value: Value = serde_json::from_str(&data)?;
        request.headers.set(CONTENT_TYPE, APPLICATION_JSON);
        request.body = Body::Text(value.to_string());
    }
    let resp = if no_auth {
        client.fetch(request, Auth::Skip).await?
    } else {
        intercept::global_fetch(request).await?
    };
    let body = resp.text();
    if !resp.ok() {
        return Err(CliError::RawStatus { status: resp.status, body });
    }
    match serde_json::from_str::<Value>(&body) {
        Ok(value) => print_json(&value),
        Err(_) => {
            println!("{body}");
            Ok(())
        }
    }
}

fn signed_in_user(client: &ApiClient) -> Result<User, CliError> {
    client.session().user().ok_or(CliError::NotSignedIn)
}

fn signed_in_email(client: &ApiClient) -> Result<String, CliError> {
    signed_in_user(client)?.email.ok_or(CliError::NotSignedIn)
}

fn print_message(message: Option<&str>, fallback: &str) {
    println!("{}", message.filter(|m| !m.is_empty()).unwrap_or(fallback));
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
