use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use edge_ledger::cloud_sync::HttpRemoteStore;
use edge_ledger::services::ReportService;
use edge_ledger::session::{Argon2Hasher, HttpIdentityProvider};
use edge_ledger::{
    CollectionService, Config, Ledger, Principal, Session, SessionContext, SyncEngine, SyncWorker,
    setup_environment,
};
use shared::error::{AppError, ErrorCode};
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "edge-ledger", version, about = "Offline EMI collection ledger")]
struct Cli {
    #[command(flatten)]
    login: LoginArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct LoginArgs {
    /// Owner email (identity provider login)
    #[arg(long, env = "OWNER_EMAIL", requires = "password", conflicts_with = "phone")]
    email: Option<String>,
    /// Owner password
    #[arg(long, env = "OWNER_PASSWORD", hide_env_values = true)]
    password: Option<String>,
    /// Agent phone (local login)
    #[arg(long, env = "AGENT_PHONE", requires = "pin")]
    phone: Option<String>,
    /// Agent PIN
    #[arg(long, env = "AGENT_PIN", hide_env_values = true)]
    pin: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one sync pass
    Sync,
    /// Run the background sync worker until Ctrl-C
    Worker,
    /// Print owner stats (and village dues for an agent)
    Stats,
    /// Export all six collections as JSON
    Export {
        /// Output file (stdout when omitted)
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Record one collection (agent only)
    Collect {
        #[arg(long)]
        village: i64,
        /// Customer number within the village
        #[arg(long)]
        number: i64,
        /// Amount as typed
        #[arg(long)]
        amount: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. 设置环境 (dotenv, 工作目录, 日志)
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::from_env();
    setup_environment(&config)?;

    tracing::info!("Edge Ledger starting...");

    // 2. 打开本地账本
    let ledger = Ledger::open(&config.database_path().to_string_lossy()).await?;
    let mut context = SessionContext::new(ledger.clone(), Arc::new(Argon2Hasher));

    // 3. 登录
    let session = login(&mut context, &config, &cli.login).await?;
    let token = session
        .remote_token()
        .map(str::to_string)
        .or_else(|| config.cloud_token.clone());
    let remote = HttpRemoteStore::new(&config.cloud_url, token, config.request_timeout())?;
    let engine = SyncEngine::new(Arc::new(remote));

    // 4. 执行命令
    let result = run(cli.command, &config, &session, engine).await;

    context.logout();
    ledger.close().await;

    if let Err(e) = result {
        tracing::error!(code = %e.code, "Command failed: {e}");
        return Err(e.into());
    }
    Ok(())
}

async fn login(
    context: &mut SessionContext,
    config: &Config,
    args: &LoginArgs,
) -> Result<Session, AppError> {
    match (&args.email, &args.password, &args.phone, &args.pin) {
        (Some(email), Some(password), _, _) => {
            let provider = HttpIdentityProvider::new(&config.cloud_url, config.request_timeout())?;
            context.login_owner(&provider, email, password).await
        }
        (_, _, Some(phone), Some(pin)) => {
            let login = context.login_agent(phone, pin).await?;
            if login.needs_import {
                tracing::warn!("No local customers for the assigned villages, run `sync` first");
            }
            Ok(login.session)
        }
        _ => Err(AppError::with_message(
            ErrorCode::NotAuthenticated,
            "Provide --email/--password or --phone/--pin",
        )),
    }
}

async fn run(
    command: Commands,
    config: &Config,
    session: &Session,
    engine: SyncEngine,
) -> Result<(), AppError> {
    match command {
        Commands::Sync => {
            let report = engine.sync(session).await?;
            print_json(&serde_json::json!({
                "pushed": report.push.pushed,
                "pushFailures": report.push.failures.len(),
                "published": report.publish.as_ref().map(|p| p.pushed),
                "pulled": report.pull.applied,
                "skipped": report.pull.skipped.len(),
                "clean": report.is_clean(),
            }))?;
            report.into_result().map(|_| ())
        }
        Commands::Worker => {
            let shutdown = CancellationToken::new();
            let worker = SyncWorker::new(
                engine,
                session.clone(),
                config.sync_interval(),
                shutdown.clone(),
            );
            let trigger = worker.trigger();
            let handle = tokio::spawn(worker.run());

            // 启动时立即同步一次
            trigger.sync_now();

            tokio::signal::ctrl_c()
                .await
                .map_err(|e| AppError::internal(format!("Failed to listen for Ctrl-C: {e}")))?;
            shutdown.cancel();
            handle
                .await
                .map_err(|e| AppError::internal(format!("Sync worker panicked: {e}")))
        }
        Commands::Stats => {
            let reports = ReportService::new(session.store().clone());
            let stats = reports.owner_stats().await?;
            match session.principal() {
                Principal::Agent(agent) => {
                    let dues = reports.village_dues(agent).await?;
                    print_json(&serde_json::json!({ "stats": stats, "villageDues": dues }))
                }
                Principal::Owner(_) => print_json(&stats),
            }
        }
        Commands::Export { output } => {
            let snapshot = ReportService::new(session.store().clone()).export_snapshot().await?;
            match output {
                Some(path) => {
                    let json = serde_json::to_vec_pretty(&snapshot)
                        .map_err(|e| AppError::internal(e.to_string()))?;
                    std::fs::write(&path, json).map_err(|e| {
                        AppError::internal(format!("Failed to write {}: {e}", path.display()))
                    })?;
                    tracing::info!(path = %path.display(), records = snapshot.record_count(), "Export written");
                    Ok(())
                }
                None => print_json(&snapshot),
            }
        }
        Commands::Collect {
            village,
            number,
            amount,
        } => {
            let agent = session.require_agent()?;
            let amount = edge_ledger::collection::parse_amount(&amount)?;
            let collection = CollectionService::new(session.store().clone());
            let customer = collection.lookup_customer(village, number).await?;
            let receipt = collection.collect(&customer, amount, agent).await?;
            print_json(&receipt)
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), AppError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| AppError::internal(e.to_string()))?;
    println!("{json}");
    Ok(())
}
