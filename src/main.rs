//! Odontolegal - signing and verification service for forensic dental reports

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use odontolegal::{
    config::Args,
    db::{
        DocumentStatus, MemorySignableStore, MongoClient, MongoSignableStore, ReportDoc,
        SignableStore, StoredDocument,
    },
    logging::AuditLogger,
    server::{self, AppState},
    services::SigningService,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("odontolegal={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  Odontolegal - report signatures");
    info!("======================================");
    info!("Instance ID: {}", args.instance_id);
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("MongoDB: {}", args.mongodb_uri);
    info!("Signature validity: {} years", args.signature_validity_years);
    info!("Public base URL: {}", args.public_base_url);
    info!("======================================");

    let jwt = args.jwt_validator()?;
    let engine = Arc::new(args.signature_engine()?);

    // Connect to MongoDB (optional in dev mode)
    let mongo = match MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await {
        Ok(client) => {
            info!("MongoDB connected successfully");
            Some(client)
        }
        Err(e) => {
            if args.dev_mode {
                warn!("MongoDB connection failed (dev mode, using in-memory store): {}", e);
                None
            } else {
                error!("MongoDB connection failed: {}", e);
                std::process::exit(1);
            }
        }
    };

    let store: Arc<dyn SignableStore> = match &mongo {
        Some(client) => Arc::new(MongoSignableStore::new(client).await?),
        None => {
            let memory = MemorySignableStore::new();
            let id = memory.insert(StoredDocument::Report(dev_sample_report())).await?;
            info!("In-memory store seeded with finalized report {}", id);
            Arc::new(memory)
        }
    };

    let audit = AuditLogger::new(args.instance_id.to_string());
    if let Some(path) = &args.audit_log_path {
        if let Err(e) = audit.init_file(path.clone()).await {
            error!("Failed to open audit log {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }

    let signing = Arc::new(SigningService::new(
        store,
        engine,
        audit,
        args.public_base_url.clone(),
    ));

    let state = Arc::new(AppState::new(args, mongo, jwt, signing));
    server::run(state).await?;

    Ok(())
}

/// Finalized report so the dev server has something to sign
fn dev_sample_report() -> ReportDoc {
    let mut report = ReportDoc::new(
        "dev-case-1".into(),
        "Dental identification report".into(),
        "Findings: fracture observed.".into(),
        "dev".into(),
    );
    report.conclusion = Some("Consistent with trauma.".into());
    report.status = DocumentStatus::Finalized;
    report
}
