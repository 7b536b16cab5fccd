//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo; one task per connection.

use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::auth::JwtValidator;
use crate::config::Args;
use crate::db::MongoClient;
use crate::routes::{self, BoxBody};
use crate::services::SigningService;
use crate::types::OdontoError;

/// Shared application state
pub struct AppState {
    pub args: Args,
    /// MongoDB client; `None` in dev mode without a database
    pub mongo: Option<MongoClient>,
    /// Session token validator
    pub jwt: JwtValidator,
    pub signing: Arc<SigningService>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        args: Args,
        mongo: Option<MongoClient>,
        jwt: JwtValidator,
        signing: Arc<SigningService>,
    ) -> Self {
        Self {
            args,
            mongo,
            jwt,
            signing,
            started_at: Instant::now(),
        }
    }
}

/// Run the HTTP server until the process exits
pub async fn run(state: Arc<AppState>) -> Result<(), OdontoError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "Odontolegal listening on {} as instance {}",
        state.args.listen, state.args.instance_id
    );

    if state.args.dev_mode {
        warn!("Development mode enabled - dev secrets in use, do not sign real reports");
    }

    info!(
        "Signature store: {}; verification links under {}/verify/",
        state.signing.store().backend(),
        state.args.public_base_url.trim_end_matches('/')
    );

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .preserve_header_case(true)
                        .title_case_headers(true)
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<BoxBody>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!("[{}] {} {}", addr, method, path);

    if path.starts_with("/auth") {
        if let Some(response) = routes::handle_auth_request(req, Arc::clone(&state)).await {
            return Ok(response);
        }
        return Ok(routes::not_found(&path));
    }

    if path.starts_with("/api/") {
        if let Some(response) = routes::handle_api_request(req, Arc::clone(&state)).await {
            return Ok(response);
        }
        return Ok(routes::not_found(&path));
    }

    if path.starts_with("/verify/") {
        return Ok(routes::handle_public_verify(req, Arc::clone(&state)).await);
    }

    let response = match (method, path.as_str()) {
        (Method::GET, "/health") | (Method::GET, "/healthz") => {
            routes::health_check(Arc::clone(&state))
        }
        (Method::GET, "/version") => routes::version_info(),
        (Method::OPTIONS, _) => routes::cors_preflight(),
        _ => routes::not_found(&path),
    };

    Ok(response)
}
