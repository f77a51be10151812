// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! HTTP API over the project store plus a same-origin proxy for oracle
//! decryption results.

mod oracle;
mod routes;

pub use oracle::{OracleProxy, OracleProxyResponse};
pub use routes::configure;

use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use zl_config::AppConfig;
use zl_store::ProjectStore;

/// Shared per-worker state handed to every route.
pub struct AppState {
    pub store: Arc<dyn ProjectStore>,
    pub oracle: OracleProxy,
}

/// Bind and run the API server until shutdown.
pub async fn run(config: &AppConfig, store: Arc<dyn ProjectStore>) -> Result<()> {
    let state = web::Data::new(AppState {
        store,
        oracle: OracleProxy::new(&config.oracle),
    });
    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    info!("starting API server on {bind_address}");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .configure(routes::configure)
    })
    .bind(&bind_address)?
    .run()
    .await?;

    Ok(())
}
