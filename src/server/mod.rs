pub mod api;
pub mod auth;

use crate::cli::Args;
use api::AppState;
use log::info;
use std::error::Error;
use std::net::SocketAddr;

pub struct Server {
    addr: String,
    state: AppState,
}

impl Server {
    pub fn new(addr: String, state: AppState) -> Self {
        Self { addr, state }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let addr = self.addr.parse::<SocketAddr>()?;
        let args: Args = self.state.args.clone();
        let app = api::build_router(self.state.clone());

        if args.enable_tls && args.tls_cert_path.is_some() && args.tls_key_path.is_some() {
            let cert_path = args.tls_cert_path.as_ref().unwrap();
            let key_path = args.tls_key_path.as_ref().unwrap();

            let tls_config =
                axum_server::tls_rustls::RustlsConfig::from_pem_file(cert_path, key_path).await?;

            info!("Starting HTTPS server on: https://{}", addr);
            axum_server::bind_rustls(addr, tls_config)
                .serve(app.into_make_service())
                .await?;
        } else {
            info!("Starting HTTP server on: http://{}", addr);
            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app.into_make_service()).await?;
        }

        Ok(())
    }
}
