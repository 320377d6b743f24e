use chat_history::cli::Args;
use chat_history::render::ArtifactStore;
use chat_history::repository::{ChatRepository, RegistryRepository};
use chat_history::server::api::AppState;
use chat_history::server::Server;
use chat_history::service::email::MailConfig;
use chat_history::service::{
    AssetService, ChatService, EmailService, RegistryService, ReportService, TokenService,
};
use chat_history::store::{create_object_store, initialize_document_store};
use clap::Parser;
use dotenv::dotenv;
use log::info;
use std::error::Error;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Document Store Type: {}", args.store_type);
    info!("Document Store Host: {}", args.store_host);
    info!("Asset Store Type: {}", args.asset_store_type);
    info!("Assets Bucket: {}", args.assets_bucket);
    info!("Reports Directory: {}", args.reports_dir);
    info!("Mail Template Path: {}", args.mail_template_path);
    info!("SMTP Host: {}:{}", args.smtp_host, args.smtp_port);
    info!("JWT Issuer: {}", args.jwt_issuer);
    info!("JWT Audience: {}", args.jwt_audience);
    info!("RSA Key Path: {}", args.rsa_key_path);
    info!("TLS Enabled: {}", args.enable_tls);
    info!("-------------------------");

    let store = initialize_document_store(&args)?;
    let chat_repository = Arc::new(ChatRepository::new(store.clone()));
    let registry_repository = Arc::new(RegistryRepository::new(store.clone()));
    let objects = create_object_store(&args)?;

    let state = AppState {
        chat: Arc::new(ChatService::new(chat_repository.clone())),
        registry: Arc::new(RegistryService::new(registry_repository)),
        report: Arc::new(ReportService::new(
            chat_repository.clone(),
            ArtifactStore::new(&args.reports_dir),
        )),
        email: Arc::new(EmailService::new(
            chat_repository,
            MailConfig::from_args(&args),
        )),
        token: Arc::new(TokenService::from_args(&args)?),
        assets: Arc::new(AssetService::from_args(objects, &args)),
        args: args.clone(),
    };

    let addr = args.server_addr.clone();
    let server = Server::new(addr, state);
    server.run().await?;

    Ok(())
}
