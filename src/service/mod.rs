pub mod assets;
pub mod auth;
pub mod chat;
pub mod email;
pub mod registry;
pub mod report;

pub use assets::AssetService;
pub use auth::TokenService;
pub use chat::ChatService;
pub use email::EmailService;
pub use registry::RegistryService;
pub use report::ReportService;
