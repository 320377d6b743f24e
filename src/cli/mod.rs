use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Document Store Args ---
    /// Conversation document store type (redis, memory)
    #[arg(long, env = "STORE_TYPE", default_value = "redis")]
    pub store_type: String,

    /// Document store host endpoint (e.g., redis://127.0.0.1:6379)
    #[arg(long, env = "STORE_HOST", default_value = "redis://127.0.0.1:6379")]
    pub store_host: String,

    /// Prefix for Redis conversation keys.
    #[arg(long, env = "STORE_PREFIX", default_value = "chats:")]
    pub store_prefix: String,

    // --- Asset Store Args ---
    /// Uploaded-file object store type (local, memory)
    #[arg(long, env = "ASSET_STORE_TYPE", default_value = "local")]
    pub asset_store_type: String,

    /// Directory backing the local object store.
    #[arg(long, env = "ASSETS_DIR", default_value = "Assets")]
    pub assets_dir: String,

    /// Bucket that receives files uploaded for analysis. Empty disables
    /// uploads.
    #[arg(long, env = "ASSETS_BUCKET", default_value = "analysis-files")]
    pub assets_bucket: String,

    // --- Report Args ---
    /// Directory where generated reports are written before being encoded.
    #[arg(long, env = "REPORTS_DIR", default_value = "Reports")]
    pub reports_dir: String,

    // --- Mail Args ---
    /// Path to the HTML template used for transcript mails.
    #[arg(long, env = "MAIL_TEMPLATE_PATH", default_value = "templates/mail.html")]
    pub mail_template_path: String,

    /// SMTP relay host for transcript mails.
    #[arg(long, env = "SMTP_HOST", default_value = "smtp.gmail.com")]
    pub smtp_host: String,

    /// SMTP relay port (STARTTLS).
    #[arg(long, env = "SMTP_PORT", default_value = "587")]
    pub smtp_port: u16,

    /// SMTP account used as sender and for authentication.
    #[arg(long, env = "SMTP_USERNAME", default_value = "")]
    pub smtp_username: String,

    /// SMTP account password or app key.
    #[arg(long, env = "SMTP_PASSWORD", default_value = "")]
    pub smtp_password: String,

    // --- Token Args ---
    /// Symmetric secret used to sign and validate bearer tokens.
    #[arg(long, env = "JWT_SECRET", default_value = "change-me")]
    pub jwt_secret: String,

    /// Issuer claim stamped on tokens and required on validation.
    #[arg(long, env = "JWT_ISSUER", default_value = "JWTAuthenticationServer")]
    pub jwt_issuer: String,

    /// Audience claim stamped on tokens and required on validation.
    #[arg(long, env = "JWT_AUDIENCE", default_value = "JWTServicePostmanClient")]
    pub jwt_audience: String,

    /// Token lifetime in minutes.
    #[arg(long, env = "JWT_EXPIRE_MINUTES", default_value = "1440")]
    pub jwt_expire_minutes: i64,

    /// Path to the PKCS#8 RSA private key (PEM) that decrypts incoming
    /// credential blobs.
    #[arg(long, env = "RSA_KEY_PATH", default_value = "keys/private.pem")]
    pub rsa_key_path: String,

    // --- Server Args ---
    /// Host address and port for the server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:4000")]
    pub server_addr: String,

    /// Optional path to the TLS certificate file (PEM format). Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format). Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,
}
