use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{middleware, Extension, Json, Router};
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};
use chrono_tz::America::Bogota;
use log::error;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::cli::Args;
use crate::constants;
use crate::models::chat::{
    ConsultRequest, DeleteByIdsRequest, DeleteBySearchRequest, UpdateFieldConversationRequest,
};
use crate::models::registry::{PaginatedResponse, RegistryRow};
use crate::models::result::OperationResult;
use crate::service::auth::Claims;
use crate::service::{
    AssetService, ChatService, EmailService, RegistryService, ReportService, TokenService,
};

use super::auth;

#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ChatService>,
    pub registry: Arc<RegistryService>,
    pub report: Arc<ReportService>,
    pub email: Arc<EmailService>,
    pub token: Arc<TokenService>,
    pub assets: Arc<AssetService>,
    pub args: Args,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationQuery {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ByIdQuery {
    #[serde(default)]
    pub conversation_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryQuery {
    #[serde(default)]
    pub page: usize,
    #[serde(default)]
    pub page_size: usize,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub status: Option<bool>,
    #[serde(default)]
    pub is_descending: Option<bool>,
}

#[derive(Deserialize)]
pub struct TokenRequest {
    #[serde(default)]
    pub credential: String,
}

#[derive(Serialize)]
pub struct TokenResults {
    #[serde(rename = "isSuccess")]
    pub is_success: bool,
    #[serde(rename = "token")]
    pub token: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "expiresAt")]
    pub expires_at: String,
}

/// Accepts timestamps as RFC 3339 or as plain `YYYY-MM-DD` dates, the latter
/// anchored to midnight in the display zone. A non-empty value matching
/// neither shape is rejected instead of widening the query to an
/// unfiltered one.
fn parse_query_date(raw: Option<&str>) -> Result<Option<DateTime<FixedOffset>>, OperationResult> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(parsed));
    }
    let invalid = || OperationResult::failure(constants::DATE_FORMAT_INVALID);
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| invalid())?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .and_then(|naive| Bogota.from_local_datetime(&naive).single())
        .ok_or_else(invalid)?;
    Ok(Some(midnight.fixed_offset()))
}

fn parse_query_range(
    from: Option<&str>,
    to: Option<&str>,
) -> Result<(Option<DateTime<FixedOffset>>, Option<DateTime<FixedOffset>>), OperationResult> {
    Ok((parse_query_date(from)?, parse_query_date(to)?))
}

fn respond(outcome: Result<OperationResult, Box<dyn Error + Send + Sync>>) -> Json<OperationResult> {
    match outcome {
        Ok(result) => Json(result),
        Err(e) => Json(OperationResult::failure(e.to_string())),
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let protected = Router::new()
        .route("/Chat/GetConversationByUser", get(get_conversation_by_user))
        .route("/Chat/MeConversations", get(me_conversations))
        .route("/Chat/GetConversationById", get(get_conversation_by_id))
        .route("/Chat/SaveConversation", post(save_conversation))
        .route("/Chat/UpdateMessages", put(update_messages))
        .route("/Chat/DeleteConversation", put(delete_conversation))
        .route(
            "/Chat/DeleteConversationsFromIds",
            put(delete_conversations_from_ids),
        )
        .route(
            "/Chat/DeleteConversationsFromSearch",
            put(delete_conversations_from_search),
        )
        .route("/Chat/UpdateFieldMessages", put(update_field_messages))
        .route(
            "/Chat/UpdateFieldConversation",
            put(update_field_conversation),
        )
        .route(
            "/Assets/UploadFileForAnalyze",
            post(upload_file_for_analyze).layer(DefaultBodyLimit::max(32 * 1024 * 1024)),
        )
        .route("/Register/GetUsers", get(get_users))
        .route("/Register/GetAll", get(get_all))
        .route("/Report/GenerateExcel", post(generate_excel))
        .route("/Report/GeneratePdf", get(generate_pdf))
        .route("/Email/SendEmail", post(send_email))
        .route("/Token/ValidateToken", post(validate_token))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_bearer,
        ));

    let open = Router::new().route("/Token/GenerateToken", post(generate_token));

    Router::new()
        .nest("/chat-services/api", protected.merge(open))
        .layer(cors)
        .with_state(state)
}

async fn get_conversation_by_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<ConversationQuery>,
) -> Json<OperationResult> {
    // Non-administrators can only ever see their own conversations.
    let user_id = if claims.role == constants::ROLE_ADMIN {
        query.user_id.unwrap_or_else(|| claims.email.clone())
    } else {
        claims.email.clone()
    };
    let (from, to) = match parse_query_range(query.from.as_deref(), query.to.as_deref()) {
        Ok(range) => range,
        Err(rejection) => return Json(rejection),
    };
    respond(
        state
            .chat
            .get_conversation_by_user(&user_id, query.name.as_deref(), from, to)
            .await,
    )
}

async fn me_conversations(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<ConversationQuery>,
) -> Json<OperationResult> {
    let (from, to) = match parse_query_range(query.from.as_deref(), query.to.as_deref()) {
        Ok(range) => range,
        Err(rejection) => return Json(rejection),
    };
    respond(
        state
            .chat
            .get_conversation_by_user(&claims.email, query.name.as_deref(), from, to)
            .await,
    )
}

async fn get_conversation_by_id(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<ByIdQuery>,
) -> Json<OperationResult> {
    respond(
        state
            .chat
            .get_conversation_by_id(&claims.email, &query.conversation_id)
            .await,
    )
}

async fn save_conversation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(consult): Json<ConsultRequest>,
) -> Json<OperationResult> {
    let Some(conversation) = consult.conversation else {
        return Json(OperationResult::failure(format!(
            "{} conversation",
            constants::PARAMS_REQUIRED
        )));
    };
    respond(
        state
            .chat
            .save_conversation(&claims.email, conversation)
            .await,
    )
}

async fn update_messages(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(consult): Json<ConsultRequest>,
) -> Json<OperationResult> {
    respond(state.chat.update_messages_merge(&claims.email, consult).await)
}

async fn delete_conversation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(consult): Json<ConsultRequest>,
) -> Json<OperationResult> {
    respond(
        state
            .chat
            .delete_conversation(
                &claims.email,
                &consult.conversation_id,
                consult.status.unwrap_or(true),
            )
            .await,
    )
}

async fn delete_conversations_from_ids(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(query): Json<DeleteByIdsRequest>,
) -> Json<OperationResult> {
    respond(
        state
            .chat
            .delete_conversations_by_ids(
                &claims.email,
                &query.conversation_ids,
                query.status.unwrap_or(true),
            )
            .await,
    )
}

async fn delete_conversations_from_search(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(query): Json<DeleteBySearchRequest>,
) -> Json<OperationResult> {
    respond(
        state
            .chat
            .delete_conversations_by_search(&claims.email, query.name.as_deref(), query.from, query.to)
            .await,
    )
}

async fn update_field_messages(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(consult): Json<ConsultRequest>,
) -> Json<OperationResult> {
    let Some(message) = consult.messages.and_then(|mut m| {
        if m.is_empty() {
            None
        } else {
            Some(m.remove(0))
        }
    }) else {
        return Json(OperationResult::failure(format!(
            "{} messages",
            constants::PARAMS_REQUIRED
        )));
    };
    respond(
        state
            .chat
            .update_field_messages(&claims.email, &consult.conversation_id, message)
            .await,
    )
}

async fn update_field_conversation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(consult): Json<UpdateFieldConversationRequest>,
) -> Json<OperationResult> {
    if consult.modelo_documento.is_none() {
        return Json(OperationResult::failure(constants::NO_FIELDS_TO_UPDATE));
    }
    respond(
        state
            .chat
            .update_field_conversation(
                &claims.email,
                &consult.conversation_id,
                consult.modelo_documento,
            )
            .await,
    )
}

async fn upload_file_for_analyze(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    mut multipart: Multipart,
) -> Response {
    while let Ok(Some(field)) = multipart.next_field().await {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(_) => return (StatusCode::BAD_REQUEST, constants::FILE_MISSING).into_response(),
        };
        if let Err(message) = state.assets.validate(&file_name, bytes.len() as u64) {
            return (StatusCode::BAD_REQUEST, message).into_response();
        }
        return match state.assets.upload(&claims.email, &file_name, &bytes).await {
            Ok(uploaded) => Json(uploaded).into_response(),
            Err(e) => {
                error!("file upload failed for {}: {}", claims.email, e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Ocurrió un error interno al procesar el archivo: {}", e),
                )
                    .into_response()
            }
        };
    }
    (StatusCode::BAD_REQUEST, constants::FILE_MISSING).into_response()
}

async fn get_users(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Response {
    if claims.role != constants::ROLE_ADMIN {
        return StatusCode::FORBIDDEN.into_response();
    }
    respond(state.registry.get_users().await).into_response()
}

async fn get_all(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<RegistryQuery>,
) -> Response {
    if claims.role != constants::ROLE_ADMIN {
        return StatusCode::FORBIDDEN.into_response();
    }
    let (from, to) = match parse_query_range(query.from.as_deref(), query.to.as_deref()) {
        Ok(range) => range,
        Err(rejection) => return Json(rejection).into_response(),
    };
    respond(
        state
            .registry
            .get_all(
                query.page,
                query.page_size,
                query.name.as_deref(),
                from,
                to,
                query.status,
                query.is_descending,
            )
            .await,
    )
    .into_response()
}

async fn generate_excel(
    State(state): State<AppState>,
    Json(report): Json<PaginatedResponse<RegistryRow>>,
) -> Json<OperationResult> {
    respond(state.report.generate_excel(&report))
}

async fn generate_pdf(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<ByIdQuery>,
) -> Json<OperationResult> {
    respond(
        state
            .report
            .generate_pdf(&claims.email, &query.conversation_id)
            .await,
    )
}

async fn send_email(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(consult): Json<ConsultRequest>,
) -> Json<OperationResult> {
    respond(
        state
            .email
            .send_email(&claims.email, &consult.conversation_id)
            .await,
    )
}

async fn generate_token(
    State(state): State<AppState>,
    Json(request): Json<TokenRequest>,
) -> Response {
    match state.token.issue_token(&request.credential) {
        Ok((token, expires_at)) => Json(TokenResults {
            is_success: true,
            token,
            kind: "Bearer".to_string(),
            expires_at: expires_at.to_rfc3339(),
        })
        .into_response(),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "isSuccess": false,
                "message": "Error al generar el token. Verifique sus credenciales.",
                "error": e.to_string(),
            })),
        )
            .into_response(),
    }
}

async fn validate_token(Extension(claims): Extension<Claims>) -> Response {
    Json(serde_json::json!({
        "isValid": true,
        "message": "Token is valid.",
        "email": claims.email,
        "role": claims.role,
    }))
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::ArtifactStore;
    use crate::repository::{ChatRepository, RegistryRepository};
    use crate::service::email::MailConfig;
    use crate::store::{MemoryDocumentStore, MemoryObjectStore};
    use clap::Parser;
    use rsa::RsaPrivateKey;

    fn test_state() -> AppState {
        let args = Args::parse_from(["chat-history"]);
        let store = Arc::new(MemoryDocumentStore::new());
        let chat_repository = Arc::new(ChatRepository::new(store.clone()));
        let registry_repository = Arc::new(RegistryRepository::new(store));
        let key = RsaPrivateKey::new(&mut rand::thread_rng(), 512).unwrap();
        AppState {
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
            token: Arc::new(TokenService::new(
                key,
                args.jwt_secret.clone(),
                args.jwt_issuer.clone(),
                args.jwt_audience.clone(),
                args.jwt_expire_minutes,
            )),
            assets: Arc::new(AssetService::new(
                Arc::new(MemoryObjectStore::new()),
                args.assets_bucket.clone(),
            )),
            args,
        }
    }

    fn test_claims(email: &str, role: &str) -> Claims {
        Claims {
            email: email.to_string(),
            role: role.to_string(),
            jti: "test".to_string(),
            iss: "iss".to_string(),
            aud: "aud".to_string(),
            nbf: 0,
            exp: i64::MAX,
        }
    }

    #[test]
    fn query_dates_accept_rfc3339_and_plain_dates() {
        let parsed = parse_query_date(Some("2024-05-01T10:30:00-05:00"))
            .unwrap()
            .unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-05-01T10:30:00-05:00");

        let midnight = parse_query_date(Some("2024-05-01")).unwrap().unwrap();
        assert_eq!(midnight.to_rfc3339(), "2024-05-01T00:00:00-05:00");

        assert_eq!(parse_query_date(None).unwrap(), None);
        assert_eq!(parse_query_date(Some("   ")).unwrap(), None);
    }

    #[test]
    fn malformed_query_dates_are_rejected() {
        for raw in ["01/05/2024", "yesterday", "2024-13-40", "2024-05-01T99:00:00Z"] {
            let rejection = parse_query_date(Some(raw)).unwrap_err();
            assert!(!rejection.success, "{raw} should not parse");
            assert_eq!(rejection.message_http, constants::DATE_FORMAT_INVALID);
        }
    }

    #[tokio::test]
    async fn conversation_search_fails_on_a_malformed_date_instead_of_widening() {
        let state = test_state();
        let Json(result) = me_conversations(
            State(state),
            Extension(test_claims("ana@example.com", "Usuario")),
            Query(ConversationQuery {
                user_id: None,
                name: None,
                from: Some("not-a-date".to_string()),
                to: None,
            }),
        )
        .await;
        assert!(!result.success);
        assert_eq!(result.message_http, constants::DATE_FORMAT_INVALID);
        assert_eq!(result.data, None);
    }

    #[tokio::test]
    async fn registry_listing_rejects_a_malformed_date_range() {
        let state = test_state();
        let response = get_all(
            State(state),
            Extension(test_claims("admin@example.com", constants::ROLE_ADMIN)),
            Query(RegistryQuery {
                page: 1,
                page_size: 10,
                name: None,
                from: None,
                to: Some("31/12/2024".to_string()),
                status: None,
                is_descending: None,
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let result: OperationResult = serde_json::from_slice(&body).unwrap();
        assert!(!result.success);
        assert_eq!(result.message_http, constants::DATE_FORMAT_INVALID);
    }
}
