// ABOUTME: HTTP handlers for plant search, registration, rating and the moderation queue
// ABOUTME: Registration is multipart: a `dados` JSON field plus up to five image files

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
};
use serde_json::{Value, json};
use std::path::Path as FsPath;
use uuid::Uuid;

use crate::AppState;
use crate::auth::AuthUser;
use crate::entities::registration::StatusRegistro;
use crate::error::{AppError, Result};
use crate::moderation::DEFAULT_REJECTION_REASON;
use crate::types::{
    CreatePlantaRequest, NearbyQuery, PaginatedResponse, PlantUpdateFields, PlantView,
    RateRequest, RejectRequest, SearchQuery, StoredUpload,
};

pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<PaginatedResponse<PlantView>>> {
    let result = state.storage.search_plants(query.into()).await?;
    Ok(Json(result))
}

pub async fn nearby(
    State(state): State<AppState>,
    Query(query): Query<NearbyQuery>,
) -> Result<Json<Vec<PlantView>>> {
    let (Some(latitude), Some(longitude)) = (query.latitude, query.longitude) else {
        return Err(AppError::Validation(vec![
            "Latitude e longitude são obrigatórias".to_string(),
        ]));
    };

    let result = state
        .storage
        .search_nearby(latitude, longitude, query.raio_km, query.limit)
        .await?;
    Ok(Json(result))
}

pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PlantView>> {
    let planta = state.storage.get_plant(id).await?;
    Ok(Json(planta))
}

/// Stores each accepted upload under `{upload_dir}/plantas` and returns the
/// metadata rows to be recorded inside the registration transaction.
async fn store_uploads(
    state: &AppState,
    multipart: &mut Multipart,
) -> Result<(CreatePlantaRequest, Vec<StoredUpload>)> {
    let mut dados: Option<CreatePlantaRequest> = None;
    let mut uploads = Vec::new();

    let plantas_dir = FsPath::new(&state.config.upload_dir).join("plantas");
    tokio::fs::create_dir_all(&plantas_dir).await?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(vec![format!("Upload inválido: {e}")]))?
    {
        match field.name() {
            Some("dados") => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(vec![format!("Upload inválido: {e}")]))?;
                dados = Some(serde_json::from_str(&raw).map_err(|e| {
                    AppError::Validation(vec![format!("Campo dados inválido: {e}")])
                })?);
            }
            Some("images") => {
                if uploads.len() >= state.config.max_files_per_registration {
                    return Err(AppError::Validation(vec![format!(
                        "No máximo {} imagens por registro",
                        state.config.max_files_per_registration
                    )]));
                }

                let nome_arquivo = field.file_name().unwrap_or("imagem").to_string();
                let content_type = field.content_type().unwrap_or("").to_string();
                if !state.config.allowed_file_types.contains(&content_type) {
                    return Err(AppError::Validation(vec![
                        "Tipo de arquivo não suportado. Apenas imagens JPEG, PNG e GIF são permitidas."
                            .to_string(),
                    ]));
                }

                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(vec![format!("Upload inválido: {e}")]))?;
                if bytes.len() > state.config.max_file_size {
                    return Err(AppError::Validation(vec![
                        "Arquivo excede o tamanho máximo permitido".to_string(),
                    ]));
                }

                let ext = FsPath::new(&nome_arquivo)
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| format!(".{e}"))
                    .unwrap_or_default();
                let filename = format!(
                    "planta-{}-{}{}",
                    chrono::Utc::now().timestamp_millis(),
                    rand::random::<u32>(),
                    ext
                );

                tokio::fs::write(plantas_dir.join(&filename), &bytes).await?;

                uploads.push(StoredUpload {
                    url: format!("/uploads/plantas/{filename}"),
                    nome_arquivo,
                    content_type,
                    tamanho: bytes.len() as i64,
                });
            }
            _ => {}
        }
    }

    let dados = dados.ok_or_else(|| {
        AppError::Validation(vec!["Campo dados é obrigatório".to_string()])
    })?;
    Ok((dados, uploads))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<PlantView>)> {
    let (dados, uploads) = store_uploads(&state, &mut multipart).await?;

    let planta = state
        .storage
        .register_plant(auth.user_id, dados, uploads)
        .await?;

    tracing::info!(planta = %planta.id, usuario = %auth.user_id, "planta registrada");
    Ok((StatusCode::CREATED, Json(planta)))
}

pub async fn update(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(fields): Json<PlantUpdateFields>,
) -> Result<Json<PlantView>> {
    let planta = state.storage.update_plant(id, fields).await?;
    Ok(Json(planta))
}

pub async fn delete(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state.storage.delete_plant(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn rate(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<RateRequest>,
) -> Result<Json<Value>> {
    let valor = match req.avaliacao {
        Some(v) if (1..=5).contains(&v) => v,
        _ => {
            return Err(AppError::Validation(vec![
                "Avaliação deve ser um número entre 1 e 5".to_string(),
            ]));
        }
    };

    state
        .storage
        .rate_plant(auth.user_id, id, valor, req.comentario)
        .await?;
    Ok(Json(json!({ "message": "Avaliação registrada com sucesso" })))
}

// Moderation routes; all require MODERADOR or ADMIN.

pub async fn list_pending(auth: AuthUser, State(state): State<AppState>) -> Result<Json<Value>> {
    auth.require_moderator()?;
    let pendentes = state.storage.list_pending().await?;
    Ok(Json(json!(pendentes)))
}

pub async fn approve(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(registro_id): Path<Uuid>,
) -> Result<Json<Value>> {
    auth.require_moderator()?;
    state
        .storage
        .set_registration_status(registro_id, StatusRegistro::Aprovado, auth.user_id, None)
        .await?;
    Ok(Json(json!({ "message": "Registro aprovado com sucesso" })))
}

pub async fn reject(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(registro_id): Path<Uuid>,
    body: Option<Json<RejectRequest>>,
) -> Result<Json<Value>> {
    auth.require_moderator()?;
    let motivo = body.and_then(|Json(req)| req.motivo);

    let registro = state
        .storage
        .set_registration_status(
            registro_id,
            StatusRegistro::Rejeitado,
            auth.user_id,
            motivo,
        )
        .await?;

    Ok(Json(json!({
        "message": "Registro rejeitado",
        "motivo": registro
            .motivo_rejeicao
            .unwrap_or_else(|| DEFAULT_REJECTION_REASON.to_string()),
    })))
}

pub async fn mark_in_review(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(registro_id): Path<Uuid>,
) -> Result<Json<Value>> {
    auth.require_moderator()?;
    state
        .storage
        .set_registration_status(registro_id, StatusRegistro::EmAnalise, auth.user_id, None)
        .await?;
    Ok(Json(json!({ "message": "Registro colocado em análise" })))
}
