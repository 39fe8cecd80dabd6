// ABOUTME: Request and response types for the API, keeping the original Portuguese wire names
// ABOUTME: Partial-update payloads use explicit optional fields, never free-form maps

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::entities::{
    category, location,
    registration::StatusRegistro,
    user::PerfilUsuario,
};

/// Distinguishes an absent field from an explicit null in partial updates.
/// Absent deserializes to `None` (leave untouched), `null` to `Some(None)` (clear).
pub fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

// Auth types

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub nome: Option<String>,
    pub email: Option<String>,
    pub senha: Option<String>,
    pub confirmar_senha: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub senha: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: Uuid,
    pub nome: String,
    pub email: String,
    pub perfil: PerfilUsuario,
    pub avatar_url: Option<String>,
    pub data_cadastro: i64,
    pub reputacao: i32,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserView,
    pub token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub nome: String,
    pub email: String,
    pub perfil: PerfilUsuario,
    pub avatar_url: Option<String>,
    pub data_cadastro: i64,
    pub reputacao: i32,
    pub total_plantas: u64,
    pub total_comentarios: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateFields {
    pub nome: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub avatar_url: Option<Option<String>>,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: String,
    pub nova_senha: Option<String>,
}

// Plant types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsuarioResumo {
    pub id: String,
    pub nome: String,
}

/// Denormalized plant projection returned by every read path.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantView {
    pub id: Uuid,
    pub nome_popular: String,
    pub nome_cientifico: Option<String>,
    pub descricao: String,
    pub comestivel: bool,
    pub medicinal: bool,
    pub nativa: bool,
    pub usos: Option<String>,
    pub cuidados: Option<String>,
    pub imagem_url: Option<String>,
    pub categorias: Vec<category::Model>,
    pub localizacoes: Vec<location::Model>,
    pub usuario_registro: UsuarioResumo,
    pub data_registro: i64,
    pub status: StatusRegistro,
    pub avaliacao_media: f64,
    pub total_registros: u64,
    pub total_avaliacoes: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

/// Search filters as resolved from the query string.
#[derive(Debug, Default, Clone)]
pub struct FiltroPlantas {
    pub search: Option<String>,
    pub categoria: Vec<String>,
    pub comestivel: Option<bool>,
    pub medicinal: Option<bool>,
    pub nativa: Option<bool>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub raio_km: Option<f64>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub search: Option<String>,
    /// Comma-separated category names.
    pub categoria: Option<String>,
    pub comestivel: Option<bool>,
    pub medicinal: Option<bool>,
    pub nativa: Option<bool>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub raio_km: Option<f64>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl From<SearchQuery> for FiltroPlantas {
    fn from(q: SearchQuery) -> Self {
        FiltroPlantas {
            search: q.search,
            categoria: q
                .categoria
                .map(|c| {
                    c.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
            comestivel: q.comestivel,
            medicinal: q.medicinal,
            nativa: q.nativa,
            latitude: q.latitude,
            longitude: q.longitude,
            raio_km: q.raio_km,
            page: q.page,
            limit: q.limit,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyQuery {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub raio_km: Option<f64>,
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlantaRequest {
    pub nome_popular: Option<String>,
    pub nome_cientifico: Option<String>,
    pub descricao: Option<String>,
    #[serde(default)]
    pub categoria: Vec<String>,
    pub comestivel: Option<bool>,
    pub medicinal: Option<bool>,
    pub nativa: Option<bool>,
    pub usos: Option<String>,
    pub cuidados: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub endereco: Option<String>,
    pub descricao_local: Option<String>,
    pub regiao: Option<String>,
    pub observacoes: Option<String>,
}

/// Partial plant update; absent fields stay untouched, explicit nulls clear
/// the nullable columns.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantUpdateFields {
    pub nome_popular: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub nome_cientifico: Option<Option<String>>,
    pub descricao: Option<String>,
    pub comestivel: Option<bool>,
    pub medicinal: Option<bool>,
    pub nativa: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub usos: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub cuidados: Option<Option<String>>,
}

#[derive(Debug, Deserialize)]
pub struct RateRequest {
    pub avaliacao: Option<i32>,
    pub comentario: Option<String>,
}

// Moderation types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantaResumo {
    pub id: Uuid,
    pub nome_popular: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRegistrationView {
    pub id: Uuid,
    pub status: StatusRegistro,
    pub observacoes: Option<String>,
    pub data_registro: i64,
    pub planta: PlantaResumo,
    pub usuario: UsuarioResumo,
    pub localizacao: location::Model,
}

#[derive(Debug, Default, Deserialize)]
pub struct RejectRequest {
    pub motivo: Option<String>,
}

/// Stored upload metadata handed to the registration transaction.
#[derive(Debug, Clone)]
pub struct StoredUpload {
    pub url: String,
    pub nome_arquivo: String,
    pub content_type: String,
    pub tamanho: i64,
}
