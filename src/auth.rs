// ABOUTME: Credential hashing, JWT issuance/verification and the bearer-token extractor
// ABOUTME: Also hosts the account handlers: register, login, password reset, profile

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use async_trait::async_trait;
use axum::{
    Json,
    extract::{FromRequestParts, State},
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::AppState;
use crate::entities::user::{self, PerfilUsuario};
use crate::error::{AppError, Result};
use crate::types::{
    AuthResponse, ForgotPasswordRequest, LoginRequest, ProfileUpdateFields, RegisterRequest,
    ResetPasswordRequest, UserProfile, UserView,
};

const RESET_TOKEN_TTL_SECS: i64 = 3600;
const RESET_PURPOSE: &str = "password_reset";

/// Session token claims embedding identity and role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub perfil: PerfilUsuario,
    pub iat: i64,
    pub exp: i64,
}

/// Short-lived single-purpose claims for password reset. The distinct shape
/// keeps session and reset tokens from being interchangeable.
#[derive(Debug, Serialize, Deserialize)]
struct ResetClaims {
    sub: Uuid,
    email: String,
    purpose: String,
    iat: i64,
    exp: i64,
}

#[derive(Clone)]
pub struct AuthState {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expires_hours: i64,
}

impl AuthState {
    pub fn new(secret: &str, expires_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            expires_hours,
        }
    }

    pub fn issue_session_token(&self, usuario: &user::Model) -> Result<String> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: usuario.id,
            email: usuario.email.clone(),
            perfil: usuario.perfil,
            iat: now,
            exp: now + self.expires_hours * 3600,
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Falha ao gerar token: {e}")))
    }

    /// Fails closed: any decoding or signature problem is an invalid token.
    pub fn verify_session_token(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(|_| AppError::Unauthorized("Token inválido ou expirado".to_string()))
    }

    pub fn issue_reset_token(&self, usuario: &user::Model) -> Result<String> {
        let now = chrono::Utc::now().timestamp();
        let claims = ResetClaims {
            sub: usuario.id,
            email: usuario.email.clone(),
            purpose: RESET_PURPOSE.to_string(),
            iat: now,
            exp: now + RESET_TOKEN_TTL_SECS,
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Falha ao gerar token: {e}")))
    }

    fn verify_reset_token(&self, token: &str) -> Result<Uuid> {
        let claims = decode::<ResetClaims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(|_| AppError::Unauthorized("Token inválido ou expirado".to_string()))?;
        if claims.purpose != RESET_PURPOSE {
            return Err(AppError::Unauthorized("Token inválido ou expirado".to_string()));
        }
        Ok(claims.sub)
    }
}

pub fn hash_password(senha: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(senha.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Falha ao gerar hash de senha: {e}")))
}

pub fn verify_password(senha: &str, senha_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(senha_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(senha.as_bytes(), &parsed)
        .is_ok()
}

/// Authenticated caller, extracted from the `Authorization: Bearer` header.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub perfil: PerfilUsuario,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Unauthorized("Token de autenticação não fornecido".to_string())
            })?;

        let token = header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Unauthorized("Token de autenticação não fornecido".to_string())
        })?;

        let claims = state.auth.verify_session_token(token)?;
        Ok(AuthUser {
            user_id: claims.sub,
            perfil: claims.perfil,
        })
    }
}

impl AuthUser {
    pub fn require_moderator(&self) -> Result<()> {
        if self.perfil.can_moderate() {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Acesso negado. Permissão insuficiente.".to_string(),
            ))
        }
    }
}

fn user_view(usuario: user::Model) -> UserView {
    UserView {
        id: usuario.id,
        nome: usuario.nome,
        email: usuario.email,
        perfil: usuario.perfil,
        avatar_url: usuario.avatar_url,
        data_cadastro: usuario.created_at,
        reputacao: usuario.reputacao,
    }
}

fn validate_register(req: &RegisterRequest) -> Result<(String, String, String)> {
    let mut errors = Vec::new();

    let nome = match req.nome.as_deref().map(str::trim) {
        Some(n) if n.len() >= 3 => n.to_string(),
        Some(n) if !n.is_empty() => {
            errors.push("Nome deve ter no mínimo 3 caracteres".to_string());
            n.to_string()
        }
        _ => {
            errors.push("Nome é obrigatório".to_string());
            String::new()
        }
    };

    let email = match req.email.as_deref().map(str::trim) {
        Some(e) if e.contains('@') && !e.starts_with('@') && !e.ends_with('@') => {
            e.to_lowercase()
        }
        Some(e) if !e.is_empty() => {
            errors.push("Email inválido".to_string());
            e.to_string()
        }
        _ => {
            errors.push("Email é obrigatório".to_string());
            String::new()
        }
    };

    let senha = match req.senha.as_deref() {
        Some(s) if s.len() >= 6 => s.to_string(),
        Some(s) if !s.is_empty() => {
            errors.push("Senha deve ter no mínimo 6 caracteres".to_string());
            s.to_string()
        }
        _ => {
            errors.push("Senha é obrigatória".to_string());
            String::new()
        }
    };

    if let Some(confirmar) = req.confirmar_senha.as_deref() {
        if confirmar != senha {
            errors.push("As senhas não coincidem".to_string());
        }
    }

    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }
    Ok((nome, email, senha))
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let (nome, email, senha) = validate_register(&req)?;

    if state.storage.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("Email já está em uso".to_string()));
    }

    let senha_hash = hash_password(&senha)?;
    let usuario = state.storage.create_user(&nome, &email, &senha_hash).await?;
    let token = state.auth.issue_session_token(&usuario)?;

    tracing::info!(usuario = %usuario.id, "novo usuário registrado");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: user_view(usuario),
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let email = req
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::Validation(vec!["Email é obrigatório".to_string()]))?
        .to_lowercase();
    let senha = req
        .senha
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Validation(vec!["Senha é obrigatória".to_string()]))?;

    // Same message for a missing user and a wrong password.
    let usuario = state
        .storage
        .find_user_by_email(&email)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Credenciais inválidas".to_string()))?;

    if !verify_password(senha, &usuario.senha_hash) {
        return Err(AppError::Unauthorized("Credenciais inválidas".to_string()));
    }

    let token = state.auth.issue_session_token(&usuario)?;
    Ok(Json(AuthResponse {
        user: user_view(usuario),
        token,
    }))
}

/// Always answers 200 so the endpoint never reveals whether an email exists.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<Json<Value>> {
    if let Some(usuario) = state.storage.find_user_by_email(req.email.trim()).await? {
        let reset_token = state.auth.issue_reset_token(&usuario)?;
        // Email delivery is out of scope; the token is logged for operators.
        tracing::info!(usuario = %usuario.id, token = %reset_token, "token de redefinição emitido");
    }

    Ok(Json(json!({
        "message": "Se o email existir, um link de redefinição será enviado"
    })))
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<Value>> {
    let nova_senha = match req.nova_senha.as_deref() {
        Some(s) if s.len() >= 6 => s,
        _ => {
            return Err(AppError::Validation(vec![
                "Senha deve ter no mínimo 6 caracteres".to_string(),
            ]));
        }
    };

    let user_id = state.auth.verify_reset_token(&req.token)?;
    let senha_hash = hash_password(nova_senha)?;
    state.storage.update_password(user_id, &senha_hash).await?;

    Ok(Json(json!({ "message": "Senha redefinida com sucesso" })))
}

pub async fn get_profile(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserProfile>> {
    let usuario = state.storage.get_user(auth.user_id).await?;
    let (total_plantas, total_comentarios) = state.storage.profile_counts(auth.user_id).await?;

    Ok(Json(UserProfile {
        id: usuario.id,
        nome: usuario.nome,
        email: usuario.email,
        perfil: usuario.perfil,
        avatar_url: usuario.avatar_url,
        data_cadastro: usuario.created_at,
        reputacao: usuario.reputacao,
        total_plantas,
        total_comentarios,
    }))
}

pub async fn update_profile(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(fields): Json<ProfileUpdateFields>,
) -> Result<Json<UserProfile>> {
    if let Some(nome) = fields.nome.as_deref() {
        if nome.trim().len() < 3 {
            return Err(AppError::Validation(vec![
                "Nome deve ter no mínimo 3 caracteres".to_string(),
            ]));
        }
    }

    let usuario = state.storage.update_profile(auth.user_id, fields).await?;
    let (total_plantas, total_comentarios) = state.storage.profile_counts(auth.user_id).await?;

    Ok(Json(UserProfile {
        id: usuario.id,
        nome: usuario.nome,
        email: usuario.email,
        perfil: usuario.perfil,
        avatar_url: usuario.avatar_url,
        data_cadastro: usuario.created_at,
        reputacao: usuario.reputacao,
        total_plantas,
        total_comentarios,
    }))
}
