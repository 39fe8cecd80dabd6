// ABOUTME: Database storage layer wrapping the SeaORM connection
// ABOUTME: Owns schema migration on startup and the user account operations

use sea_orm::{
    ActiveModelTrait, ColumnTrait, Database, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, Set,
};
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

use crate::entities::{comment, registration, user};
use crate::error::{AppError, Result};
use crate::migration::Migrator;
use crate::types::ProfileUpdateFields;

pub struct Storage {
    pub db: DatabaseConnection,
}

impl Storage {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let db = Database::connect(database_url).await?;
        Migrator::up(&db, None).await?;
        Ok(Self { db })
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<user::Model>> {
        Ok(user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await?)
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<user::Model> {
        user::Entity::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Usuário não encontrado".to_string()))
    }

    pub async fn create_user(
        &self,
        nome: &str,
        email: &str,
        senha_hash: &str,
    ) -> Result<user::Model> {
        let model = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            nome: Set(nome.to_string()),
            email: Set(email.to_string()),
            senha_hash: Set(senha_hash.to_string()),
            perfil: Set(user::PerfilUsuario::Usuario),
            avatar_url: Set(None),
            reputacao: Set(0),
            created_at: Set(chrono::Utc::now().timestamp_millis()),
        };
        Ok(model.insert(&self.db).await?)
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        fields: ProfileUpdateFields,
    ) -> Result<user::Model> {
        let existing = self.get_user(user_id).await?;
        let mut active: user::ActiveModel = existing.into();

        if let Some(nome) = fields.nome {
            active.nome = Set(nome);
        }
        if let Some(avatar_url) = fields.avatar_url {
            active.avatar_url = Set(avatar_url);
        }

        Ok(active.update(&self.db).await?)
    }

    pub async fn update_password(&self, user_id: Uuid, senha_hash: &str) -> Result<()> {
        let existing = self.get_user(user_id).await?;
        let mut active: user::ActiveModel = existing.into();
        active.senha_hash = Set(senha_hash.to_string());
        active.update(&self.db).await?;
        Ok(())
    }

    /// Registration and comment totals shown on the profile page.
    pub async fn profile_counts(&self, user_id: Uuid) -> Result<(u64, u64)> {
        let total_plantas = registration::Entity::find()
            .filter(registration::Column::UsuarioId.eq(user_id))
            .count(&self.db)
            .await?;
        let total_comentarios = comment::Entity::find()
            .filter(comment::Column::UsuarioId.eq(user_id))
            .count(&self.db)
            .await?;
        Ok((total_plantas, total_comentarios))
    }
}
