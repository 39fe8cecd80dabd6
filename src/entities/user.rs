// ABOUTME: User entity holding identity, credential hash, role and reputation
// ABOUTME: Roles form a closed set; authorization is a membership check over it

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "usuarios")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub nome: String,
    #[sea_orm(unique)]
    pub email: String,
    #[serde(skip_serializing)]
    pub senha_hash: String,
    pub perfil: PerfilUsuario,
    pub avatar_url: Option<String>,
    pub reputacao: i32,
    pub created_at: i64,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PerfilUsuario {
    #[sea_orm(string_value = "USUARIO")]
    Usuario,
    #[sea_orm(string_value = "MODERADOR")]
    Moderador,
    #[sea_orm(string_value = "ADMIN")]
    Admin,
}

impl PerfilUsuario {
    pub fn can_moderate(&self) -> bool {
        matches!(self, PerfilUsuario::Moderador | PerfilUsuario::Admin)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::registration::Entity")]
    Registrations,
    #[sea_orm(has_many = "super::comment::Entity")]
    Comments,
    #[sea_orm(has_many = "super::rating::Entity")]
    Ratings,
}

impl Related<super::registration::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Registrations.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl Related<super::rating::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ratings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
