// ABOUTME: Registration entity, one user's report of one plant at one location
// ABOUTME: Carries the moderation status; transitions only go through the moderation module

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "registros")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub usuario_id: Uuid,
    pub planta_id: Uuid,
    pub localizacao_id: Uuid,
    pub status: StatusRegistro,
    pub observacoes: Option<String>,
    pub motivo_rejeicao: Option<String>,
    pub created_at: i64,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusRegistro {
    #[sea_orm(string_value = "PENDENTE")]
    Pendente,
    #[sea_orm(string_value = "EM_ANALISE")]
    EmAnalise,
    #[sea_orm(string_value = "APROVADO")]
    Aprovado,
    #[sea_orm(string_value = "REJEITADO")]
    Rejeitado,
}

impl StatusRegistro {
    /// APROVADO and REJEITADO are terminal; nothing transitions out of them.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StatusRegistro::Aprovado | StatusRegistro::Rejeitado)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UsuarioId",
        to = "super::user::Column::Id"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::plant::Entity",
        from = "Column::PlantaId",
        to = "super::plant::Column::Id"
    )]
    Plant,
    #[sea_orm(
        belongs_to = "super::location::Entity",
        from = "Column::LocalizacaoId",
        to = "super::location::Column::Id"
    )]
    Location,
    #[sea_orm(has_many = "super::image::Entity")]
    Images,
    #[sea_orm(has_many = "super::comment::Entity")]
    Comments,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::plant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Plant.def()
    }
}

impl Related<super::location::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Location.def()
    }
}

impl Related<super::image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Images.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
