// ABOUTME: Category entity, a named tag drawn from a fixed type enumeration
// ABOUTME: Names are unique so concurrent upserts cannot create duplicates

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "categorias")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub nome: String,
    pub descricao: Option<String>,
    pub tipo: TipoCategoria,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TipoCategoria {
    #[sea_orm(string_value = "COMESTIVEL")]
    Comestivel,
    #[sea_orm(string_value = "MEDICINAL")]
    Medicinal,
    #[sea_orm(string_value = "NATIVA")]
    Nativa,
    #[sea_orm(string_value = "EXOTICA")]
    Exotica,
    #[sea_orm(string_value = "URBANA")]
    Urbana,
    #[sea_orm(string_value = "ORNAMENTAL")]
    Ornamental,
}

impl TipoCategoria {
    /// Derives the category type from its case-sensitive name.
    pub fn from_name(nome: &str) -> Option<Self> {
        match nome {
            "COMESTIVEL" => Some(Self::Comestivel),
            "MEDICINAL" => Some(Self::Medicinal),
            "NATIVA" => Some(Self::Nativa),
            "EXOTICA" => Some(Self::Exotica),
            "URBANA" => Some(Self::Urbana),
            "ORNAMENTAL" => Some(Self::Ornamental),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::plant_category::Entity")]
    PlantCategories,
}

impl Related<super::plant::Entity> for Entity {
    fn to() -> RelationDef {
        super::plant_category::Relation::Plant.def()
    }
    fn via() -> Option<RelationDef> {
        Some(super::plant_category::Relation::Category.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
