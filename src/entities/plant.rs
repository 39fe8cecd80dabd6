// ABOUTME: Plant entity for the species/common-name catalog record
// ABOUTME: Independent of any specific sighting; registrations link it to locations

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "plantas")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub nome_popular: String,
    pub nome_cientifico: Option<String>,
    pub descricao: String,
    pub comestivel: bool,
    pub medicinal: bool,
    pub nativa: bool,
    pub usos: Option<String>,
    pub cuidados: Option<String>,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::registration::Entity")]
    Registrations,
    #[sea_orm(has_many = "super::plant_category::Entity")]
    PlantCategories,
    #[sea_orm(has_many = "super::rating::Entity")]
    Ratings,
}

impl Related<super::registration::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Registrations.def()
    }
}

impl Related<super::rating::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ratings.def()
    }
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        super::plant_category::Relation::Category.def()
    }
    fn via() -> Option<RelationDef> {
        Some(super::plant_category::Relation::Plant.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
