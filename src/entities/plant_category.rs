// ABOUTME: Join entity for the many-to-many relation between plants and categories

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "planta_categorias")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub planta_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub categoria_id: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::plant::Entity",
        from = "Column::PlantaId",
        to = "super::plant::Column::Id"
    )]
    Plant,
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoriaId",
        to = "super::category::Column::Id"
    )]
    Category,
}

impl Related<super::plant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Plant.def()
    }
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
