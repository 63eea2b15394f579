use sea_orm::entity::prelude::*;

use crate::domain::allowance::Weighted;

/// A cart line. Name, producer and weight are copied from the product when
/// the line is written so the cart renders without joins.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "cart_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub producer_id: Uuid,
    pub product_name: String,
    pub unit_weight_in_kg: f64,
    pub quantity: i32,
    /// `unit_weight_in_kg * quantity`
    pub weight_in_kg: f64,
    pub price: i64,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    Users,
    #[sea_orm(
        belongs_to = "super::products::Entity",
        from = "Column::ProductId",
        to = "super::products::Column::Id"
    )]
    Products,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::products::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Weighted for Model {
    fn weight_in_kg(&self) -> f64 {
        self.weight_in_kg
    }
}
