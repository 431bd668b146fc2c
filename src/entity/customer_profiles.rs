use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "customer_profiles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub account_id: Uuid,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub date_of_birth: Option<Date>,
    pub preferred_payment_method: Option<String>,
    pub total_orders: i32,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub total_spent: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_delete = "Cascade"
    )]
    Accounts,
    #[sea_orm(has_many = "super::processed_orders::Entity")]
    ProcessedOrders,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl Related<super::processed_orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProcessedOrders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
