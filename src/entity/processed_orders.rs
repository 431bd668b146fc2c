use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "processed_orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub order_id: Uuid,
    pub customer_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub amount: Decimal,
    pub processed_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::customer_profiles::Entity",
        from = "Column::CustomerId",
        to = "super::customer_profiles::Column::AccountId",
        on_delete = "Cascade"
    )]
    CustomerProfiles,
}

impl Related<super::customer_profiles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CustomerProfiles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
