//! SeaORM entities for the internal tables
//!
//! Category tables are created at runtime and have no entity; they are
//! reached through dynamic statements in `repositories`.

use sea_orm::entity::prelude::*;

/// Schema registry table entity
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "category_info")]
pub struct Model {
    /// Canonical category name, equal to the physical table name
    #[sea_orm(primary_key, auto_increment = false)]
    pub tablename: String,

    /// Ordered field list as `[{"name": .., "type": ..}]`
    pub tablefields: Json,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Registered users
pub mod user {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "users")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub username: String,

        #[sea_orm(unique)]
        pub mail: String,

        pub role: String,

        /// Argon2 PHC string
        pub hashed_password: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}
