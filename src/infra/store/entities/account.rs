//! Account database entity for SeaORM.

use sea_orm::entity::prelude::*;

use crate::domain::{LoginInfo, UserAccount};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: String,
    pub active: bool,
    pub role: Option<String>,
    pub must_change_password: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::login_info::Entity")]
    LoginInfo,
}

impl Related<super::login_info::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LoginInfo.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Convert to the domain entity, attaching its login-info records.
    pub fn into_account(self, login_infos: Vec<LoginInfo>) -> UserAccount {
        UserAccount {
            id: self.id,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            active: self.active,
            role: self.role,
            must_change_password: self.must_change_password,
            login_infos,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
