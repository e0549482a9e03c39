//! Migration: Create account, login-info and role tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .col(ColumnDef::new(Accounts::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Accounts::Username)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Accounts::Email)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Accounts::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Accounts::Active).boolean().not_null())
                    .col(ColumnDef::new(Accounts::Role).string().null())
                    .col(
                        ColumnDef::new(Accounts::MustChangePassword)
                            .boolean()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Accounts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Accounts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LoginInfos::Table)
                    .col(
                        ColumnDef::new(LoginInfos::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LoginInfos::AccountId).uuid().not_null())
                    .col(ColumnDef::new(LoginInfos::Provider).string().not_null())
                    .col(
                        ColumnDef::new(LoginInfos::ProviderUserKey)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LoginInfos::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_login_infos_account")
                            .from(LoginInfos::Table, LoginInfos::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // one record per provider and key
        manager
            .create_index(
                Index::create()
                    .name("idx_login_infos_provider_key")
                    .table(LoginInfos::Table)
                    .col(LoginInfos::Provider)
                    .col(LoginInfos::ProviderUserKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Roles::Table)
                    .col(ColumnDef::new(Roles::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Roles::Name)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Roles::Table).to_owned())
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_login_infos_provider_key")
                    .table(LoginInfos::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(LoginInfos::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Accounts {
    Table,
    Id,
    Username,
    Email,
    PasswordHash,
    Active,
    Role,
    MustChangePassword,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum LoginInfos {
    Table,
    Id,
    AccountId,
    Provider,
    ProviderUserKey,
    CreatedAt,
}

#[derive(Iden)]
enum Roles {
    Table,
    Id,
    Name,
}
