use sea_orm_migration::prelude::*;

pub(crate) fn default_table_statement() -> TableCreateStatement {
    TableCreateStatement::new()
        .if_not_exists()
        .col(ColumnDef::new(DefaultColumn::Id)
            .uuid()
            .primary_key()
            .default(Expr::cust("GEN_RANDOM_UUID()"))
            .take())
        .col(ColumnDef::new(DefaultColumn::CreatedAt)
            .timestamp_with_time_zone()
            .not_null()
            .default(Expr::current_timestamp())
            .take())
        .col(ColumnDef::new(DefaultColumn::UpdatedAt)
            .timestamp_with_time_zone()
            .not_null()
            .default(Expr::current_timestamp())
            .take())
        .take()
}

#[derive(DeriveIden)]
pub(crate) enum DefaultColumn {
    Id,
    CreatedAt,
    UpdatedAt,
}

/// Every tenant owned table carries an indexed `organization_id`
///
/// # Example
///
/// ```rs
/// manager
///     .create_table(default_organization_table_statement()
///         .table(Shift::Table)
///         .col(ColumnDef::new(Shift::Name)
///             .text()
///             .not_null())
///         .take()
///     ).await?;
/// create_organization_index(manager, Shift::Table).await?;
/// ```
pub(crate) fn default_organization_table_statement() -> TableCreateStatement {
    default_table_statement()
        .col(ColumnDef::new(OrganizationColumn::OrganizationId)
            .uuid()
            .not_null())
        .take()
}

pub(crate) async fn create_organization_index<T>(manager: &SchemaManager<'_>, table: T) -> Result<(), DbErr>
where
    T: Iden + 'static,
{
    let name = format!("idx_{}_organization_id", table.to_string());

    manager
        .create_index(IndexCreateStatement::new()
            .if_not_exists()
            .name(name)
            .table(table)
            .col(OrganizationColumn::OrganizationId)
            .take()
        ).await
}

/// References `to`'s id, `action` applies on delete
pub(crate) async fn create_reference<T, C, R>(manager: &SchemaManager<'_>, from: T, column: C, to: R, action: ForeignKeyAction) -> Result<(), DbErr>
where
    T: IntoIden,
    C: IntoIden,
    R: IntoIden,
{
    manager
        .create_foreign_key(ForeignKeyCreateStatement::new()
            .from(from, column)
            .to(to, DefaultColumn::Id)
            .on_delete(action)
            .on_update(ForeignKeyAction::Cascade)
            .take()
        ).await
}

#[derive(DeriveIden)]
pub(crate) enum OrganizationColumn {
    OrganizationId,
}
