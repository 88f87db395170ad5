//! SeaORM repository implementations

use crate::contract::{AssetRow, Category, FieldDef, User, USERS_TABLE};
use crate::domain::repository::{AssetRepository, CatalogRepository, CatalogTx, UserRepository};
use crate::domain::schema::{CellValue, ColumnInfo, ColumnSpec, TableSpec};
use crate::domain::DuplicateKey;
use anyhow::{bail, Result};
use async_trait::async_trait;
use sea_orm::{
    prelude::Expr, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use std::sync::Arc;

use super::{entity, mapper, sql};

/// Keeps multi-row inserts under SQLite's bind parameter limit
const MAX_BIND_PARAMS: usize = 900;

fn insert_error(table: &str, err: DbErr) -> anyhow::Error {
    if sql::is_unique_violation(&err) {
        anyhow::Error::new(DuplicateKey {
            table: table.to_string(),
        })
    } else {
        err.into()
    }
}

async fn find_category<C: ConnectionTrait>(conn: &C, name: &str) -> Result<Option<Category>> {
    entity::Entity::find_by_id(name)
        .one(conn)
        .await?
        .map(Category::try_from)
        .transpose()
}

async fn columns_of<C: ConnectionTrait>(conn: &C, table: &str) -> Result<Option<Vec<ColumnInfo>>> {
    let stmt = sql::table_columns(conn.get_database_backend(), table)?;
    let rows = conn.query_all(stmt).await?;
    sql::column_infos(&rows)
}

async fn insert_rows_on<C: ConnectionTrait>(
    conn: &C,
    table: &str,
    columns: &[String],
    rows: &[Vec<CellValue>],
) -> Result<u64> {
    if rows.is_empty() {
        return Ok(0);
    }

    let chunk = (MAX_BIND_PARAMS / columns.len().max(1)).max(1);
    let mut inserted = 0;
    for batch in rows.chunks(chunk) {
        let stmt = sql::insert(conn.get_database_backend(), table, columns, batch)?;
        let result = conn
            .execute(stmt)
            .await
            .map_err(|e| insert_error(table, e))?;
        inserted += result.rows_affected();
    }
    Ok(inserted)
}

// ===== Catalog Repository =====

pub struct SeaOrmCatalogRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmCatalogRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CatalogRepository for SeaOrmCatalogRepository {
    async fn begin(&self) -> Result<Box<dyn CatalogTx>> {
        let txn = self.db.begin().await?;
        Ok(Box::new(SeaOrmCatalogTx { txn }))
    }

    async fn find(&self, name: &str) -> Result<Option<Category>> {
        find_category(&*self.db, name).await
    }

    async fn list_all(&self) -> Result<Vec<Category>> {
        entity::Entity::find()
            .order_by_asc(entity::Column::Tablename)
            .all(&*self.db)
            .await?
            .into_iter()
            .map(Category::try_from)
            .collect()
    }

    async fn columns(&self, table: &str) -> Result<Option<Vec<ColumnInfo>>> {
        columns_of(&*self.db, table).await
    }
}

/// Registry and DDL writes sharing one database transaction
pub struct SeaOrmCatalogTx {
    txn: DatabaseTransaction,
}

#[async_trait]
impl CatalogTx for SeaOrmCatalogTx {
    async fn find(&mut self, name: &str) -> Result<Option<Category>> {
        find_category(&self.txn, name).await
    }

    async fn insert(&mut self, category: &Category) -> Result<()> {
        let active: entity::ActiveModel = category.try_into()?;
        entity::Entity::insert(active)
            .exec_without_returning(&self.txn)
            .await?;
        Ok(())
    }

    async fn update_fields(&mut self, name: &str, fields: &[FieldDef]) -> Result<()> {
        let result = entity::Entity::update_many()
            .col_expr(
                entity::Column::Tablefields,
                Expr::value(mapper::fields_to_json(fields)?),
            )
            .filter(entity::Column::Tablename.eq(name))
            .exec(&self.txn)
            .await?;

        if result.rows_affected == 0 {
            bail!("no registry record for '{}'", name);
        }
        Ok(())
    }

    async fn delete(&mut self, name: &str) -> Result<bool> {
        let result = entity::Entity::delete_by_id(name).exec(&self.txn).await?;
        Ok(result.rows_affected > 0)
    }

    async fn columns(&mut self, table: &str) -> Result<Option<Vec<ColumnInfo>>> {
        columns_of(&self.txn, table).await
    }

    async fn create_table(&mut self, spec: &TableSpec) -> Result<()> {
        let stmt = sql::create_table(self.txn.get_database_backend(), spec)?;
        self.txn.execute(stmt).await?;
        Ok(())
    }

    async fn add_column(&mut self, table: &str, column: &ColumnSpec) -> Result<()> {
        let stmt = sql::add_column(self.txn.get_database_backend(), table, column);

        // Nested begin() is a savepoint
        let savepoint = self.txn.begin().await?;
        match savepoint.execute(stmt).await {
            Ok(_) => {
                savepoint.commit().await?;
                Ok(())
            }
            Err(e) => {
                savepoint.rollback().await?;
                Err(e.into())
            }
        }
    }

    async fn drop_column(&mut self, table: &str, column: &str) -> Result<()> {
        let stmt = sql::drop_column(self.txn.get_database_backend(), table, column);
        self.txn.execute(stmt).await?;
        Ok(())
    }

    async fn drop_table(&mut self, table: &str) -> Result<()> {
        let stmt = sql::drop_table(self.txn.get_database_backend(), table);
        self.txn.execute(stmt).await?;
        Ok(())
    }

    async fn insert_rows(
        &mut self,
        table: &str,
        columns: &[String],
        rows: &[Vec<CellValue>],
    ) -> Result<u64> {
        insert_rows_on(&self.txn, table, columns, rows).await
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.txn.commit().await?;
        Ok(())
    }
}

// ===== Asset Repository =====

pub struct SeaOrmAssetRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmAssetRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AssetRepository for SeaOrmAssetRepository {
    async fn insert(&self, table: &str, values: &[(String, CellValue)]) -> Result<()> {
        let (columns, row): (Vec<String>, Vec<CellValue>) = values.iter().cloned().unzip();
        insert_rows_on(&*self.db, table, &columns, &[row]).await?;
        Ok(())
    }

    async fn find_by(
        &self,
        table: &str,
        columns: &[ColumnInfo],
        key_column: &str,
        identifier: &CellValue,
    ) -> Result<Vec<AssetRow>> {
        let stmt = sql::select(
            self.db.get_database_backend(),
            table,
            columns,
            Some((key_column, identifier)),
        );
        let rows = self.db.query_all(stmt).await?;
        Ok(rows.iter().map(|r| sql::decode_row(r, columns)).collect())
    }

    async fn update_by_keys(
        &self,
        table: &str,
        keys: &[(String, CellValue)],
        changes: &[(String, CellValue)],
    ) -> Result<u64> {
        if keys.is_empty() {
            bail!("update of '{}' has no key columns to scope by", table);
        }

        let txn = self.db.begin().await?;
        let backend = txn.get_database_backend();

        let mut affected = 0;
        for (column, value) in changes {
            let stmt = sql::update_by_keys(backend, table, keys, column, value);
            affected = txn.execute(stmt).await?.rows_affected();
        }

        txn.commit().await?;
        Ok(affected)
    }

    async fn delete_by(&self, table: &str, key_column: &str, identifier: &CellValue) -> Result<u64> {
        let stmt = sql::delete(self.db.get_database_backend(), table, key_column, identifier);
        Ok(self.db.execute(stmt).await?.rows_affected())
    }

    async fn fetch_all(&self, table: &str, columns: &[ColumnInfo]) -> Result<Vec<AssetRow>> {
        let stmt = sql::select(self.db.get_database_backend(), table, columns, None);
        let rows = self.db.query_all(stmt).await?;
        Ok(rows.iter().map(|r| sql::decode_row(r, columns)).collect())
    }

    async fn count(&self, table: &str, filter: Option<(&str, CellValue)>) -> Result<u64> {
        let stmt = sql::count(
            self.db.get_database_backend(),
            table,
            filter.as_ref().map(|(c, v)| (*c, v)),
        );
        sql::decode_count(self.db.query_one(stmt).await?)
    }
}

// ===== User Repository =====

pub struct SeaOrmUserRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmUserRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for SeaOrmUserRepository {
    async fn create(&self, user: &User) -> Result<()> {
        let active: entity::user::ActiveModel = user.into();
        entity::user::Entity::insert(active)
            .exec_without_returning(&*self.db)
            .await
            .map_err(|e| insert_error(USERS_TABLE, e))?;
        Ok(())
    }

    async fn find_by_mail(&self, mail: &str) -> Result<Option<User>> {
        let result = entity::user::Entity::find()
            .filter(entity::user::Column::Mail.eq(mail))
            .one(&*self.db)
            .await?;

        Ok(result.map(|e| e.into()))
    }

    async fn count(&self) -> Result<u64> {
        Ok(entity::user::Entity::find().count(&*self.db).await?)
    }
}
