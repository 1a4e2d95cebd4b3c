//! Relational backing for record stores: one row per collection holding the
//! serialized document and a version used for compare-and-swap.

use sea_orm::entity::prelude::*;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "record_document")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub document: String,
    pub version: i64,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match *self {}
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Fetch the stored document for a collection.
pub async fn find<C: ConnectionTrait>(db: &C, name: &str) -> Result<Option<Model>, ModelError> {
    Entity::find_by_id(name.to_string())
        .one(db)
        .await
        .map_err(|e| ModelError::Db(e.to_string()))
}

/// Write `document` only if the stored version still equals `expected`.
///
/// `expected == 0` means "no row yet". Returns the new version, or `None` when
/// another writer got there first.
pub async fn compare_and_swap<C: ConnectionTrait>(
    db: &C,
    name: &str,
    expected: i64,
    document: String,
) -> Result<Option<i64>, ModelError> {
    if name.trim().is_empty() {
        return Err(ModelError::Validation("collection name required".into()));
    }
    let next = expected + 1;
    if expected == 0 {
        let am = ActiveModel {
            name: Set(name.to_string()),
            document: Set(document),
            version: Set(next),
            updated_at: Set(Utc::now().into()),
        };
        return match am.insert(db).await {
            Ok(_) => Ok(Some(next)),
            // a concurrent first insert wins the primary key
            Err(e) => match find(db, name).await? {
                Some(_) => Ok(None),
                None => Err(ModelError::Db(e.to_string())),
            },
        };
    }

    let res = Entity::update_many()
        .col_expr(Column::Document, Expr::value(document))
        .col_expr(Column::Version, Expr::value(next))
        .col_expr(Column::UpdatedAt, Expr::value(DateTimeWithTimeZone::from(Utc::now())))
        .filter(Column::Name.eq(name))
        .filter(Column::Version.eq(expected))
        .exec(db)
        .await
        .map_err(|e| ModelError::Db(e.to_string()))?;
    Ok((res.rows_affected == 1).then_some(next))
}

/// Unconditionally replace the document (last writer wins).
pub async fn overwrite<C: ConnectionTrait>(db: &C, name: &str, document: String) -> Result<i64, ModelError> {
    loop {
        let current = find(db, name).await?.map(|m| m.version).unwrap_or(0);
        if let Some(v) = compare_and_swap(db, name, current, document.clone()).await? {
            return Ok(v);
        }
    }
}
