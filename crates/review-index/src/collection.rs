//! Collection catalogue operations.

use sqlx::SqlitePool;

use crate::error::{IndexError, Result};
use crate::models::CollectionInfo;

/// Create a collection if it does not exist yet.
///
/// Returns `true` if a new collection was created.
pub async fn ensure_collection(
    pool: &SqlitePool,
    name: &str,
    embedding_model: &str,
    dimension: usize,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO collections (name, embedding_model, dimension)
        VALUES (?, ?, ?)
        ON CONFLICT(name) DO NOTHING
        "#,
    )
    .bind(name)
    .bind(embedding_model)
    .bind(dimension as i64)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Get a collection by name.
pub async fn get_collection(pool: &SqlitePool, name: &str) -> Result<CollectionInfo> {
    sqlx::query_as::<_, CollectionInfo>(
        r#"
        SELECT name, embedding_model, dimension, created_at
        FROM collections
        WHERE name = ?
        "#,
    )
    .bind(name)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| IndexError::CollectionNotFound(name.to_string()))
}

/// List all collections, ordered by name.
pub async fn list_collections(pool: &SqlitePool) -> Result<Vec<CollectionInfo>> {
    let collections = sqlx::query_as::<_, CollectionInfo>(
        r#"
        SELECT name, embedding_model, dimension, created_at
        FROM collections
        ORDER BY name
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(collections)
}

/// Number of reviews stored in a collection.
pub async fn count_reviews(pool: &SqlitePool, name: &str) -> Result<usize> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM reviews WHERE collection = ?")
        .bind(name)
        .fetch_one(pool)
        .await?;

    Ok(count as usize)
}

/// Delete a collection and all of its reviews.
///
/// Returns `true` if the collection existed.
pub async fn delete_collection(pool: &SqlitePool, name: &str) -> Result<bool> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM reviews WHERE collection = ?")
        .bind(name)
        .execute(&mut *tx)
        .await?;
    let result = sqlx::query("DELETE FROM collections WHERE name = ?")
        .bind(name)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(result.rows_affected() > 0)
}
