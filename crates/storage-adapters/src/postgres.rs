//! # PgStore
//!
//! Postgres implementation of the repository ports.
//!
//! # Developer Note
//! Product deletion runs inside one transaction (reviews, then the product),
//! so there is no window in which a crash leaves orphaned reviews.

use async_trait::async_trait;
use domains::{
    DomainError, Product, ProductId, ProductRepository, Rating, Result, Review, ReviewId,
    ReviewRepository, User, UserId, UserRepository,
};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::{error, info};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    /// Applies the embedded migrations.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("database migrations applied");
        Ok(())
    }

    /// Removes every review and product. Used by the seed tool.
    pub async fn clear_catalog(&self) -> anyhow::Result<u64> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM reviews").execute(&mut *tx).await?;
        let removed = sqlx::query("DELETE FROM products")
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;
        Ok(removed)
    }
}

/// Logs the driver error and hides its detail from callers.
fn db_err(err: sqlx::Error) -> DomainError {
    error!(error = %err, "database failure");
    DomainError::internal("database unavailable")
}

fn user_from_row(row: &PgRow) -> sqlx::Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        created_at: row.try_get("created_at")?,
    })
}

fn product_from_row(row: &PgRow) -> sqlx::Result<Product> {
    Ok(Product {
        id: row.try_get("id")?,
        owner_id: row.try_get("owner_id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        image_path: row.try_get("image_path")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn review_from_row(row: &PgRow) -> sqlx::Result<Review> {
    let rating: i16 = row.try_get("rating")?;
    Ok(Review {
        id: row.try_get("id")?,
        product_id: row.try_get("product_id")?,
        user_id: row.try_get("user_id")?,
        rating: Rating::new(i64::from(rating)).map_err(|e| sqlx::Error::Decode(e.into()))?,
        text: row.try_get("text")?,
        author_name: row.try_get("author_name")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

const PRODUCT_COLUMNS: &str = "id, owner_id, name, description, image_path, created_at, updated_at";
const REVIEW_COLUMNS: &str =
    "id, product_id, user_id, rating, text, author_name, created_at, updated_at";

#[async_trait]
impl UserRepository for PgStore {
    async fn insert_user(&self, user: User) -> Result<()> {
        let outcome = sqlx::query(
            "INSERT INTO users (id, email, password_hash, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&self.pool)
        .await;

        match outcome {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(DomainError::Conflict("email already in use".into()))
            }
            Err(e) => Err(db_err(e)),
        }
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        sqlx::query("SELECT id, email, password_hash, created_at FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .and_then(|row| row.as_ref().map(user_from_row).transpose())
            .map_err(db_err)
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>> {
        sqlx::query("SELECT id, email, password_hash, created_at FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .and_then(|row| row.as_ref().map(user_from_row).transpose())
            .map_err(db_err)
    }
}

#[async_trait]
impl ProductRepository for PgStore {
    async fn list_products(&self) -> Result<Vec<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at, id");
        sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .and_then(|rows| rows.iter().map(product_from_row).collect())
            .map_err(db_err)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .and_then(|row| row.as_ref().map(product_from_row).transpose())
            .map_err(db_err)
    }

    async fn insert_product(&self, product: Product) -> Result<()> {
        sqlx::query(
            "INSERT INTO products (id, owner_id, name, description, image_path, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(product.id)
        .bind(product.owner_id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.image_path)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn update_product(&self, product: Product) -> Result<()> {
        let updated = sqlx::query(
            "UPDATE products SET name = $2, description = $3, image_path = $4, updated_at = $5 \
             WHERE id = $1",
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.image_path)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if updated.rows_affected() == 0 {
            return Err(DomainError::not_found("product"));
        }
        Ok(())
    }

    async fn delete_product_cascade(&self, id: ProductId) -> Result<bool> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query("DELETE FROM reviews WHERE product_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        let removed = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?
            .rows_affected();

        tx.commit().await.map_err(db_err)?;
        Ok(removed > 0)
    }
}

#[async_trait]
impl ReviewRepository for PgStore {
    async fn list_reviews_for(&self, product_ids: &[ProductId]) -> Result<Vec<Review>> {
        let sql = format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE product_id = ANY($1) ORDER BY created_at, id"
        );
        sqlx::query(&sql)
            .bind(product_ids)
            .fetch_all(&self.pool)
            .await
            .and_then(|rows| rows.iter().map(review_from_row).collect())
            .map_err(db_err)
    }

    async fn get_review(&self, id: ReviewId) -> Result<Option<Review>> {
        let sql = format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = $1");
        sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .and_then(|row| row.as_ref().map(review_from_row).transpose())
            .map_err(db_err)
    }

    async fn insert_review(&self, review: Review) -> Result<()> {
        let outcome = sqlx::query(
            "INSERT INTO reviews (id, product_id, user_id, rating, text, author_name, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(review.id)
        .bind(review.product_id)
        .bind(review.user_id)
        .bind(i16::from(review.rating.value()))
        .bind(&review.text)
        .bind(&review.author_name)
        .bind(review.created_at)
        .bind(review.updated_at)
        .execute(&self.pool)
        .await;

        match outcome {
            Ok(_) => Ok(()),
            // The product was deleted between the existence check and the insert.
            Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
                Err(DomainError::not_found("product"))
            }
            Err(e) => Err(db_err(e)),
        }
    }

    async fn update_review(&self, review: Review) -> Result<()> {
        let updated = sqlx::query(
            "UPDATE reviews SET rating = $2, text = $3, author_name = $4, updated_at = $5 WHERE id = $1",
        )
        .bind(review.id)
        .bind(i16::from(review.rating.value()))
        .bind(&review.text)
        .bind(&review.author_name)
        .bind(review.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if updated.rows_affected() == 0 {
            return Err(DomainError::not_found("review"));
        }
        Ok(())
    }

    async fn delete_review(&self, id: ReviewId) -> Result<()> {
        sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}
