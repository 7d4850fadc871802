//! Books repository for database operations.
//!
//! Every statement binds its values; book text is treated as opaque bytes and
//! is never interpolated into SQL.

use sqlx::{Pool, QueryBuilder, Sqlite};

use crate::{
    error::AppResult,
    models::book::{Book, BookQuery, NewBook},
};

/// Schema for the books table. CHECK constraints are named so violations
/// raised by the database can be mapped back to their cause (see
/// `error::From<sqlx::Error>`).
const CREATE_BOOKS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS books (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    author TEXT NOT NULL,
    year_published INTEGER NOT NULL,
    book_type TEXT NOT NULL,
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    CONSTRAINT books_name_length CHECK (length(name) BETWEEN 1 AND 64),
    CONSTRAINT books_author_length CHECK (length(author) BETWEEN 1 AND 64),
    CONSTRAINT books_book_type_length CHECK (length(book_type) BETWEEN 1 AND 64),
    CONSTRAINT books_year_range CHECK (year_published BETWEEN -2147483648 AND 2147483647)
)
"#;

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Sqlite>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    // =========================================================================
    // SCHEMA
    // =========================================================================

    /// Create the books table if it does not exist. Safe to repeat.
    pub async fn create_schema(&self) -> AppResult<()> {
        sqlx::query(CREATE_BOOKS_TABLE).execute(&self.pool).await?;
        Ok(())
    }

    /// Drop the books table if it exists. Safe to repeat.
    pub async fn drop_schema(&self) -> AppResult<()> {
        sqlx::query("DROP TABLE IF EXISTS books")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // =========================================================================
    // WRITE
    // =========================================================================

    /// Insert a single validated row and return it as stored.
    pub async fn insert(&self, book: &NewBook) -> AppResult<Book> {
        let row = sqlx::query_as::<_, Book>(
            "INSERT INTO books (name, author, year_published, book_type)
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(&book.name)
        .bind(&book.author)
        .bind(book.year_published)
        .bind(&book.book_type)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Insert a batch of rows inside one transaction.
    ///
    /// All-or-nothing: any constraint failure rolls the whole batch back and
    /// leaves previously committed state unchanged.
    pub async fn insert_all(&self, books: &[NewBook]) -> AppResult<Vec<Book>> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = Vec::with_capacity(books.len());
        for book in books {
            let row = sqlx::query_as::<_, Book>(
                "INSERT INTO books (name, author, year_published, book_type)
                 VALUES ($1, $2, $3, $4) RETURNING *",
            )
            .bind(&book.name)
            .bind(&book.author)
            .bind(book.year_published)
            .bind(&book.book_type)
            .fetch_one(&mut *tx)
            .await?;
            inserted.push(row);
        }
        tx.commit().await?;
        Ok(inserted)
    }

    /// Replace all mutable fields of a book. Returns the updated row, or
    /// `None` when no row has this id.
    pub async fn update(&self, id: i64, book: &NewBook) -> AppResult<Option<Book>> {
        let row = sqlx::query_as::<_, Book>(
            "UPDATE books SET name = $1, author = $2, year_published = $3, book_type = $4
             WHERE id = $5 RETURNING *",
        )
        .bind(&book.name)
        .bind(&book.author)
        .bind(book.year_published)
        .bind(&book.book_type)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Delete a book by id. Returns whether a row was removed.
    pub async fn delete(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // READ
    // =========================================================================

    /// Get book by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<Option<Book>> {
        let row = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// First book with this exact name, in insertion order
    pub async fn find_by_name(&self, name: &str) -> AppResult<Option<Book>> {
        let row = sqlx::query_as::<_, Book>(
            "SELECT * FROM books WHERE name = $1 ORDER BY id LIMIT 1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// First book published in this exact year, in insertion order
    pub async fn find_by_year(&self, year: i32) -> AppResult<Option<Book>> {
        let row = sqlx::query_as::<_, Book>(
            "SELECT * FROM books WHERE year_published = $1 ORDER BY id LIMIT 1",
        )
        .bind(year)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// List books with exact-match filters and pagination
    pub async fn list(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);

        let mut count_builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM books");
        push_filters(&mut count_builder, query);
        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM books");
        push_filters(&mut builder, query);
        builder.push(" ORDER BY name, id LIMIT ");
        builder.push_bind(per_page);
        builder.push(" OFFSET ");
        // `page` is unbounded caller input; saturate instead of overflowing.
        builder.push_bind((page - 1).saturating_mul(per_page));
        let books = builder
            .build_query_as::<Book>()
            .fetch_all(&self.pool)
            .await?;

        Ok((books, total))
    }

    /// Total number of stored books
    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

fn push_filters<'args>(builder: &mut QueryBuilder<'args, Sqlite>, query: &'args BookQuery) {
    builder.push(" WHERE 1=1");
    if let Some(ref name) = query.name {
        builder.push(" AND name = ").push_bind(name.as_str());
    }
    if let Some(ref author) = query.author {
        builder.push(" AND author = ").push_bind(author.as_str());
    }
    if let Some(year) = query.year_published {
        builder.push(" AND year_published = ").push_bind(year);
    }
    if let Some(ref book_type) = query.book_type {
        builder.push(" AND book_type = ").push_bind(book_type.as_str());
    }
}
