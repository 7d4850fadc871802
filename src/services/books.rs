//! Book catalog service

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookQuery, CreateBook},
    repository::Repository,
};

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
}

impl BooksService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Verify database connectivity (readiness probe)
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.repository.pool)
            .await?;
        Ok(())
    }

    /// List books with filters and pagination
    pub async fn list(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        self.repository.books.list(query).await
    }

    /// Get book by ID
    pub async fn get(&self, id: i64) -> AppResult<Book> {
        self.repository
            .books
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))
    }

    /// Validate and store a new book
    pub async fn create(&self, data: CreateBook) -> AppResult<Book> {
        let new_book = data.try_into_new()?;
        let book = self.repository.books.insert(&new_book).await?;
        tracing::info!("Created book id={} name={:?}", book.id, book.name);
        Ok(book)
    }

    /// Validate and store several books atomically
    pub async fn create_many(&self, data: Vec<CreateBook>) -> AppResult<Vec<Book>> {
        let mut staged = Vec::with_capacity(data.len());
        for entry in data {
            staged.push(entry.try_into_new()?);
        }
        self.repository.books.insert_all(&staged).await
    }

    /// Validate and replace an existing book
    pub async fn update(&self, id: i64, data: CreateBook) -> AppResult<Book> {
        let new_book = data.try_into_new()?;
        self.repository
            .books
            .update(id, &new_book)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))
    }

    /// Delete a book
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        if !self.repository.books.delete(id).await? {
            return Err(AppError::NotFound(format!("Book {} not found", id)));
        }
        tracing::info!("Deleted book id={}", id);
        Ok(())
    }
}
