//! Books repository for database operations
//!
//! The borrow/return transitions are single conditional UPDATE statements so
//! that check-then-set on the book status is atomic per row. Two concurrent
//! borrows of the same book can never both succeed.

use chrono::{Duration, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BorrowedBook, CreateBook},
};

/// Borrow period granted on each loan
const BORROW_DURATION_DAYS: i64 = 7;

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// List all books
    pub async fn list(&self) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>("SELECT * FROM books ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    /// List currently borrowed books
    pub async fn list_borrowed(&self) -> AppResult<Vec<BorrowedBook>> {
        let books = sqlx::query_as::<_, BorrowedBook>(
            r#"
            SELECT id, title, author, isbn, borrower_id, borrowed_at, due_date
            FROM books
            WHERE status = 'borrowed'
            ORDER BY borrowed_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    /// Check if an ISBN already exists
    pub async fn isbn_exists(&self, isbn: &str) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE isbn = $1)")
                .bind(isbn)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    /// Create a new book (always starts available, no borrower)
    pub async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        let now = Utc::now();

        let created = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author, isbn, status, created_at, updated_at)
            VALUES ($1, $2, $3, 'available', $4, $4)
            RETURNING *
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Borrow a book for a user
    ///
    /// The available -> borrowed transition only fires while the row still
    /// holds `status = 'available'`; a zero-row result means the book is
    /// missing or already borrowed, inspected afterwards only to pick the
    /// error to report.
    pub async fn borrow(&self, book_id: i32, user_id: i32) -> AppResult<Book> {
        let now = Utc::now();
        let due_date = now + Duration::days(BORROW_DURATION_DAYS);

        let updated = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET status = 'borrowed', borrower_id = $2,
                borrowed_at = $3, due_date = $4, updated_at = $3
            WHERE id = $1 AND status = 'available'
            RETURNING *
            "#,
        )
        .bind(book_id)
        .bind(user_id)
        .bind(now)
        .bind(due_date)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(book) => Ok(book),
            None => {
                // Missing book or lost the race; look to pick the error
                self.get_by_id(book_id).await?;
                Err(AppError::Conflict("Book is already borrowed".to_string()))
            }
        }
    }

    /// Return a borrowed book
    ///
    /// Only the current borrower may return; the conditional UPDATE clears the
    /// borrower reference in the same atomic statement that flips the status.
    pub async fn return_book(&self, book_id: i32, user_id: i32) -> AppResult<Book> {
        let now = Utc::now();

        let updated = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET status = 'available', borrower_id = NULL,
                borrowed_at = NULL, due_date = NULL, updated_at = $3
            WHERE id = $1 AND status = 'borrowed' AND borrower_id = $2
            RETURNING *
            "#,
        )
        .bind(book_id)
        .bind(user_id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(book) => Ok(book),
            None => {
                let book = self.get_by_id(book_id).await?;
                match book.borrower_id {
                    None => Err(AppError::Conflict("Book is not borrowed".to_string())),
                    Some(_) => Err(AppError::Authorization(
                        "Only the current borrower can return this book".to_string(),
                    )),
                }
            }
        }
    }

    /// Delete a book (only while available)
    ///
    /// The status guard prevents orphaning the borrower reference of an
    /// in-flight loan.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1 AND status = 'available'")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            // Missing book or a live loan; look to pick the error
            self.get_by_id(id).await?;
            return Err(AppError::Conflict(
                "Book is currently borrowed and cannot be deleted".to_string(),
            ));
        }

        Ok(())
    }

    /// Check whether a user currently holds any borrowed book
    pub async fn user_has_borrowed(&self, user_id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM books WHERE borrower_id = $1 AND status = 'borrowed')",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }
}
