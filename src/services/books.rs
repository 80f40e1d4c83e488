//! Book lifecycle service
//!
//! Enforces the two-state book lifecycle: a book cycles between available and
//! borrowed, carrying a borrower reference only while borrowed. The state
//! checks happen inside the repository's conditional updates, so concurrent
//! transitions on the same book are linearized by the database.

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BorrowedBook, CreateBook},
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

    /// Get book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    /// List all books
    pub async fn list_books(&self) -> AppResult<Vec<Book>> {
        self.repository.books.list().await
    }

    /// List currently borrowed books
    pub async fn list_borrowed(&self) -> AppResult<Vec<BorrowedBook>> {
        self.repository.books.list_borrowed().await
    }

    /// Add a new book to the catalog
    pub async fn create_book(&self, book: CreateBook) -> AppResult<Book> {
        if self.repository.books.isbn_exists(&book.isbn).await? {
            return Err(AppError::Conflict("ISBN already registered".to_string()));
        }

        self.repository.books.create(&book).await
    }

    /// Borrow a book for the requesting user
    pub async fn borrow_book(&self, book_id: i32, user_id: i32) -> AppResult<Book> {
        // Verify the borrower exists before touching the book
        self.repository.users.get_by_id(user_id).await?;
        self.repository.books.borrow(book_id, user_id).await
    }

    /// Return a book borrowed by the requesting user
    pub async fn return_book(&self, book_id: i32, user_id: i32) -> AppResult<Book> {
        self.repository.books.return_book(book_id, user_id).await
    }

    /// Delete a book (only while available)
    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        self.repository.books.delete(id).await
    }
}
