//! Catalog management service

use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        author::{Author, CreateAuthor, UpdateAuthor},
        book::{Book, BookShort, CreateBook, UpdateBook},
        genre::{CreateGenre, Genre},
        instance::{BookInstance, CreateBookInstance},
        language::{CreateLanguage, Language},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    // --- Books ---

    /// List books with pagination
    pub async fn list_books(&self, page: i64) -> AppResult<(Vec<BookShort>, i64)> {
        self.repository.books.list(page).await
    }

    /// Get a book with its author, language, genres and copies
    pub async fn get_book(&self, id: i32) -> AppResult<Book> {
        let mut book = self.repository.books.get_by_id(id).await?;

        if let Some(author_id) = book.author_id {
            book.author = Some(self.repository.authors.get_by_id(author_id).await?);
        }
        if let Some(language_id) = book.language_id {
            book.language = Some(self.repository.languages.get_by_id(language_id).await?);
        }
        book.genres = self.repository.books.get_genres(id).await?;
        book.instances = self.repository.instances.list_for_book(id).await?;

        Ok(book)
    }

    /// Create a new book, verifying its references first
    pub async fn create_book(&self, book: CreateBook) -> AppResult<Book> {
        book.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        self.check_book_references(book.author_id, book.language_id, &book.genre_ids)
            .await?;

        let created = self.repository.books.create(&book).await?;
        tracing::info!("Created book id={} title={:?}", created.id, created.title);
        self.get_book(created.id).await
    }

    /// Update an existing book
    pub async fn update_book(&self, id: i32, book: UpdateBook) -> AppResult<Book> {
        book.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let genre_ids = book.genre_ids.clone().unwrap_or_default();
        self.check_book_references(book.author_id, book.language_id, &genre_ids)
            .await?;

        self.repository.books.update(id, &book).await?;
        self.get_book(id).await
    }

    /// Delete a book; its copies survive with the book reference cleared
    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        self.repository.books.delete(id).await
    }

    async fn check_book_references(
        &self,
        author_id: Option<i32>,
        language_id: Option<i32>,
        genre_ids: &[i32],
    ) -> AppResult<()> {
        if let Some(author_id) = author_id {
            self.repository.authors.get_by_id(author_id).await?;
        }
        if let Some(language_id) = language_id {
            self.repository.languages.get_by_id(language_id).await?;
        }
        for genre_id in genre_ids {
            self.repository.genres.get_by_id(*genre_id).await?;
        }
        Ok(())
    }

    // --- Authors ---

    /// List authors ordered by last name, with pagination
    pub async fn list_authors(&self, page: i64) -> AppResult<(Vec<Author>, i64)> {
        self.repository.authors.list(page).await
    }

    /// Get an author with their books
    pub async fn get_author(&self, id: i32) -> AppResult<Author> {
        let mut author = self.repository.authors.get_by_id(id).await?;
        author.books = self.repository.books.list_by_author(id).await?;
        Ok(author)
    }

    /// Create a new author
    pub async fn create_author(&self, author: CreateAuthor) -> AppResult<Author> {
        let created = self.repository.authors.create(&author).await?;
        tracing::info!("Created author id={} name={}", created.id, created.display_name());
        Ok(created)
    }

    /// Update an existing author
    pub async fn update_author(&self, id: i32, author: UpdateAuthor) -> AppResult<Author> {
        self.repository.authors.update(id, &author).await
    }

    /// Delete an author; their books survive with the author reference cleared
    pub async fn delete_author(&self, id: i32) -> AppResult<()> {
        self.repository.authors.delete(id).await
    }

    // --- Genres ---

    pub async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        self.repository.genres.list().await
    }

    pub async fn create_genre(&self, genre: CreateGenre) -> AppResult<Genre> {
        self.repository.genres.create(&genre).await
    }

    pub async fn delete_genre(&self, id: i32) -> AppResult<()> {
        self.repository.genres.delete(id).await
    }

    // --- Languages ---

    pub async fn list_languages(&self) -> AppResult<Vec<Language>> {
        self.repository.languages.list().await
    }

    pub async fn create_language(&self, language: CreateLanguage) -> AppResult<Language> {
        self.repository.languages.create(&language).await
    }

    pub async fn delete_language(&self, id: i32) -> AppResult<()> {
        self.repository.languages.delete(id).await
    }

    // --- Book instances ---

    /// List the copies of a book
    pub async fn list_instances(&self, book_id: i32) -> AppResult<Vec<BookInstance>> {
        // Verify book exists
        self.repository.books.get_by_id(book_id).await?;
        self.repository.instances.list_for_book(book_id).await
    }

    /// Register a new copy of a book
    pub async fn create_instance(
        &self,
        book_id: i32,
        instance: CreateBookInstance,
    ) -> AppResult<BookInstance> {
        // Verify book exists
        self.repository.books.get_by_id(book_id).await?;
        self.repository.instances.create(book_id, &instance).await
    }

    /// Get a copy by its UUID
    pub async fn get_instance(&self, id: Uuid) -> AppResult<BookInstance> {
        self.repository.instances.get_by_id(id).await
    }

    /// Remove a copy from the catalog
    pub async fn delete_instance(&self, id: Uuid) -> AppResult<()> {
        self.repository.instances.delete(id).await
    }
}
