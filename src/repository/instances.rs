//! Book instances repository for database operations

use chrono::NaiveDate;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::BookShort,
        instance::{BookInstance, CreateBookInstance, LoanStatus, LoanedCopy},
        user::UserShort,
    },
};

/// Loan lists are shown ten per page, ordered by due-back date
pub const PAGE_SIZE: i64 = 10;

#[derive(Clone)]
pub struct InstancesRepository {
    pool: Pool<Postgres>,
}

impl InstancesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get a copy by its UUID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<BookInstance> {
        sqlx::query_as::<_, BookInstance>("SELECT * FROM book_instances WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", id)))
    }

    /// List all copies of one book, ordered by due-back date
    pub async fn list_for_book(&self, book_id: i32) -> AppResult<Vec<BookInstance>> {
        let instances = sqlx::query_as::<_, BookInstance>(
            "SELECT * FROM book_instances WHERE book_id = $1 ORDER BY due_back",
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(instances)
    }

    /// Create a new copy of a book. New copies start in maintenance unless
    /// another status is requested.
    pub async fn create(
        &self,
        book_id: i32,
        instance: &CreateBookInstance,
    ) -> AppResult<BookInstance> {
        let id = Uuid::new_v4();
        let status = instance.status.unwrap_or_default();

        let created = sqlx::query_as::<_, BookInstance>(
            r#"
            INSERT INTO book_instances (id, book_id, imprint, status)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(book_id)
        .bind(&instance.imprint)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Delete a copy
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM book_instances WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book instance {} not found", id)));
        }

        Ok(())
    }

    /// Check a copy out to a borrower until `due_back`
    pub async fn checkout(
        &self,
        id: Uuid,
        borrower_id: i32,
        due_back: NaiveDate,
    ) -> AppResult<BookInstance> {
        let instance = self.get_by_id(id).await?;

        if instance.status != LoanStatus::Available {
            return Err(AppError::BusinessRule(
                "Copy is not available for checkout".to_string(),
            ));
        }

        let updated = sqlx::query_as::<_, BookInstance>(
            r#"
            UPDATE book_instances
            SET status = $2, borrower_id = $3, due_back = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(LoanStatus::OnLoan)
        .bind(borrower_id)
        .bind(due_back)
        .fetch_one(&self.pool)
        .await?;

        Ok(updated)
    }

    /// Mark a copy as returned: it becomes available again and the borrower
    /// and due-back date are cleared.
    pub async fn return_copy(&self, id: Uuid) -> AppResult<BookInstance> {
        let instance = self.get_by_id(id).await?;

        if instance.status != LoanStatus::OnLoan {
            return Err(AppError::BusinessRule("Copy is not on loan".to_string()));
        }

        let updated = sqlx::query_as::<_, BookInstance>(
            r#"
            UPDATE book_instances
            SET status = $2, borrower_id = NULL, due_back = NULL
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(LoanStatus::Available)
        .fetch_one(&self.pool)
        .await?;

        Ok(updated)
    }

    /// Set a new due-back date on a loaned copy. The status stays on-loan;
    /// date validation happens in the loans service before this call.
    pub async fn renew(&self, id: Uuid, due_back: NaiveDate) -> AppResult<BookInstance> {
        let instance = self.get_by_id(id).await?;

        if instance.status != LoanStatus::OnLoan {
            return Err(AppError::BusinessRule(
                "Only a copy on loan can be renewed".to_string(),
            ));
        }

        let updated = sqlx::query_as::<_, BookInstance>(
            "UPDATE book_instances SET due_back = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(due_back)
        .fetch_one(&self.pool)
        .await?;

        Ok(updated)
    }

    /// Copies currently on loan to one borrower, due-back ascending, paginated
    pub async fn borrowed_by_user(
        &self,
        user_id: i32,
        page: i64,
        today: NaiveDate,
    ) -> AppResult<(Vec<LoanedCopy>, i64)> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM book_instances WHERE borrower_id = $1 AND status = 'o'",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let query = format!(
            "{} WHERE i.borrower_id = $1 AND i.status = 'o' ORDER BY i.due_back LIMIT $2 OFFSET $3",
            LOANED_COPY_SELECT
        );
        let rows = sqlx::query(&query)
            .bind(user_id)
            .bind(PAGE_SIZE)
            .bind((page - 1) * PAGE_SIZE)
            .fetch_all(&self.pool)
            .await?;

        Ok((rows.iter().map(|row| loaned_copy_from_row(row, today)).collect(), total))
    }

    /// All copies currently on loan, due-back ascending, paginated
    pub async fn all_on_loan(&self, page: i64, today: NaiveDate) -> AppResult<(Vec<LoanedCopy>, i64)> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM book_instances WHERE status = 'o'")
                .fetch_one(&self.pool)
                .await?;

        let query = format!(
            "{} WHERE i.status = 'o' ORDER BY i.due_back LIMIT $1 OFFSET $2",
            LOANED_COPY_SELECT
        );
        let rows = sqlx::query(&query)
            .bind(PAGE_SIZE)
            .bind((page - 1) * PAGE_SIZE)
            .fetch_all(&self.pool)
            .await?;

        Ok((rows.iter().map(|row| loaned_copy_from_row(row, today)).collect(), total))
    }

    /// Count all copies
    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book_instances")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Count copies in one status
    pub async fn count_by_status(&self, status: LoanStatus) -> AppResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM book_instances WHERE status = $1")
                .bind(status)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}

/// Shared SELECT for loan lists: copy joined with its book, the book's
/// author, and the borrower.
const LOANED_COPY_SELECT: &str = r#"
    SELECT i.id, i.imprint, i.due_back, i.status,
           b.id as book_id, b.title, b.isbn, b.author_id,
           a.last_name || ', ' || a.first_name as author_name,
           u.id as borrower_id, u.login as borrower_login,
           u.first_name as borrower_first_name, u.last_name as borrower_last_name
    FROM book_instances i
    LEFT JOIN books b ON i.book_id = b.id
    LEFT JOIN authors a ON b.author_id = a.id
    LEFT JOIN users u ON i.borrower_id = u.id
"#;

fn loaned_copy_from_row(row: &sqlx::postgres::PgRow, today: NaiveDate) -> LoanedCopy {
    let due_back: Option<NaiveDate> = row.get("due_back");

    let book = row
        .get::<Option<i32>, _>("book_id")
        .map(|book_id| BookShort {
            id: book_id,
            title: row.get::<Option<String>, _>("title").unwrap_or_default(),
            isbn: row.get::<Option<String>, _>("isbn").unwrap_or_default(),
            author_id: row.get("author_id"),
            author_name: row.get("author_name"),
            nb_instances: None,
            nb_available: None,
        });

    let borrower = row
        .get::<Option<i32>, _>("borrower_id")
        .map(|borrower_id| UserShort {
            id: borrower_id,
            login: row.get::<Option<String>, _>("borrower_login").unwrap_or_default(),
            first_name: row.get("borrower_first_name"),
            last_name: row.get("borrower_last_name"),
        });

    LoanedCopy {
        id: row.get("id"),
        imprint: row.get("imprint"),
        due_back,
        status: row.get("status"),
        book,
        borrower,
        is_overdue: matches!(due_back, Some(due) if due < today),
    }
}
