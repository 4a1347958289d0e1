//! Loan management service and renewal date policy

use chrono::{Duration, NaiveDate, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::instance::{BookInstance, LoanedCopy},
    repository::Repository,
};

/// Renewals may push the due-back date at most this many weeks past today
pub const MAX_RENEWAL_WEEKS: i64 = 4;

/// Proposed renewal defaults to this many weeks out, one week inside the ceiling
pub const DEFAULT_RENEWAL_WEEKS: i64 = 3;

/// Why a proposed renewal date was rejected. The two causes surface as
/// distinct messages so the form can tell the user which rule failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RenewalDateError {
    #[error("Invalid date - renewal in past")]
    InPast,
    #[error("Invalid date - renewal more than 4 weeks ahead")]
    BeyondWindow,
}

impl From<RenewalDateError> for AppError {
    fn from(err: RenewalDateError) -> Self {
        AppError::InvalidDate(err.to_string())
    }
}

/// Validate a proposed due-back date for a renewal.
///
/// Accepts any date from `today` through `today + 4 weeks` inclusive and
/// returns it unchanged. Pure and deterministic: the reference date is a
/// parameter, never read from a global clock.
pub fn validate_renewal_date(
    candidate: NaiveDate,
    today: NaiveDate,
) -> Result<NaiveDate, RenewalDateError> {
    if candidate < today {
        return Err(RenewalDateError::InPast);
    }
    if candidate > today + Duration::weeks(MAX_RENEWAL_WEEKS) {
        return Err(RenewalDateError::BeyondWindow);
    }
    Ok(candidate)
}

/// Default due-back date proposed when a renewal form is opened
pub fn default_renewal_date(today: NaiveDate) -> NaiveDate {
    today + Duration::weeks(DEFAULT_RENEWAL_WEEKS)
}

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
}

impl LoansService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Copies currently borrowed by a user, due-back ascending
    pub async fn user_loans(&self, user_id: i32, page: i64) -> AppResult<(Vec<LoanedCopy>, i64)> {
        // Verify user exists
        self.repository.users.get_by_id(user_id).await?;
        let today = Utc::now().date_naive();
        self.repository.instances.borrowed_by_user(user_id, page, today).await
    }

    /// Every copy currently on loan, due-back ascending
    pub async fn all_loans(&self, page: i64) -> AppResult<(Vec<LoanedCopy>, i64)> {
        let today = Utc::now().date_naive();
        self.repository.instances.all_on_loan(page, today).await
    }

    /// Check a copy out to a borrower. Without an explicit due-back date the
    /// standard three-week loan period applies.
    pub async fn checkout(
        &self,
        id: Uuid,
        borrower_id: i32,
        due_back: Option<NaiveDate>,
    ) -> AppResult<BookInstance> {
        // Verify borrower exists
        self.repository.users.get_by_id(borrower_id).await?;

        let today = Utc::now().date_naive();
        let due_back = due_back.unwrap_or_else(|| default_renewal_date(today));
        self.repository.instances.checkout(id, borrower_id, due_back).await
    }

    /// Mark a copy as returned
    pub async fn return_copy(&self, id: Uuid) -> AppResult<BookInstance> {
        self.repository.instances.return_copy(id).await
    }

    /// The copy and the default date a renewal form should propose
    pub async fn proposed_renewal(&self, id: Uuid) -> AppResult<(BookInstance, NaiveDate)> {
        let instance = self.repository.instances.get_by_id(id).await?;
        let today = Utc::now().date_naive();
        Ok((instance, default_renewal_date(today)))
    }

    /// Renew a loan: validate the candidate date against today, then apply it
    /// as the new due-back date. The copy stays on loan.
    pub async fn renew(&self, id: Uuid, candidate: NaiveDate) -> AppResult<BookInstance> {
        let today = Utc::now().date_naive();
        let due_back = validate_renewal_date(candidate, today)?;
        self.repository.instances.renew(id, due_back).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn rejects_dates_in_the_past() {
        let today = date(2024, 1, 10);
        assert_eq!(
            validate_renewal_date(date(2024, 1, 9), today),
            Err(RenewalDateError::InPast)
        );
        assert_eq!(
            validate_renewal_date(date(2023, 12, 31), today),
            Err(RenewalDateError::InPast)
        );
    }

    #[test]
    fn rejects_dates_beyond_four_weeks() {
        let today = date(2024, 1, 10);
        // 2024-02-10 is 31 days out, three past the window
        assert_eq!(
            validate_renewal_date(date(2024, 2, 10), today),
            Err(RenewalDateError::BeyondWindow)
        );
        // One day past the boundary
        assert_eq!(
            validate_renewal_date(date(2024, 2, 8), today),
            Err(RenewalDateError::BeyondWindow)
        );
    }

    #[test]
    fn accepts_dates_inside_the_window_unchanged() {
        let today = date(2024, 1, 10);
        assert_eq!(
            validate_renewal_date(date(2024, 1, 24), today),
            Ok(date(2024, 1, 24))
        );
        // Both boundaries are inclusive
        assert_eq!(validate_renewal_date(today, today), Ok(today));
        assert_eq!(
            validate_renewal_date(date(2024, 2, 7), today),
            Ok(date(2024, 2, 7))
        );
    }

    #[test]
    fn default_proposal_is_three_weeks_out() {
        let today = date(2024, 1, 10);
        let proposed = default_renewal_date(today);
        assert_eq!(proposed, date(2024, 1, 31));
        // The default always satisfies the acceptance window
        assert_eq!(validate_renewal_date(proposed, today), Ok(proposed));
    }

    #[test]
    fn rejection_messages_are_distinct() {
        assert_ne!(
            RenewalDateError::InPast.to_string(),
            RenewalDateError::BeyondWindow.to_string()
        );
    }
}
