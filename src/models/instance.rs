//! Book instance (loanable copy) model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::book::BookShort;
use super::user::UserShort;

/// Circulation status of a copy. Stored in the database as a one-letter code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Maintenance,
    OnLoan,
    Available,
    Reserved,
}

impl LoanStatus {
    pub fn as_code(&self) -> &'static str {
        match self {
            LoanStatus::Maintenance => "m",
            LoanStatus::OnLoan => "o",
            LoanStatus::Available => "a",
            LoanStatus::Reserved => "r",
        }
    }
}

impl Default for LoanStatus {
    fn default() -> Self {
        LoanStatus::Maintenance
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_code())
    }
}

impl std::str::FromStr for LoanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "m" => Ok(LoanStatus::Maintenance),
            "o" => Ok(LoanStatus::OnLoan),
            "a" => Ok(LoanStatus::Available),
            "r" => Ok(LoanStatus::Reserved),
            _ => Err(format!("Invalid loan status code: {}", s)),
        }
    }
}

// SQLx conversion for LoanStatus
impl sqlx::Type<Postgres> for LoanStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for LoanStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for LoanStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        let s: String = self.as_code().to_string();
        <String as Encode<Postgres>>::encode(s, buf)
    }
}

/// A specific loanable copy of a book
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookInstance {
    /// Library-wide unique identifier for this particular copy
    pub id: Uuid,
    /// Cleared (not cascaded) when the referenced book is deleted
    pub book_id: Option<i32>,
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    pub status: LoanStatus,
    /// Cleared (not cascaded) when the borrowing user is deleted
    pub borrower_id: Option<i32>,
}

impl BookInstance {
    /// A copy is overdue iff it has a due-back date strictly before `today`.
    /// The reference date is injected so callers and tests control the clock.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        matches!(self.due_back, Some(due) if due < today)
    }
}

/// Loaned copy with book and borrower context, for circulation lists
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoanedCopy {
    pub id: Uuid,
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    pub status: LoanStatus,
    pub book: Option<BookShort>,
    pub borrower: Option<UserShort>,
    pub is_overdue: bool,
}

/// Create book instance request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBookInstance {
    pub imprint: String,
    #[serde(default)]
    pub status: Option<LoanStatus>,
}

/// Loan list query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct LoanQuery {
    pub page: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn copy_due(due_back: Option<NaiveDate>) -> BookInstance {
        BookInstance {
            id: Uuid::new_v4(),
            book_id: Some(1),
            imprint: "Unlikely Imprint, 2016".to_string(),
            due_back,
            status: LoanStatus::OnLoan,
            borrower_id: Some(1),
        }
    }

    #[test]
    fn overdue_when_due_back_is_past() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let copy = copy_due(NaiveDate::from_ymd_opt(2024, 1, 9));
        assert!(copy.is_overdue(today));
    }

    #[test]
    fn not_overdue_on_the_due_date_itself() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let copy = copy_due(NaiveDate::from_ymd_opt(2024, 1, 10));
        assert!(!copy.is_overdue(today));
    }

    #[test]
    fn not_overdue_when_due_back_is_future() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let copy = copy_due(NaiveDate::from_ymd_opt(2024, 1, 24));
        assert!(!copy.is_overdue(today));
    }

    #[test]
    fn not_overdue_without_due_back() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let copy = copy_due(None);
        assert!(!copy.is_overdue(today));
    }

    #[test]
    fn status_codes_round_trip() {
        for status in [
            LoanStatus::Maintenance,
            LoanStatus::OnLoan,
            LoanStatus::Available,
            LoanStatus::Reserved,
        ] {
            assert_eq!(status.as_code().parse::<LoanStatus>().unwrap(), status);
        }
        assert!("x".parse::<LoanStatus>().is_err());
    }

    #[test]
    fn default_status_is_maintenance() {
        assert_eq!(LoanStatus::default(), LoanStatus::Maintenance);
    }
}
