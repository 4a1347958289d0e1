//! Author model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use super::book::BookShort;

/// Full author model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Author {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
    /// Books written by this author (loaded separately for the detail view)
    #[sqlx(skip)]
    #[serde(default)]
    pub books: Vec<BookShort>,
}

impl Author {
    /// Display name in catalog order ("Lastname, Firstname")
    pub fn display_name(&self) -> String {
        format!("{}, {}", self.last_name, self.first_name)
    }
}

/// Create author request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAuthor {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
}

/// Update author request
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateAuthor {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
}

/// Author list query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct AuthorQuery {
    pub page: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_is_lastname_first() {
        let author = Author {
            id: 1,
            first_name: "Gabriel".to_string(),
            last_name: "García Márquez".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1927, 3, 6),
            date_of_death: NaiveDate::from_ymd_opt(2014, 4, 17),
            books: Vec::new(),
        };
        assert_eq!(author.display_name(), "García Márquez, Gabriel");
    }
}
