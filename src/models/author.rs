//! Author model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use super::book::BookShort;

/// Author row from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Author {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub date_of_death: Option<NaiveDate>,
}

impl Author {
    /// Display name, "Last, First"
    pub fn display_name(&self) -> String {
        format!("{}, {}", self.last_name, self.first_name)
    }
}

/// Author with the books attributed to them
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthorDetail {
    #[serde(flatten)]
    pub author: Author,
    pub books: Vec<BookShort>,
}

/// Create/update author form
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_lifespan"))]
pub struct AuthorForm {
    #[validate(required(message = "This field is required."), length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(required(message = "This field is required."), length(min = 1, max = 100))]
    pub last_name: Option<String>,
    #[validate(required(message = "This field is required."))]
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
}

impl AuthorForm {
    /// Initial values offered by the create form
    pub fn initial() -> Self {
        Self {
            date_of_death: NaiveDate::from_ymd_opt(2016, 12, 10),
            ..Default::default()
        }
    }
}

impl From<&Author> for AuthorForm {
    fn from(author: &Author) -> Self {
        Self {
            first_name: Some(author.first_name.clone()),
            last_name: Some(author.last_name.clone()),
            date_of_birth: Some(author.date_of_birth),
            date_of_death: author.date_of_death,
        }
    }
}

fn validate_lifespan(form: &AuthorForm) -> Result<(), ValidationError> {
    match (form.date_of_birth, form.date_of_death) {
        (Some(born), Some(died)) if died < born => {
            let mut err = ValidationError::new("death_before_birth");
            err.message = Some("Date of death cannot precede date of birth".into());
            Err(err)
        }
        _ => Ok(()),
    }
}
