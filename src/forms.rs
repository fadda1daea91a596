//! Loan renewal form and its validation rules

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{ValidationError, ValidationErrors};

use crate::{config::LoansConfig, models::book_instance::BookInstance};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Renewal date rules, derived from `[loans]` configuration
#[derive(Debug, Clone, Copy)]
pub struct RenewalPolicy {
    pub proposed_weeks: i64,
    pub max_weeks: i64,
    pub enforce_window: bool,
}

impl From<&LoansConfig> for RenewalPolicy {
    fn from(config: &LoansConfig) -> Self {
        Self {
            proposed_weeks: config.renewal_weeks,
            max_weeks: config.max_renewal_weeks,
            enforce_window: config.enforce_renewal_window,
        }
    }
}

impl RenewalPolicy {
    pub fn proposed_date(&self, today: NaiveDate) -> NaiveDate {
        today + Duration::weeks(self.proposed_weeks)
    }

    pub fn latest_date(&self, today: NaiveDate) -> NaiveDate {
        today + Duration::weeks(self.max_weeks)
    }

    pub fn help_text(&self) -> String {
        format!(
            "Enter a date between now and {} weeks (default {}).",
            self.max_weeks, self.proposed_weeks
        )
    }
}

/// Submitted renewal form; the date stays a string until cleaned
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct RenewBookForm {
    /// Renewal date (YYYY-MM-DD)
    #[serde(default)]
    pub renewal_date: String,
}

impl RenewBookForm {
    /// Form pre-filled with the proposed renewal date
    pub fn initial(policy: &RenewalPolicy, today: NaiveDate) -> Self {
        Self {
            renewal_date: policy.proposed_date(today).format(DATE_FORMAT).to_string(),
        }
    }

    /// Parse and check the renewal date against the policy window
    pub fn clean(&self, policy: &RenewalPolicy, today: NaiveDate) -> Result<NaiveDate, ValidationErrors> {
        let raw = self.renewal_date.trim();
        if raw.is_empty() {
            return Err(field_error("required", "This field is required."));
        }

        let date = NaiveDate::parse_from_str(raw, DATE_FORMAT)
            .map_err(|_| field_error("invalid", "Enter a valid date."))?;

        if policy.enforce_window {
            if date < today {
                return Err(field_error("renewal_in_past", "Invalid date - renewal in past"));
            }
            if date > policy.latest_date(today) {
                let message = format!(
                    "Invalid date - renewal more than {} weeks ahead",
                    policy.max_weeks
                );
                return Err(field_error("renewal_too_far", message));
            }
        }

        Ok(date)
    }
}

fn field_error(code: &'static str, message: impl Into<String>) -> ValidationErrors {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into().into());
    let mut errors = ValidationErrors::new();
    errors.add("renewal_date", err);
    errors
}

/// Renewal form as shown to staff, with errors after a rejected submission
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RenewalFormResponse {
    pub book_instance: BookInstance,
    /// Current field value (YYYY-MM-DD)
    pub renewal_date: String,
    pub help_text: String,
    /// Field name to messages; empty when the form is unbound or valid
    pub errors: BTreeMap<String, Vec<String>>,
}
