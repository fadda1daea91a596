//! Loan management service

use chrono::{Local, NaiveDate};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    forms::{RenewBookForm, RenewalPolicy},
    models::book_instance::{BookInstance, BorrowedCopy, CreateInstance, LendRequest, LoanStatus},
    pagination::Page,
    repository::Repository,
};

/// Outcome of a renewal submission
#[derive(Debug)]
pub enum RenewalOutcome {
    Renewed(BookInstance),
    /// Form rejected; nothing was written
    Invalid(BookInstance, validator::ValidationErrors),
}

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
    policy: RenewalPolicy,
}

impl LoansService {
    pub fn new(repository: Repository, policy: RenewalPolicy) -> Self {
        Self { repository, policy }
    }

    pub fn policy(&self) -> &RenewalPolicy {
        &self.policy
    }

    pub fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    /// Copies on loan to one borrower, soonest due first
    pub async fn borrowed_by(&self, user_id: i32, page: &Page) -> AppResult<(Vec<BorrowedCopy>, i64)> {
        let (copies, total) = self.repository.loans.list_on_loan(Some(user_id), page).await?;
        page.ensure_exists(total)?;
        Ok((copies, total))
    }

    /// Every copy on loan, soonest due first
    pub async fn all_borrowed(&self, page: &Page) -> AppResult<(Vec<BorrowedCopy>, i64)> {
        let (copies, total) = self.repository.loans.list_on_loan(None, page).await?;
        page.ensure_exists(total)?;
        Ok((copies, total))
    }

    pub async fn get_instance(&self, id: Uuid) -> AppResult<BookInstance> {
        self.repository.loans.get_instance(id).await
    }

    /// Validate a renewal form and move the due date of an on-loan copy
    pub async fn renew(&self, id: Uuid, form: &RenewBookForm) -> AppResult<RenewalOutcome> {
        let instance = self.repository.loans.get_instance(id).await?;

        let due_back = match form.clean(&self.policy, Self::today()) {
            Ok(date) => date,
            Err(errors) => return Ok(RenewalOutcome::Invalid(instance, errors)),
        };

        if instance.status != LoanStatus::OnLoan {
            return Err(AppError::BusinessRule(format!(
                "Book instance {} is not on loan ({})",
                id, instance.status
            )));
        }

        let renewed = self.repository.loans.renew(id, due_back).await?;
        tracing::info!("Loans: renewed book instance {} until {}", id, due_back);
        Ok(RenewalOutcome::Renewed(renewed))
    }

    /// Lend an available copy
    pub async fn lend(&self, id: Uuid, request: &LendRequest) -> AppResult<BookInstance> {
        let instance = self.repository.loans.get_instance(id).await?;
        if instance.status != LoanStatus::Available {
            return Err(AppError::BusinessRule(format!(
                "Book instance {} is not available ({})",
                id, instance.status
            )));
        }

        let due_back = request
            .due_back
            .unwrap_or_else(|| self.policy.proposed_date(Self::today()));

        let lent = self
            .repository
            .loans
            .lend(id, request.borrower_id, due_back)
            .await?;
        tracing::info!(
            "Loans: lent book instance {} to user {} until {}",
            id,
            request.borrower_id,
            due_back
        );
        Ok(lent)
    }

    /// Mark an on-loan copy as returned
    pub async fn mark_returned(&self, id: Uuid) -> AppResult<BookInstance> {
        let instance = self.repository.loans.get_instance(id).await?;
        if instance.status != LoanStatus::OnLoan {
            return Err(AppError::BusinessRule(format!(
                "Book instance {} is not on loan ({})",
                id, instance.status
            )));
        }

        let returned = self.repository.loans.mark_returned(id).await?;
        tracing::info!("Loans: book instance {} returned", id);
        Ok(returned)
    }

    /// Register a copy of a book; copies cannot start out on loan
    pub async fn create_instance(&self, book_id: i32, request: &CreateInstance) -> AppResult<BookInstance> {
        let imprint = request.imprint.trim();
        if imprint.is_empty() || imprint.chars().count() > 200 {
            return Err(AppError::Validation(
                "Imprint must be between 1 and 200 characters".to_string(),
            ));
        }

        let status = request.status.unwrap_or_default();
        if status == LoanStatus::OnLoan {
            return Err(AppError::Validation(
                "Use the lend operation to put a copy on loan".to_string(),
            ));
        }

        let instance = self
            .repository
            .loans
            .create_instance(book_id, imprint, status)
            .await?;
        tracing::info!("Loans: registered copy {} of book {}", instance.id, book_id);
        Ok(instance)
    }
}
