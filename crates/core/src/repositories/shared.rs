//! Shared plumbing for the entity services.
//!
//! [`Repo`] wraps the backend with typed fetch/insert/update/delete and with the failure
//! policy every service follows: log the error, publish the operation's fixed notification
//! message, return the error unchanged.

use crate::backend::{Backend, Query, Table};
use crate::events::{EventBus, NotificationLevel};
use crate::validation::ValidationReport;
use crate::{ClinicError, ClinicResult, Clock};
use chrono::NaiveDateTime;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use uuid::Uuid;

pub(crate) struct Repo<B> {
    backend: Arc<B>,
    events: EventBus,
    clock: Clock,
    /// Caller's access token, forwarded on every backend call.
    token: Option<Arc<str>>,
}

impl<B> Clone for Repo<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            events: self.events.clone(),
            clock: self.clock,
            token: self.token.clone(),
        }
    }
}

impl<B: Backend> Repo<B> {
    pub(crate) fn new(
        backend: Arc<B>,
        events: EventBus,
        clock: Clock,
        token: Option<Arc<str>>,
    ) -> Self {
        Self {
            backend,
            events,
            clock,
            token,
        }
    }

    fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub(crate) fn events(&self) -> &EventBus {
        &self.events
    }

    pub(crate) fn now(&self) -> NaiveDateTime {
        (self.clock)()
    }

    pub(crate) async fn fetch<R: DeserializeOwned>(
        &self,
        table: Table,
        query: &Query,
    ) -> ClinicResult<Vec<R>> {
        let rows = self.backend.select(self.token(), table, query).await?;
        Ok(clinic_wire::parse_rows(rows)?)
    }

    pub(crate) async fn fetch_by_id<R: DeserializeOwned>(
        &self,
        table: Table,
        id: Uuid,
        query: Query,
    ) -> ClinicResult<R> {
        let rows = self.backend.select(self.token(), table, &query.id(id)).await?;
        let row = rows.into_iter().next().ok_or_else(|| ClinicError::NotFound {
            table: table.as_str(),
            id: id.to_string(),
        })?;
        Ok(clinic_wire::parse_row(row)?)
    }

    pub(crate) async fn insert<P, R>(&self, table: Table, payload: &P) -> ClinicResult<R>
    where
        P: Serialize + Sync,
        R: DeserializeOwned,
    {
        let value = clinic_wire::to_value(payload)?;
        let row = self.backend.insert(self.token(), table, value).await?;
        Ok(clinic_wire::parse_row(row)?)
    }

    pub(crate) async fn update<P, R>(&self, table: Table, id: Uuid, payload: &P) -> ClinicResult<R>
    where
        P: Serialize + Sync,
        R: DeserializeOwned,
    {
        let value = clinic_wire::to_value(payload)?;
        let row = self.backend.update(self.token(), table, id, value).await?;
        Ok(clinic_wire::parse_row(row)?)
    }

    pub(crate) async fn delete(&self, table: Table, id: Uuid) -> ClinicResult<()> {
        self.backend.delete(self.token(), table, id).await
    }

    /// Awaits `operation`; on failure logs and publishes `message` before returning the error.
    pub(crate) async fn reported<T>(
        &self,
        message: &'static str,
        operation: impl Future<Output = ClinicResult<T>>,
    ) -> ClinicResult<T> {
        match operation.await {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::error!("{message}: {e}");
                self.events.error(message);
                Err(e)
            }
        }
    }

    /// Surfaces a failed validation without touching the backend.
    pub(crate) fn rejected<T>(&self, report: ValidationReport) -> ClinicResult<T> {
        tracing::warn!(errors = ?report.errors, "validation failed");
        if let Some(first) = report.errors.first() {
            self.events.notify(NotificationLevel::Warning, first.clone());
        }
        Err(ClinicError::Validation(report))
    }
}

/// Lowercased substring match used for in-process search over display fields.
pub(crate) fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(needle))
}

/// Search needle for columns stored as bare digits (CPF, phone): masked input like
/// `529.982` or `(11) 9876` is reduced to its digits.
pub(crate) fn digit_needle(term: &str) -> Option<String> {
    let term = term.trim();
    let looks_numeric = !term.is_empty()
        && term
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '(' | ')' | ' ' | '/'));
    let digits = clinic_types::digits_only(term);
    (looks_numeric && !digits.is_empty()).then_some(digits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digit_needle_only_for_numeric_terms() {
        assert_eq!(digit_needle("529.982-24"), Some("52998224".into()));
        assert_eq!(digit_needle("(11) 9876"), Some("119876".into()));
        assert_eq!(digit_needle("Maria"), None);
        assert_eq!(digit_needle("  "), None);
    }

    #[test]
    fn contains_ci_ignores_case() {
        assert!(contains_ci(Some("Maria Silva"), "silva"));
        assert!(!contains_ci(None, "silva"));
    }
}
