use super::shared::Repo;
use crate::backend::{Backend, Query, Table};
use crate::constants::messages;
use crate::events::ClinicEvent;
use crate::validation::{validate_closure, ValidationReport};
use crate::ClinicResult;
use chrono::NaiveDate;
use clinic_wire::closure::{self, Closure, ClosureInput, ClosureRow};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClosureStats {
    pub total: usize,
    pub recurring: usize,
    /// One-off closures that have not ended yet.
    pub upcoming: usize,
}

pub struct ClosureService<B> {
    repo: Repo<B>,
}

impl<B: Backend> ClosureService<B> {
    pub(crate) fn new(repo: Repo<B>) -> Self {
        Self { repo }
    }

    pub async fn get_all(&self) -> ClinicResult<Vec<Closure>> {
        let rows: Vec<ClosureRow> = self
            .repo
            .reported(
                messages::LOAD_CLOSURES,
                self.repo
                    .fetch(Table::Closures, &Query::new().order_by("start_date", true)),
            )
            .await?;
        Ok(rows.into_iter().map(closure::from_row).collect())
    }

    pub async fn get_by_id(&self, id: Uuid) -> ClinicResult<Closure> {
        let row: ClosureRow = self
            .repo
            .reported(
                messages::LOAD_CLOSURES,
                self.repo.fetch_by_id(Table::Closures, id, Query::new()),
            )
            .await?;
        Ok(closure::from_row(row))
    }

    pub fn validate(&self, input: &ClosureInput) -> ValidationReport {
        validate_closure(input)
    }

    pub async fn create(&self, input: &ClosureInput) -> ClinicResult<Closure> {
        let report = self.validate(input);
        if !report.is_valid {
            return self.repo.rejected(report);
        }
        let row: ClosureRow = self
            .repo
            .reported(
                messages::CREATE_CLOSURE,
                self.repo
                    .insert(Table::Closures, &closure::input_to_insert(input)),
            )
            .await?;
        self.repo.events().publish(ClinicEvent::RefreshDialogData);
        Ok(closure::from_row(row))
    }

    pub async fn update(&self, id: Uuid, input: &ClosureInput) -> ClinicResult<Closure> {
        let report = self.validate(input);
        if !report.is_valid {
            return self.repo.rejected(report);
        }
        let row: ClosureRow = self
            .repo
            .reported(
                messages::UPDATE_CLOSURE,
                self.repo
                    .update(Table::Closures, id, &closure::input_to_insert(input)),
            )
            .await?;
        self.repo.events().publish(ClinicEvent::RefreshDialogData);
        Ok(closure::from_row(row))
    }

    pub async fn delete(&self, id: Uuid) -> ClinicResult<()> {
        self.repo
            .reported(
                messages::DELETE_CLOSURE,
                self.repo.delete(Table::Closures, id),
            )
            .await?;
        self.repo.events().publish(ClinicEvent::RefreshDialogData);
        Ok(())
    }

    /// Closures in effect on `date`, yearly recurrences included.
    pub async fn closures_on(&self, date: NaiveDate) -> ClinicResult<Vec<Closure>> {
        let closures = self.get_all().await?;
        Ok(closures.into_iter().filter(|c| c.covers(date)).collect())
    }

    pub async fn get_stats(&self) -> ClinicResult<ClosureStats> {
        let all = self.get_all().await?;
        Ok(closure_stats(&all, self.repo.now().date()))
    }
}

pub fn closure_stats(closures: &[Closure], today: NaiveDate) -> ClosureStats {
    ClosureStats {
        total: closures.len(),
        recurring: closures.iter().filter(|c| c.recurring).count(),
        upcoming: closures
            .iter()
            .filter(|c| !c.recurring && c.end_date >= today)
            .count(),
    }
}
