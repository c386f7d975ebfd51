//! Insurance plans accepted by the clinic.

use super::shared::Repo;
use crate::backend::{Backend, Query, Table};
use crate::constants::messages;
use crate::events::ClinicEvent;
use crate::validation::{validate_convenio, ValidationReport};
use crate::ClinicResult;
use clinic_wire::convenio::{self, Convenio, ConvenioInput, ConvenioRow};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConvenioStats {
    pub total: usize,
    pub active: usize,
    /// Mean over plans that declare a discount.
    pub average_discount: Option<f64>,
}

pub struct ConvenioService<B> {
    repo: Repo<B>,
}

impl<B: Backend> ConvenioService<B> {
    pub(crate) fn new(repo: Repo<B>) -> Self {
        Self { repo }
    }

    async fn load(&self, query: &Query) -> ClinicResult<Vec<Convenio>> {
        let rows: Vec<ConvenioRow> = self
            .repo
            .reported(messages::LOAD_CONVENIOS, self.repo.fetch(Table::Convenios, query))
            .await?;
        Ok(rows.into_iter().map(convenio::from_row).collect())
    }

    pub async fn get_all(&self) -> ClinicResult<Vec<Convenio>> {
        self.load(&Query::new().order_by("name", true)).await
    }

    pub async fn active(&self) -> ClinicResult<Vec<Convenio>> {
        self.load(&Query::new().eq("active", true).order_by("name", true))
            .await
    }

    pub async fn get_by_id(&self, id: Uuid) -> ClinicResult<Convenio> {
        let row: ConvenioRow = self
            .repo
            .reported(
                messages::LOAD_CONVENIOS,
                self.repo.fetch_by_id(Table::Convenios, id, Query::new()),
            )
            .await?;
        Ok(convenio::from_row(row))
    }

    pub async fn search(&self, term: &str) -> ClinicResult<Vec<Convenio>> {
        self.load(
            &Query::new()
                .search(&["name", "code"], term)
                .order_by("name", true),
        )
        .await
    }

    pub fn validate(&self, input: &ConvenioInput) -> ValidationReport {
        validate_convenio(input)
    }

    pub async fn create(&self, input: &ConvenioInput) -> ClinicResult<Convenio> {
        let report = self.validate(input);
        if !report.is_valid {
            return self.repo.rejected(report);
        }
        let row: ConvenioRow = self
            .repo
            .reported(
                messages::CREATE_CONVENIO,
                self.repo
                    .insert(Table::Convenios, &convenio::input_to_insert(input)),
            )
            .await?;
        self.repo.events().publish(ClinicEvent::RefreshDialogData);
        Ok(convenio::from_row(row))
    }

    pub async fn update(&self, id: Uuid, input: &ConvenioInput) -> ClinicResult<Convenio> {
        let report = self.validate(input);
        if !report.is_valid {
            return self.repo.rejected(report);
        }
        let row: ConvenioRow = self
            .repo
            .reported(
                messages::UPDATE_CONVENIO,
                self.repo
                    .update(Table::Convenios, id, &convenio::input_to_insert(input)),
            )
            .await?;
        self.repo.events().publish(ClinicEvent::RefreshDialogData);
        Ok(convenio::from_row(row))
    }

    pub async fn delete(&self, id: Uuid) -> ClinicResult<()> {
        self.repo
            .reported(
                messages::DELETE_CONVENIO,
                self.repo.delete(Table::Convenios, id),
            )
            .await?;
        self.repo.events().publish(ClinicEvent::RefreshDialogData);
        Ok(())
    }

    pub async fn get_stats(&self) -> ClinicResult<ConvenioStats> {
        let all = self.get_all().await?;
        Ok(convenio_stats(&all))
    }
}

pub fn convenio_stats(convenios: &[Convenio]) -> ConvenioStats {
    let discounts: Vec<f64> = convenios
        .iter()
        .filter_map(|c| c.discount_percentage)
        .collect();
    let average_discount = if discounts.is_empty() {
        None
    } else {
        Some(discounts.iter().sum::<f64>() / discounts.len() as f64)
    };
    ConvenioStats {
        total: convenios.len(),
        active: convenios.iter().filter(|c| c.active).count(),
        average_discount,
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::memory_clinic;
    use clinic_wire::ConvenioInput;

    fn input(name: &str, active: bool) -> ConvenioInput {
        ConvenioInput {
            name: name.into(),
            code: Some(format!("{}-01", name.to_uppercase())),
            discount_percentage: Some(10.0),
            phone: Some("(11) 3456-7890".into()),
            email: None,
            active,
        }
    }

    #[tokio::test]
    async fn active_and_search() {
        let (clinic, _backend) = memory_clinic();
        let convenios = clinic.convenios();
        let amil = convenios.create(&input("Amil", true)).await.expect("create");
        convenios
            .create(&input("Bradesco", false))
            .await
            .expect("create");

        assert_eq!(amil.phone.as_deref(), Some("1134567890"));

        let active = convenios.active().await.expect("active");
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "Amil");

        let found = convenios.search("brad").await.expect("search");
        assert_eq!(found.len(), 1);

        let stats = convenios.get_stats().await.expect("stats");
        assert_eq!(stats.total, 2);
        assert_eq!(stats.active, 1);
        assert_eq!(stats.average_discount, Some(10.0));

        convenios.delete(amil.id).await.expect("delete");
        assert_eq!(convenios.get_all().await.expect("all").len(), 1);
    }
}
