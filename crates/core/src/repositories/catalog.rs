//! The clinic's service catalog (procedures offered, with price and duration).

use super::shared::Repo;
use crate::backend::{Backend, Query, Table};
use crate::constants::messages;
use crate::events::ClinicEvent;
use crate::validation::{validate_service, ValidationReport};
use crate::ClinicResult;
use clinic_wire::service::{self, ClinicService, ServiceCategory, ServiceInput, ServiceRow};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

const SEARCH_COLUMNS: [&str; 2] = ["name", "description"];

#[derive(Clone, Debug, Default, PartialEq, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ServiceFilter {
    pub category: Option<ServiceCategory>,
    pub active: Option<bool>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStats {
    pub total: usize,
    pub active: usize,
    pub average_price: f64,
    pub most_used: Option<ClinicService>,
}

pub struct CatalogService<B> {
    repo: Repo<B>,
}

impl<B: Backend> CatalogService<B> {
    pub(crate) fn new(repo: Repo<B>) -> Self {
        Self { repo }
    }

    async fn load(&self, query: &Query) -> ClinicResult<Vec<ClinicService>> {
        let rows: Vec<ServiceRow> = self
            .repo
            .reported(messages::LOAD_SERVICES, self.repo.fetch(Table::Services, query))
            .await?;
        Ok(rows.into_iter().map(service::from_row).collect())
    }

    pub async fn get_all(&self) -> ClinicResult<Vec<ClinicService>> {
        self.load(&Query::new().order_by("name", true)).await
    }

    pub async fn get_by_id(&self, id: Uuid) -> ClinicResult<ClinicService> {
        let row: ServiceRow = self
            .repo
            .reported(
                messages::LOAD_SERVICE,
                self.repo.fetch_by_id(Table::Services, id, Query::new()),
            )
            .await?;
        Ok(service::from_row(row))
    }

    pub fn validate(&self, input: &ServiceInput) -> ValidationReport {
        validate_service(input)
    }

    pub async fn create(&self, input: &ServiceInput) -> ClinicResult<ClinicService> {
        let report = self.validate(input);
        if !report.is_valid {
            return self.repo.rejected(report);
        }

        let insert = service::input_to_insert(input);
        let row: ServiceRow = self
            .repo
            .reported(
                messages::CREATE_SERVICE,
                self.repo.insert(Table::Services, &insert),
            )
            .await?;
        let created = service::from_row(row);

        tracing::info!(service_id = %created.id, "service created");
        let events = self.repo.events();
        events.publish(ClinicEvent::ServiceCreated { id: created.id });
        events.publish(ClinicEvent::RefreshDialogData);
        events.success(messages::SERVICE_CREATED);
        Ok(created)
    }

    pub async fn update(&self, id: Uuid, input: &ServiceInput) -> ClinicResult<ClinicService> {
        let report = self.validate(input);
        if !report.is_valid {
            return self.repo.rejected(report);
        }

        let update = service::to_update(input);
        let row: ServiceRow = self
            .repo
            .reported(
                messages::UPDATE_SERVICE,
                self.repo.update(Table::Services, id, &update),
            )
            .await?;

        let events = self.repo.events();
        events.publish(ClinicEvent::RefreshDialogData);
        events.success(messages::SERVICE_UPDATED);
        Ok(service::from_row(row))
    }

    pub async fn delete(&self, id: Uuid) -> ClinicResult<()> {
        self.repo
            .reported(
                messages::DELETE_SERVICE,
                self.repo.delete(Table::Services, id),
            )
            .await?;

        let events = self.repo.events();
        events.publish(ClinicEvent::RefreshDialogData);
        events.success(messages::SERVICE_DELETED);
        Ok(())
    }

    pub async fn set_active(&self, id: Uuid, active: bool) -> ClinicResult<ClinicService> {
        let row: ServiceRow = self
            .repo
            .reported(
                messages::UPDATE_SERVICE,
                self.repo
                    .update(Table::Services, id, &json!({ "active": active })),
            )
            .await?;
        self.repo.events().publish(ClinicEvent::RefreshDialogData);
        Ok(service::from_row(row))
    }

    /// Bumps `times_used` after an appointment for this service is completed.
    /// Counts one more use of the service. Any failure, including a missing service, is
    /// reported once as an update failure.
    pub async fn increment_usage(&self, id: Uuid) -> ClinicResult<ClinicService> {
        let row: ServiceRow = self
            .repo
            .reported(messages::UPDATE_SERVICE, async {
                let current: ServiceRow =
                    self.repo.fetch_by_id(Table::Services, id, Query::new()).await?;
                self.repo
                    .update(
                        Table::Services,
                        id,
                        &json!({ "times_used": current.times_used.saturating_add(1) }),
                    )
                    .await
            })
            .await?;
        Ok(service::from_row(row))
    }

    pub async fn search(&self, term: &str) -> ClinicResult<Vec<ClinicService>> {
        self.load(
            &Query::new()
                .search(&SEARCH_COLUMNS, term)
                .order_by("name", true),
        )
        .await
    }

    pub async fn filter(&self, filter: &ServiceFilter) -> ClinicResult<Vec<ClinicService>> {
        let mut query = Query::new().order_by("name", true);
        if let Some(category) = filter.category {
            query = query.eq("category", category.as_str());
        }
        if let Some(active) = filter.active {
            query = query.eq("active", active);
        }
        if let Some(min) = filter.min_price {
            query = query.gte("price", min);
        }
        if let Some(max) = filter.max_price {
            query = query.lte("price", max);
        }
        self.load(&query).await
    }

    /// Active services, for booking forms.
    pub async fn active(&self) -> ClinicResult<Vec<ClinicService>> {
        self.filter(&ServiceFilter {
            active: Some(true),
            ..ServiceFilter::default()
        })
        .await
    }

    pub async fn get_stats(&self) -> ClinicResult<ServiceStats> {
        let services = self.get_all().await?;
        Ok(service_stats(&services))
    }
}

pub fn service_stats(services: &[ClinicService]) -> ServiceStats {
    let average_price = if services.is_empty() {
        0.0
    } else {
        services.iter().map(|s| s.price).sum::<f64>() / services.len() as f64
    };
    let most_used = services
        .iter()
        .filter(|s| s.times_used > 0)
        .max_by_key(|s| s.times_used)
        .cloned();

    ServiceStats {
        total: services.len(),
        active: services.iter().filter(|s| s.active).count(),
        average_price,
        most_used,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{memory_clinic, service_input};

    #[tokio::test]
    async fn filter_by_category_active_and_price() {
        let (clinic, _backend) = memory_clinic();
        let catalog = clinic.services();
        catalog
            .create(&service_input("Limpeza", Some(30), 150.0))
            .await
            .expect("create");
        let canal = catalog
            .create(&service_input("Canal", Some(90), 900.0))
            .await
            .expect("create");
        catalog.set_active(canal.id, false).await.expect("deactivate");

        let active = catalog.active().await.expect("active");
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "Limpeza");

        let expensive = catalog
            .filter(&ServiceFilter {
                min_price: Some(500.0),
                ..ServiceFilter::default()
            })
            .await
            .expect("filter");
        assert_eq!(expensive.len(), 1);
        assert_eq!(expensive[0].name, "Canal");
    }

    #[tokio::test]
    async fn usage_counter_feeds_stats() {
        let (clinic, _backend) = memory_clinic();
        let catalog = clinic.services();
        let limpeza = catalog
            .create(&service_input("Limpeza", Some(30), 100.0))
            .await
            .expect("create");
        catalog
            .create(&service_input("Clareamento", Some(60), 300.0))
            .await
            .expect("create");

        assert_eq!(
            catalog.increment_usage(limpeza.id).await.expect("bump").times_used,
            1
        );
        catalog.increment_usage(limpeza.id).await.expect("bump");

        let stats = catalog.get_stats().await.expect("stats");
        assert_eq!(stats.total, 2);
        assert_eq!(stats.active, 2);
        assert!((stats.average_price - 200.0).abs() < f64::EPSILON);
        assert_eq!(stats.most_used.map(|s| s.times_used), Some(2));
    }

    #[tokio::test]
    async fn update_keeps_usage_counter() {
        let (clinic, _backend) = memory_clinic();
        let catalog = clinic.services();
        let created = catalog
            .create(&service_input("Limpeza", Some(30), 100.0))
            .await
            .expect("create");
        catalog.increment_usage(created.id).await.expect("bump");

        let updated = catalog
            .update(created.id, &service_input("Limpeza completa", Some(45), 120.0))
            .await
            .expect("update");
        assert_eq!(updated.name, "Limpeza completa");
        assert_eq!(updated.times_used, 1);
    }
}
