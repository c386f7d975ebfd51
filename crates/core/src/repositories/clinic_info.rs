//! Clinic-wide settings: opening hours per weekday and postal addresses.

use super::shared::Repo;
use crate::backend::{Backend, Query, Table};
use crate::constants::messages;
use crate::{ClinicError, ClinicResult};
use clinic_wire::clinic::{
    self, ClinicAddress, ClinicAddressInput, ClinicAddressRow, ClinicHours, ClinicHoursInput,
    ClinicHoursRow,
};
use clinic_wire::Weekday;
use uuid::Uuid;

pub struct ClinicInfoService<B> {
    repo: Repo<B>,
}

impl<B: Backend> ClinicInfoService<B> {
    pub(crate) fn new(repo: Repo<B>) -> Self {
        Self { repo }
    }

    /// Opening hours ordered Monday to Sunday.
    pub async fn hours(&self) -> ClinicResult<Vec<ClinicHours>> {
        let rows: Vec<ClinicHoursRow> = self
            .repo
            .reported(
                messages::LOAD_CLINIC_HOURS,
                self.repo.fetch(Table::ClinicHours, &Query::new()),
            )
            .await?;
        let mut hours = rows
            .into_iter()
            .map(clinic::hours_from_row)
            .collect::<Vec<_>>();
        hours.sort_by_key(|h| h.weekday);
        Ok(hours)
    }

    pub async fn hours_for(&self, weekday: Weekday) -> ClinicResult<Option<ClinicHours>> {
        let weekday_value = serde_json::to_value(weekday)?;
        let rows: Vec<ClinicHoursRow> = self
            .repo
            .reported(
                messages::LOAD_CLINIC_HOURS,
                self.repo
                    .fetch(Table::ClinicHours, &Query::new().eq("weekday", weekday_value)),
            )
            .await?;
        Ok(rows.into_iter().next().map(clinic::hours_from_row))
    }

    /// Inserts or replaces the hours of one weekday.
    pub async fn upsert_hours(&self, input: &ClinicHoursInput) -> ClinicResult<ClinicHours> {
        if input.is_open && input.open_time >= input.close_time {
            let err = ClinicError::InvalidInput(
                "opening time must be before closing time".into(),
            );
            return self
                .repo
                .reported(messages::SAVE_CLINIC_HOURS, async { Err(err) })
                .await;
        }

        let existing = self.hours_for(input.weekday).await?;
        let payload = clinic::hours_to_insert(input);
        let row: ClinicHoursRow = match existing {
            Some(current) => {
                self.repo
                    .reported(
                        messages::SAVE_CLINIC_HOURS,
                        self.repo.update(Table::ClinicHours, current.id, &payload),
                    )
                    .await?
            }
            None => {
                self.repo
                    .reported(
                        messages::SAVE_CLINIC_HOURS,
                        self.repo.insert(Table::ClinicHours, &payload),
                    )
                    .await?
            }
        };
        Ok(clinic::hours_from_row(row))
    }

    /// Addresses with the primary one first.
    pub async fn addresses(&self) -> ClinicResult<Vec<ClinicAddress>> {
        let rows: Vec<ClinicAddressRow> = self
            .repo
            .reported(
                messages::LOAD_CLINIC_ADDRESS,
                self.repo.fetch(
                    Table::ClinicAddresses,
                    &Query::new().order_by("is_primary", false),
                ),
            )
            .await?;
        Ok(rows.into_iter().map(clinic::address_from_row).collect())
    }

    pub async fn primary_address(&self) -> ClinicResult<Option<ClinicAddress>> {
        let addresses = self.addresses().await?;
        let primary = addresses.iter().position(|a| a.is_primary).unwrap_or(0);
        Ok(addresses.into_iter().nth(primary))
    }

    pub async fn create_address(&self, input: &ClinicAddressInput) -> ClinicResult<ClinicAddress> {
        let row: ClinicAddressRow = self
            .repo
            .reported(
                messages::SAVE_CLINIC_ADDRESS,
                self.repo
                    .insert(Table::ClinicAddresses, &clinic::address_to_insert(input)),
            )
            .await?;
        Ok(clinic::address_from_row(row))
    }

    pub async fn update_address(
        &self,
        id: Uuid,
        input: &ClinicAddressInput,
    ) -> ClinicResult<ClinicAddress> {
        let row: ClinicAddressRow = self
            .repo
            .reported(
                messages::SAVE_CLINIC_ADDRESS,
                self.repo
                    .update(Table::ClinicAddresses, id, &clinic::address_to_insert(input)),
            )
            .await?;
        Ok(clinic::address_from_row(row))
    }
}
