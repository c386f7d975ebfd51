//! Backend abstraction over the hosted data store.
//!
//! Everything the services need from the backend goes through two traits:
//!
//! - [`Backend`]: row-level select/insert/update/delete on the eight clinic tables
//! - [`Authenticator`]: email+password sign-in, token lookup, sign-out
//!
//! Neither trait keeps a current user. Every data call takes the caller's access token
//! (`None` means anonymous), so one backend can serve many signed-in callers at once.
//!
//! Rows cross this boundary as `serde_json::Value`; the services parse them into typed rows
//! with `clinic_wire::parse_row`. Two implementations exist: [`RemoteBackend`] speaks the
//! PostgREST/GoTrue conventions of the hosted backend, [`MemoryBackend`] keeps everything
//! in-process and serves as the test fake and the `CLINIC_BACKEND=memory` mode.

mod memory;
mod remote;

pub use memory::MemoryBackend;
pub use remote::RemoteBackend;

use crate::ClinicResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use utoipa::ToSchema;
use uuid::Uuid;

// ============================================================================
// Tables
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    Appointments,
    Patients,
    Employees,
    Services,
    Closures,
    ClinicHours,
    ClinicAddresses,
    Convenios,
}

impl Table {
    pub const ALL: [Table; 8] = [
        Table::Appointments,
        Table::Patients,
        Table::Employees,
        Table::Services,
        Table::Closures,
        Table::ClinicHours,
        Table::ClinicAddresses,
        Table::Convenios,
    ];

    /// Remote table name.
    pub fn as_str(self) -> &'static str {
        match self {
            Table::Appointments => "appointments",
            Table::Patients => "patients",
            Table::Employees => "employees",
            Table::Services => "services",
            Table::Closures => "closures",
            Table::ClinicHours => "clinic_hours",
            Table::ClinicAddresses => "clinic_addresses",
            Table::Convenios => "convenios",
        }
    }

    /// Column other tables use to reference a row of this table.
    pub fn foreign_key(self) -> &'static str {
        match self {
            Table::Appointments => "appointment_id",
            Table::Patients => "patient_id",
            Table::Employees => "employee_id",
            Table::Services => "service_id",
            Table::Closures => "closure_id",
            Table::ClinicHours => "clinic_hours_id",
            Table::ClinicAddresses => "clinic_address_id",
            Table::Convenios => "convenio_id",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Queries
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    /// Case-insensitive SQL `LIKE`; `%` matches any run of characters.
    ILike,
    /// Value is a JSON array of accepted values.
    In,
}

impl FilterOp {
    pub fn as_str(self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::Neq => "neq",
            FilterOp::Gt => "gt",
            FilterOp::Gte => "gte",
            FilterOp::Lt => "lt",
            FilterOp::Lte => "lte",
            FilterOp::ILike => "ilike",
            FilterOp::In => "in",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
    pub value: Value,
}

/// Related row embedded under the related table's name, resolved through its foreign key.
#[derive(Clone, Debug, PartialEq)]
pub struct Embed {
    pub table: Table,
    pub columns: Vec<String>,
}

/// Case-insensitive substring match of `term` over any of `columns`.
#[derive(Clone, Debug, PartialEq)]
pub struct Search {
    pub columns: Vec<String>,
    pub term: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// A select over one table: filters, an optional free-text search, embeds, order and range.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub search: Option<Search>,
    pub embeds: Vec<Embed>,
    pub order: Vec<Order>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, column: &str, op: FilterOp, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            column: column.to_string(),
            op,
            value: value.into(),
        });
        self
    }

    pub fn eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(column, FilterOp::Eq, value)
    }

    pub fn neq(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(column, FilterOp::Neq, value)
    }

    pub fn gt(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(column, FilterOp::Gt, value)
    }

    pub fn gte(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(column, FilterOp::Gte, value)
    }

    pub fn lt(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(column, FilterOp::Lt, value)
    }

    pub fn lte(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(column, FilterOp::Lte, value)
    }

    pub fn ilike(self, column: &str, pattern: impl Into<String>) -> Self {
        self.filter(column, FilterOp::ILike, Value::String(pattern.into()))
    }

    pub fn is_in<V: Into<Value>>(self, column: &str, values: impl IntoIterator<Item = V>) -> Self {
        let values = values.into_iter().map(Into::into).collect::<Vec<Value>>();
        self.filter(column, FilterOp::In, Value::Array(values))
    }

    pub fn id(self, id: Uuid) -> Self {
        self.eq("id", id.to_string())
    }

    /// Free-text search; blank terms are ignored.
    pub fn search(mut self, columns: &[&str], term: &str) -> Self {
        let term = term.trim();
        if !term.is_empty() {
            self.search = Some(Search {
                columns: columns.iter().map(|c| c.to_string()).collect(),
                term: term.to_string(),
            });
        }
        self
    }

    pub fn embed(mut self, table: Table, columns: &[&str]) -> Self {
        self.embeds.push(Embed {
            table,
            columns: columns.iter().map(|c| c.to_string()).collect(),
        });
        self
    }

    pub fn order_by(mut self, column: &str, ascending: bool) -> Self {
        self.order.push(Order {
            column: column.to_string(),
            ascending,
        });
        self
    }

    pub fn range(mut self, offset: usize, limit: usize) -> Self {
        self.offset = Some(offset);
        self.limit = Some(limit);
        self
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Row-level access to the clinic tables.
///
/// `token` is the caller's access token; `None` calls anonymously with the project key.
pub trait Backend: Send + Sync {
    fn select(
        &self,
        token: Option<&str>,
        table: Table,
        query: &Query,
    ) -> impl Future<Output = ClinicResult<Vec<Value>>> + Send;

    /// Inserts one row and returns it as stored (with id and timestamps).
    fn insert(
        &self,
        token: Option<&str>,
        table: Table,
        row: Value,
    ) -> impl Future<Output = ClinicResult<Value>> + Send;

    /// Applies `patch` to the row with `id` and returns the stored row.
    fn update(
        &self,
        token: Option<&str>,
        table: Table,
        id: Uuid,
        patch: Value,
    ) -> impl Future<Output = ClinicResult<Value>> + Send;

    fn delete(
        &self,
        token: Option<&str>,
        table: Table,
        id: Uuid,
    ) -> impl Future<Output = ClinicResult<()>> + Send;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: String,
    pub email: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub user: SessionUser,
}

/// Token issuing and checking. Sessions are handed to the caller and never kept here.
pub trait Authenticator: Send + Sync {
    fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = ClinicResult<Session>> + Send;

    /// The user `token` belongs to; `Unauthenticated` when the token is unknown or revoked.
    fn user(&self, token: &str) -> impl Future<Output = ClinicResult<SessionUser>> + Send;

    /// Revokes `token`.
    fn sign_out(&self, token: &str) -> impl Future<Output = ClinicResult<()>> + Send;
}

// ============================================================================
// Runtime selection
// ============================================================================

/// Backend chosen at startup.
#[derive(Debug)]
pub enum AnyBackend {
    Remote(RemoteBackend),
    Memory(MemoryBackend),
}

impl Backend for AnyBackend {
    async fn select(
        &self,
        token: Option<&str>,
        table: Table,
        query: &Query,
    ) -> ClinicResult<Vec<Value>> {
        match self {
            AnyBackend::Remote(b) => b.select(token, table, query).await,
            AnyBackend::Memory(b) => b.select(token, table, query).await,
        }
    }

    async fn insert(&self, token: Option<&str>, table: Table, row: Value) -> ClinicResult<Value> {
        match self {
            AnyBackend::Remote(b) => b.insert(token, table, row).await,
            AnyBackend::Memory(b) => b.insert(token, table, row).await,
        }
    }

    async fn update(
        &self,
        token: Option<&str>,
        table: Table,
        id: Uuid,
        patch: Value,
    ) -> ClinicResult<Value> {
        match self {
            AnyBackend::Remote(b) => b.update(token, table, id, patch).await,
            AnyBackend::Memory(b) => b.update(token, table, id, patch).await,
        }
    }

    async fn delete(&self, token: Option<&str>, table: Table, id: Uuid) -> ClinicResult<()> {
        match self {
            AnyBackend::Remote(b) => b.delete(token, table, id).await,
            AnyBackend::Memory(b) => b.delete(token, table, id).await,
        }
    }
}

impl Authenticator for AnyBackend {
    async fn sign_in(&self, email: &str, password: &str) -> ClinicResult<Session> {
        match self {
            AnyBackend::Remote(b) => b.sign_in(email, password).await,
            AnyBackend::Memory(b) => b.sign_in(email, password).await,
        }
    }

    async fn user(&self, token: &str) -> ClinicResult<SessionUser> {
        match self {
            AnyBackend::Remote(b) => b.user(token).await,
            AnyBackend::Memory(b) => b.user(token).await,
        }
    }

    async fn sign_out(&self, token: &str) -> ClinicResult<()> {
        match self {
            AnyBackend::Remote(b) => b.sign_out(token).await,
            AnyBackend::Memory(b) => b.sign_out(token).await,
        }
    }
}
