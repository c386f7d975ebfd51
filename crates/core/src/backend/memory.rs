//! In-process backend.
//!
//! Implements the same select semantics the hosted backend offers (filters, `or` search,
//! embedded resources, ordering, ranges) over JSON rows held in memory. Rows get a fresh
//! `id` and `created_at`/`updated_at` timestamps on insert, like the hosted tables.
//!
//! Sign-in issues opaque tokens. A data call made with a token that was never issued or has
//! been signed out fails with `Unauthenticated`, as the hosted backend rejects a bad JWT.

use super::{Authenticator, Backend, Filter, FilterOp, Query, Session, SessionUser, Table};
use crate::{ClinicError, ClinicResult};
use chrono::Local;
use clinic_wire::timestamp::format_timestamp;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct MemoryBackend {
    tables: Mutex<HashMap<Table, Vec<Value>>>,
    users: Mutex<HashMap<String, String>>,
    tokens: Mutex<HashMap<String, SessionUser>>,
    unavailable: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a user that may sign in with `email` and `password`.
    pub fn with_user(self, email: &str, password: &str) -> Self {
        lock(&self.users).insert(email.trim().to_lowercase(), password.to_string());
        self
    }

    /// Appends rows to `table` as-is.
    pub fn seed(&self, table: Table, rows: impl IntoIterator<Item = Value>) {
        lock(&self.tables).entry(table).or_default().extend(rows);
    }

    /// Snapshot of every row currently in `table`.
    pub fn rows(&self, table: Table) -> Vec<Value> {
        lock(&self.tables).get(&table).cloned().unwrap_or_default()
    }

    /// While set, every call fails like an unreachable backend.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, AtomicOrdering::SeqCst);
    }

    /// Users currently holding a live token.
    pub fn signed_in(&self) -> usize {
        lock(&self.tokens).len()
    }

    fn authorize(&self, token: Option<&str>) -> ClinicResult<()> {
        match token {
            Some(token) if !lock(&self.tokens).contains_key(token) => Err(
                ClinicError::Unauthenticated("invalid or revoked access token".into()),
            ),
            _ => Ok(()),
        }
    }

    fn ensure_available(&self) -> ClinicResult<()> {
        if self.unavailable.load(AtomicOrdering::SeqCst) {
            return Err(ClinicError::Remote {
                status: 503,
                message: "backend unavailable".into(),
            });
        }
        Ok(())
    }

    fn now() -> Value {
        Value::String(format_timestamp(&Local::now().naive_local()))
    }
}

impl Backend for MemoryBackend {
    async fn select(
        &self,
        token: Option<&str>,
        table: Table,
        query: &Query,
    ) -> ClinicResult<Vec<Value>> {
        self.ensure_available()?;
        self.authorize(token)?;
        let tables = lock(&self.tables);
        let rows = tables.get(&table).map(Vec::as_slice).unwrap_or_default();

        let mut selected = rows
            .iter()
            .filter(|row| query.filters.iter().all(|f| matches_filter(row, f)))
            .filter(|row| {
                query.search.as_ref().map_or(true, |search| {
                    let term = search.term.to_lowercase();
                    search.columns.iter().any(|column| {
                        row.get(column)
                            .map(value_text)
                            .is_some_and(|text| text.to_lowercase().contains(&term))
                    })
                })
            })
            .cloned()
            .collect::<Vec<_>>();

        if !query.order.is_empty() {
            selected.sort_by(|a, b| {
                query
                    .order
                    .iter()
                    .map(|order| {
                        let ordering = compare_nulls_last(a.get(&order.column), b.get(&order.column));
                        match (order.ascending, ordering) {
                            (false, Some(o)) => o.reverse(),
                            (_, Some(o)) => o,
                            (_, None) => Ordering::Equal,
                        }
                    })
                    .find(|o| *o != Ordering::Equal)
                    .unwrap_or(Ordering::Equal)
            });
        }

        let offset = query.offset.unwrap_or(0);
        let limit = query.limit.unwrap_or(usize::MAX);
        let mut page = selected.into_iter().skip(offset).take(limit).collect::<Vec<_>>();

        for embed in &query.embeds {
            let related = tables.get(&embed.table).map(Vec::as_slice).unwrap_or_default();
            let fk = embed.table.foreign_key();
            for row in &mut page {
                let target = row.get(fk).cloned().unwrap_or(Value::Null);
                let found = related
                    .iter()
                    .find(|candidate| !target.is_null() && candidate.get("id") == Some(&target))
                    .map(|candidate| project(candidate, &embed.columns))
                    .unwrap_or(Value::Null);
                if let Some(object) = row.as_object_mut() {
                    object.insert(embed.table.as_str().to_string(), found);
                }
            }
        }

        Ok(page)
    }

    async fn insert(&self, token: Option<&str>, table: Table, row: Value) -> ClinicResult<Value> {
        self.ensure_available()?;
        self.authorize(token)?;
        let Value::Object(mut object) = row else {
            return Err(ClinicError::InvalidInput(format!(
                "insert into {table} expects a JSON object"
            )));
        };

        if object.get("id").map_or(true, Value::is_null) {
            object.insert("id".into(), Value::String(Uuid::new_v4().to_string()));
        }
        let now = Self::now();
        object.entry("created_at").or_insert_with(|| now.clone());
        object.entry("updated_at").or_insert(now);

        let stored = Value::Object(object);
        lock(&self.tables)
            .entry(table)
            .or_default()
            .push(stored.clone());
        Ok(stored)
    }

    async fn update(
        &self,
        token: Option<&str>,
        table: Table,
        id: Uuid,
        patch: Value,
    ) -> ClinicResult<Value> {
        self.ensure_available()?;
        self.authorize(token)?;
        let Value::Object(patch) = patch else {
            return Err(ClinicError::InvalidInput(format!(
                "update of {table} expects a JSON object"
            )));
        };

        let mut tables = lock(&self.tables);
        let row = tables
            .get_mut(&table)
            .and_then(|rows| rows.iter_mut().find(|row| row_has_id(row, id)))
            .and_then(Value::as_object_mut)
            .ok_or_else(|| ClinicError::NotFound {
                table: table.as_str(),
                id: id.to_string(),
            })?;

        for (key, value) in patch {
            if key != "id" {
                row.insert(key, value);
            }
        }
        row.insert("updated_at".into(), Self::now());
        Ok(Value::Object(row.clone()))
    }

    async fn delete(&self, token: Option<&str>, table: Table, id: Uuid) -> ClinicResult<()> {
        self.ensure_available()?;
        self.authorize(token)?;
        let mut tables = lock(&self.tables);
        let rows = tables.entry(table).or_default();
        let before = rows.len();
        rows.retain(|row| !row_has_id(row, id));
        if rows.len() == before {
            return Err(ClinicError::NotFound {
                table: table.as_str(),
                id: id.to_string(),
            });
        }
        Ok(())
    }
}

impl Authenticator for MemoryBackend {
    async fn sign_in(&self, email: &str, password: &str) -> ClinicResult<Session> {
        self.ensure_available()?;
        let email = email.trim().to_lowercase();
        let known = lock(&self.users).get(&email).is_some_and(|p| p == password);
        if !known {
            return Err(ClinicError::Unauthenticated(
                "Invalid login credentials".into(),
            ));
        }

        let session = Session {
            access_token: Uuid::new_v4().to_string(),
            refresh_token: Some(Uuid::new_v4().to_string()),
            expires_in: Some(3600),
            user: SessionUser {
                id: Uuid::new_v5(&Uuid::NAMESPACE_OID, email.as_bytes()).to_string(),
                email: Some(email),
            },
        };
        lock(&self.tokens).insert(session.access_token.clone(), session.user.clone());
        Ok(session)
    }

    async fn user(&self, token: &str) -> ClinicResult<SessionUser> {
        self.ensure_available()?;
        lock(&self.tokens)
            .get(token)
            .cloned()
            .ok_or_else(|| ClinicError::Unauthenticated("invalid or revoked access token".into()))
    }

    async fn sign_out(&self, token: &str) -> ClinicResult<()> {
        self.ensure_available()?;
        match lock(&self.tokens).remove(token) {
            Some(_) => Ok(()),
            None => Err(ClinicError::Unauthenticated(
                "invalid or revoked access token".into(),
            )),
        }
    }
}

// ============================================================================
// Row matching
// ============================================================================

fn row_has_id(row: &Value, id: Uuid) -> bool {
    row.get("id").and_then(Value::as_str) == Some(id.to_string().as_str())
}

fn project(row: &Value, columns: &[String]) -> Value {
    if columns.is_empty() || columns.iter().any(|c| c == "*") {
        return row.clone();
    }
    let mut object = Map::new();
    for column in columns {
        object.insert(
            column.clone(),
            row.get(column).cloned().unwrap_or(Value::Null),
        );
    }
    Value::Object(object)
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Null, _) | (_, Value::Null) => None,
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Number(x), Value::String(y)) => x.as_f64()?.partial_cmp(&y.parse::<f64>().ok()?),
        (Value::String(x), Value::Number(y)) => x.parse::<f64>().ok()?.partial_cmp(&y.as_f64()?),
        _ => None,
    }
}

fn compare_nulls_last(a: Option<&Value>, b: Option<&Value>) -> Option<Ordering> {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Some(Ordering::Equal),
        (None, Some(_)) => Some(Ordering::Greater),
        (Some(_), None) => Some(Ordering::Less),
        (Some(a), Some(b)) => compare(a, b),
    }
}

fn equals(a: &Value, b: &Value) -> bool {
    a == b || compare(a, b) == Some(Ordering::Equal) || (!a.is_null() && value_text(a) == value_text(b))
}

fn matches_filter(row: &Value, filter: &Filter) -> bool {
    let actual = row.get(&filter.column).unwrap_or(&Value::Null);
    match filter.op {
        FilterOp::Eq => equals(actual, &filter.value),
        FilterOp::Neq => !actual.is_null() && !equals(actual, &filter.value),
        FilterOp::Gt => compare(actual, &filter.value) == Some(Ordering::Greater),
        FilterOp::Gte => matches!(
            compare(actual, &filter.value),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        FilterOp::Lt => compare(actual, &filter.value) == Some(Ordering::Less),
        FilterOp::Lte => matches!(
            compare(actual, &filter.value),
            Some(Ordering::Less | Ordering::Equal)
        ),
        FilterOp::ILike => {
            !actual.is_null()
                && like_match(
                    &value_text(actual).to_lowercase(),
                    &value_text(&filter.value).to_lowercase(),
                )
        }
        FilterOp::In => filter
            .value
            .as_array()
            .is_some_and(|values| values.iter().any(|v| equals(actual, v))),
    }
}

/// SQL `LIKE` with `%` wildcards only.
fn like_match(text: &str, pattern: &str) -> bool {
    let parts = pattern.split('%').collect::<Vec<_>>();
    if parts.len() == 1 {
        return text == pattern;
    }

    let (first, rest) = (parts[0], &parts[1..]);
    let Some(mut remaining) = text.strip_prefix(first) else {
        return false;
    };
    let (last, middle) = rest.split_last().map_or(("", &[][..]), |(l, m)| (*l, m));
    for part in middle {
        match remaining.find(part) {
            Some(pos) => remaining = &remaining[pos + part.len()..],
            None => return false,
        }
    }
    remaining.ends_with(last)
}
