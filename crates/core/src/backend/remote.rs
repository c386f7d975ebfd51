//! HTTP client for the hosted backend.
//!
//! Data calls follow PostgREST conventions under `{base}/rest/v1/{table}`; authentication
//! follows GoTrue under `{base}/auth/v1`. Every request carries the `apikey` header and a
//! bearer token: the access token passed with the call, or the anon key for anonymous
//! calls. The client holds no session of its own.
//!
//! Calls are sent once. There is no timeout, retry or backoff.

use super::{Authenticator, Backend, FilterOp, Query, Session, SessionUser, Table};
use crate::config::CoreConfig;
use crate::constants::{AUTH_PATH, REST_PATH};
use crate::{ClinicError, ClinicResult};
use reqwest::{Method, RequestBuilder, Response, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

#[derive(Debug)]
pub struct RemoteBackend {
    client: reqwest::Client,
    base_url: Url,
    anon_key: String,
}

impl RemoteBackend {
    pub fn new(cfg: &CoreConfig) -> Self {
        Self::with_client(reqwest::Client::new(), cfg)
    }

    pub fn with_client(client: reqwest::Client, cfg: &CoreConfig) -> Self {
        Self {
            client,
            base_url: cfg.backend_url().clone(),
            anon_key: cfg.anon_key().to_string(),
        }
    }

    fn url(&self, path: &str) -> ClinicResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| ClinicError::InvalidInput(format!("invalid backend path '{path}': {e}")))
    }

    fn table_url(&self, table: Table) -> ClinicResult<Url> {
        self.url(&format!("{REST_PATH}/{}", table.as_str()))
    }

    fn request(&self, token: Option<&str>, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(token.unwrap_or(&self.anon_key))
    }
}

/// Reads a response body as JSON, turning non-2xx statuses into [`ClinicError::Remote`].
async fn read_json(response: Response) -> ClinicResult<Value> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(ClinicError::Remote {
            status: status.as_u16(),
            message: error_message(&body),
        });
    }
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&body)?)
}

/// Picks the human-readable part of a PostgREST or GoTrue error body.
fn error_message(body: &str) -> String {
    let parsed = serde_json::from_str::<Value>(body).ok();
    parsed
        .as_ref()
        .and_then(|v| {
            ["message", "error_description", "msg", "error"]
                .iter()
                .find_map(|key| v.get(key).and_then(Value::as_str))
        })
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().to_string())
}

fn into_rows(value: Value) -> Vec<Value> {
    match value {
        Value::Array(rows) => rows,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

fn render_list_item(value: &Value) -> String {
    let text = render_value(value);
    if text.contains([',', '(', ')', '"']) {
        format!("\"{}\"", text.replace('"', "\\\""))
    } else {
        text
    }
}

/// Characters with meaning inside a PostgREST `or=(...)` expression.
fn sanitize_search_term(term: &str) -> String {
    term.chars()
        .filter(|c| !matches!(c, ',' | '(' | ')' | '*' | '%' | '"'))
        .collect()
}

/// Renders a [`Query`] as PostgREST query-string pairs.
pub(crate) fn query_pairs(query: &Query) -> Vec<(String, String)> {
    let mut pairs = Vec::new();

    let mut select = vec!["*".to_string()];
    select.extend(
        query
            .embeds
            .iter()
            .map(|e| format!("{}({})", e.table.as_str(), e.columns.join(","))),
    );
    pairs.push(("select".to_string(), select.join(",")));

    for filter in &query.filters {
        let rendered = match filter.op {
            FilterOp::In => {
                let items = filter
                    .value
                    .as_array()
                    .map(|values| values.iter().map(render_list_item).collect::<Vec<_>>())
                    .unwrap_or_default();
                format!("in.({})", items.join(","))
            }
            FilterOp::ILike => format!("ilike.{}", render_value(&filter.value).replace('%', "*")),
            op => format!("{}.{}", op.as_str(), render_value(&filter.value)),
        };
        pairs.push((filter.column.clone(), rendered));
    }

    if let Some(search) = &query.search {
        let term = sanitize_search_term(&search.term);
        let clauses = search
            .columns
            .iter()
            .map(|column| format!("{column}.ilike.*{term}*"))
            .collect::<Vec<_>>();
        pairs.push(("or".to_string(), format!("({})", clauses.join(","))));
    }

    if !query.order.is_empty() {
        let order = query
            .order
            .iter()
            .map(|o| format!("{}.{}", o.column, if o.ascending { "asc" } else { "desc" }))
            .collect::<Vec<_>>();
        pairs.push(("order".to_string(), order.join(",")));
    }

    if let Some(offset) = query.offset {
        pairs.push(("offset".to_string(), offset.to_string()));
    }
    if let Some(limit) = query.limit {
        pairs.push(("limit".to_string(), limit.to_string()));
    }

    pairs
}

impl Backend for RemoteBackend {
    async fn select(
        &self,
        token: Option<&str>,
        table: Table,
        query: &Query,
    ) -> ClinicResult<Vec<Value>> {
        tracing::debug!(table = %table, "backend select");
        let response = self
            .request(token, Method::GET, self.table_url(table)?)
            .query(&query_pairs(query))
            .send()
            .await?;
        Ok(into_rows(read_json(response).await?))
    }

    async fn insert(&self, token: Option<&str>, table: Table, row: Value) -> ClinicResult<Value> {
        tracing::debug!(table = %table, "backend insert");
        let response = self
            .request(token, Method::POST, self.table_url(table)?)
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await?;
        into_rows(read_json(response).await?)
            .into_iter()
            .next()
            .ok_or_else(|| ClinicError::Remote {
                status: 200,
                message: format!("insert into {table} returned no row"),
            })
    }

    async fn update(
        &self,
        token: Option<&str>,
        table: Table,
        id: Uuid,
        patch: Value,
    ) -> ClinicResult<Value> {
        tracing::debug!(table = %table, %id, "backend update");
        let response = self
            .request(token, Method::PATCH, self.table_url(table)?)
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=representation")
            .json(&patch)
            .send()
            .await?;
        into_rows(read_json(response).await?)
            .into_iter()
            .next()
            .ok_or_else(|| ClinicError::NotFound {
                table: table.as_str(),
                id: id.to_string(),
            })
    }

    async fn delete(&self, token: Option<&str>, table: Table, id: Uuid) -> ClinicResult<()> {
        tracing::debug!(table = %table, %id, "backend delete");
        let response = self
            .request(token, Method::DELETE, self.table_url(table)?)
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=representation")
            .send()
            .await?;
        if into_rows(read_json(response).await?).is_empty() {
            return Err(ClinicError::NotFound {
                table: table.as_str(),
                id: id.to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    user: TokenUser,
}

#[derive(Debug, Deserialize)]
struct TokenUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

/// GoTrue answers 4xx for unknown, expired or revoked credentials.
fn unauthenticated_on_client_error(err: ClinicError) -> ClinicError {
    match err {
        ClinicError::Remote { status, message } if (400..500).contains(&status) => {
            ClinicError::Unauthenticated(message)
        }
        other => other,
    }
}

impl Authenticator for RemoteBackend {
    async fn sign_in(&self, email: &str, password: &str) -> ClinicResult<Session> {
        let mut url = self.url(&format!("{AUTH_PATH}/token"))?;
        url.query_pairs_mut().append_pair("grant_type", "password");

        let response = self
            .client
            .post(url)
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email.trim(), "password": password }))
            .send()
            .await?;

        let body = read_json(response)
            .await
            .map_err(unauthenticated_on_client_error)?;
        let token: TokenResponse = clinic_wire::parse_row(body)?;

        let session = Session {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_in: token.expires_in,
            user: SessionUser {
                id: token.user.id,
                email: token.user.email,
            },
        };
        tracing::info!(user = %session.user.id, "signed in");
        Ok(session)
    }

    async fn user(&self, token: &str) -> ClinicResult<SessionUser> {
        let response = self
            .request(Some(token), Method::GET, self.url(&format!("{AUTH_PATH}/user"))?)
            .send()
            .await?;
        let body = read_json(response)
            .await
            .map_err(unauthenticated_on_client_error)?;
        let user: TokenUser = clinic_wire::parse_row(body)?;
        Ok(SessionUser {
            id: user.id,
            email: user.email,
        })
    }

    async fn sign_out(&self, token: &str) -> ClinicResult<()> {
        let response = self
            .request(Some(token), Method::POST, self.url(&format!("{AUTH_PATH}/logout"))?)
            .send()
            .await?;
        read_json(response)
            .await
            .map_err(unauthenticated_on_client_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn backend(server: &MockServer) -> RemoteBackend {
        let cfg = CoreConfig::new(&server.uri(), "anon-key").expect("valid config");
        RemoteBackend::new(&cfg)
    }

    #[test]
    fn query_pairs_render_postgrest_syntax() {
        let query = Query::new()
            .eq("status", "agendada")
            .ilike("full_name", "%ana%")
            .is_in("id", ["a", "b,c"])
            .search(&["full_name", "cpf"], "Ana, (x)")
            .embed(Table::Patients, &["full_name", "phone"])
            .order_by("appointment_at", false)
            .range(20, 10);

        let pairs = query_pairs(&query);
        let get = |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
                .unwrap_or_default()
        };

        assert_eq!(get("select"), "*,patients(full_name,phone)");
        assert_eq!(get("status"), "eq.agendada");
        assert_eq!(get("full_name"), "ilike.*ana*");
        assert_eq!(get("id"), "in.(a,\"b,c\")");
        assert_eq!(get("or"), "(full_name.ilike.*Ana x*,cpf.ilike.*Ana x*)");
        assert_eq!(get("order"), "appointment_at.desc");
        assert_eq!(get("offset"), "20");
        assert_eq!(get("limit"), "10");
    }

    #[test]
    fn error_message_prefers_known_keys() {
        assert_eq!(error_message(r#"{"message":"duplicate key"}"#), "duplicate key");
        assert_eq!(
            error_message(r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#),
            "Invalid login credentials"
        );
        assert_eq!(error_message("  plain text "), "plain text");
    }

    #[tokio::test]
    async fn select_sends_headers_and_filters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/patients"))
            .and(header("apikey", "anon-key"))
            .and(header("authorization", "Bearer anon-key"))
            .and(query_param("cpf", "eq.52998224725"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{"id": "p1", "full_name": "Ana"}])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let rows = backend(&server)
            .await
            .select(None, Table::Patients, &Query::new().eq("cpf", "52998224725"))
            .await
            .expect("select should succeed");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["full_name"], "Ana");
    }

    #[tokio::test]
    async fn non_success_status_becomes_remote_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/services"))
            .respond_with(
                ResponseTemplate::new(409).set_body_json(json!({"message": "duplicate key value"})),
            )
            .mount(&server)
            .await;

        let err = backend(&server)
            .await
            .insert(None, Table::Services, json!({"name": "Limpeza"}))
            .await
            .expect_err("conflict should fail");
        match err {
            ClinicError::Remote { status, message } => {
                assert_eq!(status, 409);
                assert_eq!(message, "duplicate key value");
            }
            other => panic!("expected Remote error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn insert_returns_representation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/convenios"))
            .and(header("prefer", "return=representation"))
            .and(body_json(json!({"name": "Amil"})))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!([{"id": "c1", "name": "Amil"}])),
            )
            .mount(&server)
            .await;

        let row = backend(&server)
            .await
            .insert(None, Table::Convenios, json!({"name": "Amil"}))
            .await
            .expect("insert should succeed");
        assert_eq!(row["id"], "c1");
    }

    #[tokio::test]
    async fn update_with_no_matching_row_is_not_found() {
        let server = MockServer::start().await;
        let id = Uuid::new_v4();
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/appointments"))
            .and(query_param("id", format!("eq.{id}").as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let err = backend(&server)
            .await
            .update(None, Table::Appointments, id, json!({"status": "confirmada"}))
            .await
            .expect_err("empty representation should be NotFound");
        assert!(matches!(err, ClinicError::NotFound { table: "appointments", .. }));
    }

    #[tokio::test]
    async fn each_call_uses_the_token_it_is_given() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "password"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "user-token",
                "refresh_token": "refresh",
                "expires_in": 3600,
                "user": {"id": "u1", "email": "recepcao@clinica.com"}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/services"))
            .and(header("authorization", "Bearer user-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/services"))
            .and(header("authorization", "Bearer anon-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let backend = backend(&server).await;
        let session = backend
            .sign_in("recepcao@clinica.com", "segredo")
            .await
            .expect("sign in should succeed");
        assert_eq!(session.user.id, "u1");

        backend
            .select(Some(&session.access_token), Table::Services, &Query::new())
            .await
            .expect("authorized select");
        backend
            .select(None, Table::Services, &Query::new())
            .await
            .expect("signing in must not change anonymous calls");
    }

    #[tokio::test]
    async fn closures_live_in_the_closures_table() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/closures"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        backend(&server)
            .await
            .select(None, Table::Closures, &Query::new())
            .await
            .expect("closures select");
    }

    #[tokio::test]
    async fn user_and_sign_out_send_the_callers_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .and(header("authorization", "Bearer user-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "u1",
                "email": "recepcao@clinica.com"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .and(header("authorization", "Bearer revoked"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"msg": "invalid JWT"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/logout"))
            .and(header("authorization", "Bearer user-token"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let backend = backend(&server).await;
        let user = backend.user("user-token").await.expect("known token");
        assert_eq!(user.email.as_deref(), Some("recepcao@clinica.com"));

        let err = backend.user("revoked").await.expect_err("revoked token");
        assert!(matches!(err, ClinicError::Unauthenticated(ref m) if m == "invalid JWT"));

        backend.sign_out("user-token").await.expect("sign out");
    }

    #[tokio::test]
    async fn rejected_credentials_are_unauthenticated() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid login credentials"
            })))
            .mount(&server)
            .await;

        let backend = backend(&server).await;
        let err = backend
            .sign_in("x@y.com", "bad")
            .await
            .expect_err("bad credentials");
        assert!(matches!(err, ClinicError::Unauthenticated(ref m) if m == "Invalid login credentials"));
    }
}
