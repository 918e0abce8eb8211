//! A client for the analytical warehouse's HTTP SQL API.
//!
//! The client owns a single session to the warehouse for the lifetime of the process.
//! The session is established lazily on first use and reused for every subsequent
//! statement; despite the upstream service calling this a "pool", at most one live
//! session exists at a time. Access is serialised through an async mutex, so
//! concurrent requests execute their statements one at a time against the shared
//! session.

use crate::cli::CommandLineArgs;
use crate::error::DataServiceError;
use crate::models::Record;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;
use url::Url;

/// Warehouse connection settings, taken from the command line.
#[derive(Clone, Debug)]
pub struct WarehouseConfig {
    /// Base URL of the warehouse HTTP SQL API
    pub url: Url,
    pub user: String,
    pub password: String,
    /// Name of the (virtual) warehouse that executes statements
    pub warehouse: String,
    pub database: String,
    pub schema: String,
}

impl WarehouseConfig {
    pub fn from_args(args: &CommandLineArgs) -> Self {
        Self {
            url: args.warehouse_url.clone(),
            user: args.warehouse_user.clone(),
            password: args.warehouse_password.clone(),
            warehouse: args.warehouse_name.clone(),
            database: args.warehouse_database.clone(),
            schema: args.warehouse_schema.clone(),
        }
    }
}

/// A live warehouse session.
#[derive(Debug)]
struct Session {
    token: String,
}

/// Warehouse client object.
///
/// Holds the shared session behind a [tokio::sync::Mutex]; the lock is held for the
/// duration of each statement.
pub struct WarehouseClient {
    http: reqwest::Client,
    config: WarehouseConfig,
    session: Mutex<Option<Session>>,
}

/// Body of a session (login) request.
#[derive(Serialize)]
struct LoginRequest<'a> {
    user: &'a str,
    password: &'a str,
    warehouse: &'a str,
    database: &'a str,
    schema: &'a str,
    /// Keep the session alive between statements to avoid reconnecting
    keep_alive: bool,
}

/// Body of a successful session response.
#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

/// Body of a statement execution request.
#[derive(Serialize)]
struct StatementRequest<'a> {
    statement: &'a str,
}

/// Body of a successful statement response.
#[derive(Debug, Deserialize)]
pub(crate) struct StatementResponse {
    /// Result set columns, in the query's projection order
    columns: Vec<Column>,
    /// Result set rows, each aligned with `columns`
    rows: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct Column {
    name: String,
}

impl StatementResponse {
    /// Convert the columnar wire shape into ordered field to value records.
    fn into_records(self) -> Vec<Record> {
        let columns = self.columns;
        self.rows
            .into_iter()
            .map(|row| {
                columns
                    .iter()
                    .zip(row)
                    .map(|(column, value)| (column.name.clone(), value))
                    .collect()
            })
            .collect()
    }
}

impl WarehouseClient {
    /// Create a warehouse client. No connection is made until first use.
    pub fn new(config: WarehouseConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            session: Mutex::new(None),
        }
    }

    /// Ensure a live session exists.
    ///
    /// Idempotent: returns immediately if a session has already been established.
    /// There is no automatic retry; a failed attempt leaves the client without a
    /// session and a later call may succeed once the warehouse recovers.
    pub async fn connect(&self) -> Result<(), DataServiceError> {
        let mut session = self.session.lock().await;
        self.ensure_session(&mut session).await.map(|_| ())
    }

    /// Execute a statement and return its rows as ordered records.
    ///
    /// Establishes the session on first use. A statement failure is reported as a
    /// query error and does not invalidate the session; this mirrors the upstream
    /// service, which never tears down its shared connection on query failure.
    pub async fn execute(&self, sql: &str) -> Result<Vec<Record>, DataServiceError> {
        let mut session = self.session.lock().await;
        let token = self.ensure_session(&mut session).await?;
        tracing::debug!(statement = sql, "executing warehouse statement");
        let url = self.config.url.join("api/v1/statements")?;
        let response = self
            .http
            .post(url)
            .bearer_auth(&token)
            .json(&StatementRequest { statement: sql })
            .send()
            .await
            .map_err(DataServiceError::QueryRequest)?;
        if !response.status().is_success() {
            return Err(DataServiceError::QueryRejected {
                message: error_message(response).await,
            });
        }
        let statement: StatementResponse = response
            .json()
            .await
            .map_err(DataServiceError::QueryRequest)?;
        Ok(statement.into_records())
    }

    /// Return the token of the current session, logging in if there is none.
    async fn ensure_session(
        &self,
        session: &mut Option<Session>,
    ) -> Result<String, DataServiceError> {
        match session.as_ref() {
            Some(live) => Ok(live.token.clone()),
            None => {
                tracing::info!("establishing warehouse session for {}", self.config.url);
                let live = self.login().await?;
                let token = live.token.clone();
                *session = Some(live);
                Ok(token)
            }
        }
    }

    /// Establish a new warehouse session.
    async fn login(&self) -> Result<Session, DataServiceError> {
        let url = self.config.url.join("api/v1/session")?;
        let response = self
            .http
            .post(url)
            .json(&LoginRequest {
                user: &self.config.user,
                password: &self.config.password,
                warehouse: &self.config.warehouse,
                database: &self.config.database,
                schema: &self.config.schema,
                keep_alive: true,
            })
            .send()
            .await
            .map_err(DataServiceError::WarehouseConnection)?;
        if !response.status().is_success() {
            return Err(DataServiceError::WarehouseSession {
                message: error_message(response).await,
            });
        }
        let login: LoginResponse = response
            .json()
            .await
            .map_err(DataServiceError::WarehouseConnection)?;
        Ok(Session { token: login.token })
    }
}

/// Pull a human-readable message out of an error response, falling back to the status
/// line for empty bodies.
pub(crate) async fn error_message(response: reqwest::Response) -> String {
    let status = response.status();
    match response.text().await {
        Ok(body) if !body.trim().is_empty() => body,
        _ => status.to_string(),
    }
}
