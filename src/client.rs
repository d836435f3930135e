use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use crate::{
    decode::{assemble, Assembled},
    wire::{
        CreateSessionRequest, ErrorEnvelope, ExecuteRequest, QueryExecuteResponse,
        CREATE_SESSION_PATH, EXECUTE_PATH,
    },
    Config, DatabaseError, ExecutedQuery, HttpRequest, HttpResponse, Params, PsdbError, Result,
    Session, VitessError,
};

/// Value sent in the `User-Agent` header.
pub const USER_AGENT: &str = concat!("psdb-http/", env!("CARGO_PKG_VERSION"));

/// Stateless entry point. Every [`Client::execute`] runs on a fresh
/// [`Connection`], so no session carries over between calls.
#[derive(Clone, Debug)]
pub struct Client {
    config: Config,
}

impl Client {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Executes one statement on a new connection.
    pub async fn execute<P: Into<Params>>(&self, query: &str, params: P) -> Result<ExecutedQuery> {
        self.connection().execute(query, params).await
    }

    /// Opens a session-carrying connection.
    pub fn connection(&self) -> Connection {
        Connection::new(self.config.clone())
    }
}

/// Creates a [`Connection`] from a configuration.
pub fn connect(config: Config) -> Connection {
    Connection::new(config)
}

/// Session-carrying connection.
///
/// Each response's session replaces the held one and is sent with the next
/// call. `execute` takes `&mut self`, so statements on one connection run
/// strictly one after another; use separate connections for concurrent work.
/// No socket is held between calls.
#[derive(Clone, Debug)]
pub struct Connection {
    config: Config,
    session: Option<Session>,
}

impl Connection {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            session: None,
        }
    }

    /// Session that will be sent with the next statement, if any.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Creates a fresh session, replacing any held one. Useful to warm up a
    /// connection before the first statement.
    pub async fn refresh(&mut self) -> Result<()> {
        let body = serialize(&CreateSessionRequest {})?;
        let response = self.post(CREATE_SESSION_PATH, body).await?;
        self.session = response.session;

        #[cfg(feature = "tracing")]
        tracing::debug!(has_session = self.session.is_some(), "created session");

        Ok(())
    }

    /// Executes one statement.
    ///
    /// `params` are merged into `query` by the configured formatter; empty
    /// params send the text unchanged. A statement error reported by the
    /// service is returned in [`ExecutedQuery::error`]; only transport,
    /// non-2xx and decode failures are `Err`.
    pub async fn execute<P: Into<Params>>(
        &mut self,
        query: &str,
        params: P,
    ) -> Result<ExecutedQuery> {
        let params = params.into();
        let sql = if params.is_empty() {
            query.to_owned()
        } else {
            self.config.format.format(query, &params)?
        };

        let started = clock::now_ms();
        let body = serialize(&ExecuteRequest {
            query: &sql,
            session: self.session.as_ref(),
        })?;
        let response = self.post(EXECUTE_PATH, body).await?;
        let time_ms = clock::now_ms() - started;

        let QueryExecuteResponse {
            session,
            result,
            error,
        } = response;
        self.session = session;

        let result = result.unwrap_or_default();
        let rows_affected = parse_rows_affected(result.rows_affected.as_deref())?;
        let Assembled {
            headers,
            types,
            rows,
        } = assemble(&result, self.config.cast.as_ref())?;

        #[cfg(feature = "tracing")]
        {
            tracing::debug!(rows = rows.len(), time_ms, "executed statement");
            if let Some(error) = &error {
                tracing::debug!(code = %error.code, "statement reported an error");
            }
        }

        Ok(ExecutedQuery {
            headers,
            types,
            size: rows.len(),
            rows,
            statement: sql,
            insert_id: result.insert_id,
            rows_affected,
            error,
            time_ms,
        })
    }

    async fn post(&self, path: &str, body: String) -> Result<QueryExecuteResponse> {
        let request = HttpRequest {
            url: self.config.endpoint(path),
            headers: vec![
                ("Content-Type".to_owned(), "application/json".to_owned()),
                ("User-Agent".to_owned(), USER_AGENT.to_owned()),
                ("Authorization".to_owned(), self.authorization()),
            ],
            body,
        };

        let response = self
            .config
            .transport
            .post(request)
            .await
            .map_err(PsdbError::Transport)?;

        if !response.is_success() {
            let err = http_error(&response);
            #[cfg(feature = "tracing")]
            tracing::warn!(status = err.status, code = %err.code(), path, "request failed");
            return Err(err.into());
        }

        // Never echo the body: it carries session material.
        serde_json::from_str::<QueryExecuteResponse>(&response.body)
            .map_err(|err| PsdbError::Decode(format!("invalid response JSON: {err}")))
    }

    fn authorization(&self) -> String {
        let credentials = format!("{}:{}", self.config.username, self.config.password);
        format!("Basic {}", BASE64.encode(credentials))
    }
}

fn serialize<T: serde::Serialize>(body: &T) -> Result<String> {
    serde_json::to_string(body)
        .map_err(|err| PsdbError::Decode(format!("could not encode request body: {err}")))
}

fn parse_rows_affected(raw: Option<&str>) -> Result<Option<u64>> {
    match raw {
        None | Some("") => Ok(None),
        Some(raw) => raw
            .parse::<u64>()
            .map(Some)
            .map_err(|err| PsdbError::Decode(format!("invalid rowsAffected '{raw}': {err}"))),
    }
}

/// Builds the error for a non-2xx response, falling back to the reported
/// status text when the body is not an `{error: {code, message}}` envelope.
fn http_error(response: &HttpResponse) -> DatabaseError {
    let status = response.status;
    match serde_json::from_str::<ErrorEnvelope>(&response.body) {
        Ok(ErrorEnvelope { error }) => DatabaseError::new(error.message.clone(), status, error),
        Err(_) => {
            let reason = if response.status_text.is_empty() {
                reqwest::StatusCode::from_u16(status)
                    .ok()
                    .and_then(|code| code.canonical_reason())
                    .unwrap_or_default()
                    .to_owned()
            } else {
                response.status_text.clone()
            };
            DatabaseError::new(
                reason.clone(),
                status,
                VitessError {
                    message: reason,
                    code: "internal".to_owned(),
                },
            )
        }
    }
}

mod clock {
    #[cfg(not(target_arch = "wasm32"))]
    pub(super) fn now_ms() -> f64 {
        use std::sync::OnceLock;
        use std::time::Instant;

        static EPOCH: OnceLock<Instant> = OnceLock::new();
        EPOCH.get_or_init(Instant::now).elapsed().as_secs_f64() * 1_000.0
    }

    // `Instant` is not available in browser runtimes.
    #[cfg(target_arch = "wasm32")]
    pub(super) fn now_ms() -> f64 {
        js_sys::Date::now()
    }
}
