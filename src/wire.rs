use serde::{Deserialize, Serialize};

use crate::{Field, Session, VitessError};

pub const EXECUTE_PATH: &str = "/psdb.v1alpha1.Database/Execute";
pub const CREATE_SESSION_PATH: &str = "/psdb.v1alpha1.Database/CreateSession";

#[derive(Debug, Serialize)]
pub struct ExecuteRequest<'a> {
    pub query: &'a str,
    pub session: Option<&'a Session>,
}

#[derive(Debug, Serialize)]
pub struct CreateSessionRequest {}

#[derive(Debug, Deserialize)]
pub struct QueryExecuteResponse {
    #[serde(default)]
    pub session: Option<Session>,
    #[serde(default)]
    pub result: Option<QueryResult>,
    #[serde(default)]
    pub error: Option<VitessError>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    #[serde(default)]
    pub rows_affected: Option<String>,
    #[serde(default)]
    pub insert_id: Option<String>,
    #[serde(default)]
    pub fields: Option<Vec<Field>>,
    #[serde(default)]
    pub rows: Option<Vec<QueryResultRow>>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct QueryResultRow {
    #[serde(default)]
    pub lengths: Vec<String>,
    #[serde(default)]
    pub values: String,
}

#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: VitessError,
}
