use super::{Backend, Consistency, CountResponse, RowStream, Statement};
use crate::settings::Credentials;
use crate::core::{BackendError, RowObservation, TraceEvent};
use crate::policy::{ExecutionPolicies, ExecutionPolicy, PolicyKind, Routing};
use async_trait::async_trait;
use futures::StreamExt;
use openssl::ssl::{SslContext, SslContextBuilder, SslMethod, SslVerifyMode};
use scylla::execution_profile::ExecutionProfileHandle;
use scylla::frame::response::result::{CqlValue, Row};
use scylla::load_balancing::DefaultPolicy;
use scylla::query::Query;
use scylla::statement::Consistency as CqlConsistency;
use scylla::transport::errors::{DbError, QueryError};
use scylla::{ExecutionProfile, Session, SessionBuilder};
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

/// Where and how to reach the cluster.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub host: String,
    pub port: u16,
    pub credentials: Option<Credentials>,
    pub ca_cert: Option<PathBuf>,
}

/// Backend over the native protocol driver. Both execution policies are
/// registered as driver profiles once, at connect time.
pub struct CassandraBackend {
    session: Session,
    default_profile: ExecutionProfileHandle,
    long_profile: ExecutionProfileHandle,
}

impl CassandraBackend {
    pub async fn connect(
        options: &ConnectOptions,
        policies: &ExecutionPolicies,
    ) -> Result<Self, BackendError> {
        let default_profile = driver_profile(policies.get(PolicyKind::Default)).into_handle();
        let long_profile = driver_profile(policies.get(PolicyKind::Long)).into_handle();

        let mut builder = SessionBuilder::new()
            .known_node(format!("{}:{}", options.host, options.port))
            .default_execution_profile_handle(default_profile.clone());

        if let Some(credentials) = &options.credentials {
            builder = builder.user(&credentials.username, &credentials.password);
        }
        if let Some(ca_cert) = &options.ca_cert {
            builder = builder.ssl_context(Some(tls_context(ca_cert)?));
        }

        tracing::info!(host = %options.host, port = options.port, tls = options.ca_cert.is_some(), "connecting to cluster");
        let session = builder
            .build()
            .await
            .map_err(|e| BackendError::Connection(e.to_string()))?;

        Ok(Self {
            session,
            default_profile,
            long_profile,
        })
    }

    fn profile(&self, policy: &ExecutionPolicy) -> ExecutionProfileHandle {
        match policy.kind {
            PolicyKind::Default => self.default_profile.clone(),
            PolicyKind::Long => self.long_profile.clone(),
        }
    }

    fn query(&self, statement: &Statement, policy: &ExecutionPolicy) -> Query {
        let mut query = Query::new(statement.cql.clone());
        query.set_consistency(driver_consistency(statement.consistency));
        if statement.page_size > 0 {
            query.set_page_size(i32::try_from(statement.page_size).unwrap_or(i32::MAX));
        }
        query.set_tracing(statement.tracing);
        query.set_execution_profile_handle(Some(self.profile(policy)));
        query
    }
}

fn driver_profile(policy: &ExecutionPolicy) -> ExecutionProfile {
    let builder = ExecutionProfile::builder().request_timeout(Some(policy.timeout));
    match &policy.routing {
        Routing::None => builder.build(),
        Routing::DatacenterLocal(datacenter) => builder
            .load_balancing_policy(
                DefaultPolicy::builder()
                    .prefer_datacenter(datacenter.clone())
                    .token_aware(true)
                    .build(),
            )
            .build(),
    }
}

/// CA-verified TLS without hostname verification.
fn tls_context(ca_cert: &Path) -> Result<SslContext, BackendError> {
    let tls_error = |e: openssl::error::ErrorStack| BackendError::Connection(format!("TLS setup failed: {e}"));

    let mut builder = SslContextBuilder::new(SslMethod::tls()).map_err(tls_error)?;
    builder.set_ca_file(ca_cert).map_err(tls_error)?;
    builder.set_verify(SslVerifyMode::PEER);
    Ok(builder.build())
}

const fn driver_consistency(consistency: Consistency) -> CqlConsistency {
    match consistency {
        Consistency::One => CqlConsistency::One,
        Consistency::LocalOne => CqlConsistency::LocalOne,
        Consistency::Quorum => CqlConsistency::Quorum,
        Consistency::LocalQuorum => CqlConsistency::LocalQuorum,
        Consistency::All => CqlConsistency::All,
    }
}

/// Sorts driver errors into transient and non-transient kinds.
fn classify(error: QueryError, timeout: Duration) -> BackendError {
    match error {
        QueryError::RequestTimeout(_) | QueryError::TimeoutError => BackendError::Timeout(timeout),
        QueryError::DbError(DbError::ReadTimeout { .. } | DbError::WriteTimeout { .. }, _) => {
            BackendError::Timeout(timeout)
        }
        QueryError::DbError(
            DbError::Unavailable { .. } | DbError::Overloaded | DbError::IsBootstrapping,
            message,
        ) => BackendError::Unavailable(message),
        QueryError::DbError(db_error, message) => BackendError::Server(format!("{db_error}: {message}")),
        QueryError::BadQuery(e) => BackendError::Server(e.to_string()),
        other => BackendError::Connection(other.to_string()),
    }
}

/// `(key int, blob text)` row into an observation.
fn observe_row(row: Row) -> Result<RowObservation, BackendError> {
    let mut columns = row.columns.into_iter();

    let key = match columns.next().flatten() {
        Some(CqlValue::Int(key)) => i64::from(key),
        Some(CqlValue::BigInt(key)) => key,
        Some(other) => return Err(BackendError::Decode(format!("unexpected key value {other:?}"))),
        None => return Err(BackendError::Decode("row without key".to_string())),
    };

    let payload_len = match columns.next().flatten() {
        Some(CqlValue::Text(text) | CqlValue::Ascii(text)) => Some(text.len() as u64),
        Some(CqlValue::Blob(bytes)) => Some(bytes.len() as u64),
        Some(other) => return Err(BackendError::Decode(format!("unexpected blob value {other:?}"))),
        None => None,
    };

    Ok(RowObservation::new(key, payload_len))
}

#[async_trait]
impl Backend for CassandraBackend {
    async fn scan(
        &self,
        statement: &Statement,
        policy: &ExecutionPolicy,
    ) -> Result<RowStream<'_>, BackendError> {
        let timeout = policy.timeout;
        let rows = self
            .session
            .query_iter(self.query(statement, policy), ())
            .await
            .map_err(|e| classify(e, timeout))?;

        Ok(rows
            .map(move |row| row.map_err(|e| classify(e, timeout)).and_then(observe_row))
            .boxed())
    }

    async fn count(
        &self,
        statement: &Statement,
        policy: &ExecutionPolicy,
    ) -> Result<CountResponse, BackendError> {
        let result = self
            .session
            .query(self.query(statement, policy), ())
            .await
            .map_err(|e| classify(e, policy.timeout))?;

        let tracing_id = result.tracing_id;
        let value = result
            .rows
            .and_then(|rows| rows.into_iter().next())
            .and_then(|row| row.columns.into_iter().next().flatten());

        let count = match value {
            Some(CqlValue::BigInt(count)) => count,
            Some(CqlValue::Int(count)) => i64::from(count),
            other => return Err(BackendError::Decode(format!("unexpected count value {other:?}"))),
        };

        Ok(CountResponse { count, tracing_id })
    }

    async fn fetch_trace(&self, tracing_id: Uuid) -> Result<Vec<TraceEvent>, BackendError> {
        let info = self
            .session
            .get_tracing_info(&tracing_id)
            .await
            .map_err(|e| BackendError::TraceUnavailable(e.to_string()))?;

        Ok(info
            .events
            .into_iter()
            .map(|event| {
                let micros = event.source_elapsed.map_or(0, |us| u64::try_from(us).unwrap_or(0));
                TraceEvent::new(Duration::from_micros(micros), event.activity.unwrap_or_default())
            })
            .collect())
    }

    async fn insert_blob(
        &self,
        statement: &Statement,
        key: i64,
        blob: &str,
        policy: &ExecutionPolicy,
    ) -> Result<(), BackendError> {
        let key = i32::try_from(key).map_err(|_| BackendError::Decode(format!("key {key} does not fit int")))?;
        self.session
            .query(self.query(statement, policy), (key, blob))
            .await
            .map_err(|e| classify(e, policy.timeout))?;
        Ok(())
    }
}
