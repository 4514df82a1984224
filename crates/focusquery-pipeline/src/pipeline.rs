//! Query orchestration.
//!
//! One request flows through the pure core once, executes at most one script,
//! and returns typed, sorted, projected records with metadata. The pipeline
//! is generic over its executor so tests substitute canned hosts.

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use focusquery_filter::registry::lookup;
use focusquery_filter::{build, fingerprint, normalize, validate, EntityType, Mode, SortKey};
use focusquery_script::{emit, EmitSpec};

use crate::cache::ResultCache;
use crate::error::QueryError;
use crate::executor::{ExecutorError, ScriptExecutor};
use crate::record::{parse_records, HostPayload, TaskRecord};
use crate::sort::sort_records;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub entity: EntityType,
    pub mode: Mode,
    /// Raw caller filter; normalized before anything else touches it.
    #[serde(default)]
    pub filter: serde_json::Map<String, serde_json::Value>,
    /// Explicit sort keys; `None` falls back to the mode's default sort.
    #[serde(default)]
    pub sort: Option<Vec<SortKey>>,
    /// Fields to read per record; `None` selects every concrete field.
    #[serde(default)]
    pub projection: Option<Vec<String>>,
    /// Truncation applied after sorting, so the kept records are the first
    /// of the full ordering, not of the host's arbitrary order.
    #[serde(default)]
    pub limit: Option<usize>,
}

impl QueryRequest {
    pub fn new(mode: Mode) -> Self {
        QueryRequest {
            entity: EntityType::Task,
            mode,
            filter: serde_json::Map::new(),
            sort: None,
            projection: None,
            limit: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryMetadata {
    pub mode: String,
    /// Canonical keys after normalization, including mode augmentation
    /// counts nothing here: this reflects the caller's effective filter.
    pub filters_applied: usize,
    pub sort_applied: Vec<String>,
    /// Matches on the host before any limit truncation.
    pub total_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResponse {
    pub records: Vec<TaskRecord>,
    pub metadata: QueryMetadata,
}

pub struct QueryPipeline<E> {
    executor: E,
    timeout: Duration,
    cache: Option<ResultCache>,
}

impl<E: ScriptExecutor> QueryPipeline<E> {
    pub fn new(executor: E) -> Self {
        debug_assert!(
            focusquery_filter::coverage_check().is_ok(),
            "date filter table does not cover the canonical key set"
        );
        QueryPipeline {
            executor,
            timeout: DEFAULT_TIMEOUT,
            cache: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cache(mut self, ttl: Duration) -> Self {
        self.cache = Some(ResultCache::new(ttl));
        self
    }

    /// Run one query end to end.
    pub async fn run(&self, request: &QueryRequest) -> Result<QueryResponse, QueryError> {
        let now = Utc::now();

        let canonical = normalize(&request.filter, now)?;

        let sort = match &request.sort {
            Some(keys) => {
                for key in keys {
                    let sortable = lookup(&key.field).map(|d| d.sortable).unwrap_or(false);
                    if !sortable {
                        return Err(QueryError::UnsortableKey(key.field.clone()));
                    }
                }
                keys.clone()
            }
            None => request.mode.default_sort(),
        };

        let key = fingerprint(
            request.entity,
            &canonical,
            request.mode,
            &sort,
            request.projection.as_deref(),
        );
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(&key) {
                tracing::debug!(fingerprint = %key, "cache hit");
                return Ok(hit);
            }
        }

        let tree = build(&canonical, request.mode, now);
        validate(&tree)?;

        let count_only = request.mode == Mode::CountOnly;
        // Sort keys must be readable by the comparator, so they are forced
        // into the emitted projection the same way `id` is, then stripped
        // from the response when the caller did not ask for them. Sorting on
        // a field the script never read would silently return host order.
        let mut emit_projection = request.projection.clone();
        let mut sort_only: Vec<String> = Vec::new();
        if let Some(fields) = emit_projection.as_mut() {
            for key in &sort {
                if key.field != "id" && !fields.contains(&key.field) {
                    sort_only.push(key.field.clone());
                    fields.push(key.field.clone());
                }
            }
        }
        let spec = EmitSpec::new(request.entity, emit_projection.as_deref(), count_only)?;
        let script = emit(&tree, &spec)?;
        tracing::debug!(
            fingerprint = %key,
            bridged = script.bridged,
            bytes = script.text.len(),
            "executing query script"
        );

        let raw = match tokio::time::timeout(self.timeout, self.executor.run(&script)).await {
            Err(_) => {
                return Err(QueryError::Timeout {
                    timeout: self.timeout,
                })
            }
            Ok(Err(err)) => return Err(execution_error(err)),
            Ok(Ok(raw)) => raw,
        };

        let payload = HostPayload::parse(&raw)?;
        if !payload.success {
            return Err(QueryError::Execution {
                message: payload
                    .error
                    .unwrap_or_else(|| "host reported failure without detail".to_string()),
                context: payload.context,
            });
        }

        let total_count = payload.count;
        let mut records = if count_only {
            Vec::new()
        } else {
            parse_records(payload.records, &script.fields)?
        };
        sort_records(&mut records, &sort);
        if let Some(limit) = request.limit {
            records.truncate(limit);
        }
        for record in &mut records {
            for field in &sort_only {
                record.fields.remove(field);
            }
        }

        let response = QueryResponse {
            records,
            metadata: QueryMetadata {
                mode: request.mode.as_str().to_string(),
                filters_applied: canonical.len(),
                sort_applied: sort.iter().map(|k| k.field.clone()).collect(),
                total_count,
            },
        };

        if let Some(cache) = &self.cache {
            cache.insert(key, response.clone());
        }
        Ok(response)
    }
}

fn execution_error(err: ExecutorError) -> QueryError {
    QueryError::Execution {
        message: err.to_string(),
        context: None,
    }
}
