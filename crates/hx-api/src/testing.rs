//! In-memory transports for tests.
//!
//! [`MockTransport`] replays scripted responses; [`FakeTimeEntries`] keeps a
//! mutable set of time entries and serves `/time_entries` the way Harvest does.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};

use serde_json::{Value, json};

use crate::error::ApiError;
use crate::transport::{Method, Params, Transport};

/// A request seen by a test transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: Method,
    pub endpoint: String,
    pub params: Params,
}

#[derive(Debug, Clone)]
enum Reply {
    Json(Value),
    Status { status: u16, body: String },
}

type RouteKey = (Method, String, Option<String>);

/// Transport answering from a script of canned replies.
///
/// Replies are keyed by method, endpoint and (for paged requests) the `page`
/// parameter. Several replies for one key are served in order; the last one
/// repeats. Unscripted requests fail with 404.
#[derive(Debug, Default)]
pub struct MockTransport {
    replies: Mutex<HashMap<RouteKey, VecDeque<Reply>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replies to `method endpoint` regardless of the page requested.
    #[must_use]
    pub fn respond(self, method: Method, endpoint: &str, body: Value) -> Self {
        self.script((method, endpoint.to_string(), None), Reply::Json(body))
    }

    /// Replies to one page of a paged GET.
    #[must_use]
    pub fn respond_page(self, endpoint: &str, page: u64, body: Value) -> Self {
        self.script(
            (Method::Get, endpoint.to_string(), Some(page.to_string())),
            Reply::Json(body),
        )
    }

    /// Fails `method endpoint` with a non-200 status.
    #[must_use]
    pub fn fail(self, method: Method, endpoint: &str, status: u16, body: &str) -> Self {
        self.script(
            (method, endpoint.to_string(), None),
            Reply::Status {
                status,
                body: body.to_string(),
            },
        )
    }

    /// Fails one page of a paged GET with a non-200 status.
    #[must_use]
    pub fn fail_page(self, endpoint: &str, page: u64, status: u16, body: &str) -> Self {
        self.script(
            (Method::Get, endpoint.to_string(), Some(page.to_string())),
            Reply::Status {
                status,
                body: body.to_string(),
            },
        )
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn script(self, key: RouteKey, reply: Reply) -> Self {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key)
            .or_default()
            .push_back(reply);
        self
    }

    fn next_reply(&self, method: Method, endpoint: &str, params: &Params) -> Option<Reply> {
        let mut replies = self.replies.lock().unwrap_or_else(PoisonError::into_inner);
        let paged = (method, endpoint.to_string(), params.get("page").cloned());
        let key = if replies.contains_key(&paged) {
            paged
        } else {
            (method, endpoint.to_string(), None)
        };
        let queue = replies.get_mut(&key)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

impl Transport for MockTransport {
    async fn send(
        &self,
        method: Method,
        endpoint: &str,
        params: &Params,
    ) -> Result<Value, ApiError> {
        record(&self.requests, method, endpoint, params);
        match self.next_reply(method, endpoint, params) {
            Some(Reply::Json(body)) => Ok(body),
            Some(Reply::Status { status, body }) => Err(status_error(method, endpoint, status, body)),
            None => Err(status_error(
                method,
                endpoint,
                404,
                format!("no scripted reply for {method} {endpoint}"),
            )),
        }
    }
}

/// Stateful stand-in for the time entries endpoints.
///
/// Supports paged `GET /time_entries` filtered by `project_id` (and
/// `user_id`), `GET /time_entries/{id}` and `PATCH /time_entries/{id}`.
/// Updates to ids marked with [`FakeTimeEntries::fail_update`] answer 422.
#[derive(Debug, Default)]
pub struct FakeTimeEntries {
    entries: Mutex<Vec<Value>>,
    failing: Mutex<BTreeSet<i64>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl FakeTimeEntries {
    pub fn new(entries: Vec<Value>) -> Self {
        Self {
            entries: Mutex::new(entries),
            ..Self::default()
        }
    }

    /// Builds a time entry payload in Harvest's shape.
    pub fn entry(id: i64, project: i64, task: i64, notes: Option<&str>) -> Value {
        json!({
            "id": id,
            "spent_date": "2024-05-06",
            "hours": 1.25,
            "notes": notes,
            "is_locked": false,
            "user": {"id": 1_782_959, "name": "Kim Allen"},
            "project": {"id": project, "name": format!("Project {project}")},
            "task": {"id": task, "name": format!("Task {task}")}
        })
    }

    #[must_use]
    pub fn fail_update(self, id: i64) -> Self {
        self.failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id);
        self
    }

    /// Current state of the entry with `id`.
    pub fn get(&self, id: i64) -> Option<Value> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|entry| entry["id"] == id)
            .cloned()
    }

    /// Ids of entries that received a PATCH, in order.
    pub fn patched_ids(&self) -> Vec<i64> {
        self.requests()
            .iter()
            .filter(|request| request.method == Method::Patch)
            .filter_map(|request| {
                request
                    .endpoint
                    .strip_prefix("/time_entries/")
                    .and_then(|id| id.parse().ok())
            })
            .collect()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn list(&self, params: &Params) -> Value {
        let project = param_i64(params, "project_id");
        let user = param_i64(params, "user_id");
        let per_page = param_i64(params, "per_page").unwrap_or(100).max(1);
        let page = param_i64(params, "page").unwrap_or(1).max(1);

        let matching: Vec<Value> = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|entry| project.is_none_or(|id| entry["project"]["id"] == id))
            .filter(|entry| user.is_none_or(|id| entry["user"]["id"] == id))
            .cloned()
            .collect();

        let total_entries = i64::try_from(matching.len()).unwrap_or(i64::MAX);
        let total_pages = (total_entries + per_page - 1) / per_page;
        let records: Vec<Value> = matching
            .into_iter()
            .skip(usize::try_from((page - 1) * per_page).unwrap_or(usize::MAX))
            .take(usize::try_from(per_page).unwrap_or(usize::MAX))
            .collect();

        json!({
            "time_entries": records,
            "per_page": per_page,
            "page": page,
            "total_pages": total_pages,
            "total_entries": total_entries
        })
    }

    fn patch(&self, id: i64, params: &Params) -> Option<Value> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.iter_mut().find(|entry| entry["id"] == id)?;
        if let Some(project) = param_i64(params, "project_id") {
            entry["project"] = json!({"id": project, "name": format!("Project {project}")});
        }
        if let Some(task) = param_i64(params, "task_id") {
            entry["task"] = json!({"id": task, "name": format!("Task {task}")});
        }
        if let Some(notes) = params.get("notes") {
            entry["notes"] = json!(notes);
        }
        Some(entry.clone())
    }
}

impl Transport for FakeTimeEntries {
    async fn send(
        &self,
        method: Method,
        endpoint: &str,
        params: &Params,
    ) -> Result<Value, ApiError> {
        record(&self.requests, method, endpoint, params);
        let single = endpoint
            .strip_prefix("/time_entries/")
            .and_then(|id| id.parse::<i64>().ok());

        let reply = match (method, single) {
            (Method::Get, None) if endpoint == "/time_entries" => Some(self.list(params)),
            (Method::Get, Some(id)) => self.get(id),
            (Method::Patch, Some(id)) => {
                let failing = self
                    .failing
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .contains(&id);
                if failing {
                    return Err(status_error(
                        method,
                        endpoint,
                        422,
                        r#"{"message":"Entry is locked"}"#.to_string(),
                    ));
                }
                self.patch(id, params)
            }
            _ => None,
        };

        reply.ok_or_else(|| {
            status_error(method, endpoint, 404, r#"{"error":"not_found"}"#.to_string())
        })
    }
}

fn record(requests: &Mutex<Vec<RecordedRequest>>, method: Method, endpoint: &str, params: &Params) {
    requests
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(RecordedRequest {
            method,
            endpoint: endpoint.to_string(),
            params: params.clone(),
        });
}

fn param_i64(params: &Params, key: &str) -> Option<i64> {
    params.get(key).and_then(|value| value.parse().ok())
}

fn status_error(method: Method, endpoint: &str, status: u16, body: String) -> ApiError {
    ApiError::Status {
        method,
        endpoint: endpoint.to_string(),
        status,
        body,
    }
}
