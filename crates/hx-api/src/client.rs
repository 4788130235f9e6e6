//! Typed access to Harvest resources.

use hx_core::{ClientId, ProjectId, TimeEntryId, TimeEntryUpdate, UserId};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{Instrument, Span};

use crate::error::ApiError;
use crate::transport::{Credentials, HttpOptions, HttpTransport, Method, Params, Transport};

/// Page size requested for every collection.
pub const PER_PAGE: u32 = 100;

/// Status filter for list endpoints that support `is_active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum ActiveFilter {
    /// Active and archived records.
    #[default]
    All,
    /// Active records only.
    Active,
    /// Archived records only.
    Inactive,
}

impl ActiveFilter {
    fn apply(self, params: &mut Params) {
        match self {
            Self::All => {}
            Self::Active => {
                params.insert("is_active", "true".to_string());
            }
            Self::Inactive => {
                params.insert("is_active", "false".to_string());
            }
        }
    }
}

/// Harvest API client.
///
/// Requests are sent one at a time; every request runs inside the span given
/// at construction. Endpoints decode into any `DeserializeOwned` type: the
/// typed records of `hx_core`, or `serde_json::Value` to keep the payload
/// exactly as the server sent it.
#[derive(Debug)]
pub struct Harvest<T = HttpTransport> {
    transport: T,
    span: Span,
}

impl Harvest<HttpTransport> {
    /// Builds an HTTP-backed client for the account in `credentials`.
    pub fn connect(credentials: &Credentials, options: HttpOptions) -> Result<Self, ApiError> {
        let span = tracing::info_span!("harvest", account = credentials.account_id());
        let transport = HttpTransport::new(credentials, options)?;
        Ok(Self::with_span(transport, span))
    }
}

impl<T: Transport> Harvest<T> {
    pub fn new(transport: T) -> Self {
        Self::with_span(transport, tracing::debug_span!("harvest"))
    }

    pub const fn with_span(transport: T, span: Span) -> Self {
        Self { transport, span }
    }

    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Performs a GET and returns the decoded JSON body.
    pub async fn call(&self, endpoint: &str, params: &Params) -> Result<Value, ApiError> {
        self.send(Method::Get, endpoint, params).await
    }

    /// Performs a PATCH carrying `params` and returns the updated record.
    pub async fn patch(&self, endpoint: &str, params: &Params) -> Result<Value, ApiError> {
        self.send(Method::Patch, endpoint, params).await
    }

    async fn send(&self, method: Method, endpoint: &str, params: &Params) -> Result<Value, ApiError> {
        async {
            tracing::debug!(%method, endpoint, ?params, "sending request");
            self.transport.send(method, endpoint, params).await
        }
        .instrument(self.span.clone())
        .await
    }

    async fn get<R: DeserializeOwned>(&self, endpoint: &str) -> Result<R, ApiError> {
        let body = self.call(endpoint, &Params::new()).await?;
        decode(endpoint, body)
    }

    /// Fetches every page of a collection and concatenates the records.
    ///
    /// `field` names the array holding the records in each page. Pages are
    /// requested in order with the same filter `params`; the first failing
    /// page aborts the fetch.
    pub async fn fetch_all<R: DeserializeOwned>(
        &self,
        endpoint: &str,
        field: &str,
        params: &Params,
    ) -> Result<Vec<R>, ApiError> {
        let mut query = params.clone();
        query.insert("per_page", PER_PAGE.to_string());
        query.insert("page", "1".to_string());

        let first = self.call(endpoint, &query).await?;
        let total_pages = first.get("total_pages").and_then(Value::as_u64).unwrap_or(1);
        let total_entries = first.get("total_entries").and_then(Value::as_u64);
        let mut records: Vec<R> = page_records(endpoint, field, first)?;

        if total_pages > 1 {
            tracing::debug!(endpoint, total_pages, ?total_entries, "fetching remaining pages");
            for page in 2..=total_pages {
                query.insert("page", page.to_string());
                let body = self.call(endpoint, &query).await?;
                records.extend(page_records::<R>(endpoint, field, body)?);
            }
        }

        if let Some(expected) = total_entries {
            if usize::try_from(expected).is_ok_and(|expected| expected != records.len()) {
                tracing::warn!(
                    endpoint,
                    expected,
                    received = records.len(),
                    "collection size differs from reported total"
                );
            }
        }

        Ok(records)
    }

    /// Returns the authenticated user; doubles as a connectivity check.
    pub async fn check<R: DeserializeOwned>(&self) -> Result<R, ApiError> {
        self.get("/users/me.json").await
    }

    pub async fn company<R: DeserializeOwned>(&self) -> Result<R, ApiError> {
        self.get("/company").await
    }

    pub async fn clients<R: DeserializeOwned>(
        &self,
        active: ActiveFilter,
    ) -> Result<Vec<R>, ApiError> {
        let mut params = Params::new();
        active.apply(&mut params);
        self.fetch_all("/clients", "clients", &params).await
    }

    pub async fn users<R: DeserializeOwned>(&self, active: ActiveFilter) -> Result<Vec<R>, ApiError> {
        let mut params = Params::new();
        active.apply(&mut params);
        self.fetch_all("/users", "users", &params).await
    }

    pub async fn projects<R: DeserializeOwned>(
        &self,
        active: ActiveFilter,
        client: Option<ClientId>,
    ) -> Result<Vec<R>, ApiError> {
        let mut params = Params::new();
        active.apply(&mut params);
        if let Some(client) = client {
            params.insert("client_id", client.to_string());
        }
        self.fetch_all("/projects", "projects", &params).await
    }

    pub async fn project<R: DeserializeOwned>(&self, id: ProjectId) -> Result<R, ApiError> {
        self.get(&format!("/projects/{id}")).await
    }

    /// Task assignments of one project, or of every project when `None`.
    pub async fn task_assignments<R: DeserializeOwned>(
        &self,
        project: Option<ProjectId>,
    ) -> Result<Vec<R>, ApiError> {
        let endpoint = project.map_or_else(
            || "/task_assignments".to_string(),
            |id| format!("/projects/{id}/task_assignments"),
        );
        self.fetch_all(&endpoint, "task_assignments", &Params::new())
            .await
    }

    /// Time entries booked against `project`, optionally for one user only.
    pub async fn time_entries<R: DeserializeOwned>(
        &self,
        project: ProjectId,
        user: Option<UserId>,
    ) -> Result<Vec<R>, ApiError> {
        let mut params = Params::new();
        params.insert("project_id", project.to_string());
        if let Some(user) = user {
            params.insert("user_id", user.to_string());
        }
        self.fetch_all("/time_entries", "time_entries", &params)
            .await
    }

    pub async fn time_entry<R: DeserializeOwned>(&self, id: TimeEntryId) -> Result<R, ApiError> {
        self.get(&format!("/time_entries/{id}")).await
    }

    /// Moves a time entry to another project/task, optionally replacing its notes.
    pub async fn update_time_entry<R: DeserializeOwned>(
        &self,
        id: TimeEntryId,
        update: &TimeEntryUpdate,
    ) -> Result<R, ApiError> {
        let endpoint = format!("/time_entries/{id}");
        let mut params = Params::new();
        params.insert("project_id", update.project_id.to_string());
        params.insert("task_id", update.task_id.to_string());
        if let Some(notes) = &update.notes {
            params.insert("notes", notes.clone());
        }
        let body = self.patch(&endpoint, &params).await?;
        decode(&endpoint, body)
    }
}

fn decode<R: DeserializeOwned>(endpoint: &str, body: Value) -> Result<R, ApiError> {
    serde_json::from_value(body).map_err(|source| ApiError::Decode {
        endpoint: endpoint.to_string(),
        source,
    })
}

fn page_records<R: DeserializeOwned>(
    endpoint: &str,
    field: &str,
    mut body: Value,
) -> Result<Vec<R>, ApiError> {
    match body.get_mut(field).map(Value::take) {
        Some(records @ Value::Array(_)) => decode(endpoint, records),
        _ => Err(ApiError::MissingField {
            endpoint: endpoint.to_string(),
            field: field.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use hx_core::{Client, Company, Project, TaskAssignment, TimeEntry, User};
    use serde_json::json;

    use super::*;
    use crate::testing::MockTransport;

    fn entry_json(id: usize) -> Value {
        json!({
            "id": id,
            "spent_date": "2024-05-06",
            "hours": 1.0,
            "notes": format!("entry {id}"),
            "user": {"id": 7, "name": "Kim Allen"},
            "project": {"id": 10, "name": "Website"},
            "task": {"id": 5, "name": "Design"}
        })
    }

    fn entries_page(ids: std::ops::Range<usize>, total_pages: u64, total_entries: u64) -> Value {
        let entries: Vec<Value> = ids.map(entry_json).collect();
        json!({
            "time_entries": entries,
            "per_page": 100,
            "total_pages": total_pages,
            "total_entries": total_entries
        })
    }

    #[tokio::test]
    async fn fetch_all_concatenates_pages_in_order() {
        let transport = MockTransport::new()
            .respond_page("/time_entries", 1, entries_page(1..101, 3, 250))
            .respond_page("/time_entries", 2, entries_page(101..201, 3, 250))
            .respond_page("/time_entries", 3, entries_page(201..251, 3, 250));
        let harvest = Harvest::new(transport);

        let entries: Vec<TimeEntry> = harvest
            .time_entries(ProjectId::new(10).unwrap(), None)
            .await
            .unwrap();

        assert_eq!(entries.len(), 250);
        let ids: Vec<i64> = entries.iter().map(|entry| entry.id.get()).collect();
        let expected: Vec<i64> = (1..=250).collect();
        assert_eq!(ids, expected);
        assert_eq!(entries[99].notes(), "entry 100");
        assert_eq!(entries[100].notes(), "entry 101");
        assert_eq!(entries[249].notes(), "entry 250");
    }

    #[tokio::test]
    async fn fetch_all_passes_filters_on_every_page() {
        let transport = MockTransport::new()
            .respond_page("/time_entries", 1, entries_page(1..101, 2, 150))
            .respond_page("/time_entries", 2, entries_page(101..151, 2, 150));
        let harvest = Harvest::new(transport);

        harvest
            .time_entries::<Value>(ProjectId::new(10).unwrap(), Some(UserId::new(7).unwrap()))
            .await
            .unwrap();

        let requests = harvest.transport().requests();
        assert_eq!(requests.len(), 2);
        for (index, request) in requests.iter().enumerate() {
            assert_eq!(request.method, Method::Get);
            assert_eq!(request.endpoint, "/time_entries");
            assert_eq!(request.params["project_id"], "10");
            assert_eq!(request.params["user_id"], "7");
            assert_eq!(request.params["per_page"], "100");
            assert_eq!(request.params["page"], (index + 1).to_string());
        }
    }

    #[tokio::test]
    async fn fetch_all_single_page_returns_first_page() {
        let transport =
            MockTransport::new().respond_page("/time_entries", 1, entries_page(1..4, 1, 3));
        let harvest = Harvest::new(transport);

        let entries: Vec<TimeEntry> = harvest
            .time_entries(ProjectId::new(10).unwrap(), None)
            .await
            .unwrap();

        assert_eq!(entries.len(), 3);
        assert_eq!(harvest.transport().requests().len(), 1);
    }

    #[tokio::test]
    async fn fetch_all_treats_missing_or_zero_total_pages_as_one() {
        let transport = MockTransport::new()
            .respond_page("/clients", 1, json!({"clients": [
                {"id": 1, "name": "ABC Corp", "is_active": true}
            ]}))
            .respond_page("/users", 1, json!({"users": [], "total_pages": 0, "total_entries": 0}));
        let harvest = Harvest::new(transport);

        let clients: Vec<Client> = harvest.clients(ActiveFilter::All).await.unwrap();
        assert_eq!(clients.len(), 1);

        let users: Vec<User> = harvest.users(ActiveFilter::All).await.unwrap();
        assert!(users.is_empty());
        assert_eq!(harvest.transport().requests().len(), 2);
    }

    #[tokio::test]
    async fn fetch_all_fails_when_a_later_page_fails() {
        let transport = MockTransport::new()
            .respond_page("/time_entries", 1, entries_page(1..101, 3, 250))
            .fail_page("/time_entries", 2, 500, "upstream exploded")
            .respond_page("/time_entries", 3, entries_page(201..251, 3, 250));
        let harvest = Harvest::new(transport);

        let err = harvest
            .time_entries::<TimeEntry>(ProjectId::new(10).unwrap(), None)
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(500));
        assert!(err.to_string().contains("upstream exploded"));
        // Page 3 is never requested once page 2 fails.
        assert_eq!(harvest.transport().requests().len(), 2);
    }

    #[tokio::test]
    async fn fetch_all_rejects_page_without_field() {
        let transport = MockTransport::new()
            .respond_page("/projects", 1, json!({"total_pages": 1, "total_entries": 0}));
        let harvest = Harvest::new(transport);

        let err = harvest
            .projects::<Project>(ActiveFilter::All, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApiError::MissingField { ref field, .. } if field == "projects"
        ));
    }

    #[tokio::test]
    async fn projects_apply_status_and_client_filters() {
        let transport = MockTransport::new()
            .respond_page("/projects", 1, json!({"projects": [], "total_pages": 1}));
        let harvest = Harvest::new(transport);

        harvest
            .projects::<Project>(ActiveFilter::Inactive, Some(ClientId::new(42).unwrap()))
            .await
            .unwrap();

        let request = &harvest.transport().requests()[0];
        assert_eq!(request.params["is_active"], "false");
        assert_eq!(request.params["client_id"], "42");
    }

    #[tokio::test]
    async fn task_assignments_use_project_scoped_endpoint() {
        let transport = MockTransport::new().respond_page(
            "/projects/14/task_assignments",
            1,
            json!({"task_assignments": [
                {"id": 155_505_016, "is_active": true, "task": {"id": 8_083_369, "name": "Research"}}
            ], "total_pages": 1}),
        );
        let harvest = Harvest::new(transport);

        let tasks: Vec<TaskAssignment> = harvest
            .task_assignments(Some(ProjectId::new(14).unwrap()))
            .await
            .unwrap();
        assert_eq!(tasks[0].task.name, "Research");
        assert!(!harvest.transport().requests()[0].params.contains_key("is_active"));
    }

    #[tokio::test]
    async fn update_time_entry_sends_partial_fields() {
        let transport = MockTransport::new().respond(
            Method::Patch,
            "/time_entries/3",
            entry_json(3),
        );
        let harvest = Harvest::new(transport);
        let update = TimeEntryUpdate {
            project_id: ProjectId::new(20).unwrap(),
            task_id: hx_core::TaskId::new(7).unwrap(),
            notes: None,
        };

        harvest
            .update_time_entry::<TimeEntry>(TimeEntryId::new(3).unwrap(), &update)
            .await
            .unwrap();

        let request = &harvest.transport().requests()[0];
        assert_eq!(request.method, Method::Patch);
        assert_eq!(request.params["project_id"], "20");
        assert_eq!(request.params["task_id"], "7");
        assert!(!request.params.contains_key("notes"));
    }

    #[tokio::test]
    async fn single_record_decode_errors_name_endpoint() {
        let transport = MockTransport::new().respond(Method::Get, "/company", json!({"name": 4}));
        let harvest = Harvest::new(transport);

        let err = harvest.company::<Company>().await.unwrap_err();
        assert!(matches!(err, ApiError::Decode { ref endpoint, .. } if endpoint == "/company"));
    }

    #[tokio::test]
    async fn non_200_surfaces_body() {
        let transport =
            MockTransport::new().fail(Method::Get, "/users/me.json", 401, "invalid_token");
        let harvest = Harvest::new(transport);

        let err = harvest.check::<User>().await.unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert_eq!(
            err.to_string(),
            "GET /users/me.json returned status 401: invalid_token"
        );
    }

    #[tokio::test]
    async fn raw_payload_keeps_unmodelled_fields() {
        let transport = MockTransport::new().respond(
            Method::Get,
            "/company",
            json!({"name": "API Examples", "is_active": true, "currency": "USD"}),
        );
        let harvest = Harvest::new(transport);

        let company: Value = harvest.company().await.unwrap();
        assert_eq!(company["currency"], "USD");
        assert!(company.get("week_start_day").is_none());

        let typed: Company = harvest.company().await.unwrap();
        assert_eq!(typed.name, "API Examples");
    }
}
