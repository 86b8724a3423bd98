//! Google Calendar v3 and Google Tasks v1 behind [`CalendarService`].

use anyhow::{Context, Result};
use async_trait::async_trait;
use calplan_core::{
    AccessToken, CalPlanError, CalPlanResult, CalendarService, EventQuery, EventResource,
    GoogleConfig, TaskQuery, TaskResource,
};
use chrono::{DateTime, Utc};
use google_calendar::Client;
use google_calendar::types::{OrderBy, SendUpdates};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::convert::{FromGoogle, ToGoogle};

const TASKS_API_BASE: &str = "https://tasks.googleapis.com/tasks/v1";

pub struct GoogleCalendar {
    client_id: String,
    client_secret: String,
    api_key: Option<String>,
    http: reqwest::Client,
}

impl GoogleCalendar {
    pub fn new(config: &GoogleConfig) -> Self {
        GoogleCalendar {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            http: reqwest::Client::new(),
        }
    }

    fn client(&self, token: &AccessToken) -> Client {
        Client::new(
            self.client_id.clone(),
            self.client_secret.clone(),
            String::new(),
            token.access_token.clone(),
            token.refresh_token.clone(),
        )
    }

    async fn fetch_tasks(
        &self,
        token: &AccessToken,
        tasklist_id: &str,
        query: &TaskQuery,
    ) -> Result<Vec<TaskResource>> {
        let mut tasks = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let url = tasks_url(
                TASKS_API_BASE,
                tasklist_id,
                query,
                page_token.as_deref(),
                self.api_key.as_deref(),
            )?;

            let response = self
                .http
                .get(url)
                .bearer_auth(&token.access_token)
                .send()
                .await
                .context("Failed to send tasks request")?;

            let status = response.status();
            if !status.is_success() {
                let error_text = response.text().await.unwrap_or_default();
                anyhow::bail!("Failed to list tasks ({status}): {error_text}");
            }

            let page: TasksPage = response
                .json()
                .await
                .context("Failed to parse tasks response")?;

            tasks.extend(page.items.into_iter().map(TaskResource::from));

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        debug!(tasklist_id, count = tasks.len(), "tasks fetched");
        Ok(tasks)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TasksPage {
    #[serde(default)]
    items: Vec<GoogleTask>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleTask {
    id: String,
    #[serde(default)]
    title: String,
    notes: Option<String>,
    due: Option<DateTime<Utc>>,
    status: Option<String>,
}

impl From<GoogleTask> for TaskResource {
    fn from(task: GoogleTask) -> Self {
        TaskResource {
            id: task.id,
            title: task.title,
            description: task.notes,
            due: task.due,
            status: task.status,
        }
    }
}

fn tasks_url(
    base: &str,
    tasklist_id: &str,
    query: &TaskQuery,
    page_token: Option<&str>,
    api_key: Option<&str>,
) -> Result<Url> {
    let mut url = Url::parse(base).context("Invalid Tasks API base URL")?;
    url.path_segments_mut()
        .map_err(|_| anyhow::anyhow!("Tasks API base URL cannot have a path"))?
        .extend(["lists", tasklist_id, "tasks"]);

    {
        let mut pairs = url.query_pairs_mut();
        pairs
            .append_pair("showCompleted", &query.show_completed.to_string())
            .append_pair("showDeleted", &query.show_deleted.to_string())
            .append_pair("showDue", &query.show_due.to_string())
            .append_pair("maxResults", "100");
        if let Some(page_token) = page_token {
            pairs.append_pair("pageToken", page_token);
        }
        if let Some(api_key) = api_key {
            pairs.append_pair("key", api_key);
        }
    }

    Ok(url)
}

fn is_gone(err: &impl std::fmt::Display) -> bool {
    let error_str = err.to_string();
    error_str.contains("410") || error_str.contains("Gone")
}

#[async_trait]
impl CalendarService for GoogleCalendar {
    async fn list_events(
        &self,
        token: &AccessToken,
        calendar_id: &str,
        query: &EventQuery,
    ) -> CalPlanResult<Vec<EventResource>> {
        let order_by = if query.single_events {
            OrderBy::StartTime
        } else {
            OrderBy::default()
        };

        let response = self
            .client(token)
            .events()
            .list_all(
                calendar_id,
                "",
                0,
                order_by,
                &[],
                "", // search query
                &[],
                query.show_deleted,
                false,
                query.single_events,
                &query.time_max.to_rfc3339(),
                &query.time_min.to_rfc3339(),
                "",
                "",
            )
            .await
            .context("Failed to fetch events")
            .map_err(CalPlanError::remote)?;

        let events: Vec<EventResource> = response
            .body
            .into_iter()
            .map(EventResource::from_google)
            .collect();
        debug!(calendar_id, count = events.len(), "events fetched");
        Ok(events)
    }

    async fn insert_event(
        &self,
        token: &AccessToken,
        calendar_id: &str,
        event: &EventResource,
    ) -> CalPlanResult<EventResource> {
        let google_event = event.to_google();

        let response = self
            .client(token)
            .events()
            .insert(
                calendar_id,
                0,
                0,
                false,
                SendUpdates::None,
                false,
                &google_event,
            )
            .await
            .with_context(|| format!("Failed to create event: {}", &google_event.summary))
            .map_err(CalPlanError::remote)?;

        Ok(EventResource::from_google(response.body))
    }

    async fn update_event(
        &self,
        token: &AccessToken,
        calendar_id: &str,
        event_id: &str,
        event: &EventResource,
    ) -> CalPlanResult<EventResource> {
        let mut google_event = event.to_google();
        google_event.id = event_id.to_string();

        let response = self
            .client(token)
            .events()
            .update(
                calendar_id,
                event_id,
                0,
                0,
                false,
                SendUpdates::None,
                false,
                &google_event,
            )
            .await
            .with_context(|| format!("Failed to update event: {event_id}"))
            .map_err(CalPlanError::remote)?;

        Ok(EventResource::from_google(response.body))
    }

    async fn delete_event(
        &self,
        token: &AccessToken,
        calendar_id: &str,
        event_id: &str,
    ) -> CalPlanResult<()> {
        let result = self
            .client(token)
            .events()
            .delete(calendar_id, event_id, false, SendUpdates::None)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_gone(&e) => {
                debug!(event_id, "event already gone");
                Ok(())
            }
            Err(e) => Err(e)
                .with_context(|| format!("Failed to delete event: {event_id}"))
                .map_err(CalPlanError::remote),
        }
    }

    async fn get_event(
        &self,
        token: &AccessToken,
        calendar_id: &str,
        event_id: &str,
    ) -> CalPlanResult<EventResource> {
        let response = self
            .client(token)
            .events()
            .get(calendar_id, event_id, 0, "")
            .await
            .with_context(|| format!("Failed to fetch event: {event_id}"))
            .map_err(CalPlanError::remote)?;

        Ok(EventResource::from_google(response.body))
    }

    async fn list_tasks(
        &self,
        token: &AccessToken,
        tasklist_id: &str,
        query: &TaskQuery,
    ) -> CalPlanResult<Vec<TaskResource>> {
        self.fetch_tasks(token, tasklist_id, query)
            .await
            .map_err(CalPlanError::remote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tasks_url_carries_filters_and_paging() {
        let url = tasks_url(
            TASKS_API_BASE,
            "@default",
            &TaskQuery::default(),
            Some("next"),
            Some("key123"),
        )
        .unwrap();

        assert_eq!(url.path(), "/tasks/v1/lists/@default/tasks");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(pairs.contains(&("showCompleted".into(), "false".into())));
        assert!(pairs.contains(&("showDeleted".into(), "false".into())));
        assert!(pairs.contains(&("showDue".into(), "true".into())));
        assert!(pairs.contains(&("pageToken".into(), "next".into())));
        assert!(pairs.contains(&("key".into(), "key123".into())));
    }

    #[test]
    fn tasks_url_escapes_list_ids() {
        let url = tasks_url(TASKS_API_BASE, "a/b", &TaskQuery::default(), None, None).unwrap();
        assert_eq!(url.path(), "/tasks/v1/lists/a%2Fb/tasks");
        assert!(!url.query().unwrap_or_default().contains("pageToken"));
    }

    #[test]
    fn tasks_page_parses_google_shape() {
        let page: TasksPage = serde_json::from_str(
            r#"{
                "kind": "tasks#tasks",
                "nextPageToken": "p2",
                "items": [
                    {"id": "t1", "title": "Pay rent", "notes": "by transfer",
                     "due": "2025-03-21T00:00:00.000Z", "status": "needsAction"},
                    {"id": "t2", "title": "Someday"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(page.next_page_token.as_deref(), Some("p2"));
        let tasks: Vec<TaskResource> = page.items.into_iter().map(TaskResource::from).collect();
        assert_eq!(tasks[0].description.as_deref(), Some("by transfer"));
        assert!(tasks[0].due.is_some());
        assert!(tasks[1].due.is_none());
    }

    #[test]
    fn gone_errors_are_recognised() {
        assert!(is_gone(&"HTTP 410 Gone"));
        assert!(!is_gone(&"HTTP 404 Not Found"));
    }
}
