//! Workflow controller
//!
//! Per-subject state machine:
//!
//! ```text
//! Idle -> ThreadCreated -> MessagePosted -> RunQueued -> RunInProgress
//!      -> RunCompleted -> MessagesFetched -> Idle
//!                      -> RunFailed | RunTimedOut
//! ```
//!
//! Threads are memoized per subject key so repeated interactions reuse the
//! same conversation. Each subject serializes its own workflow behind an
//! async lock; distinct subjects never wait on each other, so one hung run
//! cannot freeze the rest of the dashboard.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;

use super::bound_payload;
use crate::clients::assistant::{
    AssistantError, MessageRole, RunStatus, SummaryApi, ThreadMessage,
};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum WorkflowPhase {
    Idle,
    ThreadCreated,
    MessagePosted,
    RunQueued,
    RunInProgress,
    RunCompleted,
    RunFailed,
    RunTimedOut,
    MessagesFetched,
}

#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Fixed run-status poll interval.
    pub poll_interval: Duration,
    /// Attempt budget; exhaustion is the terminal `RunTimedOut` state. The
    /// poll must never be unbounded.
    pub max_poll_attempts: u32,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(1500),
            max_poll_attempts: 40,
        }
    }
}

struct SubjectState {
    thread_id: Option<String>,
    seen: HashSet<String>,
    phase: WorkflowPhase,
}

struct SubjectThread {
    state: tokio::sync::Mutex<SubjectState>,
}

impl SubjectThread {
    fn new() -> Self {
        Self {
            state: tokio::sync::Mutex::new(SubjectState {
                thread_id: None,
                seen: HashSet::new(),
                phase: WorkflowPhase::Idle,
            }),
        }
    }
}

pub struct SummaryWorkflow<A> {
    api: A,
    config: WorkflowConfig,
    /// Thread-per-subject cache. Lookup and insert happen under one lock
    /// acquisition so two racing calls for the same subject get the same
    /// handle.
    subjects: Mutex<HashMap<String, Arc<SubjectThread>>>,
}

impl<A: SummaryApi> SummaryWorkflow<A> {
    pub fn new(api: A, config: WorkflowConfig) -> Self {
        Self {
            api,
            config,
            subjects: Mutex::new(HashMap::new()),
        }
    }

    fn subject(&self, key: &str) -> Arc<SubjectThread> {
        self.subjects
            .lock()
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(SubjectThread::new()))
            .clone()
    }

    /// Run one full summarization cycle for a subject and return only the
    /// assistant messages not yet surfaced to the caller.
    ///
    /// `cancel` is tied to view teardown; a signal stops the poll loop.
    pub async fn summarize(
        &self,
        subject_key: &str,
        payload: &Value,
        mut cancel: watch::Receiver<bool>,
    ) -> Result<Vec<ThreadMessage>, AssistantError> {
        let subject = self.subject(subject_key);
        let mut state = subject.state.lock().await;

        let thread_id = match &state.thread_id {
            Some(id) => id.clone(),
            None => {
                let id = self.api.create_thread().await?;
                state.thread_id = Some(id.clone());
                state.phase = WorkflowPhase::ThreadCreated;
                tracing::debug!(subject = subject_key, thread = %id, "assistant thread created");
                id
            }
        };

        self.api
            .post_message(&thread_id, &render_prompt(payload))
            .await?;
        state.phase = WorkflowPhase::MessagePosted;

        let run_id = self.api.start_run(&thread_id).await?;
        state.phase = WorkflowPhase::RunQueued;
        tracing::debug!(subject = subject_key, run = %run_id, "assistant run queued");

        let mut attempts = 0u32;
        loop {
            if attempts >= self.config.max_poll_attempts {
                state.phase = WorkflowPhase::RunTimedOut;
                tracing::warn!(
                    subject = subject_key,
                    run = %run_id,
                    attempts,
                    "assistant run did not finish within the poll budget"
                );
                return Err(AssistantError::RunTimedOut);
            }

            tokio::select! {
                _ = cancel.changed() => {
                    state.phase = WorkflowPhase::Idle;
                    return Err(AssistantError::Cancelled);
                }
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
            attempts += 1;

            match self.api.run_status(&thread_id, &run_id).await? {
                RunStatus::Completed => {
                    state.phase = WorkflowPhase::RunCompleted;
                    break;
                }
                RunStatus::Failed => {
                    state.phase = WorkflowPhase::RunFailed;
                    return Err(AssistantError::RunFailed(
                        "the assistant could not complete this request".to_string(),
                    ));
                }
                RunStatus::InProgress => state.phase = WorkflowPhase::RunInProgress,
                RunStatus::Queued | RunStatus::Other => {}
            }
        }

        let mut messages = self.api.list_messages(&thread_id).await?;
        messages.sort_by_key(|m| m.created_at);

        let fresh: Vec<ThreadMessage> = messages
            .into_iter()
            .filter(|m| m.role == MessageRole::Assistant)
            .filter(|m| state.seen.insert(m.id.clone()))
            .collect();

        state.phase = WorkflowPhase::MessagesFetched;
        tracing::debug!(
            subject = subject_key,
            fresh = fresh.len(),
            "assistant messages fetched"
        );
        state.phase = WorkflowPhase::Idle;

        Ok(fresh)
    }
}

fn render_prompt(payload: &Value) -> String {
    let bounded = bound_payload(payload);
    let body = serde_json::to_string_pretty(&bounded).unwrap_or_else(|_| bounded.to_string());
    format!(
        "Summarize the following security findings for an operations dashboard. \
         Keep it short, factual, and actionable.\n\n{body}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Scripted stand-in for the assistant API.
    struct StubApi {
        threads_created: AtomicU32,
        status_polls: AtomicU32,
        status: RunStatus,
        messages: Vec<ThreadMessage>,
    }

    impl StubApi {
        fn completing_with(messages: Vec<ThreadMessage>) -> Self {
            Self {
                threads_created: AtomicU32::new(0),
                status_polls: AtomicU32::new(0),
                status: RunStatus::Completed,
                messages,
            }
        }

        fn stuck_in_queue() -> Self {
            Self {
                threads_created: AtomicU32::new(0),
                status_polls: AtomicU32::new(0),
                status: RunStatus::Queued,
                messages: vec![],
            }
        }

        fn failing() -> Self {
            Self {
                threads_created: AtomicU32::new(0),
                status_polls: AtomicU32::new(0),
                status: RunStatus::Failed,
                messages: vec![],
            }
        }
    }

    #[axum::async_trait]
    impl SummaryApi for StubApi {
        async fn create_thread(&self) -> Result<String, AssistantError> {
            let n = self.threads_created.fetch_add(1, Ordering::SeqCst);
            Ok(format!("thread-{n}"))
        }

        async fn post_message(&self, _thread_id: &str, _text: &str) -> Result<(), AssistantError> {
            Ok(())
        }

        async fn start_run(&self, _thread_id: &str) -> Result<String, AssistantError> {
            Ok("run-0".to_string())
        }

        async fn run_status(
            &self,
            _thread_id: &str,
            _run_id: &str,
        ) -> Result<RunStatus, AssistantError> {
            self.status_polls.fetch_add(1, Ordering::SeqCst);
            Ok(self.status)
        }

        async fn list_messages(
            &self,
            _thread_id: &str,
        ) -> Result<Vec<ThreadMessage>, AssistantError> {
            Ok(self.messages.clone())
        }
    }

    fn message(id: &str, role: MessageRole, created_at: i64) -> ThreadMessage {
        ThreadMessage {
            id: id.to_string(),
            role,
            text: format!("message {id}"),
            created_at,
        }
    }

    fn fast_config(max_poll_attempts: u32) -> WorkflowConfig {
        WorkflowConfig {
            poll_interval: Duration::from_millis(1),
            max_poll_attempts,
        }
    }

    fn live_cancel() -> (watch::Sender<bool>, watch::Receiver<bool>) {
        watch::channel(false)
    }

    #[tokio::test]
    async fn test_stuck_run_reaches_timed_out_within_budget() {
        let workflow = SummaryWorkflow::new(StubApi::stuck_in_queue(), fast_config(3));
        let (_tx, rx) = live_cancel();

        let result = workflow.summarize("agent:001", &json!({}), rx).await;

        assert!(matches!(result, Err(AssistantError::RunTimedOut)));
        assert_eq!(workflow.api.status_polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_thread_reused_per_subject_key() {
        let workflow = SummaryWorkflow::new(StubApi::completing_with(vec![]), fast_config(5));
        let (_tx, rx) = live_cancel();

        workflow
            .summarize("agent:001", &json!({}), rx.clone())
            .await
            .unwrap();
        workflow
            .summarize("agent:001", &json!({}), rx.clone())
            .await
            .unwrap();
        assert_eq!(workflow.api.threads_created.load(Ordering::SeqCst), 1);

        workflow.summarize("agent:002", &json!({}), rx).await.unwrap();
        assert_eq!(workflow.api.threads_created.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_only_new_assistant_messages_surface() {
        let api = StubApi::completing_with(vec![
            message("m3", MessageRole::Assistant, 30),
            message("m1", MessageRole::Assistant, 10),
            message("m2", MessageRole::User, 20),
        ]);
        let workflow = SummaryWorkflow::new(api, fast_config(5));
        let (_tx, rx) = live_cancel();

        let first = workflow
            .summarize("vuln:CVE-2023-4863", &json!({}), rx.clone())
            .await
            .unwrap();
        assert_eq!(first.len(), 2);
        // Ascending by creation time; user message filtered out.
        assert_eq!(first[0].id, "m1");
        assert_eq!(first[1].id, "m3");

        let second = workflow
            .summarize("vuln:CVE-2023-4863", &json!({}), rx)
            .await
            .unwrap();
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn test_failed_run_surfaces_error_without_retry() {
        let workflow = SummaryWorkflow::new(StubApi::failing(), fast_config(5));
        let (_tx, rx) = live_cancel();

        let result = workflow.summarize("agent:003", &json!({}), rx).await;

        assert!(matches!(result, Err(AssistantError::RunFailed(_))));
        assert_eq!(workflow.api.status_polls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancellation_stops_polling() {
        let workflow = SummaryWorkflow::new(
            StubApi::stuck_in_queue(),
            WorkflowConfig {
                poll_interval: Duration::from_secs(60),
                max_poll_attempts: 100,
            },
        );
        let (tx, rx) = live_cancel();
        tx.send(true).unwrap();

        let result = workflow.summarize("agent:004", &json!({}), rx).await;

        assert!(matches!(result, Err(AssistantError::Cancelled)));
        assert_eq!(workflow.api.status_polls.load(Ordering::SeqCst), 0);
    }
}
