use crate::api::TaskStore;
use crate::classify::{Bucket, Buckets};
use crate::deadline::{Clock, SystemClock};
use crate::error::SyncError;
use crate::models::{Task, TaskDraft};
use crate::parser::parse_deadline;
use crate::sync::SyncClient;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::widgets::ListState;
use std::future::Future;
use std::time::Duration;
use tokio::task::{JoinError, JoinSet};

pub struct App<S> {
    pub client: SyncClient<S>,
    pub clock: Box<dyn Clock>,
    pub bucket: Bucket,
    pub state: ListState,
    pub input_mode: InputMode,
    pub active_input: ActiveInput,
    pub new_task_title: String,
    pub new_task_description: String,
    pub new_task_deadline: String,
    pub form_message: Option<String>,
    actions: JoinSet<(Action, Result<(), SyncError>)>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputMode {
    Normal,
    Editing,
    Insert,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ActiveInput {
    Title,
    Description,
    Deadline,
}

impl ActiveInput {
    fn next(self) -> ActiveInput {
        match self {
            ActiveInput::Title => ActiveInput::Description,
            ActiveInput::Description => ActiveInput::Deadline,
            ActiveInput::Deadline => ActiveInput::Title,
        }
    }
}

/// A store call started from a key press. `Create` carries the form input
/// so it can be put back if the store rejects it.
enum Action {
    Create {
        title: String,
        description: String,
        deadline: String,
    },
    Complete,
    Delete,
}

impl Action {
    fn name(&self) -> &'static str {
        match self {
            Action::Create { .. } => "create",
            Action::Complete => "complete",
            Action::Delete => "delete",
        }
    }
}

impl<S: TaskStore> App<S> {
    pub fn new(client: SyncClient<S>) -> App<S> {
        App::with_clock(client, Box::new(SystemClock))
    }

    pub fn with_clock(client: SyncClient<S>, clock: Box<dyn Clock>) -> App<S> {
        App {
            client,
            clock,
            bucket: Bucket::Ongoing,
            state: ListState::default(),
            input_mode: InputMode::Normal,
            active_input: ActiveInput::Title,
            new_task_title: String::new(),
            new_task_description: String::new(),
            new_task_deadline: String::new(),
            form_message: None,
            actions: JoinSet::new(),
        }
    }

    fn spawn_action<F>(&mut self, action: Action, fut: F)
    where
        F: Future<Output = Result<(), SyncError>> + Send + 'static,
    {
        self.actions.spawn(async move { (action, fut.await) });
    }

    /// Store calls started but not yet collected.
    pub fn pending_actions(&self) -> usize {
        self.actions.len()
    }

    /// Handles every action that has finished since the last call. Never waits.
    pub fn collect_finished(&mut self) {
        while let Some(joined) = self.actions.try_join_next() {
            self.finish_action(joined);
        }
    }

    /// Waits up to `grace` for outstanding actions, then aborts the rest.
    pub async fn finish_actions(&mut self, grace: Duration) {
        let drained = tokio::time::timeout(grace, async {
            while let Some(joined) = self.actions.join_next().await {
                self.finish_action(joined);
            }
        })
        .await;

        if drained.is_err() {
            tracing::warn!(pending = self.actions.len(), "abandoning unfinished task actions");
            self.actions.abort_all();
        }
    }

    // Errors stop here; the next fetch shows the store's state.
    fn finish_action(&mut self, joined: Result<(Action, Result<(), SyncError>), JoinError>) {
        let (action, result) = match joined {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(error = %err, "task action did not finish");
                return;
            }
        };

        match (action, result) {
            (Action::Create { .. }, Ok(())) => {
                if self.input_mode == InputMode::Normal {
                    self.clear_form();
                }
            }
            (Action::Create { title, description, deadline }, Err(err)) => {
                tracing::warn!(action = "create", error = %err, "task action failed");
                if self.input_mode == InputMode::Normal {
                    self.new_task_title = title;
                    self.new_task_description = description;
                    self.new_task_deadline = deadline;
                    self.active_input = ActiveInput::Title;
                    self.input_mode = InputMode::Editing;
                }
                self.form_message = Some(format!("Could not create task: {}", err));
            }
            (_, Ok(())) => {}
            (action, Err(err)) => {
                tracing::warn!(action = action.name(), error = %err, "task action failed");
            }
        }
    }

    /// Keeps the selection inside the current bucket after a snapshot change.
    pub fn sync_selection(&mut self, buckets: &Buckets) {
        let len = buckets.get(self.bucket).len();
        let selected = match (len, self.state.selected()) {
            (0, _) => None,
            (_, Some(i)) => Some(i.min(len - 1)),
            (_, None) => Some(0),
        };
        self.state.select(selected);
    }

    pub fn selected_task(&self, buckets: &Buckets) -> Option<Task> {
        let tasks = buckets.get(self.bucket);
        self.state.selected().and_then(|i| tasks.get(i)).cloned()
    }

    pub fn next(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    fn switch_bucket(&mut self, bucket: Bucket) {
        self.bucket = bucket;
        self.state.select(Some(0));
    }

    fn complete_selected(&mut self) {
        let buckets = self.client.buckets();
        if let Some(task) = self.selected_task(&buckets) {
            if !task.can_complete() {
                return;
            }
            let client = self.client.clone();
            self.spawn_action(Action::Complete, async move { client.complete(&task.id).await });
        }
    }

    fn delete_selected(&mut self) {
        let buckets = self.client.buckets();
        if let Some(task) = self.selected_task(&buckets) {
            let client = self.client.clone();
            self.spawn_action(Action::Delete, async move { client.delete(&task.id).await });
        }
    }

    fn clear_form(&mut self) {
        self.new_task_title.clear();
        self.new_task_description.clear();
        self.new_task_deadline.clear();
        self.form_message = None;
        self.active_input = ActiveInput::Title;
    }

    fn submit_form(&mut self) {
        if self.client.is_form_busy() {
            return;
        }
        if self.new_task_title.trim().is_empty() {
            self.form_message = Some("Task title cannot be empty.".to_string());
            return;
        }
        let deadline = match parse_deadline(&self.new_task_deadline, self.clock.now()) {
            Ok(deadline) => deadline,
            Err(err) => {
                self.form_message = Some(err.to_string());
                return;
            }
        };

        let draft = TaskDraft::new(
            self.new_task_title.trim(),
            self.new_task_description.trim(),
            deadline,
        );
        let action = Action::Create {
            title: self.new_task_title.clone(),
            description: self.new_task_description.clone(),
            deadline: self.new_task_deadline.clone(),
        };
        let client = self.client.clone();
        self.spawn_action(action, async move { client.create(draft).await });

        // The fields are cleared once the store accepts the task.
        self.form_message = None;
        self.input_mode = InputMode::Normal;
    }

    fn active_field(&mut self) -> &mut String {
        match self.active_input {
            ActiveInput::Title => &mut self.new_task_title,
            ActiveInput::Description => &mut self.new_task_description,
            ActiveInput::Deadline => &mut self.new_task_deadline,
        }
    }

    /// Applies one key press. Returns `true` when the user asked to quit.
    pub fn handle_input(&mut self, key: KeyEvent) -> bool {
        if key.kind != KeyEventKind::Press {
            return false;
        }

        match self.input_mode {
            InputMode::Normal => match key.code {
                KeyCode::Char('q') => return true,
                KeyCode::Char('j') | KeyCode::Down => {
                    let len = self.client.buckets().get(self.bucket).len();
                    self.next(len);
                }
                KeyCode::Char('k') | KeyCode::Up => {
                    let len = self.client.buckets().get(self.bucket).len();
                    self.previous(len);
                }
                KeyCode::Char('l') | KeyCode::Right | KeyCode::Tab => {
                    self.switch_bucket(self.bucket.next());
                }
                KeyCode::Char('h') | KeyCode::Left | KeyCode::BackTab => {
                    self.switch_bucket(self.bucket.previous());
                }
                KeyCode::Char('c') => self.complete_selected(),
                KeyCode::Char('d') => self.delete_selected(),
                KeyCode::Char('r') => self.client.request_refresh(),
                KeyCode::Char('a') => {
                    self.clear_form();
                    self.input_mode = InputMode::Editing;
                }
                _ => {}
            },

            InputMode::Editing => match key.code {
                KeyCode::Char('i') => {
                    self.input_mode = InputMode::Insert;
                }
                KeyCode::Tab => {
                    self.active_input = self.active_input.next();
                }
                KeyCode::Enter => self.submit_form(),
                KeyCode::Esc => {
                    self.clear_form();
                    self.input_mode = InputMode::Normal;
                }
                _ => {}
            },

            InputMode::Insert => match key.code {
                KeyCode::Char(c) => self.active_field().push(c),
                KeyCode::Backspace => {
                    self.active_field().pop();
                }
                KeyCode::Tab => {
                    self.active_input = self.active_input.next();
                }
                KeyCode::Enter => self.submit_form(),
                KeyCode::Esc => {
                    self.input_mode = InputMode::Editing;
                }
                _ => {}
            },
        }
        false
    }
}
