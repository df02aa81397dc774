use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use textbook_core::{BackendError, ChatWidget, HealthStatus, HttpBackend, Message, Settings};
use tokio::task::JoinHandle;
use tracing::{debug, info};

const LANDING_PAGE: &str = "\
# Physical AI & Humanoid Robotics

Welcome to the terminal companion of the **Physical AI & Humanoid Robotics** textbook.

Open a chapter by passing its markdown file on the command line:

    textbook-chat docs/chapter-1.md

The textbook assistant answers questions about the book's content.
Press **c** to open it, type your question and press **Enter**.
Closing the assistant keeps the conversation, so you can pick up where you left off.
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// Result of the last health probe against the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendStatus {
    Unknown,
    Online,
    Offline,
}

/// The page the chat widget floats over
pub struct HostPage {
    pub title: String,
    pub lines: Vec<String>,
    pub scroll: u16,
    pub height: u16, // visible rows, updated on render
}

impl HostPage {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let content = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read page: {}", path.display()))?;
                let title = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "Page".to_string());
                Ok(Self::from_markdown(&title, &content))
            }
            None => Ok(Self::from_markdown("Home", LANDING_PAGE)),
        }
    }

    pub fn from_markdown(title: &str, content: &str) -> Self {
        Self {
            title: title.to_string(),
            lines: content.lines().map(str::to_string).collect(),
            scroll: 0,
            height: 0,
        }
    }

    fn max_scroll(&self) -> u16 {
        clamp_rows(self.lines.len()).saturating_sub(self.height.max(1))
    }

    pub fn scroll_down(&mut self, rows: u16) {
        self.scroll = self.scroll.saturating_add(rows).min(self.max_scroll());
    }

    pub fn scroll_up(&mut self, rows: u16) {
        self.scroll = self.scroll.saturating_sub(rows);
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll = 0;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll = self.max_scroll();
    }
}

pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,

    pub page: HostPage,

    // The single chat widget instance and its view state
    pub chat: ChatWidget<HttpBackend>,
    pub draft_cursor: usize, // char index into the draft
    pub chat_scroll: u16,
    pub chat_height: u16, // inner height of the transcript pane
    pub chat_width: u16,  // inner width, for wrap estimates

    pub animation_frame: u8,
    pub backend_status: BackendStatus,
    pub base_url: String,

    backend: HttpBackend,
    health_task: Option<JoinHandle<Result<HealthStatus, BackendError>>>,
}

impl App {
    pub fn new(settings: &Settings, page: HostPage) -> Result<Self> {
        let backend = HttpBackend::new(&settings.base_url, settings.timeout)
            .context("Failed to build HTTP client")?;
        let chat = ChatWidget::mount(backend.clone(), settings);

        let mut app = Self {
            should_quit: false,
            input_mode: InputMode::Normal,
            page,
            chat,
            draft_cursor: 0,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            animation_frame: 0,
            backend_status: BackendStatus::Unknown,
            base_url: settings.base_url.clone(),
            backend,
            health_task: None,
        };
        app.check_health();
        Ok(app)
    }

    pub fn open_chat(&mut self) {
        self.chat.open();
        self.input_mode = InputMode::Editing;
        self.scroll_chat_to_bottom();
        self.check_health();
    }

    pub fn close_chat(&mut self) {
        self.chat.close();
        self.input_mode = InputMode::Normal;
    }

    pub fn submit_draft(&mut self) {
        if self.chat.submit() {
            self.draft_cursor = 0;
            self.scroll_chat_to_bottom();
        }
    }

    /// Folds finished background work into the view. Called once per event.
    pub async fn refresh(&mut self) {
        if self.chat.poll().await {
            self.scroll_chat_to_bottom();
        }

        let health_done = self
            .health_task
            .as_ref()
            .map(JoinHandle::is_finished)
            .unwrap_or(false);
        if health_done {
            if let Some(task) = self.health_task.take() {
                self.backend_status = match task.await {
                    Ok(Ok(health)) if health.is_healthy() => BackendStatus::Online,
                    Ok(result) => {
                        debug!(?result, "backend health check failed");
                        BackendStatus::Offline
                    }
                    Err(_) => BackendStatus::Offline,
                };
            }
        }
    }

    fn check_health(&mut self) {
        if self.health_task.is_some() {
            return;
        }
        let backend = self.backend.clone();
        self.health_task = Some(tokio::spawn(async move { backend.health().await }));
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.chat.is_pending() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_chat_down(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_add(1);
    }

    pub fn scroll_chat_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    /// Scroll the transcript so the newest message (or the typing indicator) is visible
    pub fn scroll_chat_to_bottom(&mut self) {
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            40
        };

        let total_lines = clamp_rows(transcript_rows(self.chat.messages(), self.chat.is_pending(), wrap_width));

        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            16
        };

        self.chat_scroll = total_lines.saturating_sub(visible_height);
    }

    /// Unmounts the chat widget; an unanswered request is dropped.
    pub fn shutdown(self) {
        if let Some(task) = &self.health_task {
            task.abort();
        }
        info!(messages = self.chat.messages().len(), "closing chat session");
        self.chat.unmount();
    }
}
