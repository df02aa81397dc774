//! The chat widget as seen by a host UI
//!
//! One widget owns one conversation. Opening and closing it only changes
//! visibility; the transcript lives until the widget is unmounted.

use crate::backend::ChatBackend;
use crate::config::Settings;
use crate::controller::ChatController;
use crate::state::{ConversationStore, Message};

pub struct ChatWidget<B: ChatBackend> {
    store: ConversationStore,
    controller: ChatController<B>,
    draft: String,
    open: bool,
}

impl<B: ChatBackend> ChatWidget<B> {
    /// Mounts a closed widget with a fresh transcript seeded by the greeting.
    pub fn mount(backend: B, settings: &Settings) -> Self {
        Self {
            store: ConversationStore::new(&settings.greeting),
            controller: ChatController::new(backend, &settings.base_url),
            draft: String::new(),
            open: false,
        }
    }

    pub fn messages(&self) -> &[Message] {
        self.store.messages()
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn is_pending(&self) -> bool {
        self.store.is_pending()
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut String {
        &mut self.draft
    }

    /// Sends the current draft; see [`ChatController::submit`].
    pub fn submit(&mut self) -> bool {
        self.controller.submit(&mut self.store, &mut self.draft)
    }

    pub async fn poll(&mut self) -> bool {
        self.controller.poll(&mut self.store).await
    }

    pub async fn settle(&mut self) -> bool {
        self.controller.settle(&mut self.store).await
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn toggle(&mut self) {
        self.open = !self.open;
    }

    /// Tears the widget down, dropping any reply that has not arrived yet.
    pub fn unmount(mut self) {
        self.controller.detach();
    }
}
