//! Conversation state for a single chat session.
//!
//! `ChatSession` owns the message list, the input box text and the loading
//! phase. The UI keeps one instance inside a signal and mutates it through
//! `with_mut`, so deferred callbacks (stream deltas, remove buttons) always
//! operate on the latest list rather than a copy captured at render time.

use dioxus::logger::tracing::warn;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Loading,
}

/// Identifies one in-flight request. Stream output for any other ticket is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket(u64);

/// History snapshot to send for a submit or reload.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRequest {
    pub ticket: RequestTicket,
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, PartialEq)]
struct ActiveRequest {
    ticket: RequestTicket,
    reply_id: Option<String>,
    detached: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChatSession {
    messages: Vec<Message>,
    input: String,
    phase: Phase,
    active: Option<ActiveRequest>,
    revision: u64,
    next_id: u64,
    next_ticket: u64,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Loading
    }

    /// Bumped on every change to the message sequence.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn is_submittable(&self) -> bool {
        !self.input.trim().is_empty()
    }

    pub fn can_submit(&self) -> bool {
        self.is_submittable() && self.phase == Phase::Idle
    }

    pub fn shows_clear_control(&self) -> bool {
        !self.messages.is_empty()
    }

    pub fn submit(&mut self) -> Option<PendingRequest> {
        if !self.can_submit() {
            return None;
        }
        let content = std::mem::take(&mut self.input);
        let msg = self.new_message(Role::User, content);
        self.messages.push(msg);
        self.touch();
        Some(self.start_request())
    }

    /// Re-issues the latest request, replacing the trailing assistant reply.
    pub fn reload(&mut self) -> Option<PendingRequest> {
        if self.phase == Phase::Loading || self.messages.is_empty() {
            return None;
        }
        if self.messages.last().map(|m| m.role) == Some(Role::Assistant) {
            self.messages.pop();
            self.touch();
        }
        if self.messages.is_empty() {
            return None;
        }
        Some(self.start_request())
    }

    pub fn apply_delta(&mut self, ticket: RequestTicket, text: &str) {
        if text.is_empty() {
            return;
        }
        let Some(active) = self.active.as_ref() else {
            return;
        };
        if active.ticket != ticket || active.detached {
            return;
        }
        match active.reply_id.clone() {
            Some(id) => {
                if let Some(m) = self.messages.iter_mut().find(|m| m.id == id) {
                    m.content.push_str(text);
                }
            }
            None => {
                let msg = self.new_message(Role::Assistant, text.to_string());
                let id = msg.id.clone();
                self.messages.push(msg);
                if let Some(active) = self.active.as_mut() {
                    active.reply_id = Some(id);
                }
            }
        }
        self.touch();
    }

    pub fn finish(&mut self, ticket: RequestTicket) {
        if self.active.take_if(|a| a.ticket == ticket).is_some() {
            self.phase = Phase::Idle;
        }
    }

    /// Ends the request after a transport error. Text streamed so far is kept,
    /// since a reply message only exists once a non-empty delta arrived.
    pub fn fail(&mut self, ticket: RequestTicket, error: &anyhow::Error) {
        warn!("Chat request failed: {error:?}");
        self.finish(ticket);
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        if let Some(active) = self.active.as_mut() {
            active.detached = true;
        }
        self.touch();
    }

    pub fn remove(&mut self, id: &str) {
        let before = self.messages.len();
        self.messages.retain(|m| m.id != id);
        if self.messages.len() == before {
            return;
        }
        if let Some(active) = self.active.as_mut()
            && active.reply_id.as_deref() == Some(id)
        {
            active.detached = true;
        }
        self.touch();
    }

    fn start_request(&mut self) -> PendingRequest {
        let ticket = RequestTicket(self.next_ticket);
        self.next_ticket += 1;
        self.active = Some(ActiveRequest {
            ticket,
            reply_id: None,
            detached: false,
        });
        self.phase = Phase::Loading;
        PendingRequest {
            ticket,
            messages: self.messages.clone(),
        }
    }

    fn new_message(&mut self, role: Role, content: String) -> Message {
        let id = format!("msg-{}", self.next_id);
        self.next_id += 1;
        Message { id, role, content }
    }

    fn touch(&mut self) {
        self.revision += 1;
    }
}
