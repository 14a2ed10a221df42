//! User interface components.
//!
//! `ChatContainer` is the only stateful piece. Everything else renders what
//! it is handed and reports user actions back through callbacks.

mod box_select;      // Single-choice option list
pub mod chat_container;
mod common_form;     // Input box and send button
mod message_item;    // One message with its remove/refresh controls
pub mod settings;    // Settings page (public for routing)
mod typing_bubble;
