//! Chat container: the message list, input form and conversation controls.
//!
//! Conversation state lives in a single `Signal<ChatSession>`. Every handler
//! mutates it through `with_mut` when it fires, so nothing here ever acts on
//! a message list captured at render time.

use std::rc::Rc;

use dioxus::{
    logger::tracing::{info, warn},
    prelude::*,
};

use crate::{
    app_settings::ChatSettings,
    llm::{ChatClient, ChatRequest, stream_reply},
    session::{ChatSession, PendingRequest},
    ui::{common_form::CommonForm, message_item::MessageItem, typing_bubble::TypingBubble},
};

#[component]
pub fn ChatContainer(settings: ChatSettings) -> Element {
    let session = use_signal(ChatSession::new);
    rsx! {
        ChatView { session, settings }
    }
}

/// Renders and drives an existing session.
#[component]
fn ChatView(session: Signal<ChatSession>, settings: ChatSettings) -> Element {
    let mut session = session;
    let mut messages_end: Signal<Option<Rc<MountedData>>> = use_signal(|| None);

    // Only changes to the message sequence should scroll, not typing.
    let revision = use_memo(move || session.read().revision());
    use_effect(move || {
        let _ = revision();
        let Some(anchor) = messages_end.cloned() else {
            return;
        };
        spawn(async move {
            if let Err(e) = anchor.scroll_to(ScrollBehavior::Smooth).await {
                warn!("Could not scroll to newest message: {e:?}");
            }
        });
    });

    // Streams the reply for `request` into the session. Errors end the request
    // and are only logged.
    let dispatch = use_callback(move |request: PendingRequest| {
        let settings = settings.clone();
        spawn(async move {
            let ticket = request.ticket;
            let client = ChatClient::new(settings.endpoint.clone());
            let body = ChatRequest::new(&request.messages, &settings);
            info!("Sending {} messages to {}", body.messages.len(), client.endpoint_url());
            let res = stream_reply(&client, &body, |delta| {
                session.with_mut(|s| s.apply_delta(ticket, delta));
            })
            .await;
            match res {
                Ok(()) => session.with_mut(|s| s.finish(ticket)),
                Err(e) => session.with_mut(|s| s.fail(ticket, &e)),
            }
        });
    });

    let handle_submit = move |_: ()| {
        if let Some(request) = session.with_mut(|s| s.submit()) {
            dispatch(request);
        }
    };
    let handle_clear_chat = move |_: MouseEvent| session.with_mut(|s| s.clear());
    let handle_refresh_message = move |_: ()| {
        if let Some(request) = session.with_mut(|s| s.reload()) {
            dispatch(request);
        }
    };

    let s = session.read();
    let is_loading = s.is_loading();
    let count = s.messages().len();
    let items = s.messages().iter().cloned().enumerate().map(move |(index, message)| {
        let key = message.id.clone();
        let id = message.id.clone();
        rsx! {
            MessageItem {
                key: "{key}",
                message,
                is_last: index + 1 == count,
                is_loading,
                on_refresh: handle_refresh_message,
                on_remove: move |_: ()| session.with_mut(|s| s.remove(&id)),
            }
        }
    });

    rsx! {
        div {
            class: "chat-container",
            style: "
            display: flex;
            flex-direction: column;
            height: 95vh;
            ",
            div {
                class: "card",
                style: "
                display: flex;
                flex-direction: column;
                flex: 1;
                overflow: hidden;
                ",
                if s.shows_clear_control() {
                    div { style: "display: flex; padding: 1rem;",
                        button {
                            class: "secondary small",
                            r#type: "button",
                            onclick: handle_clear_chat,
                            "✕ Clear chat history"
                        }
                    }
                }
                div {
                    style: "
                    flex: 1;
                    overflow-y: auto;
                    ",
                    {items}
                    div {
                        onmounted: move |e: MountedEvent| messages_end.set(Some(e.data())),
                    }
                    if is_loading {
                        TypingBubble {}
                    }
                }
                div {
                    style: "
                    flex-grow: 0;
                    padding: 1.5em;
                    ",
                    CommonForm {
                        value: s.input().to_string(),
                        placeholder: "Chat with Gemini Pro".to_string(),
                        loading: is_loading,
                        is_submittable: s.is_submittable(),
                        on_input: move |text: String| session.with_mut(|s| s.set_input(text)),
                        on_submit: handle_submit,
                    }
                }
            }
        }
    }
}
