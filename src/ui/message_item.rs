use dioxus::prelude::*;

use crate::session::{Message, Role};

#[component]
pub fn MessageItem(
    message: Message,
    is_last: bool,
    is_loading: bool,
    on_refresh: EventHandler<()>,
    on_remove: EventHandler<()>,
) -> Element {
    let class = match message.role {
        Role::System => "message system-message",
        Role::User => "message human-message",
        Role::Assistant => "message ai-message",
    };
    // Only the newest reply can be regenerated, and not while one is streaming.
    let can_refresh = is_last && !is_loading;
    let can_remove = !(is_last && is_loading);
    let body = crate::md2rsx::markdown_to_rsx(&message.content)?;

    rsx! {
        div { class,
            {body}
            div { class: "message-actions",
                if can_refresh {
                    button {
                        r#type: "button",
                        title: "Regenerate response",
                        onclick: move |_| on_refresh.call(()),
                        "⟳"
                    }
                }
                if can_remove {
                    button {
                        r#type: "button",
                        title: "Remove message",
                        onclick: move |_| on_remove.call(()),
                        "✕"
                    }
                }
            }
        }
    }
}
