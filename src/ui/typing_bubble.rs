use dioxus::prelude::*;

#[component]
pub fn TypingBubble() -> Element {
    rsx! {
        div { class: "message ai-message typing-bubble",
            span { class: "dot" }
            span { class: "dot" }
            span { class: "dot" }
        }
    }
}
