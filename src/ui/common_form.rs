// Copyright © 2025 Nipun Kumar

use dioxus::prelude::*;

#[component]
pub fn CommonForm(
    value: String,
    placeholder: String,
    loading: bool,
    is_submittable: bool,
    on_input: EventHandler<String>,
    on_submit: EventHandler<()>,
) -> Element {
    let can_send = is_submittable && !loading;
    let disabled = if can_send { None } else { Some(true) };
    rsx! {
        form {
            class: "common-form",
            style: "
            display: flex;
            flex-direction: row;
            ",
            onsubmit: move |e: FormEvent| {
                e.prevent_default();
                if can_send {
                    on_submit.call(());
                }
            },
            textarea {
                style: "flex-grow: 1; max-height: 10em; height: 4em;",
                placeholder,
                value,
                oninput: move |e: Event<FormData>| on_input.call(e.value()),
                onkeydown: move |e: Event<KeyboardData>| {
                    if e.key() == Key::Enter && !e.modifiers().shift() {
                        e.prevent_default();
                        if can_send {
                            on_submit.call(());
                        }
                    }
                },
            }
            button { r#type: "submit", disabled, "Send" }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(app: fn() -> Element) -> String {
        let mut dom = VirtualDom::new(app);
        dom.rebuild_in_place();
        dioxus_ssr::render(&dom)
    }

    fn form(value: &str, loading: bool) -> Element {
        rsx! {
            CommonForm {
                value: value.to_string(),
                placeholder: "Chat with Gemini Pro".to_string(),
                loading,
                is_submittable: !value.trim().is_empty(),
                on_input: |_: String| {},
                on_submit: |_: ()| {},
            }
        }
    }

    #[test]
    fn blank_input_disables_send() {
        assert!(render(|| form("", false)).contains("disabled"));
        assert!(render(|| form("  \n ", false)).contains("disabled"));
    }

    #[test]
    fn loading_disables_send_even_with_text() {
        assert!(render(|| form("hello", true)).contains("disabled"));
    }

    #[test]
    fn idle_with_text_enables_send() {
        let html = render(|| form("hello", false));
        assert!(!html.contains("disabled"));
        assert!(html.contains("Chat with Gemini Pro"));
    }
}
