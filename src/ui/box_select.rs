use dioxus::prelude::*;

#[component]
pub fn BoxSelect(
    value: Option<String>,
    options: Vec<String>,
    on_select: Callback<String, ()>,
) -> Element {
    rsx! {
        div { class: "box-select",
            {
                options
                    .into_iter()
                    .map(move |o| {
                        let selected = value.as_deref() == Some(o.as_str());
                        let selected_class = if selected { "selected" } else { "" };
                        rsx! {
                            div {
                                key: "{o}",
                                class: "option {selected_class}",
                                onclick: move |_e| { on_select(o.clone()) },
                                "{o}"
                            }
                        }
                    })
            }
        }
    }
}
