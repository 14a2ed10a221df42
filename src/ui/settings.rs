// Copyright © 2025 Nipun Kumar

use dioxus::{logger::tracing::warn, prelude::*};

use crate::{
    Route,
    app_settings::{
        AppSettings, ChatSettings, EndpointSettings, GeneralSettings, HarmBlockThreshold,
        HarmCategory, SafetySettings, StreamProtocol,
    },
    storage::{Storage, get_storage},
    ui::box_select::BoxSelect,
};

#[allow(non_snake_case)]
#[component]
pub fn Settings() -> Element {
    let mut settings_ctx = use_context::<Signal<Option<AppSettings>>>();
    let current = settings_ctx().unwrap_or_else(AppSettings::with_defaults);

    let save_settings = move |s: AppSettings| async move {
        let storage = match get_storage().await {
            Ok(s) => Some(s),
            Err(e) => {
                warn!("Could not get storage: {e:?}");
                None
            }
        };
        if let Some(st) = storage
            && let Err(e) = st.save_settings(&s).await
        {
            warn!("Could not save settings: {e:?}");
        }
        settings_ctx.set(Some(s));
    };
    let update_chat = move |f: Box<dyn FnOnce(&mut ChatSettings)>| async move {
        let mut s = settings_ctx().unwrap_or_else(AppSettings::with_defaults);
        f(&mut s.chat);
        save_settings(s).await;
    };

    let chat = current.chat;

    rsx! {
        div {
            style: "padding: 1rem; height: 100%; overflow-y: auto;",

            div { style: "display: flex; justify-content: space-between; align-items: center; margin-bottom: 1rem;",
                h3 { style: "margin: 0;", "Settings" }
                Link { to: Route::Home {}, "Back to chat" }
            }

            hr { style: "margin-bottom: 1rem;" }

            GeneralSettingsForm {
                general: chat.general,
                onchange: move |g: GeneralSettings| async move {
                    update_chat(Box::new(move |c: &mut ChatSettings| c.general = g)).await;
                },
            }

            hr { style: "margin: 2rem 0 1rem 0;" }

            SafetySettingsForm {
                safety: chat.safety,
                onchange: move |s: SafetySettings| async move {
                    update_chat(Box::new(move |c: &mut ChatSettings| c.safety = s)).await;
                },
            }

            hr { style: "margin: 2rem 0 1rem 0;" }

            EndpointSettingsForm {
                endpoint: chat.endpoint,
                onchange: move |e: EndpointSettings| async move {
                    update_chat(Box::new(move |c: &mut ChatSettings| c.endpoint = e)).await;
                },
            }
        }
    }
}

#[component]
fn GeneralSettingsForm(general: GeneralSettings, onchange: Callback<GeneralSettings, ()>) -> Element {
    // Unparseable input leaves the stored value alone.
    let base = general.clone();
    let field = move |apply: fn(&mut GeneralSettings, f64)| {
        let general = base.clone();
        move |e: Event<FormData>| {
            let raw = e.value();
            let Ok(v) = raw.trim().parse::<f64>() else {
                warn!("Ignoring non-numeric setting {raw:?}");
                return;
            };
            let mut g = general.clone();
            apply(&mut g, v);
            onchange(g.normalized());
        }
    };

    let GeneralSettings {
        temperature,
        max_output_tokens,
        top_p,
        top_k,
    } = general;
    let max_tokens = GeneralSettings::MAX_OUTPUT_TOKENS;

    rsx! {
        h4 { style: "margin: 0 0 1rem 0;", "Generation" }
        div { class: "settings-grid",
            label { "Temperature" }
            input {
                r#type: "number",
                step: "0.1",
                min: "0",
                max: "1",
                value: "{temperature}",
                onchange: field(|g, v| g.temperature = v as f32),
            }
            label { "Max output tokens" }
            input {
                r#type: "number",
                step: "1",
                min: "1",
                max: "{max_tokens}",
                value: "{max_output_tokens}",
                onchange: field(|g, v| g.max_output_tokens = v.max(0.0) as u32),
            }
            label { "Top P" }
            input {
                r#type: "number",
                step: "0.05",
                min: "0",
                max: "1",
                value: "{top_p}",
                onchange: field(|g, v| g.top_p = v as f32),
            }
            label { "Top K" }
            input {
                r#type: "number",
                step: "1",
                min: "1",
                value: "{top_k}",
                onchange: field(|g, v| g.top_k = v.max(0.0) as u32),
            }
        }
    }
}

#[component]
fn SafetySettingsForm(safety: SafetySettings, onchange: Callback<SafetySettings, ()>) -> Element {
    let options: Vec<String> = HarmBlockThreshold::ALL
        .iter()
        .map(|t| t.label().to_string())
        .collect();
    rsx! {
        h4 { style: "margin: 0 0 1rem 0;", "Safety" }
        for (category, name, current) in HarmCategory::ALL.map(|c| (c, c.label(), safety.get(c).label())) {
            div { key: "{name}", style: "margin-bottom: 1rem;",
                h5 { style: "margin: 0 0 0.5rem 0;", "{name}" }
                BoxSelect {
                    value: Some(current.to_string()),
                    options: options.clone(),
                    on_select: {
                        let safety = safety.clone();
                        move |label: String| {
                            if let Some(t) = HarmBlockThreshold::from_label(&label) {
                                onchange(safety.with(category, t));
                            }
                        }
                    },
                }
            }
        }
    }
}

#[component]
fn EndpointSettingsForm(endpoint: EndpointSettings, onchange: Callback<EndpointSettings, ()>) -> Element {
    let handle_base_change = {
        let endpoint = endpoint.clone();
        move |e: Event<FormData>| {
            onchange(EndpointSettings {
                api_base: e.value(),
                ..endpoint.clone()
            });
        }
    };
    let handle_path_change = {
        let endpoint = endpoint.clone();
        move |e: Event<FormData>| {
            onchange(EndpointSettings {
                api_path: e.value(),
                ..endpoint.clone()
            });
        }
    };
    let handle_protocol_change = {
        let endpoint = endpoint.clone();
        move |label: String| {
            if let Some(protocol) = StreamProtocol::parse(&label) {
                onchange(EndpointSettings {
                    protocol,
                    ..endpoint.clone()
                });
            }
        }
    };

    let api_base = endpoint.api_base.clone();
    let api_path = endpoint.api_path.clone();

    rsx! {
        h4 { style: "margin: 0 0 1rem 0;", "Endpoint" }
        div { class: "settings-grid",
            label { "Base URL" }
            input { value: "{api_base}", onchange: handle_base_change }
            label { "Path" }
            input { value: "{api_path}", onchange: handle_path_change }
        }
        h5 { style: "margin: 1rem 0 0.5rem 0;", "Stream protocol" }
        BoxSelect {
            value: Some(endpoint.protocol.label().to_string()),
            options: StreamProtocol::ALL.iter().map(|p| p.label().to_string()).collect::<Vec<_>>(),
            on_select: handle_protocol_change,
        }
    }
}
