use dioxus::prelude::*;

pub mod app_settings;
pub mod llm;
mod md2rsx;
pub mod session;
pub mod storage;
mod ui;

use app_settings::AppSettings;
use ui::{chat_container::ChatContainer, settings::Settings};

const FAVICON: Asset = asset!("/assets/favicon.svg");
const MAIN_CSS: Asset = asset!("/assets/main.css");

#[component]
pub fn App() -> Element {
    let mut settings: Signal<Option<AppSettings>> = use_context_provider(|| Signal::new(None));
    let init = use_resource(move || async move {
        settings.set(Some(storage::load_or_default().await));
        anyhow::Ok(())
    });
    rsx! {
        document::Link { rel: "icon", href: FAVICON }
        document::Link { rel: "stylesheet", href: MAIN_CSS }
        if init.read().is_none() {
            "Loading..."
        } else {
            Router::<Route> {}
        }
    }
}

#[derive(Debug, Clone, Routable, PartialEq)]
#[rustfmt::skip]
enum Route {
    #[layout(Layout)]
    #[route("/")]
    Home {},
    #[route("/settings")]
    Settings { },
    #[route("/:..segments")]
    PageNotFound { segments: Vec<String> },
}

/// Shared layout component.
#[component]
fn Layout() -> Element {
    rsx! {
        nav { class: "top-nav",
            Link { to: Route::Home {}, "Chat" }
            Link { to: Route::Settings {}, "⛭ Settings" }
        }
        Outlet::<Route> {}
    }
}

/// Chat page. Settings are handed to the container explicitly.
#[component]
fn Home() -> Element {
    let settings = use_context::<Signal<Option<AppSettings>>>();
    let chat = settings()
        .unwrap_or_else(AppSettings::with_defaults)
        .chat;
    rsx! {
        ChatContainer { settings: chat }
    }
}

#[component]
fn PageNotFound(segments: Vec<String>) -> Element {
    rsx! {
        "Could not find the page you are looking for."
        Link { to: Route::Home {}, "Go To Home" }
    }
}
