use dioxus::logger::tracing::Level;

fn main() {
    if let Err(e) = dioxus::logger::init(Level::INFO) {
        eprintln!("failed to start logger: {e}");
    }
    dioxus::launch(gemini_chat::App);
}
