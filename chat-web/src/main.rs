//! Chat App
//!
//! Browser entry point. Build for `wasm32-unknown-unknown` and serve with
//! `index.html`.

#[cfg(target_arch = "wasm32")]
fn main() {
    // Set up panic hook for better error messages in WASM
    console_error_panic_hook::set_once();

    if let Err(e) = chat_web::start() {
        web_sys::console::error_1(&format!("Chat App failed to start: {}", e).into());
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    eprintln!("chat-web runs in the browser; build it for wasm32-unknown-unknown");
}
