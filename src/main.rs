//! Shipment Tracker entry point
//!
//! On the web this wires the widget into the page. Natively it replays the
//! tracking script headlessly against a simulated 60 Hz clock and logs every
//! visible change.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("Shipment tracker starting...");

    if let Err(e) = shipment_tracker::platform::web::run() {
        log::error!("init error: {:?}", e);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    use shipment_tracker::consts::ACCEPTED_TOKEN;
    use shipment_tracker::{Settings, TrackerApp};

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Shipment tracker (native) starting...");

    let mut args = std::env::args().skip(1);
    let token = args.next().unwrap_or_else(|| ACCEPTED_TOKEN.to_string());
    let settings = match args.next() {
        Some(path) => Settings::load_file(std::path::Path::new(&path))?,
        None => Settings::default(),
    };

    let mut app = TrackerApp::new(settings, 0x5eed);
    let normalized = app.input(&token).to_string();
    log::info!("Field: {:?}", normalized);

    if let Err(e) = app.validate(0.0) {
        log::warn!("{}", e);
        println!("✗ {}", e);
        return Ok(());
    }
    println!("✔ Token Valid - Ready to Track");
    app.track(0.0);

    const FRAME_MS: f64 = 1000.0 / 60.0;
    let mut last_status = String::new();
    let mut last_toast = None;
    let mut now = 0.0;
    for frame in 0..(12 * 60) {
        now += FRAME_MS;
        let angle = frame as f32 * 0.05;
        app.pointer_move(400.0 + 120.0 * angle.cos(), 300.0 + 120.0 * angle.sin(), now);
        app.frame(now);

        let state = app.sequencer().state();
        if state.status_text != last_status {
            println!(
                "[{:>6.0}ms] {:>3}%  {}  ({})",
                now, state.progress_percent, state.status_text, state.delivery_text
            );
            last_status = state.status_text.clone();
        }
        let toast = app.toast().current().map(|t| t.id);
        if toast != last_toast {
            match app.toast().current() {
                Some(t) => println!("[{:>6.0}ms] toast: {}", now, t.message),
                None => println!("[{:>6.0}ms] toast dismissed", now),
            }
            last_toast = toast;
        }
    }

    let particles: Vec<_> = app.emitter().particles().cloned().collect();
    log::info!(
        "{} particles live at the end: {}",
        particles.len(),
        serde_json::to_string(&particles)?
    );
    app.shutdown();
    Ok(())
}
