use wasm_bindgen::prelude::*;
mod api;
mod error;
mod interop;

pub use api::{baked_svg, distort, distort_res, filter_markup};

/// Editing session handed to the refine page.
#[wasm_bindgen]
pub struct Session {
    pub(crate) inner: inkwarp::EditSession,
}

/// A parsed source document with its last rendering memoised.
#[wasm_bindgen]
pub struct Preview {
    pub(crate) inner: inkwarp::Distorter,
    pub(crate) error: Option<String>,
}

static LOGGER: WasmLog = WasmLog;

#[wasm_bindgen(start)]
pub fn init() {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(log::LevelFilter::Info);
    }
}

#[wasm_bindgen]
pub fn set_panic_hook() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

#[wasm_bindgen]
pub fn set_log_level(level: &str) {
    let filter = match level {
        "trace" => log::LevelFilter::Trace,
        "debug" => log::LevelFilter::Debug,
        "warn" => log::LevelFilter::Warn,
        "error" => log::LevelFilter::Error,
        "off" => log::LevelFilter::Off,
        _ => log::LevelFilter::Info,
    };
    log::set_max_level(filter);
}

fn console_write(write: fn(&JsValue, &JsValue), msg: &str, format: &str) {
    write(&JsValue::from_str(msg), &JsValue::from_str(format))
}

/// `log` backend writing levelled, coloured lines to the browser console.
pub struct WasmLog;

impl log::Log for WasmLog {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let (write, name, color): (fn(&JsValue, &JsValue), &str, &str) = match record.level() {
            log::Level::Trace => (web_sys::console::log_2, "trace", "color:plum"),
            log::Level::Debug => (web_sys::console::log_2, "debug", "color:cyan"),
            log::Level::Info => (web_sys::console::info_2, "info", "color:mediumseagreen"),
            log::Level::Warn => (web_sys::console::warn_2, "warn", "color:goldenrod"),
            log::Level::Error => (web_sys::console::error_2, "error", "color:red"),
        };
        console_write(write, &format!("%c{}\t{}", name, record.args()), color)
    }

    fn flush(&self) {}
}
