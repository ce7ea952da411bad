use log::LevelFilter;

const LOG_PREFIX: &str = "[webexp-music-player]";

/// `logLevel` from the page config. Storefronts stay quiet unless the
/// merchant asks otherwise.
pub fn parse_level(raw: Option<&str>) -> LevelFilter {
    match raw.map(|value| value.trim().to_ascii_lowercase()).as_deref() {
        Some("off" | "none") => LevelFilter::Off,
        Some("error") => LevelFilter::Error,
        Some("info") => LevelFilter::Info,
        Some("debug") => LevelFilter::Debug,
        Some("trace") => LevelFilter::Trace,
        _ => LevelFilter::Warn,
    }
}

pub fn format_record(target: &str, message: &std::fmt::Arguments<'_>) -> String {
    format!("{LOG_PREFIX} {target}: {message}")
}

#[cfg(target_arch = "wasm32")]
pub use browser::init_logging;

#[cfg(target_arch = "wasm32")]
mod browser {
    use super::{format_record, parse_level};
    use log::{Level, Log, Metadata, Record};
    use wasm_bindgen::JsValue;
    use web_sys::console;

    struct ConsoleLogger;

    impl Log for ConsoleLogger {
        fn enabled(&self, metadata: &Metadata) -> bool {
            metadata.level() <= log::max_level()
        }

        fn log(&self, record: &Record) {
            if !self.enabled(record.metadata()) {
                return;
            }
            let line = JsValue::from_str(&format_record(record.target(), record.args()));
            match record.level() {
                Level::Error => console::error_1(&line),
                Level::Warn => console::warn_1(&line),
                Level::Info => console::info_1(&line),
                Level::Debug | Level::Trace => console::debug_1(&line),
            }
        }

        fn flush(&self) {}
    }

    static LOGGER: ConsoleLogger = ConsoleLogger;

    /// Route `log` records to the browser console. A second call only
    /// adjusts the level.
    pub fn init_logging(level: Option<&str>) {
        console_error_panic_hook::set_once();
        let _ = log::set_logger(&LOGGER);
        log::set_max_level(parse_level(level));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_defaults_to_warn() {
        assert_eq!(parse_level(None), LevelFilter::Warn);
        assert_eq!(parse_level(Some("verbose")), LevelFilter::Warn);
        assert_eq!(parse_level(Some(" DEBUG ")), LevelFilter::Debug);
        assert_eq!(parse_level(Some("off")), LevelFilter::Off);
    }

    #[test]
    fn records_carry_the_prefix() {
        let line = format_record("player", &format_args!("track {} loaded", 2));
        assert_eq!(line, "[webexp-music-player] player: track 2 loaded");
    }
}
