//! Logging backend setup
//!
//! The crate logs through the `log` facade. Applications embedding the
//! provider may call [`init_logging`] (or [`init_from_config`]) once to install
//! a `flexi_logger` backend with one of the provider's line formats:
//!
//! - `text`: `YYYY-MM-DD HH:mm:ss.fff INF message (queue/receiver.rs:42)`
//! - `ext`: like `text`, target always shown, optionally colored
//! - `json`: one compact JSON object per line

use crate::core::config::LoggingConfig;

static LOGGER_HANDLE: std::sync::OnceLock<std::sync::Mutex<flexi_logger::LoggerHandle>> =
    std::sync::OnceLock::new();

/// Install the flexi_logger backend
///
/// `log_level` accepts any flexi_logger spec (`"info"`, `"courier=debug"`).
/// Fails if a logger has already been installed in this process.
pub fn init_logging(
    log_level: Option<&str>,
    log_format: Option<&str>,
    log_file: Option<&str>,
    color_enabled: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    use flexi_logger::{FileSpec, Logger};

    let level_str = log_level.unwrap_or("info");
    let format_type = log_format.unwrap_or("text");

    let mut logger = Logger::try_with_str(level_str)?;

    logger = match format_type {
        "json" => logger.format(json_format),
        "ext" if color_enabled => logger.format(extended_color_format),
        "ext" => logger.format(extended_format),
        _ if color_enabled => logger.format(simple_color_format),
        _ => logger.format(simple_format),
    };

    if let Some(file_path) = log_file {
        let file_spec = FileSpec::try_from(std::path::Path::new(file_path))?;
        logger = logger.log_to_file(file_spec);
    }

    let handle = logger.start()?;
    let _ = LOGGER_HANDLE.set(std::sync::Mutex::new(handle));

    Ok(())
}

/// Install the backend from the `[logging]` table of a provider configuration
pub fn init_from_config(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    init_logging(
        Some(&config.level),
        Some(&config.format),
        config.file.as_deref(),
        config.color,
    )
}

/// Change the active log level at runtime
///
/// Only the level can change after initialisation; format and output file
/// are fixed by flexi_logger once the logger has started.
pub fn set_log_level(log_level: &str) -> Result<(), Box<dyn std::error::Error>> {
    let handle_mutex = LOGGER_HANDLE
        .get()
        .ok_or("Logger handle not initialised. Call init_logging first.")?;
    let mut handle = handle_mutex
        .lock()
        .map_err(|_| "Could not acquire logger handle lock")?;
    handle.parse_and_push_temp_spec(log_level)?;
    Ok(())
}

fn level_abbr(level: log::Level) -> &'static str {
    match level {
        log::Level::Error => "ERR",
        log::Level::Warn => "WRN",
        log::Level::Info => "INF",
        log::Level::Debug => "DBG",
        log::Level::Trace => "TRC",
    }
}

fn level_colored(level: log::Level) -> colored::ColoredString {
    use colored::*;

    match level {
        log::Level::Error => "ERR".red().bold(),
        log::Level::Warn => "WRN".yellow(),
        log::Level::Info => "INF".green(),
        log::Level::Debug => "DBG".blue(),
        log::Level::Trace => "TRC".magenta(),
    }
}

fn simple_format(
    w: &mut dyn std::io::Write,
    now: &mut flexi_logger::DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    let target_formatted = format_target_as_path(record.target(), record.line());

    write!(
        w,
        "{} {} {} ({})",
        now.format("%Y-%m-%d %H:%M:%S%.3f"),
        level_abbr(record.level()),
        record.args(),
        target_formatted
    )
}

fn simple_color_format(
    w: &mut dyn std::io::Write,
    now: &mut flexi_logger::DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    use colored::*;

    write!(
        w,
        "{} {} {}",
        now.format("%Y-%m-%d %H:%M:%S%.3f").to_string().dimmed(),
        level_colored(record.level()),
        record.args()
    )
}

fn extended_format(
    w: &mut dyn std::io::Write,
    now: &mut flexi_logger::DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    let target_formatted = format_target_as_path(record.target(), record.line());

    write!(
        w,
        "{} {} [{}] {} ({})",
        now.format("%Y-%m-%d %H:%M:%S%.3f"),
        level_abbr(record.level()),
        std::thread::current().name().unwrap_or("-"),
        record.args(),
        target_formatted
    )
}

fn extended_color_format(
    w: &mut dyn std::io::Write,
    now: &mut flexi_logger::DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    use colored::*;

    let target_formatted = format_target_as_path(record.target(), record.line());

    write!(
        w,
        "{} {} [{}] {} ({})",
        now.format("%Y-%m-%d %H:%M:%S%.3f").to_string().dimmed(),
        level_colored(record.level()),
        std::thread::current().name().unwrap_or("-"),
        record.args(),
        target_formatted.dimmed()
    )
}

fn json_format(
    w: &mut dyn std::io::Write,
    now: &mut flexi_logger::DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    use serde_json::{json, to_string};

    let json_obj = json!({
        "timestamp": now.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
        "level": level_abbr(record.level()),
        "message": record.args().to_string(),
        "target": format_target_as_path(record.target(), record.line())
    });

    match to_string(&json_obj) {
        Ok(json_string) => w.write_all(json_string.as_bytes()),
        Err(_) => w.write_all(b"{\"error\":\"Failed to serialize log message\"}"),
    }
}

// courier::queue::receiver -> queue/receiver.rs:42
fn format_target_as_path(target: &str, line: Option<u32>) -> String {
    let path_like = if let Some(without_prefix) = target.strip_prefix("courier::") {
        without_prefix.replace("::", "/") + ".rs"
    } else {
        target.replace("::", "/")
    };

    match line {
        Some(line_num) => format!("{}:{}", path_like, line_num),
        None => path_like,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flexi_logger::DeferredNow;
    use serial_test::serial;

    fn render(
        format: fn(
            &mut dyn std::io::Write,
            &mut DeferredNow,
            &log::Record,
        ) -> Result<(), std::io::Error>,
        target: &str,
    ) -> String {
        let mut buffer = Vec::new();
        let mut now = DeferredNow::new();
        let record = log::Record::builder()
            .level(log::Level::Info)
            .target(target)
            .line(Some(42))
            .args(format_args!("Delivered message"))
            .build();

        format(&mut buffer, &mut now, &record).expect("format should succeed");
        String::from_utf8(buffer).expect("output should be valid UTF-8")
    }

    #[test]
    fn test_target_is_rendered_as_path() {
        assert_eq!(
            format_target_as_path("courier::queue::receiver", Some(42)),
            "queue/receiver.rs:42"
        );
        assert_eq!(format_target_as_path("tokio::runtime", None), "tokio/runtime");
    }

    #[test]
    fn test_simple_format_layout() {
        let output = render(simple_format, "courier::topic");
        assert!(
            output.contains("INF Delivered message (topic.rs:42)"),
            "unexpected layout: {}",
            output
        );
    }

    #[test]
    fn test_extended_format_contains_thread_and_target() {
        let output = render(extended_format, "courier::delivery::dispatcher");
        assert!(output.contains("INF ["));
        assert!(output.contains("(delivery/dispatcher.rs:42)"));
    }

    #[test]
    fn test_json_format_is_single_object() {
        let output = render(json_format, "courier::correlation");
        let value: serde_json::Value =
            serde_json::from_str(&output).expect("json format should emit valid JSON");
        assert_eq!(value["level"], "INF");
        assert_eq!(value["message"], "Delivered message");
        assert_eq!(value["target"], "correlation.rs:42");
        assert!(!output.contains('\n'));
    }

    #[test]
    #[serial]
    fn test_set_log_level_requires_initialised_logger() {
        if LOGGER_HANDLE.get().is_none() {
            assert!(set_log_level("debug").is_err());
        }
    }
}
