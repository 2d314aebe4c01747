//! Logging utilities with colored module prefixes.
//!
//! # Example
//!
//! ```ignore
//! log!("compile"; "{} pages", count);
//! ```

use colored::{ColoredString, Colorize};

/// Log a message with a colored module prefix.
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Color the `[module]` prefix by module name.
fn prefix(module: &str) -> ColoredString {
    let tag = format!("[{module}]");
    match module {
        "error" => tag.red().bold(),
        "warn" => tag.yellow().bold(),
        "build" | "compile" => tag.green(),
        "serve" => tag.cyan(),
        "static" => tag.magenta(),
        _ => tag.blue(),
    }
}

pub fn log(module: &str, message: &str) {
    eprintln!("{} {message}", prefix(module));
}
