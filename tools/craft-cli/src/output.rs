//! Output formatting for the CLI.

use console::style;
use craft_commerce::checkout::{FieldErrors, OrderStatus};
use craft_commerce::notify::{Notification, NotificationLevel, Notifier};
use indicatif::{ProgressBar, ProgressStyle};

/// Output handler for CLI messages.
#[derive(Clone)]
pub struct Output {
    verbose: bool,
    json: bool,
}

impl Output {
    /// Create a new output handler.
    pub fn new(verbose: bool, json: bool) -> Self {
        Self { verbose, json }
    }

    /// Print an info message.
    pub fn info(&self, msg: &str) {
        if self.json {
            return;
        }
        println!("{} {}", style("ℹ").blue(), msg);
    }

    /// Print a success message.
    pub fn success(&self, msg: &str) {
        if self.json {
            return;
        }
        println!("{} {}", style("✓").green(), msg);
    }

    /// Print a warning message.
    pub fn warn(&self, msg: &str) {
        if self.json {
            return;
        }
        eprintln!("{} {}", style("⚠").yellow(), msg);
    }

    /// Print an error message.
    pub fn error(&self, msg: &str) {
        if self.json {
            eprintln!("{}", serde_json::json!({ "error": msg }));
            return;
        }
        eprintln!("{} {}", style("✗").red(), style(msg).red());
    }

    /// Print a header/title.
    pub fn header(&self, msg: &str) {
        if self.json {
            return;
        }
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print JSON output.
    pub fn json<T: serde::Serialize>(&self, value: &T) {
        if let Ok(json) = serde_json::to_string_pretty(value) {
            println!("{}", json);
        }
    }

    /// Print a key-value pair.
    pub fn kv(&self, key: &str, value: &str) {
        if self.json {
            return;
        }
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(&self, item: &str) {
        if self.json {
            return;
        }
        println!("  {} {}", style("•").dim(), item);
    }

    /// Print a table row.
    pub fn table_row(&self, cols: &[&str], widths: &[usize]) {
        if self.json {
            return;
        }
        let formatted: Vec<String> = cols
            .iter()
            .zip(widths.iter())
            .map(|(col, width)| format!("{:width$}", col, width = width))
            .collect();
        println!("  {}", formatted.join("  "));
    }

    /// Print each field error under its label.
    pub fn field_errors(&self, errors: &FieldErrors) {
        if self.json {
            self.json(errors);
            return;
        }
        for (field, message) in errors.iter() {
            eprintln!("  {} {}: {}", style("•").red(), style(field.label()).bold(), message);
        }
    }

    /// Create a spinner for a remote call.
    pub fn spinner(&self, msg: &str) -> ProgressBar {
        if self.json {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new_spinner();
        if let Ok(spinner) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(spinner);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }

    /// Check if verbose mode is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Check if JSON mode is enabled.
    pub fn is_json(&self) -> bool {
        self.json
    }

    /// A notifier printing through this output.
    pub fn notifier(&self) -> ConsoleNotifier {
        ConsoleNotifier { json: self.json }
    }
}

/// Prints storefront notifications as they happen.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleNotifier {
    json: bool,
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        if self.json {
            tracing::debug!(level = notification.level.as_str(), text = %notification.message, "notification");
            return;
        }
        match notification.level {
            NotificationLevel::Success => println!("{} {}", style("✓").green(), notification.message),
            NotificationLevel::Info => println!("{} {}", style("ℹ").blue(), notification.message),
            NotificationLevel::Error => eprintln!("{} {}", style("✗").red(), notification.message),
        }
    }
}

/// Status badge for order states.
pub fn status_badge(status: OrderStatus) -> String {
    let name = status.display_name();
    match status {
        OrderStatus::Delivered => style(name).green().to_string(),
        OrderStatus::Pending | OrderStatus::Confirmed => style(name).yellow().to_string(),
        OrderStatus::Processing | OrderStatus::Shipped => style(name).cyan().to_string(),
        OrderStatus::Cancelled => style(name).dim().to_string(),
    }
}
