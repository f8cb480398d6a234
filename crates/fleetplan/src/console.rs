//! Colorful console output for planner events.
//!
//! Provides a `tracing` layer that formats the pipeline's structured events
//! (catalog loading, model build, solve, decode) as colored lines.

use std::io::{self, Write};
use std::sync::OnceLock;

use num_format::{Locale, ToFormattedString};
use owo_colors::OwoColorize;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

static INIT: OnceLock<()> = OnceLock::new();

/// Installs the console layer as the global subscriber.
///
/// Safe to call multiple times; only the first call has effect. `RUST_LOG`
/// directives are honored, with `fleetplan*=info` added by default.
pub fn init() {
    INIT.get_or_init(|| {
        let mut filter = EnvFilter::from_default_env();
        for directive in [
            "fleetplan_core=info",
            "fleetplan_model=info",
            "fleetplan_solver=info",
        ] {
            if let Ok(directive) = directive.parse() {
                filter = filter.add_directive(directive);
            }
        }

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(PlannerConsoleLayer)
            .try_init();
    });
}

/// A tracing layer that formats planner events with colors.
pub struct PlannerConsoleLayer;

impl<S: Subscriber> Layer<S> for PlannerConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if !metadata.target().starts_with("fleetplan") {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let output = format_event(*metadata.level(), &visitor);
        if !output.is_empty() {
            let _ = writeln!(io::stdout(), "{output}");
        }
    }
}

#[derive(Debug, Default)]
struct EventVisitor {
    event: Option<String>,
    text: Vec<(&'static str, String)>,
    counts: Vec<(&'static str, u64)>,
    numbers: Vec<(&'static str, f64)>,
}

impl EventVisitor {
    fn text(&self, name: &str) -> Option<&str> {
        self.text
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    fn count(&self, name: &str) -> u64 {
        self.counts
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| *v)
            .unwrap_or(0)
    }

    fn number(&self, name: &str) -> Option<f64> {
        self.numbers
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| *v)
    }
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let s = format!("{value:?}");
        self.record_str(field, s.trim_matches('"'));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "event" {
            self.event = Some(value.to_string());
        } else {
            self.text.push((field.name(), value.to_string()));
        }
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.counts.push((field.name(), value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.counts.push((field.name(), value.max(0) as u64));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.numbers.push((field.name(), value));
    }
}

fn format_event(level: Level, v: &EventVisitor) -> String {
    let Some(event) = v.event.as_deref() else {
        return String::new();
    };

    let body = match event {
        "catalog_loaded" => format!(
            "catalog loaded: {} flights, {} aircraft, {} crew over {} slots",
            count(v, "flight_count"),
            count(v, "aircraft_count"),
            count(v, "crew_count"),
            count(v, "slot_count"),
        ),
        "model_built" => format!(
            "model built: {} variables, {} constraints, {} unschedulable flights in {}",
            count(v, "variable_count"),
            count(v, "constraint_count"),
            count(v, "infeasible_flights"),
            format_duration_ms(v.count("duration_ms")).yellow(),
        ),
        "solve_submitted" => format!(
            "submitted to {} ({} variables, {} constraints)",
            v.text("backend").unwrap_or("backend").white().bold(),
            count(v, "variable_count"),
            count(v, "constraint_count"),
        ),
        "solve_finished" => format!(
            "solve finished: {} in {}",
            format_status(v.text("status").unwrap_or("UNKNOWN")),
            format_duration_ms(v.count("duration_ms")).yellow(),
        ),
        "plan_decoded" => format!(
            "plan: {} flown, {} cancelled, total penalty {}",
            count(v, "flown"),
            count(v, "cancelled"),
            format_penalty(v.number("total_penalty").unwrap_or(0.0)),
        ),
        "flight_infeasible" => format!(
            "flight {} has no eligible assignment (last rule: {})",
            v.text("flight").unwrap_or("?").white().bold(),
            v.text("exhausted_by").unwrap_or("none"),
        ),
        "decoding_inconsistency" => format!(
            "flight {} could not be decoded: {}",
            v.text("flight").unwrap_or("?").white().bold(),
            v.text("detail").unwrap_or(""),
        ),
        "reporting_mismatch" => format!(
            "solver objective {} differs from realized penalty {}",
            format_penalty(v.number("reported").unwrap_or(0.0)),
            format_penalty(v.number("realized").unwrap_or(0.0)),
        ),
        "replanned" => format!(
            "re-planned after {} disruptions: {} changes",
            count(v, "disruptions"),
            count(v, "changes"),
        ),
        _ => return String::new(),
    };

    format!(
        "{} {} {} {}",
        timestamp().bright_black(),
        format_level(level),
        "[fleetplan]".bright_cyan(),
        body
    )
}

fn count(v: &EventVisitor, name: &str) -> String {
    v.count(name)
        .to_formatted_string(&Locale::en)
        .bright_yellow()
        .to_string()
}

fn format_level(level: Level) -> String {
    match level {
        Level::ERROR => "ERROR".bright_red().to_string(),
        Level::WARN => " WARN".yellow().to_string(),
        Level::INFO => " INFO".bright_green().to_string(),
        _ => "DEBUG".bright_black().to_string(),
    }
}

fn format_status(status: &str) -> String {
    match status {
        "OPTIMAL" => status.bright_green().bold().to_string(),
        "FEASIBLE_SUBOPTIMAL" => status.green().to_string(),
        "TIME_LIMIT_NO_SOLUTION" => status.yellow().to_string(),
        _ => status.bright_red().bold().to_string(),
    }
}

fn format_penalty(value: f64) -> String {
    let whole = value.trunc() as u64;
    let cents = ((value.fract() * 100.0).round() as u64).min(99);
    let text = format!("{}.{:02}", whole.to_formatted_string(&Locale::en), cents);
    if value > 0.0 {
        text.bright_magenta().to_string()
    } else {
        text.bright_green().to_string()
    }
}

fn timestamp() -> String {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| {
            let secs = d.as_secs() % 100000;
            let millis = d.subsec_millis();
            format!("{:5}.{:03}", secs, millis)
        })
        .unwrap_or_else(|_| "    0.000".to_string())
}

fn format_duration_ms(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.2}s", ms as f64 / 1000.0)
    } else {
        let mins = ms / 60_000;
        let secs = (ms % 60_000) / 1000;
        format!("{}m {}s", mins, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration_ms(250), "250ms");
        assert_eq!(format_duration_ms(1500), "1.50s");
        assert_eq!(format_duration_ms(125_000), "2m 5s");
    }

    #[test]
    fn test_unknown_event_is_silent() {
        let visitor = EventVisitor {
            event: Some("constraint_family".to_string()),
            ..EventVisitor::default()
        };
        assert!(format_event(Level::DEBUG, &visitor).is_empty());
        assert!(format_event(Level::INFO, &EventVisitor::default()).is_empty());
    }

    #[test]
    fn test_solve_finished_line() {
        let visitor = EventVisitor {
            event: Some("solve_finished".to_string()),
            text: vec![("status", "OPTIMAL".to_string())],
            counts: vec![("duration_ms", 42)],
            numbers: Vec::new(),
        };
        let line = format_event(Level::INFO, &visitor);
        assert!(line.contains("solve finished"));
        assert!(line.contains("OPTIMAL"));
        assert!(line.contains("42ms"));
    }
}
