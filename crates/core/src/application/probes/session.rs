// Login history probe: `last` output with a normalization post-pass

use std::sync::Arc;

use async_trait::async_trait;

use super::run_ok;
use crate::application::args::ProbeArgs;
use crate::application::probe::Probe;
use crate::domain::{ColumnSchema, HeaderSkip, ProbeResult, TableRow, TableSpec};
use crate::error::Result;
use crate::port::command_runner::CommandRunner;

/// Raw `last` row: 10 positional fields, no header, records end at the
/// blank line before the wtmp footer.
const LOGINS_RAW: TableSpec = TableSpec {
    schema: ColumnSchema::new(&[
        "user",
        "terminal",
        "display",
        "day",
        "month",
        "day_date",
        "day_time",
        "dash",
        "disconnected",
        "duration",
    ]),
    skip: HeaderSkip::Lines(0),
    stop_at_blank: true,
};

/// Merge the four date-component fields, normalize the "reboot" pseudo-row
/// and blank out the "still logged in" / "no logout" duration markers.
fn normalize(raw: &TableRow) -> TableRow {
    let field = |name: &str| raw.get(name).unwrap_or("").to_string();

    let mut row = TableRow::new();
    if raw.get("user") == Some("reboot") {
        row.push("user", "Reboot");
        row.push("terminal", "");
        row.push("display", "");
        row.push("date", "");
        row.push("disconnected", "");
        row.push("duration", "");
        return row;
    }

    let date = [
        field("day"),
        field("month"),
        field("day_date"),
        field("day_time"),
    ]
    .join(" ")
    .trim()
    .to_string();

    let still_logged_in = raw.get("dash") == Some("still");
    let mut disconnected = field("disconnected");
    let mut duration = field("duration")
        .trim_matches(|c| c == '(' || c == ')')
        .to_string();
    if still_logged_in || disconnected == "-" {
        disconnected = String::new();
    }
    if still_logged_in || duration == "no" {
        duration = String::new();
    }

    row.push("user", field("user"));
    row.push("terminal", field("terminal"));
    row.push("display", field("display"));
    row.push("date", date);
    row.push("disconnected", disconnected);
    row.push("duration", duration);
    row
}

pub struct LoginsProbe {
    runner: Arc<dyn CommandRunner>,
}

impl LoginsProbe {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl Probe for LoginsProbe {
    async fn run(&self, args: &ProbeArgs) -> Result<ProbeResult> {
        let output = run_ok(self.runner.as_ref(), "last", &[]).await?;
        if args.bool_or("parse", true) {
            let rows = LOGINS_RAW
                .parse(&output.stdout)
                .iter()
                .map(normalize)
                .collect();
            Ok(ProbeResult::Table(rows))
        } else {
            Ok(ProbeResult::text(output.trimmed_stdout()))
        }
    }
}
