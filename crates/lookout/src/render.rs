use comfy_table::{Cell, Color, Table};
use lookout_core::config::OutputFormat;
use lookout_core::timeline::{
    ActivityItem, ActivityKind, CompactionStatus, LifecycleStatus, ReducerStats, RunState,
    TimelineSnapshot, ToolStatus,
};
use serde::Serialize;
use std::io::Write;

use crate::error::Error;

const SUMMARY_WIDTH: usize = 60;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckReport<'a> {
    frames: u64,
    stats: &'a ReducerStats,
}

pub fn write_timeline<W: Write>(
    out: &mut W,
    snapshot: &TimelineSnapshot,
    format: OutputFormat,
) -> Result<(), Error> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, snapshot)?;
            writeln!(out)?;
        }
        OutputFormat::Table => {
            if snapshot.items.is_empty() {
                writeln!(out, "No timeline items.")?;
            } else {
                writeln!(out, "{}", timeline_table(&snapshot.items))?;
            }
            writeln!(out, "{}", run_state_line(&snapshot.run_state))?;
        }
    }
    Ok(())
}

pub fn write_stats<W: Write>(
    out: &mut W,
    frames: u64,
    stats: &ReducerStats,
    format: OutputFormat,
) -> Result<(), Error> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &CheckReport { frames, stats })?;
            writeln!(out)?;
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table.set_header(vec![
                Cell::new("Outcome").fg(Color::Green),
                Cell::new("Frames").fg(Color::Green),
            ]);
            let rows = [
                ("accepted", stats.accepted),
                ("malformed_event", stats.malformed),
                ("unrecognized_stream", stats.unrecognized_stream),
                ("unknown_phase", stats.unknown_phase),
                ("orphaned_tool_event", stats.orphaned_tool_event),
            ];
            for (label, count) in rows {
                table.add_row(vec![Cell::new(label), Cell::new(count)]);
            }
            writeln!(out, "{table}")?;
            writeln!(out, "{frames} frames, {} rejected", stats.rejected())?;
        }
    }
    Ok(())
}

fn timeline_table(items: &[ActivityItem]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("#").fg(Color::Green),
        Cell::new("Kind").fg(Color::Green),
        Cell::new("Run").fg(Color::Green),
        Cell::new("Status").fg(Color::Green),
        Cell::new("Duration").fg(Color::Green),
        Cell::new("Summary").fg(Color::Green),
    ]);

    for (position, item) in items.iter().enumerate() {
        let (status, color) = status_of(item);
        let duration = item
            .duration()
            .map(|d| format!("{}ms", d.as_millis()))
            .unwrap_or_default();
        table.add_row(vec![
            Cell::new(position),
            Cell::new(item.tag()),
            Cell::new(&item.run_id),
            Cell::new(status).fg(color),
            Cell::new(duration),
            Cell::new(truncate(&item.summary(), SUMMARY_WIDTH)),
        ]);
    }
    table
}

fn status_of(item: &ActivityItem) -> (&'static str, Color) {
    match &item.kind {
        ActivityKind::Lifecycle { phase } => match phase {
            LifecycleStatus::Started => ("started", Color::Cyan),
            LifecycleStatus::Ended => ("ended", Color::Reset),
            LifecycleStatus::Error { .. } => ("error", Color::Red),
        },
        ActivityKind::Thinking(text) | ActivityKind::Assistant(text) => {
            if text.is_streaming {
                ("streaming", Color::Yellow)
            } else {
                ("done", Color::Reset)
            }
        }
        ActivityKind::ToolCall(call) => match call.status {
            ToolStatus::Running => ("running", Color::Yellow),
            ToolStatus::Completed => ("completed", Color::Green),
            ToolStatus::Failed => ("failed", Color::Red),
        },
        ActivityKind::Compaction { phase } => match phase {
            CompactionStatus::Started => ("started", Color::Cyan),
            CompactionStatus::Ended => ("ended", Color::Reset),
            CompactionStatus::WillRetry => ("will retry", Color::Yellow),
        },
    }
}

fn run_state_line(state: &RunState) -> String {
    match (&state.active_run_id, state.is_run_active) {
        (Some(run_id), true) => format!("Run {run_id} is active."),
        (Some(run_id), false) => format!("Run {run_id} is not active."),
        (None, _) => "No run has started.".to_string(),
    }
}

/// First line of `text`, cut to `max` characters.
fn truncate(text: &str, max: usize) -> String {
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() <= max && line.len() == text.len() {
        return line.to_string();
    }
    let mut short: String = line.chars().take(max.saturating_sub(1)).collect();
    short.push('…');
    short
}
