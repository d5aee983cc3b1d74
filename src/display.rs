//! Plain-text views used by the terminal front end.

use crate::book::ScheduleBook;
use crate::planner::ScheduleStatus;
use crate::schedule::Schedule;
use chrono::NaiveDateTime;

const PROGRESS_BAR_WIDTH: usize = 20;

/// Boxed table with one column per header, sized to the widest cell.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(w + 2));
        sep.push('+');
    }

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&table_row(&widths, headers.iter().copied()));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for row in rows {
        out.push_str(&table_row(&widths, row.iter().map(String::as_str)));
        out.push('\n');
    }
    out.push_str(&sep);
    out
}

fn table_row<'a>(widths: &[usize], mut cells: impl Iterator<Item = &'a str>) -> String {
    let mut line = String::from("|");
    for w in widths {
        let cell = cells.next().unwrap_or("");
        line.push(' ');
        line.push_str(cell);
        line.push_str(&" ".repeat(w.saturating_sub(cell.chars().count())));
        line.push_str(" |");
    }
    line
}

/// Periods of `schedule` in start-time order, numbered from 1.
pub fn render_periods(schedule: &Schedule) -> String {
    let periods = schedule.sorted_periods();
    if periods.is_empty() {
        return format!(
            "{}: no periods yet. Add one with 'add <HH:MM> <HH:MM> <name...>'.",
            schedule.name
        );
    }
    let rows: Vec<Vec<String>> = periods
        .iter()
        .enumerate()
        .map(|(i, p)| {
            vec![
                (i + 1).to_string(),
                p.time_range_12h(),
                p.name.clone(),
                p.agenda.clone().unwrap_or_default(),
            ]
        })
        .collect();
    format!(
        "{}\n{}",
        schedule.name,
        render_table(&["#", "time", "period", "agenda"], &rows)
    )
}

pub fn render_schedules(book: &ScheduleBook) -> String {
    if book.is_empty() {
        return "No schedules. Create one with 'schedule add <name...>'.".to_string();
    }
    let selected = book.selected_id();
    let rows: Vec<Vec<String>> = book
        .schedules()
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let marker = if Some(s.id.as_str()) == selected { "*" } else { "" };
            vec![
                (i + 1).to_string(),
                marker.to_string(),
                s.name.clone(),
                s.periods.len().to_string(),
            ]
        })
        .collect();
    render_table(&["#", "sel", "schedule", "periods"], &rows)
}

/// Clock, date, active period with progress, and the upcoming period.
pub fn render_status(status: &ScheduleStatus, now: NaiveDateTime) -> String {
    let mut lines = vec![
        now.format("%-I:%M:%S %p").to_string(),
        now.format("%A, %B %-d, %Y").to_string(),
    ];

    let Some(name) = &status.schedule_name else {
        lines.push("No schedule selected.".to_string());
        return lines.join("\n");
    };
    lines.push(format!("Schedule: {name}"));

    match (&status.active, &status.progress) {
        (Some(active), progress) => {
            lines.push(format!("Now: {} ({})", active.name, active.time_range_12h()));
            if let Some(progress) = progress {
                lines.push(format!(
                    "{} {:.0}%  {}",
                    progress.bar(PROGRESS_BAR_WIDTH),
                    progress.percent(),
                    progress.remaining_label()
                ));
            }
            if let Some(agenda) = &active.agenda {
                lines.push(format!("Agenda: {agenda}"));
            }
        }
        (None, _) if status.next.is_some() => {
            lines.push("No active period right now.".to_string());
        }
        (None, _) => {
            lines.push("No active or upcoming periods.".to_string());
            lines.push("The school day may be over.".to_string());
        }
    }

    if let Some(next) = &status.next {
        lines.push(format!(
            "Up next: {} at {}",
            next.name,
            next.start_time.to_12h()
        ));
    }
    lines.join("\n")
}
