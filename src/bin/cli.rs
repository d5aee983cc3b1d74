use chrono::{Local, NaiveDateTime};
use class_schedule::display::{render_periods, render_schedules, render_status};
use class_schedule::logging::init_logging;
use class_schedule::persistence::MemoryStore;
use class_schedule::transfer::{
    export_schedule_to_path, load_period_drafts_from_csv, read_document, save_periods_to_csv,
};
use class_schedule::{AppConfig, Command, Outcome, PeriodDraft, Planner, Schedule, ScheduleBook};
use log::{debug, warn};
use std::io::{self, Write};
use std::thread;
use std::time::Duration;

const DEFAULT_WATCH_TICKS: u32 = 10;

fn print_help() {
    println!(
        "Commands:\n  help                                   Show this help\n  status                                 Show the active and next period\n  watch [ticks]                          Refresh status once per second (default 10 ticks)\n  show                                   Show periods of the selected schedule\n  list                                   List schedules (* marks the selected one)\n  select <n|id>                          Select a schedule\n  schedule add <name...>                 Create and select a schedule\n  schedule rename <n|id> <name...>       Rename a schedule\n  schedule delete <n|id>                 Delete a schedule (asks for confirmation)\n  add <HH:MM> <HH:MM> <name...>          Add a period to the selected schedule\n  edit <n|id> <HH:MM> <HH:MM> <name...>  Replace a period's times and name\n  agenda <n|id> [text...]                Set or clear a period's agenda\n  delete <n|id>                          Delete a period\n  suggest                                Suggest times for the next period\n  export json <path|dir>                 Export the selected schedule as JSON\n  export csv <path>                      Export the selected schedule's periods as CSV\n  import json <path>                     Import a schedule from a JSON export\n  import csv <path>                      Append periods from CSV to the selected schedule\n  quit|exit                              Exit"
    );
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Accepts a 1-based position in the listing or a literal schedule id.
fn schedule_ref(book: &ScheduleBook, token: &str) -> Option<String> {
    if let Ok(n) = token.parse::<usize>() {
        if n >= 1 {
            if let Some(schedule) = book.schedules().get(n - 1) {
                return Some(schedule.id.clone());
            }
        }
    }
    book.find(token).map(|s| s.id.clone())
}

/// Accepts a 1-based position in start-time order or a literal period id.
fn period_ref(schedule: &Schedule, token: &str) -> Option<String> {
    if let Ok(n) = token.parse::<usize>() {
        if n >= 1 {
            if let Some(period) = schedule.sorted_periods().get(n - 1) {
                return Some(period.id.clone());
            }
        }
    }
    schedule.find_period(token).map(|p| p.id.clone())
}

fn describe(outcome: &Outcome, book: &ScheduleBook) -> String {
    let name_of = |id: &str| {
        book.find(id)
            .map(|s| s.name.clone())
            .unwrap_or_else(|| id.to_string())
    };
    match outcome {
        Outcome::Selected { schedule_id } => format!("Selected \"{}\".", name_of(schedule_id)),
        Outcome::ScheduleAdded { name, .. } => format!("Created and selected \"{name}\"."),
        Outcome::Renamed { name, .. } => format!("Schedule renamed to \"{name}\"."),
        Outcome::Unchanged => "Nothing changed.".to_string(),
        Outcome::ConfirmationRequired { prompt, .. } => format!("{prompt} [y/N]"),
        Outcome::ScheduleDeleted {
            name, selected_id, ..
        } => match selected_id {
            Some(id) => format!("Deleted \"{name}\". Selected \"{}\".", name_of(id)),
            None => format!("Deleted \"{name}\". No schedules left."),
        },
        Outcome::PeriodAdded { period } => format!(
            "Added {} ({}).",
            period.name,
            period.time_range_12h()
        ),
        Outcome::PeriodUpdated { period } => format!(
            "Updated {} ({}).",
            period.name,
            period.time_range_12h()
        ),
        Outcome::PeriodDeleted { .. } => "Period deleted.".to_string(),
        Outcome::Imported { report } => {
            let mut line = format!(
                "Imported \"{}\" with {} period(s).",
                report.name, report.period_count
            );
            if report.defaulted_fields > 0 {
                line.push_str(&format!(
                    " {} missing or invalid field(s) were filled with defaults.",
                    report.defaulted_fields
                ));
            }
            line
        }
        Outcome::PeriodsImported { count } => format!("Imported {count} period(s)."),
    }
}

fn print_overlaps(planner: &Planner) {
    if let Some(schedule) = planner.selected() {
        for (a, b) in schedule.overlaps() {
            println!(
                "Warning: {} ({}) overlaps {} ({}).",
                a.name,
                a.time_range_12h(),
                b.name,
                b.time_range_12h()
            );
        }
    }
}

fn run(planner: &mut Planner, command: Command) -> Option<Outcome> {
    match planner.execute(command) {
        Ok(outcome) => {
            println!("{}", describe(&outcome, planner.book()));
            if outcome.changed_state() {
                if let Some(err) = planner.last_persist_error() {
                    println!("Warning: changes could not be saved ({err}).");
                }
            }
            Some(outcome)
        }
        Err(e) => {
            println!("Error: {e}");
            None
        }
    }
}

fn show_selected(planner: &Planner) {
    match planner.selected() {
        Some(schedule) => println!("{}", render_periods(schedule)),
        None => println!("No schedule selected."),
    }
}

fn main() {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(2);
        }
    };
    if let Err(e) = init_logging(&config.log_level, config.log_dir.as_deref()) {
        eprintln!("Logging disabled: {e}");
    }
    let store = match config.open_store() {
        Ok(store) => store,
        Err(e) => {
            warn!("event=store_open_failed error={e}");
            println!("Warning: {e}. Changes will not be saved.");
            Box::new(MemoryStore::new())
        }
    };
    let mut planner = Planner::open(store);

    println!("Class Schedule (CLI) - type 'help' for commands\n");
    show_selected(&planner);

    let stdin = io::stdin();
    let mut line = String::new();
    let mut pending_delete: Option<String> = None;
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();

        if let Some(schedule_id) = pending_delete.take() {
            if matches!(input.to_ascii_lowercase().as_str(), "y" | "yes") {
                run(
                    &mut planner,
                    Command::DeleteSchedule {
                        schedule_id,
                        confirmed: true,
                    },
                );
            } else {
                println!("Delete cancelled.");
            }
            continue;
        }
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "status" => {
                let now = now();
                println!("{}", render_status(&planner.status(now.time()), now));
            }
            "watch" => {
                let ticks = match parts.next().map(str::parse::<u32>) {
                    None => DEFAULT_WATCH_TICKS,
                    Some(Ok(n)) if n > 0 => n,
                    _ => {
                        println!("Usage: watch [ticks]");
                        continue;
                    }
                };
                for tick in 0..ticks {
                    if tick > 0 {
                        thread::sleep(Duration::from_secs(1));
                        println!();
                    }
                    let now = now();
                    let status = planner.status(now.time());
                    debug!(
                        "event=resolver_tick active={} next={}",
                        status.active.as_ref().map_or("-", |p| p.id.as_str()),
                        status.next.as_ref().map_or("-", |p| p.id.as_str())
                    );
                    println!("{}", render_status(&status, now));
                }
            }
            "show" => show_selected(&planner),
            "list" => println!("{}", render_schedules(planner.book())),
            "select" => match parts.next() {
                Some(token) => match schedule_ref(planner.book(), token) {
                    Some(schedule_id) => {
                        if run(&mut planner, Command::SelectSchedule { schedule_id }).is_some() {
                            show_selected(&planner);
                        }
                    }
                    None => println!("Unknown schedule '{token}'."),
                },
                None => println!("Usage: select <n|id>"),
            },
            "schedule" => match parts.next() {
                Some("add") => {
                    let name = parts.collect::<Vec<_>>().join(" ");
                    if name.is_empty() {
                        println!("Usage: schedule add <name...>");
                        continue;
                    }
                    run(&mut planner, Command::AddSchedule { name });
                }
                Some("rename") => {
                    let token = parts.next();
                    let name = parts.collect::<Vec<_>>().join(" ");
                    match token {
                        Some(token) if !name.is_empty() => {
                            match schedule_ref(planner.book(), token) {
                                Some(schedule_id) => {
                                    run(&mut planner, Command::RenameSchedule { schedule_id, name });
                                }
                                None => println!("Unknown schedule '{token}'."),
                            }
                        }
                        _ => println!("Usage: schedule rename <n|id> <name...>"),
                    }
                }
                Some("delete") => match parts.next() {
                    Some(token) => match schedule_ref(planner.book(), token) {
                        Some(schedule_id) => {
                            let outcome = run(
                                &mut planner,
                                Command::DeleteSchedule {
                                    schedule_id,
                                    confirmed: false,
                                },
                            );
                            if let Some(Outcome::ConfirmationRequired { schedule_id, .. }) = outcome
                            {
                                pending_delete = Some(schedule_id);
                            }
                        }
                        None => println!("Unknown schedule '{token}'."),
                    },
                    None => println!("Usage: schedule delete <n|id>"),
                },
                Some(other) => {
                    println!("Unknown schedule command '{other}'.");
                    println!("Usage: schedule add|rename|delete ...");
                }
                None => println!("Usage: schedule add|rename|delete ..."),
            },
            "add" => {
                let start = parts.next();
                let end = parts.next();
                let name = parts.collect::<Vec<_>>().join(" ");
                match (start, end) {
                    (Some(start), Some(end)) => {
                        let draft = PeriodDraft::new(name, start, end);
                        if run(&mut planner, Command::AddPeriod { draft }).is_some() {
                            print_overlaps(&planner);
                            show_selected(&planner);
                        }
                    }
                    _ => println!("Usage: add <HH:MM> <HH:MM> <name...>"),
                }
            }
            "edit" => {
                let token = parts.next();
                let start = parts.next();
                let end = parts.next();
                let name = parts.collect::<Vec<_>>().join(" ");
                let (Some(token), Some(start), Some(end)) = (token, start, end) else {
                    println!("Usage: edit <n|id> <HH:MM> <HH:MM> <name...>");
                    continue;
                };
                let Some(schedule) = planner.selected() else {
                    println!("No schedule selected.");
                    continue;
                };
                let Some(period_id) = period_ref(schedule, token) else {
                    println!("Unknown period '{token}'.");
                    continue;
                };
                let mut draft = PeriodDraft::new(name, start, end);
                draft.agenda = schedule
                    .find_period(&period_id)
                    .and_then(|p| p.agenda.clone());
                if run(&mut planner, Command::UpdatePeriod { period_id, draft }).is_some() {
                    print_overlaps(&planner);
                    show_selected(&planner);
                }
            }
            "agenda" => {
                let Some(token) = parts.next() else {
                    println!("Usage: agenda <n|id> [text...]");
                    continue;
                };
                let text = parts.collect::<Vec<_>>().join(" ");
                let Some(schedule) = planner.selected() else {
                    println!("No schedule selected.");
                    continue;
                };
                let Some(period) = period_ref(schedule, token)
                    .and_then(|id| schedule.find_period(&id))
                else {
                    println!("Unknown period '{token}'.");
                    continue;
                };
                let period_id = period.id.clone();
                let mut draft = PeriodDraft::from_period(period);
                draft.agenda = Some(text);
                run(&mut planner, Command::UpdatePeriod { period_id, draft });
            }
            "delete" => {
                let Some(token) = parts.next() else {
                    println!("Usage: delete <n|id>");
                    continue;
                };
                let Some(schedule) = planner.selected() else {
                    println!("No schedule selected.");
                    continue;
                };
                match period_ref(schedule, token) {
                    Some(period_id) => {
                        if run(&mut planner, Command::DeletePeriod { period_id }).is_some() {
                            show_selected(&planner);
                        }
                    }
                    None => println!("Unknown period '{token}'."),
                }
            }
            "suggest" => {
                let draft = planner.suggest_next_draft();
                println!(
                    "Suggested next period: {} - {}",
                    draft.start_time, draft.end_time
                );
            }
            "export" => {
                let fmt = parts.next();
                let path = parts.next();
                let Some(schedule) = planner.selected() else {
                    println!("No schedule selected.");
                    continue;
                };
                match (fmt, path) {
                    (Some("json"), Some(path)) => match export_schedule_to_path(schedule, path) {
                        Ok(written) => println!("Schedule exported to {}.", written.display()),
                        Err(e) => println!("Error exporting schedule: {e}"),
                    },
                    (Some("csv"), Some(path)) => match save_periods_to_csv(schedule, path) {
                        Ok(()) => println!("Periods exported to {path}."),
                        Err(e) => println!("Error exporting periods: {e}"),
                    },
                    _ => println!("Usage: export <json|csv> <path>"),
                }
            }
            "import" => {
                let fmt = parts.next();
                let path = parts.next();
                match (fmt, path) {
                    (Some("json"), Some(path)) => match read_document(path) {
                        Ok(document) => {
                            if run(&mut planner, Command::ImportSchedule { document }).is_some() {
                                show_selected(&planner);
                            }
                        }
                        Err(e) => println!("Error reading {path}: {e}"),
                    },
                    (Some("csv"), Some(path)) => match load_period_drafts_from_csv(path) {
                        Ok(drafts) => {
                            if run(&mut planner, Command::ImportPeriods { drafts }).is_some() {
                                print_overlaps(&planner);
                                show_selected(&planner);
                            }
                        }
                        Err(e) => println!("Error reading {path}: {e}"),
                    },
                    _ => println!("Usage: import <json|csv> <path>"),
                }
            }
            _ => println!("Unknown command. Type 'help'."),
        }
    }
}
