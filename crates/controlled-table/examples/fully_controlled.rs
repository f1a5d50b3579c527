//! Terminal host for the fully controlled table.
//!
//! Renders the current page, the change log and the table data, then reads
//! one command per line from stdin. Type `help` for the command list.
//!
//! Run with: cargo run -p controlled-table --example fully_controlled [config.toml]

use std::io::{self, BufRead, Write};

use controlled_table::prelude::*;
use controlled_table::{Person, PersonGenerator, RenderedTable};
use tracing_subscriber::EnvFilter;

const HELP: &str = "\
commands:
  edit <row> <column> <text>   focus, type and blur a cell
  focus <row> <column>         focus a cell (blurs the previous one)
  input <row> <column> <text>  type into a cell without committing
  blur <row> <column>          blur a cell, committing its draft
  next | prev | first | last   change page
  page <n> | size <n>          jump to a page, change the page size
  sort <column> | sort+ <column>
                               cycle sorting (sort+ keeps other keys)
  hide <column> | show <column>
  reset                        back to the initial state
  regen                        change table data
  data                         print only the table data as JSON
  help | quit";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => TableConfig::load(path)?,
        None => TableConfig::default(),
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let mut table = ControlledTable::people(config)?;
    show(&mut table);

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        io::stdout().flush()?;
        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        match run_command(&mut table, line.trim()) {
            Ok(Flow::Continue) => show(&mut table),
            Ok(Flow::Quiet) => {}
            Ok(Flow::Quit) => break,
            Err(message) => println!("{message}"),
        }
    }
    Ok(())
}

enum Flow {
    Continue,
    Quiet,
    Quit,
}

fn run_command(
    table: &mut ControlledTable<Person, PersonGenerator>,
    line: &str,
) -> Result<Flow, String> {
    let mut parts = line.splitn(4, ' ');
    let command = parts.next().unwrap_or_default();

    let cell = |parts: &mut std::str::SplitN<'_, char>| -> Result<CellKey, String> {
        let row = parts
            .next()
            .ok_or("missing row")?
            .parse::<usize>()
            .map_err(|e| e.to_string())?;
        let column = parts.next().ok_or("missing column")?;
        Ok(CellKey::new(row, column))
    };

    match command {
        "" => return Ok(Flow::Quiet),
        "help" => {
            println!("{HELP}");
            return Ok(Flow::Quiet);
        }
        "quit" | "exit" => return Ok(Flow::Quit),
        "edit" => {
            let key = cell(&mut parts)?;
            let text = parts.next().unwrap_or_default().to_string();
            table.handle(TableEvent::Focus(key.clone()));
            table.handle(TableEvent::Input(key.clone(), text));
            report(table.handle(TableEvent::Blur(key)));
        }
        "focus" => {
            let key = cell(&mut parts)?;
            report(table.handle(TableEvent::Focus(key)));
        }
        "input" => {
            let key = cell(&mut parts)?;
            let text = parts.next().unwrap_or_default().to_string();
            table.handle(TableEvent::Input(key, text));
        }
        "blur" => {
            let key = cell(&mut parts)?;
            report(table.handle(TableEvent::Blur(key)));
        }
        "next" => update(table, StateUpdate::NextPage),
        "prev" => update(table, StateUpdate::PreviousPage),
        "first" => update(table, StateUpdate::FirstPage),
        "last" => update(table, StateUpdate::LastPage),
        "page" | "size" => {
            let n = parts
                .next()
                .ok_or("missing number")?
                .parse::<usize>()
                .map_err(|e| e.to_string())?;
            let change = if command == "page" {
                StateUpdate::SetPageIndex(n)
            } else {
                StateUpdate::SetPageSize(n)
            };
            update(table, change);
        }
        "sort" | "sort+" => {
            let column_id = parts.next().ok_or("missing column")?.to_string();
            update(
                table,
                StateUpdate::ToggleSort {
                    column_id,
                    multi: command == "sort+",
                },
            );
        }
        "hide" | "show" => {
            let column_id = parts.next().ok_or("missing column")?.to_string();
            update(
                table,
                StateUpdate::SetColumnVisibility {
                    column_id,
                    visible: command == "show",
                },
            );
        }
        "reset" => update(table, StateUpdate::Reset),
        "regen" => {
            table.handle(TableEvent::Regenerate);
        }
        "data" => {
            println!("Table data:\n{}", table.data_json().map_err(|e| e.to_string())?);
            return Ok(Flow::Quiet);
        }
        other => return Err(format!("unknown command '{other}', try 'help'")),
    }
    Ok(Flow::Continue)
}

fn show(table: &mut ControlledTable<Person, PersonGenerator>) {
    print_frame(&table.render());
    match table.data_json() {
        Ok(json) => println!("\nTable data:\n{json}"),
        Err(err) => println!("\nTable data unavailable: {err}"),
    }
}

fn update(table: &mut ControlledTable<Person, PersonGenerator>, update: StateUpdate) {
    table.handle(TableEvent::State(update));
}

fn report(outcome: Option<CommitOutcome>) {
    if let Some(CommitOutcome::Ignored(reason)) = outcome {
        println!("commit ignored: {reason}");
    }
}

fn print_frame(frame: &RenderedTable) {
    println!("\n{}\n{}\n", frame.title, frame.description);

    let mut lines: Vec<Vec<String>> = Vec::new();
    for row in &frame.header_rows {
        lines.push(row.iter().map(|h| h.content.clone()).collect());
    }
    for row in &frame.rows {
        lines.push(
            row.iter()
                .map(|cell| {
                    let marker = if cell.dirty { "*" } else { "" };
                    format!("[{}] {}{marker}", cell.key.row_index, cell.content)
                })
                .collect(),
        );
    }
    for row in &frame.footer_rows {
        lines.push(row.iter().map(|f| f.content.clone()).collect());
    }

    let columns = lines.iter().map(Vec::len).max().unwrap_or(0);
    let widths: Vec<usize> = (0..columns)
        .map(|i| {
            lines
                .iter()
                .filter_map(|line| line.get(i))
                .map(|text| text.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    let header_count = frame.header_rows.len();
    let body_end = header_count + frame.rows.len();
    for (n, line) in lines.iter().enumerate() {
        if n == header_count || n == body_end {
            let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
            println!("+-{}-+", rule.join("-+-"));
        }
        let padded: Vec<String> = line
            .iter()
            .zip(&widths)
            .map(|(text, width)| format!("{text:<width$}"))
            .collect();
        println!("| {} |", padded.join(" | "));
    }

    println!(
        "\npage {} of {} ({} rows){}{}",
        frame.page_index + 1,
        frame.page_count,
        frame.total_rows,
        if frame.can_previous_page { "  <prev" } else { "" },
        if frame.can_next_page { "  next>" } else { "" },
    );

    if let Some(log) = &frame.change_log {
        println!("\nCell Value Update Log:\n{log}");
    }
}
