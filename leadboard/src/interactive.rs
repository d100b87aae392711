//! Line-oriented filter loop over stdin
//!
//! Every filter change re-renders the report; the dashboard's sheet cache is
//! shared across renders until `reload` clears it.

use anyhow::Result;
use leadcraft_core::calendar::Month;
use leadcraft_core::report::ViewMode;
use leadcraft_core::Dashboard;
use std::io::{self, BufRead, Write};
use std::path::Path;
use tracing::debug;

use crate::{OutputFormat, render};

/// Current filter selection
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub month: Month,
    pub agent: Option<String>,
    pub view: ViewMode,
}

#[derive(Debug, PartialEq)]
enum Command {
    Month(Month),
    Agent(Option<String>),
    View(ViewMode),
    Show,
    Reload,
    Help,
    Quit,
}

fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (word, arg) = match line.split_once(char::is_whitespace) {
        Some((word, arg)) => (word, arg.trim()),
        None => (line, ""),
    };

    match word.to_ascii_lowercase().as_str() {
        "month" | "mes" => Month::from_name(arg)
            .map(Command::Month)
            .ok_or_else(|| format!("unknown month '{arg}'")),
        "agent" | "agente" => match arg {
            "" => Err("usage: agent <NAME>|all".to_string()),
            "all" | "todos" => Ok(Command::Agent(None)),
            name => Ok(Command::Agent(Some(name.to_string()))),
        },
        "view" | "vista" => arg.parse().map(Command::View),
        "show" | "" => Ok(Command::Show),
        "reload" => Ok(Command::Reload),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" | "q" => Ok(Command::Quit),
        other => Err(format!("unknown command '{other}', try 'help'")),
    }
}

const HELP: &str = "\
commands:
  month <Mes>          select month (e.g. month Noviembre)
  agent <NAME>|all     select one agent or every agent
  view full|top5|bottom5
  show                 render the current selection
  reload               drop cached sheets and re-read the workbook
  quit";

/// Run the loop until `quit` or end of input
pub fn run(
    dashboard: &Dashboard,
    file: &Path,
    format: OutputFormat,
    mut selection: Selection,
) -> Result<()> {
    render(dashboard, file, format, &selection)?;

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        eprint!("leadboard> ");
        io::stderr().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;

        match parse_command(&line) {
            Ok(Command::Month(month)) => selection.month = month,
            Ok(Command::Agent(agent)) => selection.agent = agent,
            Ok(Command::View(view)) => selection.view = view,
            Ok(Command::Show) => {}
            Ok(Command::Reload) => {
                dashboard.reload();
                debug!("sheet cache cleared");
            }
            Ok(Command::Help) => {
                eprintln!("{HELP}");
                continue;
            }
            Ok(Command::Quit) => break,
            Err(message) => {
                eprintln!("{message}");
                continue;
            }
        }

        render(dashboard, file, format, &selection)?;
    }

    Ok(())
}
