use std::sync::Arc;

use inquire::{InquireError, Text};
use tokio::sync::watch;
use weather_core::{ViewModel, WeatherController, render, view::AWAITING_PERMISSION_MESSAGE};

use crate::prompt::ask;

const HELP: &str = "Type a place to search, or :here, :more, :dismiss, :quit";

/// One line typed at the prompt.
#[derive(Debug, PartialEq, Eq)]
enum Action {
    Search(String),
    Here,
    ToggleDetails,
    Dismiss,
    Help,
    Quit,
}

impl Action {
    fn parse(line: &str) -> Self {
        match line.trim() {
            ":here" => Action::Here,
            ":more" | ":less" => Action::ToggleDetails,
            ":dismiss" => Action::Dismiss,
            ":help" | ":?" => Action::Help,
            ":quit" | ":q" => Action::Quit,
            other => Action::Search(other.to_string()),
        }
    }
}

pub async fn run(ctl: Arc<WeatherController>) -> anyhow::Result<()> {
    let status = tokio::spawn(print_status(ctl.subscribe()));

    if ctl.bootstrap().await.is_err() {
        flush_alert(&ctl);
    }
    println!("{HELP}");

    loop {
        let line = match ask(|| Text::new(">").prompt()).await {
            Ok(line) => line,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(e) => return Err(e.into()),
        };

        match Action::parse(&line) {
            Action::Search(location) => {
                ctl.submit_search(&location).await;
            }
            Action::Here => {
                ctl.use_current_location().await;
            }
            Action::ToggleDetails => {
                ctl.toggle_warning_details();
            }
            Action::Dismiss => ctl.dismiss_warnings(),
            Action::Help => {
                println!("{HELP}");
                continue;
            }
            Action::Quit => break,
        }

        flush_alert(&ctl);
        print!("{}", render(&ctl.snapshot()));
    }

    status.abort();
    Ok(())
}

fn flush_alert(ctl: &WeatherController) {
    if let Some(alert) = ctl.snapshot().alert {
        eprintln!("! {alert}");
        ctl.acknowledge_alert();
    }
}

/// Report transient states (searching, waiting for permission) as they happen.
async fn print_status(mut rx: watch::Receiver<ViewModel>) {
    let (mut was_loading, mut was_waiting) = (false, false);

    while rx.changed().await.is_ok() {
        let (loading, waiting, label) = {
            let vm = rx.borrow_and_update();
            (vm.is_loading(), vm.awaiting_permission, vm.search_label())
        };

        if loading && !was_loading {
            eprintln!("{label}");
        }
        if waiting && !was_waiting {
            eprintln!("{AWAITING_PERMISSION_MESSAGE}");
        }
        (was_loading, was_waiting) = (loading, waiting);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_and_searches() {
        assert_eq!(Action::parse(":here"), Action::Here);
        assert_eq!(Action::parse(" :more "), Action::ToggleDetails);
        assert_eq!(Action::parse(":dismiss"), Action::Dismiss);
        assert_eq!(Action::parse(":q"), Action::Quit);
        assert_eq!(Action::parse("New York"), Action::Search("New York".into()));
        assert_eq!(Action::parse("   "), Action::Search(String::new()));
    }
}
