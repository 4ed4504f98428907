//! Terminal setup and the event loop.
//!
//! The loop is the only mutator of [`BrowserView`]. Fetches and
//! submissions run on short-lived worker threads and report back over an
//! `mpsc` channel drained once per tick.

use super::browser::{BrowserView, Job, JobResult};
use crate::source::ContentSource;
use anyhow::{Context, Result};
use cairn_core::surface::FetchResponse;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{self, Stdout};
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

const TICK: Duration = Duration::from_millis(50);

type Term = Terminal<CrosstermBackend<Stdout>>;

fn setup_terminal() -> Result<Term> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("Failed to enter alternate screen")?;
    Terminal::new(CrosstermBackend::new(stdout)).context("Failed to create terminal")
}

fn restore_terminal(terminal: &mut Term) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")
}

/// Leave the alternate screen before a panic message is printed.
fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        previous(info);
    }));
}

/// Run the browser until the user quits.
///
/// # Errors
///
/// Returns an error if the terminal cannot be set up, drawn or read.
pub fn run(mut view: BrowserView, source: Arc<dyn ContentSource>) -> Result<()> {
    install_panic_hook();
    let mut terminal = setup_terminal()?;
    info!(source = %source.describe(), "browser started");
    let result = event_loop(&mut terminal, &mut view, &source);
    restore_terminal(&mut terminal)?;
    info!("browser stopped");
    result
}

fn event_loop(
    terminal: &mut Term,
    view: &mut BrowserView,
    source: &Arc<dyn ContentSource>,
) -> Result<()> {
    let (tx, rx) = mpsc::channel();
    spawn_jobs(view, source, &tx);

    loop {
        while let Ok(result) = rx.try_recv() {
            view.on_result(result);
        }
        view.tick(Instant::now());
        spawn_jobs(view, source, &tx);

        terminal
            .draw(|frame| view.render(frame))
            .context("Failed to draw frame")?;

        if event::poll(TICK).context("Failed to poll events")? {
            let event = event::read().context("Failed to read event")?;
            view.handle_event(&event);
            spawn_jobs(view, source, &tx);
        }

        if view.should_quit() {
            return Ok(());
        }
    }
}

fn spawn_jobs(view: &mut BrowserView, source: &Arc<dyn ContentSource>, tx: &mpsc::Sender<JobResult>) {
    for job in view.take_jobs() {
        let source = Arc::clone(source);
        let tx = tx.clone();
        thread::spawn(move || {
            let result = run_job(source.as_ref(), job);
            if tx.send(result).is_err() {
                debug!("browser closed before job finished");
            }
        });
    }
}

fn run_job(source: &dyn ContentSource, job: Job) -> JobResult {
    match job {
        Job::Fetch(request) => {
            let result = source.fetch(&request);
            JobResult::Fetched(FetchResponse { request, result })
        }
        Job::Submit(form) => {
            let result = source.submit(&form);
            JobResult::Submitted { form, result }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_core::IssueKey;
    use cairn_core::error::FetchError;
    use cairn_core::form::{IssueForm, SubmitResponse};
    use cairn_core::surface::{FetchRequest, SurfaceKind};

    struct Canned;

    impl ContentSource for Canned {
        fn fetch(&self, request: &FetchRequest) -> Result<String, FetchError> {
            if request.key.number == 404 {
                return Err(FetchError::NotFound(request.key.to_string()));
            }
            Ok(format!("# {}", request.key))
        }

        fn submit(&self, _form: &IssueForm) -> Result<SubmitResponse, FetchError> {
            Err(FetchError::ReadOnly)
        }

        fn describe(&self) -> String {
            "canned".to_string()
        }
    }

    fn request(number: u64) -> FetchRequest {
        FetchRequest {
            ticket: 1,
            surface: SurfaceKind::Inline,
            key: IssueKey::new(number, "acme/api"),
            verbose: false,
        }
    }

    #[test]
    fn fetch_job_carries_its_request() {
        let JobResult::Fetched(response) = run_job(&Canned, Job::Fetch(request(3))) else {
            panic!("expected fetch result");
        };
        assert_eq!(response.request, request(3));
        assert_eq!(response.result, Ok("# acme/api#3".to_string()));
    }

    #[test]
    fn fetch_errors_are_reported_not_raised() {
        let JobResult::Fetched(response) = run_job(&Canned, Job::Fetch(request(404))) else {
            panic!("expected fetch result");
        };
        assert!(matches!(response.result, Err(FetchError::NotFound(_))));
    }

    #[test]
    fn submit_job_returns_the_form() {
        let form = IssueForm::comment(IssueKey::new(1, "acme/api"));
        let JobResult::Submitted { form: back, result } = run_job(&Canned, Job::Submit(form)) else {
            panic!("expected submit result");
        };
        assert_eq!(back.target, IssueKey::new(1, "acme/api"));
        assert_eq!(result, Err(FetchError::ReadOnly));
    }
}
