//! Line-oriented console shell.
//!
//! Every input line becomes its own task; the conversion service's gate
//! decides how many of them run at once.

use std::future::Future;
use std::sync::Arc;

use ratebook_fx::{ConversionService, FxError, OutputChannel};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info};

/// Instructions printed at startup.
pub const INSTRUCTIONS: &str = "Type in a line of the form \"<convert from> <number of units> in <convert to>\" or \"quit\" to exit.";

/// Line that ends the session.
pub const QUIT: &str = "quit";

/// What happened during a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShellSummary {
    /// Request lines handed to the service.
    pub submitted: usize,
    /// Request tasks that panicked.
    pub panicked: usize,
    /// Session ended by `quit` or a shutdown signal rather than end of input.
    pub quit: bool,
}

/// Read request lines until `quit`, end of input or `shutdown`.
///
/// On `quit` and `shutdown` the gate is closed, so requests still waiting for a
/// permit report an interruption. At end of input every submitted request runs.
pub async fn run<R, S>(
    service: Arc<ConversionService>,
    output: Arc<dyn OutputChannel>,
    input: R,
    shutdown: S,
) -> ShellSummary
where
    R: AsyncBufRead + Unpin,
    S: Future<Output = ()>,
{
    let mut lines = input.lines();
    let mut tasks = JoinSet::new();
    let mut summary = ShellSummary::default();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    let line = line.trim_end_matches('\r').to_string();
                    if line == QUIT {
                        summary.quit = true;
                        break;
                    }
                    let service = service.clone();
                    tasks.spawn(async move { service.try_convert(&line).await });
                    summary.submitted += 1;
                }
                Ok(None) => {
                    debug!("End of input");
                    break;
                }
                Err(e) => {
                    error!(error = %e, "Cannot read input");
                    break;
                }
            },
            Some(result) = tasks.join_next(), if !tasks.is_empty() => {
                reap(result, output.as_ref(), &mut summary);
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                summary.quit = true;
                break;
            }
        }
    }

    if summary.quit {
        service.close();
    }

    while let Some(result) = tasks.join_next().await {
        reap(result, output.as_ref(), &mut summary);
    }

    summary
}

/// Account for a finished request task.
fn reap(result: Result<(), JoinError>, output: &dyn OutputChannel, summary: &mut ShellSummary) {
    match result {
        Ok(()) => {}
        Err(e) if e.is_panic() => {
            // The permit was released when the task unwound.
            error!(error = %e, "Conversion task panicked");
            summary.panicked += 1;
            output.failure(&FxError::Unexpected(e.to_string()).to_string());
        }
        Err(e) => debug!(error = %e, "Conversion task cancelled"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratebook_fx::{BufferedOutput, MemoryDiagnostics, ReferenceFeed};
    use std::num::NonZeroUsize;
    use std::time::Duration;
    use tokio::io::BufReader;

    fn setup(permits: usize) -> (Arc<ConversionService>, Arc<BufferedOutput>) {
        let output = Arc::new(BufferedOutput::new());
        let service = ConversionService::from_feed(
            &ReferenceFeed,
            NonZeroUsize::new(permits).unwrap(),
            output.clone(),
            Arc::new(MemoryDiagnostics::new()),
        )
        .unwrap();
        (Arc::new(service), output)
    }

    #[tokio::test]
    async fn test_end_of_input_runs_everything() {
        let (service, output) = setup(2);
        let input = "NOK 100.34 in JPY\nsome invalid input\nABC 100.20 in XYZ\r\n";

        let summary = run(
            service.clone(),
            output.clone(),
            BufReader::new(input.as_bytes()),
            std::future::pending(),
        )
        .await;

        assert_eq!(summary.submitted, 3);
        assert!(!summary.quit);
        assert_eq!(output.successes(), vec!["NOK 100.34 = JPY 1711"]);

        let mut failures = output.failures();
        failures.sort();
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0], ratebook_fx::MALFORMED_REQUEST_MESSAGE);
        assert_eq!(failures[1], "Unable to find rate for ABC/XYZ");
        assert!(service.is_accepting_requests());
    }

    #[tokio::test]
    async fn test_quit_stops_reading() {
        let (service, output) = setup(1);
        let input = "AUD 100 in USD\nquit\nEUR 1 in USD\n";

        let summary = run(
            service.clone(),
            output.clone(),
            BufReader::new(input.as_bytes()),
            std::future::pending(),
        )
        .await;

        assert_eq!(summary.submitted, 1);
        assert!(summary.quit);
        assert!(!service.is_accepting_requests());

        // The request either ran before quit or was interrupted, never both
        let lines: Vec<String> = output
            .successes()
            .into_iter()
            .chain(output.failures())
            .collect();
        assert_eq!(lines.len(), 1);
        assert!(lines[0] == "AUD 100 = USD 83.71" || lines[0] == "Conversion interrupted.");
    }

    #[tokio::test]
    async fn test_shutdown_signal() {
        let (service, output) = setup(1);
        let input = tokio_test::io::Builder::new()
            .read(b"AUD 100 in USD\n")
            .wait(Duration::from_secs(3600))
            .build();

        let summary = run(
            service.clone(),
            output.clone(),
            BufReader::new(input),
            tokio::time::sleep(Duration::from_millis(50)),
        )
        .await;

        assert!(summary.quit);
        assert_eq!(summary.submitted, 1);
        assert_eq!(output.successes(), vec!["AUD 100 = USD 83.71"]);
        assert!(!service.is_accepting_requests());
    }

    #[tokio::test]
    async fn test_panicking_task_is_contained() {
        let output = BufferedOutput::new();
        let mut summary = ShellSummary::default();
        let mut tasks: JoinSet<()> = JoinSet::new();
        tasks.spawn(async { panic!("boom") });

        let result = tasks.join_next().await.unwrap();
        reap(result, &output, &mut summary);

        assert_eq!(summary.panicked, 1);
        assert_eq!(output.failures(), vec!["Unexpected error."]);
    }
}
