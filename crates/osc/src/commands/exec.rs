//! Run a command in a pod.
//!
//! Output is streamed to the local stdout/stderr as it arrives. Ctrl-C stops
//! the session; the remote exit code becomes ours.

use anyhow::{Result, anyhow, bail};
use osc_core::exec::PodExec;
use osc_core::resource::Pod;
use osc_core::{Error, ExecListener, ExecOptions, ExecStatus};
use std::io::Write;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tracing::debug;

use super::connect;
use crate::cli::ExecCommand;
use crate::config::Config;

/// How the session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Outcome {
    Exited(i32),
    Closed(u16, String),
    Failed(String),
}

/// Writes remote output to the local terminal.
#[derive(Default)]
struct TerminalListener {
    done: Notify,
    exit_code: Mutex<Option<i32>>,
    outcome: Mutex<Option<Outcome>>,
}

impl TerminalListener {
    fn finish(&self, outcome: Outcome) {
        *self.outcome.lock().unwrap_or_else(|e| e.into_inner()) = Some(outcome);
        self.done.notify_one();
    }

    /// Final outcome; the exit status wins over a plain close.
    fn outcome(&self) -> Option<Outcome> {
        let outcome = self.outcome.lock().unwrap_or_else(|e| e.into_inner()).clone();
        let exit_code = *self.exit_code.lock().unwrap_or_else(|e| e.into_inner());
        match (outcome, exit_code) {
            (Some(Outcome::Closed(..)), Some(code)) => Some(Outcome::Exited(code)),
            (outcome, _) => outcome,
        }
    }
}

impl ExecListener for TerminalListener {
    fn on_stdout(&self, data: &[u8]) {
        let mut out = std::io::stdout().lock();
        let _ = out.write_all(data);
        let _ = out.flush();
    }

    fn on_stderr(&self, data: &[u8]) {
        let mut err = std::io::stderr().lock();
        let _ = err.write_all(data);
        let _ = err.flush();
    }

    fn on_exec_error(&self, status: &ExecStatus) {
        let code = match status.exit_code {
            Some(code) => code,
            None if status.success => 0,
            None => {
                eprintln!("{}", status.message);
                1
            }
        };
        *self.exit_code.lock().unwrap_or_else(|e| e.into_inner()) = Some(code);
    }

    fn on_close(&self, code: u16, reason: &str) {
        self.finish(Outcome::Closed(code, reason.to_string()));
    }

    fn on_failure(&self, error: &Error) {
        self.finish(Outcome::Failed(error.to_string()));
    }
}

pub async fn execute(cmd: ExecCommand, config: &Config) -> Result<()> {
    let client = connect(config).await?;
    let pod: Pod = client.get_typed(&cmd.pod, None).await?;

    let exec = pod
        .capability::<PodExec>()
        .await
        .ok_or_else(|| anyhow!("Server does not support exec for {}", pod.identity()))?;

    let mut options = ExecOptions::new().tty(cmd.tty);
    let container = match cmd.container {
        Some(container) => Some(container),
        None => pod.default_container()?,
    };
    if let Some(container) = container {
        options = options.container(container);
    }

    let listener = Arc::new(TerminalListener::default());
    let args: Vec<&str> = cmd.command.iter().map(String::as_str).collect();
    let handle = exec.start(listener.clone(), &options, &args);
    debug!("Exec session {} started", handle.id());

    tokio::select! {
        _ = listener.done.notified() => {}
        _ = tokio::signal::ctrl_c() => {
            debug!("Interrupted, stopping exec session {}", handle.id());
            handle.stop();
        }
    }

    match listener.outcome() {
        Some(Outcome::Exited(0)) | Some(Outcome::Closed(..)) => Ok(()),
        Some(Outcome::Exited(code)) => std::process::exit(code),
        Some(Outcome::Failed(message)) => bail!("Exec failed: {}", message),
        None => bail!("Exec session ended without a result"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_wins_over_close() {
        let listener = TerminalListener::default();
        listener.on_exec_error(&ExecStatus {
            success: false,
            message: "command terminated with non-zero exit code".to_string(),
            reason: "NonZeroExitCode".to_string(),
            exit_code: Some(2),
        });
        listener.on_close(1000, "");
        assert_eq!(listener.outcome(), Some(Outcome::Exited(2)));
    }

    #[test]
    fn test_plain_close() {
        let listener = TerminalListener::default();
        listener.on_close(1000, "stopped by caller");
        assert_eq!(
            listener.outcome(),
            Some(Outcome::Closed(1000, "stopped by caller".to_string()))
        );
    }

    #[test]
    fn test_failure() {
        let listener = TerminalListener::default();
        listener.on_failure(&Error::Other("handshake refused".to_string()));
        assert!(matches!(listener.outcome(), Some(Outcome::Failed(m)) if m.contains("handshake refused")));
    }

    #[tokio::test]
    async fn test_terminal_callback_wakes_waiter() {
        let listener = Arc::new(TerminalListener::default());
        listener.on_close(1000, "");
        // notify_one stores a permit when nobody is waiting yet
        tokio::time::timeout(std::time::Duration::from_secs(1), listener.done.notified())
            .await
            .unwrap();
    }
}
