// src/interrupt.rs

use std::io;

/// Listener for the user's Ctrl-C.
///
/// The OS handler is registered in [`Interrupt::install`], not on first poll,
/// so a Ctrl-C that arrives while the player is starting is queued instead of
/// killing the process and leaving the player running in its own group.
pub struct Interrupt {
    #[cfg(unix)]
    signal: tokio::signal::unix::Signal,
    #[cfg(windows)]
    signal: tokio::signal::windows::CtrlC,
}

impl Interrupt {
    /// Registers the SIGINT handler. Must be called from inside the runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the signal handler cannot be registered.
    pub fn install() -> io::Result<Self> {
        #[cfg(unix)]
        let signal = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())?;
        #[cfg(windows)]
        let signal = tokio::signal::windows::ctrl_c()?;
        Ok(Self { signal })
    }

    /// Resolves once an interrupt has been received since the last call.
    pub async fn recv(&mut self) {
        if self.signal.recv().await.is_none() {
            // The listener was torn down; no interrupt will ever arrive.
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::process::Command;
    use std::time::Duration;

    #[tokio::test]
    async fn test_interrupt_before_first_wait_is_queued() {
        let mut interrupt = Interrupt::install().unwrap();

        // Not polled yet: the state the controller is in while the player starts.
        let status = Command::new("kill")
            .arg("-INT")
            .arg(std::process::id().to_string())
            .status()
            .unwrap();
        assert!(status.success());

        tokio::time::timeout(Duration::from_secs(5), interrupt.recv())
            .await
            .expect("queued interrupt was not delivered");
    }
}
