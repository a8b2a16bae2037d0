use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::Result;
use crate::channel::Mailbox;
use crate::format::Formatter;
use crate::models::Observation;

/// Writes one rendered line per observation
pub struct Reporter<W> {
    formatter: Formatter,
    observations: Mailbox<Observation>,
    output: W,
    cancel: CancellationToken,
}

impl<W: AsyncWrite + Unpin + Send> Reporter<W> {
    #[must_use]
    pub fn new(
        formatter: Formatter,
        observations: Mailbox<Observation>,
        output: W,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            formatter,
            observations,
            output,
            cancel,
        }
    }

    /// Render and write a single observation, flushing so status bars
    /// reading a pipe see it immediately
    pub async fn report(&mut self, observation: &Observation) -> Result<()> {
        let mut line = self.formatter.render(observation);
        debug!("Reporting {}", line);
        line.push('\n');
        self.output.write_all(line.as_bytes()).await?;
        self.output.flush().await?;
        Ok(())
    }

    /// Run until cancelled; a failed write ends the loop with an error.
    /// A write stalled on a full pipe is abandoned on cancellation.
    pub async fn run(mut self) -> Result<()> {
        let cancel = self.cancel.clone();
        loop {
            let observation = tokio::select! {
                () = cancel.cancelled() => return Ok(()),
                observation = self.observations.recv() => observation,
            };

            tokio::select! {
                () = cancel.cancelled() => return Ok(()),
                written = self.report(&observation) => written?,
            }
        }
    }
}
