use std::io::{self, Write};

use tokio::sync::broadcast;
use tracing_subscriber::{EnvFilter, fmt};

/// Initialize logging to stdout and broadcast log lines over the provided channel.
///
/// `RUST_LOG` takes precedence; otherwise the level is `debug` when
/// `debug` is set and `info` if not.
///
/// ```
/// use tokio::sync::broadcast;
///
/// let (tx, _rx) = broadcast::channel(16);
/// noisy_gng::init_logging(false, tx);
/// ```
pub fn init_logging(debug: bool, tx: broadcast::Sender<String>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(debug)));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(tee(tx))
        .try_init();
}

fn default_directive(debug: bool) -> &'static str {
    if debug { "debug" } else { "info" }
}

fn tee(tx: broadcast::Sender<String>) -> impl Fn() -> TeeWriter + Send + Sync + 'static {
    move || TeeWriter {
        stdout: io::stdout(),
        tx: tx.clone(),
    }
}

/// Writer that duplicates all output to a broadcast channel.
struct TeeWriter {
    stdout: io::Stdout,
    tx: broadcast::Sender<String>,
}

impl Write for TeeWriter {
    /// Writes to stdout and forwards what was written to the broadcast channel.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.stdout.write(buf)?;
        if let Ok(s) = std::str::from_utf8(&buf[..n]) {
            let _ = self.tx.send(s.trim_end().to_string());
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stdout.flush()
    }
}
