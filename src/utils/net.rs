use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time;
use tracing::debug;

use crate::ConnectionError;
use crate::Result;

/// Probes `addr` until it accepts a TCP connection or `timeout` elapses.
pub(crate) async fn wait_until_listening(
    addr: &str,
    timeout: Duration,
    interval: Duration,
) -> Result<()> {
    let probe = async {
        loop {
            if TcpStream::connect(addr).await.is_ok() {
                return;
            }
            debug!(%addr, "server not accepting connections yet");
            time::sleep(interval).await;
        }
    };

    time::timeout(timeout, probe).await.map_err(|_| {
        ConnectionError::NotReady {
            address: addr.to_string(),
            timeout,
        }
        .into()
    })
}
