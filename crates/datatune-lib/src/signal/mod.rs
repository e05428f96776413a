use tokio_util::sync::CancellationToken;

/// Cancels a shared token when the process receives SIGINT (Ctrl+C) or SIGTERM.
///
/// Spawn `listen()` as a background task and hand `token()` clones to the
/// HTTP server and anything else that should stop on shutdown.
pub struct SignalHandler {
    token: CancellationToken,
}

impl SignalHandler {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Wait for SIGINT or SIGTERM, then cancel the token.
    pub async fn listen(&self) {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received SIGINT, shutting down...");
            }
            _ = Self::sigterm() => {
                tracing::info!("Received SIGTERM, shutting down...");
            }
        }
        self.token.cancel();
    }

    #[cfg(unix)]
    async fn sigterm() {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    }

    #[cfg(not(unix))]
    async fn sigterm() {
        std::future::pending::<()>().await;
    }
}

impl Default for SignalHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_creates_uncancelled_token() {
        let handler = SignalHandler::new();
        assert!(!handler.token().is_cancelled());
    }

    #[test]
    fn test_token_clones_share_state() {
        let handler = SignalHandler::default();
        let t1 = handler.token();
        let t2 = handler.token();

        handler.token.cancel();
        assert!(t1.is_cancelled());
        assert!(t2.is_cancelled());
    }
}
