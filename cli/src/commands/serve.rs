use std::future::Future;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use histbridge_core::api::{
    CliError, Dispatcher, LoadedConfig, RequestDecoder, RpcResponse, SystemClock,
};
use histbridge_plugins::factory;

const READ_CHUNK: usize = 8 * 1024;

/// Why the stdio loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Signal,
    InputClosed,
}

pub async fn handle_serve(loaded: &LoadedConfig) -> Result<i32, CliError> {
    let mut dispatcher = factory::build_dispatcher(loaded, Arc::new(SystemClock))
        .map_err(|e| CliError::Command(format!("{e:#}")))?;

    tracing::info!("history server started");
    tracing::info!(store = %loaded.paths.store_path.display(), "monitoring");
    tracing::info!(history = %loaded.paths.history_dir.display(), "saving to");

    let mut stdout = tokio::io::stdout();
    let result = run_stdio(
        &mut dispatcher,
        tokio::io::stdin(),
        &mut stdout,
        shutdown_signal(),
    )
    .await;

    dispatcher.shutdown().await;

    let reason = result?;
    tracing::info!(?reason, "history server stopped");
    Ok(0)
}

/// Reads requests from `input` until EOF or `shutdown` resolves, writing one
/// JSON line per response to `output`. Malformed input is logged and skipped.
pub async fn run_stdio<R, W, S>(
    dispatcher: &mut Dispatcher,
    mut input: R,
    output: &mut W,
    shutdown: S,
) -> Result<StopReason, CliError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
    S: Future<Output = ()>,
{
    let mut decoder = RequestDecoder::new();
    let mut buf = vec![0u8; READ_CHUNK];
    tokio::pin!(shutdown);

    loop {
        let n = tokio::select! {
            _ = &mut shutdown => return Ok(StopReason::Signal),
            read = input.read(&mut buf) => read?,
        };
        if n == 0 {
            if decoder.pending_len() > 0 {
                tracing::warn!(
                    bytes = decoder.pending_len(),
                    "input closed with an incomplete request"
                );
            }
            return Ok(StopReason::InputClosed);
        }

        for item in decoder.feed(&buf[..n]) {
            match item {
                Ok(req) => {
                    if let Some(resp) = dispatcher.handle(req).await {
                        write_response(output, &resp).await?;
                    }
                }
                Err(e) => tracing::error!(
                    code = e.error_code().as_i32(),
                    "error handling request: {e}"
                ),
            }
        }
    }
}

async fn write_response<W: AsyncWrite + Unpin>(
    output: &mut W,
    resp: &RpcResponse,
) -> Result<(), CliError> {
    let mut line = serde_json::to_string(resp).map_err(|e| CliError::Command(e.to_string()))?;
    line.push('\n');
    output.write_all(line.as_bytes()).await?;
    output.flush().await?;
    Ok(())
}

async fn shutdown_signal() {
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received interrupt signal");
        }
        _ = wait_for_sigterm() => {
            tracing::info!("received SIGTERM signal");
        }
    }
}

#[cfg(unix)]
async fn wait_for_sigterm() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            tracing::warn!("failed to install SIGTERM handler: {e}");
            std::future::pending::<()>().await
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_sigterm() {
    std::future::pending::<()>().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use histbridge_core::api::AppConfig;
    use histbridge_core::config::resolve_paths;
    use serde_json::Value;

    fn dispatcher_in(dir: &std::path::Path) -> Dispatcher {
        let cfg = AppConfig::default();
        let home = dir.to_path_buf();
        let opencode_dir = home.join(".opencode");
        let pai_dir = opencode_dir.join("pai");
        let paths = resolve_paths(&cfg, home, opencode_dir, pai_dir);
        factory::build_dispatcher(&LoadedConfig { cfg, paths }, Arc::new(SystemClock)).unwrap()
    }

    fn lines(out: &[u8]) -> Vec<Value> {
        std::str::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn answers_each_request_on_its_own_line() {
        let tmp = tempfile::tempdir().unwrap();
        let mut dispatcher = dispatcher_in(tmp.path());
        let input: &[u8] = b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"tools/list\"}\n\
this is not json\n\
{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"initialize\"}\n\
{\"jsonrpc\":\"2.0\",\"id\":3,\"method\":\"unknown\"}\n";
        let mut out = Vec::new();

        let reason = run_stdio(&mut dispatcher, input, &mut out, std::future::pending())
            .await
            .unwrap();
        dispatcher.shutdown().await;

        assert_eq!(reason, StopReason::InputClosed);
        let replies = lines(&out);
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0]["id"], 1);
        assert_eq!(
            replies[0]["result"]["tools"][0]["name"],
            "get_recent_history"
        );
        assert_eq!(replies[1]["id"], 2);
        assert_eq!(replies[1]["result"]["metadata"]["name"], "PAI History");
    }

    #[tokio::test]
    async fn stops_when_shutdown_resolves() {
        let tmp = tempfile::tempdir().unwrap();
        let mut dispatcher = dispatcher_in(tmp.path());
        let (_client, server) = tokio::io::duplex(64);
        let mut out = Vec::new();

        let reason = run_stdio(&mut dispatcher, server, &mut out, async {})
            .await
            .unwrap();
        assert_eq!(reason, StopReason::Signal);
        assert!(out.is_empty());
    }
}
