//! Host wiring and the JSON-line server for typist.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use typist_cdp::CdpClient;
use typist_config::{Config, LoggingConfig};
use typist_engine::{
    CdpClipboard, CdpDriver, FileSettingsStore, TabId, TypingControl, TypingEngine,
};
use typist_menu::{Dispatcher, Request, Response};

/// Initialize tracing with console and file output.
///
/// The console layer writes to stderr; stdout carries the JSON channel.
/// Log files are written to the configured directory with daily rotation.
pub(crate) fn init_tracing(logging: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let file_layer = if logging.file {
        let log_dir = logging.log_dir();
        std::fs::create_dir_all(&log_dir)?;

        let file_appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix("typist")
            .filename_suffix("log")
            .max_log_files(14)
            .build(&log_dir)?;

        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        // Keeps the background writer alive for the whole process.
        static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
            std::sync::OnceLock::new();
        let _ = GUARD.set(guard);

        let layer = fmt::layer().with_writer(non_blocking).with_ansi(false);
        if logging.format == "json" {
            Some(layer.json().boxed())
        } else {
            Some(layer.boxed())
        }
    } else {
        None
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_ansi(true),
        )
        .with(file_layer)
        .init();

    Ok(())
}

/// Connect to the browser named in the config.
pub(crate) async fn connect_browser(
    config: &Config,
) -> Result<Arc<CdpClient>, Box<dyn std::error::Error>> {
    let client = CdpClient::connect_with_timeout(
        &config.browser.endpoint,
        Duration::from_secs(config.browser.command_timeout_secs),
    )
    .await?;

    info!(
        browser = client.browser(),
        protocol = client.protocol_version(),
        "Connected to {}",
        config.browser.endpoint
    );
    if client.protocol_version() != config.browser.protocol_version {
        warn!(
            "Browser speaks protocol {}, expected {}",
            client.protocol_version(),
            config.browser.protocol_version
        );
    }

    Ok(Arc::new(client))
}

/// Everything a running host needs, wired together.
#[derive(Clone)]
pub(crate) struct Host {
    pub client: Arc<CdpClient>,
    pub engine: Arc<TypingEngine>,
    pub dispatcher: Arc<Dispatcher>,
}

impl Host {
    pub async fn connect(config: &Config) -> Result<Self, Box<dyn std::error::Error>> {
        let client = connect_browser(config).await?;
        let store = Arc::new(FileSettingsStore::new(config.storage.settings_path()));
        debug!(path = %store.path().display(), "Using settings file");

        let engine = Arc::new(TypingEngine::new(
            Arc::new(CdpDriver::new(client.clone())),
            Arc::new(CdpClipboard::new(client.clone())),
            store.clone(),
        ));
        let dispatcher = Arc::new(Dispatcher::new(engine.clone(), store));

        Ok(Self {
            client,
            engine,
            dispatcher,
        })
    }

    /// The focused tab, or `None` if there is none or the browser can't say.
    pub async fn active_tab(&self) -> Option<TabId> {
        match self.client.active_page().await {
            Ok(page) => page.map(|p| TabId::new(p.id)),
            Err(e) => {
                warn!("Failed to look up the active tab: {}", e);
                None
            }
        }
    }

    /// `tab` if given, otherwise the active tab.
    pub async fn resolve_tab(
        &self,
        tab: Option<String>,
    ) -> Result<TabId, Box<dyn std::error::Error>> {
        match tab {
            Some(tab) => Ok(TabId::new(tab)),
            None => self
                .active_tab()
                .await
                .ok_or_else(|| "No active tab found".into()),
        }
    }

    /// Stop every typing task still running.
    pub async fn shutdown(&self) {
        for tab in self.engine.active_tabs() {
            self.engine.stop_typing(&tab).await;
        }
    }
}

/// Serve requests: one JSON object per line on stdin, one response line per
/// request on stdout. Requests are handled concurrently, so responses may
/// come back out of order; `requestId` is echoed for matching.
pub(crate) async fn run_server(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting typist v{}", env!("CARGO_PKG_VERSION"));

    let host = Host::connect(config).await?;
    match host.dispatcher.update_menu().await {
        Ok(items) => info!(items = items.len(), "Menu ready"),
        Err(e) => warn!("Failed to build menu: {}", e),
    }

    let (tx, mut rx) = mpsc::unbounded_channel::<Response>();
    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(response) = rx.recv().await {
            let line = match serde_json::to_string(&response) {
                Ok(line) => line,
                Err(e) => {
                    error!("Failed to encode response: {}", e);
                    continue;
                }
            };
            let written = async {
                stdout.write_all(line.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await
            };
            if let Err(e) = written.await {
                error!("Failed to write response: {}", e);
                break;
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    info!("Waiting for requests on stdin");

    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => handle_line(&host, &tx, line),
                None => {
                    info!("stdin closed");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal");
                break;
            }
        }
    }

    host.shutdown().await;
    drop(tx);
    if let Err(e) = writer.await {
        error!("Response writer failed: {}", e);
    }

    info!("typist stopped");
    Ok(())
}

fn handle_line(host: &Host, tx: &mpsc::UnboundedSender<Response>, line: String) {
    let request = match parse_request(&line) {
        Ok(Some(request)) => request,
        Ok(None) => return,
        Err(rejection) => {
            let _ = tx.send(rejection);
            return;
        }
    };

    let host = host.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let sender_tab = if request.tab.is_none() && request.wants_tab() {
            host.active_tab().await
        } else {
            None
        };
        let response = host.dispatcher.on_message(request, sender_tab).await;
        let _ = tx.send(response);
    });
}

/// Decode one input line. Blank lines are skipped; anything that is not a
/// request object yields the failure response to send back.
fn parse_request(line: &str) -> Result<Option<Request>, Response> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    serde_json::from_str(line).map(Some).map_err(|e| {
        warn!("Rejected malformed request: {}", e);
        Response::failure(format!("Invalid request: {}", e))
    })
}
