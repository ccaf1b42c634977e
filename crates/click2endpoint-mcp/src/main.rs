use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use env_flags::env_flags;
use once_cell::sync::OnceCell;
use rust_mcp_sdk::error::SdkResult;
use rust_mcp_sdk::mcp_server::{
    HyperServerOptions, ServerRuntime, hyper_server_core, server_runtime_core,
};
use rust_mcp_sdk::schema::{
    Implementation, InitializeResult, LATEST_PROTOCOL_VERSION, ServerCapabilities,
    ServerCapabilitiesTools,
};
use rust_mcp_sdk::{McpServer, StdioTransport, TransportOptions};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{EnvFilter, Layer, Registry, prelude::*};

use click2endpoint_mcp::codegen::{DEFAULT_AUTH_BASE_URL, DEFAULT_MOCK_URL};
use click2endpoint_mcp::config::{UserConfig, expand_home, load_user_config};
use click2endpoint_mcp::form::ValidationMode;
use click2endpoint_mcp::handler::{
    Click2EndpointHandler, DEFAULT_MAX_SESSIONS, HandlerSettings, Services,
};
use click2endpoint_mcp::schema::load::{load_default, load_from_file};
use click2endpoint_mcp::services::nlp::DEFAULT_MODEL;
use click2endpoint_mcp::services::{
    CachedTokenProvider, Credentials, HttpTokenProvider, OpenAiParser, PostmanDirectory, ProcessScriptRunner, Workspace,
};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

#[derive(Clone, Copy)]
enum LogStyle {
    Json,
    Compact,
    Pretty,
    Full,
}

fn env_set(k: &str) -> bool {
    std::env::var_os(k).is_some()
}

/// Env wins when set, then the config value, then the flag's default.
fn pick<T>(key: &str, env_value: T, cfg: Option<T>) -> T {
    if env_set(key) {
        env_value
    } else {
        cfg.unwrap_or(env_value)
    }
}

/// Like [`pick`] for strings where empty means unset.
fn pick_opt(key: &str, env_value: &str, cfg: Option<&String>) -> Option<String> {
    if env_set(key) && !env_value.is_empty() {
        return Some(env_value.to_string());
    }
    cfg.filter(|s| !s.is_empty()).cloned()
}

fn fmt_layer<W>(writer: W, style: LogStyle, ansi: bool) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let base = tracing_subscriber::fmt::layer()
        .with_file(false)
        .with_line_number(false)
        .with_target(true)
        .with_ansi(ansi)
        .with_writer(writer);
    match style {
        LogStyle::Json => base.json().boxed(),
        LogStyle::Compact => base.compact().boxed(),
        LogStyle::Pretty => base.pretty().boxed(),
        LogStyle::Full => base.boxed(),
    }
}

fn resolve_home() -> PathBuf {
    match std::env::var("CLICK2ENDPOINT_HOME") {
        Ok(h) if !h.is_empty() => expand_home(&h),
        _ => match std::env::var("HOME") {
            Ok(home) => PathBuf::from(home).join(".click2endpoint"),
            Err(_) => std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(".click2endpoint"),
        },
    }
}

fn init_tracing(home: &Path, user_cfg: Option<&UserConfig>) {
    env_flags! {
        /// Tracing filter, e.g. "info", "debug", or targets format.
        RUST_LOG: &str = "info";
        /// Preferred filter env (alias). If set, overrides RUST_LOG.
        TRACING_FILTER: &str = "";
        /// Pretty formatting for logs (ignored if TRACING_JSON=true).
        TRACING_PRETTY: bool = false;
        /// Compact single-line formatting for logs (ignored if TRACING_JSON=true)
        TRACING_COMPACT: bool = true;
        /// JSON formatting for logs
        TRACING_JSON: bool = false;
        /// If true, also log to file under <CLICK2ENDPOINT_HOME>/logs or LOG_DIR
        LOG_TO_FILE: bool = true;
        /// Optional explicit log directory (absolute). Defaults to <CLICK2ENDPOINT_HOME>/logs
        LOG_DIR: &str = "";
    }

    let cfg = user_cfg.and_then(|c| c.logging.as_ref());
    let rust_log = if !(*TRACING_FILTER).is_empty() {
        (*TRACING_FILTER).to_string()
    } else if env_set("RUST_LOG") {
        (*RUST_LOG).to_string()
    } else {
        cfg.and_then(|c| c.level.clone())
            .unwrap_or_else(|| (*RUST_LOG).to_string())
    };
    let json = pick("TRACING_JSON", *TRACING_JSON, cfg.and_then(|c| c.json));
    let compact = pick("TRACING_COMPACT", *TRACING_COMPACT, cfg.and_then(|c| c.compact));
    let pretty = pick("TRACING_PRETTY", *TRACING_PRETTY, cfg.and_then(|c| c.pretty));
    let log_to_file = pick("LOG_TO_FILE", *LOG_TO_FILE, cfg.and_then(|c| c.to_file));
    let log_dir = pick_opt("LOG_DIR", *LOG_DIR, cfg.and_then(|c| c.dir.as_ref()))
        .map(|d| expand_home(&d))
        .unwrap_or_else(|| home.join("logs"));

    let style = if json {
        LogStyle::Json
    } else if compact {
        LogStyle::Compact
    } else if pretty {
        LogStyle::Pretty
    } else {
        LogStyle::Full
    };

    // stderr only: stdout carries the stdio JSON-RPC stream.
    let mut layers: Vec<BoxedLayer> = vec![fmt_layer(std::io::stderr, style, true)];
    static FILE_GUARD: OnceCell<tracing_appender::non_blocking::WorkerGuard> = OnceCell::new();
    let mut dir_error = None;
    if log_to_file {
        match std::fs::create_dir_all(&log_dir) {
            Ok(()) => {
                let appender = tracing_appender::rolling::daily(&log_dir, "click2endpoint-mcp.log");
                let (nb, guard) = tracing_appender::non_blocking(appender);
                let _ = FILE_GUARD.set(guard);
                layers.push(fmt_layer(nb, style, false));
            }
            Err(e) => dir_error = Some(e),
        }
    }

    let filter = EnvFilter::try_new(rust_log).unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(e) = tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
    {
        tracing::debug!("tracing already set: {:?}", e);
    }
    if let Some(e) = dir_error {
        tracing::warn!("failed to create log dir {}: {}", log_dir.display(), e);
    }
}

#[tokio::main]
async fn main() -> SdkResult<()> {
    let home = resolve_home();
    let user_cfg = match load_user_config(&home) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("ignoring unreadable {}/config.toml: {e}", home.display());
            None
        }
    };
    init_tracing(&home, user_cfg.as_ref());

    env_flags! {
        /// Transport: "stdio" (default) or "http"
        TRANSPORT: &str = "stdio";
        /// Host for HTTP transport
        HOST: &str = "127.0.0.1";
        /// Port for HTTP transport
        PORT: u16 = 8081;
        /// Ping interval for HTTP SSE
        PING_SECS: u64 = 5;
        /// Enable JSON response mode for HTTP
        HTTP_JSON: bool = false;
        /// "advisory" reports validation errors alongside the payload; "blocking" withholds it.
        C2M_VALIDATION_MODE: &str = "advisory";
        /// Extra parameter schemas (.toml or .json) merged over the built-in catalog.
        C2M_SCHEMA_FILE: &str = "";
        /// Open wizard sessions kept before the least recently used is evicted.
        C2M_MAX_SESSIONS: usize = DEFAULT_MAX_SESSIONS;
        /// Auth service base URL used by the token tool and generated code.
        C2M_AUTH_BASE_URL: &str = DEFAULT_AUTH_BASE_URL;
        /// Mock server used when discovery is unavailable.
        C2M_MOCK_URL: &str = DEFAULT_MOCK_URL;
        /// Client credentials for get_access_token.
        C2M_CLIENT_ID: &str = "";
        C2M_CLIENT_SECRET: &str = "";
        /// Enables suggest_answers.
        OPENAI_API_KEY: &str = "";
        OPENAI_MODEL: &str = DEFAULT_MODEL;
        /// Enables Postman mock discovery.
        POSTMAN_API_KEY: &str = "";
        /// "personal" or "team"
        POSTMAN_WORKSPACE: &str = "personal";
        /// Expose run_script, which executes generated code on this machine.
        C2M_ENABLE_RUN_SCRIPT: bool = false;
        /// Script timeout in seconds.
        C2M_RUN_TIMEOUT_SECS: u64 = 30;
    }

    tracing::info!("starting click2endpoint-mcp (transport={})", *TRANSPORT);
    tracing::info!("click2endpoint_home={}", home.display());

    let cfg = user_cfg.as_ref();
    let wizard = cfg.and_then(|c| c.wizard.as_ref());
    let auth = cfg.and_then(|c| c.auth.as_ref());
    let mock = cfg.and_then(|c| c.mock_server.as_ref());
    let nlp = cfg.and_then(|c| c.nlp.as_ref());
    let runner = cfg.and_then(|c| c.runner.as_ref());

    let catalog = match pick_opt(
        "C2M_SCHEMA_FILE",
        *C2M_SCHEMA_FILE,
        wizard.and_then(|w| w.schema_file.as_ref()),
    ) {
        Some(file) => {
            let path = expand_home(&file);
            load_from_file(&path).unwrap_or_else(|e| {
                tracing::warn!(
                    "failed to load schema file {}: {} (using built-in schemas)",
                    path.display(),
                    e
                );
                load_default()
            })
        }
        None => load_default(),
    };

    let mode = pick(
        "C2M_VALIDATION_MODE",
        (*C2M_VALIDATION_MODE).to_string(),
        wizard.and_then(|w| w.validation_mode.clone()),
    );
    let validation_mode = mode.parse::<ValidationMode>().unwrap_or_else(|e| {
        tracing::warn!("{} (using advisory)", e);
        ValidationMode::Advisory
    });

    let auth_base_url = pick(
        "C2M_AUTH_BASE_URL",
        (*C2M_AUTH_BASE_URL).to_string(),
        auth.and_then(|a| a.base_url.clone()),
    );
    let default_mock_url = pick(
        "C2M_MOCK_URL",
        (*C2M_MOCK_URL).to_string(),
        mock.and_then(|m| m.default_url.clone()),
    );
    let credentials = match (
        pick_opt("C2M_CLIENT_ID", *C2M_CLIENT_ID, auth.and_then(|a| a.client_id.as_ref())),
        pick_opt(
            "C2M_CLIENT_SECRET",
            *C2M_CLIENT_SECRET,
            auth.and_then(|a| a.client_secret.as_ref()),
        ),
    ) {
        (Some(client_id), Some(client_secret)) => Some(Credentials {
            client_id,
            client_secret,
        }),
        _ => None,
    };
    let workspace = match pick(
        "POSTMAN_WORKSPACE",
        (*POSTMAN_WORKSPACE).to_string(),
        mock.and_then(|m| m.workspace.clone()),
    )
    .to_ascii_lowercase()
    .as_str()
    {
        "team" => Workspace::Team,
        _ => Workspace::Personal,
    };
    let enable_run_script = pick(
        "C2M_ENABLE_RUN_SCRIPT",
        *C2M_ENABLE_RUN_SCRIPT,
        runner.and_then(|r| r.enable),
    );
    let run_timeout = pick(
        "C2M_RUN_TIMEOUT_SECS",
        *C2M_RUN_TIMEOUT_SECS,
        runner.and_then(|r| r.timeout_secs),
    );

    let services = Services {
        tokens: Arc::new(CachedTokenProvider::new(HttpTokenProvider::new(
            auth_base_url.clone(),
        ))),
        parser: Arc::new(OpenAiParser::new(
            pick_opt(
                "OPENAI_API_KEY",
                *OPENAI_API_KEY,
                nlp.and_then(|n| n.openai_api_key.as_ref()),
            ),
            Some(pick(
                "OPENAI_MODEL",
                (*OPENAI_MODEL).to_string(),
                nlp.and_then(|n| n.model.clone()),
            )),
        )),
        mocks: Arc::new(PostmanDirectory::new(
            pick_opt(
                "POSTMAN_API_KEY",
                *POSTMAN_API_KEY,
                mock.and_then(|m| m.postman_api_key.as_ref()),
            ),
            workspace,
        )),
        runner: Arc::new(ProcessScriptRunner::new(Duration::from_secs(run_timeout))),
    };
    let max_sessions = pick(
        "C2M_MAX_SESSIONS",
        *C2M_MAX_SESSIONS,
        wizard.and_then(|w| w.max_sessions),
    );

    let settings = HandlerSettings {
        validation_mode,
        default_mock_url,
        auth_base_url,
        credentials,
        enable_run_script,
        max_sessions,
    };
    tracing::info!(
        "settings: validation={:?}, schemas={}, run_script={}, max_sessions={}, credentials={}",
        settings.validation_mode,
        catalog.len(),
        settings.enable_run_script,
        settings.max_sessions,
        settings.credentials.is_some()
    );

    let server_details = InitializeResult {
        server_info: Implementation {
            name: "click2endpoint-mcp".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            title: Some("Click2Endpoint MCP Server".to_string()),
        },
        capabilities: ServerCapabilities {
            tools: Some(ServerCapabilitiesTools { list_changed: None }),
            ..Default::default()
        },
        meta: None,
        instructions: Some(
            "Call wizard_start, answer with wizard_select + wizard_confirm until an endpoint \
             resolves, edit parameters with form_* tools, then build_payload or generate_code."
                .to_string(),
        ),
        protocol_version: LATEST_PROTOCOL_VERSION.to_string(),
    };

    let handler = Click2EndpointHandler::new(catalog, settings, services);

    if *TRANSPORT == "stdio" {
        let transport = StdioTransport::new(TransportOptions::default())?;
        let server: ServerRuntime =
            server_runtime_core::create_server(server_details, transport, handler);
        tracing::info!("starting stdio server");
        if let Err(e) = server.start().await {
            let msg = match e.rpc_error_message() {
                Some(m) => m.to_string(),
                None => e.to_string(),
            };
            tracing::error!("server runtime error: {}", msg);
        }
    } else {
        let host = (*HOST).to_string();
        let port = *PORT;
        let server = hyper_server_core::create_server(
            server_details,
            handler,
            HyperServerOptions {
                host: host.clone(),
                port,
                ping_interval: Duration::from_secs(*PING_SECS),
                enable_json_response: Some(*HTTP_JSON),
                ..Default::default()
            },
        );
        tracing::info!(
            "http server listening on {}:{} (json={}, ping_secs={})",
            host,
            port,
            *HTTP_JSON,
            *PING_SECS
        );
        if let Err(e) = server.start().await {
            let msg = match e.rpc_error_message() {
                Some(m) => m.to_string(),
                None => e.to_string(),
            };
            tracing::error!("hyper server error: {}", msg);
        }
    }
    tracing::info!("server stopped");
    Ok(())
}
