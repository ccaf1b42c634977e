//! MCP server handler exposing the wizard, the parameter form and code
//! generation as tools.
//!
//! Each `wizard_start` opens a session keyed by a fresh UUID. Later calls pass
//! that `session_id`; sessions never see each other's state. Tool results are
//! JSON encoded as a single text content item.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use rust_mcp_sdk::schema::{
    CallToolResult, ClientRequest, ListToolsResult, RpcError, TextContent, Tool, ToolInputSchema,
    schema_utils::{NotificationFromClient, RequestFromClient, ResultFromServer},
};
use rust_mcp_sdk::{
    McpServer,
    mcp_server::{ServerHandlerCore, enforce_compatible_protocol_version},
};
use serde::Serialize;
use serde_json::{Map as JsonMap, Value as JsonValue, json};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::codegen::{self, CodeRequest, Language};
use crate::endpoints;
use crate::error::FormError;
use crate::form::{FieldPath, FormState, ValidationMode};
use crate::schema::{SchemaCatalog, filter_for_answers};
use crate::services::{
    AuditLog, Credentials, MockServerDirectory, ParseOutcome, ScriptRunner, TokenProvider,
    UseCaseParser,
};
use crate::wizard::{AnswerSet, WizardSession, next_question, progress, resolve_endpoint};

const NO_ENDPOINT: &str = "could not determine endpoint";
const NO_CREDENTIALS: &str = "client credentials not configured";
const DEFAULT_MOCK_NAME: &str = "Default Mock Server";
pub const DEFAULT_MAX_SESSIONS: usize = 256;

/// Runtime knobs resolved from env and `config.toml`.
#[derive(Debug, Clone)]
pub struct HandlerSettings {
    pub validation_mode: ValidationMode,
    pub default_mock_url: String,
    pub auth_base_url: String,
    pub credentials: Option<Credentials>,
    pub enable_run_script: bool,
    /// Open wizard sessions kept before the least recently used is evicted.
    pub max_sessions: usize,
}

impl Default for HandlerSettings {
    fn default() -> Self {
        Self {
            validation_mode: ValidationMode::default(),
            default_mock_url: codegen::DEFAULT_MOCK_URL.to_string(),
            auth_base_url: codegen::DEFAULT_AUTH_BASE_URL.to_string(),
            credentials: None,
            enable_run_script: false,
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }
}

/// Outbound collaborators.
#[derive(Clone)]
pub struct Services {
    pub tokens: Arc<dyn TokenProvider>,
    pub parser: Arc<dyn UseCaseParser>,
    pub mocks: Arc<dyn MockServerDirectory>,
    pub runner: Arc<dyn ScriptRunner>,
}

struct Session {
    wizard: WizardSession,
    /// Present once the wizard resolves an endpoint.
    form: Option<(&'static str, FormState)>,
    last_used: Instant,
}

impl Session {
    fn new() -> Self {
        Self {
            wizard: WizardSession::default(),
            form: None,
            last_used: Instant::now(),
        }
    }
}

#[derive(Serialize)]
struct FormView<'a> {
    endpoint: &'a str,
    values: &'a JsonValue,
    selections: BTreeMap<String, String>,
}

struct ToolSpec {
    name: &'static str,
    description: &'static str,
    /// (name, JSON type or None for any, description, required)
    params: &'static [(&'static str, Option<&'static str>, &'static str, bool)],
}

const SESSION_ID: (&str, Option<&str>, &str, bool) = (
    "session_id",
    Some("string"),
    "Session id returned by wizard_start",
    true,
);
const FIELD_PATH: (&str, Option<&str>, &str, bool) = (
    "path",
    None,
    "Field path, e.g. \"recipientAddressSource[0].addressId\" or [\"items\", 0, \"documentId\"]",
    true,
);

const TOOLS: &[ToolSpec] = &[
    ToolSpec {
        name: "wizard_start",
        description: "Start a wizard session and return the first question.",
        params: &[],
    },
    ToolSpec {
        name: "wizard_select",
        description: "Select an option for the current question without committing it.",
        params: &[
            SESSION_ID,
            ("value", Some("string"), "Option value", true),
        ],
    },
    ToolSpec {
        name: "wizard_confirm",
        description: "Commit the selected option and advance to the next question.",
        params: &[SESSION_ID],
    },
    ToolSpec {
        name: "wizard_back",
        description: "Undo the latest answer; it becomes the pending selection again.",
        params: &[SESSION_ID],
    },
    ToolSpec {
        name: "wizard_state",
        description: "Current question, answers, progress and resolved endpoint.",
        params: &[SESSION_ID],
    },
    ToolSpec {
        name: "wizard_reset",
        description: "Clear every answer and the parameter form, back to the first question.",
        params: &[SESSION_ID],
    },
    ToolSpec {
        name: "wizard_end",
        description: "Close a wizard session and release its state.",
        params: &[SESSION_ID],
    },
    ToolSpec {
        name: "resolve_endpoint",
        description: "Resolve an endpoint from a complete answer set (stateless).",
        params: &[(
            "answers",
            Some("object"),
            "Map of question id to option value",
            true,
        )],
    },
    ToolSpec {
        name: "endpoint_parameters",
        description: "Parameter schema for an endpoint, filtered by answers, plus default values.",
        params: &[
            ("endpoint", Some("string"), "Endpoint path, e.g. /jobs/single-doc", true),
            ("answers", Some("object"), "Wizard answers used to hide template-supplied fields", false),
        ],
    },
    ToolSpec {
        name: "form_set_value",
        description: "Set a value in the session's parameter form.",
        params: &[SESSION_ID, FIELD_PATH, ("value", None, "New value", true)],
    },
    ToolSpec {
        name: "form_select_variant",
        description: "Choose a oneOf variant. Values under the field are reset.",
        params: &[
            SESSION_ID,
            FIELD_PATH,
            ("variant", Some("string"), "Variant value", true),
        ],
    },
    ToolSpec {
        name: "form_add_item",
        description: "Append an item to an array field.",
        params: &[SESSION_ID, FIELD_PATH],
    },
    ToolSpec {
        name: "form_remove_item",
        description: "Remove an item from an array field.",
        params: &[
            SESSION_ID,
            FIELD_PATH,
            ("index", Some("integer"), "Item index", true),
        ],
    },
    ToolSpec {
        name: "build_payload",
        description: "Validate the form and return the normalized request payload.",
        params: &[
            SESSION_ID,
            ("mode", Some("string"), "\"advisory\" or \"blocking\"", false),
        ],
    },
    ToolSpec {
        name: "generate_code",
        description: "Generate a Python, JavaScript or curl client for an endpoint.",
        params: &[
            ("language", Some("string"), "python, javascript or curl", true),
            ("session_id", Some("string"), "Use this session's endpoint and payload", false),
            ("endpoint", Some("string"), "Endpoint path when no session is given", false),
            ("payload", Some("object"), "Request body; defaults to the endpoint example", false),
            ("base_url", Some("string"), "API base URL; defaults to the mock server", false),
            ("include_auth", Some("boolean"), "Include the token exchange (default true)", false),
        ],
    },
    ToolSpec {
        name: "suggest_answers",
        description: "Suggest wizard answers for a plain-language use case.",
        params: &[
            ("use_case", Some("string"), "What you want to mail", true),
            ("session_id", Some("string"), "Prefill this session with the suggestions", false),
        ],
    },
    ToolSpec {
        name: "ai_feedback",
        description: "Rate the latest suggestion and return suggestion accuracy.",
        params: &[
            ("helpful", Some("boolean"), "Whether the suggestion helped", true),
            ("comment", Some("string"), "Optional comment", false),
        ],
    },
    ToolSpec {
        name: "list_mock_servers",
        description: "List Postman mock servers usable as a base URL.",
        params: &[],
    },
    ToolSpec {
        name: "get_access_token",
        description: "Short-term access token, reused from cache until it nears expiry.",
        params: &[
            ("client_id", Some("string"), "Defaults to the configured client id", false),
            ("client_secret", Some("string"), "Defaults to the configured secret", false),
        ],
    },
    ToolSpec {
        name: "revoke_token",
        description: "Revoke a token and drop every cached token.",
        params: &[
            ("token_id", Some("string"), "Id of the token to revoke", true),
            ("token", Some("string"), "Bearer token authorizing the revocation", true),
        ],
    },
    ToolSpec {
        name: "test_auth_connection",
        description: "Check client credentials by requesting a long-term token.",
        params: &[
            ("client_id", Some("string"), "Defaults to the configured client id", false),
            ("client_secret", Some("string"), "Defaults to the configured secret", false),
        ],
    },
    ToolSpec {
        name: "run_script",
        description: "Run generated code locally and capture its output.",
        params: &[
            ("language", Some("string"), "python, javascript or curl", true),
            ("code", Some("string"), "Script source", true),
        ],
    },
];

fn invalid(e: impl Display) -> RpcError {
    RpcError::invalid_params().with_message(e.to_string())
}

fn text_result(payload: JsonValue) -> CallToolResult {
    CallToolResult::text_content(vec![TextContent::from(payload.to_string())])
}

fn str_arg<'a>(args: &'a JsonMap<String, JsonValue>, key: &str) -> Result<&'a str, RpcError> {
    args.get(key)
        .and_then(JsonValue::as_str)
        .ok_or_else(|| invalid(format!("missing required '{key}' string")))
}

fn opt_str<'a>(args: &'a JsonMap<String, JsonValue>, key: &str) -> Option<&'a str> {
    args.get(key).and_then(JsonValue::as_str)
}

fn path_arg(args: &JsonMap<String, JsonValue>) -> Result<FieldPath, RpcError> {
    let v = args
        .get("path")
        .ok_or_else(|| invalid("missing required 'path'"))?;
    FieldPath::from_json(v).map_err(invalid)
}

fn answers_arg(args: &JsonMap<String, JsonValue>, key: &str) -> Result<AnswerSet, RpcError> {
    match args.get(key) {
        None | Some(JsonValue::Null) => Ok(AnswerSet::new()),
        Some(JsonValue::Object(m)) => AnswerSet::from_json(m).map_err(invalid),
        Some(_) => Err(invalid(format!("'{key}' must be an object"))),
    }
}

fn session_id(args: &JsonMap<String, JsonValue>) -> Result<Uuid, RpcError> {
    let raw = str_arg(args, "session_id")?;
    Uuid::parse_str(raw).map_err(|_| invalid(format!("invalid session_id '{raw}'")))
}

fn to_json(v: impl Serialize) -> Result<JsonValue, RpcError> {
    serde_json::to_value(v).map_err(|e| RpcError::internal_error().with_message(e.to_string()))
}

/// Routes MCP requests to the wizard, form and collaborator layers.
pub struct Click2EndpointHandler {
    catalog: SchemaCatalog,
    settings: HandlerSettings,
    services: Services,
    sessions: Mutex<HashMap<Uuid, Session>>,
    audit: Mutex<AuditLog>,
}

impl Click2EndpointHandler {
    pub fn new(catalog: SchemaCatalog, settings: HandlerSettings, services: Services) -> Self {
        tracing::debug!(
            "initialized Click2EndpointHandler (schemas={}, run_script={})",
            catalog.len(),
            settings.enable_run_script
        );
        Self {
            catalog,
            settings,
            services,
            sessions: Mutex::new(HashMap::new()),
            audit: Mutex::new(AuditLog::new()),
        }
    }

    fn tool_enabled(&self, name: &str) -> bool {
        name != "run_script" || self.settings.enable_run_script
    }

    /// Build the list of tool definitions exposed by this server.
    fn tool_definitions(&self) -> Vec<Tool> {
        TOOLS
            .iter()
            .filter(|t| self.tool_enabled(t.name))
            .map(|t| {
                let mut props = HashMap::<String, JsonMap<String, JsonValue>>::new();
                let mut required = Vec::new();
                for (name, kind, description, is_required) in t.params {
                    let mut schema = JsonMap::new();
                    if let Some(kind) = kind {
                        schema.insert("type".to_string(), JsonValue::String(kind.to_string()));
                    }
                    schema.insert(
                        "description".to_string(),
                        JsonValue::String(description.to_string()),
                    );
                    props.insert(name.to_string(), schema);
                    if *is_required {
                        required.push(name.to_string());
                    }
                }
                Tool {
                    annotations: None,
                    description: Some(t.description.to_string()),
                    input_schema: ToolInputSchema::new(required, Some(props)),
                    meta: None,
                    name: t.name.to_string(),
                    output_schema: None,
                    title: None,
                }
            })
            .collect()
    }

    /// Dispatch one tool call. `Err` is reserved for protocol-level failures;
    /// collaborator failures are reported inside the JSON result.
    pub async fn call_tool(
        &self,
        tool: &str,
        args: &JsonMap<String, JsonValue>,
    ) -> Result<JsonValue, RpcError> {
        if !self.tool_enabled(tool) {
            return Err(RpcError::method_not_found()
                .with_message(format!("Tool '{tool}' is disabled")));
        }
        match tool {
            "wizard_start" => self.wizard_start().await,
            "wizard_select" => {
                let value = str_arg(args, "value")?;
                self.with_session(args, |s| {
                    s.wizard.select(value).map_err(invalid)?;
                    Ok(session_json(s))
                })
                .await
            }
            "wizard_confirm" => self.wizard_confirm(args).await,
            "wizard_back" => {
                self.with_session(args, |s| {
                    s.wizard.back().map_err(invalid)?;
                    s.form = None;
                    Ok(session_json(s))
                })
                .await
            }
            "wizard_state" => self.with_session(args, |s| Ok(session_json(s))).await,
            "wizard_reset" => {
                self.with_session(args, |s| {
                    s.wizard.reset();
                    s.form = None;
                    Ok(session_json(s))
                })
                .await
            }
            "wizard_end" => {
                let id = session_id(args)?;
                let mut sessions = self.sessions.lock().await;
                if sessions.remove(&id).is_none() {
                    return Err(invalid(format!("unknown session '{id}'")));
                }
                tracing::info!("wizard session {} ended (open={})", id, sessions.len());
                Ok(json!({ "sessionId": id.to_string(), "ended": true }))
            }
            "resolve_endpoint" => {
                let answers = answers_arg(args, "answers")?;
                Ok(match resolve_endpoint(&answers) {
                    Some(path) => json!({
                        "endpoint": path,
                        "description": endpoints::lookup(path).map(|e| e.description),
                        "progress": progress(&answers),
                    }),
                    None => json!({
                        "endpoint": null,
                        "error": NO_ENDPOINT,
                        "nextQuestion": next_question(&answers).map(|q| q.as_str()),
                        "progress": progress(&answers),
                    }),
                })
            }
            "endpoint_parameters" => {
                let endpoint = str_arg(args, "endpoint")?;
                let answers = answers_arg(args, "answers")?;
                let fields = filter_for_answers(self.catalog.fields(endpoint), &answers);
                let form = FormState::new(fields);
                Ok(json!({
                    "endpoint": endpoint,
                    "descriptor": endpoints::lookup(endpoint),
                    "fields": to_json(form.fields())?,
                    "defaults": form.values(),
                }))
            }
            "form_set_value" => {
                let path = path_arg(args)?;
                let value = args
                    .get("value")
                    .cloned()
                    .ok_or_else(|| invalid("missing required 'value'"))?;
                self.with_form(args, |form| form.set_value(&path, value)).await
            }
            "form_select_variant" => {
                let path = path_arg(args)?;
                let variant = str_arg(args, "variant")?;
                self.with_form(args, |form| form.select_variant(&path, variant))
                    .await
            }
            "form_add_item" => {
                let path = path_arg(args)?;
                self.with_form(args, |form| form.add_item(&path).map(|_| ()))
                    .await
            }
            "form_remove_item" => {
                let path = path_arg(args)?;
                let index = args
                    .get("index")
                    .and_then(JsonValue::as_u64)
                    .ok_or_else(|| invalid("missing required 'index' integer"))?;
                self.with_form(args, |form| form.remove_item(&path, index as usize))
                    .await
            }
            "build_payload" => self.build_payload(args).await,
            "generate_code" => self.generate_code(args).await,
            "suggest_answers" => self.suggest_answers(args).await,
            "ai_feedback" => {
                let helpful = args
                    .get("helpful")
                    .and_then(JsonValue::as_bool)
                    .ok_or_else(|| invalid("missing required 'helpful' boolean"))?;
                let comment = opt_str(args, "comment").map(str::to_string);
                let mut audit = self.audit.lock().await;
                let recorded = audit.update_latest_feedback(helpful, comment);
                Ok(json!({ "recorded": recorded, "stats": audit.accuracy() }))
            }
            "list_mock_servers" => self.list_mock_servers().await,
            "get_access_token" => self.get_access_token(args).await,
            "revoke_token" => {
                let token_id = str_arg(args, "token_id")?;
                let token = str_arg(args, "token")?;
                match self.services.tokens.revoke_token(token_id, token).await {
                    Ok(()) => Ok(json!({ "ok": true, "revoked": token_id })),
                    Err(e) => {
                        tracing::error!("token revocation failed: {}", e);
                        Ok(json!({ "ok": false, "error": e.to_string() }))
                    }
                }
            }
            "test_auth_connection" => match self.credentials(args) {
                Some(creds) => to_json(self.services.tokens.test_connection(&creds).await),
                None => Ok(json!({ "success": false, "message": NO_CREDENTIALS })),
            },
            "run_script" => {
                let lang: Language = str_arg(args, "language")?.parse().map_err(invalid)?;
                let code = str_arg(args, "code")?;
                match self.services.runner.run(lang, code).await {
                    Ok(out) => to_json(out),
                    Err(e) => {
                        tracing::error!("script run failed: {}", e);
                        Ok(json!({ "ok": false, "error": e.to_string() }))
                    }
                }
            }
            _ => Err(RpcError::method_not_found().with_message(format!("Unknown tool '{tool}'"))),
        }
    }

    async fn wizard_start(&self) -> Result<JsonValue, RpcError> {
        let id = Uuid::new_v4();
        let session = Session::new();
        let mut out = session_json(&session);
        out["sessionId"] = JsonValue::String(id.to_string());
        let mut sessions = self.sessions.lock().await;
        while sessions.len() >= self.settings.max_sessions.max(1) {
            let Some(idle) = sessions
                .iter()
                .min_by_key(|(_, s)| s.last_used)
                .map(|(id, _)| *id)
            else {
                break;
            };
            sessions.remove(&idle);
            tracing::info!("evicted least recently used wizard session {}", idle);
        }
        sessions.insert(id, session);
        tracing::info!("wizard session {} started (open={})", id, sessions.len());
        Ok(out)
    }

    async fn wizard_confirm(
        &self,
        args: &JsonMap<String, JsonValue>,
    ) -> Result<JsonValue, RpcError> {
        let catalog = &self.catalog;
        let (out, finished) = self
            .with_session(args, |s| {
                s.wizard.confirm().map_err(invalid)?;
                let finished = match s.wizard.endpoint() {
                    Some(path) if s.wizard.is_complete() => {
                        let fields = filter_for_answers(catalog.fields(path), s.wizard.answers());
                        s.form = Some((path, FormState::new(fields)));
                        let answers: BTreeMap<String, String> = s
                            .wizard
                            .answers()
                            .iter()
                            .map(|(q, v)| (q.to_string(), v.to_string()))
                            .collect();
                        Some((path, answers))
                    }
                    _ => None,
                };
                Ok((session_json(s), finished))
            })
            .await?;
        if let Some((path, answers)) = finished {
            tracing::info!("wizard resolved endpoint {}", path);
            self.audit.lock().await.record_selection(path, answers);
        }
        Ok(out)
    }

    async fn build_payload(&self, args: &JsonMap<String, JsonValue>) -> Result<JsonValue, RpcError> {
        let mode = match opt_str(args, "mode") {
            Some(m) => m.parse().map_err(invalid)?,
            None => self.settings.validation_mode,
        };
        self.with_session(args, |s| {
            let (endpoint, form) = s.form.as_ref().ok_or_else(|| invalid(NO_ENDPOINT))?;
            Ok(payload_json(endpoint, form, mode))
        })
        .await
    }

    async fn generate_code(&self, args: &JsonMap<String, JsonValue>) -> Result<JsonValue, RpcError> {
        let lang: Language = str_arg(args, "language")?.parse().map_err(invalid)?;
        let (path, payload) = match opt_str(args, "session_id") {
            Some(_) => {
                self.with_session(args, |s| {
                    let (endpoint, form) = s.form.as_ref().ok_or_else(|| invalid(NO_ENDPOINT))?;
                    let report = form
                        .build_payload(self.settings.validation_mode)
                        .map_err(invalid)?;
                    Ok((*endpoint, Some(report.payload)))
                })
                .await?
            }
            None => (str_arg(args, "endpoint")?, args.get("payload").cloned()),
        };
        let Some(descriptor) = endpoints::lookup(path) else {
            return Ok(json!({ "endpoint": null, "error": NO_ENDPOINT }));
        };
        let mut req = CodeRequest::new(descriptor);
        req.payload = payload.as_ref();
        req.base_url = opt_str(args, "base_url").unwrap_or(&self.settings.default_mock_url);
        req.auth_base_url = &self.settings.auth_base_url;
        req.include_auth = args
            .get("include_auth")
            .and_then(JsonValue::as_bool)
            .unwrap_or(true);
        let code = codegen::render(lang, &req);
        tracing::info!("generated {} client for {} ({} bytes)", lang, path, code.len());
        Ok(json!({
            "endpoint": path,
            "language": lang,
            "filename": codegen::download_filename(path, lang),
            "code": code,
        }))
    }

    async fn suggest_answers(
        &self,
        args: &JsonMap<String, JsonValue>,
    ) -> Result<JsonValue, RpcError> {
        let use_case = str_arg(args, "use_case")?;
        let outcome = match self.services.parser.parse(use_case).await {
            Ok(o) => o,
            Err(e) => {
                tracing::warn!("use case parsing failed: {}", e);
                return to_json(ParseOutcome::failure(&e));
            }
        };
        self.audit
            .lock()
            .await
            .record_suggestion(use_case, outcome.clone());
        let mut out = to_json(&outcome)?;
        if opt_str(args, "session_id").is_some() {
            let applied = self
                .with_session(args, |s| {
                    let applied = s.wizard.prefill(
                        outcome
                            .suggested_answers
                            .iter()
                            .map(|(k, v)| (k.as_str(), v.as_str())),
                    );
                    Ok(applied.iter().map(|q| q.as_str()).collect::<Vec<_>>())
                })
                .await?;
            out["prefilled"] = json!(applied);
        }
        Ok(out)
    }

    async fn list_mock_servers(&self) -> Result<JsonValue, RpcError> {
        let default = json!([{
            "name": DEFAULT_MOCK_NAME,
            "url": self.settings.default_mock_url,
        }]);
        Ok(match self.services.mocks.list().await {
            Ok(Some(servers)) if !servers.is_empty() => json!({ "servers": servers, "fallback": false }),
            Ok(_) => json!({ "servers": default, "fallback": true }),
            Err(e) => {
                tracing::warn!("mock server discovery failed: {}", e);
                json!({ "servers": default, "fallback": true, "error": e.to_string() })
            }
        })
    }

    /// Credentials from the call arguments, falling back to the configured pair.
    fn credentials(&self, args: &JsonMap<String, JsonValue>) -> Option<Credentials> {
        let configured = self.settings.credentials.as_ref();
        let client_id = opt_str(args, "client_id").or(configured.map(|c| c.client_id.as_str()))?;
        let client_secret =
            opt_str(args, "client_secret").or(configured.map(|c| c.client_secret.as_str()))?;
        Some(Credentials {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        })
    }

    async fn get_access_token(
        &self,
        args: &JsonMap<String, JsonValue>,
    ) -> Result<JsonValue, RpcError> {
        let Some(creds) = self.credentials(args) else {
            return Ok(json!({ "ok": false, "error": NO_CREDENTIALS }));
        };
        match self.services.tokens.obtain_token(&creds).await {
            Ok(token) => Ok(json!({ "ok": true, "token": token })),
            Err(e) => {
                tracing::error!("token exchange failed: {}", e);
                Ok(json!({ "ok": false, "error": e.to_string() }))
            }
        }
    }

    async fn with_session<T>(
        &self,
        args: &JsonMap<String, JsonValue>,
        f: impl FnOnce(&mut Session) -> Result<T, RpcError>,
    ) -> Result<T, RpcError> {
        let id = session_id(args)?;
        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .get_mut(&id)
            .ok_or_else(|| invalid(format!("unknown session '{id}'")))?;
        session.last_used = Instant::now();
        f(session)
    }

    async fn with_form(
        &self,
        args: &JsonMap<String, JsonValue>,
        f: impl FnOnce(&mut FormState) -> Result<(), FormError>,
    ) -> Result<JsonValue, RpcError> {
        self.with_session(args, |s| {
            let (endpoint, form) = s.form.as_mut().ok_or_else(|| invalid(NO_ENDPOINT))?;
            f(form).map_err(invalid)?;
            to_json(FormView {
                endpoint: *endpoint,
                values: form.values(),
                selections: form.selections(),
            })
        })
        .await
    }
}

fn session_json(s: &Session) -> JsonValue {
    let mut out = serde_json::to_value(s.wizard.view()).unwrap_or_default();
    if let Some((_, form)) = &s.form {
        out["form"] = json!({ "values": form.values(), "selections": form.selections() });
    }
    out
}

fn payload_json(endpoint: &str, form: &FormState, mode: ValidationMode) -> JsonValue {
    match form.build_payload(mode) {
        Ok(report) => json!({
            "ok": true,
            "endpoint": endpoint,
            "method": endpoints::lookup(endpoint).map(|e| e.method.as_str()),
            "payload": report.payload,
            "errors": report.errors,
        }),
        Err(e) => json!({
            "ok": false,
            "endpoint": endpoint,
            "error": e.to_string(),
            "errors": form.validate(),
        }),
    }
}

#[async_trait]
impl ServerHandlerCore for Click2EndpointHandler {
    async fn handle_request(
        &self,
        request: RequestFromClient,
        runtime: &dyn McpServer,
    ) -> std::result::Result<ResultFromServer, RpcError> {
        let method_name = request.method().to_owned();
        tracing::info!("handle_request: method={}", method_name);
        match request {
            RequestFromClient::ClientRequest(client_request) => match client_request {
                ClientRequest::InitializeRequest(initialize_request) => {
                    tracing::debug!(
                        "initialize_request: client_protocol={}",
                        initialize_request.params.protocol_version
                    );
                    let mut server_info = runtime.server_info().to_owned();
                    if let Some(updated_protocol_version) = enforce_compatible_protocol_version(
                        &initialize_request.params.protocol_version,
                        &server_info.protocol_version,
                    )
                    .map_err(|err| {
                        tracing::error!(
                            "incompatible protocol version (client={}, server={})",
                            initialize_request.params.protocol_version,
                            server_info.protocol_version
                        );
                        RpcError::internal_error().with_message(err.to_string())
                    })? {
                        server_info.protocol_version = updated_protocol_version;
                    }
                    tracing::info!("initialized (protocol={})", server_info.protocol_version);
                    Ok(server_info.into())
                }

                ClientRequest::ListToolsRequest(_) => {
                    let tools = self.tool_definitions();
                    tracing::info!("list_tools (count={})", tools.len());
                    Ok(ListToolsResult {
                        meta: None,
                        next_cursor: None,
                        tools,
                    }
                    .into())
                }

                ClientRequest::CallToolRequest(request) => {
                    let tool = request.tool_name().to_string();
                    let args = request.params.arguments.clone().unwrap_or_default();
                    tracing::info!(
                        "call_tool request: tool={}, arg_keys={:?}",
                        tool,
                        args.keys().collect::<Vec<_>>()
                    );
                    let payload = self.call_tool(&tool, &args).await.inspect_err(|e| {
                        tracing::warn!("tool {} rejected: {}", tool, e.message);
                    })?;
                    Ok(text_result(payload).into())
                }

                _ => {
                    tracing::warn!("method not implemented: {}", method_name);
                    Err(RpcError::method_not_found()
                        .with_message(format!("No handler is implemented for '{method_name}'.")))
                }
            },
            RequestFromClient::CustomRequest(_) => {
                tracing::warn!("custom request not implemented");
                Err(RpcError::method_not_found()
                    .with_message("No handler is implemented for custom requests.".to_string()))
            }
        }
    }

    async fn handle_notification(
        &self,
        notification: NotificationFromClient,
        _: &dyn McpServer,
    ) -> std::result::Result<(), RpcError> {
        match &notification {
            NotificationFromClient::ClientNotification(_) => {
                tracing::debug!("handle_notification: client notification")
            }
            NotificationFromClient::CustomNotification(_) => {
                tracing::debug!("handle_notification: custom notification")
            }
        }
        Ok(())
    }

    async fn handle_error(
        &self,
        error: &RpcError,
        _: &dyn McpServer,
    ) -> std::result::Result<(), RpcError> {
        tracing::error!(
            "handle_error from client (code={:?}, message={:?})",
            error.code,
            error.message
        );
        Ok(())
    }
}
