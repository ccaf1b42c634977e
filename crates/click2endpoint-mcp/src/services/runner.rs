//! Execute a generated snippet locally and capture its output.

use std::io::Write;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::codegen::Language;
use crate::error::ServiceError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-stream cap on captured output.
pub const MAX_OUTPUT_BYTES: usize = 64 * 1024;

const PIP_HINT: &str =
    "\n\nTo fix this error, install the required Python packages:\npip3 install -r requirements.txt";

/// Captured result of one script run. A nonzero exit is not an error.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutput {
    pub ok: bool,
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

#[async_trait]
pub trait ScriptRunner: Send + Sync {
    /// Errors represent launch failures and timeouts only.
    async fn run(&self, lang: Language, code: &str) -> Result<RunOutput, ServiceError>;
}

/// Runs `python3`, `node` or `bash` on a temp file.
pub struct ProcessScriptRunner {
    timeout: Duration,
}

impl ProcessScriptRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for ProcessScriptRunner {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

fn interpreter(lang: Language) -> &'static str {
    match lang {
        Language::Python => "python3",
        Language::Javascript => "node",
        Language::Curl => "bash",
    }
}

fn script_body(lang: Language, code: &str) -> String {
    if lang == Language::Curl && !code.starts_with("#!") {
        format!("#!/bin/bash\n{code}")
    } else {
        code.to_string()
    }
}

fn truncate(mut s: String) -> String {
    if s.len() <= MAX_OUTPUT_BYTES {
        return s;
    }
    let mut cut = MAX_OUTPUT_BYTES;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    let dropped = s.len() - cut;
    s.truncate(cut);
    s.push_str(&format!("\n... [{dropped} bytes truncated]"));
    s
}

/// Append an install hint when Python could not import `requests`.
fn with_hint(stderr: String) -> String {
    if stderr.contains("ModuleNotFoundError") && stderr.contains("requests") {
        stderr + PIP_HINT
    } else {
        stderr
    }
}

#[async_trait]
impl ScriptRunner for ProcessScriptRunner {
    async fn run(&self, lang: Language, code: &str) -> Result<RunOutput, ServiceError> {
        let mut file = tempfile::Builder::new()
            .prefix("c2m-")
            .suffix(&format!(".{}", lang.extension()))
            .tempfile()?;
        file.write_all(script_body(lang, code).as_bytes())?;
        file.flush()?;
        let path = file.path().to_path_buf();

        let program = interpreter(lang);
        tracing::info!("running {} script {}", program, path.display());
        let child = tokio::process::Command::new(program)
            .arg(&path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;
        let out = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| ServiceError::Timeout("script", self.timeout))??;

        let status = out.status.code().unwrap_or(-1);
        let ok = out.status.success();
        let stdout = truncate(String::from_utf8_lossy(&out.stdout).into_owned());
        let mut stderr = truncate(String::from_utf8_lossy(&out.stderr).into_owned());
        if !ok {
            stderr = with_hint(stderr);
        }
        tracing::info!(
            "script finished: ok={}, status={}, stdout_len={}, stderr_len={}",
            ok,
            status,
            stdout.len(),
            stderr.len()
        );
        Ok(RunOutput {
            ok,
            status,
            stdout,
            stderr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pip_hint_only_for_missing_requests() {
        let e = "ModuleNotFoundError: No module named 'requests'".to_string();
        assert!(with_hint(e).ends_with("pip3 install -r requirements.txt"));
        let other = "ModuleNotFoundError: No module named 'yaml'".to_string();
        assert_eq!(with_hint(other.clone()), other);
    }

    #[test]
    fn long_output_is_truncated_on_a_char_boundary() {
        let s = "é".repeat(MAX_OUTPUT_BYTES);
        let out = truncate(s);
        assert!(out.ends_with(&format!("[{} bytes truncated]", MAX_OUTPUT_BYTES)));
        assert!(out.len() < MAX_OUTPUT_BYTES + 40);
        assert_eq!(truncate("short".into()), "short");
    }

    #[test]
    fn curl_scripts_get_a_shebang() {
        assert_eq!(script_body(Language::Curl, "curl x"), "#!/bin/bash\ncurl x");
        assert_eq!(
            script_body(Language::Curl, "#!/bin/bash\necho"),
            "#!/bin/bash\necho"
        );
        assert_eq!(script_body(Language::Python, "print(1)"), "print(1)");
    }

    #[tokio::test]
    async fn bash_script_output_is_captured() {
        let runner = ProcessScriptRunner::default();
        let out = runner
            .run(Language::Curl, "echo hello\necho oops >&2\nexit 3")
            .await
            .unwrap();
        assert!(!out.ok);
        assert_eq!(out.status, 3);
        assert_eq!(out.stdout.trim(), "hello");
        assert_eq!(out.stderr.trim(), "oops");
    }

    #[tokio::test]
    async fn slow_scripts_time_out() {
        let runner = ProcessScriptRunner::new(Duration::from_millis(200));
        let err = runner.run(Language::Curl, "sleep 5").await.unwrap_err();
        assert!(matches!(err, ServiceError::Timeout("script", _)));
    }
}
