//! Runnable client snippets for a resolved endpoint.
//!
//! Each renderer prints the outgoing request and the response, optionally
//! runs the two-step token flow first, then submits the payload.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::endpoints::EndpointDescriptor;

pub const DEFAULT_AUTH_BASE_URL: &str = "https://j0dos52r5e.execute-api.us-east-1.amazonaws.com/dev";
pub const DEFAULT_MOCK_URL: &str = "https://cd140b74-ed23-4980-834b-a966ac3393c1.mock.pstmn.io";

/// Sandbox credentials accepted by the mock server.
const CLIENT_ID: &str = "test-client-123";
const CLIENT_SECRET: &str = "super-secret-password-123";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    Javascript,
    Curl,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::Python, Language::Javascript, Language::Curl];

    pub fn as_str(self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Javascript => "javascript",
            Language::Curl => "curl",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Language::Python => "py",
            Language::Javascript => "js",
            Language::Curl => "sh",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "python" | "py" => Ok(Language::Python),
            "javascript" | "js" | "node" => Ok(Language::Javascript),
            "curl" | "bash" | "sh" => Ok(Language::Curl),
            other => Err(format!("unsupported language '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CodeRequest<'a> {
    pub endpoint: &'a EndpointDescriptor,
    /// Falls back to the endpoint's example payload.
    pub payload: Option<&'a JsonValue>,
    pub base_url: &'a str,
    pub auth_base_url: &'a str,
    pub include_auth: bool,
}

impl<'a> CodeRequest<'a> {
    pub fn new(endpoint: &'a EndpointDescriptor) -> Self {
        Self {
            endpoint,
            payload: None,
            base_url: DEFAULT_MOCK_URL,
            auth_base_url: DEFAULT_AUTH_BASE_URL,
            include_auth: true,
        }
    }

    fn payload(&self) -> &JsonValue {
        self.payload.unwrap_or(&self.endpoint.payload_example)
    }
}

pub fn render(lang: Language, req: &CodeRequest<'_>) -> String {
    match lang {
        Language::Python => python(req),
        Language::Javascript => javascript(req),
        Language::Curl => curl(req),
    }
}

/// `c2m-api-<path with '/' replaced by '-'>.<ext>`
pub fn download_filename(path: &str, lang: Language) -> String {
    format!("c2m-api-{}.{}", path.replace('/', "-"), lang.extension())
}

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"__[A-Z]+(?:_[A-Z]+)*__").expect("Invalid placeholder regex"));

/// Substitute every `__NAME__` in one pass, so inserted text is never
/// rescanned. Unknown names are left as they are.
///
/// `quote` escapes the base URLs for the string literal they land in.
fn fill(
    template: &str,
    req: &CodeRequest<'_>,
    quote: fn(&str) -> String,
    extra: &[(&str, &str)],
) -> String {
    let base_url = quote(req.base_url.trim_end_matches('/'));
    let auth_base_url = quote(req.auth_base_url.trim_end_matches('/'));
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| {
            let value: &str = match &caps[0] {
                "__PATH__" => req.endpoint.path,
                "__DESCRIPTION__" => req.endpoint.description,
                "__METHOD__" => req.endpoint.method.as_str(),
                "__BASE_URL__" => &base_url,
                "__AUTH_BASE_URL__" => &auth_base_url,
                "__CLIENT_ID__" => CLIENT_ID,
                "__CLIENT_SECRET__" => CLIENT_SECRET,
                name => match extra.iter().find(|(k, _)| *k == name) {
                    Some((_, v)) => v,
                    None => name,
                },
            };
            value.to_string()
        })
        .into_owned()
}

/// Body of a double-quoted Python or JS string literal.
fn json_inner(s: &str) -> String {
    let quoted = JsonValue::String(s.to_string()).to_string();
    quoted[1..quoted.len() - 1].to_string()
}

/// Body of a single-quoted JS string literal.
fn js_single_inner(s: &str) -> String {
    json_inner(s).replace('\'', "\\'")
}

/// Body of a double-quoted shell string.
fn shell_double_inner(s: &str) -> String {
    s.chars()
        .flat_map(|c| match c {
            '\\' | '"' | '$' | '`' => vec!['\\', c],
            _ => vec![c],
        })
        .collect()
}

/// Indent every line after the first.
fn hang(text: &str, indent: usize) -> String {
    let pad = " ".repeat(indent);
    text.lines()
        .enumerate()
        .map(|(i, l)| if i == 0 { l.to_string() } else { format!("{pad}{l}") })
        .collect::<Vec<_>>()
        .join("\n")
}

fn pretty_json(v: &JsonValue) -> String {
    serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
}

/// Python literal for a JSON value (`True`, `False`, `None`).
fn python_literal(v: &JsonValue, depth: usize) -> String {
    let pad = "    ".repeat(depth + 1);
    let close = "    ".repeat(depth);
    match v {
        JsonValue::Null => "None".to_string(),
        JsonValue::Bool(true) => "True".to_string(),
        JsonValue::Bool(false) => "False".to_string(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::String(_) => v.to_string(),
        JsonValue::Array(items) if items.is_empty() => "[]".to_string(),
        JsonValue::Object(map) if map.is_empty() => "{}".to_string(),
        JsonValue::Array(items) => {
            let body: Vec<String> = items
                .iter()
                .map(|i| format!("{pad}{}", python_literal(i, depth + 1)))
                .collect();
            format!("[\n{}\n{close}]", body.join(",\n"))
        }
        JsonValue::Object(map) => {
            let body: Vec<String> = map
                .iter()
                .map(|(k, v)| {
                    format!(
                        "{pad}{}: {}",
                        JsonValue::String(k.clone()),
                        python_literal(v, depth + 1)
                    )
                })
                .collect();
            format!("{{\n{}\n{close}}}", body.join(",\n"))
        }
    }
}

/// Single-quoted shell argument.
fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r#"'"'"'"#))
}

const PYTHON: &str = r#"#!/usr/bin/env python3
"""
C2M API - __PATH__
Description: __DESCRIPTION__
"""
import json
from typing import Any, Dict

import requests

API_BASE_URL = "__BASE_URL__"
AUTH_BASE_URL = "__AUTH_BASE_URL__"

# Sandbox credentials for the mock server; replace for production.
CLIENT_ID = "__CLIENT_ID__"
CLIENT_SECRET = "__CLIENT_SECRET__"


def print_request(method: str, url: str, headers: Dict, body: Any = None):
    print("\n" + "=" * 60)
    print("REQUEST")
    print("=" * 60)
    print(f"{method} {url}")
    print("\nHeaders:")
    for key, value in headers.items():
        print(f"  {key}: {value}")
    if body:
        print("\nBody:")
        print(json.dumps(body, indent=2))


def print_response(response: requests.Response):
    print("\n" + "=" * 60)
    print("RESPONSE")
    print("=" * 60)
    print(f"Status: {response.status_code}")
    print("\nHeaders:")
    for key, value in response.headers.items():
        print(f"  {key}: {value}")
    if response.text:
        print("\nBody:")
        try:
            print(json.dumps(response.json(), indent=2))
        except ValueError:
            print(response.text)


__AUTH_FN__def submit_request(token: str, payload: Dict[str, Any]) -> Dict[str, Any]:
    url = f"{API_BASE_URL}__PATH__"
    headers = {
        "Authorization": f"Bearer {token}",
        "Content-Type": "application/json",
    }
    print("\n📤 SUBMITTING REQUEST TO __PATH__")
    print("=" * 60)
    print_request("__METHOD__", url, headers, payload)
    response = requests.__METHOD_LOWER__(url, json=payload, headers=headers)
    print_response(response)
    response.raise_for_status()
    return response.json()


if __name__ == "__main__":
    try:
        __TOKEN_LINE__
        payload = __PAYLOAD__
        result = submit_request(token, payload)
        print("\n✅ SUCCESS!")
        print("=" * 60)
        print("Job submitted successfully")
    except Exception as e:
        print(f"\n❌ ERROR: {e}")
        exit(1)
"#;

const PYTHON_AUTH: &str = r#"def get_access_token(client_id: str, client_secret: str) -> str:
    print("\n🔐 AUTHENTICATION FLOW")
    print("=" * 60)

    print("\n1. Getting long-term token...")
    url = f"{AUTH_BASE_URL}/auth/tokens/long"
    payload = {
        "grant_type": "client_credentials",
        "client_id": client_id,
        "client_secret": client_secret,
    }
    headers = {"Content-Type": "application/json"}
    print_request("POST", url, headers, payload)
    response = requests.post(url, json=payload, headers=headers)
    print_response(response)
    if response.status_code != 200:
        raise Exception(f"Failed to get long-term token: {response.text}")
    long_term_token = response.json()["access_token"]
    print("\n✅ Long-term token obtained")

    print("\n2. Exchanging for short-term token...")
    url = f"{AUTH_BASE_URL}/auth/tokens/short"
    headers = {
        "Authorization": f"Bearer {long_term_token}",
        "Content-Type": "application/json",
    }
    payload = {"grant_type": "token_exchange"}
    print_request("POST", url, headers, payload)
    response = requests.post(url, json=payload, headers=headers)
    print_response(response)
    if response.status_code != 200:
        raise Exception(f"Failed to get short-term token: {response.text}")
    print("\n✅ Short-term token obtained")
    return response.json()["access_token"]


"#;

fn python(req: &CodeRequest<'_>) -> String {
    let (auth_fn, token_line) = if req.include_auth {
        (PYTHON_AUTH, "token = get_access_token(CLIENT_ID, CLIENT_SECRET)")
    } else {
        ("", "token = \"YOUR_ACCESS_TOKEN\"  # replace with a real token")
    };
    let payload = python_literal(req.payload(), 2);
    let method_lower = req.endpoint.method.as_str().to_ascii_lowercase();
    fill(
        PYTHON,
        req,
        json_inner,
        &[
            ("__AUTH_FN__", auth_fn),
            ("__TOKEN_LINE__", token_line),
            ("__METHOD_LOWER__", method_lower.as_str()),
            ("__PAYLOAD__", payload.as_str()),
        ],
    )
}

const JAVASCRIPT: &str = r#"#!/usr/bin/env node
/**
 * C2M API - __PATH__
 * Description: __DESCRIPTION__
 */

const API_BASE_URL = '__BASE_URL__';
const AUTH_BASE_URL = '__AUTH_BASE_URL__';

// Sandbox credentials for the mock server; replace for production.
const CLIENT_ID = '__CLIENT_ID__';
const CLIENT_SECRET = '__CLIENT_SECRET__';

function printRequest(method, url, headers, body = null) {
  console.log('\n' + '='.repeat(60));
  console.log('REQUEST');
  console.log('='.repeat(60));
  console.log(`${method} ${url}`);
  console.log('\nHeaders:');
  Object.entries(headers).forEach(([key, value]) => console.log(`  ${key}: ${value}`));
  if (body) {
    console.log('\nBody:');
    console.log(JSON.stringify(body, null, 2));
  }
}

function printResponse(response, body) {
  console.log('\n' + '='.repeat(60));
  console.log('RESPONSE');
  console.log('='.repeat(60));
  console.log(`Status: ${response.status}`);
  console.log('\nHeaders:');
  response.headers.forEach((value, key) => console.log(`  ${key}: ${value}`));
  if (body) {
    console.log('\nBody:');
    console.log(JSON.stringify(body, null, 2));
  }
}

async function readBody(response) {
  const text = await response.text();
  try {
    return JSON.parse(text);
  } catch {
    return text;
  }
}

__AUTH_FN__async function submitRequest(token, payload) {
  const url = `${API_BASE_URL}__PATH__`;
  const headers = {
    'Authorization': `Bearer ${token}`,
    'Content-Type': 'application/json'
  };
  console.log('\n📤 SUBMITTING REQUEST TO __PATH__');
  console.log('='.repeat(60));
  printRequest('__METHOD__', url, headers, payload);
  const response = await fetch(url, {
    method: '__METHOD__',
    headers,
    body: JSON.stringify(payload)
  });
  const data = await readBody(response);
  printResponse(response, data);
  if (!response.ok) {
    throw new Error(`Request failed: ${JSON.stringify(data)}`);
  }
  return data;
}

(async () => {
  try {
    __TOKEN_LINE__
    const payload = __PAYLOAD__;
    await submitRequest(token, payload);
    console.log('\n✅ SUCCESS!');
    console.log('='.repeat(60));
    console.log('Job submitted successfully');
  } catch (error) {
    console.error(`\n❌ ERROR: ${error.message}`);
    process.exit(1);
  }
})();
"#;

const JAVASCRIPT_AUTH: &str = r#"async function postJson(url, headers, payload) {
  printRequest('POST', url, headers, payload);
  const response = await fetch(url, {
    method: 'POST',
    headers,
    body: JSON.stringify(payload)
  });
  const data = await readBody(response);
  printResponse(response, data);
  return { response, data };
}

async function getAccessToken(clientId, clientSecret) {
  console.log('\n🔐 AUTHENTICATION FLOW');
  console.log('='.repeat(60));

  console.log('\n1. Getting long-term token...');
  const long = await postJson(
    `${AUTH_BASE_URL}/auth/tokens/long`,
    { 'Content-Type': 'application/json' },
    { grant_type: 'client_credentials', client_id: clientId, client_secret: clientSecret }
  );
  if (!long.response.ok) {
    throw new Error(`Failed to get long-term token: ${JSON.stringify(long.data)}`);
  }
  console.log('\n✅ Long-term token obtained');

  console.log('\n2. Exchanging for short-term token...');
  const short = await postJson(
    `${AUTH_BASE_URL}/auth/tokens/short`,
    { 'Authorization': `Bearer ${long.data.access_token}`, 'Content-Type': 'application/json' },
    { grant_type: 'token_exchange' }
  );
  if (!short.response.ok) {
    throw new Error(`Failed to get short-term token: ${JSON.stringify(short.data)}`);
  }
  console.log('\n✅ Short-term token obtained');
  return short.data.access_token;
}

"#;

fn javascript(req: &CodeRequest<'_>) -> String {
    let (auth_fn, token_line) = if req.include_auth {
        (
            JAVASCRIPT_AUTH,
            "const token = await getAccessToken(CLIENT_ID, CLIENT_SECRET);",
        )
    } else {
        ("", "const token = 'YOUR_ACCESS_TOKEN'; // replace with a real token")
    };
    let payload = hang(&pretty_json(req.payload()), 4);
    fill(
        JAVASCRIPT,
        req,
        js_single_inner,
        &[
            ("__AUTH_FN__", auth_fn),
            ("__TOKEN_LINE__", token_line),
            ("__PAYLOAD__", payload.as_str()),
        ],
    )
}

const CURL_DIRECT: &str = r#"# Direct API call (requires a valid token)
curl -X __METHOD__ \
  __URL__ \
  -H 'Authorization: Bearer YOUR_ACCESS_TOKEN' \
  -H 'Content-Type: application/json' \
  -d __PAYLOAD__
"#;

const CURL_SCRIPT: &str = r#"#!/bin/bash
# C2M API - __PATH__
# Description: __DESCRIPTION__

API_BASE_URL="__BASE_URL__"
AUTH_BASE_URL="__AUTH_BASE_URL__"

# Sandbox credentials for the mock server
CLIENT_ID="__CLIENT_ID__"
CLIENT_SECRET="__CLIENT_SECRET__"

extract_token() {
  grep -o '"access_token" *: *"[^"]*' | sed 's/.*"//'
}

echo "🔐 AUTHENTICATION FLOW"
echo "======================================"

echo ""
echo "1. Getting long-term token..."
LONG_TERM_RESPONSE=$(curl -s -X POST \
  "$AUTH_BASE_URL/auth/tokens/long" \
  -H 'Content-Type: application/json' \
  -d '{"grant_type": "client_credentials", "client_id": "'"$CLIENT_ID"'", "client_secret": "'"$CLIENT_SECRET"'"}')
echo "Response: $LONG_TERM_RESPONSE"
LONG_TERM_TOKEN=$(echo "$LONG_TERM_RESPONSE" | extract_token)
if [ -z "$LONG_TERM_TOKEN" ]; then
  echo "❌ Failed to get long-term token"
  exit 1
fi
echo "✅ Long-term token obtained"

echo ""
echo "2. Exchanging for short-term token..."
SHORT_TERM_RESPONSE=$(curl -s -X POST \
  "$AUTH_BASE_URL/auth/tokens/short" \
  -H "Authorization: Bearer $LONG_TERM_TOKEN" \
  -H 'Content-Type: application/json' \
  -d '{"grant_type": "token_exchange"}')
echo "Response: $SHORT_TERM_RESPONSE"
SHORT_TERM_TOKEN=$(echo "$SHORT_TERM_RESPONSE" | extract_token)
if [ -z "$SHORT_TERM_TOKEN" ]; then
  echo "❌ Failed to get short-term token"
  exit 1
fi
echo "✅ Short-term token obtained"

echo ""
echo "📤 SUBMITTING REQUEST TO __PATH__"
echo "======================================"
curl -X __METHOD__ \
  "$API_BASE_URL__PATH__" \
  -H "Authorization: Bearer $SHORT_TERM_TOKEN" \
  -H 'Content-Type: application/json' \
  -d __PAYLOAD__

echo ""
echo "✅ Request submitted"
"#;

fn curl(req: &CodeRequest<'_>) -> String {
    let payload = shell_quote(&pretty_json(req.payload()));
    if req.include_auth {
        return fill(
            CURL_SCRIPT,
            req,
            shell_double_inner,
            &[("__PAYLOAD__", payload.as_str())],
        );
    }
    let url = shell_quote(&format!(
        "{}{}",
        req.base_url.trim_end_matches('/'),
        req.endpoint.path
    ));
    fill(
        CURL_DIRECT,
        req,
        shell_double_inner,
        &[("__URL__", url.as_str()), ("__PAYLOAD__", payload.as_str())],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoints::{self, paths};
    use serde_json::json;

    fn single_doc() -> &'static EndpointDescriptor {
        endpoints::lookup(paths::SINGLE_DOC).unwrap()
    }

    #[test]
    fn filenames_follow_path() {
        assert_eq!(
            download_filename(paths::SINGLE_DOC, Language::Python),
            "c2m-api--jobs-single-doc.py"
        );
        assert_eq!(
            download_filename(paths::MULTI_DOC_MERGE, Language::Curl),
            "c2m-api--jobs-multi-doc-merge.sh"
        );
    }

    #[test]
    fn python_embeds_payload_and_auth_flow() {
        let payload = json!({"documentSourceIdentifier": {"documentId": "doc_1"}, "color": false, "note": null});
        let req = CodeRequest {
            payload: Some(&payload),
            ..CodeRequest::new(single_doc())
        };
        let code = render(Language::Python, &req);
        assert!(code.contains("url = f\"{API_BASE_URL}/jobs/single-doc\""));
        assert!(code.contains("requests.post(url, json=payload, headers=headers)"));
        assert!(code.contains("\"documentId\": \"doc_1\""));
        assert!(code.contains("\"color\": False"));
        assert!(code.contains("\"note\": None"));
        assert!(code.contains("/auth/tokens/long"));
        assert!(code.contains("token = get_access_token(CLIENT_ID, CLIENT_SECRET)"));
        assert!(code.contains(DEFAULT_MOCK_URL));
        assert!(!code.contains("__PAYLOAD__") && !code.contains("__METHOD"));
    }

    #[test]
    fn without_auth_uses_placeholder_token() {
        let req = CodeRequest {
            include_auth: false,
            ..CodeRequest::new(single_doc())
        };
        let py = render(Language::Python, &req);
        assert!(!py.contains("def get_access_token"));
        assert!(py.contains("YOUR_ACCESS_TOKEN"));
        let js = render(Language::Javascript, &req);
        assert!(!js.contains("getAccessToken"));
        assert!(js.contains("fetch(url"));
    }

    #[test]
    fn curl_direct_call_escapes_quotes() {
        let payload = json!({"note": "it's"});
        let req = CodeRequest {
            payload: Some(&payload),
            include_auth: false,
            base_url: "http://localhost:4010/",
            ..CodeRequest::new(single_doc())
        };
        let code = render(Language::Curl, &req);
        assert!(code.starts_with("# Direct API call"));
        assert!(code.contains("http://localhost:4010/jobs/single-doc"));
        assert!(code.contains(r#""note": "it'"'"'s""#));
        assert!(!code.contains("tokens/long"));
    }

    #[test]
    fn curl_script_runs_token_exchange() {
        let code = render(Language::Curl, &CodeRequest::new(single_doc()));
        assert!(code.starts_with("#!/bin/bash"));
        assert!(code.contains("\"$API_BASE_URL/jobs/single-doc\""));
        assert!(code.contains("token_exchange"));
    }

    #[test]
    fn javascript_defaults_to_example_payload() {
        let ep = single_doc();
        let code = render(Language::Javascript, &CodeRequest::new(ep));
        let first_key = ep
            .payload_example
            .as_object()
            .and_then(|m| m.keys().next())
            .unwrap();
        assert!(code.contains(&format!("\"{first_key}\"")));
        assert!(code.contains("method: 'POST'"));
    }

    #[test]
    fn inserted_values_are_not_rescanned_and_urls_are_escaped() {
        let payload = json!({"note": "__BASE_URL__ and __PATH__"});
        let req = CodeRequest {
            payload: Some(&payload),
            base_url: "http://h/__PAYLOAD__\"$x'",
            ..CodeRequest::new(single_doc())
        };
        let py = render(Language::Python, &req);
        assert!(py.contains(r#"API_BASE_URL = "http://h/__PAYLOAD__\"$x'""#));
        assert!(py.contains(r#""note": "__BASE_URL__ and __PATH__""#));
        assert_eq!(py.matches("\"note\"").count(), 1);

        let js = render(Language::Javascript, &req);
        assert!(js.contains(r#"const API_BASE_URL = 'http://h/__PAYLOAD__\"$x\'';"#));

        let sh = render(Language::Curl, &req);
        assert!(sh.contains(r#"API_BASE_URL="http://h/__PAYLOAD__\"\$x'""#));
        assert_eq!(sh.matches("\"note\"").count(), 1);
    }

    #[test]
    fn language_parses_aliases() {
        assert_eq!("JS".parse::<Language>(), Ok(Language::Javascript));
        assert_eq!("bash".parse::<Language>(), Ok(Language::Curl));
        assert!("ruby".parse::<Language>().is_err());
    }
}
