// Run configuration.
//
// The account list comes from `USERINFO` (a JSON array of
// `{"token": ..., "userid": ...}` objects). Everything else is a tunable
// with a sensible default, settable by flag or environment variable.

use crate::error::ConfigError;
use clap::Parser;
use serde_json::Value;
use std::time::Duration;

/// Claims the daily youth VIP rewards for every configured account.
#[derive(Parser, Debug, Clone)]
#[command(name = "vip-claim", version)]
pub struct Cli {
    /// JSON array of accounts: [{"token": "...", "userid": "..."}]
    #[arg(long, env = "USERINFO", hide_env_values = true)]
    pub userinfo: Option<String>,

    /// Base URL of the reward API
    #[arg(long, env = "API_BASE_URL", default_value = "http://127.0.0.1:3000")]
    pub api_url: String,

    /// Command that launches the API service before the run (optional)
    #[arg(long, env = "API_SERVICE_CMD")]
    pub service_cmd: Option<String>,

    /// Pause after starting the service, in milliseconds
    #[arg(long, env = "API_WARMUP_MS", default_value_t = 2000)]
    pub warmup_ms: u64,

    /// Pause between two successful check-ins, in seconds
    #[arg(long, env = "CHECKIN_DELAY_SECS", default_value_t = 30)]
    pub checkin_delay_secs: u64,

    /// Maximum check-in calls per account
    #[arg(long, env = "MAX_CHECKINS", default_value_t = 8)]
    pub max_checkins: u32,

    /// Per-request timeout, in seconds
    #[arg(long, env = "API_TIMEOUT_SECS", default_value_t = 15)]
    pub timeout_secs: u64,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn warmup(&self) -> Duration {
        Duration::from_millis(self.warmup_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn claim_settings(&self) -> ClaimSettings {
        ClaimSettings {
            max_checkins: self.max_checkins,
            checkin_delay: Duration::from_secs(self.checkin_delay_secs),
        }
    }
}

/// Knobs of the check-in loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimSettings {
    pub max_checkins: u32,
    pub checkin_delay: Duration,
}

impl Default for ClaimSettings {
    fn default() -> Self {
        ClaimSettings {
            max_checkins: 8,
            checkin_delay: Duration::from_secs(30),
        }
    }
}

/// One token/userid pair. Both fields are guaranteed non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    pub userid: String,
}

impl Credential {
    /// Accept an account entry only when both fields are present and
    /// non-empty. Non-zero numeric values are accepted as-is.
    pub fn from_value(entry: &Value) -> Option<Self> {
        Some(Credential {
            token: scalar_field(entry, "token")?,
            userid: scalar_field(entry, "userid")?,
        })
    }

    /// Value of the `cookie` header the API authenticates with.
    pub fn cookie(&self) -> String {
        format!("token={}; userid={}", self.token, self.userid)
    }
}

/// Best-effort userid of a possibly malformed entry, for display.
pub fn display_userid(entry: &Value) -> String {
    scalar_field(entry, "userid").unwrap_or_else(|| "unknown".to_string())
}

fn scalar_field(entry: &Value, key: &str) -> Option<String> {
    match entry.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        // Zero counts as missing, like an empty string.
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse the raw `USERINFO` value into its array elements. Individual
/// entries are validated later, per account.
pub fn load_accounts(raw: Option<&str>) -> Result<Vec<Value>, ConfigError> {
    let raw = match raw {
        Some(r) if !r.trim().is_empty() => r,
        _ => return Err(ConfigError::MissingUserInfo),
    };
    match serde_json::from_str::<Value>(raw)? {
        Value::Array(entries) => Ok(entries),
        other => Err(ConfigError::NotAnArray {
            found: json_kind(&other),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use serial_test::serial;

    #[test]
    fn test_missing_userinfo_is_rejected() {
        assert!(matches!(load_accounts(None), Err(ConfigError::MissingUserInfo)));
        assert!(matches!(load_accounts(Some("  ")), Err(ConfigError::MissingUserInfo)));
    }

    #[test]
    fn test_non_array_userinfo_is_rejected() {
        let err = load_accounts(Some(r#"{"token":"t","userid":"u"}"#)).unwrap_err();
        assert!(matches!(err, ConfigError::NotAnArray { found: "an object" }));
        assert!(matches!(load_accounts(Some("not json")), Err(ConfigError::InvalidJson(_))));
    }

    #[test]
    fn test_array_keeps_malformed_entries_for_later() {
        let entries = load_accounts(Some(r#"[{"token":"t1","userid":"u1"}, 42, {}]"#)).unwrap();
        assert_eq!(entries.len(), 3);
    }

    #[test]
    fn test_credential_requires_both_fields() {
        assert!(Credential::from_value(&json!({"token": "t"})).is_none());
        assert!(Credential::from_value(&json!({"userid": "u"})).is_none());
        assert!(Credential::from_value(&json!({"token": "", "userid": "u"})).is_none());
        assert!(Credential::from_value(&json!({"token": null, "userid": "u"})).is_none());
        assert!(Credential::from_value(&json!("t1")).is_none());
    }

    #[test]
    fn test_numeric_userid_and_cookie() {
        let cred = Credential::from_value(&json!({"token": "abc", "userid": 123456})).unwrap();
        assert_eq!(cred.userid, "123456");
        assert_eq!(cred.cookie(), "token=abc; userid=123456");
    }

    #[test]
    fn test_zero_ids_count_as_missing() {
        assert!(Credential::from_value(&json!({"token": "abc", "userid": 0})).is_none());
        assert!(Credential::from_value(&json!({"token": 0, "userid": "u1"})).is_none());
        assert!(Credential::from_value(&json!({"token": "abc", "userid": 0.0})).is_none());
        assert_eq!(display_userid(&json!({"userid": 0})), "unknown");
    }

    #[test]
    fn test_display_userid_falls_back() {
        assert_eq!(display_userid(&json!({"userid": "u9"})), "u9");
        assert_eq!(display_userid(&json!({"token": "t"})), "unknown");
    }

    #[test]
    #[serial]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["vip-claim", "--userinfo", "[]"]);
        assert_eq!(cli.claim_settings(), ClaimSettings::default());
        assert_eq!(cli.warmup(), Duration::from_secs(2));
        assert!(cli.service_cmd.is_none());
    }

    #[test]
    #[serial]
    fn test_env_fallbacks() {
        std::env::set_var("USERINFO", r#"[{"token":"t","userid":"u"}]"#);
        std::env::set_var("MAX_CHECKINS", "3");
        let cli = Cli::parse_from(["vip-claim"]);
        std::env::remove_var("USERINFO");
        std::env::remove_var("MAX_CHECKINS");

        assert_eq!(cli.claim_settings().max_checkins, 3);
        let entries = load_accounts(cli.userinfo.as_deref()).unwrap();
        assert_eq!(Credential::from_value(&entries[0]).unwrap().userid, "u");
    }
}
