// API client module: a small blocking HTTP client for the reward API.
// Every endpoint is a GET authenticated by a `cookie` header carrying the
// account's token and userid.

use crate::config::Credential;
use crate::error::ApiError;
use anyhow::Context;
use reqwest::blocking::Client;
use reqwest::header::COOKIE;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

pub const USER_DETAIL: &str = "/user/detail";
pub const LISTEN_SONG: &str = "/youth/listen/song";
pub const YOUTH_VIP: &str = "/youth/vip";
pub const VIP_DETAIL: &str = "/user/vip/detail";

/// Listen reward was already granted today.
pub const ALREADY_CLAIMED: i64 = 130012;
/// No check-ins left for today.
pub const CHECKINS_EXHAUSTED: i64 = 30002;

/// The four reward API calls one account run needs.
#[cfg_attr(test, mockall::automock)]
pub trait RewardApi {
    fn user_detail(&self, cred: &Credential) -> Result<UserDetail, ApiError>;
    fn listen_song(&self, cred: &Credential) -> Result<ClaimResponse, ApiError>;
    fn check_in(&self, cred: &Credential) -> Result<ClaimResponse, ApiError>;
    fn vip_detail(&self, cred: &Credential) -> Result<VipDetail, ApiError>;
}

/// `/user/detail` body. A missing nickname means the token is no longer valid.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct UserDetail {
    #[serde(default, deserialize_with = "lenient")]
    pub data: Option<UserData>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct UserData {
    #[serde(default, deserialize_with = "lenient")]
    pub nickname: Option<String>,
}

impl UserDetail {
    pub fn nickname(&self) -> Option<&str> {
        self.data
            .as_ref()?
            .nickname
            .as_deref()
            .filter(|n| !n.is_empty())
    }
}

/// Body shared by the listen and check-in endpoints. Unknown fields are
/// kept so a failed response can be reported verbatim.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ClaimResponse {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub status: Option<i64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub error_code: Option<i64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub error_msg: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// How a claim response should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    Success,
    /// The remote reports the action as already done; not an error.
    AlreadyDone,
    Failed,
}

impl ClaimResponse {
    #[cfg(test)]
    pub(crate) fn success() -> Self {
        ClaimResponse {
            status: Some(1),
            ..Default::default()
        }
    }

    #[cfg(test)]
    pub(crate) fn failure(error_code: i64, error_msg: Option<&str>) -> Self {
        ClaimResponse {
            status: Some(0),
            error_code: Some(error_code),
            error_msg: error_msg.map(str::to_string),
            extra: Map::new(),
        }
    }

    /// Classify against the endpoint's "already done" code.
    pub fn classify(&self, done_code: i64) -> Claim {
        if self.status == Some(1) {
            Claim::Success
        } else if self.error_code == Some(done_code) {
            Claim::AlreadyDone
        } else {
            Claim::Failed
        }
    }

    pub fn describe(&self) -> String {
        describe_failure(self.error_msg.as_deref(), self.error_code)
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// `/user/vip/detail` body.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct VipDetail {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub status: Option<i64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub error_code: Option<i64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub error_msg: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub data: Option<VipData>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct VipData {
    #[serde(default, deserialize_with = "lenient_list")]
    pub busi_vip: Vec<BusiVip>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct BusiVip {
    #[serde(default, deserialize_with = "lenient")]
    pub vip_end_time: Option<String>,
}

impl VipDetail {
    pub fn is_success(&self) -> bool {
        self.status == Some(1)
    }

    /// Expiry of the first VIP entry, if the API reported one.
    pub fn end_time(&self) -> Option<&str> {
        self.data
            .as_ref()?
            .busi_vip
            .first()?
            .vip_end_time
            .as_deref()
            .filter(|t| !t.is_empty())
    }

    pub fn describe(&self) -> String {
        describe_failure(self.error_msg.as_deref(), self.error_code)
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Decode a field as absent when it is `null` or has an unexpected shape,
/// instead of failing the whole body.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(lenient(deserializer)?.unwrap_or_default())
}

fn describe_failure(error_msg: Option<&str>, error_code: Option<i64>) -> String {
    match (error_msg.filter(|m| !m.is_empty()), error_code) {
        (Some(msg), _) => msg.to_string(),
        (None, Some(code)) => format!("error_code={code}"),
        (None, None) => "error_code=unknown".to_string(),
    }
}

/// Reward API client over a blocking reqwest client.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ApiClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `endpoint` for `cred` and decode the JSON body. The body is
    /// decoded even on non-2xx answers since the API reports its error
    /// codes that way; only an undecodable non-2xx answer is an HTTP error.
    fn get<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &'static str,
        cred: &Credential,
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!(%url, userid = %cred.userid, "GET");
        let res = self
            .client
            .get(&url)
            .header(COOKIE, cred.cookie())
            .query(&[("timestamp", unix_millis())])
            .send()
            .map_err(|source| ApiError::Request { endpoint, source })?;

        let status = res.status();
        let body = res
            .text()
            .map_err(|source| ApiError::Request { endpoint, source })?;
        debug!(endpoint, status = status.as_u16(), bytes = body.len(), "response");

        match serde_json::from_str(&body) {
            Ok(parsed) => Ok(parsed),
            Err(_) if !status.is_success() => Err(ApiError::Http {
                endpoint,
                status: status.as_u16(),
            }),
            Err(source) => Err(ApiError::Decode { endpoint, source }),
        }
    }
}

impl RewardApi for ApiClient {
    fn user_detail(&self, cred: &Credential) -> Result<UserDetail, ApiError> {
        self.get(USER_DETAIL, cred)
    }

    fn listen_song(&self, cred: &Credential) -> Result<ClaimResponse, ApiError> {
        self.get(LISTEN_SONG, cred)
    }

    fn check_in(&self, cred: &Credential) -> Result<ClaimResponse, ApiError> {
        self.get(YOUTH_VIP, cred)
    }

    fn vip_detail(&self, cred: &Credential) -> Result<VipDetail, ApiError> {
        self.get(VIP_DETAIL, cred)
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
