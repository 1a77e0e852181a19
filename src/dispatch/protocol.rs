//! Envelope DTOs and action names for the request/response protocol.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const ACTION_BUILD_INDEX: &str = "build_index";
pub const ACTION_SEARCH: &str = "search";
pub const ACTION_TOPN: &str = "topn";

/// `topn` requests that omit `num` or carry an unparseable one get this.
pub const DEFAULT_TOP_N: i64 = 10;

/// One inbound request.
///
/// `request_id`, `action` and `index_id` must be present for the payload to
/// decode at all; the per-action fields are optional and unknown fields
/// (clients attach their own bookkeeping) are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestEnvelope {
    /// Client-scoped correlation id, echoed verbatim in the response.
    pub request_id: String,
    pub action: String,
    pub index_id: String,
    /// Scholar search url, `build_index` only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Word to look up, `search` only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word: Option<String>,
    /// Ranking depth, `topn` only. Clients send numbers or numeric strings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num: Option<Value>,
}

impl RequestEnvelope {
    pub fn word(&self) -> &str {
        self.word.as_deref().unwrap_or_default()
    }

    /// Ranking depth with the lenient parse clients rely on: integers pass
    /// through, floats truncate, numeric strings parse, everything else
    /// falls back to the default.
    pub fn num(&self) -> i64 {
        match &self.num {
            None => DEFAULT_TOP_N,
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .unwrap_or(DEFAULT_TOP_N),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(DEFAULT_TOP_N),
            Some(_) => DEFAULT_TOP_N,
        }
    }
}

/// Terminal status of a processed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    #[serde(rename = "DONE")]
    Done,
    #[serde(rename = "FAILED")]
    Failed,
}

/// One outbound response. Exactly one is published per decoded request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub request_id: String,
    pub action: String,
    pub status: RequestStatus,
    pub index_id: String,
    /// Echo of the build url, `build_index` responses only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Query payload, DONE `search`/`topn` responses only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Failure reason, FAILED responses only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResponseEnvelope {
    pub fn done(request: &RequestEnvelope) -> Self {
        ResponseEnvelope {
            request_id: request.request_id.clone(),
            action: request.action.clone(),
            status: RequestStatus::Done,
            index_id: request.index_id.clone(),
            url: None,
            data: None,
            error: None,
        }
    }

    pub fn failed(request: &RequestEnvelope, error: impl Into<String>) -> Self {
        ResponseEnvelope {
            status: RequestStatus::Failed,
            error: Some(error.into()),
            ..Self::done(request)
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_url(mut self, request: &RequestEnvelope) -> Self {
        self.url = request.url.clone();
        self
    }
}
