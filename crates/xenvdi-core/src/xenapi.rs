//! Management API client.
//!
//! Every XenAPI call answers with a struct carrying a `Status` member. On
//! `"Success"` the payload is in `Value`; otherwise `ErrorDescription` holds
//! a list of strings. [`RpcResult`] captures that contract once so that each
//! call site only decides what a failure means for it.

use std::time::Duration;

use tracing::debug;

use crate::error::{Error, Result};
use crate::vdi::VdiRecord;
use crate::xmlrpc::{self, Value};

/// Status sentinel for a successful call.
pub const STATUS_SUCCESS: &str = "Success";

/// Sends one XML-RPC call and returns the decoded response value.
pub trait Transport {
    fn call(&self, method: &str, params: &[Value]) -> Result<Value>;
}

/// Upper bound on establishing the TCP connection to the host.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// XML-RPC over plain HTTP to `http://<host>/RPC2`.
///
/// Only connecting is bounded. Once connected, a call waits for as long as
/// the host takes to answer; `VDI.create` on a busy SR can be slow.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    url: String,
    request_timeout: Option<Duration>,
}

impl HttpTransport {
    /// Create a transport for the management endpoint on `host`.
    pub fn new(host: &str) -> Result<Self> {
        Self::with_url(format!("http://{}/RPC2", host))
    }

    /// Create a transport for an explicit endpoint URL.
    pub fn with_url(url: impl Into<String>) -> Result<Self> {
        let request_timeout: Option<Duration> = None;
        // The blocking client otherwise gives up on any call after 30 seconds.
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(request_timeout)
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
            request_timeout,
        })
    }

    /// The endpoint URL calls are posted to.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Limit on a whole call once connected; `None` waits indefinitely.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }
}

impl Transport for HttpTransport {
    fn call(&self, method: &str, params: &[Value]) -> Result<Value> {
        let body = xmlrpc::encode_call(method, params)?;
        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "text/xml")
            .body(body)
            .send()?
            .error_for_status()?;
        let text = response.text()?;
        xmlrpc::parse_response(&text)
    }
}

/// Decoded outcome of a management API call.
#[derive(Debug, Clone, PartialEq)]
pub enum RpcResult {
    Success(Value),
    Failure(Vec<String>),
}

impl RpcResult {
    /// Classify a raw response struct by its `Status` member.
    pub fn from_response(response: Value) -> Result<Self> {
        let mut members = match response {
            Value::Struct(members) => members,
            other => {
                return Err(Error::xml_rpc(format!(
                    "expected a status struct, found {}",
                    other.type_name()
                )))
            }
        };

        let status = members
            .remove("Status")
            .ok_or_else(|| Error::xml_rpc("response has no Status member"))?
            .into_string()?;

        if status == STATUS_SUCCESS {
            let value = members.remove("Value").unwrap_or(Value::String(String::new()));
            return Ok(RpcResult::Success(value));
        }

        let description = match members.remove("ErrorDescription") {
            Some(Value::Array(items)) => items.into_iter().map(describe).collect(),
            Some(other) => vec![describe(other)],
            None => vec![status],
        };
        Ok(RpcResult::Failure(description))
    }

    /// Return the payload, or an [`Error::Rpc`] naming `method`.
    pub fn into_value(self, method: &str) -> Result<Value> {
        match self {
            RpcResult::Success(value) => Ok(value),
            RpcResult::Failure(description) => Err(Error::rpc(method, description)),
        }
    }
}

fn describe(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Int(i) => i.to_string(),
        Value::Boolean(b) => b.to_string(),
        other => format!("{:?}", other),
    }
}

/// Typed wrapper over the management API calls this tool needs.
#[derive(Debug)]
pub struct XenApi<T: Transport> {
    transport: T,
}

impl<T: Transport> XenApi<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Borrow the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Issue `method` and classify the response.
    pub fn invoke(&self, method: &str, params: &[Value]) -> Result<RpcResult> {
        debug!(method, "calling management API");
        let response = self.transport.call(method, params)?;
        RpcResult::from_response(response)
    }

    /// `session.login_with_password`; a rejected login is an
    /// [`Error::Authentication`].
    pub fn login_with_password(&self, username: &str, password: &str) -> Result<String> {
        match self.invoke(
            "session.login_with_password",
            &[Value::from(username), Value::from(password)],
        )? {
            RpcResult::Success(value) => value.into_string(),
            RpcResult::Failure(description) => Err(Error::authentication(description)),
        }
    }

    /// `session.logout`.
    pub fn logout(&self, session_id: &str) -> Result<()> {
        self.invoke("session.logout", &[Value::from(session_id)])?
            .into_value("session.logout")?;
        Ok(())
    }

    /// `SR.get_by_uuid`: resolve an SR UUID to its reference.
    pub fn sr_get_by_uuid(&self, session_id: &str, uuid: &str) -> Result<String> {
        self.call_for_string("SR.get_by_uuid", &[Value::from(session_id), Value::from(uuid)])
    }

    /// `VDI.create`: create a VDI and return its reference.
    pub fn vdi_create(&self, session_id: &str, record: &VdiRecord) -> Result<String> {
        self.call_for_string("VDI.create", &[Value::from(session_id), record.to_value()])
    }

    /// `VDI.get_uuid`.
    pub fn vdi_get_uuid(&self, session_id: &str, vdi_ref: &str) -> Result<String> {
        self.call_for_string("VDI.get_uuid", &[Value::from(session_id), Value::from(vdi_ref)])
    }

    fn call_for_string(&self, method: &str, params: &[Value]) -> Result<String> {
        self.invoke(method, params)?.into_value(method)?.into_string()
    }
}
