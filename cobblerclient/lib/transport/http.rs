use std::io::Cursor;

use getset::Getters;
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};

use crate::{config::ClientConfig, wire::WireValue, CobblerError, CobblerResult};

use super::Transport;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// The MIME type of an XML-RPC request body.
const XMLRPC_MIME_TYPE: &str = "text/xml";

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A [`Transport`] that POSTs XML-RPC envelopes to the server's API endpoint.
///
/// Transient HTTP failures are retried by the middleware, up to the configured count.
#[derive(Debug, Getters)]
#[getset(get = "pub with_prefix")]
pub struct HttpTransport {
    /// The HTTP client used to make requests to the server.
    client: ClientWithMiddleware,

    /// The API endpoint, e.g. `http://cobbler.example.com/cobbler_api`.
    url: String,
}

/// A response body that has already been received, handed to the envelope parser.
struct ReceivedResponse(Vec<u8>);

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl HttpTransport {
    /// Creates a transport for `url` that never retries.
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_retries(url, 0)
    }

    /// Creates a transport for `url` that retries transient failures up to `max_retries` times.
    pub fn with_retries(url: impl Into<String>, max_retries: u32) -> Self {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);
        let client_builder = ClientBuilder::new(Client::new());
        let client = client_builder
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Self {
            client,
            url: url.into(),
        }
    }

    /// Creates a transport from a client configuration.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::with_retries(config.get_url().clone(), *config.get_retries())
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn call(&self, method: &str, args: Vec<WireValue>) -> CobblerResult<WireValue> {
        tracing::debug!("calling {method} with {} argument(s)", args.len());

        let request = args
            .into_iter()
            .fold(xmlrpc::Request::new(method), |request, arg| {
                request.arg(into_xmlrpc(arg))
            });

        let mut body = Vec::new();
        request
            .write_as_xml(&mut body)
            .map_err(|e| CobblerError::Transport(format!("failed to encode `{method}`: {e}")))?;

        let response = self
            .client
            .post(&self.url)
            .header("Content-Type", XMLRPC_MIME_TYPE)
            .body(body)
            .send()
            .await?
            .error_for_status()?;

        let bytes = response.bytes().await?;
        let value = request
            .call(ReceivedResponse(bytes.to_vec()))
            .map_err(|e| match e.fault() {
                Some(fault) => CobblerError::Fault {
                    code: fault.fault_code,
                    message: fault.fault_string.clone(),
                },
                None => CobblerError::Transport(format!("failed to decode `{method}`: {e}")),
            })?;

        Ok(from_xmlrpc(value))
    }
}

impl xmlrpc::Transport for ReceivedResponse {
    type Stream = Cursor<Vec<u8>>;

    fn transmit(
        self,
        _request: &xmlrpc::Request<'_>,
    ) -> Result<Self::Stream, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Cursor::new(self.0))
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

fn into_xmlrpc(value: WireValue) -> xmlrpc::Value {
    match value {
        WireValue::Nil => xmlrpc::Value::Nil,
        WireValue::Bool(b) => xmlrpc::Value::Bool(b),
        WireValue::Int(i) => match i32::try_from(i) {
            Ok(small) => xmlrpc::Value::Int(small),
            Err(_) => xmlrpc::Value::Int64(i),
        },
        WireValue::Double(d) => xmlrpc::Value::Double(d),
        WireValue::String(s) => xmlrpc::Value::String(s),
        WireValue::Bytes(b) => xmlrpc::Value::Base64(b),
        WireValue::Array(items) => {
            xmlrpc::Value::Array(items.into_iter().map(into_xmlrpc).collect())
        }
        WireValue::Struct(map) => xmlrpc::Value::Struct(
            map.into_iter()
                .map(|(key, value)| (key, into_xmlrpc(value)))
                .collect(),
        ),
    }
}

fn from_xmlrpc(value: xmlrpc::Value) -> WireValue {
    match value {
        xmlrpc::Value::Nil => WireValue::Nil,
        xmlrpc::Value::Bool(b) => WireValue::Bool(b),
        xmlrpc::Value::Int(i) => WireValue::Int(i.into()),
        xmlrpc::Value::Int64(i) => WireValue::Int(i),
        xmlrpc::Value::Double(d) => WireValue::Double(d),
        xmlrpc::Value::String(s) => WireValue::String(s),
        xmlrpc::Value::DateTime(dt) => WireValue::String(format_datetime(&dt)),
        xmlrpc::Value::Base64(b) => WireValue::Bytes(b),
        xmlrpc::Value::Array(items) => {
            WireValue::Array(items.into_iter().map(from_xmlrpc).collect())
        }
        xmlrpc::Value::Struct(map) => WireValue::Struct(
            map.into_iter()
                .map(|(key, value)| (key, from_xmlrpc(value)))
                .collect(),
        ),
    }
}

/// Renders an XML-RPC `dateTime.iso8601` value as an ISO-8601 string with an extended date.
///
/// Milliseconds and the offset are only written when they are nonzero.
fn format_datetime(dt: &iso8601::DateTime) -> String {
    let mut rendered = match dt.date {
        iso8601::Date::YMD { year, month, day } => format!("{year:04}-{month:02}-{day:02}"),
        iso8601::Date::Week { year, ww, d } => format!("{year:04}-W{ww:02}-{d}"),
        iso8601::Date::Ordinal { year, ddd } => format!("{year:04}-{ddd:03}"),
    };

    let time = &dt.time;
    rendered.push_str(&format!(
        "T{:02}:{:02}:{:02}",
        time.hour, time.minute, time.second
    ));
    if time.millisecond != 0 {
        rendered.push_str(&format!(".{:03}", time.millisecond));
    }

    let offset = time.tz_offset_hours * 60 + time.tz_offset_minutes;
    if offset != 0 {
        let sign = if offset < 0 { '-' } else { '+' };
        let offset = offset.abs();
        rendered.push_str(&format!("{sign}{:02}:{:02}", offset / 60, offset % 60));
    }

    rendered
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
