use std::sync::Mutex;

use crate::{wire::WireValue, CobblerError, CobblerResult};

use super::Transport;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

type Handler = Box<dyn Fn(&str, &[WireValue]) -> CobblerResult<WireValue> + Send + Sync>;

/// An in-process transport that answers calls with a handler and records them.
///
/// ## Examples
///
/// ```
/// use cobblerclient::{transport::{MockTransport, Transport}, wire::WireValue};
///
/// # tokio_test();
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn tokio_test() {
/// let transport = MockTransport::new(|method, _args| match method {
///     "get_item_names" => Ok(WireValue::from(vec!["centos9"])),
///     _ => Ok(WireValue::Bool(true)),
/// });
///
/// let names = transport
///     .call("get_item_names", vec![WireValue::from("distro")])
///     .await
///     .unwrap();
/// assert_eq!(names, WireValue::from(vec!["centos9"]));
/// assert_eq!(transport.calls()[0].method, "get_item_names");
/// # }
/// ```
pub struct MockTransport {
    handler: Handler,
    calls: Mutex<Vec<RecordedCall>>,
}

/// A call observed by [`MockTransport`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// The method name.
    pub method: String,

    /// The positional arguments.
    pub args: Vec<WireValue>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl MockTransport {
    /// Creates a transport that answers every call with `handler`.
    pub fn new(
        handler: impl Fn(&str, &[WireValue]) -> CobblerResult<WireValue> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Returns every call made so far, oldest first.
    pub fn calls(&self) -> Vec<RecordedCall> {
        match self.calls.lock() {
            Ok(calls) => calls.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Returns the calls made to `method`, oldest first.
    pub fn calls_to(&self, method: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.method == method)
            .collect()
    }

    /// Forgets every recorded call.
    pub fn clear(&self) {
        match self.calls.lock() {
            Ok(mut calls) => calls.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn call(&self, method: &str, args: Vec<WireValue>) -> CobblerResult<WireValue> {
        let result = (self.handler)(method, &args);

        let mut calls = self
            .calls
            .lock()
            .map_err(|e| CobblerError::Transport(format!("mock transport poisoned: {e}")))?;
        calls.push(RecordedCall {
            method: method.to_string(),
            args,
        });

        result
    }
}
