//! The boundary with the RPC layer.
//!
//! Everything above this module speaks in method names and [`WireValue`] trees; how those travel
//! is up to the [`Transport`] implementation.

mod http;
mod mock;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use http::*;
pub use mock::*;

use std::sync::Arc;

use crate::{wire::WireValue, CobblerResult};

//--------------------------------------------------------------------------------------------------
// Traits
//--------------------------------------------------------------------------------------------------

/// Performs one RPC round-trip.
///
/// Implementations surface server-reported faults as [`CobblerError::Fault`] and everything that
/// goes wrong below the RPC layer as one of the transport variants.
///
/// [`CobblerError::Fault`]: crate::CobblerError::Fault
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Calls `method` with positional `args` and returns the decoded result.
    async fn call(&self, method: &str, args: Vec<WireValue>) -> CobblerResult<WireValue>;
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

#[async_trait::async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn call(&self, method: &str, args: Vec<WireValue>) -> CobblerResult<WireValue> {
        (**self).call(method, args).await
    }
}
