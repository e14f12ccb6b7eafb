//! The client for a Cobbler server's XML-RPC API.
//!
//! [`CobblerClient`] owns a [`Transport`], the session token and the server version. Item
//! operations live in `items`, server-side actions and metadata in `actions`.

mod actions;
mod items;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use actions::*;
pub use items::*;

use tokio::sync::{OnceCell, RwLock};

use crate::{
    config::ClientConfig,
    transport::{HttpTransport, Transport},
    wire::{normalize, WireValue},
    CobblerError, CobblerResult, ServerVersion,
};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A session with a Cobbler server.
///
/// Every operation awaits its calls one after another. A client can be shared between tasks, but
/// they all use the same session token; tasks that need their own session should use their own
/// client.
///
/// ## Examples
///
/// ```no_run
/// use cobblerclient::{client::CobblerClient, models::Distro};
///
/// # async fn run() -> cobblerclient::CobblerResult<()> {
/// let client = CobblerClient::new("http://cobbler.example.com/cobbler_api");
/// client.login("cobbler", "cobbler").await?;
///
/// let distro = client.get::<Distro>("centos9-x86_64").await?;
/// println!("{} boots {}", distro.item.name, distro.kernel);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct CobblerClient<T = HttpTransport> {
    transport: T,
    token: RwLock<Option<String>>,
    version: OnceCell<ServerVersion>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl CobblerClient<HttpTransport> {
    /// Creates a client for the API endpoint at `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_transport(HttpTransport::new(url))
    }

    /// Creates a client from a configuration. Credentials in the configuration are not used until
    /// [`login_with_config`](Self::login_with_config) is called.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::with_transport(HttpTransport::from_config(config))
    }
}

impl<T: Transport> CobblerClient<T> {
    /// Creates a client that talks through `transport`.
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            token: RwLock::new(None),
            version: OnceCell::new(),
        }
    }

    /// Returns the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Logs in and keeps the returned token for later calls.
    pub async fn login(&self, username: &str, password: &str) -> CobblerResult<String> {
        let raw = self
            .call("login", vec![username.into(), password.into()])
            .await?;
        let token = expect_string("login", raw)?;

        *self.token.write().await = Some(token.clone());
        tracing::debug!("logged in as {username}");

        Ok(token)
    }

    /// Logs in with the credentials in `config`.
    pub async fn login_with_config(&self, config: &ClientConfig) -> CobblerResult<String> {
        match (config.get_username(), config.get_password()) {
            (Some(username), Some(password)) => self.login(username, password).await,
            _ => Err(CobblerError::Validation(
                "username and password must both be configured to log in".to_string(),
            )),
        }
    }

    /// Invalidates the session token and forgets it.
    ///
    /// The token is kept if the server does not confirm the logout.
    pub async fn logout(&self) -> CobblerResult<bool> {
        let token = self.require_token().await?;
        let raw = self.call("logout", vec![token.into()]).await?;
        let logged_out = expect_bool("logout", raw)?;
        if logged_out {
            *self.token.write().await = None;
        }
        Ok(logged_out)
    }

    /// Asks the server whether the session token is still valid.
    pub async fn check_token(&self) -> CobblerResult<bool> {
        let token = self.require_token().await?;
        let raw = self.call("token_check", vec![token.into()]).await?;
        expect_bool("token_check", raw)
    }

    /// Returns the session token, if logged in.
    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    /// Replaces the session token, e.g. with one obtained by another client.
    pub async fn set_token(&self, token: Option<String>) {
        *self.token.write().await = token;
    }

    /// Returns the server version.
    ///
    /// The version is fetched on first use and cached for the lifetime of the client. Concurrent
    /// first calls share a single fetch.
    pub async fn version(&self) -> CobblerResult<ServerVersion> {
        let version = self
            .version
            .get_or_try_init(|| async {
                let raw = self.call("extended_version", Vec::new()).await?;
                let version = ServerVersion::from_extended_version(&raw)?;
                tracing::debug!("server version is {version}");
                Ok::<_, CobblerError>(version)
            })
            .await?;

        Ok(*version)
    }

    /// Calls `method` on the server.
    pub(crate) async fn call(
        &self,
        method: &str,
        args: Vec<WireValue>,
    ) -> CobblerResult<WireValue> {
        tracing::trace!("rpc {method}");
        self.transport.call(method, args).await
    }

    /// Returns the session token, or [`CobblerError::NotLoggedIn`].
    pub(crate) async fn require_token(&self) -> CobblerResult<String> {
        self.token().await.ok_or(CobblerError::NotLoggedIn)
    }

    /// Returns the session token, or an empty string for calls where it is optional.
    pub(crate) async fn token_or_empty(&self) -> String {
        self.token().await.unwrap_or_default()
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Interprets a call's result as a boolean.
pub(crate) fn expect_bool(method: &str, raw: WireValue) -> CobblerResult<bool> {
    normalize(&raw).map_err(|_| CobblerError::UnexpectedResponse {
        method: method.to_string(),
        value: raw,
    })
}

/// Fails unless a call's result is `true`.
pub(crate) fn expect_true(method: &str, raw: WireValue) -> CobblerResult<()> {
    match expect_bool(method, raw.clone())? {
        true => Ok(()),
        false => Err(CobblerError::UnexpectedResponse {
            method: method.to_string(),
            value: raw,
        }),
    }
}

/// Interprets a call's result as a string.
pub(crate) fn expect_string(method: &str, raw: WireValue) -> CobblerResult<String> {
    match raw {
        WireValue::String(s) => Ok(s),
        other => Err(CobblerError::UnexpectedResponse {
            method: method.to_string(),
            value: other,
        }),
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use crate::transport::MockTransport;

    use super::*;

    fn server() -> MockTransport {
        MockTransport::new(|method, args| match method {
            "login" if args[1] == WireValue::from("cobbler") => Ok(WireValue::from("tok-1")),
            "login" => Err(CobblerError::Fault {
                code: 1,
                message: "<class 'cobbler.cexceptions.CX'>:'login failed (cobbler)'".into(),
            }),
            "logout" | "token_check" => Ok(WireValue::Bool(true)),
            "extended_version" => Ok(WireValue::Struct(BTreeMap::from([
                ("version".to_string(), WireValue::from("3.3.4")),
                (
                    "version_tuple".to_string(),
                    WireValue::Array(vec![
                        WireValue::Int(3),
                        WireValue::Int(3),
                        WireValue::Int(4),
                    ]),
                ),
            ]))),
            _ => Ok(WireValue::from("~")),
        })
    }

    #[test_log::test(tokio::test)]
    async fn test_client_login_logout() -> anyhow::Result<()> {
        let client = CobblerClient::with_transport(server());

        assert!(matches!(
            client.check_token().await,
            Err(CobblerError::NotLoggedIn)
        ));

        let token = client.login("cobbler", "cobbler").await?;
        assert_eq!(token, "tok-1");
        assert_eq!(client.token().await.as_deref(), Some("tok-1"));
        assert!(client.check_token().await?);

        assert!(client.logout().await?);
        assert!(client.token().await.is_none());

        let calls = client.transport().calls_to("token_check");
        assert_eq!(calls[0].args, vec![WireValue::from("tok-1")]);
        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn test_client_logout_keeps_token_unless_confirmed() -> anyhow::Result<()> {
        for reply in [WireValue::Bool(false), WireValue::from("~")] {
            let client = CobblerClient::with_transport(MockTransport::new(move |method, _| {
                match method {
                    "logout" => Ok(reply.clone()),
                    _ => Ok(WireValue::from("tok-1")),
                }
            }));
            client.login("cobbler", "cobbler").await?;

            let _ = client.logout().await;
            assert_eq!(client.token().await.as_deref(), Some("tok-1"));
        }

        let client = CobblerClient::with_transport(MockTransport::new(|_, _| {
            Err(CobblerError::Transport("connection reset".into()))
        }));
        client.set_token(Some("tok-1".into())).await;
        assert!(client.logout().await.unwrap_err().is_transport());
        assert_eq!(client.token().await.as_deref(), Some("tok-1"));
        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn test_client_login_fault_is_preserved() -> anyhow::Result<()> {
        let client = CobblerClient::with_transport(server());

        let err = client.login("cobbler", "wrong").await.unwrap_err();
        match err {
            CobblerError::Fault { code, message } => {
                assert_eq!(code, 1);
                assert!(message.contains("login failed"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(client.token().await.is_none());
        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn test_client_version_is_cached() -> anyhow::Result<()> {
        let client = CobblerClient::with_transport(server());

        assert_eq!(client.version().await?, ServerVersion::new(3, 3, 4));
        assert_eq!(client.version().await?, ServerVersion::new(3, 3, 4));
        assert_eq!(client.transport().calls_to("extended_version").len(), 1);
        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn test_client_login_with_config_requires_credentials() -> anyhow::Result<()> {
        let client = CobblerClient::with_transport(server());
        let config = ClientConfig::builder().username("cobbler").build();

        let err = client.login_with_config(&config).await.unwrap_err();
        assert!(matches!(err, CobblerError::Validation(_)));
        assert!(client.transport().calls().is_empty());
        Ok(())
    }
}
