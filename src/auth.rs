use std::collections::HashMap;
use std::fmt::{self, Debug};

use reqwest::header::AUTHORIZATION;
use reqwest::RequestBuilder;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::error::AuthError;

/// Free-form transport options attached to a single outgoing call.
///
/// The authenticator merges into a copy and never retains it; pass the
/// returned mapping (not the original) on to the transport layer.
pub type RequestOptions = Map<String, Value>;

const IMPERSONATION_HEADER: &str = "X-On-Behalf-Of";

/// Validated credentials for one strategy. Fields are snapshotted at
/// construction, so later changes to the caller's options map have no
/// effect on an existing authenticator.
enum Strategy {
    Basic { username: String, token: String },
    OAuth { token: String },
    Impersonation { user_id: String, token: String },
}

/// Attaches authentication credentials to outgoing requests.
///
/// Constructed once at client setup from a strategy tag and an options
/// map, immutable afterwards. Holds only owned data, so it can be shared
/// across concurrent callers without locking.
pub struct Auth {
    strategy: Strategy,
}

impl Auth {
    /// Basic authentication with a username and API token.
    pub const BASIC: &'static str = "basic";
    /// An OAuth bearer token.
    pub const OAUTH: &'static str = "oauth";
    /// An OAuth bearer token acting on behalf of another user.
    pub const IMP: &'static str = "imp";

    /// Validates `strategy` against the recognized tags and snapshots the
    /// required fields out of `options`. Unrecognized extra keys are
    /// ignored. Construction failure is fatal to client setup; an `Auth`
    /// that exists is always usable.
    pub fn new(strategy: &str, options: &HashMap<String, String>) -> Result<Self, AuthError> {
        let strategy = match strategy {
            Self::BASIC => match (options.get("username"), options.get("token")) {
                (Some(username), Some(token)) => Strategy::Basic {
                    username: username.clone(),
                    token: token.clone(),
                },
                _ => return Err(AuthError::MissingCredentials("username, token")),
            },
            Self::OAUTH => match options.get("token") {
                Some(token) => Strategy::OAuth {
                    token: token.clone(),
                },
                None => return Err(AuthError::MissingCredentials("token")),
            },
            Self::IMP => match (options.get("user_id"), options.get("token")) {
                (Some(user_id), Some(token)) => Strategy::Impersonation {
                    user_id: user_id.clone(),
                    token: token.clone(),
                },
                _ => return Err(AuthError::MissingCredentials("user_id, token")),
            },
            other => return Err(AuthError::InvalidStrategy(other.to_string())),
        };

        let auth = Auth { strategy };
        debug!(strategy = auth.strategy(), "configured request authentication");
        Ok(auth)
    }

    /// The configured strategy tag.
    pub fn strategy(&self) -> &'static str {
        match self.strategy {
            Strategy::Basic { .. } => Self::BASIC,
            Strategy::OAuth { .. } => Self::OAUTH,
            Strategy::Impersonation { .. } => Self::IMP,
        }
    }

    /// Decorates a pending request and its per-call options with the
    /// configured credentials. Exactly one of the two values is extended,
    /// depending on the strategy; dispatch must use both returned values
    /// in place of the inputs.
    ///
    /// Headers are appended, never overwritten, matching the transport's
    /// multi-value header semantics. Pure and synchronous, no I/O.
    pub fn prepare_request(
        &self,
        request: RequestBuilder,
        mut request_options: RequestOptions,
    ) -> (RequestBuilder, RequestOptions) {
        match &self.strategy {
            Strategy::Basic { username, token } => {
                // The `/token` suffix marks the credential as an API token
                // rather than a password; the upstream basic-auth scheme
                // requires it.
                request_options.insert(
                    "auth".to_string(),
                    json!([format!("{username}/token"), token, Self::BASIC]),
                );
                (request, request_options)
            }
            Strategy::OAuth { token } => {
                // The leading space in " Bearer" is what the live service
                // has always been sent; keep it byte-for-byte unless the
                // service is confirmed to accept the conventional form.
                (
                    request.header(AUTHORIZATION, format!(" Bearer {token}")),
                    request_options,
                )
            }
            Strategy::Impersonation { user_id, token } => (
                request
                    .header(AUTHORIZATION, format!(" Bearer {token}"))
                    .header(IMPERSONATION_HEADER, user_id.as_str()),
                request_options,
            ),
        }
    }
}

impl Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.strategy {
            Strategy::Basic { username, .. } => f
                .debug_struct("Auth")
                .field("strategy", &Self::BASIC)
                .field("username", username)
                .field("token", &"***") // Don't expose the actual token
                .finish(),
            Strategy::OAuth { .. } => f
                .debug_struct("Auth")
                .field("strategy", &Self::OAUTH)
                .field("token", &"***")
                .finish(),
            Strategy::Impersonation { user_id, .. } => f
                .debug_struct("Auth")
                .field("strategy", &Self::IMP)
                .field("user_id", user_id)
                .field("token", &"***")
                .finish(),
        }
    }
}
