//! Wire types of the project-token login exchange.

use serde::{Deserialize, Serialize};

use crate::credential::Credential;

/// Appended to the endpoint template to reach the login handler.
///
/// The login request carries no identity headers; the credential travels in the body.
pub const LOGIN_PATH: &str =
    "/identifier-handler?handler=gs2_identifier%2Fhandler%2FProjectTokenFunctionHandler.login";

/// Service hosting the login handler.
pub const LOGIN_SERVICE: &str = "identifier";

pub const LOGIN_FUNCTION: &str = "login";

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<&'a str>,
}

impl<'a> From<&'a Credential> for LoginRequest<'a> {
    fn from(credential: &'a Credential) -> Self {
        Self {
            client_id: credential.client_id(),
            client_secret: credential.client_secret(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LoginResult {
    pub item: ProjectToken,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ProjectToken {
    pub token: String,
}
