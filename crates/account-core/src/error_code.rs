//! Error codes reported by the service and by the client itself
//!
//! The service attaches a numeric `error_code` to failed responses. The
//! account layer only needs two classifications of a failure: the credential
//! was rejected ([`ApiError::is_invalid_token`]) or the service is down
//! ([`ApiError::is_service_unavailable`]). The full catalogue is kept here so
//! callers can match on specific failures.

use serde::{Deserialize, Serialize};

macro_rules! numeric_codes {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $( $(#[$vmeta:meta])* $variant:ident = $value:literal, )* }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $value, )*
        }

        impl $name {
            /// Look up a code by its numeric value
            pub fn from_code(code: i64) -> Option<Self> {
                match code {
                    $( $value => Some(Self::$variant), )*
                    _ => None,
                }
            }

            pub fn code(self) -> i64 {
                self as i64
            }
        }
    };
}

numeric_codes! {
    /// Codes returned by the service in the `error_code` field
    pub enum VimeoErrorCode {
        // Upload
        UploadStorageQuotaExceeded = 4101,
        UploadDailyQuotaExceeded = 4102,

        /// Root code for every invalid-parameter error below
        InvalidRequestInput = 2204,

        // Password-protected video playback
        VideoPasswordIncorrect = 2222,
        NoVideoPasswordProvided = 2223,

        // Authentication
        EmailTooLong = 2216,
        PasswordTooShort = 2210,
        PasswordTooSimple = 2211,
        NameInPassword = 2212,
        EmailNotRecognized = 2217,
        PasswordEmailMismatch = 2218,
        NoPasswordProvided = 2209,
        NoEmailProvided = 2214,
        InvalidEmail = 2215,
        NoNameProvided = 2213,
        NameTooLong = 2208,
        FacebookJoinInvalidToken = 2303,
        FacebookJoinNoToken = 2306,
        FacebookJoinMissingProperty = 2304,
        FacebookJoinMalformedToken = 2305,
        FacebookJoinDecryptFail = 2307,
        FacebookJoinTokenTooLong = 2308,
        FacebookLogInNoToken = 2312,
        FacebookLogInMissingProperty = 2310,
        FacebookLogInMalformedToken = 2311,
        FacebookLogInDecryptFail = 2313,
        FacebookLogInTokenTooLong = 2314,
        FacebookInvalidInputGrantType = 2221,
        FacebookJoinValidateTokenFail = 2315,
        FacebookInvalidNoInput = 2207,
        FacebookInvalidToken = 2300,
        FacebookMissingProperty = 2301,
        FacebookMalformedToken = 2302,
        EmailAlreadyRegistered = 2400,
        EmailBlocked = 2401,
        EmailSpammer = 2402,
        EmailPurgatory = 2403,
        UrlUnavailable = 2404,
        Timeout = 5000,
        TokenNotGenerated = 5001,
    }
}

numeric_codes! {
    /// HTTP statuses the client reacts to
    pub enum HttpStatusCode {
        ServiceUnavailable = 503,
        BadRequest = 400,
        Unauthorized = 401,
        Forbidden = 403,
    }
}

numeric_codes! {
    /// Failures raised on the client side
    pub enum LocalErrorCode {
        Undefined = 9000,
        InvalidResponseDictionary = 9001,
        RequestMalformed = 9002,
        CachedResponseNotFound = 9003,
        AuthToken = 9004,
        CodeGrant = 9005,
        CodeGrantState = 9006,
        NoResponse = 9007,
        PinCodeInfo = 9008,
        PinCodeExpired = 9009,
    }
}

/// Challenge the service sends with a 401 for a revoked or expired token
const INVALID_TOKEN_CHALLENGE: &str = "error=\"invalid_token\"";

/// A failed API response as seen by the account layer
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ApiError {
    /// HTTP status of the response
    pub http_status: Option<u16>,
    /// `error_code` from the response body
    pub server_code: Option<i64>,
    /// Value of the `WWW-Authenticate` response header
    pub www_authenticate: Option<String>,
    pub message: Option<String>,
}

impl ApiError {
    pub fn from_status(http_status: u16) -> Self {
        Self {
            http_status: Some(http_status),
            ..Default::default()
        }
    }

    pub fn with_server_code(mut self, code: i64) -> Self {
        self.server_code = Some(code);
        self
    }

    pub fn with_www_authenticate(mut self, challenge: impl Into<String>) -> Self {
        self.www_authenticate = Some(challenge.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn status(&self) -> Option<HttpStatusCode> {
        self.http_status.and_then(|status| HttpStatusCode::from_code(status.into()))
    }

    pub fn vimeo_code(&self) -> Option<VimeoErrorCode> {
        self.server_code.and_then(VimeoErrorCode::from_code)
    }

    pub fn local_code(&self) -> Option<LocalErrorCode> {
        self.server_code.and_then(LocalErrorCode::from_code)
    }

    /// The service rejected the access token itself
    pub fn is_invalid_token(&self) -> bool {
        self.status() == Some(HttpStatusCode::Unauthorized)
            && self
                .www_authenticate
                .as_deref()
                .is_some_and(|challenge| challenge.contains(INVALID_TOKEN_CHALLENGE))
    }

    pub fn is_service_unavailable(&self) -> bool {
        self.status() == Some(HttpStatusCode::ServiceUnavailable)
    }
}
