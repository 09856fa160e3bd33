use serde::Serialize;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Clone, Debug, Serialize, strum_macros::AsRefStr)]
#[serde(tag = "type", content = "data")]
pub enum Error {
    //General
    NotImplemented,

    //Config
    ConfigRead { path: String, cause: String },
    ConfigParse { path: String, cause: String },
    GatewayNotConfigured { name: String },
    UnsupportedProvider { provider: String },

    //LLM
    LlmRequest { gateway: String, cause: String },
    LlmTimeout { gateway: String },
    LlmStatus { gateway: String, status: u16, body: String },
    LlmResponse { gateway: String, cause: String },

    //Directory
    DirectoryAuth { cause: String },
    DirectoryRequest { cause: String },
    DirectoryStatus { path: String, status: u16, body: String },
    DirectorySeed { cause: String },

    //Agent
    AgentNotRegistered { issue_type: String },

    //Tool
    ToolInput { tool: String, cause: String },

    //Prompt
    PromptRender { kind: String, cause: String },
    PromptVariableMissing { kind: String, variable: String },

    //Session
    SessionNotFound { session_id: String },
    MemoryStore { cause: String },
}

impl Error {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::LlmTimeout { .. })
    }

    /// Maps an internal error to what an HTTP client is allowed to see.
    pub fn client_status_and_error(&self) -> (u16, ClientError) {
        match self {
            Error::SessionNotFound { .. } => (404, ClientError::NOT_FOUND),
            Error::ToolInput { .. } | Error::PromptVariableMissing { .. } => {
                (400, ClientError::INVALID_PARAMS)
            }
            Error::DirectoryAuth { .. } => (502, ClientError::NO_AUTH),
            Error::NotImplemented | Error::UnsupportedProvider { .. } => {
                (501, ClientError::UNSUPPORTED)
            }
            _ => (500, ClientError::SERVICE_ERROR),
        }
    }
}

// region:    --- Error Boilerplate
impl core::fmt::Display for Error {
    fn fmt(
        &self,
        fmt: &mut core::fmt::Formatter,
    ) -> core::result::Result<(), core::fmt::Error> {
        write!(fmt, "{self:?}")
    }
}

impl std::error::Error for Error {}
// endregion: --- Error Boilerplate

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::AsRefStr)]
#[allow(non_camel_case_types)]
pub enum ClientError {
    NO_AUTH,
    NOT_FOUND,
    UNSUPPORTED,
    INVALID_PARAMS,
    SERVICE_ERROR,
}
