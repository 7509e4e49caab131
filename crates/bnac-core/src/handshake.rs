//! Handshake state machine.
//!
//! The BNAC handshake is a fixed sequence of five request/response
//! exchanges. Each step sends one request and accepts exactly one response
//! status; anything else is fatal.
//!
//! # State Machine
//!
//! ```text
//! ┌──────┐ start ┌───────────┐ 601 ┌────────────┐ 603 ┌─────────────┐
//! │ Idle │──────>│ AskEncode │────>│ OpenSesame │────>│ SesameValue │
//! └──────┘       └───────────┘     └────────────┘     └─────────────┘
//!                                                            │ 604
//!                ┌──────────┐ 220  ┌──────┐  288             ↓
//!                │ Complete │<─────│ Push │<─────────────┌──────┐
//!                └──────────┘      └──────┘              │ Auth │
//!                                                        └──────┘
//!        any other status / missing field ──> Failed
//! ```
//!
//! # Step table
//!
//! Every step is a row in [`STEPS`]: the request it builds, the status it
//! expects, and the response fields it must extract. One generic routine,
//! [`Handshake::handle_response`], walks the table. Extracted fields are
//! accumulated and later steps (PUSH) read them back.
//!
//! This is a pure state machine: no I/O, no clock. See
//! [`crate::driver::perform_handshake`] for the async driver.

use std::{fmt, net::SocketAddr};

use bnac_crypto::{address_without_port, push_token};
use bnac_proto::Message;

use crate::{error::HandshakeError, session::Session};

/// Response field carrying the session id.
pub const FIELD_SESSION_ID: &str = "SESSION_ID";

/// Response field carrying the role.
pub const FIELD_ROLE: &str = "ROLE";

/// One exchange of the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandshakeStep {
    /// Announce platform, version and client id
    AskEncode,
    /// Present the sesame checksum
    OpenSesame,
    /// Present the sesame value
    SesameValue,
    /// Send user and encrypted password
    Auth,
    /// Confirm the session with the derived token
    Push,
}

impl HandshakeStep {
    /// All steps in protocol order.
    pub const ALL: [Self; 5] =
        [Self::AskEncode, Self::OpenSesame, Self::SesameValue, Self::Auth, Self::Push];

    /// Request message name.
    pub fn command(self) -> &'static str {
        match self {
            Self::AskEncode => "ASK_ENCODE",
            Self::OpenSesame => "OPEN_SESAME",
            Self::SesameValue => "SESAME_VALUE",
            Self::Auth => "AUTH",
            Self::Push => "PUSH",
        }
    }

    /// Table row for this step.
    pub fn def(self) -> &'static StepDef {
        &STEPS[self.index()]
    }

    /// Step that follows this one, if any.
    pub fn next(self) -> Option<Self> {
        Self::ALL.get(self.index() + 1).copied()
    }

    fn index(self) -> usize {
        match self {
            Self::AskEncode => 0,
            Self::OpenSesame => 1,
            Self::SesameValue => 2,
            Self::Auth => 3,
            Self::Push => 4,
        }
    }
}

impl fmt::Display for HandshakeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.command())
    }
}

/// Builds a step's request from the handshake's inputs and accumulated
/// fields.
pub type RequestBuilder = fn(&Handshake) -> Result<Message, HandshakeError>;

/// One row of the step table.
#[derive(Debug)]
pub struct StepDef {
    /// Step this row describes
    pub step: HandshakeStep,
    /// Builds the request
    pub build_request: RequestBuilder,
    /// Required response status
    pub expected_response: &'static str,
    /// Response parameters that must be present; their values are kept
    pub required_fields: &'static [&'static str],
}

/// The handshake, in protocol order.
pub static STEPS: [StepDef; 5] = [
    StepDef {
        step: HandshakeStep::AskEncode,
        build_request: Handshake::ask_encode_request,
        expected_response: "601",
        required_fields: &[],
    },
    StepDef {
        step: HandshakeStep::OpenSesame,
        build_request: Handshake::open_sesame_request,
        expected_response: "603",
        required_fields: &[],
    },
    StepDef {
        step: HandshakeStep::SesameValue,
        build_request: Handshake::sesame_value_request,
        expected_response: "604",
        required_fields: &[],
    },
    StepDef {
        step: HandshakeStep::Auth,
        build_request: Handshake::auth_request,
        expected_response: "288",
        required_fields: &[FIELD_SESSION_ID, FIELD_ROLE],
    },
    StepDef {
        step: HandshakeStep::Push,
        build_request: Handshake::push_request,
        expected_response: "220",
        required_fields: &[],
    },
];

/// Constant request fields.
///
/// Defaults match what the server expects from the macOS client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeConfig {
    /// `PLATFORM` in ASK_ENCODE
    pub platform: String,
    /// `VERSION` in ASK_ENCODE
    pub version: String,
    /// `SESAME_MD5` in OPEN_SESAME
    pub sesame_md5: String,
    /// `VALUE` in SESAME_VALUE
    pub sesame_value: String,
    /// `OS` in AUTH
    pub os: String,
    /// `AUTH_TYPE` in AUTH (and in every keepalive)
    pub auth_type: String,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            platform: "MAC".to_string(),
            version: "1.0.1.22".to_string(),
            sesame_md5: "INVALID MD5".to_string(),
            sesame_value: "0".to_string(),
            os: "MAC".to_string(),
            auth_type: "DOMAIN".to_string(),
        }
    }
}

/// User name and already-encrypted password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// `USER` in AUTH
    pub user: String,
    /// `PASS` in AUTH: hex ciphertext from the password cipher
    pub encrypted_password: String,
}

/// Handshake state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    /// Not started
    Idle,
    /// Request for this step sent, waiting for its response
    Awaiting(HandshakeStep),
    /// All steps succeeded
    Complete,
    /// A step failed; terminal
    Failed,
}

/// Actions returned by the handshake state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeAction {
    /// Send this request to the server
    Send(Message),
    /// Handshake finished; close the connection and keep the session
    Complete(Session),
}

/// Handshake state machine.
#[derive(Debug, Clone)]
pub struct Handshake {
    state: HandshakeState,
    config: HandshakeConfig,
    credentials: Credentials,
    client_id: String,
    /// Client side of the handshake connection (feeds the PUSH token)
    local_addr: SocketAddr,
    /// Values of `required_fields` collected so far
    fields: Vec<(&'static str, String)>,
}

impl Handshake {
    /// Create a handshake in `Idle` state.
    pub fn new(
        config: HandshakeConfig,
        credentials: Credentials,
        client_id: impl Into<String>,
        local_addr: SocketAddr,
    ) -> Self {
        Self {
            state: HandshakeState::Idle,
            config,
            credentials,
            client_id: client_id.into(),
            local_addr,
            fields: Vec::new(),
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// Step waiting for a response, if any.
    #[must_use]
    pub fn current_step(&self) -> Option<HandshakeStep> {
        match self.state {
            HandshakeState::Awaiting(step) => Some(step),
            _ => None,
        }
    }

    /// Value extracted from an earlier response.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.iter().find(|(n, _)| *n == name).map(|(_, v)| v.as_str())
    }

    /// Begin the handshake.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless in `Idle`.
    pub fn start(&mut self) -> Result<Vec<HandshakeAction>, HandshakeError> {
        if self.state != HandshakeState::Idle {
            return Err(HandshakeError::InvalidState { state: self.state, operation: "start" });
        }
        self.enter(HandshakeStep::AskEncode)
    }

    /// Process the response to the current step.
    ///
    /// Returns the next request, or [`HandshakeAction::Complete`] after the
    /// last step. Any failure moves the machine to `Failed`.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if no step is waiting for a response
    /// - `UnexpectedResponse` if the status does not match the step
    /// - `MissingField` if a required parameter is absent
    pub fn handle_response(
        &mut self,
        response: &Message,
    ) -> Result<Vec<HandshakeAction>, HandshakeError> {
        let HandshakeState::Awaiting(step) = self.state else {
            return Err(HandshakeError::InvalidState {
                state: self.state,
                operation: "handle_response",
            });
        };

        let result = self.accept_response(step, response);
        if result.is_err() {
            self.state = HandshakeState::Failed;
        }
        result
    }

    fn accept_response(
        &mut self,
        step: HandshakeStep,
        response: &Message,
    ) -> Result<Vec<HandshakeAction>, HandshakeError> {
        let def = step.def();

        if response.name() != def.expected_response {
            return Err(HandshakeError::UnexpectedResponse {
                step,
                expected: def.expected_response,
                actual: response.name().to_string(),
            });
        }

        for &field in def.required_fields {
            let value =
                response.get(field).ok_or(HandshakeError::MissingField { step, field })?;
            self.fields.push((field, value.to_string()));
        }

        match step.next() {
            Some(next) => self.enter(next),
            None => {
                let session = self.session_from_fields(step)?;
                self.state = HandshakeState::Complete;
                Ok(vec![HandshakeAction::Complete(session)])
            },
        }
    }

    fn enter(&mut self, step: HandshakeStep) -> Result<Vec<HandshakeAction>, HandshakeError> {
        let request = match (step.def().build_request)(self) {
            Ok(request) => request,
            Err(e) => {
                self.state = HandshakeState::Failed;
                return Err(e);
            },
        };
        self.state = HandshakeState::Awaiting(step);
        Ok(vec![HandshakeAction::Send(request)])
    }

    fn session_from_fields(&self, step: HandshakeStep) -> Result<Session, HandshakeError> {
        let session_id = self.required_field(step, FIELD_SESSION_ID)?;
        let role = self.required_field(step, FIELD_ROLE)?;
        Ok(Session::new(session_id, role))
    }

    fn required_field(
        &self,
        step: HandshakeStep,
        field: &'static str,
    ) -> Result<&str, HandshakeError> {
        self.field(field).ok_or(HandshakeError::MissingField { step, field })
    }

    fn ask_encode_request(&self) -> Result<Message, HandshakeError> {
        Ok(Message::new(HandshakeStep::AskEncode.command())
            .with_param("PLATFORM", self.config.platform.as_str())
            .with_param("VERSION", self.config.version.as_str())
            .with_param("CLIENTID", self.client_id.as_str()))
    }

    fn open_sesame_request(&self) -> Result<Message, HandshakeError> {
        Ok(Message::new(HandshakeStep::OpenSesame.command())
            .with_param("SESAME_MD5", self.config.sesame_md5.as_str()))
    }

    fn sesame_value_request(&self) -> Result<Message, HandshakeError> {
        Ok(Message::new(HandshakeStep::SesameValue.command())
            .with_param("VALUE", self.config.sesame_value.as_str()))
    }

    fn auth_request(&self) -> Result<Message, HandshakeError> {
        Ok(Message::new(HandshakeStep::Auth.command())
            .with_param("OS", self.config.os.as_str())
            .with_param("USER", self.credentials.user.as_str())
            .with_param("PASS", self.credentials.encrypted_password.as_str())
            .with_param("AUTH_TYPE", self.config.auth_type.as_str()))
    }

    fn push_request(&self) -> Result<Message, HandshakeError> {
        let session_id = self.required_field(HandshakeStep::Push, FIELD_SESSION_ID)?;
        let role = self.required_field(HandshakeStep::Push, FIELD_ROLE)?;
        let token = push_token(session_id, &address_without_port(&self.local_addr));

        Ok(Message::new(HandshakeStep::Push.command())
            .with_param("TIME", token)
            .with_param("SESSIONID", session_id)
            .with_param("ROLE", role))
    }
}
