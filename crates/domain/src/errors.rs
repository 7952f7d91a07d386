use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum DomainError {
    #[error("invalid upstream address '{0}'")]
    InvalidUpstreamAddress(String),

    #[error("invalid DNS message: {0}")]
    InvalidDnsMessage(String),

    #[error("timeout sending to {server}")]
    TransportSendTimeout { server: String },

    #[error("timeout waiting for response from {server}")]
    TransportReadTimeout { server: String },

    #[error("transport I/O with {server}: {message}")]
    TransportIo { server: String, message: String },

    #[error("response id {got:#06x} does not match query id {want:#06x}")]
    ResponseIdMismatch { got: u16, want: u16 },

    #[error("configuration error: {0}")]
    ConfigError(String),
}
