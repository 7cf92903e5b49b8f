use crazyflie_link::Packet;

/// [Result] alias for return types of the crate API
pub type Result<T> = std::result::Result<T, Error>;

/// Error enum type
#[derive(Debug)]
pub enum Error {
    /// Crazyflie link error. Returns the [error from the Link](crazyflie_link::Error).
    LinkError(crazyflie_link::Error),
    /// The Crazyflie object is currently disconnected.
    Disconnected,
    /// Error with the async runtime.
    SystemError(String),
    /// A radio address could not be parsed. The String contains the rejected input.
    InvalidAddress(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::LinkError(e) => write!(f, "link error: {:?}", e),
            Error::Disconnected => write!(f, "the Crazyflie is disconnected"),
            Error::SystemError(reason) => write!(f, "system error: {}", reason),
            Error::InvalidAddress(input) => {
                write!(f, "invalid radio address \"{}\", expected 10 hex digits", input)
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<crazyflie_link::Error> for Error {
    fn from(error: crazyflie_link::Error) -> Self {
        Self::LinkError(error)
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(error: tokio::task::JoinError) -> Self {
        Self::SystemError(format!("{}", error))
    }
}

impl From<flume::SendError<Packet>> for Error {
    fn from(_: flume::SendError<Packet>) -> Self {
        self::Error::Disconnected
    }
}
