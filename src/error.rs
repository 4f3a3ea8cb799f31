use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("timed out after {waited:?} waiting for network availability")]
    AcquireTimeout { waited: Duration },

    #[error("connectivity provider could not satisfy the network request")]
    NetworkUnavailable,

    #[error("leased network was lost before the operation completed")]
    NetworkLost,

    #[error("connectivity provider error: {0}")]
    Provider(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
