use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckoutError {
    #[error("not in a git repository - please run this command from within a git repository")]
    NotARepository,

    #[error("git version {version} is too old. Please upgrade to git 2.22.0 or later")]
    UnsupportedToolVersion { version: String },

    #[error("could not parse git version from: {0}")]
    UnrecognizedVersion(String),

    #[error("`git {command}` failed: {stderr}")]
    QueryFailed { command: String, stderr: String },

    #[error("checkout of '{target}' failed: {reason}")]
    CheckoutFailed { target: String, reason: String },

    #[error("Branch selection failed: {0}")]
    Selection(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CheckoutError>;
