//! Frontend Errors
//!
//! Every fatal condition the frontend can hit, with the process exit code
//! reported for it.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::loader::ResultStatus;

/// Exit code used by clap for usage errors (including a bad `--gdbport`)
pub const EXIT_USAGE: u8 = 2;

/// Fatal frontend errors
#[derive(Error, Debug)]
pub enum FrontendError {
    /// `--rebind` named a key that is not in the binding catalog
    #[error("\"{name}\" is not a valid key name. See `{program} -l` for a list of key names.")]
    UnknownKeyName { name: String, program: String },

    /// No boot target was given on the command line
    #[error("Failed to load ROM: No ROM specified")]
    NoTarget,

    /// Window or renderer could not be created
    #[error("Failed to create SDL2 window: {0}")]
    Window(String),

    /// No loader recognises the boot target
    #[error("Failed to obtain loader for {}!", .0.display())]
    NoLoader(PathBuf),

    /// The loader could not tell which system mode the image needs
    #[error("Failed to load ROM (Could not determine system mode)!")]
    SystemMode,

    /// The loader rejected the image
    #[error("Failed to load ROM (Error {})!", .0.code())]
    Load(ResultStatus),

    /// Reading or writing the configuration store failed
    #[error("Configuration error: {0:#}")]
    Config(anyhow::Error),

    /// Writing to standard output failed
    #[error("Failed to write output: {0}")]
    Output(#[from] io::Error),
}

impl FrontendError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            FrontendError::UnknownKeyName { .. } => 3,
            FrontendError::NoTarget => 4,
            FrontendError::Window(_) => 5,
            FrontendError::NoLoader(_) => 6,
            FrontendError::SystemMode => 7,
            FrontendError::Load(_) => 8,
            FrontendError::Config(_) => 9,
            FrontendError::Output(_) => 10,
        }
    }
}

impl From<anyhow::Error> for FrontendError {
    fn from(err: anyhow::Error) -> Self {
        FrontendError::Config(err)
    }
}

/// Frontend result type
pub type Result<T> = std::result::Result<T, FrontendError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_exit_codes_are_distinct_and_nonzero() {
        let errors = [
            FrontendError::UnknownKeyName {
                name: "x".into(),
                program: "ctrfront".into(),
            },
            FrontendError::NoTarget,
            FrontendError::Window("no display".into()),
            FrontendError::NoLoader(PathBuf::from("a.rom")),
            FrontendError::SystemMode,
            FrontendError::Load(ResultStatus::ErrorEncrypted),
            FrontendError::Config(anyhow::anyhow!("disk full")),
            FrontendError::Output(io::Error::new(io::ErrorKind::BrokenPipe, "closed")),
        ];

        let codes: HashSet<u8> = errors.iter().map(|e| e.exit_code()).collect();
        assert_eq!(codes.len(), errors.len());
        assert!(!codes.contains(&0));
        assert!(!codes.contains(&EXIT_USAGE));
    }

    #[test]
    fn test_messages() {
        let err = FrontendError::UnknownKeyName {
            name: "pad_q".into(),
            program: "ctrfront".into(),
        };
        assert_eq!(
            err.to_string(),
            "\"pad_q\" is not a valid key name. See `ctrfront -l` for a list of key names."
        );

        let err = FrontendError::NoLoader(PathBuf::from("game.bin"));
        assert_eq!(err.to_string(), "Failed to obtain loader for game.bin!");

        let err = FrontendError::Load(ResultStatus::ErrorEncrypted);
        assert_eq!(err.to_string(), "Failed to load ROM (Error 4)!");
    }
}
