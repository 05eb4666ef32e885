use std::{io, path::PathBuf};

/// Error produced while building layouts, shaders and pipelines.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Argument has a value that can never be valid.
    #[error("invalid argument `{name}`: {message}")]
    InvalidArgument { name: &'static str, message: String },

    /// Required object is missing or was never populated.
    #[error("argument `{name}` is not initialized: {message}")]
    NotInitialized { name: &'static str, message: String },

    /// Lookup of something that was never registered.
    #[error("argument `{name}` is out of range: {message}")]
    OutOfRange { name: &'static str, message: String },

    /// Native API call failed.
    #[error("{backend} call failed with code {code}: {message}")]
    Native {
        backend: &'static str,
        code: i64,
        message: String,
    },

    #[error("unable to open shader file `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
}

impl Error {
    pub(crate) fn invalid(name: &'static str, message: impl Into<String>) -> Self {
        Error::InvalidArgument {
            name,
            message: message.into(),
        }
    }

    pub(crate) fn not_initialized(name: &'static str, message: impl Into<String>) -> Self {
        Error::NotInitialized {
            name,
            message: message.into(),
        }
    }

    pub(crate) fn out_of_range(name: &'static str, message: impl Into<String>) -> Self {
        Error::OutOfRange {
            name,
            message: message.into(),
        }
    }

    /// Name of the offending argument, if the error is about one.
    pub fn argument(&self) -> Option<&'static str> {
        match self {
            Error::InvalidArgument { name, .. }
            | Error::NotInitialized { name, .. }
            | Error::OutOfRange { name, .. } => Some(*name),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_argument() {
        let err = Error::invalid("binding", "binding 2 is used twice");
        assert_eq!(
            err.to_string(),
            "invalid argument `binding`: binding 2 is used twice"
        );
        assert_eq!(err.argument(), Some("binding"));

        let err = Error::Native {
            backend: "vulkan",
            code: -2,
            message: "out of device memory".to_owned(),
        };
        assert_eq!(err.argument(), None);
        assert!(err.to_string().contains("-2"));
    }
}
