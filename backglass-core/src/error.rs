//! Error types for backglass-core.

use std::fmt;

use thiserror::Error;

/// Why a loop-set layer's sound reference was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceProblem {
    /// No sound asset with that name is registered.
    Missing,
    /// The sound exists but is streamed from disk instead of held in memory.
    Streaming,
}

impl fmt::Display for ReferenceProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceProblem::Missing => write!(f, "an invalid sound asset name"),
            ReferenceProblem::Streaming => write!(
                f,
                "a streaming sound asset (only in-memory sounds are supported in loop sets)"
            ),
        }
    }
}

/// Main error type for the backglass-core library.
#[derive(Error, Debug)]
pub enum Error {
    // Config file errors
    #[error("Failed to load config '{0}': {1}")]
    ConfigLoad(String, String),

    #[error("Failed to parse config '{0}': {1}")]
    ConfigParse(String, String),

    #[error("Failed to acquire cache lock")]
    CacheLock,

    // Validation errors
    #[error("Config validation error in '{0}': {1}")]
    ConfigValidation(String, String),

    #[error("Invalid structure in '{0}': {1}")]
    Structural(String, String),

    #[error("The '{loop_set}' sound_loop_set references {problem} '{sound}' in one of its layers")]
    Reference {
        loop_set: String,
        sound: String,
        problem: ReferenceProblem,
    },

    #[error("{0} features are not enabled")]
    FeatureDisabled(String),

    /// Context wrapper added by a collection around an entry's failure.
    #[error("An error occurred while processing the '{entry}' entry in the {collection} config collection: {source}")]
    CollectionEntry {
        collection: &'static str,
        entry: String,
        #[source]
        source: Box<Error>,
    },

    // Effect errors
    #[error("'{0}' is not a valid widget effect type. Did you misspell it, or forget to enable it in the 'effects: modules' section of your machine config?")]
    UnknownEffect(String),

    #[error("Invalid effect module '{0}': {1}")]
    Registration(String, String),

    #[error("Invalid widget effects config: {0}")]
    MalformedEffect(String),

    // Generic errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Returns the innermost error, looking through collection context wrappers.
    pub fn root(&self) -> &Error {
        match self {
            Error::CollectionEntry { source, .. } => source.root(),
            other => other,
        }
    }

    /// True for any registration failure: an unknown effect type or a bad module.
    pub fn is_registration(&self) -> bool {
        matches!(
            self.root(),
            Error::UnknownEffect(_) | Error::Registration(_, _)
        )
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_message_names_set_and_sound() {
        let err = Error::Reference {
            loop_set: "basic_beat".to_string(),
            sound: "kick".to_string(),
            problem: ReferenceProblem::Streaming,
        };
        let msg = err.to_string();
        assert!(msg.contains("basic_beat"));
        assert!(msg.contains("'kick'"));
        assert!(msg.contains("streaming"));
    }

    #[test]
    fn test_root_unwraps_collection_context() {
        let err = Error::CollectionEntry {
            collection: "animations",
            entry: "fade".to_string(),
            source: Box::new(Error::UnknownEffect("bogus".to_string())),
        };
        assert!(err.to_string().contains("'fade' entry in the animations"));
        assert!(matches!(err.root(), Error::UnknownEffect(name) if name == "bogus"));
        assert!(err.is_registration());
    }
}
