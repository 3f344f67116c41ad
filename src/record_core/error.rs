//! Terminal pipeline errors

use std::path::PathBuf;

#[derive(Debug)]
pub enum PipelineError {
    /// Input path missing or unreadable. Raised before any element is produced.
    ResourceNotFound {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Malformed JSON while scanning the top-level array
    Parse {
        offset: u64,
        element: Option<usize>,
        message: String,
    },
    /// Record passed grouping but carries no `id`
    MalformedRecord { element: usize, key: String },
    /// Read failure after the input was opened
    Io(std::io::Error),
}

impl PipelineError {
    pub fn parse(offset: u64, element: Option<usize>, message: impl Into<String>) -> Self {
        PipelineError::Parse {
            offset,
            element,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::ResourceNotFound { .. } => "ResourceNotFoundError",
            PipelineError::Parse { .. } => "ParseError",
            PipelineError::MalformedRecord { .. } => "MalformedRecordError",
            PipelineError::Io(_) => "IoError",
        }
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::Io(err)
    }
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::ResourceNotFound { path, source } => {
                write!(f, "cannot open '{}': {}", path.display(), source)
            }
            PipelineError::Parse {
                offset,
                element: Some(element),
                message,
            } => write!(
                f,
                "JSON parse error in element {} at byte {}: {}",
                element, offset, message
            ),
            PipelineError::Parse {
                offset,
                element: None,
                message,
            } => write!(f, "JSON parse error at byte {}: {}", offset, message),
            PipelineError::MalformedRecord { element, key } => write!(
                f,
                "record at element {} with combination {} has no 'id'",
                element, key
            ),
            PipelineError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::ResourceNotFound { source, .. } => Some(source),
            PipelineError::Io(e) => Some(e),
            _ => None,
        }
    }
}
