//! Slash-separated document paths.

use std::fmt;
use stepwise_core::error::{Result, StepwiseError};

/// A validated document path such as `user_progress/u1/tasks/t1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentPath {
    segments: Vec<String>,
}

impl DocumentPath {
    /// Builds a path from its segments.
    ///
    /// # Errors
    ///
    /// Returns `DataAccess` for an empty path or a segment that is empty,
    /// contains `/` or `\`, or is `.`/`..`.
    pub fn new<I, S>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(StepwiseError::data_access("document path is empty"));
        }
        for segment in &segments {
            if segment.is_empty()
                || segment == "."
                || segment == ".."
                || segment.contains('/')
                || segment.contains('\\')
            {
                return Err(StepwiseError::data_access(format!(
                    "invalid document path segment '{}'",
                    segment
                )));
            }
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_joins_segments() {
        let path = DocumentPath::new(["user_progress", "u1", "tasks", "t1"]).unwrap();
        assert_eq!(path.to_string(), "user_progress/u1/tasks/t1");
    }

    #[test]
    fn test_rejects_traversal_and_separators() {
        assert!(DocumentPath::new(Vec::<String>::new()).is_err());
        assert!(DocumentPath::new(["a", ".."]).is_err());
        assert!(DocumentPath::new(["a", "b/c"]).is_err());
        assert!(DocumentPath::new(["a", ""]).is_err());
    }
}
