//! Logical paths: the backend-independent address of a file or directory.

use std::fmt;

/// Errors related to path parsing and validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// A path segment is not allowed.
    InvalidSegment {
        segment: String,
        position: usize,
        message: String,
    },
    /// The path is not valid for the requested operation.
    InvalidPath { message: String },
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathError::InvalidSegment {
                segment,
                position,
                message,
            } => {
                write!(
                    f,
                    "invalid path segment '{}' at position {}: {}",
                    segment, position, message
                )
            }
            PathError::InvalidPath { message } => {
                write!(f, "invalid path: {}", message)
            }
        }
    }
}

impl std::error::Error for PathError {}

/// A forward-slash delimited path inside a filesystem backend.
///
/// The last segment is the leaf (a file or a directory); every preceding
/// segment names a directory in the containment chain. The empty path is the
/// backend root.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct LogicalPath {
    segments: Vec<String>,
}

impl LogicalPath {
    /// Parse a path string.
    ///
    /// # Path Syntax
    ///
    /// - Segments are separated by `/`
    /// - Empty segments are dropped (normalizes leading, trailing and `//`)
    /// - `.` and `..` are rejected, as are backslashes, drive letters (`:`)
    ///   and control characters
    ///
    /// # Examples
    ///
    /// ```rust
    /// use resfs_vfs::LogicalPath;
    ///
    /// let path = LogicalPath::parse("textures/wood.png").unwrap();
    /// assert_eq!(path.len(), 2);
    /// assert_eq!(path.leaf(), Some("wood.png"));
    ///
    /// assert_eq!(
    ///     LogicalPath::parse("/a//b/").unwrap(),
    ///     LogicalPath::parse("a/b").unwrap()
    /// );
    /// ```
    pub fn parse(s: &str) -> Result<Self, PathError> {
        let segments: Vec<String> = s
            .split('/')
            .filter(|c| !c.is_empty())
            .map(|c| c.to_string())
            .collect();

        for (i, segment) in segments.iter().enumerate() {
            Self::validate_segment(segment, i)?;
        }

        Ok(LogicalPath { segments })
    }

    /// The root path (no segments).
    pub fn root() -> Self {
        Self::default()
    }

    /// Build a path from already split segments, validating each.
    pub fn try_from_segments<I, S>(segments: I) -> Result<Self, PathError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        for (i, segment) in segments.iter().enumerate() {
            Self::validate_segment(segment, i)?;
        }
        Ok(LogicalPath { segments })
    }

    fn validate_segment(segment: &str, position: usize) -> Result<(), PathError> {
        let reject = |message: &str| {
            Err(PathError::InvalidSegment {
                segment: segment.to_string(),
                position,
                message: message.to_string(),
            })
        };

        if segment.is_empty() {
            return reject("empty segment");
        }
        if segment == "." || segment == ".." {
            return reject("relative segments are not supported");
        }
        if segment.contains('/') {
            return reject("separator inside segment");
        }
        if segment.contains('\\') {
            return reject("backslashes are not supported");
        }
        if segment.contains(':') {
            return reject("drive letters and ':' are not supported");
        }
        if let Some(c) = segment.chars().find(|c| c.is_control()) {
            return reject(&format!("control character {:?}", c));
        }

        Ok(())
    }

    /// Check if this is the root path.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Same as [`LogicalPath::is_root`].
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Iterate over segments.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(String::as_str)
    }

    /// The leaf name, `None` for the root.
    pub fn leaf(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// The containing directory, `None` for the root.
    pub fn parent(&self) -> Option<LogicalPath> {
        if self.segments.is_empty() {
            return None;
        }
        Some(LogicalPath {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Every proper, non-root prefix, outermost first.
    ///
    /// For `a/b/c` this yields `a` then `a/b`.
    pub fn ancestors(&self) -> impl Iterator<Item = LogicalPath> + '_ {
        (1..self.segments.len()).map(move |n| LogicalPath {
            segments: self.segments[..n].to_vec(),
        })
    }

    /// Join this path with another.
    #[must_use]
    pub fn join(&self, other: &LogicalPath) -> LogicalPath {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        LogicalPath { segments }
    }

    /// Append a single segment.
    pub fn child(&self, name: &str) -> Result<LogicalPath, PathError> {
        Self::validate_segment(name, self.segments.len())?;
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Ok(LogicalPath { segments })
    }

    /// Fail with `InvalidPath` if this is the root.
    ///
    /// File operations need a leaf to act on.
    pub fn require_leaf(&self) -> Result<&str, PathError> {
        self.leaf().ok_or_else(|| PathError::InvalidPath {
            message: "operation requires a non-root path".to_string(),
        })
    }
}

impl fmt::Display for LogicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

impl std::str::FromStr for LogicalPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LogicalPath::parse(s)
    }
}

impl serde::Serialize for LogicalPath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for LogicalPath {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        LogicalPath::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Macro for creating paths from literals.
///
/// # Example
///
/// ```rust
/// use resfs_vfs::lpath;
///
/// let p = lpath!("models/cube.glb");
/// assert_eq!(p.len(), 2);
/// ```
#[macro_export]
macro_rules! lpath {
    ($s:expr) => {
        $crate::LogicalPath::parse($s).expect("invalid path literal")
    };
}
