//! Path type and the order-preserving key encoding.
//!
//! A path is written `/users/alice/#0`: components separated by `/`, array
//! indices prefixed with `#`. A trailing `.` marks the container header
//! (`/users/.`), a trailing `*` selects all direct children (`/users/*`).
//!
//! Keys are built so that byte-wise order equals pre-order tree order:
//!
//! - the root sentinel is `0x00`
//! - every component contributes `0x01` followed by its encoded form
//! - an index is `#` plus 10 zero-padded digits, so indices compare numerically
//!
//! `0x01` sorts below every byte a member name may contain, which keeps a
//! subtree contiguous and places a header before all of its descendants.

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Key of the root container header.
pub const ROOT_KEY: &[u8] = &[0x00];

/// Byte introducing each component in a key.
pub const SEPARATOR: u8 = 0x01;

/// First byte of the scratch area. Never part of a tree path.
pub const SCRATCH_PREFIX: u8 = 0xFF;

/// Largest array index the fixed-width encoding can represent.
pub const MAX_INDEX: u64 = 9_999_999_999;

const INDEX_WIDTH: usize = 10;

/// Errors related to path parsing and validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// A path component is malformed.
    InvalidComponent {
        component: String,
        position: usize,
        message: String,
    },
    /// The path string is invalid.
    InvalidPath { message: String },
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathError::InvalidComponent {
                component,
                position,
                message,
            } => {
                write!(
                    f,
                    "invalid path component '{}' at position {}: {}",
                    component, position, message
                )
            }
            PathError::InvalidPath { message } => {
                write!(f, "invalid path: {}", message)
            }
        }
    }
}

impl std::error::Error for PathError {}

/// One path segment: an object member name or an array index.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Component {
    Member(String),
    Index(usize),
}

impl Component {
    /// Parse the textual form of a component (`name` or `#3`).
    pub fn parse(text: &str, position: usize) -> Result<Self, PathError> {
        let invalid = |message: &str| PathError::InvalidComponent {
            component: text.to_string(),
            position,
            message: message.to_string(),
        };

        if text.is_empty() {
            return Err(invalid("empty component"));
        }

        if let Some(digits) = text.strip_prefix('#') {
            if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
                return Err(invalid("array index must be '#' followed by digits"));
            }
            let index: u64 = digits
                .parse()
                .map_err(|_| invalid("array index does not fit in 64 bits"))?;
            return Self::index_at(index, text, position);
        }

        if text == "." || text == "*" {
            return Err(invalid("markers are only allowed as the last component"));
        }

        for c in text.chars() {
            if c.is_whitespace() {
                return Err(invalid("whitespace is not allowed"));
            }
            if c.is_control() {
                return Err(invalid("control characters are not allowed"));
            }
            if c == '/' {
                return Err(invalid("'/' is not allowed in a member name"));
            }
        }

        Ok(Component::Member(text.to_string()))
    }

    /// Build a member component, validating the name.
    pub fn member(name: &str) -> Result<Self, PathError> {
        match Self::parse(name, 0)? {
            Component::Index(_) => Err(PathError::InvalidComponent {
                component: name.to_string(),
                position: 0,
                message: "member names may not start with '#'".to_string(),
            }),
            member => Ok(member),
        }
    }

    /// Build an index component.
    pub fn index(index: usize) -> Result<Self, PathError> {
        Self::index_at(index as u64, &format!("#{}", index), 0)
    }

    fn index_at(index: u64, text: &str, position: usize) -> Result<Self, PathError> {
        let out_of_range = || PathError::InvalidComponent {
            component: text.to_string(),
            position,
            message: format!("array index exceeds {}", MAX_INDEX),
        };
        if index > MAX_INDEX {
            return Err(out_of_range());
        }
        usize::try_from(index)
            .map(Component::Index)
            .map_err(|_| out_of_range())
    }

    /// The index, if this is an array element.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Component::Index(i) => Some(*i),
            Component::Member(_) => None,
        }
    }

    /// The name, if this is an object member.
    pub fn as_member(&self) -> Option<&str> {
        match self {
            Component::Member(name) => Some(name),
            Component::Index(_) => None,
        }
    }

    fn encode_into(&self, key: &mut Vec<u8>) {
        key.push(SEPARATOR);
        match self {
            Component::Member(name) => key.extend_from_slice(name.as_bytes()),
            Component::Index(i) => {
                key.push(b'#');
                key.extend_from_slice(format!("{:0width$}", i, width = INDEX_WIDTH).as_bytes());
            }
        }
    }

    fn decode(bytes: &[u8], position: usize) -> Result<Self, PathError> {
        let text = std::str::from_utf8(bytes).map_err(|_| PathError::InvalidComponent {
            component: format!("{:?}", bytes),
            position,
            message: "not valid UTF-8".to_string(),
        })?;
        if text.starts_with('#') && text.len() != INDEX_WIDTH + 1 {
            return Err(PathError::InvalidComponent {
                component: text.to_string(),
                position,
                message: "stored index is not fixed width".to_string(),
            });
        }
        Self::parse(text, position)
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Member(name) => write!(f, "{}", name),
            Component::Index(i) => write!(f, "#{}", i),
        }
    }
}

/// Trailing tag of a path.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
pub enum Marker {
    /// A plain value path.
    #[default]
    None,
    /// The container header (`/a/.`).
    Directory,
    /// All direct children of the container (`/a/*`).
    Wildcard,
}

/// A parsed document path with its cached key and display form.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct Path {
    components: Vec<Component>,
    marker: Marker,
    key: Bytes,
    pretty: String,
}

impl Path {
    /// The root container.
    pub fn root() -> Self {
        Self::from_parts(Vec::new(), Marker::Directory)
    }

    /// Parse a path string.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use janosh_core::Path;
    ///
    /// let path = Path::parse("/users/#0/name").unwrap();
    /// assert_eq!(path.depth(), 3);
    /// assert_eq!(path.index(), None);
    ///
    /// assert!(Path::parse("/users/.").unwrap().is_directory());
    /// assert!(Path::parse("users").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, PathError> {
        let Some(rest) = s.strip_prefix('/') else {
            return Err(PathError::InvalidPath {
                message: format!("'{}' must start with '/'", s),
            });
        };

        if rest.is_empty() {
            return Ok(Self::root());
        }

        let segments: Vec<&str> = rest.split('/').collect();
        let last = segments.len() - 1;
        let mut components = Vec::with_capacity(segments.len());
        let mut marker = Marker::None;

        for (i, segment) in segments.iter().enumerate() {
            match *segment {
                "." if i == last => marker = Marker::Directory,
                "*" if i == last => marker = Marker::Wildcard,
                _ => components.push(Component::parse(segment, i)?),
            }
        }

        Ok(Self::from_parts(components, marker))
    }

    /// Decode a physical key back into a (plain) path.
    pub fn from_key(key: &[u8]) -> Result<Self, PathError> {
        if key == ROOT_KEY {
            return Ok(Self::root());
        }
        let Some(rest) = key.strip_prefix(&[SEPARATOR]) else {
            return Err(PathError::InvalidPath {
                message: format!("key {:?} is outside the tree", key),
            });
        };

        let components = rest
            .split(|b| *b == SEPARATOR)
            .enumerate()
            .map(|(i, part)| Component::decode(part, i))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_parts(components, Marker::None))
    }

    fn from_parts(components: Vec<Component>, marker: Marker) -> Self {
        let marker = match (components.is_empty(), marker) {
            (true, Marker::None) => Marker::Directory,
            (_, m) => m,
        };

        let key = if components.is_empty() {
            Bytes::from_static(ROOT_KEY)
        } else {
            let mut key = Vec::new();
            for component in &components {
                component.encode_into(&mut key);
            }
            Bytes::from(key)
        };

        let mut pretty = String::new();
        for component in &components {
            pretty.push('/');
            pretty.push_str(&component.to_string());
        }
        match marker {
            Marker::None => {}
            Marker::Directory if components.is_empty() => pretty.push('/'),
            Marker::Directory => pretty.push_str("/."),
            Marker::Wildcard => pretty.push_str("/*"),
        }

        Path {
            components,
            marker,
            key,
            pretty,
        }
    }

    /// The encoded store key.
    pub fn key(&self) -> &Bytes {
        &self.key
    }

    /// Key of this node in the scratch area.
    pub fn scratch_key(&self) -> Bytes {
        let mut key = Vec::with_capacity(self.key.len() + 1);
        key.push(SCRATCH_PREFIX);
        key.extend_from_slice(&self.key);
        Bytes::from(key)
    }

    /// The display form.
    pub fn pretty(&self) -> &str {
        &self.pretty
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn marker(&self) -> Marker {
        self.marker
    }

    /// Number of components.
    pub fn depth(&self) -> usize {
        self.components.len()
    }

    pub fn last(&self) -> Option<&Component> {
        self.components.last()
    }

    /// The array index of the last component, if it is one.
    pub fn index(&self) -> Option<usize> {
        self.last().and_then(Component::as_index)
    }

    pub fn is_root(&self) -> bool {
        self.components.is_empty()
    }

    pub fn is_directory(&self) -> bool {
        self.marker == Marker::Directory
    }

    pub fn is_wildcard(&self) -> bool {
        self.marker == Marker::Wildcard
    }

    /// The enclosing container, tagged as a directory. `None` for the root.
    pub fn parent(&self) -> Option<Path> {
        if self.is_root() {
            return None;
        }
        let components = self.components[..self.components.len() - 1].to_vec();
        Some(Self::from_parts(components, Marker::Directory))
    }

    /// This path without its trailing marker.
    #[must_use]
    pub fn base_path(&self) -> Path {
        Self::from_parts(self.components.clone(), Marker::None)
    }

    #[must_use]
    pub fn as_directory(&self) -> Path {
        Self::from_parts(self.components.clone(), Marker::Directory)
    }

    #[must_use]
    pub fn as_wildcard(&self) -> Path {
        Self::from_parts(self.components.clone(), Marker::Wildcard)
    }

    /// Append a component to the base path.
    #[must_use]
    pub fn with_child(&self, component: Component) -> Path {
        let mut components = self.components.clone();
        components.push(component);
        Self::from_parts(components, Marker::None)
    }

    pub fn with_member(&self, name: &str) -> Result<Path, PathError> {
        Ok(self.with_child(Component::member(name)?))
    }

    pub fn with_index(&self, index: usize) -> Result<Path, PathError> {
        Ok(self.with_child(Component::index(index)?))
    }

    /// True when `other` lies in the subtree rooted here (including itself).
    pub fn above(&self, other: &Path) -> bool {
        other.components.len() >= self.components.len()
            && other.components[..self.components.len()] == self.components[..]
    }

    /// True when both paths address the same node, ignoring markers.
    pub fn same_node(&self, other: &Path) -> bool {
        self.key == other.key
    }

    /// Re-root this path from `from` onto `to`. `None` if `from` is not above it.
    pub fn relocated(&self, from: &Path, to: &Path) -> Option<Path> {
        if !from.above(self) {
            return None;
        }
        let mut components = to.components.clone();
        components.extend_from_slice(&self.components[from.components.len()..]);
        Some(Self::from_parts(components, self.marker))
    }

    /// Replace the component at `depth` (zero based).
    pub(crate) fn with_component_at(&self, depth: usize, component: Component) -> Path {
        let mut components = self.components.clone();
        components[depth] = component;
        Self::from_parts(components, self.marker)
    }
}

/// True when `key` is `prefix` itself or one of its descendants.
pub(crate) fn key_in_subtree(prefix: &[u8], key: &[u8]) -> bool {
    if prefix == ROOT_KEY {
        return key.first() != Some(&SCRATCH_PREFIX);
    }
    key.starts_with(prefix) && (key.len() == prefix.len() || key[prefix.len()] == SEPARATOR)
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pretty)
    }
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Path::parse(s)
    }
}

impl Serialize for Path {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.pretty)
    }
}

impl<'de> Deserialize<'de> for Path {
    fn deserialize<D>(deserializer: D) -> Result<Path, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: String = Deserialize::deserialize(deserializer)?;
        Path::parse(&s).map_err(D::Error::custom)
    }
}

/// Macro for creating paths from literals.
///
/// # Example
///
/// ```rust
/// use janosh_core::path;
///
/// let p = path!("/users/#1/name");
/// assert_eq!(p.depth(), 3);
/// ```
#[macro_export]
macro_rules! path {
    ($s:expr) => {
        $crate::Path::parse($s).expect("invalid path literal")
    };
}
