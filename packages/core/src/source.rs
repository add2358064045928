//! Nested input for ingestion.

use crate::Value;

/// A nested value to be flattened into the store.
///
/// Object members and array elements are written in the order given.
#[derive(Clone, Debug, PartialEq)]
pub enum Source {
    /// A scalar; container values are rejected on ingestion.
    Scalar(Value),
    Object(Vec<(String, Source)>),
    Array(Vec<Source>),
}

impl Source {
    pub fn object<K: Into<String>>(members: impl IntoIterator<Item = (K, Source)>) -> Self {
        Source::Object(members.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn array(elements: impl IntoIterator<Item = Source>) -> Self {
        Source::Array(elements.into_iter().collect())
    }

    pub fn is_container(&self) -> bool {
        !matches!(self, Source::Scalar(_))
    }

    /// Number of entries this source occupies once flattened.
    pub fn entry_count(&self) -> usize {
        match self {
            Source::Scalar(_) => 1,
            Source::Object(members) => 1 + members.iter().map(|(_, s)| s.entry_count()).sum::<usize>(),
            Source::Array(elements) => 1 + elements.iter().map(Source::entry_count).sum::<usize>(),
        }
    }
}

impl From<Value> for Source {
    fn from(v: Value) -> Self {
        Source::Scalar(v)
    }
}

macro_rules! scalar_source_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Source {
                fn from(v: $t) -> Self {
                    Source::Scalar(Value::from(v))
                }
            }
        )*
    };
}

scalar_source_from!(bool, i64, i32, &str, String, crate::value::Number);
