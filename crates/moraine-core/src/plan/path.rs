use derive_more::Display;

/// Pseudo-property segment naming the index of an indexed collection.
pub const INDEX_MARKER: &str = "<index>";

/// Pseudo-property segment naming the element of a collection.
pub const ELEMENT_MARKER: &str = "<element>";

///
/// PropertyPath
///
/// Dot-joined property path from the plan root. Marker segments name the
/// pseudo-properties of a collection, so the index graph of `Order.items`
/// sits at `Order.items.<index>` and its attribute fetches underneath it.
///

#[derive(Clone, Debug, Display, Eq, Hash, PartialEq)]
#[display("{full}")]
pub struct PropertyPath {
    full: String,
}

impl PropertyPath {
    #[must_use]
    pub fn root(name: impl Into<String>) -> Self {
        Self { full: name.into() }
    }

    #[must_use]
    pub fn append(&self, part: &str) -> Self {
        if self.full.is_empty() {
            Self {
                full: part.to_string(),
            }
        } else {
            Self {
                full: format!("{}.{part}", self.full),
            }
        }
    }

    #[must_use]
    pub fn index_graph(&self) -> Self {
        self.append(INDEX_MARKER)
    }

    #[must_use]
    pub fn element_graph(&self) -> Self {
        self.append(ELEMENT_MARKER)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.full
    }

    /// Last path segment.
    #[must_use]
    pub fn leaf(&self) -> &str {
        self.full.rsplit('.').next().unwrap_or_default()
    }
}
