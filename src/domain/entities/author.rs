//! Author reference entity.

/// An author referenced by books.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub id: i64,
    pub name: String,
    pub bio: String,
}

/// Input data for creating an author.
#[derive(Debug, Clone)]
pub struct NewAuthor {
    pub name: String,
    pub bio: String,
}

/// Partial update for an author. `None` fields are unchanged.
#[derive(Debug, Clone, Default)]
pub struct AuthorPatch {
    pub name: Option<String>,
    pub bio: Option<String>,
}
