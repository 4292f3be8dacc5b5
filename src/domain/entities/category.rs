//! Category reference entity.

/// A labelled grouping of books, matched exactly by the book filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// Input data for creating or renaming a category.
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
}
