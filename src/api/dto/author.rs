//! DTOs for author endpoints.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::entities::{Author, AuthorPatch, NewAuthor};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAuthorRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,

    #[serde(default)]
    pub bio: String,
}

impl From<CreateAuthorRequest> for NewAuthor {
    fn from(request: CreateAuthorRequest) -> Self {
        Self {
            name: request.name,
            bio: request.bio,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAuthorRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,

    pub bio: Option<String>,
}

impl From<UpdateAuthorRequest> for AuthorPatch {
    fn from(request: UpdateAuthorRequest) -> Self {
        Self {
            name: request.name,
            bio: request.bio,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthorResponse {
    pub id: i64,
    pub name: String,
    pub bio: String,
}

impl From<Author> for AuthorResponse {
    fn from(author: Author) -> Self {
        Self {
            id: author.id,
            name: author.name,
            bio: author.bio,
        }
    }
}
