pub mod error;
pub mod token_repository;

pub use error::{RepositoryError, RepositoryResult};
pub use token_repository::{
    BoxFuture, InMemoryTokenRepository, TOKEN_STORAGE_KEY, TokenJsonRepository, TokenRepository,
};
