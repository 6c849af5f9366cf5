//! Shared error types.

use thiserror::Error;

/// A catalog code that does not name any known kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CatalogCodeError {
    #[error("unknown relkind code '{0}'")]
    UnknownRelKind(char),

    #[error("unknown relstorage code '{0}'")]
    UnknownRelStorage(char),
}
