use std::fmt;

use crate::lock::LockError;
use crate::model::{EntryHandle, ListId};

/// Machine-readable error codes for operator and caller decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    PositionOutOfRange,
    MissingTargetList,
    ListFull,
    InvalidReferenceSource,
    InvalidField,
    MainCategoryNotFound,
    SubCategoryNotFound,
    ItemNotFound,
    ReferenceNotFound,
    DuplicateReference,
    PositionOccupied,
    ConcurrentModification,
    OwnershipMismatch,
    StoreFailure,
    LockContention,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::PositionOutOfRange => "E2001",
            Self::MissingTargetList => "E2002",
            Self::ListFull => "E2003",
            Self::InvalidReferenceSource => "E2004",
            Self::InvalidField => "E2005",
            Self::MainCategoryNotFound => "E3001",
            Self::SubCategoryNotFound => "E3002",
            Self::ItemNotFound => "E3003",
            Self::ReferenceNotFound => "E3004",
            Self::DuplicateReference => "E4001",
            Self::PositionOccupied => "E4002",
            Self::ConcurrentModification => "E4003",
            Self::OwnershipMismatch => "E4101",
            Self::StoreFailure => "E5001",
            Self::LockContention => "E5002",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "Store not initialized",
            Self::ConfigParseError => "Config file parse error",
            Self::PositionOutOfRange => "Position outside 1..=11",
            Self::MissingTargetList => "Item has no target list",
            Self::ListFull => "List has no free slot",
            Self::InvalidReferenceSource => "Item cannot be referenced here",
            Self::InvalidField => "Invalid field value",
            Self::MainCategoryNotFound => "Main category not found",
            Self::SubCategoryNotFound => "Sub category not found",
            Self::ItemNotFound => "Item not found",
            Self::ReferenceNotFound => "Reference not found",
            Self::DuplicateReference => "Item already referenced into this category",
            Self::PositionOccupied => "Position already occupied",
            Self::ConcurrentModification => "List changed during the operation",
            Self::OwnershipMismatch => "Not the owner",
            Self::StoreFailure => "Store operation failed",
            Self::LockContention => "Lock contention",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and callers.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `t11 init` to create the store."),
            Self::ConfigParseError => Some("Fix syntax in .topeleven/config.toml and retry."),
            Self::PositionOutOfRange => Some("Use a position between 1 and 11."),
            Self::MissingTargetList => Some("Place the item in a sub or main category first."),
            Self::ListFull => {
                Some("Delete an entry or pass an explicit position to replace a slot.")
            }
            Self::InvalidReferenceSource => Some(
                "Only items in a sub category can be referenced, and only into its parent main category.",
            ),
            Self::InvalidField => None,
            Self::MainCategoryNotFound
            | Self::SubCategoryNotFound
            | Self::ItemNotFound
            | Self::ReferenceNotFound => None,
            Self::DuplicateReference => Some("Move the existing reference instead."),
            Self::PositionOccupied => {
                Some("Omit the position to auto-allocate, or move the occupant first.")
            }
            Self::ConcurrentModification => Some("Reload the list and retry."),
            Self::OwnershipMismatch => Some("Act as the owning user (--owner or T11_OWNER)."),
            Self::StoreFailure => Some("Check the database file and retry."),
            Self::LockContention => Some("Retry after the other maintenance run releases its lock."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Coarse error taxonomy surfaced to upstream handlers.
///
/// Handlers map these onto their own status codes; the core never retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Forbidden,
    Store,
    Lock,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Forbidden => "forbidden",
            Self::Store => "store",
            Self::Lock => "lock",
        };
        f.write_str(s)
    }
}

/// The entity a lookup failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    MainCategory,
    SubCategory,
    RankItem,
    Reference,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::MainCategory => "main category",
            Self::SubCategory => "sub category",
            Self::RankItem => "item",
            Self::Reference => "reference",
        };
        f.write_str(s)
    }
}

/// Errors raised by rank-list operations.
#[derive(Debug, thiserror::Error)]
pub enum TopElevenError {
    #[error("position {position} is outside 1..=11")]
    PositionOutOfRange { position: i64 },

    #[error("item {item_id} has no sub or main category placement")]
    MissingTargetList { item_id: i64 },

    #[error("{list} has no free slot")]
    ListFull { list: ListId },

    #[error("item {item_id} cannot be referenced into main category {main_category_id}: {reason}")]
    InvalidReferenceSource {
        item_id: i64,
        main_category_id: i64,
        reason: &'static str,
    },

    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    #[error("{entity} {id} not found")]
    NotFound { entity: Entity, id: i64 },

    #[error("item {rank_item_id} is already referenced into main category {main_category_id}")]
    DuplicateReference {
        main_category_id: i64,
        rank_item_id: i64,
    },

    #[error("position {position} in {list} is already occupied")]
    PositionOccupied { list: ListId, position: i64 },

    #[error("{handle} changed position while being moved")]
    ConcurrentModification { handle: EntryHandle },

    #[error("{entity} {id} belongs to '{owner}', not '{actor}'")]
    Forbidden {
        entity: Entity,
        id: i64,
        owner: String,
        actor: String,
    },

    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error(transparent)]
    Lock(#[from] LockError),
}

/// Result alias for rank-list operations.
pub type Result<T, E = TopElevenError> = std::result::Result<T, E>;

impl TopElevenError {
    /// Shorthand for a [`TopElevenError::NotFound`].
    #[must_use]
    pub const fn not_found(entity: Entity, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    /// Taxonomy bucket for this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::PositionOutOfRange { .. }
            | Self::MissingTargetList { .. }
            | Self::ListFull { .. }
            | Self::InvalidReferenceSource { .. }
            | Self::EmptyField { .. } => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::DuplicateReference { .. }
            | Self::PositionOccupied { .. }
            | Self::ConcurrentModification { .. } => ErrorKind::Conflict,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::Store(_) => ErrorKind::Store,
            Self::Lock(_) => ErrorKind::Lock,
        }
    }

    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::PositionOutOfRange { .. } => ErrorCode::PositionOutOfRange,
            Self::MissingTargetList { .. } => ErrorCode::MissingTargetList,
            Self::ListFull { .. } => ErrorCode::ListFull,
            Self::InvalidReferenceSource { .. } => ErrorCode::InvalidReferenceSource,
            Self::EmptyField { .. } => ErrorCode::InvalidField,
            Self::NotFound { entity, .. } => match entity {
                Entity::MainCategory => ErrorCode::MainCategoryNotFound,
                Entity::SubCategory => ErrorCode::SubCategoryNotFound,
                Entity::RankItem => ErrorCode::ItemNotFound,
                Entity::Reference => ErrorCode::ReferenceNotFound,
            },
            Self::DuplicateReference { .. } => ErrorCode::DuplicateReference,
            Self::PositionOccupied { .. } => ErrorCode::PositionOccupied,
            Self::ConcurrentModification { .. } => ErrorCode::ConcurrentModification,
            Self::Forbidden { .. } => ErrorCode::OwnershipMismatch,
            Self::Store(_) => ErrorCode::StoreFailure,
            Self::Lock(err) => err.code(),
        }
    }

    /// Remediation text for CLI and handler output.
    #[must_use]
    pub fn suggestion(&self) -> String {
        self.code()
            .hint()
            .unwrap_or_else(|| self.code().message())
            .to_string()
    }
}
