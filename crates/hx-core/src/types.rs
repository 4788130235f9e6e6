//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// Harvest identifiers are always positive.
    #[error("{field} must be positive, got {value}")]
    NonPositiveId { field: &'static str, value: i64 },

    /// The value could not be parsed as an identifier.
    #[error("invalid {field}: {value}")]
    InvalidId { field: &'static str, value: String },
}

/// Generates a validated numeric ID newtype with common trait implementations.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "i64", into = "i64")]
        pub struct $name(i64);

        impl $name {
            /// Creates a new ID after validation.
            pub const fn new(id: i64) -> Result<Self, ValidationError> {
                if id <= 0 {
                    return Err(ValidationError::NonPositiveId {
                        field: $field_name,
                        value: id,
                    });
                }
                Ok(Self(id))
            }

            /// Returns the raw numeric ID.
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl TryFrom<i64> for $name {
            type Error = ValidationError;

            fn try_from(value: i64) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let value = s.trim().parse::<i64>().map_err(|_| ValidationError::InvalidId {
                    field: $field_name,
                    value: s.to_string(),
                })?;
                Self::new(value)
            }
        }
    };
}

define_id!(
    /// A Harvest client identifier.
    ClientId, "client ID"
);

define_id!(
    /// A Harvest project identifier.
    ProjectId, "project ID"
);

define_id!(
    /// A Harvest task identifier.
    ///
    /// Tasks are account-wide; a project exposes them through task assignments,
    /// and time entries reference the task directly.
    TaskId, "task ID"
);

define_id!(
    /// A Harvest user identifier.
    UserId, "user ID"
);

define_id!(
    /// A Harvest time entry identifier.
    TimeEntryId, "time entry ID"
);
