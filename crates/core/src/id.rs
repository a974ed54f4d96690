// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identifier newtypes.
//!
//! Two flavours exist:
//! - generated ids (`ses-…`, `lse-…`, `log-…`) minted by the scheduler with
//!   [`define_id!`], formatted `{prefix}{nanoid}`;
//! - operator-chosen names (agents, pools) declared with [`define_name!`],
//!   which never get a prefix and are stored exactly as supplied.

/// Define a generated ID newtype around `SmolStr` with a type prefix.
///
/// The ID format is `{prefix}{nanoid}`: a 4 character prefix and a 19
/// character random suffix, which fits `SmolStr`'s inline capacity.
///
/// ```ignore
/// define_id! {
///     /// Identifier of one agent session.
///     pub struct SessionId("ses-");
/// }
/// ```
#[macro_export]
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident($prefix:literal);
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub smol_str::SmolStr);

        impl $name {
            pub const PREFIX: &'static str = $prefix;

            /// Generate a new random ID with the type prefix
            pub fn new() -> Self {
                Self(smol_str::SmolStr::new(format!("{}{}", Self::PREFIX, nanoid::nanoid!(19))))
            }

            /// Wrap an existing string (parsing, deserialization, tests)
            pub fn from_string(id: impl Into<smol_str::SmolStr>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// The ID without its type prefix
            pub fn suffix(&self) -> &str {
                self.0.strip_prefix(Self::PREFIX).unwrap_or(&self.0)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        $crate::define_name!(@impls $name);
    };
}

/// Define an operator-chosen name newtype around `SmolStr`.
///
/// ```ignore
/// define_name! {
///     /// Stable agent name, usually the host name.
///     pub struct AgentId;
/// }
/// ```
#[macro_export]
macro_rules! define_name {
    (
        $(#[$meta:meta])*
        pub struct $name:ident;
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub smol_str::SmolStr);

        impl $name {
            pub fn new(name: impl Into<smol_str::SmolStr>) -> Self {
                Self(name.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        $crate::define_name!(@impls $name);
    };

    (@impls $name:ident) => {
        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(smol_str::SmolStr::new(s))
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(smol_str::SmolStr::new(s))
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

define_name! {
    /// Stable, operator-chosen agent name.
    pub struct AgentId;
}

define_name! {
    /// Pool name, assigned by configuration.
    pub struct PoolId;
}

define_id! {
    /// Identifier of one continuous agent session.
    pub struct SessionId("ses-");
}

define_id! {
    /// Identifier of one unit of work handed to an agent.
    pub struct LeaseId("lse-");
}

define_id! {
    /// Identifier of the log stream a lease writes to.
    pub struct LogId("log-");
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
