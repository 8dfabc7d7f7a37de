//! Macros for defining typed ID types.

/// Macro to define a typed numeric ID with a display prefix.
///
/// This generates a newtype wrapper around `u64` with:
/// - A `PREFIX` constant
/// - `new()` and `value()`
/// - `parse()` accepting either `{prefix}:{n}` or a bare number
/// - `Display` and `FromStr` implementations
/// - `Serialize` and `Deserialize` as a bare JSON number
/// - `Ord`, `Hash`, and other standard traits
///
/// # Example
///
/// ```ignore
/// define_id!(DeviceId, "dev");
///
/// let id = DeviceId::new(12);
/// assert_eq!(id.to_string(), "dev:12");
/// let parsed: DeviceId = "12".parse()?;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        /// A typed ID for this resource type.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u64);

        impl $name {
            /// The display prefix for this ID type.
            pub const PREFIX: &'static str = $prefix;

            /// Wraps a raw id handed out by the owning service.
            #[must_use]
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            /// Returns the raw id.
            #[must_use]
            pub const fn value(&self) -> u64 {
                self.0
            }

            /// Parses an ID from a string.
            ///
            /// Accepts `{prefix}:{n}` or a bare `{n}`.
            pub fn parse(s: &str) -> Result<Self, $crate::IdError> {
                let s = s.trim();
                if s.is_empty() {
                    return Err($crate::IdError::Empty);
                }

                let digits = match s.split_once(':') {
                    Some((prefix, digits)) => {
                        if prefix != Self::PREFIX {
                            return Err($crate::IdError::InvalidPrefix {
                                expected: Self::PREFIX,
                                actual: prefix.to_string(),
                            });
                        }
                        digits
                    }
                    None => s,
                };

                digits
                    .parse::<u64>()
                    .map(Self)
                    .map_err(|e| $crate::IdError::InvalidNumber(format!("{digits:?}: {e}")))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}:{}", Self::PREFIX, self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_u64(self.0)
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let id = u64::deserialize(deserializer)?;
                Ok(Self(id))
            }
        }
    };
}
