//! Declarative helpers shared by the service crates.

/// Generates a closed provider enumeration.
///
/// The generated type serializes to its wire constant, parses
/// case-insensitively with [`FromStr`](std::str::FromStr), and rejects any
/// other value with [`Error::ValidationError`](crate::Error::ValidationError).
///
/// ```
/// rackcloud_core::provider_enum!(
///     /// Traffic direction.
///     Direction, "direction", {
///         /// Inbound.
///         In => "IN",
///         /// Outbound.
///         Out => "OUT",
///     }
/// );
///
/// assert_eq!("out".parse::<Direction>().unwrap(), Direction::Out);
/// assert!("sideways".parse::<Direction>().is_err());
/// ```
#[macro_export]
macro_rules! provider_enum {
    ($(#[$meta:meta])* $name:ident, $label:literal, { $($(#[$vmeta:meta])* $variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            /// Every accepted value, in provider order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Wire representation.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::Error;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                let wanted = s.trim().to_uppercase();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|value| value.as_str() == wanted)
                    .ok_or_else(|| $crate::Error::ValidationError(format!(
                        "Unsupported {} `{s}`", $label
                    )))
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}
