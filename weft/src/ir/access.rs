//! Access flags on classes and members.
//!
//! Serialized as a list of lowercase flag names (`["private", "static"]`) so
//! that IR documents stay readable.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::BitOr;

/// Bit set of access flags, using the JVM flag values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Access(u16);

const NAMES: &[(Access, &str)] = &[
    (Access::PUBLIC, "public"),
    (Access::PRIVATE, "private"),
    (Access::PROTECTED, "protected"),
    (Access::STATIC, "static"),
    (Access::FINAL, "final"),
    (Access::INTERFACE, "interface"),
    (Access::ABSTRACT, "abstract"),
    (Access::SYNTHETIC, "synthetic"),
];

impl Access {
    /// `public`
    pub const PUBLIC: Self = Self(0x0001);
    /// `private`
    pub const PRIVATE: Self = Self(0x0002);
    /// `protected`
    pub const PROTECTED: Self = Self(0x0004);
    /// `static`
    pub const STATIC: Self = Self(0x0008);
    /// `final`
    pub const FINAL: Self = Self(0x0010);
    /// `interface` (classes only)
    pub const INTERFACE: Self = Self(0x0200);
    /// `abstract`
    pub const ABSTRACT: Self = Self(0x0400);
    /// `synthetic`
    pub const SYNTHETIC: Self = Self(0x1000);

    /// No flags set.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Raw bits.
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Builds a set from raw bits, keeping unknown bits.
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    /// True if every flag in `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// True if any flag in `other` is set.
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Looks up a flag by its lowercase name.
    pub fn from_name(name: &str) -> Option<Self> {
        NAMES
            .iter()
            .find(|(_, flag_name)| *flag_name == name)
            .map(|(flag, _)| *flag)
    }

    /// Names of the set flags, in canonical order.
    pub fn names(self) -> Vec<&'static str> {
        NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }

    /// Whether [`Self::PRIVATE`] is set.
    pub const fn is_private(self) -> bool {
        self.contains(Self::PRIVATE)
    }

    /// Whether [`Self::PROTECTED`] is set.
    pub const fn is_protected(self) -> bool {
        self.contains(Self::PROTECTED)
    }

    /// Whether [`Self::STATIC`] is set.
    pub const fn is_static(self) -> bool {
        self.contains(Self::STATIC)
    }

    /// Whether [`Self::FINAL`] is set.
    pub const fn is_final(self) -> bool {
        self.contains(Self::FINAL)
    }

    /// Whether [`Self::ABSTRACT`] is set.
    pub const fn is_abstract(self) -> bool {
        self.contains(Self::ABSTRACT)
    }

    /// Whether [`Self::SYNTHETIC`] is set.
    pub const fn is_synthetic(self) -> bool {
        self.contains(Self::SYNTHETIC)
    }
}

impl BitOr for Access {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.names().join(" "))
    }
}

impl Serialize for Access {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.names().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Access {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let names = Vec::<String>::deserialize(deserializer)?;
        names.iter().try_fold(Access::empty(), |acc, name| {
            Access::from_name(name)
                .map(|flag| acc | flag)
                .ok_or_else(|| D::Error::custom(format!("unknown access flag `{name}`")))
        })
    }
}
