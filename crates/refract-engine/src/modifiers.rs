//! Modifier flags for types and members

use std::fmt;

use bitflags::bitflags;

bitflags! {
    /// Visibility and shape flags of a type or member.
    ///
    /// A member with none of `PUBLIC`, `PRIVATE` or `PROTECTED` is
    /// package-private.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        /// Visible to every caller
        const PUBLIC = 0x01;
        /// Visible only inside the declaring type
        const PRIVATE = 0x02;
        /// Visible to the declaring type and its subtypes
        const PROTECTED = 0x04;
        /// No body / cannot be instantiated
        const ABSTRACT = 0x08;
        /// Belongs to the type rather than to instances
        const STATIC = 0x10;
        /// Cannot be reassigned or overridden
        const FINAL = 0x20;
    }
}

const VISIBILITY: Modifiers = Modifiers::PUBLIC
    .union(Modifiers::PRIVATE)
    .union(Modifiers::PROTECTED);

impl Modifiers {
    /// Check the public flag
    pub fn is_public(self) -> bool {
        self.contains(Modifiers::PUBLIC)
    }

    /// Check the private flag
    pub fn is_private(self) -> bool {
        self.contains(Modifiers::PRIVATE)
    }

    /// Check the protected flag
    pub fn is_protected(self) -> bool {
        self.contains(Modifiers::PROTECTED)
    }

    /// True when no visibility flag is set
    pub fn is_package_private(self) -> bool {
        !self.intersects(VISIBILITY)
    }

    /// Check the abstract flag
    pub fn is_abstract(self) -> bool {
        self.contains(Modifiers::ABSTRACT)
    }

    /// Check the static flag
    pub fn is_static(self) -> bool {
        self.contains(Modifiers::STATIC)
    }

    /// Check the final flag
    pub fn is_final(self) -> bool {
        self.contains(Modifiers::FINAL)
    }

    /// More than one visibility flag is set
    pub fn has_conflicting_visibility(self) -> bool {
        self.intersection(VISIBILITY).bits().count_ones() > 1
    }

    /// Parse a single modifier keyword
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.trim().to_ascii_lowercase().as_str() {
            "public" => Some(Modifiers::PUBLIC),
            "private" => Some(Modifiers::PRIVATE),
            "protected" => Some(Modifiers::PROTECTED),
            "abstract" => Some(Modifiers::ABSTRACT),
            "static" => Some(Modifiers::STATIC),
            "final" => Some(Modifiers::FINAL),
            _ => None,
        }
    }

    /// Parse a list of keywords, failing on the first unknown one
    pub fn from_keywords<S: AsRef<str>>(keywords: &[S]) -> Result<Self, String> {
        let mut result = Modifiers::empty();
        for keyword in keywords {
            let flag = Modifiers::from_keyword(keyword.as_ref())
                .ok_or_else(|| format!("unknown modifier `{}`", keyword.as_ref()))?;
            result |= flag;
        }
        Ok(result)
    }
}

impl fmt::Display for Modifiers {
    /// Keywords in declaration order; `package` when nothing is set.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const ORDER: [(Modifiers, &str); 6] = [
            (Modifiers::PUBLIC, "public"),
            (Modifiers::PROTECTED, "protected"),
            (Modifiers::PRIVATE, "private"),
            (Modifiers::ABSTRACT, "abstract"),
            (Modifiers::STATIC, "static"),
            (Modifiers::FINAL, "final"),
        ];
        let words: Vec<&str> = ORDER
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, word)| *word)
            .collect();
        if words.is_empty() {
            write!(f, "package")
        } else {
            write!(f, "{}", words.join(" "))
        }
    }
}
