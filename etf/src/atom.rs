use std::convert::TryFrom;
use std::fmt::{self, Display, Formatter};

use crate::error::AtomError;

/// A named constant, distinct from a plain string. Erlang limits atom names to 255 characters; the
/// name can not be changed once the atom exists.
///
/// ```
/// use etf::Atom;
///
/// let atom = Atom::new("hello_world").unwrap();
/// assert_eq!("hello_world", atom.as_str());
/// assert_eq!("Atom(hello_world)", atom.to_string());
/// assert!(Atom::new("*".repeat(256)).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Atom {
    name: String,
}

impl Atom {

    /// The maximum number of characters in an atom name.
    pub const MAX_CHARS: usize = 255;

    pub fn new<S: Into<String>>(name: S) -> Result<Self, AtomError> {
        let name = name.into();
        let chars = name.chars().count();
        if chars > Self::MAX_CHARS {
            return Err(AtomError::TooLong(chars));
        }
        Ok(Self { name })
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// ASCII atoms fit the narrow encoding with a one byte length.
    pub fn is_ascii(&self) -> bool {
        self.name.is_ascii()
    }

    pub fn into_string(self) -> String {
        self.name
    }

}

impl Display for Atom {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Atom({})", self.name)
    }
}

impl AsRef<str> for Atom {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

impl TryFrom<&str> for Atom {
    type Error = AtomError;

    fn try_from(name: &str) -> Result<Self, Self::Error> {
        Atom::new(name)
    }
}

impl TryFrom<String> for Atom {
    type Error = AtomError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        Atom::new(name)
    }
}
