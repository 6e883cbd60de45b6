//! Knobs for the encoder and the decoder. Both configurations are plain values; the defaults are
//! what `pack` and `unpack` use.

/// Default limit for nested lists, tuples and maps.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Big integers are decoded up to 64 bits of magnitude by default.
pub const DEFAULT_MAX_BIGINT_DIGITS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderConfig {
    pub max_depth: usize,
    /// Emit finite floats without a fractional part which fit into 32 bits with the integer tags.
    pub integral_floats: bool,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self { max_depth: DEFAULT_MAX_DEPTH, integral_floats: false }
    }
}

impl EncoderConfig {

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn integral_floats(mut self, integral_floats: bool) -> Self {
        self.integral_floats = integral_floats;
        self
    }

}

/// What to produce for atoms that are neither `nil`, `null`, `true` nor `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtomDecoding {
    /// `Value::Atom`, so that encoded atoms survive a round trip
    Atom,
    /// `Value::String`, dropping the distinction between atoms and text
    String,
}

/// What to produce for `BINARY_EXT` payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryDecoding {
    /// `Value::String` if the payload is valid Utf-8, `Value::Binary` otherwise
    Utf8,
    /// Always `Value::Binary`
    Bytes,
}

/// How to treat a map which contains the same key more than once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateKeys {
    /// The later value replaces the earlier one, keeping the position of the first occurrence
    LastWins,
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderConfig {
    pub max_depth: usize,
    pub max_bigint_digits: usize,
    pub atoms: AtomDecoding,
    pub binaries: BinaryDecoding,
    pub duplicate_keys: DuplicateKeys,
    /// Accept bytes after the top-level term instead of failing.
    pub allow_trailing: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_bigint_digits: DEFAULT_MAX_BIGINT_DIGITS,
            atoms: AtomDecoding::Atom,
            binaries: BinaryDecoding::Utf8,
            duplicate_keys: DuplicateKeys::LastWins,
            allow_trailing: false,
        }
    }
}

impl DecoderConfig {

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn max_bigint_digits(mut self, max_bigint_digits: usize) -> Self {
        self.max_bigint_digits = max_bigint_digits;
        self
    }

    pub fn atoms(mut self, atoms: AtomDecoding) -> Self {
        self.atoms = atoms;
        self
    }

    pub fn binaries(mut self, binaries: BinaryDecoding) -> Self {
        self.binaries = binaries;
        self
    }

    pub fn duplicate_keys(mut self, duplicate_keys: DuplicateKeys) -> Self {
        self.duplicate_keys = duplicate_keys;
        self
    }

    pub fn allow_trailing(mut self, allow_trailing: bool) -> Self {
        self.allow_trailing = allow_trailing;
        self
    }

}
