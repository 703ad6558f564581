use std::{borrow::Cow, fmt};

/// Canonical names for the standard DSCP code points.
/// Anything not listed renders as its decimal value.
const DSCP_NAMES: [(u8, &str); 21] = [
    (0, "CS0"),
    (8, "CS1"),
    (10, "AF11"),
    (12, "AF12"),
    (14, "AF13"),
    (16, "CS2"),
    (18, "AF21"),
    (20, "AF22"),
    (22, "AF23"),
    (24, "CS3"),
    (26, "AF31"),
    (28, "AF32"),
    (30, "AF33"),
    (32, "CS4"),
    (34, "AF41"),
    (36, "AF42"),
    (38, "AF43"),
    (40, "CS5"),
    (46, "EF"),
    (48, "CS6"),
    (56, "CS7"),
];

/// 6-bit traffic-class marking carried by a flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Dscp(u8);

impl Dscp {
    const MASK: u8 = 0x3F;

    /// Builds a marking from a raw value, keeping only the low 6 bits.
    pub fn from_mark(mark: u64) -> Self {
        Self((mark & Self::MASK as u64) as u8)
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// Short name such as `EF` or `AF41`, or the decimal value if the
    /// code point has no standard name.
    pub fn name(&self) -> Cow<'static, str> {
        match DSCP_NAMES.binary_search_by_key(&self.0, |(value, _)| *value) {
            Ok(idx) => Cow::Borrowed(DSCP_NAMES[idx].1),
            Err(_) => Cow::Owned(self.0.to_string()),
        }
    }
}

impl fmt::Display for Dscp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}
