//! Region key: the partition identifier for a (province, city) pair.
//!
//! The key is held as a structured pair rather than a pre-joined string, so
//! province and city never need to be re-derived by splitting. The canonical
//! string form `province-city` is preserved on the wire: [`fmt::Display`] and
//! serde emit it, [`str::parse`] decodes it. This keeps the persisted cart
//! blob layout stable while avoiding string surgery everywhere else.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Delimiter joining province and city in the canonical string form.
pub const REGION_DELIMITER: char = '-';

/// Errors that can occur when decoding a [`RegionKey`] from its string form.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RegionKeyError {
    /// The input string is empty.
    #[error("region key cannot be empty")]
    Empty,
    /// The input does not contain exactly one delimiter-separated pair.
    #[error("region key must be a single '{REGION_DELIMITER}'-separated province-city pair")]
    MalformedPair,
    /// The province segment is empty.
    #[error("region key province cannot be empty")]
    EmptyProvince,
    /// The city segment is empty.
    #[error("region key city cannot be empty")]
    EmptyCity,
}

/// Identifies one geographic cart partition.
///
/// ## Known limitation
///
/// Province or city names that themselves contain the delimiter produce a
/// string form that no longer decodes; [`RegionKey::new`] does not escape
/// them. Downstream consumers depend on the exact `province-city` format, so
/// such names are left to fail decoding rather than being rewritten.
///
/// ## Examples
///
/// ```
/// use regional_cart_core::RegionKey;
///
/// let key = RegionKey::new("江苏省", "南京市");
/// assert_eq!(key.to_string(), "江苏省-南京市");
/// assert_eq!("江苏省-南京市".parse::<RegionKey>().unwrap(), key);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct RegionKey {
    province: String,
    city: String,
}

impl RegionKey {
    /// Create a region key from a province and city.
    ///
    /// Construction is unchecked to match how callers obtain the pair from
    /// the region selector; validity is gated at the store boundary via
    /// [`RegionKey::is_valid`].
    pub fn new(province: impl Into<String>, city: impl Into<String>) -> Self {
        Self {
            province: province.into(),
            city: city.into(),
        }
    }

    /// Decode a canonical `province-city` string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, does not contain exactly one
    /// delimiter, or either segment is empty.
    pub fn parse(s: &str) -> Result<Self, RegionKeyError> {
        if s.is_empty() {
            return Err(RegionKeyError::Empty);
        }

        let mut segments = s.split(REGION_DELIMITER);
        let province = segments.next().unwrap_or_default();
        let Some(city) = segments.next() else {
            return Err(RegionKeyError::MalformedPair);
        };
        if segments.next().is_some() {
            return Err(RegionKeyError::MalformedPair);
        }

        if province.is_empty() {
            return Err(RegionKeyError::EmptyProvince);
        }
        if city.is_empty() {
            return Err(RegionKeyError::EmptyCity);
        }

        Ok(Self::new(province, city))
    }

    /// The province segment.
    #[must_use]
    pub fn province(&self) -> &str {
        &self.province
    }

    /// The city segment.
    #[must_use]
    pub fn city(&self) -> &str {
        &self.city
    }

    /// True iff both segments are non-empty.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.province.is_empty() && !self.city.is_empty()
    }
}

impl fmt::Display for RegionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{REGION_DELIMITER}{}", self.province, self.city)
    }
}

impl std::str::FromStr for RegionKey {
    type Err = RegionKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<RegionKey> for String {
    fn from(key: RegionKey) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for RegionKey {
    type Error = RegionKeyError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_encode_joins_with_delimiter() {
        let key = RegionKey::new("江苏省", "南京市");
        assert_eq!(key.to_string(), "江苏省-南京市");
        assert_eq!(key.province(), "江苏省");
        assert_eq!(key.city(), "南京市");
    }

    #[test]
    fn test_decode_valid_key() {
        let key: RegionKey = "广东省-深圳市".parse().unwrap();
        assert_eq!(key, RegionKey::new("广东省", "深圳市"));
    }

    #[test]
    fn test_decode_rejects_empty() {
        assert_eq!(RegionKey::parse(""), Err(RegionKeyError::Empty));
    }

    #[test]
    fn test_decode_rejects_missing_delimiter() {
        assert_eq!(
            RegionKey::parse("江苏省"),
            Err(RegionKeyError::MalformedPair)
        );
    }

    #[test]
    fn test_decode_rejects_extra_delimiters() {
        assert_eq!(RegionKey::parse("a-b-c"), Err(RegionKeyError::MalformedPair));
    }

    #[test]
    fn test_decode_rejects_empty_segments() {
        assert_eq!(
            RegionKey::parse("-南京市"),
            Err(RegionKeyError::EmptyProvince)
        );
        assert_eq!(RegionKey::parse("江苏省-"), Err(RegionKeyError::EmptyCity));
    }

    #[test]
    fn test_is_valid() {
        assert!(RegionKey::new("江苏省", "南京市").is_valid());
        assert!(!RegionKey::new("全国", "").is_valid());
        assert!(!RegionKey::new("", "").is_valid());
    }

    #[test]
    fn test_serde_uses_canonical_string() {
        let key = RegionKey::new("浙江省", "杭州市");
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"浙江省-杭州市\"");
        let back: RegionKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }

    proptest! {
        /// Any delimiter-free pair survives an encode/decode round trip.
        #[test]
        fn prop_round_trip(province in "[a-z]{1,8}", city in "[A-Z]{1,8}") {
            let key = RegionKey::new(province.clone(), city.clone());
            let decoded: RegionKey = key.to_string().parse().unwrap();
            prop_assert_eq!(decoded.province(), province.as_str());
            prop_assert_eq!(decoded.city(), city.as_str());
        }
    }
}
