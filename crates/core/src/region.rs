//! Region normalization and region-tier key resolution
//!
//! Addresses arrive as free text from the case record. They are normalized
//! once into a [`Region`], and every downstream decision (tier lookup, key
//! composition, surcharge) matches on that enum rather than on raw strings.
//!
//! # Example
//!
//! ```
//! use loan_desk_core::region::{normalize_region, Region, RegionKey};
//!
//! let region = normalize_region("서울특별시 강남구");
//! assert_eq!(region, Region::Seoul);
//! assert_eq!(RegionKey::resolve(&region, 2).unwrap().as_str(), "서울_2급지");
//! ```

use once_cell::sync::Lazy;
use serde::{Serialize, Serializer};
use std::fmt;

/// Trailing administrative suffixes, longest alternatives first.
static ADMIN_SUFFIX: Lazy<regex::Regex> = Lazy::new(|| {
    regex::Regex::new(r"^(.+?)(특별자치시|특별자치도|특별시|광역시|시|도|군|구)$")
        .expect("admin suffix pattern is valid")
});

/// The six metropolitan cities that share the `인천및광역시` rate group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetroCity {
    Busan,
    Incheon,
    Daegu,
    Daejeon,
    Gwangju,
    Ulsan,
}

impl MetroCity {
    pub const ALL: [MetroCity; 6] = [
        MetroCity::Busan,
        MetroCity::Incheon,
        MetroCity::Daegu,
        MetroCity::Daejeon,
        MetroCity::Gwangju,
        MetroCity::Ulsan,
    ];

    /// Canonical Korean name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Busan => "부산",
            Self::Incheon => "인천",
            Self::Daegu => "대구",
            Self::Daejeon => "대전",
            Self::Gwangju => "광주",
            Self::Ulsan => "울산",
        }
    }

    /// Match a token that begins with a city name ("대구광역시" -> Daegu)
    pub fn from_prefix(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|city| token.starts_with(city.name()))
    }
}

/// Canonical region derived from an address
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Region {
    /// 서울
    Seoul,
    /// 경기
    Gyeonggi,
    /// One of the six metropolitan cities
    Metro(MetroCity),
    /// 세종
    Sejong,
    /// First address token with its suffix stripped; no rate group
    Other(String),
    /// Empty or missing address
    #[default]
    Unknown,
}

impl Region {
    /// Canonical name; empty for [`Region::Unknown`]
    pub fn name(&self) -> &str {
        match self {
            Self::Seoul => "서울",
            Self::Gyeonggi => "경기",
            Self::Metro(city) => city.name(),
            Self::Sejong => "세종",
            Self::Other(name) => name,
            Self::Unknown => "",
        }
    }

    /// 서울 and 경기 carry no regional surcharge
    pub fn is_capital_area(&self) -> bool {
        matches!(self, Self::Seoul | Self::Gyeonggi)
    }

    /// Whether the region belongs to any rate group
    pub fn is_classified(&self) -> bool {
        !matches!(self, Self::Other(_) | Self::Unknown)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Region {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Strip one trailing administrative suffix from a token.
///
/// A bare suffix ("구") is returned unchanged.
pub fn strip_admin_suffix(token: &str) -> &str {
    ADMIN_SUFFIX
        .captures(token)
        .and_then(|caps| caps.get(1))
        .map_or(token, |m| m.as_str())
}

/// Normalize a free-text address into a canonical region.
///
/// Only the first whitespace-separated token is inspected. Canonical names
/// are matched on the token as written, so "대구광역시" is recognized before
/// any suffix is stripped. Unrecognized tokens fall back to
/// [`Region::Other`] with the administrative suffix removed.
pub fn normalize_region(address: &str) -> Region {
    let Some(first) = address.split_whitespace().next() else {
        return Region::Unknown;
    };

    if first.starts_with("서울") {
        return Region::Seoul;
    }
    if first.starts_with("경기") {
        return Region::Gyeonggi;
    }
    if let Some(city) = MetroCity::from_prefix(first) {
        return Region::Metro(city);
    }
    if first.contains("세종") {
        return Region::Sejong;
    }

    Region::Other(strip_admin_suffix(first).to_string())
}

/// Lookup key into the LTV table's region columns
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RegionKey(String);

impl RegionKey {
    /// Column shared by every tier in 세종
    pub const SEJONG_COMMON: &'static str = "세종_공통";
    /// Group name for the six metropolitan cities
    pub const METRO_GROUP: &'static str = "인천및광역시";

    /// Compose the key for a region and tier.
    ///
    /// Returns `None` for unclassified regions; the caller treats that as
    /// "rate lookup unavailable".
    pub fn resolve(region: &Region, tier: u8) -> Option<Self> {
        let key = match region {
            Region::Seoul | Region::Gyeonggi => format!("{}_{}급지", region.name(), tier),
            Region::Metro(_) => format!("{}_{}급지", Self::METRO_GROUP, tier),
            Region::Sejong => Self::SEJONG_COMMON.to_string(),
            Region::Other(_) | Region::Unknown => return None,
        };
        Some(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// String convenience over [`RegionKey::resolve`]; normalizes `region` first.
pub fn region_key(region: &str, tier: u8) -> Option<String> {
    RegionKey::resolve(&normalize_region(region), tier).map(|key| key.0)
}
