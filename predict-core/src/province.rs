use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

/// Every province the prediction service accepts, in selection-list order.
///
/// "Ha Noi" and "Hanoi" are both listed on purpose; they are distinct
/// provinces as far as the service and the history keys are concerned.
pub static PROVINCES: [&str; 40] = [
    "Bac Lieu",
    "Ho Chi Minh City",
    "Tam Ky",
    "Ben Tre",
    "Hoa Binh",
    "Tan An",
    "Bien Hoa",
    "Hong Gai",
    "Thai Nguyen",
    "Buon Me Thuot",
    "Hue",
    "Thanh Hoa",
    "Ca Mau",
    "Long Xuyen",
    "Tra Vinh",
    "Cam Pha",
    "My Tho",
    "Tuy Hoa",
    "Cam Ranh",
    "Nam Dinh",
    "Uong Bi",
    "Can Tho",
    "Nha Trang",
    "Viet Tri",
    "Chau Doc",
    "Phan Rang",
    "Vinh",
    "Da Lat",
    "Phan Thiet",
    "Vinh Long",
    "Ha Noi",
    "Play Cu",
    "Vung Tau",
    "Hai Duong",
    "Qui Nhon",
    "Yen Bai",
    "Hai Phong",
    "Rach Gia",
    "Hanoi",
    "Soc Trang",
];

/// A province name known to be one of [`PROVINCES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Province(&'static str);

impl Province {
    /// Exact, case-sensitive lookup.
    pub fn parse(name: &str) -> Result<Self, ValidationError> {
        if name.is_empty() {
            return Err(ValidationError::MissingProvince);
        }

        PROVINCES
            .iter()
            .find(|p| **p == name)
            .map(|p| Province(*p))
            .ok_or_else(|| ValidationError::UnknownProvince(name.to_string()))
    }

    pub fn all() -> impl Iterator<Item = Province> {
        PROVINCES.iter().map(|p| Province(*p))
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for Province {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

impl TryFrom<&str> for Province {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Province::parse(value)
    }
}

impl Serialize for Province {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0)
    }
}

impl<'de> Deserialize<'de> for Province {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Province::parse(&name).map_err(serde::de::Error::custom)
    }
}
