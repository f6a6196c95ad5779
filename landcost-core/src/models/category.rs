use std::fmt;

use serde::{Deserialize, Serialize};

/// The four sections of a land-acquisition cost estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum Category {
    LandCompensation,
    Demolition,
    Resettlement,
    Contingency,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Self::LandCompensation,
        Self::Demolition,
        Self::Resettlement,
        Self::Contingency,
    ];

    pub fn id(&self) -> i32 {
        match self {
            Self::LandCompensation => 1,
            Self::Demolition => 2,
            Self::Resettlement => 3,
            Self::Contingency => 4,
        }
    }

    pub fn from_id(id: i32) -> Option<Self> {
        match id {
            1 => Some(Self::LandCompensation),
            2 => Some(Self::Demolition),
            3 => Some(Self::Resettlement),
            4 => Some(Self::Contingency),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::LandCompensation => "征地补偿费",
            Self::Demolition => "拆迁补偿费",
            Self::Resettlement => "人员及企业安置补偿费",
            Self::Contingency => "不可预见费",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl From<Category> for i32 {
    fn from(category: Category) -> Self {
        category.id()
    }
}

impl TryFrom<i32> for Category {
    type Error = String;

    fn try_from(id: i32) -> Result<Self, Self::Error> {
        Self::from_id(id).ok_or_else(|| format!("category must be between 1 and 4, got {id}"))
    }
}

/// Formula variant for the category-1 land compensation line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComputingMethod {
    /// Total parcel area × average comprehensive standard, both taken as entered.
    #[default]
    Direct,
    /// Totals derived from the sub-type rows; cost is the sum of per-sub-type products.
    Itemized,
}

impl ComputingMethod {
    pub fn id(&self) -> i32 {
        match self {
            Self::Direct => 1,
            Self::Itemized => 2,
        }
    }

    pub fn from_id(id: i32) -> Option<Self> {
        match id {
            1 => Some(Self::Direct),
            2 => Some(Self::Itemized),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn category_ids_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::from_id(category.id()), Some(category));
        }
    }

    #[test]
    fn category_rejects_out_of_range_ids() {
        assert_eq!(Category::from_id(0), None);
        assert_eq!(Category::from_id(5), None);
        assert!(Category::try_from(-1).is_err());
    }

    #[test]
    fn computing_method_accepts_only_one_and_two() {
        assert_eq!(ComputingMethod::from_id(1), Some(ComputingMethod::Direct));
        assert_eq!(ComputingMethod::from_id(2), Some(ComputingMethod::Itemized));
        assert_eq!(ComputingMethod::from_id(3), None);
    }
}
