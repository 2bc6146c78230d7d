use std::fmt;

use serde::{Deserialize, Serialize};

use crate::classify::classify;

// ---------------------------------------------------------------------------
// Master taxonomy
// ---------------------------------------------------------------------------

/// Closed master-category set. Every destination record classifies into
/// exactly one of these; the set is never extended at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MasterCategory {
    Assets,
    Liabilities,
    Equity,
    Revenue,
    CostOfGoods,
    Expense,
    Other,
}

impl MasterCategory {
    pub const ALL: [MasterCategory; 7] = [
        Self::Assets,
        Self::Liabilities,
        Self::Equity,
        Self::Revenue,
        Self::CostOfGoods,
        Self::Expense,
        Self::Other,
    ];

    /// Canonical display name, also the persisted `type` value.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Assets => "Assets",
            Self::Liabilities => "Liabilities",
            Self::Equity => "Equity",
            Self::Revenue => "Revenue",
            Self::CostOfGoods => "Cost of Goods Sold",
            Self::Expense => "Expense",
            Self::Other => "Other",
        }
    }

    /// Stable short identifier used in storage keys and CLI arguments.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Assets => "assets",
            Self::Liabilities => "liabilities",
            Self::Equity => "equity",
            Self::Revenue => "revenue",
            Self::CostOfGoods => "cogs",
            Self::Expense => "expense",
            Self::Other => "other",
        }
    }

    /// Parse a display name or slug, case-insensitively.
    pub fn parse(input: &str) -> Option<MasterCategory> {
        let needle = input.trim();
        Self::ALL.into_iter().find(|cat| {
            needle.eq_ignore_ascii_case(cat.name()) || needle.eq_ignore_ascii_case(cat.slug())
        })
    }
}

impl fmt::Display for MasterCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ---------------------------------------------------------------------------
// Slot tiers
// ---------------------------------------------------------------------------

/// Ranked preference tiers of one source row, highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotLevel {
    Most,
    Likely,
    Possible,
}

impl SlotLevel {
    pub const ALL: [SlotLevel; 3] = [Self::Most, Self::Likely, Self::Possible];

    pub fn index(&self) -> usize {
        match self {
            Self::Most => 0,
            Self::Likely => 1,
            Self::Possible => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Most => "most",
            Self::Likely => "likely",
            Self::Possible => "possible",
        }
    }

    pub fn parse(input: &str) -> Option<SlotLevel> {
        Self::ALL
            .into_iter()
            .find(|level| input.trim().eq_ignore_ascii_case(level.as_str()))
    }

    /// The tier a displaced occupant falls to. `None` past the bottom:
    /// the occupant is evicted back to the pool.
    pub fn below(&self) -> Option<SlotLevel> {
        match self {
            Self::Most => Some(Self::Likely),
            Self::Likely => Some(Self::Possible),
            Self::Possible => None,
        }
    }
}

impl fmt::Display for SlotLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Rows and records
// ---------------------------------------------------------------------------

/// One template row a mapping targets. Immutable after load; `id` is
/// unique within its master category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRow {
    pub id: String,
    pub number: String,
    pub name: String,
    pub group_heading: String,
}

/// One account from the external ledger. Immutable after load; `id` is
/// globally unique. `category` is the classifier verdict, fixed at
/// construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationRecord {
    pub id: String,
    pub number: String,
    pub name: String,
    pub raw_type: String,
    pub raw_group: String,
    pub category: MasterCategory,
}

impl DestinationRecord {
    pub fn new(
        id: impl Into<String>,
        number: impl Into<String>,
        name: impl Into<String>,
        raw_type: impl Into<String>,
        raw_group: impl Into<String>,
    ) -> DestinationRecord {
        let raw_type = raw_type.into();
        let raw_group = raw_group.into();
        let category = classify(&raw_type, &raw_group);
        DestinationRecord {
            id: id.into(),
            number: number.into(),
            name: name.into(),
            raw_type,
            raw_group,
            category,
        }
    }
}
