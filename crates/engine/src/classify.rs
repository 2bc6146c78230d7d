//! Classifier for raw ledger type/group strings.
//!
//! Rules apply in a fixed order, first match wins:
//! 1. whole-word "other" in either field → Other (precedes everything)
//! 2. exact canonical name, raw type checked before raw group
//! 3. ordered keyword table, substring match on either field
//! 4. default Other
//!
//! The classifier is total: any input pair, including empty strings,
//! resolves to a category.

use crate::model::MasterCategory;

/// Exact canonical names recognised after normalization.
const EXACT_NAMES: &[(&str, MasterCategory)] = &[
    ("ASSETS", MasterCategory::Assets),
    ("ASSET", MasterCategory::Assets),
    ("LIABILITIES", MasterCategory::Liabilities),
    ("LIABILITY", MasterCategory::Liabilities),
    ("EQUITY", MasterCategory::Equity),
    ("REVENUE", MasterCategory::Revenue),
    ("INCOME", MasterCategory::Revenue),
    ("COST OF GOODS SOLD", MasterCategory::CostOfGoods),
    ("COGS", MasterCategory::CostOfGoods),
    ("EXPENSES", MasterCategory::Expense),
    ("EXPENSE", MasterCategory::Expense),
];

/// Ordered keyword rules. Family order matters: receivable-style keywords
/// outrank payable-style ones for strings like "LOAN RECEIVABLE", and the
/// cost-of-goods family precedes revenue so "COST OF SALES" never routes
/// through the revenue "SALES" keyword.
const KEYWORD_RULES: &[(&str, MasterCategory)] = &[
    // Assets
    ("RECEIVABLE", MasterCategory::Assets),
    ("ACCUMULATED DEPRECIATION", MasterCategory::Assets),
    ("BANK", MasterCategory::Assets),
    ("CASH", MasterCategory::Assets),
    ("INVENTORY", MasterCategory::Assets),
    ("PREPAID", MasterCategory::Assets),
    ("UNDEPOSITED", MasterCategory::Assets),
    ("FIXED ASSET", MasterCategory::Assets),
    ("ASSET", MasterCategory::Assets),
    // Liabilities
    ("PAYABLE", MasterCategory::Liabilities),
    ("CREDIT CARD", MasterCategory::Liabilities),
    ("LOAN", MasterCategory::Liabilities),
    ("ACCRUED", MasterCategory::Liabilities),
    ("UNEARNED", MasterCategory::Liabilities),
    ("LIABILIT", MasterCategory::Liabilities),
    // Equity
    ("RETAINED EARNINGS", MasterCategory::Equity),
    ("OPENING BALANCE", MasterCategory::Equity),
    ("OWNER", MasterCategory::Equity),
    ("CAPITAL", MasterCategory::Equity),
    ("DISTRIBUTION", MasterCategory::Equity),
    ("DRAW", MasterCategory::Equity),
    ("EQUITY", MasterCategory::Equity),
    // Cost of goods (before revenue: "COST OF SALES" contains "SALES")
    ("COST OF GOODS", MasterCategory::CostOfGoods),
    ("COST OF SALES", MasterCategory::CostOfGoods),
    ("COGS", MasterCategory::CostOfGoods),
    ("DIRECT COST", MasterCategory::CostOfGoods),
    ("FREIGHT", MasterCategory::CostOfGoods),
    // Revenue
    ("REVENUE", MasterCategory::Revenue),
    ("INCOME", MasterCategory::Revenue),
    ("SALES", MasterCategory::Revenue),
    ("FEES EARNED", MasterCategory::Revenue),
    // Expense
    ("EXPENSE", MasterCategory::Expense),
    ("PAYROLL", MasterCategory::Expense),
    ("RENT", MasterCategory::Expense),
    ("UTILITIES", MasterCategory::Expense),
    ("INSURANCE", MasterCategory::Expense),
    ("DEPRECIATION", MasterCategory::Expense),
    ("ADVERTISING", MasterCategory::Expense),
    ("TRAVEL", MasterCategory::Expense),
];

/// Trim, uppercase, collapse internal whitespace runs.
fn normalize(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase()
}

/// Whole-word "OTHER" on a normalized string. Tokens split at
/// non-alphanumeric boundaries, so "OTHER EXPENSES" matches and
/// "BROTHERS" does not.
fn contains_other_token(normalized: &str) -> bool {
    normalized
        .split(|c: char| !c.is_ascii_alphanumeric())
        .any(|token| token == "OTHER")
}

/// Classify a raw ledger (type, group) pair into the master taxonomy.
pub fn classify(raw_type: &str, raw_group: &str) -> MasterCategory {
    let type_norm = normalize(raw_type);
    let group_norm = normalize(raw_group);

    if contains_other_token(&type_norm) || contains_other_token(&group_norm) {
        return MasterCategory::Other;
    }

    for field in [type_norm.as_str(), group_norm.as_str()] {
        for (name, category) in EXACT_NAMES {
            if field == *name {
                return *category;
            }
        }
    }

    for (keyword, category) in KEYWORD_RULES {
        if type_norm.contains(keyword) || group_norm.contains(keyword) {
            return *category;
        }
    }

    MasterCategory::Other
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn other_token_beats_every_keyword() {
        assert_eq!(classify("Other Operating Expense", ""), MasterCategory::Other);
        assert_eq!(classify("Expenses", "Other Miscellaneous"), MasterCategory::Other);
        assert_eq!(classify("Other Current Assets", ""), MasterCategory::Other);
    }

    #[test]
    fn other_requires_whole_word() {
        // "Brother" embeds "other" but must not trigger the override.
        assert_eq!(classify("Brother Expense", ""), MasterCategory::Expense);
        assert_eq!(classify("Others", ""), MasterCategory::Other); // default, not rule 1
    }

    #[test]
    fn normalization_ignores_case_and_whitespace() {
        assert_eq!(classify("  aSSetS ", ""), MasterCategory::Assets);
        assert_eq!(classify("  other   ASSETS ", ""), MasterCategory::Other);
        assert_eq!(classify("cost   of Goods    sold", ""), MasterCategory::CostOfGoods);
    }

    #[test]
    fn exact_names_resolve() {
        assert_eq!(classify("Income", ""), MasterCategory::Revenue);
        assert_eq!(classify("Liability", ""), MasterCategory::Liabilities);
        assert_eq!(classify("", "Equity"), MasterCategory::Equity);
    }

    #[test]
    fn type_checked_before_group() {
        assert_eq!(classify("Asset", "Expense"), MasterCategory::Assets);
    }

    #[test]
    fn keyword_families() {
        assert_eq!(classify("Accounts Receivable", ""), MasterCategory::Assets);
        assert_eq!(classify("", "Accounts Payable"), MasterCategory::Liabilities);
        assert_eq!(classify("Owner Draw", ""), MasterCategory::Equity);
        assert_eq!(classify("Sales of Product", ""), MasterCategory::Revenue);
        assert_eq!(classify("Payroll Taxes", ""), MasterCategory::Expense);
    }

    #[test]
    fn family_order_resolves_overlaps() {
        // RECEIVABLE outranks LOAN; COST OF SALES outranks SALES;
        // UNEARNED outranks REVENUE; ACCUMULATED DEPRECIATION outranks
        // the expense DEPRECIATION keyword.
        assert_eq!(classify("Loan Receivable", ""), MasterCategory::Assets);
        assert_eq!(classify("Cost of Sales", ""), MasterCategory::CostOfGoods);
        assert_eq!(classify("Unearned Revenue", ""), MasterCategory::Liabilities);
        assert_eq!(classify("Accumulated Depreciation", ""), MasterCategory::Assets);
        assert_eq!(classify("Depreciation Expense", ""), MasterCategory::Expense);
    }

    #[test]
    fn unmatched_defaults_to_other() {
        assert_eq!(classify("", ""), MasterCategory::Other);
        assert_eq!(classify("Zebra", "Crossing"), MasterCategory::Other);
    }
}
