//! Read-time consolidation of expense records.
//!
//! Records that share every field of a [`GroupingKey`] are shown and printed
//! as one block. Grouping is a projection over the stored rows, recomputed
//! each time; nothing here is persisted.

use crate::core::{
    money::{to_decimal, to_f64},
    narrative,
    record::ExpenseRecord,
};
use serde::Serialize;
use std::{cmp::Ordering, collections::HashMap};

/// Composite key records are grouped by. Two records group together only
/// when every field is equal; empty strings are ordinary values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct GroupingKey {
    /// Name of the OM the expense is for
    pub owning_org: String,
    /// UG code of the OM the expense is for
    pub owning_ug: String,
    /// Name of the OM holding the budget
    pub holding_org: String,
    /// UG code of the OM holding the budget
    pub holding_ug: String,
    /// Days of operation
    pub operation_days: u32,
    /// Number of people
    pub staffing: u32,
    /// Activity phase label
    pub activity_phase: String,
}

impl GroupingKey {
    /// True when the budget comes from a different UG than the one spending it.
    #[must_use]
    pub fn is_transfer(&self) -> bool {
        !self.holding_ug.is_empty() && self.holding_ug != self.owning_ug
    }
}

/// A block of records sharing one grouping key, with running sums.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsolidatedGroup {
    /// Shared key of every member
    pub key: GroupingKey,
    /// Members in the order they were seen
    pub records: Vec<ExpenseRecord>,
    /// Sum of the members' totals
    pub total: f64,
    /// Sum of the members' ND 33.90.30 portions
    pub nd30: f64,
    /// Sum of the members' ND 33.90.39 portions
    pub nd39: f64,
}

impl ConsolidatedGroup {
    fn new(key: GroupingKey) -> Self {
        Self {
            key,
            records: Vec::new(),
            total: 0.0,
            nd30: 0.0,
            nd39: 0.0,
        }
    }

    fn push(&mut self, record: ExpenseRecord) {
        self.total = to_f64(to_decimal(self.total).saturating_add(to_decimal(record.total)));
        self.nd30 = to_f64(to_decimal(self.nd30).saturating_add(to_decimal(record.nd30)));
        self.nd39 = to_f64(to_decimal(self.nd39).saturating_add(to_decimal(record.nd39)));
        self.records.push(record);
    }

    /// First member; its custom narrative, if any, speaks for the whole group.
    #[must_use]
    pub fn anchor(&self) -> Option<&ExpenseRecord> {
        self.records.first()
    }

    /// Canonical memória de cálculo of the group.
    #[must_use]
    pub fn narrative(&self) -> String {
        narrative::group_narrative(self)
    }

    /// See [`GroupingKey::is_transfer`].
    #[must_use]
    pub fn is_transfer(&self) -> bool {
        self.key.is_transfer()
    }
}

/// Groups records by their composite key.
///
/// Every record lands in exactly one group, groups keep first-seen member
/// order, and groups are ordered by owning OM name (see [`compare_org_names`]),
/// ties keeping first-seen order.
#[must_use]
pub fn consolidate(records: &[ExpenseRecord]) -> Vec<ConsolidatedGroup> {
    let mut index: HashMap<GroupingKey, usize> = HashMap::new();
    let mut groups: Vec<ConsolidatedGroup> = Vec::new();

    for record in records {
        let key = record.grouping_key();
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            groups.push(ConsolidatedGroup::new(key));
            groups.len() - 1
        });
        groups[slot].push(record.clone());
    }

    groups.sort_by(|a, b| compare_org_names(&a.key.owning_org, &b.key.owning_org));
    groups
}

/// Orders OM names the way a Portuguese reader expects: accents and case
/// are ignored first, then the raw text breaks ties.
#[must_use]
pub fn compare_org_names(a: &str, b: &str) -> Ordering {
    fold(a).cmp(&fold(b)).then_with(|| a.cmp(b))
}

fn fold(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            'ñ' => 'n',
            'º' => 'o',
            'ª' => 'a',
            other => other,
        })
        .collect()
}
