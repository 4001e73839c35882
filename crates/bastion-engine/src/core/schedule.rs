use serde::{Deserialize, Serialize};

use super::{Cell, TowerId};

/// One scheduled tower purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    pub time: u64,
    pub cell: Cell,
    pub tower: TowerId,
}

impl Purchase {
    #[must_use]
    pub const fn new(time: u64, cell: Cell, tower: TowerId) -> Self {
        Self { time, cell, tower }
    }
}

/// Purchases ordered by scheduled time.
///
/// Every constructor sorts (stably), so purchases sharing a time keep the order
/// in which they were given and are executed in that order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Purchase>", into = "Vec<Purchase>")]
pub struct Schedule {
    purchases: Vec<Purchase>,
}

impl Schedule {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Purchase] {
        &self.purchases
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.purchases.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.purchases.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Purchase> + '_ {
        self.purchases.iter()
    }

    #[must_use]
    pub fn is_sorted(&self) -> bool {
        self.purchases.is_sorted_by_key(|p| p.time)
    }

    /// Removes and returns the leading purchases due at or before `time`.
    pub fn take_due(&mut self, time: u64) -> Vec<Purchase> {
        let end = self.purchases.partition_point(|p| p.time <= time);
        self.purchases.drain(..end).collect()
    }

    /// Puts postponed purchases back at the head of the schedule.
    ///
    /// Each of them must not be later than the current head so that ordering is
    /// preserved; they keep priority over purchases originally scheduled for the
    /// same time.
    pub fn requeue_front(&mut self, postponed: Vec<Purchase>) {
        debug_assert!(
            postponed
                .iter()
                .all(|p| self.purchases.first().is_none_or(|head| p.time <= head.time))
        );
        self.purchases.splice(0..0, postponed);
    }
}

impl From<Vec<Purchase>> for Schedule {
    fn from(mut purchases: Vec<Purchase>) -> Self {
        purchases.sort_by_key(|p| p.time);
        Self { purchases }
    }
}

impl From<Schedule> for Vec<Purchase> {
    fn from(schedule: Schedule) -> Self {
        schedule.purchases
    }
}

impl FromIterator<Purchase> for Schedule {
    fn from_iter<T: IntoIterator<Item = Purchase>>(iter: T) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

impl Extend<Purchase> for Schedule {
    fn extend<T: IntoIterator<Item = Purchase>>(&mut self, iter: T) {
        self.purchases.extend(iter);
        self.purchases.sort_by_key(|p| p.time);
    }
}

impl<'a> IntoIterator for &'a Schedule {
    type Item = &'a Purchase;
    type IntoIter = std::slice::Iter<'a, Purchase>;

    fn into_iter(self) -> Self::IntoIter {
        self.purchases.iter()
    }
}
