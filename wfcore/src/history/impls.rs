use std::ops::Deref;
use super::*;

impl From<Vec<HistoryRecord>> for History {
    fn from(args: Vec<HistoryRecord>) -> Self {
        Self(args)
    }
}

impl Deref for History {
    type Target = Vec<HistoryRecord>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl IntoIterator for History {
    type Item = HistoryRecord;
    type IntoIter = std::vec::IntoIter<HistoryRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a HistoryRecord;
    type IntoIter = std::slice::Iter<'a, HistoryRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl HistoryOrder {
    pub fn is_recent_first(&self) -> bool {
        matches!(self, HistoryOrder::RecentFirst)
    }
}
