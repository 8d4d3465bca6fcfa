//! Fetch requests: which records enter the view and in what order.

use crate::predicate::Predicate;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cmp::Ordering;
use tidemark_core::{QueryError, Record, Value};

/// Orders the view by one field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortDescriptor {
    pub key: String,
    pub ascending: bool,
}

impl SortDescriptor {
    pub fn ascending(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ascending: true,
        }
    }

    pub fn descending(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ascending: false,
        }
    }
}

/// Predicate and sort descriptors for one fetch.
///
/// # Example
///
/// ```rust
/// use tidemark_store::{FetchRequest, Predicate, SortDescriptor};
///
/// let request = FetchRequest::new()
///     .predicate(Predicate::eq("done", false))
///     .sort_by(SortDescriptor::descending("rank"));
/// assert_eq!(request.sort_descriptors().len(), 1);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FetchRequest {
    predicate: Option<Predicate>,
    sort_descriptors: Vec<SortDescriptor>,
}

impl FetchRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the view to records matching `predicate`.
    pub fn predicate(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    /// Appends a sort descriptor. Earlier descriptors take precedence.
    pub fn sort_by(mut self, descriptor: SortDescriptor) -> Self {
        self.sort_descriptors.push(descriptor);
        self
    }

    pub fn with_sort_descriptors(mut self, descriptors: Vec<SortDescriptor>) -> Self {
        self.sort_descriptors = descriptors;
        self
    }

    pub fn get_predicate(&self) -> Option<&Predicate> {
        self.predicate.as_ref()
    }

    pub fn sort_descriptors(&self) -> &[SortDescriptor] {
        &self.sort_descriptors
    }

    /// Resolves this request against the one currently in effect.
    ///
    /// The predicate always replaces the current one (`None` clears it). An
    /// empty descriptor list keeps the current ordering.
    pub fn resolve_against(self, current: &FetchRequest) -> FetchRequest {
        let sort_descriptors = if self.sort_descriptors.is_empty() {
            current.sort_descriptors.clone()
        } else {
            self.sort_descriptors
        };
        FetchRequest {
            predicate: self.predicate,
            sort_descriptors,
        }
    }

    /// Filters and sorts `records` into a materialized view.
    ///
    /// Ties on every descriptor are broken by record id, so the resulting
    /// order is total and independent of the iteration order of `records`.
    pub fn materialize<'a, R, I>(&self, records: I) -> Result<Vec<Rc<R>>, QueryError>
    where
        R: Record + 'a,
        I: IntoIterator<Item = &'a Rc<R>>,
    {
        if self.sort_descriptors.is_empty() {
            return Err(QueryError::MissingSortDescriptor);
        }

        let mut keyed: Vec<(Vec<Value>, Rc<R>)> = Vec::new();
        for record in records {
            if let Some(predicate) = &self.predicate {
                if !predicate.evaluate(&**record)? {
                    continue;
                }
            }
            keyed.push((self.sort_key(&**record)?, Rc::clone(record)));
        }

        keyed.sort_by(|(key_a, a), (key_b, b)| {
            self.compare_keys(key_a, key_b)
                .then_with(|| a.id().cmp(&b.id()))
        });
        Ok(keyed.into_iter().map(|(_, record)| record).collect())
    }

    fn sort_key<R: Record + ?Sized>(&self, record: &R) -> Result<Vec<Value>, QueryError> {
        self.sort_descriptors
            .iter()
            .map(|d| {
                record
                    .field(&d.key)
                    .ok_or_else(|| QueryError::unknown_key(d.key.as_str()))
            })
            .collect()
    }

    fn compare_keys(&self, a: &[Value], b: &[Value]) -> Ordering {
        for ((descriptor, va), vb) in self.sort_descriptors.iter().zip(a).zip(b) {
            let ordering = if descriptor.ascending {
                va.cmp(vb)
            } else {
                vb.cmp(va)
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use tidemark_core::Entity;

    fn records(rows: &[(u64, i64, bool)]) -> Vec<Rc<Entity>> {
        rows
            .iter()
            .map(|&(id, rank, done)| Rc::new(Entity::new(id).with("rank", rank).with("done", done)))
            .collect()
    }

    fn ids(view: &[Rc<Entity>]) -> Vec<u64> {
        view.iter().map(|r| r.id()).collect()
    }

    #[test]
    fn test_materialize_sorts_ascending() {
        let rs = records(&[(1, 30, false), (2, 10, false), (3, 20, false)]);
        let request = FetchRequest::new().sort_by(SortDescriptor::ascending("rank"));
        assert_eq!(ids(&request.materialize(&rs).unwrap()), vec![2, 3, 1]);
    }

    #[test]
    fn test_materialize_sorts_descending() {
        let rs = records(&[(1, 30, false), (2, 10, false), (3, 20, false)]);
        let request = FetchRequest::new().sort_by(SortDescriptor::descending("rank"));
        assert_eq!(ids(&request.materialize(&rs).unwrap()), vec![1, 3, 2]);
    }

    #[test]
    fn test_materialize_ties_break_by_id() {
        let rs = records(&[(9, 1, false), (4, 1, false), (6, 1, false)]);
        let request = FetchRequest::new().sort_by(SortDescriptor::ascending("rank"));
        assert_eq!(ids(&request.materialize(&rs).unwrap()), vec![4, 6, 9]);
    }

    #[test]
    fn test_materialize_secondary_descriptor() {
        let rs = records(&[(1, 2, true), (2, 1, false), (3, 1, true)]);
        let request = FetchRequest::new()
            .sort_by(SortDescriptor::descending("done"))
            .sort_by(SortDescriptor::ascending("rank"));
        assert_eq!(ids(&request.materialize(&rs).unwrap()), vec![3, 1, 2]);
    }

    #[test]
    fn test_materialize_filters() {
        let rs = records(&[(1, 30, true), (2, 10, false), (3, 20, false)]);
        let request = FetchRequest::new()
            .predicate(Predicate::eq("done", false))
            .sort_by(SortDescriptor::ascending("rank"));
        assert_eq!(ids(&request.materialize(&rs).unwrap()), vec![2, 3]);
    }

    #[test]
    fn test_materialize_unknown_sort_key() {
        let rs = records(&[(1, 30, true)]);
        let request = FetchRequest::new().sort_by(SortDescriptor::ascending("title"));
        assert_eq!(
            request.materialize(&rs).unwrap_err(),
            QueryError::unknown_key("title")
        );
    }

    #[test]
    fn test_materialize_requires_sort_descriptor() {
        let rs = records(&[(1, 30, true)]);
        assert_eq!(
            FetchRequest::new().materialize(&rs).unwrap_err(),
            QueryError::MissingSortDescriptor
        );
    }

    #[test]
    fn test_resolve_against_keeps_current_ordering() {
        let current = FetchRequest::new()
            .predicate(Predicate::eq("done", true))
            .sort_by(SortDescriptor::ascending("rank"));

        let resolved = FetchRequest::new().resolve_against(&current);
        assert_eq!(resolved.sort_descriptors(), current.sort_descriptors());
        assert!(resolved.get_predicate().is_none());

        let resolved = FetchRequest::new()
            .sort_by(SortDescriptor::descending("rank"))
            .resolve_against(&current);
        assert!(!resolved.sort_descriptors()[0].ascending);
    }
}
