//! A pool of typed sets backed by one shared ZDD factory.
//!
//! A [`SetPool`] maps domain elements to ZDD variables and represents each
//! pooled set as the family of its singleton sets (one lo-chain path in
//! the shared graph), so membership, insertion, and removal all translate
//! directly to ZDD operations, and set equality is handle identity.
//!
//! The domain mapping is either eager ([`SetPool::with_domain`], where the
//! iterator supplies elements in increasing expected frequency so that the
//! rarest elements sit at the top of the ordering) or lazy
//! ([`SetPool::new`], where variables are allocated on first reference).

use std::cell::{Cell, RefCell};
use std::fmt;
use std::hash::Hash;

use hashbrown::HashMap;
use log::debug;

use crate::error::{DdError, Result};
use crate::iter::Elements;
use crate::zdd::{ZddManager, ZddRef};

/// A pool of sets of `T` sharing one ZDD factory.
#[derive(Debug)]
pub struct SetPool<T> {
    mgr: ZddManager,
    e2v: RefCell<HashMap<T, u32>>,
    v2e: RefCell<Vec<Option<T>>>,
    lazy: bool,
}

/// One pooled set: a handle onto the shared graph.
///
/// All operations go through the owning [`SetPool`]. The handle moves as
/// the set is mutated; equal handles denote equal sets.
#[derive(Debug)]
pub struct PoolSet {
    zdd: Cell<ZddRef>,
}

impl PoolSet {
    /// The current ZDD handle of this set.
    pub fn handle(&self) -> ZddRef {
        self.zdd.get()
    }
}

impl<T> SetPool<T>
where
    T: Eq + Hash + Clone,
{
    /// Creates a pool over a domain of the given size with lazily allocated
    /// variables.
    pub fn new(domain_size: usize, cache_capacity: usize) -> Result<Self> {
        if domain_size == 0 {
            return Err(DdError::invalid_argument("Domain size must be a positive integer"));
        }
        let ordering: Vec<u32> = (0..domain_size as u32).collect();
        debug!("new SetPool: domain size {}, lazy mapping", domain_size);
        Ok(Self {
            mgr: ZddManager::new(&ordering, cache_capacity)?,
            e2v: RefCell::new(HashMap::new()),
            v2e: RefCell::new(vec![None; domain_size]),
            lazy: true,
        })
    }

    /// Creates a pool whose domain is the given elements, eagerly mapped in
    /// iteration order: supply the least common element first and the most
    /// common last for a good ordering.
    pub fn with_domain(domain: impl IntoIterator<Item = T>, cache_capacity: usize) -> Result<Self> {
        let mut e2v = HashMap::new();
        let mut v2e = Vec::new();
        for element in domain {
            let var = v2e.len() as u32;
            if e2v.insert(element.clone(), var).is_some() {
                return Err(DdError::invalid_argument("Duplicate element in pool domain"));
            }
            v2e.push(Some(element));
        }
        if v2e.is_empty() {
            return Err(DdError::invalid_argument("Domain size must be a positive integer"));
        }
        let ordering: Vec<u32> = (0..v2e.len() as u32).collect();
        debug!("new SetPool: domain size {}, eager mapping", v2e.len());
        Ok(Self {
            mgr: ZddManager::new(&ordering, cache_capacity)?,
            e2v: RefCell::new(e2v),
            v2e: RefCell::new(v2e),
            lazy: false,
        })
    }

    /// The size of the pool's domain.
    pub fn domain_size(&self) -> usize {
        self.mgr.num_vars()
    }

    /// The backing ZDD factory.
    pub fn manager(&self) -> &ZddManager {
        &self.mgr
    }

    /// A new empty set.
    pub fn empty_set(&self) -> PoolSet {
        PoolSet {
            zdd: Cell::new(self.mgr.empty()),
        }
    }

    /// A new set holding the given elements.
    pub fn set_from(&self, items: &[T]) -> Result<PoolSet> {
        let set = self.empty_set();
        self.add_all(&set, items)?;
        Ok(set)
    }

    fn lookup(&self, element: &T) -> Option<u32> {
        self.e2v.borrow().get(element).copied()
    }

    /// The variable of `element`, allocating one in a lazy pool.
    fn intern(&self, element: &T) -> Result<u32> {
        if let Some(var) = self.lookup(element) {
            return Ok(var);
        }
        if !self.lazy {
            return Err(DdError::no_such_element("Element is not part of the pool domain"));
        }
        let mut e2v = self.e2v.borrow_mut();
        let var = e2v.len() as u32;
        if var as usize >= self.domain_size() {
            return Err(DdError::invalid_argument(format!(
                "Pool domain of size {} is exhausted",
                self.domain_size()
            )));
        }
        e2v.insert(element.clone(), var);
        self.v2e.borrow_mut()[var as usize] = Some(element.clone());
        Ok(var)
    }

    fn check_set(&self, set: &PoolSet) -> Result<ZddRef> {
        let handle = set.handle();
        self.mgr.check(handle)?;
        Ok(handle)
    }

    /// Membership test.
    pub fn contains(&self, set: &PoolSet, element: &T) -> Result<bool> {
        let handle = self.check_set(set)?;
        match self.lookup(element) {
            None => Ok(false),
            Some(var) => {
                let singleton = self.mgr.element(var)?;
                Ok(!self.mgr.intersection(handle, singleton)?.is_empty_family())
            }
        }
    }

    /// Inserts `element`. Returns true iff the set changed.
    pub fn add(&self, set: &PoolSet, element: &T) -> Result<bool> {
        let handle = self.check_set(set)?;
        let var = self.intern(element)?;
        let updated = self.mgr.union(handle, self.mgr.element(var)?)?;
        set.zdd.set(updated);
        Ok(updated != handle)
    }

    /// Removes `element`. Returns true iff the set changed.
    pub fn remove(&self, set: &PoolSet, element: &T) -> Result<bool> {
        let handle = self.check_set(set)?;
        match self.lookup(element) {
            None => Ok(false),
            Some(var) => {
                let updated = self.mgr.difference(handle, self.mgr.element(var)?)?;
                set.zdd.set(updated);
                Ok(updated != handle)
            }
        }
    }

    /// Inserts every element of `items`. Returns true iff the set changed.
    pub fn add_all(&self, set: &PoolSet, items: &[T]) -> Result<bool> {
        let mut changed = false;
        for element in items {
            changed |= self.add(set, element)?;
        }
        Ok(changed)
    }

    /// Removes every element of `items`. Returns true iff the set changed.
    pub fn remove_all(&self, set: &PoolSet, items: &[T]) -> Result<bool> {
        let mut changed = false;
        for element in items {
            changed |= self.remove(set, element)?;
        }
        Ok(changed)
    }

    /// Keeps only the elements of `items`. Returns true iff the set
    /// changed.
    pub fn retain_all(&self, set: &PoolSet, items: &[T]) -> Result<bool> {
        let handle = self.check_set(set)?;
        let mut keep = self.mgr.empty();
        for element in items {
            if let Some(var) = self.lookup(element) {
                keep = self.mgr.union(keep, self.mgr.element(var)?)?;
            }
        }
        let updated = self.mgr.intersection(handle, keep)?;
        set.zdd.set(updated);
        Ok(updated != handle)
    }

    /// Returns true iff every element of `items` is in the set.
    pub fn contains_all(&self, set: &PoolSet, items: &[T]) -> Result<bool> {
        for element in items {
            if !self.contains(set, element)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// The number of elements in the set.
    pub fn len(&self, set: &PoolSet) -> Result<usize> {
        let handle = self.check_set(set)?;
        Ok(self.mgr.count(handle)? as usize)
    }

    /// Returns true iff the set has no elements.
    pub fn is_empty(&self, set: &PoolSet) -> Result<bool> {
        Ok(self.check_set(set)?.is_empty_family())
    }

    /// Removes every element.
    pub fn clear(&self, set: &PoolSet) -> Result<()> {
        self.check_set(set)?;
        set.zdd.set(self.mgr.empty());
        Ok(())
    }

    /// Iterates the set's elements in ordering order.
    ///
    /// The iterator captures the set's handle at construction; if the set
    /// is mutated afterwards, the next step yields an
    /// [`ErrorKind::ConcurrentModification`](crate::error::ErrorKind)
    /// error.
    pub fn iter<'a>(&'a self, set: &'a PoolSet) -> Result<PoolIter<'a, T>> {
        let handle = self.check_set(set)?;
        Ok(PoolIter {
            pool: self,
            set,
            snapshot: handle,
            inner: self.mgr.elements(handle)?,
        })
    }

    /// The set's elements as a vector, in ordering order.
    pub fn to_vec(&self, set: &PoolSet) -> Result<Vec<T>> {
        self.iter(set)?.collect()
    }

    /// Renders the set as `{a,b,c}` in ordering order.
    pub fn format_set(&self, set: &PoolSet) -> Result<String>
    where
        T: fmt::Display,
    {
        let mut out = String::from("{");
        let mut first = true;
        for element in self.iter(set)? {
            if !first {
                out.push(',');
            }
            first = false;
            out.push_str(&element?.to_string());
        }
        out.push('}');
        Ok(out)
    }

    /// Reclaims shared-graph nodes unreachable from the given live sets.
    pub fn collect_garbage(&self, live: &[&PoolSet]) -> Result<usize> {
        let mut roots = Vec::with_capacity(live.len());
        for set in live {
            roots.push(self.check_set(set)?);
        }
        self.mgr.collect_garbage(&roots)
    }
}

/// Iterator over a pooled set's elements.
pub struct PoolIter<'a, T> {
    pool: &'a SetPool<T>,
    set: &'a PoolSet,
    snapshot: ZddRef,
    inner: Elements<'a>,
}

impl<T> Iterator for PoolIter<'_, T>
where
    T: Eq + Hash + Clone,
{
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.set.handle() != self.snapshot {
            return Some(Err(DdError::concurrent_modification(
                "Set was modified during iteration",
            )));
        }
        let var = self.inner.next()?;
        let element = self.pool.v2e.borrow()[var as usize].clone();
        debug_assert!(element.is_some(), "variable without a domain element");
        element.map(Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_add_remove_contains() {
        let pool: SetPool<&str> = SetPool::new(4, 64).unwrap();
        let set = pool.empty_set();

        assert!(pool.add(&set, &"a").unwrap());
        assert!(!pool.add(&set, &"a").unwrap()); // already present
        assert!(pool.add(&set, &"b").unwrap());
        assert_eq!(pool.len(&set).unwrap(), 2);

        assert!(pool.contains(&set, &"a").unwrap());
        assert!(!pool.contains(&set, &"zzz").unwrap());

        assert!(pool.remove(&set, &"a").unwrap());
        assert!(!pool.remove(&set, &"a").unwrap()); // already gone
        assert_eq!(pool.len(&set).unwrap(), 1);
    }

    #[test]
    fn test_set_equality_is_handle_identity() {
        let pool: SetPool<u32> = SetPool::new(8, 64).unwrap();
        let a = pool.set_from(&[1, 2, 3]).unwrap();
        let b = pool.set_from(&[3, 2, 1]).unwrap();
        assert_eq!(a.handle(), b.handle());
    }

    #[test]
    fn test_bulk_operations() {
        let pool: SetPool<u32> = SetPool::new(8, 64).unwrap();
        let set = pool.set_from(&[1, 2, 3, 4]).unwrap();

        assert!(pool.contains_all(&set, &[2, 3]).unwrap());
        assert!(!pool.contains_all(&set, &[2, 7]).unwrap());

        assert!(pool.retain_all(&set, &[2, 3, 9]).unwrap());
        assert_eq!(pool.to_vec(&set).unwrap(), vec![2, 3]);

        assert!(pool.remove_all(&set, &[3, 5]).unwrap());
        assert_eq!(pool.len(&set).unwrap(), 1);

        pool.clear(&set).unwrap();
        assert!(pool.is_empty(&set).unwrap());
    }

    #[test]
    fn test_eager_domain_rejects_unknown() {
        let pool = SetPool::with_domain(["x", "y"], 64).unwrap();
        let set = pool.empty_set();
        assert!(pool.add(&set, &"x").unwrap());
        let err = pool.add(&set, &"nope").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoSuchElement);
    }

    #[test]
    fn test_lazy_domain_exhaustion() {
        let pool: SetPool<u32> = SetPool::new(2, 64).unwrap();
        let set = pool.empty_set();
        pool.add(&set, &10).unwrap();
        pool.add(&set, &20).unwrap();
        let err = pool.add(&set, &30).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_iteration_order_and_format() {
        let pool = SetPool::with_domain(["rare", "common", "ubiquitous"], 64).unwrap();
        let set = pool.set_from(&["ubiquitous", "rare"]).unwrap();

        let elements: Vec<_> = pool.iter(&set).unwrap().map(|e| e.unwrap()).collect();
        assert_eq!(elements, vec!["rare", "ubiquitous"]);
        assert_eq!(pool.format_set(&set).unwrap(), "{rare,ubiquitous}");
        assert_eq!(pool.format_set(&pool.empty_set()).unwrap(), "{}");
    }

    #[test]
    fn test_concurrent_modification_detected() {
        let pool: SetPool<u32> = SetPool::new(4, 64).unwrap();
        let set = pool.set_from(&[0, 1, 2]).unwrap();

        let mut iter = pool.iter(&set).unwrap();
        assert!(iter.next().unwrap().is_ok());

        pool.remove(&set, &1).unwrap();
        let err = iter.next().unwrap().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConcurrentModification);
    }

    #[test]
    fn test_cross_pool_set_rejected() {
        let a: SetPool<u32> = SetPool::new(4, 64).unwrap();
        let b: SetPool<u32> = SetPool::new(4, 64).unwrap();
        let set = a.empty_set();
        let err = b.add(&set, &1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_collect_garbage_keeps_live_sets() {
        let pool: SetPool<u32> = SetPool::new(8, 64).unwrap();
        let keep = pool.set_from(&[1, 2, 5]).unwrap();
        let scrap = pool.set_from(&[0, 3, 6, 7]).unwrap();
        pool.clear(&scrap).unwrap();

        pool.collect_garbage(&[&keep]).unwrap();
        assert_eq!(pool.to_vec(&keep).unwrap(), vec![1, 2, 5]);
    }
}
