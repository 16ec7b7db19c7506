//! Bidirectional one-to-one mapping.
//!
//! Holds a node correspondence between two trees. At most one `B` is associated
//! with any `A` and vice versa; overwriting evicts the stale partner on both
//! sides so no one-sided link ever survives.

use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;

use indextree::NodeId;
use rapidhash::RapidHashMap as HashMap;

/// How keys of a [`BiMap`] are compared and hashed.
pub trait Equivalence<T> {
    /// Whether two keys denote the same entry.
    fn equivalent(a: &T, b: &T) -> bool;

    /// Hash a key consistently with [`Equivalence::equivalent`].
    fn hash<H: Hasher>(value: &T, state: &mut H);
}

/// Structural comparison through `Eq` and `Hash`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByValue;

impl<T: Eq + Hash> Equivalence<T> for ByValue {
    fn equivalent(a: &T, b: &T) -> bool {
        a == b
    }

    fn hash<H: Hasher>(value: &T, state: &mut H) {
        value.hash(state);
    }
}

/// Identity comparison of borrowed keys: two references are the same key only
/// if they point at the same object, whatever its contents.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByAddress;

impl<T: ?Sized> Equivalence<&T> for ByAddress {
    fn equivalent(a: &&T, b: &&T) -> bool {
        core::ptr::eq(*a, *b)
    }

    fn hash<H: Hasher>(value: &&T, state: &mut H) {
        core::ptr::hash(*value, state);
    }
}

/// A key wrapped with its comparison strategy.
struct Keyed<T, S>(T, PhantomData<fn() -> S>);

impl<T, S> Keyed<T, S> {
    fn new(value: T) -> Self {
        Self(value, PhantomData)
    }
}

impl<T: Clone, S> Clone for Keyed<T, S> {
    fn clone(&self) -> Self {
        Self::new(self.0.clone())
    }
}

impl<T, S: Equivalence<T>> PartialEq for Keyed<T, S> {
    fn eq(&self, other: &Self) -> bool {
        S::equivalent(&self.0, &other.0)
    }
}

impl<T, S: Equivalence<T>> Eq for Keyed<T, S> {}

impl<T, S: Equivalence<T>> Hash for Keyed<T, S> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        S::hash(&self.0, state);
    }
}

/// A one-to-one association between values of `A` and values of `B`.
///
/// The strategy `S` fixes how keys on both sides are compared: [`ByValue`] for
/// structural keys such as [`NodeId`] or strings, [`ByAddress`] for references
/// that must be told apart even when their contents are equal.
pub struct BiMap<A, B, S = ByValue> {
    from: HashMap<Keyed<A, S>, B>,
    to: HashMap<Keyed<B, S>, A>,
}

/// Correspondence from nodes of one tree to nodes of another.
pub type NodeMapping = BiMap<NodeId, NodeId>;

impl<A, B, S> Default for BiMap<A, B, S> {
    fn default() -> Self {
        Self {
            from: HashMap::default(),
            to: HashMap::default(),
        }
    }
}

impl<A: Clone, B: Clone, S: Equivalence<A> + Equivalence<B>> Clone for BiMap<A, B, S> {
    fn clone(&self) -> Self {
        Self {
            from: self.from.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            to: self.to.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        }
    }
}

impl<A, B, S> BiMap<A, B, S>
where
    A: Clone,
    B: Clone,
    S: Equivalence<A> + Equivalence<B>,
{
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate `a` with `b`.
    ///
    /// Any previous partner of `a` and any previous partner of `b` lose their
    /// association. Returns the previous partner of `a`.
    pub fn put(&mut self, a: A, b: B) -> Option<B> {
        let old_b = self.from.remove(&Keyed::new(a.clone()));
        if let Some(old_b) = &old_b {
            self.to.remove(&Keyed::new(old_b.clone()));
        }
        if let Some(old_a) = self.to.remove(&Keyed::new(b.clone())) {
            self.from.remove(&Keyed::new(old_a));
        }
        self.from.insert(Keyed::new(a.clone()), b.clone());
        self.to.insert(Keyed::new(b), a);
        old_b
    }

    /// Partner of `a`.
    pub fn get_from(&self, a: &A) -> Option<&B> {
        self.from.get(&Keyed::new(a.clone()))
    }

    /// Partner of `b`.
    pub fn get_to(&self, b: &B) -> Option<&A> {
        self.to.get(&Keyed::new(b.clone()))
    }

    /// Whether `a` has a partner.
    pub fn contains_from(&self, a: &A) -> bool {
        self.from.contains_key(&Keyed::new(a.clone()))
    }

    /// Whether `b` has a partner.
    pub fn contains_to(&self, b: &B) -> bool {
        self.to.contains_key(&Keyed::new(b.clone()))
    }

    /// Drop the association of `a`, returning its partner.
    pub fn remove_from(&mut self, a: &A) -> Option<B> {
        let b = self.from.remove(&Keyed::new(a.clone()))?;
        self.to.remove(&Keyed::new(b.clone()));
        Some(b)
    }

    /// Drop the association of `b`, returning its partner.
    pub fn remove_to(&mut self, b: &B) -> Option<A> {
        let a = self.to.remove(&Keyed::new(b.clone()))?;
        self.from.remove(&Keyed::new(a.clone()));
        Some(a)
    }
}

impl<A, B, S> BiMap<A, B, S> {
    /// Number of associated pairs.
    pub fn len(&self) -> usize {
        self.from.len()
    }

    /// Whether the mapping is empty.
    pub fn is_empty(&self) -> bool {
        self.from.is_empty()
    }

    /// Remove every association.
    pub fn clear(&mut self) {
        self.from.clear();
        self.to.clear();
    }

    /// Keys of the `A` side, in no particular order.
    pub fn keys_from(&self) -> impl Iterator<Item = &A> + '_ {
        self.from.keys().map(|k| &k.0)
    }

    /// Keys of the `B` side, in no particular order.
    pub fn keys_to(&self) -> impl Iterator<Item = &B> + '_ {
        self.to.keys().map(|k| &k.0)
    }

    /// Associated pairs, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&A, &B)> + '_ {
        self.from.iter().map(|(k, v)| (&k.0, v))
    }
}

impl<A, B, S> FromIterator<(A, B)> for BiMap<A, B, S>
where
    A: Clone,
    B: Clone,
    S: Equivalence<A> + Equivalence<B>,
{
    fn from_iter<I: IntoIterator<Item = (A, B)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (a, b) in iter {
            map.put(a, b);
        }
        map
    }
}

impl<A: fmt::Debug, B: fmt::Debug, S> fmt::Debug for BiMap<A, B, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
