//! Structural merge of freshly parsed data into the displayed view model.
//!
//! Merging keeps the existing containers and only rewrites what differs, so
//! selection state and history keyed on positions stay stable across polls.
//! Every implementation reports whether anything observable changed; the app
//! uses that as its redraw/record signal.
//!
//! Rules per shape:
//!
//! - scalar: replaced by the new value
//! - `Option`: if either side is `None`, the new side wins
//! - `Vec`: replaced wholesale on length mismatch, otherwise merged by position
//! - `BTreeMap`: keys missing from the new map are dropped, the rest merged

use std::collections::BTreeMap;

/// A value that can absorb a newer version of itself in place.
pub trait Merge {
    /// Fold `new` into `self`. Returns `true` if `self` changed.
    fn merge(&mut self, new: Self) -> bool;
}

macro_rules! scalar_merge {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::data::merge::Merge for $ty {
                fn merge(&mut self, new: Self) -> bool {
                    if *self == new {
                        false
                    } else {
                        *self = new;
                        true
                    }
                }
            }
        )*
    };
}

pub(crate) use scalar_merge;

scalar_merge!(String, bool, u16, u32, u64, usize, i64, f64);

impl<T: Merge> Merge for Option<T> {
    fn merge(&mut self, new: Self) -> bool {
        match new {
            Some(new) => match self {
                Some(old) => old.merge(new),
                None => {
                    *self = Some(new);
                    true
                }
            },
            None => self.take().is_some(),
        }
    }
}

impl<T: Merge> Merge for Vec<T> {
    fn merge(&mut self, new: Self) -> bool {
        if self.len() != new.len() {
            *self = new;
            return true;
        }

        let mut changed = false;
        for (old, new) in self.iter_mut().zip(new) {
            changed |= old.merge(new);
        }
        changed
    }
}

impl<K: Ord, V: Merge> Merge for BTreeMap<K, V> {
    fn merge(&mut self, mut new: Self) -> bool {
        let before = self.len();
        self.retain(|k, _| new.contains_key(k));
        let mut changed = self.len() != before;

        while let Some((key, value)) = new.pop_first() {
            match self.get_mut(&key) {
                Some(old) => changed |= old.merge(value),
                None => {
                    self.insert(key, value);
                    changed = true;
                }
            }
        }
        changed
    }
}
