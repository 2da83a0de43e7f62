//! Comparators that define the order of an [`AvlTree`](crate::AvlTree).
//!
//! Every ordering decision a tree makes is routed through its comparator. A comparator must be a
//! total order that stays stable for the lifetime of the tree; an inconsistent comparator leaves
//! the tree in an unspecified (but memory-safe) shape.

use core::{cmp::Ordering, fmt};

/// A three-way comparison between two values.
///
/// `Ordering::Less` means `a` is stored before `b`.
pub trait Comparator<T: ?Sized> {
    fn compare(&self, a: &T, b: &T) -> Ordering;
}

impl<T, F> Comparator<T> for F
where
    T: ?Sized,
    F: Fn(&T, &T) -> Ordering,
{
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        self(a, b)
    }
}

/// Orders values by their [`Ord`] implementation.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Natural;

impl<T: Ord + ?Sized> Comparator<T> for Natural {
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        a.cmp(b)
    }
}

/// Flips the order of the wrapped comparator.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Reverse<C>(pub C);

impl<T: ?Sized, C: Comparator<T>> Comparator<T> for Reverse<C> {
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        self.0.compare(b, a)
    }
}

/// Adapts a C-style comparator returning an integer.
///
/// A negative result means `a` orders before `b`, zero means the two are equal and a positive
/// result means `a` orders after `b`.
#[derive(Copy, Clone)]
pub struct FromSign<F>(pub F);

impl<T, F> Comparator<T> for FromSign<F>
where
    T: ?Sized,
    F: Fn(&T, &T) -> i32,
{
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        (self.0)(a, b).cmp(&0)
    }
}

impl<F> fmt::Debug for FromSign<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FromSign").finish_non_exhaustive()
    }
}

/// Adapts a consistent less-than and equality pair.
///
/// Two values that are neither equal nor less than one another are ordered as greater.
#[derive(Copy, Clone)]
pub struct FromLess<L, E> {
    less: L,
    eq: E,
}

impl<L, E> FromLess<L, E> {
    pub const fn new(less: L, eq: E) -> Self {
        FromLess { less, eq }
    }
}

impl<T, L, E> Comparator<T> for FromLess<L, E>
where
    T: ?Sized,
    L: Fn(&T, &T) -> bool,
    E: Fn(&T, &T) -> bool,
{
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        if (self.eq)(a, b) {
            Ordering::Equal
        } else if (self.less)(a, b) {
            Ordering::Less
        } else {
            Ordering::Greater
        }
    }
}

impl<L, E> fmt::Debug for FromLess<L, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FromLess").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn natural_and_reverse() {
        assert_eq!(Natural.compare(&1, &2), Ordering::Less);
        assert_eq!(Reverse(Natural).compare(&1, &2), Ordering::Greater);
        assert_eq!(Reverse(Natural).compare(&2, &2), Ordering::Equal);
    }

    #[test]
    fn sign_convention() {
        let cmp = FromSign(|a: &i64, b: &i64| (a - b).signum() as i32 * 7);

        assert_eq!(cmp.compare(&-3, &4), Ordering::Less);
        assert_eq!(cmp.compare(&4, &4), Ordering::Equal);
        assert_eq!(cmp.compare(&9, &4), Ordering::Greater);
    }

    #[test]
    fn less_and_eq_pair() {
        let cmp = FromLess::new(|a: &u8, b: &u8| a < b, |a: &u8, b: &u8| a == b);

        assert_eq!(cmp.compare(&1, &2), Ordering::Less);
        assert_eq!(cmp.compare(&2, &2), Ordering::Equal);
        assert_eq!(cmp.compare(&3, &2), Ordering::Greater);
    }

    #[test]
    fn closures_are_comparators() {
        fn by_len(a: &str, b: &str) -> Ordering {
            a.len().cmp(&b.len())
        }

        assert_eq!(by_len.compare("ab", "c"), Ordering::Greater);
        assert_eq!(by_len.compare("ab", "cd"), Ordering::Equal);
    }
}
