//! Boundary region tags and specs used to address halo regions of an
//! N-dimensional tile.
//!
//! A [`BoundarySpec`] names one rectangular region of a tile's halo (or
//! interior) by giving each axis a [`BoundaryTag`]. `enumerate_boundaries`
//! produces the fixed, deterministic list of specs a halo exchange walks.

use thiserror::Error;

/// Per-axis region tag.
///
/// `Wildcard` means "either `Left`, `Center`, or `Right`" and is used to
/// coalesce regions along axes orthogonal to the one(s) actually shifted,
/// collapsing what would otherwise be several corner/edge transfers that
/// share a destination into one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundaryTag {
    Left,
    Center,
    Right,
    Wildcard,
}

impl BoundaryTag {
    /// Numeric code used to build the stable per-axis digit of [`hash`].
    /// Matches the original `LEFT=1, CENTER=2, RIGHT=4, WILDCARD=8` coding.
    const fn code(self) -> i64 {
        match self {
            BoundaryTag::Left => 1,
            BoundaryTag::Center => 2,
            BoundaryTag::Right => 4,
            BoundaryTag::Wildcard => 8,
        }
    }

    fn opposite(self) -> Self {
        match self {
            BoundaryTag::Left => BoundaryTag::Right,
            BoundaryTag::Right => BoundaryTag::Left,
            other => other,
        }
    }
}

/// Whether a [`BoundarySpec`] addresses the window of data being sent or the
/// window being received into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    Send,
    Recv,
}

impl Intent {
    const fn sign(self) -> i64 {
        match self {
            Intent::Send => -1,
            Intent::Recv => 1,
        }
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SpecError {
    /// Every axis tag was `Wildcard`: the spec addresses no region.
    #[error("invalid boundary spec: every axis is Wildcard, which addresses no region")]
    InvalidSpec,
}

/// A per-axis region tag tuple addressing one halo region of an N-dimensional
/// tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundarySpec<const N: usize> {
    tags: [BoundaryTag; N],
}

impl<const N: usize> BoundarySpec<N> {
    /// Build a spec from per-axis tags.
    ///
    /// # Errors
    /// Returns [`SpecError::InvalidSpec`] if every tag is `Wildcard`.
    pub fn new(tags: [BoundaryTag; N]) -> Result<Self, SpecError> {
        if N > 0 && tags.iter().all(|t| *t == BoundaryTag::Wildcard) {
            return Err(SpecError::InvalidSpec);
        }
        Ok(Self { tags })
    }

    pub fn tags(&self) -> &[BoundaryTag; N] {
        &self.tags
    }

    pub fn tag(&self, dim: usize) -> BoundaryTag {
        self.tags[dim]
    }

    /// A deterministic integer, injective over `(spec, intent)`, used both as
    /// a local cache key and as the on-wire message tag.
    ///
    /// `base^d * tag.code()` summed over axes, sign-flipped by `intent`; this
    /// mirrors the original's `sum(10^dim * code) * sign(intent)` scheme.
    pub fn hash(&self, intent: Intent) -> i64 {
        const BASE: i64 = 10;
        let mut acc: i64 = 0;
        let mut place: i64 = 1;
        for tag in self.tags {
            acc += place * tag.code();
            place *= BASE;
        }
        acc * intent.sign()
    }

    /// Swap `Left`/`Right` on every axis; `Center`/`Wildcard` are unchanged.
    pub fn opposite(&self) -> Self {
        let mut tags = self.tags;
        for t in &mut tags {
            *t = t.opposite();
        }
        Self { tags }
    }
}

/// The deterministic, reduced enumeration of halo regions for an
/// N-dimensional tile: for each axis `d`, a `Left`-at-`d` and a `Right`-at-`d`
/// spec, with `Center` on axes before `d` and `Wildcard` on axes after `d`.
/// This yields `2 * N` entries (versus the `3^N - 1` full enumeration that
/// names every corner individually) and is the choice this crate commits to
/// — see `DESIGN.md` Open Question 1.
pub fn enumerate_boundaries<const N: usize>() -> Vec<BoundarySpec<N>> {
    let mut out = Vec::with_capacity(2 * N);
    for d in 0..N {
        for tag in [BoundaryTag::Left, BoundaryTag::Right] {
            let mut tags = [BoundaryTag::Wildcard; N];
            for (axis, slot) in tags.iter_mut().enumerate() {
                *slot = match axis.cmp(&d) {
                    std::cmp::Ordering::Less => BoundaryTag::Center,
                    std::cmp::Ordering::Equal => tag,
                    std::cmp::Ordering::Greater => BoundaryTag::Wildcard,
                };
            }
            // `new` cannot fail here: axis `d` always carries Left/Right.
            out.push(BoundarySpec::new(tags).expect("enumerated spec is never all-Wildcard"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_all_wildcard() {
        let err = BoundarySpec::new([BoundaryTag::Wildcard, BoundaryTag::Wildcard]).unwrap_err();
        assert_eq!(err, SpecError::InvalidSpec);
    }

    #[test]
    fn three_wildcards_is_invalid() {
        let err = BoundarySpec::new([BoundaryTag::Wildcard; 3]).unwrap_err();
        assert_eq!(err, SpecError::InvalidSpec);
    }

    #[test]
    fn opposite_is_involution() {
        let spec =
            BoundarySpec::new([BoundaryTag::Left, BoundaryTag::Center, BoundaryTag::Wildcard])
                .unwrap();
        assert_eq!(spec.opposite().opposite(), spec);
    }

    #[test]
    fn opposite_swaps_left_right_only() {
        let spec =
            BoundarySpec::new([BoundaryTag::Left, BoundaryTag::Right, BoundaryTag::Center])
                .unwrap();
        let opp = spec.opposite();
        assert_eq!(opp.tag(0), BoundaryTag::Right);
        assert_eq!(opp.tag(1), BoundaryTag::Left);
        assert_eq!(opp.tag(2), BoundaryTag::Center);
    }

    #[test]
    fn hash_distinguishes_intent_unless_all_center() {
        let left = BoundarySpec::new([BoundaryTag::Left]).unwrap();
        assert_ne!(left.hash(Intent::Send), left.hash(Intent::Recv));

        let all_center = BoundarySpec::new([BoundaryTag::Center, BoundaryTag::Center]).unwrap();
        assert_eq!(
            all_center.hash(Intent::Send),
            -all_center.hash(Intent::Recv)
        );
    }

    #[test]
    fn hash_distinguishes_distinct_specs() {
        let l_wild = BoundarySpec::new([BoundaryTag::Left, BoundaryTag::Wildcard]).unwrap();
        let l_center = BoundarySpec::new([BoundaryTag::Left, BoundaryTag::Center]).unwrap();
        assert_ne!(l_wild.hash(Intent::Send), l_center.hash(Intent::Send));
    }

    #[test]
    fn enumerate_1d() {
        let specs = enumerate_boundaries::<1>();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].tag(0), BoundaryTag::Left);
        assert_eq!(specs[1].tag(0), BoundaryTag::Right);
    }

    #[test]
    fn enumerate_2d_matches_reduced_table() {
        let specs = enumerate_boundaries::<2>();
        let tags: Vec<_> = specs.iter().map(|s| *s.tags()).collect();
        assert_eq!(
            tags,
            vec![
                [BoundaryTag::Left, BoundaryTag::Wildcard],
                [BoundaryTag::Right, BoundaryTag::Wildcard],
                [BoundaryTag::Center, BoundaryTag::Left],
                [BoundaryTag::Center, BoundaryTag::Right],
            ]
        );
    }

    #[test]
    fn enumerate_3d_matches_reduced_table() {
        let specs = enumerate_boundaries::<3>();
        let tags: Vec<_> = specs.iter().map(|s| *s.tags()).collect();
        assert_eq!(
            tags,
            vec![
                [BoundaryTag::Left, BoundaryTag::Wildcard, BoundaryTag::Wildcard],
                [BoundaryTag::Right, BoundaryTag::Wildcard, BoundaryTag::Wildcard],
                [BoundaryTag::Center, BoundaryTag::Left, BoundaryTag::Wildcard],
                [BoundaryTag::Center, BoundaryTag::Right, BoundaryTag::Wildcard],
                [BoundaryTag::Center, BoundaryTag::Center, BoundaryTag::Left],
                [BoundaryTag::Center, BoundaryTag::Center, BoundaryTag::Right],
            ]
        );
    }

    #[test]
    fn enumerate_is_deterministic() {
        assert_eq!(enumerate_boundaries::<3>(), enumerate_boundaries::<3>());
    }
}
