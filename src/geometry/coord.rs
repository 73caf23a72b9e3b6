//! `Coord` and `CoordBox`: integer lattice coordinates and axis-aligned boxes.
//!
//! Coordinates are `i32` tuples, const-generic in the dimension `D` with the
//! x axis at index 0. Ordering is lexicographic from the *highest* axis down
//! to x, which is the canonical iteration order of the whole crate: regions,
//! streaks and grid rows all sort (z, y, x).

use serde::de::{Error as DeError, SeqAccess, Visitor};
use serde::ser::SerializeTuple;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Index, IndexMut, Neg, Sub};

/// A point on the D-dimensional integer lattice.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct Coord<const D: usize>(pub [i32; D]);

impl<const D: usize> Default for Coord<D> {
    #[inline]
    fn default() -> Self {
        Self([0; D])
    }
}

impl<const D: usize> Coord<D> {
    #[inline]
    pub const fn new(components: [i32; D]) -> Self {
        Self(components)
    }

    /// The origin.
    #[inline]
    pub const fn zero() -> Self {
        Self([0; D])
    }

    /// All components set to `value`.
    #[inline]
    pub fn diagonal(value: i32) -> Self {
        Self([value; D])
    }

    /// The unit vector along `axis`.
    #[inline]
    pub fn unit(axis: usize) -> Self {
        let mut c = [0; D];
        c[axis] = 1;
        Self(c)
    }

    /// The x component (axis 0).
    #[inline]
    pub fn x(&self) -> i32 {
        self.0[0]
    }

    /// Product of all components, as a cell count. Negative components clamp
    /// to zero so degenerate boxes report an empty volume.
    #[inline]
    pub fn prod(&self) -> usize {
        self.0
            .iter()
            .map(|&v| if v < 0 { 0 } else { v as usize })
            .product()
    }

    #[inline]
    pub fn to_array(self) -> [i32; D] {
        self.0
    }

    /// Lexicographic comparison from the highest axis down to x.
    pub fn lex_cmp(&self, other: &Self) -> Ordering {
        for axis in (0..D).rev() {
            match self.0[axis].cmp(&other.0[axis]) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        Ordering::Equal
    }
}

impl<const D: usize> PartialOrd for Coord<D> {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<const D: usize> Ord for Coord<D> {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.lex_cmp(other)
    }
}

impl<const D: usize> Index<usize> for Coord<D> {
    type Output = i32;
    #[inline]
    fn index(&self, axis: usize) -> &i32 {
        &self.0[axis]
    }
}

impl<const D: usize> IndexMut<usize> for Coord<D> {
    #[inline]
    fn index_mut(&mut self, axis: usize) -> &mut i32 {
        &mut self.0[axis]
    }
}

impl<const D: usize> Add for Coord<D> {
    type Output = Self;
    #[inline]
    fn add(mut self, rhs: Self) -> Self {
        for axis in 0..D {
            self.0[axis] += rhs.0[axis];
        }
        self
    }
}

impl<const D: usize> AddAssign for Coord<D> {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        for axis in 0..D {
            self.0[axis] += rhs.0[axis];
        }
    }
}

impl<const D: usize> Sub for Coord<D> {
    type Output = Self;
    #[inline]
    fn sub(mut self, rhs: Self) -> Self {
        for axis in 0..D {
            self.0[axis] -= rhs.0[axis];
        }
        self
    }
}

impl<const D: usize> Neg for Coord<D> {
    type Output = Self;
    #[inline]
    fn neg(mut self) -> Self {
        for axis in 0..D {
            self.0[axis] = -self.0[axis];
        }
        self
    }
}

impl<const D: usize> fmt::Display for Coord<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{v}")?;
        }
        write!(f, ")")
    }
}

// serde's derive cannot handle `[i32; D]` for arbitrary `D`, so the impls are
// written against the tuple representation.
impl<const D: usize> Serialize for Coord<D> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(D)?;
        for v in &self.0 {
            tuple.serialize_element(v)?;
        }
        tuple.end()
    }
}

impl<'de, const D: usize> Deserialize<'de> for Coord<D> {
    fn deserialize<Dz: Deserializer<'de>>(deserializer: Dz) -> Result<Self, Dz::Error> {
        struct CoordVisitor<const D: usize>;

        impl<'de, const D: usize> Visitor<'de> for CoordVisitor<D> {
            type Value = Coord<D>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "a tuple of {D} integers")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Coord<D>, A::Error> {
                let mut components = [0i32; D];
                for (i, slot) in components.iter_mut().enumerate() {
                    *slot = seq
                        .next_element()?
                        .ok_or_else(|| A::Error::invalid_length(i, &self))?;
                }
                Ok(Coord(components))
            }
        }

        deserializer.deserialize_tuple(D, CoordVisitor::<D>)
    }
}

/// An axis-aligned box: an origin plus nonnegative extents.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default, Debug, Serialize, Deserialize)]
pub struct CoordBox<const D: usize> {
    pub origin: Coord<D>,
    pub dimensions: Coord<D>,
}

impl<const D: usize> CoordBox<D> {
    #[inline]
    pub fn new(origin: Coord<D>, dimensions: Coord<D>) -> Self {
        debug_assert!(
            dimensions.0.iter().all(|&v| v >= 0),
            "box extents must be nonnegative"
        );
        Self { origin, dimensions }
    }

    /// Number of cells in the box.
    #[inline]
    pub fn size(&self) -> usize {
        self.dimensions.prod()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// One past the far corner on every axis.
    #[inline]
    pub fn end(&self) -> Coord<D> {
        self.origin + self.dimensions
    }

    pub fn contains(&self, coord: Coord<D>) -> bool {
        for axis in 0..D {
            if coord[axis] < self.origin[axis] || coord[axis] >= self.origin[axis] + self.dimensions[axis] {
                return false;
            }
        }
        true
    }

    pub fn intersects(&self, other: &Self) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        for axis in 0..D {
            if self.origin[axis] + self.dimensions[axis] <= other.origin[axis]
                || other.origin[axis] + other.dimensions[axis] <= self.origin[axis]
            {
                return false;
            }
        }
        true
    }

    /// Iterate all cells, x innermost.
    pub fn coords(&self) -> CoordBoxIter<D> {
        CoordBoxIter {
            bounds: *self,
            cursor: self.origin,
            done: self.is_empty(),
        }
    }
}

impl<const D: usize> fmt::Display for CoordBox<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CoordBox(origin: {}, dimensions: {})", self.origin, self.dimensions)
    }
}

/// Row-major iterator over a box's cells.
pub struct CoordBoxIter<const D: usize> {
    bounds: CoordBox<D>,
    cursor: Coord<D>,
    done: bool,
}

impl<const D: usize> Iterator for CoordBoxIter<D> {
    type Item = Coord<D>;

    fn next(&mut self) -> Option<Coord<D>> {
        if self.done {
            return None;
        }
        let current = self.cursor;
        // odometer increment, x fastest
        for axis in 0..D {
            self.cursor[axis] += 1;
            if self.cursor[axis] < self.bounds.origin[axis] + self.bounds.dimensions[axis] {
                return Some(current);
            }
            self.cursor[axis] = self.bounds.origin[axis];
        }
        self.done = true;
        Some(current)
    }
}
