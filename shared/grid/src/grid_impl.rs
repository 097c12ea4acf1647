use common::{ArrayVec, Boolinator};
use serde::{Deserialize, Serialize};
use std::ops::{Deref, DerefMut, Index, IndexMut};

pub type CoordType = [usize; 2];

/// Dense row-major 2D grid sized at runtime
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DynamicGrid<T> {
    dims: [usize; 2],
    data: Box<[T]>,
}

impl<T: Default> DynamicGrid<T> {
    pub fn new(dims: [usize; 2]) -> Self {
        let len = dims[0] * dims[1];
        assert_ne!(len, 0);

        let data = {
            let mut vec = Vec::with_capacity(len);
            vec.resize_with(len, T::default);
            vec.into_boxed_slice()
        };

        DynamicGrid { dims, data }
    }
}

impl<T> DynamicGrid<T> {
    #[inline]
    pub fn flatten_coords(&self, [x, y]: CoordType) -> usize {
        let [xs, _ys] = self.dims;
        x + xs * y
    }

    #[inline]
    pub fn unflatten_index(&self, index: usize) -> CoordType {
        let [xs, _ys] = self.dims;
        [index % xs, index / xs]
    }

    #[inline]
    pub fn is_coord_in_range(&self, [x, y]: CoordType) -> bool {
        x < self.dims[0] && y < self.dims[1]
    }

    #[inline]
    pub fn is_in_range(&self, idx: usize) -> bool {
        idx < self.data.len()
    }

    pub fn dimensions(&self) -> [usize; 2] {
        self.dims
    }

    pub fn get(&self, coord: CoordType) -> Option<&T> {
        if self.is_coord_in_range(coord) {
            Some(&self.data[self.flatten_coords(coord)])
        } else {
            None
        }
    }

    pub fn iter_coords(&self) -> impl Iterator<Item = (CoordType, &T)> + '_ {
        self.data
            .iter()
            .enumerate()
            .map(move |(i, val)| (self.unflatten_index(i), val))
    }

    pub fn iter_coords_mut(&mut self) -> impl Iterator<Item = (CoordType, &mut T)> + '_ {
        let dims = self.dims;
        self.data
            .iter_mut()
            .enumerate()
            .map(move |(i, val)| ([i % dims[0], i / dims[0]], val))
    }

    pub fn fill(&mut self, value: T)
    where
        T: Clone,
    {
        self.data.iter_mut().for_each(|v| *v = value.clone());
    }

    /// 4-connected, filters out out-of-bounds neighbours
    pub fn neighbours(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        let [x, y] = self.unflatten_index(index);

        ArrayVec::from([
            (Some(x), y.checked_sub(1)),
            (Some(x + 1), Some(y)),
            (Some(x), Some(y + 1)),
            (x.checked_sub(1), Some(y)),
        ])
        .into_iter()
        .filter_map(|xy| match xy {
            (Some(x), Some(y)) => Some([x, y]),
            _ => None,
        })
        .filter_map(move |coord| {
            self.is_coord_in_range(coord)
                .as_some_from(|| self.flatten_coords(coord))
        })
    }

    /// 8-connected, filters out out-of-bounds neighbours
    pub fn neighbours8(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        let [x, y] = self.unflatten_index(index);

        let x0 = Some(x);
        let xp1 = Some(x + 1);
        let xs1 = x.checked_sub(1);

        let y0 = Some(y);
        let yp1 = Some(y + 1);
        let ys1 = y.checked_sub(1);

        ArrayVec::from([
            x0.zip(ys1),
            xp1.zip(ys1),
            xp1.zip(y0),
            xp1.zip(yp1),
            x0.zip(yp1),
            xs1.zip(yp1),
            xs1.zip(y0),
            xs1.zip(ys1),
        ])
        .into_iter()
        .flatten()
        .filter_map(move |(x, y)| {
            let coord = [x, y];
            self.is_coord_in_range(coord)
                .as_some_from(|| self.flatten_coords(coord))
        })
    }
}

impl<T> Index<usize> for DynamicGrid<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        &self.data[index]
    }
}

impl<T> IndexMut<usize> for DynamicGrid<T> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.data[index]
    }
}

impl<T> Index<CoordType> for DynamicGrid<T> {
    type Output = T;

    fn index(&self, coords: CoordType) -> &Self::Output {
        self.index(self.flatten_coords(coords))
    }
}

impl<T> IndexMut<CoordType> for DynamicGrid<T> {
    fn index_mut(&mut self, coords: CoordType) -> &mut Self::Output {
        self.index_mut(self.flatten_coords(coords))
    }
}

impl<T> AsRef<[T]> for DynamicGrid<T> {
    fn as_ref(&self) -> &[T] {
        &self.data
    }
}

impl<T> Deref for DynamicGrid<T> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl<T> DerefMut for DynamicGrid<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.data
    }
}
