//! Dense row-major grid addressed by tile coordinate

use crate::core::types::GridPos;

/// Generic 2D grid. Coordinates outside `0..width` / `0..height` read as `None`.
#[derive(Debug, Clone)]
pub struct Grid<T: Clone + Default> {
    pub width: usize,
    pub height: usize,
    data: Vec<T>,
}

impl<T: Clone + Default> Grid<T> {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![T::default(); width * height],
        }
    }

    #[inline]
    fn index(&self, pos: GridPos) -> Option<usize> {
        if pos.x < 0 || pos.y < 0 {
            return None;
        }
        let (x, y) = (pos.x as usize, pos.y as usize);
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }

    #[inline]
    pub fn in_bounds(&self, pos: GridPos) -> bool {
        self.index(pos).is_some()
    }

    #[inline]
    pub fn get(&self, pos: GridPos) -> Option<&T> {
        self.index(pos).map(|i| &self.data[i])
    }

    #[inline]
    pub fn get_mut(&mut self, pos: GridPos) -> Option<&mut T> {
        self.index(pos).map(move |i| &mut self.data[i])
    }

    /// Out-of-bounds writes are ignored
    #[inline]
    pub fn set(&mut self, pos: GridPos, value: T) {
        if let Some(i) = self.index(pos) {
            self.data[i] = value;
        }
    }

    pub fn fill(&mut self, value: T) {
        self.data.iter_mut().for_each(|cell| *cell = value.clone());
    }
}
