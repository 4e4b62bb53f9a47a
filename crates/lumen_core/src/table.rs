//! Bounds-checked, index-addressed storage for scene tables.

use std::marker::PhantomData;

/// An append-only table addressed by small integer indices.
///
/// Scene data refers to table rows by `u32` index (the layout a GPU scene
/// buffer uses). Every lookup goes through [`Table::get`], which returns
/// `None` for out-of-range indices instead of panicking; callers decide
/// what "absent" degrades to.
#[derive(Clone, Debug)]
pub struct Table<T> {
    rows: Vec<T>,
}

impl<T> Table<T> {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    /// Append a row and return its index.
    pub fn push(&mut self, row: T) -> u32 {
        self.rows.push(row);
        (self.rows.len() - 1) as u32
    }

    #[inline]
    pub fn get(&self, index: u32) -> Option<&T> {
        self.rows.get(index as usize)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.rows.iter()
    }

    /// Rows paired with their index.
    pub fn enumerate(&self) -> impl Iterator<Item = (u32, &T)> {
        self.rows.iter().enumerate().map(|(i, row)| (i as u32, row))
    }
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<T> for Table<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

/// Typed index into a [`Table`], so mesh and material indices can't be
/// swapped by accident.
pub struct Id<T> {
    index: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Id<T> {
    pub const fn new(index: u32) -> Self {
        Self {
            index,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub const fn index(self) -> u32 {
        self.index
    }
}

// Manual impls: derive would put bounds on `T`.
impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for Id<T> {}

impl<T> std::fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Id({})", self.index)
    }
}

impl<T> Table<T> {
    /// Typed lookup.
    #[inline]
    pub fn get_id(&self, id: Id<T>) -> Option<&T> {
        self.get(id.index)
    }

    /// Typed append.
    pub fn push_id(&mut self, row: T) -> Id<T> {
        Id::new(self.push(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_get_out_of_range_is_none() {
        let mut table = Table::new();
        assert_eq!(table.push("a"), 0);
        assert_eq!(table.push("b"), 1);

        assert_eq!(table.get(1), Some(&"b"));
        assert_eq!(table.get(2), None);
        assert_eq!(table.get(u32::MAX), None);
    }

    #[test]
    fn test_table_typed_ids() {
        let mut table: Table<f32> = Table::new();
        let id = table.push_id(0.5);
        assert_eq!(id.index(), 0);
        assert_eq!(table.get_id(id), Some(&0.5));
        assert_eq!(table.get_id(Id::new(7)), None);
    }

    #[test]
    fn test_table_from_iter_and_enumerate() {
        let table: Table<u8> = (10..13).collect();
        let rows: Vec<_> = table.enumerate().collect();
        assert_eq!(rows, vec![(0, &10), (1, &11), (2, &12)]);
        assert_eq!(table.len(), 3);
        assert!(!table.is_empty());
    }
}
