use crate::{
    error::{Result, ShelfError},
    index::IndexType,
    shelf::Shelf,
};

#[derive(Clone, Debug)]
pub struct Config {
    pub(crate) index_type: IndexType,
    pub(crate) min_degree: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            index_type: IndexType::BTree,
            min_degree: 2,
        }
    }
}

impl Config {
    pub fn set_index_type(mut self, index_type: IndexType) -> Self {
        self.index_type = index_type;
        self
    }

    /// B 树的最小度数，对 AVL 无效
    pub fn set_min_degree(mut self, min_degree: usize) -> Self {
        self.min_degree = min_degree;
        self
    }

    pub fn index_type(&self) -> IndexType {
        self.index_type
    }

    pub fn min_degree(&self) -> usize {
        self.min_degree
    }

    pub(crate) fn check(&self) -> Result<()> {
        if self.min_degree < 2 {
            return Err(ShelfError::InvalidDegree(self.min_degree));
        }
        Ok(())
    }

    pub fn build(self) -> Result<Shelf> {
        Shelf::open(self)
    }
}
