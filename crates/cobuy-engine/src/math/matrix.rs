use std::error::Error;
use std::fmt;
use std::ops::{Index, IndexMut};

/// Dense row-major matrix. Rows are samples, columns are universe positions.
#[derive(Clone, Debug, PartialEq)]
pub struct Array2<T> {
    data: Vec<T>,
    rows: usize,
    cols: usize,
}

impl<T> Array2<T> {
    pub fn from_shape_vec(shape: (usize, usize), data: Vec<T>) -> Result<Self, ShapeError> {
        let (rows, cols) = shape;
        if data.len() != rows * cols {
            return Err(ShapeError {
                rows,
                cols,
                len: data.len(),
            });
        }
        Ok(Self { data, rows, cols })
    }

    /// Stack equally sized rows. `cols` is needed to describe a matrix with
    /// no rows.
    pub fn from_rows(cols: usize, rows: Vec<Vec<T>>) -> Result<Self, ShapeError> {
        let n_rows = rows.len();
        let mut data = Vec::with_capacity(n_rows * cols);
        for row in rows {
            if row.len() != cols {
                return Err(ShapeError {
                    rows: n_rows,
                    cols,
                    len: row.len(),
                });
            }
            data.extend(row);
        }
        Self::from_shape_vec((n_rows, cols), data)
    }

    pub fn nrows(&self) -> usize {
        self.rows
    }

    pub fn ncols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    #[inline]
    fn offset(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    pub fn row_slice(&self, row: usize) -> &[T] {
        let start = self.offset(row, 0);
        &self.data[start..start + self.cols]
    }

    pub fn column(&self, col: usize) -> Vec<T>
    where
        T: Clone,
    {
        assert!(col < self.cols, "column index out of bounds");
        (0..self.rows).map(|row| self[(row, col)].clone()).collect()
    }

    pub fn mapv<U, F>(&self, f: F) -> Array2<U>
    where
        F: FnMut(&T) -> U,
    {
        Array2 {
            data: self.data.iter().map(f).collect(),
            rows: self.rows,
            cols: self.cols,
        }
    }
}

impl<T: Clone + Default> Array2<T> {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Array2 {
            data: vec![T::default(); rows * cols],
            rows,
            cols,
        }
    }
}

impl<T> Index<(usize, usize)> for Array2<T> {
    type Output = T;

    fn index(&self, index: (usize, usize)) -> &Self::Output {
        let offset = self.offset(index.0, index.1);
        &self.data[offset]
    }
}

impl<T> IndexMut<(usize, usize)> for Array2<T> {
    fn index_mut(&mut self, index: (usize, usize)) -> &mut Self::Output {
        let offset = self.offset(index.0, index.1);
        &mut self.data[offset]
    }
}

#[derive(Debug, Clone)]
pub struct ShapeError {
    rows: usize,
    cols: usize,
    len: usize,
}

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid shape ({}, {}) for buffer of length {}",
            self.rows, self.cols, self.len
        )
    }
}

impl Error for ShapeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows_and_column() {
        let m = Array2::from_rows(3, vec![vec![1u8, 0, 1], vec![0, 1, 1]]).unwrap();
        assert_eq!(m.shape(), (2, 3));
        assert_eq!(m.column(2), vec![1, 1]);
        assert_eq!(m.row_slice(1), &[0, 1, 1]);
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        assert!(Array2::from_rows(2, vec![vec![1u8, 0], vec![1]]).is_err());
    }

    #[test]
    fn test_empty_matrix_keeps_width() {
        let m: Array2<u8> = Array2::from_rows(4, Vec::new()).unwrap();
        assert_eq!(m.shape(), (0, 4));
    }
}
