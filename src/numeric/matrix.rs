use crate::Arbitrary;
use serde::Deserialize;
use serde::Serialize;

/// dense row-major matrix of f64.
///
/// all cost matrices and transport plans in the crate are stored this way.
/// no strides, no views. element (i, j) lives at data[i * cols + j].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.; rows * cols],
        }
    }
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        let data = (0..rows)
            .flat_map(|i| (0..cols).map(move |j| (i, j)))
            .collect::<Vec<_>>()
            .into_iter()
            .map(|(i, j)| f(i, j))
            .collect();
        Self { rows, cols, data }
    }
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Self {
        let n = rows.len();
        let m = rows.first().map(Vec::len).unwrap_or(0);
        assert!(rows.iter().all(|r| r.len() == m), "ragged rows");
        Self {
            rows: n,
            cols: m,
            data: rows.into_iter().flatten().collect(),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }
    pub fn cols(&self) -> usize {
        self.cols
    }
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.cols + j]
    }
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self.data[i * self.cols + j] = value;
    }
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// matrix-vector product K v
    pub fn mul_vec(&self, v: &[f64]) -> Vec<f64> {
        assert!(v.len() == self.cols, "dimension mismatch");
        (0..self.rows)
            .map(|i| self.row(i).iter().zip(v).map(|(k, v)| k * v).sum())
            .collect()
    }
    /// transposed matrix-vector product K' u
    pub fn tmul_vec(&self, u: &[f64]) -> Vec<f64> {
        assert!(u.len() == self.rows, "dimension mismatch");
        let mut out = vec![0.; self.cols];
        for i in 0..self.rows {
            let row = self.row(i);
            let scale = u[i];
            for (o, k) in out.iter_mut().zip(row) {
                *o += scale * k;
            }
        }
        out
    }
    /// frobenius inner product <A, B>
    pub fn frobenius(&self, other: &Self) -> f64 {
        assert!(self.rows == other.rows, "dimension mismatch");
        assert!(self.cols == other.cols, "dimension mismatch");
        self.data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| a * b)
            .sum()
    }

    pub fn max(&self) -> f64 {
        self.data.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }
    pub fn min(&self) -> f64 {
        self.data.iter().copied().fold(f64::INFINITY, f64::min)
    }
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().copied().map(f).collect(),
        }
    }
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|x| x.is_finite())
    }
}

impl std::ops::Index<(usize, usize)> for Matrix {
    type Output = f64;
    fn index(&self, (i, j): (usize, usize)) -> &Self::Output {
        &self.data[i * self.cols + j]
    }
}

impl Arbitrary for Matrix {
    fn random() -> Self {
        let n = 2 + rand::random_range(0..6);
        let m = 2 + rand::random_range(0..6);
        Self::from_fn(n, m, |_, _| rand::random::<f64>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_major_indexing() {
        let m = Matrix::from_rows(vec![vec![1., 2., 3.], vec![4., 5., 6.]]);
        assert!(m.get(0, 2) == 3.);
        assert!(m.get(1, 0) == 4.);
        assert!(m[(1, 2)] == 6.);
        assert!(m.row(1) == &[4., 5., 6.]);
    }

    #[test]
    fn mul_vec_agrees_with_hand_calculation() {
        let m = Matrix::from_rows(vec![vec![1., 2.], vec![3., 4.]]);
        assert!(m.mul_vec(&[1., 1.]) == vec![3., 7.]);
        assert!(m.tmul_vec(&[1., 1.]) == vec![4., 6.]);
    }

    #[test]
    fn tmul_is_transpose_of_mul() {
        let m = Matrix::random();
        let u = (0..m.rows()).map(|i| i as f64 + 1.).collect::<Vec<_>>();
        let v = (0..m.cols()).map(|j| j as f64 + 1.).collect::<Vec<_>>();
        // u' (K v) == (K' u)' v
        let lhs = m
            .mul_vec(&v)
            .iter()
            .zip(u.iter())
            .map(|(a, b)| a * b)
            .sum::<f64>();
        let rhs = m
            .tmul_vec(&u)
            .iter()
            .zip(v.iter())
            .map(|(a, b)| a * b)
            .sum::<f64>();
        assert!((lhs - rhs).abs() < 1e-9);
    }

    #[test]
    fn frobenius_of_identity_counts_entries() {
        let m = Matrix::from_fn(4, 5, |_, _| 1.);
        assert!(m.frobenius(&m) == 20.);
    }
}
