//! One-hot encoding with unknown categories ignored

use anyhow::Result;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    /// Sorted distinct categories per input column
    pub categories: Vec<Vec<String>>,
}

impl OneHotEncoder {
    /// `columns` is column-major: one `Vec` of row values per column
    pub fn fit(columns: &[Vec<String>]) -> Self {
        let categories = columns
            .iter()
            .map(|values| {
                let mut distinct = values.clone();
                distinct.sort();
                distinct.dedup();
                distinct
            })
            .collect();
        Self { categories }
    }

    pub fn n_inputs(&self) -> usize {
        self.categories.len()
    }

    pub fn n_outputs(&self) -> usize {
        self.categories.iter().map(Vec::len).sum()
    }

    /// Encode `n_rows` rows. A category not seen while fitting yields an
    /// all-zero block for that column.
    pub fn transform(&self, columns: &[Vec<String>], n_rows: usize) -> Result<Array2<f64>> {
        if columns.len() != self.n_inputs() {
            anyhow::bail!(
                "Encoder was fit on {} categorical columns, got {}",
                self.n_inputs(),
                columns.len()
            );
        }

        let mut encoded = Array2::<f64>::zeros((n_rows, self.n_outputs()));
        let mut offset = 0;
        for (values, categories) in columns.iter().zip(&self.categories) {
            if values.len() != n_rows {
                anyhow::bail!("Categorical column has {} rows, expected {}", values.len(), n_rows);
            }
            for (row, value) in values.iter().enumerate() {
                if let Ok(position) = categories.binary_search(value) {
                    encoded[[row, offset + position]] = 1.0;
                }
            }
            offset += categories.len();
        }

        Ok(encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_encodes_sorted_categories() {
        let columns = vec![strings(&["b", "a", "b"]), strings(&["x", "x", "y"])];
        let encoder = OneHotEncoder::fit(&columns);
        assert_eq!(encoder.categories[0], strings(&["a", "b"]));
        assert_eq!(encoder.n_outputs(), 4);

        let encoded = encoder.transform(&columns, 3).unwrap();
        assert_eq!(encoded.row(0).to_vec(), vec![0.0, 1.0, 1.0, 0.0]);
        assert_eq!(encoded.row(1).to_vec(), vec![1.0, 0.0, 1.0, 0.0]);
        assert_eq!(encoded.row(2).to_vec(), vec![0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_unknown_category_is_all_zero() {
        let encoder = OneHotEncoder::fit(&[strings(&["a", "b"])]);
        let encoded = encoder.transform(&[strings(&["zzz"])], 1).unwrap();
        assert!(encoded.iter().all(|v| *v == 0.0));
    }
}
