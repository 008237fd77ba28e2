//! Feature schema: column kinds, null fills and missing-column defaults
//!
//! The schema is fit once on cleaned training data and stored in the model
//! bundle. Every later consumer (evaluation, serving) extracts features
//! through it, so a row with a dropped or absent column still yields the
//! same feature layout the reducer was fit on.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::Hash;

use anyhow::{Context, Result};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Default used for a categorical column that is absent at inference time
pub const DEFAULT_COLUMN_DEFAULTS: &[(&str, &str)] = &[("FireplaceQu", "TA")];

/// How a feature column is turned into numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureKind {
    /// Standardized as-is
    Numeric,
    /// One-hot encoded
    Categorical,
}

impl FeatureKind {
    /// Classify a polars dtype. Anything that is not a primitive number is
    /// treated as a category.
    pub fn from_dtype(dtype: &DataType) -> Self {
        if dtype.is_primitive_numeric() {
            Self::Numeric
        } else {
            Self::Categorical
        }
    }
}

/// A value used to fill a missing cell or column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FillValue {
    Number(f64),
    Category(String),
}

impl FillValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Category(s) => s.parse().ok(),
        }
    }

    pub fn as_category(&self) -> String {
        match self {
            Self::Number(v) => v.to_string(),
            Self::Category(s) => s.clone(),
        }
    }
}

impl fmt::Display for FillValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{}", v),
            Self::Category(s) => write!(f, "{}", s),
        }
    }
}

/// One feature column of the schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureColumn {
    pub name: String,
    pub kind: FeatureKind,
    /// Most frequent training value, used for null cells
    pub fill: FillValue,
}

/// Features split by kind, ready for the reducer
#[derive(Debug, Clone)]
pub struct FeatureFrame {
    /// `rows x numeric columns`
    pub numeric: Array2<f64>,
    /// Column-major: one `Vec` of row values per categorical column
    pub categorical: Vec<Vec<String>>,
}

impl FeatureFrame {
    pub fn n_rows(&self) -> usize {
        self.numeric.nrows()
    }

    /// Keep only the given rows, in the given order
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        Self {
            numeric: self.numeric.select(ndarray::Axis(0), indices),
            categorical: self
                .categorical
                .iter()
                .map(|col| indices.iter().map(|&i| col[i].clone()).collect())
                .collect(),
        }
    }
}

/// Ordered feature columns plus documented defaults for absent columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSchema {
    pub target: String,
    pub columns: Vec<FeatureColumn>,
    /// Value substituted when a column is missing from the input entirely
    pub defaults: BTreeMap<String, FillValue>,
}

impl FeatureSchema {
    /// Fit the schema on a cleaned training frame.
    ///
    /// `defaults` are `(column, value)` overrides for columns absent at
    /// inference time; entries naming columns outside the schema are ignored.
    pub fn fit(df: &DataFrame, target: &str, defaults: &[(String, String)]) -> Result<Self> {
        if df.column(target).is_err() {
            anyhow::bail!("Target column '{}' not found in dataset", target);
        }

        let mut columns = Vec::with_capacity(df.width().saturating_sub(1));
        for col in df.get_columns() {
            if col.name().as_str() == target {
                continue;
            }
            let kind = FeatureKind::from_dtype(col.dtype());
            let fill = match (most_frequent(col)?, kind) {
                (Some(fill), _) => fill,
                (None, FeatureKind::Numeric) => FillValue::Number(0.0),
                (None, FeatureKind::Categorical) => FillValue::Category(String::new()),
            };
            columns.push(FeatureColumn {
                name: col.name().to_string(),
                kind,
                fill,
            });
        }

        let mut overrides = BTreeMap::new();
        for (name, value) in defaults {
            let Some(column) = columns.iter().find(|c| &c.name == name) else {
                continue;
            };
            let fill = match column.kind {
                FeatureKind::Numeric => FillValue::Number(value.parse().with_context(|| {
                    format!("Default for numeric column '{}' is not a number: {}", name, value)
                })?),
                FeatureKind::Categorical => FillValue::Category(value.clone()),
            };
            overrides.insert(name.clone(), fill);
        }

        Ok(Self {
            target: target.to_string(),
            columns,
            defaults: overrides,
        })
    }

    pub fn numeric_columns(&self) -> impl Iterator<Item = &FeatureColumn> {
        self.columns.iter().filter(|c| c.kind == FeatureKind::Numeric)
    }

    pub fn categorical_columns(&self) -> impl Iterator<Item = &FeatureColumn> {
        self.columns.iter().filter(|c| c.kind == FeatureKind::Categorical)
    }

    /// Value for a column that is not present in the input at all
    pub fn missing_column_value(&self, column: &FeatureColumn) -> FillValue {
        self.defaults
            .get(&column.name)
            .cloned()
            .unwrap_or_else(|| column.fill.clone())
    }

    /// Names of schema columns the frame does not carry
    pub fn absent_columns(&self, df: &DataFrame) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| df.column(&c.name).is_err())
            .map(|c| c.name.clone())
            .collect()
    }

    /// Extract the feature columns of `df` in schema order.
    ///
    /// Null cells take the column's training fill. Absent columns take the
    /// documented default, or the training fill when there is none. Extra
    /// columns (including the target) are ignored.
    pub fn extract(&self, df: &DataFrame) -> Result<FeatureFrame> {
        let rows = df.height();
        let numeric_cols: Vec<&FeatureColumn> = self.numeric_columns().collect();

        let mut numeric = Array2::<f64>::zeros((rows, numeric_cols.len()));
        for (j, column) in numeric_cols.iter().enumerate() {
            let values = match df.column(&column.name) {
                Ok(col) => {
                    let fill = column.fill.as_number().unwrap_or(0.0);
                    numeric_values(col)?
                        .into_iter()
                        .map(|v| v.filter(|x| x.is_finite()).unwrap_or(fill))
                        .collect()
                }
                Err(_) => {
                    let value = self.missing_column_value(column).as_number().with_context(|| {
                        format!("Default for numeric column '{}' is not a number", column.name)
                    })?;
                    vec![value; rows]
                }
            };
            for (i, v) in values.into_iter().enumerate() {
                numeric[[i, j]] = v;
            }
        }

        let categorical = self
            .categorical_columns()
            .map(|column| -> Result<Vec<String>> {
                match df.column(&column.name) {
                    Ok(col) => {
                        let fill = column.fill.as_category();
                        Ok(string_values(col)?
                            .into_iter()
                            .map(|v| v.unwrap_or_else(|| fill.clone()))
                            .collect())
                    }
                    Err(_) => Ok(vec![self.missing_column_value(column).as_category(); rows]),
                }
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(FeatureFrame {
            numeric,
            categorical,
        })
    }
}

/// Parse `NAME=VALUE` pairs as given on the command line
pub fn parse_column_defaults(pairs: &[String]) -> Result<Vec<(String, String)>> {
    pairs
        .iter()
        .map(|pair| {
            let (name, value) = pair
                .split_once('=')
                .with_context(|| format!("Expected NAME=VALUE, got '{}'", pair))?;
            if name.trim().is_empty() {
                anyhow::bail!("Column default has an empty name: '{}'", pair);
            }
            Ok((name.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Column values as `f64`; non-numeric cells become `None`
pub fn numeric_values(col: &Column) -> Result<Vec<Option<f64>>> {
    let cast = col
        .cast(&DataType::Float64)
        .with_context(|| format!("Column '{}' cannot be read as numbers", col.name()))?;
    Ok(cast.f64()?.into_iter().collect())
}

/// Column values as strings
pub fn string_values(col: &Column) -> Result<Vec<Option<String>>> {
    let cast = col
        .cast(&DataType::String)
        .with_context(|| format!("Column '{}' cannot be read as text", col.name()))?;
    Ok(cast
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

/// Most frequent non-null value of a column, ties going to the value seen first
pub fn most_frequent(col: &Column) -> Result<Option<FillValue>> {
    let fill = match FeatureKind::from_dtype(col.dtype()) {
        FeatureKind::Numeric => mode_by(numeric_values(col)?.into_iter().flatten(), |v| {
            // -0.0 and 0.0 count as the same value
            (v + 0.0).to_bits()
        })
        .map(FillValue::Number),
        FeatureKind::Categorical => {
            mode_by(string_values(col)?.into_iter().flatten(), |v| v.clone()).map(FillValue::Category)
        }
    };
    Ok(fill)
}

fn mode_by<T, K, F>(values: impl Iterator<Item = T>, key: F) -> Option<T>
where
    K: Hash + Eq,
    F: Fn(&T) -> K,
{
    // key -> (count, first position, value)
    let mut counts: HashMap<K, (usize, usize, T)> = HashMap::new();
    for (position, value) in values.enumerate() {
        counts
            .entry(key(&value))
            .and_modify(|entry| entry.0 += 1)
            .or_insert((1, position, value));
    }

    counts
        .into_values()
        .max_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)))
        .map(|(_, _, value)| value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_prefers_first_seen_on_tie() {
        let values = vec!["b", "a", "a", "b", "c"];
        assert_eq!(mode_by(values.into_iter(), |v| *v), Some("b"));
    }

    #[test]
    fn test_mode_of_empty_is_none() {
        assert_eq!(mode_by(Vec::<u8>::new().into_iter(), |v| *v), None);
    }

    #[test]
    fn test_most_frequent_numeric_and_categorical() {
        let df = df! {
            "num" => [Some(1.0f64), Some(2.0), Some(2.0), None],
            "cat" => [Some("x"), None, Some("y"), Some("y")],
        }
        .unwrap();

        assert_eq!(
            most_frequent(df.column("num").unwrap()).unwrap(),
            Some(FillValue::Number(2.0))
        );
        assert_eq!(
            most_frequent(df.column("cat").unwrap()).unwrap(),
            Some(FillValue::Category("y".to_string()))
        );
    }

    #[test]
    fn test_parse_column_defaults() {
        let parsed = parse_column_defaults(&["FireplaceQu=TA".to_string(), " A = 1 ".to_string()]).unwrap();
        assert_eq!(
            parsed,
            vec![
                ("FireplaceQu".to_string(), "TA".to_string()),
                ("A".to_string(), "1".to_string())
            ]
        );
        assert!(parse_column_defaults(&["novalue".to_string()]).is_err());
    }
}
