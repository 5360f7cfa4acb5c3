//! Time-indexed table of nullable numeric columns.
//!
//! `TimeFrame` is the in-memory shape every loader produces and every QC and
//! derivation step consumes. Operations never mutate their receiver; derived
//! columns come back as a new frame.

use chrono::NaiveDateTime;

use crate::error::{AssessmentError, Result};

/// A row-major table indexed by timestamp. `None` marks a null cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimeFrame {
    index: Vec<NaiveDateTime>,
    columns: Vec<String>,
    rows: Vec<Vec<Option<f64>>>,
}

impl TimeFrame {
    /// Create an empty frame with the given column names
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            index: Vec::new(),
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn from_parts(
        index: Vec<NaiveDateTime>,
        columns: Vec<String>,
        rows: Vec<Vec<Option<f64>>>,
    ) -> Result<Self> {
        if index.len() != rows.len() {
            return Err(AssessmentError::Domain(format!(
                "index has {} entries but there are {} rows",
                index.len(),
                rows.len()
            )));
        }
        if let Some(bad) = rows.iter().position(|r| r.len() != columns.len()) {
            return Err(AssessmentError::Domain(format!(
                "row {bad} has {} cells, expected {}",
                rows[bad].len(),
                columns.len()
            )));
        }
        Ok(Self {
            index,
            columns,
            rows,
        })
    }

    /// Append a row while building a frame. Returns an error on a width mismatch.
    pub fn push_row(&mut self, timestamp: NaiveDateTime, row: Vec<Option<f64>>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(AssessmentError::Domain(format!(
                "row at {timestamp} has {} cells, expected {}",
                row.len(),
                self.columns.len()
            )));
        }
        self.index.push(timestamp);
        self.rows.push(row);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn index(&self) -> &[NaiveDateTime] {
        &self.index
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Option<f64>>] {
        &self.rows
    }

    pub fn row(&self, i: usize) -> Option<(NaiveDateTime, &[Option<f64>])> {
        Some((*self.index.get(i)?, self.rows.get(i)?.as_slice()))
    }

    pub fn column_position(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| AssessmentError::MissingColumn {
                column: name.to_string(),
            })
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Copy out one column
    pub fn column(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let pos = self.column_position(name)?;
        Ok(self.rows.iter().map(|r| r[pos]).collect())
    }

    /// Non-null values of a column, in index order
    pub fn values(&self, name: &str) -> Result<Vec<f64>> {
        Ok(self.column(name)?.into_iter().flatten().collect())
    }

    /// Return a copy with `name` set to `values`, replacing an existing column
    /// of the same name or appending a new one.
    pub fn with_column(&self, name: &str, values: Vec<Option<f64>>) -> Result<Self> {
        if values.len() != self.len() {
            return Err(AssessmentError::Domain(format!(
                "column '{name}' has {} values, frame has {} rows",
                values.len(),
                self.len()
            )));
        }

        let mut out = self.clone();
        match self.columns.iter().position(|c| c == name) {
            Some(pos) => {
                for (row, v) in out.rows.iter_mut().zip(values) {
                    row[pos] = v;
                }
            }
            None => {
                out.columns.push(name.to_string());
                for (row, v) in out.rows.iter_mut().zip(values) {
                    row.push(v);
                }
            }
        }
        Ok(out)
    }

    /// Keep only the named columns, in the order given
    pub fn select_columns(&self, names: &[&str]) -> Result<Self> {
        let positions = names
            .iter()
            .map(|n| self.column_position(n))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            index: self.index.clone(),
            columns: names.iter().map(|n| n.to_string()).collect(),
            rows: self
                .rows
                .iter()
                .map(|r| positions.iter().map(|&p| r[p]).collect())
                .collect(),
        })
    }

    /// Keep the rows at `indices` (in that order). Out-of-range indices are ignored.
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        let mut out = Self::new(self.columns.iter().cloned());
        for &i in indices {
            if let (Some(ts), Some(row)) = (self.index.get(i), self.rows.get(i)) {
                out.index.push(*ts);
                out.rows.push(row.clone());
            }
        }
        out
    }

    /// Keep rows for which `keep` returns true
    pub fn filter_rows<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(NaiveDateTime, &[Option<f64>]) -> bool,
    {
        let indices: Vec<usize> = (0..self.len())
            .filter(|&i| keep(self.index[i], &self.rows[i]))
            .collect();
        self.select_rows(&indices)
    }

    /// First `n` rows
    pub fn head(&self, n: usize) -> Self {
        let n = n.min(self.len());
        Self {
            index: self.index[..n].to_vec(),
            columns: self.columns.clone(),
            rows: self.rows[..n].to_vec(),
        }
    }

    /// Stable sort by timestamp
    pub fn sorted_by_time(&self) -> Self {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by_key(|&i| self.index[i]);
        self.select_rows(&order)
    }

    /// Return a copy with every timestamp passed through `f`
    pub fn map_index<F>(&self, mut f: F) -> Result<Self>
    where
        F: FnMut(NaiveDateTime) -> Result<NaiveDateTime>,
    {
        let index = self.index.iter().map(|&t| f(t)).collect::<Result<Vec<_>>>()?;
        Ok(Self {
            index,
            columns: self.columns.clone(),
            rows: self.rows.clone(),
        })
    }

    /// Number of rows without any null cell
    pub fn complete_rows(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| r.iter().all(Option::is_some))
            .count()
    }

    pub fn time_span(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let min = self.index.iter().min()?;
        let max = self.index.iter().max()?;
        Some((*min, *max))
    }

    /// Stack frames vertically. All frames must share the same columns.
    pub fn concat(frames: &[TimeFrame]) -> Result<Self> {
        let Some(first) = frames.first() else {
            return Ok(Self::default());
        };

        let mut out = Self::new(first.columns.iter().cloned());
        for frame in frames {
            if frame.columns != first.columns {
                return Err(AssessmentError::Domain(format!(
                    "cannot concatenate frames with columns {:?} and {:?}",
                    first.columns, frame.columns
                )));
            }
            out.index.extend_from_slice(&frame.index);
            out.rows.extend(frame.rows.iter().cloned());
        }
        Ok(out)
    }
}
