//! Group labels aligned with record positions.

use std::collections::BTreeMap;

use em_model::Result;
use polars::prelude::{DataFrame, NamedFrom, Series};
use serde::Serialize;

use crate::table::frame_error;

/// Column name used when labels are attached to a record table.
pub const DEFAULT_GROUP_COLUMN: &str = "group";

/// One optional group id per record. A labeled record carries the anchor
/// position of the group it was last assigned to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct GroupLabels(Vec<Option<usize>>);

impl GroupLabels {
    /// Every record unlabeled.
    pub fn unlabeled(record_count: usize) -> Self {
        Self(vec![None; record_count])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<usize> {
        self.0.get(position).copied().flatten()
    }

    pub(crate) fn assign(&mut self, position: usize, group: usize) {
        if let Some(slot) = self.0.get_mut(position) {
            *slot = Some(group);
        }
    }

    pub fn as_slice(&self) -> &[Option<usize>] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<Option<usize>> {
        self.0
    }

    /// Number of records that belong to some group.
    pub fn labeled_count(&self) -> usize {
        self.0.iter().flatten().count()
    }

    /// Group id to member positions, both ascending.
    pub fn groups(&self) -> BTreeMap<usize, Vec<usize>> {
        let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (position, label) in self.0.iter().enumerate() {
            if let Some(group) = label {
                groups.entry(*group).or_default().push(position);
            }
        }
        groups
    }

    /// Nullable `UInt64` series named `name`.
    pub fn to_series(&self, name: &str) -> Series {
        let values: Vec<Option<u64>> = self
            .0
            .iter()
            .map(|label| label.map(|group| group as u64))
            .collect();
        Series::new(name.into(), values)
    }

    /// Copy of `df` with the labels added (or replaced) as column `name`.
    ///
    /// # Errors
    ///
    /// Fails when the label count differs from the frame height.
    pub fn attach(&self, df: &DataFrame, name: &str) -> Result<DataFrame> {
        let mut labeled = df.clone();
        labeled
            .with_column(self.to_series(name))
            .map_err(frame_error)?;
        Ok(labeled)
    }
}

impl From<Vec<Option<usize>>> for GroupLabels {
    fn from(labels: Vec<Option<usize>>) -> Self {
        Self(labels)
    }
}

#[cfg(test)]
mod tests {
    use polars::prelude::{AnyValue, DataType, IntoColumn};

    use super::*;

    #[test]
    fn groups_collect_members() {
        let labels = GroupLabels::from(vec![Some(0), None, Some(0), Some(3), Some(3)]);
        assert_eq!(labels.labeled_count(), 4);
        let groups = labels.groups();
        assert_eq!(groups[&0], vec![0, 2]);
        assert_eq!(groups[&3], vec![3, 4]);
        assert_eq!(labels.get(1), None);
        assert_eq!(labels.get(9), None);
    }

    #[test]
    fn attach_adds_nullable_column() {
        let df = DataFrame::new(vec![
            Series::new("title".into(), vec!["a", "b"]).into_column(),
        ])
        .unwrap();
        let labels = GroupLabels::from(vec![Some(0), None]);
        let labeled = labels.attach(&df, DEFAULT_GROUP_COLUMN).unwrap();

        let column = labeled.column("group").unwrap();
        assert_eq!(column.dtype(), &DataType::UInt64);
        assert_eq!(column.get(0).unwrap(), AnyValue::UInt64(0));
        assert_eq!(column.get(1).unwrap(), AnyValue::Null);
    }

    #[test]
    fn attach_rejects_wrong_height() {
        let df = DataFrame::new(vec![
            Series::new("title".into(), vec!["a", "b"]).into_column(),
        ])
        .unwrap();
        assert!(GroupLabels::unlabeled(3).attach(&df, "group").is_err());
    }
}
