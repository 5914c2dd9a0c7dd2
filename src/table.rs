use indexmap::{IndexMap, IndexSet};
use ndarray::{stack, Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

use crate::{error::FeatureError, Point2D};

/// Column name -> values, as stored on disk. Non-finite values are stored
/// as `null`, since JSON has no NaN.
pub type RawColumns = IndexMap<String, Vec<Option<f64>>>;

/// A per-frame table of named numeric columns, all of the same length.
///
/// Tracked entities are stored as a pair of columns `<name>_x` and `<name>_y`.
/// Column order is preserved; derived columns are appended after the
/// existing ones. Only columns added through [`TrackingTable::with_fields`]
/// count as derived and may be overwritten by a later derivation; all other
/// columns are input data.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(try_from = "RawColumns", into = "RawColumns")]
pub struct TrackingTable {
    columns: IndexMap<String, Array1<f64>>,
    frames: usize,
    derived: IndexSet<String>,
}

pub fn x_field(entity: &str) -> String {
    format!("{entity}_x")
}

pub fn y_field(entity: &str) -> String {
    format!("{entity}_y")
}

impl TrackingTable {
    pub fn from_columns(columns: IndexMap<String, Array1<f64>>) -> Result<Self, FeatureError> {
        let mut table = TrackingTable::default();
        for (name, values) in columns {
            table.insert_column(&name, values)?;
        }
        Ok(table)
    }

    /// Add (or replace) a column. The first column decides the frame count of
    /// the table; every later one has to match it.
    pub fn insert_column(&mut self, name: &str, values: Array1<f64>) -> Result<(), FeatureError> {
        if self.columns.is_empty() {
            self.frames = values.len();
        } else if values.len() != self.frames {
            return Err(FeatureError::shape(
                &format!("column \"{name}\""),
                self.frames,
                values.len(),
            ));
        }
        self.columns.insert(String::from(name), values);
        self.derived.shift_remove(name);
        Ok(())
    }

    /// Add the `_x` / `_y` column pair for a tracked entity
    pub fn insert_entity(&mut self, entity: &str, points: &[Point2D]) -> Result<(), FeatureError> {
        let xs: Array1<f64> = points.iter().map(|(x, _y)| *x).collect();
        let ys: Array1<f64> = points.iter().map(|(_x, y)| *y).collect();
        self.insert_column(&x_field(entity), xs)?;
        self.insert_column(&y_field(entity), ys)
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(|k| k.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn is_derived(&self, name: &str) -> bool {
        self.derived.contains(name)
    }

    pub fn column(&self, name: &str) -> Result<ArrayView1<f64>, FeatureError> {
        self.columns
            .get(name)
            .map(|c| c.view())
            .ok_or_else(|| FeatureError::missing(name))
    }

    /// Positions of an entity as an `(N, 2)` array of (x, y) rows
    pub fn point(&self, entity: &str) -> Result<Array2<f64>, FeatureError> {
        let x = self.column(&x_field(entity))?;
        let y = self.column(&y_field(entity))?;
        stack(Axis(1), &[x, y])
            .map_err(|_| FeatureError::shape(&format!("entity \"{entity}\""), x.len(), y.len()))
    }

    /// Copy of this table whose schema also holds the derived fields `names`,
    /// zero-filled. Derived fields that already exist keep their values (and
    /// position) and are expected to be overwritten with
    /// [`TrackingTable::set_column`]. A name that clashes with an input
    /// column is rejected, so input data is never overwritten.
    pub fn with_fields(&self, names: &[String]) -> Result<TrackingTable, FeatureError> {
        if let Some(clash) = names
            .iter()
            .find(|name| self.contains(name) && !self.is_derived(name))
        {
            return Err(FeatureError::InvalidSettings(format!(
                "derived field \"{clash}\" would overwrite an input column of the same name"
            )));
        }
        let mut table = self.clone();
        for name in names {
            if !table.columns.contains_key(name) {
                table
                    .columns
                    .insert(name.clone(), Array1::zeros(self.frames));
            }
            table.derived.insert(name.clone());
        }
        Ok(table)
    }

    /// Overwrite a column that is already part of the schema
    pub fn set_column(&mut self, name: &str, values: Array1<f64>) -> Result<(), FeatureError> {
        let frames = self.frames;
        let column = self
            .columns
            .get_mut(name)
            .ok_or_else(|| FeatureError::missing(name))?;
        if values.len() != frames {
            return Err(FeatureError::shape(
                &format!("column \"{name}\""),
                frames,
                values.len(),
            ));
        }
        *column = values;
        Ok(())
    }
}

impl TryFrom<RawColumns> for TrackingTable {
    type Error = FeatureError;

    fn try_from(raw: RawColumns) -> Result<Self, Self::Error> {
        TrackingTable::from_columns(
            raw.into_iter()
                .map(|(name, values)| {
                    let values: Array1<f64> =
                        values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect();
                    (name, values)
                })
                .collect(),
        )
    }
}

impl From<TrackingTable> for RawColumns {
    fn from(table: TrackingTable) -> Self {
        table
            .columns
            .into_iter()
            .map(|(name, values)| {
                let values = values
                    .iter()
                    .map(|v| if v.is_finite() { Some(*v) } else { None })
                    .collect();
                (name, values)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_entity_columns() {
        let mut table = TrackingTable::default();
        table
            .insert_entity("nose", &[(0., 1.), (2., 3.), (4., 5.)])
            .unwrap();
        assert_eq!(table.frames(), 3);
        assert_eq!(
            table.field_names().collect::<Vec<_>>(),
            vec!["nose_x", "nose_y"]
        );
        assert_eq!(table.column("nose_y").unwrap(), array![1., 3., 5.]);
        assert_eq!(
            table.point("nose").unwrap(),
            array![[0., 1.], [2., 3.], [4., 5.]]
        );
    }

    #[test]
    fn test_unequal_columns_are_rejected() {
        let mut table = TrackingTable::default();
        table.insert_entity("a", &[(0., 0.), (1., 1.)]).unwrap();
        let result = table.insert_entity("b", &[(0., 0.)]);
        assert!(matches!(result, Err(FeatureError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_missing_entity() {
        let table = TrackingTable::default();
        assert_eq!(
            table.point("tail"),
            Err(FeatureError::MissingField {
                field: String::from("tail_x")
            })
        );
    }

    #[test]
    fn test_with_fields_allocates_then_fill() {
        let mut table = TrackingTable::default();
        table.insert_entity("a", &[(1., 2.), (3., 4.)]).unwrap();

        let mut augmented = table.with_fields(&[String::from("extra")]).unwrap();
        assert_eq!(
            augmented.field_names().collect::<Vec<_>>(),
            vec!["a_x", "a_y", "extra"]
        );
        assert_eq!(augmented.column("extra").unwrap(), array![0., 0.]);
        assert!(augmented.is_derived("extra"));
        assert!(!augmented.is_derived("a_x"));

        augmented.set_column("extra", array![7., 8.]).unwrap();
        assert_eq!(augmented.column("extra").unwrap(), array![7., 8.]);
        assert!(augmented.set_column("unknown", array![0., 0.]).is_err());
        assert!(augmented.set_column("extra", array![0.]).is_err());

        // the source table is left alone
        assert!(!table.contains("extra"));

        // derived fields keep their place and can be filled again
        let again = augmented
            .with_fields(&[String::from("extra"), String::from("more")])
            .unwrap();
        assert_eq!(
            again.field_names().collect::<Vec<_>>(),
            vec!["a_x", "a_y", "extra", "more"]
        );
        assert_eq!(again.column("extra").unwrap(), array![7., 8.]);
    }

    #[test]
    fn test_with_fields_never_replaces_input_columns() {
        let mut table = TrackingTable::default();
        table.insert_entity("a", &[(1., 2.), (3., 4.)]).unwrap();

        let result = table.with_fields(&[String::from("extra"), String::from("a_x")]);
        assert!(matches!(result, Err(FeatureError::InvalidSettings(_))));
    }

    #[test]
    fn test_nan_written_as_null_and_read_back() {
        let mut table = TrackingTable::default();
        table
            .insert_column("heading", array![f64::NAN, 90., f64::INFINITY])
            .unwrap();

        let text = serde_json::to_string(&table).unwrap();
        assert_eq!(text, r#"{"heading":[null,90.0,null]}"#);

        let loaded: TrackingTable = serde_json::from_str(&text).unwrap();
        let heading = loaded.column("heading").unwrap();
        assert!(heading[0].is_nan());
        assert_eq!(heading[1], 90.);
        assert!(heading[2].is_nan());
    }

    #[test]
    fn test_json_layout() {
        let table: TrackingTable =
            serde_json::from_str(r#"{"a_x": [0.0, 1.0], "a_y": [2.0, 3.0]}"#).unwrap();
        assert_eq!(table.frames(), 2);
        assert_eq!(
            serde_json::to_string(&table).unwrap(),
            r#"{"a_x":[0.0,1.0],"a_y":[2.0,3.0]}"#
        );

        let bad = serde_json::from_str::<TrackingTable>(r#"{"a_x": [0.0, 1.0], "a_y": [2.0]}"#);
        assert!(bad.is_err());
    }
}
