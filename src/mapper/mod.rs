// src/mapper/mod.rs
//! Row → series mapping.
//!
//! ```text
//!   rows ──first row whose label cell contains spec.label──► matched row
//!                                                               │
//!   ColumnScheme {1: bln_rub, 2: yoy, 3: rog}                   │
//!        │   position k reads row[k] (row[0] is the label)      │
//!        ▼                                                      ▼
//!   SeriesRecord { "<NAME>_<suffix>", "YYYY-MM", value }  (numeric cells only)
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::catalog::Period;
use crate::error::{Error, Result};
use crate::process::Row;

/// Identifies the row carrying an indicator: its label cell contains
/// `label`, and emitted series are prefixed with `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorSpec {
    pub label: String,
    pub name: String,
}

impl IndicatorSpec {
    pub fn new(label: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            name: name.into(),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.label.is_empty() {
            return Err(Error::InvalidSpec(format!(
                "empty label for indicator {:?}",
                self.name
            )));
        }
        if self.name.is_empty() {
            return Err(Error::InvalidSpec(format!(
                "empty name for label {:?}",
                self.label
            )));
        }
        Ok(())
    }
}

/// Data-column position (1-based, after the label column) → series suffix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<usize, String>", into = "BTreeMap<usize, String>")]
pub struct ColumnScheme {
    columns: BTreeMap<usize, String>,
}

impl ColumnScheme {
    pub fn new<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (usize, S)>,
        S: Into<String>,
    {
        let mut map = BTreeMap::new();
        for (position, suffix) in columns {
            let suffix = suffix.into();
            if position == 0 {
                return Err(Error::Config(format!(
                    "column position of {suffix:?} must be at least 1"
                )));
            }
            if suffix.is_empty() {
                return Err(Error::Config(format!("empty suffix for column {position}")));
            }
            if map.insert(position, suffix).is_some() {
                return Err(Error::Config(format!("column {position} listed twice")));
            }
        }
        Ok(Self { columns: map })
    }

    /// Entries in ascending position order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.columns.iter().map(|(k, v)| (*k, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl Default for ColumnScheme {
    fn default() -> Self {
        let columns = [(1, "bln_rub"), (2, "yoy"), (3, "rog")]
            .into_iter()
            .map(|(k, v)| (k, v.to_string()))
            .collect();
        Self { columns }
    }
}

impl TryFrom<BTreeMap<usize, String>> for ColumnScheme {
    type Error = Error;

    fn try_from(map: BTreeMap<usize, String>) -> Result<Self> {
        ColumnScheme::new(map)
    }
}

impl From<ColumnScheme> for BTreeMap<usize, String> {
    fn from(scheme: ColumnScheme) -> Self {
        scheme.columns
    }
}

/// One dated observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesRecord {
    pub name: String,
    pub date: String,
    pub value: f64,
}

/// Parse a bulletin number: whitespace (thousands separators) removed,
/// comma or dot as decimal separator. Only plain decimals are accepted, so
/// dashes, ellipses and footnote text yield `None`.
pub fn parse_number(cell: &str) -> Option<f64> {
    let compact: String = cell
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    let digits = compact.strip_prefix(&['-', '+'][..]).unwrap_or(&compact);
    let mut seen_digit = false;
    let mut seen_point = false;
    for c in digits.chars() {
        match c {
            '0'..='9' => seen_digit = true,
            '.' if !seen_point => seen_point = true,
            _ => return None,
        }
    }
    if !seen_digit {
        return None;
    }
    compact.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn label_matches(row: &Row, label: &str) -> bool {
    row.first().is_some_and(|cell| cell.contains(label))
}

/// First row whose label cell contains `label`.
pub fn find_row<'r>(rows: &'r [Row], label: &str) -> Option<&'r Row> {
    rows.iter().find(|row| label_matches(row, label))
}

/// Like [`find_row`], but fails when more than one row matches.
pub fn find_unique_row<'r>(rows: &'r [Row], label: &str) -> Result<Option<&'r Row>> {
    let mut matches = rows.iter().filter(|row| label_matches(row, label));
    let first = matches.next();
    let extra = matches.count();
    if extra > 0 {
        return Err(Error::AmbiguousLabel {
            label: label.to_string(),
            matches: extra + 1,
        });
    }
    Ok(first)
}

/// Project the numeric columns of `row` through `scheme`.
fn project(row: &Row, spec: &IndicatorSpec, scheme: &ColumnScheme, date: &str) -> Vec<SeriesRecord> {
    scheme
        .iter()
        .filter_map(|(position, suffix)| {
            let cell = row.get(position).map(String::as_str).unwrap_or("");
            match parse_number(cell) {
                Some(value) => Some(SeriesRecord {
                    name: format!("{}_{}", spec.name, suffix),
                    date: date.to_string(),
                    value,
                }),
                None => {
                    trace!(indicator = %spec.name, position, cell, "no value");
                    None
                }
            }
        })
        .collect()
}

/// Map the first row labelled by `spec` into dated records, one per
/// numeric column of `scheme`, in ascending column order.
///
/// No matching row is not an error: the result is empty.
pub fn map_rows<R: AsRef<[Row]>>(
    rows: R,
    spec: &IndicatorSpec,
    scheme: &ColumnScheme,
    date: &str,
) -> Result<Vec<SeriesRecord>> {
    spec.validate()?;
    date.parse::<Period>()?;

    let Some(row) = find_row(rows.as_ref(), &spec.label) else {
        debug!(indicator = %spec.name, label = %spec.label, "no matching row");
        return Ok(Vec::new());
    };
    let records = project(row, spec, scheme, date);
    debug!(indicator = %spec.name, records = records.len(), "mapped");
    Ok(records)
}

/// Evaluate several indicators against the same rows, in `specs` order.
pub fn map_all<R: AsRef<[Row]>>(
    rows: R,
    specs: &[IndicatorSpec],
    scheme: &ColumnScheme,
    date: &str,
) -> Result<Vec<SeriesRecord>> {
    let rows = rows.as_ref();
    let mut out = Vec::new();
    for spec in specs {
        out.extend(map_rows(rows, spec, scheme, date)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Row {
        cells.iter().map(|s| s.to_string()).collect()
    }

    fn record(name: &str, value: f64) -> SeriesRecord {
        SeriesRecord {
            name: name.into(),
            date: "2017-10".into(),
            value,
        }
    }

    fn indpro() -> IndicatorSpec {
        IndicatorSpec::new("Индекс промышленного производства", "INDPRO")
    }

    fn agroprod() -> IndicatorSpec {
        IndicatorSpec::new("Продукция сельского хозяйства", "AGROPROD")
    }

    #[test]
    fn index_series_without_ruble_column() {
        let rows = vec![row(&["Индекс промышленного производства", "", "100.0", "105.7"])];
        let got = map_rows(&rows, &indpro(), &ColumnScheme::default(), "2017-10").unwrap();
        assert_eq!(
            got,
            vec![record("INDPRO_yoy", 100.0), record("INDPRO_rog", 105.7)]
        );
    }

    #[test]
    fn all_three_columns() {
        let rows = vec![row(&["Продукция сельского хозяйства", "733.8", "97.5", "64.7"])];
        let got = map_rows(&rows, &agroprod(), &ColumnScheme::default(), "2017-10").unwrap();
        assert_eq!(
            got,
            vec![
                record("AGROPROD_bln_rub", 733.8),
                record("AGROPROD_yoy", 97.5),
                record("AGROPROD_rog", 64.7),
            ]
        );
    }

    #[test]
    fn multiple_specs_over_one_extraction() {
        let rows = vec![
            row(&["Валовой внутренний продукт", "22 041,3", "101,8", "х"]),
            row(&["Индекс промышленного производства1)", "", "100,0", "105,7"]),
            row(&["Продукция сельского хозяйства", "733,8", "97,5", "64,7"]),
        ];
        let got = map_all(
            &rows,
            &[indpro(), agroprod(), IndicatorSpec::new("Грузооборот", "FREIGHT")],
            &ColumnScheme::default(),
            "2017-10",
        )
        .unwrap();
        let names: Vec<&str> = got.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            ["INDPRO_yoy", "INDPRO_rog", "AGROPROD_bln_rub", "AGROPROD_yoy", "AGROPROD_rog"]
        );
        assert_eq!(got[2].value, 733.8);
    }

    #[test]
    fn no_match_is_empty() {
        let rows = vec![row(&["Оборот розничной торговли", "2 500", "101,2", "98,0"])];
        assert!(map_rows(&rows, &indpro(), &ColumnScheme::default(), "2017-10")
            .unwrap()
            .is_empty());
        assert!(map_rows(Vec::<Row>::new(), &indpro(), &ColumnScheme::default(), "2017-10")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn placeholders_and_short_rows_skip_columns() {
        let scheme = ColumnScheme::default();
        let rows = vec![row(&["Индекс промышленного производства", "-", "…"])];
        assert!(map_rows(&rows, &indpro(), &scheme, "2017-10").unwrap().is_empty());

        let rows = vec![row(&["Индекс промышленного производства", "н/д", "99,1"])];
        assert_eq!(
            map_rows(&rows, &indpro(), &scheme, "2017-10").unwrap(),
            vec![record("INDPRO_yoy", 99.1)]
        );

        let rows = vec![row(&["Индекс промышленного производства"])];
        assert!(map_rows(&rows, &indpro(), &scheme, "2017-10").unwrap().is_empty());
    }

    #[test]
    fn first_match_wins_unless_strict() {
        let rows = vec![
            row(&["Индекс промышленного производства", "", "101,0", "99,0"]),
            row(&["Индекс промышленного производства (без учета)", "", "102,0", "98,0"]),
        ];
        let got = map_rows(&rows, &indpro(), &ColumnScheme::default(), "2017-10").unwrap();
        assert_eq!(got[0].value, 101.0);

        assert!(matches!(
            find_unique_row(&rows, &indpro().label),
            Err(Error::AmbiguousLabel { matches: 2, .. })
        ));
        assert_eq!(
            find_unique_row(&rows[..1], &indpro().label).unwrap(),
            Some(&rows[0])
        );
    }

    #[test]
    fn label_match_is_case_sensitive_on_first_cell() {
        let rows = vec![
            row(&["итого", "индекс промышленного производства"]),
            row(&["ИНДЕКС ПРОМЫШЛЕННОГО ПРОИЗВОДСТВА", "", "1", "2"]),
        ];
        assert!(find_row(&rows, &indpro().label).is_none());
    }

    #[test]
    fn custom_scheme_order_is_ascending() {
        let scheme = ColumnScheme::new([(3, "c"), (1, "a"), (2, "b")]).unwrap();
        let rows = vec![row(&["L", "1", "2", "3"])];
        let got = map_rows(&rows, &IndicatorSpec::new("L", "X"), &scheme, "2020-01").unwrap();
        let names: Vec<&str> = got.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["X_a", "X_b", "X_c"]);
    }

    #[test]
    fn contract_violations_fail_fast() {
        let rows = vec![row(&["x", "1"])];
        let scheme = ColumnScheme::default();
        assert!(matches!(
            map_rows(&rows, &IndicatorSpec::new("", "X"), &scheme, "2017-10"),
            Err(Error::InvalidSpec(_))
        ));
        assert!(matches!(
            map_rows(&rows, &IndicatorSpec::new("x", ""), &scheme, "2017-10"),
            Err(Error::InvalidSpec(_))
        ));
        for bad in ["2017-13", "2017-1", "17-10", "2017/10", ""] {
            assert!(
                matches!(map_rows(&rows, &indpro(), &scheme, bad), Err(Error::InvalidDate(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn scheme_rejects_bad_positions() {
        assert!(ColumnScheme::new([(0, "x")]).is_err());
        assert!(ColumnScheme::new([(1, "x"), (1, "y")]).is_err());
        assert!(ColumnScheme::new([(1, "")]).is_err());
        assert_eq!(ColumnScheme::default().len(), 3);
    }

    #[test]
    fn number_parsing() {
        assert_eq!(parse_number("105,7"), Some(105.7));
        assert_eq!(parse_number("105.7"), Some(105.7));
        assert_eq!(parse_number("22 041,3"), Some(22041.3));
        assert_eq!(parse_number("1\u{a0}234"), Some(1234.0));
        assert_eq!(parse_number("-0,5"), Some(-0.5));
        assert_eq!(parse_number("+3"), Some(3.0));
        for junk in ["", "-", "–", "—", "…", "...", "х", "NaN", "inf", "1e5", "1,2,3", ".", "97,5 1)"] {
            assert_eq!(parse_number(junk), None, "{junk:?}");
        }
    }
}
