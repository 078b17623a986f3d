//! Export of tabular results as plot data.
//!
//! Every export writes a CSV table and a JSON plot document side by side
//! under random basenames in the export directory. The JSON documents are
//! understood by the MPDS web plotting widgets.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{Error, Result};

const BASENAME_ALPHABET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789_";
const BASENAME_LEN: usize = 12;

/// Plot document type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlotKind {
    Bar,
    Plot3d,
}

impl PlotKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bar => "bar",
            Self::Plot3d => "plot3d",
        }
    }
}

impl fmt::Display for PlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlotKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "bar" => Ok(Self::Bar),
            "plot3d" => Ok(Self::Plot3d),
            other => Err(Error::InvalidData(format!("{other} is an unknown plot type"))),
        }
    }
}

/// Human-readable axis title for a column name.
pub fn axis_title(column: &str) -> &str {
    match column {
        "length" => "Bond lengths, &#8491;",
        "occurrence" => "Counts",
        "bandgap" => "Band gap, eV",
        other => other,
    }
}

/// Paths written by one export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedPlot {
    pub csv: PathBuf,
    pub json: PathBuf,
}

/// Writes plot exports into one directory.
#[derive(Debug, Clone)]
pub struct Exporter {
    dir: PathBuf,
}

impl Exporter {
    /// Use `dir` for exports, creating it if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        if fs::metadata(&dir)?.permissions().readonly() {
            return Err(Error::InvalidData(format!(
                "{} is not writable",
                dir.display()
            )));
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `rows` as CSV plus a JSON plot document.
    pub fn export_plot(
        &self,
        rows: &[Vec<Value>],
        columns: &[&str],
        kind: PlotKind,
    ) -> Result<ExportedPlot> {
        let document = plot_document(rows, columns, kind)?;

        let mut rng = rand::thread_rng();
        let csv = self.dir.join(format!("{}.csv", random_basename(&mut rng)));
        let json = self.dir.join(format!("{}.json", random_basename(&mut rng)));

        fs::write(&csv, csv_table(rows, columns))?;
        log::info!("Exported {} rows to {}", rows.len(), csv.display());

        fs::write(&json, to_json_4(&document)?)?;
        log::info!("Exported {} plot to {}", kind, json.display());

        Ok(ExportedPlot { csv, json })
    }
}

/// A random basename of letters, digits and underscores.
pub fn random_basename<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..BASENAME_LEN)
        .filter_map(|_| BASENAME_ALPHABET.choose(rng).map(|b| char::from(*b)))
        .collect()
}

fn cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Render rows as CSV with a header line.
pub fn csv_table(rows: &[Vec<Value>], columns: &[&str]) -> String {
    let mut out = columns.join(",");
    out.push('\n');
    for row in rows {
        let line: Vec<String> = row.iter().map(cell).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }
    out
}

fn column_at<'a>(row: &'a [Value], idx: usize) -> Result<&'a Value> {
    row.get(idx)
        .ok_or_else(|| Error::InvalidData(format!("row has no column {idx}")))
}

fn title_at(columns: &[&str], idx: usize) -> Result<String> {
    columns
        .get(idx)
        .map(|c| axis_title(c).to_string())
        .ok_or_else(|| Error::InvalidData(format!("missing column name {idx}")))
}

/// Build the `{type, payload}` plot document.
///
/// Bar plots take x and y from the first two columns. 3D plots take x, y,
/// z and a point label from the first four columns and a mesh id from the
/// fifth; consecutive rows with the same mesh id form one mesh.
pub fn plot_document(rows: &[Vec<Value>], columns: &[&str], kind: PlotKind) -> Result<Value> {
    let payload = match kind {
        PlotKind::Bar => {
            let mut x = Vec::with_capacity(rows.len());
            let mut y = Vec::with_capacity(rows.len());
            for row in rows {
                x.push(column_at(row, 0)?.clone());
                y.push(column_at(row, 1)?.clone());
            }
            json!({
                "x": x,
                "y": y,
                "xtitle": title_at(columns, 0)?,
                "ytitle": title_at(columns, 1)?,
            })
        }
        PlotKind::Plot3d => {
            let (mut xs, mut ys, mut zs, mut labels) = (vec![], vec![], vec![], vec![]);
            let mut meshes: Vec<[Vec<Value>; 3]> = Vec::new();
            let mut recent_mesh = json!(0);

            for row in rows {
                let (x, y, z) = (column_at(row, 0)?, column_at(row, 1)?, column_at(row, 2)?);
                xs.push(x.clone());
                ys.push(y.clone());
                zs.push(z.clone());
                labels.push(column_at(row, 3)?.clone());

                let mesh_id = column_at(row, 4)?;
                if *mesh_id != recent_mesh {
                    meshes.push([vec![], vec![], vec![]]);
                }
                recent_mesh = mesh_id.clone();

                if let Some([mx, my, mz]) = meshes.last_mut() {
                    mx.push(x.clone());
                    my.push(y.clone());
                    mz.push(z.clone());
                }
            }

            let meshes: Vec<Value> = meshes
                .into_iter()
                .map(|[x, y, z]| json!({"x": x, "y": y, "z": z}))
                .collect();
            json!({
                "points": {"x": xs, "y": ys, "z": zs, "labels": labels},
                "meshes": meshes,
                "xtitle": title_at(columns, 0)?,
                "ytitle": title_at(columns, 1)?,
                "ztitle": title_at(columns, 2)?,
            })
        }
    };

    Ok(json!({"type": kind.as_str(), "payload": payload}))
}

fn to_json_4(value: &Value) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut serializer)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::TempDir;

    fn rows(values: Value) -> Vec<Vec<Value>> {
        values
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r.as_array().unwrap().clone())
            .collect()
    }

    #[test]
    fn test_plot_kind_parse() {
        assert_eq!("bar".parse::<PlotKind>().unwrap(), PlotKind::Bar);
        assert_eq!("plot3d".parse::<PlotKind>().unwrap(), PlotKind::Plot3d);
        assert!("pie".parse::<PlotKind>().is_err());
    }

    #[test]
    fn test_axis_titles() {
        assert_eq!(axis_title("bandgap"), "Band gap, eV");
        assert_eq!(axis_title("groupA"), "groupA");
    }

    #[test]
    fn test_random_basename() {
        let mut rng = StdRng::seed_from_u64(3);
        let name = random_basename(&mut rng);
        assert_eq!(name.len(), 12);
        assert!(name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
        assert_ne!(name, random_basename(&mut rng));
    }

    #[test]
    fn test_csv_table() {
        let data = rows(json!([[1.0, 1.0], [2.0, "x"], [3, null]]));
        assert_eq!(csv_table(&data, &["a", "b"]), "a,b\n1.0,1.0\n2.0,x\n3,\n");
    }

    #[test]
    fn test_bar_document() {
        let data = rows(json!([[1.5, 10], [2.5, 3]]));
        let doc = plot_document(&data, &["length", "occurrence"], PlotKind::Bar).unwrap();
        assert_eq!(doc["type"], "bar");
        assert_eq!(doc["payload"]["x"], json!([1.5, 2.5]));
        assert_eq!(doc["payload"]["y"], json!([10, 3]));
        assert_eq!(doc["payload"]["xtitle"], "Bond lengths, &#8491;");
        assert_eq!(doc["payload"]["ytitle"], "Counts");
    }

    #[test]
    fn test_plot3d_meshes() {
        let data = rows(json!([
            [1, 2, 3, "", 0],
            [1, 2, 2, "", 0],
            [3, 2, 4, "", 1],
            [0, 0, 0, "", 1],
            [5, 5, 5, "", 2]
        ]));
        let doc = plot_document(&data, &["a", "b", "c", "d", "e"], PlotKind::Plot3d).unwrap();
        let payload = &doc["payload"];
        assert_eq!(payload["points"]["z"], json!([3, 2, 4, 0, 5]));
        // Rows before the first mesh id change belong to no mesh.
        let meshes = payload["meshes"].as_array().unwrap();
        assert_eq!(meshes.len(), 2);
        assert_eq!(meshes[0]["x"], json!([3, 0]));
        assert_eq!(meshes[1]["x"], json!([5]));
        assert_eq!(payload["ztitle"], "c");
    }

    #[test]
    fn test_short_rows_rejected() {
        let data = rows(json!([[1, 2, 3]]));
        assert!(plot_document(&data, &["a", "b", "c"], PlotKind::Plot3d).is_err());
        assert!(plot_document(&data, &["a"], PlotKind::Bar).is_err());
    }

    #[test]
    fn test_export_writes_files() {
        let temp_dir = TempDir::new().unwrap();
        let exporter = Exporter::new(temp_dir.path().join("_MPDS")).unwrap();
        let data = rows(json!([[1.0, 1.0], [2.0, 3.0]]));

        let exported = exporter.export_plot(&data, &["a11", "a12"], PlotKind::Bar).unwrap();

        let csv = std::fs::read_to_string(&exported.csv).unwrap();
        assert!(csv.starts_with("a11,a12\n"));
        let json = std::fs::read_to_string(&exported.json).unwrap();
        assert!(json.contains("\n    \"payload\": {"));
        let doc: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(doc["payload"]["y"], json!([1.0, 3.0]));
    }
}
