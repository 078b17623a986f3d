//! Machine-readable phase diagrams.
//!
//! MPDS C-entries describe each phase field of a diagram as an SVG path
//! in composition (x, at.%) and temperature (y) coordinates. This module
//! parses those paths and implements two analyses on binary diagrams:
//! finding element pairs that form no compounds, and extracting the
//! liquidus line.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[allow(clippy::expect_used)]
static SEGMENT_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(" L | M ").expect("valid separator pattern"));

/// Within this tolerance (at.%) a phase next to a pure element is unary.
pub const ELEMENT_TOLERANCE: f64 = 12.5;

/// Minimum temperature span for a diagram to be considered.
pub const MIN_TEMPERATURE_SPAN: f64 = 300.0;

/// Liquidus points closer than this to the top of the diagram are dropped.
pub const MARGIN_EDGES_TEMP: f64 = 5.0;

/// Liquidus points closer than this to either composition edge are dropped.
pub const MARGIN_EDGES_COMP: f64 = 0.1;

/// A point in (composition, temperature) space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

/// One phase field of a diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseShape {
    /// `"phase"`, `"label"`, or `"drawing"` for purely decorative paths.
    pub kind: String,
    #[serde(default)]
    pub nphases: Option<u32>,
    #[serde(default)]
    pub is_solid: Option<bool>,
    #[serde(default)]
    pub svgpath: String,
}

impl PhaseShape {
    fn is_drawing(&self) -> bool {
        self.kind == "drawing"
    }
}

/// A phase diagram entry (C-entry) as returned by the MPDS API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseDiagram {
    pub entry: String,
    #[serde(default)]
    pub chemical_elements: Vec<String>,
    pub comp_range: [f64; 2],
    pub temp: [f64; 2],
    #[serde(default)]
    pub shapes: Vec<PhaseShape>,
}

impl PhaseDiagram {
    /// Full-composition diagrams with a large enough temperature range.
    pub fn is_considered(&self) -> bool {
        self.comp_range == [0.0, 100.0] && self.temp[1] - self.temp[0] >= MIN_TEMPERATURE_SPAN
    }

    /// Sorted chemical elements, identifying the chemical system.
    pub fn fingerprint(&self) -> Vec<String> {
        let mut elements = self.chemical_elements.clone();
        elements.sort();
        elements
    }
}

/// Parse an MPDS SVG path (`M x,y L x,y ... Z`) into points.
pub fn svg_path_points(path: &str) -> Result<Vec<Point2>> {
    let body = path
        .trim_start_matches(['M', ' '])
        .trim_end_matches([' ', 'Z']);
    if body.is_empty() {
        return Err(Error::InvalidData("empty SVG path".to_string()));
    }

    SEGMENT_SEPARATOR
        .split(body)
        .map(|segment| {
            let coords = segment
                .split(',')
                .map(|c| c.trim().parse::<f64>())
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| Error::InvalidData(format!("bad SVG point {segment:?}: {e}")))?;
            match coords.as_slice() {
                [x, y] => Ok(Point2 { x: *x, y: *y }),
                _ => Err(Error::InvalidData(format!(
                    "SVG point {segment:?} must have two coordinates"
                ))),
            }
        })
        .collect()
}

fn almost_equal(x: f64, y: f64, tol: f64) -> bool {
    (x - y).abs() < tol
}

/// Horizontal extent of a phase field.
///
/// A two-point path is a line compound and keeps its endpoints as given;
/// anything else uses the bounding box.
fn composition_bounds(points: &[Point2]) -> Option<(f64, f64)> {
    match points {
        [] => None,
        [a, b] => Some((a.x, b.x)),
        _ => {
            let x0 = points.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
            let x1 = points.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
            Some((x0, x1))
        }
    }
}

/// Whether a single-phase solid field is a genuine compound rather than a
/// continuous solid solution or a terminal (elemental) phase.
fn is_compound_field(x0: f64, x1: f64) -> bool {
    if almost_equal(x1 - x0, 100.0, 0.1) {
        return false;
    }
    let near_first = almost_equal(x0, 0.0, ELEMENT_TOLERANCE) && almost_equal(x1, 0.0, ELEMENT_TOLERANCE);
    let near_second =
        almost_equal(x0, 100.0, ELEMENT_TOLERANCE) && almost_equal(x1, 100.0, ELEMENT_TOLERANCE);
    !(near_first || near_second)
}

/// Chemical systems whose diagrams show no compound formation.
///
/// Typical non-formers are complete-insolubility systems and continuous
/// solid solutions. A system counts as a former as soon as any of its
/// diagrams contains a compound field.
pub fn find_nonformers<'a, I>(diagrams: I) -> Result<BTreeSet<Vec<String>>>
where
    I: IntoIterator<Item = &'a PhaseDiagram>,
{
    let mut formers = BTreeSet::new();
    let mut candidates = BTreeSet::new();

    for diagram in diagrams {
        if !diagram.is_considered() {
            continue;
        }
        let fingerprint = diagram.fingerprint();

        for shape in &diagram.shapes {
            if shape.is_drawing() || shape.is_solid != Some(true) || shape.nphases != Some(1) {
                continue;
            }

            let points = svg_path_points(&shape.svgpath)?;
            let Some((x0, x1)) = composition_bounds(&points) else {
                continue;
            };
            if is_compound_field(x0, x1) {
                formers.insert(fingerprint.clone());
            }
        }

        candidates.insert(fingerprint);
    }

    Ok(candidates.difference(&formers).cloned().collect())
}

/// The liquidus line extracted from one diagram.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiquidusLine {
    pub entry: String,
    pub points: Vec<Point2>,
}

/// Liquidus lines of a set of diagrams plus the common temperature window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiquidusReport {
    pub lines: Vec<LiquidusLine>,
    pub temp_min: f64,
    pub temp_max: f64,
    /// Entries with more than one liquid or gas field.
    pub too_complex: Vec<String>,
}

/// Extract the liquidus line of every considered diagram.
///
/// The first single-phase non-solid field of a diagram is taken as the
/// liquid; its boundary points away from the top and composition edges
/// form the line.
pub fn liquidus_lines<'a, I>(diagrams: I) -> Result<LiquidusReport>
where
    I: IntoIterator<Item = &'a PhaseDiagram>,
{
    let mut report = LiquidusReport {
        lines: Vec::new(),
        temp_min: 500.0,
        temp_max: 700.0,
        too_complex: Vec::new(),
    };

    for diagram in diagrams {
        if !diagram.is_considered() {
            continue;
        }
        report.temp_min = report.temp_min.min(diagram.temp[0]);
        report.temp_max = report.temp_max.max(diagram.temp[1]);

        let mut found_liquid = false;
        for shape in &diagram.shapes {
            if shape.is_drawing() || shape.nphases != Some(1) || shape.is_solid != Some(false) {
                continue;
            }
            if found_liquid {
                log::warn!(
                    "{}: another liquid or gas phase found, the shape is too complex",
                    diagram.entry
                );
                report.too_complex.push(diagram.entry.clone());
                continue;
            }
            found_liquid = true;

            let mut points: Vec<Point2> = svg_path_points(&shape.svgpath)?
                .into_iter()
                .filter(|p| {
                    p.y < diagram.temp[1] - MARGIN_EDGES_TEMP
                        && p.x > diagram.comp_range[0] + MARGIN_EDGES_COMP
                        && p.x < diagram.comp_range[1] - MARGIN_EDGES_COMP
                })
                .collect();
            if points.is_empty() {
                continue;
            }
            points.sort_by(|a, b| a.x.total_cmp(&b.x));

            report.lines.push(LiquidusLine {
                entry: diagram.entry.clone(),
                points,
            });
        }
    }

    Ok(report)
}
