//! Ab initio vs. peer-reviewed property comparison.
//!
//! The MPDS serves the same physical properties from two harvesting
//! approaches: values reported in the peer-reviewed literature and values
//! computed in-house ab initio. A [`PropertyOutline`] says how to fetch
//! and clean one property from both sources; a [`Comparison`] collects the
//! cleaned values per phase and pairs up the phases present in both.
//!
//! Rows ("decks") follow the column layout of the outline's field list:
//! formula, space group number, phase id, value, units, and optionally
//! extra columns used by the massage rules.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::chem::formula::scalar_value;
use crate::chem::{short_formula, CrystalSystem};

const COL_FORMULA: usize = 0;
const COL_SPACE_GROUP: usize = 1;
const COL_PHASE: usize = 2;
const COL_VALUE: usize = 3;
const COL_UNITS: usize = 4;
const COL_EXTRA: usize = 5;

/// meV to cm⁻¹.
pub const MILLIEV_TO_INVCM: f64 = 8.06554;
/// mm⁻¹ to cm⁻¹.
pub const INVMM_TO_INVCM: f64 = 10.0;

/// Default ab initio columns.
pub const AB_FIELDS: &[&str] = &[
    "sample.material.chemical_formula",
    "sample.material.condition[0].scalar[0].value",
    "sample.material.phase_id",
    "sample.measurement[0].property.scalar",
];

/// Default peer-reviewed columns.
pub const PR_FIELDS: &[&str] = &[
    "sample.material.chemical_formula",
    "sample.material.condition[0].scalar[0].value",
    "sample.material.phase_id",
    "sample.measurement[0].property.scalar",
    "sample.measurement[0].property.units",
    "sample.measurement[0].condition[0].units",
    "sample.measurement[0].condition[0].name",
    "sample.measurement[0].condition[0].scalar",
];

const PHONON_AB_FIELDS: &[&str] = &[
    "sample.material.chemical_formula",
    "sample.material.condition[0].scalar[0].value",
    "sample.material.phase_id",
    "sample.measurement[0].property.matrix",
];

const CHARGE_FIELDS: &[&str] = &[
    "sample.material.chemical_formula",
    "sample.material.condition[0].scalar[0].value",
    "sample.material.phase_id",
    "sample.measurement[0].property.scalar",
    "sample.measurement[0].property.units",
    "sample.measurement[0].condition[1].refers_to",
];

const BANDGAP_FIELDS: &[&str] = &[
    "sample.material.chemical_formula",
    "sample.material.condition[0].scalar[0].value",
    "sample.material.phase_id",
    "sample.measurement[0].property.scalar",
    "sample.measurement[0].property.units",
];

/// Which harvesting approach a deck came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    AbInitio,
    PeerReviewed,
}

/// Cleaning rule applied to a deck before it is filed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Massage {
    /// Keep the deck as is.
    Keep,
    /// Drop decks whose units differ.
    RequireUnits(&'static str),
    /// Replace the phonon matrix by its distinct non-zero Γ-point frequencies.
    GammaFrequencies,
    /// Convert reported phonon energies to cm⁻¹.
    PhononUnits,
    /// Pair the value with the atom it refers to.
    ChargeRefersTo,
    /// Require dimensionless units, then pair the value with its atom.
    UnitlessChargeRefersTo,
    /// Require eV.
    BandGapEv,
    /// Require eV and remember the phase as having a typed band gap.
    BandGapEvRecordPhase,
    /// Drop phases already seen with a typed band gap, then require eV.
    BandGapEvSkipKnown,
}

/// State shared by massage rules across properties.
#[derive(Debug, Clone, Default)]
pub struct MassageState {
    known_bandgap_phases: HashSet<i64>,
}

fn units(deck: &[Value]) -> Option<&str> {
    deck.get(COL_UNITS).and_then(Value::as_str)
}

fn phase_id(deck: &[Value]) -> Option<i64> {
    deck.get(COL_PHASE).and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
}

impl Massage {
    /// Apply the rule; `None` drops the deck.
    pub fn apply(self, mut deck: Vec<Value>, state: &mut MassageState) -> Option<Vec<Value>> {
        if deck.len() <= COL_VALUE {
            return None;
        }

        match self {
            Self::Keep => Some(deck),
            Self::RequireUnits(expected) => (units(&deck) == Some(expected)).then_some(deck),
            Self::BandGapEv => (units(&deck) == Some("eV")).then_some(deck),
            Self::GammaFrequencies => {
                let freqs = deck[COL_VALUE]
                    .pointer("/modes_freqs/0 0 0")
                    .and_then(Value::as_array)?;
                let mut distinct: Vec<f64> = freqs
                    .iter()
                    .filter_map(Value::as_f64)
                    .filter(|f| *f != 0.0)
                    .collect();
                distinct.sort_by(f64::total_cmp);
                distinct.dedup();
                deck[COL_VALUE] = Value::from(distinct);
                Some(deck)
            }
            Self::PhononUnits => {
                let value = scalar_value(&deck[COL_VALUE])?;
                let factor = match units(&deck) {
                    Some("eV") => 1000.0 * MILLIEV_TO_INVCM,
                    Some("mm-1") => 1.0,
                    _ => INVMM_TO_INVCM,
                };
                deck[COL_VALUE] = Value::from(value * factor);
                Some(deck)
            }
            Self::ChargeRefersTo => Some(pair_with_extra(deck)),
            Self::UnitlessChargeRefersTo => {
                if units(&deck) != Some("") {
                    return None;
                }
                Some(pair_with_extra(deck))
            }
            Self::BandGapEvRecordPhase => {
                if units(&deck) != Some("eV") {
                    return None;
                }
                if let Some(id) = phase_id(&deck) {
                    state.known_bandgap_phases.insert(id);
                }
                Some(deck)
            }
            Self::BandGapEvSkipKnown => {
                if phase_id(&deck).is_some_and(|id| state.known_bandgap_phases.contains(&id)) {
                    return None;
                }
                if units(&deck) != Some("eV") {
                    return None;
                }
                Some(deck)
            }
        }
    }
}

fn pair_with_extra(mut deck: Vec<Value>) -> Vec<Value> {
    let refers_to = deck.get(COL_EXTRA).cloned().unwrap_or(Value::Null);
    let value = deck[COL_VALUE].take();
    deck[COL_VALUE] = Value::Array(vec![refers_to, value]);
    deck
}

/// How to fetch and clean one property from both sources.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyOutline {
    /// Property name as known to the ab initio data.
    pub property: &'static str,
    /// Peer-reviewed property name, when it differs.
    pub pr_property: Option<&'static str>,
    /// Open interval of plausible scalar values.
    pub interval: (f64, f64),
    pub ab_fields: &'static [&'static str],
    pub pr_fields: &'static [&'static str],
    pub ab_massage: Massage,
    pub pr_massage: Massage,
}

impl PropertyOutline {
    const fn new(property: &'static str, interval: (f64, f64)) -> Self {
        Self {
            property,
            pr_property: None,
            interval,
            ab_fields: AB_FIELDS,
            pr_fields: PR_FIELDS,
            ab_massage: Massage::Keep,
            pr_massage: Massage::Keep,
        }
    }

    pub fn pr_property(&self) -> &'static str {
        self.pr_property.unwrap_or(self.property)
    }

    pub fn fields(&self, source: DataSource) -> &'static [&'static str] {
        match source {
            DataSource::AbInitio => self.ab_fields,
            DataSource::PeerReviewed => self.pr_fields,
        }
    }

    pub const fn massage(&self, source: DataSource) -> Massage {
        match source {
            DataSource::AbInitio => self.ab_massage,
            DataSource::PeerReviewed => self.pr_massage,
        }
    }
}

/// The properties compared by default, in harvesting order.
///
/// Order matters: the typed band gaps record their phases before the
/// untyped `energy gap` skips them.
pub fn default_outlines() -> Vec<PropertyOutline> {
    let bandgap = |property, pr_massage| PropertyOutline {
        ab_fields: BANDGAP_FIELDS,
        pr_fields: BANDGAP_FIELDS,
        ab_massage: Massage::BandGapEv,
        pr_massage,
        ..PropertyOutline::new(property, (0.01, 20.0))
    };

    vec![
        PropertyOutline::new("electrical conductivity", ((-28.0_f64).exp(), 28.0_f64.exp())),
        PropertyOutline::new("Seebeck coefficient", (-1000.0, 1000.0)),
        PropertyOutline {
            pr_massage: Massage::RequireUnits("kJ g-at.-1"),
            ..PropertyOutline::new("enthalpy of formation", (-900.0, 200.0))
        },
        PropertyOutline {
            pr_property: Some("phonons"),
            ab_fields: PHONON_AB_FIELDS,
            ab_massage: Massage::GammaFrequencies,
            pr_massage: Massage::PhononUnits,
            ..PropertyOutline::new("vibrational spectra", (0.0, 2000.0))
        },
        PropertyOutline {
            pr_massage: Massage::RequireUnits("J K-1 g-at.-1"),
            ..PropertyOutline::new("heat capacity at constant pressure", (0.0, 500.0))
        },
        PropertyOutline {
            pr_massage: Massage::RequireUnits("GPa"),
            ..PropertyOutline::new("isothermal bulk modulus", (0.5, 2000.0))
        },
        PropertyOutline {
            pr_massage: Massage::RequireUnits(""),
            ..PropertyOutline::new("poisson ratio", (0.0, 1.0))
        },
        PropertyOutline {
            ab_fields: CHARGE_FIELDS,
            pr_fields: CHARGE_FIELDS,
            ab_massage: Massage::ChargeRefersTo,
            pr_massage: Massage::UnitlessChargeRefersTo,
            ..PropertyOutline::new("effective charge", (-20.0, 20.0))
        },
        bandgap("energy gap for direct transition", Massage::BandGapEvRecordPhase),
        bandgap("energy gap for indirect transition", Massage::BandGapEvRecordPhase),
        PropertyOutline {
            ab_massage: Massage::BandGapEvSkipKnown,
            ..bandgap("energy gap", Massage::BandGapEvSkipKnown)
        },
    ]
}

/// Formula and crystal system identifying a phase in reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseLabel {
    pub formula: String,
    pub crystal_system: CrystalSystem,
}

/// A phase with values from both sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparedPhase {
    pub phase_id: i64,
    pub label: PhaseLabel,
    pub ab_values: Vec<Value>,
    pub pr_values: Vec<Value>,
}

/// Why a deck was not filed.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    Massaged,
    OutOfInterval(f64),
    NoPhase,
    BadSpaceGroup(Value),
}

/// Values of one property collected from both sources.
#[derive(Debug, Clone)]
pub struct Comparison {
    outline: PropertyOutline,
    ab_data: BTreeMap<i64, Vec<Value>>,
    pr_data: BTreeMap<i64, Vec<Value>>,
    labels: BTreeMap<i64, PhaseLabel>,
}

impl Comparison {
    pub fn new(outline: PropertyOutline) -> Self {
        Self {
            outline,
            ab_data: BTreeMap::new(),
            pr_data: BTreeMap::new(),
            labels: BTreeMap::new(),
        }
    }

    pub const fn outline(&self) -> &PropertyOutline {
        &self.outline
    }

    /// Clean a deck and file its value under its phase.
    pub fn ingest(
        &mut self,
        source: DataSource,
        deck: Vec<Value>,
        state: &mut MassageState,
    ) -> Result<(), Rejection> {
        let deck = self
            .outline
            .massage(source)
            .apply(deck, state)
            .ok_or(Rejection::Massaged)?;

        let value = deck[COL_VALUE].clone();
        if !value.is_array() {
            if let Some(v) = scalar_value(&value) {
                let (lo, hi) = self.outline.interval;
                if !(lo < v && v < hi) {
                    return Err(Rejection::OutOfInterval(v));
                }
            }
        }

        let phase = phase_id(&deck).ok_or(Rejection::NoPhase)?;
        let space_group = deck.get(COL_SPACE_GROUP).cloned().unwrap_or(Value::Null);
        let crystal_system = scalar_value(&space_group)
            .and_then(|sg| u16::try_from(sg as i64).ok())
            .and_then(|sg| CrystalSystem::from_space_group(sg).ok())
            .ok_or(Rejection::BadSpaceGroup(space_group))?;
        let formula = deck
            .get(COL_FORMULA)
            .and_then(Value::as_str)
            .map(|f| short_formula(f, true))
            .unwrap_or_default();

        let data = match source {
            DataSource::AbInitio => &mut self.ab_data,
            DataSource::PeerReviewed => &mut self.pr_data,
        };
        data.entry(phase).or_default().push(value);
        self.labels.insert(
            phase,
            PhaseLabel {
                formula,
                crystal_system,
            },
        );

        Ok(())
    }

    /// Phases reported by both sources, ordered by phase id.
    pub fn pairs(&self) -> Vec<ComparedPhase> {
        self.ab_data
            .iter()
            .filter_map(|(phase, ab_values)| {
                let pr_values = self.pr_data.get(phase)?;
                let label = self.labels.get(phase)?;
                Some(ComparedPhase {
                    phase_id: *phase,
                    label: label.clone(),
                    ab_values: ab_values.clone(),
                    pr_values: pr_values.clone(),
                })
            })
            .collect()
    }
}
