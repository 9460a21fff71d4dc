//! Maps logical variable names to the physical field names present in a
//! dataset.
//!
//! Field names in the source products encode grid kind and pressure level
//! (e.g. `TMP_1D5maboveground`, `TMP_500mb`), and differ between product
//! generations. The mapping table gives the direct name (with a `{level}`
//! placeholder for isobaric fields); when the direct name is absent from the
//! dataset, an ordered list of glob patterns is tried as a fallback. A miss is
//! reported as `None`, never as an error: callers skip the variable and keep
//! extracting the rest.

use crate::grid::dataset::GridDataset;
use crate::variables::variable::{GridKind, Variable};
use glob::Pattern;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const LEVEL_PLACEHOLDER: &str = "{level}";

/// The serialized form of a mapping table, as a collaborator's configuration
/// loader would deserialize it from YAML or JSON.
///
/// Keys of the per-kind maps are logical names (`air_temperature`, ...);
/// values are physical names, optionally containing `{level}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VariableMappingConfig {
    #[serde(default)]
    pub surface: HashMap<String, String>,
    #[serde(default)]
    pub isobaric: HashMap<String, String>,
    #[serde(default)]
    pub fallback_patterns: FallbackPatternsConfig,
}

/// Ordered fallback glob patterns per (grid kind, logical name).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FallbackPatternsConfig {
    #[serde(default)]
    pub surface: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub isobaric: HashMap<String, Vec<String>>,
}

impl VariableMappingConfig {
    /// The built-in table used when no configuration is supplied, covering the
    /// standard LANAL/MSM field names.
    pub fn builtin() -> Self {
        let surface = [
            ("air_temperature", "TMP_1D5maboveground"),
            ("relative_humidity", "RH_1D5maboveground"),
            ("u_wind", "UGRD_10maboveground"),
            ("v_wind", "VGRD_10maboveground"),
            ("surface_pressure", "PRMSL_meansealevel"),
        ];
        let isobaric = [
            ("air_temperature", "TMP_{level}mb"),
            ("relative_humidity", "RH_{level}mb"),
            ("u_wind", "UGRD_{level}mb"),
            ("v_wind", "VGRD_{level}mb"),
            ("geopotential_height", "HGT_{level}mb"),
        ];
        Self {
            surface: surface
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            isobaric: isobaric
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            fallback_patterns: FallbackPatternsConfig::default(),
        }
    }
}

/// A fallback pattern, compiled at table construction where possible.
///
/// Patterns without a level placeholder compile once; leveled patterns keep
/// their template and compile after substitution, per requested level.
#[derive(Debug, Clone)]
enum PatternTemplate {
    Fixed(Pattern),
    Leveled(String),
}

#[derive(Debug, Clone, Default)]
struct KindTable {
    direct: HashMap<String, String>,
    fallback: HashMap<String, Vec<PatternTemplate>>,
}

/// The compiled, read-only variable mapping used by the extraction pipeline.
///
/// Built once per process from a [`VariableMappingConfig`] (or the built-in
/// default) and shared read-only afterwards.
#[derive(Debug, Clone)]
pub struct VariableMapping {
    surface: KindTable,
    isobaric: KindTable,
}

impl Default for VariableMapping {
    fn default() -> Self {
        Self::from_config(VariableMappingConfig::builtin())
    }
}

impl VariableMapping {
    /// Compiles a configuration into the lookup tables, pre-compiling every
    /// fixed fallback pattern. Invalid glob patterns are skipped with a
    /// warning rather than failing the whole table.
    pub fn from_config(config: VariableMappingConfig) -> Self {
        Self {
            surface: Self::compile_kind(
                config.surface,
                config.fallback_patterns.surface,
                GridKind::Surface,
            ),
            isobaric: Self::compile_kind(
                config.isobaric,
                config.fallback_patterns.isobaric,
                GridKind::Isobaric,
            ),
        }
    }

    /// Parses a JSON-encoded [`VariableMappingConfig`] and compiles it.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: VariableMappingConfig = serde_json::from_str(json)?;
        Ok(Self::from_config(config))
    }

    fn compile_kind(
        direct: HashMap<String, String>,
        fallback: HashMap<String, Vec<String>>,
        kind: GridKind,
    ) -> KindTable {
        let fallback = fallback
            .into_iter()
            .map(|(logical, patterns)| {
                let compiled = patterns
                    .into_iter()
                    .filter_map(|p| {
                        if p.contains(LEVEL_PLACEHOLDER) {
                            Some(PatternTemplate::Leveled(p))
                        } else {
                            match Pattern::new(&p) {
                                Ok(pattern) => Some(PatternTemplate::Fixed(pattern)),
                                Err(e) => {
                                    warn!("skipping invalid {kind} pattern '{p}' for {logical}: {e}");
                                    None
                                }
                            }
                        }
                    })
                    .collect();
                (logical, compiled)
            })
            .collect();
        KindTable { direct, fallback }
    }

    fn table(&self, kind: GridKind) -> &KindTable {
        match kind {
            GridKind::Surface => &self.surface,
            GridKind::Isobaric => &self.isobaric,
        }
    }

    /// Resolves a logical variable to the physical field name present in the
    /// dataset, or `None` when neither the direct mapping nor any fallback
    /// pattern matches a field.
    ///
    /// Derived variables (wind speed/direction) never resolve; they are
    /// computed from the wind components downstream.
    pub fn resolve(
        &self,
        dataset: &GridDataset,
        variable: Variable,
        kind: GridKind,
        level: Option<u32>,
    ) -> Option<String> {
        if variable.is_derived() {
            return None;
        }
        let logical = variable.logical_name();
        let table = self.table(kind);

        if let Some(template) = table.direct.get(logical) {
            if let Some(name) = substitute_level(template, level) {
                if dataset.has_field(&name) {
                    return Some(name);
                }
            }
        }

        self.resolve_by_pattern(dataset, table, logical, level)
    }

    fn resolve_by_pattern(
        &self,
        dataset: &GridDataset,
        table: &KindTable,
        logical: &str,
        level: Option<u32>,
    ) -> Option<String> {
        let patterns = table.fallback.get(logical)?;

        // Field name iteration order is not defined by the dataset; sort so
        // "first glob match" is deterministic.
        let mut names: Vec<&str> = dataset.field_names().collect();
        names.sort_unstable();

        for template in patterns {
            let leveled;
            let pattern = match template {
                PatternTemplate::Fixed(p) => p,
                PatternTemplate::Leveled(t) => {
                    let substituted = substitute_level(t, level)?;
                    leveled = Pattern::new(&substituted).ok()?;
                    &leveled
                }
            };
            if let Some(name) = names.iter().find(|n| pattern.matches(n)) {
                info!("pattern match resolved {logical} -> {name}");
                return Some(name.to_string());
            }
        }
        None
    }
}

/// Substitutes the pressure level into a name template. A template that needs
/// a level but was given none cannot resolve.
fn substitute_level(template: &str, level: Option<u32>) -> Option<String> {
    if template.contains(LEVEL_PLACEHOLDER) {
        let level = level?;
        Some(template.replace(LEVEL_PLACEHOLDER, &level.to_string()))
    } else {
        Some(template.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::dataset::GridField;
    use chrono::{TimeZone, Utc};
    use ndarray::{Array2, Array3};

    fn dataset_with(fields: &[&str]) -> GridDataset {
        let lat = Array2::from_shape_fn((3, 3), |(y, _)| 35.0 + y as f64 * 0.05);
        let lon = Array2::from_shape_fn((3, 3), |(_, x)| 139.0 + x as f64 * 0.0625);
        let times = vec![Utc.with_ymd_and_hms(2024, 7, 3, 0, 0, 0).unwrap()];
        let mut ds = GridDataset::new(lat, lon, times).unwrap();
        for name in fields {
            ds.insert_field(name, GridField::timed(Array3::zeros((1, 3, 3)), None))
                .unwrap();
        }
        ds
    }

    #[test]
    fn direct_lookup_resolves_surface_fields() {
        let ds = dataset_with(&["TMP_1D5maboveground", "PRMSL_meansealevel"]);
        let mapping = VariableMapping::default();
        assert_eq!(
            mapping.resolve(&ds, Variable::AirTemperature, GridKind::Surface, None),
            Some("TMP_1D5maboveground".to_string())
        );
        assert_eq!(
            mapping.resolve(&ds, Variable::SurfacePressure, GridKind::Surface, None),
            Some("PRMSL_meansealevel".to_string())
        );
    }

    #[test]
    fn level_placeholder_is_substituted() {
        let ds = dataset_with(&["TMP_500mb", "HGT_500mb"]);
        let mapping = VariableMapping::default();
        assert_eq!(
            mapping.resolve(&ds, Variable::AirTemperature, GridKind::Isobaric, Some(500)),
            Some("TMP_500mb".to_string())
        );
        // Missing level means a leveled template cannot resolve.
        assert_eq!(
            mapping.resolve(&ds, Variable::AirTemperature, GridKind::Isobaric, None),
            None
        );
    }

    #[test]
    fn glob_fallback_finds_renamed_fields() {
        let ds = dataset_with(&["TMP_2maboveground"]);
        let mapping = VariableMapping::from_json(
            r#"{
                "surface": {"air_temperature": "TMP_1D5maboveground"},
                "fallback_patterns": {
                    "surface": {"air_temperature": ["TMP_*aboveground"]}
                }
            }"#,
        )
        .unwrap();
        assert_eq!(
            mapping.resolve(&ds, Variable::AirTemperature, GridKind::Surface, None),
            Some("TMP_2maboveground".to_string())
        );
    }

    #[test]
    fn leveled_fallback_patterns_substitute_before_matching() {
        let ds = dataset_with(&["TEMP_ISOBARIC_850", "TEMP_ISOBARIC_500"]);
        let mapping = VariableMapping::from_json(
            r#"{
                "fallback_patterns": {
                    "isobaric": {"air_temperature": ["TEMP_ISOBARIC_{level}"]}
                }
            }"#,
        )
        .unwrap();
        assert_eq!(
            mapping.resolve(&ds, Variable::AirTemperature, GridKind::Isobaric, Some(850)),
            Some("TEMP_ISOBARIC_850".to_string())
        );
        assert_eq!(
            mapping.resolve(&ds, Variable::AirTemperature, GridKind::Isobaric, Some(300)),
            None
        );
    }

    #[test]
    fn unresolvable_variable_is_none_not_an_error() {
        let ds = dataset_with(&["UGRD_10maboveground"]);
        let mapping = VariableMapping::default();
        assert_eq!(
            mapping.resolve(&ds, Variable::RelativeHumidity, GridKind::Surface, None),
            None
        );
    }

    #[test]
    fn derived_variables_never_resolve() {
        let ds = dataset_with(&["UGRD_10maboveground", "VGRD_10maboveground"]);
        let mapping = VariableMapping::default();
        assert_eq!(
            mapping.resolve(&ds, Variable::WindSpeed, GridKind::Surface, None),
            None
        );
    }
}
