//! Logical physical-quantity identifiers and the grid kinds they live on.

use std::fmt;

/// Whether a variable is sampled at the surface or on fixed pressure levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GridKind {
    /// Near-surface fields (screen-level temperature, 10 m wind, MSL pressure).
    Surface,
    /// Fields on isobaric (fixed pressure, hPa) surfaces.
    Isobaric,
}

impl GridKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GridKind::Surface => "surface",
            GridKind::Isobaric => "isobaric",
        }
    }
}

impl fmt::Display for GridKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A logical physical quantity, independent of the dataset's field naming.
///
/// The base variables map to physical fields through a [`crate::VariableMapping`];
/// [`Variable::WindSpeed`] and [`Variable::WindDirection`] are derived from the
/// wind components after extraction and never resolve to a field themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variable {
    AirTemperature,
    RelativeHumidity,
    /// Eastward wind component (positive toward east), m/s.
    UWind,
    /// Northward wind component (positive toward north), m/s.
    VWind,
    SurfacePressure,
    GeopotentialHeight,
    /// Derived: √(u² + v²).
    WindSpeed,
    /// Derived: meteorological direction the wind blows *from*, 0° = north, clockwise.
    WindDirection,
}

impl Variable {
    /// The logical name used in mapping tables and configuration.
    pub fn logical_name(&self) -> &'static str {
        match self {
            Variable::AirTemperature => "air_temperature",
            Variable::RelativeHumidity => "relative_humidity",
            Variable::UWind => "u_wind",
            Variable::VWind => "v_wind",
            Variable::SurfacePressure => "surface_pressure",
            Variable::GeopotentialHeight => "geopotential_height",
            Variable::WindSpeed => "wind_speed",
            Variable::WindDirection => "wind_direction",
        }
    }

    /// Whether this quantity is computed from other variables rather than
    /// resolved to a physical field.
    pub fn is_derived(&self) -> bool {
        matches!(self, Variable::WindSpeed | Variable::WindDirection)
    }

    /// The output column name carrying this quantity, post unit conversion.
    ///
    /// Surface and isobaric temperature use the conventional distinct short
    /// names (`tas_C` screen-level, `ta_C` on pressure surfaces).
    pub fn column_name(&self, kind: GridKind) -> &'static str {
        match self {
            Variable::AirTemperature => match kind {
                GridKind::Surface => "tas_C",
                GridKind::Isobaric => "ta_C",
            },
            Variable::RelativeHumidity => "rh_%",
            Variable::UWind => "u_ms",
            Variable::VWind => "v_ms",
            Variable::SurfacePressure => "ps_hPa",
            Variable::GeopotentialHeight => "z_gpm",
            Variable::WindSpeed => "wind_speed",
            Variable::WindDirection => "wind_direction",
        }
    }

    /// The default variable set extracted for a grid kind when the caller does
    /// not name one.
    pub fn defaults(kind: GridKind) -> Vec<Variable> {
        match kind {
            GridKind::Surface => vec![
                Variable::AirTemperature,
                Variable::RelativeHumidity,
                Variable::UWind,
                Variable::VWind,
                Variable::SurfacePressure,
            ],
            GridKind::Isobaric => vec![
                Variable::AirTemperature,
                Variable::RelativeHumidity,
                Variable::UWind,
                Variable::VWind,
                Variable::GeopotentialHeight,
            ],
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.logical_name())
    }
}
