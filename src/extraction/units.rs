//! Per-variable unit normalization applied before rows are assembled.
//!
//! Declared units metadata wins when the source carried it. Without metadata,
//! magnitude heuristics apply: a temperature averaging above 100 is taken as
//! Kelvin, humidity peaking at or below 1 as a fraction, pressure averaging
//! above 10000 as Pa. A field with unusual but valid values can in principle
//! be misclassified by the heuristics; callers that know their units should
//! declare them on the field.

use crate::variables::variable::Variable;

/// Converts extracted values in place to the output units for `variable`:
/// temperature to °C, humidity to %, pressure to hPa; wind components and
/// geopotential height pass through.
pub(crate) fn convert_units(variable: Variable, declared_units: Option<&str>, values: &mut [f64]) {
    match variable {
        Variable::AirTemperature => {
            let kelvin = match declared_units {
                Some("K") => true,
                Some(_) => false,
                None => nan_mean(values) > 100.0,
            };
            if kelvin {
                for v in values.iter_mut() {
                    *v -= 273.15;
                }
            }
        }
        Variable::RelativeHumidity => {
            let fraction = match declared_units {
                Some("%") => false,
                Some("1") | Some("fraction") => true,
                _ => nan_max(values) <= 1.0,
            };
            if fraction {
                for v in values.iter_mut() {
                    *v *= 100.0;
                }
            }
        }
        Variable::SurfacePressure => {
            let pascal = match declared_units {
                Some("Pa") => true,
                Some(_) => false,
                None => nan_mean(values) > 10000.0,
            };
            if pascal {
                for v in values.iter_mut() {
                    *v /= 100.0;
                }
            }
        }
        // m/s and gpm are already the output units; derived wind quantities
        // are computed post-conversion.
        Variable::UWind
        | Variable::VWind
        | Variable::GeopotentialHeight
        | Variable::WindSpeed
        | Variable::WindDirection => {}
    }
}

fn nan_mean(values: &[f64]) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for v in values {
        if !v.is_nan() {
            sum += v;
            count += 1;
        }
    }
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

fn nan_max(values: &[f64]) -> f64 {
    values
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(f64::NEG_INFINITY, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kelvin_detected_by_magnitude_converts_to_celsius() {
        let mut values = vec![288.15, 300.65, f64::NAN];
        convert_units(Variable::AirTemperature, None, &mut values);
        assert!((values[0] - 15.0).abs() < 1e-9);
        assert!((values[1] - 27.5).abs() < 1e-9);
        assert!(values[2].is_nan());
    }

    #[test]
    fn celsius_values_pass_through() {
        let mut values = vec![15.0, 27.5, -3.0];
        let original = values.clone();
        convert_units(Variable::AirTemperature, None, &mut values);
        assert_eq!(values, original);
    }

    #[test]
    fn declared_units_beat_the_heuristic() {
        // Mean below 100, but declared Kelvin: convert anyway.
        let mut values = vec![50.0, 60.0];
        convert_units(Variable::AirTemperature, Some("K"), &mut values);
        assert_eq!(values, vec![50.0 - 273.15, 60.0 - 273.15]);

        // Mean above 100, but declared Celsius: leave alone.
        let mut hot = vec![150.0, 160.0];
        convert_units(Variable::AirTemperature, Some("degC"), &mut hot);
        assert_eq!(hot, vec![150.0, 160.0]);
    }

    #[test]
    fn fractional_humidity_scales_to_percent() {
        let mut values = vec![0.45, 0.99, 1.0];
        convert_units(Variable::RelativeHumidity, None, &mut values);
        assert_eq!(values, vec![45.0, 99.0, 100.0]);

        let mut percent = vec![45.0, 99.0];
        convert_units(Variable::RelativeHumidity, None, &mut percent);
        assert_eq!(percent, vec![45.0, 99.0]);
    }

    #[test]
    fn pascal_pressure_becomes_hectopascal() {
        let mut values = vec![101_325.0, 98_200.0];
        convert_units(Variable::SurfacePressure, None, &mut values);
        assert_eq!(values, vec![1013.25, 982.0]);

        let mut already_hpa = vec![1013.25, 982.0];
        convert_units(Variable::SurfacePressure, None, &mut already_hpa);
        assert_eq!(already_hpa, vec![1013.25, 982.0]);

        let mut declared = vec![1013.25];
        convert_units(Variable::SurfacePressure, Some("hPa"), &mut declared);
        assert_eq!(declared, vec![1013.25]);
    }

    #[test]
    fn wind_and_height_are_untouched() {
        let mut values = vec![12.5, -8.0];
        convert_units(Variable::UWind, None, &mut values);
        assert_eq!(values, vec![12.5, -8.0]);
        convert_units(Variable::GeopotentialHeight, Some("gpm"), &mut values);
        assert_eq!(values, vec![12.5, -8.0]);
    }
}
