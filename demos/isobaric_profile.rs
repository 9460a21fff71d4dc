use chrono::{TimeZone, Utc};
use lanal_extract::{
    ExtractError, GridDataset, GridField, GridKind, LatLon, PointExtractor, TimeSelection,
    Variable,
};
use ndarray::{Array2, Array3};
use std::env;

fn main() -> Result<(), ExtractError> {
    configure_polars_display();
    let extractor = PointExtractor::new(demo_dataset())?;
    let levels = vec![850, 700, 500, 300];

    // Probe availability first, like a service validating a request.
    let checks = extractor.check_variables(
        GridKind::Isobaric,
        &[Variable::AirTemperature, Variable::GeopotentialHeight],
        &levels,
    );
    for check in &checks {
        match (&check.resolved, check.level) {
            (Some(field), Some(hpa)) => println!("{} @ {hpa} hPa -> {field}", check.variable),
            (None, Some(hpa)) => println!("{} @ {hpa} hPa -> unavailable", check.variable),
            _ => {}
        }
    }

    let result = extractor
        .extract_isobaric()
        .location(LatLon(35.05, 139.0))
        .levels(levels)
        .time(TimeSelection::Instant(
            Utc.with_ymd_and_hms(2024, 7, 3, 12, 0, 0).unwrap(),
        ))
        .call()?;

    println!("{}", result.table);
    for skip in &result.skipped {
        if let Some(hpa) = skip.level {
            println!("skipped {} at {hpa} hPa", skip.variable);
        }
    }

    Ok(())
}

/// A synthetic dataset with three pressure levels. 300 hPa is deliberately
/// absent so the per-level skip path shows up in the output.
fn demo_dataset() -> GridDataset {
    let (rows, cols) = (8, 8);
    let lat = Array2::from_shape_fn((rows, cols), |(y, _)| 35.2 - y as f64 * 0.05);
    let lon = Array2::from_shape_fn((rows, cols), |(_, x)| 138.8 + x as f64 * 0.0625);
    let times = vec![Utc.with_ymd_and_hms(2024, 7, 3, 12, 0, 0).unwrap()];
    let mut ds = GridDataset::new(lat, lon, times).unwrap();

    for (hpa, temp_k, height_gpm, u, v) in [
        (850, 285.65, 1_470.0, 5.0, 2.0),
        (700, 277.15, 3_020.0, 9.0, 4.0),
        (500, 252.65, 5_870.0, 18.0, 7.0),
    ] {
        ds.insert_field(
            &format!("TMP_{hpa}mb"),
            GridField::timed(Array3::from_elem((1, rows, cols), temp_k), Some("K")),
        )
        .unwrap();
        ds.insert_field(
            &format!("HGT_{hpa}mb"),
            GridField::timed(Array3::from_elem((1, rows, cols), height_gpm), Some("gpm")),
        )
        .unwrap();
        ds.insert_field(
            &format!("UGRD_{hpa}mb"),
            GridField::timed(Array3::from_elem((1, rows, cols), u), Some("m/s")),
        )
        .unwrap();
        ds.insert_field(
            &format!("VGRD_{hpa}mb"),
            GridField::timed(Array3::from_elem((1, rows, cols), v), Some("m/s")),
        )
        .unwrap();
        ds.insert_field(
            &format!("RH_{hpa}mb"),
            GridField::timed(Array3::from_elem((1, rows, cols), 0.55), None),
        )
        .unwrap();
    }
    ds
}

fn configure_polars_display() {
    // show every column
    env::set_var("POLARS_FMT_MAX_COLS", "-1");
    env::set_var("POLARS_FMT_MAX_ROWS", "40");
}
