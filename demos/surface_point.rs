use chrono::{TimeZone, Utc};
use lanal_extract::{
    ExtractError, GridDataset, GridField, LatLon, PointExtractor, SpatialMethod, Variable,
};
use ndarray::{Array2, Array3};
use std::env;

fn main() -> Result<(), ExtractError> {
    configure_polars_display();
    let extractor = PointExtractor::new(demo_dataset())?;

    let result = extractor
        .extract_surface()
        .location(LatLon(35.05, 139.0))
        .variables(vec![
            Variable::AirTemperature,
            Variable::RelativeHumidity,
            Variable::WindSpeed,
            Variable::WindDirection,
        ])
        .method(SpatialMethod::RadiusMean { radius_km: 15.0 })
        .call()?;

    println!("{}", result.table);
    println!("cells used: {}", result.grid_points.len());
    for point in result.grid_points.iter() {
        println!(
            "  [{}, {}] at ({:.3}, {:.3}), {:.2} km away",
            point.row, point.col, point.latitude, point.longitude, point.distance_km
        );
    }

    Ok(())
}

/// A small synthetic hourly grid around (35°N, 139°E). A real caller would
/// fill the dataset from decoded GRIB2 or NetCDF arrays instead.
fn demo_dataset() -> GridDataset {
    let (rows, cols, steps) = (12, 12, 6);
    let lat = Array2::from_shape_fn((rows, cols), |(y, x)| {
        35.3 - y as f64 * 0.05 + x as f64 * 0.001
    });
    let lon = Array2::from_shape_fn((rows, cols), |(y, x)| {
        138.7 + x as f64 * 0.0625 + y as f64 * 0.001
    });
    let times: Vec<_> = (0..steps as u32)
        .map(|h| Utc.with_ymd_and_hms(2024, 7, 3, h, 0, 0).unwrap())
        .collect();
    let mut ds = GridDataset::new(lat, lon, times).unwrap();

    let temp = Array3::from_shape_fn((steps, rows, cols), |(t, y, _)| {
        288.15 + t as f64 * 0.8 - y as f64 * 0.05
    });
    ds.insert_field("TMP_1D5maboveground", GridField::timed(temp, Some("K")))
        .unwrap();
    let rh = Array3::from_shape_fn((steps, rows, cols), |(t, _, _)| 0.72 - t as f64 * 0.02);
    ds.insert_field("RH_1D5maboveground", GridField::timed(rh, None))
        .unwrap();
    ds.insert_field(
        "UGRD_10maboveground",
        GridField::timed(Array3::from_elem((steps, rows, cols), 3.0), Some("m/s")),
    )
    .unwrap();
    ds.insert_field(
        "VGRD_10maboveground",
        GridField::timed(Array3::from_elem((steps, rows, cols), 4.0), Some("m/s")),
    )
    .unwrap();
    ds
}

fn configure_polars_display() {
    // show every column
    env::set_var("POLARS_FMT_MAX_COLS", "-1");
    // show 20 rows
    env::set_var("POLARS_FMT_MAX_ROWS", "20");
}
