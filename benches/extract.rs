use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lanal_extract::{
    GridDataset, GridField, GridSelector, LatLon, PointExtractor, SpatialMethod, TimeSelection,
};
use ndarray::{Array2, Array3};

const ROWS: usize = 200;
const COLS: usize = 240;

fn dataset() -> GridDataset {
    let lat = Array2::from_shape_fn((ROWS, COLS), |(y, x)| {
        40.0 - y as f64 * 0.05 + x as f64 * 0.001
    });
    let lon = Array2::from_shape_fn((ROWS, COLS), |(y, x)| {
        135.0 + x as f64 * 0.0625 + y as f64 * 0.001
    });
    let times: Vec<_> = (0..24)
        .map(|h| Utc.with_ymd_and_hms(2024, 7, 3, h, 0, 0).unwrap())
        .collect();
    let mut ds = GridDataset::new(lat, lon, times).unwrap();
    let temp = Array3::from_shape_fn((24, ROWS, COLS), |(t, y, x)| {
        288.15 + t as f64 * 0.5 - y as f64 * 0.01 + x as f64 * 0.005
    });
    ds.insert_field("TMP_1D5maboveground", GridField::timed(temp, None))
        .unwrap();
    ds.insert_field(
        "UGRD_10maboveground",
        GridField::timed(Array3::from_elem((24, ROWS, COLS), 3.0), None),
    )
    .unwrap();
    ds.insert_field(
        "VGRD_10maboveground",
        GridField::timed(Array3::from_elem((24, ROWS, COLS), 4.0), None),
    )
    .unwrap();
    ds
}

fn bench_extract(c: &mut Criterion) {
    let ds = dataset();
    let selector = GridSelector::new(&ds);
    c.bench_function("nearest_cell", |b| {
        b.iter(|| selector.nearest(black_box(36.5), black_box(139.5)))
    });
    c.bench_function("within_radius_20km", |b| {
        b.iter(|| {
            selector
                .within_radius(black_box(36.5), black_box(139.5), black_box(20.0))
                .unwrap()
        })
    });

    let extractor = PointExtractor::new(dataset()).unwrap();
    c.bench_function("surface_extraction_day", |b| {
        b.iter(|| {
            extractor
                .extract_surface()
                .location(black_box(LatLon(36.5, 139.5)))
                .time(TimeSelection::Range {
                    start: Utc.with_ymd_and_hms(2024, 7, 3, 0, 0, 0).unwrap(),
                    end: Utc.with_ymd_and_hms(2024, 7, 3, 23, 0, 0).unwrap(),
                })
                .method(SpatialMethod::KNearestMean { k: 4 })
                .call()
                .unwrap()
        })
    });
}

criterion_group!(benches, bench_extract);
criterion_main!(benches);
