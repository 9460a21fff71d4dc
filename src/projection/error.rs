use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("Latitude {0}° is at or beyond a pole; the Lambert transform is singular there")]
    PoleLatitude(f64),

    #[error("Standard parallels ({sp1}°, {sp2}°) yield a degenerate cone constant (n = {n})")]
    DegenerateCone { sp1: f64, sp2: f64, n: f64 },
}
