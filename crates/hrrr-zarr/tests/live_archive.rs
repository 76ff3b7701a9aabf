//! Queries against the public HRRR archive. Needs network access.
//!
//! Run with `cargo test -p hrrr-zarr --test live_archive -- --ignored`.

use chrono::{TimeZone, Utc};
use hrrr_zarr::{ArchiveConfig, PointSeries, Variable};

#[tokio::test]
#[ignore]
async fn test_live_forecast_series() {
    test_utils::init_tracing();
    let series = PointSeries::from_config(ArchiveConfig::default()).unwrap();
    let issue = Utc.with_ymd_and_hms(2021, 1, 1, 7, 0, 0).unwrap();

    let values = series
        .fetch_forecast_series(&Variable::new("surface", "TMP"), issue, 40.7608, -111.8910)
        .await
        .unwrap();

    assert_eq!(values.len(), 18);
    // Surface temperature in Kelvin.
    assert!(values.iter().all(|t| (200.0..330.0).contains(t)));
}

#[tokio::test]
#[ignore]
async fn test_live_analysis_series() {
    test_utils::init_tracing();
    let series = PointSeries::from_config(ArchiveConfig::default()).unwrap();
    let start = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2021, 1, 1, 6, 0, 0).unwrap();

    let values = series
        .fetch_analysis_series(&Variable::new("surface", "TMP"), start, end, 40.7608, -111.8910)
        .await
        .unwrap();

    assert_eq!(values.len(), 6);
}
