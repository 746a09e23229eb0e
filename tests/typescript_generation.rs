//! TypeScript Generation Tests
//!
//! Validates that decoded ride types can be exported to TypeScript when the
//! tauri feature is enabled.

#[cfg(feature = "tauri")]
#[test]
fn test_ride_types_implement_specta_type() {
    use specta::Type;

    // Compiles only if every exported type derives specta::Type
    fn assert_type<T: Type>() {}

    assert_type::<ridelog::RideRecord>();
    assert_type::<ridelog::RideSummary>();
    assert_type::<ridelog::Summary>();
    assert_type::<ridelog::TrackPointSegment>();
    assert_type::<ridelog::LogPointSegment>();
    assert_type::<ridelog::OffsetAnomaly>();
    assert_type::<ridelog::SampleStream>();
    assert_type::<ridelog::DeviceModel>();
}

#[cfg(not(feature = "tauri"))]
#[test]
fn test_tauri_feature_disabled() {
    // Types still compile without specta::Type
    let _ = ridelog::DeviceModel::Rider20.layout();
}
