use tandem_rs::geo::{ConversionStatus, RawCoord, convert_katech};
use tandem_rs::model::GeoPoint;

#[test]
fn large_pair_is_treated_as_prescaled_wgs84() {
    let conversion = convert_katech(15_000_000.0, 4_000_000.0);
    assert_eq!(conversion.status, ConversionStatus::PreScaled);
    assert!((conversion.point.latitude - 0.4).abs() < 1e-12);
    assert!((conversion.point.longitude - 1.5).abs() < 1e-12);
}

#[test]
fn grid_pair_goes_through_the_projection() {
    let conversion = convert_katech(300_000.0, 550_000.0);
    assert_eq!(conversion.status, ConversionStatus::Projected);
    let GeoPoint {
        latitude,
        longitude,
    } = conversion.point;
    assert!((37.4..37.7).contains(&latitude), "latitude {latitude}");
    assert!((126.7..127.0).contains(&longitude), "longitude {longitude}");
    assert!((latitude - 37.5468).abs() < 1e-3);
    assert!((longitude - 126.8661).abs() < 1e-3);
}

#[test]
fn seoul_city_hall_lands_where_expected() {
    let point = convert_katech(309_947.0, 552_092.0).ok().unwrap();
    assert!((point.latitude - 37.5667).abs() < 1e-3);
    assert!((point.longitude - 126.9784).abs() < 1e-3);
}

#[test]
fn numeric_strings_are_accepted() {
    let from_text = convert_katech("300000", " 550000 ");
    let from_number = convert_katech(300_000.0, 550_000.0);
    assert_eq!(from_text, from_number);
}

#[test]
fn provider_strings_above_threshold_are_rescaled() {
    let conversion = convert_katech("1269783882", "375666103");
    assert_eq!(conversion.status, ConversionStatus::PreScaled);
    assert!((conversion.point.latitude - 37.5666103).abs() < 1e-9);
    assert!((conversion.point.longitude - 126.9783882).abs() < 1e-9);
}

#[test]
fn malformed_input_fails_explicitly_at_origin() {
    let conversion = convert_katech("not-a-number", "550000");
    assert!(matches!(conversion.status, ConversionStatus::Failed(_)));
    assert_eq!(conversion.point, GeoPoint::ORIGIN);
    assert!(!conversion.is_ok());
    assert_eq!(conversion.ok(), None);

    let conversion = convert_katech(RawCoord::Number(f64::NAN), RawCoord::Number(1.0));
    assert!(!conversion.is_ok());
}

#[test]
fn raw_coords_deserialize_from_numbers_and_strings() {
    let pair: Vec<RawCoord> = serde_json::from_str(r#"[300000, "550000"]"#).unwrap();
    assert_eq!(pair[0], RawCoord::Number(300_000.0));
    assert_eq!(pair[1], RawCoord::Text("550000".to_string()));
}
