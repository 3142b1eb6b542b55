use tandem_rs::place::{MAX_CANDIDATES, parse_local_response, strip_markup};

#[test]
fn response_is_cleaned_and_capped() {
    let items: Vec<String> = (0..7)
        .map(|i| {
            format!(
                r#"{{"title":"<b>Cafe</b> &amp; Bakery {i}","category":"카페,디저트","address":"서울 종로구 {i}","roadAddress":"","mapx":"309947","mapy":"552092"}}"#
            )
        })
        .collect();
    let body = format!(r#"{{"items":[{}]}}"#, items.join(","));

    let places = parse_local_response(&body).unwrap();

    assert_eq!(places.len(), MAX_CANDIDATES);
    assert_eq!(places[0].title, "Cafe & Bakery 0");
    assert_eq!(places[0].address, "서울 종로구 0");
    let point = places[0].point.unwrap();
    assert!((point.latitude - 37.5667).abs() < 1e-3);
    assert!((point.longitude - 126.9784).abs() < 1e-3);
}

#[test]
fn unconvertible_coordinates_leave_point_empty() {
    let body = r#"{"items":[{"title":"Somewhere","address":"a","roadAddress":"b","mapx":"","mapy":"552092"}]}"#;
    let places = parse_local_response(body).unwrap();
    assert_eq!(places[0].address, "b");
    assert!(places[0].point.is_none());
}

#[test]
fn empty_and_malformed_bodies() {
    assert!(parse_local_response(r#"{"items":[]}"#).unwrap().is_empty());
    assert!(parse_local_response(r#"{}"#).unwrap().is_empty());
    assert!(parse_local_response("not json").is_err());
}

#[test]
fn nested_markup_is_removed() {
    assert_eq!(strip_markup("<b><i>Han</i> River</b>"), "Han River");
    assert_eq!(strip_markup("&quot;Bar&quot;"), "\"Bar\"");
}
