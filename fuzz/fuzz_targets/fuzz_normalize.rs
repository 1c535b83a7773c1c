#![no_main]
use eess_prices::fuel::FuelType;
use eess_prices::normalize::{normalize, parse_decimal};
use eess_prices::upstream::client::decode_document;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = parse_decimal(text);
    }

    // Whatever decodes must normalize into positive prices and sane coordinates
    let Ok(doc) = decode_document(data) else {
        return;
    };
    for fuel in FuelType::ALL {
        for record in normalize(&doc, fuel) {
            assert!(record.price.is_finite() && record.price > 0.0);
            assert!((-90.0..=90.0).contains(&record.latitude()));
            assert!((-180.0..=180.0).contains(&record.longitude()));
        }
    }
});
