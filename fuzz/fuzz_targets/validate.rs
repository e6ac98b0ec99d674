#![no_main]

use libfuzzer_sys::fuzz_target;
use spidcert_lib::{validate_bytes, Format, Sector, ValidateOptions};

fuzz_target!(|data: &[u8]| {
    // Decoding may fail; once decoded, validation and every renderer must not
    // panic.
    for sector in [Sector::Public, Sector::Private] {
        let opts = ValidateOptions::new(sector).at_time(0);
        if let Ok(report) = validate_bytes("fuzz", data, &opts) {
            for format in Format::ALL {
                let _ = format.render(&report);
            }
        }
    }
});
