//! ISO 3166-1 alpha-2 country codes, backed by the `isocountry` registry.

use isocountry::CountryCode;

/// A country from the ISO 3166-1 registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Country {
    pub alpha2: &'static str,
    pub alpha3: &'static str,
    /// ISO 3166-1 short name.
    pub name: &'static str,
}

impl From<CountryCode> for Country {
    fn from(code: CountryCode) -> Self {
        Self {
            alpha2: code.alpha2(),
            alpha3: code.alpha3(),
            name: code.name(),
        }
    }
}

/// Look up a country by its two-letter code, ignoring ASCII case.
pub fn lookup(code: &str) -> Option<Country> {
    if code.len() != 2 {
        return None;
    }
    CountryCode::for_alpha2(&code.to_ascii_uppercase())
        .ok()
        .map(Country::from)
}
