//! Static route table: airports, Seoul origins and long-haul destinations.
//!
//! Route class is decided from this table once, when a sample is created.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AirportInfo {
    pub name: &'static str,
    pub city: &'static str,
    pub region: &'static str,
}

const fn airport(name: &'static str, city: &'static str, region: &'static str) -> AirportInfo {
    AirportInfo { name, city, region }
}

/// Known airports keyed by IATA code.
pub const AIRPORTS: &[(&str, AirportInfo)] = &[
    ("ICN", airport("Incheon International Airport", "Seoul", "Korea")),
    ("SEL", airport("Seoul Metropolitan Area", "Seoul", "Korea")),
    ("NRT", airport("Narita International Airport", "Tokyo", "Asia")),
    ("HND", airport("Haneda Airport", "Tokyo", "Asia")),
    ("TYO", airport("Tokyo Metropolitan Area", "Tokyo", "Asia")),
    ("KIX", airport("Kansai International Airport", "Osaka", "Asia")),
    ("OSA", airport("Osaka Metropolitan Area", "Osaka", "Asia")),
    ("FUK", airport("Fukuoka Airport", "Fukuoka", "Asia")),
    ("CTS", airport("New Chitose Airport", "Sapporo", "Asia")),
    ("DAD", airport("Da Nang International Airport", "Da Nang", "Asia")),
    ("BKK", airport("Suvarnabhumi Airport", "Bangkok", "Asia")),
    ("CEB", airport("Mactan-Cebu International Airport", "Cebu", "Asia")),
    ("SIN", airport("Singapore Changi Airport", "Singapore", "Asia")),
    ("BKI", airport("Kota Kinabalu International Airport", "Kota Kinabalu", "Asia")),
    ("CXR", airport("Cam Ranh International Airport", "Nha Trang", "Asia")),
    ("HKG", airport("Hong Kong International Airport", "Hong Kong", "Asia")),
    ("SGN", airport("Tan Son Nhat International Airport", "Ho Chi Minh", "Asia")),
    ("TPE", airport("Taiwan Taoyuan International Airport", "Taipei", "Asia")),
    ("CNX", airport("Chiang Mai International Airport", "Chiang Mai", "Asia")),
    ("ULN", airport("Chinggis Khaan International Airport", "Ulaanbaatar", "Asia")),
    ("HAN", airport("Noi Bai International Airport", "Hanoi", "Asia")),
    ("LAX", airport("Los Angeles International Airport", "Los Angeles", "Americas")),
    ("JFK", airport("John F. Kennedy International Airport", "New York", "Americas")),
    ("SFO", airport("San Francisco International Airport", "San Francisco", "Americas")),
    ("LAS", airport("Harry Reid International Airport", "Las Vegas", "Americas")),
    ("CDG", airport("Charles de Gaulle Airport", "Paris", "Europe")),
    ("LHR", airport("Heathrow Airport", "London", "Europe")),
    ("FCO", airport("Leonardo da Vinci International Airport", "Rome", "Europe")),
    ("BCN", airport("Barcelona Airport", "Barcelona", "Europe")),
    ("FRA", airport("Frankfurt Airport", "Frankfurt", "Europe")),
    ("GUM", airport("Antonio B. Won Pat International Airport", "Guam", "Pacific")),
    ("SPN", airport("Saipan International Airport", "Saipan", "Pacific")),
];

const UNKNOWN_AIRPORT: AirportInfo = airport("Unknown Airport", "Unknown", "Unknown");

/// Departure airports for generated searches.
pub const SEOUL_AIRPORTS: &[&str] = &["ICN", "SEL"];

/// Destinations grouped by region.
pub const DESTINATIONS_BY_REGION: &[(&str, &[&str])] = &[
    (
        "Asia",
        &[
            "NRT", "HND", "TYO", "KIX", "OSA", "FUK", "CTS", "DAD", "BKK", "CEB", "SIN", "BKI",
            "CXR", "HKG", "SGN", "TPE", "CNX", "ULN", "HAN",
        ],
    ),
    ("Americas", &["LAX", "JFK", "SFO", "LAS"]),
    ("Europe", &["CDG", "LHR", "FCO", "BCN", "FRA"]),
    ("Pacific", &["GUM", "SPN"]),
];

/// Destinations whose routes count as long-haul.
pub const LONG_HAUL_DESTINATIONS: &[&str] = &[
    "LAX", "JFK", "SFO", "LAS", "CDG", "LHR", "FCO", "BCN", "FRA", "SIN", "BKI", "CXR", "HKG",
    "SGN", "ULN",
];

pub fn is_long_haul(destination: &str) -> bool {
    LONG_HAUL_DESTINATIONS.contains(&destination)
}

/// Metadata for `code`, or a placeholder for unknown codes.
pub fn airport_info(code: &str) -> AirportInfo {
    AIRPORTS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, info)| *info)
        .unwrap_or(UNKNOWN_AIRPORT)
}

/// Every destination across all regions.
pub fn all_destinations() -> Vec<&'static str> {
    DESTINATIONS_BY_REGION
        .iter()
        .flat_map(|(_, codes)| codes.iter().copied())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_long_haul_lookup() {
        assert!(is_long_haul("LAX"));
        assert!(is_long_haul("SIN"));
        assert!(!is_long_haul("NRT"));
        assert!(!is_long_haul("GUM"));
        assert!(!is_long_haul("lax"));
    }

    #[test]
    fn test_airport_info() {
        assert_eq!(airport_info("CDG").city, "Paris");
        assert_eq!(airport_info("ZZZ").name, "Unknown Airport");
    }

    #[test]
    fn test_destinations_are_known_airports() {
        let all = all_destinations();
        assert_eq!(all.len(), 30);
        for code in all.iter().chain(SEOUL_AIRPORTS) {
            assert_ne!(airport_info(code).name, "Unknown Airport", "{} missing", code);
        }
        for code in LONG_HAUL_DESTINATIONS {
            assert!(all.contains(code));
        }
    }
}
