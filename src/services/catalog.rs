use serde::Serialize;

/// A well-known cruise port in the built-in reference catalog. Read-only
/// and shared by every device; used for autocomplete-style search when a
/// client adds a port call.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogPort {
    pub name: &'static str,
    pub country: &'static str,
    pub region: &'static str,
    pub latitude: f64,
    pub longitude: f64,
}

pub const DEFAULT_SEARCH_LIMIT: usize = 20;

pub const CRUISE_PORTS: &[CatalogPort] = &[
    // Mediterranean
    CatalogPort { name: "Barcelona", country: "Spain", region: "Mediterranean", latitude: 41.38, longitude: 2.18 },
    CatalogPort { name: "Palma de Mallorca", country: "Spain", region: "Mediterranean", latitude: 39.57, longitude: 2.65 },
    CatalogPort { name: "Valencia", country: "Spain", region: "Mediterranean", latitude: 39.47, longitude: -0.38 },
    CatalogPort { name: "Marseille", country: "France", region: "Mediterranean", latitude: 43.30, longitude: 5.37 },
    CatalogPort { name: "Cannes", country: "France", region: "Mediterranean", latitude: 43.55, longitude: 7.02 },
    CatalogPort { name: "Civitavecchia", country: "Italy", region: "Mediterranean", latitude: 42.09, longitude: 11.79 },
    CatalogPort { name: "Naples", country: "Italy", region: "Mediterranean", latitude: 40.84, longitude: 14.25 },
    CatalogPort { name: "Livorno", country: "Italy", region: "Mediterranean", latitude: 43.55, longitude: 10.31 },
    CatalogPort { name: "Venice", country: "Italy", region: "Mediterranean", latitude: 45.44, longitude: 12.32 },
    CatalogPort { name: "Dubrovnik", country: "Croatia", region: "Mediterranean", latitude: 42.65, longitude: 18.09 },
    CatalogPort { name: "Kotor", country: "Montenegro", region: "Mediterranean", latitude: 42.42, longitude: 18.77 },
    CatalogPort { name: "Santorini", country: "Greece", region: "Mediterranean", latitude: 36.39, longitude: 25.46 },
    CatalogPort { name: "Mykonos", country: "Greece", region: "Mediterranean", latitude: 37.45, longitude: 25.33 },
    CatalogPort { name: "Piraeus", country: "Greece", region: "Mediterranean", latitude: 37.94, longitude: 23.65 },
    CatalogPort { name: "Kusadasi", country: "Turkey", region: "Mediterranean", latitude: 37.86, longitude: 27.26 },
    CatalogPort { name: "Valletta", country: "Malta", region: "Mediterranean", latitude: 35.90, longitude: 14.51 },
    CatalogPort { name: "Lisbon", country: "Portugal", region: "Mediterranean", latitude: 38.72, longitude: -9.14 },
    // Caribbean
    CatalogPort { name: "Nassau", country: "Bahamas", region: "Caribbean", latitude: 25.08, longitude: -77.34 },
    CatalogPort { name: "Cozumel", country: "Mexico", region: "Caribbean", latitude: 20.51, longitude: -86.95 },
    CatalogPort { name: "George Town", country: "Cayman Islands", region: "Caribbean", latitude: 19.29, longitude: -81.38 },
    CatalogPort { name: "Ocho Rios", country: "Jamaica", region: "Caribbean", latitude: 18.41, longitude: -77.10 },
    CatalogPort { name: "San Juan", country: "Puerto Rico", region: "Caribbean", latitude: 18.47, longitude: -66.12 },
    CatalogPort { name: "Philipsburg", country: "Sint Maarten", region: "Caribbean", latitude: 18.03, longitude: -63.05 },
    CatalogPort { name: "Bridgetown", country: "Barbados", region: "Caribbean", latitude: 13.10, longitude: -59.62 },
    CatalogPort { name: "Willemstad", country: "Curacao", region: "Caribbean", latitude: 12.11, longitude: -68.93 },
    CatalogPort { name: "Roseau", country: "Dominica", region: "Caribbean", latitude: 15.30, longitude: -61.39 },
    CatalogPort { name: "Basseterre", country: "Saint Kitts and Nevis", region: "Caribbean", latitude: 17.30, longitude: -62.73 },
    // Northern Europe
    CatalogPort { name: "Copenhagen", country: "Denmark", region: "Northern Europe", latitude: 55.69, longitude: 12.60 },
    CatalogPort { name: "Stockholm", country: "Sweden", region: "Northern Europe", latitude: 59.33, longitude: 18.07 },
    CatalogPort { name: "Helsinki", country: "Finland", region: "Northern Europe", latitude: 60.17, longitude: 24.95 },
    CatalogPort { name: "Tallinn", country: "Estonia", region: "Northern Europe", latitude: 59.44, longitude: 24.75 },
    CatalogPort { name: "Bergen", country: "Norway", region: "Northern Europe", latitude: 60.39, longitude: 5.32 },
    CatalogPort { name: "Geiranger", country: "Norway", region: "Northern Europe", latitude: 62.10, longitude: 7.21 },
    CatalogPort { name: "Reykjavik", country: "Iceland", region: "Northern Europe", latitude: 64.15, longitude: -21.94 },
    CatalogPort { name: "Southampton", country: "United Kingdom", region: "Northern Europe", latitude: 50.90, longitude: -1.40 },
    CatalogPort { name: "Amsterdam", country: "Netherlands", region: "Northern Europe", latitude: 52.38, longitude: 4.90 },
    // Alaska
    CatalogPort { name: "Juneau", country: "United States", region: "Alaska", latitude: 58.30, longitude: -134.42 },
    CatalogPort { name: "Ketchikan", country: "United States", region: "Alaska", latitude: 55.34, longitude: -131.65 },
    CatalogPort { name: "Skagway", country: "United States", region: "Alaska", latitude: 59.46, longitude: -135.31 },
    CatalogPort { name: "Sitka", country: "United States", region: "Alaska", latitude: 57.05, longitude: -135.33 },
    // Asia & Pacific
    CatalogPort { name: "Singapore", country: "Singapore", region: "Asia", latitude: 1.26, longitude: 103.85 },
    CatalogPort { name: "Hong Kong", country: "China", region: "Asia", latitude: 22.29, longitude: 114.17 },
    CatalogPort { name: "Yokohama", country: "Japan", region: "Asia", latitude: 35.45, longitude: 139.64 },
    CatalogPort { name: "Sydney", country: "Australia", region: "Pacific", latitude: -33.86, longitude: 151.21 },
    CatalogPort { name: "Auckland", country: "New Zealand", region: "Pacific", latitude: -36.84, longitude: 174.77 },
];

/// Case-insensitive search over name, country and region, optionally
/// narrowed to one region.
pub fn search(
    query: Option<&str>,
    region: Option<&str>,
    limit: usize,
) -> Vec<&'static CatalogPort> {
    let query = query.map(str::to_lowercase).filter(|q| !q.is_empty());
    CRUISE_PORTS
        .iter()
        .filter(|port| match region {
            None => true,
            Some(region) => port.region.eq_ignore_ascii_case(region),
        })
        .filter(|port| match &query {
            None => true,
            Some(q) => {
                port.name.to_lowercase().contains(q)
                    || port.country.to_lowercase().contains(q)
                    || port.region.to_lowercase().contains(q)
            }
        })
        .take(limit)
        .collect()
}
