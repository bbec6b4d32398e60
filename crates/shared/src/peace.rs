//! Sample peace tables. One place for every hardcoded country figure the site
//! shows, with a single lookup per table.
use serde_json::{json, Map, Value};

use crate::models::{Feature, FeatureCollection, PeaceDataRecord, PeaceMap, PeaceVoteRecord};

/// (country, signed count, population, signed percentage)
const SIGNED_SAMPLES: [(&str, u64, u64, f64); 14] = [
    ("United States", 3_450_000, 331_900_000, 1.04),
    ("Germany", 2_300_000, 83_200_000, 2.76),
    ("France", 1_800_000, 67_750_000, 2.66),
    ("United Kingdom", 1_500_000, 67_220_000, 2.23),
    ("Switzerland", 320_000, 8_670_000, 3.69),
    ("Canada", 1_100_000, 38_250_000, 2.88),
    ("Australia", 780_000, 25_690_000, 3.04),
    ("Japan", 2_200_000, 125_800_000, 1.75),
    ("Brazil", 1_900_000, 213_990_000, 0.89),
    ("India", 5_400_000, 1_380_000_000, 0.39),
    ("China", 4_800_000, 1_402_000_000, 0.34),
    ("South Korea", 980_000, 51_780_000, 1.89),
    ("Italy", 1_300_000, 60_360_000, 2.15),
    ("Spain", 1_050_000, 47_350_000, 2.22),
];

/// (country, total population, vote amount)
const VOTE_SAMPLES: [(&str, u64, u64); 10] = [
    ("United States", 331_002_651, 198_601_590),
    ("China", 1_439_323_776, 575_729_510),
    ("India", 1_380_004_385, 828_002_631),
    ("Russia", 145_912_025, 43_773_607),
    ("Brazil", 212_559_417, 148_791_592),
    ("Japan", 126_476_461, 113_828_815),
    ("Germany", 83_783_942, 71_216_351),
    ("United Kingdom", 67_886_011, 47_520_208),
    ("France", 65_273_511, 45_691_458),
    ("Italy", 60_461_826, 36_277_096),
];

/// Built-in `/peace-map.json` contents.
const ISO_PEACE: [(&str, f64); 14] = [
    ("USA", 0.0),
    ("ISR", 35.0),
    ("EGY", 51.0),
    ("FRA", 72.0),
    ("RUS", 0.0),
    ("CHN", 10.0),
    ("IRN", 70.0),
    ("UKR", 50.0),
    ("IND", 71.0),
    ("PAK", 20.0),
    ("DEU", 5.0),
    ("BRA", 66.0),
    ("ARG", 75.0),
    ("CAN", 90.0),
];

/// (name, iso, region, south-west corner, north-east corner). Percentages
/// come from [`ISO_PEACE`].
type CountryShape = (&'static str, &'static str, &'static str, [f64; 2], [f64; 2]);

const SAMPLE_COUNTRIES: [CountryShape; 10] = [
    ("United States", "USA", "North America", [-125.0, 24.0], [-66.0, 49.0]),
    ("Germany", "DEU", "Europe", [5.8, 47.2], [15.0, 55.1]),
    ("France", "FRA", "Europe", [-4.8, 42.3], [8.2, 51.1]),
    ("Brazil", "BRA", "South America", [-73.9, -33.8], [-34.8, 5.3]),
    ("Argentina", "ARG", "South America", [-73.6, -55.1], [-53.6, -21.8]),
    ("India", "IND", "Asia", [68.1, 8.0], [97.4, 35.5]),
    ("China", "CHN", "Asia", [73.5, 18.2], [134.8, 53.6]),
    ("Russia", "RUS", "Europe/Asia", [30.0, 50.0], [180.0, 70.0]),
    ("Egypt", "EGY", "Africa", [24.7, 22.0], [36.9, 31.6]),
    ("Canada", "CAN", "North America", [-140.0, 43.0], [-52.6, 70.0]),
];

/// (city, country code, lng, lat, magnitude)
const SAMPLE_ACTIVITY: [(&str, &str, f64, f64, f64); 10] = [
    ("Bergen", "NO", 5.33, 60.39, 4.5),
    ("Oslo", "NO", 10.75, 59.91, 3.8),
    ("Berlin", "DE", 13.40, 52.52, 5.2),
    ("Paris", "FR", 2.35, 48.86, 4.1),
    ("New York", "US", -74.01, 40.71, 3.3),
    ("São Paulo", "BR", -46.63, -23.55, 2.7),
    ("Cairo", "EG", 31.24, 30.04, 2.2),
    ("Mumbai", "IN", 72.88, 19.08, 3.0),
    ("Tokyo", "JP", 139.69, 35.69, 4.4),
    ("Sydney", "AU", 151.21, -33.87, 1.9),
];

/// Exact-name lookup in the signature table.
pub fn signed_sample(country: &str) -> Option<PeaceDataRecord> {
    SIGNED_SAMPLES
        .iter()
        .find(|(name, ..)| *name == country)
        .map(|&(_, signed_count, population, signed_percentage)| PeaceDataRecord {
            signed_count,
            population,
            signed_percentage,
        })
}

/// `min(100, round(votes / total * 100))`; zero population gives zero.
pub fn vote_percentage(total_population: u64, vote_amount: u64) -> u32 {
    if total_population == 0 {
        return 0;
    }
    let pct = (vote_amount as f64 / total_population as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u32
}

/// Case-insensitive lookup in the vote table. Unknown countries echo the
/// requested name with zeros.
pub fn vote_record(country: &str) -> PeaceVoteRecord {
    let wanted = country.to_lowercase();
    match VOTE_SAMPLES
        .iter()
        .find(|(name, ..)| name.to_lowercase() == wanted)
    {
        Some(&(name, total_population, vote_amount)) => PeaceVoteRecord {
            country: name.to_string(),
            total_population,
            vote_amount,
            percentage: vote_percentage(total_population, vote_amount),
        },
        None => PeaceVoteRecord {
            country: country.to_string(),
            total_population: 0,
            vote_amount: 0,
            percentage: 0,
        },
    }
}

pub fn default_peace_map() -> PeaceMap {
    ISO_PEACE
        .iter()
        .map(|&(iso, pct)| (iso.to_string(), pct))
        .collect()
}

/// Built-in peace percentage for an ISO-3 code.
pub fn iso_percentage(iso: &str) -> Option<f64> {
    ISO_PEACE
        .iter()
        .find(|(code, _)| *code == iso)
        .map(|&(_, pct)| pct)
}

/// Simplified country polygons carrying `name`, `iso`, `region` and, when
/// the built-in table has one, `peacePercentage`.
pub fn sample_countries() -> FeatureCollection {
    let features = SAMPLE_COUNTRIES
        .iter()
        .map(|&(name, iso, region, sw, ne)| {
            let mut props = Map::new();
            props.insert("name".into(), json!(name));
            props.insert("iso".into(), json!(iso));
            props.insert("region".into(), json!(region));
            if let Some(pct) = iso_percentage(iso) {
                props.insert("peacePercentage".into(), json!(pct));
            }
            Feature::rectangle(sw, ne, props)
        })
        .collect();
    FeatureCollection::new(features)
}

/// Activity points carrying `city`, `countryCode` and `mag`.
pub fn sample_activity() -> FeatureCollection {
    let features = SAMPLE_ACTIVITY
        .iter()
        .map(|&(city, code, lng, lat, mag)| {
            let mut props = Map::new();
            props.insert("city".into(), json!(city));
            props.insert("countryCode".into(), json!(code));
            props.insert("mag".into(), json!(mag));
            Feature::point(lng, lat, props)
        })
        .collect();
    FeatureCollection::new(features)
}

/// Write `peacePercentage` onto every feature whose `iso` appears in `map`.
/// Returns how many features changed.
pub fn apply_peace_map(collection: &mut FeatureCollection, map: &PeaceMap) -> usize {
    let mut updated = 0;
    for feature in &mut collection.features {
        let pct = feature.prop_str("iso").and_then(|iso| map.get(iso)).copied();
        if let Some(pct) = pct {
            feature.set_prop("peacePercentage", Value::from(pct));
            updated += 1;
        }
    }
    updated
}

/// Countries with any recorded support.
pub fn supporting_countries(map: &PeaceMap) -> usize {
    map.values().filter(|pct| **pct > 0.0).count()
}
