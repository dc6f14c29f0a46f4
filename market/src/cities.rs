use serde::{Deserialize, Serialize};

/// A tracked city. Immutable once the table is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct City {
    /// Stable key (lowercase, used in URLs).
    pub id: String,
    pub name: String,
    /// State / region the city belongs to.
    pub state: String,
}

/// City plus the constant multiplier approximating local tax and logistics
/// variance relative to the national reference price.
#[derive(Debug, Clone, PartialEq)]
pub struct CityProfile {
    pub city: City,
    pub multiplier: f64,
}

pub const MIN_CITY_MULTIPLIER: f64 = 0.98;
pub const MAX_CITY_MULTIPLIER: f64 = 1.03;

// (id, display name, state, multiplier)
const DEFAULT_CITIES: [(&str, &str, &str, f64); 20] = [
    ("mumbai", "Mumbai", "Maharashtra", 1.02),
    ("delhi", "Delhi", "Delhi", 1.00),
    ("bangalore", "Bangalore", "Karnataka", 1.01),
    ("chennai", "Chennai", "Tamil Nadu", 1.015),
    ("kolkata", "Kolkata", "West Bengal", 0.995),
    ("hyderabad", "Hyderabad", "Telangana", 1.005),
    ("pune", "Pune", "Maharashtra", 1.01),
    ("ahmedabad", "Ahmedabad", "Gujarat", 0.99),
    ("jaipur", "Jaipur", "Rajasthan", 0.985),
    ("lucknow", "Lucknow", "Uttar Pradesh", 0.99),
    ("kanpur", "Kanpur", "Uttar Pradesh", 0.98),
    ("nagpur", "Nagpur", "Maharashtra", 0.995),
    ("indore", "Indore", "Madhya Pradesh", 0.985),
    ("bhopal", "Bhopal", "Madhya Pradesh", 0.98),
    ("patna", "Patna", "Bihar", 0.98),
    ("vadodara", "Vadodara", "Gujarat", 0.99),
    ("surat", "Surat", "Gujarat", 1.0),
    ("kochi", "Kochi", "Kerala", 1.03),
    ("coimbatore", "Coimbatore", "Tamil Nadu", 1.02),
    ("visakhapatnam", "Visakhapatnam", "Andhra Pradesh", 1.005),
];

/// Fixed list of cities served by the deployment, in configuration order.
#[derive(Debug, Clone)]
pub struct CityTable {
    profiles: Vec<CityProfile>,
}

impl CityTable {
    /// Build a table from profiles. Multipliers are clamped into the
    /// supported band so no city can price itself out of range.
    pub fn new(profiles: Vec<CityProfile>) -> Self {
        let profiles = profiles
            .into_iter()
            .map(|mut p| {
                p.multiplier = p.multiplier.clamp(MIN_CITY_MULTIPLIER, MAX_CITY_MULTIPLIER);
                p
            })
            .collect();
        Self { profiles }
    }

    pub fn profiles(&self) -> &[CityProfile] {
        &self.profiles
    }

    pub fn cities(&self) -> Vec<City> {
        self.profiles.iter().map(|p| p.city.clone()).collect()
    }

    pub fn get(&self, id: &str) -> Option<&CityProfile> {
        self.profiles.iter().find(|p| p.city.id == id)
    }

    pub fn multiplier(&self, id: &str) -> Option<f64> {
        self.get(id).map(|p| p.multiplier)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl Default for CityTable {
    /// The reference deployment: 20 Indian metro cities.
    fn default() -> Self {
        let profiles = DEFAULT_CITIES
            .iter()
            .map(|&(id, name, state, multiplier)| CityProfile {
                city: City {
                    id: id.to_string(),
                    name: name.to_string(),
                    state: state.to_string(),
                },
                multiplier,
            })
            .collect();
        Self::new(profiles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn default_table_has_twenty_unique_cities() {
        let table = CityTable::default();
        assert_eq!(table.len(), 20);

        let ids: HashSet<_> = table.profiles().iter().map(|p| &p.city.id).collect();
        assert_eq!(ids.len(), 20);
    }

    #[test]
    fn multipliers_stay_in_band() {
        let table = CityTable::default();
        for p in table.profiles() {
            assert!((MIN_CITY_MULTIPLIER..=MAX_CITY_MULTIPLIER).contains(&p.multiplier));
        }
        assert_eq!(table.multiplier("mumbai"), Some(1.02));
        assert_eq!(table.multiplier("atlantis"), None);
    }

    #[test]
    fn out_of_band_multiplier_is_clamped() {
        let table = CityTable::new(vec![CityProfile {
            city: City {
                id: "x".into(),
                name: "X".into(),
                state: "Y".into(),
            },
            multiplier: 3.0,
        }]);
        assert_eq!(table.multiplier("x"), Some(MAX_CITY_MULTIPLIER));
    }
}
