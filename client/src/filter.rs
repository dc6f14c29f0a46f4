use market::{CityPriceBundle, Metal, PriceSnapshot};

/// User filter over the price grid.
///
/// `city_id` and `search_text` select rows. `metal` selects which commodity
/// panels are shown on each card; every bundle carries both metals, so it
/// never hides a city.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    pub city_id: Option<String>,
    pub metal: Option<Metal>,
    pub search_text: String,
}

impl FilterState {
    pub fn is_active(&self) -> bool {
        self.city_id.is_some() || self.metal.is_some() || !self.search_text.trim().is_empty()
    }

    pub fn matches(&self, bundle: &CityPriceBundle) -> bool {
        if self.city_id.as_deref().is_some_and(|id| id != bundle.city.id) {
            return false;
        }

        let needle = self.search_text.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }

        let city = &bundle.city;
        [&city.name, &city.id, &city.state]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }

    /// Bundles passing every active predicate, in city id order.
    pub fn apply<'a>(&self, snapshot: &'a PriceSnapshot) -> Vec<&'a CityPriceBundle> {
        snapshot.prices.values().filter(|b| self.matches(b)).collect()
    }

    /// Metals to show on each card.
    pub fn metals(&self) -> Vec<Metal> {
        match self.metal {
            Some(metal) => vec![metal],
            None => Metal::ALL.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use market::{City, Trend};

    fn bundle(id: &str, name: &str, state: &str) -> CityPriceBundle {
        CityPriceBundle {
            city: City {
                id: id.into(),
                name: name.into(),
                state: state.into(),
            },
            gold: Default::default(),
            silver: Default::default(),
            last_updated: 0,
            trend: Trend::default(),
        }
    }

    #[test]
    fn search_is_case_insensitive_over_name_id_and_state() {
        let pune = bundle("pune", "Pune", "Maharashtra");
        let filter = |text: &str| FilterState {
            search_text: text.into(),
            ..Default::default()
        };

        assert!(filter("PUN").matches(&pune));
        assert!(filter("maha").matches(&pune));
        assert!(filter("  ").matches(&pune));
        assert!(!filter("kerala").matches(&pune));
    }

    #[test]
    fn city_and_search_must_both_pass() {
        let pune = bundle("pune", "Pune", "Maharashtra");
        let filter = FilterState {
            city_id: Some("mumbai".into()),
            search_text: "pune".into(),
            ..Default::default()
        };
        assert!(!filter.matches(&pune));
    }

    #[test]
    fn metal_filter_keeps_rows() {
        let filter = FilterState {
            metal: Some(Metal::Silver),
            ..Default::default()
        };
        assert!(filter.is_active());
        assert!(filter.matches(&bundle("delhi", "Delhi", "Delhi")));
        assert_eq!(filter.metals(), vec![Metal::Silver]);
    }
}
