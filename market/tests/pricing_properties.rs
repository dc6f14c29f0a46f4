use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

use market::{
    CityTable, Metal, ReferencePriceTable, Trend,
    deriver::derive,
    synthetic::{self, JITTER_RANGE},
};

#[test]
fn mumbai_scenario_from_reference_table() {
    let cities = CityTable::default();
    let table = ReferencePriceTable::default();
    let mumbai = cities.get("mumbai").expect("mumbai configured");

    let base = table.base(Metal::Gold, Metal::Gold.reference_purity()).unwrap();
    assert_eq!(base, 105_500);
    assert_eq!(synthetic::price_from_base(base, mumbai.multiplier, 1.0), 107_610);
}

#[test]
fn every_city_gets_a_complete_bundle() {
    let cities = CityTable::default();
    let table = ReferencePriceTable::default();
    let mut rng = StdRng::seed_from_u64(11);

    for profile in cities.profiles() {
        let bundle = synthetic::generate_bundle(profile, &table, Trend::default(), 0, &mut rng);
        assert!(bundle.is_valid(), "{} has a missing or zero price", profile.city.id);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn from_base_prices_are_positive(
        base in 0u64..=1_000_000,
        multiplier in 0.98f64..=1.03,
        jitter in JITTER_RANGE,
    ) {
        prop_assert!(synthetic::price_from_base(base, multiplier, jitter) > 0);
    }

    #[test]
    fn random_walk_never_reaches_zero(
        start in 1u64..=500_000,
        seed in any::<u64>(),
        steps in 1usize..200,
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut price = start;
        for _ in 0..steps {
            let change = synthetic::draw_walk_change(&mut rng, Metal::Silver);
            price = synthetic::walk_price(price, change);
            prop_assert!(price > 0);
        }
    }

    #[test]
    fn derived_prices_are_positive_and_reproducible(
        reference in 0.0f64..=500_000.0,
        multiplier in 0.98f64..=1.03,
    ) {
        for metal in Metal::ALL {
            let a = derive(metal, reference, multiplier);
            let b = derive(metal, reference, multiplier);
            prop_assert_eq!(&a, &b);
            prop_assert_eq!(a.len(), metal.purities().len());
            prop_assert!(a.iter().all(|(_, v)| v > 0));
        }
    }

    #[test]
    fn regime_shock_keeps_table_positive(factors in prop::collection::vec(0.0f64..=1.5, 1..50)) {
        let mut table = ReferencePriceTable::default();
        for f in factors {
            table.apply_shock(f);
        }
        for metal in Metal::ALL {
            for &p in metal.purities() {
                prop_assert!(table.base(metal, p).unwrap() > 0);
            }
        }
    }
}
