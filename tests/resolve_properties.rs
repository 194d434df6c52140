mod util;

use limoka_search::error::ResolveError;
use limoka_search::model::types::{FieldTag, MatchStage, Module, Resolution};
use limoka_search::search::{
    MatcherKind, Resolver, ScoredConfig, StagedConfig, flatten, scored_resolve, staged_resolve,
};
use proptest::prelude::*;
use util::{TestTracing, mixed_catalog, weather_catalog};

fn stage_of(res: &Resolution) -> Option<MatchStage> {
    match res {
        Resolution::Found(m) => Some(m.stage),
        Resolution::NotFound => None,
    }
}

/// Modules named after `names`, every other field filled with `filler`,
/// which the callers pick so it never collides with a generated name.
fn catalog_from(names: &[String], filler: &str) -> Vec<Module> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            Module::new(i as i64 + 1, name.clone(), format!("{filler} {filler}"))
                .with_command(filler, filler)
        })
        .collect()
}

#[test]
fn weather_example_resolves_in_boolean_stage() {
    let res = Resolver::default().resolve("weather", &weather_catalog()).unwrap();
    assert_eq!(res.module_id(), Some(1));
    assert_eq!(stage_of(&res), Some(MatchStage::Boolean));
}

#[test]
fn weather_typo_resolves_in_fuzzy_stage() {
    let res = Resolver::default().resolve("wether", &weather_catalog()).unwrap();
    assert_eq!(res.module_id(), Some(1));
    assert_eq!(stage_of(&res), Some(MatchStage::Fuzzy));
}

#[test]
fn empty_catalog_is_an_error_not_a_miss() {
    let err = Resolver::default().resolve("weather", &[]).unwrap_err();
    assert!(matches!(err, ResolveError::EmptyCatalog));
    // The document-level entry point treats "nothing to search" as a miss.
    assert_eq!(staged_resolve("weather", &flatten(&[])).unwrap(), Resolution::NotFound);
}

#[test]
fn scored_matcher_prefers_identical_description() {
    let modules = vec![
        Module::new(1, "alpha", "download youtube videos"),
        Module::new(2, "beta", "random cat pictures"),
    ];
    let res = scored_resolve("download youtube videos", &modules).unwrap();
    assert_eq!(res.module_id(), Some(1));
    assert_eq!(res.matched_field(), Some(FieldTag::Description));
}

#[test]
fn command_text_matches_route_to_owner() {
    let res = Resolver::default().resolve("msearch", &mixed_catalog()).unwrap();
    assert_eq!(res.module_id(), Some(3));
    assert_eq!(res.matched_field(), Some(FieldTag::CommandName));
}

#[test]
fn both_matchers_agree_on_an_exact_name() {
    for kind in [MatcherKind::Staged, MatcherKind::Scored] {
        let resolver = Resolver::from_kind(kind, StagedConfig::default(), ScoredConfig::default());
        let res = resolver.resolve("Translator", &mixed_catalog()).unwrap();
        assert_eq!(res.module_id(), Some(2), "matcher {kind:?}");
    }
}

/// "aaaaaa", "bbbbbb", ...: pairwise far apart for every stage.
fn name_for(i: i64) -> String {
    let c = char::from(b'a' + i as u8);
    c.to_string().repeat(6)
}

#[test]
fn concurrent_calls_are_isolated() {
    const CALLS: i64 = 16;
    let resolver = Resolver::default();
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..CALLS)
            .map(|i| {
                let resolver = &resolver;
                scope.spawn(move || {
                    let name = name_for(i);
                    let catalog = vec![Module::new(i, name.clone(), format!("only {name}"))];
                    for _ in 0..5 {
                        let res = resolver.resolve(&name, &catalog).unwrap();
                        assert_eq!(res.module_id(), Some(i));
                        // Names of other calls must never be visible here.
                        let other = name_for((i + 1) % CALLS);
                        let miss = resolver.resolve(&other, &catalog).unwrap();
                        assert_eq!(miss.module_id(), None, "call {i} saw {other}");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    });
}

#[test]
fn staged_resolution_logs_stage_and_module() {
    let tracing = TestTracing::new();
    let _guard = tracing.install();
    Resolver::default().resolve("wether", &weather_catalog()).unwrap();
    tracing.assert_contains("staged_resolve_found");
    tracing.assert_contains("stage=\"fuzzy\"");
    tracing.assert_contains("module_id=1");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn exact_name_always_resolves_to_its_module(
        names in prop::collection::hash_set("[a-m]{4,8}", 1..6),
        pick in any::<prop::sample::Index>(),
    ) {
        let names: Vec<String> = names.into_iter().collect();
        let catalog = catalog_from(&names, "nothing");
        let i = pick.index(names.len());
        let res = staged_resolve(&names[i], &flatten(&catalog)).unwrap();
        prop_assert_eq!(res.module_id(), Some(i as i64 + 1));
        prop_assert_eq!(stage_of(&res), Some(MatchStage::Boolean));
    }

    #[test]
    fn disjoint_query_is_not_found(
        names in prop::collection::hash_set("[a-m]{4,8}", 1..6),
        query in "[xyz]{3,6}",
    ) {
        let names: Vec<String> = names.into_iter().collect();
        let catalog = catalog_from(&names, "nope");
        prop_assert_eq!(staged_resolve(&query, &flatten(&catalog)).unwrap(), Resolution::NotFound);
    }

    #[test]
    fn resolution_is_idempotent(
        names in prop::collection::hash_set("[a-m]{4,8}", 1..6),
        query in "[a-z]{2,8}",
    ) {
        let names: Vec<String> = names.into_iter().collect();
        let catalog = catalog_from(&names, "stuff");
        let resolver = Resolver::default();
        let first = resolver.resolve(&query, &catalog).unwrap();
        let second = resolver.resolve(&query, &catalog).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn substitution_after_prefix_resolves_in_fuzzy_stage(
        name in "[a-m]{4,8}",
        pos_seed in any::<prop::sample::Index>(),
        replacement in "[n-w]",
    ) {
        // Distractor names are at least two edits away from any query.
        let distractor = format!("{name}ab");
        let catalog = vec![
            Module::new(1, name.clone(), "xxxx"),
            Module::new(2, distractor, "yyyy"),
        ];
        let pos = 2 + pos_seed.index(name.len() - 2);
        let mut query: Vec<char> = name.chars().collect();
        query[pos] = replacement.chars().next().unwrap();
        let query: String = query.into_iter().collect();

        let res = staged_resolve(&query, &flatten(&catalog)).unwrap();
        prop_assert_eq!(res.module_id(), Some(1));
        prop_assert_eq!(stage_of(&res), Some(MatchStage::Fuzzy));
    }
}
