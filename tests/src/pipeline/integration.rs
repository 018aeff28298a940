#![cfg(test)]
use std::collections::{HashMap, HashSet};
use std::net::Ipv4Addr;

use geopipe_common::config::OutputMode;

use crate::stubs::{StubGeoDb, StubResolver, config, run};

const US_1: Ipv4Addr = Ipv4Addr::new(93, 184, 216, 34);
const US_2: Ipv4Addr = Ipv4Addr::new(93, 184, 216, 35);
const US_3: Ipv4Addr = Ipv4Addr::new(93, 184, 216, 36);
const DE_1: Ipv4Addr = Ipv4Addr::new(81, 169, 145, 1);
const FR_1: Ipv4Addr = Ipv4Addr::new(51, 15, 0, 1);
const UNKNOWN: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 1);
const BROKEN: Ipv4Addr = Ipv4Addr::new(0, 0, 0, 1);

fn geo_db() -> StubGeoDb {
    StubGeoDb::new(&[(US_1, "US"), (US_2, "US"), (US_3, "US"), (DE_1, "DE"), (FR_1, "FR")])
        .with_broken(BROKEN)
}

/*************************************************************
                      Reference scenario
**************************************************************/

#[test]
fn reference_scenario() {
    let resolver = StubResolver::new(&[("example.com", &[US_1])]);
    let input = "example.com\nnotadomain!\ntest.invalid\n";

    let outcome = run(&config(1, OutputMode::Default), &resolver, &geo_db(), input);

    assert_eq!(outcome.stdout, "example.com\n");
    assert_eq!(outcome.summary.valid_domains, 2);
    assert_eq!(outcome.summary.skipped_lines, 1);
    assert_eq!(outcome.summary.unresolved_domains, 1);
    assert_eq!(outcome.summary.matched_domains, 1);

    let queried: HashSet<String> = resolver.queried().into_iter().collect();
    assert!(!queried.contains("notadomain!"), "invalid input reached the resolver");
    assert_eq!(queried.len(), 2);
}

/*************************************************************
                            Dedup
**************************************************************/

#[test]
fn multi_address_domain_is_printed_once() {
    let resolver = StubResolver::new(&[
        ("multi.example", &[US_1, US_2, US_3, DE_1]),
        ("single.example", &[US_2]),
    ]);
    let input = "multi.example\nsingle.example\nmulti.example\n";

    for workers in [1, 2, 4, 8] {
        let outcome = run(&config(workers, OutputMode::Default), &resolver, &geo_db(), input);
        let mut lines = outcome.lines();
        lines.sort_unstable();
        assert_eq!(lines, ["multi.example", "single.example"], "workers = {workers}");
        assert_eq!(outcome.summary.matched_domains, 2);
    }
}

/*************************************************************
                      Filter correctness
**************************************************************/

#[test]
fn emits_only_domains_with_a_matching_address() {
    let resolver = StubResolver::new(&[
        ("us.example", &[US_1]),
        ("mixed.example", &[DE_1, FR_1, US_3]),
        ("de.example", &[DE_1]),
        ("eu.example", &[DE_1, FR_1]),
        ("private.example", &[UNKNOWN]),
        ("empty.example", &[]),
    ]);
    let input = "us.example\nmixed.example\nde.example\neu.example\nprivate.example\nempty.example\nnx.example\n";

    let outcome = run(&config(3, OutputMode::Default), &resolver, &geo_db(), input);

    assert_eq!(outcome.line_set(), HashSet::from(["us.example", "mixed.example"]));
    assert_eq!(outcome.summary.valid_domains, 7);
    assert_eq!(outcome.summary.resolved_domains, 5);
    assert_eq!(outcome.summary.unresolved_domains, 2);
}

#[test]
fn target_country_is_configurable() {
    let resolver = StubResolver::new(&[("us.example", &[US_1]), ("de.example", &[DE_1])]);
    let mut cfg = config(2, OutputMode::Default);
    cfg.country = "DE".to_string();

    let outcome = run(&cfg, &resolver, &geo_db(), "us.example\nde.example\n");
    assert_eq!(outcome.stdout, "de.example\n");

    cfg.country = "de".to_string();
    let outcome = run(&cfg, &resolver, &geo_db(), "us.example\nde.example\n");
    assert!(outcome.stdout.is_empty(), "country codes are case-sensitive");
}

/*************************************************************
                      Invalid input
**************************************************************/

#[test]
fn garbage_input_never_reaches_the_resolver() {
    let resolver = StubResolver::new(&[("ok.example", &[US_1])]);
    let input = "ok.example\n\u{0}\u{1}\n-bad.example\nbad..example\nspaces in name\n93.184.216.34\n\n\n";

    let outcome = run(&config(2, OutputMode::Default), &resolver, &geo_db(), input);

    assert_eq!(outcome.stdout, "ok.example\n");
    assert_eq!(resolver.queried(), ["ok.example"]);
    assert_eq!(outcome.summary.skipped_lines, 5);
}

/*************************************************************
                 Worker count independence
**************************************************************/

fn large_fixture() -> (StubResolver, String, HashSet<String>) {
    let pool = [US_1, US_2, US_3, DE_1, FR_1, UNKNOWN, BROKEN];
    let mut records: HashMap<String, Vec<Ipv4Addr>> = HashMap::new();
    let mut expected: HashSet<String> = HashSet::new();
    let mut input = String::new();

    for i in 0..400usize {
        let name = format!("host{i}.example");
        input.push_str(&name);
        input.push('\n');

        // Every 9th domain does not resolve at all.
        if i % 9 == 0 {
            continue;
        }
        let addrs: Vec<Ipv4Addr> = (0..(i % 4) + 1).map(|k| pool[(i * 3 + k * 5) % pool.len()]).collect();
        if addrs.iter().any(|a| [US_1, US_2, US_3].contains(a)) {
            expected.insert(name.clone());
        }
        records.insert(name, addrs);
    }

    (StubResolver::from_map(records), input, expected)
}

#[test]
fn same_result_set_for_any_worker_count() {
    let (resolver, input, expected) = large_fixture();
    let db = geo_db();

    for workers in [1, 2, 7, 32] {
        let outcome = run(&config(workers, OutputMode::Default), &resolver, &db, &input);
        let got: HashSet<String> = outcome.lines().into_iter().map(String::from).collect();

        assert_eq!(got, expected, "workers = {workers}");
        assert_eq!(outcome.lines().len(), expected.len(), "duplicates with {workers} workers");
        assert_eq!(outcome.summary.matched_domains, expected.len());
        assert_eq!(outcome.summary.valid_domains, 400);
    }
}

/*************************************************************
                   Partial failure & shutdown
**************************************************************/

#[test]
fn lookup_failures_are_dropped_not_fatal() {
    let resolver = StubResolver::new(&[
        ("broken.example", &[BROKEN]),
        ("half.example", &[BROKEN, US_2]),
        ("fine.example", &[US_1]),
    ]);
    let input = "broken.example\nhalf.example\nfine.example\n";

    let outcome = run(&config(2, OutputMode::Default), &resolver, &geo_db(), input);

    assert_eq!(outcome.line_set(), HashSet::from(["half.example", "fine.example"]));
    assert_eq!(outcome.summary.failed_lookups, 2);
    assert_eq!(outcome.summary.addresses, 4);
}

#[test]
fn empty_input_completes() {
    let resolver = StubResolver::default();
    for workers in [1, 16] {
        let outcome = run(&config(workers, OutputMode::Default), &resolver, &geo_db(), "");
        assert!(outcome.stdout.is_empty());
        assert_eq!(outcome.summary.valid_domains, 0);
        assert_eq!(outcome.summary.match_percentage(), None);
    }
}

#[test]
fn all_resolutions_failing_completes() {
    let resolver = StubResolver::default();
    let input: String = (0..100).map(|i| format!("nx{i}.example\n")).collect();

    let outcome = run(&config(4, OutputMode::Default), &resolver, &geo_db(), &input);

    assert!(outcome.stdout.is_empty());
    assert_eq!(outcome.summary.valid_domains, 100);
    assert_eq!(outcome.summary.unresolved_domains, 100);
    assert_eq!(outcome.summary.addresses, 0);
    assert_eq!(outcome.summary.match_percentage(), Some(0));
}

/*************************************************************
                         JSON output
**************************************************************/

#[test]
fn json_mode_reports_every_processed_address() {
    let resolver = StubResolver::new(&[
        ("multi.example", &[US_1, DE_1]),
        ("private.example", &[UNKNOWN]),
        ("broken.example", &[BROKEN]),
    ]);
    let input = "multi.example\nprivate.example\nbroken.example\nnx.example\n";

    let outcome = run(&config(2, OutputMode::Json), &resolver, &geo_db(), input);

    let mut records: Vec<serde_json::Value> = outcome
        .lines()
        .into_iter()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    records.sort_by_key(|r| r["ip_address"].as_str().unwrap().to_string());

    assert_eq!(
        records,
        vec![
            serde_json::json!({"domain": "private.example", "ip_address": "10.0.0.1", "country_code": "", "match": false}),
            serde_json::json!({"domain": "multi.example", "ip_address": "81.169.145.1", "country_code": "DE", "match": false}),
            serde_json::json!({"domain": "multi.example", "ip_address": "93.184.216.34", "country_code": "US", "match": true}),
        ]
    );
    assert_eq!(outcome.summary.matched_domains, 1);
}
