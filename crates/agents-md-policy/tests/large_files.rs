//! Parse cost on files near the 1 MiB fetch limit.
//!
//! Each input is built to stress one lookup path: many distinct keys in one
//! section, many headings, and many unknown keys that each produce a warning.
//! The bound is loose enough for unoptimized builds; anything quadratic in
//! these sizes takes tens of seconds even in release mode.

use std::fmt::Write;
use std::time::{Duration, Instant};

use agents_md_policy::parse;

const TARGET_BYTES: usize = 1_000_000;
const BOUND: Duration = Duration::from_secs(10);

fn build(header: &str, mut line: impl FnMut(usize) -> String) -> String {
    let mut content = String::from(header);
    let mut n = 0;
    while content.len() < TARGET_BYTES {
        writeln!(content, "{}", line(n)).unwrap();
        n += 1;
    }
    content
}

#[test]
fn many_distinct_actions_parse_quickly() {
    let content = build("## Identity\n- site: example.com\n\n## Allowed Actions\n", |n| {
        format!("- k{n}: yes")
    });

    let started = Instant::now();
    let outcome = parse(&content);
    let elapsed = started.elapsed();

    let policy = outcome.policy.unwrap();
    assert!(policy.allowed_actions.len() > 50_000);
    assert!(policy.allowed_actions.is_allowed("k0"));
    assert!(elapsed < BOUND, "took {elapsed:?}");
}

#[test]
fn many_headings_parse_quickly() {
    let content = build("## Identity\n- site: example.com\n", |n| format!("## s{n}"));

    let started = Instant::now();
    let outcome = parse(&content);
    let elapsed = started.elapsed();

    assert!(outcome.success);
    assert!(outcome.warnings.is_empty());
    assert!(elapsed < BOUND, "took {elapsed:?}");
}

#[test]
fn many_unknown_keys_parse_quickly() {
    let content = build("## Identity\n- site: example.com\n", |n| format!("- k{n}: v"));

    let started = Instant::now();
    let outcome = parse(&content);
    let elapsed = started.elapsed();

    assert!(outcome.success);
    assert!(outcome.warnings.len() > 50_000);
    assert!(elapsed < BOUND, "took {elapsed:?}");
}

#[test]
fn repeated_headings_keep_the_last_section() {
    let content = build("", |n| format!("## Identity\n- site: site{n}.example"));
    let last = content
        .lines()
        .rev()
        .find_map(|l| l.strip_prefix("- site: "))
        .unwrap()
        .to_string();

    let started = Instant::now();
    let outcome = parse(&content);
    let elapsed = started.elapsed();

    assert_eq!(outcome.policy.unwrap().identity.site, last);
    assert!(elapsed < BOUND, "took {elapsed:?}");
}
