//! Duration-based validity bucketing against a mock clock.

mod common;

use common::*;
use sluice_core::testing::MockClock;
use sluice_engine::prelude::*;
use sluice_engine::read::read_input_log;
use std::sync::Arc;
use std::time::Duration;

const HOUR: Duration = Duration::from_secs(3600);

fn consumer_input(source: &dyn Processor) -> InputPort {
    let input = InputPort::new("test::consumer", DATA_PORT);
    input.bind(source.base().output_by_name(DATA_PORT).unwrap());
    input
}

#[test]
fn reads_within_one_bucket_share_a_cache_entry() {
    let cache = Arc::new(MemoryCache::with_default_capacity());
    let clock = Arc::new(MockClock::new(10 * 3_600_000 + 900_000));
    let source = BucketedSource::new("feed", HOUR);
    let input = consumer_input(source.as_ref());

    let context = ExecutionContext::with_clock(Arc::clone(&cache), Arc::clone(&clock) as Arc<dyn Clock>);
    let (_, status) = read_input_log(&context, &input).unwrap();
    assert_eq!(status, CacheStatus::Stored);

    // Five minutes later, still the same hour bucket.
    clock.advance(Duration::from_secs(300));
    let (_, status) = read_input_log(&context, &input).unwrap();
    assert_eq!(status, CacheStatus::Hit);
    assert_eq!(source.reads(), 1);
    context.destroy(true);
}

#[test]
fn crossing_into_the_next_bucket_recomputes() {
    let cache = Arc::new(MemoryCache::with_default_capacity());
    let clock = Arc::new(MockClock::new(10 * 3_600_000 + 900_000));
    let source = BucketedSource::new("feed", HOUR);
    let input = consumer_input(source.as_ref());

    let context = ExecutionContext::with_clock(Arc::clone(&cache), Arc::clone(&clock) as Arc<dyn Clock>);
    let (_, status) = read_input_log(&context, &input).unwrap();
    assert_eq!(status, CacheStatus::Stored);

    clock.advance(HOUR);
    let (_, status) = read_input_log(&context, &input).unwrap();
    assert_eq!(status, CacheStatus::Stored);
    assert_eq!(source.reads(), 2);
    context.destroy(true);
}
