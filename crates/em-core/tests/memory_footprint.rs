//! Peak heap use of an unblocked run stays within the footprint the matcher
//! checks against its resource policy.
#![allow(unsafe_code)]

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicUsize, Ordering};

use em_core::{EntityMatcher, MatchConfig, MemoryBudget, pair_footprint, required_bytes};
use polars::prelude::{DataFrame, IntoColumn, NamedFrom, Series};

struct Counting;

static CURRENT: AtomicUsize = AtomicUsize::new(0);
static PEAK: AtomicUsize = AtomicUsize::new(0);

unsafe impl GlobalAlloc for Counting {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc(layout) };
        if !ptr.is_null() {
            let now = CURRENT.fetch_add(layout.size(), Ordering::SeqCst) + layout.size();
            PEAK.fetch_max(now, Ordering::SeqCst);
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) };
        CURRENT.fetch_sub(layout.size(), Ordering::SeqCst);
    }
}

#[global_allocator]
static ALLOCATOR: Counting = Counting;

#[test]
fn unblocked_peak_fits_checked_footprint() {
    let records = 2000;
    let titles: Vec<String> = (0..records).map(|i| format!("title {i}")).collect();
    let df = DataFrame::new(vec![Series::new("title".into(), titles).into_column()]).unwrap();
    let budget = u64::try_from(required_bytes(records, pair_footprint(1))).unwrap();
    let config = MatchConfig::from_json_str(r#"{"scoring": {"title": "exact"}}"#).unwrap();
    let matcher = EntityMatcher::new(config).with_resource_policy(MemoryBudget::new(budget));

    let baseline = CURRENT.load(Ordering::SeqCst);
    PEAK.store(baseline, Ordering::SeqCst);
    let resolution = matcher.resolve(&df).unwrap();
    let peak = PEAK.load(Ordering::SeqCst);

    assert_eq!(resolution.blocking, None);
    assert_eq!(resolution.candidate_count, records * (records - 1) / 2);
    assert_eq!(resolution.match_count(), 0);
    let used = (peak - baseline) as u64;
    assert!(used <= budget, "peak {used} bytes over budget {budget}");
}
