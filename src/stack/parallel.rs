//! Parallel stack execution.
//!
//! Sections are independent, so a fixed set of worker threads pulls section
//! indices from a shared counter until the work runs out.
//!
//! # Example
//!
//! ```ignore
//! use stitchcons::stack::{ParallelConsolidate, StackContext};
//!
//! let context = StackContext::new("montage").with_z_bounds(Some(1.0), Some(200.0));
//! let result = ParallelConsolidate::new(context)
//!     .with_jobs(4)
//!     .run(&store)?;
//!
//! println!("{} sections in {:?}", result.success_count(), result.total_duration);
//! ```

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use crate::stack::{run_section, SectionResult, StackContext, StackError, StackResult};
use crate::store::TileStore;
use crate::transforms::PolyDegree;

/// Parallel stack consolidation.
pub struct ParallelConsolidate {
    /// Run parameters
    context: StackContext,
    /// Number of parallel section workers
    jobs: usize,
    /// Whether to stop dispatching after the first failure
    fail_fast: bool,
}

impl ParallelConsolidate {
    /// Create a run taking worker count and fail-fast mode from `context`.
    pub fn new(context: StackContext) -> Self {
        let jobs = context.pool_size().max(1);
        let fail_fast = context.is_fail_fast();
        Self { context, jobs, fail_fast }
    }

    /// Set the number of parallel jobs.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Set fail-fast mode (stop dispatching on first error).
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Get the number of parallel jobs.
    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// Run the consolidation over every selected section of the stack.
    ///
    /// Parameter and listing errors are returned before any section is
    /// dispatched. Section failures are recorded in the result.
    pub fn run<S: TileStore + ?Sized>(&self, store: &S) -> Result<StackResult, StackError> {
        let start = Instant::now();
        let degree = self.context.validate()?;
        let source = self.context.stack();
        let dest = self.context.output_stack();

        let available = store.list_sections(source)?;
        let sections = self.context.select_sections(&available);
        store.ensure_collection(&dest)?;

        log::info!(
            "consolidating {} of {} sections from '{}' into '{}' ({} workers, range {}, degree {})",
            sections.len(),
            available.len(),
            source,
            dest,
            self.jobs,
            self.context.range(),
            degree
        );

        let mut result = StackResult::new(dest.clone());
        for section in self.execute(store, &sections, &dest, degree) {
            result.add_result(section);
        }
        result.total_duration = start.elapsed();

        if result.failed_count() > 0 {
            log::warn!("{} of {} sections failed", result.failed_count(), sections.len());
        }
        Ok(result)
    }

    /// Run the section workers, returning one result per section in input order.
    fn execute<S: TileStore + ?Sized>(
        &self,
        store: &S,
        sections: &[f64],
        dest: &str,
        degree: PolyDegree,
    ) -> Vec<SectionResult> {
        if sections.is_empty() {
            return vec![];
        }

        let results = Mutex::new(Vec::with_capacity(sections.len()));
        let failed = AtomicBool::new(false);
        let next_idx = AtomicUsize::new(0);
        let num_workers = self.jobs.min(sections.len());

        std::thread::scope(|s| {
            for _ in 0..num_workers {
                s.spawn(|| loop {
                    if self.fail_fast && failed.load(Ordering::SeqCst) {
                        break;
                    }

                    let idx = next_idx.fetch_add(1, Ordering::SeqCst);
                    if idx >= sections.len() {
                        break;
                    }

                    let result = self.execute_section(store, sections[idx], dest, degree);
                    if result.status.is_failure() {
                        failed.store(true, Ordering::SeqCst);
                    }

                    lock(&results).push((idx, result));
                });
            }
        });

        let mut results = results.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner());

        // Sections never picked up because fail-fast stopped the workers.
        let mut dispatched = vec![false; sections.len()];
        for (idx, _) in &results {
            dispatched[*idx] = true;
        }
        for (idx, z) in sections.iter().enumerate() {
            if !dispatched[idx] {
                results.push((idx, SectionResult::skipped(*z)));
            }
        }

        // Sort results by original index to keep section order
        results.sort_by_key(|(idx, _)| *idx);
        results.into_iter().map(|(_, r)| r).collect()
    }

    fn execute_section<S: TileStore + ?Sized>(
        &self,
        store: &S,
        z: f64,
        dest: &str,
        degree: PolyDegree,
    ) -> SectionResult {
        let start = Instant::now();
        log::debug!("section z={}: start", z);

        match run_section(store, self.context.stack(), dest, z, self.context.range(), degree) {
            Ok(output) => SectionResult::success(output, start.elapsed()),
            Err(e) => {
                log::warn!("section z={} failed: {}", z, e);
                SectionResult::failed(z, e.to_string(), start.elapsed())
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Consolidate a stack with the worker count and fail-fast mode of `context`.
pub fn run_stack<S: TileStore + ?Sized>(
    store: &S,
    context: &StackContext,
) -> Result<StackResult, StackError> {
    ParallelConsolidate::new(context.clone()).run(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ResolvedTiles, TileSpec};
    use crate::store::{MemoryStore, StoreError};
    use crate::transforms::{AffineModel, Transform};
    use std::time::Duration;

    /// Memory store that records how many fetches run at once.
    struct CountingStore {
        inner: MemoryStore,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl TileStore for CountingStore {
        fn list_sections(&self, collection: &str) -> Result<Vec<f64>, StoreError> {
            self.inner.list_sections(collection)
        }

        fn fetch_section(&self, collection: &str, z: f64) -> Result<ResolvedTiles, StoreError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(20));
            let fetched = self.inner.fetch_section(collection, z);
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            fetched
        }

        fn write_section(
            &self,
            collection: &str,
            z: f64,
            tiles: &ResolvedTiles,
        ) -> Result<(), StoreError> {
            self.inner.write_section(collection, z, tiles)
        }

        fn ensure_collection(&self, collection: &str) -> Result<(), StoreError> {
            self.inner.ensure_collection(collection)
        }
    }

    fn section(z: f64, tiles: usize) -> ResolvedTiles {
        let tile_specs = (0..tiles)
            .map(|i| {
                TileSpec::new(
                    format!("{}-{}", z, i),
                    z,
                    vec![
                        AffineModel::scale(2.0, 2.0).into(),
                        AffineModel::translation(i as f64, 0.0).into(),
                    ],
                )
            })
            .collect();
        ResolvedTiles::new(tile_specs, vec![])
    }

    fn store_with(zs: &[f64]) -> MemoryStore {
        let store = MemoryStore::new();
        for &z in zs {
            store.insert_section("raw", z, section(z, 3));
        }
        store
    }

    #[test]
    fn test_parallel_new_takes_context_settings() {
        let ctx = StackContext::new("raw").with_pool_size(0).with_fail_fast(true);
        let run = ParallelConsolidate::new(ctx);
        assert_eq!(run.jobs(), 1);
        assert!(run.fail_fast);
        assert_eq!(ParallelConsolidate::new(StackContext::new("raw")).with_jobs(3).jobs(), 3);
    }

    #[test]
    fn test_run_stack_all_sections() {
        let store = store_with(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let ctx = StackContext::new("raw").with_pool_size(3);

        let result = run_stack(&store, &ctx).unwrap();

        assert_eq!(result.output_stack, "raw_CONS");
        assert_eq!(result.success_count(), 5);
        assert_eq!(result.succeeded_sections(), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        for z in [1.0, 2.0, 3.0, 4.0, 5.0] {
            let written = store.section("raw_CONS", z).unwrap();
            assert_eq!(written.tile_specs.len(), 3);
            assert!(written.tile_specs.iter().all(|t| t.transforms.len() == 1));
        }
    }

    #[test]
    fn test_run_stack_respects_pool_size() {
        let zs: Vec<f64> = (1..=12).map(f64::from).collect();
        let store = CountingStore {
            inner: store_with(&zs),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        };

        let result = run_stack(&store, &StackContext::new("raw").with_pool_size(3)).unwrap();

        assert_eq!(result.success_count(), 12);
        assert_eq!(result.succeeded_sections(), zs);
        let peak = store.peak.load(Ordering::SeqCst);
        assert!(peak >= 1 && peak <= 3, "peak concurrency {}", peak);
    }

    #[test]
    fn test_run_stack_z_bounds() {
        let store = store_with(&[1.0, 2.0, 3.0, 4.0]);
        let ctx = StackContext::new("raw").with_z_bounds(Some(2.0), Some(3.0));

        let result = run_stack(&store, &ctx).unwrap();

        assert_eq!(result.succeeded_sections(), vec![2.0, 3.0]);
        assert!(store.section("raw_CONS", 1.0).is_none());
        assert!(store.section("raw_CONS", 4.0).is_none());
    }

    #[test]
    fn test_run_stack_failure_is_isolated() {
        let store = store_with(&[1.0, 2.0, 3.0]);
        store.fail_fetch("raw", 2.0);

        let result = run_stack(&store, &StackContext::new("raw").with_pool_size(2)).unwrap();

        assert_eq!(result.succeeded_sections(), vec![1.0, 3.0]);
        assert_eq!(result.failed_sections(), vec![2.0]);
        assert_eq!(result.to_output().num_z, 3);
        assert!(store.section("raw_CONS", 3.0).is_some());
    }

    #[test]
    fn test_run_stack_fail_fast_single_worker() {
        let store = store_with(&[1.0, 2.0, 3.0]);
        store.fail_fetch("raw", 1.0);
        let ctx = StackContext::new("raw").with_pool_size(1).with_fail_fast(true);

        let result = run_stack(&store, &ctx).unwrap();

        assert_eq!(result.failed_sections(), vec![1.0]);
        assert_eq!(result.skipped_count(), 2);
        assert_eq!(result.sections.iter().map(|s| s.z).collect::<Vec<_>>(), vec![1.0, 2.0, 3.0]);
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn test_run_stack_precondition_before_dispatch() {
        let store = store_with(&[1.0]);
        let ctx = StackContext::new("raw").with_poly_degree(-2);

        assert!(matches!(run_stack(&store, &ctx), Err(StackError::Transform(_))));
        assert!(!store.has_collection("raw_CONS"));
    }

    #[test]
    fn test_run_stack_missing_stack() {
        let store = MemoryStore::new();
        assert!(matches!(
            run_stack(&store, &StackContext::new("absent")),
            Err(StackError::Store(_))
        ));
    }

    #[test]
    fn test_run_stack_empty_selection() {
        let store = store_with(&[1.0]);
        let ctx = StackContext::new("raw").with_z_bounds(Some(10.0), None);

        let result = run_stack(&store, &ctx).unwrap();
        assert!(result.sections.is_empty());
        assert!(store.has_collection("raw_CONS"));
    }

    #[test]
    fn test_run_stack_uses_transformed_points() {
        let store = store_with(&[7.0]);
        run_stack(&store, &StackContext::new("raw").with_output_stack("out")).unwrap();

        let written = store.section("out", 7.0).unwrap();
        let tile = &written.tile_specs[2];
        // scale by 2, then shift x by the tile index
        assert_eq!(tile.transforms[0].apply((1.0, 1.0)), Some((4.0, 2.0)));
        assert!(matches!(tile.transforms[0], Transform::Affine(_)));
    }
}
