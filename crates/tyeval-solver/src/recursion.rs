//! Depth and work bounds for recursive type computations.
//!
//! Recursive definitions (`Reverse`, `Permutation`, ...) re-enter the
//! evaluator through `Apply`. The same `(name, args)` pair may legitimately be
//! revisited at a deeper level, so the guard tracks nesting depth rather than
//! a visiting set, plus a total step budget for the whole call.
//!
//! # Profiles
//!
//! [`RecursionProfile`] names the limit presets so call sites read as intent:
//!
//! ```ignore
//! let guard = RecursionGuard::with_profile(RecursionProfile::TypeEvaluation);
//! ```
//!
//! # Safety
//!
//! - **Debug leak detection**: in debug builds, dropping a guard with active
//!   entries panics, catching forgotten `leave()` calls.
//! - **Overflow protection**: step counting uses saturating arithmetic.

// ---------------------------------------------------------------------------
// RecursionProfile
// ---------------------------------------------------------------------------

/// Named recursion limit presets.
///
/// Each profile encodes a `(max_depth, max_iterations)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionProfile {
    /// Top-level evaluation: nested definition applications and total steps.
    ///
    /// depth = 1000, iterations = 1,000,000
    TypeEvaluation,

    /// Custom limits for configured evaluators and test scenarios.
    Custom { max_depth: u32, max_iterations: u32 },
}

impl RecursionProfile {
    /// Maximum recursion depth for this profile.
    pub const fn max_depth(self) -> u32 {
        match self {
            Self::TypeEvaluation => 1000,
            Self::Custom { max_depth, .. } => max_depth,
        }
    }

    /// Maximum iteration count for this profile.
    pub const fn max_iterations(self) -> u32 {
        match self {
            Self::TypeEvaluation => 1_000_000,
            Self::Custom { max_iterations, .. } => max_iterations,
        }
    }
}

// ---------------------------------------------------------------------------
// RecursionResult
// ---------------------------------------------------------------------------

/// Result of attempting to enter a recursive computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionResult {
    /// Proceed with the computation.
    Entered,
    /// Maximum recursion depth exceeded.
    DepthExceeded,
    /// Maximum iteration count exceeded.
    IterationExceeded,
}

// ---------------------------------------------------------------------------
// RecursionGuard
// ---------------------------------------------------------------------------

/// Depth limiter with a total step budget.
///
/// # Usage
///
/// ```ignore
/// match guard.enter() {
///     RecursionResult::Entered => {
///         let result = do_work();
///         guard.leave();
///         result
///     }
///     RecursionResult::DepthExceeded | RecursionResult::IterationExceeded => bail(),
/// }
/// ```
///
/// In debug builds, dropping a guard at non-zero depth and calling `leave()`
/// at depth 0 both panic.
#[derive(Debug)]
pub struct RecursionGuard {
    depth: u32,
    iterations: u32,
    max_depth: u32,
    max_iterations: u32,
}

impl RecursionGuard {
    /// Create a guard with explicit limits.
    ///
    /// Prefer [`with_profile`](Self::with_profile) for standard use cases.
    pub fn new(max_depth: u32, max_iterations: u32) -> Self {
        Self {
            depth: 0,
            iterations: 0,
            max_depth,
            max_iterations,
        }
    }

    /// Create a guard from a named [`RecursionProfile`].
    pub fn with_profile(profile: RecursionProfile) -> Self {
        Self::new(profile.max_depth(), profile.max_iterations())
    }

    /// Try to enter a deeper level.
    ///
    /// On [`RecursionResult::Entered`] the caller **must** call
    /// [`leave`](Self::leave). On any other result the depth is unchanged and
    /// `leave()` must not be called.
    pub fn enter(&mut self) -> RecursionResult {
        if !self.step() {
            return RecursionResult::IterationExceeded;
        }
        if self.depth >= self.max_depth {
            return RecursionResult::DepthExceeded;
        }
        self.depth += 1;
        RecursionResult::Entered
    }

    /// Leave the current depth level.
    #[inline]
    pub fn leave(&mut self) {
        debug_assert!(
            self.depth > 0,
            "RecursionGuard::leave() called at depth 0. \
             This indicates a leave without a matching enter()."
        );
        self.depth = self.depth.saturating_sub(1);
    }

    /// Charge one unit of work against the step budget.
    ///
    /// Returns `false` once the budget is exhausted.
    #[inline]
    pub fn step(&mut self) -> bool {
        self.iterations = self.iterations.saturating_add(1);
        if self.iterations > self.max_iterations {
            return false;
        }
        true
    }

    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    #[inline]
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    #[inline]
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    #[inline]
    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// Reset all state while preserving configured limits.
    pub fn reset(&mut self) {
        self.depth = 0;
        self.iterations = 0;
    }
}

#[cfg(debug_assertions)]
impl Drop for RecursionGuard {
    fn drop(&mut self) {
        if !std::thread::panicking() && self.depth > 0 {
            panic!(
                "RecursionGuard dropped at depth {}. \
                 This indicates leaked enter() calls without matching leave() calls.",
                self.depth,
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_type_evaluation_limits() {
        let p = RecursionProfile::TypeEvaluation;
        assert_eq!(p.max_depth(), 1000);
        assert_eq!(p.max_iterations(), 1_000_000);
    }

    #[test]
    fn profile_custom_limits() {
        let p = RecursionProfile::Custom {
            max_depth: 7,
            max_iterations: 42,
        };
        assert_eq!(p.max_depth(), 7);
        assert_eq!(p.max_iterations(), 42);
    }

    #[test]
    fn enter_leave_tracks_depth() {
        let mut guard = RecursionGuard::new(10, 100);
        assert_eq!(guard.enter(), RecursionResult::Entered);
        assert_eq!(guard.enter(), RecursionResult::Entered);
        assert_eq!(guard.depth(), 2);
        guard.leave();
        guard.leave();
        assert_eq!(guard.depth(), 0);
        assert_eq!(guard.iterations(), 2);
    }

    #[test]
    fn depth_exceeded() {
        let mut guard = RecursionGuard::new(2, 100);
        assert_eq!(guard.enter(), RecursionResult::Entered);
        assert_eq!(guard.enter(), RecursionResult::Entered);
        assert_eq!(guard.enter(), RecursionResult::DepthExceeded);
        assert_eq!(guard.depth(), 2);
        guard.leave();
        guard.leave();
    }

    #[test]
    fn iteration_budget_exhausted() {
        let mut guard = RecursionGuard::new(100, 3);
        assert!(guard.step());
        assert!(guard.step());
        assert!(guard.step());
        assert!(!guard.step());
        assert_eq!(guard.enter(), RecursionResult::IterationExceeded);
    }

    #[test]
    fn reset_preserves_limits() {
        let mut guard = RecursionGuard::with_profile(RecursionProfile::TypeEvaluation);
        assert_eq!(guard.enter(), RecursionResult::Entered);
        guard.leave();
        guard.reset();
        assert_eq!(guard.iterations(), 0);
        assert_eq!(guard.max_depth(), 1000);
        assert_eq!(guard.depth(), 0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "RecursionGuard dropped at depth 1")]
    fn debug_leak_detection() {
        let mut guard = RecursionGuard::new(10, 100);
        let _ = guard.enter();
    }
}
