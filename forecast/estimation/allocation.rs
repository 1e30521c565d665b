use serde::{Deserialize, Serialize};

use crate::request::EstimationRequest;

const FRONTEND_MARKERS: &[&str] = &["react", "vue", "angular", "next.js"];
const BACKEND_MARKERS: &[&str] = &["monolith", "django", "rails"];
const MICROSERVICE_MARKER: &str = "microservice";

/// Recommended share of effort per discipline. Always sums to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoleAllocation {
    /// Front-end share.
    pub fe: f64,
    /// Back-end share.
    pub be: f64,
    /// DevOps share.
    pub devops: f64,
}

impl RoleAllocation {
    /// Sum of the three shares.
    #[must_use]
    pub const fn total(&self) -> f64 {
        self.fe + self.be + self.devops
    }
}

/// Staffing-mix heuristics over the stack label and integration count.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleAllocator;

impl RoleAllocator {
    /// Creates allocator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Substring-matched adjustments on top of a 35/50/15 split, renormalised.
    #[must_use]
    pub fn allocate(&self, request: &EstimationRequest) -> RoleAllocation {
        let stack = request.stack.to_lowercase();
        let (mut fe, mut be, mut devops) = (0.35, 0.50, 0.15);

        if FRONTEND_MARKERS.iter().any(|m| stack.contains(m)) {
            fe = 0.40;
            be = 0.45;
        }
        if BACKEND_MARKERS.iter().any(|m| stack.contains(m)) {
            fe = 0.30;
            be = 0.55;
        }
        if stack.contains(MICROSERVICE_MARKER) || request.integrations > 4 {
            devops = 0.20;
            be -= 0.05;
        }

        let total = fe + be + devops;
        RoleAllocation {
            fe: fe / total,
            be: be / total,
            devops: devops / total,
        }
    }
}
