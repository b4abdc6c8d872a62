//! Load allocation from metered feeder demand (Kersting §2.4.1.4):
//! size a transformer fleet for a customer count, then distribute the
//! metered demand across it by allocation factor.

use std::fmt;

use crate::error::AnalysisError;

/// A transformer size class and how many customers one unit serves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformerClass {
    /// Nameplate rating (kVA).
    pub kva: f64,
    /// Customers a single unit of this class can carry.
    pub customers_per_unit: usize,
}

/// Load allocated to one transformer in the fleet.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformerAllocation {
    /// Fleet-unique label, e.g. `T1_75kVA`.
    pub id: String,
    /// Nameplate rating (kVA).
    pub kva_rating: f64,
    /// Real power allocated (kW), per Kersting Eq. 2.12.
    pub allocated_kw: f64,
    /// Apparent power allocated (kVA) at the assumed power factor.
    pub allocated_kva: f64,
    /// `allocated_kw / (kva_rating * pf)`.
    pub utilization_factor: f64,
}

/// A complete fleet allocation for one metered demand.
#[derive(Debug, Clone)]
pub struct AllocationPlan {
    /// Metered (diversified) feeder demand the plan distributes (kW).
    pub metered_demand_kw: f64,
    /// `metered_demand_kw / total_kva`, per Kersting Eq. 2.11.
    pub allocation_factor: f64,
    /// Sum of fleet nameplate ratings (kVA).
    pub total_kva: f64,
    /// Per-transformer allocations, largest class first.
    pub transformers: Vec<TransformerAllocation>,
}

/// Builds a transformer fleet for `n_customers` and allocates the metered
/// demand across it.
///
/// Fleet construction follows Kersting's rule: fill with as many units of
/// the largest class as the customer count supports, then the next class
/// down, with the smallest class absorbing any remainder.
///
/// # Panics
///
/// Panics if `metered_demand_kw` is not positive, `classes` is empty, any
/// class has a non-positive rating or zero customers per unit, or
/// `power_factor` is outside `(0, 1]`.
///
/// # Errors
///
/// Returns [`AnalysisError::EmptySelection`] when `n_customers` is zero.
pub fn plan_allocation(
    metered_demand_kw: f64,
    n_customers: usize,
    classes: &[TransformerClass],
    power_factor: f64,
) -> Result<AllocationPlan, AnalysisError> {
    assert!(metered_demand_kw > 0.0, "metered_demand_kw must be > 0");
    assert!(!classes.is_empty(), "at least one transformer class required");
    assert!(
        classes
            .iter()
            .all(|c| c.kva > 0.0 && c.customers_per_unit > 0),
        "transformer classes must have positive rating and capacity"
    );
    assert!(
        power_factor > 0.0 && power_factor <= 1.0,
        "power_factor must be in (0, 1]"
    );

    if n_customers == 0 {
        return Err(AnalysisError::EmptySelection);
    }

    let mut ordered: Vec<TransformerClass> = classes.to_vec();
    ordered.sort_by(|a, b| b.kva.partial_cmp(&a.kva).unwrap_or(std::cmp::Ordering::Equal));

    let mut fleet: Vec<f64> = Vec::new();
    let mut remaining = n_customers;
    for (i, class) in ordered.iter().enumerate() {
        let is_smallest = i == ordered.len() - 1;
        while remaining >= class.customers_per_unit {
            fleet.push(class.kva);
            remaining -= class.customers_per_unit;
        }
        // The smallest class also absorbs a final partial group.
        if is_smallest && remaining > 0 {
            fleet.push(class.kva);
            remaining = 0;
        }
    }

    let total_kva: f64 = fleet.iter().sum();
    let allocation_factor = metered_demand_kw / total_kva;

    let transformers = fleet
        .iter()
        .enumerate()
        .map(|(i, &kva)| {
            let allocated_kw = allocation_factor * kva;
            TransformerAllocation {
                id: format!("T{}_{:.0}kVA", i + 1, kva),
                kva_rating: kva,
                allocated_kw,
                allocated_kva: allocated_kw / power_factor,
                utilization_factor: allocated_kw / (kva * power_factor),
            }
        })
        .collect();

    Ok(AllocationPlan {
        metered_demand_kw,
        allocation_factor,
        total_kva,
        transformers,
    })
}

impl fmt::Display for AllocationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Allocation Plan ---")?;
        writeln!(f, "Metered demand:        {:.3} kW", self.metered_demand_kw)?;
        writeln!(f, "Fleet capacity:        {:.1} kVA", self.total_kva)?;
        writeln!(f, "Allocation factor:     {:.4}", self.allocation_factor)?;
        for t in &self.transformers {
            writeln!(
                f,
                "  {:<12} {:>6.1} kVA  alloc={:>7.3} kW ({:.3} kVA)  util={:.4}",
                t.id, t.kva_rating, t.allocated_kw, t.allocated_kva, t.utilization_factor
            )?;
        }
        Ok(())
    }
}
