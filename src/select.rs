//! Weighted selection of request templates.
//!
//! Each call makes one uniform draw in `[0, total)` and returns the first
//! candidate whose cumulative weight exceeds it, so candidate `i` is chosen
//! with probability `w_i / Σw`. Nothing is remembered between calls.
//!
//! Cumulative weights are kept relative to the largest weight, so the
//! table stays finite even when the raw weights sum past `f64::MAX`.

use rand::Rng;

use crate::error::{Result, WorkloadError};
use crate::request::RequestTemplate;

fn check_weight(index: usize, weight: f64) -> Result<()> {
    if !weight.is_finite() || weight <= 0.0 {
        return Err(WorkloadError::InvalidWeight(format!(
            "weight {} at index {} must be a positive finite number",
            weight, index
        )));
    }
    Ok(())
}

/// Validated weights as a cumulative table scaled by the largest weight.
#[derive(Debug, Clone)]
struct CumulativeWeights {
    bounds: Vec<f64>,
    scale: f64,
}

impl CumulativeWeights {
    fn new<I>(weights: I) -> Result<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let weights: Vec<f64> = weights.into_iter().collect();
        if weights.is_empty() {
            return Err(WorkloadError::InvalidWeight("no candidates to select from".to_string()));
        }
        for (index, weight) in weights.iter().enumerate() {
            check_weight(index, *weight)?;
        }

        let scale = weights.iter().copied().fold(0.0, f64::max);
        let mut total = 0.0;
        let bounds = weights
            .iter()
            .map(|weight| {
                total += weight / scale;
                total
            })
            .collect();

        Ok(Self { bounds, scale })
    }

    fn len(&self) -> usize {
        self.bounds.len()
    }

    /// Sum of the raw weights; may be infinite for huge weights.
    fn total(&self) -> f64 {
        self.bounds.last().copied().unwrap_or(0.0) * self.scale
    }

    /// Index of the chosen candidate.
    fn pick<R>(&self, rng: &mut R) -> usize
    where
        R: Rng + ?Sized,
    {
        let last = self.len() - 1;
        if last == 0 {
            return 0;
        }
        let draw = rng.random::<f64>() * self.bounds[last];
        // Float rounding can leave draw == total
        self.bounds.partition_point(|&bound| bound <= draw).min(last)
    }
}

/// Pick one item from `(weight, item)` pairs proportionally to weight.
///
/// Fails with `InvalidWeight` on an empty slice or any weight that is not
/// a positive finite number.
pub fn select_weighted<'a, T, R>(candidates: &'a [(f64, T)], rng: &mut R) -> Result<&'a T>
where
    R: Rng + ?Sized,
{
    let weights = CumulativeWeights::new(candidates.iter().map(|(weight, _)| *weight))?;
    Ok(&candidates[weights.pick(rng)].1)
}

/// Selector over a fixed template set with precomputed cumulative weights.
#[derive(Debug, Clone)]
pub struct WeightedSelector {
    templates: Vec<RequestTemplate>,
    weights: CumulativeWeights,
}

impl WeightedSelector {
    /// Validate the template set and build the cumulative table.
    pub fn new(templates: Vec<RequestTemplate>) -> Result<Self> {
        if templates.is_empty() {
            return Err(WorkloadError::InvalidTemplateSet("no requests configured".to_string()));
        }
        if let Some(index) = templates.iter().position(|t| t.url.trim().is_empty()) {
            return Err(WorkloadError::InvalidTemplateSet(format!(
                "request at index {} has an empty url",
                index
            )));
        }

        let weights = CumulativeWeights::new(templates.iter().map(|t| t.weight))?;
        Ok(Self { templates, weights })
    }

    pub fn templates(&self) -> &[RequestTemplate] {
        &self.templates
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Sum of all weights.
    pub fn total_weight(&self) -> f64 {
        self.weights.total()
    }

    /// Choose one template.
    pub fn select<R>(&self, rng: &mut R) -> &RequestTemplate
    where
        R: Rng + ?Sized,
    {
        &self.templates[self.weights.pick(rng)]
    }
}
