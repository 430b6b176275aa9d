//! Distance metrics and the SIMD-dispatching calculator.
//!
//! Two metrics are supported: squared Euclidean (no final sqrt; ordering is
//! preserved) and angular (`1 - cos(a, b)`, range \[0, 2\]). The calculator
//! binds a concrete kernel once at construction: AVX2+FMA on x86_64 when the
//! CPU supports it, NEON on aarch64, and a scalar loop everywhere else.

use serde::{Deserialize, Serialize};

use crate::error::VaultError;

/// Norms below this are treated as zero; angular distance degenerates to 1.0.
const NORM_EPSILON: f32 = 1e-10;

/// Distance function used for similarity. Lower is closer for both metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DistanceMetric {
    /// Squared Euclidean distance: `Σ (aᵢ - bᵢ)²`. Range: \[0, ∞).
    L2,
    /// Angular distance: `1 - a·b / (‖a‖·‖b‖)`. Range: \[0, 2\].
    Angular,
}

impl DistanceMetric {
    /// Snapshot wire encoding (0 = L2, 1 = ANGULAR).
    pub(crate) fn to_wire(self) -> u32 {
        match self {
            DistanceMetric::L2 => 0,
            DistanceMetric::Angular => 1,
        }
    }

    /// Decodes the snapshot wire value.
    pub(crate) fn from_wire(raw: u32) -> Result<Self, VaultError> {
        match raw {
            0 => Ok(DistanceMetric::L2),
            1 => Ok(DistanceMetric::Angular),
            other => Err(VaultError::Format(format!(
                "unknown distance metric tag {other}"
            ))),
        }
    }
}

type DistanceFn = fn(&[f32], &[f32]) -> f32;

/// Computes distances under one metric, with the kernel chosen at
/// construction time.
///
/// Copyable and cheap to rebuild; the index swaps its calculator when a
/// snapshot with a different metric is loaded.
#[derive(Debug, Clone, Copy)]
pub struct DistanceCalculator {
    metric: DistanceMetric,
    func: DistanceFn,
    simd: bool,
}

impl DistanceCalculator {
    /// Selects the fastest kernel the running CPU supports for `metric`.
    #[allow(unreachable_code)]
    pub fn new(metric: DistanceMetric) -> Self {
        #[cfg(target_arch = "x86_64")]
        {
            if std::arch::is_x86_feature_detected!("avx2")
                && std::arch::is_x86_feature_detected!("fma")
            {
                let func = match metric {
                    DistanceMetric::L2 => l2_avx2,
                    DistanceMetric::Angular => angular_avx2,
                };
                return Self {
                    metric,
                    func,
                    simd: true,
                };
            }
        }
        #[cfg(target_arch = "aarch64")]
        {
            let func = match metric {
                DistanceMetric::L2 => l2_neon,
                DistanceMetric::Angular => angular_neon,
            };
            return Self {
                metric,
                func,
                simd: true,
            };
        }
        let func = match metric {
            DistanceMetric::L2 => l2_scalar,
            DistanceMetric::Angular => angular_scalar,
        };
        Self {
            metric,
            func,
            simd: false,
        }
    }

    /// Distance between two equal-length vectors.
    #[inline]
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        (self.func)(a, b)
    }

    /// The metric this calculator was built for.
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Whether a SIMD kernel was bound.
    pub fn uses_simd(&self) -> bool {
        self.simd
    }
}

// ─── Scalar kernels ─────────────────────────────────────────────────────────

pub(crate) fn l2_scalar(a: &[f32], b: &[f32]) -> f32 {
    let mut sum = 0.0f32;
    for i in 0..a.len() {
        let d = a[i] - b[i];
        sum += d * d;
    }
    sum
}

pub(crate) fn angular_scalar(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for i in 0..a.len() {
        dot += a[i] * b[i];
        norm_a += a[i] * a[i];
        norm_b += b[i] * b[i];
    }
    finish_angular(dot, norm_a, norm_b)
}

/// Shared tail for every angular kernel: zero-norm inputs degenerate to 1.0.
#[inline]
fn finish_angular(dot: f32, norm_a_sq: f32, norm_b_sq: f32) -> f32 {
    let norm_a = norm_a_sq.sqrt();
    let norm_b = norm_b_sq.sqrt();
    if norm_a < NORM_EPSILON || norm_b < NORM_EPSILON {
        return 1.0;
    }
    1.0 - dot / (norm_a * norm_b)
}

// ─── AVX2 kernels (x86_64) ──────────────────────────────────────────────────

#[cfg(target_arch = "x86_64")]
fn l2_avx2(a: &[f32], b: &[f32]) -> f32 {
    // Bound only after `is_x86_feature_detected!("avx2"/"fma")` succeeded.
    unsafe { l2_avx2_impl(a, b) }
}

#[cfg(target_arch = "x86_64")]
fn angular_avx2(a: &[f32], b: &[f32]) -> f32 {
    unsafe { angular_avx2_impl(a, b) }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2", enable = "fma")]
unsafe fn l2_avx2_impl(a: &[f32], b: &[f32]) -> f32 {
    use std::arch::x86_64::*;

    let n = a.len();
    let mut acc = _mm256_setzero_ps();

    let mut i = 0;
    while i + 8 <= n {
        let va = _mm256_loadu_ps(a.as_ptr().add(i));
        let vb = _mm256_loadu_ps(b.as_ptr().add(i));
        let diff = _mm256_sub_ps(va, vb);
        acc = _mm256_fmadd_ps(diff, diff, acc);
        i += 8;
    }

    let mut lanes = [0.0f32; 8];
    _mm256_storeu_ps(lanes.as_mut_ptr(), acc);
    let mut sum: f32 = lanes.iter().sum();

    while i < n {
        let d = a[i] - b[i];
        sum += d * d;
        i += 1;
    }
    sum
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2", enable = "fma")]
unsafe fn angular_avx2_impl(a: &[f32], b: &[f32]) -> f32 {
    use std::arch::x86_64::*;

    let n = a.len();
    let mut dot_acc = _mm256_setzero_ps();
    let mut na_acc = _mm256_setzero_ps();
    let mut nb_acc = _mm256_setzero_ps();

    let mut i = 0;
    while i + 8 <= n {
        let va = _mm256_loadu_ps(a.as_ptr().add(i));
        let vb = _mm256_loadu_ps(b.as_ptr().add(i));
        dot_acc = _mm256_fmadd_ps(va, vb, dot_acc);
        na_acc = _mm256_fmadd_ps(va, va, na_acc);
        nb_acc = _mm256_fmadd_ps(vb, vb, nb_acc);
        i += 8;
    }

    let mut lanes = [0.0f32; 8];
    _mm256_storeu_ps(lanes.as_mut_ptr(), dot_acc);
    let mut dot: f32 = lanes.iter().sum();
    _mm256_storeu_ps(lanes.as_mut_ptr(), na_acc);
    let mut norm_a: f32 = lanes.iter().sum();
    _mm256_storeu_ps(lanes.as_mut_ptr(), nb_acc);
    let mut norm_b: f32 = lanes.iter().sum();

    while i < n {
        dot += a[i] * b[i];
        norm_a += a[i] * a[i];
        norm_b += b[i] * b[i];
        i += 1;
    }
    finish_angular(dot, norm_a, norm_b)
}

// ─── NEON kernels (aarch64) ─────────────────────────────────────────────────

#[cfg(target_arch = "aarch64")]
fn l2_neon(a: &[f32], b: &[f32]) -> f32 {
    // NEON is architecturally guaranteed on aarch64.
    unsafe { l2_neon_impl(a, b) }
}

#[cfg(target_arch = "aarch64")]
fn angular_neon(a: &[f32], b: &[f32]) -> f32 {
    unsafe { angular_neon_impl(a, b) }
}

#[cfg(target_arch = "aarch64")]
#[target_feature(enable = "neon")]
unsafe fn l2_neon_impl(a: &[f32], b: &[f32]) -> f32 {
    use std::arch::aarch64::*;

    let n = a.len();
    let mut acc0 = vdupq_n_f32(0.0);
    let mut acc1 = vdupq_n_f32(0.0);

    let mut i = 0;
    while i + 8 <= n {
        let a0 = vld1q_f32(a.as_ptr().add(i));
        let b0 = vld1q_f32(b.as_ptr().add(i));
        let a1 = vld1q_f32(a.as_ptr().add(i + 4));
        let b1 = vld1q_f32(b.as_ptr().add(i + 4));
        let d0 = vsubq_f32(a0, b0);
        let d1 = vsubq_f32(a1, b1);
        acc0 = vfmaq_f32(acc0, d0, d0);
        acc1 = vfmaq_f32(acc1, d1, d1);
        i += 8;
    }

    let mut sum = vaddvq_f32(vaddq_f32(acc0, acc1));
    while i < n {
        let d = a[i] - b[i];
        sum += d * d;
        i += 1;
    }
    sum
}

#[cfg(target_arch = "aarch64")]
#[target_feature(enable = "neon")]
unsafe fn angular_neon_impl(a: &[f32], b: &[f32]) -> f32 {
    use std::arch::aarch64::*;

    let n = a.len();
    let mut dot_acc = vdupq_n_f32(0.0);
    let mut na_acc = vdupq_n_f32(0.0);
    let mut nb_acc = vdupq_n_f32(0.0);

    let mut i = 0;
    while i + 4 <= n {
        let va = vld1q_f32(a.as_ptr().add(i));
        let vb = vld1q_f32(b.as_ptr().add(i));
        dot_acc = vfmaq_f32(dot_acc, va, vb);
        na_acc = vfmaq_f32(na_acc, va, va);
        nb_acc = vfmaq_f32(nb_acc, vb, vb);
        i += 4;
    }

    let mut dot = vaddvq_f32(dot_acc);
    let mut norm_a = vaddvq_f32(na_acc);
    let mut norm_b = vaddvq_f32(nb_acc);

    while i < n {
        dot += a[i] * b[i];
        norm_a += a[i] * a[i];
        norm_b += b[i] * b[i];
        i += 1;
    }
    finish_angular(dot, norm_a, norm_b)
}
