//! Embedded Dormand-Prince 5(4) integrator with adaptive step control.

const C2: f64 = 1.0 / 5.0;
const C3: f64 = 3.0 / 10.0;
const C4: f64 = 4.0 / 5.0;
const C5: f64 = 8.0 / 9.0;

const A21: f64 = 1.0 / 5.0;
const A31: f64 = 3.0 / 40.0;
const A32: f64 = 9.0 / 40.0;
const A41: f64 = 44.0 / 45.0;
const A42: f64 = -56.0 / 15.0;
const A43: f64 = 32.0 / 9.0;
const A51: f64 = 19_372.0 / 6_561.0;
const A52: f64 = -25_360.0 / 2_187.0;
const A53: f64 = 64_448.0 / 6_561.0;
const A54: f64 = -212.0 / 729.0;
const A61: f64 = 9_017.0 / 3_168.0;
const A62: f64 = -355.0 / 33.0;
const A63: f64 = 46_732.0 / 5_247.0;
const A64: f64 = 49.0 / 176.0;
const A65: f64 = -5_103.0 / 18_656.0;

const B1: f64 = 35.0 / 384.0;
const B3: f64 = 500.0 / 1_113.0;
const B4: f64 = 125.0 / 192.0;
const B5: f64 = -2_187.0 / 6_784.0;
const B6: f64 = 11.0 / 84.0;

// Fifth-order minus fourth-order weights.
const E1: f64 = 71.0 / 57_600.0;
const E3: f64 = -71.0 / 16_695.0;
const E4: f64 = 71.0 / 1_920.0;
const E5: f64 = -17_253.0 / 339_200.0;
const E6: f64 = 22.0 / 525.0;
const E7: f64 = -1.0 / 40.0;

const SAFETY: f64 = 0.9;
const MIN_GROWTH: f64 = 0.2;
const MAX_GROWTH: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IntegrationError {
    #[error("step size underflow at z = {position}")]
    StepSizeUnderflow { position: f64 },
    #[error("exceeded {max_substeps} substeps before reaching z = {target}")]
    TooManySubsteps { max_substeps: usize, target: f64 },
    #[error("solution became non-finite at z = {position}")]
    NonFiniteState { position: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepControl {
    pub relative_tolerance: f64,
    pub absolute_tolerance: f64,
    pub max_substeps: usize,
}

/// Advances `state` from `start` to `end` (either direction) under
/// `derivative(z, y, dy)`.
///
/// `initial_step` is reused across calls so consecutive segments start from
/// the last accepted step size.
pub fn integrate_interval<F>(
    derivative: &mut F,
    state: &mut [f64],
    start: f64,
    end: f64,
    initial_step: &mut f64,
    control: StepControl,
) -> Result<usize, IntegrationError>
where
    F: FnMut(f64, &[f64], &mut [f64]),
{
    let span = end - start;
    if span == 0.0 {
        return Ok(0);
    }

    let direction = span.signum();
    let dimension = state.len();
    let mut stages = vec![vec![0.0; dimension]; 7];
    let mut probe = vec![0.0; dimension];
    let mut candidate = vec![0.0; dimension];

    let mut position = start;
    let mut step = if *initial_step > 0.0 {
        initial_step.min(span.abs())
    } else {
        span.abs() * 0.01
    };
    let mut accepted = 0;
    let mut attempts = 0;

    while (end - position) * direction > 0.0 {
        attempts += 1;
        if attempts > control.max_substeps {
            return Err(IntegrationError::TooManySubsteps {
                max_substeps: control.max_substeps,
                target: end,
            });
        }

        let remaining = (end - position).abs();
        let last_step = step >= remaining;
        if last_step {
            step = remaining;
        }
        let h = step * direction;

        derivative(position, state, &mut stages[0]);
        combine(state, h, &[(A21, &stages[0])], &mut probe);
        derivative(position + C2 * h, &probe, &mut stages[1]);
        combine(state, h, &[(A31, &stages[0]), (A32, &stages[1])], &mut probe);
        derivative(position + C3 * h, &probe, &mut stages[2]);
        combine(
            state,
            h,
            &[(A41, &stages[0]), (A42, &stages[1]), (A43, &stages[2])],
            &mut probe,
        );
        derivative(position + C4 * h, &probe, &mut stages[3]);
        combine(
            state,
            h,
            &[
                (A51, &stages[0]),
                (A52, &stages[1]),
                (A53, &stages[2]),
                (A54, &stages[3]),
            ],
            &mut probe,
        );
        derivative(position + C5 * h, &probe, &mut stages[4]);
        combine(
            state,
            h,
            &[
                (A61, &stages[0]),
                (A62, &stages[1]),
                (A63, &stages[2]),
                (A64, &stages[3]),
                (A65, &stages[4]),
            ],
            &mut probe,
        );
        derivative(position + h, &probe, &mut stages[5]);
        combine(
            state,
            h,
            &[
                (B1, &stages[0]),
                (B3, &stages[2]),
                (B4, &stages[3]),
                (B5, &stages[4]),
                (B6, &stages[5]),
            ],
            &mut candidate,
        );
        derivative(position + h, &candidate, &mut stages[6]);

        let mut error_sum = 0.0;
        for index in 0..dimension {
            let local_error = h
                * (E1 * stages[0][index]
                    + E3 * stages[2][index]
                    + E4 * stages[3][index]
                    + E5 * stages[4][index]
                    + E6 * stages[5][index]
                    + E7 * stages[6][index]);
            let scale = control.absolute_tolerance
                + control.relative_tolerance * state[index].abs().max(candidate[index].abs());
            error_sum += (local_error / scale).powi(2);
        }
        let error_norm = if dimension == 0 {
            0.0
        } else {
            (error_sum / dimension as f64).sqrt()
        };

        if !error_norm.is_finite() {
            return Err(IntegrationError::NonFiniteState { position });
        }

        let growth = if error_norm == 0.0 {
            MAX_GROWTH
        } else {
            (SAFETY * error_norm.powf(-0.2)).clamp(MIN_GROWTH, MAX_GROWTH)
        };

        if error_norm <= 1.0 {
            state.copy_from_slice(&candidate);
            position = if last_step { end } else { position + h };
            accepted += 1;
            if !last_step {
                *initial_step = step;
            }
            step *= growth;
        } else {
            step *= growth;
            if step <= f64::EPSILON * position.abs().max(span.abs()) {
                return Err(IntegrationError::StepSizeUnderflow { position });
            }
        }
    }

    Ok(accepted)
}

fn combine(base: &[f64], h: f64, terms: &[(f64, &Vec<f64>)], out: &mut [f64]) {
    for index in 0..base.len() {
        let mut increment = 0.0;
        for (weight, stage) in terms {
            increment += weight * stage[index];
        }
        out[index] = base[index] + h * increment;
    }
}
