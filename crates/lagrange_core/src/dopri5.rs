use crate::error::SingularStateError;
use crate::traits::DynamicalSystem;

// Dormand-Prince 5(4) tableau.
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

const A51: f64 = 19372.0 / 6561.0;
const A52: f64 = -25360.0 / 2187.0;
const A53: f64 = 64448.0 / 6561.0;
const A54: f64 = -212.0 / 729.0;

const A61: f64 = 9017.0 / 3168.0;
const A62: f64 = -355.0 / 33.0;
const A63: f64 = 46732.0 / 5247.0;
const A64: f64 = 49.0 / 176.0;
const A65: f64 = -5103.0 / 18656.0;

// 5th order weights (a7j, FSAL).
const A71: f64 = 35.0 / 384.0;
const A73: f64 = 500.0 / 1113.0;
const A74: f64 = 125.0 / 192.0;
const A75: f64 = -2187.0 / 6784.0;
const A76: f64 = 11.0 / 84.0;

// Difference between the 5th and 4th order weights.
const E1: f64 = 71.0 / 57600.0;
const E3: f64 = -71.0 / 16695.0;
const E4: f64 = 71.0 / 1920.0;
const E5: f64 = -17253.0 / 339200.0;
const E6: f64 = 22.0 / 525.0;
const E7: f64 = -1.0 / 40.0;

// Continuous extension (Hairer & Wanner, dopri5 contd5).
const D1: f64 = -12715105075.0 / 11282082432.0;
const D3: f64 = 87487479700.0 / 32700410799.0;
const D4: f64 = -10690763975.0 / 1880347072.0;
const D5: f64 = 701980252875.0 / 199316789632.0;
const D6: f64 = -1453857185.0 / 822651844.0;
const D7: f64 = 69997945.0 / 29380423.0;

/// Number of derivative evaluations per attempted step (k1 is reused).
pub const STAGES_PER_STEP: usize = 6;

/// Dormand-Prince 5(4) stepper with stage buffers and dense output.
///
/// The caller seeds `k1` with `f(t, y)` once; afterwards every accepted step
/// leaves the next `k1` in place (first-same-as-last).
pub struct DormandPrince {
    k1: Vec<f64>,
    k2: Vec<f64>,
    k3: Vec<f64>,
    k4: Vec<f64>,
    k5: Vec<f64>,
    k6: Vec<f64>,
    k7: Vec<f64>,
    tmp: Vec<f64>,
    y_new: Vec<f64>,
    rcont: [Vec<f64>; 5],
}

impl DormandPrince {
    pub fn new(dim: usize) -> Self {
        Self {
            k1: vec![0.0; dim],
            k2: vec![0.0; dim],
            k3: vec![0.0; dim],
            k4: vec![0.0; dim],
            k5: vec![0.0; dim],
            k6: vec![0.0; dim],
            k7: vec![0.0; dim],
            tmp: vec![0.0; dim],
            y_new: vec![0.0; dim],
            rcont: [
                vec![0.0; dim],
                vec![0.0; dim],
                vec![0.0; dim],
                vec![0.0; dim],
                vec![0.0; dim],
            ],
        }
    }

    /// Evaluates `f(t, y)` into the first stage.
    pub fn seed(
        &mut self,
        system: &impl DynamicalSystem,
        t: f64,
        y: &[f64],
    ) -> Result<(), SingularStateError> {
        system.apply(t, y, &mut self.k1)
    }

    /// Derivative at the start of the next step.
    pub fn first_stage(&self) -> &[f64] {
        &self.k1
    }

    /// Computes a trial step of size `h` from `(t, y)` and returns the scaled
    /// RMS error estimate. Nothing is committed; a rejected trial simply gets
    /// retried from the same `(t, y)`.
    pub fn attempt(
        &mut self,
        system: &impl DynamicalSystem,
        t: f64,
        y: &[f64],
        h: f64,
        rtol: f64,
        atol: f64,
    ) -> Result<f64, SingularStateError> {
        let n = y.len();

        // k2
        for i in 0..n {
            self.tmp[i] = y[i] + h * (A21 * self.k1[i]);
        }
        system.apply(t + C2 * h, &self.tmp, &mut self.k2)?;

        // k3
        for i in 0..n {
            self.tmp[i] = y[i] + h * (A31 * self.k1[i] + A32 * self.k2[i]);
        }
        system.apply(t + C3 * h, &self.tmp, &mut self.k3)?;

        // k4
        for i in 0..n {
            self.tmp[i] = y[i] + h * (A41 * self.k1[i] + A42 * self.k2[i] + A43 * self.k3[i]);
        }
        system.apply(t + C4 * h, &self.tmp, &mut self.k4)?;

        // k5
        for i in 0..n {
            self.tmp[i] = y[i]
                + h * (A51 * self.k1[i] + A52 * self.k2[i] + A53 * self.k3[i] + A54 * self.k4[i]);
        }
        system.apply(t + C5 * h, &self.tmp, &mut self.k5)?;

        // k6
        for i in 0..n {
            self.tmp[i] = y[i]
                + h * (A61 * self.k1[i]
                    + A62 * self.k2[i]
                    + A63 * self.k3[i]
                    + A64 * self.k4[i]
                    + A65 * self.k5[i]);
        }
        system.apply(t + h, &self.tmp, &mut self.k6)?;

        // 5th order solution, then k7 = f(t + h, y_new)
        for i in 0..n {
            self.y_new[i] = y[i]
                + h * (A71 * self.k1[i]
                    + A73 * self.k3[i]
                    + A74 * self.k4[i]
                    + A75 * self.k5[i]
                    + A76 * self.k6[i]);
        }
        system.apply(t + h, &self.y_new, &mut self.k7)?;

        let mut sum = 0.0;
        for i in 0..n {
            let err = h
                * (E1 * self.k1[i]
                    + E3 * self.k3[i]
                    + E4 * self.k4[i]
                    + E5 * self.k5[i]
                    + E6 * self.k6[i]
                    + E7 * self.k7[i]);
            let scale = atol + rtol * y[i].abs().max(self.y_new[i].abs());
            let ratio = err / scale;
            sum += ratio * ratio;
        }

        Ok((sum / n as f64).sqrt())
    }

    /// Commits the last trial step: builds the interpolant over `[t, t + h]`,
    /// writes the new state into `y` and rotates k7 into k1.
    pub fn accept(&mut self, y: &mut [f64], h: f64) {
        let n = y.len();
        let [r0, r1, r2, r3, r4] = &mut self.rcont;
        for i in 0..n {
            let ydiff = self.y_new[i] - y[i];
            let bspl = h * self.k1[i] - ydiff;
            r0[i] = y[i];
            r1[i] = ydiff;
            r2[i] = bspl;
            r3[i] = ydiff - h * self.k7[i] - bspl;
            r4[i] = h
                * (D1 * self.k1[i]
                    + D3 * self.k3[i]
                    + D4 * self.k4[i]
                    + D5 * self.k5[i]
                    + D6 * self.k6[i]
                    + D7 * self.k7[i]);
        }

        y.copy_from_slice(&self.y_new);
        std::mem::swap(&mut self.k1, &mut self.k7);
    }

    /// Evaluates the interpolant of the last accepted step at
    /// `theta = (t_out - t_step) / h`, `0 <= theta <= 1`.
    pub fn interpolate(&self, theta: f64, out: &mut [f64]) {
        let theta1 = 1.0 - theta;
        let [r0, r1, r2, r3, r4] = &self.rcont;
        for i in 0..out.len() {
            out[i] = r0[i] + theta * (r1[i] + theta1 * (r2[i] + theta * (r3[i] + theta1 * r4[i])));
        }
    }
}
