//! Minimal complex-number type for the orbit iteration.
//!
//! Only the handful of operations the sampler actually needs; not a
//! general-purpose numeric type.

/// A point in the complex plane, `re + im*i`.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Complex64 {
    pub re: f64,
    pub im: f64,
}

impl Complex64 {
    pub const ZERO: Complex64 = Complex64 { re: 0.0, im: 0.0 };

    pub const fn new(re: f64, im: f64) -> Self {
        Complex64 { re, im }
    }

    /// `|z|^2`, avoids the sqrt the escape/bailout tests don't need.
    pub fn norm_sqr(self) -> f64 {
        self.re * self.re + self.im * self.im
    }

    pub fn conj(self) -> Complex64 {
        Complex64::new(self.re, -self.im)
    }

    /// `z^2 + c`
    pub fn step(self, c: Complex64) -> Complex64 {
        Complex64::new(
            self.re * self.re - self.im * self.im + c.re,
            2.0 * self.re * self.im + c.im,
        )
    }
}

impl std::ops::Sub for Complex64 {
    type Output = Complex64;
    fn sub(self, rhs: Complex64) -> Complex64 {
        Complex64::new(self.re - rhs.re, self.im - rhs.im)
    }
}

impl std::ops::Add for Complex64 {
    type Output = Complex64;
    fn add(self, rhs: Complex64) -> Complex64 {
        Complex64::new(self.re + rhs.re, self.im + rhs.im)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_matches_definition() {
        let z = Complex64::new(1.0, 2.0);
        let c = Complex64::new(0.5, -0.5);
        let next = z.step(c);
        assert_eq!(next, Complex64::new(1.0 * 1.0 - 2.0 * 2.0 + 0.5, 2.0 * 1.0 * 2.0 - 0.5));
    }

    #[test]
    fn norm_sqr_is_squared_modulus() {
        let z = Complex64::new(3.0, 4.0);
        assert_eq!(z.norm_sqr(), 25.0);
    }
}
