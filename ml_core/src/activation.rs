/// Hidden-unit activation kind.
///
/// The `WithDropout` variants additionally enable input dropout during
/// training; the hidden nonlinearity itself is unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Tanh,
    TanhWithDropout,
    Rectifier,
    RectifierWithDropout,
}

impl Activation {
    /// Applies the nonlinearity to a pre-activation value.
    #[inline]
    pub fn f(self, z: f32) -> f32 {
        match self {
            Activation::Tanh | Activation::TanhWithDropout => z.tanh(),
            Activation::Rectifier | Activation::RectifierWithDropout => z.max(0.0),
        }
    }

    /// Derivative with respect to the pre-activation `z`.
    #[inline]
    pub fn df(self, z: f32) -> f32 {
        match self {
            Activation::Tanh | Activation::TanhWithDropout => {
                let t = z.tanh();
                1.0 - t * t
            }
            Activation::Rectifier | Activation::RectifierWithDropout => {
                if z > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Whether training should drop input features for this kind.
    #[inline]
    pub fn uses_input_dropout(self) -> bool {
        matches!(
            self,
            Activation::TanhWithDropout | Activation::RectifierWithDropout
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rectifier_clamps_negatives() {
        assert_eq!(Activation::Rectifier.f(-3.0), 0.0);
        assert_eq!(Activation::Rectifier.f(2.5), 2.5);
        assert_eq!(Activation::Rectifier.df(-0.1), 0.0);
        assert_eq!(Activation::Rectifier.df(0.1), 1.0);
    }

    #[test]
    fn tanh_derivative_matches_identity() {
        let z = 0.7f32;
        let t = z.tanh();
        assert!((Activation::Tanh.df(z) - (1.0 - t * t)).abs() < 1e-6);
    }

    #[test]
    fn dropout_only_on_dropout_variants() {
        assert!(Activation::RectifierWithDropout.uses_input_dropout());
        assert!(Activation::TanhWithDropout.uses_input_dropout());
        assert!(!Activation::Rectifier.uses_input_dropout());
        assert!(!Activation::Tanh.uses_input_dropout());
    }
}
