//! Protein — grown on a ribosome's product site, then set loose.

use geneflow_core::types::ProductKind;

#[derive(Debug, Clone)]
pub struct Protein {
    product: ProductKind,
    growth: f64,
}

impl Protein {
    pub fn new(product: ProductKind) -> Self {
        Self { product, growth: 0.0 }
    }

    pub fn product(&self) -> ProductKind {
        self.product
    }

    /// Share of the full protein built so far, in `[0, 1]`.
    pub fn growth(&self) -> f64 {
        self.growth
    }

    pub fn set_growth(&mut self, growth: f64) {
        self.growth = growth.clamp(0.0, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn growth_is_clamped() {
        let mut p = Protein::new(ProductKind(2));
        p.set_growth(1.7);
        assert_eq!(p.growth(), 1.0);
        p.set_growth(-1.0);
        assert_eq!(p.growth(), 0.0);
        assert_eq!(p.product(), ProductKind(2));
    }
}
