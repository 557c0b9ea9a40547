use crate::config::{FinancingTerms, PriceTable};
use crate::errors::EstimateError;
use crate::models::estimate::CostQuote;

impl PriceTable {
    /// Package price for `panel_count` panels: the highest tier whose
    /// breakpoint is not above the count, extended linearly per extra panel.
    pub fn price_for(&self, panel_count: u32) -> Result<f64, EstimateError> {
        let tier = self
            .tiers
            .iter()
            .rev()
            .find(|t| t.min_panels <= panel_count)
            .ok_or_else(|| {
                let smallest = self.tiers.first().map_or(0, |t| t.min_panels);
                EstimateError::invalid("panel_count", format!("{panel_count} is below the smallest package of {smallest} panels"))
            })?;
        Ok(tier.base_price + f64::from(panel_count - tier.min_panels) * tier.per_panel_increment)
    }

    /// Smallest package breakpoint able to hold `panels` panels.
    pub fn package_at_least(&self, panels: u32) -> Option<u32> {
        self.tiers.iter().map(|t| t.min_panels).find(|&p| p >= panels)
    }

    pub fn quote(
        &self,
        panel_count: u32,
        include_battery: bool,
        online_view: bool,
        financing: &FinancingTerms,
    ) -> Result<CostQuote, EstimateError> {
        let base_price = self.price_for(panel_count)?;
        let battery_surcharge = if include_battery { self.battery_surcharge } else { 0.0 };
        let online_buffer = if online_view { self.online_buffer } else { 0.0 };
        let cash_price = base_price + battery_surcharge + online_buffer;
        let (installment_total, monthly_installment) = financing.installment(cash_price);

        Ok(CostQuote {
            base_price,
            battery_surcharge,
            online_buffer,
            cash_price,
            installment_total,
            monthly_installment,
            term_months: financing.term_months,
        })
    }
}

impl FinancingTerms {
    /// (total repaid, monthly payment) for a cash price.
    pub fn installment(&self, cash_price: f64) -> (f64, f64) {
        let total = cash_price * (1.0 + self.interest_rate);
        (total, total / f64::from(self.term_months.max(1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breakpoints_match_table() {
        let table = PriceTable::default();
        for tier in &table.tiers {
            assert_eq!(table.price_for(tier.min_panels).unwrap(), tier.base_price);
        }
    }

    #[test]
    fn linear_extension_above_breakpoint() {
        let table = PriceTable::default();
        assert_eq!(table.price_for(12).unwrap(), 19000.0);
        assert_eq!(table.price_for(19).unwrap(), 26000.0);
        assert_eq!(table.price_for(55).unwrap(), 60000.0);
    }

    #[test]
    fn price_never_decreases_with_panel_count() {
        let table = PriceTable::default();
        let prices: Vec<f64> = (10..=100).map(|n| table.price_for(n).unwrap()).collect();
        assert!(prices.windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn below_smallest_package_is_invalid() {
        let err = PriceTable::default().price_for(9).unwrap_err();
        assert!(matches!(err, EstimateError::InvalidInput { field: "panel_count", .. }));
    }

    #[test]
    fn package_rounding() {
        let table = PriceTable::default();
        assert_eq!(table.package_at_least(3), Some(10));
        assert_eq!(table.package_at_least(20), Some(20));
        assert_eq!(table.package_at_least(21), Some(30));
        assert_eq!(table.package_at_least(41), None);
    }

    #[test]
    fn quote_with_extras_and_installments() {
        let table = PriceTable::default();
        let financing = FinancingTerms { interest_rate: 0.05, term_months: 60 };
        let q = table.quote(10, true, true, &financing).unwrap();
        assert_eq!(q.cash_price, 17000.0 + 12000.0 + 1500.0);
        assert!((q.installment_total - 32025.0).abs() < 1e-6);
        assert!((q.monthly_installment - 533.75).abs() < 1e-6);
        assert_eq!(q.term_months, 60);

        let plain = table.quote(10, false, false, &financing).unwrap();
        assert_eq!(plain.cash_price, 17000.0);
        assert_eq!(plain.battery_surcharge, 0.0);
    }
}
