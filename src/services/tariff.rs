//! Tariff band selection and post-solar bill computation.

use tracing::debug;

use crate::config::{ExportCreditTiming, TariffSchedule, TariffTier, TaxOrder};
use crate::errors::EstimateError;
use crate::models::estimate::{BillBreakdown, SurchargeLine, TariffBand};

impl TariffSchedule {
    /// Low band up to and including `low_band_max_bill`, high band from
    /// `high_band_min_bill`. Anything in between has no defined rate.
    pub fn band_for_bill(&self, bill: f64) -> Result<TariffBand, EstimateError> {
        if !bill.is_finite() {
            return Err(EstimateError::invalid("monthly_bill", "must be a number"));
        }
        if bill <= 0.0 {
            return Err(EstimateError::invalid("monthly_bill", format!("must be greater than zero, got {bill}")));
        }
        if bill <= self.low_band_max_bill {
            Ok(TariffBand::Low)
        } else if bill >= self.high_band_min_bill {
            Ok(TariffBand::High)
        } else {
            Err(EstimateError::UndefinedTariffBand {
                bill,
                low_max: self.low_band_max_bill,
                high_min: self.high_band_min_bill,
            })
        }
    }

    pub fn tier(&self, band: TariffBand) -> &TariffTier {
        match band {
            TariffBand::Low => &self.low,
            TariffBand::High => &self.high,
        }
    }

    /// Monthly kWh implied by a bill at its band's all-in rate.
    pub fn estimate_consumption(&self, bill: f64) -> Result<(TariffBand, f64), EstimateError> {
        let band = self.band_for_bill(bill)?;
        Ok((band, bill / self.tier(band).rate()))
    }

    /// Factor the surcharges multiply a pre-tax subtotal by.
    fn tax_multiplier(&self) -> f64 {
        let rates = self.surcharges.iter().map(|s| s.rate);
        match self.tax_policy.order {
            TaxOrder::Compounding => rates.fold(1.0, |acc, r| acc * (1.0 + r)),
            TaxOrder::Flat => 1.0 + rates.sum::<f64>(),
        }
    }

    fn surcharge_lines(&self, subtotal: f64) -> Vec<SurchargeLine> {
        let mut running = subtotal;
        self.surcharges
            .iter()
            .map(|s| {
                let base = match self.tax_policy.order {
                    TaxOrder::Compounding => running,
                    TaxOrder::Flat => subtotal,
                };
                let amount = base * s.rate;
                running += amount;
                SurchargeLine { name: s.name.clone(), amount }
            })
            .collect()
    }

    /// Bill for the energy still drawn from the grid after solar, with
    /// `exported_kwh` credited against the energy sub-charge only.
    pub fn bill_for_grid_draw(&self, grid_kwh: f64, exported_kwh: f64) -> BillBreakdown {
        let grid_kwh = grid_kwh.max(0.0);
        let tier = if grid_kwh <= self.tier_boundary_kwh { &self.low } else { &self.high };

        let energy_charge = grid_kwh * tier.energy_rate;
        let capacity_charge = grid_kwh * tier.capacity_rate;
        let network_charge = grid_kwh * tier.network_rate;
        let credit_available = exported_kwh.max(0.0) * self.export_credit_rate;

        let waived = grid_kwh <= self.waiver_threshold_kwh;
        let retail_charge = if waived { 0.0 } else { self.retail_charge };
        let multiplier = if waived { 1.0 } else { self.tax_multiplier() };

        let (export_credit, taxable) = match self.tax_policy.export_credit {
            ExportCreditTiming::BeforeTax => {
                let credit = credit_available.min(energy_charge);
                (credit, energy_charge - credit + capacity_charge + network_charge + retail_charge)
            }
            ExportCreditTiming::AfterTax => {
                let credit = credit_available.min(energy_charge * multiplier);
                (credit, energy_charge + capacity_charge + network_charge + retail_charge)
            }
        };

        let surcharges = if waived { Vec::new() } else { self.surcharge_lines(taxable) };
        let taxed: f64 = taxable + surcharges.iter().map(|l| l.amount).sum::<f64>();
        let total = match self.tax_policy.export_credit {
            ExportCreditTiming::BeforeTax => taxed,
            ExportCreditTiming::AfterTax => taxed - export_credit,
        }
        .max(0.0);

        debug!(grid_kwh, exported_kwh, waived, total, "post-solar bill");

        BillBreakdown {
            energy_charge,
            capacity_charge,
            network_charge,
            retail_charge,
            export_credit,
            surcharges,
            waived,
            total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TaxPolicy;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 0.01
    }

    #[test]
    fn low_and_high_band_consumption() {
        let t = TariffSchedule::default();
        let (band, kwh) = t.estimate_consumption(600.0).unwrap();
        assert_eq!(band, TariffBand::Low);
        assert!(close(kwh, 1350.44), "got {kwh}");

        let (band, kwh) = t.estimate_consumption(900.0).unwrap();
        assert_eq!(band, TariffBand::High);
        assert!(close(kwh, 1653.5), "got {kwh}");
    }

    #[test]
    fn band_edges_are_inclusive() {
        let t = TariffSchedule::default();
        assert_eq!(t.band_for_bill(t.low_band_max_bill).unwrap(), TariffBand::Low);
        assert_eq!(t.band_for_bill(t.high_band_min_bill).unwrap(), TariffBand::High);
    }

    #[test]
    fn middle_band_is_rejected() {
        let t = TariffSchedule::default();
        for bill in [666.46, 700.0, 816.44] {
            let err = t.band_for_bill(bill).unwrap_err();
            assert!(matches!(err, EstimateError::UndefinedTariffBand { .. }), "{bill}: {err}");
        }
    }

    #[test]
    fn non_positive_or_nan_bill_is_invalid() {
        let t = TariffSchedule::default();
        for bill in [0.0, -50.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(t.band_for_bill(bill), Err(EstimateError::InvalidInput { field: "monthly_bill", .. })));
        }
    }

    #[test]
    fn compounding_surcharges() {
        let t = TariffSchedule::default();
        let bill = t.bill_for_grid_draw(1000.0, 0.0);
        // 270.30 + 45.50 + 128.50 + 10.00
        assert!(close(bill.energy_charge + bill.capacity_charge + bill.network_charge + bill.retail_charge, 454.30));
        assert_eq!(bill.surcharges.len(), 2);
        assert!(close(bill.surcharges[0].amount, 7.27));
        assert!(close(bill.surcharges[1].amount, 36.93));
        assert!(close(bill.total, 498.49), "got {}", bill.total);
        assert!(!bill.waived);
    }

    #[test]
    fn flat_order_taxes_the_pre_tax_subtotal() {
        let mut t = TariffSchedule::default();
        t.tax_policy = TaxPolicy { order: TaxOrder::Flat, ..TaxPolicy::default() };
        let flat = t.bill_for_grid_draw(1000.0, 0.0);
        assert!(close(flat.total, 497.91), "got {}", flat.total);

        let compounding = TariffSchedule::default().bill_for_grid_draw(1000.0, 0.0);
        assert!(compounding.total > flat.total);
    }

    #[test]
    fn small_draw_is_waived() {
        let t = TariffSchedule::default();
        let bill = t.bill_for_grid_draw(500.0, 0.0);
        assert!(bill.waived);
        assert!(bill.surcharges.is_empty());
        assert_eq!(bill.retail_charge, 0.0);
        assert!(close(bill.total, 222.15));
    }

    #[test]
    fn draw_above_boundary_uses_high_energy_rate() {
        let t = TariffSchedule::default();
        let bill = t.bill_for_grid_draw(2000.0, 0.0);
        assert!(close(bill.energy_charge, 740.60));
    }

    #[test]
    fn export_credit_never_exceeds_energy_charge() {
        let t = TariffSchedule::default();
        let bill = t.bill_for_grid_draw(100.0, 1000.0);
        assert!(close(bill.export_credit, bill.energy_charge));
        assert!(close(bill.total, 17.40), "got {}", bill.total);
    }

    #[test]
    fn export_credit_after_tax_is_floored() {
        let mut t = TariffSchedule::default();
        t.tax_policy.export_credit = ExportCreditTiming::AfterTax;
        let bill = t.bill_for_grid_draw(800.0, 5000.0);
        assert!(bill.total >= 0.0);

        let before = TariffSchedule::default().bill_for_grid_draw(800.0, 100.0);
        let after = t.bill_for_grid_draw(800.0, 100.0);
        // crediting after tax leaves the surcharges on the full energy charge
        assert!(after.surcharges[0].amount > before.surcharges[0].amount);
        assert!(close(after.export_credit, before.export_credit));
    }
}
