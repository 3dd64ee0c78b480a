// src/domain/projection.rs

use crate::errors::ValidationError;
use serde::{Deserialize, Serialize};

/// Financing and tax assumptions shared by every record in one pipeline run.
/// The horizon is fixed per run so that costs stay comparable across the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionConfig {
    /// Annual interest rate as a fraction (0.085 for 8.5%).
    pub annual_interest_rate: f64,
    pub down_payment_fraction: f64,
    pub loan_term_years: u32,
    pub horizon_years: u32,
    /// One-time acquisition tax as a fraction of price.
    pub buy_tax_fraction: f64,
    /// Rent-side tax expressed as a number of months of rent.
    pub rent_tax_months: f64,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            annual_interest_rate: 0.085,
            down_payment_fraction: 0.25,
            loan_term_years: 20,
            horizon_years: 20,
            buy_tax_fraction: 0.15,
            rent_tax_months: 60.0,
        }
    }
}

impl ProjectionConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.annual_interest_rate.is_finite()
            || !(0.0..1.0).contains(&self.annual_interest_rate)
        {
            return Err(ValidationError::new(
                "interest_rate",
                format!("annual rate must be in [0, 1), got {}", self.annual_interest_rate),
            ));
        }
        if !self.down_payment_fraction.is_finite()
            || !(0.0..=1.0).contains(&self.down_payment_fraction)
        {
            return Err(ValidationError::new(
                "down_payment",
                format!("fraction must be in [0, 1], got {}", self.down_payment_fraction),
            ));
        }
        if self.loan_term_years == 0 {
            return Err(ValidationError::new("term_years", "loan term must be at least one year"));
        }
        if self.horizon_years == 0 {
            return Err(ValidationError::new("horizon_years", "horizon must be at least one year"));
        }
        if !self.buy_tax_fraction.is_finite() || self.buy_tax_fraction < 0.0 {
            return Err(ValidationError::new("buy_tax", "must be a non-negative fraction"));
        }
        if !self.rent_tax_months.is_finite() || self.rent_tax_months < 0.0 {
            return Err(ValidationError::new("rent_tax_months", "must be non-negative"));
        }
        Ok(())
    }

    pub fn monthly_rate(&self) -> f64 {
        self.annual_interest_rate / 12.0
    }

    pub fn installments(&self) -> u32 {
        self.loan_term_years * 12
    }
}

/// Cost figures for a single property.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub down_payment: f64,
    pub loan_amount: f64,
    pub monthly_emi: f64,
    pub total_tax_buy: f64,
    pub total_tax_rent: f64,
    pub final_buying_cost: f64,
    pub final_renting_cost: f64,
}

/// Projects buying and renting costs for one property.
///
/// Buying cost is a one-time acquisition figure (price plus tax); it does not
/// grow with the horizon. Renting cost accumulates monthly rent over the horizon
/// plus the rent-side tax.
pub fn project(
    price: f64,
    monthly_rent: f64,
    cfg: &ProjectionConfig,
) -> Result<Projection, ValidationError> {
    if !price.is_finite() || price < 0.0 {
        return Err(ValidationError::new(
            "price_value",
            format!("price must be finite and non-negative, got {price}"),
        ));
    }
    if !monthly_rent.is_finite() || monthly_rent < 0.0 {
        return Err(ValidationError::new(
            "imputed_rent",
            format!("rent must be finite and non-negative, got {monthly_rent}"),
        ));
    }

    let down_payment = price * cfg.down_payment_fraction;
    let loan_amount = (price - down_payment).max(0.0);
    let monthly_emi = monthly_installment(loan_amount, cfg.monthly_rate(), cfg.installments());

    let total_tax_buy = price * cfg.buy_tax_fraction;
    let total_tax_rent = monthly_rent * cfg.rent_tax_months;

    Ok(Projection {
        down_payment,
        loan_amount,
        monthly_emi,
        total_tax_buy,
        total_tax_rent,
        final_buying_cost: price + total_tax_buy,
        final_renting_cost: monthly_rent * 12.0 * cfg.horizon_years as f64 + total_tax_rent,
    })
}

/// Fixed-rate amortization: L·r·(1+r)^n / ((1+r)^n − 1).
///
/// A zero loan pays nothing; a zero rate degrades to straight division L / n.
pub fn monthly_installment(loan: f64, monthly_rate: f64, installments: u32) -> f64 {
    if loan <= 0.0 {
        return 0.0;
    }
    if installments == 0 {
        return loan;
    }
    let n = installments as f64;
    if monthly_rate == 0.0 {
        return loan / n;
    }
    let growth = (1.0 + monthly_rate).powf(n);
    loan * monthly_rate * growth / (growth - 1.0)
}
