use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: i64,
    pub country: Option<String>,
    pub support_rep_id: Option<i64>,
}

/// Invoice totals are held in cents so repeated sums stay exact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub invoice_id: i64,
    pub customer_id: i64,
    pub invoice_date: String,
    pub total_cents: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub invoice_line_id: i64,
    pub invoice_id: i64,
    pub track_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub track_id: i64,
    pub album_id: Option<i64>,
    pub genre_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub genre_id: i64,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub employee_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub hire_date: String,
}

impl Employee {
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl Invoice {
    #[must_use]
    pub fn new(invoice_id: i64, customer_id: i64, total_cents: i64) -> Self {
        Self {
            invoice_id,
            customer_id,
            invoice_date: String::new(),
            total_cents,
        }
    }

    #[must_use]
    pub fn with_date(mut self, invoice_date: impl Into<String>) -> Self {
        self.invoice_date = invoice_date.into();
        self
    }
}

/// Converts a stored decimal amount (e.g. `5.94`) to whole cents,
/// rounding half away from zero.
#[must_use]
pub fn amount_to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

#[must_use]
pub fn cents_to_amount(cents: i64) -> f64 {
    cents as f64 / 100.0
}

#[cfg(test)]
mod tests {
    use super::{Employee, amount_to_cents, cents_to_amount};

    #[test]
    fn converts_stored_amounts_to_cents() {
        assert_eq!(amount_to_cents(0.99), 99);
        assert_eq!(amount_to_cents(13.86), 1386);
        assert_eq!(cents_to_amount(1386), 13.86);
    }

    #[test]
    fn display_name_joins_first_and_last() {
        let employee = Employee {
            employee_id: 3,
            first_name: "Jane".to_string(),
            last_name: "Peacock".to_string(),
            hire_date: "2017-04-01 00:00:00".to_string(),
        };
        assert_eq!(employee.display_name(), "Jane Peacock");
    }
}
