use anyhow::Result;

use crate::models::{Customer, Employee, Genre, Invoice, InvoiceLine, Track};

/// Read-only access to the media-store dataset.
///
/// Every analysis step receives a `&dyn DataSource` and pulls only the
/// tables it needs. Implementations must not mutate the underlying store.
pub trait DataSource {
    fn customers(&self) -> Result<Vec<Customer>>;
    fn invoices(&self) -> Result<Vec<Invoice>>;
    fn invoice_lines(&self) -> Result<Vec<InvoiceLine>>;
    fn tracks(&self) -> Result<Vec<Track>>;
    fn genres(&self) -> Result<Vec<Genre>>;
    fn employees(&self) -> Result<Vec<Employee>>;
}

/// Fixture dataset held entirely in memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemorySource {
    pub customers: Vec<Customer>,
    pub invoices: Vec<Invoice>,
    pub invoice_lines: Vec<InvoiceLine>,
    pub tracks: Vec<Track>,
    pub genres: Vec<Genre>,
    pub employees: Vec<Employee>,
}

impl MemorySource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_customer(mut self, customer_id: i64, country: &str, support_rep_id: Option<i64>) -> Self {
        self.customers.push(Customer {
            customer_id,
            country: Some(country.to_string()),
            support_rep_id,
        });
        self
    }

    #[must_use]
    pub fn with_invoice(mut self, invoice: Invoice) -> Self {
        self.invoices.push(invoice);
        self
    }

    /// Appends one line per track, numbering lines after the existing ones.
    #[must_use]
    pub fn with_lines(mut self, invoice_id: i64, track_ids: &[i64]) -> Self {
        for &track_id in track_ids {
            let invoice_line_id = self.next_invoice_line_id();
            self.invoice_lines.push(InvoiceLine {
                invoice_line_id,
                invoice_id,
                track_id,
            });
        }
        self
    }

    #[must_use]
    pub fn with_track(mut self, track_id: i64, album_id: Option<i64>, genre_id: Option<i64>) -> Self {
        self.tracks.push(Track {
            track_id,
            album_id,
            genre_id,
        });
        self
    }

    #[must_use]
    pub fn with_genre(mut self, genre_id: i64, name: &str) -> Self {
        self.genres.push(Genre {
            genre_id,
            name: Some(name.to_string()),
        });
        self
    }

    #[must_use]
    pub fn with_employee(
        mut self,
        employee_id: i64,
        first_name: &str,
        last_name: &str,
        hire_date: &str,
    ) -> Self {
        self.employees.push(Employee {
            employee_id,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            hire_date: hire_date.to_string(),
        });
        self
    }

    fn next_invoice_line_id(&self) -> i64 {
        self.invoice_lines
            .iter()
            .map(|line| line.invoice_line_id)
            .max()
            .unwrap_or(0)
            + 1
    }
}

impl DataSource for MemorySource {
    fn customers(&self) -> Result<Vec<Customer>> {
        Ok(self.customers.clone())
    }

    fn invoices(&self) -> Result<Vec<Invoice>> {
        Ok(self.invoices.clone())
    }

    fn invoice_lines(&self) -> Result<Vec<InvoiceLine>> {
        Ok(self.invoice_lines.clone())
    }

    fn tracks(&self) -> Result<Vec<Track>> {
        Ok(self.tracks.clone())
    }

    fn genres(&self) -> Result<Vec<Genre>> {
        Ok(self.genres.clone())
    }

    fn employees(&self) -> Result<Vec<Employee>> {
        Ok(self.employees.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::{DataSource, MemorySource};

    #[test]
    fn numbers_invoice_lines_sequentially_across_invoices() {
        let source = MemorySource::new()
            .with_lines(1, &[5, 6])
            .with_lines(2, &[7]);
        let lines = source.invoice_lines().expect("lines should load");

        let ids = lines
            .iter()
            .map(|line| (line.invoice_line_id, line.invoice_id, line.track_id))
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![(1, 1, 5), (2, 1, 6), (3, 2, 7)]);
    }
}
