//! The four business questions, each computed independently from a
//! [`DataSource`](crate::store::DataSource).

pub mod albums;
pub mod countries;
pub mod employees;
pub mod genres;
pub mod rounding;

pub use albums::{
    AlbumPurchaseRow, AlbumPurchaseTable, InvoiceClassification, PurchaseKind, album_purchases,
    classify_invoices, is_album_purchase,
};
pub use countries::{
    CountryBucket, CountrySalesRow, CountrySalesTable, OTHER_BUCKET_LABEL, bucket_customers,
    country_sales,
};
pub use employees::{EmployeeSalesRow, EmployeeSalesTable, employee_sales};
pub use genres::{DEFAULT_GENRE_COUNTRY, GenreSalesQuery, GenreSalesRow, GenreSalesTable, genre_sales};
