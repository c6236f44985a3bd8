//! Summary statistics over the cleaned dataset

pub mod dashboard;

pub use dashboard::DatasetOverview;
