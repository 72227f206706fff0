pub mod analytics;
pub mod form;
pub mod holding;
pub mod portfolio;
pub mod price;
pub mod quote;
pub mod settings;
pub mod weight;
