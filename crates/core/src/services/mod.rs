pub mod portfolio_service;
pub mod price_feed;
pub mod valuation_service;
