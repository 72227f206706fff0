// ═══════════════════════════════════════════════════════════════════
// Service Tests — PriceFeed, ValuationService, PortfolioService
// ═══════════════════════════════════════════════════════════════════

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

use silver_tracker_core::errors::CoreError;
use silver_tracker_core::models::form::HoldingForm;
use silver_tracker_core::models::holding::{Holding, HoldingStatus};
use silver_tracker_core::models::portfolio::Portfolio;
use silver_tracker_core::models::quote::{Quote, QuoteSource, SpotReading, FALLBACK_PRICE};
use silver_tracker_core::models::weight::WeightUnit;
use silver_tracker_core::providers::traits::SpotPriceProvider;
use silver_tracker_core::services::portfolio_service::PortfolioService;
use silver_tracker_core::services::price_feed::{synthetic_history, PriceFeed};
use silver_tracker_core::services::valuation_service::{
    ValuationService, WEEKLY_CHANGE_PLACEHOLDER,
};

// ═══════════════════════════════════════════════════════════════════
// Test Helpers
// ═══════════════════════════════════════════════════════════════════

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn holding(name: &str, paid: f64, spot_at_purchase: f64, weight_oz: f64) -> Holding {
    Holding::new(name, paid, spot_at_purchase, weight_oz, date(2024, 3, 1))
}

fn quote(price: f64, previous_close: Option<f64>) -> Quote {
    Quote {
        price,
        previous_close,
        open: price,
        high: price,
        low: price,
        timestamp: Utc::now(),
        source: QuoteSource::MetalsDev,
    }
}

enum Answer {
    Reading(SpotReading),
    Error,
}

struct MockProvider {
    answer: Answer,
}

#[async_trait]
impl SpotPriceProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn source(&self) -> QuoteSource {
        QuoteSource::MetalsDev
    }

    async fn fetch_spot(&self) -> Result<SpotReading, CoreError> {
        match self.answer {
            Answer::Reading(r) => Ok(r),
            Answer::Error => Err(CoreError::Network("connection refused".into())),
        }
    }
}

fn feed(answer: Answer) -> PriceFeed {
    PriceFeed::new(Arc::new(MockProvider { answer }))
}

// ═══════════════════════════════════════════════════════════════════
// PriceFeed
// ═══════════════════════════════════════════════════════════════════

mod price_feed {
    use super::*;

    #[tokio::test]
    async fn live_reading_becomes_quote() {
        let q = feed(Answer::Reading(SpotReading::price_only(30.0)))
            .fetch_quote()
            .await;
        assert_eq!(q.price, 30.0);
        assert_eq!(q.source, QuoteSource::MetalsDev);
        assert_eq!(q.previous_close, Some(29.5));
        assert!(!q.is_fallback());
    }

    #[tokio::test]
    async fn reported_reference_fields_are_kept() {
        let reading = SpotReading {
            price: 30.0,
            previous_close: Some(29.0),
            open: Some(29.4),
            high: Some(30.2),
            low: Some(29.1),
        };
        let q = feed(Answer::Reading(reading)).fetch_quote().await;
        assert_eq!(q.previous_close, Some(29.0));
        assert_eq!(q.open, 29.4);
        assert_eq!(q.high, 30.2);
        assert_eq!(q.low, 29.1);
    }

    #[tokio::test]
    async fn error_yields_fallback() {
        let q = feed(Answer::Error).fetch_quote().await;
        assert!(q.is_fallback());
        assert_eq!(q.price, FALLBACK_PRICE);
        assert!(q.price > 0.0);
    }

    #[tokio::test]
    async fn zero_price_yields_fallback() {
        let q = feed(Answer::Reading(SpotReading::price_only(0.0)))
            .fetch_quote()
            .await;
        assert!(q.is_fallback());
        assert!(q.price > 0.0);
    }

    #[tokio::test]
    async fn nan_price_yields_fallback() {
        let q = feed(Answer::Reading(SpotReading::price_only(f64::NAN)))
            .fetch_quote()
            .await;
        assert!(q.is_fallback());
    }

    #[test]
    fn provider_name_is_exposed() {
        assert_eq!(feed(Answer::Error).provider_name(), "mock");
    }

    #[tokio::test]
    async fn fetch_history_has_one_point_per_day_plus_today() {
        let history = feed(Answer::Reading(SpotReading::price_only(30.0)))
            .fetch_history(7)
            .await;
        assert_eq!(history.len(), 8);
        assert!(history.iter().all(|q| q.source == QuoteSource::Simulated));
    }

    #[tokio::test]
    async fn fetch_history_uses_fallback_seed_on_error() {
        let history = feed(Answer::Error).fetch_history(3).await;
        assert_eq!(history.len(), 4);
        for q in &history {
            assert!((q.price - FALLBACK_PRICE).abs() <= 2.0 + 0.005);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// Synthetic history
// ═══════════════════════════════════════════════════════════════════

mod history {
    use super::*;

    #[test]
    fn length_and_ordering() {
        let end = Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let points = synthetic_history(&quote(30.0, None), 30, end, &mut rng);

        assert_eq!(points.len(), 31);
        assert_eq!(points.last().unwrap().timestamp, end);
        assert_eq!(points[0].timestamp, end - chrono::Duration::days(30));
        for pair in points.windows(2) {
            assert_eq!(pair[1].timestamp - pair[0].timestamp, chrono::Duration::days(1));
        }
    }

    #[test]
    fn zero_days_gives_single_point() {
        let end = Utc::now();
        let mut rng = StdRng::seed_from_u64(1);
        let points = synthetic_history(&quote(30.0, None), 0, end, &mut rng);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].timestamp, end);
    }

    #[test]
    fn prices_stay_within_band_and_are_rounded() {
        let mut rng = StdRng::seed_from_u64(42);
        let points = synthetic_history(&quote(30.0, None), 200, Utc::now(), &mut rng);
        for q in &points {
            assert!(q.price >= 28.0 - 0.005 && q.price <= 32.0 + 0.005, "{}", q.price);
            let cents = q.price * 100.0;
            assert!((cents - cents.round()).abs() < 1e-6, "{}", q.price);
            assert_eq!(q.source, QuoteSource::Simulated);
        }
    }

    #[test]
    fn reference_fields_follow_price() {
        let mut rng = StdRng::seed_from_u64(3);
        for q in synthetic_history(&quote(25.0, None), 10, Utc::now(), &mut rng) {
            assert!(approx(q.previous_close.unwrap(), q.price - 0.10));
            assert!(approx(q.open, q.price + 0.05));
            assert!(approx(q.high, q.price + 0.30));
            assert!(approx(q.low, q.price - 0.20));
        }
    }

    #[test]
    fn low_seed_is_clamped() {
        let mut rng = StdRng::seed_from_u64(9);
        let points = synthetic_history(&quote(0.5, None), 100, Utc::now(), &mut rng);
        assert!(points.iter().all(|q| q.price >= 0.10));
        assert!(points.iter().any(|q| approx(q.price, 0.10)));
    }

    #[test]
    fn same_seed_same_history() {
        let end = Utc::now();
        let a = synthetic_history(&quote(30.0, None), 5, end, &mut StdRng::seed_from_u64(11));
        let b = synthetic_history(&quote(30.0, None), 5, end, &mut StdRng::seed_from_u64(11));
        assert_eq!(a, b);
    }
}

// ═══════════════════════════════════════════════════════════════════
// ValuationService
// ═══════════════════════════════════════════════════════════════════

mod valuation {
    use super::*;

    #[test]
    fn single_coin_scenario() {
        // Paid 500 for 10 oz when spot was 28; spot is now 30, closed at 29.
        let svc = ValuationService::new();
        let holdings = vec![holding("Philharmoniker tube", 500.0, 28.0, 10.0)];
        let q = quote(30.0, Some(29.0));
        let summary = svc.summarize(&holdings, Some(&q));

        assert!(approx(summary.spot_price, 30.0));
        assert!(approx(summary.total_worth, 300.0));
        assert!(approx(summary.total_invested, 500.0));
        assert!(approx(summary.profit_loss, -200.0));
        assert!(approx(summary.total_premium, 220.0));
        assert!(approx(summary.total_grams, 311.035));
        assert!(!summary.is_profit());

        let h = &summary.holdings[0];
        assert!(approx(h.value_at_purchase, 280.0));
        assert_eq!(h.status, HoldingStatus::BreakingEven);

        let change = svc.weekly_change(&q, &mut StdRng::seed_from_u64(0));
        assert!((change - 3.448_275_862).abs() < 1e-6);
    }

    #[test]
    fn profit_identity_holds() {
        let svc = ValuationService::new();
        let holdings = vec![
            holding("Maple", 35.0, 30.0, 1.0),
            holding("Bar", 950.0, 29.0, 32.15),
            holding("Junk silver", 120.0, 25.0, 5.5),
        ];
        for spot in [0.0, 12.5, 29.87, 45.0] {
            let worth = svc.total_worth(&holdings, spot);
            let invested = svc.total_invested(&holdings);
            assert!(approx(worth - invested, svc.profit_loss(&holdings, spot)));
            let per_holding: f64 = holdings
                .iter()
                .map(|h| svc.holding_profit_loss(h, spot))
                .sum();
            assert!((per_holding - svc.profit_loss(&holdings, spot)).abs() < 1e-6);
        }
    }

    #[test]
    fn empty_portfolio_is_all_zero() {
        let svc = ValuationService::new();
        let summary = svc.summarize(&[], Some(&quote(30.0, Some(29.0))));
        assert_eq!(summary.total_worth, 0.0);
        assert_eq!(summary.total_invested, 0.0);
        assert_eq!(summary.total_grams, 0.0);
        assert_eq!(summary.total_premium, 0.0);
        assert_eq!(summary.profit_loss, 0.0);
        assert!(summary.holdings.is_empty());
    }

    #[test]
    fn no_quote_values_at_zero() {
        let svc = ValuationService::new();
        let holdings = vec![holding("Maple", 35.0, 30.0, 1.0)];
        let summary = svc.summarize(&holdings, None);
        assert_eq!(summary.spot_price, 0.0);
        assert_eq!(summary.total_worth, 0.0);
        assert!(approx(summary.profit_loss, -35.0));
        assert_eq!(summary.holdings[0].status, HoldingStatus::Loss);
    }

    #[test]
    fn premium_can_be_negative() {
        let svc = ValuationService::new();
        let bargain = vec![holding("Estate sale", 200.0, 30.0, 10.0)];
        assert!(approx(svc.total_premium(&bargain), -100.0));
    }

    #[test]
    fn weekly_change_placeholder_without_previous_close() {
        let svc = ValuationService::new();
        let mut rng = StdRng::seed_from_u64(5);
        for prev in [None, Some(0.0), Some(-3.0)] {
            let change = svc.weekly_change(&quote(30.0, prev), &mut rng);
            assert!(change.abs() <= WEEKLY_CHANGE_PLACEHOLDER, "{change}");
        }
    }

    #[test]
    fn statuses_per_holding() {
        let svc = ValuationService::new();
        let h = holding("Maple", 35.0, 30.0, 1.0);
        assert_eq!(svc.holding_status(&h, 29.0), HoldingStatus::Loss);
        assert_eq!(svc.holding_status(&h, 32.0), HoldingStatus::BreakingEven);
        assert_eq!(svc.holding_status(&h, 36.0), HoldingStatus::Profit);
    }
}

// ═══════════════════════════════════════════════════════════════════
// PortfolioService
// ═══════════════════════════════════════════════════════════════════

mod portfolio_service {
    use super::*;

    fn valid_form() -> HoldingForm {
        let mut form = HoldingForm::empty(date(2024, 5, 2));
        form.name = "  Kookaburra  ".into();
        form.purchase_price = 40.0;
        form.silver_price_at_purchase = 29.0;
        form.silver_weight = 31.1035;
        form.weight_unit = WeightUnit::Gram;
        form
    }

    #[test]
    fn create_from_form_converts_weight() {
        let h = PortfolioService::new().create_holding(&valid_form()).unwrap();
        assert_eq!(h.name, "Kookaburra");
        assert!(approx(h.silver_weight_oz, 1.0));
        assert_eq!(h.purchase_date, date(2024, 5, 2));
    }

    #[test]
    fn create_rejects_invalid_form() {
        let mut form = valid_form();
        form.silver_weight = 0.0;
        let err = PortfolioService::new().create_holding(&form).unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }

    #[test]
    fn add_and_get() {
        let svc = PortfolioService::new();
        let mut portfolio = Portfolio::default();
        let h = holding("Maple", 35.0, 30.0, 1.0);
        let id = h.id;
        svc.add_holding(&mut portfolio, h).unwrap();
        assert_eq!(portfolio.holdings.len(), 1);
        assert_eq!(svc.get_holding(&portfolio, id).unwrap().name, "Maple");
    }

    #[test]
    fn add_rejects_duplicate_id() {
        let svc = PortfolioService::new();
        let mut portfolio = Portfolio::default();
        let h = holding("Maple", 35.0, 30.0, 1.0);
        svc.add_holding(&mut portfolio, h.clone()).unwrap();
        let err = svc.add_holding(&mut portfolio, h).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert_eq!(portfolio.holdings.len(), 1);
    }

    #[test]
    fn add_rejects_invalid_holding() {
        let svc = PortfolioService::new();
        let mut portfolio = Portfolio::default();
        for bad in [
            holding(" ", 35.0, 30.0, 1.0),
            holding("Maple", -1.0, 30.0, 1.0),
            holding("Maple", 35.0, 0.0, 1.0),
            holding("Maple", 35.0, 30.0, f64::INFINITY),
        ] {
            assert!(svc.add_holding(&mut portfolio, bad).is_err());
        }
        assert!(portfolio.holdings.is_empty());
    }

    #[test]
    fn remove_returns_holding() {
        let svc = PortfolioService::new();
        let mut portfolio = Portfolio::default();
        let h = holding("Maple", 35.0, 30.0, 1.0);
        let id = h.id;
        svc.add_holding(&mut portfolio, h).unwrap();
        let removed = svc.remove_holding(&mut portfolio, id).unwrap();
        assert_eq!(removed.id, id);
        assert!(portfolio.holdings.is_empty());
    }

    #[test]
    fn remove_missing_is_not_found() {
        let svc = PortfolioService::new();
        let mut portfolio = Portfolio::default();
        let err = svc
            .remove_holding(&mut portfolio, uuid::Uuid::new_v4())
            .unwrap_err();
        assert!(matches!(err, CoreError::HoldingNotFound(_)));
    }

    #[test]
    fn replace_skips_invalid_and_duplicates() {
        let svc = PortfolioService::new();
        let mut portfolio = Portfolio::default();
        svc.add_holding(&mut portfolio, holding("Old", 10.0, 20.0, 0.5))
            .unwrap();

        let keep = holding("Maple", 35.0, 30.0, 1.0);
        let rows = vec![
            keep.clone(),
            keep.clone(),
            holding("", 35.0, 30.0, 1.0),
            holding("Bar", 950.0, 29.0, 32.15),
        ];
        let kept = svc.replace_holdings(&mut portfolio, rows);
        assert_eq!(kept, 2);
        assert_eq!(portfolio.holdings[0].id, keep.id);
        assert_eq!(portfolio.holdings[1].name, "Bar");
    }

    #[test]
    fn replace_with_nothing_clears() {
        let svc = PortfolioService::new();
        let mut portfolio = Portfolio::default();
        svc.add_holding(&mut portfolio, holding("Old", 10.0, 20.0, 0.5))
            .unwrap();
        assert_eq!(svc.replace_holdings(&mut portfolio, Vec::new()), 0);
        assert!(portfolio.holdings.is_empty());
    }
}
