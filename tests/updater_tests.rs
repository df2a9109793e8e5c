//! End-to-end tests for a price update run against a mocked quote source

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use mockall::mock;
    use mockall::predicate::always;
    use rust_decimal_macros::dec;
    use std::time::Duration;
    use tokio_test::assert_ok;

    use pricedb_updater::commodities::reconcile;
    use pricedb_updater::error::FetchError;
    use pricedb_updater::mapping::Mapping;
    use pricedb_updater::oracle::{QuoteSource, RateLimiter};
    use pricedb_updater::persistence::PriceDbWriter;
    use pricedb_updater::types::{Observation, Observations, PricingTarget};
    use pricedb_updater::updater::{PriceUpdater, RunSummary};

    mock! {
        pub Source {}

        #[async_trait]
        impl QuoteSource for Source {
            fn name(&self) -> &'static str;
            async fn fetch(&self, target: &PricingTarget) -> Result<Observation, FetchError>;
        }
    }

    fn quote(target: &PricingTarget) -> Result<Observation, FetchError> {
        let (price, currency) = match target.ticker.as_str() {
            "GC=F" => (dec!(1850.5), "USD"),
            "SAP.DE" => (dec!(120), "EUR"),
            "EURUSD=X" => (dec!(1.1), "USD"),
            "7203.T" => (dec!(2500), "JPY"),
            _ => {
                return Err(FetchError::MissingQuote {
                    ticker: target.ticker.clone(),
                })
            }
        };
        Ok(Observation::new(target.commodity.as_str(), price, currency))
    }

    fn mock_source() -> MockSource {
        let mut source = MockSource::new();
        source.expect_name().return_const("Mock");
        source
            .expect_fetch()
            .with(always())
            .returning(|target| quote(target));
        source
    }

    fn new_year() -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    // ========================================================================
    // Fetch phase
    // ========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_fetch_failure_skips_only_that_commodity() {
        let source = mock_source();
        let targets = vec![
            PricingTarget::new("Gold", "GC=F"),
            PricingTarget::new("Unobtainium", "NOPE"),
            PricingTarget::new("EUR", "EURUSD=X"),
        ];

        let mut updater = PriceUpdater::new(&source, RateLimiter::default(), "USD");
        let mut summary = RunSummary::default();
        let observations = updater.fetch_all(&targets, &mut summary).await;

        assert_eq!(observations.len(), 2);
        assert!(observations.get("Unobtainium").is_none());
        assert_eq!(summary.fetched, 2);
        assert_eq!(summary.fetch_failures, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sixth_fetch_waits_for_the_window() {
        let mut source = MockSource::new();
        source.expect_name().return_const("Mock");
        source
            .expect_fetch()
            .times(6)
            .returning(|target| Ok(Observation::new(target.commodity.as_str(), dec!(1), "USD")));

        let targets: Vec<PricingTarget> = (0..6)
            .map(|i| PricingTarget::new(format!("C{}", i), format!("T{}", i)))
            .collect();

        let started = tokio::time::Instant::now();
        let mut updater = PriceUpdater::new(&source, RateLimiter::default(), "USD");
        let mut summary = RunSummary::default();
        updater.fetch_all(&targets, &mut summary).await;

        assert_eq!(summary.rate_limit_waits, 1);
        assert!(started.elapsed() >= Duration::from_secs(60));
        assert!(started.elapsed() < Duration::from_secs(61));
    }

    // ========================================================================
    // Write phase
    // ========================================================================

    #[test]
    fn test_converted_prices_are_written_in_base_marker() {
        let source = mock_source();
        let observations: Observations = vec![
            Observation::new("Gold", dec!(1850.5), "USD"),
            Observation::new("SAP", dec!(120), "EUR"),
            Observation::new("EUR", dec!(1.1), "USD"),
            Observation::new("Toyota", dec!(2500), "JPY"),
        ]
        .into_iter()
        .collect();

        let updater = PriceUpdater::new(&source, RateLimiter::default(), "USD");
        let mut writer = PriceDbWriter::new(Vec::new());
        let mut summary = RunSummary::default();
        updater.write_all(&observations, &mut writer, new_year(), &mut summary);

        let out = String::from_utf8(assert_ok!(writer.finish())).unwrap();
        assert_eq!(
            out,
            "P 2024-01-01 00:00:00 EUR 1.100000 $\n\
             P 2024-01-01 00:00:00 Gold 1850.500000 $\n\
             P 2024-01-01 00:00:00 SAP 132.000000 $\n"
        );
        assert_eq!(summary.written, 3);
        assert_eq!(summary.unresolved, 1);
    }

    #[test]
    fn test_cycle_is_skipped_without_blocking_other_records() {
        let source = mock_source();
        let observations: Observations = vec![
            Observation::new("A", dec!(2), "B"),
            Observation::new("B", dec!(3), "A"),
            Observation::new("Gold", dec!(1850.5), "USD"),
        ]
        .into_iter()
        .collect();

        let updater = PriceUpdater::new(&source, RateLimiter::default(), "USD");
        let mut writer = PriceDbWriter::new(Vec::new());
        let mut summary = RunSummary::default();
        updater.write_all(&observations, &mut writer, new_year(), &mut summary);

        let out = String::from_utf8(assert_ok!(writer.finish())).unwrap();
        assert_eq!(out, "P 2024-01-01 00:00:00 Gold 1850.500000 $\n");
        assert_eq!(summary.resolve_errors, 2);
        assert_eq!(summary.skipped(), 2);
    }

    #[test]
    fn test_without_conversion_keeps_quote_currency() {
        let source = mock_source();
        let observations: Observations = vec![
            Observation::new("Gold", dec!(1850.5), "USD"),
            Observation::new("SAP", dec!(120), "EUR"),
        ]
        .into_iter()
        .collect();

        let updater =
            PriceUpdater::new(&source, RateLimiter::default(), "USD").with_conversion(false);
        let mut writer = PriceDbWriter::new(Vec::new());
        let mut summary = RunSummary::default();
        updater.write_all(&observations, &mut writer, new_year(), &mut summary);

        let out = String::from_utf8(assert_ok!(writer.finish())).unwrap();
        assert_eq!(
            out,
            "P 2024-01-01 00:00:00 Gold 1850.500000 $\n\
             P 2024-01-01 00:00:00 SAP 120.000000 EUR\n"
        );
    }

    // ========================================================================
    // Full run
    // ========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_full_run_from_mapping() {
        let mapping = Mapping::parse(
            "Gold:GC=F\nSAP:SAP.DE\nEUR:EURUSD=X\nbad-line-no-colon\nBroken:NOPE\n$:USD\n",
        );
        let base = assert_ok!(mapping.require_base_currency()).to_string();
        let listed: Vec<String> = mapping
            .commodities()
            .into_iter()
            .map(str::to_string)
            .collect();
        let targets = reconcile(&listed, &mapping, &base);
        assert_eq!(targets.len(), 4);

        let source = mock_source();
        let mut updater = PriceUpdater::new(&source, RateLimiter::default(), base);
        let mut writer = PriceDbWriter::new(Vec::new());
        let summary = updater.run(&targets, &mut writer).await;

        assert_eq!(summary.targets, 4);
        assert_eq!(summary.fetched, 3);
        assert_eq!(summary.fetch_failures, 1);
        assert_eq!(summary.written, 3);
        assert_eq!(summary.rate_limit_waits, 0);

        let out = String::from_utf8(assert_ok!(writer.finish())).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|l| l.starts_with("P ")));
        assert!(lines[0].ends_with(" EUR 1.100000 $"));
        assert!(lines[1].ends_with(" Gold 1850.500000 $"));
        assert!(lines[2].ends_with(" SAP 132.000000 $"));
    }
}
