// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

mod common;

use std::collections::BTreeMap;

use chrono::Timelike;

use clearsky_core::{
    Configuration, Day, Dispatcher, QualityVerdict, ReferenceWindow, RejectionReason, Series,
    UndefinedComparison, build_template, classify_series, partition_days,
};
use common::{clear_day, clear_days, cloudy_day, date, minute_day, rippled_day, series};

fn leading(comparison_interval: usize) -> Configuration {
    Configuration {
        comparison_interval,
        reference_window: ReferenceWindow::Leading,
        ..Default::default()
    }
}

/// Thirty clear reference days, a rippled candidate and a cloudy day
fn month_with_candidates() -> Series {
    let mut days = clear_days(30, 500.0);
    days.push(rippled_day(30, 500.0, 0.1));
    days.push(cloudy_day(31, 500.0));
    series(days)
}

fn reference_deployment() -> Configuration {
    Configuration {
        prep_smooth_kernel: Some(5),
        smooth_kernel: Some(60),
        percentile: 0.9,
        distance_threshold: 50.0,
        correlation_threshold: 0.95,
        ..leading(30)
    }
}

#[test]
fn test_end_to_end_candidate_is_clear_sky() {
    let report =
        classify_series("roof", &month_with_candidates(), &reference_deployment()).unwrap();

    assert_eq!(report.sampling_interval.seconds(), 60);
    assert_eq!(report.days.len(), 32);

    let candidate = report.day(date(30)).unwrap();
    assert_eq!(candidate.verdict, QualityVerdict::Admitted);
    let result = candidate.classification.as_ref().unwrap();
    assert!(result.distance.unwrap() < 50.0, "{result:?}");
    assert!(result.correlation.unwrap() > 0.95, "{result:?}");
    assert!(result.is_clear_sky);

    let cloudy = report.day(date(31)).unwrap();
    assert!(cloudy.verdict.is_admitted());
    assert!(!cloudy.is_clear_sky());

    // The clean reference days sit just above the corrected envelope
    assert!(report.clear_sky_dates().contains(&date(0)));
    assert_eq!(report.clear_sky_count(), 31);
}

#[test]
fn test_stricter_correlation_excludes_ripple() {
    let config = Configuration {
        correlation_threshold: 0.999,
        ..reference_deployment()
    };
    let report = classify_series("roof", &month_with_candidates(), &config).unwrap();
    let candidate = report.day(date(30)).unwrap();
    assert!(candidate.verdict.is_admitted());
    assert!(!candidate.is_clear_sky());
}

#[test]
fn test_day_scored_against_itself() {
    let config = Configuration {
        prep_smooth_kernel: None,
        smooth_kernel: None,
        percentile: 1.0,
        ..leading(5)
    };
    let report = classify_series("roof", &series(clear_days(5, 800.0)), &config).unwrap();

    for day in &report.days {
        let result = day.classification.as_ref().unwrap();
        assert!(result.distance.unwrap() < 1e-9);
        assert!((result.correlation.unwrap() - 1.0).abs() < 1e-9);
        assert!(result.is_clear_sky);
    }
}

#[test]
fn test_kernel_longer_than_any_day_is_classified() {
    let config = Configuration {
        prep_smooth_kernel: Some(1 << 40),
        smooth_kernel: Some(1 << 40),
        ..leading(5)
    };
    assert!(config.validate().is_ok());

    let report = classify_series("roof", &series(clear_days(5, 500.0)), &config).unwrap();
    assert_eq!(report.days.len(), 5);
    assert!(report.days.iter().all(|d| d.verdict.is_admitted()));
}

#[test]
fn test_three_hour_hole_is_a_data_gap() {
    let mut days = clear_days(5, 500.0);
    let mut holed = clear_day(5, 500.0);
    // 10:00 - 13:00 missing
    holed.retain(|s| !(600..780).contains(&(s.timestamp.hour() * 60 + s.timestamp.minute())));
    assert_eq!(holed.len(), 1260);
    days.push(holed);

    let config = Configuration {
        max_gap: 30,
        ..leading(5)
    };
    let report = classify_series("roof", &series(days), &config).unwrap();
    let outcome = report.day(date(5)).unwrap();
    assert_eq!(
        outcome.verdict,
        QualityVerdict::Rejected(RejectionReason::DataGap)
    );
    assert_eq!(outcome.sample_count, 1260);
    assert!(outcome.classification.is_none());
}

#[test]
fn test_flat_days() {
    let mut days = clear_days(5, 500.0);
    days.push(minute_day(5, |_| 0.0));
    days.push(minute_day(6, |_| 50.0));
    let report = classify_series("roof", &series(days), &leading(5)).unwrap();

    // Dark all day: night boundaries look fine, the comparison is undefined
    let dark = report.day(date(5)).unwrap();
    assert!(dark.verdict.is_admitted());
    let result = dark.classification.as_ref().unwrap();
    assert_eq!(result.diagnostic, Some(UndefinedComparison::ConstantCurve));
    assert!(!result.is_clear_sky);

    // Stuck sensor reading 50 W never reaches night-time power
    let stuck = report.day(date(6)).unwrap();
    assert_eq!(
        stuck.verdict,
        QualityVerdict::Rejected(RejectionReason::BoundaryNotLow)
    );
}

#[test]
fn test_template_scales_with_percentile() {
    let mut days = clear_days(4, 500.0);
    days.push(cloudy_day(4, 650.0));
    let partitioned = partition_days(&series(days), None).unwrap();
    let reference: Vec<&Day> = partitioned.days.iter().collect();

    let templates: Vec<_> = [0.5, 0.7, 0.9, 1.0]
        .into_iter()
        .map(|percentile| {
            let config = Configuration {
                percentile,
                ..leading(5)
            };
            build_template(&reference, partitioned.interval, &config).unwrap()
        })
        .collect();

    for pair in templates.windows(2) {
        for (low, high) in pair[0].values().iter().zip(pair[1].values()) {
            assert!(low.unwrap() <= high.unwrap());
        }
    }
    assert!(templates[0].values().iter().flatten().all(|v| *v >= 0.0));
}

#[test]
fn test_template_is_deterministic() {
    let partitioned = partition_days(&month_with_candidates(), None).unwrap();
    let reference: Vec<&Day> = partitioned.days.iter().collect();
    let config = reference_deployment();

    let a = build_template(&reference, partitioned.interval, &config).unwrap();
    let b = build_template(&reference, partitioned.interval, &config).unwrap();
    assert_eq!(a.len(), 1440);
    assert!(
        a.values()
            .iter()
            .zip(b.values())
            .all(|(x, y)| x.map(f64::to_bits) == y.map(f64::to_bits))
    );
}

fn two_sites() -> BTreeMap<String, Series> {
    let mut garage = clear_days(5, 400.0);
    garage.push(cloudy_day(5, 400.0));
    BTreeMap::from([
        ("roof".to_owned(), series(clear_days(6, 500.0))),
        ("garage".to_owned(), series(garage)),
        ("broken".to_owned(), series(clear_days(2, 500.0))),
    ])
}

#[test]
fn test_identifiers_are_independent() {
    let config = leading(5);
    let input = two_sites();
    let batch = Dispatcher::new(config.clone()).unwrap().run(input.clone());

    for (id, series) in &input {
        let alone = classify_series(id, series, &config);
        match (&batch.results[id], alone) {
            (Ok(batched), Ok(alone)) => assert_eq!(batched, &alone),
            (Err(_), Err(_)) => {}
            (batched, alone) => panic!("{id}: {batched:?} vs {alone:?}"),
        }
    }

    let dates = batch.clear_sky_dates();
    assert_eq!(dates["roof"].len(), 6);
    assert_eq!(dates["garage"].len(), 5);
    assert!(!dates.contains_key("broken"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_dispatch() {
    let dispatcher = Dispatcher::new(leading(5)).unwrap().with_max_workers(2);
    let batch = dispatcher.run_concurrent(two_sites()).await;

    assert!(batch.skipped.is_empty());
    assert_eq!(batch.results.len(), 3);
    assert_eq!(batch.reports().count(), 2);
    let failed: Vec<&str> = batch.failures().map(|(id, _)| id).collect();
    assert_eq!(failed, vec!["broken"]);
    assert_eq!(batch.clear_sky_dates()["garage"].len(), 5);
}
