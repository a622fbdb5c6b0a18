//! LtvRateService against tables on disk

use std::path::Path;
use std::sync::Arc;

use loan_desk_config::TablesConfig;
use loan_desk_core::{RateCell, Region};
use loan_desk_tools::{LtvRateService, ToolError};

const REGIONS: &str = r#"{"서울": 1, "경기": 2, "부산": 1, "인천": 1, "세종": 2, "춘천": 3}"#;

const LTV: &str = r#"{
    "N865점 이상 (1-2구간)": {"서울_1급지": "80%", "경기_2급지": "75%", "인천및광역시_1급지": "70%", "세종_공통": "70%", "지방_3급지": "60%"},
    "N790점 이상 (3-4구간)": {"서울_1급지": "75%", "경기_2급지": "70%", "인천및광역시_1급지": "65%"},
    "N710점 이상 (5-6구간)": {"서울_1급지": "70%"}
}"#;

const RATES: &str = r#"{
    "N865점 이상 (1-2구간)": {"~70%": "4.9%", "~75%": "5.2%", "~80%": "5.6%"},
    "N790점 이상 (3-4구간)": {"~70%": "5.5%", "~75%": "5.9%", "~80%": "6.3%"},
    "N710점 이상 (5-6구간)": {"~70%": "6.4%", "~75%": "6.9%"}
}"#;

fn write_tables(config: &TablesConfig) {
    std::fs::write(config.regional_tiers_path(), REGIONS).unwrap();
    std::fs::write(config.ltv_path(), LTV).unwrap();
    std::fs::write(config.interest_rate_path(), RATES).unwrap();
}

fn service_in(dir: &Path) -> LtvRateService {
    LtvRateService::new(TablesConfig::in_dir(dir), 0.5)
}

#[tokio::test]
async fn test_rate_matrix_totals_match_table_plus_surcharge() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_in(dir.path());
    write_tables(&TablesConfig::in_dir(dir.path()));

    let rates: serde_json::Value = serde_json::from_str(RATES).unwrap();

    for (address, surcharge) in [("서울특별시 강남구", 0.0), ("부산광역시 해운대구", 0.5)] {
        let matrix = service.rate_matrix(Some(address), Some(880)).await.unwrap();
        assert_eq!(matrix.ltv_ranges, vec!["~70%", "~75%", "~80%"]);

        for row in &matrix.rows {
            for (range, cell) in matrix.ltv_ranges.iter().zip(&row.cells) {
                match rates[&row.band].get(range).and_then(|v| v.as_str()) {
                    Some(raw) => {
                        let base: f64 = raw.trim_end_matches('%').parse().unwrap();
                        let expected = ((base + surcharge) * 100.0).round() / 100.0;
                        assert_eq!(cell.total(), Some(expected), "{} {}", row.band, range);
                    }
                    None => assert_eq!(*cell, RateCell::NoData),
                }
            }
        }
    }
}

#[tokio::test]
async fn test_quote_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    write_tables(&TablesConfig::in_dir(dir.path()));
    let service = service_in(dir.path());

    let quote = service
        .quote(Some("경기도 성남시 분당구"), Some(800))
        .await
        .unwrap();
    assert_eq!(quote.region, Region::Gyeonggi);
    assert_eq!(quote.tier, 2);
    assert_eq!(quote.region_key.as_ref().unwrap().as_str(), "경기_2급지");
    assert_eq!(quote.ltv.unwrap().value(), 70.0);
    assert_eq!(quote.surcharge, 0.0);

    let quote = service.quote(Some("세종특별자치시 한누리대로"), Some(900)).await.unwrap();
    assert_eq!(quote.region_key.as_ref().unwrap().as_str(), "세종_공통");
    assert_eq!(quote.surcharge, 0.5);

    let ltv = service.ltv_matrix(Some("인천 연수구"), Some(900)).await.unwrap();
    assert_eq!(ltv.current_region_key.as_ref().unwrap().as_str(), "인천및광역시_1급지");
    assert_eq!(ltv.current_ltv().unwrap().value(), 70.0);
}

#[tokio::test]
async fn test_loads_tables_with_custom_file_names() {
    let dir = tempfile::tempdir().unwrap();
    let config = TablesConfig {
        dir: dir.path().to_path_buf(),
        regional_tiers_file: "tiers.json".to_string(),
        ltv_file: "ltv.json".to_string(),
        interest_rate_file: "rates.json".to_string(),
    };
    write_tables(&config);

    let service = LtvRateService::new(config, 0.5);
    let quote = service.quote(Some("부산 해운대구"), Some(880)).await.unwrap();
    assert_eq!(quote.region_key.unwrap().as_str(), "인천및광역시_1급지");
    assert_eq!(quote.ltv.unwrap().value(), 70.0);
    assert_eq!(quote.surcharge, 0.5);
}

#[tokio::test]
async fn test_concurrent_first_calls_share_one_load() {
    let dir = tempfile::tempdir().unwrap();
    write_tables(&TablesConfig::in_dir(dir.path()));
    let service = service_in(dir.path());

    let (a, b, c) = tokio::join!(
        service.calculator(),
        service.calculator(),
        service.calculator()
    );
    let (a, b, c) = (a.unwrap(), b.unwrap(), c.unwrap());
    assert!(Arc::ptr_eq(&a, &b));
    assert!(Arc::ptr_eq(&b, &c));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_quotes_across_threads() {
    let dir = tempfile::tempdir().unwrap();
    write_tables(&TablesConfig::in_dir(dir.path()));
    let service = Arc::new(service_in(dir.path()));

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let service = Arc::clone(&service);
            tokio::spawn(async move {
                let address = if i % 2 == 0 { "서울 마포구" } else { "대구광역시 수성구" };
                service.quote(Some(address), Some(880)).await
            })
        })
        .collect();

    let results = futures::future::join_all(handles).await;
    for result in results {
        let quote = result.unwrap().unwrap();
        assert!(quote.region_key.is_some());
    }
    assert!(service.is_ready());
}

#[tokio::test]
async fn test_tables_are_read_once() {
    let dir = tempfile::tempdir().unwrap();
    let config = TablesConfig::in_dir(dir.path());
    write_tables(&config);
    let service = service_in(dir.path());

    service.quote(Some("서울"), Some(880)).await.unwrap();
    assert!(service.is_ready());

    for path in config.paths() {
        std::fs::remove_file(path).unwrap();
    }

    let quote = service.quote(Some("서울"), Some(880)).await.unwrap();
    assert_eq!(quote.region_key.unwrap().as_str(), "서울_1급지");
}

#[tokio::test]
async fn test_failed_load_is_retried() {
    let dir = tempfile::tempdir().unwrap();
    let config = TablesConfig::in_dir(dir.path());
    let service = service_in(dir.path());

    let err = service.rate_matrix(Some("서울"), Some(880)).await.unwrap_err();
    assert!(matches!(err, ToolError::NotReady(_)));
    assert!(!service.is_ready());

    write_tables(&config);

    let matrix = service.rate_matrix(Some("서울"), Some(880)).await.unwrap();
    assert_eq!(matrix.current_row().unwrap().band, "N865점 이상 (1-2구간)");
    assert!(service.is_ready());
}

#[tokio::test]
async fn test_malformed_table_is_not_ready() {
    let dir = tempfile::tempdir().unwrap();
    let config = TablesConfig::in_dir(dir.path());
    write_tables(&config);
    std::fs::write(config.interest_rate_path(), "{ not json").unwrap();

    let service = service_in(dir.path());
    let err = service.quote(Some("서울"), Some(880)).await.unwrap_err();
    assert!(err.to_string().contains("interest_rate_data"));
}
