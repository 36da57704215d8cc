// ==========================================
// 参考单价检索集成测试
// ==========================================
// 测试目标: 单词匹配代码或描述 / 多词全部匹配描述 / 去重音 / 结果上限
// ==========================================


use ref_cost_engine::api::ReferenceApi;
use ref_cost_engine::config::config_keys;
use ref_cost_engine::domain::{CostingMode, EntityKind, ReferenceBatch};
use ref_cost_engine::repository::{ReferenceRepository, ReferenceRepositoryImpl};
use test_helpers::{create_test_db, insert_test_config, partition, resource};

async fn seed(db_path: &str) -> ReferenceRepositoryImpl {
    let repo = ReferenceRepositoryImpl::new(db_path).unwrap();
    let p = partition(CostingMode::WithSocialCharges);
    repo.replace_partition(&p, ReferenceBatch::Resources(vec![
        resource(&p, "34", "CIMENTO PORTLAND CP II-32", 0.8),
        resource(&p, "340", "CIMENTO BRANCO", 2.1),
        resource(&p, "8801", "TUBO PVC SOLDAVEL 25 MM", 6.4),
        resource(&p, "9010", "Tubulação de aço galvanizado", 44.0),
        resource(&p, "12", "LUVA PVC 25 MM", 1.3),
    ]))
    .await
    .unwrap();
    repo
}

fn codes(records: &[ref_cost_engine::domain::ReferenceRecord]) -> Vec<&str> {
    records.iter().map(|r| r.code()).collect()
}

#[tokio::test]
async fn test_single_term_matches_code_substring() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let repo = seed(&db_path).await;
    let p = partition(CostingMode::WithSocialCharges);

    let hits = repo.search(EntityKind::Resource, &p, "34", 50).await.unwrap();
    assert_eq!(codes(&hits), vec!["34", "340"]);

    let hits = repo.search(EntityKind::Resource, &p, "cimento", 50).await.unwrap();
    assert_eq!(codes(&hits), vec!["34", "340"]);
}

#[tokio::test]
async fn test_multi_term_requires_every_term_in_description() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let repo = seed(&db_path).await;
    let p = partition(CostingMode::WithSocialCharges);

    let hits = repo.search(EntityKind::Resource, &p, "pvc 25", 50).await.unwrap();
    assert_eq!(codes(&hits), vec!["8801", "12"]);

    let hits = repo.search(EntityKind::Resource, &p, "TUBO  pvc", 50).await.unwrap();
    assert_eq!(codes(&hits), vec!["8801"]);

    // 多词时代码不参与匹配
    let hits = repo.search(EntityKind::Resource, &p, "8801 tubo", 50).await.unwrap();
    assert!(hits.is_empty());
}

#[tokio::test]
async fn test_search_ignores_accents_and_case() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let repo = seed(&db_path).await;
    let p = partition(CostingMode::WithSocialCharges);

    let hits = repo.search(EntityKind::Resource, &p, "TUBULACAO aco", 50).await.unwrap();
    assert_eq!(codes(&hits), vec!["9010"]);

    let hits = repo.search(EntityKind::Resource, &p, "tubulação", 50).await.unwrap();
    assert_eq!(codes(&hits), vec!["9010"]);
}

#[tokio::test]
async fn test_search_is_partition_scoped() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let repo = seed(&db_path).await;

    let other = partition(CostingMode::TaxExempt);
    let hits = repo.search(EntityKind::Resource, &other, "cimento", 50).await.unwrap();
    assert!(hits.is_empty());
}

#[tokio::test]
async fn test_api_search_applies_configured_limit() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    seed(&db_path).await;
    insert_test_config(&db_path, config_keys::SEARCH_RESULT_LIMIT, "2");

    let api = ReferenceApi::new(&db_path).unwrap();
    let p = partition(CostingMode::WithSocialCharges);

    let hits = api.search(EntityKind::Resource, &p, "").await.unwrap();
    assert_eq!(codes(&hits), vec!["34", "340"]);

    let hits = api.search(EntityKind::Resource, &p, "pvc").await.unwrap();
    assert_eq!(hits.len(), 2);
}
