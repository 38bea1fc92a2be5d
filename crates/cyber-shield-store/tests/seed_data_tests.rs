//! Tests loading the checked-in seed data.

use cyber_shield_store::{MemoryStore, ScamStore, TrendingFilter};

fn seeded() -> MemoryStore {
    MemoryStore::from_json_str(include_str!("../../../data/seed.json")).expect("seed should load")
}

#[test]
fn seed_data_tests_trending_filters_and_orders() {
    let store = seeded();

    let trending = store
        .trending_scams(&TrendingFilter::default())
        .expect("trending should list");
    let ids: Vec<&str> = trending.iter().map(|scam| scam.id.as_str()).collect();
    assert_eq!(ids, vec!["scam-102", "scam-101"]);

    let linked_in = store
        .trending_scams(&TrendingFilter {
            platform: "linkedin".to_string(),
            ..TrendingFilter::default()
        })
        .expect("trending should list");
    assert_eq!(linked_in.len(), 1);
    assert_eq!(linked_in[0].financial_loss, Some(15000.0));
}

#[test]
fn seed_data_tests_assessment_and_comments_survive_loading() {
    let store = seeded();

    let scam = store
        .scam_by_id("scam-101")
        .expect("lookup should work")
        .expect("scam should exist");
    let assessment = scam.risk_assessment.expect("assessment should be seeded");
    assert_eq!(assessment.risk_score, 94.0);

    let comments = store.comments_by_scam_id("scam-101").expect("comments should list");
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].author_id, "user-2");
}

#[test]
fn seed_data_tests_seeded_users_have_no_password() {
    let store = seeded();
    let user = store
        .user_by_email("asha@example.com")
        .expect("lookup should work")
        .expect("user should exist");
    assert_eq!(user.id, "user-1");
    assert!(user.password_digest.is_none());
}

#[test]
fn seed_data_tests_malformed_seed_is_rejected() {
    assert!(MemoryStore::from_json_str("{\"scams\": [{\"id\": 1}]}").is_err());
}
