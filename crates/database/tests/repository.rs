use chrono::{Duration, Utc};
use core_types::NewMarketData;
use database::{
    DbError, DbRepository, connect_in_memory, list_tables, reset_database, run_migrations,
    table_columns,
};

async fn repository() -> DbRepository {
    let pool = connect_in_memory().await.unwrap();
    run_migrations(&pool).await.unwrap();
    DbRepository::new(pool)
}

fn submission(price: f64) -> NewMarketData {
    NewMarketData {
        market_price: price,
        harvest_amount: 100.0,
        total_cost: 8000.0,
        total_revenue: price * 100.0,
        net_profit: price * 100.0 - 8000.0,
    }
}

#[tokio::test]
async fn users_round_trip() {
    let repo = repository().await;
    let created = repo.create_user("farmer", "farmer@example.com", "hash").await.unwrap();

    let by_name = repo.find_user_by_username("farmer").await.unwrap().unwrap();
    assert_eq!(by_name, created);
    let by_email = repo.find_user_by_email("Farmer@Example.com").await.unwrap().unwrap();
    assert_eq!(by_email.id, created.id);
    assert_eq!(repo.find_user_by_id(created.id).await.unwrap(), Some(created));
    assert!(repo.find_user_by_username("nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_username_conflicts() {
    let repo = repository().await;
    repo.create_user("farmer", "a@example.com", "hash").await.unwrap();

    match repo.create_user("farmer", "b@example.com", "hash").await {
        Err(DbError::Conflict(field)) => assert_eq!(field, "username"),
        other => panic!("expected a conflict, got {other:?}"),
    }
    match repo.create_user("other", "a@example.com", "hash").await {
        Err(DbError::Conflict(field)) => assert_eq!(field, "email"),
        other => panic!("expected a conflict, got {other:?}"),
    }
}

#[tokio::test]
async fn market_data_is_listed_oldest_first() {
    let repo = repository().await;
    let user = repo.create_user("farmer", "farmer@example.com", "hash").await.unwrap();

    let mut ids = Vec::new();
    for price in [120.0, 130.0, 140.0] {
        ids.push(repo.append_market_data(&submission(price), Some(user.id)).await.unwrap());
    }
    repo.append_market_data(&submission(99.0), None).await.unwrap();

    let all = repo.list_market_data().await.unwrap();
    assert_eq!(all.len(), 4);
    assert_eq!(all.iter().take(3).map(|r| r.id).collect::<Vec<_>>(), ids);
    assert_eq!(all[0].market_price, 120.0);
    assert_eq!(all[0].net_profit, 4000.0);
    assert!(all.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));

    let mine = repo.list_market_data_for_user(user.id).await.unwrap();
    assert_eq!(mine.len(), 3);
    assert!(mine.iter().all(|r| r.user_id == Some(user.id)));
}

#[tokio::test]
async fn clearing_only_touches_one_user() {
    let repo = repository().await;
    let a = repo.create_user("alice", "alice@example.com", "hash").await.unwrap();
    let b = repo.create_user("bobby", "bobby@example.com", "hash").await.unwrap();
    repo.append_market_data(&submission(100.0), Some(a.id)).await.unwrap();
    repo.append_market_data(&submission(110.0), Some(a.id)).await.unwrap();
    repo.append_market_data(&submission(120.0), Some(b.id)).await.unwrap();

    assert_eq!(repo.clear_market_data_for_user(a.id).await.unwrap(), 2);
    let remaining = repo.list_market_data().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].user_id, Some(b.id));
}

#[tokio::test]
async fn sessions_expire() {
    let repo = repository().await;
    let user = repo.create_user("farmer", "farmer@example.com", "hash").await.unwrap();
    let now = Utc::now();

    repo.create_session(user.id, "live", now + Duration::hours(1)).await.unwrap();
    repo.create_session(user.id, "stale", now - Duration::hours(1)).await.unwrap();

    assert_eq!(repo.find_session_user("live", now).await.unwrap().map(|u| u.id), Some(user.id));
    assert!(repo.find_session_user("stale", now).await.unwrap().is_none());
    assert!(repo.find_session_user("missing", now).await.unwrap().is_none());

    assert_eq!(repo.purge_expired_sessions(now).await.unwrap(), 1);
    repo.delete_session("live").await.unwrap();
    assert!(repo.find_session_user("live", now).await.unwrap().is_none());
}

#[tokio::test]
async fn password_change_signs_out_other_sessions() {
    let repo = repository().await;
    let user = repo.create_user("farmer", "farmer@example.com", "old").await.unwrap();
    let later = Utc::now() + Duration::hours(1);
    repo.create_session(user.id, "current", later).await.unwrap();
    repo.create_session(user.id, "laptop", later).await.unwrap();

    repo.update_password(user.id, "new", Some("current")).await.unwrap();

    let now = Utc::now();
    assert!(repo.find_session_user("current", now).await.unwrap().is_some());
    assert!(repo.find_session_user("laptop", now).await.unwrap().is_none());
    let reloaded = repo.find_user_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(reloaded.password_hash, "new");

    assert!(matches!(
        repo.update_password(9999, "x", None).await,
        Err(DbError::NotFound)
    ));
}

#[tokio::test]
async fn schema_can_be_inspected_and_reset() {
    let repo = repository().await;
    repo.append_market_data(&submission(100.0), None).await.unwrap();

    let tables = list_tables(repo.pool()).await.unwrap();
    for table in ["market_data", "sessions", "users"] {
        assert!(tables.iter().any(|t| t == table), "{table} missing from {tables:?}");
    }

    let columns = table_columns(repo.pool(), "market_data").await.unwrap();
    let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(
        names,
        ["id", "user_id", "market_price", "harvest_amount", "total_cost", "total_revenue", "net_profit", "timestamp"]
    );
    assert!(columns[0].primary_key);
    assert!(columns[2].not_null);
    assert!(matches!(table_columns(repo.pool(), "nope").await, Err(DbError::NotFound)));

    reset_database(repo.pool()).await.unwrap();
    assert!(repo.list_market_data().await.unwrap().is_empty());
}
