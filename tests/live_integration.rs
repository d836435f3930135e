use std::time::{SystemTime, UNIX_EPOCH};

use psdb_http::{connect, Config, Params, Value};

fn unique_suffix() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock must be after epoch")
        .as_millis()
}

#[tokio::test]
async fn live_transaction_roundtrip() {
    let config = match std::env::var("DATABASE_URL") {
        Ok(url) if !url.trim().is_empty() => Config::from_url(&url).expect("DATABASE_URL must parse"),
        _ => {
            eprintln!("skipping live test: DATABASE_URL not set");
            return;
        }
    };

    let mut conn = connect(config);
    conn.refresh().await.expect("session creation must succeed");

    let table = format!("users_live_{}", unique_suffix());
    conn.execute(
        &format!("CREATE TABLE {table} (id BIGINT AUTO_INCREMENT PRIMARY KEY, name VARCHAR(64), meta JSON)"),
        (),
    )
    .await
    .expect("table creation must succeed");

    conn.execute("BEGIN", ()).await.expect("begin must succeed");
    let insert = conn
        .execute(
            &format!("INSERT INTO {table} (name, meta) VALUES (?, ?)"),
            [Value::text("Kit"), Value::json(serde_json::json!({"a": 1}))],
        )
        .await
        .expect("insert must succeed");
    assert!(insert.error.is_none(), "insert reported {:?}", insert.error);
    assert_eq!(insert.rows_affected, Some(1));
    assert!(insert.insert_id.is_some());
    conn.execute("COMMIT", ()).await.expect("commit must succeed");

    let query = conn
        .execute(
            &format!("SELECT id, name, meta FROM {table} WHERE name = :name"),
            Params::named([("name", Value::text("Kit"))]),
        )
        .await
        .expect("query must succeed");
    assert_eq!(query.size, 1);
    assert_eq!(query.rows[0].get_text("name"), Some("Kit"));
    assert_eq!(
        query.rows[0].get_json("meta"),
        Some(&serde_json::json!({"a": 1}))
    );

    let broken = conn
        .execute(&format!("SELEC * FROM {table}"), ())
        .await
        .expect("statement errors are returned inline");
    assert!(broken.error.is_some());

    conn.execute(&format!("DROP TABLE IF EXISTS {table}"), ())
        .await
        .expect("cleanup must succeed");
}
