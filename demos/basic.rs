use psdb_http::{connect, Config, Params, Value};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let url = std::env::var("DATABASE_URL")?;
    let mut conn = connect(Config::from_url(&url)?);

    conn.execute(
        "CREATE TABLE IF NOT EXISTS users (id BIGINT AUTO_INCREMENT PRIMARY KEY, name VARCHAR(64) NOT NULL)",
        (),
    )
    .await?;

    let insert = conn
        .execute("INSERT INTO users (name) VALUES (?)", [Value::text("Kit")])
        .await?;
    println!("inserted id {:?}", insert.insert_id);

    let result = conn
        .execute(
            "SELECT id, name FROM users WHERE name = :name",
            Params::named([("name", Value::text("Kit"))]),
        )
        .await?;

    if let Some(error) = result.error {
        anyhow::bail!("{}: {}", error.code, error.message);
    }
    for row in result.rows {
        println!("{row:?}");
    }

    Ok(())
}
