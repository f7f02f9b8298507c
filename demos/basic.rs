//! Basic usage demo for mirrorcache.
//!
//! Run with: cargo run --example basic

use std::sync::Arc;

use mirrorcache::{Cache, Options, Query, SqliteDriver, Statement, StoreDriver};

fn main() -> mirrorcache::Result<()> {
    // An in-memory SQLite database stands in for the backing store.
    let driver = Arc::new(SqliteDriver::in_memory());
    driver.connect()?;
    driver.execute(&Statement::new(
        "CREATE TABLE users (id INTEGER PRIMARY KEY AUTOINCREMENT, \
         username TEXT NOT NULL DEFAULT '')",
    ))?;

    // Mirror the users table and warm up.
    let options = Options::builder().table("users").build()?;
    let cache = Cache::new(options, driver)?;
    cache.initialize()?;
    println!("cache state: {:?}", cache.state());

    // Insert: the store assigns the id, the mirror records it.
    let id = Query::insert("users")
        .set("username", "alice")?
        .apply_returning_id(&cache)?;
    println!("inserted alice with id {}", id);

    // Select: served from memory, no store round trip.
    if let Some(row) = Query::select("users")
        .where_eq("id", id.to_string())?
        .fetch_one(&cache)?
    {
        println!("cached row: id={} username={}", row["id"], row["username"]);
    }

    // Update flows to both sides.
    Query::update("users")
        .set("username", "alice2")?
        .where_eq("id", id.to_string())?
        .apply(&cache)?;
    let row = Query::select("users")
        .bypass_cache()
        .where_eq("id", id.to_string())?
        .fetch_one(&cache)?
        .expect("row exists in the store");
    println!("store row after update: username={}", row["username"]);

    // Tear down the mirror; requests now route to the store.
    cache.shutdown()?;
    println!("cache state: {:?}", cache.state());
    let rows = Query::select("users").fetch_all(&cache)?;
    println!("rows read through the store: {}", rows.len());

    println!("hit rate so far: {:.2}", cache.stats().hit_rate());
    Ok(())
}
