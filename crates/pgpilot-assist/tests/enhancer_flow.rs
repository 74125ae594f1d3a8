//! Error enhancement against an in-memory catalog.

use async_trait::async_trait;
use pgpilot_assist::{CatalogAccessor, ColumnRef, ErrorEnhancer, SchemaCache};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

struct ShopCatalog {
    tables: Vec<&'static str>,
    columns: Vec<(&'static str, &'static str)>,
    broken: AtomicBool,
}

impl ShopCatalog {
    fn new() -> Self {
        Self {
            tables: vec!["users", "orders", "order_items"],
            columns: vec![
                ("users", "id"),
                ("users", "name"),
                ("users", "email"),
                ("orders", "id"),
                ("orders", "user_id"),
                ("orders", "total"),
                ("order_items", "order_id"),
                ("order_items", "quantity"),
            ],
            broken: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl CatalogAccessor for ShopCatalog {
    async fn list_tables(&self) -> anyhow::Result<Vec<String>> {
        if self.broken.load(Ordering::SeqCst) {
            anyhow::bail!("connection refused");
        }
        Ok(self.tables.iter().map(|t| t.to_string()).collect())
    }

    async fn list_columns(&self) -> anyhow::Result<Vec<ColumnRef>> {
        Ok(self
            .columns
            .iter()
            .map(|(t, c)| ColumnRef::new(*t, *c))
            .collect())
    }
}

fn enhancer(catalog: Arc<ShopCatalog>) -> ErrorEnhancer<Arc<ShopCatalog>> {
    ErrorEnhancer::new(Arc::new(SchemaCache::new(catalog, Duration::from_secs(300))))
}

#[tokio::test]
async fn column_typo_scoped_to_table() {
    let enhancer = enhancer(Arc::new(ShopCatalog::new()));
    let text = enhancer
        .enhance("column \"naem\" does not exist", "SELECT naem FROM users")
        .await;

    assert_eq!(
        text,
        "Column \"naem\" does not exist in table \"users\".\n\
         Did you mean: name?\n\
         Available columns in users: id, name, email"
    );
}

#[tokio::test]
async fn column_without_recoverable_table_uses_all_columns() {
    let enhancer = enhancer(Arc::new(ShopCatalog::new()));
    let text = enhancer.enhance("column \"quantty\" does not exist", "SELECT quantty").await;

    assert_eq!(text, "Column \"quantty\" does not exist.\nDid you mean: quantity?");
}

#[tokio::test]
async fn unknown_recovered_table_falls_back_to_all_columns() {
    let enhancer = enhancer(Arc::new(ShopCatalog::new()));
    let text = enhancer
        .enhance("column \"totl\" does not exist", "SELECT totl FROM archive")
        .await;

    assert_eq!(text, "Column \"totl\" does not exist.\nDid you mean: total?");
}

#[tokio::test]
async fn driver_named_relation_wins_over_sql() {
    let enhancer = enhancer(Arc::new(ShopCatalog::new()));
    let text = enhancer
        .enhance(
            "column \"emial\" of relation \"users\" does not exist",
            "UPDATE orders SET total = 0 FROM users",
        )
        .await;

    assert!(text.starts_with("Column \"emial\" does not exist in table \"users\"."));
    assert!(text.contains("Did you mean: email?"));
}

#[tokio::test]
async fn no_similar_column() {
    let enhancer = enhancer(Arc::new(ShopCatalog::new()));
    let text = enhancer
        .enhance("column \"zzzzzzzz\" does not exist", "select zzzzzzzz from orders")
        .await;

    assert_eq!(
        text,
        "Column \"zzzzzzzz\" does not exist in table \"orders\".\n\
         No similar column names found.\n\
         Available columns in orders: id, user_id, total"
    );
}

#[tokio::test]
async fn relation_typo() {
    let enhancer = enhancer(Arc::new(ShopCatalog::new()));
    let text = enhancer
        .enhance("relation \"usres\" does not exist", "select * from usres")
        .await;

    assert_eq!(
        text,
        "Table \"usres\" does not exist.\n\
         Did you mean: users?\n\
         Available tables: users, orders, order_items"
    );
}

#[tokio::test]
async fn unrecognized_error_is_unchanged() {
    let enhancer = enhancer(Arc::new(ShopCatalog::new()));
    let message = "duplicate key value violates unique constraint \"users_pkey\"";
    assert_eq!(enhancer.enhance(message, "insert into users values (1)").await, message);
}

#[tokio::test]
async fn schema_failure_returns_original_message() {
    let catalog = Arc::new(ShopCatalog::new());
    catalog.broken.store(true, Ordering::SeqCst);
    let enhancer = enhancer(catalog);

    let message = "column \"naem\" does not exist";
    assert_eq!(enhancer.enhance(message, "SELECT naem FROM users").await, message);
}
