//! End-to-end routing scenarios against two physically separate SQLite
//! databases. Each database carries an `endpoint` table naming itself, so
//! a test can ask the connection it was handed where it really points.

#![allow(clippy::panic)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use readwrite_router::domain::{PoolKey, PoolRegistry};
use readwrite_router::routing::{DataSourceRouter, RoutingContext, ScopeState};
use readwrite_router::{Intent, RoutingError};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Sqlite, SqliteConnection, SqlitePool};
use tempfile::TempDir;
use tokio::sync::Barrier;

async fn seeded_pool(dir: &Path, name: &str, max_connections: u32) -> SqlitePool {
    let options = SqliteConnectOptions::new()
        .filename(dir.join(format!("{name}.db")))
        .create_if_missing(true);
    let Ok(pool) = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(1))
        .connect_with(options)
        .await
    else {
        panic!("cannot open {name} database");
    };
    let created = sqlx::query("CREATE TABLE endpoint (name TEXT NOT NULL)")
        .execute(&pool)
        .await;
    assert!(created.is_ok());
    let seeded = sqlx::query("INSERT INTO endpoint (name) VALUES ($1)")
        .bind(name)
        .execute(&pool)
        .await;
    assert!(seeded.is_ok());
    pool
}

async fn router_with(dir: &Path, max_connections: u32) -> DataSourceRouter<Sqlite> {
    let mut registry = PoolRegistry::new();
    let primary = seeded_pool(dir, "primary", max_connections).await;
    let replica = seeded_pool(dir, "replica", max_connections).await;
    assert!(registry.register(PoolKey::ReadWrite, "sqlite:primary", primary).is_ok());
    assert!(registry.register(PoolKey::ReadOnly, "sqlite:replica", replica).is_ok());
    assert!(registry.set_default(PoolKey::ReadWrite).is_ok());
    let Ok(router) = DataSourceRouter::new(registry) else {
        panic!("registry is complete");
    };
    router
}

async fn physical_endpoint(conn: &mut SqliteConnection) -> String {
    let Ok(name) = sqlx::query_scalar::<_, String>("SELECT name FROM endpoint")
        .fetch_one(conn)
        .await
    else {
        panic!("endpoint table readable");
    };
    name
}

/// Opens a scope, resolves, and returns (pool key, physical endpoint).
async fn route_once(ctx: &mut RoutingContext<Sqlite>, intent: Intent) -> (PoolKey, String) {
    let Ok(scope) = ctx.begin_scope(intent) else {
        panic!("scope should open");
    };
    let Ok(conn) = ctx.resolve_connection(scope).await else {
        panic!("connection should resolve");
    };
    let key = conn.pool_key();
    let endpoint = physical_endpoint(conn).await;
    assert!(ctx.end_scope(scope).await);
    (key, endpoint)
}

#[tokio::test]
async fn write_then_read_then_write_switches_pools() {
    let dir = TempDir::new().unwrap_or_else(|e| panic!("tempdir: {e}"));
    let router = router_with(dir.path(), 2).await;
    let mut ctx = router.context();

    let first = route_once(&mut ctx, Intent::ReadWrite).await;
    assert_eq!(first, (PoolKey::ReadWrite, "primary".to_string()));

    let second = route_once(&mut ctx, Intent::ReadOnly).await;
    assert_eq!(second, (PoolKey::ReadOnly, "replica".to_string()));

    let third = route_once(&mut ctx, Intent::ReadWrite).await;
    assert_eq!(third, (PoolKey::ReadWrite, "primary".to_string()));
}

#[tokio::test]
async fn resolving_twice_returns_the_same_connection() {
    let dir = TempDir::new().unwrap_or_else(|e| panic!("tempdir: {e}"));
    let router = router_with(dir.path(), 2).await;
    let mut ctx = router.context();

    let Ok(scope) = ctx.begin_scope(Intent::ReadOnly) else {
        panic!("scope should open");
    };
    let Ok(first) = ctx.resolve_connection(scope).await.map(|c| c.checkout_id()) else {
        panic!("first resolve");
    };
    let Ok(second) = ctx.resolve_connection(scope).await.map(|c| c.checkout_id()) else {
        panic!("second resolve");
    };
    assert_eq!(first, second);
    assert!(ctx.end_scope(scope).await);
}

#[tokio::test]
async fn scope_state_follows_lifecycle() {
    let dir = TempDir::new().unwrap_or_else(|e| panic!("tempdir: {e}"));
    let router = router_with(dir.path(), 2).await;
    let mut ctx = router.context();

    let Ok(scope) = ctx.begin_scope(Intent::ReadWrite) else {
        panic!("scope should open");
    };
    assert_eq!(ctx.scope_state(scope), ScopeState::Unresolved);
    assert!(ctx.resolve_connection(scope).await.is_ok());
    assert_eq!(ctx.scope_state(scope), ScopeState::Resolved);
    assert!(ctx.commit_scope(scope).await.is_ok());
    assert_eq!(ctx.scope_state(scope), ScopeState::Closed);
    assert!(matches!(
        ctx.commit_scope(scope).await,
        Err(RoutingError::ScopeClosed(_))
    ));
}

#[tokio::test]
async fn concurrent_contexts_route_independently() {
    let dir = TempDir::new().unwrap_or_else(|e| panic!("tempdir: {e}"));
    let router = router_with(dir.path(), 4).await;
    let barrier = Arc::new(Barrier::new(2));

    let spawn = |intent: Intent| {
        let router = router.clone();
        let barrier = Arc::clone(&barrier);
        tokio::spawn(async move {
            let mut ctx = router.context();
            let Ok(scope) = ctx.begin_scope(intent) else {
                panic!("scope should open");
            };
            // Both scopes are open before either resolves.
            barrier.wait().await;
            let Ok(conn) = ctx.resolve_connection(scope).await else {
                panic!("connection should resolve");
            };
            let key = conn.pool_key();
            let endpoint = physical_endpoint(conn).await;
            assert_eq!(ctx.current_intent(), intent);
            ctx.end_scope(scope).await;
            (key, endpoint)
        })
    };

    let writer = spawn(Intent::ReadWrite);
    let reader = spawn(Intent::ReadOnly);

    let (Ok(writer), Ok(reader)) = (writer.await, reader.await) else {
        panic!("tasks should not panic");
    };
    assert_eq!(writer, (PoolKey::ReadWrite, "primary".to_string()));
    assert_eq!(reader, (PoolKey::ReadOnly, "replica".to_string()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn many_tasks_never_cross_contaminate() {
    let dir = TempDir::new().unwrap_or_else(|e| panic!("tempdir: {e}"));
    let router = router_with(dir.path(), 4).await;

    let mut handles = Vec::new();
    for i in 0..16_u32 {
        let router = router.clone();
        handles.push(tokio::spawn(async move {
            let mut ctx = router.context();
            let mut observed = Vec::new();
            for round in 0..4_u32 {
                let intent = if (i + round) % 2 == 0 {
                    Intent::ReadOnly
                } else {
                    Intent::ReadWrite
                };
                let (key, endpoint) = route_once(&mut ctx, intent).await;
                observed.push((intent, key, endpoint));
                tokio::task::yield_now().await;
            }
            observed
        }));
    }

    for handle in handles {
        let Ok(observed) = handle.await else {
            panic!("task should not panic");
        };
        for (intent, key, endpoint) in observed {
            assert_eq!(key, PoolKey::from(intent));
            let expected = match intent {
                Intent::ReadWrite => "primary",
                Intent::ReadOnly => "replica",
            };
            assert_eq!(endpoint, expected);
        }
    }
}

#[tokio::test]
async fn error_path_still_releases_connection() {
    let dir = TempDir::new().unwrap_or_else(|e| panic!("tempdir: {e}"));
    // A single connection per pool: the next checkout only succeeds if the
    // failed unit of work gave its connection back.
    let router = router_with(dir.path(), 1).await;

    let failed: Result<(), RoutingError> = router
        .run_with_intent(Intent::ReadOnly, |ctx, scope| {
            Box::pin(async move {
                let conn = ctx.resolve_connection(scope).await?;
                sqlx::query("SELECT * FROM missing_table")
                    .execute(&mut **conn)
                    .await?;
                Ok::<_, RoutingError>(())
            })
        })
        .await;
    assert!(matches!(failed, Err(RoutingError::Database(_))));

    let key: Result<PoolKey, RoutingError> = router
        .run_with_intent(Intent::ReadOnly, |ctx, scope| {
            Box::pin(async move {
                let key = ctx.resolve_connection(scope).await?.pool_key();
                Ok::<_, RoutingError>(key)
            })
        })
        .await;
    assert!(matches!(key, Ok(PoolKey::ReadOnly)));
}

#[tokio::test]
async fn exhausted_pool_surfaces_connection_unavailable() {
    let dir = TempDir::new().unwrap_or_else(|e| panic!("tempdir: {e}"));
    let router = router_with(dir.path(), 1).await;

    let mut holder = router.context();
    let Ok(held) = holder.begin_scope(Intent::ReadOnly) else {
        panic!("scope should open");
    };
    assert!(holder.resolve_connection(held).await.is_ok());

    let mut waiter = router.context();
    let Ok(scope) = waiter.begin_scope(Intent::ReadOnly) else {
        panic!("scope should open");
    };
    let result = waiter.resolve_connection(scope).await;
    assert!(matches!(
        result,
        Err(RoutingError::ConnectionUnavailable {
            key: PoolKey::ReadOnly,
            ..
        })
    ));
    // No cross-pool fallback: the scope is still unresolved.
    assert_eq!(waiter.scope_state(scope), ScopeState::Unresolved);

    // The write pool is unaffected.
    let mut writer = router.context();
    let (key, endpoint) = route_once(&mut writer, Intent::ReadWrite).await;
    assert_eq!((key, endpoint.as_str()), (PoolKey::ReadWrite, "primary"));

    assert!(holder.end_scope(held).await);
    let Ok(conn) = waiter.resolve_connection(scope).await else {
        panic!("released connection should be available");
    };
    assert_eq!(conn.pool_key(), PoolKey::ReadOnly);
}

#[tokio::test]
async fn read_only_endpoint_rejects_writes() {
    let dir = TempDir::new().unwrap_or_else(|e| panic!("tempdir: {e}"));
    let path = dir.path().join("shared.db");

    let Ok(primary) = SqlitePoolOptions::new()
        .max_connections(2)
        .connect_with(
            SqliteConnectOptions::new()
                .filename(&path)
                .create_if_missing(true),
        )
        .await
    else {
        panic!("primary should open");
    };
    let created = sqlx::query("CREATE TABLE notes (body TEXT NOT NULL)")
        .execute(&primary)
        .await;
    assert!(created.is_ok());

    let Ok(replica) = SqlitePoolOptions::new()
        .max_connections(2)
        .connect_with(SqliteConnectOptions::new().filename(&path).read_only(true))
        .await
    else {
        panic!("replica should open");
    };

    let mut registry = PoolRegistry::new();
    assert!(registry.register(PoolKey::ReadWrite, "primary", primary).is_ok());
    assert!(registry.register(PoolKey::ReadOnly, "replica", replica).is_ok());
    assert!(registry.set_default(PoolKey::ReadWrite).is_ok());
    let Ok(router) = DataSourceRouter::new(registry) else {
        panic!("registry is complete");
    };

    let rejected: Result<(), RoutingError> = router
        .run_with_intent(Intent::ReadOnly, |ctx, scope| {
            Box::pin(async move {
                let conn = ctx.resolve_connection(scope).await?;
                sqlx::query("INSERT INTO notes (body) VALUES ('from replica')")
                    .execute(&mut **conn)
                    .await?;
                Ok::<_, RoutingError>(())
            })
        })
        .await;
    assert!(matches!(rejected, Err(RoutingError::Database(_))));

    let written: Result<(), RoutingError> = router
        .run_with_intent(Intent::ReadWrite, |ctx, scope| {
            Box::pin(async move {
                let conn = ctx.resolve_connection(scope).await?;
                sqlx::query("INSERT INTO notes (body) VALUES ('from primary')")
                    .execute(&mut **conn)
                    .await?;
                Ok::<_, RoutingError>(())
            })
        })
        .await;
    assert!(written.is_ok());

    let bodies: Result<Vec<String>, RoutingError> = router
        .run_with_intent(Intent::ReadOnly, |ctx, scope| {
            Box::pin(async move {
                let conn = ctx.resolve_connection(scope).await?;
                let bodies = sqlx::query_scalar::<_, String>("SELECT body FROM notes")
                    .fetch_all(&mut **conn)
                    .await?;
                Ok::<_, RoutingError>(bodies)
            })
        })
        .await;
    let Ok(bodies) = bodies else {
        panic!("replica should read committed rows");
    };
    assert_eq!(bodies, vec!["from primary".to_string()]);
}

#[tokio::test]
async fn rolled_back_scope_leaves_no_rows() {
    let dir = TempDir::new().unwrap_or_else(|e| panic!("tempdir: {e}"));
    let router = router_with(dir.path(), 2).await;
    let mut ctx = router.context();

    let Ok(scope) = ctx.begin_scope(Intent::ReadWrite) else {
        panic!("scope should open");
    };
    let Ok(conn) = ctx.resolve_connection(scope).await else {
        panic!("connection should resolve");
    };
    let inserted = sqlx::query("INSERT INTO endpoint (name) VALUES ('discarded')")
        .execute(&mut **conn)
        .await;
    assert!(inserted.is_ok());
    assert!(ctx.end_scope(scope).await);

    let Ok(scope) = ctx.begin_scope(Intent::ReadWrite) else {
        panic!("scope should open");
    };
    let Ok(conn) = ctx.resolve_connection(scope).await else {
        panic!("connection should resolve");
    };
    let Ok(count) = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM endpoint")
        .fetch_one(&mut **conn)
        .await
    else {
        panic!("count should succeed");
    };
    assert_eq!(count, 1);
    assert!(ctx.commit_scope(scope).await.is_ok());
}
