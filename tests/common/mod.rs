#![allow(dead_code)]

use jsonwebtoken::{EncodingKey, Header, encode};
use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, DatabaseConnection, Set};
use shop_checkout::{
    db::{create_orm_conn, run_migrations},
    entity::{
        products::{ActiveModel as ProductActive, Model as ProductModel},
        users::ActiveModel as UserActive,
    },
    middleware::auth::{AuthUser, Claims},
    state::AppState,
};
use tokio::sync::OnceCell;
use uuid::Uuid;

pub const JWT_SECRET: &str = "test-secret";

static MIGRATED: OnceCell<()> = OnceCell::const_new();

/// State whose database is disconnected. Enough for anything that is decided
/// before a query runs.
pub fn offline_state() -> AppState {
    AppState::new(DatabaseConnection::Disconnected, JWT_SECRET)
}

/// Connects to `TEST_DATABASE_URL` (or `DATABASE_URL`) and applies migrations
/// once per test binary. `None` when neither is set.
pub async fn database_state() -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run database flows.");
            return Ok(None);
        }
    };

    MIGRATED
        .get_or_try_init(|| async {
            let conn = create_orm_conn(&database_url).await?;
            run_migrations(&conn).await
        })
        .await?;

    let orm = create_orm_conn(&database_url).await?;
    Ok(Some(AppState::new(orm, JWT_SECRET)))
}

pub fn token_for(user_id: Uuid, role: &str) -> String {
    let claims = Claims {
        sub: user_id.to_string(),
        role: role.to_string(),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("encode test token")
}

pub fn auth(user_id: Uuid, role: &str) -> AuthUser {
    AuthUser {
        user_id,
        role: role.to_string(),
    }
}

/// Inserts a user with a unique email, so tests can share one database.
pub async fn create_user(state: &AppState, role: &str) -> anyhow::Result<AuthUser> {
    let id = Uuid::new_v4();
    UserActive {
        id: Set(id),
        email: Set(format!("{id}@example.com")),
        password_hash: Set("dummy".into()),
        role: Set(role.into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(auth(id, role))
}

pub async fn create_product(state: &AppState, name: &str, price: i64) -> anyhow::Result<ProductModel> {
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.into()),
        description: Set(Some(format!("{name} for testing"))),
        price: Set(price),
        stock: Set(10),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(product)
}
