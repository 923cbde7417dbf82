use chrono::{Duration, Utc};
use gocart_api::db::{create_pool, orm_from_pool, run_migrations};
use uuid::Uuid;

const SELLER_ID: &str = "user_seed_seller";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")?;
    let admin_email =
        std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@example.com".to_string());

    let pool = create_pool(&database_url).await?;
    run_migrations(&orm_from_pool(&pool)).await?;

    ensure_user(&pool, "user_seed_admin", &admin_email, "Admin").await?;
    ensure_user(&pool, SELLER_ID, "seller@example.com", "Seed Seller").await?;
    let store_id = ensure_store(&pool).await?;
    let products = seed_products(&pool, store_id).await?;
    seed_coupons(&pool).await?;

    println!("Seed completed. Store ID: {store_id}, products inserted: {products}");
    Ok(())
}

async fn ensure_user(pool: &sqlx::PgPool, id: &str, email: &str, name: &str) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO users (id, email, name)
        VALUES ($1, $2, $3)
        ON CONFLICT (id) DO UPDATE SET email = EXCLUDED.email, name = EXCLUDED.name
        "#,
    )
    .bind(id)
    .bind(email)
    .bind(name)
    .execute(pool)
    .await?;
    Ok(())
}

async fn ensure_store(pool: &sqlx::PgPool) -> anyhow::Result<Uuid> {
    let row: (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO stores (id, user_id, name, username, description, email, contact, address,
                            is_active, status, latitude, longitude, city, country)
        VALUES ($1, $2, 'Green Grocer', 'green-grocer', 'Fresh produce every day',
                'seller@example.com', '+1 555 0100', '1 Market Street, Springfield',
                TRUE, 'approved', 40.7128, -74.0060, 'Springfield', 'US')
        ON CONFLICT (user_id) DO UPDATE SET status = 'approved', is_active = TRUE
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(SELLER_ID)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

async fn seed_products(pool: &sqlx::PgPool, store_id: Uuid) -> anyhow::Result<u64> {
    let (existing,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products WHERE store_id = $1")
        .bind(store_id)
        .fetch_one(pool)
        .await?;
    if existing > 0 {
        return Ok(0);
    }

    let products = [
        ("Organic apples", "Crisp red apples, 1kg bag", "fruit", 600_i64, 450_i64, 40_i32),
        ("Sourdough loaf", "Baked this morning", "bakery", 800, 700, 15),
        ("Ceramic mug", "Hand glazed, 350ml", "kitchen", 1500, 1200, 8),
    ];

    let mut inserted = 0;
    for (name, description, category, mrp, price, stock) in products {
        sqlx::query(
            r#"
            INSERT INTO products (id, store_id, name, description, mrp, price, stock, category,
                                  images, latitude, longitude, city, country)
            SELECT $1, s.id, $2, $3, $4, $5, $6, $7, '[]'::jsonb,
                   s.latitude, s.longitude, s.city, s.country
            FROM stores s WHERE s.id = $8
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(description)
        .bind(mrp)
        .bind(price)
        .bind(stock)
        .bind(category)
        .bind(store_id)
        .execute(pool)
        .await?;
        inserted += 1;
    }
    Ok(inserted)
}

async fn seed_coupons(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let expires_at = Utc::now() + Duration::days(90);
    let coupons = [
        ("WELCOME10", "10% off your first order", 10, true, false, true),
        ("PLUS20", "20% off for members", 20, false, true, false),
    ];
    for (code, description, discount, for_new_user, for_member, is_public) in coupons {
        sqlx::query(
            r#"
            INSERT INTO coupons (code, description, discount, for_new_user, for_member, is_public, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (code) DO NOTHING
            "#,
        )
        .bind(code)
        .bind(description)
        .bind(discount)
        .bind(for_new_user)
        .bind(for_member)
        .bind(is_public)
        .bind(expires_at)
        .execute(pool)
        .await?;
    }
    Ok(())
}
