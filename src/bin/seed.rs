use farmbox_api::{
    config::AppConfig,
    db::{create_pool, migrate},
    domain::{plan::Plan, role::Role},
    services::auth_service::hash_password,
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url, config.max_connections).await?;
    migrate(&pool).await?;

    let admin_id = ensure_user(&pool, "admin@example.com", "admin123", Role::Admin).await?;
    let customer_id = ensure_user(&pool, "customer@example.com", "customer123", Role::Customer).await?;
    let farmer_id = ensure_user(&pool, "farmer@example.com", "farmer123", Role::Producer).await?;
    let producer_id = ensure_producer(&pool, farmer_id, "Green Valley Farm").await?;
    let employee_id = ensure_user(&pool, "packer@example.com", "packer123", Role::Employee).await?;
    assign_employee(&pool, employee_id, producer_id).await?;

    seed_products(&pool, producer_id).await?;
    ensure_subscription(&pool, customer_id, Plan::Standard).await?;

    println!(
        "Seed completed. Admin ID: {admin_id}, Customer ID: {customer_id}, Producer ID: {producer_id}"
    );
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    role: Role,
) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let (user_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, role)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(role.as_str())
    .fetch_one(pool)
    .await?;

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn ensure_producer(pool: &sqlx::PgPool, user_id: Uuid, name: &str) -> anyhow::Result<Uuid> {
    let (producer_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO producers (id, user_id, name, description, location)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (user_id) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(name)
    .bind("Family farm, seasonal produce")
    .bind("Valley Road 12")
    .fetch_one(pool)
    .await?;

    println!("Ensured producer {name}");
    Ok(producer_id)
}

async fn assign_employee(pool: &sqlx::PgPool, user_id: Uuid, producer_id: Uuid) -> anyhow::Result<()> {
    sqlx::query("UPDATE users SET producer_id = $2 WHERE id = $1")
        .bind(user_id)
        .bind(producer_id)
        .execute(pool)
        .await?;
    Ok(())
}

async fn seed_products(pool: &sqlx::PgPool, producer_id: Uuid) -> anyhow::Result<()> {
    let products = vec![
        ("Carrots", "Crunchy orange carrots", "vegetables", 250, 1.0, 80),
        ("Potatoes", "Floury potatoes, 2kg bag", "vegetables", 400, 2.0, 60),
        ("Apples", "Mixed seasonal apples", "fruits", 350, 1.0, 100),
        ("Whole Milk", "Fresh farm milk, 1L", "dairy", 150, 1.03, 40),
        ("Sourdough Loaf", "Baked every morning", "bakery", 500, 0.8, 20),
        ("Beef Mince", "Grass fed, 500g", "meat", 900, 0.5, 15),
    ];

    for (name, desc, category, price, weight, stock) in products {
        sqlx::query(
            r#"
            INSERT INTO products (id, producer_id, name, description, category, price, weight_in_kg, stock)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (producer_id, name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(producer_id)
        .bind(name)
        .bind(desc)
        .bind(category)
        .bind(price as i64)
        .bind(weight)
        .bind(stock as i32)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}

async fn ensure_subscription(pool: &sqlx::PgPool, user_id: Uuid, plan: Plan) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO subscriptions (id, user_id, plan, limit_in_kg, used_kg, is_active)
        VALUES ($1, $2, $3, $4, 0, TRUE)
        ON CONFLICT (user_id) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(plan.as_str())
    .bind(plan.limit_in_kg())
    .execute(pool)
    .await?;

    println!("Ensured {plan} subscription");
    Ok(())
}
