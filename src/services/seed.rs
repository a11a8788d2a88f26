//! Sample data for local development. Re-running only adds what is missing.

use anyhow::Result;
use tracing::info;

use crate::config::SecurityConfig;
use crate::db::Store;
use crate::entities::users::Role;
use crate::models::product::NewProduct;
use crate::models::user::NewUser;

const SAMPLE_PASSWORD: &str = "password123";

const SAMPLE_USERNAMES: [&str; 5] = [
    "john_doe",
    "jane_smith",
    "bob_wilson",
    "alice_brown",
    "charlie_davis",
];

const SAMPLE_DOMAINS: [&str; 4] = ["gmail.com", "yahoo.com", "outlook.com", "example.com"];

/// (name, description, price, category, quantity)
const SAMPLE_PRODUCTS: [(&str, &str, f64, &str, i32); 15] = [
    ("Laptop Pro 15", "High-performance laptop with 16GB RAM", 1299.99, "Electronics", 25),
    ("Wireless Mouse", "Ergonomic wireless mouse with long battery life", 29.99, "Electronics", 100),
    ("Mechanical Keyboard", "RGB mechanical keyboard with blue switches", 89.99, "Electronics", 50),
    ("USB-C Hub", "7-in-1 USB-C hub with HDMI and SD card reader", 49.99, "Electronics", 75),
    ("Webcam HD", "1080p HD webcam with built-in microphone", 69.99, "Electronics", 40),
    ("Office Chair", "Ergonomic office chair with lumbar support", 299.99, "Furniture", 15),
    ("Standing Desk", "Electric height-adjustable standing desk", 499.99, "Furniture", 10),
    ("Monitor Stand", "Dual monitor stand with cable management", 79.99, "Furniture", 30),
    ("Desk Lamp LED", "Adjustable LED desk lamp with USB charging port", 39.99, "Furniture", 60),
    ("Python Programming Book", "Comprehensive guide to Python programming", 45.99, "Books", 100),
    ("Flask Web Development", "Learn Flask framework from scratch", 39.99, "Books", 80),
    ("REST API Design", "Best practices for designing RESTful APIs", 34.99, "Books", 55),
    ("Notebook Pack", "Pack of 5 spiral notebooks", 12.99, "Office Supplies", 200),
    ("Pen Set Premium", "Set of 10 premium ballpoint pens", 9.99, "Office Supplies", 150),
    ("Wireless Headphones", "Noise-cancelling wireless headphones", 199.99, "Electronics", 35),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub users_created: usize,
    pub products_created: usize,
}

pub async fn seed_sample_data(store: &Store, security: &SecurityConfig) -> Result<SeedSummary> {
    let mut summary = SeedSummary::default();

    let users = store.users();
    for (i, username) in SAMPLE_USERNAMES.iter().enumerate() {
        if users.get_by_username(username).await?.is_some() {
            continue;
        }

        let email = format!("{username}@{}", SAMPLE_DOMAINS[i % SAMPLE_DOMAINS.len()]);
        users
            .create(
                NewUser {
                    username: (*username).to_string(),
                    email,
                    password: Some(SAMPLE_PASSWORD.to_string()),
                    role: Role::User,
                    is_active: true,
                },
                security,
            )
            .await?;
        info!(username, "Seeded user");
        summary.users_created += 1;
    }

    let products = store.products();
    let mut missing = Vec::new();
    for (name, description, price, category, quantity) in SAMPLE_PRODUCTS {
        if products.exists_by_name(name).await? {
            continue;
        }
        missing.push(NewProduct {
            name: name.to_string(),
            description: Some(description.to_string()),
            price,
            quantity,
            category: Some(category.to_string()),
            is_available: true,
        });
    }
    summary.products_created = products.bulk_create(missing).await?.len();

    info!(
        users = summary.users_created,
        products = summary.products_created,
        "Sample data seeded"
    );
    Ok(summary)
}
