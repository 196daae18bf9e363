//! Startup data: the admin account and an optional demo catalog.

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{info, instrument};

use crate::{
    auth::password::{Argon2Params, hash_string_with_params},
    config::Config,
    db::{
        handlers::{Cocktails, EventShowcase, Ingredients, Locations, Repository, Users, VirtualClasses},
        models::{
            classes::VirtualClassCreateDBRequest,
            cocktails::{CocktailCreateDBRequest, CocktailFilter, CocktailIngredientCreateDBRequest},
            ingredients::IngredientCreateDBRequest,
            locations::LocationCreateDBRequest,
            private_events::{EventPackageCreateDBRequest, EventTestimonialCreateDBRequest},
            users::{UserCreateDBRequest, UserUpdateDBRequest},
        },
    },
    types::UserId,
};

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Ensure the configured admin account exists and can log in.
///
/// Does nothing without `admin_password`. An existing account with the admin
/// email is promoted and gets the configured password.
#[instrument(skip_all)]
pub async fn ensure_admin_user(config: &Config, db: &PgPool) -> anyhow::Result<Option<UserId>> {
    let Some(password) = config.admin_password.as_deref() else {
        return Ok(None);
    };
    let email = config.admin_email.trim().to_lowercase();
    let password_hash = hash_string_with_params(password, Argon2Params::from(&config.auth.password))?;

    let mut tx = db.begin().await?;
    let id = {
        let mut users = Users::new(&mut tx);
        match users.get_user_by_email(&email).await? {
            Some(existing) => {
                users
                    .update(
                        existing.id,
                        &UserUpdateDBRequest {
                            password_hash: Some(password_hash),
                            is_admin: Some(true),
                            is_active: Some(true),
                            ..Default::default()
                        },
                    )
                    .await?;
                existing.id
            }
            None => {
                let username = email.split('@').next().unwrap_or("admin").to_string();
                let created = users
                    .create(&UserCreateDBRequest {
                        email: email.clone(),
                        username,
                        password_hash,
                        first_name: "Admin".to_string(),
                        last_name: "SOBRE".to_string(),
                        phone: None,
                        dietary_preferences: vec![],
                        health_goals: vec![],
                        is_admin: true,
                    })
                    .await?;
                info!(email = %email, "Created admin user");
                created.id
            }
        }
    };
    tx.commit().await?;

    Ok(Some(id))
}

/// Insert the demo catalog when no cocktails exist yet.
///
/// Returns whether anything was inserted.
#[instrument(skip_all)]
pub async fn seed_demo_data(db: &PgPool) -> anyhow::Result<bool> {
    let mut tx = db.begin().await?;

    if Cocktails::new(&mut tx).count(&CocktailFilter::default()).await? > 0 {
        info!("Catalog already populated, skipping demo data");
        return Ok(false);
    }

    let ingredients = [
        IngredientCreateDBRequest {
            name: "Organic Spinach".to_string(),
            slug: "organic-spinach".to_string(),
            description: Some("Fresh organic spinach leaves packed with iron and vitamins".to_string()),
            category: "leafy_greens".to_string(),
            calories_per_100g: Some(23),
            health_benefits: strings(&["High in iron", "Rich in vitamins", "Antioxidant properties"]),
            color_hex: Some("#228B22".to_string()),
            is_organic: true,
            ..Default::default()
        },
        IngredientCreateDBRequest {
            name: "Fresh Ginger".to_string(),
            slug: "fresh-ginger".to_string(),
            description: Some("Organic ginger root with anti-inflammatory properties".to_string()),
            category: "herbs_spices".to_string(),
            calories_per_100g: Some(80),
            health_benefits: strings(&["Anti-inflammatory", "Digestive aid", "Immune support"]),
            color_hex: Some("#DAA520".to_string()),
            is_organic: true,
            ..Default::default()
        },
        IngredientCreateDBRequest {
            name: "Blueberries".to_string(),
            slug: "blueberries".to_string(),
            description: Some("Antioxidant-rich organic blueberries".to_string()),
            category: "berries".to_string(),
            calories_per_100g: Some(57),
            health_benefits: strings(&["High antioxidants", "Brain health", "Anti-aging"]),
            antioxidant_level: Some("high".to_string()),
            color_hex: Some("#4169E1".to_string()),
            is_organic: true,
            is_seasonal: true,
            peak_season_months: vec![6, 7, 8],
            ..Default::default()
        },
    ];
    let mut ingredient_ids = Vec::with_capacity(ingredients.len());
    {
        let mut repo = Ingredients::new(&mut tx);
        for request in &ingredients {
            ingredient_ids.push(repo.create(request).await?.id);
        }
    }

    let cocktails = [
        (
            CocktailCreateDBRequest {
                name: "Green Goddess".to_string(),
                slug: "green-goddess".to_string(),
                description: "A refreshing blend of spinach, cucumber, and mint".to_string(),
                instructions: "Muddle mint leaves, add spinach juice, cucumber, and ice. Shake well.".to_string(),
                calories_per_serving: 85,
                servings: 1,
                prep_time_minutes: 5,
                health_benefits: strings(&["Detoxifying", "Energy boosting", "Vitamin rich"]),
                dietary_tags: strings(&["vegan", "gluten-free"]),
                wellness_category: Some("detox".to_string()),
                difficulty_level: "beginner".to_string(),
                flavor_profile: strings(&["fresh", "herbal"]),
                color_hex: Some("#22c55e".to_string()),
                is_featured: true,
                ..Default::default()
            },
            vec![(0, 60.0, "g")],
        ),
        (
            CocktailCreateDBRequest {
                name: "Golden Elixir".to_string(),
                slug: "golden-elixir".to_string(),
                description: "Turmeric and ginger wellness cocktail".to_string(),
                instructions: "Combine turmeric, ginger, honey, and citrus. Shake with ice.".to_string(),
                calories_per_serving: 92,
                servings: 1,
                prep_time_minutes: 7,
                health_benefits: strings(&["Anti-inflammatory", "Immune support", "Digestive aid"]),
                dietary_tags: strings(&["gluten-free"]),
                wellness_category: Some("immunity".to_string()),
                difficulty_level: "intermediate".to_string(),
                flavor_profile: strings(&["spicy", "citrus"]),
                color_hex: Some("#f59e0b".to_string()),
                is_featured: true,
                ..Default::default()
            },
            vec![(1, 10.0, "g"), (2, 40.0, "g")],
        ),
    ];
    {
        let mut repo = Cocktails::new(&mut tx);
        for (request, lines) in &cocktails {
            let cocktail = repo.create(request).await?;
            for (order, (ingredient, quantity, unit)) in lines.iter().enumerate() {
                repo.add_ingredient(
                    cocktail.id,
                    &CocktailIngredientCreateDBRequest {
                        ingredient_id: ingredient_ids[*ingredient],
                        quantity: *quantity,
                        unit: unit.to_string(),
                        preparation_note: None,
                        order_index: order as i32,
                        is_garnish: false,
                        is_optional: false,
                    },
                )
                .await?;
            }
        }
    }

    VirtualClasses::new(&mut tx)
        .create(&VirtualClassCreateDBRequest {
            title: "Healthy Cocktail Fundamentals".to_string(),
            description: "Learn the basics of creating nutritious and delicious cocktails".to_string(),
            instructor_name: "Chef Maria Rodriguez".to_string(),
            scheduled_datetime: Utc::now() + Duration::days(7),
            duration_minutes: 60,
            max_participants: 20,
            price: Decimal::new(2999, 2),
            difficulty_level: "beginner".to_string(),
            equipment_needed: strings(&["Shaker", "Muddler", "Jigger"]),
            is_featured: true,
            ..Default::default()
        })
        .await?;

    Locations::new(&mut tx)
        .create(&LocationCreateDBRequest {
            name: "SOBRE Arcachon".to_string(),
            slug: "arcachon".to_string(),
            description: Some("Our flagship bar on the Arcachon seafront".to_string()),
            street_address: "Boulevard de la Plage".to_string(),
            city: "Arcachon".to_string(),
            postal_code: "33120".to_string(),
            country: "France".to_string(),
            latitude: 44.6586,
            longitude: -1.1689,
            phone: Some("+33 5 56 83 01 69".to_string()),
            email: Some("hello@sobre.com".to_string()),
            parking_info: Some("Public parking on Place Thiers, two minutes away".to_string()),
            public_transport_info: Some("Arcachon station is a ten minute walk".to_string()),
            is_active: true,
            is_primary: true,
            ..Default::default()
        })
        .await?;

    {
        let mut showcase = EventShowcase::new(&mut tx);
        let packages = [
            ("Essential", "essential", 4500, 10, 3, Some(4), false),
            ("Signature", "signature", 6500, 20, 4, Some(6), true),
            ("Bespoke", "bespoke", 9500, 20, 5, None, false),
        ];
        for (order, (name, slug, cents, min_guests, hours, cocktail_count, featured)) in packages.into_iter().enumerate()
        {
            showcase
                .create_package(&EventPackageCreateDBRequest {
                    name: name.to_string(),
                    slug: slug.to_string(),
                    description: Some(format!("{name} mocktail service with a dedicated bartender")),
                    price_per_person: Decimal::new(cents, 2),
                    features: strings(&["Dedicated bartender", "Seasonal menu", "Glassware"]),
                    max_guests: None,
                    min_guests,
                    service_hours: hours,
                    cocktail_count,
                    custom_menu_design: slug == "bespoke",
                    is_featured: featured,
                    sort_order: order as i32,
                })
                .await?;
        }

        let testimonials = [
            ("Claire M.", "Wedding", "Our guests still talk about the lavender spritz.", true),
            ("Julien R.", "Corporate", "Flawless service for 80 people, and nobody missed the alcohol.", true),
            ("Sofia L.", "Birthday", "Beautiful drinks and a lovely team.", false),
        ];
        for (order, (client, event_type, content, featured)) in testimonials.into_iter().enumerate() {
            showcase
                .create_testimonial(&EventTestimonialCreateDBRequest {
                    client_name: client.to_string(),
                    content: content.to_string(),
                    rating: 5,
                    event_type: Some(event_type.to_string()),
                    is_featured: featured,
                    is_approved: true,
                    display_order: order as i32,
                    ..Default::default()
                })
                .await?;
        }
    }

    tx.commit().await?;
    info!("Seeded demo data");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::verify_string;
    use crate::test_utils::create_test_config;

    #[sqlx::test]
    #[test_log::test]
    async fn test_admin_user_is_created_then_refreshed(pool: PgPool) {
        let mut config = create_test_config();
        assert!(ensure_admin_user(&config, &pool).await.unwrap().is_none());

        config.admin_password = Some("first-password".to_string());
        let id = ensure_admin_user(&config, &pool).await.unwrap().unwrap();

        config.admin_password = Some("second-password".to_string());
        let again = ensure_admin_user(&config, &pool).await.unwrap().unwrap();
        assert_eq!(id, again);

        let mut conn = pool.acquire().await.unwrap();
        let admin = Users::new(&mut conn).get_by_id(id).await.unwrap().unwrap();
        assert!(admin.is_admin);
        assert_eq!(admin.email, "admin@test.com");
        assert!(verify_string("second-password", &admin.password_hash).unwrap());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_demo_data_seeds_once(pool: PgPool) {
        assert!(seed_demo_data(&pool).await.unwrap());
        assert!(!seed_demo_data(&pool).await.unwrap());

        let mut conn = pool.acquire().await.unwrap();
        let mut cocktails = Cocktails::new(&mut conn);
        assert_eq!(cocktails.count(&CocktailFilter::default()).await.unwrap(), 2);
        let featured = cocktails.featured(6).await.unwrap();
        assert_eq!(featured.len(), 2);
        let golden = featured.iter().find(|c| c.slug == "golden-elixir").unwrap();
        assert_eq!(cocktails.ingredients_for(golden.id).await.unwrap().len(), 2);

        assert_eq!(EventShowcase::new(&mut conn).count_packages().await.unwrap(), 3);
        assert_eq!(Locations::new(&mut conn).primary().await.unwrap().unwrap().slug, "arcachon");
    }
}
