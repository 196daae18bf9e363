//! OpenAPI documentation for the `/api/*` surface.
//!
//! Rendered with Scalar at `/api/docs`; the raw document is served at
//! `/api/openapi.json`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::api;

/// Bearer JWT issued by `/auth/login`.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "BearerAuth".to_string(),
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Access token from `POST /auth/login` or `POST /auth/register`:\n\n\
                            ```\nAuthorization: Bearer ACCESS_TOKEN\n```\n\n\
                            Expired access tokens can be exchanged with `POST /auth/refresh`.",
                        ))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    servers(
        (url = "/api", description = "SOBRE API")
    ),
    modifiers(&SecurityAddon),
    paths(
        api::handlers::auth::register,
        api::handlers::auth::login,
        api::handlers::auth::refresh,
        api::handlers::auth::me,
        api::handlers::auth::logout,
        api::handlers::auth::verify_email,
        api::handlers::auth::forgot_password,
        api::handlers::auth::reset_password,
        api::handlers::users::get_profile,
        api::handlers::users::update_profile,
        api::handlers::users::get_favorites,
        api::handlers::users::get_dashboard,
        api::handlers::users::get_preferences,
        api::handlers::cocktails::list_cocktails,
        api::handlers::cocktails::get_cocktail,
        api::handlers::cocktails::list_reviews,
        api::handlers::cocktails::create_review,
        api::handlers::cocktails::toggle_favorite,
        api::handlers::cocktails::featured_cocktails,
        api::handlers::cocktails::cocktail_categories,
        api::handlers::cocktails::search_cocktails,
        api::handlers::cocktails::moderate_review,
        api::handlers::ingredients::list_ingredients,
        api::handlers::ingredients::get_ingredient,
        api::handlers::ingredients::ingredient_categories,
        api::handlers::subscriptions::list_subscriptions,
        api::handlers::subscriptions::list_plans,
        api::handlers::subscriptions::create_subscription,
        api::handlers::subscriptions::cancel_subscription,
        api::handlers::subscriptions::list_deliveries,
        api::handlers::classes::list_classes,
        api::handlers::classes::get_class,
        api::handlers::classes::book_class,
        api::handlers::classes::my_bookings,
        api::handlers::classes::cancel_booking,
        api::handlers::private_events::submit_inquiry,
        api::handlers::private_events::list_packages,
        api::handlers::private_events::get_package,
        api::handlers::private_events::list_testimonials,
        api::handlers::private_events::featured_testimonials,
        api::handlers::private_events::inquiry_status,
        api::handlers::private_events::admin_list_inquiries,
        api::handlers::private_events::admin_update_inquiry,
        api::handlers::location::location_info,
        api::handlers::location::all_locations,
        api::handlers::location::location_by_slug,
        api::handlers::location::submit_contact,
        api::handlers::location::business_hours,
        api::handlers::location::directions,
        api::handlers::location::admin_list_contacts,
        api::handlers::location::admin_update_contact,
        api::handlers::location::admin_create_location,
    ),
    tags(
        (name = "auth", description = "Registration, tokens and password reset"),
        (name = "users", description = "Profile, favorites and dashboard"),
        (name = "cocktails", description = "Cocktail catalog, reviews and favorites"),
        (name = "ingredients", description = "Ingredient catalog and pairings"),
        (name = "subscriptions", description = "Monthly box plans and deliveries"),
        (name = "classes", description = "Virtual classes and bookings"),
        (name = "private-events", description = "Event inquiries, packages and testimonials"),
        (name = "location", description = "Venue information and the contact form"),
    ),
    info(
        title = "SOBRE API",
        version = "1.0.0",
        description = "Backend for SOBRE, a healthy cocktail bar: catalog browsing, reviews, subscriptions, \
            virtual class bookings, private event inquiries and the contact form.

## Authentication

Endpoints marked with a lock need an access token in the `Authorization` header. Admin-only endpoints \
additionally require an account with `is_admin` set.

## Errors

Every error has the body `{\"error\": \"message\"}` and a 4xx or 5xx status.",
    ),
)]
pub struct ApiDoc;
