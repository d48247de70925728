//! Demo data for local development.

use uuid::Uuid;

use crate::domain::{Media, Rule, RuleCondition, SalesChannel, ShippingMethod};
use crate::error::StoreApiResult;
use crate::storage::StoreRepository;

/// Context token of the logged-in demo customer.
pub const DEMO_CUSTOMER_TOKEN: &str = "demo-customer-token";

/// Create a demo sales channel with a handful of shipping methods.
///
/// If a sales channel with the access key already exists, only the demo
/// customer token is restored (it may have been purged).
pub async fn seed_demo_data(
    repository: &StoreRepository,
    access_key: &str,
) -> StoreApiResult<SalesChannel> {
    if let Some(existing) = repository
        .find_sales_channel_by_access_key(access_key)
        .await?
    {
        if repository
            .find_context_token(DEMO_CUSTOMER_TOKEN)
            .await?
            .is_none()
        {
            repository
                .save_context_token(DEMO_CUSTOMER_TOKEN, existing.id, Some(Uuid::new_v4()))
                .await?;
        }
        tracing::info!(sales_channel_id = %existing.id, "Demo data already present");
        return Ok(existing);
    }

    let channel = SalesChannel::new("Demo Storefront");
    repository.create_sales_channel(&channel, access_key).await?;

    let always = Rule::new("Always valid", 100, vec![RuleCondition::AlwaysValid]);
    let customers = Rule::new(
        "Logged in customers",
        50,
        vec![RuleCondition::CustomerLoggedIn { value: true }],
    );
    let channel_currency = Rule::new(
        "Default currency",
        10,
        vec![RuleCondition::Currency {
            ids: vec![channel.currency_id],
        }],
    );
    for rule in [&always, &customers, &channel_currency] {
        repository.create_rule(rule).await?;
    }

    let logo = Media {
        id: Uuid::new_v4(),
        url: "/media/shipping/express.png".to_string(),
        alt: Some("Express".to_string()),
        mime_type: "image/png".to_string(),
        file_name: "express.png".to_string(),
    };
    repository.create_media(&logo).await?;

    let mut express = ShippingMethod::new("Express")
        .with_position(2)
        .with_availability_rule(customers.id);
    express.media_id = Some(logo.id);
    express.description = Some("Delivery within 24 hours".to_string());

    let methods = [
        ShippingMethod::new("Standard")
            .with_position(1)
            .with_availability_rule(always.id),
        express,
        ShippingMethod::new("Pickup")
            .with_position(3)
            .with_availability_rule(channel_currency.id),
        ShippingMethod::new("Freight").with_position(4),
        ShippingMethod::new("Discontinued").with_position(5).inactive(),
    ];

    for method in &methods {
        repository.create_shipping_method(method).await?;
        repository
            .assign_shipping_method(channel.id, method.id)
            .await?;
    }

    repository
        .save_context_token(DEMO_CUSTOMER_TOKEN, channel.id, Some(Uuid::new_v4()))
        .await?;

    tracing::info!(
        sales_channel_id = %channel.id,
        shipping_methods = methods.len(),
        customer_token = DEMO_CUSTOMER_TOKEN,
        "Demo data seeded"
    );

    Ok(channel)
}
