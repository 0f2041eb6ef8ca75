use anyhow::Result;
use std::process;

use ladle_core::gateway::RecipeGateway;
use ladle_core::models::NewReview;
use ladle_core::service::submit_review;

use super::helpers::{gateway_error, print_review_table};

pub(crate) async fn cmd_review_list(gateway: &dyn RecipeGateway, id: i64, json: bool) -> Result<()> {
    let reviews = gateway
        .reviews(id)
        .await
        .map_err(|e| gateway_error(e, json))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&reviews)?);
    } else if reviews.is_empty() {
        eprintln!("No reviews for recipe {id} yet");
        process::exit(2);
    } else {
        print_review_table(&reviews);
        let total: u32 = reviews.iter().map(|r| u32::from(r.rating)).sum();
        #[allow(clippy::cast_precision_loss)]
        let average = f64::from(total) / reviews.len() as f64;
        println!("{} reviews, average {average:.1}", reviews.len());
    }
    Ok(())
}

pub(crate) async fn cmd_review_add(
    gateway: &dyn RecipeGateway,
    id: i64,
    review: NewReview,
    json: bool,
) -> Result<()> {
    let created = submit_review(gateway, id, &review)
        .await
        .map_err(|e| gateway_error(e, json))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&created)?);
    } else {
        println!(
            "Posted review {} for recipe {id}: {}/{}",
            created.id,
            created.rating,
            ladle_core::models::MAX_RATING
        );
    }
    Ok(())
}
