use clap::Subcommand;
use interval_core::integrations::EntitlementService;
use interval_core::storage::{Database, SUBSCRIPTION_PRODUCTS};

#[derive(Subcommand)]
pub enum SubscriptionAction {
    /// Show whether a subscription is active
    Status,
    /// Purchase a subscription product
    Purchase {
        /// Product ID (interval.monthly or interval.yearly)
        product: String,
    },
    /// Restore previous purchases
    Restore,
}

pub fn run(action: SubscriptionAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let rt = tokio::runtime::Builder::new_current_thread().build()?;

    rt.block_on(async move {
        match action {
            SubscriptionAction::Status => {
                let status = serde_json::json!({
                    "subscribed": db.is_subscribed().await,
                    "product": db.subscription_product()?,
                    "available": SUBSCRIPTION_PRODUCTS,
                });
                println!("{}", serde_json::to_string_pretty(&status)?);
            }
            SubscriptionAction::Purchase { product } => {
                db.purchase(&product).await?;
                println!("{{\"type\": \"subscription_purchased\", \"product\": \"{product}\"}}");
            }
            SubscriptionAction::Restore => {
                db.restore_purchases().await?;
                println!("{{\"type\": \"purchases_restored\"}}");
            }
        }
        Ok::<_, Box<dyn std::error::Error>>(())
    })
}
